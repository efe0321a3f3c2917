//! Injectable time source.
//!
//! Freshness predicates compare cached timestamps against [`Clock::now`], so
//! tests can pin the current instant instead of sleeping.

use chrono::{DateTime, Utc};

/// Source of the current instant.
///
/// ```ignore
/// use bridge_traits::clock::Clock;
///
/// fn is_stale(clock: &dyn Clock, fetched_at: DateTime<Utc>) -> bool {
///     clock.now() - fetched_at > chrono::Duration::minutes(5)
/// }
/// ```
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_clock_moves_forward() {
        let clock = SystemClock;
        let before = clock.now();
        let after = clock.now();

        assert!(after >= before);
    }

    #[test]
    fn test_clock_as_trait_object() {
        let clock: Box<dyn Clock> = Box::new(SystemClock);
        assert!(clock.now().timestamp() > 0);
    }
}
