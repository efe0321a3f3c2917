//! End-to-end tests of store flows built by the core service.

use async_trait::async_trait;
use bridge_memory::InMemoryCacheStore;
use bridge_traits::error::BridgeError;
use bridge_traits::clock::Clock;
use chrono::{DateTime, Utc};
use core_runtime::Error as RuntimeError;
use core_service::{
    combine, AdditionalLoadingState, CacheStore, CoreConfig, CoreError, CoreEvent, CoreService,
    DataState, FetchKind, Fetched, GettingFrom, LoadingState, NeedRefresh, OriginFetcher,
    StateError,
};
use futures::StreamExt;
use mockall::mock;
use std::sync::Arc;
use std::time::Duration;

type Page = Vec<String>;

mock! {
    Origin {}

    #[async_trait]
    impl OriginFetcher<Vec<String>> for Origin {
        async fn fetch(&self) -> anyhow::Result<Fetched<Vec<String>>>;
        async fn fetch_next(&self, request_key: String) -> anyhow::Result<Fetched<Vec<String>>>;
        async fn fetch_prev(&self, request_key: String) -> anyhow::Result<Fetched<Vec<String>>>;
    }
}

/// Origin answering every fetch after `delay`.
struct SlowOrigin {
    delay: Duration,
    page: Page,
}

#[async_trait]
impl OriginFetcher<Page> for SlowOrigin {
    async fn fetch(&self) -> anyhow::Result<Fetched<Page>> {
        tokio::time::sleep(self.delay).await;
        Ok(Fetched::new(self.page.clone()))
    }

    async fn fetch_next(&self, _request_key: String) -> anyhow::Result<Fetched<Page>> {
        tokio::time::sleep(self.delay).await;
        Ok(Fetched::new(self.page.clone()))
    }

    async fn fetch_prev(&self, _request_key: String) -> anyhow::Result<Fetched<Page>> {
        tokio::time::sleep(self.delay).await;
        Ok(Fetched::new(self.page.clone()))
    }
}

struct FixedClock(DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

fn page(items: &[&str]) -> Page {
    items.iter().map(|item| item.to_string()).collect()
}

fn service() -> CoreService {
    CoreService::new(CoreConfig::default()).unwrap()
}

fn empty_cache() -> Arc<InMemoryCacheStore<Page>> {
    Arc::new(InMemoryCacheStore::concatenating())
}

fn fetching(result: Fetched<Page>) -> MockOrigin {
    let mut origin = MockOrigin::new();
    origin
        .expect_fetch()
        .times(1)
        .returning(move || Ok(result.clone()));
    origin
}

fn completed(content: Page, can_next: bool) -> LoadingState<Page> {
    LoadingState::Completed {
        content,
        appending: AdditionalLoadingState::Fixed {
            can_request_additional_data: can_next,
        },
        prepending: AdditionalLoadingState::Fixed {
            can_request_additional_data: false,
        },
    }
}

// ----------------------------------------------------------------------------
// publish
// ----------------------------------------------------------------------------

#[tokio::test]
async fn test_publish_loads_then_completes() {
    let core = service();
    let flow = core.store_flow(
        "timeline",
        empty_cache(),
        Arc::new(fetching(
            Fetched::new(page(&["A"])).with_next_key("K".to_string()),
        )),
        NeedRefresh::never(),
    );

    let mut states = flow.publish(false);

    assert_eq!(states.next().await, Some(LoadingState::Loading(None)));
    assert_eq!(states.next().await, Some(completed(page(&["A"]), true)));
}

#[tokio::test]
async fn test_publish_with_fresh_cache_does_not_fetch() {
    let mut origin = MockOrigin::new();
    origin.expect_fetch().times(0);

    let core = service();
    let cache = Arc::new(InMemoryCacheStore::concatenating().with_content(page(&["A"])));
    let flow = core.store_flow("timeline", cache, Arc::new(origin), NeedRefresh::never());

    let mut states = flow.publish(false);

    assert_eq!(states.next().await, Some(completed(page(&["A"]), false)));
}

#[tokio::test]
async fn test_publish_force_refresh_keeps_cache_while_loading() {
    let core = service();
    let cache = Arc::new(InMemoryCacheStore::concatenating().with_content(page(&["A"])));
    let flow = core.store_flow(
        "timeline",
        cache,
        Arc::new(fetching(Fetched::new(page(&["B"])))),
        NeedRefresh::never(),
    );

    let mut states = flow.publish(true);

    assert_eq!(
        states.next().await,
        Some(LoadingState::Loading(Some(page(&["A"]))))
    );
    assert_eq!(states.next().await, Some(completed(page(&["B"]), false)));
}

#[tokio::test]
async fn test_publish_surfaces_origin_error() {
    let mut origin = MockOrigin::new();
    origin
        .expect_fetch()
        .returning(|| Err(anyhow::anyhow!("server returned 503")));

    let core = service();
    let flow = core.store_flow("timeline", empty_cache(), Arc::new(origin), NeedRefresh::never());

    let errors = flow.publish(false).filter(|state| futures::future::ready(state.is_error()));
    futures::pin_mut!(errors);

    match errors.next().await {
        Some(LoadingState::Error(cause)) => assert_eq!(cause.to_string(), "server returned 503"),
        other => panic!("expected error projection, got {:?}", other),
    }
}

#[tokio::test]
async fn test_combined_flows() {
    let core = service();
    let posts = core.store_flow(
        "posts",
        empty_cache(),
        Arc::new(fetching(Fetched::new(page(&["post"])))),
        NeedRefresh::never(),
    );
    let profile = core.store_flow(
        "profile",
        Arc::new(InMemoryCacheStore::replacing().with_content(page(&["me"]))),
        Arc::new(MockOrigin::new()),
        NeedRefresh::never(),
    );

    let combined = combine(posts.publish(false), profile.publish(false), |mut a, b| {
        a.extend(b);
        a
    })
    .filter(|state| futures::future::ready(state.is_completed()));
    futures::pin_mut!(combined);

    assert_eq!(
        combined.next().await,
        Some(completed(page(&["post", "me"]), false))
    );
}

// ----------------------------------------------------------------------------
// require_data / get_data
// ----------------------------------------------------------------------------

#[tokio::test]
async fn test_require_data_from_both_fetches_when_missing() {
    let core = service();
    let flow = core.store_flow(
        "timeline",
        empty_cache(),
        Arc::new(fetching(Fetched::new(page(&["A"])))),
        NeedRefresh::never(),
    );

    assert_eq!(flow.require_data(GettingFrom::Both).await.unwrap(), page(&["A"]));
    // Cached now; no second fetch.
    assert_eq!(flow.get_data(GettingFrom::Both).await, Some(page(&["A"])));
}

#[tokio::test]
async fn test_require_data_from_cache_never_fetches() {
    let mut origin = MockOrigin::new();
    origin.expect_fetch().times(0);

    let core = service();
    let cache = Arc::new(InMemoryCacheStore::concatenating().with_content(page(&["old"])));
    let flow = core.store_flow("timeline", cache, Arc::new(origin), NeedRefresh::always());

    assert_eq!(
        flow.require_data(GettingFrom::Cache).await,
        Err(StateError::NoSuchElement)
    );
    assert_eq!(flow.get_data(GettingFrom::Cache).await, None);
}

#[tokio::test]
async fn test_require_data_from_origin_replaces_fresh_cache() {
    let core = service();
    let cache = Arc::new(InMemoryCacheStore::concatenating().with_content(page(&["old"])));
    let flow = core.store_flow(
        "timeline",
        cache,
        Arc::new(fetching(Fetched::new(page(&["new"])))),
        NeedRefresh::never(),
    );

    assert_eq!(
        flow.require_data(GettingFrom::Origin).await.unwrap(),
        page(&["new"])
    );
}

#[tokio::test]
async fn test_require_data_returns_stored_error() {
    let mut origin = MockOrigin::new();
    origin
        .expect_fetch()
        .times(1)
        .returning(|| Err(anyhow::anyhow!("unauthorized")));

    let core = service();
    let flow = core.store_flow("timeline", empty_cache(), Arc::new(origin), NeedRefresh::never());

    let cause = flow.require_data(GettingFrom::Origin).await.unwrap_err();

    assert_eq!(cause.origin_error().unwrap().to_string(), "unauthorized");
    assert_eq!(flow.state(), DataState::Error(cause));
}

#[tokio::test]
async fn test_require_data_from_cache_returns_stored_error() {
    let mut origin = MockOrigin::new();
    origin
        .expect_fetch()
        .times(1)
        .returning(|| Err(anyhow::anyhow!("server returned 503")));

    let core = service();
    let flow = core.store_flow("timeline", empty_cache(), Arc::new(origin), NeedRefresh::never());

    flow.validate().await;
    let cause = flow.require_data(GettingFrom::Cache).await.unwrap_err();

    assert_eq!(cause.origin_error().unwrap().to_string(), "server returned 503");
    assert_eq!(flow.state(), DataState::Error(cause));
    assert_eq!(flow.get_data(GettingFrom::Cache).await, None);
}

#[tokio::test(start_paused = true)]
async fn test_require_data_waits_for_in_flight_refresh() {
    let core = service();
    let flow = core.store_flow(
        "timeline",
        empty_cache(),
        Arc::new(SlowOrigin {
            delay: Duration::from_secs(2),
            page: page(&["A"]),
        }),
        NeedRefresh::never(),
    );

    flow.refresh_async(false).await;
    assert_eq!(flow.state(), DataState::Loading);

    assert_eq!(flow.require_data(GettingFrom::Both).await.unwrap(), page(&["A"]));
}

// ----------------------------------------------------------------------------
// CoreService wiring
// ----------------------------------------------------------------------------

#[tokio::test]
async fn test_flows_for_same_key_share_state() {
    let core = service();
    let cache = empty_cache();
    let writer = core.store_flow(
        "timeline",
        cache.clone(),
        Arc::new(fetching(Fetched::new(page(&["A"])).with_next_key("K".to_string()))),
        NeedRefresh::never(),
    );
    let reader = core.store_flow("timeline", cache, Arc::new(MockOrigin::new()), NeedRefresh::never());
    let other = core.store_flow(
        "profile",
        empty_cache(),
        Arc::new(MockOrigin::new()),
        NeedRefresh::never(),
    );

    writer.validate().await;

    assert_eq!(reader.state(), writer.state());
    assert_eq!(other.state(), DataState::default());
    assert_eq!(reader.get_data(GettingFrom::Cache).await, Some(page(&["A"])));

    let mut keys = core.keys();
    keys.sort();
    assert_eq!(keys, vec!["profile".to_string(), "timeline".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn test_fetch_timeout_becomes_error_state() {
    let config = CoreConfig::builder()
        .fetch_timeout(Duration::from_secs(1))
        .build()
        .unwrap();
    let core = CoreService::new(config).unwrap();
    let flow = core.store_flow(
        "timeline",
        empty_cache(),
        Arc::new(SlowOrigin {
            delay: Duration::from_secs(30),
            page: page(&["late"]),
        }),
        NeedRefresh::never(),
    );

    flow.validate().await;

    match flow.state() {
        DataState::Error(cause) => {
            let error = cause.origin_error().unwrap();
            assert!(matches!(
                error.downcast_ref::<BridgeError>(),
                Some(BridgeError::Timeout(_))
            ));
        }
        other => panic!("expected timeout error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_paging_through_flow_emits_events() {
    let mut origin = MockOrigin::new();
    origin
        .expect_fetch_next()
        .times(1)
        .returning(|_| Ok(Fetched::new(page(&["B"]))));

    let core = service();
    let mut events = core.subscribe().for_key("timeline");
    let cache = empty_cache();
    let flow = core.store_flow("timeline", cache.clone(), Arc::new(origin), NeedRefresh::never());

    flow.update(Some(page(&["A"])), Some("K".to_string()), None)
        .await;
    flow.request_next_data(false).await;

    assert_eq!(cache.load().await, Some(page(&["A", "B"])));
    assert_eq!(flow.state(), DataState::default());

    assert_eq!(
        events.recv().await.unwrap(),
        CoreEvent::CacheUpdated {
            key: "timeline".to_string()
        }
    );
    assert_eq!(
        events.recv().await.unwrap(),
        CoreEvent::FetchStarted {
            key: "timeline".to_string(),
            kind: FetchKind::Next
        }
    );
    assert_eq!(
        events.recv().await.unwrap(),
        CoreEvent::FetchSucceeded {
            key: "timeline".to_string(),
            kind: FetchKind::Next
        }
    );
}

#[tokio::test]
async fn test_update_content_and_clear() {
    let core = service();
    let cache = empty_cache();
    let flow = core.store_flow("timeline", cache.clone(), Arc::new(MockOrigin::new()), NeedRefresh::never());

    flow.update(Some(page(&["A"])), Some("K".to_string()), None)
        .await;
    flow.update_content(Some(page(&["A", "edited"]))).await;

    assert_eq!(cache.load().await, Some(page(&["A", "edited"])));
    assert_eq!(
        flow.publish(false).next().await,
        Some(completed(page(&["A", "edited"]), true))
    );

    flow.clear().await;

    assert_eq!(cache.load().await, None);
    assert_eq!(flow.state(), DataState::default());
}

#[test]
fn test_max_age_policy_uses_configured_age() {
    let now = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
    let config = CoreConfig::builder()
        .default_max_age(Duration::from_secs(300))
        .build()
        .unwrap();
    let core = CoreService::new(config)
        .unwrap()
        .with_clock(Arc::new(FixedClock(now)));

    let policy = core.max_age_policy(|fetched_at: &DateTime<Utc>| *fetched_at);

    assert!(!policy.needs_refresh(&(now - chrono::Duration::seconds(300))));
    assert!(policy.needs_refresh(&(now - chrono::Duration::seconds(301))));

    let unbounded = service().max_age_policy(|fetched_at: &DateTime<Utc>| *fetched_at);
    assert!(!unbounded.needs_refresh(&DateTime::<Utc>::MIN_UTC));
}

#[test]
fn test_invalid_config_is_rejected() {
    let config = CoreConfig {
        event_buffer_size: 0,
        ..CoreConfig::default()
    };

    assert!(matches!(
        CoreService::new(config),
        Err(CoreError::Runtime(RuntimeError::Config(_)))
    ));
}
