//! Combination of several projections into one.
//!
//! A screen backed by several independently cached entities renders a single
//! [`LoadingState`]. [`zip_all`] reduces a snapshot; [`combine`] and
//! [`combine_all`] do the same over live streams, emitting once every input
//! has produced a value and again on every later update.

use crate::loading_state::LoadingState;
use futures::future;
use futures::stream::{self, Stream, StreamExt};

/// Left-to-right reduction of [`LoadingState::zip`]. `None` for no input.
pub fn zip_all<T, I, F>(states: I, f: F) -> Option<LoadingState<T>>
where
    I: IntoIterator<Item = LoadingState<T>>,
    F: Fn(T, T) -> T,
{
    states
        .into_iter()
        .reduce(|acc, state| acc.zip(state, &f))
}

enum Side<A, B> {
    Left(LoadingState<A>),
    Right(LoadingState<B>),
}

/// Combine-latest of two projection streams, merged with [`LoadingState::zip`].
pub fn combine<A, B, R, SA, SB, F>(left: SA, right: SB, f: F) -> impl Stream<Item = LoadingState<R>>
where
    A: Clone,
    B: Clone,
    SA: Stream<Item = LoadingState<A>>,
    SB: Stream<Item = LoadingState<B>>,
    F: Fn(A, B) -> R,
{
    stream::select(left.map(Side::Left), right.map(Side::Right))
        .scan(
            (None::<LoadingState<A>>, None::<LoadingState<B>>),
            move |(latest_left, latest_right), side| {
                match side {
                    Side::Left(state) => *latest_left = Some(state),
                    Side::Right(state) => *latest_right = Some(state),
                }
                let merged = match (latest_left.as_ref(), latest_right.as_ref()) {
                    (Some(l), Some(r)) => Some(l.clone().zip(r.clone(), &f)),
                    _ => None,
                };
                future::ready(Some(merged))
            },
        )
        .filter_map(future::ready)
}

/// Combine-latest of any number of projection streams, reduced left to right.
///
/// Emits nothing when `streams` is empty.
pub fn combine_all<T, S, F>(streams: Vec<S>, f: F) -> impl Stream<Item = LoadingState<T>>
where
    T: Clone,
    S: Stream<Item = LoadingState<T>> + Unpin,
    F: Fn(T, T) -> T,
{
    let count = streams.len();
    let indexed = streams
        .into_iter()
        .enumerate()
        .map(|(index, stream)| stream.map(move |state| (index, state)));

    stream::select_all(indexed)
        .scan(vec![None; count], move |latest, (index, state)| {
            latest[index] = Some(state);
            let merged = latest
                .iter()
                .cloned()
                .collect::<Option<Vec<_>>>()
                .and_then(|states| zip_all(states, &f));
            future::ready(Some(merged))
        })
        .filter_map(future::ready)
}
