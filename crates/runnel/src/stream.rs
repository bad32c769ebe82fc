//! The reactive get state machine
//!
//! Drives a prepared get through first-emit → await-change → re-emit,
//! one blocking pass at a time per subscription. Built on
//! `futures::stream::unfold` so the subscription itself travels as the
//! stream's state and is dropped (unregistering from the bus) when the
//! stream is.

use crate::get::PreparedGet;
use futures::{Stream, StreamExt};
use runnel_bus::ChangesStream;
use runnel_core::{FromRecord, Result, RowStore};

struct StreamState<S: RowStore, T: FromRecord> {
    prepared: PreparedGet<S, T>,
    subscription: Option<ChangesStream>,
    primed: bool,
    failed: bool,
}

/// Wrap a prepared get into its reactive form.
///
/// The bus subscription is registered before the first pass runs, so a
/// write racing the first snapshot is either visible in it or queued
/// behind it, never lost. Emission order per subscription is the
/// publish order of relevant changes, with the zeroth snapshot first.
pub(crate) fn query_stream<S, T>(
    prepared: PreparedGet<S, T>,
) -> impl Stream<Item = Result<Vec<T>>> + Send
where
    S: RowStore,
    T: FromRecord + Send + 'static,
{
    let watched = prepared.watched_tables();
    let subscription = if watched.is_empty() {
        // Nothing to watch: degenerate to a one-shot emission
        None
    } else {
        Some(prepared.bus().observe(watched))
    };

    let state = StreamState {
        prepared,
        subscription,
        primed: false,
        failed: false,
    };

    futures::stream::unfold(state, |mut state| async move {
        // A failed pass terminated the sequence on the previous turn
        if state.failed {
            return None;
        }

        if state.primed {
            // Suspend until the next relevant change; the stream ends
            // here for one-shot targets and when the bus closes
            state.subscription.as_mut()?.next().await?;
        } else {
            state.primed = true;
        }

        let pass = state.prepared.execute_async().await;
        state.failed = pass.is_err();
        if state.failed {
            tracing::debug!("reactive get pass failed, terminating stream");
        }
        Some((pass, state))
    })
}
