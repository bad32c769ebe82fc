//! Get operations
//!
//! A prepared get binds a [`GetResolver`] and a query target to the store
//! handle. It executes blocking on the calling thread, one attempt, or
//! streams: an immediate first snapshot followed by one re-execution per
//! relevant change notification.

use crate::stream;
use futures::Stream;
use runnel_bus::ChangeBus;
use runnel_core::{
    observe, FromRecord, Query, QueryTarget, RawQuery, Record, Result, RowStore, RunnelError,
};
use std::collections::BTreeSet;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Instant;

/// Defines behavior of a get operation
///
/// Resolvers are stateless and shared across concurrent callers; engine
/// failures propagate unchanged.
pub trait GetResolver<S: RowStore>: Send + Sync {
    fn perform_get(&self, store: &S, target: &QueryTarget) -> Result<Vec<Record>>;
}

/// Default get resolver: delegates straight to the engine's read
/// primitives. Thread-safe and shareable across get operations.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultGetResolver;

impl<S: RowStore> GetResolver<S> for DefaultGetResolver {
    fn perform_get(&self, store: &S, target: &QueryTarget) -> Result<Vec<Record>> {
        match target {
            QueryTarget::Structured(query) => store.select(query),
            QueryTarget::Raw(raw) => store.select_raw(raw),
        }
    }
}

/// Builder for a prepared get
pub struct GetBuilder<S: RowStore, T: FromRecord> {
    engine: Arc<S>,
    bus: ChangeBus,
    query: Option<Query>,
    raw_query: Option<RawQuery>,
    resolver: Option<Arc<dyn GetResolver<S>>>,
    _marker: PhantomData<fn() -> T>,
}

impl<S: RowStore, T: FromRecord> GetBuilder<S, T> {
    pub(crate) fn new(engine: Arc<S>, bus: ChangeBus) -> Self {
        Self {
            engine,
            bus,
            query: None,
            raw_query: None,
            resolver: None,
            _marker: PhantomData,
        }
    }

    /// Specify a structured query.
    pub fn query(mut self, query: Query) -> Self {
        self.query = Some(query);
        self
    }

    /// Specify a raw query; declare its watched tables for reactive use.
    pub fn raw_query(mut self, raw_query: RawQuery) -> Self {
        self.raw_query = Some(raw_query);
        self
    }

    /// Override the default get resolver.
    pub fn resolver(mut self, resolver: impl GetResolver<S> + 'static) -> Self {
        self.resolver = Some(Arc::new(resolver));
        self
    }

    /// Validate configuration and bind the operation.
    ///
    /// Fails before any I/O: exactly one of query / raw query must be
    /// supplied.
    pub fn prepare(self) -> Result<PreparedGet<S, T>> {
        let target = match (self.query, self.raw_query) {
            (Some(query), None) => QueryTarget::Structured(query),
            (None, Some(raw)) => QueryTarget::Raw(raw),
            _ => return Err(RunnelError::AmbiguousQuery),
        };

        Ok(PreparedGet {
            engine: self.engine,
            bus: self.bus,
            target,
            resolver: self
                .resolver
                .unwrap_or_else(|| Arc::new(DefaultGetResolver)),
            _marker: PhantomData,
        })
    }
}

/// A bound, executable get
pub struct PreparedGet<S: RowStore, T: FromRecord> {
    engine: Arc<S>,
    bus: ChangeBus,
    target: QueryTarget,
    resolver: Arc<dyn GetResolver<S>>,
    _marker: PhantomData<fn() -> T>,
}

impl<S: RowStore, T: FromRecord> Clone for PreparedGet<S, T> {
    fn clone(&self) -> Self {
        Self {
            engine: self.engine.clone(),
            bus: self.bus.clone(),
            target: self.target.clone(),
            resolver: self.resolver.clone(),
            _marker: PhantomData,
        }
    }
}

impl<S: RowStore, T: FromRecord> std::fmt::Debug for PreparedGet<S, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreparedGet")
            .field("target", &self.target)
            .finish_non_exhaustive()
    }
}

impl<S: RowStore, T: FromRecord> PreparedGet<S, T> {
    /// Execute immediately on the calling thread.
    ///
    /// One attempt; a failure surfaces to the caller untouched.
    pub fn execute(&self) -> Result<Vec<T>> {
        let start = Instant::now();
        let records = self.resolver.perform_get(&self.engine, &self.target)?;

        let mut objects = Vec::with_capacity(records.len());
        for record in &records {
            objects.push(T::from_record(record)?);
        }

        observe::record_execute(start.elapsed(), "get");
        Ok(objects)
    }

    /// Tables a streaming form of this get watches.
    pub fn watched_tables(&self) -> BTreeSet<String> {
        self.target.watched_tables()
    }

    pub fn target(&self) -> &QueryTarget {
        &self.target
    }

    pub(crate) fn bus(&self) -> &ChangeBus {
        &self.bus
    }
}

impl<S: RowStore, T: FromRecord + Send + 'static> PreparedGet<S, T> {
    /// Execute on the blocking pool, safe to call from async context.
    pub async fn execute_async(&self) -> Result<Vec<T>> {
        let this = self.clone();
        tokio::task::spawn_blocking(move || this.execute())
            .await
            .map_err(|e| RunnelError::InvalidState(format!("task join error: {}", e)))?
    }

    /// Turn this get into a reactive stream.
    ///
    /// Emits one immediate snapshot, then re-executes and re-emits on
    /// every change notification touching a watched table. An empty
    /// watched set degenerates to the single snapshot. A failed pass
    /// emits the error and terminates the stream.
    pub fn stream(self) -> impl Stream<Item = Result<Vec<T>>> + Send {
        stream::query_stream(self)
    }
}
