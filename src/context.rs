//! Per-invocation execution context.
//!
//! This module provides the `ExecutionContext` which is created fresh for
//! every chain invocation and moved through each step in turn. It carries
//! the lane the chain is currently on (an output or a pending error) along
//! with the invocation's metrics and trace log.

use crate::events::{ChainEvent, TraceEntry};
use crate::metrics::ChainMetrics;
use crate::Outcome;

/// Context handed from step to step within one chain invocation.
///
/// The lane is a `Result`: `Ok` carries the current [`Outcome`], `Err` the
/// pending error. Only one of the two exists at any time, so a step can tell
/// which lane it is on without looking at anything else.
///
/// The context is owned by exactly one invocation. Steps receive it by value
/// and hand it back, so no locking is involved.
///
/// # Example
///
/// ```rust
/// use middleware_chain::{ExecutionContext, Outcome};
///
/// let ctx: ExecutionContext<i32, String> = ExecutionContext::new();
/// assert_eq!(ctx.output(), Some(&Outcome::Empty));
/// assert!(ctx.error().is_none());
///
/// let ctx = ExecutionContext::<i32, String>::new().with_error("boom".to_string());
/// assert_eq!(ctx.error().map(String::as_str), Some("boom"));
/// assert_eq!(ctx.output(), None);
/// ```
#[derive(Debug)]
pub struct ExecutionContext<O, E> {
    lane: Result<Outcome<O>, E>,
    metrics: ChainMetrics,
    traces: Vec<TraceEntry>,
    record_traces: bool,
}

impl<O, E> Default for ExecutionContext<O, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<O, E> ExecutionContext<O, E> {
    /// Create an empty context: no output, no error, empty metrics and traces.
    #[must_use]
    pub fn new() -> Self {
        Self {
            lane: Ok(Outcome::Empty),
            metrics: ChainMetrics::default(),
            traces: Vec::new(),
            record_traces: true,
        }
    }

    /// Start from the given output value.
    #[must_use]
    pub fn with_output(mut self, output: O) -> Self {
        self.lane = Ok(Outcome::Value(output));
        self
    }

    /// Start with the given error pending.
    #[must_use]
    pub fn with_error(mut self, error: E) -> Self {
        self.lane = Err(error);
        self
    }

    /// Start in the aborted state.
    #[must_use]
    pub fn aborted(mut self) -> Self {
        self.lane = Ok(Outcome::Aborted);
        self
    }

    /// Enable or disable recording of trace entries. Metrics are always kept.
    #[must_use]
    pub fn with_tracing(mut self, enabled: bool) -> Self {
        self.record_traces = enabled;
        self
    }

    /// The current lane.
    pub fn lane(&self) -> &Result<Outcome<O>, E> {
        &self.lane
    }

    /// The current outcome, or `None` while an error is pending.
    pub fn output(&self) -> Option<&Outcome<O>> {
        self.lane.as_ref().ok()
    }

    /// The pending error, if any.
    pub fn error(&self) -> Option<&E> {
        self.lane.as_ref().err()
    }

    /// Returns `true` while an error is pending.
    pub fn has_error(&self) -> bool {
        self.lane.is_err()
    }

    /// Returns `true` once a step has aborted the chain.
    pub fn is_aborted(&self) -> bool {
        matches!(self.lane, Ok(Outcome::Aborted))
    }

    /// Replace the lane with a successful outcome.
    pub(crate) fn set_outcome(&mut self, outcome: Outcome<O>) {
        self.lane = Ok(outcome);
    }

    /// Replace the lane with a pending error.
    pub(crate) fn fail(&mut self, error: E) {
        self.lane = Err(error);
    }

    /// Take the pending error out of the context, leaving it empty.
    ///
    /// Returns `None` and leaves the lane untouched if no error is pending.
    pub(crate) fn take_error(&mut self) -> Option<E> {
        match std::mem::replace(&mut self.lane, Ok(Outcome::Empty)) {
            Err(error) => Some(error),
            ok => {
                self.lane = ok;
                None
            }
        }
    }

    /// Counters collected so far.
    pub fn metrics(&self) -> &ChainMetrics {
        &self.metrics
    }

    pub(crate) fn metrics_mut(&mut self) -> &mut ChainMetrics {
        &mut self.metrics
    }

    /// Append an event to the trace log, unless tracing is disabled.
    ///
    /// Events are timestamped automatically when emitted.
    pub fn emit(&mut self, event: ChainEvent) {
        if self.record_traces {
            self.traces.push(TraceEntry::new(event));
        }
    }

    /// The trace entries recorded so far.
    pub fn traces(&self) -> &[TraceEntry] {
        &self.traces
    }

    /// Consume the context, returning only the lane.
    pub fn into_result(self) -> Result<Outcome<O>, E> {
        self.lane
    }

    /// Consume the context, returning the lane, metrics and trace log.
    pub fn into_parts(self) -> (Result<Outcome<O>, E>, ChainMetrics, Vec<TraceEntry>) {
        (self.lane, self.metrics, self.traces)
    }
}
