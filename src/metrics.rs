//! Metrics collection for chain invocations.
//!
//! This module provides `ChainMetrics` for counting executed and bypassed
//! steps, recovered errors and failures.

use serde::{Deserialize, Serialize};

/// Aggregated counters for one chain invocation.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainMetrics {
    /// Number of steps whose action was invoked, successful or not.
    pub steps_run: usize,
    /// Number of steps bypassed by the routing rules.
    pub steps_skipped: usize,
    /// Number of errors handed to a catcher.
    pub errors_caught: usize,
    /// Display form of every failure, in the order they happened.
    pub failures: Vec<String>,
    /// Position of the step that aborted the chain, if any.
    pub aborted_at: Option<usize>,
}

impl ChainMetrics {
    /// Increment the executed steps counter.
    pub fn record_run(&mut self) {
        self.steps_run += 1;
    }

    /// Increment the skipped steps counter.
    pub fn record_skip(&mut self) {
        self.steps_skipped += 1;
    }

    /// Increment the caught errors counter.
    pub fn record_catch(&mut self) {
        self.errors_caught += 1;
    }

    /// Record a failure message.
    pub fn record_failure(&mut self, error: String) {
        self.failures.push(error);
    }

    /// Record the step that aborted the chain.
    pub fn record_abort(&mut self, step: usize) {
        self.aborted_at = Some(step);
    }

    /// Check if there were any failures.
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }

    /// Check if the invocation was aborted.
    pub fn was_aborted(&self) -> bool {
        self.aborted_at.is_some()
    }
}
