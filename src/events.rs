//! Structured chain execution events for tracing and observability.
//!
//! Every step evaluation leaves at least one event in the invocation's trace
//! log, so a finished run can be replayed step by step: which steps ran,
//! which were bypassed and why, where an error was raised and where it was
//! caught.

use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::step::{SkipReason, StepKind};

/// Events that can be emitted during a chain invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum ChainEvent {
    /// A step's action has started.
    StepStart {
        /// Position of the step in the chain.
        step: usize,
        /// Whether the step is a normal step or a catcher.
        kind: StepKind,
    },
    /// A step's action has finished successfully.
    StepEnd {
        /// Position of the step in the chain.
        step: usize,
        /// Whether the step is a normal step or a catcher.
        kind: StepKind,
        /// Duration of the action in milliseconds.
        duration_ms: u64,
    },
    /// A step was bypassed without running its action.
    StepSkipped {
        /// Position of the step in the chain.
        step: usize,
        /// Whether the step is a normal step or a catcher.
        kind: StepKind,
        /// Why the step did not run.
        reason: SkipReason,
    },
    /// A catcher took the pending error out of the context.
    ErrorCaught {
        /// Position of the catching step.
        step: usize,
        /// Display form of the caught error.
        message: String,
    },
    /// A step's action failed; the error is now pending.
    StepFailed {
        /// Position of the step in the chain.
        step: usize,
        /// Whether the step is a normal step or a catcher.
        kind: StepKind,
        /// Display form of the error.
        message: String,
        /// Duration of the action in milliseconds.
        duration_ms: u64,
    },
    /// A step returned the abort signal; the chain stops here.
    ChainAborted {
        /// Position of the aborting step.
        step: usize,
    },
}

/// A timestamped trace entry containing a chain event.
///
/// Each trace entry records when the event occurred (as Unix epoch milliseconds)
/// along with the event itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceEntry {
    /// Unix epoch timestamp in milliseconds when this event occurred.
    pub timestamp: u64,
    /// The chain event that was recorded.
    #[serde(flatten)]
    pub event: ChainEvent,
}

impl TraceEntry {
    /// Create a new trace entry with the current timestamp.
    #[must_use]
    pub fn new(event: ChainEvent) -> Self {
        // A clock set before the epoch records as zero.
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
            .unwrap_or_default();
        Self { timestamp, event }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trace_entry_serialization() {
        let event = ChainEvent::StepStart {
            step: 2,
            kind: StepKind::Catcher,
        };
        let entry = TraceEntry::new(event);

        let json = serde_json::to_string(&entry).unwrap();
        assert!(json.contains("\"type\":\"StepStart\""));
        assert!(json.contains("\"step\":2"));
        assert!(json.contains("\"kind\":\"catcher\""));
        assert!(json.contains("\"timestamp\":"));
    }

    #[test]
    fn test_skipped_event() {
        let event = ChainEvent::StepSkipped {
            step: 0,
            kind: StepKind::Normal,
            reason: SkipReason::ErrorPending,
        };

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"StepSkipped\""));
        assert!(json.contains("\"reason\":\"error_pending\""));

        let back: ChainEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }
}
