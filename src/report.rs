//! Serializable summary of one chain invocation.

use serde::{Deserialize, Serialize};

use crate::events::TraceEntry;
use crate::metrics::ChainMetrics;
use crate::Result;

/// Metrics and trace log of a finished chain invocation.
///
/// Returned by [`Chain::run_with_report`](crate::Chain::run_with_report)
/// alongside the chain's result.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExecutionReport {
    /// Name of the chain that produced this report.
    pub chain_name: String,
    /// Counters collected during the invocation.
    pub metrics: ChainMetrics,
    /// Every event recorded, in order. Empty when tracing was disabled.
    pub traces: Vec<TraceEntry>,
}

impl ExecutionReport {
    /// Serialize the report as compact JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Serialize the report as indented JSON.
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::ChainEvent;

    #[test]
    fn test_report_json() {
        let report = ExecutionReport {
            chain_name: "signup".to_string(),
            metrics: ChainMetrics {
                steps_run: 1,
                aborted_at: Some(0),
                ..ChainMetrics::default()
            },
            traces: vec![TraceEntry::new(ChainEvent::ChainAborted { step: 0 })],
        };

        let json = report.to_json().unwrap();
        assert!(json.contains("\"chain_name\":\"signup\""));
        assert!(json.contains("\"aborted_at\":0"));
        assert!(json.contains("\"type\":\"ChainAborted\""));

        let pretty = report.to_json_pretty().unwrap();
        let back: ExecutionReport = serde_json::from_str(&pretty).unwrap();
        assert_eq!(back.metrics, report.metrics);
        assert_eq!(back.traces.len(), 1);
    }
}
