use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ledger::{
    ErrorRecord, ErrorSummary, ExecutionResult, FinalStatus, LedgerSnapshot, OverallStatus,
    RunMetrics,
};
use crate::plan::DependencyPlanItem;
use crate::verify::VerificationReport;

/// Terminal structure handed to the reporter. Built once, after every plan
/// item reached a terminal result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    pub plan: Vec<DependencyPlanItem>,
    pub results: Vec<ExecutionResult>,
    pub metrics: RunMetrics,
    pub errors: Vec<ErrorRecord>,
    pub error_summary: ErrorSummary,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verification: Option<VerificationReport>,
    #[serde(default)]
    pub cancelled: bool,
    /// Full ledger copy; left out of the report JSON and written separately
    /// on request.
    #[serde(skip)]
    pub ledger: Option<LedgerSnapshot>,
}

impl RunReport {
    pub fn overall_status(&self) -> OverallStatus {
        self.metrics.overall_status
    }

    pub fn count(&self, status: FinalStatus) -> usize {
        self.results
            .iter()
            .filter(|r| r.final_status == status)
            .count()
    }
}
