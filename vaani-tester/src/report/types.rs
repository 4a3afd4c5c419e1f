use crate::runner::executor::{BatchSummary, TestSuiteRunner};
use crate::runner::state::TestResult;
use crate::runner::stats::TimingStats;
use crate::suite::TransactionType;
use serde::{Deserialize, Serialize};

/// One executed case with the fields needed to read it on its own
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CaseReport {
    pub id: u32,
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    pub input: String,
    pub category: String,
    #[serde(default)]
    pub expected_output: Option<serde_json::Value>,
    #[serde(flatten)]
    pub result: TestResult,
}

/// Test results for report generation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    pub session_id: String,
    pub model: String,
    pub generated_at: String,
    pub summary: BatchSummary,
    pub results: Vec<CaseReport>,
    pub stats: Vec<TimingStats>,
}

impl RunReport {
    pub fn from_runner(runner: &TestSuiteRunner, summary: &BatchSummary) -> Self {
        let results = runner
            .results()
            .iter()
            .filter_map(|(id, result)| {
                let case = runner.suite().get(*id)?;
                Some(CaseReport {
                    id: *id,
                    transaction_type: case.transaction_type,
                    input: case.input.clone(),
                    category: case.category.clone(),
                    expected_output: case.expected_output.clone(),
                    result: result.clone(),
                })
            })
            .collect();

        Self {
            session_id: uuid::Uuid::new_v4().to_string(),
            model: runner.model().to_string(),
            generated_at: chrono::Utc::now().to_rfc3339(),
            summary: summary.clone(),
            results,
            stats: runner.timing_stats(),
        }
    }

    pub fn pass_rate(&self) -> u32 {
        if self.summary.executed == 0 {
            return 0;
        }
        (self.summary.passed as f64 / self.summary.executed as f64 * 100.0).round() as u32
    }
}
