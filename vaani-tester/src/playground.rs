//! Side-by-side model comparison for a single utterance
//!
//! Models are queried one after another with the same text. A failure for
//! one model is recorded and the comparison moves on.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::SuiteError;
use crate::runner::client::{ExtractionClient, ExtractionRequest};
use crate::runner::extraction;
use crate::runner::state::StepTiming;
use crate::suite::TransactionType;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Success,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlaygroundRun {
    pub model: String,
    pub status: RunStatus,
    pub output: Option<Value>,
    pub error: Option<String>,
    pub latency: u64,
    pub step_timings: Vec<StepTiming>,
}

pub async fn compare_models(
    client: &dyn ExtractionClient,
    text: &str,
    type_hint: Option<TransactionType>,
    models: &[String],
) -> Result<Vec<PlaygroundRun>, SuiteError> {
    if text.trim().is_empty() {
        return Err(SuiteError::BlankInput);
    }

    let mut runs = Vec::with_capacity(models.len());
    for model in models {
        let request = ExtractionRequest {
            transaction_type: type_hint.map(|t| t.as_str().to_string()),
            ..ExtractionRequest::new(model, text)
        };
        let outcome = extraction::execute(client, &request).await;

        let run = match &outcome.response {
            Ok(_) => PlaygroundRun {
                model: model.clone(),
                status: RunStatus::Success,
                output: Some(outcome.output()),
                error: None,
                latency: outcome.latency,
                step_timings: outcome.step_timings,
            },
            Err(message) => {
                log::warn!("Playground run for {} failed: {}", model, message);
                PlaygroundRun {
                    model: model.clone(),
                    status: RunStatus::Error,
                    output: None,
                    error: Some(message.clone()),
                    latency: outcome.latency,
                    step_timings: outcome.step_timings,
                }
            }
        };
        runs.push(run);
    }
    Ok(runs)
}
