use chrono::Utc;
use serde_json::{json, Value};
use std::time::Instant;

use super::client::{ExtractionClient, ExtractionReply, ExtractionRequest};
use super::state::{PipelineStep, StepTiming};

/// Timing keys the server may report, and the step each maps to
const SERVER_TIMING_KEYS: [(&str, PipelineStep); 5] = [
    ("server_processing", PipelineStep::ServerProcessing),
    ("intent_classification", PipelineStep::IntentClassification),
    ("data_extraction", PipelineStep::DataExtraction),
    ("validation", PipelineStep::Validation),
    ("storage", PipelineStep::Storage),
];

/// Interpreted result of one extraction call
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionOutcome {
    /// Parsed response body, or a human-readable error
    pub response: Result<Value, String>,
    pub raw_response: Option<String>,
    /// Always ends with a `total` entry
    pub step_timings: Vec<StepTiming>,
    pub latency: u64,
}

impl ExtractionOutcome {
    /// The `invoice` object when present, else the whole payload
    pub fn output(&self) -> Value {
        match &self.response {
            Ok(payload) => payload
                .get("invoice")
                .filter(|v| !v.is_null())
                .cloned()
                .unwrap_or_else(|| payload.clone()),
            Err(message) => json!({ "error": message }),
        }
    }

    pub fn is_error(&self) -> bool {
        self.response.is_err()
    }
}

/// Pull recognized step timings from `timings` or `metadata.timings`.
/// Steps the server does not report are left out.
pub fn server_timings(payload: &Value) -> Vec<StepTiming> {
    let timings = payload
        .get("timings")
        .filter(|t| t.is_object())
        .or_else(|| payload.pointer("/metadata/timings").filter(|t| t.is_object()));

    let Some(timings) = timings else {
        return Vec::new();
    };

    SERVER_TIMING_KEYS
        .iter()
        .filter_map(|(key, step)| {
            let ms = timings.get(*key)?.as_f64()?;
            (ms >= 0.0).then(|| StepTiming::new(*step, ms.round() as u64))
        })
        .collect()
}

/// `HTTP <status>: <detail>` for a non-2xx reply
pub fn http_error_message(reply: &ExtractionReply) -> String {
    let from_json = serde_json::from_str::<Value>(&reply.body)
        .ok()
        .and_then(|body| {
            ["error", "message", "detail"]
                .iter()
                .find_map(|key| body.get(*key).and_then(Value::as_str).map(str::to_string))
        });

    let detail = from_json
        .or_else(|| {
            let text = reply.body.trim();
            (!text.is_empty()).then(|| text.to_string())
        })
        .or_else(|| {
            reqwest::StatusCode::from_u16(reply.status)
                .ok()
                .and_then(|s| s.canonical_reason())
                .map(str::to_string)
        })
        .unwrap_or_else(|| "request failed".to_string());

    format!("HTTP {}: {}", reply.status, detail)
}

fn elapsed_ms(since: Instant) -> u64 {
    since.elapsed().as_millis() as u64
}

/// Issue one request and interpret the reply. Never fails: transport and
/// parse problems are folded into [`ExtractionOutcome::response`].
pub async fn execute(
    client: &dyn ExtractionClient,
    request: &ExtractionRequest,
) -> ExtractionOutcome {
    let started = Instant::now();
    let started_at = Utc::now();
    let mut step_timings = Vec::new();

    let reply = client.extract(request).await;
    step_timings.push(StepTiming::spanning(
        PipelineStep::ApiRequest,
        elapsed_ms(started),
        started_at,
        Utc::now(),
    ));

    let (response, raw_response) = match reply {
        Err(e) => (Err(e.to_string()), None),
        Ok(reply) if !reply.is_success() => (Err(http_error_message(&reply)), Some(reply.body)),
        Ok(reply) => {
            let parse_started = Instant::now();
            let parsed = serde_json::from_str::<Value>(&reply.body);
            step_timings.push(StepTiming::new(
                PipelineStep::ResponseParse,
                elapsed_ms(parse_started),
            ));

            match parsed {
                Ok(payload) => {
                    step_timings.extend(server_timings(&payload));
                    (Ok(payload), Some(reply.body))
                }
                Err(e) => (
                    Err(format!("Invalid JSON response: {}", e)),
                    Some(reply.body),
                ),
            }
        }
    };

    let latency = elapsed_ms(started);
    step_timings.push(StepTiming::spanning(
        PipelineStep::Total,
        latency,
        started_at,
        Utc::now(),
    ));

    if let Err(ref message) = response {
        log::debug!("Extraction failed after {}ms: {}", latency, message);
    }

    ExtractionOutcome {
        response,
        raw_response,
        step_timings,
        latency,
    }
}
