use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::state::{PipelineStep, TestResult};

/// Summary of every observation of one pipeline step
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TimingStats {
    pub step: PipelineStep,
    pub min: u64,
    pub max: u64,
    pub avg: u64,
    pub median: u64,
    pub p95: u64,
    pub count: usize,
}

/// Reduce a non-empty sample.
///
/// `median` is the element at `n / 2` of the sorted sample (no averaging for
/// even sizes) and `p95` the element at `floor(0.95 * n)`, clamped to the
/// last index.
pub fn summarize(step: PipelineStep, samples: &[u64]) -> Option<TimingStats> {
    if samples.is_empty() {
        return None;
    }

    let mut sorted = samples.to_vec();
    sorted.sort_unstable();
    let n = sorted.len();

    let sum: u64 = sorted.iter().sum();
    let avg = (sum as f64 / n as f64).round() as u64;
    let p95_index = ((0.95 * n as f64).floor() as usize).min(n - 1);

    Some(TimingStats {
        step,
        min: sorted[0],
        max: sorted[n - 1],
        avg,
        median: sorted[n / 2],
        p95: sorted[p95_index],
        count: n,
    })
}

/// Group step timings of all finished results and summarize each step.
/// Results still `running` are ignored. Output is in pipeline order.
pub fn compute_timing_stats<'a, I>(results: I) -> Vec<TimingStats>
where
    I: IntoIterator<Item = &'a TestResult>,
{
    let mut by_step: BTreeMap<PipelineStep, Vec<u64>> = BTreeMap::new();
    for result in results {
        if !result.status.is_terminal() {
            continue;
        }
        for timing in &result.step_timings {
            by_step.entry(timing.step).or_default().push(timing.duration);
        }
    }

    by_step
        .iter()
        .filter_map(|(step, samples)| summarize(*step, samples))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::extraction::ExtractionOutcome;
    use crate::runner::state::{StepTiming, TestStatus};

    fn finished(timings: &[(PipelineStep, u64)]) -> TestResult {
        let mut result = TestResult::running();
        result.finish(
            TestStatus::Passed,
            ExtractionOutcome {
                response: Ok(serde_json::json!({})),
                raw_response: None,
                step_timings: timings
                    .iter()
                    .map(|(step, ms)| StepTiming::new(*step, *ms))
                    .collect(),
                latency: 0,
            },
        );
        result
    }

    #[test]
    fn test_odd_sample() {
        let stats = summarize(PipelineStep::Total, &[40, 10, 100, 30, 20]).unwrap();
        assert_eq!(stats.min, 10);
        assert_eq!(stats.max, 100);
        assert_eq!(stats.avg, 40);
        assert_eq!(stats.median, 30);
        assert_eq!(stats.p95, 100);
        assert_eq!(stats.count, 5);
    }

    #[test]
    fn test_even_sample_median_takes_index_half() {
        let stats = summarize(PipelineStep::Total, &[10, 20, 30, 40]).unwrap();
        assert_eq!(stats.median, 30);
        assert_eq!(stats.avg, 25);
        // floor(0.95 * 4) = 3
        assert_eq!(stats.p95, 40);
    }

    #[test]
    fn test_p95_index_on_larger_sample() {
        let samples: Vec<u64> = (1..=20).collect();
        let stats = summarize(PipelineStep::ApiRequest, &samples).unwrap();
        // floor(0.95 * 20) = 19
        assert_eq!(stats.p95, 20);
        assert_eq!(stats.median, 11);
    }

    #[test]
    fn test_single_sample_and_empty() {
        let stats = summarize(PipelineStep::Storage, &[7]).unwrap();
        assert_eq!((stats.min, stats.median, stats.p95, stats.max), (7, 7, 7, 7));
        assert!(summarize(PipelineStep::Storage, &[]).is_none());
    }

    #[test]
    fn test_avg_rounds_to_nearest() {
        assert_eq!(summarize(PipelineStep::Total, &[1, 2]).unwrap().avg, 2);
        assert_eq!(summarize(PipelineStep::Total, &[1, 1, 2]).unwrap().avg, 1);
    }

    #[test]
    fn test_compute_groups_by_step_and_skips_running() {
        let results = vec![
            finished(&[(PipelineStep::Total, 100), (PipelineStep::DataExtraction, 60)]),
            finished(&[(PipelineStep::Total, 300), (PipelineStep::ApiRequest, 250)]),
            TestResult::running(),
        ];

        let stats = compute_timing_stats(&results);
        let steps: Vec<PipelineStep> = stats.iter().map(|s| s.step).collect();
        assert_eq!(
            steps,
            vec![
                PipelineStep::ApiRequest,
                PipelineStep::DataExtraction,
                PipelineStep::Total
            ]
        );

        let total = stats.iter().find(|s| s.step == PipelineStep::Total).unwrap();
        assert_eq!(total.count, 2);
        assert_eq!(total.avg, 200);
    }
}
