use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use vaani_tester::error::ClientError;
use vaani_tester::runner::{
    ExtractionClient, ExtractionRequest, HttpExtractionClient, PipelineStep, TestStatus,
    TestSuiteRunner,
};
use vaani_tester::suite::{CaseFilter, TestCase, TestSuite, TransactionType};

fn endpoint(server: &MockServer) -> String {
    format!("{}/api/extract", server.uri())
}

#[tokio::test]
async fn posts_camel_case_body_and_returns_reply() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/extract"))
        .and(body_json(json!({
            "modelName": "gpt-4o-mini",
            "text": "Spent 50 on chai",
            "transactionType": "expense",
            "includeTimings": true
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"invoice": {"amount": 50}})))
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpExtractionClient::new(&endpoint(&server), Duration::from_secs(5)).unwrap();
    let case = TestCase::new(1, TransactionType::Expense, " Spent 50 on chai ", "basic");
    let reply = client
        .extract(&ExtractionRequest::for_case("gpt-4o-mini", &case))
        .await
        .unwrap();

    assert!(reply.is_success());
    assert_eq!(reply.status, 200);
    assert!(reply.body.contains("\"amount\":50"));
}

#[tokio::test]
async fn non_success_status_is_a_reply_not_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
        .mount(&server)
        .await;

    let client = HttpExtractionClient::new(&endpoint(&server), Duration::from_secs(5)).unwrap();
    let reply = client
        .extract(&ExtractionRequest::new("m", "hello"))
        .await
        .unwrap();

    assert_eq!(reply.status, 500);
    assert!(!reply.is_success());
    assert_eq!(reply.body, "upstream exploded");
}

#[tokio::test]
async fn slow_server_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({}))
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&server)
        .await;

    let client =
        HttpExtractionClient::new(&endpoint(&server), Duration::from_millis(50)).unwrap();
    let err = client
        .extract(&ExtractionRequest::new("m", "hello"))
        .await
        .unwrap_err();

    assert!(matches!(err, ClientError::Timeout(50)), "got {:?}", err);
}

#[tokio::test]
async fn runner_batch_against_http_server() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/extract"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "invoice": {"amount": 120, "party": "Ravi"},
            "metadata": {"timings": {"intent_classification": 15, "data_extraction": 40}}
        })))
        .mount(&server)
        .await;

    let suite = TestSuite::from_cases(vec![
        TestCase::new(1, TransactionType::PaymentIn, "Ravi paid 120", "basic")
            .with_expected_output(json!(120)),
        TestCase::new(2, TransactionType::PaymentIn, "Ravi paid 999", "basic")
            .with_expected_output(json!(999)),
    ]);
    let client = HttpExtractionClient::new(&endpoint(&server), Duration::from_secs(5)).unwrap();
    let mut runner = TestSuiteRunner::new(suite, Box::new(client), "gpt-4o-mini")
        .with_inter_case_delay(Duration::from_millis(10));

    let summary = runner.run_batch(&CaseFilter::default()).await;

    assert_eq!(summary.executed, 2);
    assert_eq!(summary.passed, 1);
    assert_eq!(summary.failed, 1);

    let first = runner.result(1).unwrap();
    assert_eq!(first.status, TestStatus::Passed);
    assert_eq!(first.timing(PipelineStep::IntentClassification), Some(15));
    assert_eq!(first.timing(PipelineStep::DataExtraction), Some(40));
    assert!(first.timing(PipelineStep::Total).is_some());
    assert_eq!(runner.result(2).unwrap().status, TestStatus::Failed);
}
