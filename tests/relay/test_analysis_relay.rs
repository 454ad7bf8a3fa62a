//! Analysis relay: success, failure classes and timeout scaling.

use std::time::Duration;

use devscan_lib::config::AnalysisSettings;
use devscan_lib::error::AppError;
use devscan_lib::services::AnalysisClient;

use super::mock_ai_service::{MockAiService, closed_url};

fn client(url: &str, min_secs: u64, max_secs: u64) -> AnalysisClient {
    AnalysisClient::new(&AnalysisSettings {
        service_url: url.to_string(),
        min_timeout: Duration::from_secs(min_secs),
        max_timeout: Duration::from_secs(max_secs),
        chars_per_sec: 1000,
    })
    .expect("failed to build client")
}

#[actix_rt::test]
async fn test_analysis_success_extracts_examples() {
    let mock = MockAiService::start().await;
    let client = client(&mock.url, 5, 10);

    let outcome = client.analyze("let key = \"hunter2\";", "audit").await.unwrap();

    assert!(outcome.analysis.contains("Hardcoded secret"));
    assert_eq!(outcome.corrected_examples.len(), 1);
    assert_eq!(outcome.corrected_examples[0].issue, 1);
    assert_eq!(
        outcome.corrected_examples[0].code,
        "const key = process.env.API_KEY;"
    );

    let received = mock.received();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].analysis_type, "audit");
}

#[actix_rt::test]
async fn test_service_examples_take_precedence() {
    let mock = MockAiService::start().await;
    let client = client(&mock.url, 5, 10);

    let outcome = client.analyze("EXPLICIT", "audit").await.unwrap();

    assert_eq!(outcome.corrected_examples.len(), 1);
    assert_eq!(outcome.corrected_examples[0].issue, 7);
}

#[actix_rt::test]
async fn test_empty_code_is_rejected_locally() {
    let mock = MockAiService::start().await;
    let client = client(&mock.url, 5, 10);

    let err = client.analyze("   ", "audit").await.unwrap_err();

    assert!(matches!(err, AppError::InvalidInput(_)));
    assert!(mock.received().is_empty());
}

#[actix_rt::test]
async fn test_refused_connection_is_service_unavailable() {
    let client = client(&closed_url(), 5, 10);

    let err = client.analyze("fn main() {}", "audit").await.unwrap_err();

    assert!(matches!(err, AppError::ServiceUnavailable));
}

#[actix_rt::test]
async fn test_slow_service_times_out() {
    let mock = MockAiService::start().await;
    let client = client(&mock.url, 1, 1);

    let err = client.analyze("SLOW", "audit").await.unwrap_err();

    assert!(matches!(err, AppError::Timeout));
}

#[actix_rt::test]
async fn test_service_error_is_analysis_failed() {
    let mock = MockAiService::start().await;
    let client = client(&mock.url, 5, 10);

    let err = client.analyze("FAIL", "audit").await.unwrap_err();

    assert!(matches!(err, AppError::AnalysisFailed(_)));
}

#[actix_rt::test]
async fn test_large_input_timeout_is_clamped() {
    let mock = MockAiService::start().await;
    let code = "x".repeat(50_000);

    // 30s + 50s scaled, capped at 60s
    let capped = client(&mock.url, 30, 60);
    assert_eq!(capped.timeout_for(code.len()), Duration::from_secs(60));

    let roomy = client(&mock.url, 30, 300);
    assert_eq!(roomy.timeout_for(code.len()), Duration::from_secs(80));

    roomy.analyze(&code, "audit").await.unwrap();
    assert_eq!(mock.received()[0].code.len(), 50_000);
}
