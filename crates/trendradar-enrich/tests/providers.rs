//! Integration tests for the enrichment provider clients, using wiremock.

use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use trendradar_enrich::{AdviceClient, EnrichError, ImageClient, TrendSummary};

fn summary() -> TrendSummary {
    TrendSummary {
        trend_key: "hoodie|oversize|cotton".to_owned(),
        name: "Oversize Hoodie".to_owned(),
        category: "hoodie".to_owned(),
        cut: "oversize".to_owned(),
        material: "cotton".to_owned(),
        color: Some("black".to_owned()),
        style: None,
        segment: "womenswear".to_owned(),
        average_price: Some("29.99".parse().unwrap()),
    }
}

fn advice_client(server: &MockServer) -> AdviceClient {
    AdviceClient::new(&server.uri(), "test-key", "test-model", 5).expect("client builds")
}

fn image_client(server: &MockServer) -> ImageClient {
    ImageClient::new(&server.uri(), "test-key", 5).expect("client builds")
}

fn completion_body(content: &str) -> serde_json::Value {
    json!({
        "choices": [{"message": {"role": "assistant", "content": content}}]
    })
}

// ---------------------------------------------------------------------------
// Advice client
// ---------------------------------------------------------------------------

#[tokio::test]
async fn advice_parses_structured_completion() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer test-key"))
        .and(body_partial_json(json!({"model": "test-model"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(&completion_body(
            r#"{"advice": "Stock two colorways.", "rating": 4, "image_prompt": "hoodie photo"}"#,
        )))
        .mount(&server)
        .await;

    let advice = advice_client(&server)
        .generate_advice(&summary())
        .await
        .expect("advice");
    assert_eq!(advice.advice, "Stock two colorways.");
    assert_eq!(advice.rating, Some(4));
    assert_eq!(advice.image_prompt.as_deref(), Some("hoodie photo"));
}

#[tokio::test]
async fn advice_falls_back_to_prose_content() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(&completion_body("Order early, margins are wide.")),
        )
        .mount(&server)
        .await;

    let advice = advice_client(&server)
        .generate_advice(&summary())
        .await
        .expect("advice");
    assert_eq!(advice.advice, "Order early, margins are wide.");
    assert!(advice.rating.is_none());
}

#[tokio::test]
async fn advice_maps_402_to_quota_exceeded() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(402))
        .mount(&server)
        .await;

    let err = advice_client(&server)
        .generate_advice(&summary())
        .await
        .unwrap_err();
    assert!(matches!(err, EnrichError::QuotaExceeded { .. }));
}

#[tokio::test]
async fn advice_maps_quota_429_to_quota_exceeded() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(
            ResponseTemplate::new(429)
                .set_body_json(&json!({"error": {"code": "insufficient_quota"}})),
        )
        .mount(&server)
        .await;

    let err = advice_client(&server)
        .generate_advice(&summary())
        .await
        .unwrap_err();
    assert!(matches!(err, EnrichError::QuotaExceeded { .. }));
}

#[tokio::test]
async fn advice_maps_server_error_to_unexpected_status() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let err = advice_client(&server)
        .generate_advice(&summary())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EnrichError::UnexpectedStatus { status: 500, .. }
    ));
}

#[tokio::test]
async fn advice_rejects_empty_choices() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&json!({"choices": []})))
        .mount(&server)
        .await;

    let err = advice_client(&server)
        .generate_advice(&summary())
        .await
        .unwrap_err();
    assert!(matches!(err, EnrichError::MalformedCompletion { .. }));
}

// ---------------------------------------------------------------------------
// Image client
// ---------------------------------------------------------------------------

#[tokio::test]
async fn image_returns_hosted_url() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/images/generations"))
        .and(body_partial_json(json!({"aspect_ratio": "3:4"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(&json!({
            "data": [{"url": "https://cdn.example.com/generated/1.png"}]
        })))
        .mount(&server)
        .await;

    let url = image_client(&server)
        .generate_image("hoodie photo", "3:4")
        .await
        .expect("image url");
    assert_eq!(url, "https://cdn.example.com/generated/1.png");
}

#[tokio::test]
async fn image_maps_402_to_quota_exceeded() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/images/generations"))
        .respond_with(ResponseTemplate::new(402))
        .mount(&server)
        .await;

    let err = image_client(&server)
        .generate_image("hoodie photo", "3:4")
        .await
        .unwrap_err();
    assert!(matches!(err, EnrichError::QuotaExceeded { .. }));
}

#[tokio::test]
async fn image_rejects_response_without_url() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/images/generations"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&json!({"data": [{"url": null}]})))
        .mount(&server)
        .await;

    let err = image_client(&server)
        .generate_image("hoodie photo", "3:4")
        .await
        .unwrap_err();
    assert!(matches!(err, EnrichError::MalformedCompletion { .. }));
}
