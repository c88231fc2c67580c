//! HTTP-level tests for the model client against a mock generateContent
//! endpoint. The API key resolves from GEMINI_API_KEY here; the keyring is
//! not available in test environments.

use daver::model::{GenerationOptions, ModelClient};
use daver::Error;
use mockito::Matcher;

const MODEL: &str = "gemini-2.0-flash";
const GENERATE_PATH: &str = "/models/gemini-2.0-flash:generateContent";

fn ensure_key() {
    std::env::set_var("GEMINI_API_KEY", "test-key");
}

fn client(server: &mockito::ServerGuard) -> ModelClient {
    ensure_key();
    ModelClient::with_base_url(MODEL, GenerationOptions::default(), &server.url()).unwrap()
}

#[tokio::test]
async fn successful_call_returns_candidate_text() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", GENERATE_PATH)
        .match_query(Matcher::UrlEncoded("key".into(), "test-key".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            serde_json::json!({
                "candidates": [{
                    "content": { "parts": [{"text": "분석 결과입니다."}], "role": "model" },
                    "finishReason": "STOP"
                }]
            })
            .to_string(),
        )
        .create_async()
        .await;

    let text = client(&server).generate("요약해줘").await.unwrap();
    assert_eq!(text, "분석 결과입니다.");
    mock.assert_async().await;
}

#[tokio::test]
async fn server_error_is_reported_without_retry() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", GENERATE_PATH)
        .match_query(Matcher::Any)
        .with_status(500)
        .with_body("internal")
        .expect(1)
        .create_async()
        .await;

    let err = client(&server).generate("q").await.unwrap_err();
    assert!(matches!(err, Error::Model { status: 500, .. }));
    mock.assert_async().await;
}

#[tokio::test]
async fn auth_rejection_is_a_credential_error() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", GENERATE_PATH)
        .match_query(Matcher::Any)
        .with_status(403)
        .with_body("API key not valid")
        .create_async()
        .await;

    let err = client(&server).generate("q").await.unwrap_err();
    assert!(err.halts_session());
}

#[tokio::test]
async fn response_without_candidates_is_a_validation_error() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", GENERATE_PATH)
        .match_query(Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"promptFeedback": {"blockReason": "SAFETY"}}"#)
        .create_async()
        .await;

    let err = client(&server).generate("q").await.unwrap_err();
    assert!(matches!(err, Error::Validation { .. }));
}

#[tokio::test]
async fn request_body_carries_prompt_and_generation_config() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", GENERATE_PATH)
        .match_query(Matcher::Any)
        .match_body(Matcher::PartialJson(serde_json::json!({
            "contents": [{"role": "user", "parts": [{"text": "프롬프트 내용"}]}],
            "generationConfig": {"temperature": 0.2, "maxOutputTokens": 2048}
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{"candidates": [{"content": {"parts": [{"text": "ok"}]}}]}"#,
        )
        .create_async()
        .await;

    client(&server).generate("프롬프트 내용").await.unwrap();
    mock.assert_async().await;
}
