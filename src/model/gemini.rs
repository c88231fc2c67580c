//! Gemini generateContent request/response shapes.
//!
//! Key points of the API:
//! - Uses `contents` with `parts` instead of a flat message list.
//! - `generationConfig` wraps temperature and max_tokens (→ `maxOutputTokens`).
//! - Response text lives at `candidates[0].content.parts[0].text`.
//! - The API key travels as a `?key=` query parameter, not in headers.

use serde_json::Value;

/// Build the request body for a single-prompt generation call.
pub fn build_request(
    prompt: &str,
    temperature: Option<f64>,
    max_output_tokens: Option<u32>,
) -> Value {
    let mut body = serde_json::json!({
        "contents": [{
            "role": "user",
            "parts": [{ "text": prompt }],
        }],
    });

    let mut gen_config = serde_json::json!({});
    if let Some(t) = temperature {
        gen_config["temperature"] = serde_json::json!(t);
    }
    if let Some(mt) = max_output_tokens {
        gen_config["maxOutputTokens"] = serde_json::json!(mt);
    }
    if gen_config != serde_json::json!({}) {
        body["generationConfig"] = gen_config;
    }

    body
}

/// Extract the text of the first candidate, when present.
pub fn extract_text(body: &Value) -> Option<String> {
    body.pointer("/candidates/0/content/parts/0/text")
        .and_then(|v| v.as_str())
        .map(String::from)
}

/// Normalized finish reason of the first candidate.
pub fn finish_reason(body: &Value) -> Option<String> {
    body.pointer("/candidates/0/finishReason")
        .and_then(|v| v.as_str())
        .map(|r| match r {
            "STOP" => "stop".to_string(),
            "MAX_TOKENS" => "length".to_string(),
            "SAFETY" => "content_filter".to_string(),
            "RECITATION" => "content_filter".to_string(),
            other => other.to_lowercase(),
        })
}
