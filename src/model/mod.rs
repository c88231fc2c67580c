//! Remote model client.
//!
//! A single non-streaming `generateContent` call per user action: the
//! constructed prompt goes out, free text comes back. Failures (network,
//! authentication, unparsable body) surface as user-visible messages and are
//! never retried automatically.

mod gemini;
mod transport;

pub use gemini::{build_request, extract_text, finish_reason};
pub use transport::{resolve_api_key, ModelTransport};

use crate::error::{Error, ErrorContext};
use crate::Result;
use tracing::debug;

/// Generation parameters forwarded to the model.
#[derive(Debug, Clone)]
pub struct GenerationOptions {
    pub temperature: Option<f64>,
    pub max_output_tokens: Option<u32>,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            temperature: Some(0.2),
            max_output_tokens: Some(2048),
        }
    }
}

/// Client for the hosted text-generation endpoint. The model name is fixed at
/// construction time.
pub struct ModelClient {
    transport: ModelTransport,
    options: GenerationOptions,
}

impl ModelClient {
    pub fn new(model: &str, options: GenerationOptions) -> Result<Self> {
        Ok(Self {
            transport: ModelTransport::new(model)?,
            options,
        })
    }

    /// Override the endpoint base URL (testing with mock servers).
    pub fn with_base_url(model: &str, options: GenerationOptions, base_url: &str) -> Result<Self> {
        Ok(Self {
            transport: ModelTransport::with_base_url(model, base_url)?,
            options,
        })
    }

    pub fn model(&self) -> &str {
        self.transport.model()
    }

    /// Send `prompt` and return the model's raw text response.
    pub async fn generate(&self, prompt: &str) -> Result<String> {
        let body = build_request(
            prompt,
            self.options.temperature,
            self.options.max_output_tokens,
        );
        let response = self.transport.generate_content(&body).await?;
        debug!(
            model = self.transport.model(),
            finish = finish_reason(&response).as_deref().unwrap_or("unknown"),
            "model response received"
        );
        extract_text(&response).ok_or_else(|| {
            Error::validation_with_context(
                "model response had no text candidate",
                ErrorContext::new()
                    .with_details(truncate(&response.to_string(), 300))
                    .with_source("model_client"),
            )
        })
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.len() <= max {
        s.to_string()
    } else {
        let mut end = max;
        while !s.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}…", &s[..end])
    }
}
