use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{GenerationError, Result};
use crate::generator::TextGenerator;
use crate::params::GenerationParams;

/// Default address of a local Ollama server.
pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    num_predict: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: String,
}

/// [`TextGenerator`] backed by an Ollama server's `/api/generate` endpoint.
#[derive(Debug, Clone)]
pub struct OllamaGenerator {
    base_url: String,
    client: reqwest::Client,
}

impl OllamaGenerator {
    pub fn new(base_url: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| GenerationError::Other(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl TextGenerator for OllamaGenerator {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn generate(&self, prompt: &str, params: &GenerationParams) -> Result<String> {
        let url = format!("{}/api/generate", self.base_url);
        // Greedy decoding is temperature zero.
        let temperature = if params.deterministic {
            Some(0.0)
        } else {
            params.temperature
        };
        let body = GenerateRequest {
            model: &params.model,
            prompt,
            stream: false,
            options: GenerateOptions {
                num_predict: params.max_new_length,
                temperature,
            },
        };

        tracing::debug!(model = %params.model, max_new_length = params.max_new_length, "sending generate request");
        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() || e.is_timeout() {
                    GenerationError::Unavailable(e.to_string())
                } else {
                    GenerationError::Other(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let retry_after_secs = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|value| value.to_str().ok())
                .and_then(|value| value.trim().parse::<u64>().ok());
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorResponse>(&text)
                .map(|body| body.error)
                .unwrap_or(text);
            return Err(GenerationError::Status {
                status: status.as_u16(),
                message,
                retry_after_secs,
            });
        }

        let body: GenerateResponse = response
            .json()
            .await
            .map_err(|e| GenerationError::Malformed(e.to_string()))?;
        Ok(body.response)
    }
}
