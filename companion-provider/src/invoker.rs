use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{GenerationError, Result};
use crate::generator::TextGenerator;
use crate::params::GenerationParams;
use crate::retry::{MAX_RETRIES, RetryPolicy};

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    MAX_RETRIES
}

fn default_retry_delay_ms() -> u64 {
    500
}

fn default_max_new_length_ceiling() -> u32 {
    1024
}

/// Invoker settings, as read from the `[invoker]` config table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvokerConfig {
    /// Deadline for a whole invocation, retry included.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
    /// Upper bound applied to every `max_new_length`.
    #[serde(default = "default_max_new_length_ceiling")]
    pub max_new_length_ceiling: u32,
}

impl Default for InvokerConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            retry_delay_ms: default_retry_delay_ms(),
            max_new_length_ceiling: default_max_new_length_ceiling(),
        }
    }
}

impl InvokerConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Reject settings under which no invocation could succeed.
    pub fn validate(&self) -> Result<()> {
        if self.timeout_secs == 0 {
            return Err(GenerationError::InvalidConfig(
                "timeout_secs must be positive".to_string(),
            ));
        }
        if self.max_new_length_ceiling == 0 {
            return Err(GenerationError::InvalidConfig(
                "max_new_length_ceiling must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// GenerationInvoker
// ---------------------------------------------------------------------------

/// Calls a [`TextGenerator`] under a deadline with at most one retry.
#[derive(Clone)]
pub struct GenerationInvoker {
    generator: Arc<dyn TextGenerator>,
    config: InvokerConfig,
    retry: RetryPolicy,
}

impl std::fmt::Debug for GenerationInvoker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenerationInvoker")
            .field("generator", &self.generator.name())
            .field("config", &self.config)
            .finish()
    }
}

impl GenerationInvoker {
    pub fn new(generator: Arc<dyn TextGenerator>, config: InvokerConfig) -> Result<Self> {
        config.validate()?;
        let retry = RetryPolicy::new(config.max_retries, config.retry_delay_ms);
        Ok(Self {
            generator,
            config,
            retry,
        })
    }

    pub fn config(&self) -> &InvokerConfig {
        &self.config
    }

    /// Clamp `params` to the configured bounds.
    pub fn bound(&self, params: GenerationParams) -> GenerationParams {
        params.bounded(self.config.max_new_length_ceiling)
    }

    /// Generate text for `prompt`.
    ///
    /// The deadline covers every attempt and the delay between them; when it
    /// passes the in-flight call is dropped and [`GenerationError::Timeout`]
    /// is returned. Blank output is reported as
    /// [`GenerationError::Malformed`].
    pub async fn invoke(&self, prompt: &str, params: GenerationParams) -> Result<String> {
        let params = self.bound(params);
        let limit = self.config.timeout();
        match tokio::time::timeout(limit, self.invoke_with_retry(prompt, &params)).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(
                    generator = self.generator.name(),
                    model = %params.model,
                    timeout_secs = limit.as_secs(),
                    "generation timed out"
                );
                Err(GenerationError::Timeout(limit))
            }
        }
    }

    async fn invoke_with_retry(&self, prompt: &str, params: &GenerationParams) -> Result<String> {
        let mut attempt = 0;
        loop {
            let outcome = self
                .generator
                .generate(prompt, params)
                .await
                .and_then(non_blank);
            let err = match outcome {
                Ok(text) => return Ok(text),
                Err(err) => err,
            };

            let class = RetryPolicy::classify(&err);
            let delay = if RetryPolicy::should_retry(&class) {
                self.retry.next_delay(attempt, &class)
            } else {
                None
            };
            let Some(delay) = delay else {
                return Err(err);
            };

            tracing::warn!(
                generator = self.generator.name(),
                attempt = attempt + 1,
                delay_ms = delay.as_millis() as u64,
                error = %err,
                "transient generation failure, retrying"
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }
}

fn non_blank(text: String) -> Result<String> {
    if text.trim().is_empty() {
        Err(GenerationError::Malformed("empty response".to_string()))
    } else {
        Ok(text)
    }
}
