pub mod error;
pub mod generator;
pub mod invoker;
pub mod ollama;
pub mod params;
pub mod retry;

pub use error::{GenerationError, Result};
pub use generator::TextGenerator;
pub use invoker::{GenerationInvoker, InvokerConfig};
pub use ollama::{DEFAULT_BASE_URL, OllamaGenerator};
pub use params::{GenerationParams, MAX_TEMPERATURE};
pub use retry::{ErrorClass, MAX_RETRIES, RetryPolicy};
