pub mod clean;
pub mod error;
pub mod format;
pub mod orchestrator;
pub mod request;

pub use clean::clean_text;
pub use error::{PipelineError, Result};
pub use format::{WRAP_WIDTH, to_bullets};
pub use orchestrator::Pipeline;
pub use request::{RunOverrides, RunRequest, RunResult};
