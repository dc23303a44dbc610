pub mod cap;
pub mod error;
pub mod filter;
pub mod policy;
pub mod redact;
pub mod scan;
pub mod validate;

pub use cap::{Capped, cap};
pub use error::{GuardrailError, Result};
pub use filter::GuardrailFilter;
pub use policy::{
    DEFAULT_MAX_INPUT_CHARS, DEFAULT_MAX_OUTPUT_CHARS, DEFAULT_TRUNCATION_MARKER, GuardrailPolicy,
    RedactionRule, default_rules,
};
pub use redact::{Redaction, Redactor};
pub use scan::{SENSITIVE_KEYWORDS, ScanReport, find_sensitive_keywords};
pub use validate::{InputViolation, validate_input};
