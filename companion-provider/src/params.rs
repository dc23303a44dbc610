use serde::{Deserialize, Serialize};

/// Upper bound for sampling temperature.
pub const MAX_TEMPERATURE: f32 = 2.0;

/// Parameters passed to the generation capability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationParams {
    /// Model identifier understood by the capability.
    pub model: String,
    /// Maximum number of new tokens to generate.
    pub max_new_length: u32,
    /// Greedy decoding when set; sampling otherwise.
    pub deterministic: bool,
    /// Sampling temperature. Ignored when `deterministic` is set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

impl GenerationParams {
    pub fn new(model: impl Into<String>, max_new_length: u32, deterministic: bool) -> Self {
        Self {
            model: model.into(),
            max_new_length,
            deterministic,
            temperature: None,
        }
    }

    pub fn with_temperature(mut self, temperature: Option<f32>) -> Self {
        self.temperature = temperature;
        self
    }

    /// Clamp into safe bounds: `max_new_length` to `[1, ceiling]` and
    /// temperature to `[0, MAX_TEMPERATURE]`. Deterministic params carry no
    /// temperature.
    pub fn bounded(mut self, ceiling: u32) -> Self {
        self.max_new_length = self.max_new_length.clamp(1, ceiling.max(1));
        self.temperature = if self.deterministic {
            None
        } else {
            self.temperature
                .filter(|t| t.is_finite())
                .map(|t| t.clamp(0.0, MAX_TEMPERATURE))
        };
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn bounded_clamps_length() {
        assert_eq!(GenerationParams::new("m", 5_000, true).bounded(1024).max_new_length, 1024);
        assert_eq!(GenerationParams::new("m", 0, true).bounded(1024).max_new_length, 1);
        assert_eq!(GenerationParams::new("m", 160, true).bounded(1024).max_new_length, 160);
        assert_eq!(GenerationParams::new("m", 160, true).bounded(0).max_new_length, 1);
    }

    #[test]
    fn bounded_handles_temperature() {
        let det = GenerationParams::new("m", 10, true).with_temperature(Some(0.9));
        assert_eq!(det.bounded(100).temperature, None);

        let hot = GenerationParams::new("m", 10, false).with_temperature(Some(9.0));
        assert_eq!(hot.bounded(100).temperature, Some(MAX_TEMPERATURE));

        let cold = GenerationParams::new("m", 10, false).with_temperature(Some(-1.0));
        assert_eq!(cold.bounded(100).temperature, Some(0.0));

        let nan = GenerationParams::new("m", 10, false).with_temperature(Some(f32::NAN));
        assert_eq!(nan.bounded(100).temperature, None);
    }

    #[test]
    fn temperature_omitted_from_json_when_absent() {
        let json = serde_json::to_value(GenerationParams::new("llama3.2:1b", 160, true)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"model": "llama3.2:1b", "max_new_length": 160, "deterministic": true})
        );
    }
}
