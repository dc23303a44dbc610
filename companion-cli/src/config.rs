use std::path::{Path, PathBuf};

use anyhow::Context;
use companion_guardrails::GuardrailPolicy;
use companion_provider::{DEFAULT_BASE_URL, InvokerConfig};
use companion_recipes::{Recipe, RecipeRegistry, built_in_recipes};
use serde::{Deserialize, Serialize};

pub const DEFAULT_CONFIG_FILE: &str = "companion.toml";
pub const CONFIG_ENV: &str = "COMPANION_CONFIG";
pub const GENERATOR_URL_ENV: &str = "COMPANION_GENERATOR_URL";

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratorConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
        }
    }
}

/// Contents of `companion.toml`. Every section is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompanionConfig {
    #[serde(default)]
    pub generator: GeneratorConfig,
    #[serde(default)]
    pub invoker: InvokerConfig,
    #[serde(default)]
    pub guardrails: GuardrailPolicy,
    /// Replaces the built-in recipes when non-empty.
    #[serde(default)]
    pub recipes: Vec<Recipe>,
}

/// A config file location and whether it has to exist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigSource {
    pub path: PathBuf,
    pub required: bool,
}

/// `--config` beats `$COMPANION_CONFIG`, which beats `./companion.toml`.
/// Only the implicit default may be missing.
pub fn resolve_config_path(explicit: Option<&Path>, env_value: Option<String>) -> ConfigSource {
    if let Some(path) = explicit {
        return ConfigSource {
            path: path.to_path_buf(),
            required: true,
        };
    }
    match env_value.filter(|v| !v.trim().is_empty()) {
        Some(path) => ConfigSource {
            path: PathBuf::from(path),
            required: true,
        },
        None => ConfigSource {
            path: PathBuf::from(DEFAULT_CONFIG_FILE),
            required: false,
        },
    }
}

impl CompanionConfig {
    pub fn from_toml(raw: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(raw)
    }

    /// Load the config for this process, environment overrides applied.
    pub fn load(explicit: Option<&Path>) -> anyhow::Result<Self> {
        let source = resolve_config_path(explicit, std::env::var(CONFIG_ENV).ok());
        let mut config = Self::load_from(&source)?;
        config.apply_generator_url(std::env::var(GENERATOR_URL_ENV).ok());
        Ok(config)
    }

    pub fn load_from(source: &ConfigSource) -> anyhow::Result<Self> {
        if !source.required && !source.path.exists() {
            tracing::debug!(path = %source.path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(&source.path)
            .with_context(|| format!("failed to read config {}", source.path.display()))?;
        let config = Self::from_toml(&raw)
            .with_context(|| format!("failed to parse config {}", source.path.display()))?;
        tracing::debug!(path = %source.path.display(), "loaded config");
        Ok(config)
    }

    pub fn apply_generator_url(&mut self, url: Option<String>) {
        if let Some(url) = url.filter(|u| !u.trim().is_empty()) {
            self.generator.base_url = url;
        }
    }

    /// The configured recipes, or the built-ins when none are configured.
    pub fn registry(&self) -> companion_recipes::Result<RecipeRegistry> {
        if self.recipes.is_empty() {
            RecipeRegistry::new(built_in_recipes())
        } else {
            RecipeRegistry::new(self.recipes.clone())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_file_means_defaults() {
        let config = CompanionConfig::from_toml("").unwrap();
        assert_eq!(config, CompanionConfig::default());
        assert_eq!(config.generator.base_url, "http://localhost:11434");
        assert_eq!(config.invoker.timeout_secs, 30);
        assert_eq!(config.guardrails.max_output_chars, 600);
        assert_eq!(config.registry().unwrap().len(), 3);
    }

    #[test]
    fn full_config_parses() {
        let config = CompanionConfig::from_toml(
            r#"
            [generator]
            base_url = "http://gpu-box:11434"

            [invoker]
            timeout_secs = 10
            max_retries = 0

            [guardrails]
            max_output_chars = 280

            [[recipes]]
            id = "standup"
            template = "Turn these notes into a standup update:\n{context}"
            defaults = { max_new_length = 120 }
            profile = { name = "llama3.2:3b", tier = "quality" }
            output_format = { kind = "bullets", max_bullets = 5 }
            "#,
        )
        .unwrap();

        assert_eq!(config.generator.base_url, "http://gpu-box:11434");
        assert_eq!(config.invoker.timeout_secs, 10);
        assert_eq!(config.invoker.max_retries, 0);
        assert_eq!(config.invoker.retry_delay_ms, 500);
        assert_eq!(config.guardrails.max_output_chars, 280);
        assert_eq!(config.guardrails.rules.len(), 6);

        let registry = config.registry().unwrap();
        assert_eq!(registry.ids().collect::<Vec<_>>(), vec!["standup"]);
        assert!(registry.get("summary").is_err());
    }

    #[test]
    fn invalid_recipe_in_config_fails_registry() {
        let config = CompanionConfig::from_toml(
            r#"
            [[recipes]]
            id = "broken"
            template = "no placeholder here"
            defaults = { max_new_length = 10 }
            profile = { name = "m", tier = "fast" }
            "#,
        )
        .unwrap();
        assert!(config.registry().is_err());
    }

    #[test]
    fn config_path_resolution_order() {
        let explicit = resolve_config_path(Some(Path::new("a.toml")), Some("b.toml".into()));
        assert_eq!(
            explicit,
            ConfigSource {
                path: PathBuf::from("a.toml"),
                required: true
            }
        );

        let from_env = resolve_config_path(None, Some("b.toml".into()));
        assert_eq!(from_env.path, PathBuf::from("b.toml"));
        assert!(from_env.required);

        let fallback = resolve_config_path(None, Some("  ".into()));
        assert_eq!(fallback.path, PathBuf::from(DEFAULT_CONFIG_FILE));
        assert!(!fallback.required);
    }

    #[test]
    fn missing_required_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = ConfigSource {
            path: dir.path().join("nope.toml"),
            required: true,
        };
        let err = CompanionConfig::load_from(&missing).unwrap_err();
        assert!(err.to_string().contains("nope.toml"));

        let optional = ConfigSource {
            required: false,
            ..missing
        };
        assert_eq!(
            CompanionConfig::load_from(&optional).unwrap(),
            CompanionConfig::default()
        );
    }

    #[test]
    fn generator_url_override() {
        let mut config = CompanionConfig::default();
        config.apply_generator_url(None);
        assert_eq!(config.generator.base_url, DEFAULT_BASE_URL);
        config.apply_generator_url(Some("http://127.0.0.1:9999".into()));
        assert_eq!(config.generator.base_url, "http://127.0.0.1:9999");
    }
}
