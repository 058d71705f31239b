//! Engine configuration file parsing.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::runner::ds::error::BindingError;

lazy_static! {
    /// Configuration used when none is supplied.
    pub static ref DEFAULT_CONFIG: EngineConfig = EngineConfig {
        binding: BindingSection {
            reactive_error_policy: ErrorPolicy::Log,
        },
        observation: ObservationSection { strict: false },
        templating: TemplatingSection {
            cache_conditional_views: true,
        },
    };
}

/// What a binding does with an error raised while reacting to a change.
/// Errors during the initial `bind` always surface regardless.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorPolicy {
    /// Emit a warning and keep the last good value.
    Log,
    /// Hand the error back to whoever mutated the model.
    Propagate,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct BindingSection {
    pub reactive_error_policy: ErrorPolicy,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ObservationSection {
    /// Fail with `ObservationUnsupported` instead of silently skipping
    /// properties that cannot be intercepted.
    pub strict: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct TemplatingSection {
    /// Keep the views of an `if` branch around for reuse after it toggles off.
    pub cache_conditional_views: bool,
}

/// Complete engine configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    pub binding: BindingSection,
    pub observation: ObservationSection,
    pub templating: TemplatingSection,
}

impl EngineConfig {
    /// Load configuration from a TOML file.
    ///
    /// Expected format:
    /// ```toml
    /// [binding]
    /// reactive_error_policy = "propagate"
    ///
    /// [observation]
    /// strict = true
    ///
    /// [templating]
    /// cache_conditional_views = false
    /// ```
    pub fn load(path: &Path) -> Result<Self, BindingError> {
        let content = fs::read_to_string(path).map_err(|e| {
            BindingError::configuration(format!(
                "failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::parse(&content)
    }

    /// Parse configuration from a TOML string. Missing keys keep their
    /// defaults.
    pub fn parse(content: &str) -> Result<Self, BindingError> {
        toml::from_str(content).map_err(|e| BindingError::configuration(e.to_string()))
    }

    pub fn reactive_error_policy(&self) -> ErrorPolicy {
        self.binding.reactive_error_policy
    }

    pub fn strict_observation(&self) -> bool {
        self.observation.strict
    }

    pub fn cache_conditional_views(&self) -> bool {
        self.templating.cache_conditional_views
    }

    pub fn with_error_policy(mut self, policy: ErrorPolicy) -> Self {
        self.binding.reactive_error_policy = policy;
        self
    }

    pub fn with_strict_observation(mut self, strict: bool) -> Self {
        self.observation.strict = strict;
        self
    }

    pub fn with_conditional_view_cache(mut self, cache: bool) -> Self {
        self.templating.cache_conditional_views = cache;
        self
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        DEFAULT_CONFIG.clone()
    }
}

impl Default for BindingSection {
    fn default() -> Self {
        DEFAULT_CONFIG.binding.clone()
    }
}

impl Default for ObservationSection {
    fn default() -> Self {
        DEFAULT_CONFIG.observation.clone()
    }
}

impl Default for TemplatingSection {
    fn default() -> Self {
        DEFAULT_CONFIG.templating.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_empty_config() {
        let config = EngineConfig::parse("").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.reactive_error_policy(), ErrorPolicy::Log);
        assert!(!config.strict_observation());
        assert!(config.cache_conditional_views());
    }

    #[test]
    fn test_parse_all_sections() {
        let config = EngineConfig::parse(
            r#"
            [binding]
            reactive_error_policy = "propagate"

            [observation]
            strict = true

            [templating]
            cache_conditional_views = false
            "#,
        )
        .unwrap();
        assert_eq!(config.reactive_error_policy(), ErrorPolicy::Propagate);
        assert!(config.strict_observation());
        assert!(!config.cache_conditional_views());
    }

    #[test]
    fn test_parse_rejects_bad_values() {
        assert!(matches!(
            EngineConfig::parse("[binding]\nreactive_error_policy = \"ignore\""),
            Err(BindingError::Configuration(_))
        ));
        assert!(EngineConfig::parse("[unknown]\nx = 1").is_err());
    }

    #[test]
    fn test_load_missing_file() {
        assert!(EngineConfig::load(Path::new("/nonexistent/bindery.toml")).is_err());
    }
}
