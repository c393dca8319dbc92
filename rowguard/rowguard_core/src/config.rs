//! Configuration for rowguard.
//!
//! Handles loading, validating and merging configuration. Every field has a
//! default, so an empty file (or no file at all) yields a usable setup.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::ConfigError;
use crate::logging::LogLevel;
use crate::types::ResourceRange;

/// Rule compiler configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompilerConfig {
    /// Abort compilation on a missing variable or a map-valued operand.
    /// When `false` the offending value is recorded and dropped instead.
    #[serde(default = "default_strict_variables")]
    pub strict_variables: bool,

    /// Maximum collection nesting accepted while flattening values
    #[serde(default = "default_max_value_depth")]
    pub max_value_depth: usize,

    /// Variable name that resolves to the subject id
    #[serde(default = "default_subject_variable")]
    pub subject_variable: String,
}

fn default_strict_variables() -> bool {
    true
}

fn default_max_value_depth() -> usize {
    32
}

fn default_subject_variable() -> String {
    "userId".to_string()
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            strict_variables: default_strict_variables(),
            max_value_depth: default_max_value_depth(),
            subject_variable: default_subject_variable(),
        }
    }
}

impl CompilerConfig {
    /// The drop-and-continue variant: unresolvable values are logged to the
    /// explain and skipped rather than aborting the compile.
    pub fn lenient() -> Self {
        Self {
            strict_variables: false,
            ..Self::default()
        }
    }
}

/// Policy engine configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Resource range applied to policies that do not carry one
    #[serde(default)]
    pub default_resource_range: ResourceRange,
}

/// Logging configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Maximum level emitted by [`crate::logging::init`]
    #[serde(default)]
    pub level: LogLevel,
}

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuardConfig {
    /// Rule compiler settings
    #[serde(default)]
    pub compiler: CompilerConfig,

    /// Policy engine settings
    #[serde(default)]
    pub engine: EngineConfig,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl GuardConfig {
    /// Load configuration from a TOML file
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => {
                info!("Loading configuration from {}", path.display());

                if !path.exists() {
                    warn!("Configuration file not found: {}", path.display());
                    return Ok(Self::default());
                }

                let content = std::fs::read_to_string(path).map_err(|e| {
                    ConfigError::LoadFailed(format!("{}: {}", path.display(), e))
                })?;

                Self::from_toml(&content)?
            }
            None => {
                info!("No configuration file specified, using defaults");
                Self::default()
            }
        };

        config.validate()?;

        Ok(config)
    }

    /// Parse configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::ParseFailed(e.to_string()))
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.compiler.max_value_depth == 0 {
            return Err(ConfigError::Invalid(
                "compiler.max_value_depth cannot be zero".to_string(),
            ));
        }

        if self.compiler.subject_variable.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "compiler.subject_variable cannot be blank".to_string(),
            ));
        }

        if !self.engine.default_resource_range.is_known() {
            return Err(ConfigError::Invalid(format!(
                "engine.default_resource_range '{}' is not a known range",
                self.engine.default_resource_range
            )));
        }

        if !self.compiler.strict_variables {
            warn!("Lenient variable resolution is enabled; unresolved values will be dropped");
        }

        Ok(())
    }

    /// Merge with another configuration, preferring non-default values from `other`
    pub fn merge(&mut self, other: GuardConfig) {
        let defaults = GuardConfig::default();

        if other.compiler.strict_variables != defaults.compiler.strict_variables {
            self.compiler.strict_variables = other.compiler.strict_variables;
        }

        if other.compiler.max_value_depth != defaults.compiler.max_value_depth {
            self.compiler.max_value_depth = other.compiler.max_value_depth;
        }

        if other.compiler.subject_variable != defaults.compiler.subject_variable {
            self.compiler.subject_variable = other.compiler.subject_variable;
        }

        if other.engine.default_resource_range != defaults.engine.default_resource_range {
            self.engine.default_resource_range = other.engine.default_resource_range;
        }

        if other.logging.level != defaults.logging.level {
            self.logging.level = other.logging.level;
        }
    }
}
