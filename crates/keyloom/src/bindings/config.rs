//! TOML binding configuration.
//!
//! ```toml
//! [paned]
//! single_step = 1
//! page_step = 75
//!
//! [[set]]
//! name = "editor-overrides"
//! priority = "application"
//! classes = ["Paned"]
//! bindings = [
//!   'bind "<Control>F6" { cycle-child-focus (false) }',
//!   'unbind "F8"',
//! ]
//! ```

use std::path::Path;

use keyloom_core::ClassRegistry;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::engine::{apply_statement, BindingEngine};
use super::entry::BindingPriority;
use super::grammar::{self, Expected};
use super::registry::BindingSetId;

/// Errors produced while loading binding configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("set '{set}' is attached to unknown class '{class}'")]
    UnknownClass { set: String, class: String },
    #[error("set '{set}', binding {index}, line {line}, column {column}: expected {expected}")]
    Parse {
        set: String,
        index: usize,
        line: usize,
        column: usize,
        expected: Expected,
    },
    #[error("[paned] {field} must be between 1 and {max}, got {value}")]
    InvalidStep {
        field: &'static str,
        value: i32,
        max: i32,
    },
}

/// Tuning for the paned navigator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PanedConfig {
    /// Pixels moved by a single-step move-handle.
    pub single_step: i32,
    /// Pixels moved by a page-step move-handle.
    pub page_step: i32,
}

impl PanedConfig {
    /// Largest accepted step, in pixels.
    pub const MAX_STEP: i32 = 1 << 16;

    /// Check that both steps are positive and at most [`Self::MAX_STEP`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [("single_step", self.single_step), ("page_step", self.page_step)] {
            if !(1..=Self::MAX_STEP).contains(&value) {
                return Err(ConfigError::InvalidStep {
                    field,
                    value,
                    max: Self::MAX_STEP,
                });
            }
        }
        Ok(())
    }
}

impl Default for PanedConfig {
    fn default() -> Self {
        Self {
            single_step: 1,
            page_step: 75,
        }
    }
}

/// One `[[set]]` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BindingSetConfig {
    pub name: String,
    #[serde(default = "default_config_priority")]
    pub priority: BindingPriority,
    /// Class names the set is attached to.
    #[serde(default)]
    pub classes: Vec<String>,
    /// `bind`/`unbind` statements; each string may hold several.
    #[serde(default)]
    pub bindings: Vec<String>,
}

fn default_config_priority() -> BindingPriority {
    BindingPriority::Application
}

/// Top-level configuration document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyloomConfig {
    pub paned: PanedConfig,
    #[serde(rename = "set")]
    pub sets: Vec<BindingSetConfig>,
}

impl KeyloomConfig {
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.paned.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&text)
    }
}

impl BindingEngine {
    /// Create or update the sets described by `config`.
    ///
    /// Each set is created if missing, given the configured priority, marked
    /// as parsed from a stylesheet, filled from its statements, and attached
    /// to its classes. Statement and class errors are collected; the rest of
    /// the configuration is still applied.
    pub fn apply_config(
        &self,
        config: &KeyloomConfig,
        classes: &ClassRegistry,
    ) -> (Vec<BindingSetId>, Vec<ConfigError>) {
        let mut ids = Vec::new();
        let mut errors = Vec::new();

        for set_config in &config.sets {
            let id = self.with(|reg| {
                let id = match reg.find(&set_config.name) {
                    Some(id) => id,
                    None => reg.new_set(set_config.name.as_str(), set_config.priority),
                };
                if let Some(set) = reg.get_mut(id) {
                    set.set_priority(set_config.priority);
                    set.set_parsed_from_stylesheet(true);
                }
                id
            });

            for (index, source) in set_config.bindings.iter().enumerate() {
                let (statements, parse_errors) = grammar::parse_statements(source);
                self.with_set(id, |set| {
                    for statement in statements {
                        apply_statement(set, statement);
                    }
                });
                for err in parse_errors {
                    let (line, column) = err.line_column(source);
                    errors.push(ConfigError::Parse {
                        set: set_config.name.clone(),
                        index,
                        line,
                        column,
                        expected: err.expected,
                    });
                }
            }

            for class_name in &set_config.classes {
                match classes.find(class_name) {
                    Some(class) => {
                        self.attach(class, id);
                    }
                    None => {
                        tracing::warn!(target: "keyloom::bindings::config", set = %set_config.name, class = %class_name, "unknown class in binding config");
                        errors.push(ConfigError::UnknownClass {
                            set: set_config.name.clone(),
                            class: class_name.clone(),
                        });
                    }
                }
            }

            tracing::debug!(target: "keyloom::bindings::config", set = %set_config.name, priority = %set_config.priority, "applied binding set config");
            ids.push(id);
        }

        (ids, errors)
    }
}
