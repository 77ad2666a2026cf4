//! Analysis configuration.
//!
//! Configuration is a JSONC file (comments and trailing commas allowed),
//! looked up as `.terralint.jsonc` in the inspected directory unless an
//! explicit path is given. Command-line flags are merged on top by the
//! caller.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::value::Value;

pub const DEFAULT_CONFIG_FILE: &str = ".terralint.jsonc";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {message}")]
    Parse { path: String, message: String },
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Whether to follow local module calls into child modules.
    pub module: bool,
    /// Exit successfully even when issues were found.
    pub force: bool,
    /// Module source addresses excluded from inspection.
    pub ignore_module: Vec<String>,
    /// Values for root-module input variables.
    pub variables: BTreeMap<String, serde_json::Value>,
    pub rules: BTreeMap<String, RuleConfig>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleConfig {
    pub enabled: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            module: true,
            force: false,
            ignore_module: Vec::new(),
            variables: BTreeMap::new(),
            rules: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Loads the file at `path`, or the defaults when `path` is `None` and
    /// no `.terralint.jsonc` exists in `dir`.
    pub fn load(dir: &Path, path: Option<&Path>) -> Result<Config, ConfigError> {
        let file = match path {
            Some(path) => path.to_path_buf(),
            None => {
                let fallback = dir.join(DEFAULT_CONFIG_FILE);
                if !fallback.is_file() {
                    debug!("no config file found in {}; using defaults", dir.display());
                    return Ok(Config::default());
                }
                fallback
            }
        };

        let text = std::fs::read_to_string(&file).map_err(|source| ConfigError::Io {
            path: file.display().to_string(),
            source,
        })?;
        Self::parse(&text, &file.display().to_string())
    }

    fn parse(text: &str, path: &str) -> Result<Config, ConfigError> {
        let json = jsonc_parser::parse_to_serde_value(text, &Default::default())
            .map_err(|e| ConfigError::Parse {
                path: path.to_string(),
                message: e.to_string(),
            })?
            .unwrap_or(serde_json::Value::Null);
        if json.is_null() {
            return Ok(Config::default());
        }
        serde_json::from_value(json).map_err(|e| ConfigError::Parse {
            path: path.to_string(),
            message: e.to_string(),
        })
    }

    /// Explicit enable/disable for a rule, when the config mentions it.
    pub fn rule_enabled(&self, name: &str) -> Option<bool> {
        self.rules.get(name).map(|r| r.enabled)
    }

    /// Configured variable values, converted to evaluator values.
    pub fn variable_values(&self) -> BTreeMap<String, Value> {
        self.variables
            .iter()
            .map(|(name, json)| (name.clone(), json_to_value(json)))
            .collect()
    }
}

fn json_to_value(json: &serde_json::Value) -> Value {
    match json {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Bool(*b),
        serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
        serde_json::Value::String(s) => Value::String(s.clone()),
        serde_json::Value::Array(items) => Value::Array(items.iter().map(json_to_value).collect()),
        serde_json::Value::Object(entries) => Value::Object(
            entries
                .iter()
                .map(|(k, v)| (k.clone(), json_to_value(v)))
                .collect(),
        ),
    }
}
