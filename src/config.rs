//! Module argument loading
//!
//! Ansible hands a binary module the path of a file holding its arguments.
//! Two layouts are accepted:
//! - JSON: either the parameter object itself or an object wrapping it in
//!   `ANSIBLE_MODULE_ARGS`
//! - legacy `key=value` pairs separated by whitespace, quoted with shell rules
//!
//! Internal `_ansible_*` keys are stripped from the parameters; the module
//! name is taken from `_ansible_module_name` (or `module`) when present.

use std::path::Path;

use crate::error::{Error, Result};
use crate::modules::ModuleParams;

const WRAPPER_KEY: &str = "ANSIBLE_MODULE_ARGS";
const MODULE_NAME_KEY: &str = "_ansible_module_name";
const MODULE_KEY: &str = "module";

/// Parameters and target module parsed from an arguments file
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModuleArgs {
    /// Module named inside the arguments, if any
    pub module: Option<String>,
    pub params: ModuleParams,
}

impl ModuleArgs {
    /// Read and parse an arguments file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| Error::ArgsRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content)
    }

    /// Parse arguments in either JSON or `key=value` form.
    pub fn parse(content: &str) -> Result<Self> {
        let trimmed = content.trim();
        if trimmed.is_empty() {
            return Ok(Self::default());
        }

        let raw = if trimmed.starts_with('{') {
            parse_json(trimmed)?
        } else {
            parse_key_values(trimmed)?
        };
        Ok(Self::from_raw(raw))
    }

    fn from_raw(raw: ModuleParams) -> Self {
        let mut module = None;
        let mut params = ModuleParams::new();

        for (key, value) in raw {
            if key == MODULE_NAME_KEY || key == MODULE_KEY {
                if let serde_json::Value::String(name) = value {
                    // the internal key wins over a plain `module` argument
                    if module.is_none() || key == MODULE_NAME_KEY {
                        module = Some(name);
                    }
                }
            } else if !key.starts_with("_ansible_") {
                params.insert(key, value);
            }
        }

        Self { module, params }
    }

    /// Apply `key=value` overrides given on the command line.
    ///
    /// Values that parse as JSON keep their JSON type; anything else is a
    /// string.
    pub fn with_overrides(mut self, overrides: &[String]) -> Result<Self> {
        for item in overrides {
            let (key, value) = split_pair(item)?;
            let value = serde_json::from_str(value)
                .unwrap_or_else(|_| serde_json::Value::String(value.to_string()));
            if key == MODULE_KEY {
                if let serde_json::Value::String(name) = &value {
                    self.module = Some(name.clone());
                    continue;
                }
            }
            self.params.insert(key.to_string(), value);
        }
        Ok(self)
    }
}

fn parse_json(content: &str) -> Result<ModuleParams> {
    let value: serde_json::Value = serde_json::from_str(content)?;
    let serde_json::Value::Object(mut object) = value else {
        return Err(Error::ArgsParse("arguments must be a JSON object".to_string()));
    };

    if let Some(inner) = object.remove(WRAPPER_KEY) {
        let serde_json::Value::Object(inner) = inner else {
            return Err(Error::ArgsParse(format!("{} must be a JSON object", WRAPPER_KEY)));
        };
        object = inner;
    }

    Ok(object.into_iter().collect())
}

fn parse_key_values(content: &str) -> Result<ModuleParams> {
    let words = shell_words::split(content).map_err(|e| Error::ArgsParse(e.to_string()))?;
    words
        .iter()
        .map(|word| {
            split_pair(word)
                .map(|(k, v)| (k.to_string(), serde_json::Value::String(v.to_string())))
        })
        .collect()
}

fn split_pair(item: &str) -> Result<(&str, &str)> {
    match item.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key, value)),
        _ => Err(Error::ArgsParse(format!("expected key=value, got '{}'", item))),
    }
}
