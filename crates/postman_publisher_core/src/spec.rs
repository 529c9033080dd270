use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use anyhow::{Context, Result, bail};
use serde_yaml::Value;
use tracing::info;

use crate::error::PublishError;

/// An OpenAPI document loaded from disk, kept as a generic YAML tree.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecDocument {
    root: Value,
}

impl SpecDocument {
    pub fn from_value(root: Value) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Value {
        &self.root
    }

    /// Compact JSON text submitted to the import endpoint. Non-string mapping
    /// keys (`200:`, `true:`, `null:`) are written as JSON strings.
    pub fn to_json_string(&self) -> Result<String> {
        let json = to_json_value(&self.root)?;
        serde_json::to_string(&json).context("failed to serialize spec document as JSON")
    }
}

fn to_json_value(value: &Value) -> Result<serde_json::Value> {
    match value {
        Value::Mapping(mapping) => {
            let mut object = serde_json::Map::with_capacity(mapping.len());
            for (key, item) in mapping {
                object.insert(json_key(key)?, to_json_value(item)?);
            }
            Ok(serde_json::Value::Object(object))
        }
        Value::Sequence(items) => Ok(serde_json::Value::Array(
            items.iter().map(to_json_value).collect::<Result<_>>()?,
        )),
        Value::Tagged(tagged) => to_json_value(&tagged.value),
        scalar => serde_json::to_value(scalar).context("failed to convert spec value to JSON"),
    }
}

fn json_key(key: &Value) -> Result<String> {
    match key {
        Value::String(text) => Ok(text.clone()),
        Value::Null => Ok("null".to_string()),
        Value::Bool(flag) => Ok(flag.to_string()),
        Value::Number(number) => Ok(number.to_string()),
        Value::Tagged(tagged) => json_key(&tagged.value),
        Value::Sequence(_) | Value::Mapping(_) => {
            bail!("spec document uses a collection as a mapping key")
        }
    }
}

/// Read and parse a YAML (or JSON) spec document.
pub fn load_spec(path: &Path) -> Result<SpecDocument> {
    info!("Loading OpenAPI spec from '{}'", path.display());
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(error) if error.kind() == ErrorKind::NotFound => {
            return Err(PublishError::SpecNotFound {
                path: path.display().to_string(),
            }
            .into());
        }
        Err(error) if error.kind() == ErrorKind::InvalidData => {
            return Err(PublishError::SpecParse {
                path: path.display().to_string(),
                message: error.to_string(),
            }
            .into());
        }
        Err(error) => {
            return Err(error).with_context(|| format!("failed to read {}", path.display()));
        }
    };
    parse_spec(&content, path)
}

fn parse_spec(content: &str, path: &Path) -> Result<SpecDocument> {
    let root: Value = serde_yaml::from_str(content).map_err(|error| PublishError::SpecParse {
        path: path.display().to_string(),
        message: error.to_string(),
    })?;
    if root.is_null() {
        return Err(PublishError::SpecParse {
            path: path.display().to_string(),
            message: "document is empty".to_string(),
        }
        .into());
    }
    Ok(SpecDocument::from_value(root))
}
