//! Text formats structured files are stored in.

use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::Value;

/// Indentation used when writing structured content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Spacing {
    /// Indent with this many spaces; `0` writes compact output.
    Spaces(usize),
    /// Indent with this literal string.
    Text(String),
}

impl Spacing {
    fn indent(&self) -> Option<Vec<u8>> {
        match self {
            Self::Spaces(0) => None,
            Self::Spaces(count) => Some(vec![b' '; *count]),
            Self::Text(text) if text.is_empty() => None,
            Self::Text(text) => Some(text.as_bytes().to_vec()),
        }
    }
}

impl Default for Spacing {
    fn default() -> Self {
        Self::Spaces(2)
    }
}

impl From<usize> for Spacing {
    fn from(count: usize) -> Self {
        Self::Spaces(count)
    }
}

impl From<&str> for Spacing {
    fn from(text: &str) -> Self {
        Self::Text(text.to_owned())
    }
}

/// A text encoding for untyped values.
pub trait Format: Clone + Send + Sync + 'static {
    /// Name used in parse errors.
    const NAME: &'static str;

    fn parse(&self, text: &str) -> Result<Value, String>;
    fn stringify(&self, value: &Value, spacing: &Spacing) -> Result<String, String>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Json;

impl Format for Json {
    const NAME: &'static str = "JSON";

    fn parse(&self, text: &str) -> Result<Value, String> {
        serde_json::from_str(text).map_err(|e| e.to_string())
    }

    fn stringify(&self, value: &Value, spacing: &Spacing) -> Result<String, String> {
        let Some(indent) = spacing.indent() else {
            return serde_json::to_string(value).map_err(|e| e.to_string());
        };
        let mut out = Vec::new();
        let formatter = PrettyFormatter::with_indent(&indent);
        let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
        value.serialize(&mut serializer).map_err(|e| e.to_string())?;
        String::from_utf8(out).map_err(|e| e.to_string())
    }
}

/// YAML. Spacing is ignored; the emitter always uses two spaces.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Yaml;

impl Format for Yaml {
    const NAME: &'static str = "YAML";

    fn parse(&self, text: &str) -> Result<Value, String> {
        serde_yaml::from_str(text).map_err(|e| e.to_string())
    }

    fn stringify(&self, value: &Value, _spacing: &Spacing) -> Result<String, String> {
        serde_yaml::to_string(value).map_err(|e| e.to_string())
    }
}

/// TOML. Spacing is ignored, and only tables can be written.
///
/// TOML has no null, so null-valued keys (`None` fields) are left out when
/// writing and come back as absent keys.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Toml;

impl Format for Toml {
    const NAME: &'static str = "TOML";

    fn parse(&self, text: &str) -> Result<Value, String> {
        toml::from_str(text).map_err(|e| e.to_string())
    }

    fn stringify(&self, value: &Value, _spacing: &Spacing) -> Result<String, String> {
        toml::to_string(&without_nulls(value)).map_err(|e| e.to_string())
    }
}

fn without_nulls(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(k, v)| (k.clone(), without_nulls(v)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(without_nulls).collect()),
        other => other.clone(),
    }
}
