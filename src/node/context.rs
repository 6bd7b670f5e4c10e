// Host-side surface: parameter lookup, input items and output records
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as B64;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::error::{InvalidParameterSnafu, Result};
use crate::storage::constants::DEFAULT_MIME_TYPE;

/// A named binary payload attached to an item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BinaryData {
    /// Base64-encoded content.
    pub data: String,
    #[serde(default = "default_mime_type")]
    pub mime_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
}

fn default_mime_type() -> String {
    DEFAULT_MIME_TYPE.to_string()
}

impl BinaryData {
    pub fn from_bytes(bytes: &[u8], mime_type: impl Into<String>, file_name: Option<String>) -> Self {
        Self {
            data: B64.encode(bytes),
            mime_type: mime_type.into(),
            file_name,
        }
    }

    pub fn decode(&self) -> std::result::Result<Vec<u8>, base64::DecodeError> {
        B64.decode(self.data.as_bytes())
    }
}

/// One input item as handed over by the host.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputItem {
    #[serde(default)]
    pub json: Map<String, Value>,
    /// Per-item parameter values; override the node-level ones.
    #[serde(default)]
    pub parameters: Map<String, Value>,
    #[serde(default)]
    pub binary: BTreeMap<String, BinaryData>,
}

impl InputItem {
    pub fn with_parameter(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.parameters.insert(name.to_string(), value.into());
        self
    }

    pub fn with_binary(mut self, property: &str, binary: BinaryData) -> Self {
        self.binary.insert(property.to_string(), binary);
        self
    }
}

/// What a handler may ask of the host while executing one item.
pub trait ExecutionContext {
    fn parameter(&self, name: &str, item_index: usize) -> Option<&Value>;

    fn input_item(&self, item_index: usize) -> Option<&InputItem>;

    fn item_count(&self) -> usize;

    fn continue_on_fail(&self) -> bool;

    fn binary(&self, item_index: usize, property: &str) -> Option<&BinaryData> {
        self.input_item(item_index)
            .and_then(|item| item.binary.get(property))
    }

    fn string_parameter(&self, name: &str, item_index: usize, default: &str) -> Result<String> {
        match self.parameter(name, item_index) {
            None | Some(Value::Null) => Ok(default.to_string()),
            Some(Value::String(s)) => Ok(s.clone()),
            Some(Value::Number(n)) => Ok(n.to_string()),
            Some(Value::Bool(b)) => Ok(b.to_string()),
            Some(other) => InvalidParameterSnafu {
                name,
                reason: format!("expected a string, got {other}"),
            }
            .fail(),
        }
    }

    fn bool_parameter(&self, name: &str, item_index: usize, default: bool) -> Result<bool> {
        match self.parameter(name, item_index) {
            None | Some(Value::Null) => Ok(default),
            Some(Value::Bool(b)) => Ok(*b),
            Some(Value::String(s)) if s == "true" => Ok(true),
            Some(Value::String(s)) if s == "false" => Ok(false),
            Some(other) => InvalidParameterSnafu {
                name,
                reason: format!("expected a boolean, got {other}"),
            }
            .fail(),
        }
    }

    fn number_parameter(&self, name: &str, item_index: usize, default: f64) -> Result<f64> {
        let parsed = match self.parameter(name, item_index) {
            None | Some(Value::Null) => Some(default),
            Some(Value::Number(n)) => n.as_f64(),
            Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
            Some(_) => None,
        };
        match parsed {
            Some(n) if n.is_finite() => Ok(n),
            _ => InvalidParameterSnafu {
                name,
                reason: "expected a number".to_string(),
            }
            .fail(),
        }
    }
}

/// A batch of items with node-level parameters, as the CLI host reads it.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchContext {
    #[serde(default)]
    pub parameters: Map<String, Value>,
    #[serde(default)]
    pub items: Vec<InputItem>,
    #[serde(default)]
    pub continue_on_fail: bool,
}

impl BatchContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_parameter(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.parameters.insert(name.to_string(), value.into());
        self
    }

    pub fn with_item(mut self, item: InputItem) -> Self {
        self.items.push(item);
        self
    }

    pub fn with_continue_on_fail(mut self, enabled: bool) -> Self {
        self.continue_on_fail = enabled;
        self
    }
}

impl ExecutionContext for BatchContext {
    fn parameter(&self, name: &str, item_index: usize) -> Option<&Value> {
        self.items
            .get(item_index)
            .and_then(|item| item.parameters.get(name))
            .or_else(|| self.parameters.get(name))
    }

    fn input_item(&self, item_index: usize) -> Option<&InputItem> {
        self.items.get(item_index)
    }

    fn item_count(&self) -> usize {
        self.items.len()
    }

    fn continue_on_fail(&self) -> bool {
        self.continue_on_fail
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PairedItem {
    pub item: usize,
}

/// One output record, paired with the input item it came from.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputItem {
    pub json: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub binary: Option<BTreeMap<String, BinaryData>>,
    pub paired_item: PairedItem,
}

impl OutputItem {
    pub fn new(json: Value, item_index: usize) -> Self {
        Self {
            json,
            binary: None,
            paired_item: PairedItem { item: item_index },
        }
    }

    pub fn with_binary(mut self, property: String, binary: BinaryData) -> Self {
        self.binary
            .get_or_insert_with(BTreeMap::new)
            .insert(property, binary);
        self
    }
}
