use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::fmt;

use crate::context::ToolContext;
use crate::error::ArgumentError;
use crate::outcome::ToolOutcome;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    String,
    Integer,
    Boolean,
}

impl ParamType {
    pub fn as_str(self) -> &'static str {
        match self {
            ParamType::String => "string",
            ParamType::Integer => "integer",
            ParamType::Boolean => "boolean",
        }
    }

    /// Whether `value` is a literal of this type. `null` is handled by the caller.
    pub(crate) fn accepts(self, value: &Value) -> bool {
        match self {
            ParamType::String => value.is_string(),
            ParamType::Integer => value.is_i64(),
            ParamType::Boolean => value.is_boolean(),
        }
    }

    fn coerce(self, name: &str, value: Value) -> Result<Value, ArgumentError> {
        let wrong_type = || ArgumentError::WrongType {
            name: name.to_string(),
            expected: self.as_str(),
        };

        if self.accepts(&value) {
            return Ok(value);
        }

        // Numeric strings are accepted for integers.
        match (self, &value) {
            (ParamType::Integer, Value::String(s)) => s
                .trim()
                .parse::<i64>()
                .map(Value::from)
                .map_err(|_| wrong_type()),
            _ => Err(wrong_type()),
        }
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamDescriptor {
    pub name: String,
    pub kind: ParamType,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

impl ParamDescriptor {
    /// A parameter the caller must always supply.
    pub fn required(
        name: impl Into<String>,
        kind: ParamType,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            description: description.into(),
            default: None,
        }
    }

    /// A parameter that may be omitted or sent as `null`.
    pub fn optional(
        name: impl Into<String>,
        kind: ParamType,
        description: impl Into<String>,
    ) -> Self {
        Self {
            default: Some(Value::Null),
            ..Self::required(name, kind, description)
        }
    }

    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn is_required(&self) -> bool {
        self.default.is_none()
    }

    fn nullable(&self) -> bool {
        matches!(self.default, Some(Value::Null))
    }

    fn schema(&self) -> Value {
        let mut prop = json!({
            "type": self.kind.as_str(),
            "description": self.description,
        });
        if let Some(default) = self.default.as_ref().filter(|d| !d.is_null()) {
            prop["default"] = default.clone();
        }
        prop
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    pub params: Vec<ParamDescriptor>,
}

impl ToolDescriptor {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            params: Vec::new(),
        }
    }

    pub fn param(mut self, param: ParamDescriptor) -> Self {
        self.params.push(param);
        self
    }

    /// JSON Schema advertised to callers through `tools/list`.
    pub fn input_schema(&self) -> Value {
        let properties: Map<String, Value> = self
            .params
            .iter()
            .map(|p| (p.name.clone(), p.schema()))
            .collect();

        let required: Vec<&str> = self
            .params
            .iter()
            .filter(|p| p.is_required())
            .map(|p| p.name.as_str())
            .collect();

        json!({
            "type": "object",
            "properties": properties,
            "required": required,
            "additionalProperties": false
        })
    }

    /// Check caller-supplied arguments against the declared parameters and
    /// fill in defaults.
    pub fn validate(&self, arguments: Value) -> Result<Arguments, ArgumentError> {
        let mut supplied = match arguments {
            Value::Null => Map::new(),
            Value::Object(map) => map,
            _ => return Err(ArgumentError::NotAnObject),
        };

        if let Some(unknown) = supplied
            .keys()
            .find(|k| !self.params.iter().any(|p| &p.name == *k))
        {
            return Err(ArgumentError::Unexpected(unknown.clone()));
        }

        let mut values = HashMap::with_capacity(self.params.len());
        for param in &self.params {
            let value = match supplied.remove(&param.name) {
                Some(Value::Null) if param.nullable() => Value::Null,
                Some(Value::Null) => {
                    return Err(ArgumentError::WrongType {
                        name: param.name.clone(),
                        expected: param.kind.as_str(),
                    })
                }
                Some(value) => param.kind.coerce(&param.name, value)?,
                None => match &param.default {
                    Some(default) => default.clone(),
                    None => return Err(ArgumentError::Missing(param.name.clone())),
                },
            };
            values.insert(param.name.clone(), value);
        }

        Ok(Arguments { values })
    }
}

/// Arguments that passed validation against a [`ToolDescriptor`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Arguments {
    values: HashMap<String, Value>,
}

impl Arguments {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name).filter(|v| !v.is_null())
    }

    /// A string argument, or the empty string when it is absent.
    pub fn str(&self, name: &str) -> &str {
        self.opt_str(name).unwrap_or_default()
    }

    /// A string argument; empty strings count as absent.
    pub fn opt_str(&self, name: &str) -> Option<&str> {
        self.get(name)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }

    pub fn int(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(Value::as_i64)
    }

    pub fn bool(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(Value::as_bool)
    }
}

pub type ToolHandler = Box<dyn Fn(&Arguments, &mut ToolContext) -> ToolOutcome + Send + Sync>;

/// A descriptor paired with the function that serves it.
pub struct Tool {
    pub descriptor: ToolDescriptor,
    pub(crate) handler: ToolHandler,
}

impl Tool {
    pub fn new<F>(descriptor: ToolDescriptor, handler: F) -> Self
    where
        F: Fn(&Arguments, &mut ToolContext) -> ToolOutcome + Send + Sync + 'static,
    {
        Self {
            descriptor,
            handler: Box::new(handler),
        }
    }

    pub fn invoke(&self, arguments: &Arguments, ctx: &mut ToolContext) -> ToolOutcome {
        (self.handler)(arguments, ctx)
    }
}

impl fmt::Debug for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tool")
            .field("descriptor", &self.descriptor)
            .finish_non_exhaustive()
    }
}
