use serde_json::Value;
use std::collections::{HashMap, HashSet};

use crate::context::ToolContext;
use crate::error::{CallError, RegistrationError};
use crate::outcome::ToolOutcome;
use crate::tool::{Tool, ToolDescriptor};

/// The set of tools one server exposes, in registration order.
#[derive(Debug)]
pub struct ToolRegistry {
    name: String,
    version: String,
    tools: Vec<Tool>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            tools: Vec::new(),
            index: HashMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn register(&mut self, tool: Tool) -> Result<&ToolDescriptor, RegistrationError> {
        check_descriptor(&tool.descriptor)?;

        let name = tool.descriptor.name.clone();
        if self.index.contains_key(&name) {
            return Err(RegistrationError::DuplicateTool(name));
        }

        tracing::debug!(server = %self.name, tool = %name, "registered tool");
        self.index.insert(name, self.tools.len());
        self.tools.push(tool);

        Ok(&self.tools[self.tools.len() - 1].descriptor)
    }

    pub fn get(&self, name: &str) -> Option<&Tool> {
        self.index.get(name).map(|&i| &self.tools[i])
    }

    pub fn descriptors(&self) -> impl Iterator<Item = &ToolDescriptor> {
        self.tools.iter().map(|t| &t.descriptor)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Validate `arguments` and run the named tool. Whatever the tool returns,
    /// failures included, comes back as `Ok`.
    pub fn call(
        &self,
        name: &str,
        arguments: Value,
        ctx: &mut ToolContext,
    ) -> Result<ToolOutcome, CallError> {
        let tool = self
            .get(name)
            .ok_or_else(|| CallError::UnknownTool(name.to_string()))?;

        let arguments =
            tool.descriptor
                .validate(arguments)
                .map_err(|source| CallError::InvalidArguments {
                    tool: name.to_string(),
                    source,
                })?;

        let outcome = tool.invoke(&arguments, ctx);
        if outcome.is_failure() {
            tracing::warn!(tool = %name, "tool returned a failure result");
        }
        Ok(outcome)
    }
}

fn check_descriptor(descriptor: &ToolDescriptor) -> Result<(), RegistrationError> {
    if descriptor.name.trim().is_empty() {
        return Err(RegistrationError::EmptyToolName);
    }

    let mut seen = HashSet::new();
    for param in &descriptor.params {
        if param.name.trim().is_empty() {
            return Err(RegistrationError::EmptyParamName {
                tool: descriptor.name.clone(),
            });
        }
        if !seen.insert(param.name.as_str()) {
            return Err(RegistrationError::DuplicateParam {
                tool: descriptor.name.clone(),
                param: param.name.clone(),
            });
        }
        if let Some(default) = param.default.as_ref().filter(|d| !d.is_null()) {
            if !param.kind.accepts(default) {
                return Err(RegistrationError::DefaultTypeMismatch {
                    tool: descriptor.name.clone(),
                    param: param.name.clone(),
                    expected: param.kind.as_str(),
                });
            }
        }
    }

    Ok(())
}
