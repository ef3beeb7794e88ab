//! Tool trait: local functions the model is permitted to call.
//!
//! Each tool publishes a [`FunctionDeclaration`] (sent to the model in the
//! catalog) and executes against a JSON argument object.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ToolError;

/// One parameter of a declared function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterSpec {
    /// Parameter name as it appears in the argument object
    pub name: String,

    /// JSON Schema type ("string", "integer", ...)
    #[serde(rename = "type")]
    pub json_type: String,

    /// Description shown to the model, passed through verbatim
    pub description: String,

    /// Whether the caller must supply it
    #[serde(default)]
    pub required: bool,
}

impl ParameterSpec {
    pub fn required(
        name: impl Into<String>,
        json_type: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            json_type: json_type.into(),
            description: description.into(),
            required: true,
        }
    }
}

/// The name, description and parameter contract of a callable function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionDeclaration {
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub parameters: Vec<ParameterSpec>,
}

impl FunctionDeclaration {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: Vec::new(),
        }
    }

    pub fn with_parameter(mut self, parameter: ParameterSpec) -> Self {
        self.parameters.push(parameter);
        self
    }

    /// Names of the parameters marked required, in declaration order.
    pub fn required_parameters(&self) -> impl Iterator<Item = &str> {
        self.parameters
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name.as_str())
    }

    /// The JSON Schema object the completion API expects for `parameters`.
    pub fn parameters_schema(&self) -> serde_json::Value {
        let properties: serde_json::Map<String, serde_json::Value> = self
            .parameters
            .iter()
            .map(|p| {
                (
                    p.name.clone(),
                    serde_json::json!({
                        "type": p.json_type,
                        "description": p.description,
                    }),
                )
            })
            .collect();
        let required: Vec<&str> = self.required_parameters().collect();

        serde_json::json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }
}

/// The core Tool trait.
///
/// Tools are registered in a [`ToolRegistry`]; the registry's declarations
/// form the catalog sent to the model.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The unique function name (e.g., "get_checklist").
    fn name(&self) -> &str;

    /// What this function does (sent to the model).
    fn description(&self) -> &str;

    /// Parameter contract.
    fn parameters(&self) -> Vec<ParameterSpec>;

    /// Execute with an already-validated argument object.
    async fn execute(
        &self,
        arguments: &serde_json::Map<String, serde_json::Value>,
    ) -> std::result::Result<serde_json::Value, ToolError>;

    /// Convert this tool into a declaration for the catalog.
    fn to_declaration(&self) -> FunctionDeclaration {
        FunctionDeclaration {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters(),
        }
    }
}

/// An ordered registry of available tools.
///
/// Registration order is catalog order.
pub struct ToolRegistry {
    tools: Vec<Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self { tools: Vec::new() }
    }

    /// Register a tool. A tool with the same name is replaced in place.
    pub fn register(&mut self, tool: Box<dyn Tool>) {
        match self.tools.iter().position(|t| t.name() == tool.name()) {
            Some(index) => self.tools[index] = tool,
            None => self.tools.push(tool),
        }
    }

    /// Get a tool by name.
    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.tools
            .iter()
            .find(|t| t.name() == name)
            .map(|t| t.as_ref())
    }

    /// All declarations, in registration order.
    pub fn declarations(&self) -> Vec<FunctionDeclaration> {
        self.tools.iter().map(|t| t.to_declaration()).collect()
    }

    /// Execute a tool by name.
    pub async fn execute(
        &self,
        name: &str,
        arguments: &serde_json::Map<String, serde_json::Value>,
    ) -> std::result::Result<serde_json::Value, ToolError> {
        let tool = self
            .get(name)
            .ok_or_else(|| ToolError::NotFound(format!("function '{name}'")))?;
        tool.execute(arguments).await
    }

    /// List all registered tool names.
    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}
