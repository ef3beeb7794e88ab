//! Routes a model's function call to the local implementation.

use serde_json::{Map, Value};
use threadwise_core::error::ToolError;
use threadwise_core::message::FunctionCall;
use threadwise_core::tool::{FunctionDeclaration, ToolRegistry};
use tracing::{debug, warn};

/// Result returned for a name that is not in the catalog.
pub fn no_such_function(name: &str) -> Value {
    serde_json::json!({
        "status": "no_such_function",
        "function": name,
    })
}

/// Catalog plus dispatch over one [`ToolRegistry`].
pub struct FunctionDispatcher {
    registry: ToolRegistry,
}

impl FunctionDispatcher {
    pub fn new(registry: ToolRegistry) -> Self {
        Self { registry }
    }

    pub fn declarations(&self) -> Vec<FunctionDeclaration> {
        self.registry.declarations()
    }

    /// Run `name` with `arguments`.
    ///
    /// Unknown names yield [`no_such_function`] rather than an error. Missing
    /// required arguments are rejected; nothing is defaulted.
    pub async fn dispatch(&self, name: &str, arguments: &Map<String, Value>) -> Result<Value, ToolError> {
        let Some(tool) = self.registry.get(name) else {
            warn!(function = name, "Model requested an unknown function");
            return Ok(no_such_function(name));
        };

        let missing: Vec<String> = tool
            .parameters()
            .into_iter()
            .filter(|p| p.required && arguments.get(&p.name).is_none_or(Value::is_null))
            .map(|p| p.name)
            .collect();
        if !missing.is_empty() {
            return Err(ToolError::InvalidArguments(format!(
                "'{name}' is missing required argument(s): {}",
                missing.join(", ")
            )));
        }

        debug!(function = name, "Dispatching function call");
        tool.execute(arguments).await
    }

    /// Parse the call's raw arguments, then [`dispatch`](Self::dispatch).
    pub async fn dispatch_call(&self, call: &FunctionCall) -> Result<Value, ToolError> {
        let arguments = call.parse_arguments()?;
        self.dispatch(&call.name, &arguments).await
    }
}
