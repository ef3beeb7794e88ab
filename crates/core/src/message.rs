//! Message and conversation-window domain types.
//!
//! These are the value objects that flow through one invocation:
//! thread history → [`ConversationWindow`] → completion request → assistant reply.

use serde::{Deserialize, Serialize};

use crate::error::ToolError;

/// The role of a message sender in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Fixed behavioral instructions
    System,
    /// A human participant in the thread
    User,
    /// The automated agent
    Assistant,
    /// Output of a local function, re-injected for the model
    Function,
}

/// A single conversational turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Who sent this message
    pub role: Role,

    /// The text content (function results are JSON serialized to text)
    #[serde(default)]
    pub content: String,

    /// For function results: the function that produced the content
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// For assistant messages: the function the model asked to invoke
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_call: Option<FunctionCall>,
}

impl Message {
    fn with_role(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            name: None,
            function_call: None,
        }
    }

    /// Create a new system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self::with_role(Role::System, content)
    }

    /// Create a new user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::with_role(Role::User, content)
    }

    /// Create a new assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::with_role(Role::Assistant, content)
    }

    /// Create a function-result message tagged with the producing function's name.
    pub fn function_result(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::with_role(Role::Function, content)
        }
    }

    /// Whether the model asked for a local function in this message.
    pub fn requests_function(&self) -> bool {
        self.function_call.is_some()
    }
}

/// A function invocation requested by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    /// Name of the declared function
    pub name: String,

    /// Arguments exactly as the model produced them (a JSON object in text form)
    pub arguments: String,
}

impl FunctionCall {
    pub fn new(name: impl Into<String>, arguments: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            arguments: arguments.into(),
        }
    }

    /// Parse the raw argument text into a JSON object.
    ///
    /// Blank text is treated as an empty object; anything that is not a JSON
    /// object is rejected.
    pub fn parse_arguments(
        &self,
    ) -> std::result::Result<serde_json::Map<String, serde_json::Value>, ToolError> {
        if self.arguments.trim().is_empty() {
            return Ok(serde_json::Map::new());
        }
        match serde_json::from_str::<serde_json::Value>(&self.arguments) {
            Ok(serde_json::Value::Object(map)) => Ok(map),
            Ok(other) => Err(ToolError::InvalidArguments(format!(
                "arguments for '{}' must be a JSON object, got {other}",
                self.name
            ))),
            Err(e) => Err(ToolError::InvalidArguments(format!(
                "arguments for '{}' are not valid JSON: {e}",
                self.name
            ))),
        }
    }
}

/// The bounded, ordered message sequence sent to the model.
///
/// Always starts with exactly one system message. Rebuilt on every
/// invocation and never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ConversationWindow {
    messages: Vec<Message>,
}

impl ConversationWindow {
    /// Create a window from the instruction text and chronologically ordered history.
    pub fn new(system_prompt: impl Into<String>, history: impl IntoIterator<Item = Message>) -> Self {
        let mut messages = vec![Message::system(system_prompt)];
        messages.extend(history.into_iter().filter(|m| m.role != Role::System));
        Self { messages }
    }

    /// Append a message after the existing history.
    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// The leading instruction text.
    pub fn system_prompt(&self) -> &str {
        &self.messages[0].content
    }

    /// Number of messages after the leading system message.
    pub fn history_len(&self) -> usize {
        self.messages.len() - 1
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// A window always holds its system message, so it is never empty.
    pub fn is_empty(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn function_result_carries_name() {
        let msg = Message::function_result("get_checklist", "{\"items\":[]}");
        assert_eq!(msg.role, Role::Function);
        assert_eq!(msg.name.as_deref(), Some("get_checklist"));
        assert!(msg.function_call.is_none());
    }

    #[test]
    fn role_serializes_lowercase() {
        let json = serde_json::to_string(&Message::function_result("f", "x")).unwrap();
        assert!(json.contains("\"role\":\"function\""));
        assert!(json.contains("\"name\":\"f\""));
        let plain = serde_json::to_string(&Message::user("hi")).unwrap();
        assert!(!plain.contains("function_call"));
        assert!(!plain.contains("\"name\""));
    }

    #[test]
    fn parse_arguments_object() {
        let call = FunctionCall::new("get_checklist", r#"{"service_system":"WEBサーバ"}"#);
        let args = call.parse_arguments().unwrap();
        assert_eq!(args["service_system"], "WEBサーバ");
    }

    #[test]
    fn parse_arguments_blank_is_empty_object() {
        let call = FunctionCall::new("get_checklist", "  ");
        assert!(call.parse_arguments().unwrap().is_empty());
    }

    #[test]
    fn parse_arguments_rejects_non_objects() {
        let array = FunctionCall::new("f", "[1,2]");
        assert!(matches!(
            array.parse_arguments(),
            Err(ToolError::InvalidArguments(_))
        ));
        let broken = FunctionCall::new("f", "{\"a\":");
        assert!(matches!(
            broken.parse_arguments(),
            Err(ToolError::InvalidArguments(_))
        ));
    }

    #[test]
    fn window_has_exactly_one_leading_system_message() {
        let window = ConversationWindow::new(
            "be brief",
            vec![
                Message::system("stray"),
                Message::user("hello"),
                Message::assistant("hi"),
            ],
        );
        assert_eq!(window.len(), 3);
        assert_eq!(window.history_len(), 2);
        assert_eq!(window.messages()[0].role, Role::System);
        assert_eq!(window.system_prompt(), "be brief");
        assert_eq!(
            window.messages().iter().filter(|m| m.role == Role::System).count(),
            1
        );
    }

    #[test]
    fn window_serializes_as_plain_list() {
        let window = ConversationWindow::new("sys", vec![Message::user("q")]);
        let json = serde_json::to_value(&window).unwrap();
        assert!(json.is_array());
        assert_eq!(json.as_array().unwrap().len(), 2);
    }
}
