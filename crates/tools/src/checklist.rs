//! Checklist knowledge: the only local data the model can ask for.
//!
//! Three service systems, each with a JSON checklist of items to verify and
//! hints on how. The set is closed: a topic outside [`Topic::ALL`] is a
//! lookup miss, never a fallback to some other file.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use threadwise_core::error::ToolError;
use threadwise_core::tool::{ParameterSpec, Tool};
use tracing::debug;

/// A service system with a checklist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    AuthenticationInfrastructure,
    WebServer,
    NetworkEquipment,
}

impl Topic {
    pub const ALL: [Topic; 3] = [
        Topic::AuthenticationInfrastructure,
        Topic::WebServer,
        Topic::NetworkEquipment,
    ];

    /// The label the model is told to use.
    pub fn label(self) -> &'static str {
        match self {
            Topic::AuthenticationInfrastructure => "認証基盤",
            Topic::WebServer => "WEBサーバ",
            Topic::NetworkEquipment => "ネットワーク機器",
        }
    }

    /// Kebab-case id for the CLI.
    pub fn id(self) -> &'static str {
        match self {
            Topic::AuthenticationInfrastructure => "authentication-infrastructure",
            Topic::WebServer => "web-server",
            Topic::NetworkEquipment => "network-equipment",
        }
    }

    pub fn file_name(self) -> &'static str {
        match self {
            Topic::AuthenticationInfrastructure => "aaa.json",
            Topic::WebServer => "web.json",
            Topic::NetworkEquipment => "network.json",
        }
    }

    fn index(self) -> usize {
        match self {
            Topic::AuthenticationInfrastructure => 0,
            Topic::WebServer => 1,
            Topic::NetworkEquipment => 2,
        }
    }

    fn builtin_document(self) -> &'static str {
        match self {
            Topic::AuthenticationInfrastructure => include_str!("../checklists/aaa.json"),
            Topic::WebServer => include_str!("../checklists/web.json"),
            Topic::NetworkEquipment => include_str!("../checklists/network.json"),
        }
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Topic {
    type Err = KnowledgeError;

    /// Accepts the label or the id, exactly.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Topic::ALL
            .into_iter()
            .find(|t| t.label() == s || t.id() == s)
            .ok_or_else(|| KnowledgeError::NotFound(s.to_string()))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum KnowledgeError {
    #[error("no checklist for service system '{0}'")]
    NotFound(String),

    #[error("failed to read checklist {path}: {reason}")]
    Read { path: PathBuf, reason: String },

    #[error("checklist {file} is not valid JSON: {reason}")]
    Malformed { file: String, reason: String },
}

impl From<KnowledgeError> for ToolError {
    fn from(e: KnowledgeError) -> Self {
        match e {
            KnowledgeError::NotFound(_) => ToolError::NotFound(e.to_string()),
            other => ToolError::ExecutionFailed {
                tool_name: GET_CHECKLIST.into(),
                reason: other.to_string(),
            },
        }
    }
}

/// The three checklists, parsed once.
#[derive(Debug, Clone)]
pub struct ChecklistRegistry {
    documents: [Value; 3],
}

impl ChecklistRegistry {
    /// The checklists compiled into the binary.
    pub fn builtin() -> Result<Self, KnowledgeError> {
        Self::build(|topic| Ok(topic.builtin_document().to_string()))
    }

    /// Load `aaa.json`, `web.json` and `network.json` from `dir`.
    pub fn from_dir(dir: &Path) -> Result<Self, KnowledgeError> {
        Self::build(|topic| {
            let path = dir.join(topic.file_name());
            std::fs::read_to_string(&path).map_err(|e| KnowledgeError::Read {
                path,
                reason: e.to_string(),
            })
        })
    }

    /// `from_dir` when a directory is configured, otherwise the built-in set.
    pub fn load(dir: Option<&Path>) -> Result<Self, KnowledgeError> {
        match dir {
            Some(dir) => Self::from_dir(dir),
            None => Self::builtin(),
        }
    }

    fn build(
        read: impl Fn(Topic) -> Result<String, KnowledgeError>,
    ) -> Result<Self, KnowledgeError> {
        let parse = |topic: Topic| -> Result<Value, KnowledgeError> {
            let text = read(topic)?;
            serde_json::from_str(&text).map_err(|e| KnowledgeError::Malformed {
                file: topic.file_name().into(),
                reason: e.to_string(),
            })
        };
        let [a, w, n] = Topic::ALL;
        Ok(Self {
            documents: [parse(a)?, parse(w)?, parse(n)?],
        })
    }

    pub fn lookup(&self, topic: Topic) -> &Value {
        &self.documents[topic.index()]
    }

    /// Lookup by label or id.
    pub fn lookup_label(&self, label: &str) -> Result<&Value, KnowledgeError> {
        let topic: Topic = label.parse()?;
        Ok(self.lookup(topic))
    }
}

pub const GET_CHECKLIST: &str = "get_checklist";
pub const SERVICE_SYSTEM: &str = "service_system";

const GET_CHECKLIST_DESCRIPTION: &str =
    "Get the checking items and hints for each service systems";
const SERVICE_SYSTEM_DESCRIPTION: &str =
    "target system, 以下のいずれかのみ指定可能。「認証基盤」,「WEBサーバ」,「ネットワーク機器」";

/// `get_checklist(service_system)`.
pub struct GetChecklistTool {
    checklists: Arc<ChecklistRegistry>,
}

impl GetChecklistTool {
    pub fn new(checklists: Arc<ChecklistRegistry>) -> Self {
        Self { checklists }
    }
}

#[async_trait]
impl Tool for GetChecklistTool {
    fn name(&self) -> &str {
        GET_CHECKLIST
    }

    fn description(&self) -> &str {
        GET_CHECKLIST_DESCRIPTION
    }

    fn parameters(&self) -> Vec<ParameterSpec> {
        vec![ParameterSpec::required(
            SERVICE_SYSTEM,
            "string",
            SERVICE_SYSTEM_DESCRIPTION,
        )]
    }

    async fn execute(
        &self,
        arguments: &serde_json::Map<String, Value>,
    ) -> Result<Value, ToolError> {
        let system = arguments
            .get(SERVICE_SYSTEM)
            .and_then(Value::as_str)
            .ok_or_else(|| {
                ToolError::InvalidArguments(format!("'{SERVICE_SYSTEM}' must be a string"))
            })?;

        debug!(service_system = system, "Looking up checklist");
        Ok(self.checklists.lookup_label(system)?.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(value: Value) -> serde_json::Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn labels_and_ids_parse() {
        assert_eq!("認証基盤".parse::<Topic>().unwrap(), Topic::AuthenticationInfrastructure);
        assert_eq!("WEBサーバ".parse::<Topic>().unwrap(), Topic::WebServer);
        assert_eq!("network-equipment".parse::<Topic>().unwrap(), Topic::NetworkEquipment);
    }

    #[test]
    fn unknown_topic_is_not_found() {
        assert!(matches!("DBサーバ".parse::<Topic>(), Err(KnowledgeError::NotFound(_))));
        // case and spacing are not normalized
        assert!("webサーバ".parse::<Topic>().is_err());
        assert!(" 認証基盤".parse::<Topic>().is_err());
    }

    #[test]
    fn builtin_checklists_match_their_topic() {
        let registry = ChecklistRegistry::builtin().unwrap();
        for topic in Topic::ALL {
            let doc = registry.lookup(topic);
            assert_eq!(doc["service_system"], topic.label());
            assert!(!doc["items"].as_array().unwrap().is_empty());
        }
    }

    #[test]
    fn from_dir_reads_the_three_files() {
        let dir = tempfile::tempdir().unwrap();
        for topic in Topic::ALL {
            std::fs::write(
                dir.path().join(topic.file_name()),
                format!(r#"{{"service_system":"{}","items":[]}}"#, topic.id()),
            )
            .unwrap();
        }
        let registry = ChecklistRegistry::from_dir(dir.path()).unwrap();
        assert_eq!(registry.lookup(Topic::WebServer)["service_system"], "web-server");
    }

    #[test]
    fn from_dir_missing_or_malformed_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            ChecklistRegistry::from_dir(dir.path()),
            Err(KnowledgeError::Read { .. })
        ));

        for topic in Topic::ALL {
            std::fs::write(dir.path().join(topic.file_name()), "{}").unwrap();
        }
        std::fs::write(dir.path().join("web.json"), "{ nope").unwrap();
        assert!(matches!(
            ChecklistRegistry::from_dir(dir.path()),
            Err(KnowledgeError::Malformed { ref file, .. }) if file == "web.json"
        ));
    }

    #[test]
    fn declaration_is_byte_exact() {
        let tool = GetChecklistTool::new(Arc::new(ChecklistRegistry::builtin().unwrap()));
        let decl = tool.to_declaration();
        assert_eq!(decl.name, "get_checklist");
        assert_eq!(
            decl.description,
            "Get the checking items and hints for each service systems"
        );
        let schema = decl.parameters_schema();
        assert_eq!(
            schema["properties"]["service_system"]["description"],
            "target system, 以下のいずれかのみ指定可能。「認証基盤」,「WEBサーバ」,「ネットワーク機器」"
        );
        assert_eq!(schema["required"], serde_json::json!(["service_system"]));
    }

    #[tokio::test]
    async fn execute_returns_checklist() {
        let registry = Arc::new(ChecklistRegistry::builtin().unwrap());
        let tool = GetChecklistTool::new(registry.clone());
        let result = tool
            .execute(&args(serde_json::json!({"service_system": "ネットワーク機器"})))
            .await
            .unwrap();
        assert_eq!(&result, registry.lookup(Topic::NetworkEquipment));
    }

    #[tokio::test]
    async fn execute_unknown_topic_is_not_found() {
        let tool = GetChecklistTool::new(Arc::new(ChecklistRegistry::builtin().unwrap()));
        let err = tool
            .execute(&args(serde_json::json!({"service_system": "メールサーバ"})))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::NotFound(_)));
    }

    #[tokio::test]
    async fn execute_non_string_argument_is_invalid() {
        let tool = GetChecklistTool::new(Arc::new(ChecklistRegistry::builtin().unwrap()));
        let err = tool
            .execute(&args(serde_json::json!({"service_system": 3})))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)));
    }
}
