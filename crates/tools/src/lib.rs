//! Local functions the model may call.
//!
//! - [`checklist`]: the service-system checklists and `get_checklist`
//! - [`catalog`]: the ordered declarations offered on the first pass
//! - [`dispatcher`]: name → implementation, with argument validation

pub mod catalog;
pub mod checklist;
pub mod dispatcher;

pub use catalog::{declarations, default_registry};
pub use checklist::{ChecklistRegistry, GetChecklistTool, KnowledgeError, Topic};
pub use dispatcher::{FunctionDispatcher, no_such_function};
