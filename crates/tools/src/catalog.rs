//! The function catalog offered to the model.

use std::sync::Arc;

use threadwise_core::tool::{FunctionDeclaration, ToolRegistry};

use crate::checklist::{ChecklistRegistry, GetChecklistTool};

/// Registry holding every local function, in catalog order.
pub fn default_registry(checklists: Arc<ChecklistRegistry>) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Box::new(GetChecklistTool::new(checklists)));
    registry
}

/// Declarations of [`default_registry`].
pub fn declarations(checklists: Arc<ChecklistRegistry>) -> Vec<FunctionDeclaration> {
    default_registry(checklists).declarations()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_is_stable() {
        let checklists = Arc::new(ChecklistRegistry::builtin().unwrap());
        let first = declarations(checklists.clone());
        let second = declarations(checklists);
        assert_eq!(first, second);
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].name, "get_checklist");
        assert_eq!(
            first[0].required_parameters().collect::<Vec<_>>(),
            ["service_system"]
        );
    }
}
