//! `threadwise catalog`: Print the declarations offered to the model.

use std::sync::Arc;

use threadwise_config::AppConfig;
use threadwise_tools::{ChecklistRegistry, declarations};

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    let checklists = ChecklistRegistry::load(config.knowledge.checklist_dir.as_deref())?;

    let catalog = declarations(Arc::new(checklists));
    println!("{}", serde_json::to_string_pretty(&catalog)?);

    Ok(())
}
