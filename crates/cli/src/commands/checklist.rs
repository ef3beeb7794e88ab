//! `threadwise checklist`: Print one checklist document.

use threadwise_config::AppConfig;
use threadwise_tools::{ChecklistRegistry, Topic};

pub fn run(topic: Topic) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    let checklists = ChecklistRegistry::load(config.knowledge.checklist_dir.as_deref())?;

    let document = checklists.lookup(topic);
    println!("{}", serde_json::to_string_pretty(document)?);

    Ok(())
}
