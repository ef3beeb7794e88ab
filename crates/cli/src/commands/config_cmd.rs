//! `threadwise config`: Validate the configuration or print the defaults.

use threadwise_config::AppConfig;

pub fn run(defaults: bool) -> Result<(), Box<dyn std::error::Error>> {
    if defaults {
        print!("{}", AppConfig::default_toml());
        return Ok(());
    }

    println!("Validating configuration...");
    let config = AppConfig::load().map_err(|e| format!("Config error: {e}"))?;
    let prompt = config.load_system_prompt()?;

    println!("   Config parsed and validated");
    println!();
    println!("   Provider:  {} ({})", config.provider.name, config.provider.base_url);
    println!("   Model:     {}", config.provider.model);
    println!(
        "   Prompt:    {} ({} chars)",
        config.prompt.system_prompt_path.display(),
        prompt.chars().count()
    );
    println!("   Window:    {} messages", config.prompt.context_window);
    println!("   Rounds:    {}", config.orchestration.max_function_rounds);
    println!(
        "   Secrets:   {} via {:?}",
        config.secrets.name, config.secrets.backend
    );
    match &config.knowledge.checklist_dir {
        Some(dir) => println!("   Checklists: {}", dir.display()),
        None => println!("   Checklists: built in"),
    }

    Ok(())
}
