//! `threadwise serve`: Start the HTTP webhook server.

use threadwise_config::AppConfig;
use threadwise_gateway::InvocationHandler;

pub async fn run(port_override: Option<u16>) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    if let Some(port) = port_override {
        config.gateway.port = port;
    }

    println!("threadwise gateway");
    println!("   Listening: {}:{}", config.gateway.host, config.gateway.port);
    println!("   Model:     {}", config.provider.model);
    println!(
        "   Rounds:    {} function call(s) per message",
        config.orchestration.max_function_rounds
    );

    let handler = InvocationHandler::from_config(config)?;
    threadwise_gateway::start(handler).await?;

    Ok(())
}
