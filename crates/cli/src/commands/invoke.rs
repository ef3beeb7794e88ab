//! `threadwise invoke`: Handle one event the way a serverless runtime would.
//!
//! Reads `{"headers": {...}, "body": "..."}` and prints
//! `{"statusCode": 200, "body": "..."}` on stdout.

use std::io::Read;

use threadwise_config::AppConfig;
use threadwise_gateway::{InvocationEvent, InvocationHandler};
use tracing::debug;

pub async fn run(source: &str) -> Result<(), Box<dyn std::error::Error>> {
    let raw = read_source(source)?;
    let event: InvocationEvent =
        serde_json::from_str(&raw).map_err(|e| format!("Invalid invocation event: {e}"))?;

    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    let handler = InvocationHandler::from_config(config)?;

    let response = handler.handle(event).await;
    debug!(status = response.status_code, "Invocation finished");
    println!("{}", serde_json::to_string(&response)?);

    Ok(())
}

fn read_source(source: &str) -> Result<String, Box<dyn std::error::Error>> {
    if source == "-" {
        let mut raw = String::new();
        std::io::stdin().read_to_string(&mut raw)?;
        Ok(raw)
    } else {
        std::fs::read_to_string(source).map_err(|e| format!("Cannot read {source}: {e}").into())
    }
}
