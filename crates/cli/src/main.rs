//! threadwise CLI: the main entry point.
//!
//! Commands:
//! - `serve`     Run the webhook gateway over HTTP
//! - `invoke`    Handle one `{headers, body}` event from a file or stdin
//! - `catalog`   Print the function catalog offered to the model
//! - `checklist` Print one checklist document
//! - `config`    Validate the configuration or print the defaults

use clap::{Parser, Subcommand};
use threadwise_tools::Topic;

mod commands;

#[derive(Parser)]
#[command(
    name = "threadwise",
    about = "threadwise: answers Slack threads with an LLM and a checklist catalog",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP gateway server
    Serve {
        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Handle a single invocation event
    Invoke {
        /// Path to the event JSON, or `-` for stdin
        #[arg(short, long, default_value = "-")]
        event: String,
    },

    /// Print the function catalog
    Catalog,

    /// Print a checklist by label or id
    /// (authentication-infrastructure, web-server, network-equipment)
    Checklist {
        #[arg(value_parser = parse_topic)]
        topic: Topic,
    },

    /// Validate the configuration
    Config {
        /// Print the default configuration as TOML instead
        #[arg(long)]
        defaults: bool,
    },
}

fn parse_topic(s: &str) -> Result<Topic, String> {
    s.parse().map_err(|_| {
        let known: Vec<_> = Topic::ALL.iter().map(|t| t.id()).collect();
        format!("unknown topic '{s}', expected a label or one of: {}", known.join(", "))
    })
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter));
    if cli.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    }

    match cli.command {
        Commands::Serve { port } => commands::serve::run(port).await?,
        Commands::Invoke { event } => commands::invoke::run(&event).await?,
        Commands::Catalog => commands::catalog::run()?,
        Commands::Checklist { topic } => commands::checklist::run(topic)?,
        Commands::Config { defaults } => commands::config_cmd::run(defaults)?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checklist_accepts_ids_and_labels() {
        for arg in ["web-server", "WEBサーバ", "network-equipment"] {
            let cli = Cli::try_parse_from(["threadwise", "checklist", arg]).unwrap();
            assert!(matches!(cli.command, Commands::Checklist { .. }), "{arg}");
        }
    }

    #[test]
    fn checklist_rejects_file_stems() {
        let err = Cli::try_parse_from(["threadwise", "checklist", "aaa"])
            .err()
            .unwrap();
        assert!(err.to_string().contains("authentication-infrastructure"));
    }

    #[test]
    fn every_topic_id_parses() {
        for topic in Topic::ALL {
            assert_eq!(parse_topic(topic.id()).unwrap(), topic);
        }
    }
}
