use clap::{Parser, Subcommand};

mod api;
mod app;
mod commands;
mod config;
mod conversation;
mod knowledge;
mod server;
mod ui;

use config::Config;

#[derive(Parser)]
#[command(name = "modista")]
#[command(version)]
#[command(about = "Terminal chat client for fashion advice", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Send one message and print the reply
    Ask { message: String },
    /// Check whether the chat service is reachable
    Health,
    /// Run the bundled stub advice service
    Serve {
        /// Port to listen on
        #[arg(long, default_value_t = 8000)]
        port: u16,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = Config::load()?;

    match cli.command {
        // modista with no args = interactive chat
        None => app::run(config).await,
        Some(Commands::Ask { message }) => {
            init_tracing();
            commands::ask(&config, &message).await
        }
        Some(Commands::Health) => {
            init_tracing();
            commands::health(&config).await
        }
        Some(Commands::Serve { port }) => {
            init_tracing();
            server::serve(port).await
        }
    }
}

/// Log to stderr for the non-interactive commands. The chat screen owns
/// the terminal, so it skips this.
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
