//! Gig marketplace CLI and MCP Server.

mod chat;
mod commands;
mod config;
mod handlers;
mod mcp;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{conversation, reel};
use config::Overrides;
use tracing_subscriber::EnvFilter;

/// Gig marketplace CLI and MCP Server
#[derive(Parser)]
#[command(name = "gigm")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Output format
    #[arg(short, long, global = true, default_value = "plain")]
    format: output::OutputFormat,

    /// Show verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(flatten)]
    overrides: Overrides,

    #[command(subcommand)]
    command: Option<Commands>,

    /// Run as MCP Server
    #[arg(long)]
    mcp: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage authentication
    Auth {
        #[command(subcommand)]
        action: AuthAction,
    },

    /// Reel feed operations
    #[command(alias = "r")]
    Reel {
        #[command(subcommand)]
        action: reel::ReelAction,
    },

    /// Conversation operations
    #[command(alias = "c")]
    Conversation {
        #[command(subcommand)]
        action: conversation::ConversationAction,
    },

    /// Show current configuration
    Config,
}

#[derive(Subcommand)]
enum AuthAction {
    /// Store a bearer token and user id
    Login {
        /// Bearer token
        #[arg(short, long)]
        token: String,
        /// User ID
        #[arg(short, long)]
        user_id: String,
    },
    /// Forget the stored credentials
    Logout,
    /// Show current auth status
    Status,
}

fn init_tracing(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose);

    if cli.mcp {
        return mcp::run_server(cli.overrides).await;
    }

    let command = cli
        .command
        .ok_or_else(|| anyhow::anyhow!("No command given. Run 'gigm --help' for usage."))?;

    match command {
        Commands::Auth { action } => handle_auth(action),
        Commands::Reel { action } => reel::handle(action, &cli.overrides, cli.format).await,
        Commands::Conversation { action } => {
            conversation::handle(action, &cli.overrides, cli.format).await
        }
        Commands::Config => {
            let cfg = config::load_config()?.with_overrides(&cli.overrides);
            println!("Config file: {}", config::config_path()?.display());
            println!("API URL: {}", cfg.api_url());
            println!("Authenticated: {}", cfg.auth.is_some());
            if let Some(auth) = &cfg.auth {
                println!("User ID: {}", auth.user_id);
            }
            Ok(())
        }
    }
}

fn handle_auth(action: AuthAction) -> Result<()> {
    match action {
        AuthAction::Login { token, user_id } => {
            let mut cfg = config::load_config()?;
            cfg.auth = Some(config::AuthConfig {
                token,
                user_id: user_id.clone(),
            });
            config::save_config(&cfg)?;
            println!("Logged in as {user_id}");
            Ok(())
        }
        AuthAction::Logout => {
            let mut cfg = config::load_config()?;
            cfg.auth = None;
            config::save_config(&cfg)?;
            println!("Logged out");
            Ok(())
        }
        AuthAction::Status => {
            let cfg = config::load_config()?;
            match &cfg.auth {
                Some(auth) => println!("Logged in as {}", auth.user_id),
                None => println!("Not logged in"),
            }
            Ok(())
        }
    }
}
