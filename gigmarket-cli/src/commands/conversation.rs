//! Conversation commands.

use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;

use crate::chat;
use crate::config::{build_authed_client, Overrides};
use crate::handlers::conversation as handlers;
use crate::output::{print_json, print_table, OutputFormat, PlainPrint};

#[derive(Subcommand)]
pub enum ConversationAction {
    /// List your conversations
    #[command(alias = "ls")]
    List,

    /// Show one conversation
    Show {
        /// Conversation ID
        id: String,
    },

    /// Read one page of history
    Messages {
        /// Conversation ID
        id: String,
        /// Page number, 1 is newest
        #[arg(short, long, default_value = "1")]
        page: u32,
        /// Messages per page (max 50)
        #[arg(short, long, default_value = "50")]
        limit: u32,
    },

    /// Send a message
    Send {
        /// Conversation ID
        id: String,
        /// Message text
        text: String,
    },

    /// Start a conversation with another user
    Start {
        /// The other user's ID
        user_id: String,
    },

    /// Open a live chat with polling
    Chat {
        /// Conversation ID
        id: String,
    },
}

pub async fn handle(
    action: ConversationAction,
    overrides: &Overrides,
    format: OutputFormat,
) -> Result<()> {
    let client = build_authed_client(overrides)?;

    match action {
        ConversationAction::List => {
            print_table(handlers::list(&client).await?, format);
            Ok(())
        }
        ConversationAction::Show { id } => {
            print_table(vec![handlers::show(&client, &id).await?], format);
            Ok(())
        }
        ConversationAction::Messages { id, page, limit } => {
            let result = handlers::messages(&client, &id, page, limit).await?;
            if matches!(format, OutputFormat::Json) {
                print_json(&result);
                return Ok(());
            }
            if matches!(format, OutputFormat::Plain) {
                println!(
                    "{}",
                    format!(
                        "Conversation {} | page {}/{} | {} messages",
                        result.conversation_id, result.page, result.total_pages, result.total
                    )
                    .dimmed()
                );
            }
            print_table(result.messages, format);
            Ok(())
        }
        ConversationAction::Send { id, text } => {
            let message = handlers::send(&client, &id, &text).await?;
            match format {
                OutputFormat::Json => print_json(&message),
                _ => {
                    println!("{} {}", "Sent".green(), format!("({})", message.id).dimmed());
                    message.plain_print();
                }
            }
            Ok(())
        }
        ConversationAction::Start { user_id } => {
            let conversation = handlers::start(&client, &user_id).await?;
            print_table(vec![conversation], format);
            Ok(())
        }
        ConversationAction::Chat { id } => chat::run(client, &id, format).await,
    }
}
