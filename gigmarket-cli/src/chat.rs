//! Interactive chat: a polled conversation session driven from stdin.

use std::collections::HashSet;
use std::sync::Arc;

use anyhow::{Context, Result};
use colored::Colorize;
use gigmarket::session::SendRejection;
use gigmarket::{ChatEntry, ConversationSession, MarketClient, Poller, Result as ApiResult, SendOutcome, UserId};
use tokio::sync::watch;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::handlers::conversation::MessageInfo;
use crate::output::{OutputFormat, PlainPrint};

#[derive(Debug, PartialEq, Eq)]
enum Input<'a> {
    Quit,
    Older,
    Help,
    Blank,
    Unknown(&'a str),
    Text(&'a str),
}

fn parse_input(line: &str) -> Input<'_> {
    let line = line.trim();
    match line {
        "" => Input::Blank,
        "/quit" | "/q" => Input::Quit,
        "/older" | "/o" => Input::Older,
        "/help" | "/h" => Input::Help,
        cmd if cmd.starts_with('/') && !cmd.starts_with("//") => Input::Unknown(cmd),
        // "//text" sends "/text".
        text => Input::Text(text.strip_prefix("//").map_or(text, |_| &text[1..])),
    }
}

/// Tracks which entries have been printed.
///
/// Pending entries are keyed by their local id, so a placeholder shows once as
/// "sending" and its confirmed message shows again under the server id.
struct Transcript {
    me: Option<UserId>,
    format: OutputFormat,
    shown: HashSet<String>,
}

impl Transcript {
    fn new(me: Option<UserId>, format: OutputFormat) -> Self {
        Self {
            me,
            format,
            shown: HashSet::new(),
        }
    }

    /// Entries not printed yet, in window order.
    fn fresh<'a>(&mut self, entries: &'a [ChatEntry]) -> Vec<&'a ChatEntry> {
        entries
            .iter()
            .filter(|e| self.shown.insert(e.key().to_string()))
            .collect()
    }

    fn show(&mut self, entries: &[ChatEntry]) {
        for entry in self.fresh(entries) {
            match (entry, self.format) {
                (ChatEntry::Confirmed(message), OutputFormat::Json) => {
                    let info = MessageInfo::new(message, self.me.as_ref());
                    println!("{}", serde_json::to_string(&info).unwrap_or_default())
                }
                (ChatEntry::Confirmed(message), _) => {
                    MessageInfo::new(message, self.me.as_ref()).plain_print()
                }
                (ChatEntry::Pending(pending), OutputFormat::Json) => {
                    println!("{}", serde_json::to_string(pending).unwrap_or_default())
                }
                (ChatEntry::Pending(pending), _) => {
                    println!("{}", format!("  sending… {}", pending.text).dimmed())
                }
            }
        }
    }
}

fn hint(text: &str) {
    eprintln!("{}", text.dimmed());
}

/// Send while still rendering changes, so the placeholder and any messages
/// polled in the meantime appear before the reply.
async fn send_watching(
    session: &ConversationSession,
    changes: &mut watch::Receiver<u64>,
    transcript: &mut Transcript,
    text: &str,
) -> ApiResult<SendOutcome> {
    let send = session.send(text);
    tokio::pin!(send);
    loop {
        tokio::select! {
            outcome = &mut send => return outcome,
            Ok(()) = changes.changed() => transcript.show(&session.entries()),
        }
    }
}

/// Run an interactive chat until `/quit` or end of input.
pub async fn run(client: MarketClient, id: &str, format: OutputFormat) -> Result<()> {
    let session = Arc::new(client.conversation_session(id).build());
    session
        .open()
        .await
        .with_context(|| format!("Failed to open conversation {id}"))?;

    let mut transcript = Transcript::new(client.current_user_id(), format);
    transcript.show(&session.entries());
    hint("Type a message and press Enter. /older loads history, /quit leaves.");

    let poller = Poller::spawn(session.clone());
    let mut changes = session.subscribe();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("Failed to read input")? else {
                    break;
                };
                match parse_input(&line) {
                    Input::Quit => break,
                    Input::Blank => {}
                    Input::Help => hint("/older  load earlier messages\n/quit   leave the chat\n//text  send text starting with /"),
                    Input::Unknown(cmd) => hint(&format!("Unknown command {cmd}; try /help")),
                    Input::Older => {
                        if !session.has_more() {
                            hint("No earlier messages.");
                            continue;
                        }
                        let added = session.load_older().await;
                        if added > 0 {
                            println!("{}", format!("── {added} earlier message(s) ──").dimmed());
                            transcript.show(&session.entries());
                        } else {
                            hint("Nothing loaded.");
                        }
                    }
                    Input::Text(text) => match send_watching(&session, &mut changes, &mut transcript, text).await {
                        Ok(SendOutcome::Sent(_)) => {
                            transcript.show(&session.entries());
                        }
                        Ok(SendOutcome::Ignored(SendRejection::AlreadySending)) => {
                            hint("Still sending the previous message.");
                        }
                        Ok(SendOutcome::Ignored(reason)) => {
                            hint(&format!("Not sent: {reason:?}"));
                        }
                        Err(e) => eprintln!("{} {}", "Send failed:".red(), e),
                    },
                }
            }
            changed = changes.changed() => {
                if changed.is_err() {
                    break;
                }
                transcript.show(&session.entries());
            }
        }
    }

    session.close();
    poller.stop();
    Ok(())
}
