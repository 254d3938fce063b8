//! Pulse terminal dashboard
//!
//! Live market table and message request board on top of the query cache.

mod render;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use pulse_core::QueryKey;
use pulse_services::{MessageForm, MessageQuery, Pager, PulseConfig, Settlement};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const CLEAR_SCREEN: &str = "\x1B[2J\x1B[H";

#[derive(Parser)]
#[command(name = "pulse-dashboard")]
#[command(about = "Crypto market table and message request board")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the market table, refreshed in the background
    Market {
        /// Page to start on
        #[arg(short, long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
        page: u32,
        /// Print one page and exit
        #[arg(long)]
        once: bool,
    },
    /// Show the message status board, refreshed in the background
    Messages {
        /// Print the list once and exit
        #[arg(long)]
        once: bool,
    },
    /// Submit a message request
    Send {
        /// Recipient phone number
        #[arg(long)]
        phone: String,
        /// Message body
        #[arg(short, long)]
        message: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    if let Err(e) = dotenvy::from_filename(".env.local") {
        if !matches!(e, dotenvy::Error::Io(_)) {
            eprintln!("Warning: Failed to load .env.local: {}", e);
        }
    }

    // Logs go to stderr so they don't interleave with the tables
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let cli = Cli::parse();
    let config = PulseConfig::from_env()?;
    debug!(?config, "Configuration loaded");

    match cli.command {
        Commands::Market { page, once } => market(&config, page, once).await,
        Commands::Messages { once } => messages(&config, once).await,
        Commands::Send { phone, message } => send(&config, phone, message).await,
    }
}

async fn market(config: &PulseConfig, page: u32, once: bool) -> Result<()> {
    let query = config.market_query();

    if once {
        let state = query.page(page).await;
        print!("{}", render::render_market(&state, page));
        if state.is_error() {
            bail!("{}", state.error.unwrap_or_default());
        }
        return Ok(());
    }

    let mut pager = Pager::starting_at(page);
    let mut events = query.cache().subscribe();
    let mut poll = query.poll(pager.page());
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    let draw = |pager: &Pager| {
        print!("{}", CLEAR_SCREEN);
        print!("{}", render::render_market(&query.state(pager.page()), pager.page()));
        let previous = if pager.has_previous() { "[p] previous  " } else { "" };
        println!("{}", format!("{}[n] next  [q] quit", previous).dimmed());
    };
    draw(&pager);

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(event) if event.key == pager.key() => draw(&pager),
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => {
                    debug!("Skipped {} cache events", skipped);
                    draw(&pager);
                }
                Err(RecvError::Closed) => break,
            },
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                let before = pager.page();
                match line.trim() {
                    "n" => {
                        pager.next();
                    }
                    "p" => {
                        pager.previous();
                    }
                    "q" => break,
                    _ => {}
                }
                if pager.page() != before {
                    info!("Switching to page {}", pager.page());
                    poll = query.poll(pager.page());
                }
                draw(&pager);
            }
        }
    }

    drop(poll);
    Ok(())
}

fn draw_board(query: &MessageQuery, form: &MessageForm) {
    print!("{}", CLEAR_SCREEN);
    print!("{}", render::render_messages(&query.messages()));
    print!("{}", render::render_form(form));
    println!("{}", "[s <phone> <message>] send  [q] quit".dimmed());
}

async fn messages(config: &PulseConfig, once: bool) -> Result<()> {
    let query = config.message_query();

    if once {
        print!("{}", list_once(&query).await);
        return Ok(());
    }

    let mutation = query.mutation();
    let mut form = MessageForm::new();
    let mut events = query.cache().subscribe();
    let _poll = query.poll();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    draw_board(&query, &form);

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(event) if event.key == QueryKey::Messages => draw_board(&query, &form),
                Ok(_) => {}
                Err(RecvError::Lagged(_)) => draw_board(&query, &form),
                Err(RecvError::Closed) => break,
            },
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                let line = line.trim();
                if line == "q" {
                    break;
                }
                let Some(rest) = line.strip_prefix("s ") else {
                    draw_board(&query, &form);
                    continue;
                };

                let (phone, message) = rest.trim().split_once(' ').unwrap_or((rest.trim(), ""));
                form.set_phone_number(phone);
                form.set_message(message);

                // Redraw while the request is in flight so the pending row shows
                let mut submitted = form.clone();
                {
                    let submit = mutation.send(&mut submitted);
                    tokio::pin!(submit);
                    loop {
                        tokio::select! {
                            _ = &mut submit => break,
                            event = events.recv() => {
                                if matches!(event, Ok(ref e) if e.key == QueryKey::Messages) {
                                    draw_board(&query, &form);
                                }
                            }
                        }
                    }
                }
                form = submitted;
                draw_board(&query, &form);
            }
        }
    }

    Ok(())
}

/// Load and render the list; a failed load is logged, never shown
async fn list_once(query: &MessageQuery) -> String {
    let state = query.list().await;
    if let Some(error) = &state.error {
        warn!("Message list unavailable: {}", error);
    }
    render::render_messages(&query.messages())
}

async fn send(config: &PulseConfig, phone: String, message: String) -> Result<()> {
    let query = config.message_query();
    query.list().await;

    let mut form = MessageForm::with_values(phone, message);
    let Some(settlement) = query.mutation().send(&mut form).await else {
        print!("{}", render::render_form(&form));
        bail!("Message not sent");
    };

    match settlement {
        Settlement::Success(created) => {
            println!(
                "{} {}",
                "Message submitted".green(),
                created.id.map(|id| format!("(id {})", id)).unwrap_or_default()
            );
            print!("{}", render::render_messages(&query.messages()));
            Ok(())
        }
        Settlement::Failure(e) => {
            print!("{}", render::render_form(&form));
            bail!("{}", e.user_message());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use pulse_core::{Message, MessageSource, NewMessage, PulseError, PulseResult};
    use std::sync::Arc;

    struct UnreachableInbox;

    #[async_trait]
    impl MessageSource for UnreachableInbox {
        async fn list_messages(&self) -> PulseResult<Vec<Message>> {
            Err(PulseError::network("Fetching Error"))
        }

        async fn submit_message(&self, _message: &NewMessage) -> PulseResult<Message> {
            Err(PulseError::network("An error has occurred"))
        }
    }

    #[tokio::test]
    async fn test_list_once_keeps_failure_silent() {
        colored::control::set_override(false);
        let query = MessageQuery::new(Arc::new(UnreachableInbox));

        let out = list_once(&query).await;

        assert!(out.contains("No messages yet"));
        assert!(!out.contains("Fetching Error"));
        assert!(query.state().is_error());
    }
}
