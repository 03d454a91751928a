//! Echo Bot Demo
//!
//! Registers a handful of handlers and feeds them updates read from stdin,
//! one JSON object per line, in the platform's `Update` format.
//!
//! # Handlers
//!
//! | Rule | Reply |
//! |------|-------|
//! | `/start`, `/start@<bot>` | greeting |
//! | text starting with `/echo ` | the rest of the text |
//! | regexp `(?i)^ping$` | `pong` |
//! | callback data starting with `vote:` | callback answer |
//! | anything else | logged by the default handler |
//!
//! # Usage
//!
//! ```bash
//! echo '{"update_id":1,"message":{"message_id":1,"date":0,"chat":{"id":7,"type":"private"},"text":"ping"}}' \
//!     | cargo run --package echo-bot -- --token 123456:ABC --skip-get-me
//! ```
//!
//! Without `--token` the bot is configured from `switchboard.toml` and
//! `SWITCHBOARD_*` environment variables.

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use futures::stream::{self, Stream};
use serde_json::json;
use switchboard::prelude::*;
use switchboard::runtime::LoggingBuilder;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(name = "echo-bot", about = "Echo bot driven by updates on stdin")]
struct Args {
    /// Bot token. Falls back to configuration files and environment.
    #[arg(long)]
    token: Option<String>,

    /// Use the platform's test environment.
    #[arg(long)]
    test_environment: bool,

    /// Do not call getMe on startup.
    #[arg(long)]
    skip_get_me: bool,

    /// Bot username, used for `/command@username` matching with --skip-get-me.
    #[arg(long)]
    username: Option<String>,
}

// ============================================================================
// Handlers
// ============================================================================

fn chat_id(update: &Update) -> Option<i64> {
    update.message.as_ref().map(|m| m.chat.id)
}

/// Replies through the generic API call, so it works with any [`Bot`].
async fn reply(bot: &BoxedBot, update: &Update, text: &str) {
    let Some(chat_id) = chat_id(update) else {
        return;
    };
    if let Err(e) = bot
        .call_api("sendMessage", json!({ "chat_id": chat_id, "text": text }))
        .await
    {
        error!("Failed to send reply: {}", e);
    }
}

async fn start_handler(bot: BoxedBot, update: Arc<Update>) {
    let name = update
        .message
        .as_ref()
        .and_then(|m| m.from.as_ref())
        .map(|u| u.first_name.as_str())
        .unwrap_or("there");
    reply(&bot, &update, &format!("Hello, {name}!")).await;
}

async fn echo_handler(bot: BoxedBot, update: Arc<Update>) {
    if let Some(content) = update
        .message
        .as_ref()
        .and_then(|m| m.text.strip_prefix("/echo "))
    {
        reply(&bot, &update, content).await;
    }
}

async fn ping_handler(bot: BoxedBot, update: Arc<Update>) {
    reply(&bot, &update, "pong").await;
}

/// Uses the typed helper on the concrete bot.
async fn vote_handler(bot: BoxedBot, update: Arc<Update>) {
    let Some(query) = update.callback_query.as_ref() else {
        return;
    };
    let Ok(bot) = bot.as_any().downcast::<TelegramBot>() else {
        warn!("Vote handler needs a TelegramBot");
        return;
    };

    let choice = query.data.trim_start_matches("vote:");
    if let Err(e) = bot
        .answer_callback_query(&query.id, Some(&format!("Voted for {choice}")))
        .await
    {
        error!("Failed to answer callback query: {}", e);
    }
}

async fn unmatched_handler(_bot: BoxedBot, update: Arc<Update>) {
    info!(
        update_id = update.update_id,
        kind = update.kind_name(),
        "No handler for update"
    );
}

fn logging_middleware() -> Middleware {
    Arc::new(|next: HandlerFunc| {
        handler_fn(move |bot, update| {
            let next = Arc::clone(&next);
            async move {
                info!(update_id = update.update_id, "Handling update");
                next(bot, update).await;
            }
        })
    })
}

// ============================================================================
// Update source
// ============================================================================

/// Yields updates parsed from stdin lines. Malformed lines are skipped.
fn stdin_updates() -> impl Stream<Item = Update> {
    let lines = BufReader::new(tokio::io::stdin()).lines();
    stream::unfold(lines, |mut lines| async move {
        loop {
            match lines.next_line().await {
                Ok(Some(line)) if line.trim().is_empty() => continue,
                Ok(Some(line)) => match serde_json::from_str::<Update>(&line) {
                    Ok(update) => return Some((update, lines)),
                    Err(e) => warn!("Skipping malformed update: {}", e),
                },
                Ok(None) => return None,
                Err(e) => {
                    error!("Failed to read stdin: {}", e);
                    return None;
                }
            }
        }
    })
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let bot = match args.token {
        Some(token) => {
            LoggingBuilder::new().init();
            let mut builder = Switchboard::builder(token)
                .test_environment(args.test_environment)
                .skip_get_me(args.skip_get_me)
                .default_handler(handler_fn(unmatched_handler))
                .middleware(logging_middleware());
            if let Some(username) = args.username {
                builder = builder.username(username);
            }
            builder.build()?
        }
        None => Switchboard::load()?,
    };

    bot.register_handler(
        HandlerType::MessageText,
        "start",
        MatchType::CommandStartMaybeWithBotUsernameSuffix,
        handler_fn(start_handler),
    );
    bot.register_handler(
        HandlerType::MessageText,
        "/echo ",
        MatchType::Prefix,
        handler_fn(echo_handler),
    );
    bot.register_handler_regexp(
        HandlerType::MessageText,
        Regex::new("(?i)^ping$")?,
        handler_fn(ping_handler),
    );
    bot.register_handler(
        HandlerType::CallbackQueryData,
        "vote:",
        MatchType::Prefix,
        handler_fn(vote_handler),
    );

    bot.init().await?;
    info!(bot = ?bot.identity(), "Echo bot ready");

    tokio::select! {
        _ = bot.run(stdin_updates()) => info!("Input closed"),
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupted");
            bot.shutdown();
        }
    }

    Ok(())
}
