//! Command and message handlers for the bot.

use crate::config::Settings;
use crate::pipeline;
use anyhow::Result;
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::types::ReplyParameters;
use teloxide::utils::command::BotCommands;

/// Commands understood by the bot.
#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase", description = "Supported commands:")]
pub enum Command {
    /// `/start` greeting.
    #[command(description = "Start the bot.")]
    Start,
}

/// Route a parsed command to its handler.
///
/// # Errors
///
/// Returns an error if the reply fails to send.
pub async fn handle_command(bot: Bot, msg: Message, cmd: Command) -> Result<()> {
    match cmd {
        Command::Start => start(bot, msg).await,
    }
}

/// Reply to `/start` with a greeting naming the sender.
async fn start(bot: Bot, msg: Message) -> Result<()> {
    let first_name = msg
        .from
        .as_ref()
        .map_or_else(|| "there".to_string(), |user| user.first_name.clone());

    let text = format!(
        "👋 Hello {first_name}!\n\n\
         I'm a direct link uploader bot.\n\
         Send me any direct download link and I'll upload it to Telegram!"
    );

    bot.send_message(msg.chat.id, text)
        .reply_parameters(ReplyParameters::new(msg.id))
        .await?;

    Ok(())
}

/// Catch-all for non-command private text: feed it to the pipeline as a
/// candidate URL.
///
/// Commands other than `/start` never reach this handler (the dispatch tree
/// filters out `/`-prefixed messages) and fall through silently.
///
/// # Errors
///
/// Returns an error if reporting back to the chat fails.
pub async fn handle_text(
    bot: Bot,
    msg: Message,
    http: reqwest::Client,
    settings: Arc<Settings>,
) -> Result<()> {
    pipeline::handle_link(bot, msg, http, settings).await
}

/// Whether a message is plain private text (not a `/`-prefixed command).
#[must_use]
pub fn is_plain_private_text(msg: &Message) -> bool {
    msg.chat.is_private() && msg.text().is_some_and(|t| !t.starts_with('/'))
}
