//! Download-then-upload pipeline for one submitted link.
//!
//! One invocation per inbound message: validate the URL, post a status
//! message, stream the file to a unique temporary path, re-upload it as a
//! document, report the outcome by editing or deleting the status message,
//! and always remove the temporary file on the way out.

use crate::config::Settings;
use crate::download::{self, DownloadError};
use anyhow::Result;
use std::path::Path;
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::types::InputFile;
use thiserror::Error;
use tracing::{error, info, warn};

/// Reply for input that does not start with an HTTP/HTTPS scheme.
pub const MSG_INVALID_URL: &str = "❌ Invalid URL. Please send a direct download link.";
/// Initial status message content.
pub const MSG_DOWNLOADING: &str = "🔄 Downloading the file...";
/// Status message content for failures outside the download taxonomy.
pub use crate::download::MSG_UNEXPECTED;
/// Caption attached to every uploaded document.
pub const UPLOAD_CAPTION: &str = "✅ Uploaded by @UplinkUploaderBot";

/// Failure of the fetch-write-upload sequence.
#[derive(Debug, Error)]
enum TransferError {
    #[error(transparent)]
    Download(#[from] DownloadError),
    #[error("upload failed: {0}")]
    Upload(#[from] teloxide::RequestError),
}

impl TransferError {
    const fn user_message(&self) -> &'static str {
        match self {
            Self::Download(e) => e.user_message(),
            Self::Upload(_) => MSG_UNEXPECTED,
        }
    }
}

/// Handle one candidate URL submitted in a private chat.
///
/// Invalid input gets an immediate reply and touches neither the network nor
/// the filesystem. Everything else runs the full pipeline; every failure
/// category ends as exactly one edit of the status message, and the
/// temporary file is removed on every exit path.
///
/// # Errors
///
/// Returns an error only if reporting back to the chat itself fails; all
/// download/upload failures are consumed and reported to the user.
pub async fn handle_link(
    bot: Bot,
    msg: Message,
    http: reqwest::Client,
    settings: Arc<Settings>,
) -> Result<()> {
    let url = msg.text().unwrap_or_default().trim().to_string();

    if !download::is_direct_link(&url) {
        bot.send_message(msg.chat.id, MSG_INVALID_URL).await?;
        return Ok(());
    }

    let status = bot.send_message(msg.chat.id, MSG_DOWNLOADING).await?;

    let display_name = download::display_file_name(&url);
    let local_path = download::unique_local_path(Path::new("."), &display_name);

    let outcome = transfer(&bot, &msg, &http, &settings, &url, &display_name, &local_path).await;

    remove_temp_file(&local_path).await;

    match outcome {
        Ok(()) => {
            bot.delete_message(msg.chat.id, status.id).await?;
            notify_log_channel(&bot, &settings, &display_name, &msg).await;
        }
        Err(err) => {
            match &err {
                TransferError::Download(
                    DownloadError::UnknownSize | DownloadError::TooLarge { .. },
                ) => {
                    info!(url = %url, error = %err, "Rejected download");
                }
                other => {
                    error!(url = %url, file = %display_name, error = %other, "Transfer failed");
                }
            }
            bot.edit_message_text(msg.chat.id, status.id, err.user_message())
                .await?;
        }
    }

    Ok(())
}

/// Fetch the file to `local_path`, then send it as a document.
///
/// The upload re-attaches `display_name` so the unique on-disk name stays
/// invisible to the chat.
async fn transfer(
    bot: &Bot,
    msg: &Message,
    http: &reqwest::Client,
    settings: &Settings,
    url: &str,
    display_name: &str,
    local_path: &Path,
) -> Result<(), TransferError> {
    let fetched = download::fetch_to_file(http, url, settings.max_file_size, local_path).await?;

    info!(
        file = %display_name,
        declared_len = fetched.declared_len,
        bytes_written = fetched.bytes_written,
        "Download complete, uploading"
    );

    let document = InputFile::file(local_path.to_path_buf()).file_name(display_name.to_string());
    bot.send_document(msg.chat.id, document)
        .caption(UPLOAD_CAPTION)
        .await?;

    Ok(())
}

/// Fire-and-forget upload notice to the configured log channel.
async fn notify_log_channel(bot: &Bot, settings: &Settings, display_name: &str, msg: &Message) {
    let Some(recipient) = settings.log_channel_recipient() else {
        return;
    };
    let uploader = msg
        .from
        .as_ref()
        .map_or_else(|| "unknown user".to_string(), |user| user.full_name());

    let notice = format!("📤 File uploaded: {display_name} by {uploader}");
    if let Err(e) = bot.send_message(recipient, notice).await {
        warn!(error = %e, "Failed to deliver log channel notification");
    }
}

/// Best-effort removal of the temporary file; runs on every exit path.
async fn remove_temp_file(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Failed to remove temporary file");
        }
    }
}
