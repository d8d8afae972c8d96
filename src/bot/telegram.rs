//! Minimal Telegram Bot API transport
//!
//! Long-polls `getUpdates` and relays parsed commands to the
//! [`CommandRouter`], sending its reply text back to the originating chat.
//! Only the small slice of the Bot API the relay needs is modeled here.

use crate::bot::{parse_command, BotCommand, CommandRouter};
use crate::config::TelegramConfig;
use crate::error::{Error, Result};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

const TELEGRAM_API_BASE: &str = "https://api.telegram.org";

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    description: Option<String>,
    result: Option<T>,
}

#[derive(Debug, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
}

#[derive(Debug, Deserialize)]
pub struct Message {
    pub from: Option<User>,
    pub chat: Chat,
    pub text: Option<String>,
    pub audio: Option<Audio>,
}

#[derive(Debug, Deserialize)]
pub struct User {
    pub id: i64,
}

#[derive(Debug, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Deserialize)]
pub struct Audio {
    pub file_id: String,
    pub file_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FileInfo {
    file_path: Option<String>,
}

/// Thin Telegram Bot API client
pub struct BotClient {
    http: reqwest::Client,
    base: String,
    file_base: String,
}

impl BotClient {
    pub fn new(token: &str) -> Result<Self> {
        // The request timeout must outlast the long-poll window
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(90))
            .build()
            .map_err(|e| Error::Telegram(e.to_string()))?;
        Ok(Self {
            http,
            base: format!("{}/bot{}", TELEGRAM_API_BASE, token),
            file_base: format!("{}/file/bot{}", TELEGRAM_API_BASE, token),
        })
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, params: &serde_json::Value) -> Result<T> {
        let response = self
            .http
            .post(format!("{}/{}", self.base, method))
            .json(params)
            .send()
            .await
            .map_err(|e| Error::Telegram(e.to_string()))?;
        let body: ApiResponse<T> = response
            .json()
            .await
            .map_err(|e| Error::Telegram(e.to_string()))?;
        if !body.ok {
            return Err(Error::Telegram(
                body.description
                    .unwrap_or_else(|| format!("{} failed", method)),
            ));
        }
        body.result
            .ok_or_else(|| Error::Telegram(format!("{} returned no result", method)))
    }

    pub async fn get_updates(&self, offset: i64, timeout_secs: u64) -> Result<Vec<Update>> {
        self.call(
            "getUpdates",
            &json!({
                "offset": offset,
                "timeout": timeout_secs,
                "allowed_updates": ["message"],
            }),
        )
        .await
    }

    pub async fn send_message(&self, chat_id: i64, text: &str) -> Result<()> {
        let _: serde_json::Value = self
            .call("sendMessage", &json!({ "chat_id": chat_id, "text": text }))
            .await?;
        Ok(())
    }

    /// Resolve a file id and download its content
    pub async fn download_file(&self, file_id: &str) -> Result<Vec<u8>> {
        let info: FileInfo = self.call("getFile", &json!({ "file_id": file_id })).await?;
        let path = info
            .file_path
            .ok_or_else(|| Error::Telegram("getFile returned no file_path".to_string()))?;
        let response = self
            .http
            .get(format!("{}/{}", self.file_base, path))
            .send()
            .await
            .map_err(|e| Error::Telegram(e.to_string()))?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| Error::Telegram(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}

/// Long-poll loop relaying chat commands to the router.
///
/// Runs until the process exits; transport errors are logged and retried
/// after a short delay so a flaky network never takes the relay down.
pub async fn run(client: BotClient, router: Arc<CommandRouter>, config: TelegramConfig) {
    let mut offset = 0i64;
    loop {
        let updates = match client.get_updates(offset, config.poll_timeout_secs).await {
            Ok(updates) => updates,
            Err(e) => {
                warn!("Telegram poll failed: {}; retrying in 5s", e);
                tokio::time::sleep(Duration::from_secs(5)).await;
                continue;
            }
        };

        for update in updates {
            offset = offset.max(update.update_id + 1);
            let Some(message) = update.message else { continue };
            let Some(user) = message.from.as_ref().map(|u| u.id) else {
                continue;
            };
            let chat_id = message.chat.id;

            let command = if let Some(audio) = &message.audio {
                let file_name = audio
                    .file_name
                    .clone()
                    .unwrap_or_else(|| format!("{}.mp3", audio.file_id));
                match client.download_file(&audio.file_id).await {
                    Ok(data) => Some(BotCommand::Upload { file_name, data }),
                    Err(e) => {
                        warn!("Failed to download audio from chat {}: {}", chat_id, e);
                        let _ = client
                            .send_message(chat_id, "Could not download that audio file.")
                            .await;
                        None
                    }
                }
            } else {
                message.text.as_deref().and_then(parse_command)
            };
            let Some(command) = command else { continue };

            debug!("Command from {}: {}", user, command_name(&command));
            let reply = router.handle(user, command).await;
            if let Err(e) = client.send_message(chat_id, &reply).await {
                warn!("Failed to reply in chat {}: {}", chat_id, e);
            }
        }
    }
}

fn command_name(command: &BotCommand) -> &'static str {
    match command {
        BotCommand::List => "list",
        BotCommand::Select(_) => "select",
        BotCommand::Play => "play",
        BotCommand::Skip => "skip",
        BotCommand::Pause => "pause",
        BotCommand::Resume => "resume",
        BotCommand::Rescan => "rescan",
        BotCommand::Grant(_) => "grant",
        BotCommand::Upload { .. } => "upload",
        BotCommand::Help => "help",
    }
}
