//! Remote chat control surface
//!
//! Transport-agnostic command model plus the router that applies commands to
//! the station registry. The Telegram transport in [`telegram`] is the only
//! wire format today; anything that can produce a `BotCommand` and relay a
//! text reply works.

pub mod router;
pub mod telegram;

pub use router::CommandRouter;
pub use telegram::BotClient;

use crate::config::UserId;

/// A parsed operator command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BotCommand {
    /// List registered stations (no authorization required)
    List,
    /// Select the station later commands act on; `None` when the argument
    /// was missing
    Select(Option<String>),
    /// Begin playback on the selected station
    Play,
    /// Advance the selected station to its next track
    Skip,
    Pause,
    Resume,
    /// Re-read the selected station's playlist directory
    Rescan,
    /// Grant station-level admin rights (global admins only)
    Grant(Option<UserId>),
    /// Save an uploaded audio file into the selected station's playlist
    /// directory
    Upload { file_name: String, data: Vec<u8> },
    Help,
}

/// Parse a chat message into a command.
///
/// Returns `None` for plain text that is not a command. Telegram appends
/// `@BotName` to commands in group chats; the suffix is stripped. `/next`
/// is accepted as an alias for `/skip`.
pub fn parse_command(text: &str) -> Option<BotCommand> {
    let mut parts = text.split_whitespace();
    let head = parts.next()?;
    let name = head.strip_prefix('/')?;
    let name = name.split('@').next().unwrap_or(name);

    let command = match name {
        "list" => BotCommand::List,
        "select" => BotCommand::Select(parts.next().map(str::to_string)),
        "play" => BotCommand::Play,
        "skip" | "next" => BotCommand::Skip,
        "pause" => BotCommand::Pause,
        "resume" => BotCommand::Resume,
        "rescan" => BotCommand::Rescan,
        "grant" => BotCommand::Grant(parts.next().and_then(|arg| arg.parse().ok())),
        _ => BotCommand::Help,
    };
    Some(command)
}
