//! Command routing and authorization
//!
//! Resolves the caller's currently selected station, enforces admin
//! authorization at the top of every mutating handler, and turns registry
//! and controller results into the plain text replies the chat surface
//! sends back. "No station selected", "not authorized" and "no such
//! station" are distinct, stable replies.

use crate::bot::BotCommand;
use crate::config::UserId;
use crate::error::Error;
use crate::station::{StationController, StationRegistry};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::warn;

const NO_STATION_SELECTED: &str = "No station selected. Use /select <station> first.";
const NOT_AUTHORIZED: &str = "You are not an admin of this station.";
const NO_SUCH_STATION: &str = "No such station.";

const HELP: &str = "Commands:\n\
    /list - list stations\n\
    /select <station> - choose the station to operate on\n\
    /play - start playback\n\
    /skip - skip the current track\n\
    /pause, /resume - pause or resume playback\n\
    /rescan - re-read the playlist directory\n\
    /grant <user-id> - grant station admin rights (global admins only)\n\
    Send an audio file to add it to the selected station's playlist.";

struct Session {
    station_id: String,
    last_used: Instant,
}

/// Routes operator commands to the registry under authorization
pub struct CommandRouter {
    registry: Arc<StationRegistry>,
    sessions: RwLock<HashMap<UserId, Session>>,
    expiry: Option<Duration>,
}

impl CommandRouter {
    /// `expiry` is how long a caller's station selection survives without
    /// use; `None` keeps selections forever.
    pub fn new(registry: Arc<StationRegistry>, expiry: Option<Duration>) -> Self {
        Self {
            registry,
            sessions: RwLock::new(HashMap::new()),
            expiry,
        }
    }

    /// Apply one command on behalf of a caller and produce the reply text
    pub async fn handle(&self, user: UserId, command: BotCommand) -> String {
        match command {
            BotCommand::List => self.list().await,
            BotCommand::Select(None) => "Supply a station id: /select <station>".to_string(),
            BotCommand::Select(Some(id)) => self.select(user, id).await,
            BotCommand::Play => match self.authorized_station(user).await {
                Ok(controller) => match controller.start().await {
                    Ok(status) => format!("Playing: {}", describe_track(&status.current_track)),
                    Err(e) => reply_error(e),
                },
                Err(reply) => reply,
            },
            BotCommand::Skip => match self.authorized_station(user).await {
                Ok(controller) => match controller.skip().await {
                    Ok(status) => format!("Skipped to {}", describe_track(&status.current_track)),
                    Err(e) => reply_error(e),
                },
                Err(reply) => reply,
            },
            BotCommand::Pause => match self.authorized_station(user).await {
                Ok(controller) => match controller.pause().await {
                    Ok(status) => format!("Station is now {}", status.state),
                    Err(e) => reply_error(e),
                },
                Err(reply) => reply,
            },
            BotCommand::Resume => match self.authorized_station(user).await {
                Ok(controller) => match controller.resume().await {
                    Ok(status) => format!("Station is now {}", status.state),
                    Err(e) => reply_error(e),
                },
                Err(reply) => reply,
            },
            BotCommand::Rescan => match self.authorized_station(user).await {
                Ok(controller) => match controller.rescan().await {
                    Ok(count) => format!("Playlist reloaded: {} tracks.", count),
                    Err(e) => reply_error(e),
                },
                Err(reply) => reply,
            },
            BotCommand::Grant(None) => "Supply a numeric user id: /grant <user-id>".to_string(),
            BotCommand::Grant(Some(target)) => self.grant(user, target).await,
            BotCommand::Upload { file_name, data } => self.upload(user, &file_name, data).await,
            BotCommand::Help => HELP.to_string(),
        }
    }

    async fn list(&self) -> String {
        let stations = self.registry.list_stations().await;
        if stations.is_empty() {
            return "No stations available.".to_string();
        }
        stations
            .iter()
            .map(|s| format!("{} - {}", s.id, s.name))
            .collect::<Vec<_>>()
            .join("\n")
    }

    async fn select(&self, user: UserId, id: String) -> String {
        if !self.registry.station_exists(&id).await {
            return NO_SUCH_STATION.to_string();
        }
        self.sessions.write().await.insert(
            user,
            Session {
                station_id: id.clone(),
                last_used: Instant::now(),
            },
        );
        format!("Current station set to {}.", id)
    }

    async fn grant(&self, user: UserId, target: UserId) -> String {
        if !self.registry.is_global_admin(user) {
            return "Only global admins can grant station admin rights.".to_string();
        }
        let id = match self.selected_station(user).await {
            Some(id) => id,
            None => return NO_STATION_SELECTED.to_string(),
        };
        match self.registry.grant_admin(&id, target).await {
            Ok(()) => format!("Granted admin rights for {} to {}.", id, target),
            Err(_) => NO_SUCH_STATION.to_string(),
        }
    }

    async fn upload(&self, user: UserId, file_name: &str, data: Vec<u8>) -> String {
        let controller = match self.authorized_station(user).await {
            Ok(controller) => controller,
            Err(reply) => return reply,
        };

        // Keep only the final path component of whatever name the uploader
        // suggested.
        let safe_name = Path::new(file_name)
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "upload.mp3".to_string());
        let target = controller.music_dir().join(&safe_name);

        match tokio::fs::write(&target, &data).await {
            Ok(()) => format!("Audio saved as {}. Run /rescan to pick it up.", safe_name),
            Err(e) => {
                warn!("Failed to save upload to {}: {}", target.display(), e);
                "Could not save the audio file.".to_string()
            }
        }
    }

    /// The caller's selected station id, if one is set and unexpired.
    /// Touches the session's last-used time.
    async fn selected_station(&self, user: UserId) -> Option<String> {
        let mut sessions = self.sessions.write().await;
        let session = sessions.get_mut(&user)?;
        if let Some(expiry) = self.expiry {
            if session.last_used.elapsed() > expiry {
                sessions.remove(&user);
                return None;
            }
        }
        session.last_used = Instant::now();
        Some(session.station_id.clone())
    }

    /// Resolve the caller's selected station and check authorization for
    /// it. `Err` carries the reply to send back.
    async fn authorized_station(
        &self,
        user: UserId,
    ) -> std::result::Result<StationController, String> {
        let id = match self.selected_station(user).await {
            Some(id) => id,
            None => return Err(NO_STATION_SELECTED.to_string()),
        };
        if !self.registry.is_authorized(&id, user).await {
            return Err(NOT_AUTHORIZED.to_string());
        }
        match self.registry.get_station(&id).await {
            Some(controller) => Ok(controller),
            None => Err(NO_SUCH_STATION.to_string()),
        }
    }
}

fn describe_track(track: &Option<std::path::PathBuf>) -> String {
    track
        .as_ref()
        .and_then(|p| p.file_name())
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "<no track>".to_string())
}

fn reply_error(error: Error) -> String {
    match error {
        Error::EmptyPlaylist(_) => {
            "Playlist is empty. Upload a track and run /rescan first.".to_string()
        }
        Error::StationStopped(_) => "This station has been stopped.".to_string(),
        Error::DirectoryNotFound(_) => "The playlist directory is missing.".to_string(),
        other => format!("Error: {}", other),
    }
}
