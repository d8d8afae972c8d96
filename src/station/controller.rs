//! Per-station playback control
//!
//! Each station runs a dedicated worker task that owns the playlist, the
//! cursor, and the broadcast pipeline. Every transition, whether an operator
//! command or a pipeline notification, is serialized onto that task, so no
//! two transitions for the same station ever run concurrently. The
//! `StationController` handed out to callers is a cheap cloneable handle
//! over the worker's command channel.

use crate::error::{Error, Result};
use crate::pipeline::{Pipeline, PipelineEvent, PipelineHandle, PipelineState};
use crate::playlist::Playlist;
use std::fmt;
use std::path::{Path, PathBuf};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

/// Station runtime state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StationState {
    /// No track has been loaded yet
    Idle,
    Playing,
    Paused,
    /// Pipeline torn down; terminal
    Stopped,
}

impl fmt::Display for StationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StationState::Idle => write!(f, "idle"),
            StationState::Playing => write!(f, "playing"),
            StationState::Paused => write!(f, "paused"),
            StationState::Stopped => write!(f, "stopped"),
        }
    }
}

/// Snapshot of a station's playback position
#[derive(Debug, Clone)]
pub struct StationStatus {
    pub state: StationState,
    pub track_index: Option<usize>,
    pub current_track: Option<PathBuf>,
    pub playlist_len: usize,
}

enum Command {
    Start(oneshot::Sender<Result<StationStatus>>),
    Skip(oneshot::Sender<Result<StationStatus>>),
    Pause(oneshot::Sender<Result<StationStatus>>),
    Resume(oneshot::Sender<Result<StationStatus>>),
    Rescan(oneshot::Sender<Result<usize>>),
    Status(oneshot::Sender<StationStatus>),
    Stop(oneshot::Sender<()>),
}

/// Cloneable handle to one station's worker task.
///
/// Safe to use from any task; every method hands off to the owning worker
/// and waits for its reply. After `stop()` (or registry removal) all methods
/// fail with `StationStopped`.
#[derive(Clone, Debug)]
pub struct StationController {
    id: String,
    name: String,
    mount: String,
    music_dir: PathBuf,
    commands: mpsc::Sender<Command>,
}

impl StationController {
    /// Spawn the worker task for a station.
    ///
    /// The initial playlist scan happens here; a missing or unreadable
    /// directory leaves the station Idle with an empty playlist rather than
    /// failing registration.
    pub fn spawn(
        id: &str,
        name: &str,
        mount: &str,
        music_dir: PathBuf,
        pipeline: PipelineHandle,
    ) -> Self {
        let playlist = match Playlist::load(&music_dir) {
            Ok(playlist) => playlist,
            Err(e) => {
                warn!(station = %id, "Playlist scan failed, starting empty: {}", e);
                Playlist::default()
            }
        };
        info!(
            station = %id,
            "Loaded {} tracks from {}",
            playlist.len(),
            music_dir.display()
        );

        let (tx, rx) = mpsc::channel(16);
        let worker = StationWorker {
            id: id.to_string(),
            music_dir: music_dir.clone(),
            pipeline: pipeline.pipeline,
            playlist,
            cursor: None,
            state: StationState::Idle,
        };
        tokio::spawn(worker.run(rx, pipeline.events));

        Self {
            id: id.to_string(),
            name: name.to_string(),
            mount: mount.to_string(),
            music_dir,
            commands: tx,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mount(&self) -> &str {
        &self.mount
    }

    pub fn music_dir(&self) -> &Path {
        &self.music_dir
    }

    /// Begin playback on the first track. No-op when already playing.
    pub async fn start(&self) -> Result<StationStatus> {
        self.request(Command::Start).await?
    }

    /// Advance to the next track (cyclic)
    pub async fn skip(&self) -> Result<StationStatus> {
        self.request(Command::Skip).await?
    }

    pub async fn pause(&self) -> Result<StationStatus> {
        self.request(Command::Pause).await?
    }

    pub async fn resume(&self) -> Result<StationStatus> {
        self.request(Command::Resume).await?
    }

    /// Re-read the playlist directory; returns the new track count.
    /// Does not touch the cursor or playback state.
    pub async fn rescan(&self) -> Result<usize> {
        self.request(Command::Rescan).await?
    }

    pub async fn status(&self) -> Result<StationStatus> {
        self.request(Command::Status).await
    }

    /// Tear down the pipeline and end the worker. Terminal: every later
    /// command fails with `StationStopped`.
    pub async fn stop(&self) -> Result<()> {
        self.request(Command::Stop).await
    }

    async fn request<T>(&self, make: impl FnOnce(oneshot::Sender<T>) -> Command) -> Result<T> {
        let (tx, rx) = oneshot::channel();
        self.commands
            .send(make(tx))
            .await
            .map_err(|_| Error::StationStopped(self.id.clone()))?;
        rx.await.map_err(|_| Error::StationStopped(self.id.clone()))
    }
}

struct StationWorker {
    id: String,
    music_dir: PathBuf,
    pipeline: Box<dyn Pipeline>,
    playlist: Playlist,
    cursor: Option<usize>,
    state: StationState,
}

impl StationWorker {
    async fn run(
        mut self,
        mut commands: mpsc::Receiver<Command>,
        mut events: mpsc::Receiver<PipelineEvent>,
    ) {
        let mut events_open = true;
        loop {
            tokio::select! {
                biased;

                event = events.recv(), if events_open => match event {
                    Some(event) => self.handle_event(event),
                    None => events_open = false,
                },
                command = commands.recv() => match command {
                    Some(command) => {
                        if self.handle_command(command) {
                            break;
                        }
                    }
                    None => break,
                },
            }
        }
        debug!(station = %self.id, "Station worker exiting");
    }

    /// Returns true once the station is stopped and the worker should exit
    fn handle_command(&mut self, command: Command) -> bool {
        match command {
            Command::Start(reply) => {
                let _ = reply.send(self.start());
            }
            Command::Skip(reply) => {
                let _ = reply.send(self.skip());
            }
            Command::Pause(reply) => {
                let _ = reply.send(self.pause());
            }
            Command::Resume(reply) => {
                let _ = reply.send(self.resume());
            }
            Command::Rescan(reply) => {
                let _ = reply.send(self.rescan());
            }
            Command::Status(reply) => {
                let _ = reply.send(self.status());
            }
            Command::Stop(reply) => {
                self.stop();
                let _ = reply.send(());
                return true;
            }
        }
        false
    }

    fn handle_event(&mut self, event: PipelineEvent) {
        match event {
            PipelineEvent::EndOfTrack => {
                debug!(station = %self.id, "End of track");
                if let Err(e) = self.advance() {
                    warn!(station = %self.id, "Could not advance: {}", e);
                }
            }
            PipelineEvent::Error(detail) => {
                let track = self
                    .current_track()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "<no track>".to_string());
                warn!(
                    station = %self.id,
                    "Pipeline error on {}: {}; skipping to next track", track, detail
                );
                if let Err(e) = self.advance() {
                    warn!(station = %self.id, "Could not advance: {}", e);
                }
            }
        }
    }

    fn start(&mut self) -> Result<StationStatus> {
        match self.state {
            StationState::Playing | StationState::Paused => Ok(self.status()),
            StationState::Idle => {
                self.advance()?;
                Ok(self.status())
            }
            StationState::Stopped => Err(Error::StationStopped(self.id.clone())),
        }
    }

    fn skip(&mut self) -> Result<StationStatus> {
        match self.state {
            StationState::Stopped => Err(Error::StationStopped(self.id.clone())),
            _ => {
                self.advance()?;
                Ok(self.status())
            }
        }
    }

    fn pause(&mut self) -> Result<StationStatus> {
        if self.state == StationState::Playing {
            self.pipeline.set_state(PipelineState::Paused)?;
            self.state = StationState::Paused;
            info!(station = %self.id, "Paused");
        }
        Ok(self.status())
    }

    fn resume(&mut self) -> Result<StationStatus> {
        if self.state == StationState::Paused {
            self.pipeline.set_state(PipelineState::Playing)?;
            self.state = StationState::Playing;
            info!(station = %self.id, "Resumed");
        }
        Ok(self.status())
    }

    /// Move the cursor to the next track (wrapping at the playlist end) and
    /// restart the pipeline on it. Converging point for start, skip,
    /// end-of-track and error recovery.
    fn advance(&mut self) -> Result<()> {
        if self.playlist.is_empty() {
            self.state = StationState::Idle;
            warn!(station = %self.id, "Nothing to play");
            return Err(Error::EmptyPlaylist(self.id.clone()));
        }

        let next = match self.cursor {
            Some(index) => (index + 1) % self.playlist.len(),
            None => 0,
        };
        let track = self
            .playlist
            .get(next)
            .ok_or_else(|| Error::EmptyPlaylist(self.id.clone()))?
            .to_path_buf();

        self.pipeline.set_state(PipelineState::Ready)?;
        self.pipeline.set_source(&track)?;
        self.pipeline.set_state(PipelineState::Playing)?;

        self.cursor = Some(next);
        self.state = StationState::Playing;
        info!(station = %self.id, "Now playing [{}] {}", next, track.display());
        Ok(())
    }

    fn rescan(&mut self) -> Result<usize> {
        match Playlist::load(&self.music_dir) {
            Ok(playlist) => {
                info!(
                    station = %self.id,
                    "Rescanned {}: {} tracks",
                    self.music_dir.display(),
                    playlist.len()
                );
                self.playlist = playlist;
                Ok(self.playlist.len())
            }
            Err(e) => {
                warn!(station = %self.id, "Rescan failed: {}", e);
                self.playlist = Playlist::default();
                Err(e)
            }
        }
    }

    fn stop(&mut self) {
        if let Err(e) = self.pipeline.set_state(PipelineState::Null) {
            warn!(station = %self.id, "Error tearing down pipeline: {}", e);
        }
        self.state = StationState::Stopped;
        info!(station = %self.id, "Stopped");
    }

    fn status(&self) -> StationStatus {
        StationStatus {
            state: self.state,
            track_index: self.cursor,
            current_track: self.current_track().map(Path::to_path_buf),
            playlist_len: self.playlist.len(),
        }
    }

    fn current_track(&self) -> Option<&Path> {
        self.cursor.and_then(|index| self.playlist.get(index))
    }
}
