//! Broadcast pipeline contract
//!
//! The audio decode/encode/broadcast engine is an external collaborator. The
//! station layer only needs a narrow interface: construct one pipeline per
//! station, point it at a source file, drive its coarse state, and consume
//! its asynchronous end-of-track and error notifications.

use crate::config::IcecastConfig;
use crate::error::Result;
use std::path::Path;
use tokio::sync::mpsc;

#[cfg(feature = "gst")]
pub mod gst;
pub mod null;

/// Coarse pipeline states the station layer drives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Ready,
    Playing,
    Paused,
    /// Fully torn down; a new pipeline is required afterwards
    Null,
}

/// Asynchronous notifications emitted by a running pipeline
#[derive(Debug, Clone)]
pub enum PipelineEvent {
    /// The current source played to completion
    EndOfTrack,
    /// The current source failed to decode or stream
    Error(String),
}

/// Everything needed to construct one station's broadcast pipeline
#[derive(Debug, Clone)]
pub struct BroadcastSpec {
    /// Stream name announced to listeners
    pub station_name: String,
    /// Mount path on the broadcast server
    pub mount: String,
    pub icecast: IcecastConfig,
}

/// A constructed pipeline plus its notification stream.
///
/// Events arrive in emission order and are consumed by exactly one reader,
/// the owning station's worker.
pub struct PipelineHandle {
    pub pipeline: Box<dyn Pipeline>,
    pub events: mpsc::Receiver<PipelineEvent>,
}

/// One station's audio pipeline instance
pub trait Pipeline: Send {
    /// Point the pipeline at a new source file
    fn set_source(&mut self, path: &Path) -> Result<()>;

    /// Drive the pipeline to a coarse state
    fn set_state(&mut self, state: PipelineState) -> Result<()>;
}

/// Constructs pipelines for stations as they are registered
pub trait PipelineFactory: Send + Sync {
    fn create(&self, spec: &BroadcastSpec) -> Result<PipelineHandle>;
}
