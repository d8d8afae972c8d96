//! Test helper modules for aircast integration tests
//!
//! Provides reusable test infrastructure:
//! - FakePipelineFactory: in-memory pipelines that record every command and
//!   let tests inject end-of-track / error notifications
//! - Playlist directory and station config fixtures

#![allow(dead_code)]

use aircast::config::{IcecastConfig, StationConfig, UserId};
use aircast::pipeline::{
    BroadcastSpec, Pipeline, PipelineEvent, PipelineFactory, PipelineHandle, PipelineState,
};
use aircast::station::StationController;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

/// One recorded pipeline command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineCall {
    SetSource(PathBuf),
    SetState(PipelineState),
}

/// Observation point for one station's fake pipeline
#[derive(Clone)]
pub struct StationProbe {
    calls: Arc<Mutex<Vec<PipelineCall>>>,
    events: mpsc::Sender<PipelineEvent>,
}

impl StationProbe {
    pub fn calls(&self) -> Vec<PipelineCall> {
        self.calls.lock().unwrap().clone()
    }

    pub async fn send_end_of_track(&self) {
        self.events.send(PipelineEvent::EndOfTrack).await.unwrap();
    }

    pub async fn send_error(&self, detail: &str) {
        self.events
            .send(PipelineEvent::Error(detail.to_string()))
            .await
            .unwrap();
    }
}

/// Pipeline factory whose pipelines record commands and let tests inject
/// notifications. Probes are keyed by station name.
#[derive(Default)]
pub struct FakePipelineFactory {
    probes: Mutex<HashMap<String, StationProbe>>,
    fail_for: Mutex<HashSet<String>>,
}

impl FakePipelineFactory {
    /// Make construction fail for the given station name
    pub fn fail_for(&self, name: &str) {
        self.fail_for.lock().unwrap().insert(name.to_string());
    }

    pub fn probe(&self, name: &str) -> StationProbe {
        self.probes
            .lock()
            .unwrap()
            .get(name)
            .expect("no pipeline built for station")
            .clone()
    }
}

impl PipelineFactory for FakePipelineFactory {
    fn create(&self, spec: &BroadcastSpec) -> aircast::Result<PipelineHandle> {
        if self.fail_for.lock().unwrap().contains(&spec.station_name) {
            return Err(aircast::Error::Pipeline(format!(
                "no encoder available for {}",
                spec.station_name
            )));
        }
        let (tx, rx) = mpsc::channel(16);
        let calls = Arc::new(Mutex::new(Vec::new()));
        self.probes.lock().unwrap().insert(
            spec.station_name.clone(),
            StationProbe {
                calls: Arc::clone(&calls),
                events: tx,
            },
        );
        Ok(PipelineHandle {
            pipeline: Box::new(FakePipeline { calls }),
            events: rx,
        })
    }
}

struct FakePipeline {
    calls: Arc<Mutex<Vec<PipelineCall>>>,
}

impl Pipeline for FakePipeline {
    fn set_source(&mut self, path: &Path) -> aircast::Result<()> {
        self.calls
            .lock()
            .unwrap()
            .push(PipelineCall::SetSource(path.to_path_buf()));
        Ok(())
    }

    fn set_state(&mut self, state: PipelineState) -> aircast::Result<()> {
        self.calls.lock().unwrap().push(PipelineCall::SetState(state));
        Ok(())
    }
}

pub fn icecast() -> IcecastConfig {
    IcecastConfig {
        server: "localhost".to_string(),
        port: 8000,
        username: "source".to_string(),
        password: "hackme".to_string(),
    }
}

pub fn station_config(dir: &Path, name: &str, admins: &[UserId]) -> StationConfig {
    StationConfig {
        name: name.to_string(),
        mount: format!("/{}", name),
        playlist: dir.to_path_buf(),
        admins: admins.to_vec(),
    }
}

/// Create empty files with the given names in a playlist directory
pub fn add_tracks(dir: &Path, names: &[&str]) {
    for name in names {
        fs::write(dir.join(name), b"").unwrap();
    }
}

/// Spawn a standalone station worker backed by a fake pipeline
pub fn spawn_station(
    factory: &FakePipelineFactory,
    id: &str,
    dir: &Path,
) -> StationController {
    let spec = BroadcastSpec {
        station_name: id.to_string(),
        mount: format!("/{}", id),
        icecast: icecast(),
    };
    let handle = factory.create(&spec).unwrap();
    StationController::spawn(id, id, &spec.mount, dir.to_path_buf(), handle)
}

pub fn file_name(track: &Option<PathBuf>) -> String {
    track
        .as_ref()
        .and_then(|p| p.file_name())
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}
