//! Station registry and admin authorization
//!
//! Owns every `StationController` plus the global and per-station admin
//! lists. The registry is constructed explicitly at startup and shared by
//! `Arc` with whatever needs it; the map lock is held only for short
//! lookups and inserts, never across a station's playback transition.

use crate::config::{IcecastConfig, StationConfig, UserId};
use crate::error::{Error, Result};
use crate::pipeline::{BroadcastSpec, PipelineFactory};
use crate::station::controller::StationController;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{error, info, warn};

/// Read-only station summary for listings
#[derive(Debug, Clone, serde::Serialize)]
pub struct StationSummary {
    pub id: String,
    pub name: String,
    pub mount: String,
}

struct StationEntry {
    controller: StationController,
    admins: HashSet<UserId>,
}

/// Registry of all stations plus the admin sets
pub struct StationRegistry {
    icecast: IcecastConfig,
    global_admins: HashSet<UserId>,
    factory: Arc<dyn PipelineFactory>,
    stations: RwLock<HashMap<String, StationEntry>>,
}

impl StationRegistry {
    pub fn new(
        icecast: IcecastConfig,
        global_admins: impl IntoIterator<Item = UserId>,
        factory: Arc<dyn PipelineFactory>,
    ) -> Self {
        Self {
            icecast,
            global_admins: global_admins.into_iter().collect(),
            factory,
            stations: RwLock::new(HashMap::new()),
        }
    }

    /// Register a station and spawn its worker. Does not start playback.
    ///
    /// Creates the playlist directory when absent. A pipeline construction
    /// failure is fatal for this station only and leaves the registry
    /// unchanged.
    pub async fn add_station(&self, id: &str, config: &StationConfig) -> Result<StationController> {
        if self.stations.read().await.contains_key(id) {
            return Err(Error::DuplicateStation(id.to_string()));
        }

        std::fs::create_dir_all(&config.playlist)?;

        let spec = BroadcastSpec {
            station_name: config.name.clone(),
            mount: config.mount.clone(),
            icecast: self.icecast.clone(),
        };
        let handle = self.factory.create(&spec)?;
        let controller = StationController::spawn(
            id,
            &config.name,
            &config.mount,
            config.playlist.clone(),
            handle,
        );

        let mut stations = self.stations.write().await;
        if stations.contains_key(id) {
            drop(stations);
            let _ = controller.stop().await;
            return Err(Error::DuplicateStation(id.to_string()));
        }
        stations.insert(
            id.to_string(),
            StationEntry {
                controller: controller.clone(),
                admins: config.admins.iter().copied().collect(),
            },
        );
        info!(station = %id, "Registered station '{}' on {}", config.name, config.mount);
        Ok(controller)
    }

    /// Stop and remove a station. Returns false when the id is unknown.
    ///
    /// The controller is stopped before the entry disappears, so a removed
    /// station never keeps broadcasting.
    pub async fn remove_station(&self, id: &str) -> bool {
        let controller = match self.get_station(id).await {
            Some(controller) => controller,
            None => return false,
        };
        if let Err(e) = controller.stop().await {
            warn!(station = %id, "Stopping station for removal: {}", e);
        }
        let removed = self.stations.write().await.remove(id).is_some();
        if removed {
            info!(station = %id, "Removed station");
        }
        removed
    }

    pub async fn get_station(&self, id: &str) -> Option<StationController> {
        self.stations
            .read()
            .await
            .get(id)
            .map(|entry| entry.controller.clone())
    }

    pub async fn station_exists(&self, id: &str) -> bool {
        self.stations.read().await.contains_key(id)
    }

    /// Station summaries sorted by id
    pub async fn list_stations(&self) -> Vec<StationSummary> {
        let stations = self.stations.read().await;
        let mut summaries: Vec<StationSummary> = stations
            .iter()
            .map(|(id, entry)| StationSummary {
                id: id.clone(),
                name: entry.controller.name().to_string(),
                mount: entry.controller.mount().to_string(),
            })
            .collect();
        summaries.sort_by(|a, b| a.id.cmp(&b.id));
        summaries
    }

    pub fn is_global_admin(&self, user: UserId) -> bool {
        self.global_admins.contains(&user)
    }

    /// True iff the user is a global admin or an admin of this station.
    /// Unknown station ids are unauthorized, not an error.
    pub async fn is_authorized(&self, id: &str, user: UserId) -> bool {
        if self.global_admins.contains(&user) {
            return true;
        }
        self.stations
            .read()
            .await
            .get(id)
            .map(|entry| entry.admins.contains(&user))
            .unwrap_or(false)
    }

    /// Add a station-level admin at runtime
    pub async fn grant_admin(&self, id: &str, user: UserId) -> Result<()> {
        let mut stations = self.stations.write().await;
        match stations.get_mut(id) {
            Some(entry) => {
                entry.admins.insert(user);
                info!(station = %id, "Granted admin rights to {}", user);
                Ok(())
            }
            None => Err(Error::StationNotFound(id.to_string())),
        }
    }

    /// Start every registered station, isolating per-station failures.
    /// Returns the stations that failed to start, with their errors.
    pub async fn start_all(&self) -> Vec<(String, Error)> {
        let controllers: Vec<(String, StationController)> = {
            let stations = self.stations.read().await;
            let mut controllers: Vec<_> = stations
                .iter()
                .map(|(id, entry)| (id.clone(), entry.controller.clone()))
                .collect();
            controllers.sort_by(|a, b| a.0.cmp(&b.0));
            controllers
        };

        let mut failures = Vec::new();
        for (id, controller) in controllers {
            match controller.start().await {
                Ok(status) => {
                    info!(station = %id, "Started ({} tracks)", status.playlist_len);
                }
                Err(e) => {
                    warn!(station = %id, "Failed to start: {}", e);
                    failures.push((id, e));
                }
            }
        }
        failures
    }

    /// Register every configured station. A failure on one station is
    /// logged and skipped, not fatal to the others.
    pub async fn initialize_from_config(&self, stations: &HashMap<String, StationConfig>) {
        let mut ids: Vec<&String> = stations.keys().collect();
        ids.sort();
        for id in ids {
            if let Err(e) = self.add_station(id, &stations[id]).await {
                error!(station = %id, "Failed to initialize station: {}", e);
            }
        }
    }
}
