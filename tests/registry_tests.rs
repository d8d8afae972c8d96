//! Station registry lifecycle and authorization tests

mod helpers;

use aircast::error::Error;
use aircast::station::{StationRegistry, StationState};
use helpers::{add_tracks, icecast, station_config, FakePipelineFactory};
use std::collections::HashMap;
use std::sync::Arc;
use tempfile::TempDir;

fn registry(factory: Arc<FakePipelineFactory>, global_admins: &[i64]) -> StationRegistry {
    StationRegistry::new(icecast(), global_admins.iter().copied(), factory)
}

#[tokio::test]
async fn add_get_list() {
    let factory = Arc::new(FakePipelineFactory::default());
    let registry = registry(Arc::clone(&factory), &[]);
    let dir = TempDir::new().unwrap();

    registry
        .add_station("jazz", &station_config(dir.path(), "jazz", &[]))
        .await
        .unwrap();

    assert!(registry.station_exists("jazz").await);
    assert!(registry.get_station("jazz").await.is_some());
    assert!(registry.get_station("rock").await.is_none());

    let listed = registry.list_stations().await;
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, "jazz");
    assert_eq!(listed[0].mount, "/jazz");
}

#[tokio::test]
async fn duplicate_station_is_rejected() {
    let factory = Arc::new(FakePipelineFactory::default());
    let registry = registry(Arc::clone(&factory), &[]);
    let dir = TempDir::new().unwrap();
    let config = station_config(dir.path(), "jazz", &[]);

    registry.add_station("jazz", &config).await.unwrap();
    let err = registry.add_station("jazz", &config).await.unwrap_err();
    assert!(matches!(err, Error::DuplicateStation(_)));
}

#[tokio::test]
async fn add_station_creates_missing_playlist_directory() {
    let factory = Arc::new(FakePipelineFactory::default());
    let registry = registry(Arc::clone(&factory), &[]);
    let dir = TempDir::new().unwrap();
    let playlist_dir = dir.path().join("music").join("jazz");

    registry
        .add_station("jazz", &station_config(&playlist_dir, "jazz", &[]))
        .await
        .unwrap();

    assert!(playlist_dir.is_dir());
}

#[tokio::test]
async fn remove_station_stops_it_first() {
    let factory = Arc::new(FakePipelineFactory::default());
    let registry = registry(Arc::clone(&factory), &[]);
    let dir = TempDir::new().unwrap();
    add_tracks(dir.path(), &["a.mp3"]);

    let controller = registry
        .add_station("jazz", &station_config(dir.path(), "jazz", &[]))
        .await
        .unwrap();
    controller.start().await.unwrap();

    assert!(registry.remove_station("jazz").await);
    assert!(registry.get_station("jazz").await.is_none());

    // The removed controller is dead, not just unlisted
    assert!(matches!(
        controller.status().await.unwrap_err(),
        Error::StationStopped(_)
    ));

    assert!(!registry.remove_station("jazz").await);
}

#[tokio::test]
async fn readding_a_removed_station_yields_a_fresh_controller() {
    let factory = Arc::new(FakePipelineFactory::default());
    let registry = registry(Arc::clone(&factory), &[]);
    let dir = TempDir::new().unwrap();
    add_tracks(dir.path(), &["a.mp3"]);
    let config = station_config(dir.path(), "jazz", &[]);

    let first = registry.add_station("jazz", &config).await.unwrap();
    first.start().await.unwrap();
    registry.remove_station("jazz").await;

    let second = registry.add_station("jazz", &config).await.unwrap();
    let status = second.status().await.unwrap();
    assert_eq!(status.state, StationState::Idle);
    assert_eq!(status.track_index, None);
}

#[tokio::test]
async fn global_admins_are_authorized_everywhere() {
    let factory = Arc::new(FakePipelineFactory::default());
    let registry = registry(Arc::clone(&factory), &[100]);
    let dir = TempDir::new().unwrap();

    registry
        .add_station("jazz", &station_config(dir.path(), "jazz", &[]))
        .await
        .unwrap();
    assert!(registry.is_authorized("jazz", 100).await);

    // Including stations registered after the admin list was loaded
    let dir2 = TempDir::new().unwrap();
    registry
        .add_station("rock", &station_config(dir2.path(), "rock", &[]))
        .await
        .unwrap();
    assert!(registry.is_authorized("rock", 100).await);
}

#[tokio::test]
async fn station_admins_are_scoped_to_their_station() {
    let factory = Arc::new(FakePipelineFactory::default());
    let registry = registry(Arc::clone(&factory), &[]);
    let dir_a = TempDir::new().unwrap();
    let dir_b = TempDir::new().unwrap();

    registry
        .add_station("jazz", &station_config(dir_a.path(), "jazz", &[200]))
        .await
        .unwrap();
    registry
        .add_station("rock", &station_config(dir_b.path(), "rock", &[]))
        .await
        .unwrap();

    assert!(registry.is_authorized("jazz", 200).await);
    assert!(!registry.is_authorized("rock", 200).await);
}

#[tokio::test]
async fn unknown_stations_are_unauthorized() {
    let factory = Arc::new(FakePipelineFactory::default());
    let registry = registry(Arc::clone(&factory), &[]);
    assert!(!registry.is_authorized("ghost", 200).await);
}

#[tokio::test]
async fn grant_admin_takes_effect() {
    let factory = Arc::new(FakePipelineFactory::default());
    let registry = registry(Arc::clone(&factory), &[]);
    let dir = TempDir::new().unwrap();

    registry
        .add_station("jazz", &station_config(dir.path(), "jazz", &[]))
        .await
        .unwrap();

    assert!(!registry.is_authorized("jazz", 300).await);
    registry.grant_admin("jazz", 300).await.unwrap();
    assert!(registry.is_authorized("jazz", 300).await);

    assert!(matches!(
        registry.grant_admin("ghost", 300).await.unwrap_err(),
        Error::StationNotFound(_)
    ));
}

#[tokio::test]
async fn start_all_isolates_per_station_failures() {
    let factory = Arc::new(FakePipelineFactory::default());
    let registry = registry(Arc::clone(&factory), &[]);
    let full = TempDir::new().unwrap();
    let empty = TempDir::new().unwrap();
    add_tracks(full.path(), &["a.mp3"]);

    registry
        .add_station("full", &station_config(full.path(), "full", &[]))
        .await
        .unwrap();
    registry
        .add_station("empty", &station_config(empty.path(), "empty", &[]))
        .await
        .unwrap();

    let failures = registry.start_all().await;
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].0, "empty");
    assert!(matches!(failures[0].1, Error::EmptyPlaylist(_)));

    let full_station = registry.get_station("full").await.unwrap();
    assert_eq!(
        full_station.status().await.unwrap().state,
        StationState::Playing
    );
    let empty_station = registry.get_station("empty").await.unwrap();
    assert_eq!(
        empty_station.status().await.unwrap().state,
        StationState::Idle
    );
}

#[tokio::test]
async fn initialize_from_config_skips_broken_stations() {
    let factory = Arc::new(FakePipelineFactory::default());
    factory.fail_for("bad");
    let registry = registry(Arc::clone(&factory), &[]);
    let dir_good = TempDir::new().unwrap();
    let dir_bad = TempDir::new().unwrap();

    let mut stations = HashMap::new();
    stations.insert(
        "good".to_string(),
        station_config(dir_good.path(), "good", &[]),
    );
    stations.insert(
        "bad".to_string(),
        station_config(dir_bad.path(), "bad", &[]),
    );

    registry.initialize_from_config(&stations).await;

    assert!(registry.station_exists("good").await);
    assert!(!registry.station_exists("bad").await);
}
