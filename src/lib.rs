//! # aircast
//!
//! Multi-station internet radio relay. Each configured station owns a
//! playlist directory and a broadcast pipeline; a registry supervises the
//! stations, and a Telegram command surface plus a small HTTP listing
//! endpoint let operators control them remotely.

pub mod api;
pub mod bot;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod playlist;
pub mod station;

pub use error::{Error, Result};
pub use station::{StationController, StationRegistry};
