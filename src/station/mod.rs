//! Station supervision: per-station playback control and the registry

pub mod controller;
pub mod registry;

pub use controller::{StationController, StationState, StationStatus};
pub use registry::{StationRegistry, StationSummary};
