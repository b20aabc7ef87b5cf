//! Tile dashboard for Troutwatch sensor readings.
//!
//! The dashboard is an ordered set of tiles kept in memory and rendered
//! to HTML on request. A background controller refreshes it from the data
//! producer's output; the server crate exposes it over HTTP.
//!
//! # Modules
//!
//! - [`markup`] -- Owned element tree with escaped HTML rendering.
//! - [`tile`] / [`registry`] -- Tiles and the create-once registry that
//!   holds them.
//! - [`alert`] -- Water and air threshold alert tiles.
//! - [`notes`] -- Notes tile fed by cross-frame messages.
//! - [`source`] -- HTTP and file sources for the sensor text.
//! - [`controller`] -- Refresh cycle and periodic loop.
//! - [`visibility`] -- Page-visibility gate for the loop.
//! - [`board`] -- The shared dashboard state.
//! - [`error`] -- Error types.

pub mod alert;
pub mod board;
pub mod controller;
pub mod error;
pub mod markup;
pub mod notes;
pub mod registry;
pub mod source;
pub mod tile;
pub mod visibility;

pub use alert::{AlertState, AlertTile};
pub use board::{Dashboard, SharedDashboard, TileSummary};
pub use controller::{
    CycleOutcome, CycleReport, RefreshTiming, SensorTileController, sensor_tile_id,
};
pub use error::{FetchError, MountError, RegistrationError};
pub use notes::{Message, Note, NotesBoard};
pub use registry::{TileHandle, TileRegistry};
pub use source::{DataSource, FileSource, HttpSource};
pub use tile::{Body, Content, Tile, TileApi, TileSize, TileSpec};
pub use visibility::VisibilityGate;
