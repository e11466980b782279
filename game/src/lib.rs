//! Falling-block puzzle engine for an isometric diamond board.
//!
//! [`tileset::Tileset`] is the board: a lattice graph with per-height
//! occupancy, the active [`tetromino::Tetromino`] and its ghost, placement,
//! scoring and layer clearing. [`state::GameState`] ties it to a piece
//! generator and a fall timer, and [`agent::IsoTetGame`] exposes the whole
//! session to the `isotet-engine` runner.

pub mod agent;
pub mod block;
pub mod colour;
pub mod coordinate;
pub mod error;
pub mod fall_timer;
pub mod generator;
pub mod serde_duration;
pub mod settings;
pub mod state;
pub mod tetromino;
pub mod tileset;

pub use error::{Error, Result};
