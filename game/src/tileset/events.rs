use serde::{Deserialize, Serialize};

use crate::block::Block;

/// Notifications the board emits while processing commands, in the order
/// they happened.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TilesetEvent {
    /// A block was committed to the board and should be rendered.
    Placed { block: Block },
    /// Emitted once per placed piece, after any layer bonus.
    ScoreChanged { score: u32 },
    LayerCleared { layer: i32 },
    GameOver,
}
