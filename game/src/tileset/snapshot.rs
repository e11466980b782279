use serde::{Deserialize, Serialize};

use crate::block::Block;
use crate::error::Error;
use crate::tetromino::{GhostTetromino, Tetromino};

use super::{Graph, Tileset, TilesetConfig};

pub const SNAPSHOT_VERSION: u32 = 1;

/// Flat, self-describing form of a [`Tileset`]. Pending events are not part
/// of it; a restored board starts with an empty event buffer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TilesetSnapshot {
    pub version: u32,
    pub config: TilesetConfig,
    pub graph: Graph,
    pub tets: Vec<Tetromino>,
    pub active_index: usize,
    pub placed_blocks: Vec<Block>,
    pub ghost: Option<GhostTetromino>,
    pub score: u32,
    pub game_over: bool,
}

impl From<Tileset> for TilesetSnapshot {
    fn from(tileset: Tileset) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            config: tileset.config,
            graph: tileset.graph,
            tets: tileset.tets,
            active_index: tileset.active_index,
            placed_blocks: tileset.placed,
            ghost: tileset.ghost,
            score: tileset.score,
            game_over: tileset.game_over,
        }
    }
}

impl TilesetSnapshot {
    fn validate(&self) -> Result<(), String> {
        if self.version != SNAPSHOT_VERSION {
            return Err(format!(
                "unsupported snapshot version {} (expected {SNAPSHOT_VERSION})",
                self.version
            ));
        }
        self.graph.check_topology()?;

        if self.active_index > self.tets.len() {
            return Err(format!(
                "active index {} is past the {} queued pieces",
                self.active_index,
                self.tets.len()
            ));
        }

        let queued = self.tets.iter().flat_map(Tetromino::blocks);
        let ghost = self.ghost.iter().flat_map(GhostTetromino::blocks);
        for block in self.placed_blocks.iter().chain(queued).chain(ghost) {
            block.validate().map_err(|e| e.to_string())?;
        }

        for block in &self.placed_blocks {
            let pos = block.pos();
            if !self.graph.contains(pos) {
                return Err(format!("placed block at {pos} is outside the board"));
            }
            if !self.graph.is_occupied_at(pos, block.height()) {
                return Err(format!(
                    "placed block at {pos} height {} has no occupancy record",
                    block.height()
                ));
            }
        }
        Ok(())
    }
}

impl TryFrom<TilesetSnapshot> for Tileset {
    type Error = Error;

    fn try_from(snapshot: TilesetSnapshot) -> Result<Self, Self::Error> {
        snapshot.validate().map_err(Error::MalformedSnapshot)?;
        Ok(Self {
            config: snapshot.config,
            graph: snapshot.graph,
            tets: snapshot.tets,
            active_index: snapshot.active_index,
            placed: snapshot.placed_blocks,
            ghost: snapshot.ghost,
            score: snapshot.score,
            game_over: snapshot.game_over,
            events: Vec::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::colour::Colour;

    fn board() -> Tileset {
        let mut t = Tileset::new(5, 5).expect("tileset");
        t.place_tet(Tetromino::new(
            vec![Block::on_point(2, 2, 0, Colour::RED)],
            Colour::RED,
        ));
        t.add_tet(Tetromino::new(
            vec![Block::on_point(3, 3, 4, Colour::RED)],
            Colour::RED,
        ));
        t.init_mode();
        t
    }

    #[test]
    fn snapshot_restores_without_events() {
        let t = board();
        assert!(!t.pending_events().is_empty());
        let restored = Tileset::try_from(t.snapshot()).expect("restore");
        assert!(restored.pending_events().is_empty());
        assert_eq!(restored.snapshot(), t.snapshot());
    }

    #[test]
    fn rejects_future_versions() {
        let mut snap = board().snapshot();
        snap.version = SNAPSHOT_VERSION + 1;
        assert!(matches!(Tileset::try_from(snap), Err(Error::MalformedSnapshot(_))));
    }

    #[test]
    fn rejects_active_index_past_queue() {
        let mut snap = board().snapshot();
        snap.active_index = snap.tets.len() + 1;
        assert!(matches!(Tileset::try_from(snap), Err(Error::MalformedSnapshot(_))));
    }

    #[test]
    fn rejects_placed_block_without_occupancy() {
        let mut snap = board().snapshot();
        snap.placed_blocks.push(Block::on_point(1, 1, 0, Colour::RED));
        assert!(matches!(Tileset::try_from(snap), Err(Error::MalformedSnapshot(_))));
    }

    #[test]
    fn rejects_graph_that_lost_its_occupancy() {
        let mut snap = board().snapshot();
        snap.graph = Graph::new(5, 5).expect("graph");
        assert!(matches!(Tileset::try_from(snap), Err(Error::MalformedSnapshot(_))));
    }
}
