//! The board engine: lattice graph, per-height occupancy, the active piece
//! and its ghost, placement, scoring and layer clearing.
//!
//! Commands never fail loudly. A move that would leave the interior or run
//! into an occupied cell is rejected as a whole and reported as `false`.
//! Side effects that the outside world cares about (placed blocks, score
//! changes, cleared layers, game over) are buffered as [`TilesetEvent`]s and
//! handed out by [`Tileset::drain_events`].

mod events;
mod graph;
mod snapshot;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::block::Block;
use crate::coordinate::{Coordinate, Point3};
use crate::error::Result;
use crate::tetromino::{GhostTetromino, Tetromino};

pub use events::TilesetEvent;
pub use graph::{Edge, Graph, NEIGHBOUR_OFFSETS, Node};
pub use snapshot::{SNAPSHOT_VERSION, TilesetSnapshot};

pub const FALL_HEIGHT_DEFAULT: u32 = 5;
pub const LANDING_CEILING_DEFAULT: u32 = 10;
pub const BLOCK_POINTS_DEFAULT: u32 = 10;
pub const LAYER_BONUS_DEFAULT: u32 = 100;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TilesetConfig {
    /// Unit drops a piece gets before it is frozen; placing at this height ends the game.
    pub fall_height: u32,
    /// Where the landing-height scan starts.
    pub landing_ceiling: u32,
    /// Points per placed block, multiplied by the block's 1-based index in its piece.
    pub block_points: u32,
    /// Points per cleared layer, multiplied by the layer's 1-based height.
    pub layer_bonus: u32,
}

impl Default for TilesetConfig {
    fn default() -> Self {
        Self {
            fall_height: FALL_HEIGHT_DEFAULT,
            landing_ceiling: LANDING_CEILING_DEFAULT,
            block_points: BLOCK_POINTS_DEFAULT,
            layer_bonus: LAYER_BONUS_DEFAULT,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "TilesetSnapshot", into = "TilesetSnapshot")]
pub struct Tileset {
    config: TilesetConfig,
    graph: Graph,
    tets: Vec<Tetromino>,
    active_index: usize,
    placed: Vec<Block>,
    ghost: Option<GhostTetromino>,
    score: u32,
    game_over: bool,
    events: Vec<TilesetEvent>,
}

impl Tileset {
    pub fn new(width: usize, height: usize) -> Result<Self> {
        Self::with_config(width, height, TilesetConfig::default())
    }

    pub fn with_config(width: usize, height: usize, config: TilesetConfig) -> Result<Self> {
        Ok(Self {
            config,
            graph: Graph::new(width, height)?,
            tets: Vec::new(),
            active_index: 0,
            placed: Vec::new(),
            ghost: None,
            score: 0,
            game_over: false,
            events: Vec::new(),
        })
    }

    pub fn config(&self) -> &TilesetConfig {
        &self.config
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn width(&self) -> usize {
        self.graph.width()
    }

    pub fn height(&self) -> usize {
        self.graph.height()
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn is_game_over(&self) -> bool {
        self.game_over
    }

    pub fn active_index(&self) -> usize {
        self.active_index
    }

    pub fn active_tet(&self) -> Option<&Tetromino> {
        self.tets.get(self.active_index)
    }

    pub fn ghost(&self) -> Option<&GhostTetromino> {
        self.ghost.as_ref()
    }

    /// The active piece followed by every piece still waiting to spawn.
    pub fn queued(&self) -> &[Tetromino] {
        &self.tets[self.active_index.min(self.tets.len())..]
    }

    pub fn placed_blocks(&self) -> &[Block] {
        &self.placed
    }

    pub fn renderable_blocks(&self) -> Vec<Block> {
        self.placed.clone()
    }

    pub fn pending_events(&self) -> &[TilesetEvent] {
        &self.events
    }

    pub fn drain_events(&mut self) -> Vec<TilesetEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn add_tet(&mut self, tet: Tetromino) {
        self.tets.push(tet);
    }

    pub fn add_tets(&mut self, tets: impl IntoIterator<Item = Tetromino>) {
        self.tets.extend(tets);
    }

    /// Entry action for a newly active piece: build its ghost.
    pub fn init_mode(&mut self) {
        self.refresh_ghost();
    }

    /// One fall-timer tick. Drops the active piece a cell while it still has
    /// fall budget, otherwise freezes it. Returns false when there was no
    /// piece to act on, which is the caller's cue to enqueue one.
    pub fn play(&mut self) -> bool {
        if self.game_over {
            return false;
        }
        let Some(active) = self.active_tet() else {
            return false;
        };

        if active.fall_count < self.config.fall_height {
            self.drop_active(1);
        } else {
            self.freeze();
        }
        true
    }

    /// Anchor cells must stay strictly inside the outer ring.
    pub fn is_block_out_of_bounds(&self, coord: Coordinate) -> bool {
        coord.i <= 0
            || coord.i >= self.width() as i32
            || coord.j <= 0
            || coord.j >= self.height() as i32
    }

    pub fn is_occupied_at_height(&self, coord: Coordinate, height: i32) -> bool {
        self.graph.is_occupied_at(coord, height)
    }

    /// Scans down from the landing ceiling and returns the lowest height
    /// that still has free cells all the way up.
    pub fn first_valid_height(&self, coord: Coordinate) -> i32 {
        let mut height = self.config.landing_ceiling as i32;
        while height > 0 && !self.is_occupied_at_height(coord, height - 1) {
            height -= 1;
        }
        height
    }

    /// Height at which every block of `tet` could land together.
    pub fn landing_height(&self, tet: &Tetromino) -> i32 {
        tet.positions()
            .into_iter()
            .map(|c| self.first_valid_height(c))
            .max()
            .unwrap_or(0)
    }

    fn refresh_ghost(&mut self) {
        self.ghost = self
            .active_tet()
            .map(|active| GhostTetromino::new(active, self.landing_height(active)));
    }

    fn is_valid_block_translation(&self, block: &Block, di: i32, dj: i32) -> bool {
        let Some(target) = block.pos().checked_offset(di, dj) else {
            return false;
        };
        !self.is_block_out_of_bounds(target) && !self.is_occupied_at_height(target, block.height())
    }

    fn is_valid_block_drop(&self, block: &Block, n: u32) -> bool {
        let target = block.pos();
        let Some(height) = i32::try_from(n)
            .ok()
            .and_then(|n| block.height().checked_sub(n))
        else {
            return false;
        };
        !self.is_block_out_of_bounds(target)
            && height >= 0
            && !self.is_occupied_at_height(target, height)
    }

    fn is_valid_resting_place(&self, block: &Block) -> bool {
        self.is_valid_block_translation(block, 0, 0)
    }

    pub fn translate_active(&mut self, di: i32, dj: i32) -> bool {
        if self.game_over {
            return false;
        }
        let Some(active) = self.active_tet() else {
            return false;
        };
        if !active
            .blocks()
            .iter()
            .all(|b| self.is_valid_block_translation(b, di, dj))
        {
            debug!(di, dj, "translation rejected");
            return false;
        }

        self.tets[self.active_index].translate(di, dj);
        self.refresh_ghost();
        true
    }

    /// Lowers the active piece by `n`. If any block cannot follow, the piece
    /// is frozen where it is and false is returned.
    pub fn drop_active(&mut self, n: u32) -> bool {
        if self.game_over {
            return false;
        }
        let Some(active) = self.active_tet() else {
            return false;
        };
        if !active.blocks().iter().all(|b| self.is_valid_block_drop(b, n)) {
            self.freeze();
            return false;
        }

        self.tets[self.active_index].drop(n);
        true
    }

    /// Drops until the piece lands. Returns the number of cells fallen.
    pub fn quick_drop(&mut self) -> u32 {
        let mut dropped = 0;
        if self.game_over || self.active_tet().is_none() {
            return dropped;
        }
        while self.drop_active(1) {
            dropped += 1;
        }
        dropped
    }

    /// Rotates the active piece by `angle` radians about the anchor of its
    /// highest block (first one on ties). All-or-nothing like translation.
    pub fn spin_active(&mut self, angle: f64) -> bool {
        if self.game_over {
            return false;
        }
        let Some(active) = self.active_tet() else {
            return false;
        };
        let Some(pivot) = Self::pivot_of(active) else {
            return false;
        };

        let mut candidate = active.clone();
        candidate.rotate(angle, Some(pivot));
        if !candidate
            .blocks()
            .iter()
            .all(|b| self.is_valid_resting_place(b))
        {
            debug!(angle, "rotation rejected");
            return false;
        }

        self.tets[self.active_index] = candidate;
        self.refresh_ghost();
        true
    }

    fn pivot_of(tet: &Tetromino) -> Option<Point3> {
        let mut highest: Option<&Block> = None;
        for block in tet.blocks() {
            if highest.is_none_or(|h| block.height() > h.height()) {
                highest = Some(block);
            }
        }
        highest.map(|b| b.pos().to_point(b.height() as f64))
    }

    /// Commits the active piece to the board and moves on to the next one.
    pub fn freeze(&mut self) {
        let Some(active) = self.active_tet().cloned() else {
            return;
        };
        self.place_tet(active);
        self.active_index += 1;
        if self.game_over {
            self.ghost = None;
        } else {
            self.refresh_ghost();
        }
    }

    /// Places every block of `tet`, scores it and clears at most one layer.
    /// Returns false if the placement topped out the board.
    pub fn place_tet(&mut self, tet: Tetromino) -> bool {
        if self.game_over {
            return false;
        }
        let start = self.score;
        for (index, block) in tet.into_blocks().into_iter().enumerate() {
            if !self.place_block(block) {
                if self.score != start {
                    self.events.push(TilesetEvent::ScoreChanged { score: self.score });
                }
                return false;
            }
            self.score = self
                .score
                .saturating_add(self.config.block_points.saturating_mul(index as u32 + 1));
        }

        if let Some(layer) = self.first_clearable_layer() {
            self.clear_layer(layer);
            self.score = self
                .score
                .saturating_add(self.config.layer_bonus.saturating_mul(layer as u32 + 1));
            self.events.push(TilesetEvent::LayerCleared { layer });
        }

        self.events.push(TilesetEvent::ScoreChanged { score: self.score });
        true
    }

    fn place_block(&mut self, block: Block) -> bool {
        let height = block.height();
        if height >= self.config.fall_height as i32 {
            info!(height, score = self.score, "board full, game over");
            self.game_over = true;
            self.events.push(TilesetEvent::GameOver);
            return false;
        }

        let pos = block.pos();
        let Some(node) = self.graph.node_mut(pos) else {
            warn!(%pos, height, "block anchored outside the board was not placed");
            return true;
        };
        node.set_occupied_at(height);
        debug!(%pos, height, "placed block");
        self.events.push(TilesetEvent::Placed {
            block: block.clone(),
        });
        self.placed.push(block);
        true
    }

    /// Number of interior cells, the fill level at which a layer clears.
    pub fn layer_capacity(&self) -> usize {
        (self.width().saturating_sub(1) * self.height().saturating_sub(1)).max(1)
    }

    pub fn is_layer_clearable(&self, layer: i32) -> bool {
        self.graph.occupied_columns_at(layer) >= self.layer_capacity()
    }

    /// Lowest clearable layer between the floor and the highest placed block.
    pub fn first_clearable_layer(&self) -> Option<i32> {
        let top = self.placed.iter().map(Block::height).max()?;
        (0..=top).find(|&layer| self.is_layer_clearable(layer))
    }

    /// Removes every placed block at `layer`. Blocks above stay where they are.
    fn clear_layer(&mut self, layer: i32) {
        let before = self.placed.len();
        let (cleared, kept): (Vec<Block>, Vec<Block>) = std::mem::take(&mut self.placed)
            .into_iter()
            .partition(|b| b.height() == layer);
        for block in &cleared {
            if let Some(node) = self.graph.node_mut(block.pos()) {
                node.clear_occupancy_at(layer);
            }
        }
        self.placed = kept;
        info!(layer, before, after = self.placed.len(), "cleared layer");
    }

    pub fn snapshot(&self) -> TilesetSnapshot {
        TilesetSnapshot::from(self.clone())
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.snapshot())?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let snapshot: TilesetSnapshot = serde_json::from_str(json)?;
        Self::try_from(snapshot)
    }
}
