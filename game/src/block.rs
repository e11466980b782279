use serde::{Deserialize, Serialize};

use crate::colour::Colour;
use crate::coordinate::{Coordinate, Point3, rotate_point};
use crate::error::{Error, Result};

/// One renderable side of a block footprint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Wall {
    pub start: Coordinate,
    pub end: Coordinate,
    pub height: i32,
    pub colour: Colour,
}

impl Wall {
    pub fn new(start: Coordinate, end: Coordinate, height: i32, colour: Colour) -> Self {
        Self {
            start,
            end,
            height,
            colour,
        }
    }

    pub fn key(&self) -> String {
        format!("{}->{}", self.start.key(), self.end.key())
    }

    pub fn is_reverse_of(&self, other: &Wall) -> bool {
        self.start == other.end && self.end == other.start
    }

    fn rotate(&mut self, angle: f64, origin: Point3) {
        let z = self.height as f64;
        let start = rotate_point(self.start.to_point(z), angle, origin);
        let end = rotate_point(self.end.to_point(z), angle, origin);

        self.start = Coordinate::new(start.x.round() as i32, start.y.round() as i32);
        self.end = Coordinate::new(end.x.round() as i32, end.y.round() as i32);
        self.height = ((start.z + end.z) / 2.0).round() as i32;
    }
}

/// A unit cell (four walls) or a bare segment (two walls) at a single height.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Block {
    walls: Vec<Wall>,
    pub colour: Colour,
    pub fall_count: u32,
}

impl Block {
    pub fn from_walls(walls: Vec<Wall>) -> Result<Self> {
        check_walls(&walls)?;
        let colour = walls[0].colour;
        Ok(Self {
            walls,
            colour,
            fall_count: 0,
        })
    }

    /// Re-checks the wall invariants, for blocks that arrived through serde.
    pub fn validate(&self) -> Result<()> {
        check_walls(&self.walls)
    }

    /// The unit footprint whose far corner is `(i, j)`; that corner is the anchor.
    pub fn on_point(i: i32, j: i32, height: i32, colour: Colour) -> Self {
        let c = |i, j| Coordinate::new(i, j);
        let walls = vec![
            Wall::new(c(i - 1, j), c(i, j), height, colour),
            Wall::new(c(i, j), c(i, j - 1), height, colour),
            Wall::new(c(i, j - 1), c(i - 1, j - 1), height, colour),
            Wall::new(c(i - 1, j - 1), c(i - 1, j), height, colour),
        ];
        Self {
            walls,
            colour,
            fall_count: 0,
        }
    }

    pub fn segment(start: Coordinate, end: Coordinate, height: i32, colour: Colour) -> Self {
        Self {
            walls: vec![
                Wall::new(start, end, height, colour),
                Wall::new(end, start, height, colour),
            ],
            colour,
            fall_count: 0,
        }
    }

    pub fn walls(&self) -> &[Wall] {
        &self.walls
    }

    pub fn height(&self) -> i32 {
        self.walls.iter().map(|w| w.height).min().unwrap_or(0)
    }

    /// Anchor coordinate: wall 1's start for a cell, wall 0's start for a segment.
    pub fn pos(&self) -> Coordinate {
        let anchor = if self.walls.len() == 4 { 1 } else { 0 };
        self.walls[anchor].start
    }

    pub fn set_colour(&mut self, colour: Colour) {
        self.colour = colour;
        for wall in &mut self.walls {
            wall.colour = colour;
        }
    }

    pub fn set_height(&mut self, height: i32) {
        for wall in &mut self.walls {
            wall.height = height;
        }
    }

    pub fn translate(&mut self, di: i32, dj: i32) {
        for wall in &mut self.walls {
            wall.start = wall.start.offset(di, dj);
            wall.end = wall.end.offset(di, dj);
        }
    }

    /// Lower every wall by `n`. Heights saturate at `i32::MIN`; callers check
    /// the landing spot first.
    pub fn drop(&mut self, n: u32) {
        let n_height = i32::try_from(n).unwrap_or(i32::MAX);
        for wall in &mut self.walls {
            wall.height = wall.height.saturating_sub(n_height);
        }
        self.fall_count = self.fall_count.saturating_add(n);
    }

    pub fn rotate(&mut self, angle: f64, origin: Point3) {
        for wall in &mut self.walls {
            wall.rotate(angle, origin);
        }
    }

    /// Detached copy pinned to `height` in the ghost colour.
    pub fn to_ghost(&self, height: i32) -> Block {
        let mut ghost = self.clone();
        ghost.set_height(height);
        ghost.set_colour(self.colour.ghost());
        ghost
    }
}

fn check_walls(walls: &[Wall]) -> Result<()> {
    if walls.len() != 2 && walls.len() != 4 {
        return Err(Error::InvalidBlock(format!(
            "expected 2 or 4 walls, got {}",
            walls.len()
        )));
    }
    let height = walls[0].height;
    if walls.iter().any(|w| w.height != height) {
        return Err(Error::InvalidBlock(
            "walls of one block must share a height".to_string(),
        ));
    }
    Ok(())
}
