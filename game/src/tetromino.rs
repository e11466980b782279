use serde::{Deserialize, Serialize};

use crate::block::{Block, Wall};
use crate::colour::Colour;
use crate::coordinate::{Coordinate, Point3};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Shape {
    I,
    J,
    L,
    O,
    S,
    T,
    Z,
}

impl Shape {
    pub const ALL: [Shape; 7] = [
        Shape::I,
        Shape::J,
        Shape::L,
        Shape::O,
        Shape::S,
        Shape::T,
        Shape::Z,
    ];

    /// Block offsets `(di, dj, dh)` from the spawn point, lowest blocks first.
    pub fn layout(self) -> &'static [(i32, i32, i32)] {
        match self {
            Shape::I => &[(0, 0, 0), (0, 0, 1), (0, 0, 2)],
            Shape::J => &[(0, -1, 0), (0, 0, 0), (0, 0, 1), (0, 0, 2)],
            Shape::L => &[(-1, 0, 0), (0, 0, 0), (0, 0, 1), (0, 0, 2)],
            Shape::O => &[(0, -1, 0), (1, -1, 0), (0, 0, 0), (1, 0, 0)],
            Shape::S => &[(0, -1, 0), (1, -1, 0), (-1, 0, 0), (0, 0, 0)],
            Shape::T => &[(0, 0, 0), (0, 0, 1), (1, 0, 1), (0, 1, 1)],
            Shape::Z => &[(-1, -1, 0), (0, -1, 0), (0, 0, 0), (1, 0, 0)],
        }
    }
}

/// Blocks that move as one rigid body.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Tetromino {
    blocks: Vec<Block>,
    colour: Colour,
    pub fall_count: u32,
    pub shape: Option<Shape>,
}

impl Tetromino {
    pub fn new(mut blocks: Vec<Block>, colour: Colour) -> Self {
        for block in &mut blocks {
            block.set_colour(colour);
        }
        Self {
            blocks,
            colour,
            fall_count: 0,
            shape: None,
        }
    }

    pub fn with_shape(mut self, shape: Shape) -> Self {
        self.shape = Some(shape);
        self
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn into_blocks(self) -> Vec<Block> {
        self.blocks
    }

    pub fn colour(&self) -> Colour {
        self.colour
    }

    pub fn heights(&self) -> Vec<i32> {
        self.blocks.iter().map(Block::height).collect()
    }

    /// Anchor of every block, in block order.
    pub fn positions(&self) -> Vec<Coordinate> {
        self.blocks.iter().map(Block::pos).collect()
    }

    pub fn walls(&self) -> impl Iterator<Item = &Wall> {
        self.blocks.iter().flat_map(|b| b.walls().iter())
    }

    pub fn translate(&mut self, di: i32, dj: i32) {
        for block in &mut self.blocks {
            block.translate(di, dj);
        }
    }

    pub fn drop(&mut self, n: u32) {
        for block in &mut self.blocks {
            block.drop(n);
        }
        self.fall_count = self.fall_count.saturating_add(n);
    }

    /// Rotate every block about `pivot`, or about the centroid of all wall
    /// endpoints when no pivot is given.
    pub fn rotate(&mut self, angle: f64, pivot: Option<Point3>) {
        let Some(origin) = pivot.or_else(|| self.centroid()) else {
            return;
        };
        for block in &mut self.blocks {
            block.rotate(angle, origin);
        }
    }

    fn centroid(&self) -> Option<Point3> {
        let mut sum = Point3::new(0.0, 0.0, 0.0);
        let mut count = 0usize;
        for wall in self.walls() {
            for c in [wall.start, wall.end] {
                sum.x += c.i as f64;
                sum.y += c.j as f64;
                sum.z += wall.height as f64;
                count += 1;
            }
        }
        if count == 0 {
            return None;
        }
        let n = count as f64;
        Some(Point3::new(sum.x / n, sum.y / n, sum.z / n))
    }
}

/// Landing preview: a deep copy of the active piece with every block pinned
/// to one height.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GhostTetromino {
    piece: Tetromino,
    landing_height: i32,
}

impl GhostTetromino {
    pub fn new(active: &Tetromino, landing_height: i32) -> Self {
        let blocks = active
            .blocks()
            .iter()
            .map(|b| b.to_ghost(landing_height))
            .collect();
        let mut piece = Tetromino::new(blocks, active.colour().ghost());
        piece.shape = active.shape;
        Self {
            piece,
            landing_height,
        }
    }

    pub fn piece(&self) -> &Tetromino {
        &self.piece
    }

    pub fn blocks(&self) -> &[Block] {
        self.piece.blocks()
    }

    pub fn landing_height(&self) -> i32 {
        self.landing_height
    }

    pub fn positions(&self) -> Vec<Coordinate> {
        self.piece.positions()
    }
}
