use serde::{Deserialize, Serialize};

use crate::block::Block;
use crate::colour::Colour;
use crate::coordinate::Coordinate;
use crate::tetromino::{Shape, Tetromino};

/// xorshift64* with a serializable state, so sessions replay exactly.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Rng {
    state: u64,
}

impl Rng {
    pub fn new(seed: u64) -> Self {
        let seed = if seed == 0 {
            0x9E37_79B9_7F4A_7C15
        } else {
            seed
        };
        Self { state: seed }
    }

    pub fn next_u32(&mut self) -> u32 {
        let mut x = self.state;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.state = x;
        (x.wrapping_mul(0x2545_F491_4F6C_DD1D) >> 32) as u32
    }

    /// Uniform-ish draw in `0..bound`; a zero bound yields 0.
    pub fn next_below(&mut self, bound: u32) -> u32 {
        if bound == 0 {
            return 0;
        }
        self.next_u32() % bound
    }
}

/// Builds pieces at the spawn point, raised by the fall height so that a piece
/// reaches the floor after exactly that many unit drops.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TetGenerator {
    rng: Rng,
    spawn: Coordinate,
    spawn_height: i32,
}

impl TetGenerator {
    pub fn new(seed: u64, spawn: Coordinate, spawn_height: i32) -> Self {
        Self {
            rng: Rng::new(seed),
            spawn,
            spawn_height,
        }
    }

    pub fn spawn(&self) -> Coordinate {
        self.spawn
    }

    pub fn spawn_height(&self) -> i32 {
        self.spawn_height
    }

    pub fn build(&self, shape: Shape, colour: Colour) -> Tetromino {
        let blocks = shape
            .layout()
            .iter()
            .map(|&(di, dj, dh)| {
                Block::on_point(
                    self.spawn.i + di,
                    self.spawn.j + dj,
                    self.spawn_height + dh,
                    colour,
                )
            })
            .collect();
        Tetromino::new(blocks, colour).with_shape(shape)
    }

    /// A single-cell piece at the spawn point.
    pub fn build_single(&self, colour: Colour) -> Tetromino {
        let block = Block::on_point(self.spawn.i, self.spawn.j, self.spawn_height, colour);
        Tetromino::new(vec![block], colour)
    }

    pub fn next_shape(&mut self) -> Shape {
        Shape::ALL[self.rng.next_below(Shape::ALL.len() as u32) as usize]
    }

    pub fn next_tetromino(&mut self) -> Tetromino {
        let shape = self.next_shape();
        let colour = Colour::random(&mut self.rng);
        self.build(shape, colour)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn same_seed_same_sequence() {
        let mut a = TetGenerator::new(7, Coordinate::new(5, 5), 5);
        let mut b = TetGenerator::new(7, Coordinate::new(5, 5), 5);
        for _ in 0..20 {
            assert_eq!(a.next_tetromino(), b.next_tetromino());
        }
    }

    #[test]
    fn draws_cover_every_shape() {
        let mut g = TetGenerator::new(42, Coordinate::new(5, 5), 5);
        let seen: HashSet<Shape> = (0..200).map(|_| g.next_shape()).collect();
        assert_eq!(seen.len(), Shape::ALL.len());
    }

    #[test]
    fn pieces_spawn_at_the_fall_height() {
        let g = TetGenerator::new(1, Coordinate::new(4, 6), 5);
        let t = g.build(Shape::T, Colour::RED);
        assert_eq!(t.heights(), vec![5, 6, 6, 6]);
        assert_eq!(t.positions()[0], Coordinate::new(4, 6));
        assert_eq!(t.shape, Some(Shape::T));
    }
}
