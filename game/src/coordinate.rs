use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// A planar lattice position. Heights live on walls and blocks, never here.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Coordinate {
    pub i: i32,
    pub j: i32,
}

impl Coordinate {
    pub const fn new(i: i32, j: i32) -> Self {
        Self { i, j }
    }

    pub fn make_key(i: i32, j: i32) -> String {
        format!("{i},{j}")
    }

    /// Canonical `"i,j"` key.
    pub fn key(&self) -> String {
        Self::make_key(self.i, self.j)
    }

    pub const fn offset(self, di: i32, dj: i32) -> Self {
        Self::new(self.i + di, self.j + dj)
    }

    /// `None` when either axis leaves the `i32` range.
    pub const fn checked_offset(self, di: i32, dj: i32) -> Option<Self> {
        match (self.i.checked_add(di), self.j.checked_add(dj)) {
            (Some(i), Some(j)) => Some(Self::new(i, j)),
            _ => None,
        }
    }

    pub fn to_point(self, z: f64) -> Point3 {
        Point3::new(self.i as f64, self.j as f64, z)
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.i, self.j)
    }
}

impl FromStr for Coordinate {
    type Err = Error;

    fn from_str(key: &str) -> Result<Self, Self::Err> {
        let bad = || Error::InvalidCoordinateKey(key.to_string());
        let (i, j) = key.split_once(',').ok_or_else(bad)?;
        let i = i.trim().parse().map_err(|_| bad())?;
        let j = j.trim().parse().map_err(|_| bad())?;
        Ok(Self::new(i, j))
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Point3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point3 {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

/// Rotate `point` about `origin` by `angle` radians in the horizontal plane.
/// The vertical component is carried through unchanged.
pub fn rotate_point(point: Point3, angle: f64, origin: Point3) -> Point3 {
    let dx = point.x - origin.x;
    let dy = point.y - origin.y;
    let (sin, cos) = angle.sin_cos();

    Point3 {
        x: dx * cos - dy * sin + origin.x,
        y: dx * sin + dy * cos + origin.y,
        z: point.z,
    }
}
