//! Board coordinates.
use std::{fmt, ops};

use glam::{IVec2, IVec3};
use serde::{Deserialize, Serialize};
use util::{VecExt, DIR_8};

/// Tile position on the board with a layer coordinate.
///
/// Layer zero is the ground, raised floors of buildings have positive
/// layers.
#[derive(
    Copy,
    Clone,
    Default,
    Eq,
    PartialEq,
    Ord,
    PartialOrd,
    Hash,
    Debug,
    Serialize,
    Deserialize,
)]
pub struct Position {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

/// Shorthand for a ground level position.
pub const fn pos(x: i32, y: i32) -> Position {
    Position { x, y, z: 0 }
}

impl Position {
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Position { x, y, z }
    }

    /// Chessboard distance, the number of 8-directional steps between the
    /// positions.
    pub fn distance(&self, other: &Position) -> i32 {
        (IVec3::from(*other) - IVec3::from(*self)).king_len()
    }

    pub fn left_of(&self, other: &Position) -> bool {
        self.x < other.x
    }

    pub fn right_of(&self, other: &Position) -> bool {
        self.x > other.x
    }

    /// Positions along a straight line towards `other`.
    ///
    /// Excludes self, always ends with `other`. Empty if the positions are
    /// the same.
    pub fn interpolate_to(&self, other: &Position) -> Vec<Position> {
        let mut ret: Vec<Position> =
            util::king_line((*self).into(), (*other).into())
                .into_iter()
                .map(Position::from)
                .collect();
        if self != other && ret.last() != Some(other) {
            ret.push(*other);
        }
        ret
    }

    /// The eight positions around this one on the same layer.
    pub fn neighbours(&self) -> impl Iterator<Item = Position> {
        let p = *self;
        DIR_8.into_iter().map(move |d| p + d)
    }

    /// Same tile one layer up or down.
    pub fn layer(&self, z: i32) -> Position {
        Position { z, ..*self }
    }

    /// Ground tile under the position.
    pub fn tile(&self) -> IVec2 {
        IVec2::new(self.x, self.y)
    }
}

impl From<IVec3> for Position {
    fn from(v: IVec3) -> Self {
        Position::new(v.x, v.y, v.z)
    }
}

impl From<Position> for IVec3 {
    fn from(p: Position) -> Self {
        IVec3::new(p.x, p.y, p.z)
    }
}

impl From<IVec2> for Position {
    fn from(v: IVec2) -> Self {
        pos(v.x, v.y)
    }
}

impl ops::Add for Position {
    type Output = Position;

    fn add(self, rhs: Position) -> Position {
        Position::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl ops::Sub for Position {
    type Output = Position;

    fn sub(self, rhs: Position) -> Position {
        Position::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl ops::Add<IVec2> for Position {
    type Output = Position;

    fn add(self, rhs: IVec2) -> Position {
        Position::new(self.x + rhs.x, self.y + rhs.y, self.z)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.z == 0 {
            write!(f, "({}, {})", self.x, self.y)
        } else {
            write!(f, "({}, {}, {})", self.x, self.y, self.z)
        }
    }
}

#[cfg(test)]
impl quickcheck::Arbitrary for Position {
    fn arbitrary(g: &mut quickcheck::Gen) -> Position {
        // Keep coordinates small enough that differences can't overflow.
        Position::new(
            i16::arbitrary(g) as i32,
            i16::arbitrary(g) as i32,
            (i8::arbitrary(g) % 4) as i32,
        )
    }
}
