use std::fmt;

use glam::{ivec2, IVec2};
use serde::{Deserialize, Serialize};
use strum::{EnumCount, EnumIter};
use util::AsciiMap;

use crate::{prelude::*, Error};

/// Terrain in a single farm map cell.
#[derive(
    Copy,
    Clone,
    Default,
    Eq,
    PartialEq,
    Hash,
    Debug,
    Serialize,
    Deserialize,
    EnumCount,
    EnumIter,
)]
#[serde(try_from = "char", into = "char")]
pub enum Terrain {
    #[default]
    Grassland,
    Woodland,
    Fence,
    BrokenFence,
    Henhouse,
    Hendominium,
    Guardtower,
}

use Terrain::*;

impl Terrain {
    pub fn is_fence(self) -> bool {
        matches!(self, Fence)
    }

    /// Terrain is the footprint of a building.
    pub fn is_building(self) -> bool {
        matches!(self, Henhouse | Hendominium | Guardtower)
    }

    /// New buildings can only go on open ground.
    pub fn is_buildable(self) -> bool {
        self == Grassland
    }
}

impl TryFrom<char> for Terrain {
    type Error = &'static str;

    fn try_from(value: char) -> Result<Self, Self::Error> {
        match value {
            '.' => Ok(Grassland),
            '%' => Ok(Woodland),
            '#' => Ok(Fence),
            '=' => Ok(BrokenFence),
            'H' => Ok(Henhouse),
            'D' => Ok(Hendominium),
            'G' => Ok(Guardtower),
            _ => Err("invalid terrain char"),
        }
    }
}

impl From<Terrain> for char {
    fn from(val: Terrain) -> Self {
        // NB. This must match Terrain's TryFrom inputs above.
        match val {
            Grassland => '.',
            Woodland => '%',
            Fence => '#',
            BrokenFence => '=',
            Henhouse => 'H',
            Hendominium => 'D',
            Guardtower => 'G',
        }
    }
}

/// Mutable tile grid the simulation plays on.
///
/// Positions address the ground tile under them, the layer coordinate is
/// ignored.
pub trait TileGrid {
    /// Terrain at position, `None` when out of bounds.
    fn get(&self, p: Position) -> Option<Terrain>;

    /// Change terrain at position, out of bounds positions are ignored.
    fn set(&mut self, p: Position, t: Terrain);

    fn in_bounds(&self, p: Position) -> bool {
        let size = self.size();
        (0..size.x).contains(&p.x) && (0..size.y).contains(&p.y)
    }

    /// Width and height of the grid.
    fn size(&self) -> IVec2;
}

/// Dense rectangular tile grid.
#[derive(Clone, Default, Eq, PartialEq, Debug)]
pub struct Tiles {
    width: i32,
    height: i32,
    cells: Vec<Terrain>,
}

impl Tiles {
    /// Grid filled with grassland.
    pub fn new(width: i32, height: i32) -> Self {
        let (width, height) = (width.max(0), height.max(0));
        Tiles {
            width,
            height,
            cells: vec![Grassland; (width * height) as usize],
        }
    }

    /// Read a map written in terrain characters.
    ///
    /// Short rows are padded with grassland.
    pub fn from_ascii(map: &str) -> Result<Self> {
        let map = AsciiMap::new(map);
        let dim = map.dim();
        let mut ret = Tiles::new(dim.x, dim.y);
        for (p, c) in map.iter() {
            let t = Terrain::try_from(c).map_err(|_| Error::BadMapChar(c))?;
            ret.set(p.into(), t);
        }
        Ok(ret)
    }

    /// Terrain characters, one string per row.
    pub fn rows(&self) -> impl Iterator<Item = String> + '_ {
        self.cells
            .chunks(self.width.max(1) as usize)
            .map(|row| row.iter().map(|&t| char::from(t)).collect())
    }

    fn idx(&self, p: Position) -> Option<usize> {
        self.in_bounds(p)
            .then(|| (p.y * self.width + p.x) as usize)
    }
}

impl TileGrid for Tiles {
    fn get(&self, p: Position) -> Option<Terrain> {
        self.idx(p).map(|i| self.cells[i])
    }

    fn set(&mut self, p: Position, t: Terrain) {
        if let Some(i) = self.idx(p) {
            self.cells[i] = t;
        }
    }

    fn size(&self) -> IVec2 {
        ivec2(self.width, self.height)
    }
}

impl fmt::Display for Tiles {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.rows() {
            writeln!(f, "{row}")?;
        }
        Ok(())
    }
}

/// Movement cost of terrain types for a pathing agent.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct CostTable([i32; Terrain::COUNT]);

impl CostTable {
    /// Cost of stepping off the map, more than any terrain.
    pub const OUT_OF_BOUNDS: i32 = 100;

    /// Costs for a common fox.
    pub const fn standard() -> Self {
        let mut costs = [0; Terrain::COUNT];
        costs[Grassland as usize] = 2;
        // Try to keep to the woods if possible.
        costs[Woodland as usize] = 1;
        costs[Fence as usize] = 25;
        costs[BrokenFence as usize] = 2;
        // Don't go into a henhouse unless there's a chicken to catch there.
        costs[Henhouse as usize] = 30;
        costs[Hendominium as usize] = 30;
        // Foxes can slip under towers.
        costs[Guardtower as usize] = 2;
        CostTable(costs)
    }

    pub fn with(mut self, t: Terrain, cost: i32) -> Self {
        assert!(cost < Self::OUT_OF_BOUNDS);
        self.0[t as usize] = cost;
        self
    }

    /// Cost for terrain, `None` is off the map.
    pub fn cost(&self, t: Option<Terrain>) -> i32 {
        match t {
            Some(t) => self.0[t as usize],
            None => Self::OUT_OF_BOUNDS,
        }
    }
}

impl Default for CostTable {
    fn default() -> Self {
        CostTable::standard()
    }
}

#[cfg(test)]
mod test {
    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn terrain_chars() {
        for t in Terrain::iter() {
            assert_eq!(Terrain::try_from(char::from(t)), Ok(t));
        }
        assert!(Terrain::try_from('?').is_err());
    }

    #[test]
    fn map_reading() {
        let tiles = Tiles::from_ascii(
            "
            %%..
            ##=#
            .H
            ",
        )
        .unwrap();
        assert_eq!(tiles.size(), ivec2(4, 3));
        assert_eq!(tiles.get(pos(0, 0)), Some(Woodland));
        assert_eq!(tiles.get(pos(2, 1)), Some(BrokenFence));
        assert_eq!(tiles.get(pos(1, 2)), Some(Henhouse));
        // Padded.
        assert_eq!(tiles.get(pos(3, 2)), Some(Grassland));
        assert_eq!(tiles.get(pos(4, 0)), None);
        assert_eq!(tiles.get(pos(0, -1)), None);
        // Layers read the ground tile.
        assert_eq!(tiles.get(Position::new(1, 2, 1)), Some(Henhouse));

        assert_eq!(tiles.to_string(), "%%..\n##=#\n.H..\n");

        assert!(matches!(
            Tiles::from_ascii("..x"),
            Err(Error::BadMapChar('x'))
        ));
    }

    #[test]
    fn setting_tiles() {
        let mut tiles = Tiles::new(3, 3);
        tiles.set(pos(1, 1), Fence);
        tiles.set(pos(5, 5), Fence);
        assert_eq!(tiles.get(pos(1, 1)), Some(Fence));
        assert!(tiles.in_bounds(pos(2, 2)));
        assert!(!tiles.in_bounds(pos(3, 0)));
        assert!(!tiles.in_bounds(pos(-1, 0)));
        assert_eq!(tiles.rows().count(), 3);
    }

    #[test]
    fn costs() {
        let table = CostTable::standard();
        for t in Terrain::iter() {
            assert!(table.cost(Some(t)) < table.cost(None));
        }
        assert!(table.cost(Some(Woodland)) < table.cost(Some(Grassland)));
        assert_eq!(table.with(Fence, 5).cost(Some(Fence)), 5);
    }
}
