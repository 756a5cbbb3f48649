//! Farm buildings that house chickens and modify what they can do.
use std::fmt;

use glam::{ivec2, IVec2};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

use crate::{prelude::*, Error, Terrain};

/// Agent and weapon parameters that a building can modify for its
/// occupants.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Param {
    VisionBonus,
    VisionRangePenalty,
    GunRange,
    GunBaseHit,
    GunRangePenalty,
    KnifeRange,
    KnifeBaseHit,
    KnifeRangePenalty,
    AxeRange,
    AxeBaseHit,
    AxeRangePenalty,
}

/// How a building changes a parameter.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Modifier {
    Add(i32),
    Set(i32),
}

impl Modifier {
    pub fn apply(self, value: i32) -> i32 {
        match self {
            Modifier::Add(n) => value + n,
            Modifier::Set(n) => n,
        }
    }
}

#[derive(
    Copy,
    Clone,
    Eq,
    PartialEq,
    Hash,
    Debug,
    Serialize,
    Deserialize,
    Display,
    EnumIter,
    EnumString,
    IntoStaticStr,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum BuildingKind {
    Henhouse,
    Hendominium,
    Guardtower,
}

use BuildingKind::*;
use Modifier::*;
use Param::*;

impl BuildingKind {
    pub fn size(self) -> IVec2 {
        match self {
            Henhouse => ivec2(3, 2),
            Hendominium => ivec2(2, 2),
            Guardtower => ivec2(2, 2),
        }
    }

    /// Layer of the lowest floor.
    pub fn first_floor(self) -> i32 {
        match self {
            Guardtower => 1,
            _ => 0,
        }
    }

    pub fn floors(self) -> i32 {
        match self {
            Hendominium => 2,
            _ => 1,
        }
    }

    /// Number of places for occupants.
    pub fn capacity(self) -> usize {
        let size = self.size();
        (size.x * size.y * self.floors()) as usize
    }

    pub fn terrain(self) -> Terrain {
        match self {
            Henhouse => Terrain::Henhouse,
            Hendominium => Terrain::Hendominium,
            Guardtower => Terrain::Guardtower,
        }
    }

    /// Do chickens housed here lay eggs.
    pub fn lays_eggs(self) -> bool {
        matches!(self, Henhouse | Hendominium)
    }

    pub fn modifiers(self) -> &'static [(Param, Modifier)] {
        match self {
            // Stuffy and dark, and no room to swing a knife.
            Henhouse | Hendominium => &[
                (VisionBonus, Add(-10)),
                (GunBaseHit, Add(-10)),
                (KnifeRange, Set(0)),
                (AxeRange, Set(0)),
            ],
            // High up with a clear view.
            Guardtower => &[
                (VisionBonus, Add(10)),
                (VisionRangePenalty, Add(-5)),
                (GunRange, Add(2)),
                (GunRangePenalty, Add(-5)),
                (KnifeRange, Set(0)),
                (AxeRange, Set(0)),
            ],
        }
    }

    pub fn modify(self, param: Param, value: i32) -> i32 {
        self.modifiers()
            .iter()
            .filter(|(p, _)| *p == param)
            .fold(value, |v, (_, m)| m.apply(v))
    }
}

/// Apply the modifiers of the building an agent is in to a parameter.
///
/// Agents outside any building get the base value.
pub fn modified(abode: Option<BuildingKind>, param: Param, value: i32) -> i32 {
    match abode {
        Some(kind) => kind.modify(param, value),
        None => value,
    }
}

/// Index of a building on the board.
#[derive(
    Copy,
    Clone,
    Eq,
    PartialEq,
    Ord,
    PartialOrd,
    Hash,
    Debug,
    Serialize,
    Deserialize,
)]
pub struct BuildingId(pub(crate) u32);

impl fmt::Display for BuildingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "b{}", self.0)
    }
}

/// Non-owning link from an agent to its place in a building.
#[derive(
    Copy, Clone, Eq, PartialEq, Hash, Debug, Serialize, Deserialize,
)]
pub struct Abode {
    pub building: BuildingId,
    pub place: usize,
}

/// A building standing on the board.
///
/// The building owns its places, occupants are referred to by id.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct Building {
    pub(crate) id: BuildingId,
    pub(crate) kind: BuildingKind,
    /// Top left corner of the footprint.
    pub(crate) origin: Position,
    pub(crate) places: Vec<Option<AnimalId>>,
}

impl Building {
    pub fn new(id: BuildingId, kind: BuildingKind, origin: Position) -> Self {
        Building {
            id,
            kind,
            origin: origin.layer(0),
            places: vec![None; kind.capacity()],
        }
    }

    pub fn id(&self) -> BuildingId {
        self.id
    }

    pub fn kind(&self) -> BuildingKind {
        self.kind
    }

    pub fn origin(&self) -> Position {
        self.origin
    }

    /// Ground tiles covered by the building.
    pub fn footprint(&self) -> impl Iterator<Item = Position> {
        let (o, size) = (self.origin, self.kind.size());
        (0..size.y).flat_map(move |y| (0..size.x).map(move |x| o + ivec2(x, y)))
    }

    pub fn covers(&self, p: Position) -> bool {
        let size = self.kind.size();
        let d = p - self.origin;
        (0..size.x).contains(&d.x) && (0..size.y).contains(&d.y)
    }

    /// Board position of a place.
    ///
    /// Places fill each floor's footprint row by row, floors bottom up.
    pub fn place_position(&self, place: usize) -> Position {
        let size = self.kind.size();
        let area = (size.x * size.y) as usize;
        let (floor, cell) = ((place / area) as i32, (place % area) as i32);
        let p = self.origin + ivec2(cell % size.x, cell / size.x);
        p.layer(self.kind.first_floor() + floor)
    }

    pub fn occupants(&self) -> impl Iterator<Item = AnimalId> + '_ {
        self.places.iter().filter_map(|a| *a)
    }

    pub fn is_full(&self) -> bool {
        self.places.iter().all(|a| a.is_some())
    }

    /// Put an agent in the first free place.
    pub fn admit(&mut self, id: AnimalId) -> Result<Abode> {
        let place = self
            .places
            .iter()
            .position(|a| a.is_none())
            .ok_or(Error::BuildingFull(self.id))?;
        self.places[place] = Some(id);
        Ok(Abode {
            building: self.id,
            place,
        })
    }

    /// Vacate whatever place the agent has.
    pub fn release(&mut self, id: AnimalId) {
        for a in self.places.iter_mut() {
            if *a == Some(id) {
                *a = None;
            }
        }
    }
}
