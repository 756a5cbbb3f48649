//! Parts shared by every kind of animal on the farm.

use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};

use crate::{building::Abode, item::Equipment, prelude::*};

/// Identity of an animal, unique across chickens and foxes on one board.
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
pub struct AnimalId(pub(crate) u32);

impl fmt::Display for AnimalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(
    Copy,
    Clone,
    Default,
    Eq,
    PartialEq,
    Debug,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    IntoStaticStr,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum Facing {
    #[default]
    Left,
    Right,
}

/// Sound and sprite effect shown when an animal dies.
#[derive(
    Copy,
    Clone,
    Eq,
    PartialEq,
    Debug,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    IntoStaticStr,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum DeathCue {
    Squawk,
    Yelp,
}

/// Result of taking a hit.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Wound {
    /// Armour took the hit.
    Absorbed,
    /// Nothing happened.
    Shrugged,
    Killed,
}

impl Wound {
    pub fn is_fatal(self) -> bool {
        self == Wound::Killed
    }
}

#[derive(Clone, Eq, PartialEq, Debug)]
pub struct Animal {
    pub(crate) id: AnimalId,
    pub position: Position,
    pub facing: Facing,
    pub equipment: Equipment,
    /// Place in a building if the animal is housed.
    pub abode: Option<Abode>,
    pub death_cue: Option<DeathCue>,
}

impl Animal {
    pub fn new(id: AnimalId, position: Position) -> Self {
        Animal {
            id,
            position,
            facing: Default::default(),
            equipment: Default::default(),
            abode: None,
            death_cue: None,
        }
    }

    pub fn id(&self) -> AnimalId {
        self.id
    }

    pub fn is_housed(&self) -> bool {
        self.abode.is_some()
    }

    /// Turn to face a position. Facing stays put if the position is
    /// straight above or below.
    pub fn face(&mut self, target: Position) {
        if target.left_of(&self.position) {
            self.facing = Facing::Left;
        } else if target.right_of(&self.position) {
            self.facing = Facing::Right;
        }
    }

    /// Take a hit, armour absorbs it if there's any left.
    pub fn damage(&mut self) -> Wound {
        let Some(armour) = self.equipment.armour_mut() else {
            return Wound::Killed;
        };
        if !armour.wear() {
            let slot = armour.kind.slot();
            log::debug!("{}'s armour is worn through", self.id);
            self.equipment.unequip(slot);
        }
        Wound::Absorbed
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::item::{ItemKind, Slot};

    #[test]
    fn facing() {
        let mut a = Animal::new(AnimalId(1), pos(5, 5));
        a.face(pos(6, 0));
        assert_eq!(a.facing, Facing::Right);
        a.face(pos(5, 9));
        assert_eq!(a.facing, Facing::Right);
        a.face(pos(4, 5));
        assert_eq!(a.facing, Facing::Left);
    }

    #[test]
    fn armour_absorbs_damage() {
        let mut a = Animal::new(AnimalId(1), pos(0, 0));
        a.equipment.equip(ItemKind::Kevlar).unwrap();
        assert_eq!(a.damage(), Wound::Absorbed);
        assert!(a.equipment.get(Slot::Body).is_some());
        assert_eq!(a.damage(), Wound::Absorbed);
        assert!(a.equipment.get(Slot::Body).is_none());
        assert!(a.damage().is_fatal());
    }
}
