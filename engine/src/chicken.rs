//! The player's chickens.

use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::{
    animal::{Animal, DeathCue, Wound},
    building::BuildingKind,
    item::ItemKind,
    prelude::*,
    vision::Vision,
    TileGrid, Terrain,
};

/// An egg under a chicken, hatches when the timer runs out.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Serialize, Deserialize)]
pub struct Egg {
    pub timer: u32,
}

/// A fox a chicken could shoot at.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct Quarry {
    pub id: AnimalId,
    pub position: Position,
    pub stealth: i32,
}

#[derive(Clone, Eq, PartialEq, Debug)]
pub struct Chicken {
    pub animal: Animal,
    /// Oldest egg first.
    pub eggs: Vec<Egg>,
}

impl std::ops::Deref for Chicken {
    type Target = Animal;

    fn deref(&self) -> &Self::Target {
        &self.animal
    }
}

impl std::ops::DerefMut for Chicken {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.animal
    }
}

impl Chicken {
    pub fn new(id: AnimalId, position: Position) -> Self {
        let mut animal = Animal::new(id, position);
        animal.death_cue = Some(DeathCue::Squawk);
        Chicken {
            animal,
            eggs: Vec::new(),
        }
    }

    /// Lay a clutch of one to four eggs.
    ///
    /// Does nothing if the chicken is still sitting on earlier eggs.
    /// Returns the number of eggs laid.
    pub fn lay(&mut self, rng: &mut impl Rng, hatch_days: u32) -> usize {
        if !self.eggs.is_empty() {
            return 0;
        }
        let n = rng.gen_range(1..=4);
        self.eggs = vec![Egg { timer: hatch_days }; n];
        if !self.equipment.has(ItemKind::NestEgg) {
            let placed = self.animal.equipment.equip(ItemKind::NestEgg);
            debug_assert!(placed.is_ok(), "nest slot only holds the marker");
        }
        log::debug!("{} laid {n} eggs", self.id);
        n
    }

    /// Advance the oldest egg by a day.
    ///
    /// When it hatches, the rest of the clutch goes to `sell` and the new
    /// chick is returned with the given identity. The caller needs to put
    /// the chick on the board.
    pub fn hatch(
        &mut self,
        id: AnimalId,
        mut sell: impl FnMut(Egg),
    ) -> Option<Chicken> {
        let oldest = self.eggs.first_mut()?;
        oldest.timer = oldest.timer.saturating_sub(1);
        if oldest.timer > 0 {
            return None;
        }

        self.eggs.remove(0);
        for egg in self.eggs.drain(..) {
            sell(egg);
        }
        self.animal.equipment.unequip(ItemKind::NestEgg.slot());
        log::debug!("{} hatched {id}", self.id);
        Some(Chicken::new(id, self.position))
    }

    /// Shoot at a random visible fox within reach of the first weapon.
    ///
    /// Returns the fox that got hit.
    pub fn attack(
        &mut self,
        rng: &mut impl Rng,
        building: Option<BuildingKind>,
        foxes: &[Quarry],
    ) -> Option<AnimalId> {
        let position = self.position;
        let weapon = self.animal.equipment.weapon_mut()?;
        let vision = Vision::new(building);

        let targets: Vec<&Quarry> = foxes
            .iter()
            .filter(|q| {
                weapon.in_range(building, position.distance(&q.position))
            })
            .filter(|q| vision.sees(rng, position, q.position, q.stealth))
            .collect();
        let target = **targets.choose(rng)?;

        let distance = position.distance(&target.position);
        let hit = weapon.hit(rng, building, distance);
        self.face(target.position);
        hit.then_some(target.id)
    }

    /// Gather wood from the trees around the chicken.
    pub fn chop(&self, rng: &mut impl Rng, tiles: &impl TileGrid) -> u32 {
        if self.is_housed() || !self.equipment.has(ItemKind::Axe) {
            return 0;
        }
        let trees = self
            .position
            .neighbours()
            .filter(|&p| tiles.get(p) == Some(Terrain::Woodland))
            .count() as u32;
        rng.gen_range(0..=trees)
    }

    pub fn damage(&mut self) -> Wound {
        self.animal.damage()
    }
}
