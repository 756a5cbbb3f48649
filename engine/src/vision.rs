//! Stealth rolls.

use util::RngExt;

use crate::{
    building::{modified, BuildingKind, Param},
    prelude::*,
};

/// Vision bonus of a watcher out in the open.
pub const BASE_VISION_BONUS: i32 = 0;

/// How much each tile of distance beyond the first makes spotting harder.
pub const BASE_VISION_RANGE_PENALTY: i32 = 10;

/// Vision numbers of a watcher after building modifiers.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct Vision {
    pub bonus: i32,
    pub range_penalty: i32,
}

impl Vision {
    pub fn new(abode: Option<BuildingKind>) -> Self {
        Vision {
            bonus: modified(abode, Param::VisionBonus, BASE_VISION_BONUS),
            range_penalty: modified(
                abode,
                Param::VisionRangePenalty,
                BASE_VISION_RANGE_PENALTY,
            ),
        }
    }

    /// The d100 roll must go over this for the watchee to be seen.
    ///
    /// Not clamped, a negative threshold means the watchee is always seen.
    pub fn threshold(&self, stealth: i32, distance: i32) -> i32 {
        stealth - self.bonus + self.range_penalty * (distance - 1)
    }

    pub fn sees_with_roll(&self, roll: i32, stealth: i32, distance: i32) -> bool {
        roll > self.threshold(stealth, distance)
    }

    /// Roll to see if a watchee with the given stealth is spotted.
    pub fn sees(
        &self,
        rng: &mut impl Rng,
        watcher: Position,
        watchee: Position,
        stealth: i32,
    ) -> bool {
        let distance = watcher.distance(&watchee);
        self.sees_with_roll(rng.d100(), stealth, distance)
    }
}
