use serde::{Deserialize, Serialize};
use util::{IndexMap, Weighted};

use crate::fox::FoxKind;

/// Level tunables.
#[derive(Clone, Eq, PartialEq, Debug, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Settings {
    /// The night ends at dawn after this many ticks even if there are
    /// foxes left.
    pub max_night_ticks: u32,
    pub min_foxes: u32,
    pub max_foxes: u32,
    /// Relative spawn frequency of each fox kind.
    pub fox_weights: IndexMap<FoxKind, u32>,
    pub egg_price: i64,
    /// Days an egg needs to hatch.
    pub egg_hatch_days: u32,
    pub starting_cash: i64,
    pub starting_wood: u32,
    /// Chickens a greedy fox catches before going home.
    pub greedy_appetite: u32,
    /// Extra distance foxes see in chickens inside buildings.
    pub housed_prey_penalty: i32,
}

impl Default for Settings {
    fn default() -> Self {
        use FoxKind::*;
        Settings {
            max_night_ticks: 150,
            min_foxes: 3,
            max_foxes: 6,
            fox_weights: [
                (Fox, 60),
                (NinjaFox, 15),
                (DemoFox, 10),
                (GreedyFox, 10),
                (Rinkhals, 5),
            ]
            .into_iter()
            .collect(),
            egg_price: 5,
            egg_hatch_days: 2,
            starting_cash: 100,
            starting_wood: 10,
            greedy_appetite: 3,
            housed_prey_penalty: 5,
        }
    }
}

impl Settings {
    /// Parse settings written in IDM.
    pub fn from_idm(s: &str) -> Result<Self, idm::Error> {
        idm::from_str(s)
    }

    /// Weighted selector for spawning foxes, `None` if every weight is
    /// zero.
    pub fn fox_spawns(&self) -> Option<Weighted<FoxKind>> {
        Weighted::new(self.fox_weights.iter().map(|(&k, &w)| (k, w)))
    }
}
