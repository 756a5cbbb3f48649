//! Farm defense simulation core.
//!
//! Chickens live on a tile board during the day. At night foxes come in
//! from the edges of the board to hunt them and the chickens shoot back.

pub mod animal;
pub use animal::{AnimalId, DeathCue, Facing, Wound};

pub mod board;
pub use board::{Gameboard, NightStatus, Phase};

pub mod building;
pub use building::{Abode, Building, BuildingId, BuildingKind};

pub mod cache;
pub use cache::{Category, PositionCache};

pub mod chicken;
pub use chicken::{Chicken, Egg};

mod data;
pub use data::Settings;

mod error;
pub use error::{Error, LoadError};

pub mod fox;
pub use fox::{Fox, FoxKind, FoxState};

pub mod item;
pub use item::{Equipment, Item, ItemKind, Slot};

mod msg;
pub use msg::Msg;

pub mod pathing;

mod position;
pub use position::{pos, Position};

pub mod prelude;

pub mod registry;

pub mod save;
pub use save::SAVE_VERSION;

pub mod simplify;

mod terrain;
pub use terrain::{CostTable, Terrain, TileGrid, Tiles};

pub mod vision;
pub use vision::Vision;
