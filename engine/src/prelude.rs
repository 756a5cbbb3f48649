pub use crate::{pos, AnimalId, Position};
pub use glam::{ivec2, IVec2};
pub use rand::Rng;
pub use util::{GameRng, HashMap, HashSet, IndexMap, IndexSet};

pub type Result<T, E = crate::Error> = std::result::Result<T, E>;
