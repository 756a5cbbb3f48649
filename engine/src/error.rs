use thiserror::Error;

use crate::{AnimalId, BuildingId, Position, Slot};

/// Recoverable failures of simulation commands.
///
/// Callers are expected to pick a fallback (another building, another tile)
/// or drop the request.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum Error {
    #[error("building {0} has no free places")]
    BuildingFull(BuildingId),

    #[error("{0} is already occupied")]
    SlotTaken(Slot),

    #[error("no building {0}")]
    UnknownBuilding(BuildingId),

    #[error("no animal {0}")]
    UnknownAgent(AnimalId),

    #[error("can't build at {0}")]
    BadPlacement(Position),

    #[error("invalid map character {0:?}")]
    BadMapChar(char),
}

/// Structural problems with persisted game data. Loading never applies
/// partial results when one of these comes up.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("save format version {found}, expected {expected}")]
    Version { found: u32, expected: u32 },

    #[error("unregistered type tag {0:?}")]
    UnregisteredTag(String),

    #[error("reference to unseen object #{0}")]
    DanglingReference(u32),

    #[error("object #{0} defined twice")]
    DuplicateIdentity(u32),

    #[error("type {tag:?} expects {expected} fields, got {found}")]
    FieldCount {
        tag: String,
        expected: usize,
        found: usize,
    },

    #[error("malformed {0}")]
    Schema(String),

    #[error(transparent)]
    Format(#[from] serde_json::Error),
}

/// Build a schema error from anything printable.
pub(crate) fn schema(what: impl std::fmt::Display) -> LoadError {
    LoadError::Schema(what.to_string())
}
