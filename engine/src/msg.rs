//! Notifications about game events for the UI layer.

use crate::{animal::DeathCue, prelude::*};

/// Events the embedding UI may want to show.
///
/// Economy messages carry the new total.
#[derive(Clone, Eq, PartialEq, Debug)]
pub enum Msg {
    Cash(i64),
    Wood(u32),
    Eggs(usize),
    Chickens(usize),
    KilledFoxes(u32),

    /// An animal died, play its cue.
    Death { at: Position, cue: DeathCue },

    /// A fox got through a fence.
    Breach { at: Position, explosion: bool },
}
