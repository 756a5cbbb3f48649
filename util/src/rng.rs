use std::{fmt, hash::Hash};
use std::{hash::Hasher, str::FromStr};

use anyhow::bail;
use derive_more::Deref;
use rand::prelude::*;

use crate::GameRng;

/// Construct a random number generator seeded by a hashable noise value.
///
/// Good for reproducible runs given a seed value like a command-line
/// passphrase or a fixed test number.
pub fn srng(seed: &(impl Hash + ?Sized)) -> GameRng {
    let mut h = crate::FastHasher::default();
    seed.hash(&mut h);
    GameRng::seed_from_u64(h.finish())
}

/// Strings that are normalized to be case, whitespace and punctuation
/// insensitive. Use as RNG seeds so that trivial transcription errors like an
/// added space can't mess up the seed.
///
/// ```
/// # use util::{Logos, srng};
/// use rand::prelude::*;
///
/// assert_eq!(
///   srng(&Logos::new("Red Hen")).gen_range(0..1000),
///   srng(&Logos::new("redhen")).gen_range(0..1000));
///
/// assert_ne!(
///   srng(&Logos::new("Red Hen 2")).gen_range(0..1000),
///   srng(&Logos::new("redhen")).gen_range(0..1000));
/// ```
#[derive(
    Clone, Debug, Default, Eq, PartialEq, Hash, Ord, PartialOrd, Deref,
)]
pub struct Logos(String);

impl fmt::Display for Logos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromIterator<char> for Logos {
    fn from_iter<T: IntoIterator<Item = char>>(iter: T) -> Self {
        const MAX_LEN: usize = 64;

        Logos(
            iter.into_iter()
                .map(|c| c.to_ascii_uppercase())
                .filter(char::is_ascii_alphanumeric)
                .take(MAX_LEN)
                .collect(),
        )
    }
}

impl Logos {
    /// Construct a new logos, stripping out punctuation, whitespace,
    /// character case and non-ASCII characters from the input.
    pub fn new(s: impl AsRef<str>) -> Self {
        s.as_ref().chars().collect()
    }

    /// Generate a random logos of `len` characters.
    pub fn sample<R: Rng + ?Sized>(rng: &mut R, len: usize) -> Logos {
        (0..len)
            .map(|_| {
                *b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ"
                    .choose(rng)
                    .expect("alphabet is not empty") as char
            })
            .collect()
    }

    /// Numeric seed derived from the logos.
    pub fn seed(&self) -> u64 {
        srng(self).gen()
    }
}

impl FromStr for Logos {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if !s
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
        {
            bail!("not a valid logos")
        } else {
            Ok(Logos(s.into()))
        }
    }
}

pub trait RngExt {
    /// Roll a percentile die, uniform in 1..=100.
    fn d100(&mut self) -> i32;
}

impl<T: Rng + ?Sized> RngExt for T {
    fn d100(&mut self) -> i32 {
        self.gen_range(1..=100)
    }
}
