use glam::IVec2;
use serde::{Deserialize, Serialize};

use crate::prelude::*;

/// Which index of the position cache an agent lives in.
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
#[serde(rename_all = "kebab-case")]
pub enum Category {
    Chicken,
    Fox,
}

/// Spatial index, used for efficiently finding the agent standing at a
/// position.
///
/// Only positions on the board are indexed, agents walking around outside
/// the board edges are not tracked. There is at most one agent per category
/// at any position.
#[derive(Clone, Default, Eq, PartialEq, Debug)]
pub struct PositionCache {
    size: IVec2,
    entries: HashMap<(Category, Position), AnimalId>,
}

impl PositionCache {
    /// Create an empty cache for a board of the given size.
    pub fn new(size: IVec2) -> Self {
        PositionCache {
            size,
            entries: Default::default(),
        }
    }

    fn covers(&self, p: Position) -> bool {
        (0..self.size.x).contains(&p.x) && (0..self.size.y).contains(&p.y)
    }

    pub fn get(&self, p: Position, cat: Category) -> Option<AnimalId> {
        self.entries.get(&(cat, p)).copied()
    }

    /// Index an agent at a position.
    ///
    /// Does nothing if the position is off the board. Refuses to displace a
    /// different agent already indexed at the position and returns false
    /// then.
    pub fn add(&mut self, id: AnimalId, p: Position, cat: Category) -> bool {
        if !self.covers(p) {
            return true;
        }

        match self.entries.get(&(cat, p)) {
            Some(&other) if other != id => {
                log::warn!(
                    "PositionCache::add: {id} collides with {other} at {p}"
                );
                false
            }
            _ => {
                self.entries.insert((cat, p), id);
                true
            }
        }
    }

    pub fn remove(&mut self, p: Position, cat: Category) {
        self.entries.remove(&(cat, p));
    }

    /// Move an agent's index entry from `old` to `new` in one operation.
    ///
    /// If a different agent holds `new`, nothing changes and the result is
    /// false.
    pub fn update(
        &mut self,
        old: Position,
        id: AnimalId,
        new: Position,
        cat: Category,
    ) -> bool {
        if let Some(other) = self.get(new, cat).filter(|&other| other != id) {
            log::warn!(
                "PositionCache::update: {id} blocked by {other} at {new}"
            );
            return false;
        }
        if self.get(old, cat) == Some(id) {
            self.remove(old, cat);
        }
        self.add(id, new, cat)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod test {
    use glam::ivec2;
    use quickcheck_macros::quickcheck;

    use super::*;
    use Category::*;

    #[test]
    fn basic_ops() {
        let mut cache = PositionCache::new(ivec2(5, 5));
        let (a, b) = (AnimalId(1), AnimalId(2));

        assert!(cache.add(a, pos(1, 1), Chicken));
        assert!(cache.add(b, pos(1, 1), Fox));
        assert_eq!(cache.get(pos(1, 1), Chicken), Some(a));
        assert_eq!(cache.get(pos(1, 1), Fox), Some(b));

        // Off the board is a silent no-op.
        assert!(cache.add(a, pos(-1, 3), Chicken));
        assert_eq!(cache.get(pos(-1, 3), Chicken), None);
        assert_eq!(cache.len(), 2);

        // Can't pile two foxes on one tile.
        assert!(!cache.add(AnimalId(3), pos(1, 1), Fox));
        assert_eq!(cache.get(pos(1, 1), Fox), Some(b));

        cache.remove(pos(4, 4), Fox);
        cache.remove(pos(1, 1), Fox);
        assert_eq!(cache.get(pos(1, 1), Fox), None);

        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn update_moves_entry() {
        let mut cache = PositionCache::new(ivec2(5, 5));
        let a = AnimalId(1);
        cache.add(a, pos(0, 0), Fox);
        cache.update(pos(0, 0), a, pos(1, 0), Fox);
        assert_eq!(cache.get(pos(0, 0), Fox), None);
        assert_eq!(cache.get(pos(1, 0), Fox), Some(a));

        // Walking off the board drops the entry.
        cache.update(pos(1, 0), a, pos(1, -1), Fox);
        assert!(cache.is_empty());

        // And walking back on restores it.
        cache.update(pos(1, -1), a, pos(1, 0), Fox);
        assert_eq!(cache.get(pos(1, 0), Fox), Some(a));
    }

    #[test]
    fn update_leaves_other_agents_alone() {
        let mut cache = PositionCache::new(ivec2(5, 5));
        let (a, b) = (AnimalId(1), AnimalId(2));
        cache.add(b, pos(2, 2), Fox);
        // Stale old position claim for a doesn't evict b.
        cache.update(pos(2, 2), a, pos(3, 3), Fox);
        assert_eq!(cache.get(pos(2, 2), Fox), Some(b));
        assert_eq!(cache.get(pos(3, 3), Fox), Some(a));
    }

    #[test]
    fn failed_update_keeps_old_entry() {
        let mut cache = PositionCache::new(ivec2(5, 5));
        let (a, b) = (AnimalId(1), AnimalId(2));
        cache.add(a, pos(0, 0), Fox);
        cache.add(b, pos(1, 0), Fox);

        assert!(!cache.update(pos(0, 0), a, pos(1, 0), Fox));
        assert_eq!(cache.get(pos(0, 0), Fox), Some(a));
        assert_eq!(cache.get(pos(1, 0), Fox), Some(b));
        assert_eq!(cache.len(), 2);
    }

    #[quickcheck]
    fn updates_leave_no_stale_entries(moves: Vec<(u8, i8, i8)>) -> bool {
        const SIZE: i32 = 6;
        let mut cache = PositionCache::new(ivec2(SIZE, SIZE));
        let mut model: HashMap<AnimalId, Position> = Default::default();

        for (i, x, y) in moves {
            let id = AnimalId(i as u32 % 4);
            // Include some off-board positions.
            let new = pos(x as i32 % (SIZE + 2), y as i32 % (SIZE + 2));
            if model.iter().any(|(&e, &p)| e != id && p == new) {
                continue;
            }

            match model.get(&id).copied() {
                Some(old) => {
                    cache.update(old, id, new, Fox);
                    if old != new && cache.get(old, Fox) == Some(id) {
                        return false;
                    }
                }
                None => {
                    cache.add(id, new, Fox);
                }
            }
            model.insert(id, new);

            let on_board = (0..SIZE).contains(&new.x)
                && (0..SIZE).contains(&new.y);
            if on_board && cache.get(new, Fox) != Some(id) {
                return false;
            }
        }

        // Every entry in the cache matches the model exactly.
        let indexed =
            model.values().filter(|p| cache.covers(**p)).count();
        indexed == cache.len()
            && model
                .iter()
                .filter(|(_, p)| cache.covers(**p))
                .all(|(&id, &p)| cache.get(p, Fox) == Some(id))
    }
}
