//! Foxes and their night time behavior.

use std::collections::VecDeque;

use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

use crate::{
    animal::{Animal, DeathCue, Wound},
    cache::{Category, PositionCache},
    pathing,
    prelude::*,
    CostTable, Msg, Terrain, TileGrid, Tiles,
};

/// How many past positions a fox avoids going back to.
pub const RECENT_MEMORY: usize = 3;

/// Ticks a common fox needs to dig through a fence.
pub const DIG_TICKS: u32 = 5;

#[derive(
    Copy,
    Clone,
    Eq,
    PartialEq,
    Hash,
    Debug,
    Serialize,
    Deserialize,
    Display,
    EnumIter,
    EnumString,
    IntoStaticStr,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum FoxKind {
    Fox,
    /// Very hard to see.
    NinjaFox,
    /// Blows fences up instead of digging under them.
    DemoFox,
    /// Keeps hunting after a catch until it's had its fill.
    GreedyFox,
    /// Can't be killed, lets its prey go and mends the fences behind it.
    Rinkhals,
}

/// What happens to a fence a fox gets through.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Breach {
    /// Leave a hole in the fence.
    Break,
    /// Leave a hole with a bang.
    Explode,
    /// Take the fence away altogether.
    Remove,
}

/// What a fox does with a chicken it catches.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Catch {
    Eat,
    /// Eat and keep hunting until appetite is met.
    Gorge,
    /// Let the chicken go unharmed.
    Release,
}

/// Everything that makes the fox kinds different.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct Strategy {
    pub stealth: i32,
    pub costs: CostTable,
    pub dig_ticks: u32,
    pub breach: Breach,
    pub catch: Catch,
    pub indestructible: bool,
}

impl Default for Strategy {
    fn default() -> Self {
        Strategy {
            stealth: 20,
            costs: CostTable::standard(),
            dig_ticks: DIG_TICKS,
            breach: Breach::Break,
            catch: Catch::Eat,
            indestructible: false,
        }
    }
}

impl FoxKind {
    pub fn strategy(self) -> Strategy {
        use FoxKind::*;
        match self {
            Fox => Default::default(),
            NinjaFox => Strategy {
                stealth: 60,
                ..Default::default()
            },
            DemoFox => Strategy {
                costs: CostTable::standard().with(Terrain::Fence, 10),
                dig_ticks: 0,
                breach: Breach::Explode,
                ..Default::default()
            },
            GreedyFox => Strategy {
                catch: Catch::Gorge,
                ..Default::default()
            },
            Rinkhals => Strategy {
                stealth: 80,
                costs: CostTable::standard().with(Terrain::Fence, 10),
                breach: Breach::Remove,
                catch: Catch::Release,
                indestructible: true,
                ..Default::default()
            },
        }
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum FoxState {
    Hunting,
    Retreating,
    /// Working through the fence at `at`, goes back to hunting or
    /// retreating when done.
    Digging {
        at: Position,
        ticks: u32,
        hunting: bool,
    },
    /// Made it home, can be taken off the board.
    Safe,
}

/// A chicken as seen by the foxes.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct Prey {
    pub id: AnimalId,
    pub position: Position,
    pub housed: bool,
}

/// Parts of the board a fox needs while moving.
pub struct Surroundings<'a> {
    pub tiles: &'a mut Tiles,
    pub cache: &'a mut PositionCache,
    pub prey: &'a [Prey],
    pub rng: &'a mut GameRng,
    /// Extra distance foxes see in chickens inside buildings.
    pub housed_penalty: i32,
    pub outbox: &'a mut Vec<Msg>,
}

#[derive(Clone, Eq, PartialEq, Debug)]
pub struct Fox {
    pub animal: Animal,
    pub kind: FoxKind,
    pub state: FoxState,
    /// Retreat waypoints, the spawn point at the bottom.
    pub landmarks: Vec<Position>,
    pub target: Option<AnimalId>,
    pub recent: VecDeque<Position>,
    /// Chickens caught tonight.
    pub eaten: u32,
}

impl std::ops::Deref for Fox {
    type Target = Animal;

    fn deref(&self) -> &Self::Target {
        &self.animal
    }
}

impl std::ops::DerefMut for Fox {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.animal
    }
}

impl Fox {
    pub fn new(id: AnimalId, kind: FoxKind, position: Position) -> Self {
        let mut animal = Animal::new(id, position);
        animal.death_cue = Some(DeathCue::Yelp);
        Fox {
            animal,
            kind,
            state: FoxState::Hunting,
            landmarks: vec![position],
            target: None,
            recent: Default::default(),
            eaten: 0,
        }
    }

    pub fn strategy(&self) -> Strategy {
        self.kind.strategy()
    }

    pub fn stealth(&self) -> i32 {
        self.strategy().stealth
    }

    pub fn is_hunting(&self) -> bool {
        self.state == FoxState::Hunting
    }

    pub fn is_safe(&self) -> bool {
        self.state == FoxState::Safe
    }

    /// Run one tick of movement.
    pub fn step(&mut self, env: &mut Surroundings) {
        match self.state {
            FoxState::Safe => return,
            FoxState::Digging { .. } => {
                self.dig(env);
                return;
            }
            _ => {}
        }

        if env.tiles.get(self.position) == Some(Terrain::Fence) {
            self.start_digging(env);
            return;
        }

        let Some(dest) = self.destination(env.prey, env.housed_penalty)
        else {
            return;
        };
        if let Some(step) = self.next_step(env, dest) {
            self.move_to(env, step);
        }
    }

    /// Where the fox wants to go, updates the state machine as needed.
    fn destination(
        &mut self,
        prey: &[Prey],
        housed_penalty: i32,
    ) -> Option<Position> {
        match self.state {
            FoxState::Hunting => {
                if let Some(p) = self.target.and_then(|t| find(prey, t)) {
                    return Some(p.position);
                }
                match self.nearest(prey, housed_penalty) {
                    Some(p) => {
                        log::debug!("{} targets {}", self.id, p.id);
                        self.target = Some(p.id);
                        Some(p.position)
                    }
                    None => {
                        log::debug!("{} finds nothing to hunt", self.id);
                        self.retreat();
                        None
                    }
                }
            }
            FoxState::Retreating => {
                while self.landmarks.len() > 1
                    && self.landmarks.last().map(|p| p.tile())
                        == Some(self.position.tile())
                {
                    self.landmarks.pop();
                }
                let last = *self.landmarks.last()?;
                let home_stretch = self.landmarks.len() == 1;
                if home_stretch && self.position.distance(&last) <= 1 {
                    log::debug!("{} made it home", self.id);
                    self.state = FoxState::Safe;
                    return None;
                }
                Some(last)
            }
            _ => None,
        }
    }

    /// Closest chicken, housed chickens count as `housed_penalty` further.
    ///
    /// The first of equally close chickens wins.
    fn nearest(&self, prey: &[Prey], housed_penalty: i32) -> Option<Prey> {
        prey.iter()
            .min_by_key(|p| {
                self.position.distance(&p.position)
                    + if p.housed { housed_penalty } else { 0 }
            })
            .copied()
    }

    fn next_step(
        &self,
        env: &mut Surroundings,
        dest: Position,
    ) -> Option<Position> {
        let from = self.position;
        let flat = dest.layer(from.z);

        let climb_down =
            from.z > dest.z || (from.z > 0 && from.tile() != dest.tile());

        let step = if climb_down {
            from.layer(from.z - 1)
        } else if from.tile() == dest.tile() {
            if from.z < dest.z {
                from.layer(from.z + 1)
            } else {
                return None;
            }
        } else if from.distance(&flat) < 2 {
            flat
        } else {
            *pathing::plan(&*env.tiles, &self.strategy().costs, from, dest)
                .first()?
        };

        // Climbing isn't held back by the recent trail.
        let blocked = if step.tile() == from.tile() {
            self.is_crowded(env.cache, step)
        } else {
            self.is_blocked(env.cache, step)
        };
        if blocked {
            self.detour(env, dest)
        } else {
            Some(step)
        }
    }

    fn is_crowded(&self, cache: &PositionCache, p: Position) -> bool {
        cache.get(p, Category::Fox).is_some_and(|id| id != self.id)
    }

    fn is_blocked(&self, cache: &PositionCache, p: Position) -> bool {
        self.is_crowded(cache, p) || self.recent.contains(&p)
    }

    /// Cheapest free neighbouring tile, ties broken randomly.
    ///
    /// A raised fox can only go back down, it never walks off a building
    /// in mid-air.
    fn detour(
        &self,
        env: &mut Surroundings,
        dest: Position,
    ) -> Option<Position> {
        if self.position.z > 0 {
            let down = self.position.layer(self.position.z - 1);
            return (!self.is_crowded(env.cache, down)).then_some(down);
        }
        let costs = self.strategy().costs;
        let options: Vec<(i32, Position)> = self
            .position
            .neighbours()
            .filter(|&p| !self.is_blocked(env.cache, p))
            .map(|p| (pathing::step_cost(&*env.tiles, &costs, p, dest), p))
            .collect();
        let best = options.iter().map(|(c, _)| *c).min()?;
        let best: Vec<Position> = options
            .into_iter()
            .filter(|(c, _)| *c == best)
            .map(|(_, p)| p)
            .collect();
        best.choose(env.rng).copied()
    }

    fn move_to(&mut self, env: &mut Surroundings, step: Position) {
        let old = self.position;
        if !env.cache.update(old, self.id, step, Category::Fox) {
            return;
        }
        self.face(step);
        self.position = step;
        self.recent.push_back(old);
        while self.recent.len() > RECENT_MEMORY {
            self.recent.pop_front();
        }

        if self.is_hunting() && env.tiles.get(step) == Some(Terrain::Fence) {
            self.landmarks.push(step);
        }
    }

    fn start_digging(&mut self, env: &mut Surroundings) {
        let at = self.position;
        let hunting = self.is_hunting();
        log::debug!("{} starts digging at {at}", self.id);
        self.state = FoxState::Digging {
            at,
            ticks: self.strategy().dig_ticks,
            hunting,
        };
        if self.strategy().dig_ticks == 0 {
            self.breach(env, at);
            self.resume(hunting);
        }
    }

    fn dig(&mut self, env: &mut Surroundings) {
        let FoxState::Digging { at, ticks, hunting } = self.state else {
            return;
        };

        if env.tiles.get(at) != Some(Terrain::Fence) {
            // Someone else got through first.
            self.resume(hunting);
            return;
        }

        let ticks = ticks.saturating_sub(1);
        if ticks == 0 {
            self.breach(env, at);
            self.resume(hunting);
        } else {
            self.state = FoxState::Digging { at, ticks, hunting };
        }
    }

    fn breach(&mut self, env: &mut Surroundings, at: Position) {
        let strategy = self.strategy();
        let (terrain, explosion) = match strategy.breach {
            Breach::Break => (Terrain::BrokenFence, false),
            Breach::Explode => (Terrain::BrokenFence, true),
            Breach::Remove => (Terrain::Grassland, false),
        };
        log::info!("{} {} breaches the fence at {at}", self.kind, self.id);
        env.tiles.set(at, terrain);
        env.outbox.push(Msg::Breach { at, explosion });
    }

    fn resume(&mut self, hunting: bool) {
        self.state = if hunting {
            FoxState::Hunting
        } else {
            FoxState::Retreating
        };
    }

    fn retreat(&mut self) {
        self.state = FoxState::Retreating;
        self.target = None;
    }

    /// The fox has caught a chicken.
    ///
    /// Returns whether the chicken gets bitten. Unless the fox is still
    /// hungry, it heads home afterwards.
    pub fn catch(&mut self) -> bool {
        self.target = None;
        self.recent.clear();
        match self.strategy().catch {
            Catch::Eat => {
                self.retreat();
                true
            }
            Catch::Gorge => true,
            Catch::Release => {
                self.retreat();
                false
            }
        }
    }

    /// Count a chicken actually eaten, a gorging fox leaves once full.
    pub fn fed(&mut self, appetite: u32) {
        if self.strategy().catch == Catch::Gorge {
            self.eaten += 1;
            if self.eaten >= appetite {
                self.retreat();
            }
        }
    }

    pub fn damage(&mut self) -> Wound {
        if self.strategy().indestructible {
            Wound::Shrugged
        } else {
            self.animal.damage()
        }
    }
}

fn find(prey: &[Prey], id: AnimalId) -> Option<Prey> {
    prey.iter().find(|p| p.id == id).copied()
}

#[cfg(test)]
mod test {
    use util::srng;

    use super::*;

    struct Bench {
        tiles: Tiles,
        cache: PositionCache,
        prey: Vec<Prey>,
        rng: GameRng,
        outbox: Vec<Msg>,
    }

    impl Bench {
        fn new(map: &str) -> Self {
            let tiles = Tiles::from_ascii(map).unwrap();
            let cache = PositionCache::new(tiles.size());
            Bench {
                tiles,
                cache,
                prey: Vec::new(),
                rng: srng(&1),
                outbox: Vec::new(),
            }
        }

        fn step(&mut self, fox: &mut Fox) {
            let mut env = Surroundings {
                tiles: &mut self.tiles,
                cache: &mut self.cache,
                prey: &self.prey,
                rng: &mut self.rng,
                housed_penalty: 5,
                outbox: &mut self.outbox,
            };
            fox.step(&mut env);
        }
    }

    #[test]
    fn nothing_to_hunt() {
        let mut bench = Bench::new("....\n....\n....");
        let mut fox = Fox::new(AnimalId(1), FoxKind::Fox, pos(1, 1));
        bench.step(&mut fox);
        assert_eq!(fox.state, FoxState::Retreating);
        assert_eq!(fox.position, pos(1, 1));
    }

    #[test]
    fn hunting_approaches_prey() {
        let mut bench = Bench::new(".......\n.......\n.......");
        bench.prey.push(Prey {
            id: AnimalId(9),
            position: pos(6, 1),
            housed: false,
        });
        let mut fox = Fox::new(AnimalId(1), FoxKind::Fox, pos(-1, 1));
        for _ in 0..7 {
            bench.step(&mut fox);
        }
        assert_eq!(fox.target, Some(AnimalId(9)));
        assert_eq!(fox.position, pos(6, 1));
        assert_eq!(fox.facing, crate::animal::Facing::Right);
        assert_eq!(bench.cache.get(pos(6, 1), Category::Fox), Some(fox.id));
        assert_eq!(fox.recent.len(), RECENT_MEMORY);
    }

    #[test]
    fn nearest_prefers_free_range() {
        let fox = Fox::new(AnimalId(1), FoxKind::Fox, pos(0, 0));
        let prey = [
            Prey {
                id: AnimalId(2),
                position: pos(2, 0),
                housed: true,
            },
            Prey {
                id: AnimalId(3),
                position: pos(4, 0),
                housed: false,
            },
            Prey {
                id: AnimalId(4),
                position: pos(0, 4),
                housed: false,
            },
        ];
        assert_eq!(fox.nearest(&prey, 0).map(|p| p.id), Some(AnimalId(2)));
        // Ties go to the first one.
        assert_eq!(fox.nearest(&prey, 5).map(|p| p.id), Some(AnimalId(3)));
    }

    #[test]
    fn digging_takes_time() {
        let mut bench = Bench::new("...\n.#.\n...");
        let mut fox = Fox::new(AnimalId(1), FoxKind::Fox, pos(1, 1));
        bench.step(&mut fox);
        assert!(matches!(fox.state, FoxState::Digging { .. }));
        for _ in 1..DIG_TICKS {
            bench.step(&mut fox);
            assert_eq!(bench.tiles.get(pos(1, 1)), Some(Terrain::Fence));
        }
        bench.step(&mut fox);
        assert_eq!(bench.tiles.get(pos(1, 1)), Some(Terrain::BrokenFence));
        assert_eq!(fox.state, FoxState::Hunting);
        assert_eq!(
            bench.outbox,
            vec![Msg::Breach {
                at: pos(1, 1),
                explosion: false
            }]
        );
    }

    #[test]
    fn sappers_blow_through() {
        let mut bench = Bench::new("...\n.#.\n...");
        let mut fox = Fox::new(AnimalId(1), FoxKind::DemoFox, pos(1, 1));
        bench.step(&mut fox);
        assert_eq!(bench.tiles.get(pos(1, 1)), Some(Terrain::BrokenFence));
        assert_eq!(fox.state, FoxState::Hunting);
        assert_eq!(
            bench.outbox,
            vec![Msg::Breach {
                at: pos(1, 1),
                explosion: true
            }]
        );
    }

    #[test]
    fn rinkhals_removes_fences() {
        let mut bench = Bench::new("...\n.#.\n...");
        let mut fox = Fox::new(AnimalId(1), FoxKind::Rinkhals, pos(1, 1));
        for _ in 0..=DIG_TICKS {
            bench.step(&mut fox);
        }
        assert_eq!(bench.tiles.get(pos(1, 1)), Some(Terrain::Grassland));
        assert_eq!(fox.damage(), Wound::Shrugged);
    }

    #[test]
    fn retreat_along_landmarks() {
        let mut bench = Bench::new(".....\n.....\n.....");
        let mut fox = Fox::new(AnimalId(1), FoxKind::Fox, pos(-1, 1));
        fox.position = pos(4, 1);
        fox.landmarks.push(pos(2, 0));
        fox.state = FoxState::Retreating;

        for _ in 0..10 {
            bench.step(&mut fox);
            if fox.is_safe() {
                break;
            }
        }
        assert!(fox.is_safe());
        assert_eq!(fox.landmarks, vec![pos(-1, 1)]);
        assert!(fox.position.distance(&pos(-1, 1)) <= 1);
    }

    #[test]
    fn hunting_through_fence_leaves_landmark() {
        let mut bench = Bench::new(
            "
            .#.
            .#.
            .#.",
        );
        bench.prey.push(Prey {
            id: AnimalId(9),
            position: pos(2, 1),
            housed: false,
        });
        let mut fox = Fox::new(AnimalId(1), FoxKind::Fox, pos(0, 1));
        bench.step(&mut fox);
        assert_eq!(fox.position, pos(1, 1));
        assert_eq!(fox.landmarks, vec![pos(0, 1), pos(1, 1)]);
        bench.step(&mut fox);
        assert!(matches!(fox.state, FoxState::Digging { .. }));
    }

    #[test]
    fn foxes_dont_stack() {
        let mut bench = Bench::new(".....\n.....\n.....");
        bench.prey.push(Prey {
            id: AnimalId(9),
            position: pos(2, 1),
            housed: false,
        });
        bench.cache.add(AnimalId(2), pos(2, 1), Category::Fox);
        let mut fox = Fox::new(AnimalId(1), FoxKind::Fox, pos(1, 1));
        bench.step(&mut fox);
        assert_ne!(fox.position, pos(2, 1));
        assert_eq!(fox.position.distance(&pos(1, 1)), 1);
    }

    #[test]
    fn climbing() {
        let mut bench = Bench::new("....\n.GG.\n.GG.");
        bench.prey.push(Prey {
            id: AnimalId(9),
            position: Position::new(1, 1, 1),
            housed: true,
        });
        let mut fox = Fox::new(AnimalId(1), FoxKind::Fox, pos(-2, -2));
        fox.position = pos(0, 0);
        bench.step(&mut fox);
        assert_eq!(fox.position, pos(1, 1));
        bench.step(&mut fox);
        assert_eq!(fox.position, Position::new(1, 1, 1));

        // Target gone, climb down on the way home.
        bench.prey.clear();
        fox.state = FoxState::Retreating;
        bench.step(&mut fox);
        assert_eq!(fox.position, pos(1, 1));
    }

    #[test]
    fn raised_fox_waits_for_room_below() {
        let mut bench = Bench::new("....\n.GG.\n.GG.");
        bench.cache.add(AnimalId(2), pos(1, 1), Category::Fox);
        let mut fox = Fox::new(AnimalId(1), FoxKind::Fox, pos(-2, -2));
        fox.position = Position::new(1, 1, 1);
        fox.state = FoxState::Retreating;

        for _ in 0..3 {
            bench.step(&mut fox);
            assert_eq!(fox.position, Position::new(1, 1, 1));
        }

        bench.cache.remove(pos(1, 1), Category::Fox);
        bench.step(&mut fox);
        assert_eq!(fox.position, pos(1, 1));
    }

    #[test]
    fn catching() {
        let mut fox = Fox::new(AnimalId(1), FoxKind::GreedyFox, pos(0, 0));
        fox.target = Some(AnimalId(2));
        assert!(fox.catch());
        assert!(fox.is_hunting());
        assert_eq!(fox.target, None);
        // Bite that didn't kill doesn't fill it up.
        assert!(fox.catch());
        assert!(fox.is_hunting());
        fox.fed(2);
        assert!(fox.is_hunting());
        fox.fed(2);
        assert_eq!(fox.eaten, 2);
        assert_eq!(fox.state, FoxState::Retreating);

        let mut fox = Fox::new(AnimalId(1), FoxKind::Rinkhals, pos(0, 0));
        assert!(!fox.catch());
        assert_eq!(fox.state, FoxState::Retreating);

        let mut fox = Fox::new(AnimalId(1), FoxKind::Fox, pos(0, 0));
        assert!(fox.catch());
        assert_eq!(fox.damage(), Wound::Killed);
    }
}
