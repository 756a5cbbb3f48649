//! The game board and the day and night phases played on it.

use rand::seq::SliceRandom;
use util::{srng, PlottedDistribution};

use crate::{
    building::{Abode, Building, BuildingId, BuildingKind},
    cache::{Category, PositionCache},
    chicken::{Chicken, Quarry},
    fox::{Fox, FoxKind, Prey, Surroundings},
    item::ItemKind,
    prelude::*,
    Error, Msg, Settings, TileGrid, Tiles,
};

#[derive(Copy, Clone, Default, Eq, PartialEq, Debug)]
pub enum Phase {
    #[default]
    Day,
    Night,
}

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum NightStatus {
    Ongoing,
    Over,
}

/// Complete state of a farm.
#[derive(Clone, Debug)]
pub struct Gameboard {
    pub(crate) settings: Settings,
    pub(crate) tiles: Tiles,
    pub(crate) buildings: Vec<Building>,
    /// Chickens in the order they arrived on the farm.
    pub(crate) chickens: IndexMap<AnimalId, Chicken>,
    /// Foxes in spawn order, they also move in this order.
    pub(crate) foxes: IndexMap<AnimalId, Fox>,
    pub(crate) cache: PositionCache,
    pub(crate) cash: i64,
    pub(crate) wood: u32,
    pub(crate) killed_foxes: u32,
    pub(crate) day: u32,
    pub(crate) phase: Phase,
    pub(crate) night_ticks: u32,
    pub(crate) next_id: u32,
    pub(crate) seed: u64,
    rng: GameRng,
    outbox: Vec<Msg>,
}

impl Gameboard {
    pub fn new(tiles: Tiles, settings: Settings, seed: u64) -> Self {
        let cache = PositionCache::new(tiles.size());
        let mut ret = Gameboard {
            cash: settings.starting_cash,
            wood: settings.starting_wood,
            settings,
            tiles,
            buildings: Default::default(),
            chickens: Default::default(),
            foxes: Default::default(),
            cache,
            killed_foxes: 0,
            day: 1,
            phase: Phase::Day,
            night_ticks: 0,
            next_id: 1,
            seed,
            rng: srng(&seed),
            outbox: Default::default(),
        };
        ret.reseed();
        ret
    }

    /// Board from a map in terrain characters.
    ///
    /// Building characters in the map are plain terrain, use
    /// `add_building` for working buildings.
    pub fn from_ascii(
        map: &str,
        settings: Settings,
        seed: u64,
    ) -> Result<Self> {
        Ok(Gameboard::new(Tiles::from_ascii(map)?, settings, seed))
    }

    /// Restart the random number generator from the board's seed and the
    /// point in time on the board.
    pub(crate) fn reseed(&mut self) {
        let phase = self.phase == Phase::Night;
        self.rng = srng(&(self.seed, self.day, phase, self.night_ticks));
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn tiles(&self) -> &Tiles {
        &self.tiles
    }

    pub fn cache(&self) -> &PositionCache {
        &self.cache
    }

    pub fn cash(&self) -> i64 {
        self.cash
    }

    pub fn wood(&self) -> u32 {
        self.wood
    }

    pub fn killed_foxes(&self) -> u32 {
        self.killed_foxes
    }

    pub fn day(&self) -> u32 {
        self.day
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn night_ticks(&self) -> u32 {
        self.night_ticks
    }

    /// Total number of eggs on the farm.
    pub fn eggs(&self) -> usize {
        self.chickens.values().map(|c| c.eggs.len()).sum()
    }

    pub fn buildings(&self) -> impl Iterator<Item = &Building> {
        self.buildings.iter()
    }

    pub fn building(&self, id: BuildingId) -> Option<&Building> {
        self.buildings.get(id.0 as usize)
    }

    pub fn chickens(&self) -> impl Iterator<Item = &Chicken> {
        self.chickens.values()
    }

    pub fn chicken(&self, id: AnimalId) -> Option<&Chicken> {
        self.chickens.get(&id)
    }

    pub fn foxes(&self) -> impl Iterator<Item = &Fox> {
        self.foxes.values()
    }

    pub fn fox(&self, id: AnimalId) -> Option<&Fox> {
        self.foxes.get(&id)
    }

    /// Take the notifications accumulated since the last call.
    pub fn drain_messages(&mut self) -> Vec<Msg> {
        std::mem::take(&mut self.outbox)
    }

    fn notify(&mut self, msg: Msg) {
        log::debug!("{msg:?}");
        self.outbox.push(msg);
    }

    fn new_id(&mut self) -> AnimalId {
        let ret = AnimalId(self.next_id);
        self.next_id += 1;
        ret
    }

    fn building_kind(&self, abode: Option<Abode>) -> Option<BuildingKind> {
        abode
            .and_then(|a| self.building(a.building))
            .map(|b| b.kind)
    }

    /// Can an animal be put down on an open tile at position.
    fn is_open(&self, p: Position) -> bool {
        p.z == 0
            && matches!(
                self.tiles.get(p),
                Some(t) if !t.is_building() && !t.is_fence()
            )
            && self.cache.get(p, Category::Chicken).is_none()
    }

    /// Put up a building with its top left corner at `origin`.
    pub fn add_building(
        &mut self,
        kind: BuildingKind,
        origin: Position,
    ) -> Result<BuildingId> {
        let id = BuildingId(self.buildings.len() as u32);
        let building = Building::new(id, kind, origin);
        if !building
            .footprint()
            .all(|p| self.tiles.get(p).is_some_and(|t| t.is_buildable()))
            || building
                .footprint()
                .any(|p| self.cache.get(p, Category::Chicken).is_some())
        {
            return Err(Error::BadPlacement(origin));
        }

        for p in building.footprint() {
            self.tiles.set(p, kind.terrain());
        }
        log::info!("built {kind} {id} at {origin}");
        self.buildings.push(building);
        Ok(id)
    }

    /// Put a new chicken on an open tile.
    pub fn add_chicken(&mut self, p: Position) -> Result<AnimalId> {
        if !self.is_open(p) {
            return Err(Error::BadPlacement(p));
        }
        let id = self.new_id();
        self.cache.add(id, p, Category::Chicken);
        self.chickens.insert(id, Chicken::new(id, p));
        Ok(id)
    }

    /// Move a chicken into a building.
    pub fn house_chicken(
        &mut self,
        id: AnimalId,
        building: BuildingId,
    ) -> Result<()> {
        let chicken = self.chickens.get(&id).ok_or(Error::UnknownAgent(id))?;
        let (old_pos, old_abode) = (chicken.position, chicken.abode);
        let b = self
            .buildings
            .get_mut(building.0 as usize)
            .ok_or(Error::UnknownBuilding(building))?;
        if old_abode.is_some_and(|a| a.building == building) {
            return Ok(());
        }
        if b.is_full() {
            return Err(Error::BuildingFull(building));
        }

        let abode = b.admit(id)?;
        let p = b.place_position(abode.place);

        match old_abode {
            Some(old) => {
                if let Some(b) = self.buildings.get_mut(old.building.0 as usize)
                {
                    b.release(id);
                }
            }
            None => {
                if self.cache.get(old_pos, Category::Chicken) == Some(id) {
                    self.cache.remove(old_pos, Category::Chicken);
                }
            }
        }

        if let Some(chicken) = self.chickens.get_mut(&id) {
            chicken.position = p;
            chicken.abode = Some(abode);
        }
        Ok(())
    }

    pub fn equip(&mut self, id: AnimalId, item: ItemKind) -> Result<()> {
        self.chickens
            .get_mut(&id)
            .ok_or(Error::UnknownAgent(id))?
            .equipment
            .equip(item)
    }

    /// Put a fox on the board, usually just outside its edge.
    pub fn add_fox(&mut self, kind: FoxKind, p: Position) -> AnimalId {
        let id = self.new_id();
        self.cache.add(id, p, Category::Fox);
        self.foxes.insert(id, Fox::new(id, kind, p));
        id
    }

    /// Chicken at position, whether outside or in a building.
    pub fn chicken_at(&self, p: Position) -> Option<AnimalId> {
        if let Some(id) = self.cache.get(p, Category::Chicken) {
            return Some(id);
        }
        self.buildings.iter().filter(|b| b.covers(p)).find_map(|b| {
            (0..b.places.len())
                .find(|&i| b.place_position(i) == p)
                .and_then(|i| b.places[i])
        })
    }

    /// Index the outside animals anew.
    pub fn rebuild_cache(&mut self) {
        self.cache.clear();
        for c in self.chickens.values().filter(|c| !c.is_housed()) {
            self.cache.add(c.id(), c.position, Category::Chicken);
        }
        for f in self.foxes.values() {
            self.cache.add(f.id(), f.position, Category::Fox);
        }
    }

    /// Dusk falls, chickens lay eggs and gather wood and the foxes come.
    pub fn start_night(&mut self) {
        self.phase = Phase::Night;
        self.night_ticks = 0;
        self.reseed();
        log::info!("night {} falls", self.day);

        let mut laid = 0;
        let mut chopped = 0;
        let hatch_days = self.settings.egg_hatch_days;
        let ids: Vec<AnimalId> = self.chickens.keys().copied().collect();
        for id in ids {
            let Some(chicken) = self.chickens.get(&id) else {
                continue;
            };
            let lays = self
                .building_kind(chicken.abode)
                .is_some_and(|k| k.lays_eggs());

            let Gameboard {
                chickens,
                rng,
                tiles,
                ..
            } = self;
            let Some(chicken) = chickens.get_mut(&id) else {
                continue;
            };
            if lays {
                laid += chicken.lay(rng, hatch_days);
            }
            chopped += chicken.chop(rng, &*tiles);
        }

        if laid > 0 {
            self.notify(Msg::Eggs(self.eggs()));
        }
        if chopped > 0 {
            self.wood += chopped;
            self.notify(Msg::Wood(self.wood));
        }

        self.spawn_foxes();
        self.rebuild_cache();
    }

    fn spawn_foxes(&mut self) {
        let Some(spawns) = self.settings.fox_spawns() else {
            log::warn!("no fox kinds to spawn");
            return;
        };
        let (min, max) = (self.settings.min_foxes, self.settings.max_foxes);
        let n = self.rng.gen_range(min..=max.max(min)) as usize;

        let mut ring = spawn_ring(self.tiles.size());
        ring.shuffle(&mut self.rng);
        ring.truncate(n);
        for p in ring {
            let kind = spawns.sample(&mut self.rng);
            let id = self.add_fox(kind, p);
            log::info!("{kind} {id} appears at {p}");
        }
    }

    /// Run one tick of the night.
    pub fn night_step(&mut self) -> NightStatus {
        if self.night_status() == NightStatus::Over {
            return NightStatus::Over;
        }
        self.night_ticks += 1;

        self.move_foxes();
        if self.foxes.is_empty() {
            return NightStatus::Over;
        }

        // Foxes get the first strike.
        self.foxes_attack();
        self.chickens_attack();

        self.night_status()
    }

    pub fn night_status(&self) -> NightStatus {
        if self.foxes.is_empty()
            || self.night_ticks >= self.settings.max_night_ticks
        {
            NightStatus::Over
        } else {
            NightStatus::Ongoing
        }
    }

    fn move_foxes(&mut self) {
        let prey: Vec<Prey> = self
            .chickens
            .values()
            .map(|c| Prey {
                id: c.id(),
                position: c.position,
                housed: c.is_housed(),
            })
            .collect();

        let Gameboard {
            tiles,
            cache,
            rng,
            foxes,
            settings,
            outbox,
            ..
        } = self;
        let mut env = Surroundings {
            tiles,
            cache,
            prey: &prey,
            rng,
            housed_penalty: settings.housed_prey_penalty,
            outbox,
        };
        for fox in foxes.values_mut() {
            fox.step(&mut env);
        }

        let safe: Vec<AnimalId> = self
            .foxes
            .values()
            .filter(|f| f.is_safe())
            .map(|f| f.id())
            .collect();
        for id in safe {
            log::info!("{id} got away");
            self.remove_fox(id);
        }
    }

    fn foxes_attack(&mut self) {
        let ids: Vec<AnimalId> = self.foxes.keys().copied().collect();
        let appetite = self.settings.greedy_appetite;
        for id in ids {
            let Some(fox) = self.foxes.get(&id) else {
                continue;
            };
            if !fox.is_hunting() {
                continue;
            }
            let Some(prey) = self.chicken_at(fox.position) else {
                continue;
            };

            let Some(fox) = self.foxes.get_mut(&id) else {
                continue;
            };
            log::debug!("{} {id} catches {prey}", fox.kind);
            if !fox.catch() {
                continue;
            }
            let Some(chicken) = self.chickens.get_mut(&prey) else {
                continue;
            };
            if chicken.damage().is_fatal() {
                self.kill_chicken(prey);
                if let Some(fox) = self.foxes.get_mut(&id) {
                    fox.fed(appetite);
                }
            }
        }
    }

    fn chickens_attack(&mut self) {
        let ids: Vec<AnimalId> = self.chickens.keys().copied().collect();
        for id in ids {
            let quarry: Vec<Quarry> = self
                .foxes
                .values()
                .map(|f| Quarry {
                    id: f.id(),
                    position: f.position,
                    stealth: f.stealth(),
                })
                .collect();
            if quarry.is_empty() {
                break;
            }
            let Some(chicken) = self.chickens.get(&id) else {
                continue;
            };
            let building = self.building_kind(chicken.abode);

            let Gameboard { chickens, rng, .. } = self;
            let Some(chicken) = chickens.get_mut(&id) else {
                continue;
            };
            let Some(target) = chicken.attack(rng, building, &quarry) else {
                continue;
            };

            log::debug!("{id} hits {target}");
            let Some(fox) = self.foxes.get_mut(&target) else {
                continue;
            };
            if fox.damage().is_fatal() {
                self.kill_fox(target);
            }
        }
    }

    fn remove_fox(&mut self, id: AnimalId) -> Option<Fox> {
        let fox = self.foxes.shift_remove(&id)?;
        if self.cache.get(fox.position, Category::Fox) == Some(id) {
            self.cache.remove(fox.position, Category::Fox);
        }
        Some(fox)
    }

    fn kill_fox(&mut self, id: AnimalId) {
        let Some(fox) = self.remove_fox(id) else {
            return;
        };
        log::info!("{} {id} is killed at {}", fox.kind, fox.position);
        self.killed_foxes += 1;
        if let Some(cue) = fox.death_cue {
            self.notify(Msg::Death {
                at: fox.position,
                cue,
            });
        }
        self.notify(Msg::KilledFoxes(self.killed_foxes));
    }

    fn kill_chicken(&mut self, id: AnimalId) {
        let Some(chicken) = self.chickens.shift_remove(&id) else {
            return;
        };
        log::info!("{id} is killed at {}", chicken.position);
        match chicken.abode {
            Some(abode) => {
                if let Some(b) =
                    self.buildings.get_mut(abode.building.0 as usize)
                {
                    b.release(id);
                }
            }
            None => {
                if self.cache.get(chicken.position, Category::Chicken)
                    == Some(id)
                {
                    self.cache.remove(chicken.position, Category::Chicken);
                }
            }
        }
        if let Some(cue) = chicken.death_cue {
            self.notify(Msg::Death {
                at: chicken.position,
                cue,
            });
        }
        self.notify(Msg::Chickens(self.chickens.len()));
    }

    /// Dawn breaks, remaining foxes run off and eggs hatch.
    pub fn start_day(&mut self) {
        let fled: Vec<AnimalId> = self.foxes.keys().copied().collect();
        for id in fled {
            log::info!("{id} flees at dawn");
            self.remove_fox(id);
        }

        self.phase = Phase::Day;
        self.day += 1;
        self.night_ticks = 0;
        self.reseed();
        self.rebuild_cache();
        log::info!("day {} dawns", self.day);

        let (old_cash, old_eggs) = (self.cash, self.eggs());
        let old_count = self.chickens.len();
        let ids: Vec<AnimalId> = self.chickens.keys().copied().collect();
        for id in ids {
            let chick_id = AnimalId(self.next_id);
            let mut sold = 0;
            let Some(chicken) = self.chickens.get_mut(&id) else {
                continue;
            };
            let (mother_pos, abode) = (chicken.position, chicken.abode);
            let chick = chicken.hatch(chick_id, |_| sold += 1);
            self.cash += sold * self.settings.egg_price;

            if let Some(chick) = chick {
                self.next_id += 1;
                self.place_hatchling(chick, mother_pos, abode);
            }
        }

        if self.cash != old_cash {
            self.notify(Msg::Cash(self.cash));
        }
        if self.eggs() != old_eggs {
            self.notify(Msg::Eggs(self.eggs()));
        }
        if self.chickens.len() != old_count {
            self.notify(Msg::Chickens(self.chickens.len()));
        }
    }

    /// Find a home for a new chick, the mother's building if there's room,
    /// else any open tile next to her.
    fn place_hatchling(
        &mut self,
        mut chick: Chicken,
        mother_pos: Position,
        abode: Option<Abode>,
    ) {
        let id = chick.id();
        if let Some(b) =
            abode.and_then(|a| self.buildings.get_mut(a.building.0 as usize))
        {
            if let Ok(home) = b.admit(id) {
                chick.position = b.place_position(home.place);
                chick.abode = Some(home);
                self.chickens.insert(id, chick);
                return;
            }
        }

        let mut spots: Vec<Position> = match abode
            .and_then(|a| self.building(a.building))
        {
            Some(b) => b
                .footprint()
                .flat_map(|p| p.neighbours())
                .filter(|p| !b.covers(*p))
                .collect(),
            None => mother_pos.layer(0).neighbours().collect(),
        };
        spots.sort();
        spots.dedup();

        match spots.into_iter().find(|&p| self.is_open(p)) {
            Some(p) => {
                chick.position = p;
                self.cache.add(id, p, Category::Chicken);
                self.chickens.insert(id, chick);
            }
            None => {
                log::warn!("no room for hatchling near {mother_pos}, lost");
            }
        }
    }

    /// Pay for or get paid for things bought and sold during the day.
    pub fn add_cash(&mut self, amount: i64) {
        self.cash += amount;
        self.notify(Msg::Cash(self.cash));
    }
}

/// Positions in the one tile wide ring around the board.
pub fn spawn_ring(size: IVec2) -> Vec<Position> {
    let (w, h) = (size.x, size.y);
    let mut ret = Vec::new();
    for x in -1..=w {
        ret.push(pos(x, -1));
        ret.push(pos(x, h));
    }
    for y in 0..h {
        ret.push(pos(-1, y));
        ret.push(pos(w, y));
    }
    ret
}

#[cfg(test)]
mod test {
    use glam::ivec2;

    use super::*;
    use crate::Terrain;

    const FARM: &str = "
        %%%%%%%%
        %......%
        %.####.%
        %.#..#.%
        %.####.%
        %......%";

    fn board() -> Gameboard {
        Gameboard::from_ascii(FARM, Settings::default(), 1).unwrap()
    }

    #[test]
    fn ring() {
        let ring = spawn_ring(ivec2(3, 2));
        assert_eq!(ring.len(), 14);
        let tiles = Tiles::new(3, 2);
        assert!(ring.iter().all(|&p| !tiles.in_bounds(p)));
        assert!(ring
            .iter()
            .all(|p| p.neighbours().any(|q| tiles.in_bounds(q))));
    }

    #[test]
    fn building_placement() {
        let mut board = board();
        assert_eq!(
            board.add_building(BuildingKind::Henhouse, pos(2, 2)),
            Err(Error::BadPlacement(pos(2, 2)))
        );
        assert_eq!(
            board.add_building(BuildingKind::Henhouse, pos(6, 1)),
            Err(Error::BadPlacement(pos(6, 1)))
        );
        // Footprint overlaps the fence.
        assert!(board.add_building(BuildingKind::Guardtower, pos(1, 1)).is_err());

        let mut board =
            Gameboard::new(Tiles::new(6, 6), Settings::default(), 1);
        let id = board
            .add_building(BuildingKind::Henhouse, pos(1, 1))
            .unwrap();
        assert_eq!(board.tiles().get(pos(3, 2)), Some(Terrain::Henhouse));
        assert!(board
            .add_building(BuildingKind::Henhouse, pos(2, 2))
            .is_err());
        assert_eq!(
            board.building(id).map(|b| b.kind()),
            Some(BuildingKind::Henhouse)
        );
    }

    #[test]
    fn housing() {
        let mut board =
            Gameboard::new(Tiles::new(6, 6), Settings::default(), 1);
        let tower = board
            .add_building(BuildingKind::Guardtower, pos(0, 0))
            .unwrap();
        let mut ids = Vec::new();
        for x in 0..5 {
            ids.push(board.add_chicken(pos(x, 4)).unwrap());
        }
        assert!(board.add_chicken(pos(0, 4)).is_err());
        assert!(board.add_chicken(pos(0, 0)).is_err());

        for &id in &ids[..4] {
            board.house_chicken(id, tower).unwrap();
        }
        assert_eq!(
            board.house_chicken(ids[4], tower),
            Err(Error::BuildingFull(tower))
        );
        assert_eq!(
            board.house_chicken(ids[4], BuildingId(7)),
            Err(Error::UnknownBuilding(BuildingId(7)))
        );

        let housed = board.chicken(ids[0]).unwrap();
        assert!(housed.is_housed());
        assert_eq!(housed.position, Position::new(0, 0, 1));
        assert_eq!(board.cache().get(pos(0, 4), Category::Chicken), None);
        assert_eq!(board.chicken_at(Position::new(0, 0, 1)), Some(ids[0]));
        assert_eq!(board.chicken_at(pos(4, 4)), Some(ids[4]));
        assert_eq!(board.chicken_at(pos(0, 0)), None);
    }

    #[test]
    fn night_without_foxes_is_over() {
        let mut board = board();
        assert_eq!(board.night_step(), NightStatus::Over);
        assert_eq!(board.night_ticks(), 0);
    }

    #[test]
    fn spawning() {
        let settings = Settings {
            min_foxes: 4,
            max_foxes: 4,
            ..Default::default()
        };
        let mut board = Gameboard::from_ascii(FARM, settings, 3).unwrap();
        board.start_night();
        assert_eq!(board.phase(), Phase::Night);
        assert_eq!(board.foxes().count(), 4);
        let size = board.tiles().size();
        let mut spots: Vec<Position> =
            board.foxes().map(|f| f.position).collect();
        assert!(spots.iter().all(|&p| !board.tiles().in_bounds(p)));
        assert!(spots.iter().all(|&p| spawn_ring(size).contains(&p)));
        spots.sort();
        spots.dedup();
        assert_eq!(spots.len(), 4);
    }

    #[test]
    fn tick_ceiling() {
        let settings = Settings {
            max_night_ticks: 3,
            ..Default::default()
        };
        let mut board = Gameboard::from_ascii(FARM, settings, 1).unwrap();
        board.add_chicken(pos(3, 3)).unwrap();
        board.add_fox(FoxKind::Rinkhals, pos(-1, -1));
        board.phase = Phase::Night;
        assert_eq!(board.night_step(), NightStatus::Ongoing);
        assert_eq!(board.night_step(), NightStatus::Ongoing);
        assert_eq!(board.night_step(), NightStatus::Over);
        assert_eq!(board.night_step(), NightStatus::Over);
        assert_eq!(board.night_ticks(), 3);

        board.start_day();
        assert_eq!(board.foxes().count(), 0);
        assert_eq!(board.day(), 2);
        assert_eq!(board.phase(), Phase::Day);
    }
}
