//! Saving and loading game boards.
//!
//! The board is turned into an object graph where chickens and buildings
//! are shared objects. Housed chickens and their buildings point at each
//! other and foxes point at the chickens they are after, so the saved tree
//! relies on identity references to come back the same.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{
    animal::DeathCue,
    board::Phase,
    building::{Abode, Building, BuildingId, BuildingKind},
    chicken::{Chicken, Egg},
    error::schema,
    fox::{Fox, FoxKind, FoxState},
    item::{Item, ItemKind},
    prelude::*,
    registry::{self, Registry},
    simplify::{dismantle, simplify, unsimplify, Node, Value},
    Gameboard, LoadError, Settings, Tiles,
};

/// Bump whenever a field is added, removed or reordered.
pub const SAVE_VERSION: u32 = 1;

#[derive(Serialize, Deserialize)]
struct SaveFile {
    version: u32,
    root: Node,
}

#[derive(Deserialize)]
struct Header {
    version: u32,
}

/// Types that appear in save files.
pub(crate) fn registry() -> Registry {
    crate::registry! {
        "board" => [
            "settings", "tiles", "buildings", "chickens", "foxes", "cash",
            "wood", "killed-foxes", "day", "phase", "night-ticks", "next-id",
            "seed",
        ],
        "settings" => [
            "max-night-ticks", "min-foxes", "max-foxes", "fox-weights",
            "egg-price", "egg-hatch-days", "starting-cash", "starting-wood",
            "greedy-appetite", "housed-prey-penalty",
        ],
        "building" => ["id", "kind", "origin", "places"],
        "chicken" => [
            "id", "position", "facing", "equipment", "abode", "eggs",
            "death-cue",
        ],
        "fox" => [
            "id", "kind", "position", "facing", "state", "dig",
            "landmarks", "target", "recent", "eaten", "death-cue",
        ],
        "item" => ["kind", "ammunition", "armour"],
        "egg" => ["timer"],
    }
}

impl Gameboard {
    /// Write the board into a JSON save file.
    pub fn save(&self) -> serde_json::Result<String> {
        let root = self.to_value();
        let file = SaveFile {
            version: SAVE_VERSION,
            root: simplify(&root),
        };
        dismantle(root);
        log::info!("saving day {} board", self.day);
        serde_json::to_string(&file)
    }

    /// Read a board from a save file.
    ///
    /// Fails on any structural problem in the file, nothing is salvaged
    /// from a partially readable save.
    pub fn load(text: &str) -> Result<Gameboard, LoadError> {
        let header: Header = serde_json::from_str(text)?;
        if header.version != SAVE_VERSION {
            return Err(LoadError::Version {
                found: header.version,
                expected: SAVE_VERSION,
            });
        }

        let file: SaveFile = serde_json::from_str(text)?;
        let root = unsimplify(&file.root, registry::types())?;
        let ret = Gameboard::from_value(&root);
        dismantle(root);
        let ret = ret?;
        log::info!("loaded day {} board", ret.day);
        Ok(ret)
    }

    fn to_value(&self) -> Value {
        let buildings: IndexMap<BuildingId, Value> = self
            .buildings
            .iter()
            .map(|b| {
                let places = vec![Value::None; b.places.len()];
                let v = Value::object(
                    "building",
                    vec![
                        int(b.id.0),
                        name(b.kind),
                        position(b.origin),
                        Value::seq(places),
                    ],
                );
                (b.id, v)
            })
            .collect();

        let chickens: IndexMap<AnimalId, Value> = self
            .chickens
            .values()
            .map(|c| (c.id(), chicken_value(c, &buildings)))
            .collect();

        // Close the loops from buildings back to their occupants.
        for b in &self.buildings {
            let Some(Value::Object(o)) = buildings.get(&b.id) else {
                continue;
            };
            let o = o.borrow();
            let Value::Container(places) = &o.fields[3] else {
                continue;
            };
            let mut places = places.borrow_mut();
            for (i, slot) in b.places.iter().enumerate() {
                if let Some(v) = slot.and_then(|id| chickens.get(&id)) {
                    places.items[i] = v.clone();
                }
            }
        }

        let foxes: Vec<Value> =
            self.foxes.values().map(|f| fox_value(f, &chickens)).collect();

        Value::object(
            "board",
            vec![
                settings_value(&self.settings),
                Value::seq(self.tiles.rows().map(Value::from).collect()),
                Value::seq(buildings.into_values().collect()),
                Value::seq(chickens.into_values().collect()),
                Value::seq(foxes),
                Value::Int(self.cash),
                int(self.wood),
                int(self.killed_foxes),
                int(self.day),
                Value::from(match self.phase {
                    Phase::Day => "day",
                    Phase::Night => "night",
                }),
                int(self.night_ticks),
                int(self.next_id),
                // Seeds use the full 64 bits, stored as signed.
                Value::Int(self.seed as i64),
            ],
        )
    }

    fn from_value(root: &Value) -> Result<Gameboard, LoadError> {
        let [settings, tiles, buildings, chickens, foxes, cash, wood, killed, day, phase, night_ticks, next_id, seed] =
            fields::<13>(root, "board")?;

        let rows: Vec<String> =
            items(&tiles)?.iter().map(string).collect::<Result<_, _>>()?;
        let tiles = Tiles::from_ascii(&rows.join("\n")).map_err(schema)?;

        let mut ret = Gameboard::new(
            tiles,
            settings_from(&settings)?,
            int_from::<i64>(&seed)? as u64,
        );
        ret.cash = int_from(&cash)?;
        ret.wood = int_from(&wood)?;
        ret.killed_foxes = int_from(&killed)?;
        ret.day = int_from(&day)?;
        ret.phase = match string(&phase)?.as_str() {
            "day" => Phase::Day,
            "night" => Phase::Night,
            other => return Err(schema(format!("phase {other:?}"))),
        };
        ret.night_ticks = int_from(&night_ticks)?;
        ret.next_id = int_from(&next_id)?;

        for b in items(&buildings)? {
            let b = building_from(&b)?;
            if b.id.0 as usize != ret.buildings.len() {
                return Err(schema(format!("building id {}", b.id)));
            }
            ret.buildings.push(b);
        }

        for c in items(&chickens)? {
            let c = chicken_from(&c)?;
            if ret.chickens.insert(c.id(), c).is_some() {
                return Err(schema("duplicate chicken"));
            }
        }

        for f in items(&foxes)? {
            let f = fox_from(&f)?;
            if f.target.is_some_and(|t| !ret.chickens.contains_key(&t)) {
                return Err(schema(format!("fox {} target", f.id())));
            }
            if ret.foxes.insert(f.id(), f).is_some() {
                return Err(schema("duplicate fox"));
            }
        }

        let ids = ret.chickens.keys().chain(ret.foxes.keys());
        if let Some(id) = ids.copied().find(|id| id.0 >= ret.next_id) {
            return Err(schema(format!("{id} not below next id")));
        }

        ret.check_housing()?;
        ret.reseed();
        ret.rebuild_cache();
        Ok(ret)
    }

    /// Buildings and chickens must agree about who lives where.
    fn check_housing(&self) -> Result<(), LoadError> {
        for b in &self.buildings {
            for (place, id) in b.places.iter().enumerate() {
                let Some(id) = id else { continue };
                let abode = self.chickens.get(id).and_then(|c| c.abode);
                if abode
                    != Some(Abode {
                        building: b.id,
                        place,
                    })
                {
                    return Err(schema(format!("occupant {id} of {}", b.id)));
                }
            }
        }
        for c in self.chickens.values() {
            let Some(abode) = c.abode else { continue };
            let listed = self
                .building(abode.building)
                .and_then(|b| b.places.get(abode.place).copied().flatten());
            if listed != Some(c.id()) {
                return Err(schema(format!("abode of {}", c.id())));
            }
        }
        Ok(())
    }
}

fn chicken_value(c: &Chicken, buildings: &IndexMap<BuildingId, Value>) -> Value {
    let abode = c.abode.and_then(|a| {
        let b = buildings.get(&a.building)?;
        Some(Value::tuple(vec![b.clone(), int(a.place as u32)]))
    });
    Value::object(
        "chicken",
        vec![
            int(c.id().0),
            position(c.position),
            name(c.facing),
            Value::seq(c.equipment.iter().map(item_value).collect()),
            abode.into(),
            Value::seq(
                c.eggs
                    .iter()
                    .map(|e| Value::object("egg", vec![int(e.timer)]))
                    .collect(),
            ),
            c.death_cue.map(name).into(),
        ],
    )
}

fn chicken_from(v: &Value) -> Result<Chicken, LoadError> {
    let [id, pos, facing, equipment, abode, eggs, death_cue] =
        fields::<7>(v, "chicken")?;
    let mut ret = Chicken::new(AnimalId(int_from(&id)?), position_from(&pos)?);
    ret.facing = parse(&facing)?;
    ret.equipment = items(&equipment)?
        .iter()
        .map(item_from)
        .collect::<Result<_, _>>()?;
    ret.abode = match abode {
        Value::None => None,
        v => {
            let [building, place] = tuple::<2>(&v)?;
            let [building, ..] = fields::<4>(&building, "building")?;
            Some(Abode {
                building: BuildingId(int_from(&building)?),
                place: int_from(&place)?,
            })
        }
    };
    ret.eggs = items(&eggs)?
        .iter()
        .map(|e| {
            let [timer] = fields::<1>(e, "egg")?;
            Ok(Egg {
                timer: int_from(&timer)?,
            })
        })
        .collect::<Result<_, LoadError>>()?;
    ret.death_cue = optional(&death_cue, parse::<DeathCue>)?;
    Ok(ret)
}

fn building_from(v: &Value) -> Result<Building, LoadError> {
    let [id, kind, origin, places] = fields::<4>(v, "building")?;
    let kind: BuildingKind = parse(&kind)?;
    let mut ret =
        Building::new(BuildingId(int_from(&id)?), kind, position_from(&origin)?);
    let places = items(&places)?;
    if places.len() != ret.places.len() {
        return Err(schema(format!("{kind} with {} places", places.len())));
    }
    for (slot, v) in ret.places.iter_mut().zip(&places) {
        *slot = optional(v, |c| {
            let [id, ..] = fields::<7>(c, "chicken")?;
            Ok(AnimalId(int_from(&id)?))
        })?;
    }
    Ok(ret)
}

fn fox_value(f: &Fox, chickens: &IndexMap<AnimalId, Value>) -> Value {
    let (state, dig) = match f.state {
        FoxState::Hunting => ("hunting", Value::None),
        FoxState::Retreating => ("retreating", Value::None),
        FoxState::Digging { at, ticks, hunting } => (
            "digging",
            Value::tuple(vec![position(at), int(ticks), hunting.into()]),
        ),
        FoxState::Safe => ("safe", Value::None),
    };
    let target = f.target.and_then(|id| chickens.get(&id)).cloned();
    Value::object(
        "fox",
        vec![
            int(f.id().0),
            name(f.kind),
            position(f.position),
            name(f.facing),
            state.into(),
            dig,
            Value::seq(f.landmarks.iter().copied().map(position).collect()),
            target.into(),
            Value::seq(f.recent.iter().copied().map(position).collect()),
            int(f.eaten),
            f.death_cue.map(name).into(),
        ],
    )
}

fn fox_from(v: &Value) -> Result<Fox, LoadError> {
    let [id, kind, pos, facing, state, dig, landmarks, target, recent, eaten, death_cue] =
        fields::<11>(v, "fox")?;
    let mut ret = Fox::new(
        AnimalId(int_from(&id)?),
        parse(&kind)?,
        position_from(&pos)?,
    );
    ret.facing = parse(&facing)?;
    ret.state = match string(&state)?.as_str() {
        "hunting" => FoxState::Hunting,
        "retreating" => FoxState::Retreating,
        "safe" => FoxState::Safe,
        "digging" => {
            let [at, ticks, hunting] = tuple::<3>(&dig)?;
            FoxState::Digging {
                at: position_from(&at)?,
                ticks: int_from(&ticks)?,
                hunting: boolean(&hunting)?,
            }
        }
        other => return Err(schema(format!("fox state {other:?}"))),
    };
    ret.landmarks = items(&landmarks)?
        .iter()
        .map(position_from)
        .collect::<Result<_, _>>()?;
    if ret.landmarks.is_empty() {
        return Err(schema("fox without landmarks"));
    }
    ret.target = optional(&target, |c| {
        let [id, ..] = fields::<7>(c, "chicken")?;
        Ok(AnimalId(int_from(&id)?))
    })?;
    ret.recent = items(&recent)?
        .iter()
        .map(position_from)
        .collect::<Result<_, _>>()?;
    ret.eaten = int_from(&eaten)?;
    ret.death_cue = optional(&death_cue, parse::<DeathCue>)?;
    Ok(ret)
}

fn item_value(item: &Item) -> Value {
    Value::object(
        "item",
        vec![
            name(item.kind),
            item.ammunition.map(|n| Value::Int(n as i64)).into(),
            int(item.armour),
        ],
    )
}

fn item_from(v: &Value) -> Result<Item, LoadError> {
    let [kind, ammunition, armour] = fields::<3>(v, "item")?;
    Ok(Item {
        kind: parse::<ItemKind>(&kind)?,
        ammunition: optional(&ammunition, int_from)?,
        armour: int_from(&armour)?,
    })
}

fn settings_value(s: &Settings) -> Value {
    let weights = s
        .fox_weights
        .iter()
        .map(|(&k, &w)| Value::tuple(vec![name(k), int(w)]))
        .collect();
    Value::object(
        "settings",
        vec![
            int(s.max_night_ticks),
            int(s.min_foxes),
            int(s.max_foxes),
            Value::seq(weights),
            Value::Int(s.egg_price),
            int(s.egg_hatch_days),
            Value::Int(s.starting_cash),
            int(s.starting_wood),
            int(s.greedy_appetite),
            Value::Int(s.housed_prey_penalty as i64),
        ],
    )
}

fn settings_from(v: &Value) -> Result<Settings, LoadError> {
    let [max_night_ticks, min_foxes, max_foxes, fox_weights, egg_price, egg_hatch_days, starting_cash, starting_wood, greedy_appetite, housed_prey_penalty] =
        fields::<10>(v, "settings")?;
    let fox_weights = items(&fox_weights)?
        .iter()
        .map(|w| {
            let [kind, weight] = tuple::<2>(w)?;
            Ok((parse::<FoxKind>(&kind)?, int_from(&weight)?))
        })
        .collect::<Result<_, LoadError>>()?;
    Ok(Settings {
        max_night_ticks: int_from(&max_night_ticks)?,
        min_foxes: int_from(&min_foxes)?,
        max_foxes: int_from(&max_foxes)?,
        fox_weights,
        egg_price: int_from(&egg_price)?,
        egg_hatch_days: int_from(&egg_hatch_days)?,
        starting_cash: int_from(&starting_cash)?,
        starting_wood: int_from(&starting_wood)?,
        greedy_appetite: int_from(&greedy_appetite)?,
        housed_prey_penalty: int_from(&housed_prey_penalty)?,
    })
}

fn int(n: u32) -> Value {
    Value::Int(n as i64)
}

fn name(a: impl Into<&'static str>) -> Value {
    Value::Str(a.into().to_owned())
}

fn position(p: Position) -> Value {
    Value::tuple(vec![
        Value::Int(p.x as i64),
        Value::Int(p.y as i64),
        Value::Int(p.z as i64),
    ])
}

/// Fields of an object with the given tag.
fn fields<const N: usize>(
    v: &Value,
    tag: &str,
) -> Result<[Value; N], LoadError> {
    let Value::Object(o) = v else {
        return Err(schema(format!("{tag}, not an object")));
    };
    let o = o.borrow();
    if o.tag != tag {
        return Err(schema(format!("{}, expected {tag}", o.tag)));
    }
    <[Value; N]>::try_from(o.fields.clone()).map_err(|f| {
        LoadError::FieldCount {
            tag: tag.into(),
            expected: N,
            found: f.len(),
        }
    })
}

fn items(v: &Value) -> Result<Vec<Value>, LoadError> {
    match v {
        Value::Container(c) => Ok(c.borrow().items.clone()),
        _ => Err(schema("expected a container")),
    }
}

fn tuple<const N: usize>(v: &Value) -> Result<[Value; N], LoadError> {
    <[Value; N]>::try_from(items(v)?)
        .map_err(|t| schema(format!("tuple of {}, expected {N}", t.len())))
}

fn optional<T>(
    v: &Value,
    f: impl FnOnce(&Value) -> Result<T, LoadError>,
) -> Result<Option<T>, LoadError> {
    match v {
        Value::None => Ok(None),
        v => f(v).map(Some),
    }
}

fn int_from<T: TryFrom<i64>>(v: &Value) -> Result<T, LoadError> {
    match v {
        Value::Int(n) => {
            T::try_from(*n).map_err(|_| schema(format!("{n} out of range")))
        }
        _ => Err(schema("expected an integer")),
    }
}

fn boolean(v: &Value) -> Result<bool, LoadError> {
    match v {
        Value::Bool(b) => Ok(*b),
        _ => Err(schema("expected a boolean")),
    }
}

fn string(v: &Value) -> Result<String, LoadError> {
    match v {
        Value::Str(s) => Ok(s.clone()),
        _ => Err(schema("expected a string")),
    }
}

fn parse<T>(v: &Value) -> Result<T, LoadError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    let s = string(v)?;
    s.parse().map_err(|e| schema(format!("{s:?}: {e}")))
}

fn position_from(v: &Value) -> Result<Position, LoadError> {
    let [x, y, z] = tuple::<3>(v)?;
    Ok(Position::new(int_from(&x)?, int_from(&y)?, int_from(&z)?))
}
