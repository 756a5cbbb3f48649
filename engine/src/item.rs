//! Equipment carried by chickens.

use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};
use util::RngExt;

use crate::{
    building::{modified, BuildingKind, Param},
    prelude::*,
    Error,
};

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
pub enum ItemKind {
    Rifle,
    Knife,
    Axe,
    Helmet,
    Kevlar,
    /// Marks a chicken that is sitting on eggs.
    NestEgg,
}

/// Where on a chicken an item goes. Only one item fits each slot.
#[derive(
    Copy, Clone, Eq, PartialEq, Hash, Debug, Serialize, Deserialize, EnumIter,
)]
#[serde(rename_all = "kebab-case")]
pub enum Slot {
    Weapon,
    Head,
    Body,
    Nest,
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Slot::Weapon => "weapon slot",
            Slot::Head => "head slot",
            Slot::Body => "body slot",
            Slot::Nest => "nest",
        };
        write!(f, "{s}")
    }
}

/// Weapon classes, each has its own set of building modifiers.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum WeaponClass {
    Gun,
    Knife,
    Axe,
}

impl WeaponClass {
    fn params(self) -> [Param; 3] {
        use Param::*;
        match self {
            WeaponClass::Gun => [GunRange, GunBaseHit, GunRangePenalty],
            WeaponClass::Knife => {
                [KnifeRange, KnifeBaseHit, KnifeRangePenalty]
            }
            WeaponClass::Axe => [AxeRange, AxeBaseHit, AxeRangePenalty],
        }
    }
}

/// Unmodified weapon numbers.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct WeaponStats {
    pub class: WeaponClass,
    pub range: i32,
    pub base_hit: i32,
    pub range_penalty: i32,
}

impl WeaponStats {
    /// Stats with the modifiers of the wielder's building applied.
    pub fn effective(self, abode: Option<BuildingKind>) -> WeaponStats {
        let [range, base_hit, range_penalty] = self.class.params();
        WeaponStats {
            range: modified(abode, range, self.range),
            base_hit: modified(abode, base_hit, self.base_hit),
            range_penalty: modified(abode, range_penalty, self.range_penalty),
            ..self
        }
    }
}

impl ItemKind {
    pub fn slot(self) -> Slot {
        use ItemKind::*;
        match self {
            Rifle | Knife | Axe => Slot::Weapon,
            Helmet => Slot::Head,
            Kevlar => Slot::Body,
            NestEgg => Slot::Nest,
        }
    }

    pub fn weapon(self) -> Option<WeaponStats> {
        use ItemKind::*;
        let (class, range, base_hit, range_penalty) = match self {
            Rifle => (WeaponClass::Gun, 3, 55, 15),
            Knife => (WeaponClass::Knife, 1, 70, 0),
            Axe => (WeaponClass::Axe, 1, 30, 0),
            _ => return None,
        };
        Some(WeaponStats {
            class,
            range,
            base_hit,
            range_penalty,
        })
    }

    /// Starting ammunition, `None` for items that don't need any.
    pub fn ammunition(self) -> Option<u32> {
        match self {
            ItemKind::Rifle => Some(5),
            _ => None,
        }
    }

    /// Starting armour durability.
    pub fn armour(self) -> u32 {
        match self {
            ItemKind::Helmet => 1,
            ItemKind::Kevlar => 2,
            _ => 0,
        }
    }
}

/// An item instance with its own wear and ammunition.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct Item {
    pub kind: ItemKind,
    pub ammunition: Option<u32>,
    pub armour: u32,
}

impl From<ItemKind> for Item {
    fn from(kind: ItemKind) -> Self {
        Item {
            kind,
            ammunition: kind.ammunition(),
            armour: kind.armour(),
        }
    }
}

impl Item {
    pub fn is_weapon(&self) -> bool {
        self.kind.weapon().is_some()
    }

    pub fn is_armour(&self) -> bool {
        self.kind.armour() > 0
    }

    pub fn in_range(
        &self,
        abode: Option<BuildingKind>,
        distance: i32,
    ) -> bool {
        self.kind
            .weapon()
            .is_some_and(|w| distance <= w.effective(abode).range)
    }

    /// Fire the weapon at a target at the given distance.
    ///
    /// Spends a round of ammunition if the weapon uses it. An empty weapon
    /// doesn't fire and misses.
    pub fn hit(
        &mut self,
        rng: &mut impl Rng,
        abode: Option<BuildingKind>,
        distance: i32,
    ) -> bool {
        let roll = rng.d100();
        self.hit_roll(roll, abode, distance)
    }

    /// Resolve a hit with a given d100 roll.
    pub fn hit_roll(
        &mut self,
        roll: i32,
        abode: Option<BuildingKind>,
        distance: i32,
    ) -> bool {
        let Some(stats) = self.kind.weapon() else {
            return false;
        };

        match self.ammunition.as_mut() {
            Some(0) => {
                log::debug!("{} is out of ammunition", self.kind);
                return false;
            }
            Some(n) => *n -= 1,
            None => {}
        }

        let w = stats.effective(abode);
        roll > (100 - w.base_hit) + w.range_penalty * distance
    }

    /// Take a hit on the armour, return false if the armour is worn out.
    pub fn wear(&mut self) -> bool {
        self.armour = self.armour.saturating_sub(1);
        self.armour > 0
    }
}

/// Items a chicken carries, in the order they were put on.
#[derive(Clone, Default, Eq, PartialEq, Debug)]
pub struct Equipment(Vec<Item>);

impl Equipment {
    pub fn equip(&mut self, item: impl Into<Item>) -> Result<()> {
        let item = item.into();
        let slot = item.kind.slot();
        if self.get(slot).is_some() {
            return Err(Error::SlotTaken(slot));
        }
        self.0.push(item);
        Ok(())
    }

    pub fn unequip(&mut self, slot: Slot) -> Option<Item> {
        let idx = self.0.iter().position(|i| i.kind.slot() == slot)?;
        Some(self.0.remove(idx))
    }

    pub fn get(&self, slot: Slot) -> Option<&Item> {
        self.0.iter().find(|i| i.kind.slot() == slot)
    }

    pub fn has(&self, kind: ItemKind) -> bool {
        self.0.iter().any(|i| i.kind == kind)
    }

    /// First weapon in equipment order.
    pub fn weapon_mut(&mut self) -> Option<&mut Item> {
        self.0.iter_mut().find(|i| i.is_weapon())
    }

    pub fn armour_mut(&mut self) -> Option<&mut Item> {
        self.0.iter_mut().find(|i| i.is_armour())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Item> {
        self.0.iter()
    }
}

impl FromIterator<Item> for Equipment {
    fn from_iter<T: IntoIterator<Item = Item>>(iter: T) -> Self {
        Equipment(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod test {
    use std::str::FromStr;

    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn empty_gun_stays_empty() {
        let mut rifle = Item {
            ammunition: Some(0),
            ..Item::from(ItemKind::Rifle)
        };
        for _ in 0..3 {
            assert!(!rifle.hit_roll(100, None, 0));
            assert_eq!(rifle.ammunition, Some(0));
        }
    }

    #[test]
    fn shooting_spends_rounds() {
        let mut rifle = Item::from(ItemKind::Rifle);
        assert_eq!(rifle.ammunition, Some(5));
        // 100 - 55 + 15 * 1 = 60
        assert!(!rifle.hit_roll(60, None, 1));
        assert!(rifle.hit_roll(61, None, 1));
        assert_eq!(rifle.ammunition, Some(3));

        let mut knife = Item::from(ItemKind::Knife);
        for _ in 0..10 {
            knife.hit_roll(50, None, 1);
        }
        assert_eq!(knife.ammunition, None);
    }

    #[test]
    fn ranges_follow_buildings() {
        let rifle = Item::from(ItemKind::Rifle);
        assert!(rifle.in_range(None, 3));
        assert!(!rifle.in_range(None, 4));
        assert!(rifle.in_range(Some(BuildingKind::Guardtower), 5));

        let knife = Item::from(ItemKind::Knife);
        assert!(knife.in_range(None, 1));
        assert!(!knife.in_range(Some(BuildingKind::Henhouse), 1));

        assert!(!Item::from(ItemKind::Helmet).in_range(None, 0));
    }

    #[test]
    fn one_item_per_slot() {
        let mut eq = Equipment::default();
        eq.equip(ItemKind::Knife).unwrap();
        eq.equip(ItemKind::Helmet).unwrap();
        assert_eq!(
            eq.equip(ItemKind::Rifle),
            Err(Error::SlotTaken(Slot::Weapon))
        );
        assert_eq!(eq.weapon_mut().map(|i| i.kind), Some(ItemKind::Knife));
        assert_eq!(eq.unequip(Slot::Weapon).map(|i| i.kind), Some(ItemKind::Knife));
        eq.equip(ItemKind::Rifle).unwrap();
        assert!(eq.has(ItemKind::Rifle));
        assert_eq!(eq.iter().count(), 2);
    }

    #[test]
    fn armour_wears_out() {
        let mut kevlar = Item::from(ItemKind::Kevlar);
        assert!(kevlar.wear());
        assert!(!kevlar.wear());
    }

    #[test]
    fn item_names() {
        for kind in ItemKind::iter() {
            let name: &'static str = kind.into();
            assert_eq!(ItemKind::from_str(name), Ok(kind));
        }
        assert_eq!(ItemKind::NestEgg.to_string(), "nest-egg");
    }
}
