use engine::{
    item::Item, prelude::*, BuildingKind, DeathCue, FoxKind, Gameboard,
    ItemKind, LoadError, Msg, NightStatus, Settings, Terrain, TileGrid,
    Vision,
};

const YARD: &str = "
    #####
    #...#
    #...#
    #...#
    #####";

const FARM: &str = "
    %%%%%%%%%%%%
    %..........%
    %.########.%
    %.#......#.%
    %.#......#.%
    %.#......#.%
    %.########.%
    %..........%
    %%%%%%%%%%%%";

fn quiet() -> Settings {
    Settings {
        min_foxes: 0,
        max_foxes: 0,
        ..Default::default()
    }
}

fn run_night(board: &mut Gameboard) -> Vec<Msg> {
    board.start_night();
    while board.night_step() == NightStatus::Ongoing {}
    board.start_day();
    board.drain_messages()
}

fn farm(seed: u64) -> Gameboard {
    let mut board =
        Gameboard::from_ascii(FARM, Settings::default(), seed).unwrap();
    let house = board
        .add_building(BuildingKind::Henhouse, pos(3, 3))
        .unwrap();
    let tower = board
        .add_building(BuildingKind::Guardtower, pos(7, 3))
        .unwrap();
    for x in 3..6 {
        let id = board.add_chicken(pos(x, 5)).unwrap();
        board.house_chicken(id, house).unwrap();
    }
    for x in 7..9 {
        let id = board.add_chicken(pos(x, 5)).unwrap();
        board.house_chicken(id, tower).unwrap();
        board.equip(id, ItemKind::Rifle).unwrap();
    }
    let axe = board.add_chicken(pos(1, 1)).unwrap();
    board.equip(axe, ItemKind::Axe).unwrap();
    board
}

#[test]
fn lone_fox_goes_home_hungry() {
    let mut board = Gameboard::from_ascii(YARD, quiet(), 1).unwrap();
    board.start_night();
    board.add_fox(FoxKind::Fox, pos(-1, 2));

    let mut ticks = 0;
    while board.night_step() == NightStatus::Ongoing {
        ticks += 1;
        assert!(ticks < 10);
    }
    assert!(board.foxes().next().is_none());
    assert_eq!(board.killed_foxes(), 0);
    assert!(board.drain_messages().is_empty());
}

#[test]
fn fox_digs_in_and_eats() {
    let mut board = Gameboard::from_ascii(YARD, quiet(), 1).unwrap();
    board.add_chicken(pos(2, 2)).unwrap();
    board.start_night();
    board.add_fox(FoxKind::Fox, pos(-1, 2));

    while board.night_step() == NightStatus::Ongoing {}
    assert!(board.night_ticks() < Settings::default().max_night_ticks);

    let msgs = board.drain_messages();
    let breach = msgs
        .iter()
        .find_map(|m| match m {
            Msg::Breach { at, explosion } => Some((*at, *explosion)),
            _ => None,
        })
        .expect("fox should get through the fence");
    assert!(!breach.1);
    assert_eq!(board.tiles().get(breach.0), Some(Terrain::BrokenFence));
    assert!(msgs.contains(&Msg::Death {
        at: pos(2, 2),
        cue: DeathCue::Squawk
    }));
    assert!(msgs.contains(&Msg::Chickens(0)));

    // Fed fox went back out.
    assert!(board.foxes().next().is_none());
    assert!(board.chickens().next().is_none());
}

#[test]
fn foxes_strike_first() {
    let mut board = Gameboard::from_ascii(".....\n.....\n.....", quiet(), 1)
        .unwrap();
    let hen = board.add_chicken(pos(2, 1)).unwrap();
    board.equip(hen, ItemKind::Knife).unwrap();
    board.start_night();
    let fox = board.add_fox(FoxKind::Fox, pos(1, 1));

    assert_eq!(board.night_step(), NightStatus::Ongoing);
    assert!(board.chicken(hen).is_none());
    assert_eq!(board.killed_foxes(), 0);
    assert_eq!(board.fox(fox).map(|f| f.position), Some(pos(2, 1)));
}

#[test]
fn armour_saves_a_chicken() {
    let mut board = Gameboard::from_ascii(".....\n.....\n.....", quiet(), 1)
        .unwrap();
    let hen = board.add_chicken(pos(2, 1)).unwrap();
    board.equip(hen, ItemKind::Kevlar).unwrap();
    board.start_night();
    board.add_fox(FoxKind::Fox, pos(1, 1));

    board.night_step();
    let hen = board.chicken(hen).unwrap();
    assert_eq!(
        hen.equipment.iter().find(|i| i.is_armour()).map(|i| i.armour),
        Some(1)
    );
}

#[test]
fn greedy_fox_isnt_fed_by_armour() {
    let mut board = Gameboard::from_ascii(".....\n.....\n.....", quiet(), 1)
        .unwrap();
    let hen = board.add_chicken(pos(2, 1)).unwrap();
    board.equip(hen, ItemKind::Kevlar).unwrap();
    board.start_night();
    let fox = board.add_fox(FoxKind::GreedyFox, pos(1, 1));

    board.night_step();
    assert!(board.chicken(hen).is_some());
    let fox = board.fox(fox).unwrap();
    assert_eq!(fox.eaten, 0);
    assert!(fox.is_hunting());
}

#[test]
fn night_without_chickens_ends_quickly() {
    let mut board = Gameboard::from_ascii(FARM, Settings::default(), 5)
        .unwrap();
    board.start_night();
    assert!(board.foxes().count() >= 3);
    let mut status = NightStatus::Ongoing;
    for _ in 0..5 {
        status = board.night_step();
    }
    assert_eq!(status, NightStatus::Over);
    assert!(board.foxes().next().is_none());
}

#[test]
fn laying_and_hatching() {
    let mut board = Gameboard::from_ascii(".....\n.....\n.....", quiet(), 9)
        .unwrap();
    let house = board
        .add_building(BuildingKind::Henhouse, pos(1, 0))
        .unwrap();
    let hen = board.add_chicken(pos(0, 2)).unwrap();
    board.house_chicken(hen, house).unwrap();

    board.start_night();
    let clutch = board.eggs();
    assert!((1..=4).contains(&clutch));
    assert!(board.chicken(hen).unwrap().equipment.has(ItemKind::NestEgg));
    assert!(board.drain_messages().contains(&Msg::Eggs(clutch)));

    // Sitting on eggs, no new ones.
    board.start_night();
    assert_eq!(board.eggs(), clutch);

    let cash = board.cash();
    board.start_day();
    assert_eq!(board.chickens().count(), 1);
    board.start_night();
    assert_eq!(board.eggs(), clutch);
    board.start_day();

    assert_eq!(board.chickens().count(), 2);
    assert_eq!(board.eggs(), 0);
    assert_eq!(
        board.cash(),
        cash + (clutch as i64 - 1) * Settings::default().egg_price
    );
    assert!(!board.chicken(hen).unwrap().equipment.has(ItemKind::NestEgg));
    // Chick moved in with its mother.
    assert!(board.chickens().all(|c| c.is_housed()));
}

#[test]
fn empty_rifle_never_hits() {
    let mut rifle = Item::from(ItemKind::Rifle);
    rifle.ammunition = Some(0);
    assert!(!rifle.hit_roll(100, None, 1));
    assert_eq!(rifle.ammunition, Some(0));

    let mut rifle = Item::from(ItemKind::Rifle);
    assert!(rifle.hit_roll(100, None, 1));
    assert_eq!(rifle.ammunition, Some(4));
}

#[test]
fn sighting_boundary() {
    let open = Vision::new(None);
    assert!(!open.sees_with_roll(1, 1, 1));
    assert!(open.sees_with_roll(2, 1, 1));

    let tower = Vision::new(Some(BuildingKind::Guardtower));
    assert_eq!(tower.threshold(20, 3), 20);
}

#[test]
fn nights_resume_identically_after_loading() {
    let mut board = farm(42);
    run_night(&mut board);

    let text = board.save().unwrap();
    let mut copy = Gameboard::load(&text).unwrap();
    assert_eq!(copy.save().unwrap(), text);

    for _ in 0..2 {
        let a = run_night(&mut board);
        let b = run_night(&mut copy);
        assert_eq!(a, b);
        assert_eq!(board.save().unwrap(), copy.save().unwrap());
    }
}

#[test]
fn future_saves_are_rejected() {
    let text = farm(1).save().unwrap();
    let future = text.replacen("\"version\":1", "\"version\":2", 1);
    assert!(matches!(
        Gameboard::load(&future),
        Err(LoadError::Version {
            found: 2,
            expected: 1
        })
    ));
}
