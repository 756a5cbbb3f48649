//! Cheap local route planning for foxes.
//!
//! Foxes don't run a proper shortest path search. They compare the straight
//! line to their destination with routes bent through waypoints in their
//! immediate surroundings and take the first step of the cheapest one. This
//! leaves them dumb enough to be outwitted with fence layouts.

use crate::{prelude::*, CostTable, TileGrid};

/// Radius of the square of waypoints a fox considers around itself.
pub const PROBE_RADIUS: i32 = 3;

/// Cost of entering a tile on the way to `dest`.
///
/// Building tiles cost as much as grassland when the building is where the
/// fox is going.
pub fn step_cost(
    tiles: &impl TileGrid,
    costs: &CostTable,
    p: Position,
    dest: Position,
) -> i32 {
    match tiles.get(p) {
        Some(t) if t.is_building() && p.tile() == dest.tile() => {
            costs.cost(Some(crate::Terrain::Grassland))
        }
        t => costs.cost(t),
    }
}

/// Total cost of walking a path.
pub fn path_cost(
    tiles: &impl TileGrid,
    costs: &CostTable,
    path: &[Position],
    dest: Position,
) -> i32 {
    path.iter().map(|&p| step_cost(tiles, costs, p, dest)).sum()
}

/// Plan a route from `from` to `dest` on the same layer.
///
/// Returns the cheapest of the straight line and the lines bent through
/// the in-bounds waypoints in a 7x7 square around `from`. The straight line
/// wins ties. The path excludes `from` and is empty if already there.
pub fn plan(
    tiles: &impl TileGrid,
    costs: &CostTable,
    from: Position,
    dest: Position,
) -> Vec<Position> {
    let dest = dest.layer(from.z);
    let mut best = from.interpolate_to(&dest);
    let mut best_cost = path_cost(tiles, costs, &best, dest);

    for y in -PROBE_RADIUS..=PROBE_RADIUS {
        for x in -PROBE_RADIUS..=PROBE_RADIUS {
            let waypoint = from + glam::ivec2(x, y);
            if waypoint == from
                || waypoint == dest
                || !tiles.in_bounds(waypoint)
            {
                continue;
            }

            let mut path = from.interpolate_to(&waypoint);
            path.extend(waypoint.interpolate_to(&dest));
            let cost = path_cost(tiles, costs, &path, dest);
            if cost < best_cost {
                best = path;
                best_cost = cost;
            }
        }
    }

    best
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{Terrain, Tiles};

    fn map(s: &str) -> Tiles {
        Tiles::from_ascii(s).unwrap()
    }

    #[test]
    fn costs_along_path() {
        let tiles = map(
            "
            .%#
            ...",
        );
        let costs = CostTable::standard();
        let path = [pos(1, 0), pos(2, 0)];
        assert_eq!(path_cost(&tiles, &costs, &path, pos(2, 1)), 26);
        assert_eq!(
            step_cost(&tiles, &costs, pos(5, 5), pos(0, 0)),
            CostTable::OUT_OF_BOUNDS
        );
    }

    #[test]
    fn buildings_are_cheap_when_targeted() {
        let tiles = map(
            "
            ..HH
            ..HH",
        );
        let costs = CostTable::standard();
        assert_eq!(step_cost(&tiles, &costs, pos(2, 0), pos(3, 1)), 30);
        assert_eq!(step_cost(&tiles, &costs, pos(2, 0), pos(2, 0)), 2);
        assert_eq!(
            step_cost(&tiles, &costs, Position::new(2, 0, 1), pos(2, 0)),
            costs.cost(Some(Terrain::Grassland))
        );
    }

    #[test]
    fn straight_line_on_open_ground() {
        let tiles = Tiles::new(10, 10);
        let path = plan(&tiles, &CostTable::standard(), pos(0, 0), pos(5, 0));
        assert_eq!(path.first(), Some(&pos(1, 0)));
        assert_eq!(path.last(), Some(&pos(5, 0)));
        assert_eq!(path.len(), 5);
    }

    #[test]
    fn goes_around_fence_stub() {
        let tiles = map(
            "
            .......
            ...#...
            ...#...
            ...#...
            .......",
        );
        let path = plan(&tiles, &CostTable::standard(), pos(1, 2), pos(5, 2));
        assert_eq!(path.last(), Some(&pos(5, 2)));
        assert!(path
            .iter()
            .all(|&p| tiles.get(p) != Some(Terrain::Fence)));
    }

    #[test]
    fn prefers_woods() {
        let tiles = map(
            "
            .%%%.
            .....",
        );
        let path = plan(&tiles, &CostTable::standard(), pos(0, 1), pos(4, 1));
        assert_eq!(path.last(), Some(&pos(4, 1)));
        assert!(path
            .iter()
            .any(|&p| tiles.get(p) == Some(Terrain::Woodland)));
    }
}
