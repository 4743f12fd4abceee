// THEORY:
// The line-of-sight oracle answers one question: can a viewer standing on one
// cell see another cell? It rasterizes the straight segment between the two
// cells with integer Bresenham stepping and walks it cell by cell. Every cell on
// the walk, both endpoints included, must be in-bounds and open. The walk stops
// at the first cell that fails, so an early wall costs only the steps up to it.
//
// Bresenham's tie-breaking is direction dependent: the walk from A to B can pass
// through different cells than the walk from B to A. The oracle always walks
// from the endpoint with the smaller linear index to the larger one, so that
// `can_see(a, b) == can_see(b, a)` for every pair.
//
// The oracle is a stateless utility. It allocates nothing, runs in
// O(max(dx, dy)) steps and depends only on the two coordinates and the grid.

pub mod line_of_sight {
    use crate::core_modules::occupancy_grid::{Coordinate, OccupancyGrid};

    /// True iff every cell on the rasterized segment between the two cells is open.
    pub fn can_see(grid: &OccupancyGrid, x0: i32, y0: i32, x1: i32, y1: i32) -> bool {
        can_see_between(grid, Coordinate::new(x0, y0), Coordinate::new(x1, y1))
    }

    pub fn can_see_between(grid: &OccupancyGrid, a: Coordinate, b: Coordinate) -> bool {
        // Both endpoints in-grid bounds every delta by the grid size.
        if !grid.is_open(a.x, a.y) || !grid.is_open(b.x, b.y) {
            return false;
        }
        let (from, to) = if b < a { (b, a) } else { (a, b) };
        trace_clear(grid, from, to)
    }

    /// Walks from `from` to `to` and stops at the first cell that is not open.
    fn trace_clear(grid: &OccupancyGrid, from: Coordinate, to: Coordinate) -> bool {
        let dx = (to.x as i64 - from.x as i64).abs();
        let dy = (to.y as i64 - from.y as i64).abs();
        let sx = if from.x < to.x { 1 } else { -1 };
        let sy = if from.y < to.y { 1 } else { -1 };
        let mut err = dx - dy;
        let (mut x, mut y) = (from.x, from.y);

        loop {
            if !grid.is_open(x, y) {
                return false;
            }
            if x == to.x && y == to.y {
                return true;
            }
            let e2 = 2 * err;
            if e2 > -dy {
                err -= dy;
                x += sx;
            }
            if e2 < dx {
                err += dx;
                y += sy;
            }
        }
    }

    /// The cells of the segment from `from` to `to`, both inclusive, in walk order.
    /// This is the raw directional walk; `can_see` orders its endpoints first.
    /// Works for any pair of `i32` coordinates; the error term is kept in `i64`.
    pub fn line_cells(from: Coordinate, to: Coordinate) -> LineCells {
        let dx = (to.x as i64 - from.x as i64).abs();
        let dy = (to.y as i64 - from.y as i64).abs();
        LineCells {
            x: from.x,
            y: from.y,
            to,
            dx,
            dy,
            sx: if from.x < to.x { 1 } else { -1 },
            sy: if from.y < to.y { 1 } else { -1 },
            err: dx - dy,
            done: false,
        }
    }

    /// Allocation-free iterator over a Bresenham segment.
    #[derive(Debug, Clone)]
    pub struct LineCells {
        x: i32,
        y: i32,
        to: Coordinate,
        dx: i64,
        dy: i64,
        sx: i32,
        sy: i32,
        err: i64,
        done: bool,
    }

    impl Iterator for LineCells {
        type Item = Coordinate;

        fn next(&mut self) -> Option<Coordinate> {
            if self.done {
                return None;
            }
            let current = Coordinate::new(self.x, self.y);
            if current == self.to {
                self.done = true;
                return Some(current);
            }
            let e2 = 2 * self.err;
            if e2 > -self.dy {
                self.err -= self.dy;
                self.x += self.sx;
            }
            if e2 < self.dx {
                self.err += self.dx;
                self.y += self.sy;
            }
            Some(current)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::line_of_sight::*;
    use crate::core_modules::occupancy_grid::{Coordinate, OccupancyGrid};

    fn grid_from_rows(rows: &[&str]) -> OccupancyGrid {
        let height = rows.len() as u32;
        let width = rows[0].len() as u32;
        let cells = rows.iter().flat_map(|row| row.chars().map(|c| c == '.')).collect();
        OccupancyGrid::from_cells(width, height, cells).unwrap()
    }

    /// Deterministic scatter of walls, roughly one cell in five.
    fn scattered(width: u32, height: u32) -> OccupancyGrid {
        let cells = (0..width * height)
            .map(|i| {
                let (x, y) = (i % width, i / width);
                (x * 7 + y * 13 + x * y) % 5 != 0
            })
            .collect();
        OccupancyGrid::from_cells(width, height, cells).unwrap()
    }

    #[test]
    fn blocked_midpoint_and_blocked_target_hide() {
        let grid = grid_from_rows(&[".#."]);
        assert!(!can_see(&grid, 0, 0, 2, 0));
        assert!(!can_see(&grid, 0, 0, 1, 0));
        assert!(!can_see(&grid, 1, 0, 0, 0));
    }

    #[test]
    fn self_visibility_follows_the_cell() {
        let grid = grid_from_rows(&[".#"]);
        assert!(can_see(&grid, 0, 0, 0, 0));
        assert!(!can_see(&grid, 1, 0, 1, 0));
        assert!(!can_see(&grid, 5, 5, 5, 5));
    }

    #[test]
    fn out_of_bounds_endpoint_is_not_visible() {
        let grid = grid_from_rows(&["...", "..."]);
        assert!(!can_see(&grid, 0, 0, 3, 0));
        assert!(!can_see(&grid, -1, 0, 1, 1));
    }

    #[test]
    fn open_room_sees_every_cell() {
        let grid = grid_from_rows(&["....", "....", "...."]);
        for a in grid.coordinates() {
            for b in grid.coordinates() {
                assert!(can_see_between(&grid, a, b), "{a} should see {b}");
            }
        }
    }

    #[test]
    fn diagonal_wall_blocks_across() {
        let grid = grid_from_rows(&["..#", ".#.", "#.."]);
        assert!(!can_see(&grid, 0, 0, 2, 2));
        assert!(can_see(&grid, 0, 0, 1, 0));
        assert!(can_see(&grid, 0, 0, 0, 1));
    }

    #[test]
    fn direction_dependent_walk_is_resolved_symmetrically() {
        // Walking (0,0)->(2,1) passes (1,0); walking back passes (1,1).
        let forward: Vec<_> = line_cells(Coordinate::new(0, 0), Coordinate::new(2, 1)).collect();
        let backward: Vec<_> = line_cells(Coordinate::new(2, 1), Coordinate::new(0, 0)).collect();
        assert!(forward.contains(&Coordinate::new(1, 0)));
        assert!(backward.contains(&Coordinate::new(1, 1)));

        let grid = grid_from_rows(&[".#.", "..."]);
        assert_eq!(can_see(&grid, 0, 0, 2, 1), can_see(&grid, 2, 1, 0, 0));
        assert!(!can_see(&grid, 2, 1, 0, 0));
    }

    #[test]
    fn visibility_is_symmetric_on_a_cluttered_map() {
        let grid = scattered(9, 7);
        for a in grid.coordinates() {
            for b in grid.coordinates() {
                assert_eq!(
                    can_see_between(&grid, a, b),
                    can_see_between(&grid, b, a),
                    "asymmetry between {a} and {b}"
                );
            }
        }
    }

    #[test]
    fn oracle_agrees_with_ordered_walk() {
        let grid = scattered(8, 6);
        for a in grid.coordinates() {
            for b in grid.coordinates() {
                let (from, to) = if b < a { (b, a) } else { (a, b) };
                let walk_clear = line_cells(from, to).all(|c| grid.is_open(c.x, c.y));
                assert_eq!(can_see_between(&grid, a, b), walk_clear);
            }
        }
    }

    #[test]
    fn far_out_of_range_endpoints_are_not_visible() {
        let grid = grid_from_rows(&[".."]);
        assert!(!can_see(&grid, i32::MIN, 0, 0, 0));
        assert!(!can_see(&grid, 0, 0, i32::MAX, 0));
        assert!(!can_see(&grid, i32::MIN, i32::MIN, i32::MAX, i32::MAX));
        assert!(!can_see(&grid, 1, 0, 1, i32::MIN));
    }

    #[test]
    fn line_cells_span_the_full_coordinate_range() {
        let mut cells = line_cells(Coordinate::new(i32::MIN, 0), Coordinate::new(i32::MAX, 1));
        assert_eq!(cells.next(), Some(Coordinate::new(i32::MIN, 0)));
        assert_eq!(cells.next(), Some(Coordinate::new(i32::MIN + 1, 0)));

        let short: Vec<_> =
            line_cells(Coordinate::new(i32::MAX, 0), Coordinate::new(i32::MAX - 2, 0)).collect();
        assert_eq!(short.len(), 3);
        assert_eq!(short.last(), Some(&Coordinate::new(i32::MAX - 2, 0)));
    }

    #[test]
    fn line_cells_include_both_endpoints() {
        let cells: Vec<_> = line_cells(Coordinate::new(1, 1), Coordinate::new(4, 3)).collect();
        assert_eq!(cells.first(), Some(&Coordinate::new(1, 1)));
        assert_eq!(cells.last(), Some(&Coordinate::new(4, 3)));
        assert_eq!(cells.len(), 4);

        let single: Vec<_> = line_cells(Coordinate::new(2, 2), Coordinate::new(2, 2)).collect();
        assert_eq!(single, vec![Coordinate::new(2, 2)]);
    }
}
