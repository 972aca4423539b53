use std::collections::BTreeSet;

use noise::NoiseFn;
use rayon::prelude::*;

use crate::world::lattice::LatticeNoise;
use crate::world::Cell;

/// Step between consecutive noise samples along the river.
pub const NOISE_SCALE: f64 = 0.2;
/// Smallest grid the generator can lay a river across.
pub const MIN_GRID_SIZE: usize = 4;
/// Maximum meander offset in cells either side of the diagonal.
pub const MEANDER_AMPLITUDE: f64 = 5.0;

/// The set of cells occupied by the river.
///
/// Built once per run from a noisy diagonal center line that is widened by a
/// fixed radius. Membership never changes until the next reset.
#[derive(Debug, Clone, PartialEq)]
pub struct RiverPath {
    grid_size: usize,
    center: BTreeSet<Cell>,
    cells: BTreeSet<Cell>,
    membership: Vec<bool>,
}

impl RiverPath {
    /// Generate the river for a `grid_size`² grid using lattice noise keyed by `seed`.
    ///
    /// Requires `grid_size >= 4`; callers go through validated configuration.
    pub(crate) fn generate(grid_size: usize, river_width: f32, seed: u32) -> RiverPath {
        Self::generate_with_noise(grid_size, river_width, &LatticeNoise::new(seed))
    }

    /// Generate the river with an arbitrary 1D noise source.
    ///
    /// Walks `x` from 1 to `N-2`. At each step the target row follows the
    /// diagonal from (1,1) to (N-2,N-2), displaced by the noise, and every
    /// row between the previous and the new target is added to the center
    /// line so consecutive steps always touch.
    pub(crate) fn generate_with_noise<N: NoiseFn<f64, 1>>(
        grid_size: usize,
        river_width: f32,
        noise: &N,
    ) -> RiverPath {
        debug_assert!(grid_size >= MIN_GRID_SIZE);

        let start = 1usize;
        let end = grid_size - 2;
        let span = (end - start) as f64;

        let mut center = BTreeSet::new();
        let mut current = start;
        for x in start..=end {
            let trend = (start as f64 + span * ((x - start) as f64 / span)) as i64;
            let offset =
                ((noise.get([x as f64 * NOISE_SCALE]) * 2.0 - 1.0) * MEANDER_AMPLITUDE) as i64;
            let next = (trend + offset).clamp(start as i64, end as i64) as usize;

            for y in current.min(next)..=current.max(next) {
                center.insert(Cell::new(x, y));
            }
            current = next;
        }

        let cells = widen(grid_size, &center, river_width);
        Self::from_parts(grid_size, center, cells)
    }

    fn from_parts(grid_size: usize, center: BTreeSet<Cell>, cells: BTreeSet<Cell>) -> RiverPath {
        let mut membership = vec![false; grid_size * grid_size];
        for cell in &cells {
            membership[cell.y * grid_size + cell.x] = true;
        }
        RiverPath {
            grid_size,
            center,
            cells,
            membership,
        }
    }

    pub fn grid_size(&self) -> usize {
        self.grid_size
    }

    pub fn contains(&self, cell: Cell) -> bool {
        cell.x < self.grid_size
            && cell.y < self.grid_size
            && self.membership[cell.y * self.grid_size + cell.x]
    }

    /// Cells of the full river area, in (x, y) order.
    pub fn cells(&self) -> impl Iterator<Item = Cell> + '_ {
        self.cells.iter().copied()
    }

    /// Cells of the un-widened center line.
    pub fn center(&self) -> impl Iterator<Item = Cell> + '_ {
        self.center.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Distance from `cell` to the closest center-line cell.
    pub fn distance_to_center(&self, cell: Cell) -> f32 {
        self.center
            .iter()
            .map(|c| cell.distance_sq(*c))
            .min()
            .map(|d| (d as f32).sqrt())
            .unwrap_or(f32::INFINITY)
    }
}

/// Every cell whose distance to the nearest center cell is within `width`.
fn widen(grid_size: usize, center: &BTreeSet<Cell>, width: f32) -> BTreeSet<Cell> {
    let center: Vec<Cell> = center.iter().copied().collect();
    let limit = width * width;

    let cells: Vec<Cell> = (0..grid_size * grid_size)
        .into_par_iter()
        .map(|idx| Cell::new(idx % grid_size, idx / grid_size))
        .filter(|cell| {
            center
                .iter()
                .map(|c| cell.distance_sq(*c))
                .min()
                .is_some_and(|d| d as f32 <= limit)
        })
        .collect();

    cells.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    /// Noise source returning a fixed value.
    struct Flat(f64);

    impl NoiseFn<f64, 1> for Flat {
        fn get(&self, _point: [f64; 1]) -> f64 {
            self.0
        }
    }

    fn components(cells: &BTreeSet<Cell>, diagonal: bool) -> usize {
        let mut seen = BTreeSet::new();
        let mut count = 0;
        for &start in cells {
            if !seen.insert(start) {
                continue;
            }
            count += 1;
            let mut queue = VecDeque::from([start]);
            while let Some(cell) = queue.pop_front() {
                for dx in -1i64..=1 {
                    for dy in -1i64..=1 {
                        if (dx == 0 && dy == 0) || (!diagonal && dx != 0 && dy != 0) {
                            continue;
                        }
                        let nx = cell.x as i64 + dx;
                        let ny = cell.y as i64 + dy;
                        if nx < 0 || ny < 0 {
                            continue;
                        }
                        let n = Cell::new(nx as usize, ny as usize);
                        if cells.contains(&n) && seen.insert(n) {
                            queue.push_back(n);
                        }
                    }
                }
            }
        }
        count
    }

    #[test]
    fn generation_is_deterministic() {
        let a = RiverPath::generate(20, 2.0, 12345);
        let b = RiverPath::generate(20, 2.0, 12345);
        assert_eq!(a, b);
    }

    #[test]
    fn center_line_is_connected_and_spans_both_ends() {
        for seed in [1, 42, 12345, 99_999] {
            let river = RiverPath::generate(20, 2.0, seed);
            let center: BTreeSet<Cell> = river.center().collect();
            assert_eq!(components(&center, false), 1, "seed {}", seed);
            assert!(center.contains(&Cell::new(1, 1)), "seed {}", seed);
            assert!(center.iter().any(|c| c.x == 1));
            assert!(center.iter().any(|c| c.x == 18));
        }
    }

    #[test]
    fn widened_river_is_connected() {
        for seed in [3, 77, 12345] {
            let river = RiverPath::generate(20, 2.0, seed);
            let cells: BTreeSet<Cell> = river.cells().collect();
            assert_eq!(components(&cells, true), 1, "seed {}", seed);
        }
    }

    #[test]
    fn widened_area_respects_width() {
        let river = RiverPath::generate(20, 2.0, 5);
        for x in 0..20 {
            for y in 0..20 {
                let cell = Cell::new(x, y);
                let near = river.distance_to_center(cell) <= 2.0;
                assert_eq!(river.contains(cell), near, "cell {:?}", cell);
            }
        }
    }

    #[test]
    fn center_cells_are_inside_the_margin() {
        let river = RiverPath::generate(20, 2.0, 8);
        for c in river.center() {
            assert!((1..=18).contains(&c.x));
            assert!((1..=18).contains(&c.y));
        }
    }

    #[test]
    fn neutral_noise_staircases_along_the_diagonal() {
        // Each step keeps the previous row, so the line climbs in stairs.
        let river = RiverPath::generate_with_noise(10, 0.0, &Flat(0.5));
        let center: Vec<Cell> = river.center().collect();
        let mut staircase = vec![Cell::new(1, 1)];
        for i in 2..=8 {
            staircase.push(Cell::new(i, i - 1));
            staircase.push(Cell::new(i, i));
        }
        assert_eq!(center, staircase);
        assert_eq!(river.len(), 15);
    }

    #[test]
    fn maximal_noise_fills_gaps_between_rows() {
        // Offset of +5 pushes the first step from row 1 to row 6.
        let river = RiverPath::generate_with_noise(20, 0.0, &Flat(1.0));
        for y in 1..=6 {
            assert!(river.contains(Cell::new(1, y)), "missing (1, {})", y);
        }
    }

    #[test]
    fn river_leaves_enough_land_on_default_grid() {
        for seed in 0..50 {
            let river = RiverPath::generate(20, 2.0, seed);
            assert!(400 - river.len() >= 200, "seed {} leaves too little land", seed);
        }
    }

    #[test]
    fn smallest_grid_generates() {
        let river = RiverPath::generate(4, 2.0, 12345);
        assert!(river.contains(Cell::new(1, 1)));
        assert!(river.center().any(|c| c.x == 2));
    }

    #[test]
    fn out_of_range_cells_are_not_river() {
        let river = RiverPath::generate(20, 2.0, 1);
        assert!(!river.contains(Cell::new(20, 0)));
        assert!(!river.contains(Cell::new(0, 25)));
    }
}
