//! Spatial model - bounded rectangular grid of cells

use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::rng::SimRng;

pub const DEFAULT_DEPTH: u32 = 80;
pub const DEFAULT_WIDTH: u32 = 120;

/// Cell position in the grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Location {
    pub row: u32,
    pub col: u32,
}

impl Location {
    pub fn new(row: u32, col: u32) -> Self {
        Self { row, col }
    }

    /// Chebyshev distance between two positions
    pub fn distance(self, other: Location) -> u32 {
        self.row.abs_diff(other.row).max(self.col.abs_diff(other.col))
    }
}

/// Grid bounds. Every query is computed purely from these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid {
    depth: u32,
    width: u32,
}

impl Grid {
    /// Build a grid, replacing degenerate dimensions with the defaults.
    pub fn new(depth: u32, width: u32) -> Self {
        if depth == 0 || width == 0 {
            warn!(
                depth,
                width,
                default_depth = DEFAULT_DEPTH,
                default_width = DEFAULT_WIDTH,
                "grid dimensions must be positive, using defaults"
            );
            return Self {
                depth: DEFAULT_DEPTH,
                width: DEFAULT_WIDTH,
            };
        }
        Self { depth, width }
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn cell_count(&self) -> usize {
        self.depth as usize * self.width as usize
    }

    pub fn contains(&self, loc: Location) -> bool {
        loc.row < self.depth && loc.col < self.width
    }

    /// All cells in row-major order.
    pub fn locations(&self) -> impl Iterator<Item = Location> + '_ {
        (0..self.depth).flat_map(move |row| (0..self.width).map(move |col| Location::new(row, col)))
    }

    /// In-bounds cells at Chebyshev distance 1, shuffled.
    pub fn neighbors(&self, loc: Location, rng: &mut SimRng) -> Vec<Location> {
        self.within_radius(loc, 1, rng)
    }

    /// In-bounds cells at Chebyshev distance `1..=radius`, shuffled.
    ///
    /// Callers rely on the order being unbiased, never on specific values.
    pub fn within_radius(&self, loc: Location, radius: u32, rng: &mut SimRng) -> Vec<Location> {
        let row_lo = loc.row.saturating_sub(radius);
        let row_hi = loc.row.saturating_add(radius).min(self.depth.saturating_sub(1));
        let col_lo = loc.col.saturating_sub(radius);
        let col_hi = loc.col.saturating_add(radius).min(self.width.saturating_sub(1));

        let mut cells = Vec::new();
        for row in row_lo..=row_hi {
            for col in col_lo..=col_hi {
                let candidate = Location::new(row, col);
                if candidate != loc && self.contains(candidate) {
                    cells.push(candidate);
                }
            }
        }
        cells.shuffle(rng);
        cells
    }
}
