#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::sequencing::scale::{Scale, BASE_FREQUENCY};

/// Default playing-surface size (cells per side).
pub const DEFAULT_GRID_SIZE: u8 = 15;

/// One cell of the playing surface, in visual coordinates: `(0, 0)` is the
/// top-left corner, `y` grows downward. A plain value type so it can key
/// the voice table directly.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cell {
    pub x: u8,
    pub y: u8,
}

impl Cell {
    pub fn new(x: u8, y: u8) -> Self {
        Self { x, y }
    }
}

/*
Frequency Map
=============

Maps every grid cell to a frequency, built once per (scale, grid size) pair:

  - Visual y is inverted so "up" on screen is higher pitch: the bottom row
    of the grid is musical row 0.
  - Musical rows climb one octave every 3 rows (octave = row / 3).
  - Columns walk the scale degrees, wrapping (note = col % ratios.len()).
  - frequency = BASE_FREQUENCY * ratio[note] * 2^octave

The build is a pure function of its inputs - rebuilding with the same scale
and size yields bit-identical frequencies, which is what lets a scale change
be undone exactly.
*/
pub struct FrequencyMap {
    grid_size: u8,
    /// Indexed by `visual_y * grid_size + x`.
    frequencies: Vec<f32>,
}

impl FrequencyMap {
    pub fn build(scale: Scale, grid_size: u8) -> Self {
        let n = grid_size as usize;
        let ratios = scale.ratios();
        let mut frequencies = vec![0.0; n * n];

        for row in 0..n {
            let octave = (row / 3) as i32;
            let octave_mult = 2.0f32.powi(octave);
            let visual_y = n - 1 - row;
            for col in 0..n {
                let ratio = ratios[col % ratios.len()];
                frequencies[visual_y * n + col] = BASE_FREQUENCY * ratio * octave_mult;
            }
        }

        Self {
            grid_size,
            frequencies,
        }
    }

    /// The frequency for `cell`, or `None` if the cell lies outside the
    /// grid. Out-of-range cells are how stale tracker input shows up, so
    /// callers treat `None` as a silent no-op.
    pub fn frequency(&self, cell: Cell) -> Option<f32> {
        if cell.x >= self.grid_size || cell.y >= self.grid_size {
            return None;
        }
        let idx = cell.y as usize * self.grid_size as usize + cell.x as usize;
        Some(self.frequencies[idx])
    }

    pub fn grid_size(&self) -> u8 {
        self.grid_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bottom_left_is_base_frequency() {
        // Visual (0, 14) on a 15-grid is musical row 0, degree 0.
        let map = FrequencyMap::build(Scale::Pentatonic, 15);
        assert_eq!(map.frequency(Cell::new(0, 14)), Some(220.0));
    }

    #[test]
    fn up_is_higher_pitch() {
        let map = FrequencyMap::build(Scale::Pentatonic, 15);
        let low = map.frequency(Cell::new(0, 14)).unwrap();
        let high = map.frequency(Cell::new(0, 0)).unwrap();
        assert!(high > low);
    }

    #[test]
    fn octave_steps_every_three_rows() {
        let map = FrequencyMap::build(Scale::Major, 15);
        let row0 = map.frequency(Cell::new(0, 14)).unwrap();
        let row3 = map.frequency(Cell::new(0, 11)).unwrap();
        let row6 = map.frequency(Cell::new(0, 8)).unwrap();
        assert_eq!(row3, row0 * 2.0);
        assert_eq!(row6, row0 * 4.0);
    }

    #[test]
    fn columns_wrap_the_scale() {
        let map = FrequencyMap::build(Scale::Pentatonic, 15);
        // Pentatonic has 5 degrees: column 5 repeats column 0.
        let a = map.frequency(Cell::new(0, 14)).unwrap();
        let b = map.frequency(Cell::new(5, 14)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn rebuild_is_deterministic() {
        let a = FrequencyMap::build(Scale::Blues, 15);
        let b = FrequencyMap::build(Scale::Blues, 15);
        assert_eq!(a.frequencies, b.frequencies);
    }

    #[test]
    fn out_of_range_cell_is_none() {
        let map = FrequencyMap::build(Scale::Pentatonic, 15);
        assert_eq!(map.frequency(Cell::new(15, 0)), None);
        assert_eq!(map.frequency(Cell::new(0, 15)), None);
        assert_eq!(map.frequency(Cell::new(200, 200)), None);
    }
}
