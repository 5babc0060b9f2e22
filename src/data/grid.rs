// ============================================================
// Layer 4 — Grid Rasterizer
// ============================================================
// Projects point records onto a fixed-size 2D raster. Each
// record lands in exactly one cell:
//
//   grid_x = floor((x - x_min) / (x_max - x_min) * (G - 1))
//
// clamped to [0, G-1], same for y. The cell receives the
// record's normalized feature vector, one channel per feature,
// and (for training) its binary label. When two records map to
// the same cell the later write wins — no aggregation.
//
// Serving rasterizes a single record through the same code path
// with the bounds that were fixed at training time, so one
// request produces a grid with exactly one populated cell.

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use crate::data::encoder::RockTypeEncoder;
use crate::data::normalizer::Normalizer;
use crate::domain::record::{MiningRecord, NUM_FEATURES};
use crate::domain::risk::GridPosition;

// ─── GridBounds ───────────────────────────────────────────────────────────────
/// The coordinate extent of the training set. Fixed when the
/// dataset is first rasterized and persisted in the artifact
/// bundle so serving maps coordinates identically.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridBounds {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

impl GridBounds {
    /// Derive bounds from the training records.
    pub fn from_records(records: &[MiningRecord]) -> Result<Self> {
        if records.is_empty() {
            bail!("cannot derive grid bounds from an empty record set");
        }
        let mut bounds = GridBounds {
            x_min: f64::INFINITY,
            x_max: f64::NEG_INFINITY,
            y_min: f64::INFINITY,
            y_max: f64::NEG_INFINITY,
        };
        for r in records {
            bounds.x_min = bounds.x_min.min(r.x);
            bounds.x_max = bounds.x_max.max(r.x);
            bounds.y_min = bounds.y_min.min(r.y);
            bounds.y_max = bounds.y_max.max(r.y);
        }
        Ok(bounds)
    }

    /// Map a coordinate pair to its raster cell, clamped to the
    /// grid. Coordinates outside the bounds land on the edge.
    pub fn cell_of(&self, x: f64, y: f64, grid_size: usize) -> GridPosition {
        GridPosition {
            x: axis_index(x, self.x_min, self.x_max, grid_size),
            y: axis_index(y, self.y_min, self.y_max, grid_size),
        }
    }
}

fn axis_index(value: f64, min: f64, max: f64, grid_size: usize) -> usize {
    let last = (grid_size - 1) as f64;
    if max <= min {
        // Degenerate extent: every coordinate shares cell 0
        return 0;
    }
    let scaled = ((value - min) / (max - min) * last).floor();
    scaled.clamp(0.0, last) as usize
}

// ─── FeatureGrid / TargetGrid ─────────────────────────────────────────────────
/// The network input: `NUM_FEATURES × G × G` values stored
/// row-major as `[channel][y][x]`.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureGrid {
    pub grid_size: usize,
    pub values:    Vec<f32>,
}

impl FeatureGrid {
    fn zeros(grid_size: usize) -> Self {
        Self {
            grid_size,
            values: vec![0.0; NUM_FEATURES * grid_size * grid_size],
        }
    }

    fn set(&mut self, channel: usize, pos: GridPosition, value: f32) {
        let g = self.grid_size;
        self.values[channel * g * g + pos.y * g + pos.x] = value;
    }

    pub fn get(&self, channel: usize, pos: GridPosition) -> f32 {
        let g = self.grid_size;
        self.values[channel * g * g + pos.y * g + pos.x]
    }
}

/// Ground-truth labels per cell, `[y][x]` row-major.
/// Cells no record maps to stay 0 (safe).
#[derive(Debug, Clone, PartialEq)]
pub struct TargetGrid {
    pub grid_size: usize,
    pub labels:    Vec<i64>,
}

impl TargetGrid {
    fn zeros(grid_size: usize) -> Self {
        Self {
            grid_size,
            labels: vec![0; grid_size * grid_size],
        }
    }

    fn set(&mut self, pos: GridPosition, label: i64) {
        self.labels[pos.y * self.grid_size + pos.x] = label;
    }

    pub fn get(&self, pos: GridPosition) -> i64 {
        self.labels[pos.y * self.grid_size + pos.x]
    }
}

// ─── GridRasterizer ───────────────────────────────────────────────────────────
/// Rasterizes records into feature and target grids using fixed
/// bounds and a fixed edge length.
pub struct GridRasterizer {
    bounds:    GridBounds,
    grid_size: usize,
}

impl GridRasterizer {
    pub fn new(bounds: GridBounds, grid_size: usize) -> Self {
        Self { bounds, grid_size }
    }

    pub fn bounds(&self) -> GridBounds {
        self.bounds
    }

    pub fn grid_size(&self) -> usize {
        self.grid_size
    }

    /// Rasterize the full training set. Records are visited in
    /// order, so on a cell collision the later record's features
    /// and label overwrite the earlier ones.
    pub fn rasterize(
        &self,
        records:    &[MiningRecord],
        encoder:    &RockTypeEncoder,
        normalizer: &Normalizer,
    ) -> (FeatureGrid, TargetGrid) {
        let mut features = FeatureGrid::zeros(self.grid_size);
        let mut targets  = TargetGrid::zeros(self.grid_size);

        for record in records {
            let pos = self.bounds.cell_of(record.x, record.y, self.grid_size);
            self.write_record(&mut features, record, encoder, normalizer, pos);
            targets.set(pos, record.label().unwrap_or(0));
        }

        tracing::debug!(
            "Rasterized {} records onto a {}x{} grid",
            records.len(),
            self.grid_size,
            self.grid_size,
        );
        (features, targets)
    }

    /// Rasterize a single record for inference: an otherwise-zero
    /// grid with the record's normalized features at its own cell.
    pub fn rasterize_one(
        &self,
        record:     &MiningRecord,
        encoder:    &RockTypeEncoder,
        normalizer: &Normalizer,
    ) -> (FeatureGrid, GridPosition) {
        let mut features = FeatureGrid::zeros(self.grid_size);
        let pos = self.bounds.cell_of(record.x, record.y, self.grid_size);
        self.write_record(&mut features, record, encoder, normalizer, pos);
        (features, pos)
    }

    fn write_record(
        &self,
        grid:       &mut FeatureGrid,
        record:     &MiningRecord,
        encoder:    &RockTypeEncoder,
        normalizer: &Normalizer,
        pos:        GridPosition,
    ) {
        let code = encoder.encode(&record.rock_type) as f64;
        let normalized = normalizer.apply(record.feature_vector(code));
        for (channel, value) in normalized.iter().enumerate() {
            grid.set(channel, pos, *value as f32);
        }
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn record(x: f64, y: f64, target: u8) -> MiningRecord {
        MiningRecord {
            x,
            y,
            z: 50.0,
            rock_type: "granite".to_string(),
            ore_grade: 35.0,
            tonnage: 1200.0,
            ore_value: 50.0,
            mining_cost: 30.0,
            processing_cost: 15.0,
            target: Some(target),
        }
    }

    fn fitted(records: &[MiningRecord]) -> (RockTypeEncoder, Normalizer) {
        let encoder = RockTypeEncoder::fit(records);
        let rows: Vec<_> = records
            .iter()
            .map(|r| r.feature_vector(encoder.encode(&r.rock_type) as f64))
            .collect();
        (encoder, Normalizer::fit(&rows))
    }

    #[test]
    fn test_max_coordinate_maps_to_last_cell() {
        let bounds = GridBounds { x_min: 0.0, x_max: 1000.0, y_min: 0.0, y_max: 800.0 };
        let pos = bounds.cell_of(1000.0, 800.0, 64);
        assert_eq!(pos, GridPosition { x: 63, y: 63 });
    }

    #[test]
    fn test_min_coordinate_maps_to_first_cell() {
        let bounds = GridBounds { x_min: 100.0, x_max: 1000.0, y_min: 100.0, y_max: 800.0 };
        assert_eq!(bounds.cell_of(100.0, 100.0, 64), GridPosition { x: 0, y: 0 });
    }

    #[test]
    fn test_indices_stay_in_range_for_in_bounds_coordinates() {
        let bounds = GridBounds { x_min: 0.0, x_max: 997.0, y_min: 3.0, y_max: 811.0 };
        for i in 0..100 {
            let x = 997.0 * (i as f64) / 99.0;
            let y = 3.0 + 808.0 * (i as f64) / 99.0;
            let pos = bounds.cell_of(x, y, 64);
            assert!(pos.x < 64 && pos.y < 64);
        }
    }

    #[test]
    fn test_out_of_bounds_coordinates_clamp_to_edges() {
        let bounds = GridBounds { x_min: 0.0, x_max: 1000.0, y_min: 0.0, y_max: 1000.0 };
        assert_eq!(bounds.cell_of(-50.0, 2000.0, 64), GridPosition { x: 0, y: 63 });
    }

    #[test]
    fn test_degenerate_extent_maps_to_cell_zero() {
        let bounds = GridBounds { x_min: 5.0, x_max: 5.0, y_min: 0.0, y_max: 10.0 };
        assert_eq!(bounds.cell_of(5.0, 10.0, 64).x, 0);
    }

    #[test]
    fn test_rasterization_is_deterministic() {
        let records = vec![record(0.0, 0.0, 0), record(500.0, 400.0, 1), record(1000.0, 800.0, 0)];
        let (encoder, normalizer) = fitted(&records);
        let bounds = GridBounds::from_records(&records).unwrap();
        let rasterizer = GridRasterizer::new(bounds, 16);

        let (f1, t1) = rasterizer.rasterize(&records, &encoder, &normalizer);
        let (f2, t2) = rasterizer.rasterize(&records, &encoder, &normalizer);
        // Bit-identical on repeated runs
        assert_eq!(f1, f2);
        assert_eq!(t1, t2);
    }

    #[test]
    fn test_later_record_wins_cell_collision() {
        let mut a = record(500.0, 400.0, 0);
        a.ore_grade = 10.0;
        let mut b = record(500.0, 400.0, 1);
        b.ore_grade = 90.0;
        // Corner records pin the bounds so a and b share a cell
        let records = vec![record(0.0, 0.0, 0), record(1000.0, 800.0, 0), a, b.clone()];

        let (encoder, normalizer) = fitted(&records);
        let bounds = GridBounds::from_records(&records).unwrap();
        let rasterizer = GridRasterizer::new(bounds, 8);
        let (features, targets) = rasterizer.rasterize(&records, &encoder, &normalizer);

        let pos = bounds.cell_of(500.0, 400.0, 8);
        let expected = normalizer.apply(b.feature_vector(encoder.encode(&b.rock_type) as f64));
        assert_eq!(features.get(0, pos), expected[0] as f32);
        assert_eq!(targets.get(pos), 1);
    }

    #[test]
    fn test_single_record_occupies_exactly_one_cell() {
        let records = vec![record(0.0, 0.0, 0), record(1000.0, 800.0, 1)];
        let (encoder, normalizer) = fitted(&records);
        let bounds = GridBounds::from_records(&records).unwrap();
        let rasterizer = GridRasterizer::new(bounds, 8);

        let (grid, pos) = rasterizer.rasterize_one(&records[1], &encoder, &normalizer);
        assert_eq!(pos, GridPosition { x: 7, y: 7 });

        // Every other cell is untouched on every channel
        let g = grid.grid_size;
        for channel in 0..NUM_FEATURES {
            for y in 0..g {
                for x in 0..g {
                    let cell = GridPosition { x, y };
                    if cell != pos {
                        assert_eq!(grid.get(channel, cell), 0.0);
                    }
                }
            }
        }
    }

    #[test]
    fn test_bounds_from_records() {
        let records = vec![record(10.0, -5.0, 0), record(990.0, 805.0, 1)];
        let bounds = GridBounds::from_records(&records).unwrap();
        assert_eq!(bounds.x_min, 10.0);
        assert_eq!(bounds.x_max, 990.0);
        assert_eq!(bounds.y_min, -5.0);
        assert_eq!(bounds.y_max, 805.0);
    }

    #[test]
    fn test_bounds_require_records() {
        assert!(GridBounds::from_records(&[]).is_err());
    }
}
