use burn::data::dataset::Dataset;

use crate::data::grid::{FeatureGrid, TargetGrid};

/// One fully rasterized training sample: the whole site as a
/// single multi-channel image plus its per-cell labels.
#[derive(Debug, Clone)]
pub struct GridSample {
    pub channels:  usize,
    pub grid_size: usize,
    pub features:  Vec<f32>,
    pub targets:   Vec<i64>,
}

impl GridSample {
    pub fn new(features: FeatureGrid, targets: TargetGrid) -> Self {
        let grid_size = features.grid_size;
        let channels  = features.values.len() / (grid_size * grid_size);
        Self {
            channels,
            grid_size,
            features: features.values,
            targets:  targets.labels,
        }
    }
}

/// The training dataset. The full-batch framing means it holds a
/// single sample, but the Dataset impl keeps the training loop on
/// Burn's standard DataLoader path.
pub struct GridDataset {
    samples: Vec<GridSample>,
}

impl GridDataset {
    pub fn new(samples: Vec<GridSample>) -> Self {
        Self { samples }
    }

    pub fn single(features: FeatureGrid, targets: TargetGrid) -> Self {
        Self::new(vec![GridSample::new(features, targets)])
    }
}

impl Dataset<GridSample> for GridDataset {
    fn get(&self, index: usize) -> Option<GridSample> {
        self.samples.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.samples.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_infers_channel_count() {
        let features = FeatureGrid { grid_size: 4, values: vec![0.0; 6 * 16] };
        let targets  = TargetGrid { grid_size: 4, labels: vec![0; 16] };
        let sample = GridSample::new(features, targets);
        assert_eq!(sample.channels, 6);
        assert_eq!(sample.grid_size, 4);
    }

    #[test]
    fn test_dataset_yields_single_sample() {
        let features = FeatureGrid { grid_size: 4, values: vec![0.0; 6 * 16] };
        let targets  = TargetGrid { grid_size: 4, labels: vec![0; 16] };
        let dataset = GridDataset::single(features, targets);
        assert_eq!(dataset.len(), 1);
        assert!(dataset.get(0).is_some());
        assert!(dataset.get(1).is_none());
    }
}
