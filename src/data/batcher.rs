// ============================================================
// Layer 4 — Grid Batcher
// ============================================================
// Implements Burn's Batcher trait to convert rasterized grid
// samples into tensors:
//
//   features: [batch, channels, G, G]  (float)
//   targets:  [batch, G, G]            (int)
//
// Samples are flattened into one contiguous Vec and reshaped, so
// the whole batch lands on the device in a single transfer.
//
// Reference: Burn Book §4 (Batcher)

use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
};

use crate::data::dataset::GridSample;

/// A batch of grid samples ready for the model forward pass.
#[derive(Debug, Clone)]
pub struct GridBatch<B: Backend> {
    /// Feature channels — shape: [batch, channels, G, G]
    pub features: Tensor<B, 4>,

    /// Ground-truth cell labels — shape: [batch, G, G]
    pub targets: Tensor<B, 3, Int>,
}

/// Holds the target device so tensors are created where the
/// model lives.
#[derive(Clone, Debug)]
pub struct GridBatcher<B: Backend> {
    device: B::Device,
}

impl<B: Backend> GridBatcher<B> {
    pub fn new(device: B::Device) -> Self {
        Self { device }
    }
}

impl<B: Backend> Batcher<B, GridSample, GridBatch<B>> for GridBatcher<B> {
    fn batch(&self, items: Vec<GridSample>, _device: &B::Device) -> GridBatch<B> {
        let batch_size = items.len();
        let channels   = items[0].channels;
        let grid_size  = items[0].grid_size;

        let feature_flat: Vec<f32> = items
            .iter()
            .flat_map(|s| s.features.iter().copied())
            .collect();

        let target_flat: Vec<i64> = items
            .iter()
            .flat_map(|s| s.targets.iter().copied())
            .collect();

        let features = Tensor::<B, 1>::from_floats(feature_flat.as_slice(), &self.device)
            .reshape([batch_size, channels, grid_size, grid_size]);

        let targets = Tensor::<B, 1, Int>::from_ints(target_flat.as_slice(), &self.device)
            .reshape([batch_size, grid_size, grid_size]);

        GridBatch { features, targets }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type TestBackend = burn::backend::NdArray;

    #[test]
    fn test_batch_shapes() {
        let sample = GridSample {
            channels:  6,
            grid_size: 8,
            features:  vec![0.5; 6 * 64],
            targets:   vec![1; 64],
        };
        let device = Default::default();
        let batcher = GridBatcher::<TestBackend>::new(device);
        let batch = batcher.batch(vec![sample], &Default::default());

        assert_eq!(batch.features.dims(), [1, 6, 8, 8]);
        assert_eq!(batch.targets.dims(), [1, 8, 8]);
    }
}
