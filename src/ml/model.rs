use burn::{
    nn::{
        conv::{Conv2d, Conv2dConfig},
        BatchNorm, BatchNormConfig, PaddingConfig2d,
    },
    prelude::*,
    tensor::activation::{log_softmax, softmax},
};

use crate::domain::risk::{CLASS_RISK, CLASS_SAFE};

/// Number of output classes per cell: safe and risk.
pub const NUM_CLASSES: usize = 2;

// NOTE: #[derive(Config)] already generates Clone and Serialize/Deserialize
// internally — do NOT add them again or you get conflicting impls.
#[derive(Config, Debug)]
pub struct RiskCnnConfig {
    pub in_channels: usize,
    pub grid_size:   usize,

    /// Width of the first convolution stage
    #[config(default = 16)]
    pub width1: usize,

    /// Width of the second convolution stage
    #[config(default = 32)]
    pub width2: usize,
}

impl RiskCnnConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> RiskCnn<B> {
        // 3x3 kernels with unit padding keep the raster size, so
        // every cell gets a logit pair
        let conv1 = Conv2dConfig::new([self.in_channels, self.width1], [3, 3])
            .with_padding(PaddingConfig2d::Explicit(1, 1))
            .init(device);
        let bn1 = BatchNormConfig::new(self.width1).init(device);

        let conv2 = Conv2dConfig::new([self.width1, self.width2], [3, 3])
            .with_padding(PaddingConfig2d::Explicit(1, 1))
            .init(device);
        let bn2 = BatchNormConfig::new(self.width2).init(device);

        let head = Conv2dConfig::new([self.width2, NUM_CLASSES], [1, 1]).init(device);

        RiskCnn { conv1, bn1, conv2, bn2, head }
    }
}

/// Fully-convolutional cell classifier:
/// two 3x3 conv + batch-norm + ReLU stages, then a 1x1
/// projection to per-cell class logits.
#[derive(Module, Debug)]
pub struct RiskCnn<B: Backend> {
    pub conv1: Conv2d<B>,
    pub bn1:   BatchNorm<B>,
    pub conv2: Conv2d<B>,
    pub bn2:   BatchNorm<B>,
    pub head:  Conv2d<B>,
}

/// Both views of the head output: log-probabilities feed the
/// training loss, probabilities feed confidence reporting.
pub struct RiskCnnOutput<B: Backend> {
    /// [batch, 2, G, G]
    pub log_probs: Tensor<B, 4>,
    /// [batch, 2, G, G]
    pub probs: Tensor<B, 4>,
}

impl<B: Backend> RiskCnn<B> {
    /// input: [batch, channels, G, G] → log-probs and probs, each [batch, 2, G, G]
    pub fn forward(&self, input: Tensor<B, 4>) -> RiskCnnOutput<B> {
        let x = burn::tensor::activation::relu(self.bn1.forward(self.conv1.forward(input)));
        let x = burn::tensor::activation::relu(self.bn2.forward(self.conv2.forward(x)));
        let logits = self.head.forward(x);

        RiskCnnOutput {
            log_probs: log_softmax(logits.clone(), 1),
            probs:     softmax(logits, 1),
        }
    }

    /// Negative log-likelihood of the target grid under the
    /// predicted per-cell distribution, averaged over cells.
    pub fn forward_loss(
        &self,
        input:   Tensor<B, 4>,
        targets: Tensor<B, 3, Int>,
    ) -> (Tensor<B, 1>, RiskCnnOutput<B>) {
        let output = self.forward(input);
        let [batch, _, height, width] = output.log_probs.dims();

        // [batch, 2, G, G] → [batch*G*G, 2] so each row is one cell's
        // class distribution
        let log_flat = output
            .log_probs
            .clone()
            .permute([0, 2, 3, 1])
            .reshape([batch * height * width, NUM_CLASSES]);
        let target_flat = targets.reshape([batch * height * width]);

        // Pick the log-probability of each cell's true class
        let picked = log_flat.gather(1, target_flat.unsqueeze_dim::<2>(1));
        let loss = picked.mean().neg();

        (loss, output)
    }
}

/// Per-cell readout of the predicted class and its probability.
pub fn class_and_confidence(p_safe: f32, p_risk: f32) -> (usize, f32) {
    if p_risk > p_safe {
        (CLASS_RISK, p_risk)
    } else {
        (CLASS_SAFE, p_safe)
    }
}
