// ============================================================
// Layer 5 — Training Loop
// ============================================================
// Full-batch training: the entire site is one rasterized image,
// and every epoch is one forward/backward pass over it with a
// fixed-learning-rate Adam update. Runs for a fixed number of
// epochs — no early stopping, no validation split, no LR
// schedule, no mid-run checkpointing. The final weights are
// written once at the end, overwriting any prior artifact.
//
// Reference: Burn Book §5, Kingma & Ba (2015) Adam

use anyhow::Result;
use burn::{
    data::dataloader::DataLoaderBuilder,
    module::AutodiffModule,
    optim::{AdamConfig, GradientsParams, Optimizer},
    prelude::*,
};

use crate::application::train_use_case::TrainConfig;
use crate::data::{batcher::GridBatcher, dataset::GridDataset};
use crate::infra::artifact::ArtifactStore;
use crate::infra::metrics::{EpochMetrics, MetricsLogger};
use crate::ml::model::RiskCnn;

type TrainBackend = burn::backend::Autodiff<burn::backend::NdArray>;
type EvalBackend  = burn::backend::NdArray;

pub fn run_training(
    cfg:       &TrainConfig,
    dataset:   GridDataset,
    artifacts: &ArtifactStore,
) -> Result<()> {
    let device = Default::default();
    train_loop(cfg, dataset, artifacts, device)
}

fn train_loop(
    cfg:       &TrainConfig,
    dataset:   GridDataset,
    artifacts: &ArtifactStore,
    device:    <TrainBackend as Backend>::Device,
) -> Result<()> {

    // ── Build model ───────────────────────────────────────────────────────────
    let mut model: RiskCnn<TrainBackend> = cfg.model_config().init(&device);
    tracing::info!(
        "Model ready: {} input channels, {}x{} grid",
        cfg.model_config().in_channels, cfg.grid_size, cfg.grid_size,
    );

    // ── Adam optimiser ────────────────────────────────────────────────────────
    // m = β1*m + (1-β1)*g        (mean)
    // v = β2*v + (1-β2)*g²       (variance)
    // θ = θ - lr * m / (√v + ε)  (update)
    let mut optim = AdamConfig::new().with_epsilon(1e-8).init();

    // ── Data loader ───────────────────────────────────────────────────────────
    // One full-batch sample per epoch
    let batcher = GridBatcher::<TrainBackend>::new(device.clone());
    let loader  = DataLoaderBuilder::new(batcher)
        .batch_size(1)
        .num_workers(0)
        .build(dataset);

    let metrics = MetricsLogger::new(&cfg.artifact_dir)?;

    // ── Epoch loop ────────────────────────────────────────────────────────────
    for epoch in 1..=cfg.epochs {
        let mut loss_sum  = 0.0f64;
        let mut batches   = 0usize;
        let mut correct   = 0usize;
        let mut cells     = 0usize;

        for batch in loader.iter() {
            let targets = batch.targets.clone();
            let (loss, output) = model.forward_loss(batch.features, batch.targets);

            let loss_val: f64 = loss.clone().into_scalar().elem::<f64>();
            loss_sum += loss_val;
            batches  += 1;

            // Cell accuracy: argmax over the class dim vs the target grid
            let [b, _, h, w] = output.probs.dims();
            let predicted = output.probs.argmax(1).reshape([b, h, w]);
            let hits: i64 = predicted
                .equal(targets)
                .int()
                .sum()
                .into_scalar()
                .elem::<i64>();
            correct += hits as usize;
            cells   += b * h * w;

            // Backward pass + Adam update
            let grads = loss.backward();
            let grads = GradientsParams::from_grads(grads, &model);
            model = optim.step(cfg.lr, model, grads);
        }

        let avg_loss = if batches > 0 { loss_sum / batches as f64 } else { f64::NAN };
        let accuracy = if cells > 0 { correct as f64 / cells as f64 } else { 0.0 };

        metrics.log(&EpochMetrics::new(epoch, avg_loss, accuracy))?;

        if epoch == 1 || epoch % 50 == 0 || epoch == cfg.epochs {
            println!(
                "Epoch {:>4}/{} | loss={:.4} | cell_acc={:.1}%",
                epoch, cfg.epochs, avg_loss, accuracy * 100.0,
            );
        }
    }

    // ── Persist final weights ─────────────────────────────────────────────────
    // Inference runs on the plain backend; strip the autodiff
    // wrapper before recording.
    let trained: RiskCnn<EvalBackend> = model.valid();
    artifacts.save_model(&trained)?;
    tracing::info!("Training complete — weights saved to '{}'", cfg.artifact_dir);

    Ok(())
}
