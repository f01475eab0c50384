//! Free-run Simulation on the Chen System
//!
//! Generates data from the Chen nonlinear system, then compares one-step-ahead
//! prediction (measured past outputs as context) with free-run simulation
//! (own past predictions as context) for an untrained autoregressive MLP.

use burn::backend::NdArray;
use sysid::metrics;
use sysid::prelude::*;

fn main() -> sysid::Result<()> {
    println!("=== Free-run Simulation Example ===\n");

    type Backend = NdArray<f32>;
    let device = Default::default();

    // Noise-free test data
    let dataset = ChenConfig::new(100, 4)
        .with_sd_v(0.0)
        .with_sd_w(0.0)
        .with_seed(3)
        .init()?;
    println!("Generated {} sequences of shape {:?}", dataset.len(), dataset.data_shape());

    let batcher = SequenceBatcher::<Backend>::new(device);
    let batch = batcher.batches(&dataset, dataset.len(), None)?.remove(0);

    let config = DynamicModelConfig::new(
        ChenDataset::NU,
        ChenDataset::NY,
        PredictorConfig::Mlp(
            MlpConfig::new()
                .with_max_past_input(2)
                .with_hidden_size(16)
                .with_activation(Activation::Sigmoid),
        ),
    )
    .with_io_delay(1);
    let mut model = config.init::<Backend>(&Default::default())?;

    for mode in RunMode::ALL {
        model.set_mode(mode);
        // Free-run never reads the reference; passing it keeps one call site for both modes
        let y_pred = model.forward(batch.inputs.clone(), Some(batch.outputs.clone()))?;

        println!("{}:", mode);
        println!("  RMSE: {:.4}", metrics::rmse(batch.outputs.clone(), y_pred.clone())?);
        println!("  VAF:  {:.2}%", metrics::vaf(batch.outputs.clone(), y_pred)?);
    }

    println!("\nThe model is untrained: train the predictor with one-step-ahead");
    println!("prediction, then validate it with free-run simulation.");
    Ok(())
}
