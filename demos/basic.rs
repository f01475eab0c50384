//! Basic usage example of a dynamic model
//!
//! This example builds MLP and TCN dynamic models and runs them on random
//! input/output sequences in one-step-ahead mode.

use burn::backend::NdArray;
use burn::tensor::Tensor;
use sysid::prelude::*;

fn main() -> sysid::Result<()> {
    println!("=== sysid Basic Example ===\n");

    // Use the NdArray backend (CPU)
    type Backend = NdArray<f32>;
    let device = Default::default();

    // Example 1: Autoregressive MLP over the last 3 steps
    println!("Example 1: Autoregressive MLP");
    let config = DynamicModelConfig::new(
        2,
        1,
        PredictorConfig::Mlp(MlpConfig::new().with_max_past_input(3).with_hidden_size(32)),
    )
    .with_io_delay(1);
    let mlp = config.init::<Backend>(&device)?;

    println!("  Inputs: 2, outputs: 1, io_delay: 1");
    println!("  Model inputs (u + past y): {}", mlp.num_model_inputs());
    println!("  Receptive field: {}", mlp.predictor().receptive_field());
    println!();

    // Input shape: [batch=4, channels=2, seq=50]
    let u = Tensor::<Backend, 3>::random(
        [4, 2, 50],
        burn::tensor::Distribution::Uniform(-1.0, 1.0),
        &device,
    );
    let y = Tensor::<Backend, 3>::random(
        [4, 1, 50],
        burn::tensor::Distribution::Uniform(-1.0, 1.0),
        &device,
    );

    let y_pred = mlp.forward(u.clone(), Some(y.clone()))?;
    println!("  Input shape:  {:?}", u.dims());
    println!("  Output shape: {:?}", y_pred.dims());
    println!();

    // Example 2: Non-autoregressive TCN (input only, no reference needed)
    println!("Example 2: Non-autoregressive TCN");
    let tcn = DynamicModelConfig::new(
        2,
        1,
        PredictorConfig::Tcn(TcnConfig::new(vec![16, 16, 16], vec![1, 2, 4])),
    )
    .with_ar(false)
    .init::<Backend>(&device)?;

    let y_tcn = tcn.forward(u, None)?;
    println!("  Receptive field: {}", tcn.predictor().receptive_field());
    println!("  Output shape: {:?}", y_tcn.dims());
    println!();

    // Example 3: Error measures
    println!("Example 3: Metrics against the reference");
    println!("  RMSE: {:.4}", sysid::metrics::rmse(y.clone(), y_pred.clone())?);
    println!("  VAF:  {:.2}%", sysid::metrics::vaf(y, y_pred)?);
    println!();

    println!("=== Examples completed successfully! ===");
    Ok(())
}
