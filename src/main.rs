//! `sysid`: command-line interface for neural system identification.
//!
//! ```text
//! USAGE:
//!   sysid generate --seq-len <N> --ntotbatch <N>    Generate Chen system data
//!   sysid evaluate --config <exp.json>              Run a configured model on a split
//! ```

use anyhow::{Context, Result};
use burn::backend::NdArray;
use clap::{Parser, Subcommand};
use ndarray::Array3;
use serde::Serialize;
use std::path::{Path, PathBuf};
use sysid::config::{ExperimentConfig, Split};
use sysid::data::{ChenConfig, SequenceBatcher, SequenceDataset};
use sysid::metrics;
use sysid::mode::RunMode;
use sysid::predictor::Predictor;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

type Backend = NdArray<f32>;

#[derive(Parser)]
#[command(name = "sysid", about = "Neural identification of nonlinear dynamical systems", version)]
struct Cli {
    #[command(subcommand)]
    command: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Generate input/output sequences from the Chen nonlinear system.
    Generate {
        /// Length of every sequence.
        #[arg(long)]
        seq_len: usize,
        /// Number of sequences.
        #[arg(long)]
        ntotbatch: usize,
        /// Random seed.
        #[arg(long, default_value_t = 1)]
        seed: u64,
        /// Process noise standard deviation.
        #[arg(long, default_value_t = 0.1)]
        sd_v: f64,
        /// Measurement noise standard deviation.
        #[arg(long, default_value_t = 0.5)]
        sd_w: f64,
        /// Write the sequences as JSON to this file.
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Build the model of an experiment and report its error on one split.
    Evaluate {
        /// Experiment configuration (JSON).
        #[arg(long)]
        config: PathBuf,
        /// Dataset split: train, valid or test.
        #[arg(long, default_value = "test")]
        split: String,
        /// Run mode (one-step-ahead or free-run-simulation); both when omitted.
        #[arg(long)]
        mode: Option<String>,
    },
}

#[derive(Serialize)]
struct SequenceRecord {
    u: Vec<f32>,
    y: Vec<f32>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Cmd::Generate {
            seq_len,
            ntotbatch,
            seed,
            sd_v,
            sd_w,
            output,
        } => {
            let config = ChenConfig::new(seq_len, ntotbatch)
                .with_seed(seed)
                .with_sd_v(sd_v)
                .with_sd_w(sd_w);
            cmd_generate(&config, output)?
        }
        Cmd::Evaluate {
            config,
            split,
            mode,
        } => cmd_evaluate(&config, &split, mode.as_deref())?,
    }

    Ok(())
}

fn cmd_generate(config: &ChenConfig, output: Option<PathBuf>) -> Result<()> {
    let dataset = config.init()?;

    let (u_mean, u_std) = mean_std(dataset.inputs());
    let (y_mean, y_std) = mean_std(dataset.outputs());

    println!("Chen dataset: {} sequences of {} samples", dataset.len(), config.seq_len);
    println!("  u: mean {:+.4}  std {:.4}", u_mean, u_std);
    println!("  y: mean {:+.4}  std {:.4}", y_mean, y_std);

    if let Some(path) = output {
        let records: Vec<SequenceRecord> = (0..dataset.len())
            .filter_map(|i| dataset.get(i))
            .map(|item| SequenceRecord {
                u: item.input.iter().copied().collect(),
                y: item.output.iter().copied().collect(),
            })
            .collect();
        let json = serde_json::to_string_pretty(&records)?;
        std::fs::write(&path, json).with_context(|| format!("writing {}", path.display()))?;
        info!("Wrote {} sequences to {}", records.len(), path.display());
    }

    Ok(())
}

fn cmd_evaluate(config_path: &Path, split: &str, mode: Option<&str>) -> Result<()> {
    let experiment = ExperimentConfig::load(config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;
    let split: Split = split.parse()?;
    let modes = match mode {
        Some(mode) => vec![mode.parse::<RunMode>()?],
        None => RunMode::ALL.to_vec(),
    };

    if experiment.cuda {
        warn!("cuda requested; running on the NdArray CPU backend");
    }

    let device = Default::default();
    let dataset = experiment.dataset_config(split)?.init()?;
    let model_config = experiment.model_config()?;
    let mut model = model_config.init::<Backend>(&device)?;

    info!(
        model = model_config.predictor.kind(),
        receptive_field = model.predictor().receptive_field(),
        io_delay = model.io_delay(),
        "model ready"
    );

    let batcher = SequenceBatcher::<Backend>::new(device);
    // Evaluation runs the whole split as one batch
    let batch = batcher
        .batches(&dataset, dataset.len(), None)?
        .into_iter()
        .next()
        .context("dataset produced no batches")?;

    println!(
        "{} model on {} split ({} sequences)",
        model_config.predictor.kind(),
        split,
        dataset.len()
    );
    for mode in modes {
        model.set_mode(mode);
        let y_pred = model.forward(batch.inputs.clone(), Some(batch.outputs.clone()))?;
        let rmse = metrics::rmse(batch.outputs.clone(), y_pred.clone())?;
        let vaf = metrics::vaf(batch.outputs.clone(), y_pred)?;
        println!("  {:<20} RMSE {:.4}  VAF {:6.2}%", mode.as_str(), rmse, vaf);
    }

    Ok(())
}

/// Population mean and standard deviation over every sample
fn mean_std(x: &Array3<f32>) -> (f32, f32) {
    (x.mean().unwrap_or(0.0), x.std(0.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_std() {
        let x = Array3::from_shape_vec((2, 1, 2), vec![1.0, 3.0, 5.0, 7.0]).unwrap();
        let (mean, std) = mean_std(&x);
        assert!((mean - 4.0).abs() < 1e-6);
        assert!((std - 5.0f32.sqrt()).abs() < 1e-6);
    }

    #[test]
    fn test_mean_std_empty() {
        let x = Array3::<f32>::zeros((0, 1, 4));
        assert_eq!(mean_std(&x).0, 0.0);
    }

    #[test]
    fn test_cli_parses_evaluate() {
        let cli = Cli::try_parse_from([
            "sysid",
            "evaluate",
            "--config",
            "exp.json",
            "--mode",
            "free-run",
        ])
        .unwrap();
        match cli.command {
            Cmd::Evaluate { split, mode, .. } => {
                assert_eq!(split, "test");
                assert_eq!(mode.as_deref(), Some("free-run"));
            }
            Cmd::Generate { .. } => panic!("expected evaluate"),
        }
    }
}
