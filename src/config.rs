//! Experiment configuration
//!
//! An experiment is described by one JSON document naming the dataset, the
//! model kind and their options:
//!
//! ```json
//! {
//!   "logdir": "log/chen_example/mlp",
//!   "cuda": false,
//!   "dataset": "chen",
//!   "model": "mlp",
//!   "model_options": {"max_past_input": 2, "hidden_size": 16, "io_delay": 1},
//!   "train_options": {"batch_size": 2},
//!   "dataset_options": {
//!     "seq_len": 100,
//!     "train": {"ntotbatch": 20, "sd_v": 0.3, "sd_w": 0.3},
//!     "valid": {"ntotbatch": 2, "sd_v": 0.3, "sd_w": 0.3},
//!     "test":  {"ntotbatch": 10, "sd_v": 0.0, "sd_w": 0.0}
//!   }
//! }
//! ```
//!
//! The untyped sections are resolved into [`DynamicModelConfig`] and
//! [`ChenConfig`] here, so an unknown model or dataset is reported before
//! anything is built.

use crate::activation::Activation;
use crate::data::{ChenConfig, ChenDataset};
use crate::dynamic_model::DynamicModelConfig;
use crate::error::{Result, SysIdError};
use crate::predictor::{MlpConfig, PredictorConfig, TcnConfig};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Top-level experiment description
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExperimentConfig {
    /// Directory for experiment artifacts
    #[serde(default = "default_logdir")]
    pub logdir: PathBuf,
    /// Request a GPU backend
    #[serde(default)]
    pub cuda: bool,
    /// Dataset name
    #[serde(default = "default_dataset")]
    pub dataset: String,
    /// Model kind (`mlp` or `tcn`)
    pub model: String,
    /// Predictor options plus `io_delay` and `ar`
    #[serde(default)]
    pub model_options: Value,
    /// Sequence length and per-split generation options
    pub dataset_options: DatasetOptions,
    /// Batching options
    #[serde(default)]
    pub train_options: TrainOptions,
}

/// Dataset generation options shared by all splits
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DatasetOptions {
    /// Length of every sequence
    pub seq_len: usize,
    pub train: SplitOptions,
    pub valid: SplitOptions,
    pub test: SplitOptions,
}

/// Generation options of one split
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SplitOptions {
    /// Number of sequences
    pub ntotbatch: usize,
    #[serde(default = "default_sd_v")]
    pub sd_v: f64,
    #[serde(default = "default_sd_w")]
    pub sd_w: f64,
    /// Random seed; each split has its own default
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub burnout: Option<usize>,
}

/// Batching options
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TrainOptions {
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

impl Default for TrainOptions {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
        }
    }
}

/// Dataset split
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Split {
    Train,
    Valid,
    Test,
}

impl Split {
    fn default_seed(&self) -> u64 {
        match self {
            Split::Train => 1,
            Split::Valid => 2,
            Split::Test => 3,
        }
    }
}

impl fmt::Display for Split {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Split::Train => "train",
            Split::Valid => "valid",
            Split::Test => "test",
        })
    }
}

impl FromStr for Split {
    type Err = SysIdError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "train" => Ok(Split::Train),
            "valid" => Ok(Split::Valid),
            "test" => Ok(Split::Test),
            _ => Err(SysIdError::invalid_config(format!(
                "unknown split {} (expected train, valid or test)",
                s
            ))),
        }
    }
}

/// Options common to every model kind
#[derive(Deserialize)]
struct DynamicOptions {
    #[serde(default = "default_io_delay")]
    io_delay: i64,
    #[serde(default = "default_ar")]
    ar: bool,
}

#[derive(Deserialize)]
struct MlpOptions {
    #[serde(default = "default_max_past_input")]
    max_past_input: usize,
    #[serde(default = "default_hidden_size")]
    hidden_size: usize,
    #[serde(default = "default_activation")]
    activation_fn: String,
}

#[derive(Deserialize)]
struct TcnOptions {
    #[serde(default = "default_ksize")]
    ksize: usize,
    n_channels: Vec<usize>,
    dilation_sizes: Vec<usize>,
    #[serde(default)]
    dropout: f64,
}

fn default_logdir() -> PathBuf {
    PathBuf::from("log")
}
fn default_dataset() -> String {
    "chen".to_string()
}
fn default_sd_v() -> f64 {
    0.1
}
fn default_sd_w() -> f64 {
    0.5
}
fn default_batch_size() -> usize {
    2
}
fn default_io_delay() -> i64 {
    1
}
fn default_ar() -> bool {
    true
}
fn default_max_past_input() -> usize {
    2
}
fn default_hidden_size() -> usize {
    16
}
fn default_activation() -> String {
    "sigmoid".to_string()
}
fn default_ksize() -> usize {
    2
}

/// Deserialize one options section, treating a missing section as empty
fn options<T: DeserializeOwned>(value: &Value) -> Result<T> {
    let value = if value.is_null() {
        Value::Object(Default::default())
    } else {
        value.clone()
    };
    Ok(serde_json::from_value(value)?)
}

impl ExperimentConfig {
    /// Read an experiment from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Parse an experiment from JSON text
    pub fn from_json(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text)?;
        config.dataset_channels()?;
        Ok(config)
    }

    /// Input and output channel counts of the configured dataset
    pub fn dataset_channels(&self) -> Result<(usize, usize)> {
        match self.dataset.as_str() {
            "chen" => Ok((ChenDataset::NU, ChenDataset::NY)),
            other => Err(SysIdError::UnsupportedDataset {
                name: other.to_string(),
            }),
        }
    }

    /// Resolve the predictor architecture
    pub fn predictor_config(&self) -> Result<PredictorConfig> {
        match self.model.as_str() {
            "mlp" => {
                let opts: MlpOptions = options(&self.model_options)?;
                let activation: Activation = opts.activation_fn.parse()?;
                Ok(PredictorConfig::Mlp(
                    MlpConfig::new()
                        .with_max_past_input(opts.max_past_input)
                        .with_hidden_size(opts.hidden_size)
                        .with_activation(activation),
                ))
            }
            "tcn" => {
                let opts: TcnOptions = options(&self.model_options)?;
                Ok(PredictorConfig::Tcn(
                    TcnConfig::new(opts.n_channels, opts.dilation_sizes)
                        .with_ksize(opts.ksize)
                        .with_dropout(opts.dropout),
                ))
            }
            other => Err(SysIdError::UnsupportedModel {
                name: other.to_string(),
            }),
        }
    }

    /// Resolve the full dynamic model configuration
    pub fn model_config(&self) -> Result<DynamicModelConfig> {
        let (num_inputs, num_outputs) = self.dataset_channels()?;
        let predictor = self.predictor_config()?;
        let dynamic: DynamicOptions = options(&self.model_options)?;

        Ok(DynamicModelConfig::new(num_inputs, num_outputs, predictor)
            .with_ar(dynamic.ar)
            .with_io_delay(dynamic.io_delay))
    }

    /// Resolve the generation options of one split
    pub fn dataset_config(&self, split: Split) -> Result<ChenConfig> {
        self.dataset_channels()?;
        let opts = match split {
            Split::Train => &self.dataset_options.train,
            Split::Valid => &self.dataset_options.valid,
            Split::Test => &self.dataset_options.test,
        };

        let mut config = ChenConfig::new(self.dataset_options.seq_len, opts.ntotbatch)
            .with_sd_v(opts.sd_v)
            .with_sd_w(opts.sd_w)
            .with_seed(opts.seed.unwrap_or_else(|| split.default_seed()));
        if let Some(burnout) = opts.burnout {
            config = config.with_burnout(burnout);
        }
        Ok(config)
    }
}
