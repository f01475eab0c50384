//! # sysid - Neural System Identification (Rust)
//!
//! Identification of nonlinear dynamical systems with neural sequence models,
//! built on the Burn framework.
//!
//! ## Features
//!
//! - **DynamicModel**: wraps a predictor into a model of `u -> y` with
//!   input/output delay and optional output feedback (autoregression)
//! - **One-step-ahead**: open-loop prediction from measured past outputs
//! - **Free-run simulation**: closed-loop rollout from the model's own predictions
//! - **Predictors**: windowed MLP and temporal convolutional network (TCN)
//! - **ChenDataset**: synthetic data from the Chen–Billings–Grant nonlinear system
//! - **Metrics**: MSE, RMSE and VAF of predicted sequences
//!
//! ## Quick Start
//!
//! ```rust
//! use sysid::prelude::*;
//!
//! // Chen system data: 4 sequences of 50 samples
//! let dataset = ChenConfig::new(50, 4).init().unwrap();
//! assert_eq!(dataset.data_shape(), ((1, 50), (1, 50)));
//!
//! // Autoregressive MLP over the last 2 steps, output delayed by 1 step
//! let config = DynamicModelConfig::new(1, 1, PredictorConfig::Mlp(MlpConfig::new()))
//!     .with_io_delay(1);
//! assert_eq!(config.num_model_inputs(), 2);
//! ```
//!
//! ## Running Both Modes
//!
//! ```ignore
//! use sysid::prelude::*;
//!
//! let mut model = config.init::<Backend>(&device)?;
//! let batch = SequenceBatcher::<Backend>::new(device).batch(&items)?;
//!
//! let y_osa = model.forward(batch.inputs.clone(), Some(batch.outputs.clone()))?;
//!
//! model.set_mode(RunMode::FreeRunSimulation);
//! let y_sim = model.forward(batch.inputs, None)?;
//! ```

pub mod activation;
pub mod config;
pub mod data;
pub mod delay;
pub mod dynamic_model;
pub mod error;
pub mod metrics;
pub mod mode;
pub mod predictor;

pub use error::{Result, SysIdError};

pub mod prelude {
    pub use crate::activation::{Activation, LeCun};
    pub use crate::config::{ExperimentConfig, Split};
    pub use crate::data::{
        ChenConfig, ChenDataset, SequenceBatch, SequenceBatcher, SequenceDataset, SequencePair,
    };
    pub use crate::delay::delay_sequence;
    pub use crate::dynamic_model::{DynamicModel, DynamicModelConfig};
    pub use crate::error::{Result, SysIdError};
    pub use crate::mode::RunMode;
    pub use crate::predictor::{
        AnyPredictor, MlpConfig, MlpPredictor, Predictor, PredictorConfig, TcnConfig,
        TcnPredictor,
    };
}
