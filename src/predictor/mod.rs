//! # Predictors
//!
//! A predictor is the learned function inside a
//! [`DynamicModel`](crate::dynamic_model::DynamicModel): it maps a feature
//! sequence `[batch, num_inputs, length]` to a predicted output sequence
//! `[batch, num_outputs, length]`. The dynamic model treats it as opaque and
//! only relies on the [`Predictor`] contract:
//!
//! - output length equals input length
//! - output step `t` depends on input steps `[t - rf + 1, t]` only, where
//!   `rf` is [`Predictor::receptive_field`]
//! - the run mode set on the dynamic model is mirrored through
//!   [`Predictor::set_mode`]
//!
//! ## Available Predictors
//!
//! | Predictor | Config | Receptive field |
//! |-----------|--------|-----------------|
//! | [`MlpPredictor`] | [`MlpConfig`] | `max_past_input` |
//! | [`TcnPredictor`] | [`TcnConfig`] | `1 + Σ 2·(ksize-1)·dilation` |
//!
//! [`AnyPredictor`] selects one of them from a [`PredictorConfig`].
//!
//! ## Example
//!
//! ```ignore
//! use sysid::predictor::{MlpConfig, Predictor};
//!
//! // 2 feature channels (input + past output), 1 output channel
//! let mlp = MlpConfig::new().with_max_past_input(3).init::<Backend>(2, 1, &device)?;
//! assert_eq!(mlp.receptive_field(), 3);
//!
//! let features: Tensor<Backend, 3> = Tensor::zeros([4, 2, 100], &device);
//! let y = mlp.predict(features); // [4, 1, 100]
//! ```

pub mod mlp;
pub mod tcn;

pub use mlp::{MlpConfig, MlpPredictor};
pub use tcn::{TcnConfig, TcnPredictor};

use crate::error::Result;
use crate::mode::RunMode;
use burn::config::Config;
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

/// Capability interface of the function approximator wrapped by a dynamic model
pub trait Predictor<B: Backend> {
    /// Map features `[batch, num_inputs, length]` to outputs `[batch, num_outputs, length]`
    fn predict(&self, features: Tensor<B, 3>) -> Tensor<B, 3>;

    /// Switch the operating mode
    fn set_mode(&mut self, mode: RunMode);

    /// Current operating mode
    fn mode(&self) -> RunMode;

    /// Number of trailing time steps one output step depends on
    fn receptive_field(&self) -> usize;

    /// Number of feature channels consumed
    fn num_inputs(&self) -> usize;

    /// Number of output channels produced
    fn num_outputs(&self) -> usize;
}

/// Architecture selection for [`AnyPredictor`]
#[derive(Config, Debug)]
pub enum PredictorConfig {
    /// Windowed multilayer perceptron
    Mlp(MlpConfig),
    /// Temporal convolutional network
    Tcn(TcnConfig),
}

impl PredictorConfig {
    /// Short architecture name, as used in experiment configurations
    pub fn kind(&self) -> &'static str {
        match self {
            PredictorConfig::Mlp(_) => "mlp",
            PredictorConfig::Tcn(_) => "tcn",
        }
    }

    /// Build the configured predictor with the given channel counts
    pub fn init<B: Backend>(
        &self,
        num_inputs: usize,
        num_outputs: usize,
        device: &B::Device,
    ) -> Result<AnyPredictor<B>> {
        Ok(match self {
            PredictorConfig::Mlp(config) => {
                AnyPredictor::Mlp(config.init(num_inputs, num_outputs, device)?)
            }
            PredictorConfig::Tcn(config) => {
                AnyPredictor::Tcn(config.init(num_inputs, num_outputs, device)?)
            }
        })
    }
}

/// A predictor whose architecture is chosen at runtime
#[derive(Debug, Clone)]
pub enum AnyPredictor<B: Backend> {
    /// Windowed multilayer perceptron
    Mlp(MlpPredictor<B>),
    /// Temporal convolutional network
    Tcn(TcnPredictor<B>),
}

impl<B: Backend> Predictor<B> for AnyPredictor<B> {
    fn predict(&self, features: Tensor<B, 3>) -> Tensor<B, 3> {
        match self {
            AnyPredictor::Mlp(p) => p.predict(features),
            AnyPredictor::Tcn(p) => p.predict(features),
        }
    }

    fn set_mode(&mut self, mode: RunMode) {
        match self {
            AnyPredictor::Mlp(p) => p.set_mode(mode),
            AnyPredictor::Tcn(p) => p.set_mode(mode),
        }
    }

    fn mode(&self) -> RunMode {
        match self {
            AnyPredictor::Mlp(p) => p.mode(),
            AnyPredictor::Tcn(p) => p.mode(),
        }
    }

    fn receptive_field(&self) -> usize {
        match self {
            AnyPredictor::Mlp(p) => p.receptive_field(),
            AnyPredictor::Tcn(p) => p.receptive_field(),
        }
    }

    fn num_inputs(&self) -> usize {
        match self {
            AnyPredictor::Mlp(p) => p.num_inputs(),
            AnyPredictor::Tcn(p) => p.num_inputs(),
        }
    }

    fn num_outputs(&self) -> usize {
        match self {
            AnyPredictor::Mlp(p) => p.num_outputs(),
            AnyPredictor::Tcn(p) => p.num_outputs(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray<f32>;

    #[test]
    fn test_predictor_config_selects_variant() {
        let device = Default::default();

        let mlp = PredictorConfig::Mlp(MlpConfig::new().with_max_past_input(4))
            .init::<TestBackend>(2, 1, &device)
            .unwrap();
        assert!(matches!(mlp, AnyPredictor::Mlp(_)));
        assert_eq!(mlp.receptive_field(), 4);

        let tcn = PredictorConfig::Tcn(TcnConfig::new(vec![8, 8], vec![1, 2]))
            .init::<TestBackend>(2, 1, &device)
            .unwrap();
        assert!(matches!(tcn, AnyPredictor::Tcn(_)));
        // 1 + 2·(2-1)·1 + 2·(2-1)·2
        assert_eq!(tcn.receptive_field(), 7);
        assert_eq!(tcn.num_inputs(), 2);
        assert_eq!(tcn.num_outputs(), 1);
    }

    #[test]
    fn test_any_predictor_mode_delegation() {
        let device = Default::default();
        let mut predictor = PredictorConfig::Mlp(MlpConfig::new())
            .init::<TestBackend>(1, 1, &device)
            .unwrap();

        assert_eq!(predictor.mode(), RunMode::OneStepAhead);
        predictor.set_mode(RunMode::FreeRunSimulation);
        assert_eq!(predictor.mode(), RunMode::FreeRunSimulation);
    }

    #[test]
    fn test_predictor_config_json() {
        let config = PredictorConfig::Tcn(
            TcnConfig::new(vec![8, 4], vec![1, 2])
                .with_ksize(3)
                .with_dropout(0.1),
        );
        let json = serde_json::to_string(&config).unwrap();
        let parsed: PredictorConfig = serde_json::from_str(&json).unwrap();

        match parsed {
            PredictorConfig::Tcn(tcn) => {
                assert_eq!(tcn.n_channels, vec![8, 4]);
                assert_eq!(tcn.dilation_sizes, vec![1, 2]);
                assert_eq!(tcn.ksize, 3);
                assert!((tcn.dropout - 0.1).abs() < 1e-12);
            }
            other => panic!("expected a tcn config, got {}", other.kind()),
        }

        let mlp: MlpConfig = serde_json::from_str(
            &serde_json::to_string(&MlpConfig::new().with_hidden_size(5)).unwrap(),
        )
        .unwrap();
        assert_eq!(mlp.hidden_size, 5);
        assert_eq!(mlp.max_past_input, 2);
    }

    #[test]
    fn test_predictor_config_kind() {
        assert_eq!(PredictorConfig::Mlp(MlpConfig::new()).kind(), "mlp");
        assert_eq!(
            PredictorConfig::Tcn(TcnConfig::new(vec![4], vec![1])).kind(),
            "tcn"
        );
    }
}
