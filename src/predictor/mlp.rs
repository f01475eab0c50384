//! Windowed multilayer perceptron predictor
//!
//! The same one-hidden-layer MLP is applied to every trailing window of
//! `max_past_input` feature steps. Sliding the MLP over the sequence is a
//! valid 1-D convolution over a left-padded input, so the whole sequence is
//! processed in one call.

use super::Predictor;
use crate::activation::Activation;
use crate::delay::left_pad;
use crate::error::{Result, SysIdError};
use crate::mode::RunMode;
use burn::config::Config;
use burn::module::Module;
use burn::nn::conv::{Conv1d, Conv1dConfig};
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

/// Configuration of an [`MlpPredictor`]
#[derive(Config, Debug)]
pub struct MlpConfig {
    /// Number of past feature steps (including the current one) per prediction
    #[config(default = 2)]
    pub max_past_input: usize,
    /// Width of the hidden layer
    #[config(default = 16)]
    pub hidden_size: usize,
    /// Hidden-layer activation
    #[config(default = "Activation::Sigmoid")]
    pub activation: Activation,
}

impl MlpConfig {
    /// Create an MLP predictor
    ///
    /// # Arguments
    /// * `num_inputs` - Number of feature channels
    /// * `num_outputs` - Number of predicted output channels
    /// * `device` - Device to create the module on
    pub fn init<B: Backend>(
        &self,
        num_inputs: usize,
        num_outputs: usize,
        device: &B::Device,
    ) -> Result<MlpPredictor<B>> {
        if self.max_past_input == 0 {
            return Err(SysIdError::invalid_config(
                "mlp max_past_input must be at least 1",
            ));
        }
        if self.hidden_size == 0 || num_inputs == 0 || num_outputs == 0 {
            return Err(SysIdError::invalid_config(format!(
                "mlp sizes must be positive (inputs {}, hidden {}, outputs {})",
                num_inputs, self.hidden_size, num_outputs
            )));
        }

        let hidden = Conv1dConfig::new(num_inputs, self.hidden_size, self.max_past_input)
            .with_bias(true)
            .init(device);
        let output = Conv1dConfig::new(self.hidden_size, num_outputs, 1)
            .with_bias(true)
            .init(device);

        Ok(MlpPredictor {
            hidden,
            output,
            activation: self.activation.code(),
            max_past_input: self.max_past_input,
            num_inputs,
            num_outputs,
            mode: RunMode::default().code(),
        })
    }
}

/// MLP over a sliding window of past features
///
/// # Type Parameters
/// * `B` - The backend type
#[derive(Module, Debug)]
pub struct MlpPredictor<B: Backend> {
    /// Window -> hidden layer, kernel spans the whole window
    hidden: Conv1d<B>,
    /// Hidden -> output layer, applied per time step
    output: Conv1d<B>,
    /// Hidden-layer activation (see [`Activation::code`])
    #[module(skip)]
    activation: u8,
    #[module(skip)]
    max_past_input: usize,
    #[module(skip)]
    num_inputs: usize,
    #[module(skip)]
    num_outputs: usize,
    /// Current run mode (see [`RunMode::code`])
    #[module(skip)]
    mode: u8,
}

impl<B: Backend> MlpPredictor<B> {
    /// Get the hidden-layer activation
    pub fn activation(&self) -> Activation {
        Activation::from_code(self.activation)
    }

    /// Forward pass
    ///
    /// # Arguments
    /// * `features` - `[batch, num_inputs, length]`
    ///
    /// # Returns
    /// `[batch, num_outputs, length]`
    pub fn forward(&self, features: Tensor<B, 3>) -> Tensor<B, 3> {
        // Zero history before the first step keeps the output causal and length-preserving
        let x = left_pad(features, self.max_past_input - 1);
        let hidden = self.activation().forward(self.hidden.forward(x));
        self.output.forward(hidden)
    }
}

impl<B: Backend> Predictor<B> for MlpPredictor<B> {
    fn predict(&self, features: Tensor<B, 3>) -> Tensor<B, 3> {
        self.forward(features)
    }

    fn set_mode(&mut self, mode: RunMode) {
        self.mode = mode.code();
    }

    fn mode(&self) -> RunMode {
        RunMode::from_code(self.mode)
    }

    fn receptive_field(&self) -> usize {
        self.max_past_input
    }

    fn num_inputs(&self) -> usize {
        self.num_inputs
    }

    fn num_outputs(&self) -> usize {
        self.num_outputs
    }
}
