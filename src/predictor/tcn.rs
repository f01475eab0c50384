//! Temporal convolutional network predictor
//!
//! A stack of residual temporal blocks, each made of two causal dilated
//! convolutions. Causality comes from left padding every convolution input
//! by `(ksize - 1) * dilation` zero steps.

use super::Predictor;
use crate::delay::left_pad;
use crate::error::{Result, SysIdError};
use crate::mode::RunMode;
use burn::config::Config;
use burn::module::Module;
use burn::nn::conv::{Conv1d, Conv1dConfig};
use burn::nn::{Dropout, DropoutConfig};
use burn::tensor::activation;
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

/// Configuration of a [`TcnPredictor`]
#[derive(Config, Debug)]
pub struct TcnConfig {
    /// Output channels of each temporal block
    pub n_channels: Vec<usize>,
    /// Dilation of each temporal block
    pub dilation_sizes: Vec<usize>,
    /// Convolution kernel size
    #[config(default = 2)]
    pub ksize: usize,
    /// Dropout probability after each convolution
    #[config(default = 0.0)]
    pub dropout: f64,
}

impl TcnConfig {
    /// Receptive field of the configured network
    pub fn receptive_field(&self) -> usize {
        1 + self
            .dilation_sizes
            .iter()
            .map(|d| 2 * (self.ksize.saturating_sub(1)) * d)
            .sum::<usize>()
    }

    /// Create a TCN predictor
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
    ) -> Result<TcnPredictor<B>> {
        if self.n_channels.len() != self.dilation_sizes.len() {
            return Err(SysIdError::invalid_config(format!(
                "tcn needs one dilation per block: {} channel sizes, {} dilations",
                self.n_channels.len(),
                self.dilation_sizes.len()
            )));
        }
        if self.ksize == 0 {
            return Err(SysIdError::invalid_config("tcn ksize must be at least 1"));
        }
        if !(0.0..1.0).contains(&self.dropout) {
            return Err(SysIdError::invalid_config(format!(
                "tcn dropout must be in [0, 1), got {}",
                self.dropout
            )));
        }
        if num_inputs == 0 || num_outputs == 0 || self.n_channels.contains(&0) {
            return Err(SysIdError::invalid_config("tcn channel counts must be positive"));
        }
        if self.dilation_sizes.contains(&0) {
            return Err(SysIdError::invalid_config("tcn dilations must be positive"));
        }

        let mut blocks = Vec::with_capacity(self.n_channels.len());
        let mut channels_in = num_inputs;
        for (&channels_out, &dilation) in self.n_channels.iter().zip(&self.dilation_sizes) {
            blocks.push(TemporalBlock::new(
                channels_in,
                channels_out,
                self.ksize,
                dilation,
                self.dropout,
                device,
            ));
            channels_in = channels_out;
        }

        let output = Conv1dConfig::new(channels_in, num_outputs, 1)
            .with_bias(true)
            .init(device);

        Ok(TcnPredictor {
            blocks,
            output,
            receptive_field: self.receptive_field(),
            num_inputs,
            num_outputs,
            mode: RunMode::default().code(),
        })
    }
}

/// Residual block of two causal dilated convolutions
#[derive(Module, Debug)]
pub struct TemporalBlock<B: Backend> {
    conv1: Conv1d<B>,
    conv2: Conv1d<B>,
    dropout: Dropout,
    /// 1x1 convolution matching residual channels, if they differ
    downsample: Option<Conv1d<B>>,
    /// Left padding keeping each convolution causal
    #[module(skip)]
    padding: usize,
}

impl<B: Backend> TemporalBlock<B> {
    fn new(
        channels_in: usize,
        channels_out: usize,
        ksize: usize,
        dilation: usize,
        dropout: f64,
        device: &B::Device,
    ) -> Self {
        let conv1 = Conv1dConfig::new(channels_in, channels_out, ksize)
            .with_dilation(dilation)
            .init(device);
        let conv2 = Conv1dConfig::new(channels_out, channels_out, ksize)
            .with_dilation(dilation)
            .init(device);
        let downsample = if channels_in != channels_out {
            Some(Conv1dConfig::new(channels_in, channels_out, 1).init(device))
        } else {
            None
        };

        Self {
            conv1,
            conv2,
            dropout: DropoutConfig::new(dropout).init(),
            downsample,
            padding: (ksize - 1) * dilation,
        }
    }

    /// `[batch, channels_in, length]` -> `[batch, channels_out, length]`
    pub fn forward(&self, x: Tensor<B, 3>) -> Tensor<B, 3> {
        let out = self.conv1.forward(left_pad(x.clone(), self.padding));
        let out = self.dropout.forward(activation::relu(out));
        let out = self.conv2.forward(left_pad(out, self.padding));
        let out = self.dropout.forward(activation::relu(out));

        let residual = match &self.downsample {
            Some(downsample) => downsample.forward(x),
            None => x,
        };
        activation::relu(out + residual)
    }
}

/// Temporal convolutional network
///
/// # Type Parameters
/// * `B` - The backend type
#[derive(Module, Debug)]
pub struct TcnPredictor<B: Backend> {
    blocks: Vec<TemporalBlock<B>>,
    /// Last block -> outputs, applied per time step
    output: Conv1d<B>,
    #[module(skip)]
    receptive_field: usize,
    #[module(skip)]
    num_inputs: usize,
    #[module(skip)]
    num_outputs: usize,
    /// Current run mode (see [`RunMode::code`])
    #[module(skip)]
    mode: u8,
}

impl<B: Backend> TcnPredictor<B> {
    /// Number of temporal blocks
    pub fn num_blocks(&self) -> usize {
        self.blocks.len()
    }

    /// Forward pass
    ///
    /// # Arguments
    /// * `features` - `[batch, num_inputs, length]`
    ///
    /// # Returns
    /// `[batch, num_outputs, length]`
    pub fn forward(&self, features: Tensor<B, 3>) -> Tensor<B, 3> {
        let hidden = self
            .blocks
            .iter()
            .fold(features, |x, block| block.forward(x));
        self.output.forward(hidden)
    }
}

impl<B: Backend> Predictor<B> for TcnPredictor<B> {
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
        self.receptive_field
    }

    fn num_inputs(&self) -> usize {
        self.num_inputs
    }

    fn num_outputs(&self) -> usize {
        self.num_outputs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;
    use burn::tensor::Distribution;

    type TestBackend = NdArray<f32>;

    #[test]
    fn test_tcn_receptive_field() {
        assert_eq!(TcnConfig::new(vec![], vec![]).receptive_field(), 1);
        assert_eq!(TcnConfig::new(vec![16], vec![1]).receptive_field(), 3);
        assert_eq!(
            TcnConfig::new(vec![16, 16, 16], vec![1, 2, 4])
                .with_ksize(3)
                .receptive_field(),
            1 + 4 + 8 + 16
        );
    }

    #[test]
    fn test_tcn_forward_shape() {
        let device = Default::default();
        let tcn = TcnConfig::new(vec![8, 16], vec![1, 1])
            .with_dropout(0.3)
            .init::<TestBackend>(2, 1, &device)
            .unwrap();

        assert_eq!(tcn.num_blocks(), 2);
        let input = Tensor::<TestBackend, 3>::zeros([3, 2, 20], &device);
        assert_eq!(tcn.predict(input).dims(), [3, 1, 20]);
    }

    #[test]
    fn test_tcn_is_causal_within_receptive_field() {
        let device = Default::default();
        let tcn = TcnConfig::new(vec![4], vec![2])
            .init::<TestBackend>(1, 1, &device)
            .unwrap();
        let rf = tcn.receptive_field();
        assert_eq!(rf, 5);

        let input = Tensor::<TestBackend, 3>::random([1, 1, 16], Distribution::Uniform(-1.0, 1.0), &device);
        let bump = Tensor::<TestBackend, 3>::ones([1, 1, 1], &device) * 4.0;
        // Perturb step 3: only outputs 3..3+rf may change
        let perturbed = input.clone().slice_assign([0..1, 0..1, 3..4], bump);

        let a = tcn.predict(input);
        let b = tcn.predict(perturbed);

        let before = (a.clone().narrow(2, 0, 3) - b.clone().narrow(2, 0, 3)).abs().max().into_scalar();
        let after = (a.narrow(2, 3 + rf, 16 - 3 - rf) - b.narrow(2, 3 + rf, 16 - 3 - rf))
            .abs()
            .max()
            .into_scalar();
        assert!(before < 1e-6, "Output leaked from the future: {}", before);
        assert!(after < 1e-6, "Output depends on steps beyond the receptive field: {}", after);
    }

    #[test]
    fn test_tcn_mode_and_record() {
        let device = Default::default();
        let mut tcn = TcnConfig::new(vec![4, 3], vec![1, 2])
            .init::<TestBackend>(2, 1, &device)
            .unwrap();
        assert_eq!(tcn.mode(), RunMode::OneStepAhead);

        tcn.set_mode(RunMode::FreeRunSimulation);
        let reloaded = tcn.clone().load_record(tcn.into_record());

        assert_eq!(reloaded.mode(), RunMode::FreeRunSimulation);
        assert_eq!(reloaded.receptive_field(), 1 + 2 + 4);
        assert_eq!(reloaded.num_blocks(), 2);
    }

    #[test]
    fn test_tcn_config_validation() {
        let device = Default::default();

        let mismatched = TcnConfig::new(vec![8, 8], vec![1]).init::<TestBackend>(1, 1, &device);
        assert!(matches!(mismatched, Err(SysIdError::InvalidConfig { .. })));

        let bad_dropout = TcnConfig::new(vec![8], vec![1])
            .with_dropout(1.5)
            .init::<TestBackend>(1, 1, &device);
        assert!(matches!(bad_dropout, Err(SysIdError::InvalidConfig { .. })));
    }
}
