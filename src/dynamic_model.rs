//! Dynamic model: delay alignment, autoregressive features and the two
//! inference modes around an opaque [`Predictor`].
//!
//! ## Inference Modes
//!
//! | Mode | Output context | Predictor calls |
//! |------|----------------|-----------------|
//! | [`RunMode::OneStepAhead`] | measured outputs `y[t-1]` | one per sequence |
//! | [`RunMode::FreeRunSimulation`] | own predictions `ŷ[t-1]` | one per time step |
//!
//! ## Tensor Shapes
//!
//! | Tensor | Shape |
//! |--------|-------|
//! | input `u` | `[batch, num_inputs, length]` |
//! | reference output `y` | `[batch, num_outputs, length]` |
//! | features | `[batch, num_model_inputs, length]` |
//! | prediction | `[batch, num_outputs, length]` |
//!
//! ## Example
//!
//! ```ignore
//! use sysid::prelude::*;
//!
//! let config = DynamicModelConfig::new(1, 1, PredictorConfig::Mlp(MlpConfig::new()))
//!     .with_io_delay(1);
//! let mut model = config.init::<Backend>(&device)?;
//!
//! // Training-style prediction from measured outputs
//! let y_osa = model.forward(u.clone(), Some(y.clone()))?;
//!
//! // Closed-loop simulation from the input alone
//! model.set_mode(RunMode::FreeRunSimulation);
//! let y_sim = model.forward(u, None)?;
//! ```

use crate::delay::{delay_sequence, trailing_window, CHANNEL_DIM, TIME_DIM};
use crate::error::{Result, SysIdError};
use crate::mode::RunMode;
use crate::predictor::{AnyPredictor, Predictor, PredictorConfig};
use burn::config::Config;
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;
use tracing::{debug, trace};

/// Configuration of a [`DynamicModel`] with a predictor chosen by [`PredictorConfig`]
#[derive(Config, Debug)]
pub struct DynamicModelConfig {
    /// Number of input channels `u`
    pub num_inputs: usize,
    /// Number of output channels `y`
    pub num_outputs: usize,
    /// Predictor architecture
    pub predictor: PredictorConfig,
    /// Feed past outputs back as features
    #[config(default = true)]
    pub ar: bool,
    /// Steps by which the output lags the input (negative: leads)
    #[config(default = 0)]
    pub io_delay: i64,
}

impl DynamicModelConfig {
    /// Number of feature channels the predictor consumes
    pub fn num_model_inputs(&self) -> usize {
        num_model_inputs(self.num_inputs, self.num_outputs, self.ar)
    }

    /// Create the dynamic model and its predictor
    pub fn init<B: Backend>(&self, device: &B::Device) -> Result<DynamicModel<B, AnyPredictor<B>>> {
        let predictor = self
            .predictor
            .init(self.num_model_inputs(), self.num_outputs, device)?;
        DynamicModel::new(
            self.num_inputs,
            self.num_outputs,
            self.ar,
            self.io_delay,
            predictor,
        )
    }
}

fn num_model_inputs(num_inputs: usize, num_outputs: usize, ar: bool) -> usize {
    if ar {
        num_inputs + num_outputs
    } else {
        num_inputs
    }
}

/// Sequence model of a dynamical system
///
/// Wraps a predictor and turns it into a model of `u -> y` that can run
/// open loop (one-step-ahead) or closed loop (free-run simulation).
/// The channel layout, autoregression and delay are fixed at construction;
/// only the [`RunMode`] changes afterwards.
///
/// # Type Parameters
/// * `B` - The backend type
/// * `P` - The predictor type
#[derive(Debug, Clone)]
pub struct DynamicModel<B: Backend, P: Predictor<B>> {
    predictor: P,
    num_inputs: usize,
    num_outputs: usize,
    ar: bool,
    io_delay: i64,
    mode: RunMode,
    _backend: std::marker::PhantomData<B>,
}

impl<B: Backend, P: Predictor<B>> DynamicModel<B, P> {
    /// Wrap a predictor
    ///
    /// # Arguments
    /// * `num_inputs` - Number of input channels
    /// * `num_outputs` - Number of output channels
    /// * `ar` - Whether past outputs are fed back as features
    /// * `io_delay` - Steps by which the output lags the input
    /// * `predictor` - Predictor consuming `num_model_inputs` channels and producing `num_outputs`
    ///
    /// The model starts in [`RunMode::OneStepAhead`], and the predictor is
    /// switched to that mode too.
    pub fn new(
        num_inputs: usize,
        num_outputs: usize,
        ar: bool,
        io_delay: i64,
        mut predictor: P,
    ) -> Result<Self> {
        let expected_inputs = num_model_inputs(num_inputs, num_outputs, ar);
        if predictor.num_inputs() != expected_inputs {
            return Err(SysIdError::invalid_config(format!(
                "predictor consumes {} channels, model provides {}",
                predictor.num_inputs(),
                expected_inputs
            )));
        }
        if predictor.num_outputs() != num_outputs {
            return Err(SysIdError::invalid_config(format!(
                "predictor produces {} channels, model expects {}",
                predictor.num_outputs(),
                num_outputs
            )));
        }

        let mode = RunMode::default();
        predictor.set_mode(mode);

        Ok(Self {
            predictor,
            num_inputs,
            num_outputs,
            ar,
            io_delay,
            mode,
            _backend: std::marker::PhantomData,
        })
    }

    /// Get number of input channels
    pub fn num_inputs(&self) -> usize {
        self.num_inputs
    }

    /// Get number of output channels
    pub fn num_outputs(&self) -> usize {
        self.num_outputs
    }

    /// Number of feature channels: inputs plus outputs when autoregressive
    pub fn num_model_inputs(&self) -> usize {
        num_model_inputs(self.num_inputs, self.num_outputs, self.ar)
    }

    /// Whether past outputs are part of the features
    pub fn is_autoregressive(&self) -> bool {
        self.ar
    }

    /// Get the input/output delay
    pub fn io_delay(&self) -> i64 {
        self.io_delay
    }

    /// Get the wrapped predictor
    pub fn predictor(&self) -> &P {
        &self.predictor
    }

    /// Consume the model, returning the predictor
    pub fn into_predictor(self) -> P {
        self.predictor
    }

    /// Get current run mode
    pub fn mode(&self) -> RunMode {
        self.mode
    }

    /// Switch the run mode of the model and its predictor
    pub fn set_mode(&mut self, mode: RunMode) {
        if mode != self.mode {
            debug!(from = %self.mode, to = %mode, "switching run mode");
        }
        self.mode = mode;
        self.predictor.set_mode(mode);
    }

    /// Run the model in the current mode
    ///
    /// # Arguments
    /// * `u` - Input sequence `[batch, num_inputs, length]`
    /// * `y` - Reference output `[batch, num_outputs, length]`; required for
    ///   autoregressive one-step-ahead prediction, never read by free-run simulation
    pub fn forward(&self, u: Tensor<B, 3>, y: Option<Tensor<B, 3>>) -> Result<Tensor<B, 3>> {
        debug!(mode = %self.mode, dims = ?u.dims(), "dynamic model forward");
        match self.mode {
            RunMode::OneStepAhead => self.one_step_ahead(u, y),
            RunMode::FreeRunSimulation => self.free_run_simulation(u, y),
        }
    }

    /// Predict every step from the measured past outputs in a single predictor call
    pub fn one_step_ahead(&self, u: Tensor<B, 3>, y: Option<Tensor<B, 3>>) -> Result<Tensor<B, 3>> {
        let [batch_size, _, seq_len] = self.check_input(&u)?;
        let features = self.assemble_features(u, y)?;
        let y_pred = self.predictor.predict(features);
        self.check_prediction(&y_pred, batch_size, seq_len)?;
        Ok(y_pred)
    }

    /// Simulate the output from the input alone, feeding predictions back step by step
    ///
    /// The reference output is accepted for signature symmetry with
    /// [`one_step_ahead`](Self::one_step_ahead) and only forwarded there when
    /// the model is not autoregressive.
    pub fn free_run_simulation(
        &self,
        u: Tensor<B, 3>,
        y: Option<Tensor<B, 3>>,
    ) -> Result<Tensor<B, 3>> {
        if !self.ar {
            return self.one_step_ahead(u, y);
        }

        let [batch_size, _, seq_len] = self.check_input(&u)?;
        let device = u.device();
        let rf = self.predictor.receptive_field();
        // rf = 0 still needs the current input step; the output context is then all zeros
        let input_width = rf.max(1);

        let u_delayed = delay_sequence(u, self.io_delay);
        let mut y_sim = Tensor::<B, 3>::zeros([batch_size, self.num_outputs, seq_len], &device);

        for t in 0..seq_len {
            let u_in = trailing_window(&u_delayed, t + 1, input_width);
            // Output window ends one step earlier than the input window: ŷ[t] never sees itself
            let y_in = if rf == 0 {
                Tensor::zeros([batch_size, self.num_outputs, input_width], &device)
            } else {
                trailing_window(&y_sim, t, rf)
            };

            let x = Tensor::cat(vec![u_in, y_in], CHANNEL_DIM);
            let out = self.predictor.predict(x);
            self.check_prediction(&out, batch_size, input_width)?;

            let step = out.narrow(TIME_DIM, input_width - 1, 1);
            y_sim = y_sim.slice_assign([0..batch_size, 0..self.num_outputs, t..t + 1], step);
            trace!(step = t, "free-run step done");
        }

        Ok(y_sim)
    }

    /// Build the predictor features for one-step-ahead prediction
    ///
    /// Features are the delayed input, followed along the channel axis by the
    /// reference output shifted one step right when autoregressive.
    pub fn assemble_features(
        &self,
        u: Tensor<B, 3>,
        y: Option<Tensor<B, 3>>,
    ) -> Result<Tensor<B, 3>> {
        let [batch_size, _, seq_len] = self.check_input(&u)?;
        let u_delayed = delay_sequence(u, self.io_delay);

        if !self.ar {
            return Ok(u_delayed);
        }

        let y = y.ok_or(SysIdError::MissingReference)?;
        let expected = [batch_size, self.num_outputs, seq_len];
        if y.dims() != expected {
            return Err(SysIdError::shape_mismatch(format!(
                "reference output has shape {:?}, expected {:?}",
                y.dims(),
                expected
            )));
        }

        let y_past = delay_sequence(y, 1);
        Ok(Tensor::cat(vec![u_delayed, y_past], CHANNEL_DIM))
    }

    fn check_input(&self, u: &Tensor<B, 3>) -> Result<[usize; 3]> {
        let dims = u.dims();
        if dims[1] != self.num_inputs {
            return Err(SysIdError::shape_mismatch(format!(
                "input has {} channels, model expects {}",
                dims[1], self.num_inputs
            )));
        }
        Ok(dims)
    }

    fn check_prediction(&self, y_pred: &Tensor<B, 3>, batch_size: usize, seq_len: usize) -> Result<()> {
        let expected = [batch_size, self.num_outputs, seq_len];
        if y_pred.dims() != expected {
            return Err(SysIdError::shape_mismatch(format!(
                "predictor returned shape {:?}, expected {:?}",
                y_pred.dims(),
                expected
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predictor::{MlpConfig, TcnConfig};
    use burn::backend::NdArray;
    use burn::tensor::backend::Backend as BurnBackend;
    use burn::tensor::Distribution;

    type TestBackend = NdArray<f32>;
    type TestDevice = <TestBackend as BurnBackend>::Device;

    fn get_test_device() -> TestDevice {
        Default::default()
    }

    #[test]
    fn test_num_model_inputs() {
        for (nu, ny) in [(1, 1), (2, 3), (4, 1)] {
            let ar = DynamicModelConfig::new(nu, ny, PredictorConfig::Mlp(MlpConfig::new()));
            assert_eq!(ar.num_model_inputs(), nu + ny);

            let no_ar = ar.clone().with_ar(false);
            assert_eq!(no_ar.num_model_inputs(), nu);

            let model = no_ar.init::<TestBackend>(&get_test_device()).unwrap();
            assert_eq!(model.num_model_inputs(), nu);
            assert_eq!(model.predictor().num_inputs(), nu);
        }
    }

    #[test]
    fn test_initial_mode_and_switch() {
        let device = get_test_device();
        let mut model = DynamicModelConfig::new(1, 1, PredictorConfig::Mlp(MlpConfig::new()))
            .init::<TestBackend>(&device)
            .unwrap();

        assert_eq!(model.mode(), RunMode::OneStepAhead);
        assert_eq!(model.predictor().mode(), RunMode::OneStepAhead);

        model.set_mode(RunMode::FreeRunSimulation);
        model.set_mode(RunMode::FreeRunSimulation);
        assert_eq!(model.mode(), RunMode::FreeRunSimulation);
        assert_eq!(model.predictor().mode(), RunMode::FreeRunSimulation);

        model.set_mode(RunMode::OneStepAhead);
        assert_eq!(model.predictor().mode(), RunMode::OneStepAhead);
    }

    #[test]
    fn test_forward_shapes_both_modes() {
        let device = get_test_device();
        let config = DynamicModelConfig::new(
            2,
            1,
            PredictorConfig::Tcn(TcnConfig::new(vec![4], vec![1])),
        )
        .with_io_delay(1);
        let mut model = config.init::<TestBackend>(&device).unwrap();

        let u = Tensor::<TestBackend, 3>::random([3, 2, 15], Distribution::Default, &device);
        let y = Tensor::<TestBackend, 3>::random([3, 1, 15], Distribution::Default, &device);

        let y_osa = model.forward(u.clone(), Some(y)).unwrap();
        assert_eq!(y_osa.dims(), [3, 1, 15]);

        model.set_mode(RunMode::FreeRunSimulation);
        let y_sim = model.forward(u, None).unwrap();
        assert_eq!(y_sim.dims(), [3, 1, 15]);
    }

    #[test]
    fn test_missing_reference_is_rejected() {
        let device = get_test_device();
        let model = DynamicModelConfig::new(1, 1, PredictorConfig::Mlp(MlpConfig::new()))
            .init::<TestBackend>(&device)
            .unwrap();

        let u = Tensor::<TestBackend, 3>::zeros([2, 1, 10], &device);
        let result = model.forward(u, None);
        assert!(matches!(result, Err(SysIdError::MissingReference)));
    }

    #[test]
    fn test_shape_mismatch_is_rejected() {
        let device = get_test_device();
        let model = DynamicModelConfig::new(1, 1, PredictorConfig::Mlp(MlpConfig::new()))
            .init::<TestBackend>(&device)
            .unwrap();

        let u = Tensor::<TestBackend, 3>::zeros([2, 1, 10], &device);
        let short_y = Tensor::<TestBackend, 3>::zeros([2, 1, 9], &device);
        assert!(matches!(
            model.forward(u, Some(short_y)),
            Err(SysIdError::ShapeMismatch { .. })
        ));

        let wide_u = Tensor::<TestBackend, 3>::zeros([2, 3, 10], &device);
        let y = Tensor::<TestBackend, 3>::zeros([2, 1, 10], &device);
        assert!(matches!(
            model.forward(wide_u, Some(y)),
            Err(SysIdError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_predictor_size_mismatch_is_rejected() {
        let device = get_test_device();
        // Autoregressive 1-in/1-out model needs a 2-channel predictor
        let predictor = MlpConfig::new().init::<TestBackend>(1, 1, &device).unwrap();
        let result = DynamicModel::new(1, 1, true, 0, predictor);
        assert!(matches!(result, Err(SysIdError::InvalidConfig { .. })));
    }
}
