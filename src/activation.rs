//! Activation functions for the predictor hidden layers
//!
//! Burn ships ReLU, sigmoid and tanh; LeCun's scaled tanh is provided here.

use crate::error::SysIdError;
use burn::tensor::{activation, backend::Backend, Tensor};
use std::str::FromStr;

/// LeCun's tanh activation function.
///
/// This activation function is defined as:
/// `f(x) = 1.7159 * tanh(0.666 * x)`
///
/// The scaling keeps the function close to the identity near the origin
/// with an output range of approximately [-1.7159, 1.7159].
///
/// # Example
///
/// ```rust
/// use burn::backend::NdArray;
/// use burn::tensor::Tensor;
/// use sysid::activation::LeCun;
///
/// type Backend = NdArray<f32>;
/// let device = Default::default();
///
/// let x = Tensor::<Backend, 1>::from_floats([0.0, 1.0, -1.0], &device);
/// let y = LeCun::forward(x);
/// ```
pub struct LeCun;

impl LeCun {
    /// Applies the LeCun tanh activation function element-wise.
    pub fn forward<B: Backend, const D: usize>(x: Tensor<B, D>) -> Tensor<B, D> {
        let scaled = x * 0.666f32;
        scaled.tanh() * 1.7159f32
    }
}

/// Hidden-layer activation selectable from configuration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Activation {
    /// Logistic sigmoid
    #[default]
    Sigmoid,
    /// Rectified linear unit
    Relu,
    /// Hyperbolic tangent
    Tanh,
    /// LeCun's scaled tanh, see [`LeCun`]
    LecunTanh,
}

impl Activation {
    /// Apply the activation element-wise
    pub fn forward<B: Backend, const D: usize>(&self, x: Tensor<B, D>) -> Tensor<B, D> {
        match self {
            Activation::Sigmoid => activation::sigmoid(x),
            Activation::Relu => activation::relu(x),
            Activation::Tanh => x.tanh(),
            Activation::LecunTanh => LeCun::forward(x),
        }
    }

    /// Compact code stored on predictor modules
    pub fn code(self) -> u8 {
        match self {
            Activation::Sigmoid => 0,
            Activation::Relu => 1,
            Activation::Tanh => 2,
            Activation::LecunTanh => 3,
        }
    }

    /// Inverse of [`Activation::code`]; unknown codes fall back to sigmoid
    pub fn from_code(code: u8) -> Self {
        match code {
            1 => Activation::Relu,
            2 => Activation::Tanh,
            3 => Activation::LecunTanh,
            _ => Activation::Sigmoid,
        }
    }
}

impl FromStr for Activation {
    type Err = SysIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sigmoid" => Ok(Activation::Sigmoid),
            "relu" => Ok(Activation::Relu),
            "tanh" => Ok(Activation::Tanh),
            "lecun_tanh" => Ok(Activation::LecunTanh),
            _ => Err(SysIdError::UnsupportedActivation {
                name: s.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type Backend = NdArray<f32>;

    #[test]
    fn test_lecun_tanh_values() {
        let device = Default::default();
        let test_values = [-10.0f32, -1.0, 0.0, 1.0, 10.0];

        for &val in &test_values {
            let x = Tensor::<Backend, 1>::full([1], val, &device);
            let result = LeCun::forward(x).into_scalar();
            let expected = 1.7159f32 * (0.666f32 * val).tanh();

            assert!(
                (result - expected).abs() < 1e-5,
                "LeCun activation incorrect at x={}",
                val
            );
        }
    }

    #[test]
    fn test_activation_from_str() {
        assert_eq!("relu".parse::<Activation>().unwrap(), Activation::Relu);
        assert_eq!("sigmoid".parse::<Activation>().unwrap(), Activation::Sigmoid);
        assert_eq!("lecun_tanh".parse::<Activation>().unwrap(), Activation::LecunTanh);
        assert!(matches!(
            "gelu".parse::<Activation>(),
            Err(SysIdError::UnsupportedActivation { .. })
        ));
    }

    #[test]
    fn test_activation_codes() {
        for act in [
            Activation::Sigmoid,
            Activation::Relu,
            Activation::Tanh,
            Activation::LecunTanh,
        ] {
            assert_eq!(Activation::from_code(act.code()), act);
        }
    }

    #[test]
    fn test_activation_forward() {
        let device = Default::default();
        let x = Tensor::<Backend, 1>::from_floats([-1.0, 0.0, 2.0], &device);

        let relu = Activation::Relu.forward(x.clone()).into_data().to_vec::<f32>().unwrap();
        assert_eq!(relu, vec![0.0, 0.0, 2.0]);

        let sigmoid = Activation::Sigmoid.forward(x).into_data().to_vec::<f32>().unwrap();
        assert!((sigmoid[1] - 0.5).abs() < 1e-6);
        assert!(sigmoid.iter().all(|&v| v > 0.0 && v < 1.0));
    }
}
