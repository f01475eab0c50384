//! Synthetic data from the nonlinear system of Chen, Billings and Grant
//!
//! S. Chen, S. A. Billings, P. M. Grant, "Non-linear system identification
//! using neural networks", International Journal of Control 51 (6), 1990.
//!
//! ```text
//! y*[k] = (0.8 - 0.5·exp(-y*[k-1]²))·y*[k-1] - (0.3 + 0.9·exp(-y*[k-1]²))·y*[k-2]
//!         + u[k-1] + 0.2·u[k-2] + 0.1·u[k-1]·u[k-2] + v[k]
//! y[k]  = y*[k] + w[k]
//! ```
//!
//! The input is Gaussian noise held constant for [`INPUT_HOLD`] samples.

use super::{SequenceDataset, SequencePair};
use crate::error::{Result, SysIdError};
use burn::config::Config;
use ndarray::{s, Array1, Array3};
use rand::prelude::*;
use rand_distr::StandardNormal;
use tracing::info;

/// Number of consecutive samples sharing one random input level
pub const INPUT_HOLD: usize = 5;

/// Configuration of a [`ChenDataset`]
#[derive(Config, Debug)]
pub struct ChenConfig {
    /// Length of every sequence
    pub seq_len: usize,
    /// Number of sequences
    pub ntotbatch: usize,
    /// Leading samples discarded to skip the initial transient
    #[config(default = 100)]
    pub burnout: usize,
    /// Seed of the random generator
    #[config(default = 1)]
    pub seed: u64,
    /// Standard deviation of the process noise `v`
    #[config(default = 0.1)]
    pub sd_v: f64,
    /// Standard deviation of the measurement noise `w`
    #[config(default = 0.5)]
    pub sd_w: f64,
}

impl ChenConfig {
    /// Generate the dataset
    pub fn init(&self) -> Result<ChenDataset> {
        ChenDataset::new(self.clone())
    }
}

/// Paired input/output sequences of the Chen system
///
/// Items are consecutive slices of one long simulation, each with one input
/// and one output channel.
#[derive(Clone, Debug)]
pub struct ChenDataset {
    config: ChenConfig,
    /// `[ntotbatch, 1, seq_len]`
    u: Array3<f32>,
    /// `[ntotbatch, 1, seq_len]`
    y: Array3<f32>,
}

impl ChenDataset {
    /// Number of input channels
    pub const NU: usize = 1;
    /// Number of output channels
    pub const NY: usize = 1;

    /// Simulate the system and split the record into sequences
    pub fn new(config: ChenConfig) -> Result<Self> {
        if config.seq_len == 0 || config.ntotbatch == 0 {
            return Err(SysIdError::invalid_config(format!(
                "chen dataset needs positive seq_len and ntotbatch, got {} and {}",
                config.seq_len, config.ntotbatch
            )));
        }
        for (name, sd) in [("sd_v", config.sd_v), ("sd_w", config.sd_w)] {
            if !sd.is_finite() || sd < 0.0 {
                return Err(SysIdError::invalid_config(format!(
                    "{} must be a non-negative standard deviation, got {}",
                    name, sd
                )));
            }
        }

        let total_length = config.seq_len * config.ntotbatch + config.burnout;
        let mut rng = StdRng::seed_from_u64(config.seed);

        let u = generate_random_input(&mut rng, total_length);
        let y = simulate_system(&mut rng, &u, config.sd_v, config.sd_w);

        let shape = (config.ntotbatch, 1, config.seq_len);
        let u = to_sequences(&u, config.burnout, shape)?;
        let y = to_sequences(&y, config.burnout, shape)?;

        info!(
            seq_len = config.seq_len,
            ntotbatch = config.ntotbatch,
            seed = config.seed,
            sd_v = config.sd_v,
            sd_w = config.sd_w,
            "generated chen dataset"
        );

        Ok(Self { config, u, y })
    }

    /// Get the generating configuration
    pub fn config(&self) -> &ChenConfig {
        &self.config
    }

    /// All inputs, `[ntotbatch, 1, seq_len]`
    pub fn inputs(&self) -> &Array3<f32> {
        &self.u
    }

    /// All outputs, `[ntotbatch, 1, seq_len]`
    pub fn outputs(&self) -> &Array3<f32> {
        &self.y
    }

    /// Noise-free one-step map of the system
    pub fn nonlinear_function(y1: f64, y2: f64, u1: f64, u2: f64) -> f64 {
        let decay = (-y1 * y1).exp();
        (0.8 - 0.5 * decay) * y1 - (0.3 + 0.9 * decay) * y2 + u1 + 0.2 * u2 + 0.1 * u1 * u2
    }
}

impl SequenceDataset for ChenDataset {
    fn len(&self) -> usize {
        self.config.ntotbatch
    }

    fn get(&self, index: usize) -> Option<SequencePair> {
        if index >= self.len() {
            return None;
        }
        Some(SequencePair {
            input: self.u.slice(s![index, .., ..]).to_owned(),
            output: self.y.slice(s![index, .., ..]).to_owned(),
        })
    }

    fn data_shape(&self) -> ((usize, usize), (usize, usize)) {
        (
            (Self::NU, self.config.seq_len),
            (Self::NY, self.config.seq_len),
        )
    }
}

/// Unit-variance Gaussian levels, each held for [`INPUT_HOLD`] samples
fn generate_random_input(rng: &mut StdRng, n: usize) -> Array1<f64> {
    let levels = n.div_ceil(INPUT_HOLD);
    let values: Vec<f64> = (0..levels)
        .map(|_| rng.sample::<f64, _>(StandardNormal))
        .collect();

    values
        .iter()
        .flat_map(|&level| std::iter::repeat(level).take(INPUT_HOLD))
        .take(n)
        .collect()
}

/// Run the recurrence and add measurement noise
fn simulate_system(rng: &mut StdRng, u: &Array1<f64>, sd_v: f64, sd_w: f64) -> Array1<f64> {
    let n = u.len();
    let v: Array1<f64> = (0..n).map(|_| sd_v * rng.sample::<f64, _>(StandardNormal)).collect();
    let w: Array1<f64> = (0..n).map(|_| sd_w * rng.sample::<f64, _>(StandardNormal)).collect();

    // Random initial conditions; later samples are overwritten by the recurrence
    let mut y: Array1<f64> = (0..n).map(|_| rng.sample::<f64, _>(StandardNormal)).collect();
    for k in 2..n {
        y[k] = ChenDataset::nonlinear_function(y[k - 1], y[k - 2], u[k - 1], u[k - 2]) + v[k];
    }

    y + w
}

fn to_sequences(
    signal: &Array1<f64>,
    burnout: usize,
    shape: (usize, usize, usize),
) -> Result<Array3<f32>> {
    let kept: Vec<f32> = signal.iter().skip(burnout).map(|&x| x as f32).collect();
    Array3::from_shape_vec(shape, kept).map_err(|e| SysIdError::shape_mismatch(e.to_string()))
}
