//! # Sequence Datasets
//!
//! Datasets of paired input/output sequences and their batching into
//! `[batch, channels, length]` tensors.
//!
//! | Type | Role |
//! |------|------|
//! | [`SequenceDataset`] | Indexed collection of [`SequencePair`]s with a fixed per-item shape |
//! | [`ChenDataset`] | Synthetic data from the Chen–Billings–Grant nonlinear system |
//! | [`SequenceBatcher`] | Stacks items into a [`SequenceBatch`] on a device |

pub mod chen;

pub use chen::{ChenConfig, ChenDataset};

use crate::error::{Result, SysIdError};
use burn::tensor::backend::Backend;
use burn::tensor::{Tensor, TensorData};
use ndarray::Array2;
use rand::prelude::*;

/// One dataset item: input and output sequences of shape `(channels, seq_len)`
#[derive(Clone, Debug, PartialEq)]
pub struct SequencePair {
    /// Input sequence `u`
    pub input: Array2<f32>,
    /// Output sequence `y`
    pub output: Array2<f32>,
}

/// Indexed collection of input/output sequence pairs sharing one shape
pub trait SequenceDataset {
    /// Number of items
    fn len(&self) -> usize;

    /// Whether the dataset has no items
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Item at `index`, or `None` past the end
    fn get(&self, index: usize) -> Option<SequencePair>;

    /// Per-item `((input_channels, seq_len), (output_channels, seq_len))`
    fn data_shape(&self) -> ((usize, usize), (usize, usize));
}

/// A batch of aligned input/output sequences
#[derive(Clone, Debug)]
pub struct SequenceBatch<B: Backend> {
    /// `[batch, input_channels, seq_len]`
    pub inputs: Tensor<B, 3>,
    /// `[batch, output_channels, seq_len]`
    pub outputs: Tensor<B, 3>,
}

/// Builds tensor batches from dataset items
#[derive(Clone, Debug)]
pub struct SequenceBatcher<B: Backend> {
    device: B::Device,
}

impl<B: Backend> SequenceBatcher<B> {
    /// Create a batcher placing tensors on `device`
    pub fn new(device: B::Device) -> Self {
        Self { device }
    }

    /// Stack items into one batch, keeping their order
    pub fn batch(&self, items: &[SequencePair]) -> Result<SequenceBatch<B>> {
        let first = items
            .first()
            .ok_or_else(|| SysIdError::shape_mismatch("cannot batch zero sequences"))?;
        let input_shape = first.input.dim();
        let output_shape = first.output.dim();

        if input_shape.1 != output_shape.1 {
            return Err(SysIdError::shape_mismatch(format!(
                "input length {} differs from output length {}",
                input_shape.1, output_shape.1
            )));
        }

        let mut inputs = Vec::with_capacity(items.len() * input_shape.0 * input_shape.1);
        let mut outputs = Vec::with_capacity(items.len() * output_shape.0 * output_shape.1);
        for (i, item) in items.iter().enumerate() {
            if item.input.dim() != input_shape || item.output.dim() != output_shape {
                return Err(SysIdError::shape_mismatch(format!(
                    "item {} has shapes {:?}/{:?}, batch uses {:?}/{:?}",
                    i,
                    item.input.dim(),
                    item.output.dim(),
                    input_shape,
                    output_shape
                )));
            }
            inputs.extend(item.input.iter().copied());
            outputs.extend(item.output.iter().copied());
        }

        let n = items.len();
        let inputs = TensorData::new(inputs, [n, input_shape.0, input_shape.1]);
        let outputs = TensorData::new(outputs, [n, output_shape.0, output_shape.1]);

        Ok(SequenceBatch {
            inputs: Tensor::from_data(inputs, &self.device),
            outputs: Tensor::from_data(outputs, &self.device),
        })
    }

    /// Split a dataset into batches of at most `batch_size` items
    ///
    /// Items are visited in index order, or in a seeded random order when
    /// `shuffle_seed` is given. The last batch may be smaller.
    pub fn batches(
        &self,
        dataset: &impl SequenceDataset,
        batch_size: usize,
        shuffle_seed: Option<u64>,
    ) -> Result<Vec<SequenceBatch<B>>> {
        if batch_size == 0 {
            return Err(SysIdError::invalid_config("batch_size must be at least 1"));
        }

        let order = match shuffle_seed {
            Some(seed) => shuffled_indices(dataset.len(), seed),
            None => (0..dataset.len()).collect(),
        };

        order
            .chunks(batch_size)
            .map(|chunk| {
                let items: Vec<SequencePair> =
                    chunk.iter().filter_map(|&i| dataset.get(i)).collect();
                self.batch(&items)
            })
            .collect()
    }
}

/// Seeded random permutation of `0..len`
pub fn shuffled_indices(len: usize, seed: u64) -> Vec<usize> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut indices: Vec<usize> = (0..len).collect();
    indices.shuffle(&mut rng);
    indices
}
