//! Causal time alignment of sequences
//!
//! All helpers work on `[batch, channels, length]` tensors and shift or
//! window along the last (time) axis.

use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

/// Time axis of a `[batch, channels, length]` sequence tensor
pub const TIME_DIM: usize = 2;

/// Channel axis of a `[batch, channels, length]` sequence tensor
pub const CHANNEL_DIM: usize = 1;

/// Shift a sequence in time by `io_delay` steps, zero-filling the vacated edge.
///
/// * `io_delay > 0`: `out[t] = u[t - io_delay]`, zeros for `t < io_delay`
/// * `io_delay < 0`: `out[t] = u[t + |io_delay|]`, zeros for the last `|io_delay|` steps
/// * `io_delay == 0`: `u` is returned as is
///
/// The result always has the shape of `u`. A delay at least as long as the
/// sequence yields all zeros.
///
/// # Example
///
/// ```rust
/// use burn::backend::NdArray;
/// use burn::tensor::Tensor;
/// use sysid::delay::delay_sequence;
///
/// let device = Default::default();
/// let u = Tensor::<NdArray<f32>, 1>::from_floats([1.0, 2.0, 3.0], &device).reshape([1, 1, 3]);
/// let delayed = delay_sequence(u, 1);
/// assert_eq!(delayed.into_data().to_vec::<f32>().unwrap(), vec![0.0, 1.0, 2.0]);
/// ```
pub fn delay_sequence<B: Backend>(u: Tensor<B, 3>, io_delay: i64) -> Tensor<B, 3> {
    let [batch_size, channels, seq_len] = u.dims();
    let shift = io_delay.unsigned_abs() as usize;

    if io_delay == 0 {
        return u;
    }
    if shift >= seq_len {
        return Tensor::zeros([batch_size, channels, seq_len], &u.device());
    }

    let zeros = Tensor::<B, 3>::zeros([batch_size, channels, shift], &u.device());
    if io_delay > 0 {
        // Prepend zeros, drop the last `shift` samples
        let kept = u.narrow(TIME_DIM, 0, seq_len - shift);
        Tensor::cat(vec![zeros, kept], TIME_DIM)
    } else {
        // Drop the first `shift` samples, append zeros
        let kept = u.narrow(TIME_DIM, shift, seq_len - shift);
        Tensor::cat(vec![kept, zeros], TIME_DIM)
    }
}

/// Prepend `n` zero steps to a sequence. The result is `n` steps longer.
pub fn left_pad<B: Backend>(x: Tensor<B, 3>, n: usize) -> Tensor<B, 3> {
    if n == 0 {
        return x;
    }
    let [batch_size, channels, _] = x.dims();
    let zeros = Tensor::<B, 3>::zeros([batch_size, channels, n], &x.device());
    Tensor::cat(vec![zeros, x], TIME_DIM)
}

/// Window of `width` steps ending just before step `end`, i.e. `[end - width, end)`.
///
/// Steps before the start of the sequence are zero, so the window is always
/// exactly `width` steps wide.
///
/// # Panics
/// Panics if `end` is past the end of the sequence or `width` is zero.
pub fn trailing_window<B: Backend>(seq: &Tensor<B, 3>, end: usize, width: usize) -> Tensor<B, 3> {
    let [batch_size, channels, seq_len] = seq.dims();
    assert!(width > 0, "Window width must be positive");
    assert!(
        end <= seq_len,
        "Window end {} is past the sequence length {}",
        end,
        seq_len
    );

    let start = end.saturating_sub(width);
    let available = end - start;
    if available == 0 {
        return Tensor::zeros([batch_size, channels, width], &seq.device());
    }

    let window = seq.clone().narrow(TIME_DIM, start, available);
    left_pad(window, width - available)
}
