//! Error measures for predicted output sequences
//!
//! All measures compare `[batch, channels, length]` tensors, are computed per
//! output channel over every batch item and time step, and are then averaged
//! over channels.

use crate::error::{Result, SysIdError};
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

fn check_shapes<B: Backend>(y_true: &Tensor<B, 3>, y_pred: &Tensor<B, 3>) -> Result<()> {
    if y_true.dims() != y_pred.dims() {
        return Err(SysIdError::shape_mismatch(format!(
            "prediction has shape {:?}, reference has {:?}",
            y_pred.dims(),
            y_true.dims()
        )));
    }
    Ok(())
}

/// `[batch, channels, length]` -> `[channels, batch * length]`
fn per_channel<B: Backend>(x: Tensor<B, 3>) -> Tensor<B, 2> {
    let [batch_size, channels, seq_len] = x.dims();
    x.swap_dims(0, 1).reshape([channels, batch_size * seq_len])
}

fn to_vec_f64<B: Backend, const D: usize>(x: Tensor<B, D>) -> Result<Vec<f64>> {
    x.into_data()
        .convert::<f64>()
        .to_vec::<f64>()
        .map_err(|e| SysIdError::tensor_data(format!("{:?}", e)))
}

fn to_f64<B: Backend>(x: Tensor<B, 1>) -> Result<f64> {
    to_vec_f64(x)?
        .first()
        .copied()
        .ok_or_else(|| SysIdError::tensor_data("empty reduction"))
}

/// Mean squared error
pub fn mse<B: Backend>(y_true: Tensor<B, 3>, y_pred: Tensor<B, 3>) -> Result<f64> {
    check_shapes(&y_true, &y_pred)?;
    let err = y_true - y_pred;
    to_f64(err.powf_scalar(2.0).mean())
}

/// Root mean squared error, averaged over output channels
pub fn rmse<B: Backend>(y_true: Tensor<B, 3>, y_pred: Tensor<B, 3>) -> Result<f64> {
    check_shapes(&y_true, &y_pred)?;
    let err = per_channel(y_true - y_pred);
    let channel_rmse = err.powf_scalar(2.0).mean_dim(1).sqrt();
    to_f64(channel_rmse.mean())
}

/// Variance accounted for, in percent, averaged over output channels
///
/// `VAF = 100 · (1 - var(y - ŷ) / var(y))`; 100 is a perfect fit.
///
/// Variances use `n - 1`, so each channel needs at least two samples and a
/// reference that is not constant; otherwise the ratio is undefined and
/// [`SysIdError::ConstantReference`] is returned.
pub fn vaf<B: Backend>(y_true: Tensor<B, 3>, y_pred: Tensor<B, 3>) -> Result<f64> {
    check_shapes(&y_true, &y_pred)?;
    let y_true = per_channel(y_true);
    let [_, samples] = y_true.dims();
    if samples < 2 {
        return Err(SysIdError::shape_mismatch(format!(
            "vaf needs at least 2 samples per channel, got {}",
            samples
        )));
    }
    let err = y_true.clone() - per_channel(y_pred);

    let var_err = err.var(1);
    let var_true = y_true.var(1);
    if let Some(channel) = to_vec_f64(var_true.clone())?
        .iter()
        .position(|v| !(v.is_finite() && *v > 0.0))
    {
        return Err(SysIdError::ConstantReference { channel });
    }
    let channel_vaf = (var_err / var_true).neg().add_scalar(1.0).mul_scalar(100.0);
    to_f64(channel_vaf.mean())
}
