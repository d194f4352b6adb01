use anyhow::{ensure, Result};
use candle_core::{DType, Tensor};

/// Mean over unmasked tokens followed by L2 normalization: `[B,T,H] -> [B,H]`.
/// A row with no unmasked tokens pools to zeros instead of NaN.
pub fn masked_mean_l2(hidden: &Tensor, attention_mask: &Tensor) -> Result<Tensor> {
    let (batch, _, hidden_dim) = hidden.dims3()?;
    ensure!(
        attention_mask.dims().first() == Some(&batch),
        "mask batch {:?} does not match hidden batch {batch}",
        attention_mask.dims()
    );

    let mask = attention_mask.to_device(hidden.device())?.to_dtype(hidden.dtype())?.unsqueeze(2)?;
    let summed = hidden.broadcast_mul(&mask)?.sum(1)?;
    let counts = mask.sum(1)?.maximum(1f64)?;
    let mean = summed.broadcast_div(&counts)?;

    let eps = match hidden.dtype() {
        DType::F16 | DType::BF16 => 1e-6,
        _ => 1e-12,
    };
    let norms = (mean.sqr()?.sum_keepdim(1)?.sqrt()? + eps)?;
    let pooled = mean.broadcast_div(&norms)?;
    ensure!(pooled.dims() == [batch, hidden_dim], "pooled shape mismatch: {:?}", pooled.dims());
    Ok(pooled)
}
