//! Parameter initialization and reset helpers.
//!
//! All learnable tensors live in a per-model [`VarMap`] so an external
//! optimizer can update them between forward passes. `reset_var_map`
//! re-initializes every parameter in place: xavier-uniform for weight
//! matrices and tables, zero for bias vectors.

use candle_core::Tensor;
use candle_nn::{Init, VarMap};

use crate::error::Result;

fn xavier_bound(dims: &[usize]) -> f64 {
    let (fan_in, fan_out) = match dims {
        [n] => (*n, *n),
        _ => (dims[dims.len() - 2], dims[dims.len() - 1]),
    };
    (6.0 / (fan_in + fan_out) as f64).sqrt()
}

/// Xavier/Glorot uniform init for a parameter of the given shape.
///
/// Fan-in/fan-out are taken from the trailing two dimensions, so block
/// weights `(R, B, in_b, out_b)` are initialized per block.
pub(crate) fn xavier_uniform(dims: &[usize]) -> Init {
    let bound = xavier_bound(dims);
    Init::Uniform {
        lo: -bound,
        up: bound,
    }
}

/// Re-initialize every parameter held by `map`.
pub(crate) fn reset_var_map(map: &VarMap) -> Result<()> {
    let data = map.data().lock().unwrap();
    for var in data.values() {
        let dims = var.dims().to_vec();
        let fresh = if dims.len() >= 2 {
            let bound = xavier_bound(&dims) as f32;
            Tensor::rand(-bound, bound, dims.as_slice(), var.device())?
        } else {
            Tensor::zeros(dims.as_slice(), var.dtype(), var.device())?
        };
        var.set(&fresh)?;
    }
    Ok(())
}
