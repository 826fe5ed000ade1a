//! Tensor host-readback utilities.

use burn::prelude::*;

use crate::error::{CoreError, Result};

/// Read a tensor back into a flat `Vec<f32>` in row-major order.
///
/// # Arguments
///
/// * `tensor` - Any float tensor.
///
/// # Returns
///
/// The tensor's values as a contiguous vector.
pub fn tensor_to_vec<B: Backend, const D: usize>(tensor: Tensor<B, D>) -> Result<Vec<f32>> {
    let data = tensor.into_data();
    let values: Vec<f32> = data
        .as_slice()
        .map_err(|e| CoreError::TensorRead(format!("failed to read tensor data: {e:?}")))?
        .to_vec();
    Ok(values)
}
