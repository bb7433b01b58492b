use crate::{DType, WithDType};

#[derive(Debug, Clone, PartialEq)]
pub enum CPUStorage {
    F32(Vec<f32>),
    F64(Vec<f64>),
}

impl CPUStorage {
    pub(crate) fn dtype(&self) -> DType {
        match self {
            CPUStorage::F32(_) => DType::F32,
            CPUStorage::F64(_) => DType::F64,
        }
    }

    pub(crate) fn len(&self) -> usize {
        match self {
            CPUStorage::F32(data) => data.len(),
            CPUStorage::F64(data) => data.len(),
        }
    }

    pub(crate) fn zeros(dtype: DType, elem_count: usize) -> Self {
        match dtype {
            DType::F32 => CPUStorage::F32(vec![0f32; elem_count]),
            DType::F64 => CPUStorage::F64(vec![0f64; elem_count]),
        }
    }
}

// The kernels below work on contiguous row-major buffers. Shapes are validated
// by the caller, so every index here is in bounds.

/// `out[n, o] = sum_i src[n, i] * weight[o, i] + bias[o]`
pub(crate) fn linear_forward<T: WithDType>(
    src: &[T],
    weight: &[T],
    bias: Option<&[T]>,
    (batch, in_features): (usize, usize),
    out_features: usize,
) -> Vec<T> {
    log::trace!(
        "linear_forward batch={batch} in={in_features} out={out_features} bias={}",
        bias.is_some()
    );
    let mut out = vec![T::zero(); batch * out_features];
    for n in 0..batch {
        let row = &src[n * in_features..(n + 1) * in_features];
        for o in 0..out_features {
            let w_row = &weight[o * in_features..(o + 1) * in_features];
            let mut sum = T::zero();
            for (&x, &w) in row.iter().zip(w_row) {
                sum += x * w;
            }
            if let Some(bias) = bias {
                sum += bias[o];
            }
            out[n * out_features + o] = sum;
        }
    }
    out
}

/// `out[o, i] = sum_n diff_dst[n, o] * src[n, i]`
pub(crate) fn linear_weight_grad<T: WithDType>(
    src: &[T],
    diff_dst: &[T],
    (batch, in_features): (usize, usize),
    out_features: usize,
) -> Vec<T> {
    log::trace!("linear_weight_grad batch={batch} in={in_features} out={out_features}");
    let mut out = vec![T::zero(); out_features * in_features];
    for n in 0..batch {
        let x_row = &src[n * in_features..(n + 1) * in_features];
        for o in 0..out_features {
            let gy = diff_dst[n * out_features + o];
            let out_row = &mut out[o * in_features..(o + 1) * in_features];
            for (acc, &x) in out_row.iter_mut().zip(x_row) {
                *acc += gy * x;
            }
        }
    }
    out
}

/// `out[o] = sum_n diff_dst[n, o]`
pub(crate) fn linear_bias_grad<T: WithDType>(
    diff_dst: &[T],
    batch: usize,
    out_features: usize,
) -> Vec<T> {
    log::trace!("linear_bias_grad batch={batch} out={out_features}");
    let mut out = vec![T::zero(); out_features];
    if out_features == 0 {
        return out;
    }
    for row in diff_dst.chunks_exact(out_features).take(batch) {
        for (acc, &gy) in out.iter_mut().zip(row) {
            *acc += gy;
        }
    }
    out
}

/// `out[n, i] = sum_o diff_dst[n, o] * weight[o, i]`
pub(crate) fn linear_data_grad<T: WithDType>(
    weight: &[T],
    diff_dst: &[T],
    (out_features, in_features): (usize, usize),
    batch: usize,
) -> Vec<T> {
    log::trace!("linear_data_grad batch={batch} in={in_features} out={out_features}");
    let mut out = vec![T::zero(); batch * in_features];
    for n in 0..batch {
        let out_row = &mut out[n * in_features..(n + 1) * in_features];
        for o in 0..out_features {
            let gy = diff_dst[n * out_features + o];
            let w_row = &weight[o * in_features..(o + 1) * in_features];
            for (acc, &w) in out_row.iter_mut().zip(w_row) {
                *acc += gy * w;
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forward_without_bias() {
        // [[1, 2, 3], [4, 5, 6]] . [[1, 0, 0], [0, 1, 1]]^T
        let src = [1f32, 2., 3., 4., 5., 6.];
        let weight = [1f32, 0., 0., 0., 1., 1.];
        let out = linear_forward(&src, &weight, None, (2, 3), 2);
        assert_eq!(out, [1., 5., 4., 11.]);
    }

    #[test]
    fn forward_with_bias() {
        let src = [1f64, 2.];
        let weight = [3f64, 4., 5., 6., 7., 8.];
        let bias = [0.5f64, -1., 2.];
        let out = linear_forward(&src, &weight, Some(&bias), (1, 2), 3);
        assert_eq!(out, [11.5, 16., 25.]);
    }

    #[test]
    fn weight_grad() {
        let src = [1f32, 2., 3., 4.];
        let diff_dst = [1f32, 0., 0., 1.];
        // gy^T . x with gy = identity gives x back.
        let out = linear_weight_grad(&src, &diff_dst, (2, 2), 2);
        assert_eq!(out, [1., 2., 3., 4.]);
    }

    #[test]
    fn bias_grad() {
        let diff_dst = [1f32, 2., 3., 4., 5., 6.];
        let out = linear_bias_grad(&diff_dst, 2, 3);
        assert_eq!(out, [5., 7., 9.]);
    }

    #[test]
    fn data_grad() {
        let weight = [1f32, 2., 3., 4., 5., 6.];
        let diff_dst = [1f32, 1.];
        let out = linear_data_grad(&weight, &diff_dst, (2, 3), 1);
        assert_eq!(out, [5., 7., 9.]);
    }

    #[test]
    fn zeros_storage() {
        let storage = CPUStorage::zeros(DType::F64, 3);
        assert_eq!(storage.dtype(), DType::F64);
        assert_eq!(storage.len(), 3);
        assert_eq!(storage, CPUStorage::F64(vec![0.; 3]));
    }
}
