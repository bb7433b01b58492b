use std::marker::PhantomData;

use crate::backend::cpu_backend;
use crate::{Device, Error, LinearParams, Result, Shape, Tensor, WithDType};

/// Native compute routines of a fully-connected layer.
///
/// Implementations own the numerics; failures are reported through [`Result`].
pub trait LinearPrimitive {
    /// Native tensor type consumed and produced by the routines.
    type Tensor;

    /// `Y = X·Wᵀ (+ b)`. `bias` is `Some` exactly when `params.with_bias` is set.
    fn forward(
        &self,
        src: &Self::Tensor,
        weights: &Self::Tensor,
        bias: Option<&Self::Tensor>,
        params: &LinearParams,
    ) -> Result<Self::Tensor>;

    /// Weight gradient `gW = gYᵀ·X`, followed by the bias gradient `Σₙ gY`
    /// when `params.with_bias` is set.
    fn backward_weights(
        &self,
        src: &Self::Tensor,
        diff_dst: &Self::Tensor,
        params: &LinearParams,
    ) -> Result<Vec<Self::Tensor>>;

    /// Input gradient `gX = gY·W`.
    fn backward_data(
        &self,
        weights: &Self::Tensor,
        diff_dst: &Self::Tensor,
        params: &LinearParams,
    ) -> Result<Self::Tensor>;
}

/// Reference CPU implementation over contiguous tensors of element type `T`.
pub struct Linear<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> Linear<T> {
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T> Default for Linear<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for Linear<T> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<T> Copy for Linear<T> {}

impl<T> std::fmt::Debug for Linear<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Linear<{}>", std::any::type_name::<T>())
    }
}

/// Checks `src` is `[N, D_in]` and `weights` is `[D_out, D_in]`, returning
/// `((N, D_in), D_out)`.
fn matmul_dims(src: &Tensor, weights: &Tensor, op: &'static str) -> Result<((usize, usize), usize)> {
    let (batch, in_features) = rank_two(src, op)?;
    let (out_features, weight_in) = rank_two(weights, op)?;
    if in_features != weight_in {
        return Err(Error::BinaryOperationShapeMismatch {
            lhs: src.shape().clone(),
            rhs: weights.shape().clone(),
            op,
        }
        .backtrace());
    }
    Ok(((batch, in_features), out_features))
}

fn rank_two(tensor: &Tensor, op: &'static str) -> Result<(usize, usize)> {
    tensor.shape().rank_two().map_err(|_| {
        Error::UnexpectedRank {
            expected: 2,
            actual: tensor.rank(),
            shape: tensor.shape().clone(),
            op,
        }
        .backtrace()
    })
}

fn expect_dims(lhs: &Tensor, rhs: &Tensor, dims: &[usize], op: &'static str) -> Result<()> {
    if rhs.dims() != dims {
        return Err(Error::BinaryOperationShapeMismatch {
            lhs: lhs.shape().clone(),
            rhs: rhs.shape().clone(),
            op,
        }
        .backtrace());
    }
    Ok(())
}

/// Rejects a result shape whose buffer size would overflow, before the kernel
/// allocates it.
fn output_shape<S: Into<Shape>>(shape: S) -> Result<Shape> {
    let shape = shape.into();
    shape.elem_count()?;
    Ok(shape)
}

fn output<T: WithDType>(data: Vec<T>, shape: Shape) -> Result<Tensor> {
    Tensor::from_vec(data, shape, &Device::CPU)
}

impl<T: WithDType> LinearPrimitive for Linear<T> {
    type Tensor = Tensor;

    fn forward(
        &self,
        src: &Tensor,
        weights: &Tensor,
        bias: Option<&Tensor>,
        params: &LinearParams,
    ) -> Result<Tensor> {
        const OP: &str = "linear_forward";
        let ((batch, in_features), out_features) = matmul_dims(src, weights, OP)?;
        let bias = match (params.with_bias, bias) {
            (true, Some(bias)) => {
                expect_dims(weights, bias, &[out_features], OP)?;
                Some(bias.data::<T>(OP)?)
            }
            (true, None) => return Err(Error::MissingBias { op: OP }.backtrace()),
            (false, _) => None,
        };
        let dst_shape = output_shape((batch, out_features))?;
        let out = cpu_backend::linear_forward(
            src.data::<T>(OP)?,
            weights.data::<T>(OP)?,
            bias,
            (batch, in_features),
            out_features,
        );
        output(out, dst_shape)
    }

    fn backward_weights(
        &self,
        src: &Tensor,
        diff_dst: &Tensor,
        params: &LinearParams,
    ) -> Result<Vec<Tensor>> {
        const OP: &str = "linear_backward_weights";
        let (batch, in_features) = rank_two(src, OP)?;
        let (gy_batch, out_features) = rank_two(diff_dst, OP)?;
        if gy_batch != batch {
            return Err(Error::BinaryOperationShapeMismatch {
                lhs: src.shape().clone(),
                rhs: diff_dst.shape().clone(),
                op: OP,
            }
            .backtrace());
        }
        let gw_shape = output_shape((out_features, in_features))?;
        let x = src.data::<T>(OP)?;
        let gy = diff_dst.data::<T>(OP)?;

        let mut grads = Vec::with_capacity(2);
        let gw = cpu_backend::linear_weight_grad(x, gy, (batch, in_features), out_features);
        grads.push(output(gw, gw_shape)?);
        if params.with_bias {
            let gb = cpu_backend::linear_bias_grad(gy, batch, out_features);
            grads.push(output(gb, Shape::from(out_features))?);
        }
        Ok(grads)
    }

    fn backward_data(
        &self,
        weights: &Tensor,
        diff_dst: &Tensor,
        _params: &LinearParams,
    ) -> Result<Tensor> {
        const OP: &str = "linear_backward_data";
        let (out_features, in_features) = rank_two(weights, OP)?;
        let (batch, gy_out) = rank_two(diff_dst, OP)?;
        if gy_out != out_features {
            return Err(Error::BinaryOperationShapeMismatch {
                lhs: weights.shape().clone(),
                rhs: diff_dst.shape().clone(),
                op: OP,
            }
            .backtrace());
        }
        let gx_shape = output_shape((batch, in_features))?;
        let gx = cpu_backend::linear_data_grad(
            weights.data::<T>(OP)?,
            diff_dst.data::<T>(OP)?,
            (out_features, in_features),
            batch,
        );
        output(gx, gx_shape)
    }
}
