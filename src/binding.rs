//! Binding between managed arrays and a native linear compute primitive.
//!
//! The adapter holds no numeric logic. Each operation unwraps the managed
//! arrays, hands the native tensors and the parameter block to the primitive,
//! and adopts whatever the primitive returns into fresh managed arrays.
//! Primitive errors are returned unchanged.

use std::fmt::Debug;

use crate::mdarray::{MdArray, NativeHandle};
use crate::primitive::{Linear, LinearPrimitive};
use crate::{Error, LinearParams, Result};

/// Gradients produced by [`LinearBinding::backward_weights`].
#[derive(Debug)]
pub struct WeightGradients<N> {
    pub weight: MdArray<N>,
    pub bias: Option<MdArray<N>>,
}

impl<N> Clone for WeightGradients<N> {
    fn clone(&self) -> Self {
        Self {
            weight: self.weight.clone(),
            bias: self.bias.clone(),
        }
    }
}

impl<N> WeightGradients<N> {
    /// Number of gradients, one per learnable parameter.
    pub fn len(&self) -> usize {
        1 + usize::from(self.bias.is_some())
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    /// Positional form `[weight, bias?]`, the order optimizers index parameters in.
    pub fn into_vec(self) -> Vec<MdArray<N>> {
        std::iter::once(self.weight).chain(self.bias).collect()
    }

    fn from_ordered(grads: Vec<MdArray<N>>) -> Result<Self> {
        let count = grads.len();
        let mut grads = grads.into_iter();
        match (grads.next(), grads.next(), grads.next()) {
            (Some(weight), bias, None) => Ok(Self { weight, bias }),
            _ => Err(Error::UnexpectedGradientCount {
                count,
                op: "linear_backward_weights",
            }
            .backtrace()),
        }
    }
}

/// Linear layer binding over a compute primitive `P`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinearBinding<P> {
    primitive: P,
}

pub type LinearF32 = LinearBinding<Linear<f32>>;
pub type LinearF64 = LinearBinding<Linear<f64>>;

impl<P> LinearBinding<P>
where
    P: LinearPrimitive,
    P::Tensor: Debug,
{
    pub fn new(primitive: P) -> Self {
        Self { primitive }
    }

    pub fn primitive(&self) -> &P {
        &self.primitive
    }

    /// Forward pass `Y = X·Wᵀ + b`.
    ///
    /// The bias is only read when `params.with_bias` is set. A bias passed
    /// alongside `with_bias = false` is ignored.
    pub fn forward(
        &self,
        src: &MdArray<P::Tensor>,
        weights: &MdArray<P::Tensor>,
        bias: Option<&MdArray<P::Tensor>>,
        params: &LinearParams,
    ) -> Result<MdArray<P::Tensor>> {
        self.forward_handles(
            src,
            weights,
            bias.map(|bias| bias as &dyn NativeHandle<P::Tensor>),
            params,
        )
    }

    /// [`forward`](Self::forward) over arbitrary native handles.
    pub fn forward_handles(
        &self,
        src: &dyn NativeHandle<P::Tensor>,
        weights: &dyn NativeHandle<P::Tensor>,
        bias: Option<&dyn NativeHandle<P::Tensor>>,
        params: &LinearParams,
    ) -> Result<MdArray<P::Tensor>> {
        let src = src.native();
        let weights = weights.native();
        let bias = if params.with_bias {
            match bias {
                Some(bias) => Some(bias.native()),
                None => return Err(Error::MissingBias { op: "linear_forward" }.backtrace()),
            }
        } else {
            if bias.is_some() {
                log::debug!("linear_forward: bias supplied without with_bias, ignoring it");
            }
            None
        };
        log::debug!(
            "linear_forward src={src:?} weights={weights:?} bias={bias:?} with_bias={}",
            params.with_bias
        );

        let dst = self.primitive.forward(src, weights, bias, params)?;
        Ok(MdArray::from_native(dst))
    }

    /// Weight gradients `gW = gYᵀ·X` and, with bias, `gb = Σₙ gY`.
    ///
    /// The gradients are adopted in the order the primitive returns them.
    pub fn backward_weights(
        &self,
        src: &MdArray<P::Tensor>,
        diff_dst: &MdArray<P::Tensor>,
        params: &LinearParams,
    ) -> Result<WeightGradients<P::Tensor>> {
        log::debug!(
            "linear_backward_weights src={:?} diff_dst={:?} with_bias={}",
            src.get(),
            diff_dst.get(),
            params.with_bias
        );
        let grads = self
            .primitive
            .backward_weights(src.get(), diff_dst.get(), params)?;
        let grads = grads.into_iter().map(MdArray::from_native).collect();
        WeightGradients::from_ordered(grads)
    }

    /// Input gradient `gX = gY·W`.
    pub fn backward_data(
        &self,
        weights: &MdArray<P::Tensor>,
        diff_dst: &MdArray<P::Tensor>,
        params: &LinearParams,
    ) -> Result<MdArray<P::Tensor>> {
        log::debug!(
            "linear_backward_data weights={:?} diff_dst={:?}",
            weights.get(),
            diff_dst.get()
        );
        let diff_src = self
            .primitive
            .backward_data(weights.get(), diff_dst.get(), params)?;
        Ok(MdArray::from_native(diff_src))
    }
}
