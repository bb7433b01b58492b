use crate::binding::{LinearF32, LinearF64, WeightGradients};
use crate::{DType, Error, LinearParams, MdArray, Result};

// Picks the CPU binding matching the element type of the operands.
macro_rules! dispatch {
    ($dtype:expr, $binding:ident => $body:expr) => {
        match $dtype {
            DType::F32 => {
                let $binding = LinearF32::default();
                $body
            }
            DType::F64 => {
                let $binding = LinearF64::default();
                $body
            }
        }
    };
}

/// Views an input of rank greater than two as `(batch, features)`.
fn flatten_batch(x: &MdArray) -> Result<MdArray> {
    if x.rank() > 2 {
        let tensor = x.reshape(x.shape().flatten_batch()?)?;
        Ok(MdArray::from_native(tensor))
    } else {
        Ok(x.clone())
    }
}

/// Affine transformation `y = x·Wᵀ + b`.
///
/// `x` is `(batch, s_1, ..., s_n)`; every axis after the first is folded into
/// one of size `s_1 * ... * s_n`, which must match the second axis of `W`.
/// The parameter block is derived from whether `b` is given.
/// ```rust
/// use phantom_linear::{linear, Device, MdArray};
/// let x = MdArray::new(&[[1f32, 2., 3.], [4., 5., 6.]], &Device::CPU)?;
/// let w = MdArray::new(&[[1f32, 0., 0.], [0., 1., 0.]], &Device::CPU)?;
/// let b = MdArray::new(&[10f32, 20.], &Device::CPU)?;
/// let y = linear(&x, &w, Some(&b))?;
/// assert_eq!(y.to_vector_rank_two::<f32>()?, [[11., 22.], [14., 25.]]);
/// # Ok::<(), phantom_linear::Error>(())
/// ```
pub fn linear(x: &MdArray, weight: &MdArray, bias: Option<&MdArray>) -> Result<MdArray> {
    let params = LinearParams::for_bias(bias);
    let x = flatten_batch(x)?;
    dispatch!(x.dtype(), binding => binding.forward(&x, weight, bias, &params))
}

/// Input gradient `gx = gy·W` of [`linear`].
pub fn linear_grad_data(diff_dst: &MdArray, weight: &MdArray) -> Result<MdArray> {
    let params = LinearParams::without_bias();
    dispatch!(weight.dtype(), binding => binding.backward_data(weight, diff_dst, &params))
}

/// Weight gradient `gW = gyᵀ·x` of [`linear`], without a bias gradient.
pub fn linear_grad_weight(x: &MdArray, diff_dst: &MdArray) -> Result<MdArray> {
    let params = LinearParams::without_bias();
    let x = flatten_batch(x)?;
    let grads = dispatch!(x.dtype(), binding => binding.backward_weights(&x, diff_dst, &params))?;
    Ok(grads.weight)
}

/// Gradients of a [`LinearLayer`] with respect to its input and parameters.
#[derive(Debug, Clone)]
pub struct LayerGradients {
    pub input: MdArray,
    pub weight: MdArray,
    pub bias: Option<MdArray>,
}

/// Fully connected layer holding a `(out_features, in_features)` weight and an
/// optional `(out_features,)` bias.
///
/// The parameters are only set through [`LinearLayer::new`], which checks
/// their shapes and element types.
#[derive(Debug, Clone)]
pub struct LinearLayer {
    weight: MdArray,
    bias: Option<MdArray>,
    in_features: usize,
    out_features: usize,
}

impl LinearLayer {
    pub fn new(weight: MdArray, bias: Option<MdArray>) -> Result<Self> {
        const OP: &str = "linear_layer";
        let (out_features, in_features) = weight.shape().rank_two()?;
        if let Some(bias) = &bias {
            if bias.dims() != [out_features] {
                return Err(Error::BinaryOperationShapeMismatch {
                    lhs: weight.shape().clone(),
                    rhs: bias.shape().clone(),
                    op: OP,
                }
                .backtrace());
            }
            if bias.dtype() != weight.dtype() {
                return Err(Error::UnexpectedDType {
                    expected: weight.dtype(),
                    actual: bias.dtype(),
                    op: OP,
                }
                .backtrace());
            }
        }
        Ok(Self {
            weight,
            bias,
            in_features,
            out_features,
        })
    }

    pub fn weight(&self) -> &MdArray {
        &self.weight
    }

    pub fn bias(&self) -> Option<&MdArray> {
        self.bias.as_ref()
    }

    pub fn in_features(&self) -> usize {
        self.in_features
    }

    pub fn out_features(&self) -> usize {
        self.out_features
    }

    pub fn params(&self) -> LinearParams {
        LinearParams::for_bias(self.bias.as_ref())
    }

    /// Learnable parameters as `[weight, bias?]`.
    pub fn parameters(&self) -> Vec<MdArray> {
        std::iter::once(self.weight.clone())
            .chain(self.bias.clone())
            .collect()
    }

    pub fn forward(&self, x: &MdArray) -> Result<MdArray> {
        linear(x, &self.weight, self.bias.as_ref())
    }

    /// Back-propagates `diff_dst` through the layer for the input `x` seen in
    /// the forward pass. The input gradient has the shape of `x`.
    pub fn backward(&self, x: &MdArray, diff_dst: &MdArray) -> Result<LayerGradients> {
        let params = self.params();
        let flat = flatten_batch(x)?;
        let (diff_src, grads): (MdArray, WeightGradients<_>) = dispatch!(self.weight.dtype(), binding => {
            let diff_src = binding.backward_data(&self.weight, diff_dst, &params)?;
            let grads = binding.backward_weights(&flat, diff_dst, &params)?;
            (diff_src, grads)
        });
        let input = if diff_src.shape() == x.shape() {
            diff_src
        } else {
            MdArray::from_native(diff_src.reshape(x.shape())?)
        };
        Ok(LayerGradients {
            input,
            weight: grads.weight,
            bias: grads.bias,
        })
    }
}
