//! Fully-connected layer binding between managed arrays and a native tensor
//! compute primitive.
//!
//! [`LinearBinding`] adapts calls made with [`MdArray`] values into calls on a
//! [`LinearPrimitive`], and wraps the native results back into managed arrays.
//! [`Linear`] is the CPU primitive shipped with the crate.
//!
//! ```rust
//! use phantom_linear::{Device, LinearF32, LinearParams, MdArray};
//!
//! let binding = LinearF32::default();
//! let x = MdArray::new(&[[1f32, 2.]], &Device::CPU)?;
//! let w = MdArray::new(&[[3f32, 4.], [5., 6.]], &Device::CPU)?;
//! let y = binding.forward(&x, &w, None, &LinearParams::without_bias())?;
//! assert_eq!(y.to_vector_rank_two::<f32>()?, [[11., 17.]]);
//!
//! let grads = binding.backward_weights(&x, &y, &LinearParams::without_bias())?;
//! assert_eq!(grads.len(), 1);
//! # Ok::<(), phantom_linear::Error>(())
//! ```

mod backend;
pub mod binding;
mod device;
mod dtype;
mod error;
pub mod layer;
mod mdarray;
mod params;
pub mod primitive;
mod shape;
mod storage;
mod tensor;

pub use backend::cpu_backend::CPUStorage;
pub use binding::{LinearBinding, LinearF32, LinearF64, WeightGradients};
pub use device::{Device, NDArray};
pub use dtype::{DType, WithDType};
pub use error::{Error, Result};
pub use layer::{linear, linear_grad_data, linear_grad_weight, LayerGradients, LinearLayer};
pub use mdarray::{MdArray, NativeHandle};
pub use params::LinearParams;
pub use primitive::{Linear, LinearPrimitive};
pub use shape::Shape;
pub use storage::Storage;
pub use tensor::{Tensor, TensorID};
