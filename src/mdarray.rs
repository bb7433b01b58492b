use std::sync::Arc;

use crate::device::{Device, NDArray};
use crate::{DType, Result, Shape, Tensor, WithDType};

/// Access to the native representation behind a caller-facing handle, without
/// taking ownership of it.
pub trait NativeHandle<N> {
    fn native(&self) -> &N;
}

/// Managed array value handed to and returned from the binding.
///
/// An `MdArray` adopts a native value and is its only owner; clones share it
/// through a reference count, so the native value is dropped exactly once,
/// when the last clone goes away.
pub struct MdArray<N = Tensor>(Arc<N>);

impl<N> Clone for MdArray<N> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<N> MdArray<N> {
    /// Takes ownership of a freshly produced native value.
    pub fn from_native(native: N) -> Self {
        Self(Arc::new(native))
    }

    /// Returns the internal representation. Ownership stays with the array.
    pub fn get(&self) -> &N {
        self.0.as_ref()
    }

    /// True when both arrays wrap the very same native value.
    pub fn same_native(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Unwraps the native value if this is the last handle to it.
    pub fn try_into_native(self) -> std::result::Result<N, Self> {
        Arc::try_unwrap(self.0).map_err(Self)
    }
}

impl<N> NativeHandle<N> for MdArray<N> {
    fn native(&self) -> &N {
        self.get()
    }
}

impl<N> std::ops::Deref for MdArray<N> {
    type Target = N;

    fn deref(&self) -> &Self::Target {
        self.get()
    }
}

impl<N: std::fmt::Debug> std::fmt::Debug for MdArray<N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "MdArray({:?})", self.get())
    }
}

impl From<Tensor> for MdArray {
    fn from(tensor: Tensor) -> Self {
        Self::from_native(tensor)
    }
}

impl MdArray {
    /// Builds a managed array from host data.
    /// ```rust
    /// use phantom_linear::{MdArray, Device};
    /// let array = MdArray::new(&[[1f32, 2.], [3., 4.]], &Device::CPU)?;
    /// assert_eq!(array.dims(), &[2, 2]);
    /// # Ok::<(), phantom_linear::Error>(())
    /// ```
    pub fn new<A: NDArray>(array: A, device: &Device) -> Result<Self> {
        Ok(Self::from_native(Tensor::new(array, device)?))
    }

    pub fn from_vec<D: WithDType, S: Into<Shape>>(
        data: Vec<D>,
        shape: S,
        device: &Device,
    ) -> Result<Self> {
        Ok(Self::from_native(Tensor::from_vec(data, shape, device)?))
    }

    pub fn zeros<S: Into<Shape>>(shape: S, dtype: DType, device: &Device) -> Result<Self> {
        Ok(Self::from_native(Tensor::zeros(shape, dtype, device)?))
    }
}
