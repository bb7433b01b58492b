use std::sync::atomic::{AtomicUsize, Ordering};

use crate::device::{Device, NDArray};
use crate::storage::Storage;
use crate::WithDType;
use crate::{DType, Error, Result, Shape};

/// Allow each tensor to be uniquely idenified. This makes it cheap to check whether
/// two handles refer to the same native tensor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TensorID(usize);

impl TensorID {
    fn new() -> Self {
        static COUNTER: AtomicUsize = AtomicUsize::new(1);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

/// Native tensor consumed and produced by the compute primitive. It owns its
/// buffer; sharing is done by the managed array that wraps it.
pub struct Tensor {
    id: TensorID,
    storage: Storage,
    shape: Shape,
    /// Element-wise stride rather than byte-wise stride
    stride: Vec<usize>,
}

impl std::fmt::Debug for Tensor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{:?}, {:?}, {:?}]",
            &self.shape().dims(),
            self.dtype(),
            self.device()
        )
    }
}

impl Tensor {
    pub(crate) fn from_storage(storage: Storage, shape: Shape) -> Result<Self> {
        if storage.len() != shape.elem_count()? {
            return Err(Error::ShapeMismatch {
                buffer_size: storage.len(),
                shape,
            }
            .backtrace());
        }
        let stride = shape.stride_contiguous();
        Ok(Self {
            id: TensorID::new(),
            storage,
            shape,
            stride,
        })
    }

    /// Creates a new tensor from host data.
    /// ```rust
    /// use phantom_linear::{Tensor, Device, Shape};
    /// let tensor = Tensor::new(&[[0f32, 1.], [2., 3.]], &Device::CPU)?;
    /// assert_eq!(tensor.shape(), &Shape::from((2, 2)));
    /// # Ok::<(), phantom_linear::Error>(())
    /// ```
    pub fn new<A: NDArray>(array: A, device: &Device) -> Result<Self> {
        let shape = array.shape()?;
        Self::from_storage(device.storage(array), shape)
    }

    /// Creates a tensor of the given shape from a flat row-major buffer.
    /// ```rust
    /// use phantom_linear::{Tensor, Device};
    /// let tensor = Tensor::from_vec(vec![1f64, 2., 3., 4., 5., 6.], (2, 3), &Device::CPU)?;
    /// assert_eq!(tensor.to_vector_rank_two::<f64>()?, [[1., 2., 3.], [4., 5., 6.]]);
    /// assert!(Tensor::from_vec(vec![1f64, 2.], (2, 3), &Device::CPU).is_err());
    /// # Ok::<(), phantom_linear::Error>(())
    /// ```
    pub fn from_vec<D: WithDType, S: Into<Shape>>(
        data: Vec<D>,
        shape: S,
        device: &Device,
    ) -> Result<Self> {
        Self::from_storage(device.storage_owned(data), shape.into())
    }

    pub fn zeros<S: Into<Shape>>(shape: S, dtype: DType, device: &Device) -> Result<Self> {
        let shape = shape.into();
        let storage = device.zeros(&shape, dtype)?;
        Self::from_storage(storage, shape)
    }

    pub fn id(&self) -> TensorID {
        self.id
    }

    pub fn dtype(&self) -> DType {
        self.storage.dtype()
    }

    pub fn device(&self) -> Device {
        self.storage.device()
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn rank(&self) -> usize {
        self.shape.rank()
    }

    pub fn dims(&self) -> &[usize] {
        self.shape.dims()
    }

    /// Returns the element-wise stride of the tensor.
    /// ```rust
    /// use phantom_linear::{Tensor, Device};
    /// let tensor = Tensor::new(&[[0f32, 1.], [2., 3.]], &Device::CPU)?;
    /// assert_eq!(tensor.stride(), &[2, 1]);
    /// # Ok::<(), phantom_linear::Error>(())
    /// ```
    pub fn stride(&self) -> &[usize] {
        &self.stride
    }

    /// Borrows the row-major buffer, checking that the tensor holds `S` elements.
    pub(crate) fn data<S: WithDType>(&self, op: &'static str) -> Result<&[S]> {
        if self.dtype() != S::DTYPE {
            return Err(Error::UnexpectedDType {
                expected: S::DTYPE,
                actual: self.dtype(),
                op,
            }
            .backtrace());
        }
        match &self.storage {
            Storage::CPU(storage) => S::cpu_storage_slice(storage),
        }
    }

    /// Returns a copy of the tensor with a new shape holding the same number of
    /// elements. The copy is a distinct native tensor with its own id.
    /// ```rust
    /// use phantom_linear::{Tensor, Device};
    /// let tensor = Tensor::new(&[[[0f32, 1.], [2., 3.]]], &Device::CPU)?;
    /// let flat = tensor.reshape((1, 4))?;
    /// assert_eq!(flat.dims(), &[1, 4]);
    /// assert_ne!(flat.id(), tensor.id());
    /// # Ok::<(), phantom_linear::Error>(())
    /// ```
    pub fn reshape<S: Into<Shape>>(&self, shape: S) -> Result<Self> {
        Self::from_storage(self.storage.clone(), shape.into())
    }

    pub fn to_vector_rank_one<S: WithDType>(&self) -> Result<Vec<S>> {
        self.shape().rank_one()?;
        Ok(self.data::<S>("to_vector_rank_one")?.to_vec())
    }

    /// Returns the contents of the rank 2 tensor as a vector of vectors in row-major order.
    /// ```rust
    /// use phantom_linear::{Tensor, Device};
    /// let a = Tensor::new(&[[0f32, 1.], [2., 3.], [4., 5.]], &Device::CPU)?;
    /// assert_eq!(a.to_vector_rank_two::<f32>()?, &[[0., 1.], [2., 3.], [4., 5.]]);
    /// # Ok::<(), phantom_linear::Error>(())
    /// ```
    pub fn to_vector_rank_two<S: WithDType>(&self) -> Result<Vec<Vec<S>>> {
        let (_, dim_two) = self.shape().rank_two()?;
        let data = self.data::<S>("to_vector_rank_two")?;
        if dim_two == 0 {
            return Ok(vec![vec![]; self.dims()[0]]);
        }
        Ok(data.chunks_exact(dim_two).map(<[S]>::to_vec).collect())
    }

    /// Returns the flattened contents in row-major order.
    pub fn to_vec<S: WithDType>(&self) -> Result<Vec<S>> {
        Ok(self.data::<S>("to_vec")?.to_vec())
    }
}
