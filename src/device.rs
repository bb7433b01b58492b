use crate::backend::cpu_backend::CPUStorage;
use crate::{storage::Storage, DType, Result, Shape, WithDType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Device {
    CPU,
}

impl Device {
    pub fn zeros(&self, shape: &Shape, dtype: DType) -> Result<Storage> {
        let elem_count = shape.elem_count()?;
        match self {
            Device::CPU => Ok(Storage::CPU(CPUStorage::zeros(dtype, elem_count))),
        }
    }

    pub fn storage<A: NDArray>(&self, array: A) -> Storage {
        match self {
            Device::CPU => Storage::CPU(array.to_cpu()),
        }
    }

    pub fn storage_owned<S: WithDType>(&self, data: Vec<S>) -> Storage {
        match self {
            Device::CPU => Storage::CPU(S::to_cpu_owned(data)),
        }
    }
}

/// Host data that can be copied into a tensor.
pub trait NDArray {
    fn shape(&self) -> Result<Shape>;
    fn to_cpu(&self) -> CPUStorage;
}

impl<S: WithDType> NDArray for S {
    fn shape(&self) -> Result<Shape> {
        Ok(Shape::from(()))
    }

    fn to_cpu(&self) -> CPUStorage {
        S::to_cpu(&[*self])
    }
}

impl<S: WithDType> NDArray for &[S] {
    fn shape(&self) -> Result<Shape> {
        Ok(Shape::from(self.len()))
    }

    fn to_cpu(&self) -> CPUStorage {
        S::to_cpu(self)
    }
}

impl<S: WithDType, const N: usize> NDArray for &[S; N] {
    fn shape(&self) -> Result<Shape> {
        Ok(Shape::from(self.len()))
    }

    fn to_cpu(&self) -> CPUStorage {
        S::to_cpu(self.as_slice())
    }
}

impl<S: WithDType, const N: usize, const M: usize> NDArray for &[[S; N]; M] {
    fn shape(&self) -> Result<Shape> {
        Ok(Shape::from((M, N)))
    }

    fn to_cpu(&self) -> CPUStorage {
        S::to_cpu_owned(self.concat())
    }
}

impl<S: WithDType, const N: usize, const M: usize, const K: usize> NDArray
    for &[[[S; N]; M]; K]
{
    fn shape(&self) -> Result<Shape> {
        Ok(Shape::from((K, M, N)))
    }

    fn to_cpu(&self) -> CPUStorage {
        S::to_cpu_owned(self.iter().flat_map(|matrix| matrix.concat()).collect())
    }
}
