use crate::backend::cpu_backend::CPUStorage;
use crate::{DType, Device};

#[derive(Debug, Clone, PartialEq)]
pub enum Storage {
    CPU(CPUStorage),
}

impl Storage {
    pub fn device(&self) -> Device {
        match self {
            Storage::CPU { .. } => Device::CPU,
        }
    }

    pub fn dtype(&self) -> DType {
        match self {
            Storage::CPU(storage) => storage.dtype(),
        }
    }

    pub(crate) fn len(&self) -> usize {
        match self {
            Storage::CPU(storage) => storage.len(),
        }
    }
}
