use std::fmt::Debug;

use crate::backend::cpu_backend::CPUStorage;
use crate::{Error, Result};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum DType {
    F32,
    F64,
}

/// Element types the linear kernels are instantiated for.
pub trait WithDType:
    Sized
    + Copy
    + Debug
    + PartialEq
    + Send
    + Sync
    + 'static
    + num_traits::NumAssign
{
    const DTYPE: DType;

    fn to_cpu_owned(data: Vec<Self>) -> CPUStorage;
    fn to_cpu(data: &[Self]) -> CPUStorage {
        Self::to_cpu_owned(data.to_vec())
    }
    fn cpu_storage_slice(storage: &CPUStorage) -> Result<&[Self]>;
}

macro_rules! with_dtype {
    ($type: ty, $dtype:ident) => {
        impl WithDType for $type {
            const DTYPE: DType = DType::$dtype;

            fn to_cpu_owned(data: Vec<Self>) -> CPUStorage {
                CPUStorage::$dtype(data)
            }

            fn cpu_storage_slice(storage: &CPUStorage) -> Result<&[Self]> {
                match storage {
                    CPUStorage::$dtype(data) => Ok(data),
                    _ => Err(Error::UnexpectedDType {
                        expected: DType::$dtype,
                        actual: storage.dtype(),
                        op: "storage_slice",
                    }),
                }
            }
        }
    };
}

with_dtype!(f32, F32);
with_dtype!(f64, F64);

#[cfg(test)]
mod tests {
    use super::*;

    fn weighted_sum<T: WithDType>(values: &[T], weights: &[T]) -> T {
        let mut sum = T::zero();
        for (&value, &weight) in values.iter().zip(weights) {
            sum += value * weight;
        }
        sum
    }

    #[test]
    fn numeric_bounds() {
        assert_eq!(weighted_sum::<f32>(&[], &[]), 0.);
        assert_eq!(weighted_sum(&[1f32, 2., 3.], &[0.5, 0.25, 2.]), 7.);
        assert_eq!(weighted_sum(&[1f64, -1.], &[3., 1.]), 2.);
    }

    #[test]
    fn storage_slice_checks_dtype() -> Result<()> {
        let storage = f64::to_cpu(&[1., 2.]);
        assert_eq!(f64::cpu_storage_slice(&storage)?, &[1., 2.]);
        let err = f32::cpu_storage_slice(&storage).unwrap_err();
        assert!(matches!(
            err,
            Error::UnexpectedDType {
                expected: DType::F32,
                actual: DType::F64,
                ..
            }
        ));
        Ok(())
    }
}
