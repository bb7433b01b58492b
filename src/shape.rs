use crate::{Error, Result};

#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Shape(Vec<usize>);

impl From<()> for Shape {
    fn from(_: ()) -> Self {
        Self(vec![])
    }
}

impl From<usize> for Shape {
    fn from(dim_0: usize) -> Self {
        Self(vec![dim_0])
    }
}

impl From<(usize, usize)> for Shape {
    fn from((dim_0, dim_1): (usize, usize)) -> Self {
        Self(vec![dim_0, dim_1])
    }
}

impl From<(usize, usize, usize)> for Shape {
    fn from((dim_0, dim_1, dim_2): (usize, usize, usize)) -> Self {
        Self(vec![dim_0, dim_1, dim_2])
    }
}

impl<const N: usize> From<&[usize; N]> for Shape {
    fn from(dims: &[usize; N]) -> Self {
        Self(dims.to_vec())
    }
}

impl From<&[usize]> for Shape {
    fn from(dims: &[usize]) -> Self {
        Self(dims.to_vec())
    }
}

impl From<&Shape> for Shape {
    fn from(shape: &Shape) -> Self {
        Self(shape.0.to_vec())
    }
}

impl From<Vec<usize>> for Shape {
    fn from(dims: Vec<usize>) -> Self {
        Self(dims)
    }
}

macro_rules! get_rank {
    ($fn_name:ident, $cnt:tt, $dims:expr, $out_type:ty) => {
        pub fn $fn_name(&self) -> Result<$out_type> {
            if self.0.len() != $cnt {
                Err(Error::UnexpectedRank {
                    expected: $cnt,
                    actual: self.0.len(),
                    shape: self.clone(),
                    op: stringify!($fn_name),
                })
            } else {
                Ok($dims(&self.0))
            }
        }
    };
}

impl Shape {
    pub fn rank(&self) -> usize {
        self.0.len()
    }

    pub fn dims(&self) -> &[usize] {
        &self.0
    }

    /// Number of elements in a tensor of this shape.
    ///
    /// Dims are multiplied innermost first, the same order the strides are
    /// built in, so a shape with a count also has representable strides.
    pub fn elem_count(&self) -> Result<usize> {
        checked_product(self.0.iter().rev())
            .ok_or_else(|| Error::ShapeOverflow { shape: self.clone() }.backtrace())
    }

    get_rank!(rank_one, 1, |dims: &[usize]| dims[0], usize);
    get_rank!(
        rank_two,
        2,
        |dims: &[usize]| (dims[0], dims[1]),
        (usize, usize)
    );

    /// Stride over a contiguous n-dimensional array of this shape
    pub(crate) fn stride_contiguous(&self) -> Vec<usize> {
        let mut stride: Vec<_> = self
            .0
            .iter()
            .rev()
            .scan(1, |product, u| {
                let inital_product = *product;
                *product *= u;
                Some(inital_product)
            })
            .collect();

        stride.reverse();
        stride
    }

    /// Collapses every axis after the first into one, giving a `(batch, features)`
    /// matrix shape. Shapes of rank two or lower are returned unchanged.
    pub fn flatten_batch(&self) -> Result<Self> {
        match self.0.split_first() {
            Some((&batch, rest)) if rest.len() > 1 => {
                let features = checked_product(rest.iter().rev())
                    .ok_or_else(|| Error::ShapeOverflow { shape: self.clone() }.backtrace())?;
                Ok(Self(vec![batch, features]))
            }
            _ => Ok(self.clone()),
        }
    }
}

fn checked_product<'a>(mut dims: impl Iterator<Item = &'a usize>) -> Option<usize> {
    dims.try_fold(1usize, |count, &dim| count.checked_mul(dim))
}

impl std::fmt::Debug for Shape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", &self.dims())
    }
}
