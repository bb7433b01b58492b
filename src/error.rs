use crate::{DType, Shape};

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("unexpected rank in {op}, expected: {expected}, actual: {actual}")]
    UnexpectedRank {
        expected: usize,
        actual: usize,
        shape: Shape,
        op: &'static str,
    },

    #[error("unexpected dtype in {op}, expected: {expected:?}, actual: {actual:?}")]
    UnexpectedDType {
        expected: DType,
        actual: DType,
        op: &'static str,
    },

    #[error("unexpected shape in {op}, lhs: {lhs:?}, rhs: {rhs:?}")]
    BinaryOperationShapeMismatch {
        lhs: Shape,
        rhs: Shape,
        op: &'static str,
    },

    #[error("Shape mismatch, got a buffer of size {buffer_size} which is incompatible with the shape {shape:?}")]
    ShapeMismatch { buffer_size: usize, shape: Shape },

    #[error("the element count of shape {shape:?} overflows usize")]
    ShapeOverflow { shape: Shape },

    /// The parameter block asks for a bias but the caller did not supply one.
    #[error("{op}: parameters request a bias but no bias was supplied")]
    MissingBias { op: &'static str },

    #[error("{op}: expected one or two gradients, the primitive returned {count}")]
    UnexpectedGradientCount { count: usize, op: &'static str },

    #[error("{inner}\n{backtrace}")]
    WithBacktrace {
        inner: Box<Self>,
        backtrace: Box<std::backtrace::Backtrace>,
    },

    /// User generated error message.
    #[error("{0}")]
    Message(String),
}

impl Error {
    pub fn backtrace(self) -> Self {
        let backtrace = std::backtrace::Backtrace::capture();
        match backtrace.status() {
            std::backtrace::BacktraceStatus::Disabled
            | std::backtrace::BacktraceStatus::Unsupported => self,
            _ => Self::WithBacktrace {
                inner: Box::new(self),
                backtrace: Box::new(backtrace),
            },
        }
    }

    /// Strips a captured backtrace, yielding the error that was raised.
    pub fn inner(&self) -> &Self {
        match self {
            Self::WithBacktrace { inner, .. } => inner.inner(),
            _ => self,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
