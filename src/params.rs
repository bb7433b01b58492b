use serde::{Deserialize, Serialize};

/// Parameter block for one linear invocation.
///
/// Deserializing an empty object yields a layer with bias, matching
/// [`LinearParams::default`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct LinearParams {
    pub with_bias: bool,
}

impl Default for LinearParams {
    fn default() -> Self {
        Self { with_bias: true }
    }
}

impl LinearParams {
    pub fn new(with_bias: bool) -> Self {
        Self { with_bias }
    }

    pub fn with_bias() -> Self {
        Self::new(true)
    }

    pub fn without_bias() -> Self {
        Self::new(false)
    }

    /// Derives the flag from whether a bias is present, so the two can not disagree.
    pub fn for_bias<B>(bias: Option<B>) -> Self {
        Self::new(bias.is_some())
    }
}
