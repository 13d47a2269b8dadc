//! Tensor leg connectivity
//!
//! Gantree: L1_Network → TensorLeg

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a tensor inside a network
pub type TensorId = usize;

/// Id of the output tensor whose legs are the open qubit legs
pub const OUTPUT_TENSOR_ID: TensorId = 0;

/// Edge descriptor: which leg of which tensor this leg connects to
/// Gantree: TensorLeg // (peer tensor, peer leg)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TensorLeg {
    /// Peer tensor id
    pub tensor: TensorId,
    /// Leg index on the peer tensor
    pub leg: usize,
}

impl TensorLeg {
    /// Create a leg descriptor
    pub const fn new(tensor: TensorId, leg: usize) -> Self {
        Self { tensor, leg }
    }

    /// Leg bound to open output leg `leg`
    pub const fn output(leg: usize) -> Self {
        Self::new(OUTPUT_TENSOR_ID, leg)
    }

    /// Check whether this leg is an open output leg
    pub fn is_output(&self) -> bool {
        self.tensor == OUTPUT_TENSOR_ID
    }
}

impl fmt::Display for TensorLeg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T{}.{}", self.tensor, self.leg)
    }
}
