//! Error types for TNSim
//!
//! Gantree: L0_Foundation → Errors
//!
//! One error enum for the whole simulator, grouped by failure class:
//! shape, connectivity, lookup, numerical, resource and noise-model input.

// Error variant fields are self-documenting via error messages
#![allow(missing_docs)]

use thiserror::Error;

/// Main error type for TNSim
/// Gantree: SimError // enum
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimError {
    // ========================================================================
    // Shape Errors
    // ========================================================================
    /// Tensor rank/shape is malformed
    /// Gantree: InvalidShape{{rank,shape}} // 형상 오류
    #[error("Invalid tensor shape {shape:?} for rank {rank}: every dimension must be > 0")]
    InvalidShape { rank: usize, shape: Vec<usize> },

    /// Tensor body could not be allocated
    #[error("Failed to allocate tensor body of {elements} elements")]
    AllocationFailure { elements: usize },

    /// Tensor body accessed before allocation
    #[error("Tensor body is not allocated")]
    BodyNotAllocated,

    /// Element index exceeds the declared leg dimension
    #[error("Index {index} out of range on leg {leg} (dimension {dim})")]
    IndexOutOfRange { leg: usize, index: usize, dim: usize },

    /// Tensor rank differs from what the operation requires
    #[error("Rank mismatch: expected {expected}, got {actual}")]
    RankMismatch { expected: usize, actual: usize },

    /// Imported data length differs from the tensor volume
    #[error("Data length {actual} does not match tensor volume {expected}")]
    DataLengthMismatch { expected: usize, actual: usize },

    // ========================================================================
    // Connectivity Errors
    // ========================================================================
    /// A leg references a tensor/leg that does not exist
    /// Gantree: DanglingLeg{{tensor,leg,peer}} // 연결 끊김
    #[error("Dangling leg {leg} of tensor {tensor}: peer tensor {peer} leg {peer_leg} does not exist")]
    DanglingLeg {
        tensor: usize,
        leg: usize,
        peer: usize,
        peer_leg: usize,
    },

    /// Connectivity is not symmetric after an append
    #[error("Asymmetric leg {leg} of tensor {tensor}: peer tensor {peer} leg {peer_leg} does not point back")]
    AsymmetricLeg {
        tensor: usize,
        leg: usize,
        peer: usize,
        peer_leg: usize,
    },

    /// Connected legs have different dimensions
    #[error("Leg {leg} of tensor {tensor} (dim {dim}) cannot connect to leg {peer_leg} of tensor {peer} (dim {peer_dim})")]
    LegDimensionMismatch {
        tensor: usize,
        leg: usize,
        dim: usize,
        peer: usize,
        peer_leg: usize,
        peer_dim: usize,
    },

    /// Leg connectivity list length differs from the tensor rank
    #[error("Tensor of rank {rank} was given {legs} leg connections")]
    LegCountMismatch { rank: usize, legs: usize },

    /// Wavefunction network built twice in one epoch
    /// Gantree: NetworkAlreadyBuilt // 중복 생성
    #[error("Tensor network is already built for this evaluation epoch")]
    NetworkAlreadyBuilt,

    /// Operation requires a non-empty network
    #[error("Tensor network is empty")]
    EmptyNetwork,

    /// No tensor with this id in the network
    #[error("Unknown tensor id {0}")]
    UnknownTensorId(usize),

    /// Gate target beyond the open output legs
    /// Gantree: QubitOutOfRange{{q,open}} // 큐비트 범위
    #[error("Qubit {qubit} out of range: network has {open_legs} open legs")]
    QubitOutOfRange { qubit: usize, open_legs: usize },

    /// Same qubit listed twice for one gate
    #[error("Qubit {0} appears more than once in a gate")]
    DuplicateQubit(usize),

    /// Evaluation strategy changed after the network was built
    #[error("Evaluation strategy can only be set while the tensor network is empty")]
    EvaluationStrategyLocked,

    // ========================================================================
    // Lookup Errors
    // ========================================================================
    /// Gate name not in the catalog
    /// Gantree: UnknownGate(String) // 게이트 없음
    #[error("Unknown gate '{0}'")]
    UnknownGate(String),

    /// Gate descriptor has wrong arity or parameters
    #[error("Invalid gate parameter: {0}")]
    InvalidGateParameter(String),

    // ========================================================================
    // Numerical / Resource Errors
    // ========================================================================
    /// Post-contraction trace or Hermiticity outside tolerance
    #[error("Numerical invariant violated: {0}")]
    NumericalInvariant(String),

    /// Intermediate tensor exceeds the configured element limit
    /// Gantree: ResourceExhausted{{req,limit}} // 자원 고갈
    #[error("Resource exhausted: contraction needs {requested} elements, limit is {limit}")]
    ResourceExhausted { requested: usize, limit: usize },

    // ========================================================================
    // Noise Model Errors
    // ========================================================================
    /// Probability value out of range [0, 1]
    #[error("Invalid probability {0}: must be in range [0, 1]")]
    InvalidProbability(f64),

    /// Unknown bit-order tag
    #[error("Invalid bit order '{0}': must be MSB or LSB")]
    InvalidBitOrder(String),

    /// Malformed noise model document
    #[error("Invalid noise model: {0}")]
    InvalidNoiseModel(String),

    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Visitor or simulator configuration out of range
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Outcome string with characters other than '0' and '1'
    #[error("Invalid bitstring '{0}': only '0' and '1' are allowed")]
    InvalidBitstring(String),

    // ========================================================================
    // I/O Errors
    // ========================================================================
    /// JSON serialization error
    #[error("JSON error: {0}")]
    JsonError(String),

    /// File I/O error
    #[error("File error: {0}")]
    FileError(String),
}

/// Result type alias for TNSim operations
/// Gantree: SimResult<T> // type alias
pub type SimResult<T> = Result<T, SimError>;

// ============================================================================
// Error Conversion Helpers
// ============================================================================

impl From<serde_json::Error> for SimError {
    fn from(err: serde_json::Error) -> Self {
        SimError::JsonError(err.to_string())
    }
}

impl From<std::io::Error> for SimError {
    fn from(err: std::io::Error) -> Self {
        SimError::FileError(err.to_string())
    }
}

// ============================================================================
// Error Helpers
// ============================================================================

impl SimError {
    /// Shape or connectivity error: aborts the current circuit
    pub fn is_structural(&self) -> bool {
        self.is_shape_error() || self.is_connectivity_error()
    }

    /// Check if error is a shape error
    pub fn is_shape_error(&self) -> bool {
        matches!(
            self,
            SimError::InvalidShape { .. }
                | SimError::AllocationFailure { .. }
                | SimError::BodyNotAllocated
                | SimError::IndexOutOfRange { .. }
                | SimError::RankMismatch { .. }
                | SimError::DataLengthMismatch { .. }
        )
    }

    /// Check if error is a connectivity error
    pub fn is_connectivity_error(&self) -> bool {
        matches!(
            self,
            SimError::DanglingLeg { .. }
                | SimError::AsymmetricLeg { .. }
                | SimError::LegDimensionMismatch { .. }
                | SimError::LegCountMismatch { .. }
                | SimError::NetworkAlreadyBuilt
                | SimError::EmptyNetwork
                | SimError::UnknownTensorId(_)
                | SimError::QubitOutOfRange { .. }
                | SimError::DuplicateQubit(_)
                | SimError::EvaluationStrategyLocked
        )
    }

    /// Check if error is a lookup error
    pub fn is_lookup(&self) -> bool {
        matches!(
            self,
            SimError::UnknownGate(_) | SimError::InvalidGateParameter(_)
        )
    }

    /// Numerical quality issues are reported, not fatal
    pub fn is_recoverable(&self) -> bool {
        matches!(self, SimError::NumericalInvariant(_))
    }
}

// ============================================================================
// Tests
// ============================================================================
