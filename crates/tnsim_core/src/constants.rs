//! Constants for TNSim
//!
//! Gantree: L0_Foundation → Constants
//!
//! Tensor dimensions, default limits and numerical tolerances.

// ============================================================================
// Tensor Constants
// Gantree: tensor // 텐서 상수
// ============================================================================

pub mod tensor {
    //! Tensor network sizing

    /// Dimension of a qubit's physical leg
    /// Gantree: BASE_SPACE_DIM: usize = 2
    pub const BASE_SPACE_DIM: usize = 2;

    /// Bond dimension of freshly constructed ring tensors
    pub const DEFAULT_INITIAL_VALENCE: usize = 1;

    /// Rank of a ring (MPS) tensor: left bond, right bond, physical
    pub const MPS_TENSOR_RANK: usize = 3;

    /// Leg index of the left bond of a ring tensor
    pub const LEFT_BOND_LEG: usize = 0;

    /// Leg index of the right bond of a ring tensor
    pub const RIGHT_BOND_LEG: usize = 1;

    /// Leg index of the physical leg of a ring tensor
    pub const PHYSICAL_LEG: usize = 2;

    /// Largest intermediate tensor a contraction may materialize (elements)
    /// Gantree: DEFAULT_MAX_TENSOR_ELEMENTS: usize = 2^26
    pub const DEFAULT_MAX_TENSOR_ELEMENTS: usize = 1 << 26;
}

// ============================================================================
// Numerical Tolerances
// Gantree: tolerance // 허용 오차
// ============================================================================

pub mod tolerance {
    //! Floating-point tolerances

    /// Trace and Hermiticity tolerance checked after each contraction epoch
    pub const INVARIANT: f64 = 1e-6;

    /// Kraus completeness tolerance (sum K^dagger K = I)
    pub const KRAUS_COMPLETENESS: f64 = 1e-6;

    /// Relative threshold below which a column counts as linearly dependent
    /// when a contracted state is factorized back into a ring
    pub const RANK: f64 = 1e-12;
}
