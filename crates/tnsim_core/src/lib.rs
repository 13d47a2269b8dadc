//! # TNSim Core
//!
//! Foundation types, errors and gate descriptors for the tensor-network
//! quantum circuit simulator.
//!
//! ## Gantree Architecture
//!
//! ```text
//! tnsim_core // L0+L1: Foundation + Instruction
//!     L0_Foundation // 기반 타입/상수/에러
//!         CoreTypes // QubitId, Probability, Bitstring
//!         Constants // 텐서 차원, 허용 오차
//!         Errors // SimError
//!     L1_Instruction // 명령 스트림
//!         Gate // 태그된 게이트 enum
//!         GateDescriptor // 이름+큐비트+파라미터
//!         Instruction // enabled 플래그
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use tnsim_core::prelude::*;
//!
//! let desc = GateDescriptor::new("cx", vec![0, 1], vec![]);
//! let inst = Instruction::from_descriptor(&desc, true).unwrap();
//! assert_eq!(inst.gate, Gate::Cnot(0, 1));
//! assert_eq!(inst.gate.canonical_name(), "CNOT");
//! ```
//!
//! ## Basis Convention
//!
//! ```rust
//! use tnsim_core::prelude::*;
//!
//! // Qubit 0 is the most significant bit of a basis index
//! let bits = Bitstring::from_index(0b10, 2);
//! assert_eq!(bits.to_string(), "10");
//! assert_eq!(bits.get(0), Some(true));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

// ============================================================================
// Module Declarations
// ============================================================================

/// Core types (Gantree: L0_Foundation → CoreTypes)
pub mod types;

/// Constants (Gantree: L0_Foundation → Constants)
pub mod constants;

/// Error types (Gantree: L0_Foundation → Errors)
pub mod error;

/// Gates and instructions (Gantree: L1_Instruction → Gate)
pub mod gate;

// ============================================================================
// Re-exports
// ============================================================================

pub use constants::{tensor, tolerance};
pub use error::{SimError, SimResult};
pub use gate::{canonical_gate_name, Gate, GateDescriptor, Instruction};
pub use types::{Angle, Bitstring, Counts, Probability, QubitId};

// ============================================================================
// Prelude
// ============================================================================

pub mod prelude {
    //! Convenient imports for common use cases
    //!
    //! ```rust
    //! use tnsim_core::prelude::*;
    //! ```

    pub use crate::constants::{tensor, tolerance};
    pub use crate::error::{SimError, SimResult};
    pub use crate::gate::{canonical_gate_name, Gate, GateDescriptor, Instruction};
    pub use crate::types::{Angle, Bitstring, Counts, Probability, QubitId};
}

// ============================================================================
// Version Information
// ============================================================================

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");

// ============================================================================
// Integration Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::prelude::*;

    #[test]
    fn test_instruction_stream_from_json() {
        let json = r#"[
            {"name": "H", "qubits": [0]},
            {"name": "CX", "qubits": [0, 1]},
            {"name": "Rz", "qubits": [1], "params": [0.25]},
            {"name": "Measure", "qubits": [1]}
        ]"#;
        let descs: Vec<GateDescriptor> = serde_json::from_str(json).unwrap();
        let insts: Vec<Instruction> = descs
            .iter()
            .map(|d| Instruction::from_descriptor(d, true))
            .collect::<SimResult<_>>()
            .unwrap();

        assert_eq!(insts.len(), 4);
        assert_eq!(insts[1].gate, Gate::Cnot(0, 1));
        assert_eq!(insts[2].gate.params(), vec![0.25]);
        assert!(insts[3].gate.is_measurement());
    }

    #[test]
    fn test_inverse_pairs_cancel_names() {
        let gates = [
            Gate::H(0),
            Gate::Rx(0, 0.7),
            Gate::CPhase(0, 1, 1.1),
            Gate::Swap(0, 1),
        ];
        for g in &gates {
            let inv = g.inverse().unwrap();
            assert_eq!(inv.qubits(), g.qubits());
            assert_eq!(inv.canonical_name(), g.canonical_name());
        }
    }

    #[test]
    fn test_bitstring_roundtrip_width() {
        for index in 0..8 {
            let bits = Bitstring::from_index(index, 3);
            assert_eq!(bits.len(), 3);
            assert_eq!(bits.to_index(), index);
        }
    }

    #[test]
    fn test_tensor_constants() {
        assert_eq!(tensor::BASE_SPACE_DIM, 2);
        assert!(tolerance::INVARIANT > 0.0);
    }

    #[test]
    fn test_error_classification() {
        let err = SimError::QubitOutOfRange {
            qubit: 5,
            open_legs: 3,
        };
        assert!(err.is_structural());
        assert!(!err.is_recoverable());
    }
}
