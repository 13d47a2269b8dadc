//! # TNSim Tensor
//!
//! Dense tensors, the tensor-network graph, contraction strategies, the MPS
//! ring state representation and the gate catalog.
//!
//! ## Gantree Architecture
//!
//! ```text
//! tnsim_tensor // L1: Network
//!     Tensor // 고정 형상 복소 배열
//!     TensorLeg // (peer, leg) 연결
//!     TensorNetwork // id 아레나 그래프
//!         append_tensors // 배치 추가 + 대칭 검증
//!         contract // 에폭 종료 축약
//!     ContractionStrategy // RingFirst, LowestIdFirst
//!     StateRepresentation // MpsRing
//!     GateCatalog // 이름 → 행렬
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use tnsim_tensor::prelude::*;
//!
//! // |00> ring, then X on qubit 1
//! let ring = MpsRing::new(2, 1).unwrap();
//! let mut network = TensorNetwork::new();
//! ring.build_network(&mut network).unwrap();
//!
//! let catalog = GateCatalog::new();
//! let x = catalog.tensor("X", &[]).unwrap();
//! let frontier = network.open_leg(1).unwrap();
//! network
//!     .append_tensor(x, vec![TensorLeg::output(1), frontier], NodeKind::Gate)
//!     .unwrap();
//!
//! let psi = network.contract(&RingFirst).unwrap();
//! assert!((psi.get(&[0, 1]).unwrap().re - 1.0).abs() < 1e-12);
//! assert!(network.is_empty());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

// ============================================================================
// Module Declarations
// ============================================================================

/// Dense tensors (Gantree: L1_Network → Tensor)
pub mod tensor;

/// Leg descriptors (Gantree: L1_Network → TensorLeg)
pub mod leg;

/// Tensor network graph (Gantree: L1_Network → TensorNetwork)
pub mod network;

/// Contraction strategies (Gantree: L1_Network → ContractionStrategy)
pub mod contraction;

/// MPS ring (Gantree: L1_Network → StateRepresentation)
pub mod mps;

/// Gate catalog (Gantree: L1_Network → GateCatalog)
pub mod catalog;

// ============================================================================
// Re-exports
// ============================================================================

pub use catalog::{GateCatalog, BUILTIN_GATES};
pub use contraction::{
    ContractionOrder, ContractionStrategy, ContractionView, LowestIdFirst, RingFirst,
};
pub use leg::{TensorId, TensorLeg, OUTPUT_TENSOR_ID};
pub use mps::MpsRing;
pub use network::{NetworkNode, NodeKind, PendingTensor, TensorNetwork};
pub use tensor::{BodyState, Tensor};

// ============================================================================
// Prelude
// ============================================================================

pub mod prelude {
    //! Convenient imports for common use cases
    //!
    //! ```rust
    //! use tnsim_tensor::prelude::*;
    //! ```

    pub use crate::catalog::GateCatalog;
    pub use crate::contraction::{ContractionOrder, ContractionStrategy, LowestIdFirst, RingFirst};
    pub use crate::leg::{TensorId, TensorLeg, OUTPUT_TENSOR_ID};
    pub use crate::mps::MpsRing;
    pub use crate::network::{NodeKind, PendingTensor, TensorNetwork};
    pub use crate::tensor::{BodyState, Tensor};
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
