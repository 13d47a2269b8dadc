//! # TNSim Backend
//!
//! Circuit visitor, density matrices, results and the simulator facade.
//!
//! ## Gantree Architecture
//!
//! ```text
//! tnsim_backend // L3: Backend
//!     VisitorConfig // 모드, 평가 전략, 축약 순서
//!     CircuitVisitor // 명령 → 텐서 네트워크
//!         apply_1body_gate, apply_2body_gate, apply_nbody_gate
//!         visit // 게이트 + 노이즈
//!         evaluate // 에폭 종료 → 링 재분해
//!         finalize // SimulationResult
//!     DensityMatrix // (행, 열) → 복소수
//!     SimulationResult // 확률, 측정 오류, 샘플링
//!     BackendTrait // execute(n, instructions, shots)
//!     TensorNetworkSimulator // 시뮬레이터 구현
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use tnsim_backend::prelude::*;
//!
//! let circuit: Vec<Instruction> = vec![Gate::H(0).into(), Gate::Cnot(0, 1).into()];
//! let result = TensorNetworkSimulator::ideal().run(2, &circuit).unwrap();
//!
//! let probs = result.probabilities();
//! assert!((probs[0b00] - 0.5).abs() < 1e-12);
//! assert!((probs[0b11] - 0.5).abs() < 1e-12);
//! ```
//!
//! ## Noisy Simulation
//!
//! ```rust
//! use tnsim_backend::prelude::*;
//!
//! let model = NoiseChannelModel::ideal()
//!     .with_channel(NoiseChannel::amplitude_damping("X", 0, 0.25).unwrap());
//! let sim = TensorNetworkSimulator::ideal().with_noise_model(model);
//!
//! let result = sim.run(1, &[Gate::X(0).into()]).unwrap();
//! let rho = result.density_matrix().unwrap();
//! assert!((rho.diagonal()[0] - 0.25).abs() < 1e-10);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

// ============================================================================
// Module Declarations
// ============================================================================

/// Visitor configuration (Gantree: L3_Backend → VisitorConfig)
pub mod config;

/// Density matrices (Gantree: L3_Backend → DensityMatrix)
pub mod density;

/// Simulation results (Gantree: L3_Backend → SimulationResult)
pub mod result;

/// Execution types and traits (Gantree: L3_Backend → BackendTrait)
pub mod execution;

/// Circuit visitor (Gantree: L3_Backend → CircuitVisitor)
pub mod visitor;

/// Simulator facade (Gantree: L3_Backend → TensorNetworkSimulator)
pub mod simulator;

// ============================================================================
// Re-exports
// ============================================================================

pub use config::{EvaluationStrategy, SimulationMode, VisitorConfig};
pub use density::DensityMatrix;
pub use execution::{Backend, ExecutionMetadata, ExecutionResult};
pub use result::{FinalState, QualityWarning, SimulationResult, VisitorStats};
pub use simulator::TensorNetworkSimulator;
pub use visitor::CircuitVisitor;

// ============================================================================
// Prelude
// ============================================================================

pub mod prelude {
    //! Convenient imports for common use cases
    //!
    //! ```rust
    //! use tnsim_backend::prelude::*;
    //! ```

    pub use crate::config::{EvaluationStrategy, SimulationMode, VisitorConfig};
    pub use crate::density::DensityMatrix;
    pub use crate::execution::{Backend, ExecutionResult};
    pub use crate::result::{FinalState, SimulationResult};
    pub use crate::simulator::TensorNetworkSimulator;
    pub use crate::visitor::CircuitVisitor;

    pub use tnsim_core::{Gate, GateDescriptor, Instruction, SimError, SimResult};
    pub use tnsim_noise::{BitOrder, NoiseChannel, NoiseChannelModel, ReadoutErrorRecord};
    pub use tnsim_tensor::{ContractionOrder, GateCatalog};
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
    use approx::assert_abs_diff_eq;
    use num_complex::Complex64;
    use tnsim_noise::{ChannelEntry, GateNoiseEntry, NoiseModelDocument};

    const DEPOLARIZING_X: &str = r#"{"gate_noise": [{"gate_name": "X", "register_location": ["0"], "noise_channels": [{"matrix": [[[[0.99498743710662, 0.0], [0.0, 0.0]], [[0.0, 0.0], [0.99498743710662, 0.0]]], [[[0.0, 0.0], [0.05773502691896258, 0.0]], [[0.05773502691896258, 0.0], [0.0, 0.0]]], [[[0.0, 0.0], [0.0, -0.05773502691896258]], [[0.0, 0.05773502691896258], [0.0, 0.0]]], [[[0.05773502691896258, 0.0], [0.0, 0.0]], [[0.0, 0.0], [-0.05773502691896258, 0.0]]]]}]}], "bit_order": "MSB"}"#;

    const AMPLITUDE_DAMPING_X: &str = r#"{"gate_noise": [{"gate_name": "X", "register_location": ["0"], "noise_channels": [{"matrix": [[[[1.0, 0.0], [0.0, 0.0]], [[0.0, 0.0], [0.8660254037844386, 0.0]]], [[[0.0, 0.0], [0.5, 0.0]], [[0.0, 0.0], [0.0, 0.0]]]]}]}], "bit_order": "MSB"}"#;

    const READOUT: &str = r#"{"gate_noise": [], "bit_order": "MSB", "readout_errors": [{"register_location": "0", "prob_meas0_prep1": 0.2, "prob_meas1_prep0": 0.1}]}"#;

    fn noisy(json: &str) -> TensorNetworkSimulator {
        TensorNetworkSimulator::ideal().with_noise_model(NoiseChannelModel::from_json_str(json).unwrap())
    }

    #[test]
    fn test_depolarizing_fixture() {
        let result = noisy(DEPOLARIZING_X).run(1, &[Gate::X(0).into()]).unwrap();
        let rho = result.density_matrix().unwrap();
        let diag = rho.diagonal();
        assert_abs_diff_eq!(diag[0], 0.00666667, epsilon = 1e-6);
        assert_abs_diff_eq!(diag[1], 0.99333333, epsilon = 1e-6);
        assert!(rho.check_invariants(1e-9).is_ok());
        assert!(result.warnings().is_empty());
    }

    #[test]
    fn test_amplitude_damping_fixture() {
        let result = noisy(AMPLITUDE_DAMPING_X).run(1, &[Gate::X(0).into()]).unwrap();
        let diag = result.density_matrix().unwrap().diagonal();
        assert_abs_diff_eq!(diag[0], 0.25, epsilon = 1e-10);
        assert_abs_diff_eq!(diag[1], 0.75, epsilon = 1e-10);
    }

    #[test]
    fn test_amplitude_damping_by_trajectories() {
        let model = NoiseChannelModel::from_json_str(AMPLITUDE_DAMPING_X).unwrap();
        let sim = TensorNetworkSimulator::new(VisitorConfig::trajectory(2024)).with_noise_model(model);
        let result = sim
            .execute(1, &[Gate::X(0).into(), Gate::Measure(0).into()], 2000)
            .unwrap();
        assert_eq!(result.metadata.mode, "trajectory");
        assert_abs_diff_eq!(result.probability("0"), 0.25, epsilon = 0.05);
        assert_abs_diff_eq!(result.probability("1"), 0.75, epsilon = 0.05);
    }

    /// Flip of qubit 1 on CNOT(0, 1) with probability 0.2, declared in `order`
    fn cnot_flip_document(order: BitOrder) -> String {
        let z = [0.0, 0.0];
        let keep = 0.8f64.sqrt();
        let flip = 0.2f64.sqrt();
        let identity: Vec<Vec<[f64; 2]>> = (0..4)
            .map(|r| (0..4).map(|c| if r == c { [keep, 0.0] } else { z }).collect())
            .collect();
        // MSB: I (x) X flips the low bit; LSB lists the same qubit first
        let target_bit = match order {
            BitOrder::Msb => 0b01,
            BitOrder::Lsb => 0b10,
        };
        let x_on_target: Vec<Vec<[f64; 2]>> = (0..4)
            .map(|r| {
                (0..4)
                    .map(|c| if r ^ c == target_bit { [flip, 0.0] } else { z })
                    .collect()
            })
            .collect();
        let doc = NoiseModelDocument {
            gate_noise: vec![GateNoiseEntry {
                gate_name: "CX".to_string(),
                register_location: vec!["0".to_string(), "1".to_string()],
                noise_channels: vec![ChannelEntry {
                    matrix: vec![identity, x_on_target],
                }],
            }],
            bit_order: Some(order.to_string()),
            readout_errors: vec![],
        };
        serde_json::to_string(&doc).unwrap()
    }

    #[test]
    fn test_msb_and_lsb_declarations_agree() {
        let circuit: Vec<Instruction> = vec![Gate::X(0).into(), Gate::Cnot(0, 1).into()];
        let msb = noisy(&cnot_flip_document(BitOrder::Msb)).run(2, &circuit).unwrap();
        let lsb = noisy(&cnot_flip_document(BitOrder::Lsb)).run(2, &circuit).unwrap();

        let a = msb.density_matrix().unwrap();
        let b = lsb.density_matrix().unwrap();
        for (x, y) in a.as_slice().iter().zip(b.as_slice()) {
            assert!((x - y).norm() < 1e-12);
        }
        // |11> with the target flipped to |10>, never the control
        assert_abs_diff_eq!(a.diagonal()[0b11], 0.8, epsilon = 1e-10);
        assert_abs_diff_eq!(a.diagonal()[0b10], 0.2, epsilon = 1e-10);
        assert_abs_diff_eq!(a.diagonal()[0b01], 0.0, epsilon = 1e-10);
    }

    #[test]
    fn test_readout_fixture() {
        let sim = noisy(READOUT);
        let idle = sim.run(1, &[Gate::Measure(0).into()]).unwrap();
        assert_abs_diff_eq!(idle.qubit_probability(0, true).unwrap(), 0.1, epsilon = 1e-12);
        assert_abs_diff_eq!(idle.probabilities()[1], 0.0, epsilon = 1e-12);

        let flipped = sim
            .run(1, &[Gate::X(0).into(), Gate::Measure(0).into()])
            .unwrap();
        assert_abs_diff_eq!(flipped.qubit_probability(0, false).unwrap(), 0.2, epsilon = 1e-12);

        let sampled = noisy(READOUT)
            .with_seed(11)
            .execute(1, &[Gate::X(0).into(), Gate::Measure(0).into()], 4000)
            .unwrap();
        assert_abs_diff_eq!(sampled.probability("0"), 0.2, epsilon = 0.05);
    }

    #[test]
    fn test_gate_then_inverse_restores_zero_state() {
        let forward = vec![
            Gate::H(0),
            Gate::Rx(1, 0.4),
            Gate::Cnot(0, 2),
            Gate::CPhase(2, 1, 1.3),
            Gate::Ry(0, -0.8),
            Gate::Swap(1, 2),
        ];
        let mut circuit: Vec<Instruction> = forward.iter().cloned().map(Instruction::from).collect();
        circuit.extend(
            forward
                .iter()
                .rev()
                .map(|g| Instruction::from(g.inverse().unwrap())),
        );
        for evaluation in [EvaluationStrategy::Lazy, EvaluationStrategy::Eager] {
            let sim = TensorNetworkSimulator::new(VisitorConfig::default().with_evaluation(evaluation));
            let psi = sim.run(3, &circuit).unwrap();
            let amp = psi.wavefunction().unwrap().get(&[0, 0, 0]).unwrap();
            assert_abs_diff_eq!(amp.re, 1.0, epsilon = 1e-10);
            assert_abs_diff_eq!(amp.im, 0.0, epsilon = 1e-10);
        }
    }

    #[test]
    fn test_contraction_orders_agree_on_noisy_ghz() {
        let model =
            NoiseChannelModel::ideal().with_channel(NoiseChannel::phase_flip("H", 0, 0.1).unwrap());
        let circuit: Vec<Instruction> = vec![
            Gate::H(0).into(),
            Gate::Cnot(0, 1).into(),
            Gate::Cnot(1, 2).into(),
        ];
        let run = |config: VisitorConfig| {
            TensorNetworkSimulator::new(config)
                .with_noise_model(model.clone())
                .run(3, &circuit)
                .unwrap()
                .density_matrix()
                .unwrap()
        };
        let reference = run(VisitorConfig::density_matrix());
        let others = [
            VisitorConfig::density_matrix().with_contraction(ContractionOrder::LowestIdFirst),
            VisitorConfig::density_matrix().with_evaluation(EvaluationStrategy::Eager),
        ];
        for config in others {
            let rho = run(config);
            for (x, y) in rho.as_slice().iter().zip(reference.as_slice()) {
                assert!((x - y).norm() < 1e-10);
            }
        }
        // phase flip shrinks the GHZ coherence to 0.5 * (1 - 2 * 0.1)
        assert_abs_diff_eq!(reference.get(0, 7).unwrap().re, 0.4, epsilon = 1e-10);
        assert_abs_diff_eq!(reference.trace().re, 1.0, epsilon = 1e-10);
    }

    #[test]
    fn test_noise_model_from_file() {
        let path = std::env::temp_dir().join("tnsim_backend_depolarizing_x.json");
        std::fs::write(&path, DEPOLARIZING_X).unwrap();
        let model = NoiseChannelModel::from_json_file(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(model.num_channels(), 1);
        assert_eq!(model.declared_bit_order(), BitOrder::Msb);
    }

    #[test]
    fn test_structural_errors_abort() {
        let sim = TensorNetworkSimulator::ideal();
        let err = sim.run(2, &[Gate::X(2).into()]).unwrap_err();
        assert!(err.is_structural());
        assert_eq!(
            err,
            SimError::QubitOutOfRange {
                qubit: 2,
                open_legs: 2
            }
        );
    }

    #[test]
    fn test_density_entries_mapping() {
        let rho = TensorNetworkSimulator::new(VisitorConfig::density_matrix())
            .run(1, &[Gate::Ry(0, std::f64::consts::FRAC_PI_2).into()])
            .unwrap()
            .density_matrix()
            .unwrap();
        let entries = rho.entries();
        assert_eq!(entries.len(), 4);
        assert!((entries[&(0, 1)] - Complex64::new(0.5, 0.0)).norm() < 1e-12);
        assert_abs_diff_eq!(rho.purity(), 1.0, epsilon = 1e-12);
    }
}
