//! # TNSim Noise
//!
//! Kraus noise channels attached to gates, register bit-order handling and
//! classical readout errors.
//!
//! ## Gantree Architecture
//!
//! ```text
//! tnsim_noise // L2: Noise
//!     BitOrder // MSB | LSB, 로드 시 정규화
//!     NoiseChannel // 크라우스 연산자 묶음
//!         depolarizing, amplitude_damping, bit_flip, phase_flip
//!         stacked_tensor // 밀도행렬 네트워크용
//!     NoiseChannelModel // (게이트, 위치) → 채널
//!         from_json_str, channels_for
//!     ReadoutError // 측정 오류 보정
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use tnsim_noise::prelude::*;
//!
//! let json = r#"{
//!     "gate_noise": [],
//!     "bit_order": "MSB",
//!     "readout_errors": [
//!         {"register_location": "0", "prob_meas0_prep1": 0.2, "prob_meas1_prep0": 0.1}
//!     ]
//! }"#;
//! let model = NoiseChannelModel::from_json_str(json).unwrap();
//! let probs = apply_readout_errors(&[1.0, 0.0], 1, &model.readout_errors()).unwrap();
//! assert!((probs[1] - 0.1).abs() < 1e-12);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

// ============================================================================
// Module Declarations
// ============================================================================

/// Bit-order conventions (Gantree: L2_Noise → BitOrder)
pub mod bit_order;

/// Kraus channels (Gantree: L2_Noise → NoiseChannel)
pub mod channel;

/// Noise channel model (Gantree: L2_Noise → NoiseChannelModel)
pub mod noise_model;

/// Readout errors (Gantree: L2_Noise → ReadoutError)
pub mod readout;

// ============================================================================
// Re-exports
// ============================================================================

pub use bit_order::BitOrder;
pub use channel::NoiseChannel;
pub use noise_model::{
    ChannelEntry, GateNoiseEntry, NoiseChannelModel, NoiseModelDocument, ReadoutEntry,
};
pub use readout::{apply_readout_errors, ReadoutErrorRecord};

// ============================================================================
// Prelude
// ============================================================================

pub mod prelude {
    //! Convenient imports for common use cases
    //!
    //! ```rust
    //! use tnsim_noise::prelude::*;
    //! ```

    pub use crate::bit_order::BitOrder;
    pub use crate::channel::NoiseChannel;
    pub use crate::noise_model::NoiseChannelModel;
    pub use crate::readout::{apply_readout_errors, ReadoutErrorRecord};
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
    use super::{ChannelEntry, GateNoiseEntry, NoiseModelDocument};
    use approx::assert_abs_diff_eq;
    use num_complex::Complex64;
    use tnsim_tensor::prelude::*;

    fn pauli_on_second(label: char) -> Vec<Complex64> {
        let z = Complex64::new(0.0, 0.0);
        let one = Complex64::new(1.0, 0.0);
        let i = Complex64::new(0.0, 1.0);
        let p: [Complex64; 4] = match label {
            'X' => [z, one, one, z],
            'Y' => [z, -i, i, z],
            _ => [one, z, z, -one],
        };
        // I ⊗ P in row-major order
        let mut m = vec![z; 16];
        for a in 0..2 {
            for r in 0..2 {
                for c in 0..2 {
                    m[(a * 2 + r) * 4 + (a * 2 + c)] = p[r * 2 + c];
                }
            }
        }
        m
    }

    fn pauli_on_first(label: char) -> Vec<Complex64> {
        // P ⊗ I: swap the roles of the two index bits
        let m = pauli_on_second(label);
        let mut out = m.clone();
        for row in 0..4 {
            for col in 0..4 {
                let swap = |k: usize| ((k & 1) << 1) | (k >> 1);
                out[swap(row) * 4 + swap(col)] = m[row * 4 + col];
            }
        }
        out
    }

    fn document(order: &str, matrices: &[Vec<Complex64>]) -> String {
        let matrix: Vec<Vec<Vec<[f64; 2]>>> = matrices
            .iter()
            .map(|m| {
                m.chunks(4)
                    .map(|row| row.iter().map(|z| [z.re, z.im]).collect())
                    .collect()
            })
            .collect();
        let doc = NoiseModelDocument {
            gate_noise: vec![GateNoiseEntry {
                gate_name: "CNOT".to_string(),
                register_location: vec!["0".to_string(), "1".to_string()],
                noise_channels: vec![ChannelEntry { matrix }],
            }],
            bit_order: Some(order.to_string()),
            readout_errors: vec![],
        };
        serde_json::to_string(&doc).unwrap()
    }

    fn apply_kraus(ch: &NoiseChannel, state: &Tensor, k: usize) -> Tensor {
        state
            .apply_operator(&ch.kraus_operators()[k], ch.qubits())
            .unwrap()
    }

    #[test]
    fn test_msb_and_lsb_documents_describe_the_same_noise() {
        let msb: Vec<_> = ['X', 'Y', 'Z'].iter().map(|&p| pauli_on_second(p)).collect();
        let lsb: Vec<_> = ['X', 'Y', 'Z'].iter().map(|&p| pauli_on_first(p)).collect();
        let a = NoiseChannelModel::from_json_str(&document("MSB", &msb)).unwrap();
        let b = NoiseChannelModel::from_json_str(&document("LSB", &lsb)).unwrap();

        let ca = &a.channels_for("CX", &[0, 1])[0];
        let cb = &b.channels_for("CX", &[1, 0])[0];

        // 0.6|00> + 0.8i|10>: asymmetric in the two qubits
        let state = Tensor::from_data(
            vec![2, 2],
            vec![
                Complex64::new(0.6, 0.0),
                Complex64::new(0.0, 0.0),
                Complex64::new(0.0, 0.8),
                Complex64::new(0.0, 0.0),
            ],
        )
        .unwrap();
        for k in 0..3 {
            let ya = apply_kraus(ca, &state, k);
            let yb = apply_kraus(cb, &state, k);
            assert!(ya.max_abs_diff(&yb).unwrap() < 1e-12);
        }
    }

    #[test]
    fn test_noise_model_readout_pipeline() {
        let model = NoiseChannelModel::ideal()
            .with_readout_error(ReadoutErrorRecord::new(0, 0.1, 0.2).unwrap());
        // |1> prepared
        let probs = apply_readout_errors(&[0.0, 1.0], 1, &model.readout_errors()).unwrap();
        assert_abs_diff_eq!(probs[0], 0.2, epsilon = 1e-12);
        assert_abs_diff_eq!(probs[1], 0.8, epsilon = 1e-12);
    }

    #[test]
    fn test_amplitude_damping_population_transfer() {
        // rho' = sum_k K rho K^dagger for |1><1| under amplitude damping
        let ch = NoiseChannel::amplitude_damping("X", 0, 0.25).unwrap();
        let one = Tensor::from_data(
            vec![2],
            vec![Complex64::new(0.0, 0.0), Complex64::new(1.0, 0.0)],
        )
        .unwrap();
        let mut p0 = 0.0;
        for k in 0..ch.num_kraus() {
            let phi = apply_kraus(&ch, &one, k);
            p0 += phi.get(&[0]).unwrap().norm_sqr();
        }
        assert_abs_diff_eq!(p0, 0.25, epsilon = 1e-12);
        assert_eq!(ch.stacked_tensor().unwrap().shape(), &[2, 2, 2]);
    }
}
