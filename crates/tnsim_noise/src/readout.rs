//! Readout (measurement) errors
//!
//! Gantree: L2_Noise → ReadoutError
//!
//! Classical misclassification applied to outcome probabilities after all
//! quantum evolution. Qubits are independent; no cross-talk.

use serde::{Deserialize, Serialize};
use tnsim_core::{Probability, QubitId, SimError, SimResult};

/// Per-qubit readout calibration
/// Gantree: ReadoutErrorRecord // 측정 오류
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReadoutErrorRecord {
    /// Qubit index
    pub qubit: QubitId,
    /// P(measure 1 | prepared 0)
    pub p_meas1_prep0: f64,
    /// P(measure 0 | prepared 1)
    pub p_meas0_prep1: f64,
}

impl ReadoutErrorRecord {
    /// Create a record with validated probabilities
    pub fn new(qubit: QubitId, p_meas1_prep0: f64, p_meas0_prep1: f64) -> SimResult<Self> {
        Probability::new(p_meas1_prep0)?;
        Probability::new(p_meas0_prep1)?;
        Ok(Self {
            qubit,
            p_meas1_prep0,
            p_meas0_prep1,
        })
    }

    /// `[[1-p(1|0), p(0|1)], [p(1|0), 1-p(0|1)]]`
    pub fn calibration_matrix(&self) -> [[f64; 2]; 2] {
        [
            [1.0 - self.p_meas1_prep0, self.p_meas0_prep1],
            [self.p_meas1_prep0, 1.0 - self.p_meas0_prep1],
        ]
    }

    /// Map prepared-state probabilities `[p0, p1]` to reported ones
    pub fn apply(&self, probs: [f64; 2]) -> [f64; 2] {
        let m = self.calibration_matrix();
        [
            m[0][0] * probs[0] + m[0][1] * probs[1],
            m[1][0] * probs[0] + m[1][1] * probs[1],
        ]
    }
}

/// Apply readout errors to a distribution over `num_qubits` basis states
///
/// `probs[i]` is indexed with qubit 0 as the most significant bit.
/// Gantree: apply_readout_errors(probs, n, records) -> Result<Vec<f64>> // 측정 보정
pub fn apply_readout_errors(
    probs: &[f64],
    num_qubits: usize,
    records: &[ReadoutErrorRecord],
) -> SimResult<Vec<f64>> {
    let dim = 1usize << num_qubits;
    if probs.len() != dim {
        return Err(SimError::DataLengthMismatch {
            expected: dim,
            actual: probs.len(),
        });
    }
    let mut out = probs.to_vec();
    for record in records {
        if record.qubit >= num_qubits {
            return Err(SimError::QubitOutOfRange {
                qubit: record.qubit,
                open_legs: num_qubits,
            });
        }
        let mask = 1usize << (num_qubits - 1 - record.qubit);
        for i0 in (0..dim).filter(|i| i & mask == 0) {
            let i1 = i0 | mask;
            let [p0, p1] = record.apply([out[i0], out[i1]]);
            out[i0] = p0;
            out[i1] = p1;
        }
    }
    Ok(out)
}
