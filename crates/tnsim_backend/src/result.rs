//! Simulation results
//!
//! Gantree: L3_Backend → SimulationResult
//!
//! The final state of a visited circuit plus everything needed to turn it
//! into reported measurement statistics.

use crate::density::DensityMatrix;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use tnsim_core::{Bitstring, Counts, QubitId, SimError, SimResult};
use tnsim_noise::{apply_readout_errors, ReadoutErrorRecord};
use tnsim_tensor::Tensor;

/// Numerical invariant violated after a contraction epoch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityWarning {
    /// Epoch number, starting at 1
    pub epoch: usize,
    /// What was out of tolerance
    pub message: String,
}

impl fmt::Display for QualityWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "epoch {}: {}", self.epoch, self.message)
    }
}

/// Visitor counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisitorStats {
    /// Gate tensors applied (a ket/bra pair counts once)
    pub gates_applied: usize,
    /// Noise channels applied
    pub channels_applied: usize,
    /// Noise channels skipped in wave-function mode
    pub channels_skipped: usize,
    /// Disabled instructions skipped
    pub instructions_skipped: usize,
    /// Contraction epochs closed
    pub epochs_closed: usize,
}

/// Final state of a simulation
#[derive(Debug, Clone, PartialEq)]
pub enum FinalState {
    /// Amplitude tensor, one leg per qubit
    WaveFunction(Tensor),
    /// Density matrix
    DensityMatrix(DensityMatrix),
}

/// Result of visiting a circuit
/// Gantree: SimulationResult // 시뮬레이션 결과
#[derive(Debug, Clone)]
pub struct SimulationResult {
    num_qubits: usize,
    state: FinalState,
    probabilities: Vec<f64>,
    measured: Vec<QubitId>,
    readout: Vec<ReadoutErrorRecord>,
    warnings: Vec<QualityWarning>,
    stats: VisitorStats,
}

impl SimulationResult {
    /// Assemble a result
    pub fn new(
        num_qubits: usize,
        state: FinalState,
        measured: Vec<QubitId>,
        readout: Vec<ReadoutErrorRecord>,
        warnings: Vec<QualityWarning>,
        stats: VisitorStats,
    ) -> SimResult<Self> {
        let probabilities = match &state {
            FinalState::WaveFunction(psi) => {
                if psi.rank() != num_qubits {
                    return Err(SimError::RankMismatch {
                        expected: num_qubits,
                        actual: psi.rank(),
                    });
                }
                psi.body()?.iter().map(|z| z.norm_sqr()).collect()
            }
            FinalState::DensityMatrix(rho) => {
                if rho.num_qubits() != num_qubits {
                    return Err(SimError::RankMismatch {
                        expected: 2 * num_qubits,
                        actual: 2 * rho.num_qubits(),
                    });
                }
                rho.diagonal()
            }
        };
        Ok(Self {
            num_qubits,
            state,
            probabilities,
            measured,
            readout,
            warnings,
            stats,
        })
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Number of qubits
    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    /// Final state
    pub fn state(&self) -> &FinalState {
        &self.state
    }

    /// Amplitude tensor, when the simulation was pure
    pub fn wavefunction(&self) -> Option<&Tensor> {
        match &self.state {
            FinalState::WaveFunction(psi) => Some(psi),
            FinalState::DensityMatrix(_) => None,
        }
    }

    /// Density matrix of the final state (built from the wavefunction when pure)
    pub fn density_matrix(&self) -> SimResult<DensityMatrix> {
        match &self.state {
            FinalState::WaveFunction(psi) => DensityMatrix::from_wavefunction(psi),
            FinalState::DensityMatrix(rho) => Ok(rho.clone()),
        }
    }

    /// Qubits measured, in first-measured order
    pub fn measured_qubits(&self) -> &[QubitId] {
        &self.measured
    }

    /// Readout errors applied to reported probabilities
    pub fn readout_errors(&self) -> &[ReadoutErrorRecord] {
        &self.readout
    }

    /// Quality warnings collected during the run
    pub fn warnings(&self) -> &[QualityWarning] {
        &self.warnings
    }

    /// Visitor counters
    pub fn stats(&self) -> VisitorStats {
        self.stats
    }

    // ========================================================================
    // Probabilities
    // ========================================================================

    /// Outcome probabilities of the quantum state, before readout error
    pub fn probabilities(&self) -> &[f64] {
        &self.probabilities
    }

    /// Reported outcome probabilities, readout error applied
    /// Gantree: noisy_probabilities() -> Result<Vec<f64>> // 측정 오류 반영
    pub fn noisy_probabilities(&self) -> SimResult<Vec<f64>> {
        apply_readout_errors(&self.probabilities, self.num_qubits, &self.readout)
    }

    /// Reported probability that `qubit` reads `outcome`
    pub fn qubit_probability(&self, qubit: QubitId, outcome: bool) -> SimResult<f64> {
        if qubit >= self.num_qubits {
            return Err(SimError::QubitOutOfRange {
                qubit,
                open_legs: self.num_qubits,
            });
        }
        let mask = 1usize << (self.num_qubits - 1 - qubit);
        Ok(self
            .noisy_probabilities()?
            .iter()
            .enumerate()
            .filter(|(i, _)| (i & mask != 0) == outcome)
            .map(|(_, p)| p)
            .sum())
    }

    /// Qubits reported on: the measured ones, or all when none were measured
    fn reported_qubits(&self) -> Vec<QubitId> {
        if self.measured.is_empty() {
            (0..self.num_qubits).collect()
        } else {
            self.measured.clone()
        }
    }

    /// Reported distribution over the measured qubits
    pub fn measurement_distribution(&self) -> SimResult<BTreeMap<String, f64>> {
        let qubits = self.reported_qubits();
        let mut dist = BTreeMap::new();
        for (index, p) in self.noisy_probabilities()?.into_iter().enumerate() {
            let key = Bitstring::from_index(index, self.num_qubits)
                .select(&qubits)
                .to_string();
            *dist.entry(key).or_insert(0.0) += p;
        }
        Ok(dist)
    }

    // ========================================================================
    // Sampling
    // ========================================================================

    /// Draw `shots` outcomes of the measured qubits
    /// Gantree: sample_counts(shots, rng) -> Result<Counts> // 샘플링
    pub fn sample_counts<R: Rng>(&self, shots: u64, rng: &mut R) -> SimResult<Counts> {
        let probs: Vec<f64> = self
            .noisy_probabilities()?
            .into_iter()
            .map(|p| p.max(0.0))
            .collect();
        let total: f64 = probs.iter().sum();
        if total <= 0.0 {
            return Err(SimError::NumericalInvariant(
                "outcome probabilities sum to zero".to_string(),
            ));
        }
        let qubits = self.reported_qubits();
        let mut counts: Counts = HashMap::new();

        for _ in 0..shots {
            let r: f64 = rng.gen::<f64>() * total;
            let mut cumsum = 0.0;
            let mut outcome = probs.len() - 1;
            for (i, &p) in probs.iter().enumerate() {
                cumsum += p;
                if r < cumsum {
                    outcome = i;
                    break;
                }
            }
            let key = Bitstring::from_index(outcome, self.num_qubits)
                .select(&qubits)
                .to_string();
            *counts.entry(key).or_insert(0) += 1;
        }

        Ok(counts)
    }
}

impl fmt::Display for SimulationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.state {
            FinalState::WaveFunction(_) => "wavefunction",
            FinalState::DensityMatrix(_) => "density matrix",
        };
        write!(
            f,
            "SimulationResult({} qubits, {}, {} warning(s))",
            self.num_qubits,
            kind,
            self.warnings.len()
        )
    }
}

// ============================================================================
// Tests
// ============================================================================
