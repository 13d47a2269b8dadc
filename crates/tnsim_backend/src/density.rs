//! Density matrices
//!
//! Gantree: L3_Backend → DensityMatrix
//!
//! Row and column indices are basis indices with qubit 0 as the most
//! significant bit. A density-matrix network contracts to a tensor whose
//! first n legs are ket (row) legs and last n legs are bra (column) legs, so
//! its row-major body is already the row-major matrix.

use num_complex::Complex64;
use std::collections::BTreeMap;
use tnsim_core::{SimError, SimResult};
use tnsim_tensor::Tensor;

/// Dense density matrix over `num_qubits` qubits
/// Gantree: DensityMatrix // 밀도 행렬
#[derive(Debug, Clone, PartialEq)]
pub struct DensityMatrix {
    num_qubits: usize,
    data: Vec<Complex64>,
}

impl DensityMatrix {
    /// Read a rank-2n ket/bra tensor
    /// Gantree: from_tensor(tensor, n) -> Result<Self> // 텐서 → 밀도행렬
    pub fn from_tensor(tensor: &Tensor, num_qubits: usize) -> SimResult<Self> {
        if tensor.rank() != 2 * num_qubits {
            return Err(SimError::RankMismatch {
                expected: 2 * num_qubits,
                actual: tensor.rank(),
            });
        }
        let dim = 1usize << num_qubits;
        let data = tensor.body()?.to_vec();
        if data.len() != dim * dim {
            return Err(SimError::DataLengthMismatch {
                expected: dim * dim,
                actual: data.len(),
            });
        }
        Ok(Self { num_qubits, data })
    }

    /// `|psi><psi|` of a wavefunction tensor
    pub fn from_wavefunction(psi: &Tensor) -> SimResult<Self> {
        let num_qubits = psi.rank();
        let amps = psi.body()?;
        let dim = 1usize << num_qubits;
        if amps.len() != dim {
            return Err(SimError::DataLengthMismatch {
                expected: dim,
                actual: amps.len(),
            });
        }
        let mut data = Vec::with_capacity(dim * dim);
        for a in amps {
            for b in amps {
                data.push(a * b.conj());
            }
        }
        Ok(Self { num_qubits, data })
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Number of qubits
    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    /// Matrix dimension `2^n`
    pub fn dim(&self) -> usize {
        1usize << self.num_qubits
    }

    /// Element `rho[row][col]`
    pub fn get(&self, row: usize, col: usize) -> Option<Complex64> {
        let dim = self.dim();
        if row >= dim || col >= dim {
            return None;
        }
        self.data.get(row * dim + col).copied()
    }

    /// Mapping `(row, col) -> value`
    pub fn entries(&self) -> BTreeMap<(usize, usize), Complex64> {
        let dim = self.dim();
        self.data
            .iter()
            .enumerate()
            .map(|(flat, &z)| ((flat / dim, flat % dim), z))
            .collect()
    }

    /// Matrix rows
    pub fn rows(&self) -> Vec<Vec<Complex64>> {
        self.data.chunks(self.dim()).map(|r| r.to_vec()).collect()
    }

    /// Row-major elements
    pub fn as_slice(&self) -> &[Complex64] {
        &self.data
    }

    // ========================================================================
    // Properties
    // ========================================================================

    /// Trace
    pub fn trace(&self) -> Complex64 {
        let dim = self.dim();
        (0..dim).map(|i| self.data[i * dim + i]).sum()
    }

    /// Real parts of the diagonal: outcome probabilities
    pub fn diagonal(&self) -> Vec<f64> {
        let dim = self.dim();
        (0..dim).map(|i| self.data[i * dim + i].re).collect()
    }

    /// Largest `|rho[i][j] - conj(rho[j][i])|`
    pub fn hermiticity_error(&self) -> f64 {
        let dim = self.dim();
        let mut worst: f64 = 0.0;
        for i in 0..dim {
            for j in i..dim {
                let diff = self.data[i * dim + j] - self.data[j * dim + i].conj();
                worst = worst.max(diff.norm());
            }
        }
        worst
    }

    /// `Tr(rho^2)`; 1 for pure states
    pub fn purity(&self) -> f64 {
        // Tr(rho rho) = sum_ij rho_ij rho_ji
        let dim = self.dim();
        let mut acc = Complex64::new(0.0, 0.0);
        for i in 0..dim {
            for j in 0..dim {
                acc += self.data[i * dim + j] * self.data[j * dim + i];
            }
        }
        acc.re
    }

    /// Trace one and Hermitian within `tolerance`
    /// Gantree: check_invariants(tol) -> Result<()> // 불변식 검사
    pub fn check_invariants(&self, tolerance: f64) -> SimResult<()> {
        let trace = self.trace();
        if (trace - Complex64::new(1.0, 0.0)).norm() > tolerance {
            return Err(SimError::NumericalInvariant(format!(
                "trace {:.3e}{:+.3e}i differs from 1",
                trace.re, trace.im
            )));
        }
        let herm = self.hermiticity_error();
        if herm > tolerance {
            return Err(SimError::NumericalInvariant(format!(
                "hermiticity error {:.3e}",
                herm
            )));
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::f64::consts::FRAC_1_SQRT_2;

    fn c(re: f64, im: f64) -> Complex64 {
        Complex64::new(re, im)
    }

    #[test]
    fn test_from_wavefunction_plus_state() {
        let psi = Tensor::from_data(vec![2], vec![c(FRAC_1_SQRT_2, 0.0), c(0.0, FRAC_1_SQRT_2)])
            .unwrap();
        let rho = DensityMatrix::from_wavefunction(&psi).unwrap();
        assert_eq!(rho.dim(), 2);
        assert_abs_diff_eq!(rho.trace().re, 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(rho.purity(), 1.0, epsilon = 1e-12);
        // rho[0][1] = a0 conj(a1) = -i/2
        assert_abs_diff_eq!(rho.get(0, 1).unwrap().im, -0.5, epsilon = 1e-12);
        assert!(rho.check_invariants(1e-9).is_ok());
    }

    #[test]
    fn test_from_tensor_layout() {
        let data = vec![c(0.25, 0.0), c(0.0, 0.1), c(0.0, -0.1), c(0.75, 0.0)];
        let t = Tensor::from_data(vec![2, 2], data).unwrap();
        let rho = DensityMatrix::from_tensor(&t, 1).unwrap();
        assert_eq!(rho.diagonal(), vec![0.25, 0.75]);
        assert_eq!(rho.rows()[0][1], c(0.0, 0.1));
        assert_eq!(rho.entries()[&(1, 0)], c(0.0, -0.1));
        assert!(rho.purity() < 1.0);
        assert_eq!(rho.get(2, 0), None);
    }

    #[test]
    fn test_invariant_violations() {
        let bad_trace = Tensor::from_data(vec![2, 2], vec![c(0.5, 0.0), c(0.0, 0.0), c(0.0, 0.0), c(0.4, 0.0)])
            .unwrap();
        let rho = DensityMatrix::from_tensor(&bad_trace, 1).unwrap();
        assert!(matches!(
            rho.check_invariants(1e-6),
            Err(SimError::NumericalInvariant(_))
        ));

        let non_hermitian = Tensor::from_data(vec![2, 2], vec![c(0.5, 0.0), c(0.3, 0.0), c(0.0, 0.0), c(0.5, 0.0)])
            .unwrap();
        let rho = DensityMatrix::from_tensor(&non_hermitian, 1).unwrap();
        assert_abs_diff_eq!(rho.hermiticity_error(), 0.3, epsilon = 1e-12);
        assert!(rho.check_invariants(1e-6).is_err());
    }

    #[test]
    fn test_rank_mismatch() {
        let t = Tensor::zeros(vec![2, 2, 2]).unwrap();
        assert!(matches!(
            DensityMatrix::from_tensor(&t, 1),
            Err(SimError::RankMismatch { .. })
        ));
    }
}
