//! Kraus noise channels
//!
//! Gantree: L2_Noise → NoiseChannel
//!
//! A channel follows one gate on a register location and holds Kraus
//! operators as rank-2k tensors in the internal MSB-first order.

use num_complex::Complex64;
use std::fmt;
use tnsim_core::{canonical_gate_name, Probability, QubitId, SimError, SimResult};
use tnsim_tensor::Tensor;

/// Noise channel attached to a gate
/// Gantree: NoiseChannel // 크라우스 채널
#[derive(Debug, Clone, PartialEq)]
pub struct NoiseChannel {
    gate_name: String,
    qubits: Vec<QubitId>,
    kraus: Vec<Tensor>,
}

fn re(x: f64) -> Complex64 {
    Complex64::new(x, 0.0)
}

fn im(x: f64) -> Complex64 {
    Complex64::new(0.0, x)
}

fn scaled(m: [Complex64; 4], factor: f64) -> Vec<Complex64> {
    m.iter().map(|&z| z * factor).collect()
}

const IDENTITY: [Complex64; 4] = [
    Complex64::new(1.0, 0.0),
    Complex64::new(0.0, 0.0),
    Complex64::new(0.0, 0.0),
    Complex64::new(1.0, 0.0),
];

impl NoiseChannel {
    // ========================================================================
    // Constructors
    // ========================================================================

    /// Create a channel from Kraus tensors
    ///
    /// `qubits` is the register location in MSB-first order. Each Kraus
    /// tensor must have rank `2 * qubits.len()` with qubit legs of dimension 2.
    pub fn new(gate_name: &str, qubits: Vec<QubitId>, kraus: Vec<Tensor>) -> SimResult<Self> {
        if qubits.is_empty() {
            return Err(SimError::InvalidNoiseModel(format!(
                "channel on {} has an empty register location",
                gate_name
            )));
        }
        for (i, q) in qubits.iter().enumerate() {
            if qubits[..i].contains(q) {
                return Err(SimError::DuplicateQubit(*q));
            }
        }
        if kraus.is_empty() {
            return Err(SimError::InvalidNoiseModel(format!(
                "channel on {} has no Kraus operators",
                gate_name
            )));
        }
        let expected = 2 * qubits.len();
        for k in &kraus {
            if k.rank() != expected {
                return Err(SimError::RankMismatch {
                    expected,
                    actual: k.rank(),
                });
            }
            if k.shape().iter().any(|&d| d != 2) {
                return Err(SimError::InvalidShape {
                    rank: k.rank(),
                    shape: k.shape().to_vec(),
                });
            }
        }
        Ok(Self {
            gate_name: canonical_gate_name(gate_name),
            qubits,
            kraus,
        })
    }

    /// Create a channel from row-major `2^k x 2^k` Kraus matrices
    pub fn from_matrices(
        gate_name: &str,
        qubits: Vec<QubitId>,
        matrices: Vec<Vec<Complex64>>,
    ) -> SimResult<Self> {
        let k = qubits.len();
        let kraus = matrices
            .into_iter()
            .map(|m| Tensor::from_matrix(k, m))
            .collect::<SimResult<Vec<_>>>()?;
        Self::new(gate_name, qubits, kraus)
    }

    /// Depolarizing channel: `sqrt(1-p) I`, `sqrt(p/3) {X, Y, Z}`
    /// Gantree: depolarizing(gate, q, p) -> Result<Self> // 탈분극
    pub fn depolarizing(gate_name: &str, qubit: QubitId, p: f64) -> SimResult<Self> {
        let p = Probability::new(p)?;
        let a = p.complement().sqrt();
        let b = (p.value() / 3.0).sqrt();
        let x = [re(0.0), re(1.0), re(1.0), re(0.0)];
        let y = [re(0.0), im(-1.0), im(1.0), re(0.0)];
        let z = [re(1.0), re(0.0), re(0.0), re(-1.0)];
        Self::from_matrices(
            gate_name,
            vec![qubit],
            vec![scaled(IDENTITY, a), scaled(x, b), scaled(y, b), scaled(z, b)],
        )
    }

    /// Amplitude damping with decay probability `gamma`
    pub fn amplitude_damping(gate_name: &str, qubit: QubitId, gamma: f64) -> SimResult<Self> {
        let gamma = Probability::new(gamma)?;
        let k0 = vec![re(1.0), re(0.0), re(0.0), re(gamma.complement().sqrt())];
        let k1 = vec![re(0.0), re(gamma.value().sqrt()), re(0.0), re(0.0)];
        Self::from_matrices(gate_name, vec![qubit], vec![k0, k1])
    }

    /// Bit flip with probability `p`
    pub fn bit_flip(gate_name: &str, qubit: QubitId, p: f64) -> SimResult<Self> {
        let p = Probability::new(p)?;
        let x = [re(0.0), re(1.0), re(1.0), re(0.0)];
        Self::from_matrices(
            gate_name,
            vec![qubit],
            vec![
                scaled(IDENTITY, p.complement().sqrt()),
                scaled(x, p.value().sqrt()),
            ],
        )
    }

    /// Phase flip with probability `p`
    pub fn phase_flip(gate_name: &str, qubit: QubitId, p: f64) -> SimResult<Self> {
        let p = Probability::new(p)?;
        let z = [re(1.0), re(0.0), re(0.0), re(-1.0)];
        Self::from_matrices(
            gate_name,
            vec![qubit],
            vec![
                scaled(IDENTITY, p.complement().sqrt()),
                scaled(z, p.value().sqrt()),
            ],
        )
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Canonical name of the gate this channel follows
    pub fn gate_name(&self) -> &str {
        &self.gate_name
    }

    /// Register location, MSB-first
    pub fn qubits(&self) -> &[QubitId] {
        &self.qubits
    }

    /// Register location sorted ascending (lookup key)
    pub fn sorted_qubits(&self) -> Vec<QubitId> {
        let mut q = self.qubits.clone();
        q.sort_unstable();
        q
    }

    /// Number of qubits acted on
    pub fn num_qubits(&self) -> usize {
        self.qubits.len()
    }

    /// Kraus operator tensors
    pub fn kraus_operators(&self) -> &[Tensor] {
        &self.kraus
    }

    /// Number of Kraus operators
    pub fn num_kraus(&self) -> usize {
        self.kraus.len()
    }

    // ========================================================================
    // Network Form
    // ========================================================================

    /// All Kraus operators in one tensor with a trailing Kraus-index leg
    ///
    /// Legs are `[out.., in.., kraus]`; contracting the Kraus leg of this
    /// tensor with that of its conjugate sums `K rho K^dagger` over operators.
    /// Gantree: stacked_tensor() -> Result<Tensor> // 크라우스 적층
    pub fn stacked_tensor(&self) -> SimResult<Tensor> {
        let m = self.kraus.len();
        let volume = 1usize << (2 * self.qubits.len());
        let mut body = vec![re(0.0); volume * m];
        for (k, op) in self.kraus.iter().enumerate() {
            for (flat, &z) in op.body()?.iter().enumerate() {
                body[flat * m + k] = z;
            }
        }
        let mut shape = vec![2; 2 * self.qubits.len()];
        shape.push(m);
        Tensor::from_data(shape, body)
    }

    // ========================================================================
    // Validation
    // ========================================================================

    /// Largest entry of `sum K^dagger K - I`
    pub fn trace_preservation_error(&self) -> f64 {
        let dim = 1usize << self.qubits.len();
        let mut acc = vec![re(0.0); dim * dim];
        for op in &self.kraus {
            let Ok(k) = op.body() else {
                return f64::INFINITY;
            };
            for a in 0..dim {
                for b in 0..dim {
                    let mut sum = re(0.0);
                    for r in 0..dim {
                        sum += k[r * dim + a].conj() * k[r * dim + b];
                    }
                    acc[a * dim + b] += sum;
                }
            }
        }
        let mut worst: f64 = 0.0;
        for a in 0..dim {
            for b in 0..dim {
                let target = if a == b { re(1.0) } else { re(0.0) };
                worst = worst.max((acc[a * dim + b] - target).norm());
            }
        }
        worst
    }

    /// Check `sum K^dagger K = I` within `tolerance`
    pub fn is_trace_preserving(&self, tolerance: f64) -> bool {
        self.trace_preservation_error() <= tolerance
    }
}

impl fmt::Display for NoiseChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "NoiseChannel({} on {:?}, {} Kraus)",
            self.gate_name,
            self.qubits,
            self.kraus.len()
        )
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use tnsim_core::tolerance::KRAUS_COMPLETENESS;

    #[test]
    fn test_constructors_are_trace_preserving() {
        let channels = [
            NoiseChannel::depolarizing("X", 0, 0.01).unwrap(),
            NoiseChannel::amplitude_damping("X", 0, 0.25).unwrap(),
            NoiseChannel::bit_flip("H", 1, 0.3).unwrap(),
            NoiseChannel::phase_flip("H", 1, 0.5).unwrap(),
        ];
        for ch in &channels {
            assert!(
                ch.is_trace_preserving(KRAUS_COMPLETENESS),
                "{} error {}",
                ch,
                ch.trace_preservation_error()
            );
        }
    }

    #[test]
    fn test_depolarizing_coefficients() {
        let ch = NoiseChannel::depolarizing("X", 0, 0.01).unwrap();
        assert_eq!(ch.num_kraus(), 4);
        let k0 = ch.kraus_operators()[0].body().unwrap();
        assert_abs_diff_eq!(k0[0].re, 0.99498743710662, epsilon = 1e-12);
        let k1 = ch.kraus_operators()[1].body().unwrap();
        assert_abs_diff_eq!(k1[1].re, 0.05773502691896258, epsilon = 1e-12);
    }

    #[test]
    fn test_non_trace_preserving_detected() {
        let ch = NoiseChannel::from_matrices("X", vec![0], vec![scaled(IDENTITY, 0.5)]).unwrap();
        assert_abs_diff_eq!(ch.trace_preservation_error(), 0.75, epsilon = 1e-12);
        assert!(!ch.is_trace_preserving(KRAUS_COMPLETENESS));
    }

    #[test]
    fn test_invalid_channels() {
        assert!(matches!(
            NoiseChannel::depolarizing("X", 0, 1.5),
            Err(SimError::InvalidProbability(_))
        ));
        assert!(matches!(
            NoiseChannel::from_matrices("CNOT", vec![0, 0], vec![vec![re(1.0); 16]]),
            Err(SimError::DuplicateQubit(0))
        ));
        assert!(NoiseChannel::from_matrices("X", vec![0], vec![]).is_err());
        assert!(NoiseChannel::from_matrices("CNOT", vec![0, 1], vec![vec![re(1.0); 4]]).is_err());
    }

    #[test]
    fn test_stacked_tensor_layout() {
        let ch = NoiseChannel::amplitude_damping("x", 2, 0.25).unwrap();
        assert_eq!(ch.gate_name(), "X");
        let s = ch.stacked_tensor().unwrap();
        assert_eq!(s.shape(), &[2, 2, 2]);
        // K1[0][1] = sqrt(0.25)
        assert_abs_diff_eq!(s.get(&[0, 1, 1]).unwrap().re, 0.5);
        // K0[1][1] = sqrt(0.75)
        assert_abs_diff_eq!(s.get(&[1, 1, 0]).unwrap().re, 0.75f64.sqrt());
    }

    #[test]
    fn test_sorted_qubits() {
        let ch = NoiseChannel::from_matrices("CX", vec![3, 1], vec![scaled(IDENTITY, 1.0)]);
        // one 2x2 matrix cannot describe a two-qubit channel
        assert!(ch.is_err());

        let mut id4 = vec![re(0.0); 16];
        for i in 0..4 {
            id4[i * 4 + i] = re(1.0);
        }
        let ch = NoiseChannel::from_matrices("CX", vec![3, 1], vec![id4]).unwrap();
        assert_eq!(ch.qubits(), &[3, 1]);
        assert_eq!(ch.sorted_qubits(), vec![1, 3]);
        assert_eq!(ch.gate_name(), "CNOT");
    }
}
