//! Gate catalog: symbolic gate -> matrix tensor
//!
//! Gantree: L1_Network → GateCatalog
//!
//! Matrices are row-major with the first listed qubit as the most
//! significant index bit, e.g. `CNOT(c, t)` is `|c t> -> |c, t xor c>`.

use crate::tensor::Tensor;
use num_complex::Complex64;
use std::collections::HashMap;
use std::f64::consts::FRAC_1_SQRT_2;
use tnsim_core::{canonical_gate_name, Angle, Gate, SimError, SimResult};

/// Names resolved without registration
pub const BUILTIN_GATES: &[&str] = &[
    "I", "H", "X", "Y", "Z", "S", "SDG", "T", "TDG", "RX", "RY", "RZ", "CPHASE", "CNOT", "CZ",
    "SWAP", "CCX",
];

#[derive(Debug, Clone)]
struct CustomGate {
    num_qubits: usize,
    matrix: Vec<Complex64>,
}

/// Maps gate names (+ parameters) to matrix tensors
/// Gantree: GateCatalog // 게이트 행렬 카탈로그
#[derive(Debug, Clone, Default)]
pub struct GateCatalog {
    custom: HashMap<String, CustomGate>,
}

fn re(x: f64) -> Complex64 {
    Complex64::new(x, 0.0)
}

fn im(x: f64) -> Complex64 {
    Complex64::new(0.0, x)
}

/// `2^k x 2^k` permutation matrix of a basis map
fn permutation(num_qubits: usize, map: impl Fn(usize) -> usize) -> Vec<Complex64> {
    let dim = 1 << num_qubits;
    let mut m = vec![re(0.0); dim * dim];
    for col in 0..dim {
        m[map(col) * dim + col] = re(1.0);
    }
    m
}

fn diagonal(entries: &[Complex64]) -> Vec<Complex64> {
    let dim = entries.len();
    let mut m = vec![re(0.0); dim * dim];
    for (i, &e) in entries.iter().enumerate() {
        m[i * dim + i] = e;
    }
    m
}

impl GateCatalog {
    /// Catalog with the built-in gates
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a custom `num_qubits` gate from a row-major matrix
    pub fn register(
        &mut self,
        name: &str,
        num_qubits: usize,
        matrix: Vec<Complex64>,
    ) -> SimResult<()> {
        let key = canonical_gate_name(name);
        if BUILTIN_GATES.contains(&key.as_str()) {
            return Err(SimError::InvalidGateParameter(format!(
                "{} is a built-in gate",
                name
            )));
        }
        if num_qubits == 0 {
            return Err(SimError::InvalidGateParameter(format!(
                "{} must act on at least one qubit",
                name
            )));
        }
        let expected = u32::try_from(num_qubits)
            .ok()
            .and_then(|k| 1usize.checked_shl(k))
            .and_then(|dim| dim.checked_mul(dim))
            .ok_or_else(|| {
                SimError::InvalidGateParameter(format!(
                    "{} acts on too many qubits ({})",
                    name, num_qubits
                ))
            })?;
        if matrix.len() != expected {
            return Err(SimError::DataLengthMismatch {
                expected,
                actual: matrix.len(),
            });
        }
        self.custom.insert(key, CustomGate { num_qubits, matrix });
        Ok(())
    }

    /// Check whether a name resolves
    pub fn contains(&self, name: &str) -> bool {
        let key = canonical_gate_name(name);
        BUILTIN_GATES.contains(&key.as_str()) || self.custom.contains_key(&key)
    }

    /// Number of qubits a named gate acts on
    pub fn arity(&self, name: &str) -> SimResult<usize> {
        let key = canonical_gate_name(name);
        match key.as_str() {
            "CPHASE" | "CNOT" | "CZ" | "SWAP" => Ok(2),
            "CCX" => Ok(3),
            k if BUILTIN_GATES.contains(&k) => Ok(1),
            _ => self
                .custom
                .get(&key)
                .map(|g| g.num_qubits)
                .ok_or(SimError::UnknownGate(name.to_string())),
        }
    }

    /// Row-major matrix of a named gate
    ///
    /// Rotations and `CPHASE` take exactly one angle; every other gate,
    /// registered ones included, takes none.
    /// Gantree: matrix(name, params) -> Result<Vec<Complex64>> // 행렬 조회
    pub fn matrix(&self, name: &str, params: &[Angle]) -> SimResult<Vec<Complex64>> {
        let key = canonical_gate_name(name);
        let parameterized = matches!(key.as_str(), "RX" | "RY" | "RZ" | "CPHASE");
        if !parameterized && !params.is_empty() && self.contains(name) {
            return Err(SimError::InvalidGateParameter(format!(
                "{} takes no parameters, got {}",
                name,
                params.len()
            )));
        }
        let angle = || -> SimResult<Angle> {
            match params {
                [theta] => Ok(*theta),
                _ => Err(SimError::InvalidGateParameter(format!(
                    "{} expects one angle, got {}",
                    name,
                    params.len()
                ))),
            }
        };

        let m = match key.as_str() {
            "I" => diagonal(&[re(1.0), re(1.0)]),
            "H" => {
                let h = re(FRAC_1_SQRT_2);
                vec![h, h, h, -h]
            }
            "X" => permutation(1, |b| b ^ 1),
            "Y" => vec![re(0.0), im(-1.0), im(1.0), re(0.0)],
            "Z" => diagonal(&[re(1.0), re(-1.0)]),
            "S" => diagonal(&[re(1.0), im(1.0)]),
            "SDG" => diagonal(&[re(1.0), im(-1.0)]),
            "T" => diagonal(&[re(1.0), Complex64::from_polar(1.0, std::f64::consts::FRAC_PI_4)]),
            "TDG" => diagonal(&[re(1.0), Complex64::from_polar(1.0, -std::f64::consts::FRAC_PI_4)]),
            "RX" => {
                let half = angle()? / 2.0;
                let (c, s) = (re(half.cos()), im(-half.sin()));
                vec![c, s, s, c]
            }
            "RY" => {
                let half = angle()? / 2.0;
                let (c, s) = (half.cos(), half.sin());
                vec![re(c), re(-s), re(s), re(c)]
            }
            "RZ" => {
                let half = angle()? / 2.0;
                diagonal(&[
                    Complex64::from_polar(1.0, -half),
                    Complex64::from_polar(1.0, half),
                ])
            }
            "CPHASE" => {
                let theta = angle()?;
                diagonal(&[re(1.0), re(1.0), re(1.0), Complex64::from_polar(1.0, theta)])
            }
            "CNOT" => permutation(2, |b| if b & 0b10 != 0 { b ^ 0b01 } else { b }),
            "CZ" => diagonal(&[re(1.0), re(1.0), re(1.0), re(-1.0)]),
            "SWAP" => permutation(2, |b| ((b & 1) << 1) | (b >> 1)),
            "CCX" => permutation(3, |b| if b & 0b110 == 0b110 { b ^ 0b001 } else { b }),
            _ => {
                return self
                    .custom
                    .get(&key)
                    .map(|g| g.matrix.clone())
                    .ok_or(SimError::UnknownGate(name.to_string()))
            }
        };
        Ok(m)
    }

    /// Matrix of a named gate as a rank-2k tensor
    pub fn tensor(&self, name: &str, params: &[Angle]) -> SimResult<Tensor> {
        let k = self.arity(name)?;
        Tensor::from_matrix(k, self.matrix(name, params)?)
    }

    /// Tensor of a resolved gate
    pub fn gate_tensor(&self, gate: &Gate) -> SimResult<Tensor> {
        if gate.is_measurement() {
            return Err(SimError::InvalidGateParameter(
                "measurement has no gate matrix".to_string(),
            ));
        }
        let tensor = self.tensor(gate.name(), &gate.params())?;
        let expected = 2 * gate.num_qubits();
        if tensor.rank() != expected {
            return Err(SimError::RankMismatch {
                expected,
                actual: tensor.rank(),
            });
        }
        Ok(tensor)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::f64::consts::PI;

    fn dim_of(m: &[Complex64]) -> usize {
        (m.len() as f64).sqrt().round() as usize
    }

    /// max |U^dagger U - I|
    fn unitarity_error(m: &[Complex64]) -> f64 {
        let d = dim_of(m);
        let mut worst: f64 = 0.0;
        for a in 0..d {
            for b in 0..d {
                let mut acc = Complex64::new(0.0, 0.0);
                for r in 0..d {
                    acc += m[r * d + a].conj() * m[r * d + b];
                }
                let target = if a == b { 1.0 } else { 0.0 };
                worst = worst.max((acc - re(target)).norm());
            }
        }
        worst
    }

    #[test]
    fn test_builtins_are_unitary() {
        let catalog = GateCatalog::new();
        for &name in BUILTIN_GATES {
            let params: &[f64] = match name {
                "RX" | "RY" | "RZ" | "CPHASE" => &[0.37],
                _ => &[],
            };
            let m = catalog.matrix(name, params).unwrap();
            assert!(unitarity_error(&m) < 1e-12, "{} is not unitary", name);
        }
    }

    #[test]
    fn test_cnot_control_is_first_qubit() {
        let catalog = GateCatalog::new();
        let t = catalog.tensor("CX", &[]).unwrap();
        assert_eq!(t.rank(), 4);
        // |10> -> |11>
        assert_eq!(t.get(&[1, 1, 1, 0]).unwrap(), re(1.0));
        assert_eq!(t.get(&[1, 0, 1, 0]).unwrap(), re(0.0));
    }

    #[test]
    fn test_rotation_angles() {
        let catalog = GateCatalog::new();
        let rx = catalog.matrix("Rx", &[PI]).unwrap();
        assert_abs_diff_eq!(rx[1].im, -1.0, epsilon = 1e-12);
        assert!(matches!(
            catalog.matrix("Rx", &[]),
            Err(SimError::InvalidGateParameter(_))
        ));
    }

    #[test]
    fn test_unknown_gate() {
        let catalog = GateCatalog::new();
        assert_eq!(
            catalog.tensor("FOO", &[]).unwrap_err(),
            SimError::UnknownGate("FOO".into())
        );
        assert!(!catalog.contains("FOO"));
    }

    #[test]
    fn test_register_custom_gate() {
        let mut catalog = GateCatalog::new();
        let sx = vec![
            Complex64::new(0.5, 0.5),
            Complex64::new(0.5, -0.5),
            Complex64::new(0.5, -0.5),
            Complex64::new(0.5, 0.5),
        ];
        catalog.register("sx", 1, sx).unwrap();
        assert!(catalog.contains("SX"));
        assert_eq!(catalog.arity("sx").unwrap(), 1);
        assert!(unitarity_error(&catalog.matrix("SX", &[]).unwrap()) < 1e-12);

        assert!(catalog.register("H", 1, vec![re(1.0); 4]).is_err());
        assert!(matches!(
            catalog.register("bad", 1, vec![re(1.0); 3]),
            Err(SimError::DataLengthMismatch { .. })
        ));
        assert!(matches!(
            catalog.register("huge", 64, vec![]),
            Err(SimError::InvalidGateParameter(_))
        ));
        assert!(matches!(
            catalog.register("wide", 40, vec![]),
            Err(SimError::InvalidGateParameter(_))
        ));
        assert!(matches!(
            catalog.matrix("SX", &[0.1]),
            Err(SimError::InvalidGateParameter(_))
        ));
    }

    #[test]
    fn test_fixed_gates_reject_parameters() {
        let catalog = GateCatalog::new();
        let h_with_angle = Gate::Custom {
            name: "H".into(),
            qubits: vec![0],
            params: vec![0.3],
        };
        assert!(matches!(
            catalog.gate_tensor(&h_with_angle),
            Err(SimError::InvalidGateParameter(_))
        ));
        assert!(matches!(
            catalog.matrix("CNOT", &[1.0]),
            Err(SimError::InvalidGateParameter(_))
        ));
        assert!(catalog.matrix("Rz", &[1.0]).is_ok());
        assert_eq!(
            catalog.matrix("FOO", &[1.0]).unwrap_err(),
            SimError::UnknownGate("FOO".into())
        );
    }

    #[test]
    fn test_gate_tensor_for_variants() {
        let catalog = GateCatalog::new();
        assert_eq!(catalog.gate_tensor(&Gate::H(0)).unwrap().rank(), 2);
        assert_eq!(catalog.gate_tensor(&Gate::Swap(0, 1)).unwrap().rank(), 4);
        let ccx = Gate::Custom {
            name: "Toffoli".into(),
            qubits: vec![0, 1, 2],
            params: vec![],
        };
        assert_eq!(catalog.gate_tensor(&ccx).unwrap().rank(), 6);
        assert!(catalog.gate_tensor(&Gate::Measure(0)).is_err());
    }
}
