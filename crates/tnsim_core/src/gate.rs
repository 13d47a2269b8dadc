//! Gate and instruction definitions for TNSim
//!
//! Gantree: L1_Instruction → Gate
//!
//! The instruction source hands the simulator one symbolic instruction at a
//! time. Each one is resolved into a tagged [`Gate`] variant so the visitor
//! can dispatch with a single `match`.

use crate::error::{SimError, SimResult};
use crate::types::{Angle, QubitId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Quantum gate enumeration
/// Gantree: Gate // 게이트 enum
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Gate {
    // ========================================================================
    // Single-Qubit Gates
    // ========================================================================
    /// Hadamard gate
    /// Gantree: H(QubitId) // 하다마드
    H(QubitId),

    /// Pauli-X gate (NOT)
    X(QubitId),

    /// Pauli-Y gate
    Y(QubitId),

    /// Pauli-Z gate
    Z(QubitId),

    /// Rotation around X-axis
    /// Gantree: Rx(QubitId, Angle) // X 회전
    Rx(QubitId, Angle),

    /// Rotation around Y-axis
    Ry(QubitId, Angle),

    /// Rotation around Z-axis
    Rz(QubitId, Angle),

    // ========================================================================
    // Two-Qubit Gates
    // ========================================================================
    /// Controlled-phase diag(1, 1, 1, e^{iθ})
    CPhase(QubitId, QubitId, Angle),

    /// Controlled-NOT (control, target)
    /// Gantree: CNOT(QubitId, QubitId) // ctrl, tgt
    Cnot(QubitId, QubitId),

    /// SWAP gate
    Swap(QubitId, QubitId),

    // ========================================================================
    // Measurement
    // ========================================================================
    /// Single qubit measurement (terminal)
    /// Gantree: Measure(QubitId) // 단일 측정
    Measure(QubitId),

    // ========================================================================
    // Generic k-Qubit Gate
    // ========================================================================
    /// Any other gate, resolved by name through the gate catalog
    Custom {
        /// Symbolic name
        name: String,
        /// Target qubits, first qubit is the most significant matrix index
        qubits: Vec<QubitId>,
        /// Continuous parameters
        params: Vec<Angle>,
    },
}

impl Gate {
    // ========================================================================
    // Gate Properties
    // ========================================================================

    /// Get qubits involved in this gate
    /// Gantree: qubits(&self) -> Vec<QubitId> // 관련 큐비트
    pub fn qubits(&self) -> Vec<QubitId> {
        match self {
            Gate::H(q)
            | Gate::X(q)
            | Gate::Y(q)
            | Gate::Z(q)
            | Gate::Rx(q, _)
            | Gate::Ry(q, _)
            | Gate::Rz(q, _)
            | Gate::Measure(q) => vec![*q],
            Gate::CPhase(c, t, _) | Gate::Cnot(c, t) | Gate::Swap(c, t) => vec![*c, *t],
            Gate::Custom { qubits, .. } => qubits.clone(),
        }
    }

    /// Continuous parameters of the gate
    pub fn params(&self) -> Vec<Angle> {
        match self {
            Gate::Rx(_, theta) | Gate::Ry(_, theta) | Gate::Rz(_, theta) => vec![*theta],
            Gate::CPhase(_, _, theta) => vec![*theta],
            Gate::Custom { params, .. } => params.clone(),
            _ => Vec::new(),
        }
    }

    /// Number of qubits the gate acts on
    pub fn num_qubits(&self) -> usize {
        match self {
            Gate::Custom { qubits, .. } => qubits.len(),
            Gate::CPhase(..) | Gate::Cnot(..) | Gate::Swap(..) => 2,
            _ => 1,
        }
    }

    /// Check if gate is measurement
    pub fn is_measurement(&self) -> bool {
        matches!(self, Gate::Measure(_))
    }

    /// Get gate name
    pub fn name(&self) -> &str {
        match self {
            Gate::H(_) => "H",
            Gate::X(_) => "X",
            Gate::Y(_) => "Y",
            Gate::Z(_) => "Z",
            Gate::Rx(_, _) => "Rx",
            Gate::Ry(_, _) => "Ry",
            Gate::Rz(_, _) => "Rz",
            Gate::CPhase(_, _, _) => "CPhase",
            Gate::Cnot(_, _) => "CNOT",
            Gate::Swap(_, _) => "Swap",
            Gate::Measure(_) => "Measure",
            Gate::Custom { name, .. } => name,
        }
    }

    /// Name used as the noise-channel lookup key
    pub fn canonical_name(&self) -> String {
        canonical_gate_name(self.name())
    }

    /// Inverse gate, when it is expressible as a gate of this enum
    pub fn inverse(&self) -> Option<Gate> {
        match self {
            Gate::H(_) | Gate::X(_) | Gate::Y(_) | Gate::Z(_) => Some(self.clone()),
            Gate::Rx(q, theta) => Some(Gate::Rx(*q, -theta)),
            Gate::Ry(q, theta) => Some(Gate::Ry(*q, -theta)),
            Gate::Rz(q, theta) => Some(Gate::Rz(*q, -theta)),
            Gate::CPhase(c, t, theta) => Some(Gate::CPhase(*c, *t, -theta)),
            Gate::Cnot(_, _) | Gate::Swap(_, _) => Some(self.clone()),
            Gate::Measure(_) => None,
            Gate::Custom {
                name,
                qubits,
                params,
            } => {
                let inverse_name = match canonical_gate_name(name).as_str() {
                    "I" | "CZ" | "CCX" => name.clone(),
                    "S" => "Sdg".to_string(),
                    "SDG" => "S".to_string(),
                    "T" => "Tdg".to_string(),
                    "TDG" => "T".to_string(),
                    _ => return None,
                };
                Some(Gate::Custom {
                    name: inverse_name,
                    qubits: qubits.clone(),
                    params: params.clone(),
                })
            }
        }
    }

    // ========================================================================
    // Descriptor Conversion
    // ========================================================================

    /// Resolve a symbolic descriptor into a tagged gate
    /// Gantree: from_descriptor(desc) -> Result<Gate> // 디스크립터 해석
    pub fn from_descriptor(desc: &GateDescriptor) -> SimResult<Self> {
        let canonical = canonical_gate_name(&desc.name);
        let arity = |qubits: usize, params: usize| -> SimResult<()> {
            if desc.qubits.len() != qubits || desc.params.len() != params {
                return Err(SimError::InvalidGateParameter(format!(
                    "{} expects {} qubit(s) and {} parameter(s), got {} and {}",
                    desc.name,
                    qubits,
                    params,
                    desc.qubits.len(),
                    desc.params.len()
                )));
            }
            Ok(())
        };
        let q = &desc.qubits;
        let p = &desc.params;

        let gate = match canonical.as_str() {
            "H" => {
                arity(1, 0)?;
                Gate::H(q[0])
            }
            "X" => {
                arity(1, 0)?;
                Gate::X(q[0])
            }
            "Y" => {
                arity(1, 0)?;
                Gate::Y(q[0])
            }
            "Z" => {
                arity(1, 0)?;
                Gate::Z(q[0])
            }
            "RX" => {
                arity(1, 1)?;
                Gate::Rx(q[0], p[0])
            }
            "RY" => {
                arity(1, 1)?;
                Gate::Ry(q[0], p[0])
            }
            "RZ" => {
                arity(1, 1)?;
                Gate::Rz(q[0], p[0])
            }
            "CPHASE" => {
                arity(2, 1)?;
                Gate::CPhase(q[0], q[1], p[0])
            }
            "CNOT" => {
                arity(2, 0)?;
                Gate::Cnot(q[0], q[1])
            }
            "SWAP" => {
                arity(2, 0)?;
                Gate::Swap(q[0], q[1])
            }
            "MEASURE" => {
                arity(1, 0)?;
                Gate::Measure(q[0])
            }
            _ => {
                if desc.qubits.is_empty() {
                    return Err(SimError::InvalidGateParameter(format!(
                        "{} has no target qubits",
                        desc.name
                    )));
                }
                Gate::Custom {
                    name: desc.name.clone(),
                    qubits: desc.qubits.clone(),
                    params: desc.params.clone(),
                }
            }
        };
        Ok(gate)
    }

    /// Symbolic form of this gate
    pub fn to_descriptor(&self) -> GateDescriptor {
        GateDescriptor {
            name: self.name().to_string(),
            qubits: self.qubits(),
            params: self.params(),
        }
    }
}

impl fmt::Display for Gate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_descriptor())
    }
}

/// Normalize a gate name for catalog and noise lookups
///
/// Case-insensitive; `CX` maps to `CNOT`, `HADAMARD` to `H`, `CP`/`CU1` to
/// `CPHASE`, `TOFFOLI` to `CCX`.
pub fn canonical_gate_name(name: &str) -> String {
    let upper = name.trim().to_ascii_uppercase();
    match upper.as_str() {
        "CX" | "CNOT" => "CNOT".to_string(),
        "HADAMARD" => "H".to_string(),
        "CP" | "CU1" | "CPHASE" => "CPHASE".to_string(),
        "TOFFOLI" | "CCNOT" => "CCX".to_string(),
        "ID" | "IDENTITY" => "I".to_string(),
        "MZ" => "MEASURE".to_string(),
        _ => upper,
    }
}

// ============================================================================
// Gate Descriptor
// ============================================================================

/// Symbolic gate as produced by the instruction source
/// Gantree: GateDescriptor // 이름+큐비트+파라미터
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateDescriptor {
    /// Symbolic gate name
    pub name: String,
    /// Target qubit indices
    pub qubits: Vec<QubitId>,
    /// Continuous parameters (rotation angles)
    #[serde(default)]
    pub params: Vec<Angle>,
}

impl GateDescriptor {
    /// Create a descriptor
    pub fn new(name: impl Into<String>, qubits: Vec<QubitId>, params: Vec<Angle>) -> Self {
        Self {
            name: name.into(),
            qubits,
            params,
        }
    }
}

impl fmt::Display for GateDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if !self.params.is_empty() {
            let params: Vec<String> = self.params.iter().map(|p| p.to_string()).collect();
            write!(f, "({})", params.join(","))?;
        }
        let qubits: Vec<String> = self.qubits.iter().map(|q| format!("q[{}]", q)).collect();
        write!(f, " {}", qubits.join(","))
    }
}

// ============================================================================
// Instruction
// ============================================================================

/// One instruction delivered by the instruction source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instruction {
    /// Resolved gate
    pub gate: Gate,
    /// Disabled instructions are skipped by the visitor
    pub enabled: bool,
}

impl Instruction {
    /// Enabled instruction
    pub fn new(gate: Gate) -> Self {
        Self {
            gate,
            enabled: true,
        }
    }

    /// Instruction that the visitor skips
    pub fn disabled(gate: Gate) -> Self {
        Self {
            gate,
            enabled: false,
        }
    }

    /// Resolve a descriptor into an instruction
    pub fn from_descriptor(desc: &GateDescriptor, enabled: bool) -> SimResult<Self> {
        Ok(Self {
            gate: Gate::from_descriptor(desc)?,
            enabled,
        })
    }
}

impl From<Gate> for Instruction {
    fn from(gate: Gate) -> Self {
        Self::new(gate)
    }
}

// ============================================================================
// Tests
// ============================================================================
