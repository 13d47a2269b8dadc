//! Backend execution types and traits
//!
//! Gantree: L3_Backend → BackendTrait
//!
//! Sampled execution of an instruction stream: counts over the measured
//! qubits plus run metadata.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use tnsim_core::{Counts, Instruction, SimResult};

/// Result of sampled execution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// Measurement counts (bitstring -> count), qubit order as measured
    pub counts: Counts,

    /// Number of shots executed
    pub shots: u64,

    /// Execution metadata
    pub metadata: ExecutionMetadata,
}

/// Execution metadata
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExecutionMetadata {
    /// Backend name
    pub backend: String,

    /// Simulation mode actually used
    pub mode: String,

    /// Wall-clock time in milliseconds
    pub execution_time_ms: Option<u64>,

    /// Seed used (if any)
    pub seed: Option<u64>,

    /// Quality warnings raised while simulating
    pub warnings: Vec<String>,

    /// Additional info
    pub extra: HashMap<String, String>,
}

impl ExecutionResult {
    /// Create new execution result
    pub fn new(counts: Counts, shots: u64, backend: &str) -> Self {
        Self {
            counts,
            shots,
            metadata: ExecutionMetadata {
                backend: backend.to_string(),
                ..Default::default()
            },
        }
    }

    /// Get total count (should equal shots)
    pub fn total_counts(&self) -> u64 {
        self.counts.values().sum()
    }

    /// Empirical probability of a bitstring
    pub fn probability(&self, bitstring: &str) -> f64 {
        if self.shots == 0 {
            return 0.0;
        }
        let count = self.counts.get(bitstring).copied().unwrap_or(0);
        count as f64 / self.shots as f64
    }

    /// Get most frequent bitstring
    pub fn most_frequent(&self) -> Option<(&String, u64)> {
        self.counts
            .iter()
            .max_by(|(a, ca), (b, cb)| ca.cmp(cb).then_with(|| b.cmp(a)))
            .map(|(bs, &count)| (bs, count))
    }
}

impl fmt::Display for ExecutionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ExecutionResult(shots={}, unique={}, backend={})",
            self.shots,
            self.counts.len(),
            self.metadata.backend
        )
    }
}

/// Simulation backend
/// Gantree: BackendTrait // 백엔드 인터페이스
pub trait Backend: Send + Sync {
    /// Get backend name
    fn name(&self) -> &str;

    /// Run an instruction stream on `num_qubits` qubits and sample it
    /// Gantree: execute(n, instructions, shots) -> Result<ExecutionResult>
    fn execute(
        &self,
        num_qubits: usize,
        instructions: &[Instruction],
        shots: u64,
    ) -> SimResult<ExecutionResult>;

    /// Execute several instruction streams (batch)
    fn execute_batch(
        &self,
        num_qubits: usize,
        circuits: &[Vec<Instruction>],
        shots: u64,
    ) -> SimResult<Vec<ExecutionResult>> {
        circuits
            .iter()
            .map(|c| self.execute(num_qubits, c, shots))
            .collect()
    }

    /// Get maximum shots per execution
    fn max_shots(&self) -> u64 {
        1_000_000
    }
}

// ============================================================================
// Tests
// ============================================================================
