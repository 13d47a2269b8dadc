//! Tensor-network simulator backend
//!
//! Gantree: L3_Backend → TensorNetworkSimulator
//!
//! Owns the gate catalog, the optional noise model and the visitor
//! configuration; each run gets a fresh visitor.

use crate::config::{SimulationMode, VisitorConfig};
use crate::execution::{Backend, ExecutionMetadata, ExecutionResult};
use crate::result::SimulationResult;
use crate::visitor::CircuitVisitor;
use rand::prelude::*;
use rand::rngs::StdRng;
use std::collections::HashMap;
use std::time::Instant;
use tnsim_core::{Counts, GateDescriptor, Instruction, SimError, SimResult};
use tnsim_noise::NoiseChannelModel;
use tnsim_tensor::GateCatalog;

/// Simulator backend over tensor networks
/// Gantree: TensorNetworkSimulator // 시뮬레이터 구현
pub struct TensorNetworkSimulator {
    /// Backend name
    name: String,

    /// Visitor configuration
    config: VisitorConfig,

    /// Gate matrices
    catalog: GateCatalog,

    /// Noise model
    noise_model: Option<NoiseChannelModel>,
}

impl TensorNetworkSimulator {
    // ========================================================================
    // Constructors
    // ========================================================================

    /// Create a simulator with `config`
    pub fn new(config: VisitorConfig) -> Self {
        Self {
            name: "tnsim_simulator".to_string(),
            config,
            catalog: GateCatalog::new(),
            noise_model: None,
        }
    }

    /// Create ideal (noiseless) simulator
    pub fn ideal() -> Self {
        Self::new(VisitorConfig::default())
    }

    /// Attach a noise model
    pub fn with_noise_model(mut self, model: NoiseChannelModel) -> Self {
        self.noise_model = Some(model);
        self
    }

    /// Replace the gate catalog
    pub fn with_catalog(mut self, catalog: GateCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    /// Set seed for reproducibility
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.config.seed = Some(seed);
        self
    }

    /// Set backend name
    pub fn with_name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Configuration as given
    pub fn config(&self) -> &VisitorConfig {
        &self.config
    }

    /// Gate catalog, for registering custom gates
    pub fn catalog_mut(&mut self) -> &mut GateCatalog {
        &mut self.catalog
    }

    /// Attached noise model
    pub fn noise_model(&self) -> Option<&NoiseChannelModel> {
        self.noise_model.as_ref()
    }

    /// Configuration a run actually uses
    ///
    /// Gate noise cannot be represented by a pure state, so wave-function
    /// mode is promoted to density-matrix mode when the model has any.
    pub fn effective_config(&self) -> VisitorConfig {
        let noisy = self
            .noise_model
            .as_ref()
            .map(|m| m.has_gate_noise())
            .unwrap_or(false);
        if noisy && self.config.mode == SimulationMode::WaveFunction {
            self.config.clone().with_mode(SimulationMode::DensityMatrix)
        } else {
            self.config.clone()
        }
    }

    // ========================================================================
    // Simulation
    // ========================================================================

    fn run_with(
        &self,
        num_qubits: usize,
        instructions: &[Instruction],
        config: VisitorConfig,
    ) -> SimResult<SimulationResult> {
        let mut visitor = CircuitVisitor::new(num_qubits, config, &self.catalog)?;
        if let Some(model) = &self.noise_model {
            visitor = visitor.with_noise_model(model);
        }
        visitor.visit_all(instructions)?;
        visitor.finalize()
    }

    /// Simulate an instruction stream
    /// Gantree: run(n, instructions) -> Result<SimulationResult> // 실행
    pub fn run(&self, num_qubits: usize, instructions: &[Instruction]) -> SimResult<SimulationResult> {
        let config = self.effective_config();
        log::info!(
            "running {} instruction(s) on {} qubit(s) with {}",
            instructions.len(),
            num_qubits,
            config
        );
        self.run_with(num_qubits, instructions, config)
    }

    /// Simulate descriptors from an external instruction source
    pub fn run_descriptors(
        &self,
        num_qubits: usize,
        descriptors: &[GateDescriptor],
    ) -> SimResult<SimulationResult> {
        let instructions = descriptors
            .iter()
            .map(|d| Instruction::from_descriptor(d, true))
            .collect::<SimResult<Vec<_>>>()?;
        self.run(num_qubits, &instructions)
    }

    /// One trajectory per shot, each sampled once
    fn sample_trajectories(
        &self,
        num_qubits: usize,
        instructions: &[Instruction],
        shots: u64,
        rng: &mut StdRng,
        warnings: &mut Vec<String>,
    ) -> SimResult<Counts> {
        let mut counts: Counts = HashMap::new();
        for _ in 0..shots {
            let config = self.effective_config().with_seed(rng.gen());
            let result = self.run_with(num_qubits, instructions, config)?;
            warnings.extend(result.warnings().iter().map(|w| w.to_string()));
            for (bitstring, n) in result.sample_counts(1, rng)? {
                *counts.entry(bitstring).or_insert(0) += n;
            }
        }
        Ok(counts)
    }
}

impl Default for TensorNetworkSimulator {
    fn default() -> Self {
        Self::ideal()
    }
}

impl Backend for TensorNetworkSimulator {
    fn name(&self) -> &str {
        &self.name
    }

    fn execute(
        &self,
        num_qubits: usize,
        instructions: &[Instruction],
        shots: u64,
    ) -> SimResult<ExecutionResult> {
        if shots > self.max_shots() {
            return Err(SimError::InvalidConfig(format!(
                "{} shots requested, {} allows at most {}",
                shots,
                self.name,
                self.max_shots()
            )));
        }
        let start = Instant::now();
        let config = self.effective_config();
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let mut warnings = Vec::new();
        let counts = if config.mode == SimulationMode::Trajectory {
            self.sample_trajectories(num_qubits, instructions, shots, &mut rng, &mut warnings)?
        } else {
            let result = self.run(num_qubits, instructions)?;
            warnings.extend(result.warnings().iter().map(|w| w.to_string()));
            result.sample_counts(shots, &mut rng)?
        };

        Ok(ExecutionResult {
            counts,
            shots,
            metadata: ExecutionMetadata {
                backend: self.name.clone(),
                mode: config.mode.to_string(),
                execution_time_ms: Some(start.elapsed().as_millis() as u64),
                seed: config.seed,
                warnings,
                extra: HashMap::from([
                    ("evaluation".to_string(), config.evaluation.to_string()),
                    ("contraction".to_string(), config.contraction.to_string()),
                ]),
            },
        })
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use tnsim_core::Gate;
    use tnsim_noise::NoiseChannel;

    fn bell() -> Vec<Instruction> {
        vec![
            Gate::H(0).into(),
            Gate::Cnot(0, 1).into(),
            Gate::Measure(0).into(),
            Gate::Measure(1).into(),
        ]
    }

    #[test]
    fn test_simulator_ideal() {
        let backend = TensorNetworkSimulator::ideal().with_seed(42);
        let result = backend.execute(2, &bell(), 1000).unwrap();
        assert_eq!(result.total_counts(), 1000);
        assert!(result.counts.keys().all(|k| k == "00" || k == "11"));
        assert_eq!(result.metadata.mode, "wave_function");
    }

    #[test]
    fn test_noise_promotes_to_density_matrix() {
        let model = NoiseChannelModel::ideal()
            .with_channel(NoiseChannel::amplitude_damping("H", 0, 0.5).unwrap());
        let backend = TensorNetworkSimulator::ideal().with_noise_model(model);
        assert_eq!(backend.effective_config().mode, SimulationMode::DensityMatrix);
        let result = backend.run(1, &[Gate::H(0).into()]).unwrap();
        assert!(result.wavefunction().is_none());
        assert_eq!(result.stats().channels_applied, 1);
        // half of the |1> population decays
        assert_abs_diff_eq!(result.probabilities()[0], 0.75, epsilon = 1e-10);
    }

    #[test]
    fn test_readout_only_keeps_wave_function() {
        let model = NoiseChannelModel::ideal()
            .with_readout_error(tnsim_noise::ReadoutErrorRecord::new(0, 0.1, 0.2).unwrap());
        let backend = TensorNetworkSimulator::ideal().with_noise_model(model);
        assert_eq!(backend.effective_config().mode, SimulationMode::WaveFunction);
    }

    #[test]
    fn test_seed_reproducibility() {
        let model = NoiseChannelModel::ideal()
            .with_channel(NoiseChannel::bit_flip("H", 0, 0.3).unwrap());
        let backend1 = TensorNetworkSimulator::new(VisitorConfig::trajectory(7))
            .with_noise_model(model.clone());
        let backend2 =
            TensorNetworkSimulator::new(VisitorConfig::trajectory(7)).with_noise_model(model);
        let r1 = backend1.execute(2, &bell(), 50).unwrap();
        let r2 = backend2.execute(2, &bell(), 50).unwrap();
        assert_eq!(r1.counts, r2.counts);
        assert_eq!(r1.total_counts(), 50);
    }

    #[test]
    fn test_shot_limit_enforced() {
        let backend = TensorNetworkSimulator::ideal().with_seed(1);
        let limit = backend.max_shots();
        assert!(matches!(
            backend.execute(2, &bell(), limit + 1),
            Err(SimError::InvalidConfig(_))
        ));
        assert_eq!(backend.execute(2, &bell(), 10).unwrap().total_counts(), 10);
    }

    #[test]
    fn test_execute_batch() {
        let backend = TensorNetworkSimulator::ideal().with_seed(3);
        let flipped: Vec<Instruction> =
            vec![Gate::X(1).into(), Gate::Measure(0).into(), Gate::Measure(1).into()];
        let results = backend.execute_batch(2, &[bell(), flipped], 200).unwrap();
        assert_eq!(results.len(), 2);
        assert!(results[0].counts.keys().all(|k| k == "00" || k == "11"));
        assert_eq!(results[1].counts.get("01"), Some(&200));

        let too_many = backend.execute_batch(2, &[bell()], backend.max_shots() + 1);
        assert!(too_many.is_err());
    }

    #[test]
    fn test_run_descriptors() {
        let descs = vec![
            GateDescriptor::new("h", vec![0], vec![]),
            GateDescriptor::new("cx", vec![0, 1], vec![]),
        ];
        let result = TensorNetworkSimulator::ideal().run_descriptors(2, &descs).unwrap();
        assert_abs_diff_eq!(result.probabilities()[0b11], 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_custom_gate_registration() {
        let mut backend = TensorNetworkSimulator::ideal();
        let x = backend.catalog_mut().matrix("X", &[]).unwrap();
        backend.catalog_mut().register("MYX", 1, x).unwrap();
        let gate = Gate::Custom {
            name: "MYX".to_string(),
            qubits: vec![1],
            params: vec![],
        };
        let result = backend.run(2, &[gate.into()]).unwrap();
        assert_abs_diff_eq!(result.probabilities()[0b01], 1.0, epsilon = 1e-12);
    }
}
