//! Circuit visitor
//!
//! Gantree: L3_Backend → CircuitVisitor
//!
//! Consumes instructions one at a time, appends gate and noise tensors to
//! the network, and closes contraction epochs back into ring form.
//!
//! ## Modes
//!
//! - `WaveFunction`: ring of n sites; gate noise is skipped.
//! - `DensityMatrix`: ring of 2n sites. Ket legs are `0..n`, bra legs
//!   `n..2n`. Every gate `G` on ket legs gets `conj(G)` on the matching bra
//!   legs; every channel appends its stacked Kraus tensor on the ket side and
//!   its conjugate on the bra side, joined by a shared Kraus-index leg.
//! - `Trajectory`: ring of n sites; at each channel the state is contracted
//!   and one Kraus operator `K` is drawn with probability `||K psi||^2`.

use crate::config::{EvaluationStrategy, SimulationMode, VisitorConfig};
use crate::density::DensityMatrix;
use crate::result::{FinalState, QualityWarning, SimulationResult, VisitorStats};
use num_complex::Complex64;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tnsim_core::{Gate, Instruction, QubitId, SimError, SimResult};
use tnsim_noise::{NoiseChannel, NoiseChannelModel, ReadoutErrorRecord};
use tnsim_tensor::{
    ContractionStrategy, GateCatalog, MpsRing, NodeKind, PendingTensor, Tensor, TensorLeg,
    TensorNetwork,
};

/// Instruction visitor over one tensor network
/// Gantree: CircuitVisitor // 회로 방문자
pub struct CircuitVisitor<'a> {
    num_qubits: usize,
    config: VisitorConfig,
    catalog: &'a GateCatalog,
    noise: Option<&'a NoiseChannelModel>,
    state: MpsRing,
    network: TensorNetwork,
    strategy: Box<dyn ContractionStrategy>,
    rng: StdRng,
    started: bool,
    failed: Option<SimError>,
    measured: Vec<QubitId>,
    warnings: Vec<QualityWarning>,
    stats: VisitorStats,
}

impl<'a> CircuitVisitor<'a> {
    // ========================================================================
    // Constructors
    // ========================================================================

    /// Visitor over `num_qubits` qubits in |0...0>
    /// Gantree: new(n, config, catalog) -> Result<Self> // 생성
    pub fn new(num_qubits: usize, config: VisitorConfig, catalog: &'a GateCatalog) -> SimResult<Self> {
        config.validate()?;
        if num_qubits == 0 {
            return Err(SimError::InvalidConfig(
                "at least one qubit is required".to_string(),
            ));
        }
        let sites = match config.mode {
            SimulationMode::DensityMatrix => 2 * num_qubits,
            SimulationMode::WaveFunction | SimulationMode::Trajectory => num_qubits,
        };
        let state = MpsRing::new(sites, config.initial_valence)?;
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Ok(Self {
            num_qubits,
            network: TensorNetwork::with_max_elements(config.max_tensor_elements),
            strategy: config.contraction.strategy(),
            config,
            catalog,
            noise: None,
            state,
            rng,
            started: false,
            failed: None,
            measured: Vec::new(),
            warnings: Vec::new(),
            stats: VisitorStats::default(),
        })
    }

    /// Attach a noise model
    pub fn with_noise_model(mut self, model: &'a NoiseChannelModel) -> Self {
        self.noise = Some(model);
        self
    }

    /// Change eager/lazy evaluation before the first instruction
    ///
    /// Fails with `EvaluationStrategyLocked` once the network holds tensors
    /// or any gate has been applied.
    pub fn with_evaluation_strategy(&mut self, evaluation: EvaluationStrategy) -> SimResult<()> {
        if self.started || !self.network.is_empty() {
            return Err(SimError::EvaluationStrategyLocked);
        }
        self.config.evaluation = evaluation;
        Ok(())
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Number of logical qubits
    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    /// Configuration in effect
    pub fn config(&self) -> &VisitorConfig {
        &self.config
    }

    /// Ring state as of the last closed epoch
    pub fn state(&self) -> &MpsRing {
        &self.state
    }

    /// Network of the current epoch
    pub fn network(&self) -> &TensorNetwork {
        &self.network
    }

    /// Counters so far
    pub fn stats(&self) -> VisitorStats {
        self.stats
    }

    /// Quality warnings so far
    pub fn warnings(&self) -> &[QualityWarning] {
        &self.warnings
    }

    /// Measured qubits, deduplicated, in order
    pub fn measured_qubits(&self) -> &[QubitId] {
        &self.measured
    }

    /// Error that ended the run, if an epoch failed to close
    pub fn failure(&self) -> Option<&SimError> {
        self.failed.as_ref()
    }

    /// A failed epoch loses its tensors; every later call reports it
    fn check_failed(&self) -> SimResult<()> {
        match &self.failed {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    // ========================================================================
    // Network Construction
    // ========================================================================

    /// Materialize the output tensor and the ring
    ///
    /// Runs once per epoch; fails with `NetworkAlreadyBuilt` otherwise.
    /// Gantree: build_wave_function_network() -> Result<()> // 링 네트워크
    pub fn build_wave_function_network(&mut self) -> SimResult<()> {
        self.check_failed()?;
        self.state.build_network(&mut self.network)
    }

    fn ensure_network(&mut self) -> SimResult<()> {
        if self.network.is_empty() {
            self.build_wave_function_network()?;
        }
        Ok(())
    }

    fn check_qubits(&self, qubits: &[QubitId]) -> SimResult<()> {
        for (i, &q) in qubits.iter().enumerate() {
            if q >= self.num_qubits {
                return Err(SimError::QubitOutOfRange {
                    qubit: q,
                    open_legs: self.num_qubits,
                });
            }
            if qubits[..i].contains(&q) {
                return Err(SimError::DuplicateQubit(q));
            }
        }
        Ok(())
    }

    /// `[out.., in..]` legs of an operator on `qubits`, shifted by `offset`
    /// output legs (0 for ket, n for bra)
    fn frontier_legs(&self, qubits: &[QubitId], offset: usize) -> SimResult<Vec<TensorLeg>> {
        let mut legs: Vec<TensorLeg> = qubits
            .iter()
            .map(|&q| TensorLeg::output(q + offset))
            .collect();
        for &q in qubits {
            legs.push(self.network.open_leg(q + offset)?);
        }
        Ok(legs)
    }

    // ========================================================================
    // Gate Application
    // ========================================================================

    fn append_gate(&mut self, gate: Tensor, qubits: &[QubitId]) -> SimResult<()> {
        self.check_failed()?;
        if gate.rank() != 2 * qubits.len() {
            return Err(SimError::RankMismatch {
                expected: 2 * qubits.len(),
                actual: gate.rank(),
            });
        }
        self.check_qubits(qubits)?;
        self.ensure_network()?;
        self.started = true;

        let ket_legs = self.frontier_legs(qubits, 0)?;
        if self.config.mode == SimulationMode::DensityMatrix {
            let bra = gate.conj();
            let bra_legs = self.frontier_legs(qubits, self.num_qubits)?;
            self.network.append_tensors(vec![
                PendingTensor::new(gate, ket_legs, NodeKind::Gate),
                PendingTensor::new(bra, bra_legs, NodeKind::Gate),
            ])?;
        } else {
            self.network.append_tensor(gate, ket_legs, NodeKind::Gate)?;
        }
        self.stats.gates_applied += 1;
        log::debug!("applied {}-body gate on {:?}", qubits.len(), qubits);
        Ok(())
    }

    fn evaluate_if_eager(&mut self) -> SimResult<()> {
        if self.config.evaluation == EvaluationStrategy::Eager {
            self.evaluate()?;
        }
        Ok(())
    }

    /// Append a rank-2 gate on `qubit`
    /// Gantree: apply_1body_gate(gate, q) -> Result<()> // 1큐비트 게이트
    pub fn apply_1body_gate(&mut self, gate: Tensor, qubit: QubitId) -> SimResult<()> {
        if gate.rank() != 2 {
            return Err(SimError::RankMismatch {
                expected: 2,
                actual: gate.rank(),
            });
        }
        self.append_gate(gate, &[qubit])?;
        self.evaluate_if_eager()
    }

    /// Append a rank-4 gate on `(q0, q1)`, `q0` the most significant index
    /// Gantree: apply_2body_gate(gate, q0, q1) -> Result<()> // 2큐비트 게이트
    pub fn apply_2body_gate(&mut self, gate: Tensor, q0: QubitId, q1: QubitId) -> SimResult<()> {
        if gate.rank() != 4 {
            return Err(SimError::RankMismatch {
                expected: 4,
                actual: gate.rank(),
            });
        }
        self.append_gate(gate, &[q0, q1])?;
        self.evaluate_if_eager()
    }

    /// Append a rank-2k gate on k qubits
    pub fn apply_nbody_gate(&mut self, gate: Tensor, qubits: &[QubitId]) -> SimResult<()> {
        self.append_gate(gate, qubits)?;
        self.evaluate_if_eager()
    }

    // ========================================================================
    // Instruction Visitation
    // ========================================================================

    /// Visit one instruction; disabled instructions are skipped
    /// Gantree: visit(instruction) -> Result<()> // 명령 방문
    pub fn visit(&mut self, instruction: &Instruction) -> SimResult<()> {
        self.check_failed()?;
        let gate = &instruction.gate;
        if !instruction.enabled {
            self.stats.instructions_skipped += 1;
            log::debug!("skipping disabled {}", gate);
            return Ok(());
        }

        match gate {
            Gate::Measure(q) => self.measure(*q),
            Gate::H(q) | Gate::X(q) | Gate::Y(q) | Gate::Z(q) => {
                self.visit_unitary(gate, &[*q])
            }
            Gate::Rx(q, _) | Gate::Ry(q, _) | Gate::Rz(q, _) => self.visit_unitary(gate, &[*q]),
            Gate::CPhase(a, b, _) | Gate::Cnot(a, b) | Gate::Swap(a, b) => {
                self.visit_unitary(gate, &[*a, *b])
            }
            Gate::Custom { qubits, .. } => self.visit_unitary(gate, qubits),
        }
    }

    /// Visit instructions in order
    pub fn visit_all(&mut self, instructions: &[Instruction]) -> SimResult<()> {
        for instruction in instructions {
            self.visit(instruction)?;
        }
        Ok(())
    }

    fn visit_unitary(&mut self, gate: &Gate, qubits: &[QubitId]) -> SimResult<()> {
        let tensor = self.catalog.gate_tensor(gate)?;
        self.append_gate(tensor, qubits)?;
        self.apply_noise(gate, qubits)?;
        self.evaluate_if_eager()
    }

    /// Record a terminal measurement
    ///
    /// Measurement is deferred: the network is untouched and outcomes are
    /// read from the final state.
    pub fn measure(&mut self, qubit: QubitId) -> SimResult<()> {
        self.check_failed()?;
        self.check_qubits(&[qubit])?;
        if !self.measured.contains(&qubit) {
            self.measured.push(qubit);
        }
        log::debug!("deferred measurement of qubit {}", qubit);
        Ok(())
    }

    // ========================================================================
    // Noise
    // ========================================================================

    fn apply_noise(&mut self, gate: &Gate, qubits: &[QubitId]) -> SimResult<()> {
        let Some(model) = self.noise else {
            return Ok(());
        };
        let channels = model.channels_for(gate.name(), qubits);
        if channels.is_empty() {
            return Ok(());
        }

        match self.config.mode {
            SimulationMode::WaveFunction => {
                self.stats.channels_skipped += channels.len();
                log::warn!(
                    "skipping {} noise channel(s) after {} in wave-function mode",
                    channels.len(),
                    gate
                );
            }
            SimulationMode::DensityMatrix => {
                for channel in channels {
                    self.append_kraus_pair(channel)?;
                    self.stats.channels_applied += 1;
                }
            }
            SimulationMode::Trajectory => {
                for channel in channels {
                    self.sample_kraus(channel)?;
                    self.stats.channels_applied += 1;
                }
            }
        }
        Ok(())
    }

    /// Append `channel` on ket and bra legs, joined by the Kraus index
    /// Gantree: append_kraus_pair(channel) -> Result<()> // 크라우스 쌍
    fn append_kraus_pair(&mut self, channel: &NoiseChannel) -> SimResult<()> {
        let qubits = channel.qubits();
        self.check_qubits(qubits)?;
        self.ensure_network()?;

        let kraus_leg = 2 * qubits.len();
        let ket = channel.stacked_tensor()?;
        let bra = ket.conj();
        let base = self.network.next_id();

        let mut ket_legs = self.frontier_legs(qubits, 0)?;
        ket_legs.push(TensorLeg::new(base + 1, kraus_leg));
        let mut bra_legs = self.frontier_legs(qubits, self.num_qubits)?;
        bra_legs.push(TensorLeg::new(base, kraus_leg));

        self.network.append_tensors(vec![
            PendingTensor::new(ket, ket_legs, NodeKind::Noise),
            PendingTensor::new(bra, bra_legs, NodeKind::Noise),
        ])?;
        log::debug!("appended {}", channel);
        Ok(())
    }

    /// Contract, draw one Kraus branch and continue from it, renormalized
    /// Gantree: sample_kraus(channel) -> Result<()> // 궤적 샘플링
    fn sample_kraus(&mut self, channel: &NoiseChannel) -> SimResult<()> {
        self.check_qubits(channel.qubits())?;
        let psi = self.evaluate()?;

        let mut branches = Vec::with_capacity(channel.num_kraus());
        let mut total = 0.0;
        for op in channel.kraus_operators() {
            let phi = psi.apply_operator(op, channel.qubits())?;
            let weight = phi.norm_squared();
            total += weight;
            branches.push((phi, weight));
        }
        if total <= 0.0 {
            return Err(SimError::NumericalInvariant(format!(
                "{} maps the state to zero",
                channel
            )));
        }

        let r: f64 = self.rng.gen::<f64>() * total;
        let mut cumsum = 0.0;
        let mut chosen = None;
        for (i, (_, weight)) in branches.iter().enumerate() {
            cumsum += weight;
            if r < cumsum {
                chosen = Some(i);
                break;
            }
        }
        let index = chosen
            .or_else(|| branches.iter().rposition(|(_, w)| *w > 0.0))
            .ok_or_else(|| SimError::NumericalInvariant(format!("no branch of {}", channel)))?;

        let (mut phi, weight) = branches.swap_remove(index);
        phi.scale(Complex64::new(1.0 / weight.sqrt(), 0.0));
        self.state = MpsRing::from_state_tensor(&phi, self.config.rank_tolerance)?;
        log::debug!(
            "trajectory took Kraus operator {} of {} (p = {:.4})",
            index,
            channel,
            weight / total
        );
        Ok(())
    }

    // ========================================================================
    // Evaluation
    // ========================================================================

    /// Close the epoch: contract, check invariants, refactor into the ring
    ///
    /// Returns the contracted tensor: amplitudes (rank n) or the density
    /// matrix (rank 2n, ket legs first). With nothing appended this epoch
    /// the ring itself is contracted and no epoch is counted.
    ///
    /// A failed contraction consumes the epoch's tensors, so the visitor
    /// keeps the error and returns it from every later call.
    /// Gantree: evaluate() -> Result<Tensor> // 에폭 종료
    pub fn evaluate(&mut self) -> SimResult<Tensor> {
        self.check_failed()?;
        if self.network.is_empty() {
            return self.state.to_state_tensor(self.strategy.as_ref());
        }
        let contracted = self.network.contract(self.strategy.as_ref());
        let result = match contracted {
            Ok(tensor) => tensor,
            Err(err) => return Err(self.fail(err)),
        };
        self.stats.epochs_closed += 1;
        self.check_epoch(&result);
        self.state = match MpsRing::from_state_tensor(&result, self.config.rank_tolerance) {
            Ok(ring) => ring,
            Err(err) => return Err(self.fail(err)),
        };
        log::info!(
            "closed epoch {} (max bond dimension {})",
            self.stats.epochs_closed,
            self.state.max_bond_dimension()
        );
        Ok(result)
    }

    fn fail(&mut self, err: SimError) -> SimError {
        log::error!("epoch {} failed: {}", self.stats.epochs_closed + 1, err);
        self.failed = Some(err.clone());
        err
    }

    fn check_epoch(&mut self, result: &Tensor) {
        let tol = self.config.invariant_tolerance;
        let outcome = match self.config.mode {
            SimulationMode::DensityMatrix => DensityMatrix::from_tensor(result, self.num_qubits)
                .and_then(|rho| rho.check_invariants(tol)),
            SimulationMode::WaveFunction | SimulationMode::Trajectory => {
                let norm = result.norm_squared();
                if (norm - 1.0).abs() > tol {
                    Err(SimError::NumericalInvariant(format!(
                        "norm {:.6e} differs from 1",
                        norm
                    )))
                } else {
                    Ok(())
                }
            }
        };
        if let Err(err) = outcome {
            let warning = QualityWarning {
                epoch: self.stats.epochs_closed,
                message: err.to_string(),
            };
            log::warn!("{}", warning);
            self.warnings.push(warning);
        }
    }

    /// Close the last epoch and assemble the result
    /// Gantree: finalize() -> Result<SimulationResult> // 결과 생성
    pub fn finalize(mut self) -> SimResult<SimulationResult> {
        let tensor = self.evaluate()?;
        let n = self.num_qubits;
        let state = match self.config.mode {
            SimulationMode::DensityMatrix => {
                FinalState::DensityMatrix(DensityMatrix::from_tensor(&tensor, n)?)
            }
            SimulationMode::WaveFunction | SimulationMode::Trajectory => {
                FinalState::WaveFunction(tensor)
            }
        };
        let readout: Vec<ReadoutErrorRecord> = self
            .noise
            .map(|m| m.readout_errors())
            .unwrap_or_default()
            .into_iter()
            .filter(|r| {
                if r.qubit < n {
                    true
                } else {
                    log::warn!("ignoring readout error on qubit {} of {}", r.qubit, n);
                    false
                }
            })
            .collect();
        SimulationResult::new(n, state, self.measured, readout, self.warnings, self.stats)
    }
}

// ============================================================================
// Tests
// ============================================================================
