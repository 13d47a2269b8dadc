//! Visitor configuration
//!
//! Gantree: L3_Backend → VisitorConfig
//!
//! Fixed when a visitor is constructed; nothing here changes mid-circuit.

use serde::{Deserialize, Serialize};
use std::fmt;
use tnsim_core::constants::tensor::{DEFAULT_INITIAL_VALENCE, DEFAULT_MAX_TENSOR_ELEMENTS};
use tnsim_core::constants::tolerance;
use tnsim_core::{SimError, SimResult};
use tnsim_tensor::ContractionOrder;

/// What the network represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimulationMode {
    /// Pure state; gate noise is skipped
    #[default]
    WaveFunction,
    /// Ket/bra doubled network over a ring of 2n sites
    DensityMatrix,
    /// Pure state with one sampled Kraus operator per channel
    Trajectory,
}

/// When contractions happen
/// Gantree: EvaluationStrategy // Eager | Lazy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationStrategy {
    /// Contract after every gate, back to ring form
    Eager,
    /// Grow one network and contract at finalize
    #[default]
    Lazy,
}

impl fmt::Display for SimulationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimulationMode::WaveFunction => write!(f, "wave_function"),
            SimulationMode::DensityMatrix => write!(f, "density_matrix"),
            SimulationMode::Trajectory => write!(f, "trajectory"),
        }
    }
}

impl fmt::Display for EvaluationStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvaluationStrategy::Eager => write!(f, "eager"),
            EvaluationStrategy::Lazy => write!(f, "lazy"),
        }
    }
}

/// Circuit visitor configuration
/// Gantree: VisitorConfig // 방문자 설정
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisitorConfig {
    // ========================================================================
    // Simulation
    // ========================================================================
    /// State representation
    pub mode: SimulationMode,

    /// Eager or lazy contraction
    pub evaluation: EvaluationStrategy,

    /// Pair-selection strategy for contraction
    pub contraction: ContractionOrder,

    // ========================================================================
    // Resources
    // ========================================================================
    /// Bond dimension of the initial ring
    pub initial_valence: usize,

    /// Largest intermediate tensor a contraction may build
    pub max_tensor_elements: usize,

    // ========================================================================
    // Numerics
    // ========================================================================
    /// Relative cutoff when refactoring a contraction result into a ring
    pub rank_tolerance: f64,

    /// Trace and Hermiticity tolerance checked after each epoch
    pub invariant_tolerance: f64,

    /// Seed for trajectory and shot sampling
    pub seed: Option<u64>,
}

impl Default for VisitorConfig {
    fn default() -> Self {
        Self {
            mode: SimulationMode::default(),
            evaluation: EvaluationStrategy::default(),
            contraction: ContractionOrder::default(),
            initial_valence: DEFAULT_INITIAL_VALENCE,
            max_tensor_elements: DEFAULT_MAX_TENSOR_ELEMENTS,
            rank_tolerance: tolerance::RANK,
            invariant_tolerance: tolerance::INVARIANT,
            seed: None,
        }
    }
}

impl VisitorConfig {
    // ========================================================================
    // Constructors
    // ========================================================================

    /// Pure-state configuration
    pub fn wave_function() -> Self {
        Self::default()
    }

    /// Density-matrix configuration
    pub fn density_matrix() -> Self {
        Self {
            mode: SimulationMode::DensityMatrix,
            ..Self::default()
        }
    }

    /// Trajectory configuration, seeded
    pub fn trajectory(seed: u64) -> Self {
        Self {
            mode: SimulationMode::Trajectory,
            seed: Some(seed),
            ..Self::default()
        }
    }

    /// Parse from JSON; absent fields take their defaults
    pub fn from_json(json: &str) -> SimResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    // ========================================================================
    // Builder Methods
    // ========================================================================

    /// Set simulation mode
    pub fn with_mode(mut self, mode: SimulationMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set evaluation strategy
    pub fn with_evaluation(mut self, evaluation: EvaluationStrategy) -> Self {
        self.evaluation = evaluation;
        self
    }

    /// Set contraction order
    pub fn with_contraction(mut self, contraction: ContractionOrder) -> Self {
        self.contraction = contraction;
        self
    }

    /// Set initial bond dimension
    pub fn with_initial_valence(mut self, valence: usize) -> Self {
        self.initial_valence = valence;
        self
    }

    /// Set intermediate tensor limit
    pub fn with_max_tensor_elements(mut self, limit: usize) -> Self {
        self.max_tensor_elements = limit;
        self
    }

    /// Set invariant tolerance
    pub fn with_invariant_tolerance(mut self, tol: f64) -> Self {
        self.invariant_tolerance = tol;
        self
    }

    /// Set seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    // ========================================================================
    // Validation
    // ========================================================================

    /// Validate configuration
    pub fn validate(&self) -> SimResult<()> {
        if self.initial_valence == 0 {
            return Err(SimError::InvalidConfig(
                "initial_valence must be >= 1".to_string(),
            ));
        }

        if self.max_tensor_elements == 0 {
            return Err(SimError::InvalidConfig(
                "max_tensor_elements must be > 0".to_string(),
            ));
        }

        if !(0.0..1.0).contains(&self.rank_tolerance) {
            return Err(SimError::InvalidConfig(format!(
                "rank_tolerance must be in [0, 1), got {}",
                self.rank_tolerance
            )));
        }

        if self.invariant_tolerance.is_nan() || self.invariant_tolerance <= 0.0 {
            return Err(SimError::InvalidConfig(format!(
                "invariant_tolerance must be > 0, got {}",
                self.invariant_tolerance
            )));
        }

        Ok(())
    }
}

impl fmt::Display for VisitorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "VisitorConfig(mode={}, evaluation={}, contraction={})",
            self.mode, self.evaluation, self.contraction
        )
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = VisitorConfig::default();
        assert_eq!(config.mode, SimulationMode::WaveFunction);
        assert_eq!(config.evaluation, EvaluationStrategy::Lazy);
        assert_eq!(config.contraction, ContractionOrder::RingFirst);
        assert_eq!(config.initial_valence, 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let config = VisitorConfig::density_matrix()
            .with_evaluation(EvaluationStrategy::Eager)
            .with_contraction(ContractionOrder::LowestIdFirst)
            .with_seed(7);
        assert_eq!(config.mode, SimulationMode::DensityMatrix);
        assert_eq!(config.evaluation, EvaluationStrategy::Eager);
        assert_eq!(config.seed, Some(7));
    }

    #[test]
    fn test_validation() {
        assert!(matches!(
            VisitorConfig::default().with_initial_valence(0).validate(),
            Err(SimError::InvalidConfig(_))
        ));
        assert!(VisitorConfig::default()
            .with_invariant_tolerance(0.0)
            .validate()
            .is_err());
        assert!(VisitorConfig::default()
            .with_max_tensor_elements(0)
            .validate()
            .is_err());
    }

    #[test]
    fn test_from_json_partial() {
        let config =
            VisitorConfig::from_json(r#"{"mode": "trajectory", "evaluation": "eager", "seed": 3}"#)
                .unwrap();
        assert_eq!(config.mode, SimulationMode::Trajectory);
        assert_eq!(config.evaluation, EvaluationStrategy::Eager);
        assert_eq!(config.seed, Some(3));
        assert_eq!(config.max_tensor_elements, DEFAULT_MAX_TENSOR_ELEMENTS);

        assert!(VisitorConfig::from_json(r#"{"initial_valence": 0}"#).is_err());
        assert!(VisitorConfig::from_json(r#"{"mode": "quantum"}"#).is_err());
    }

    #[test]
    fn test_display() {
        let s = VisitorConfig::default().to_string();
        assert!(s.contains("wave_function"));
        assert!(s.contains("lazy"));
    }
}
