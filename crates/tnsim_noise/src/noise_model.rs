//! Noise channel model and its JSON document
//!
//! Gantree: L2_Noise → NoiseChannelModel
//!
//! Document layout:
//!
//! ```json
//! {
//!   "gate_noise": [
//!     {"gate_name": "X", "register_location": ["0"],
//!      "noise_channels": [{"matrix": [[[[1.0, 0.0], [0.0, 0.0]], [[0.0, 0.0], [1.0, 0.0]]]]}]}
//!   ],
//!   "bit_order": "MSB",
//!   "readout_errors": [
//!     {"register_location": "0", "prob_meas0_prep1": 0.2, "prob_meas1_prep0": 0.1}
//!   ]
//! }
//! ```
//!
//! Each `matrix` entry is one channel's list of Kraus operators, each a list
//! of rows of `[re, im]` pairs.

use crate::bit_order::BitOrder;
use crate::channel::NoiseChannel;
use crate::readout::ReadoutErrorRecord;
use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use tnsim_core::constants::tolerance::KRAUS_COMPLETENESS;
use tnsim_core::{canonical_gate_name, QubitId, SimError, SimResult};

// ============================================================================
// Document Types
// ============================================================================

/// Serialized noise model
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NoiseModelDocument {
    /// Channels per gate and register location
    #[serde(default)]
    pub gate_noise: Vec<GateNoiseEntry>,
    /// `"MSB"` or `"LSB"`; MSB when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bit_order: Option<String>,
    /// Per-qubit readout errors
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub readout_errors: Vec<ReadoutEntry>,
}

/// Noise following one gate on one register location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateNoiseEntry {
    /// Gate name
    pub gate_name: String,
    /// Qubit indices as strings, in the declared bit order
    pub register_location: Vec<String>,
    /// Channels applied in sequence
    pub noise_channels: Vec<ChannelEntry>,
}

/// One channel: Kraus operators as rows of `[re, im]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelEntry {
    /// Kraus operators
    pub matrix: Vec<Vec<Vec<[f64; 2]>>>,
}

/// Readout error of one qubit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadoutEntry {
    /// Qubit index as a string
    pub register_location: String,
    /// P(measure 0 | prepared 1)
    pub prob_meas0_prep1: f64,
    /// P(measure 1 | prepared 0)
    pub prob_meas1_prep0: f64,
}

fn parse_qubit(s: &str) -> SimResult<QubitId> {
    s.trim()
        .parse()
        .map_err(|_| SimError::InvalidNoiseModel(format!("invalid register location '{}'", s)))
}

fn flatten_kraus(rows: Vec<Vec<[f64; 2]>>, dim: usize) -> SimResult<Vec<Complex64>> {
    if rows.len() != dim || rows.iter().any(|r| r.len() != dim) {
        return Err(SimError::InvalidNoiseModel(format!(
            "Kraus operator must be {}x{}",
            dim, dim
        )));
    }
    Ok(rows
        .into_iter()
        .flatten()
        .map(|[re, im]| Complex64::new(re, im))
        .collect())
}

// ============================================================================
// Noise Channel Model
// ============================================================================

type ChannelKey = (String, Vec<QubitId>);

/// Noise channels keyed by (gate name, sorted register location), plus
/// per-qubit readout errors
/// Gantree: NoiseChannelModel // 노이즈 채널 모델
#[derive(Debug, Clone, Default)]
pub struct NoiseChannelModel {
    channels: HashMap<ChannelKey, Vec<NoiseChannel>>,
    readout: BTreeMap<QubitId, ReadoutErrorRecord>,
    declared_bit_order: BitOrder,
}

impl NoiseChannelModel {
    // ========================================================================
    // Constructors
    // ========================================================================

    /// Model without any noise
    pub fn ideal() -> Self {
        Self::default()
    }

    /// Parse a JSON document
    /// Gantree: from_json_str(json) -> Result<Self> // JSON 로드
    pub fn from_json_str(json: &str) -> SimResult<Self> {
        let doc: NoiseModelDocument = serde_json::from_str(json)?;
        Self::from_document(doc)
    }

    /// Load a JSON document from a file
    pub fn from_json_file(path: impl AsRef<Path>) -> SimResult<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Build from a parsed document, canonicalizing register locations
    pub fn from_document(doc: NoiseModelDocument) -> SimResult<Self> {
        let bit_order = match &doc.bit_order {
            Some(tag) => tag.parse::<BitOrder>()?,
            None => BitOrder::Msb,
        };
        let mut model = Self {
            declared_bit_order: bit_order,
            ..Self::default()
        };

        for entry in doc.gate_noise {
            let location = entry
                .register_location
                .iter()
                .map(|s| parse_qubit(s))
                .collect::<SimResult<Vec<_>>>()?;
            let qubits = bit_order.canonicalize(location);
            let dim = 1usize << qubits.len();
            for channel in entry.noise_channels {
                let matrices = channel
                    .matrix
                    .into_iter()
                    .map(|k| flatten_kraus(k, dim))
                    .collect::<SimResult<Vec<_>>>()?;
                model.add_channel(NoiseChannel::from_matrices(
                    &entry.gate_name,
                    qubits.clone(),
                    matrices,
                )?);
            }
        }

        for entry in doc.readout_errors {
            let qubit = parse_qubit(&entry.register_location)?;
            model.add_readout_error(ReadoutErrorRecord::new(
                qubit,
                entry.prob_meas1_prep0,
                entry.prob_meas0_prep1,
            )?);
        }

        log::info!(
            "loaded noise model ({}): {} channel(s), {} readout record(s)",
            bit_order,
            model.num_channels(),
            model.readout.len()
        );
        Ok(model)
    }

    /// Serialize back to a document (always MSB-first)
    pub fn to_document(&self) -> NoiseModelDocument {
        let mut keys: Vec<&ChannelKey> = self.channels.keys().collect();
        keys.sort();

        let mut gate_noise: Vec<GateNoiseEntry> = Vec::new();
        for key in keys {
            let Some(channels) = self.channels.get(key) else {
                continue;
            };
            // channels sharing a key may list their qubits in different orders
            for ch in channels {
                let location: Vec<String> = ch.qubits().iter().map(|q| q.to_string()).collect();
                let dim = 1usize << ch.num_qubits();
                let matrix = ch
                    .kraus_operators()
                    .iter()
                    .map(|k| {
                        let body = k.body().unwrap_or(&[]);
                        body.chunks(dim)
                            .map(|row| row.iter().map(|z| [z.re, z.im]).collect())
                            .collect()
                    })
                    .collect();
                let entry = ChannelEntry { matrix };
                match gate_noise.iter_mut().find(|e| {
                    e.gate_name == ch.gate_name() && e.register_location == location
                }) {
                    Some(existing) => existing.noise_channels.push(entry),
                    None => gate_noise.push(GateNoiseEntry {
                        gate_name: ch.gate_name().to_string(),
                        register_location: location,
                        noise_channels: vec![entry],
                    }),
                }
            }
        }

        let readout_errors = self
            .readout
            .values()
            .map(|r| ReadoutEntry {
                register_location: r.qubit.to_string(),
                prob_meas0_prep1: r.p_meas0_prep1,
                prob_meas1_prep0: r.p_meas1_prep0,
            })
            .collect();

        NoiseModelDocument {
            gate_noise,
            bit_order: Some(BitOrder::Msb.to_string()),
            readout_errors,
        }
    }

    /// Serialize to a JSON string
    pub fn to_json_string(&self) -> SimResult<String> {
        Ok(serde_json::to_string_pretty(&self.to_document())?)
    }

    // ========================================================================
    // Mutation
    // ========================================================================

    /// Attach a channel after its gate on its register location
    pub fn add_channel(&mut self, channel: NoiseChannel) {
        if !channel.is_trace_preserving(KRAUS_COMPLETENESS) {
            log::warn!(
                "{} is not trace preserving (error {:.3e})",
                channel,
                channel.trace_preservation_error()
            );
        }
        let key = (channel.gate_name().to_string(), channel.sorted_qubits());
        self.channels.entry(key).or_default().push(channel);
    }

    /// Set the readout error of one qubit
    pub fn add_readout_error(&mut self, record: ReadoutErrorRecord) {
        self.readout.insert(record.qubit, record);
    }

    /// Builder form of [`add_channel`](Self::add_channel)
    pub fn with_channel(mut self, channel: NoiseChannel) -> Self {
        self.add_channel(channel);
        self
    }

    /// Builder form of [`add_readout_error`](Self::add_readout_error)
    pub fn with_readout_error(mut self, record: ReadoutErrorRecord) -> Self {
        self.add_readout_error(record);
        self
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Channels following `gate_name` on `qubits` (any order); empty when
    /// the gate is noiseless there
    /// Gantree: channels_for(gate, qubits) -> &[NoiseChannel] // 채널 조회
    pub fn channels_for(&self, gate_name: &str, qubits: &[QubitId]) -> &[NoiseChannel] {
        let mut sorted = qubits.to_vec();
        sorted.sort_unstable();
        self.channels
            .get(&(canonical_gate_name(gate_name), sorted))
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// All channels
    pub fn channels(&self) -> impl Iterator<Item = &NoiseChannel> {
        self.channels.values().flatten()
    }

    /// Number of channels
    pub fn num_channels(&self) -> usize {
        self.channels.values().map(|v| v.len()).sum()
    }

    /// Check for any gate noise
    pub fn has_gate_noise(&self) -> bool {
        self.num_channels() > 0
    }

    /// Check for no noise at all
    pub fn is_ideal(&self) -> bool {
        !self.has_gate_noise() && self.readout.is_empty()
    }

    /// Readout errors, ordered by qubit
    pub fn readout_errors(&self) -> Vec<ReadoutErrorRecord> {
        self.readout.values().copied().collect()
    }

    /// Readout error of one qubit
    pub fn readout_error(&self, qubit: QubitId) -> Option<&ReadoutErrorRecord> {
        self.readout.get(&qubit)
    }

    /// Bit order the model was declared with
    pub fn declared_bit_order(&self) -> BitOrder {
        self.declared_bit_order
    }

    /// Channels whose Kraus operators are not complete within `tolerance`
    pub fn non_trace_preserving(&self, tolerance: f64) -> Vec<&NoiseChannel> {
        self.channels()
            .filter(|ch| !ch.is_trace_preserving(tolerance))
            .collect()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    const DEPOLARIZING_X: &str = r#"{"gate_noise": [{"gate_name": "X", "register_location": ["0"], "noise_channels": [{"matrix": [[[[0.99498743710662, 0.0], [0.0, 0.0]], [[0.0, 0.0], [0.99498743710662, 0.0]]], [[[0.0, 0.0], [0.05773502691896258, 0.0]], [[0.05773502691896258, 0.0], [0.0, 0.0]]], [[[0.0, 0.0], [0.0, -0.05773502691896258]], [[0.0, 0.05773502691896258], [0.0, 0.0]]], [[[0.05773502691896258, 0.0], [0.0, 0.0]], [[0.0, 0.0], [-0.05773502691896258, 0.0]]]]}]}], "bit_order": "MSB"}"#;

    const READOUT: &str = r#"{"gate_noise": [], "bit_order": "MSB", "readout_errors": [{"register_location": "0", "prob_meas0_prep1": 0.2, "prob_meas1_prep0": 0.1}]}"#;

    #[test]
    fn test_load_depolarizing_document() {
        let model = NoiseChannelModel::from_json_str(DEPOLARIZING_X).unwrap();
        assert_eq!(model.num_channels(), 1);
        let channels = model.channels_for("x", &[0]);
        assert_eq!(channels.len(), 1);
        assert_eq!(channels[0].num_kraus(), 4);
        assert!(channels[0].is_trace_preserving(KRAUS_COMPLETENESS));
        assert!(model.channels_for("H", &[0]).is_empty());
        assert!(model.channels_for("X", &[1]).is_empty());
    }

    #[test]
    fn test_load_readout_document() {
        let model = NoiseChannelModel::from_json_str(READOUT).unwrap();
        assert!(!model.has_gate_noise());
        assert!(!model.is_ideal());
        let r = model.readout_error(0).unwrap();
        assert_abs_diff_eq!(r.p_meas1_prep0, 0.1);
        assert_abs_diff_eq!(r.p_meas0_prep1, 0.2);
    }

    #[test]
    fn test_lsb_location_is_reversed() {
        let json = r#"{"gate_noise": [{"gate_name": "CX", "register_location": ["2", "5"],
            "noise_channels": [{"matrix": [[
                [[1.0, 0.0], [0.0, 0.0], [0.0, 0.0], [0.0, 0.0]],
                [[0.0, 0.0], [1.0, 0.0], [0.0, 0.0], [0.0, 0.0]],
                [[0.0, 0.0], [0.0, 0.0], [1.0, 0.0], [0.0, 0.0]],
                [[0.0, 0.0], [0.0, 0.0], [0.0, 0.0], [1.0, 0.0]]]]}]}],
            "bit_order": "LSB"}"#;
        let model = NoiseChannelModel::from_json_str(json).unwrap();
        assert_eq!(model.declared_bit_order(), BitOrder::Lsb);
        let ch = &model.channels_for("CNOT", &[5, 2])[0];
        assert_eq!(ch.qubits(), &[5, 2]);
    }

    #[test]
    fn test_malformed_documents() {
        let bad_order = r#"{"gate_noise": [], "bit_order": "MID"}"#;
        assert!(matches!(
            NoiseChannelModel::from_json_str(bad_order),
            Err(SimError::InvalidBitOrder(_))
        ));
        let bad_location = r#"{"gate_noise": [{"gate_name": "X", "register_location": ["q0"], "noise_channels": []}]}"#;
        assert!(matches!(
            NoiseChannelModel::from_json_str(bad_location),
            Err(SimError::InvalidNoiseModel(_))
        ));
        let bad_shape = r#"{"gate_noise": [{"gate_name": "X", "register_location": ["0"], "noise_channels": [{"matrix": [[[[1.0, 0.0]]]]}]}]}"#;
        assert!(NoiseChannelModel::from_json_str(bad_shape).is_err());
        assert!(matches!(
            NoiseChannelModel::from_json_str("{not json"),
            Err(SimError::JsonError(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            NoiseChannelModel::from_json_file("/nonexistent/noise.json"),
            Err(SimError::FileError(_))
        ));
    }

    #[test]
    fn test_document_roundtrip_keeps_channels() {
        let model = NoiseChannelModel::ideal()
            .with_channel(NoiseChannel::amplitude_damping("H", 1, 0.1).unwrap())
            .with_channel(NoiseChannel::bit_flip("H", 1, 0.2).unwrap())
            .with_readout_error(ReadoutErrorRecord::new(1, 0.05, 0.02).unwrap());
        let json = model.to_json_string().unwrap();
        let back = NoiseChannelModel::from_json_str(&json).unwrap();
        assert_eq!(back.num_channels(), 2);
        assert_eq!(back.channels_for("H", &[1]), model.channels_for("H", &[1]));
        assert_eq!(back.readout_errors(), model.readout_errors());
    }

    #[test]
    fn test_non_trace_preserving_is_kept() {
        let half = vec![Complex64::new(0.5, 0.0), Complex64::new(0.0, 0.0), Complex64::new(0.0, 0.0), Complex64::new(0.5, 0.0)];
        let model = NoiseChannelModel::ideal()
            .with_channel(NoiseChannel::from_matrices("X", vec![0], vec![half]).unwrap());
        assert_eq!(model.num_channels(), 1);
        assert_eq!(model.non_trace_preserving(KRAUS_COMPLETENESS).len(), 1);
    }
}
