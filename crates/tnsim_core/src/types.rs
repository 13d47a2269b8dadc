//! Core types for TNSim
//!
//! Gantree: L0_Foundation → CoreTypes
//!
//! Type aliases and validated wrapper types shared by every layer.

use crate::error::{SimError, SimResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

// ============================================================================
// Type Aliases
// ============================================================================

/// Qubit identifier (0-indexed)
/// Gantree: QubitId // pub type QubitId = usize
pub type QubitId = usize;

/// Rotation angle in radians
/// Gantree: Angle // pub type Angle = f64
pub type Angle = f64;

/// Measurement counts: bitstring -> count
/// Gantree: Counts // pub type Counts = HashMap<String, u64>
pub type Counts = HashMap<String, u64>;

// ============================================================================
// Probability (Validated Wrapper)
// ============================================================================

/// Probability value in range [0, 1]
/// Gantree: Probability // 범위 검증 구조체
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Probability(f64);

impl Probability {
    /// Create a new Probability with validation
    pub fn new(value: f64) -> SimResult<Self> {
        if !(0.0..=1.0).contains(&value) {
            return Err(SimError::InvalidProbability(value));
        }
        Ok(Self(value))
    }

    /// Get the probability value
    #[inline]
    pub fn value(&self) -> f64 {
        self.0
    }

    /// Get the complement (1 - p)
    #[inline]
    pub fn complement(&self) -> f64 {
        1.0 - self.0
    }

    /// Zero probability
    pub const ZERO: Self = Self(0.0);
}

impl Default for Probability {
    fn default() -> Self {
        Self::ZERO
    }
}

impl fmt::Display for Probability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6}", self.0)
    }
}

// ============================================================================
// Bitstring
// ============================================================================

/// Computational-basis outcome, qubit 0 first
///
/// Basis indices are row-major over the output legs, so qubit 0 is the most
/// significant bit of the index and the leftmost character of the string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Bitstring {
    bits: Vec<bool>,
}

impl Bitstring {
    /// Create from a vector of bools (qubit 0 first)
    pub fn new(bits: Vec<bool>) -> Self {
        Self { bits }
    }

    /// Create from string (e.g., "0110")
    /// Gantree: parse(s) -> Self // 파싱
    pub fn parse(s: &str) -> SimResult<Self> {
        let bits: Result<Vec<bool>, _> = s
            .chars()
            .map(|c| match c {
                '0' => Ok(false),
                '1' => Ok(true),
                _ => Err(SimError::InvalidBitstring(s.to_string())),
            })
            .collect();
        Ok(Self { bits: bits? })
    }

    /// Decode a basis index of `width` qubits
    pub fn from_index(index: usize, width: usize) -> Self {
        let bits = (0..width)
            .map(|q| (index >> (width - 1 - q)) & 1 == 1)
            .collect();
        Self { bits }
    }

    /// Encode back to a basis index
    pub fn to_index(&self) -> usize {
        self.bits
            .iter()
            .fold(0usize, |acc, &b| (acc << 1) | usize::from(b))
    }

    /// Get the number of bits
    pub fn len(&self) -> usize {
        self.bits.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    /// Get bit of qubit `index`
    pub fn get(&self, index: usize) -> Option<bool> {
        self.bits.get(index).copied()
    }

    /// Keep only the listed qubits, in the listed order
    pub fn select(&self, qubits: &[QubitId]) -> Self {
        Self {
            bits: qubits
                .iter()
                .map(|&q| self.bits.get(q).copied().unwrap_or(false))
                .collect(),
        }
    }
}

impl fmt::Display for Bitstring {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &b in &self.bits {
            write!(f, "{}", if b { '1' } else { '0' })?;
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

    #[test]
    fn test_probability_valid() {
        assert!(Probability::new(0.0).is_ok());
        assert!(Probability::new(0.5).is_ok());
        assert!(Probability::new(1.0).is_ok());
    }

    #[test]
    fn test_probability_invalid() {
        assert!(Probability::new(-0.1).is_err());
        assert!(Probability::new(1.1).is_err());
    }

    #[test]
    fn test_probability_complement() {
        let p = Probability::new(0.3).unwrap();
        assert!((p.complement() - 0.7).abs() < 1e-10);
    }

    #[test]
    fn test_bitstring_from_index_is_msb_first() {
        let bs = Bitstring::from_index(0b100, 3);
        assert_eq!(bs.to_string(), "100");
        assert_eq!(bs.get(0), Some(true));
        assert_eq!(bs.to_index(), 4);
    }

    #[test]
    fn test_bitstring_select() {
        let bs = Bitstring::parse("0110").unwrap();
        assert_eq!(bs.select(&[2, 0]).to_string(), "10");
    }

    #[test]
    fn test_bitstring_parse_rejects_garbage() {
        assert_eq!(
            Bitstring::parse("01x"),
            Err(SimError::InvalidBitstring("01x".to_string()))
        );
        assert!(!SimError::InvalidBitstring(String::new()).is_lookup());
    }
}
