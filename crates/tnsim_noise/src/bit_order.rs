//! Register bit-order conventions
//!
//! Gantree: L2_Noise → BitOrder
//!
//! Internally the first qubit of a channel's register location is the most
//! significant bit of the Kraus matrix index. Documents declared LSB-first
//! are brought to that form once, at load time, by reversing the register
//! location. Matrix values are never touched.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tnsim_core::{QubitId, SimError};

/// Declared qubit ordering of a multi-qubit operator index
/// Gantree: BitOrder // MSB | LSB
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BitOrder {
    /// First listed qubit is the most significant index bit
    #[default]
    #[serde(rename = "MSB")]
    Msb,
    /// First listed qubit is the least significant index bit
    #[serde(rename = "LSB")]
    Lsb,
}

impl BitOrder {
    /// Rewrite a register location into the internal MSB-first order
    pub fn canonicalize(&self, mut register_location: Vec<QubitId>) -> Vec<QubitId> {
        if *self == BitOrder::Lsb {
            register_location.reverse();
        }
        register_location
    }
}

impl FromStr for BitOrder {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "MSB" => Ok(BitOrder::Msb),
            "LSB" => Ok(BitOrder::Lsb),
            _ => Err(SimError::InvalidBitOrder(s.to_string())),
        }
    }
}

impl fmt::Display for BitOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BitOrder::Msb => write!(f, "MSB"),
            BitOrder::Lsb => write!(f, "LSB"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonicalize() {
        assert_eq!(BitOrder::Msb.canonicalize(vec![0, 1, 2]), vec![0, 1, 2]);
        assert_eq!(BitOrder::Lsb.canonicalize(vec![0, 1, 2]), vec![2, 1, 0]);
        assert_eq!(BitOrder::Lsb.canonicalize(vec![3]), vec![3]);
    }

    #[test]
    fn test_parse() {
        assert_eq!("msb".parse::<BitOrder>().unwrap(), BitOrder::Msb);
        assert_eq!("LSB".parse::<BitOrder>().unwrap(), BitOrder::Lsb);
        assert!(matches!(
            "middle".parse::<BitOrder>(),
            Err(SimError::InvalidBitOrder(_))
        ));
        assert_eq!(BitOrder::default().to_string(), "MSB");
    }
}
