use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::errors::FlowError;

/// An amount in the smallest unit of an asset.
///
/// The protocol carries amounts as unsigned base-10 integer strings; this
/// type guarantees the round-trip is lossless and that only strings matching
/// `^[0-9]+$` are accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AmountValue(pub u128);

impl From<u8> for AmountValue {
    fn from(value: u8) -> Self {
        AmountValue(u128::from(value))
    }
}

impl From<u16> for AmountValue {
    fn from(value: u16) -> Self {
        AmountValue(u128::from(value))
    }
}

impl From<u32> for AmountValue {
    fn from(value: u32) -> Self {
        AmountValue(u128::from(value))
    }
}

impl From<u64> for AmountValue {
    fn from(value: u64) -> Self {
        AmountValue(u128::from(value))
    }
}

impl From<u128> for AmountValue {
    fn from(value: u128) -> Self {
        AmountValue(value)
    }
}

impl FromStr for AmountValue {
    type Err = FlowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(FlowError::InvalidAmount(format!(
                "amount must be an unsigned integer string, got '{s}'"
            )));
        }
        let value = s
            .parse::<u128>()
            .map_err(|_| FlowError::InvalidAmount(format!("amount '{s}' out of range")))?;
        Ok(AmountValue(value))
    }
}

impl TryFrom<f64> for AmountValue {
    type Error = FlowError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        if !value.is_finite() || value < 0.0 {
            return Err(FlowError::InvalidAmount(format!(
                "amount must be a non-negative number, got {value}"
            )));
        }
        if value.fract() != 0.0 {
            return Err(FlowError::InvalidAmount(format!(
                "amount must be a whole number of base units, got {value}"
            )));
        }
        // f64 integers above 2^53 are no longer exact.
        if value > (1u64 << 53) as f64 {
            return Err(FlowError::InvalidAmount(format!(
                "amount {value} exceeds the exactly-representable range"
            )));
        }
        Ok(AmountValue(value as u128))
    }
}

impl Display for AmountValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for AmountValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for AmountValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
