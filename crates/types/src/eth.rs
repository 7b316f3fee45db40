//! 20-byte EVM-compatible address wrapper.

use alloy_primitives::Address as AlloyAddress;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// A destination address on the Base chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EvmAddress(pub [u8; Self::LEN]);

impl EvmAddress {
    pub const LEN: usize = 20;
    pub const ZERO: Self = Self([0u8; Self::LEN]);

    pub fn as_bytes(&self) -> &[u8; Self::LEN] {
        &self.0
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    /// Parses a hex string (optional `0x` prefix, underscores ignored).
    pub fn from_hex_str(raw: &str) -> Result<Self, EvmAddressParseError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(EvmAddressParseError::Empty);
        }

        let without_prefix = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);
        let cleaned: Vec<u8> = without_prefix
            .bytes()
            .filter(|byte| *byte != b'_')
            .collect();
        if cleaned.len() != Self::LEN * 2 {
            return Err(EvmAddressParseError::WrongLength(cleaned.len()));
        }

        let mut bytes = [0u8; Self::LEN];
        for (i, pair) in cleaned.chunks(2).enumerate() {
            let high = hex_digit(pair[0]).ok_or(EvmAddressParseError::InvalidCharacters)?;
            let low = hex_digit(pair[1]).ok_or(EvmAddressParseError::InvalidCharacters)?;
            bytes[i] = high << 4 | low;
        }
        Ok(Self(bytes))
    }
}

fn hex_digit(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        _ => None,
    }
}

impl From<[u8; EvmAddress::LEN]> for EvmAddress {
    fn from(value: [u8; EvmAddress::LEN]) -> Self {
        Self(value)
    }
}

impl From<AlloyAddress> for EvmAddress {
    fn from(value: AlloyAddress) -> Self {
        let mut bytes = [0u8; EvmAddress::LEN];
        bytes.copy_from_slice(value.as_slice());
        Self(bytes)
    }
}

impl From<EvmAddress> for AlloyAddress {
    fn from(value: EvmAddress) -> Self {
        AlloyAddress::from_slice(&value.0)
    }
}

impl fmt::Display for EvmAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x")?;
        for byte in &self.0 {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvmAddressParseError {
    #[error("EVM address cannot be empty")]
    Empty,
    #[error("EVM address must contain exactly 40 hex characters (20 bytes), got length {0}")]
    WrongLength(usize),
    #[error("EVM address must be valid hex (0-9, a-f)")]
    InvalidCharacters,
}
