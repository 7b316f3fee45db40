//! Chain-facing digests.
//!
//! The sponge squeezes five field words; chain identities take the first
//! four packed little-endian, giving a 256-bit value whose 64-bit words
//! stay canonical. That keeps digests re-absorbable as plain leaves and
//! matches the 32-byte identity used on the wire.

use crate::felt::Felt;
use crate::tip5::DIGEST_WIDTH;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A 256-bit structural digest.
#[derive(
    Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Digest(pub [u8; 32]);

impl Digest {
    pub const ZERO: Self = Self([0u8; 32]);

    /// Packs the leading four words of a sponge digest.
    pub fn from_tip5(words: [Felt; DIGEST_WIDTH]) -> Self {
        let mut bytes = [0u8; 32];
        for (i, word) in words.iter().take(4).enumerate() {
            bytes[i * 8..(i + 1) * 8].copy_from_slice(&word.value().to_le_bytes());
        }
        Self(bytes)
    }

    /// The four 64-bit words of this digest, reduced into the field.
    ///
    /// Digests produced by this crate are canonical already; reduction only
    /// matters for digests smuggled in through deserialization.
    pub fn to_felts(&self) -> [Felt; 4] {
        let mut words = [Felt::ZERO; 4];
        for (i, word) in words.iter_mut().enumerate() {
            let mut raw = [0u8; 8];
            raw.copy_from_slice(&self.0[i * 8..(i + 1) * 8]);
            *word = Felt::reduce(u64::from_le_bytes(raw) as u128);
        }
        words
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x")?;
        for byte in &self.0 {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

macro_rules! chain_hash {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(
            Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        pub struct $name(pub Digest);

        impl $name {
            pub const ZERO: Self = Self(Digest::ZERO);

            pub fn as_digest(&self) -> &Digest {
                &self.0
            }
        }

        impl From<Digest> for $name {
            fn from(digest: Digest) -> Self {
                Self(digest)
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($name), "({})"), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

chain_hash! {
    /// Identity of a Nock-side block record.
    NockHash
}

chain_hash! {
    /// Identity of a Base-side block batch record.
    BaseHash
}
