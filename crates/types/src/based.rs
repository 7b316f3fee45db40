//! The based-list codec.
//!
//! A lossless little-endian radix-`p` split of arbitrary-width integers
//! into canonical field elements, used wherever a value wider than the
//! field has to become hashable or serve as part of a map key: Base event
//! and block identifiers, and EVM addresses.

use crate::eth::EvmAddress;
use crate::felt::{Felt, P};
use alloy_primitives::U256;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of chunks an EVM address occupies: 160 bits always fit in three
/// radix-`p` digits.
pub const EVM_ADDRESS_CHUNKS: usize = 3;

/// Errors from reassembling or validating a based list.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BasedError {
    /// A chunk was not a canonical field element.
    #[error("based list chunk {0} is not below the field modulus")]
    ChunkOutOfRange(u64),

    /// The reassembled value does not fit the target width.
    #[error("based list encodes a value wider than the target")]
    Overflow,
}

/// A little-endian radix-`p` digit string.
#[derive(
    Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct BasedList(pub Vec<Felt>);

impl BasedList {
    /// Splits an integer into radix-`p` digits; zero encodes as `[0]`.
    pub fn from_atom(n: U256) -> Self {
        let radix = U256::from(P);
        let mut chunks = Vec::with_capacity(5);
        let mut quotient = n;
        loop {
            let (next, remainder) = quotient.div_rem(radix);
            chunks.push(Felt::reduce(remainder.to::<u64>() as u128));
            quotient = next;
            if quotient.is_zero() {
                break;
            }
        }
        Self(chunks)
    }

    /// Reassembles the encoded integer, `sum(l[i] * p^i)`.
    pub fn to_atom(&self) -> Result<U256, BasedError> {
        let radix = U256::from(P);
        let mut acc = U256::ZERO;
        for chunk in self.0.iter().rev() {
            acc = acc
                .checked_mul(radix)
                .and_then(|wide| wide.checked_add(U256::from(chunk.value())))
                .ok_or(BasedError::Overflow)?;
        }
        Ok(acc)
    }

    /// Every chunk is a canonical field element.
    ///
    /// Lists built by [`BasedList::from_atom`] are valid by construction;
    /// this guards lists that arrived through deserialization.
    pub fn valid(&self) -> bool {
        self.0.iter().all(|chunk| chunk.value() < P)
    }

    pub fn chunks(&self) -> &[Felt] {
        &self.0
    }
}

/// Encodes a 20-byte address as exactly three radix-`p` chunks.
pub fn evm_to_based(address: &EvmAddress) -> [Felt; EVM_ADDRESS_CHUNKS] {
    let atom = U256::from_be_slice(address.as_slice());
    let list = BasedList::from_atom(atom);
    debug_assert!(list.0.len() <= EVM_ADDRESS_CHUNKS);
    let mut chunks = [Felt::ZERO; EVM_ADDRESS_CHUNKS];
    chunks[..list.0.len()].copy_from_slice(&list.0);
    chunks
}

/// Decodes three radix-`p` chunks back into an address.
///
/// Fails when the reassembled value does not fit in 160 bits.
pub fn based_to_evm(chunks: &[Felt; EVM_ADDRESS_CHUNKS]) -> Result<EvmAddress, BasedError> {
    let atom = BasedList(chunks.to_vec()).to_atom()?;
    let bytes = atom.to_be_bytes::<32>();
    if bytes[..32 - EvmAddress::LEN].iter().any(|byte| *byte != 0) {
        return Err(BasedError::Overflow);
    }
    let mut address = [0u8; EvmAddress::LEN];
    address.copy_from_slice(&bytes[32 - EvmAddress::LEN..]);
    Ok(EvmAddress(address))
}
