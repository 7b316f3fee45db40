//! The signature request emitted for each proposed deposit mint.
//!
//! The preimage layout is fixed for inter-node and on-chain
//! compatibility: seven 32-byte words in field order, hashed with
//! keccak256. Both the proposing node and the verifying contract must
//! reproduce it byte for byte, so it is built in exactly one place.

use alloy_primitives::{keccak256, B256, U256};
use nockbridge_types::{EvmAddress, Name, NockHash, NockTxId};
use serde::{Deserialize, Serialize};

/// A request for the federation to sign one Base mint call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureRequest {
    pub tx_id: NockTxId,
    pub name: Name,
    pub recipient: EvmAddress,
    /// Amount to mint on Base, in nicks, net of the bridge fee.
    pub amount: u64,
    /// Height of the Nock block that carried the deposit.
    pub block_height: u64,
    /// Structural hash of the Nock block that recorded the deposit, not
    /// the block's chain-native digest. Peers look the deposit up by this.
    pub as_of: NockHash,
    /// Kernel-assigned, strictly monotone per bridge. Carried alongside
    /// the request for ledger bookkeeping; not part of the signed
    /// preimage.
    pub nonce: u64,
}

/// Preimage length: seven ABI words.
pub const PREIMAGE_LEN: usize = 7 * 32;

impl SignatureRequest {
    /// The ABI-encoded preimage consumed by the Base contract:
    /// `abi.encode(tx_id, name, recipient, amount, block_height, as_of)`
    /// with the two name halves inlined as consecutive words. The nonce
    /// is excluded.
    pub fn abi_preimage(&self) -> [u8; PREIMAGE_LEN] {
        let mut words = [0u8; PREIMAGE_LEN];
        words[0..32].copy_from_slice(self.tx_id.0.as_bytes());
        words[32..64].copy_from_slice(self.name.first.as_digest().as_bytes());
        words[64..96].copy_from_slice(self.name.last.as_digest().as_bytes());
        words[96..128].copy_from_slice(&left_pad_address(&self.recipient));
        words[128..160].copy_from_slice(&U256::from(self.amount).to_be_bytes::<32>());
        words[160..192].copy_from_slice(&U256::from(self.block_height).to_be_bytes::<32>());
        words[192..224].copy_from_slice(self.as_of.as_digest().as_bytes());
        words
    }

    /// The digest the federation signs.
    pub fn signing_hash(&self) -> B256 {
        keccak256(self.abi_preimage())
    }
}

fn left_pad_address(address: &EvmAddress) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[12..].copy_from_slice(address.as_slice());
    word
}

#[cfg(test)]
mod tests {
    use super::*;
    use nockbridge_types::{Digest, NockHash};

    fn request() -> SignatureRequest {
        SignatureRequest {
            tx_id: NockTxId(Digest([0x11; 32])),
            name: Name::new(NockHash(Digest([0x22; 32])), NockHash(Digest([0x33; 32]))),
            recipient: EvmAddress([0x44; EvmAddress::LEN]),
            amount: 6_534_100_000,
            block_height: 7,
            as_of: NockHash(Digest([0x55; 32])),
            nonce: 1,
        }
    }

    #[test]
    fn preimage_word_layout() {
        let preimage = request().abi_preimage();
        assert_eq!(preimage.len(), 7 * 32);
        assert_eq!(&preimage[0..32], &[0x11; 32]);
        assert_eq!(&preimage[32..64], &[0x22; 32]);
        assert_eq!(&preimage[64..96], &[0x33; 32]);
        // Address word is left-padded to 32 bytes.
        assert_eq!(&preimage[96..108], &[0u8; 12]);
        assert_eq!(&preimage[108..128], &[0x44; 20]);
        // Height sits in the low-order bytes of its word.
        assert_eq!(preimage[191], 7);
        assert_eq!(&preimage[192..224], &[0x55; 32]);
    }

    #[test]
    fn signing_hash_commits_to_every_signed_field() {
        let base = request().signing_hash();
        let mutations: [fn(&mut SignatureRequest); 4] = [
            |r| r.amount += 1,
            |r| r.block_height += 1,
            |r| r.recipient = EvmAddress([0x45; EvmAddress::LEN]),
            |r| r.as_of = NockHash(Digest([0x56; 32])),
        ];
        for mutate in mutations {
            let mut altered = request();
            mutate(&mut altered);
            assert_ne!(altered.signing_hash(), base);
        }
    }

    #[test]
    fn nonce_is_not_part_of_the_preimage() {
        let base = request();
        let mut renumbered = base.clone();
        renumbered.nonce += 1;
        assert_eq!(renumbered.signing_hash(), base.signing_hash());
    }
}
