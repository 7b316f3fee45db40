//! Nock-side transaction and note model, as observed by the bridge.
//!
//! The bridge only looks at the parts of a transaction it needs: the
//! version, which notes were spent, and the output notes with their
//! attached note-data entries. Everything else stays with the driver.

use crate::based::{based_to_evm, EVM_ADDRESS_CHUNKS};
use crate::eth::EvmAddress;
use crate::felt::{Felt, P};
use crate::hash::{Digest, NockHash};
use crate::hashtree::{AsHashTree, HashTree};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Note-data tag marking a deposit output.
pub const BRIDGE_TAG: &str = "bridge";
/// Note-data tag carrying the Base block reference of a withdrawal.
pub const BA_BLK_TAG: &str = "ba-blk";
/// Note-data tag carrying the Base event id of a withdrawal.
pub const BA_EID_TAG: &str = "ba-eid";

/// Identity of a Nock transaction.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct NockTxId(pub Digest);

/// Two-element key identifying a Nock note.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Name {
    pub first: NockHash,
    pub last: NockHash,
}

impl Name {
    pub fn new(first: NockHash, last: NockHash) -> Self {
        Self { first, last }
    }
}

impl AsHashTree for Name {
    fn as_hash_tree(&self) -> HashTree {
        HashTree::Tuple(vec![
            HashTree::Digest(self.first.0),
            HashTree::Digest(self.last.0),
        ])
    }
}

/// Block and transaction format versions of the Nock chain.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum NockVersion {
    /// Legacy format, predating the bridge cutover.
    V0,
    /// Current format.
    V1,
}

/// A note consumed by a transaction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpentNote {
    pub name: Name,
}

/// Tagged entries attached to an output note.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteData(pub BTreeMap<String, Vec<u8>>);

impl NoteData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, tag: &str, payload: Vec<u8>) {
        self.0.insert(tag.to_string(), payload);
    }

    pub fn get(&self, tag: &str) -> Option<&[u8]> {
        self.0.get(tag).map(Vec::as_slice)
    }

    pub fn has(&self, tag: &str) -> bool {
        self.0.contains_key(tag)
    }
}

/// A note created by a transaction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputNote {
    pub name: Name,
    /// Value of the note, in nicks.
    pub assets: u64,
    pub note_data: NoteData,
}

/// The slice of a Nock transaction the bridge inspects.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NockTx {
    pub id: NockTxId,
    pub version: NockVersion,
    pub inputs: Vec<SpentNote>,
    pub outputs: Vec<OutputNote>,
}

/// Decodes the payload of a `bridge` note-data entry into a destination
/// address.
///
/// Layout: one version byte (must be zero), one kind byte (zero, the Base
/// chain), then three little-endian 64-bit based chunks. Any deviation
/// (wrong length, unknown version or kind, a chunk at or above the field
/// modulus, a reassembled value wider than an address) is a malformed
/// recipient and yields `None`. The funds then stay in the bridge wallet
/// and no mint is requested, but the deposit itself is still recorded.
pub fn decode_bridge_recipient(payload: &[u8]) -> Option<EvmAddress> {
    const EXPECTED: usize = 2 + EVM_ADDRESS_CHUNKS * 8;
    if payload.len() != EXPECTED {
        return None;
    }
    let (version, kind) = (payload[0], payload[1]);
    if version != 0 || kind != 0 {
        return None;
    }

    let mut chunks = [Felt::ZERO; EVM_ADDRESS_CHUNKS];
    for (i, chunk) in chunks.iter_mut().enumerate() {
        let mut raw = [0u8; 8];
        raw.copy_from_slice(&payload[2 + i * 8..2 + (i + 1) * 8]);
        let word = u64::from_le_bytes(raw);
        if word >= P {
            return None;
        }
        *chunk = Felt::reduce(word as u128);
    }
    based_to_evm(&chunks).ok()
}

/// Builds a well-formed `bridge` entry payload for an address.
pub fn encode_bridge_recipient(address: &EvmAddress) -> Vec<u8> {
    let chunks = crate::based::evm_to_based(address);
    let mut payload = Vec::with_capacity(2 + EVM_ADDRESS_CHUNKS * 8);
    payload.push(0);
    payload.push(0);
    for chunk in chunks {
        payload.extend_from_slice(&chunk.value().to_le_bytes());
    }
    payload
}
