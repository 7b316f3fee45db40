//! Deterministic proposer and verifier rotation.
//!
//! All nodes must agree on who proposes for a given Nock height, so the
//! roster is sorted by the base58 rendering of each signer's public-key
//! hash (the comparison is on the base58 string, not the raw hash bytes)
//! and the proposer is the entry at `height mod N`. The two verifiers are
//! the next two entries in rotation.

use crate::based::BasedList;
use crate::config::{NockPublicKey, NodeConfig, SignerPeer};
use crate::hash::Digest;
use crate::tip5::hash_varlen;
use alloy_primitives::U256;

/// Hash of a signer public key, the sort key of the roster.
pub fn key_hash(pk: &NockPublicKey) -> Digest {
    let atom = U256::from_be_slice(&pk.0);
    Digest::from_tip5(hash_varlen(BasedList::from_atom(atom).chunks()))
}

/// The federation sorted by base58 public-key hash, ascending.
pub fn sorted_signers(nodes: &[SignerPeer]) -> Vec<&SignerPeer> {
    let mut sorted: Vec<&SignerPeer> = nodes.iter().collect();
    sorted.sort_by_cached_key(|peer| bs58::encode(key_hash(&peer.nock_pk).as_bytes()).into_string());
    sorted
}

/// The proposer for a Nock height.
pub fn active_proposer(height: u64, nodes: &[SignerPeer]) -> Option<&SignerPeer> {
    let sorted = sorted_signers(nodes);
    if sorted.is_empty() {
        return None;
    }
    Some(sorted[(height % sorted.len() as u64) as usize])
}

/// The two verifiers for a Nock height: the entries following the
/// proposer in rotation.
pub fn active_verifiers(height: u64, nodes: &[SignerPeer]) -> Vec<&SignerPeer> {
    let sorted = sorted_signers(nodes);
    if sorted.is_empty() {
        return Vec::new();
    }
    let n = sorted.len() as u64;
    (1..=2)
        .map(|offset| sorted[((height + offset) % n) as usize])
        .collect()
}

/// Whether the locally configured node proposes at this height.
pub fn is_local_proposer(height: u64, config: &NodeConfig) -> bool {
    match (config.local_peer(), active_proposer(height, &config.nodes)) {
        (Some(local), Some(proposer)) => local == proposer,
        _ => false,
    }
}
