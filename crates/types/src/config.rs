//! Bridge constants and node configuration.

use crate::eth::EvmAddress;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Sub-denomination of a nock.
pub const NICKS_PER_NOCK: u64 = 65_536;

/// Admin-tunable parameters of the bridge.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeConstants {
    pub version: u32,
    pub min_signers: u32,
    pub total_signers: u32,
    /// Smallest deposit the bridge will carry, in whole nocks.
    pub minimum_event_nocks: u64,
    pub nicks_fee_per_nock: u64,
    /// Number of Base blocks per delivered chunk.
    pub base_blocks_chunk: u64,
    pub base_start_height: u64,
    pub nockchain_start_height: u64,
}

impl Default for BridgeConstants {
    fn default() -> Self {
        Self {
            version: 0,
            min_signers: 3,
            total_signers: 5,
            minimum_event_nocks: 100_000,
            nicks_fee_per_nock: 195,
            base_blocks_chunk: 100,
            base_start_height: 0,
            nockchain_start_height: 0,
        }
    }
}

/// Rejections from [`BridgeConstants::validate`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConstantsError {
    #[error("unsupported constants version {0}")]
    UnsupportedVersion(u32),
    #[error("min signers {min} must be between 1 and total signers {total}")]
    SignerBounds { min: u32, total: u32 },
    #[error("minimum event nocks must be positive")]
    ZeroMinimumEvent,
    #[error("base blocks chunk must be positive")]
    ZeroChunk,
}

impl BridgeConstants {
    /// Checks an admin-submitted update.
    pub fn validate(&self) -> Result<(), ConstantsError> {
        if self.version != 0 {
            return Err(ConstantsError::UnsupportedVersion(self.version));
        }
        if self.min_signers < 1 || self.min_signers > self.total_signers {
            return Err(ConstantsError::SignerBounds {
                min: self.min_signers,
                total: self.total_signers,
            });
        }
        if self.minimum_event_nocks == 0 {
            return Err(ConstantsError::ZeroMinimumEvent);
        }
        if self.base_blocks_chunk == 0 {
            return Err(ConstantsError::ZeroChunk);
        }
        Ok(())
    }

    /// The deposit threshold in nicks.
    pub fn minimum_deposit_nicks(&self) -> u64 {
        self.minimum_event_nocks.saturating_mul(NICKS_PER_NOCK)
    }
}

/// Fee charged on a deposit: the per-nock fee applied to the note's value
/// rounded up to whole nocks.
pub fn calculate_fee(assets: u64, nicks_fee_per_nock: u64) -> u64 {
    assets
        .div_ceil(NICKS_PER_NOCK)
        .saturating_mul(nicks_fee_per_nock)
}

/// Opaque secret-key material held for the driver; the kernel never
/// interprets it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretKeyBytes(pub [u8; 32]);

/// Public identity of a federation signer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NockPublicKey(pub [u8; 32]);

/// One of the federation's signer nodes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignerPeer {
    pub nock_pk: NockPublicKey,
    pub eth_address: EvmAddress,
}

/// This node's view of the federation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Index of the local node in `nodes`.
    pub node_id: u32,
    pub nodes: Vec<SignerPeer>,
    pub my_eth_key: SecretKeyBytes,
    pub my_nock_key: SecretKeyBytes,
}

impl NodeConfig {
    /// The local node's signer entry, when `node_id` is in range.
    pub fn local_peer(&self) -> Option<&SignerPeer> {
        self.nodes.get(self.node_id as usize)
    }
}
