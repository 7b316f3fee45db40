//! The full kernel state.

use crate::hash_state::HashState;
use nockbridge_types::{BaseHash, BridgeConstants, NockBlock, NockHash, NodeConfig, StopInfo};
use serde::{Deserialize, Serialize};

/// Everything the kernel owns between causes.
///
/// The state is a plain owned record: handlers work on a clone and the
/// dispatcher installs the clone only when the handler succeeds, so a
/// rejected cause leaves the previous state untouched. Snapshots must
/// round-trip byte-identical through the host's load/save.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeState {
    pub config: Option<NodeConfig>,
    pub constants: BridgeConstants,
    pub hash_state: HashState,
    /// Next nonce to assign; starts at 1 and increments by exactly one
    /// per emitted signature request.
    pub next_nonce: u64,
    /// The last accepted Nock block record, kept whole for prev-pointer
    /// checks against the next page.
    pub last_block: Option<NockBlock>,
    /// First-name designating the bridge's custody address. Fixed at
    /// construction; no cause may change it.
    pub bridge_lock_root: NockHash,
    /// Latched terminal state. While set, no cause advances anything.
    pub stop: Option<StopInfo>,
}

impl BridgeState {
    pub fn new(constants: BridgeConstants, bridge_lock_root: NockHash) -> Self {
        let hash_state = HashState::new(&constants);
        Self {
            config: None,
            constants,
            hash_state,
            next_nonce: 1,
            last_block: None,
            bridge_lock_root,
            stop: None,
        }
    }

    /// The last-known-good checkpoint of both chains. Before the first
    /// block on a chain, its checkpoint is the zero hash at the
    /// configured start height.
    pub fn checkpoint(&self) -> StopInfo {
        let (nock_hash, nock_height) = match &self.last_block {
            Some(block) => (self.hash_state.last_nock_block, block.height),
            None => (NockHash::ZERO, self.constants.nockchain_start_height),
        };
        let (base_hash, base_height) = match self.hash_state.last_base_batch() {
            Some(batch) => (self.hash_state.last_base_blocks, batch.last_height),
            None => (BaseHash::ZERO, self.constants.base_start_height),
        };
        StopInfo {
            base_hash,
            base_height,
            nock_hash,
            nock_height,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_state_checkpoints_at_genesis() {
        let constants = BridgeConstants {
            nockchain_start_height: 70,
            base_start_height: 300,
            ..Default::default()
        };
        let state = BridgeState::new(constants, NockHash::ZERO);
        assert_eq!(state.next_nonce, 1);
        let checkpoint = state.checkpoint();
        assert_eq!(checkpoint.nock_hash, NockHash::ZERO);
        assert_eq!(checkpoint.nock_height, 70);
        assert_eq!(checkpoint.base_hash, BaseHash::ZERO);
        assert_eq!(checkpoint.base_height, 300);
    }

    #[test]
    fn snapshot_round_trips_byte_identical() {
        let state = BridgeState::new(BridgeConstants::default(), NockHash::ZERO);
        let bytes = bincode::serialize(&state).expect("serialize");
        let restored: BridgeState = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(restored, state);
        assert_eq!(bincode::serialize(&restored).expect("serialize"), bytes);
    }
}
