//! The two hashchains, the hold slots, and the four movement quadrants.

use crate::pair_map::PairMap;
use nockbridge_types::{
    BaseBlockBatch, BaseBlockId, BaseEventId, BaseHash, BridgeConstants, Deposit, Name, NockBlock,
    NockHash, Withdrawal,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Parks Nock advancement until a named Base chunk lands.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NockHold {
    pub hash: BaseHash,
    pub height: u64,
}

/// Parks Base advancement until a named Nock block lands.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseHold {
    /// Structural hash of the awaited Nock block.
    pub hash: NockHash,
    pub height: u64,
}

/// Everything the kernel tracks about both chains.
///
/// The hashchains are keyed by structural hash; `last_*` name the most
/// recently appended record. Deposits and withdrawals each live in at
/// most one of their two quadrants at any instant.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashState {
    pub nock_hashchain: BTreeMap<NockHash, NockBlock>,
    pub last_nock_block: NockHash,
    pub nock_next_height: u64,

    pub base_hashchain: BTreeMap<BaseHash, BaseBlockBatch>,
    pub last_base_blocks: BaseHash,
    pub base_next_height: u64,

    pub nock_hold: Option<NockHold>,
    pub base_hold: Option<BaseHold>,

    /// Deposits seen on Nock, not yet proposed or settled.
    pub unsettled_deposits: PairMap<NockHash, Name, Deposit>,
    /// Deposits this bridge has proposed but not yet seen settle on Base.
    pub unconfirmed_settled_deposits: PairMap<NockHash, Name, Deposit>,
    /// Withdrawals seen on Base, never acted upon in this release.
    pub unsettled_withdrawals: PairMap<BaseHash, BaseEventId, Withdrawal>,
    pub unconfirmed_settled_withdrawals: PairMap<BaseHash, BaseEventId, Withdrawal>,
}

impl HashState {
    /// Fresh state positioned at the configured start heights.
    pub fn new(constants: &BridgeConstants) -> Self {
        Self {
            nock_hashchain: Default::default(),
            last_nock_block: NockHash::ZERO,
            nock_next_height: constants.nockchain_start_height,
            base_hashchain: Default::default(),
            last_base_blocks: BaseHash::ZERO,
            base_next_height: constants.base_start_height,
            nock_hold: None,
            base_hold: None,
            unsettled_deposits: PairMap::new(),
            unconfirmed_settled_deposits: PairMap::new(),
            unsettled_withdrawals: PairMap::new(),
            unconfirmed_settled_withdrawals: PairMap::new(),
        }
    }

    pub fn contains_nock(&self, hash: &NockHash) -> bool {
        self.nock_hashchain.contains_key(hash)
    }

    pub fn contains_base(&self, hash: &BaseHash) -> bool {
        self.base_hashchain.contains_key(hash)
    }

    /// Whether any block has been accepted on the Nock side yet.
    pub fn nock_is_empty(&self) -> bool {
        self.nock_hashchain.is_empty()
    }

    /// The id of the last block of the last accepted batch, for
    /// cross-batch continuity checks.
    pub fn last_base_block_id(&self) -> Option<&BaseBlockId> {
        self.base_hashchain
            .get(&self.last_base_blocks)
            .and_then(BaseBlockBatch::last_block_id)
    }

    /// The last accepted batch record.
    pub fn last_base_batch(&self) -> Option<&BaseBlockBatch> {
        self.base_hashchain.get(&self.last_base_blocks)
    }
}
