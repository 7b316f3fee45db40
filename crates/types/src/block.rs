//! Chain records kept by the kernel: Nock blocks, Base block batches, and
//! the deposit/withdrawal records that move between them.

use crate::based::BasedList;
use crate::eth::EvmAddress;
use crate::hash::{BaseHash, NockHash};
use crate::hashtree::{AsHashTree, HashTree};
use crate::note::{Name, NockTxId, NockVersion};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

fn map_tree<K: AsHashTree, V: AsHashTree>(map: &BTreeMap<K, V>) -> HashTree {
    HashTree::Tuple(
        map.iter()
            .map(|(key, value)| {
                HashTree::Tuple(vec![key.as_hash_tree(), value.as_hash_tree()])
            })
            .collect(),
    )
}

// ═══════════════════════════════════════════════════════════════════════════
// Nock side
// ═══════════════════════════════════════════════════════════════════════════

/// A Nock block as delivered by the driver, before the kernel builds its
/// own record from it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawNockPage {
    pub version: NockVersion,
    pub height: u64,
    /// The chain-native digest of this block.
    pub digest: NockHash,
    /// The chain-native digest of the parent block.
    pub parent: NockHash,
    pub tx_ids: Vec<NockTxId>,
}

/// A cross-chain deposit observed on Nock.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deposit {
    pub tx_id: NockTxId,
    pub name: Name,
    /// `None` marks a malformed recipient: the funds stay on Nock and no
    /// signature request is ever emitted, but the deposit is recorded.
    pub dest: Option<EvmAddress>,
    pub amount_to_mint: u64,
    pub fee: u64,
}

impl AsHashTree for Deposit {
    fn as_hash_tree(&self) -> HashTree {
        HashTree::Tuple(vec![
            HashTree::Digest(self.tx_id.0),
            self.name.as_hash_tree(),
            HashTree::option(self.dest.as_ref().map(address_tree)),
            HashTree::atom_u64(self.amount_to_mint),
            HashTree::atom_u64(self.fee),
        ])
    }
}

fn address_tree(address: &EvmAddress) -> HashTree {
    let chunks = crate::based::evm_to_based(address);
    HashTree::Tuple(chunks.iter().copied().map(HashTree::Leaf).collect())
}

/// A withdrawal paid out on Nock. Observed only to be rejected in this
/// release.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawalSettlement {
    pub event_id: BaseEventId,
    pub amount: u64,
}

impl AsHashTree for WithdrawalSettlement {
    fn as_hash_tree(&self) -> HashTree {
        HashTree::Tuple(vec![
            self.event_id.as_hash_tree(),
            HashTree::atom_u64(self.amount),
        ])
    }
}

/// The kernel's record of an accepted Nock block.
///
/// Identity is the structural hash of this record, not the chain-native
/// `block_id`; settlements arriving from Base reference deposits by that
/// structural hash.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NockBlock {
    pub height: u64,
    /// Chain-native digest, kept for reorg detection against the next page.
    pub block_id: NockHash,
    pub deposits: BTreeMap<Name, Deposit>,
    pub withdrawal_settlements: BTreeMap<Name, WithdrawalSettlement>,
    /// Structural hash of the preceding record; zero for the first block
    /// the bridge accepts.
    pub prev: NockHash,
}

impl AsHashTree for NockBlock {
    fn as_hash_tree(&self) -> HashTree {
        HashTree::Tuple(vec![
            HashTree::atom_u64(self.height),
            HashTree::Digest(self.block_id.0),
            map_tree(&self.deposits),
            map_tree(&self.withdrawal_settlements),
            HashTree::Digest(self.prev.0),
        ])
    }
}

impl NockBlock {
    /// Structural hash, the `as_of` identity of every deposit in it.
    pub fn structural_hash(&self) -> NockHash {
        NockHash(self.tree_hash())
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Base side
// ═══════════════════════════════════════════════════════════════════════════

macro_rules! based_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(
            Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        pub struct $name(pub BasedList);

        impl $name {
            pub fn from_atom(atom: alloy_primitives::U256) -> Self {
                Self(BasedList::from_atom(atom))
            }
        }

        impl AsHashTree for $name {
            fn as_hash_tree(&self) -> HashTree {
                HashTree::based(&self.0)
            }
        }
    };
}

based_id! {
    /// Identity of an event emitted by the Base bridge contract.
    BaseEventId
}

based_id! {
    /// Identity of a Base transaction.
    BaseTxId
}

based_id! {
    /// Identity of a Base block.
    BaseBlockId
}

/// One Base block inside a batch: its own id and its parent's.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseBlockRef {
    pub bid: BaseBlockId,
    pub parent: BaseBlockId,
}

impl AsHashTree for BaseBlockRef {
    fn as_hash_tree(&self) -> HashTree {
        HashTree::Tuple(vec![self.bid.as_hash_tree(), self.parent.as_hash_tree()])
    }
}

/// A settlement of a Nock deposit observed on Base.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositSettlement {
    pub event_id: BaseEventId,
    pub counterpart_name: Name,
    /// Structural hash of the Nock block that recorded the deposit.
    pub as_of: NockHash,
    pub nock_height: u64,
    pub dest: EvmAddress,
    pub settled_amount: u64,
    pub nonce: u64,
}

impl AsHashTree for DepositSettlement {
    fn as_hash_tree(&self) -> HashTree {
        HashTree::Tuple(vec![
            self.event_id.as_hash_tree(),
            self.counterpart_name.as_hash_tree(),
            HashTree::Digest(self.as_of.0),
            HashTree::atom_u64(self.nock_height),
            address_tree(&self.dest),
            HashTree::atom_u64(self.settled_amount),
            HashTree::atom_u64(self.nonce),
        ])
    }
}

/// A burn-for-withdrawal observed on Base. Recorded but never acted upon
/// in this release.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Withdrawal {
    pub event_id: BaseEventId,
    /// The Base transaction that burned the tokens.
    pub tx_id: BaseTxId,
    /// The Nock note that would receive the payout.
    pub recipient: Name,
    pub amount: u64,
}

impl AsHashTree for Withdrawal {
    fn as_hash_tree(&self) -> HashTree {
        HashTree::Tuple(vec![
            self.event_id.as_hash_tree(),
            self.tx_id.as_hash_tree(),
            self.recipient.as_hash_tree(),
            HashTree::atom_u64(self.amount),
        ])
    }
}

/// The kernel's record of one accepted chunk of Base blocks.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseBlockBatch {
    pub first_height: u64,
    pub last_height: u64,
    pub blocks: BTreeMap<u64, BaseBlockRef>,
    pub withdrawals: BTreeMap<BaseEventId, Withdrawal>,
    pub deposit_settlements: BTreeMap<BaseEventId, DepositSettlement>,
    /// Structural hash of the preceding batch; zero for the first chunk.
    pub prev: BaseHash,
}

impl AsHashTree for BaseBlockBatch {
    fn as_hash_tree(&self) -> HashTree {
        HashTree::Tuple(vec![
            HashTree::atom_u64(self.first_height),
            HashTree::atom_u64(self.last_height),
            map_tree(&self.blocks),
            map_tree(&self.withdrawals),
            map_tree(&self.deposit_settlements),
            HashTree::Digest(self.prev.0),
        ])
    }
}

impl BaseBlockBatch {
    /// Structural hash, the key of this batch in the Base hashchain.
    pub fn structural_hash(&self) -> BaseHash {
        BaseHash(self.tree_hash())
    }

    /// The id of the last block in this batch, for cross-batch continuity.
    pub fn last_block_id(&self) -> Option<&BaseBlockId> {
        self.blocks.get(&self.last_height).map(|block| &block.bid)
    }
}

impl AsHashTree for u64 {
    fn as_hash_tree(&self) -> HashTree {
        HashTree::atom_u64(*self)
    }
}
