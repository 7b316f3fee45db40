//! Cause types for the deterministic kernel.
//!
//! Causes are **passive data**: they describe something the driver
//! observed or wants. The kernel processes one cause to completion and
//! returns effects; causes never carry callbacks or handles.

use crate::SignatureRequest;
use alloy_primitives::U256;
use nockbridge_types::{
    BridgeConstants, EvmAddress, Name, NockHash, NockTx, NockTxId, NodeConfig, RawNockPage,
    StopInfo,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// An undecoded Nock transaction, carried only to be rejected.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawNockTx(pub Vec<u8>);

/// A settlement event as the Base driver reports it, before the kernel
/// encodes its identifiers into based form.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawDepositSettlement {
    pub event_id: U256,
    pub counterpart_name: Name,
    /// Structural hash of the Nock block that recorded the deposit.
    pub as_of: NockHash,
    pub nock_height: u64,
    pub dest: EvmAddress,
    pub settled_amount: u64,
    pub nonce: u64,
}

/// A burn-for-withdrawal event as the Base driver reports it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawWithdrawal {
    pub event_id: U256,
    pub tx_id: U256,
    pub recipient: Name,
    pub amount: u64,
}

/// One event observed in a Base block.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BaseEvent {
    /// The bridge contract settled a deposit.
    DepositProcessed(RawDepositSettlement),
    /// The contract's signer set changed. Not yet implemented: stops.
    BridgeNodeUpdated,
    /// Tokens burned to withdraw back to Nock.
    BurnForWithdrawal(RawWithdrawal),
}

/// One Base block in a delivered chunk.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawBaseBlock {
    pub height: u64,
    pub block_id: U256,
    pub parent_block_id: U256,
    pub events: Vec<BaseEvent>,
}

/// All possible inputs to the kernel.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Cause {
    /// Replace the node configuration; `None` keeps the current one.
    CfgLoad(Option<NodeConfig>),

    /// Admin update of the bridge constants.
    SetConstants(BridgeConstants),

    /// Operator: latch the stop state.
    Stop(StopInfo),

    /// Operator: clear the stop state. Clears nothing else.
    Start,

    /// One full chunk of Base blocks.
    BaseBlocks(Vec<RawBaseBlock>),

    /// One validated Nock block plus its full transactions.
    NockchainBlock {
        page: RawNockPage,
        txs: BTreeMap<NockTxId, NockTx>,
    },

    /// A peer's proposed batch of Base calls.
    ProposedBaseCall(Vec<SignatureRequest>),

    /// A peer's proposed Nock transaction. Always rejected: the
    /// withdrawal gate is closed in this release.
    ProposedNockTx(RawNockTx),
}

impl Cause {
    /// The cause name, used for stop tagging and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Cause::CfgLoad(_) => "cfg-load",
            Cause::SetConstants(_) => "set-constants",
            Cause::Stop(_) => "stop",
            Cause::Start => "start",
            Cause::BaseBlocks(_) => "base-blocks",
            Cause::NockchainBlock { .. } => "nockchain-block",
            Cause::ProposedBaseCall(_) => "proposed-base-call",
            Cause::ProposedNockTx(_) => "proposed-nock-tx",
        }
    }
}
