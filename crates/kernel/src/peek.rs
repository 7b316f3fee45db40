//! Read-only queries.
//!
//! Peeks never mutate: the kernel is single-threaded, so every answer is
//! a consistent snapshot of the state between causes.

use crate::BridgeKernel;
use nockbridge_ledger::{BridgeState, HashState};
use nockbridge_types::{BridgeConstants, EvmAddress, Name, NockHash, NockTxId, StopInfo};
use serde::{Deserialize, Serialize};

/// Read-only queries the driver can issue.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Peek {
    State,
    HashState,
    Constants,
    StopInfo,
    /// Whether the awaited Base chunk of a pending nock hold has landed.
    NockHold,
    /// Whether the awaited Nock block of a pending base hold has landed.
    BaseHold,
    /// Vet a peer's proposal before signing it.
    ProposedDeposit {
        tx_id: NockTxId,
        nock_hash: NockHash,
        name: Name,
        recipient: EvmAddress,
        amount: u64,
        nonce: u64,
    },
}

/// Verdict on a peer's proposed deposit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Vet {
    /// The proposal matches our ledger: sign it.
    Approve,
    /// The proposal is wrong (double proposal, stale nonce, or a
    /// mismatch): refuse and treat as a stop signal.
    Reject,
    /// We do not know this deposit yet, likely still syncing. Not a
    /// failure; retry later.
    Unknown,
}

/// Answers to [`Peek`] queries.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PeekResponse {
    State(Box<BridgeState>),
    HashState(Box<HashState>),
    Constants(BridgeConstants),
    StopInfo(Option<StopInfo>),
    /// `None` when no hold is pending; otherwise whether the awaited
    /// record is present on its chain.
    HoldResolved(Option<bool>),
    Vet(Vet),
}

impl BridgeKernel {
    /// Answers a read-only query. Never mutates.
    pub fn peek(&self, query: Peek) -> PeekResponse {
        let state = self.state();
        match query {
            Peek::State => PeekResponse::State(Box::new(state.clone())),
            Peek::HashState => PeekResponse::HashState(Box::new(state.hash_state.clone())),
            Peek::Constants => PeekResponse::Constants(state.constants.clone()),
            Peek::StopInfo => PeekResponse::StopInfo(state.stop),
            Peek::NockHold => PeekResponse::HoldResolved(
                state
                    .hash_state
                    .nock_hold
                    .map(|hold| state.hash_state.contains_base(&hold.hash)),
            ),
            Peek::BaseHold => PeekResponse::HoldResolved(
                state
                    .hash_state
                    .base_hold
                    .map(|hold| state.hash_state.contains_nock(&hold.hash)),
            ),
            Peek::ProposedDeposit {
                tx_id,
                nock_hash,
                name,
                recipient,
                amount,
                nonce,
            } => PeekResponse::Vet(vet_proposed_deposit(
                state, tx_id, nock_hash, name, recipient, amount, nonce,
            )),
        }
    }
}

/// The decision table for vetting a peer's proposal:
/// a deposit already in the unconfirmed-settled quadrant is a double
/// proposal; one absent from both quadrants means this node is still
/// syncing; a stale nonce or any field mismatch is a hard reject.
fn vet_proposed_deposit(
    state: &BridgeState,
    tx_id: NockTxId,
    nock_hash: NockHash,
    name: Name,
    recipient: EvmAddress,
    amount: u64,
    nonce: u64,
) -> Vet {
    let ledger = &state.hash_state;
    if ledger
        .unconfirmed_settled_deposits
        .has(&nock_hash, &name)
    {
        return Vet::Reject;
    }
    let Some(deposit) = ledger.unsettled_deposits.get(&nock_hash, &name) else {
        return Vet::Unknown;
    };
    if nonce >= state.next_nonce {
        return Vet::Reject;
    }
    if deposit.tx_id == tx_id
        && deposit.dest == Some(recipient)
        && deposit.amount_to_mint == amount
    {
        Vet::Approve
    } else {
        Vet::Reject
    }
}
