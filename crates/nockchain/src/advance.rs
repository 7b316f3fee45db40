//! Nock chain advancer.
//!
//! Validates and appends one Nock block, extracts bridge deposits from
//! its transactions, updates the ledger, and, when the local node is the
//! proposer for the block height, emits the signature requests that move
//! those deposits toward settlement on Base.

use crate::NockAdvanceError;
use nockbridge_core::{Effect, SignatureRequest};
use nockbridge_ledger::BridgeState;
use nockbridge_types::{
    calculate_fee, decode_bridge_recipient, is_local_proposer, Deposit, Name, NockBlock, NockHash,
    NockTx, NockTxId, NockVersion, RawNockPage, BA_BLK_TAG, BA_EID_TAG, BRIDGE_TAG,
};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info};

/// Validates and appends one Nock block.
///
/// Soft ignores (V0 pages, pages below the start height) return no
/// effects and leave the state untouched. Everything else either appends
/// the block, advancing `nock_next_height` by exactly one, or fails with
/// the reason the kernel will stop on. Callers are responsible for
/// discarding the state on failure.
pub fn advance(
    state: &mut BridgeState,
    page: &RawNockPage,
    txs: &BTreeMap<NockTxId, NockTx>,
) -> Result<Vec<Effect>, NockAdvanceError> {
    if matches!(page.version, NockVersion::V0) {
        debug!(height = page.height, "ignoring V0 nock block");
        return Ok(Vec::new());
    }

    let listed: BTreeSet<&NockTxId> = page.tx_ids.iter().collect();
    let present: BTreeSet<&NockTxId> = txs.keys().collect();
    if listed != present {
        return Err(NockAdvanceError::TxIdsMismatch);
    }

    if page.height < state.constants.nockchain_start_height {
        debug!(
            height = page.height,
            start = state.constants.nockchain_start_height,
            "ignoring nock block below start height"
        );
        return Ok(Vec::new());
    }

    if page.height != state.hash_state.nock_next_height {
        return Err(NockAdvanceError::HeightNotNext);
    }

    if let Some(last) = &state.last_block {
        if page.parent != last.block_id {
            return Err(NockAdvanceError::Reorg);
        }
    }

    let mut deposits: BTreeMap<Name, Deposit> = BTreeMap::new();
    for tx in txs.values() {
        if is_bridge_withdrawal(tx, &state.bridge_lock_root) {
            return Err(NockAdvanceError::WithdrawalDetected);
        }
        if !is_bridge_deposit(tx) {
            continue;
        }
        if let Some(deposit) = extract_deposit(state, tx) {
            deposits.insert(deposit.name, deposit);
        }
    }

    let prev = if state.hash_state.nock_is_empty() {
        NockHash::ZERO
    } else {
        state.hash_state.last_nock_block
    };
    let block = NockBlock {
        height: page.height,
        block_id: page.digest,
        deposits,
        withdrawal_settlements: BTreeMap::new(),
        prev,
    };
    if !block.withdrawal_settlements.is_empty() {
        return Err(NockAdvanceError::WithdrawalSettlement);
    }

    let block_hash = block.structural_hash();
    state
        .hash_state
        .nock_hashchain
        .insert(block_hash, block.clone());
    state.hash_state.last_nock_block = block_hash;
    state.hash_state.nock_next_height += 1;

    for (name, deposit) in &block.deposits {
        state
            .hash_state
            .unsettled_deposits
            .put(block_hash, *name, deposit.clone());
    }

    info!(
        height = block.height,
        block_hash = %block_hash,
        deposits = block.deposits.len(),
        "accepted nock block"
    );

    let mut effects = Vec::new();
    let proposing = state
        .config
        .as_ref()
        .is_some_and(|config| is_local_proposer(block.height, config));
    if proposing {
        let requests = propose_deposits(state, &block, block_hash);
        if !requests.is_empty() {
            info!(
                height = block.height,
                count = requests.len(),
                first_nonce = requests[0].nonce,
                "proposing base calls"
            );
            effects.push(Effect::ProposeBaseCall(requests));
        }
    }

    if let Some(hold) = state.hash_state.base_hold {
        if hold.hash == block_hash {
            info!(height = block.height, held = %hold.hash, "base hold resolved");
            state.hash_state.base_hold = None;
        }
    }

    state.last_block = Some(block);
    Ok(effects)
}

/// Moves each routable deposit to the unconfirmed-settled quadrant and
/// assigns its nonce, in ascending name order so the emitted nonces are
/// ascending and contiguous.
fn propose_deposits(
    state: &mut BridgeState,
    block: &NockBlock,
    block_hash: NockHash,
) -> Vec<SignatureRequest> {
    let mut requests = Vec::new();
    for (name, deposit) in &block.deposits {
        let Some(recipient) = deposit.dest else {
            continue;
        };
        let Some(moved) = state.hash_state.unsettled_deposits.del(&block_hash, name) else {
            continue;
        };
        state
            .hash_state
            .unconfirmed_settled_deposits
            .put(block_hash, *name, moved);

        requests.push(SignatureRequest {
            tx_id: deposit.tx_id,
            name: *name,
            recipient,
            amount: deposit.amount_to_mint,
            block_height: block.height,
            as_of: block_hash,
            nonce: state.next_nonce,
        });
        state.next_nonce += 1;
    }
    requests
}

/// A transaction deposits into the bridge when it is V1 and some output
/// note carries a `bridge` entry.
fn is_bridge_deposit(tx: &NockTx) -> bool {
    matches!(tx.version, NockVersion::V1)
        && tx.outputs.iter().any(|note| note.note_data.has(BRIDGE_TAG))
}

/// A transaction withdraws from the bridge when it is V1, every spent
/// note sits under the bridge lock root, and some output carries both
/// Base back-references.
fn is_bridge_withdrawal(tx: &NockTx, lock_root: &NockHash) -> bool {
    matches!(tx.version, NockVersion::V1)
        && !tx.inputs.is_empty()
        && tx.inputs.iter().all(|spent| spent.name.first == *lock_root)
        && tx
            .outputs
            .iter()
            .any(|note| note.note_data.has(BA_BLK_TAG) && note.note_data.has(BA_EID_TAG))
}

/// Extracts the deposit a transaction makes, if any.
///
/// The first output that carries a `bridge` entry, pays into the lock
/// root, and meets the minimum is the deposit note. A malformed recipient
/// still yields a recorded deposit with no destination; a deposit whose
/// net amount is zero is dropped.
fn extract_deposit(state: &BridgeState, tx: &NockTx) -> Option<Deposit> {
    let minimum = state.constants.minimum_deposit_nicks();
    let note = tx.outputs.iter().find(|note| {
        note.note_data.has(BRIDGE_TAG)
            && note.name.first == state.bridge_lock_root
            && note.assets >= minimum
    })?;

    let dest = note
        .note_data
        .get(BRIDGE_TAG)
        .and_then(decode_bridge_recipient);

    let fee = calculate_fee(note.assets, state.constants.nicks_fee_per_nock);
    let amount_to_mint = note.assets.saturating_sub(fee);
    if amount_to_mint == 0 {
        debug!(tx_id = ?tx.id, "dropping deposit with zero net amount");
        return None;
    }

    Some(Deposit {
        tx_id: tx.id,
        name: note.name,
        dest,
        amount_to_mint,
        fee,
    })
}
