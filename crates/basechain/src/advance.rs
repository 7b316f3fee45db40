//! Base chain advancer.

use crate::{BaseAdvanceError, BaseOutcome};
use nockbridge_core::{BaseEvent, RawBaseBlock};
use nockbridge_ledger::{BaseHold, BridgeState};
use nockbridge_types::{
    BaseBlockBatch, BaseBlockId, BaseBlockRef, BaseEventId, BaseHash, BaseTxId, DepositSettlement,
    Withdrawal,
};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// Validates and appends one chunk of Base blocks.
///
/// Chunks below the start height are ignored. A successfully appended
/// chunk advances `base_next_height` by exactly the chunk size. When a
/// settlement references an unseen Nock block the attempted append must
/// be discarded by the caller and replaced by the returned hold; the
/// driver redelivers the same chunk once the hold resolves.
pub fn advance(
    state: &mut BridgeState,
    raw: &[RawBaseBlock],
) -> Result<BaseOutcome, BaseAdvanceError> {
    let chunk_size = state.constants.base_blocks_chunk;
    let (Some(first), Some(last)) = (raw.first(), raw.last()) else {
        return Err(BaseAdvanceError::WrongChunkSize);
    };
    let span = last
        .height
        .checked_sub(first.height)
        .and_then(|span| span.checked_add(1));
    if span != Some(chunk_size) {
        return Err(BaseAdvanceError::WrongChunkSize);
    }
    for pair in raw.windows(2) {
        if pair[1].height != pair[0].height + 1 {
            return Err(BaseAdvanceError::WrongChunkSize);
        }
    }

    if first.height < state.constants.base_start_height {
        debug!(
            first_height = first.height,
            start = state.constants.base_start_height,
            "ignoring base chunk below start height"
        );
        return Ok(BaseOutcome::Advanced(Vec::new()));
    }

    if first.height != state.hash_state.base_next_height {
        return Err(BaseAdvanceError::HeightNotNext);
    }

    for pair in raw.windows(2) {
        if pair[1].parent_block_id != pair[0].block_id {
            return Err(BaseAdvanceError::Reorg);
        }
    }
    if let Some(prior) = state.hash_state.last_base_block_id() {
        if BaseBlockId::from_atom(first.parent_block_id) != *prior {
            return Err(BaseAdvanceError::Reorg);
        }
    }

    let batch = encode_batch(state, raw)?;
    let batch_hash = batch.structural_hash();
    state
        .hash_state
        .base_hashchain
        .insert(batch_hash, batch.clone());
    state.hash_state.last_base_blocks = batch_hash;
    state.hash_state.base_next_height += chunk_size;

    info!(
        first_height = batch.first_height,
        last_height = batch.last_height,
        batch_hash = %batch_hash,
        settlements = batch.deposit_settlements.len(),
        "accepted base chunk"
    );

    if !batch.withdrawals.is_empty() {
        warn!(
            count = batch.withdrawals.len(),
            "recording burn-for-withdrawal events; withdrawal processing is disabled"
        );
        for (event_id, withdrawal) in &batch.withdrawals {
            state.hash_state.unsettled_withdrawals.put(
                batch_hash,
                event_id.clone(),
                withdrawal.clone(),
            );
        }
    }

    let hold = process_settlements(state, &batch)?;

    if let Some(parked) = state.hash_state.nock_hold {
        if parked.hash == batch_hash {
            info!(held = %parked.hash, "nock hold resolved");
            state.hash_state.nock_hold = None;
        }
    }

    match hold {
        Some(hold) => Ok(BaseOutcome::Held(hold)),
        None => Ok(BaseOutcome::Advanced(Vec::new())),
    }
}

fn encode_batch(
    state: &BridgeState,
    raw: &[RawBaseBlock],
) -> Result<BaseBlockBatch, BaseAdvanceError> {
    let mut blocks = BTreeMap::new();
    let mut withdrawals = BTreeMap::new();
    let mut deposit_settlements = BTreeMap::new();

    for block in raw {
        blocks.insert(
            block.height,
            BaseBlockRef {
                bid: BaseBlockId::from_atom(block.block_id),
                parent: BaseBlockId::from_atom(block.parent_block_id),
            },
        );
        for event in &block.events {
            match event {
                BaseEvent::BridgeNodeUpdated => {
                    return Err(BaseAdvanceError::NodeUpdateUnsupported);
                }
                BaseEvent::DepositProcessed(settlement) => {
                    let event_id = BaseEventId::from_atom(settlement.event_id);
                    deposit_settlements.insert(
                        event_id.clone(),
                        DepositSettlement {
                            event_id,
                            counterpart_name: settlement.counterpart_name,
                            as_of: settlement.as_of,
                            nock_height: settlement.nock_height,
                            dest: settlement.dest,
                            settled_amount: settlement.settled_amount,
                            nonce: settlement.nonce,
                        },
                    );
                }
                BaseEvent::BurnForWithdrawal(withdrawal) => {
                    let event_id = BaseEventId::from_atom(withdrawal.event_id);
                    withdrawals.insert(
                        event_id.clone(),
                        Withdrawal {
                            event_id,
                            tx_id: BaseTxId::from_atom(withdrawal.tx_id),
                            recipient: withdrawal.recipient,
                            amount: withdrawal.amount,
                        },
                    );
                }
            }
        }
    }

    let prev = if state.hash_state.base_hashchain.is_empty() {
        BaseHash::ZERO
    } else {
        state.hash_state.last_base_blocks
    };

    Ok(BaseBlockBatch {
        first_height: raw[0].height,
        last_height: raw[raw.len() - 1].height,
        blocks,
        withdrawals,
        deposit_settlements,
        prev,
    })
}

/// Matches settlements against the Nock-side ledger, in map order.
///
/// The loop runs in two phases. A settlement whose `as_of` block is
/// unknown installs a hold (a later one may raise it to a greater
/// height); once any hold is pending, remaining settlements are only
/// nonce-checked and hold-raised, never matched. They are retried when
/// the driver redelivers the chunk after the hold resolves.
fn process_settlements(
    state: &mut BridgeState,
    batch: &BaseBlockBatch,
) -> Result<Option<BaseHold>, BaseAdvanceError> {
    let mut hold: Option<BaseHold> = None;

    for settlement in batch.deposit_settlements.values() {
        if settlement.nonce >= state.next_nonce {
            return Err(BaseAdvanceError::SettlementNonceTooHigh);
        }

        if !state.hash_state.contains_nock(&settlement.as_of) {
            let candidate = BaseHold {
                hash: settlement.as_of,
                height: settlement.nock_height,
            };
            hold = Some(match hold {
                Some(current) if current.height >= candidate.height => current,
                _ => candidate,
            });
            debug!(
                as_of = %settlement.as_of,
                nock_height = settlement.nock_height,
                "settlement references unseen nock block"
            );
            continue;
        }

        if hold.is_some() {
            continue;
        }

        let deposit = state
            .hash_state
            .nock_hashchain
            .get(&settlement.as_of)
            .and_then(|block| block.deposits.get(&settlement.counterpart_name))
            .cloned()
            .ok_or(BaseAdvanceError::MissingDeposit)?;

        let key = (&settlement.as_of, &settlement.counterpart_name);
        let tracked = state.hash_state.unsettled_deposits.has(key.0, key.1)
            || state
                .hash_state
                .unconfirmed_settled_deposits
                .has(key.0, key.1);
        if !tracked {
            return Err(BaseAdvanceError::MissingDeposit);
        }

        if deposit.dest != Some(settlement.dest)
            || deposit.amount_to_mint != settlement.settled_amount
        {
            return Err(BaseAdvanceError::SettlementMismatch);
        }

        state
            .hash_state
            .unsettled_deposits
            .del(&settlement.as_of, &settlement.counterpart_name);
        state
            .hash_state
            .unconfirmed_settled_deposits
            .del(&settlement.as_of, &settlement.counterpart_name);

        info!(
            as_of = %settlement.as_of,
            nonce = settlement.nonce,
            amount = settlement.settled_amount,
            "deposit settled on base"
        );
    }

    Ok(hold)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::U256;
    use nockbridge_core::{RawDepositSettlement, RawWithdrawal};
    use nockbridge_types::{
        BridgeConstants, Deposit, Digest, EvmAddress, Name, NockBlock, NockHash, NockTxId,
    };
    use nockbridge_ledger::NockHold;

    fn constants() -> BridgeConstants {
        BridgeConstants {
            base_blocks_chunk: 3,
            base_start_height: 100,
            nockchain_start_height: 7,
            ..Default::default()
        }
    }

    fn fresh_state() -> BridgeState {
        BridgeState::new(constants(), NockHash(Digest([0xbb; 32])))
    }

    fn block_id(height: u64) -> U256 {
        U256::from(1_000 + height)
    }

    fn chunk(first_height: u64) -> Vec<RawBaseBlock> {
        (first_height..first_height + 3)
            .map(|height| RawBaseBlock {
                height,
                block_id: block_id(height),
                parent_block_id: block_id(height - 1),
                events: Vec::new(),
            })
            .collect()
    }

    fn seed_nock_deposit(state: &mut BridgeState, proposed: bool) -> (NockHash, Name, Deposit) {
        let name = Name::new(state.bridge_lock_root, NockHash(Digest([0x44; 32])));
        let deposit = Deposit {
            tx_id: NockTxId(Digest([0x45; 32])),
            name,
            dest: Some(EvmAddress([9; EvmAddress::LEN])),
            amount_to_mint: 500,
            fee: 5,
        };
        let mut deposits = std::collections::BTreeMap::new();
        deposits.insert(name, deposit.clone());
        let block = NockBlock {
            height: 7,
            block_id: NockHash(Digest([0x70; 32])),
            deposits,
            withdrawal_settlements: std::collections::BTreeMap::new(),
            prev: NockHash::ZERO,
        };
        let hash = block.structural_hash();
        state.hash_state.nock_hashchain.insert(hash, block);
        state.hash_state.last_nock_block = hash;
        state.hash_state.nock_next_height = 8;
        if proposed {
            state
                .hash_state
                .unconfirmed_settled_deposits
                .put(hash, name, deposit.clone());
        } else {
            state
                .hash_state
                .unsettled_deposits
                .put(hash, name, deposit.clone());
        }
        state.next_nonce = 2;
        (hash, name, deposit)
    }

    fn settlement(
        event_seed: u64,
        as_of: NockHash,
        name: Name,
        dest: EvmAddress,
        amount: u64,
        nonce: u64,
    ) -> BaseEvent {
        BaseEvent::DepositProcessed(RawDepositSettlement {
            event_id: U256::from(event_seed),
            counterpart_name: name,
            as_of,
            nock_height: 7,
            dest,
            settled_amount: amount,
            nonce,
        })
    }

    #[test]
    fn happy_chunk_appends() {
        let mut state = fresh_state();
        let outcome = advance(&mut state, &chunk(100)).expect("chunk accepted");
        assert_eq!(outcome, BaseOutcome::Advanced(Vec::new()));
        assert_eq!(state.hash_state.base_next_height, 103);
        assert_eq!(state.hash_state.base_hashchain.len(), 1);
        assert_eq!(
            state.hash_state.last_base_block_id(),
            Some(&BaseBlockId::from_atom(block_id(102)))
        );
    }

    #[test]
    fn consecutive_chunks_link() {
        let mut state = fresh_state();
        advance(&mut state, &chunk(100)).expect("first chunk");
        let first_hash = state.hash_state.last_base_blocks;
        advance(&mut state, &chunk(103)).expect("second chunk");

        assert_eq!(state.hash_state.base_next_height, 106);
        assert_eq!(state.hash_state.base_hashchain.len(), 2);
        let last = state.hash_state.last_base_batch().expect("batch present");
        assert_eq!(last.prev, first_hash);
    }

    #[test]
    fn wrong_chunk_size_is_rejected() {
        let mut state = fresh_state();
        assert_eq!(
            advance(&mut state, &[]),
            Err(BaseAdvanceError::WrongChunkSize)
        );
        assert_eq!(
            advance(&mut state, &chunk(100)[..2]),
            Err(BaseAdvanceError::WrongChunkSize)
        );

        let mut gapped = chunk(100);
        gapped[2].height = 105;
        assert_eq!(
            advance(&mut state, &gapped),
            Err(BaseAdvanceError::WrongChunkSize)
        );
    }

    #[test]
    fn chunk_below_start_height_is_ignored() {
        let mut state = fresh_state();
        let before = state.clone();
        let outcome = advance(&mut state, &chunk(90)).expect("ignored");
        assert_eq!(outcome, BaseOutcome::Advanced(Vec::new()));
        assert_eq!(state, before);
    }

    #[test]
    fn first_height_mismatch_is_rejected() {
        let mut state = fresh_state();
        assert_eq!(
            advance(&mut state, &chunk(103)),
            Err(BaseAdvanceError::HeightNotNext)
        );
    }

    #[test]
    fn internal_parent_mismatch_is_rejected() {
        let mut state = fresh_state();
        let mut blocks = chunk(100);
        blocks[1].parent_block_id = U256::from(9_999);
        assert_eq!(advance(&mut state, &blocks), Err(BaseAdvanceError::Reorg));
    }

    #[test]
    fn cross_batch_parent_mismatch_is_rejected() {
        let mut state = fresh_state();
        advance(&mut state, &chunk(100)).expect("first chunk");
        let mut blocks = chunk(103);
        blocks[0].parent_block_id = U256::from(9_999);
        assert_eq!(advance(&mut state, &blocks), Err(BaseAdvanceError::Reorg));
    }

    #[test]
    fn node_update_event_is_rejected() {
        let mut state = fresh_state();
        let mut blocks = chunk(100);
        blocks[0].events.push(BaseEvent::BridgeNodeUpdated);
        assert_eq!(
            advance(&mut state, &blocks),
            Err(BaseAdvanceError::NodeUpdateUnsupported)
        );
    }

    #[test]
    fn burn_for_withdrawal_is_recorded() {
        let mut state = fresh_state();
        let mut blocks = chunk(100);
        blocks[1].events.push(BaseEvent::BurnForWithdrawal(RawWithdrawal {
            event_id: U256::from(88u64),
            tx_id: U256::from(8_800u64),
            recipient: Name::new(NockHash(Digest([1; 32])), NockHash(Digest([2; 32]))),
            amount: 1_000,
        }));

        advance(&mut state, &blocks).expect("chunk accepted");
        let batch_hash = state.hash_state.last_base_blocks;
        assert!(state
            .hash_state
            .unsettled_withdrawals
            .has(&batch_hash, &BaseEventId::from_atom(U256::from(88u64))));
        assert_eq!(state.hash_state.unsettled_withdrawals.count(), 1);
    }

    #[test]
    fn settlement_clears_deposit_from_both_quadrants() {
        let mut state = fresh_state();
        let (as_of, name, deposit) = seed_nock_deposit(&mut state, true);
        let mut blocks = chunk(100);
        blocks[0].events.push(settlement(
            501,
            as_of,
            name,
            deposit.dest.expect("routable"),
            deposit.amount_to_mint,
            1,
        ));

        let outcome = advance(&mut state, &blocks).expect("chunk accepted");
        assert_eq!(outcome, BaseOutcome::Advanced(Vec::new()));
        assert!(state.hash_state.unsettled_deposits.is_empty());
        assert!(state.hash_state.unconfirmed_settled_deposits.is_empty());
    }

    #[test]
    fn settlement_of_unproposed_deposit_also_clears() {
        let mut state = fresh_state();
        let (as_of, name, deposit) = seed_nock_deposit(&mut state, false);
        let mut blocks = chunk(100);
        blocks[0].events.push(settlement(
            501,
            as_of,
            name,
            deposit.dest.expect("routable"),
            deposit.amount_to_mint,
            1,
        ));

        advance(&mut state, &blocks).expect("chunk accepted");
        assert!(state.hash_state.unsettled_deposits.is_empty());
    }

    #[test]
    fn settlement_nonce_at_or_above_next_is_rejected() {
        let mut state = fresh_state();
        let (as_of, name, deposit) = seed_nock_deposit(&mut state, true);
        let mut blocks = chunk(100);
        blocks[0].events.push(settlement(
            501,
            as_of,
            name,
            deposit.dest.expect("routable"),
            deposit.amount_to_mint,
            state.next_nonce,
        ));

        assert_eq!(
            advance(&mut state, &blocks),
            Err(BaseAdvanceError::SettlementNonceTooHigh)
        );
    }

    #[test]
    fn unknown_as_of_installs_a_hold() {
        let mut state = fresh_state();
        state.next_nonce = 2;
        let unseen = NockHash(Digest([0xaa; 32]));
        let mut blocks = chunk(100);
        blocks[0].events.push(settlement(
            501,
            unseen,
            Name::new(NockHash(Digest([1; 32])), NockHash(Digest([2; 32]))),
            EvmAddress([9; EvmAddress::LEN]),
            500,
            1,
        ));

        let outcome = advance(&mut state, &blocks).expect("hold installed");
        assert_eq!(
            outcome,
            BaseOutcome::Held(BaseHold {
                hash: unseen,
                height: 7,
            })
        );
    }

    #[test]
    fn greatest_height_hold_wins() {
        let mut state = fresh_state();
        state.next_nonce = 3;
        let lower = NockHash(Digest([0xaa; 32]));
        let higher = NockHash(Digest([0xab; 32]));
        let name = Name::new(NockHash(Digest([1; 32])), NockHash(Digest([2; 32])));
        let mut blocks = chunk(100);
        blocks[0].events.push(BaseEvent::DepositProcessed(RawDepositSettlement {
            event_id: U256::from(1u64),
            counterpart_name: name,
            as_of: lower,
            nock_height: 7,
            dest: EvmAddress([9; EvmAddress::LEN]),
            settled_amount: 500,
            nonce: 1,
        }));
        blocks[0].events.push(BaseEvent::DepositProcessed(RawDepositSettlement {
            event_id: U256::from(2u64),
            counterpart_name: name,
            as_of: higher,
            nock_height: 9,
            dest: EvmAddress([9; EvmAddress::LEN]),
            settled_amount: 500,
            nonce: 2,
        }));

        let outcome = advance(&mut state, &blocks).expect("hold installed");
        assert_eq!(
            outcome,
            BaseOutcome::Held(BaseHold {
                hash: higher,
                height: 9,
            })
        );
    }

    #[test]
    fn pending_hold_skips_later_matching() {
        let mut state = fresh_state();
        let (as_of, name, deposit) = seed_nock_deposit(&mut state, true);
        let unseen = NockHash(Digest([0xaa; 32]));
        let mut blocks = chunk(100);
        // Event id 1 installs the hold; event id 2 would mismatch if it
        // were matched, but must be skipped instead.
        blocks[0].events.push(settlement(1, unseen, name, deposit.dest.expect("routable"), 500, 1));
        blocks[0].events.push(settlement(
            2,
            as_of,
            name,
            deposit.dest.expect("routable"),
            deposit.amount_to_mint + 1,
            1,
        ));

        let outcome = advance(&mut state, &blocks).expect("hold, not mismatch");
        assert!(matches!(outcome, BaseOutcome::Held(_)));
    }

    #[test]
    fn settlement_mismatch_is_rejected() {
        let mut state = fresh_state();
        let (as_of, name, deposit) = seed_nock_deposit(&mut state, true);
        let mut blocks = chunk(100);
        blocks[0].events.push(settlement(
            501,
            as_of,
            name,
            deposit.dest.expect("routable"),
            deposit.amount_to_mint + 1,
            1,
        ));

        assert_eq!(
            advance(&mut state, &blocks),
            Err(BaseAdvanceError::SettlementMismatch)
        );
    }

    #[test]
    fn settlement_for_unknown_name_is_rejected() {
        let mut state = fresh_state();
        let (as_of, _, deposit) = seed_nock_deposit(&mut state, true);
        let stranger = Name::new(NockHash(Digest([0x77; 32])), NockHash(Digest([0x78; 32])));
        let mut blocks = chunk(100);
        blocks[0].events.push(settlement(
            501,
            as_of,
            stranger,
            deposit.dest.expect("routable"),
            deposit.amount_to_mint,
            1,
        ));

        assert_eq!(
            advance(&mut state, &blocks),
            Err(BaseAdvanceError::MissingDeposit)
        );
    }

    #[test]
    fn matching_chunk_clears_nock_hold() {
        let mut scratch = fresh_state();
        advance(&mut scratch, &chunk(100)).expect("chunk accepted");
        let upcoming = scratch.hash_state.last_base_blocks;

        let mut state = fresh_state();
        state.hash_state.nock_hold = Some(NockHold {
            hash: upcoming,
            height: 100,
        });
        advance(&mut state, &chunk(100)).expect("chunk accepted");
        assert_eq!(state.hash_state.nock_hold, None);
    }
}
