//! The dispatcher: one cause in, effects out.

use crate::KernelError;
use nockbridge_basechain::BaseOutcome;
use nockbridge_core::{Cause, Effect, SignatureRequest};
use nockbridge_ledger::BridgeState;
use nockbridge_types::{BridgeConstants, NockHash};
use std::panic::{catch_unwind, AssertUnwindSafe};
use tracing::{debug, info, instrument, warn};

/// What a routed cause did to the working state.
enum Outcome {
    Advanced(Vec<Effect>),
    Held(nockbridge_ledger::BaseHold),
    Stopped(String),
}

/// The bridge coordination kernel.
///
/// Owns the entire state between causes. `handle` is the only mutating
/// entry point and processes exactly one cause to completion; `peek`
/// answers read-only queries from the same consistent snapshot. Handlers
/// run against a clone of the state, so a cause that stops or holds
/// leaves everything else exactly as it was.
pub struct BridgeKernel {
    state: BridgeState,
}

impl BridgeKernel {
    /// A fresh kernel positioned at the configured start heights.
    pub fn new(constants: BridgeConstants, bridge_lock_root: NockHash) -> Self {
        Self {
            state: BridgeState::new(constants, bridge_lock_root),
        }
    }

    /// Restores a kernel from a persisted snapshot.
    pub fn from_state(state: BridgeState) -> Self {
        Self { state }
    }

    /// The current state, for peeks and persistence.
    pub fn state(&self) -> &BridgeState {
        &self.state
    }

    /// Processes one cause and returns the effects it produced.
    ///
    /// Gating, in order: a latched stop ignores everything except
    /// `Start`; an operator `Stop` latches unconditionally; a pending
    /// hold admits only the cause that advances the opposite chain (so
    /// the hold can resolve) and rejects the rest with a fresh,
    /// non-latching stop effect. Any fatal condition inside a handler
    /// rolls the state back, latches the stop, and emits a stop effect
    /// carrying the pre-event checkpoint.
    #[instrument(skip_all, fields(cause = cause.kind()))]
    pub fn handle(&mut self, cause: Cause) -> Vec<Effect> {
        if self.state.stop.is_some() {
            if matches!(cause, Cause::Start) {
                info!("operator start; clearing stop");
                self.state.stop = None;
            } else {
                warn!(cause = cause.kind(), "kernel is stopped; ignoring cause");
            }
            return Vec::new();
        }

        match cause {
            Cause::Stop(info) => {
                warn!(?info, "operator stop");
                self.state.stop = Some(info);
                return Vec::new();
            }
            Cause::Start => {
                debug!("start with no latched stop; nothing to clear");
                return Vec::new();
            }
            _ => {}
        }

        if let Some(hold) = self.state.hash_state.base_hold {
            if !matches!(cause, Cause::NockchainBlock { .. }) {
                warn!(cause = cause.kind(), held = %hold.hash, "holding for nockchain block");
                return vec![Effect::Stop {
                    reason: format!("holding for nockchain block {}", hold.hash),
                    last: self.state.checkpoint(),
                }];
            }
        }
        if let Some(hold) = self.state.hash_state.nock_hold {
            if !matches!(cause, Cause::BaseBlocks(_)) {
                warn!(cause = cause.kind(), held = %hold.hash, "holding for base chunk");
                return vec![Effect::Stop {
                    reason: format!("holding for base chunk {}", hold.hash),
                    last: self.state.checkpoint(),
                }];
            }
        }

        let kind = cause.kind();
        let checkpoint = self.state.checkpoint();
        let mut working = self.state.clone();
        let outcome = catch_unwind(AssertUnwindSafe(|| dispatch(&mut working, cause)));

        match outcome {
            Ok(Outcome::Advanced(effects)) => {
                self.state = working;
                effects
            }
            Ok(Outcome::Held(hold)) => {
                info!(held = %hold.hash, height = hold.height, "parking base advancement");
                self.state.hash_state.base_hold = Some(hold);
                Vec::new()
            }
            Ok(Outcome::Stopped(reason)) => {
                warn!(cause = kind, reason = %reason, "stopping");
                self.state.stop = Some(checkpoint);
                vec![Effect::Stop {
                    reason,
                    last: checkpoint,
                }]
            }
            Err(_) => {
                warn!(cause = kind, "handler crashed");
                self.state.stop = Some(checkpoint);
                vec![Effect::Stop {
                    reason: format!("crashed while handling {kind}"),
                    last: checkpoint,
                }]
            }
        }
    }
}

fn dispatch(state: &mut BridgeState, cause: Cause) -> Outcome {
    match cause {
        Cause::Stop(_) | Cause::Start => Outcome::Advanced(Vec::new()),

        Cause::CfgLoad(config) => {
            if let Some(config) = config {
                info!(nodes = config.nodes.len(), node_id = config.node_id, "loaded config");
                state.config = Some(config);
            }
            Outcome::Advanced(Vec::new())
        }

        Cause::SetConstants(constants) => match set_constants(state, constants) {
            Ok(()) => Outcome::Advanced(Vec::new()),
            Err(error) => Outcome::Stopped(error.to_string()),
        },

        Cause::NockchainBlock { page, txs } => {
            match nockbridge_nockchain::advance(state, &page, &txs) {
                Ok(effects) => Outcome::Advanced(effects),
                Err(error) => Outcome::Stopped(error.to_string()),
            }
        }

        Cause::BaseBlocks(raw) => match nockbridge_basechain::advance(state, &raw) {
            Ok(BaseOutcome::Advanced(effects)) => Outcome::Advanced(effects),
            Ok(BaseOutcome::Held(hold)) => Outcome::Held(hold),
            Err(error) => Outcome::Stopped(error.to_string()),
        },

        Cause::ProposedBaseCall(requests) => match proposed_base_call(state, &requests) {
            Ok(()) => Outcome::Advanced(Vec::new()),
            Err(error) => Outcome::Stopped(error.to_string()),
        },

        Cause::ProposedNockTx(_) => {
            Outcome::Stopped(KernelError::NockTxUnsupported.to_string())
        }
    }
}

/// Validates an admin constants update and applies it.
///
/// The start heights are rebased only while the bridge has not begun
/// processing, i.e. while each next height still equals the old start.
fn set_constants(state: &mut BridgeState, constants: BridgeConstants) -> Result<(), KernelError> {
    constants.validate()?;
    if state.hash_state.nock_next_height == state.constants.nockchain_start_height {
        state.hash_state.nock_next_height = constants.nockchain_start_height;
    }
    if state.hash_state.base_next_height == state.constants.base_start_height {
        state.hash_state.base_next_height = constants.base_start_height;
    }
    info!(
        min_signers = constants.min_signers,
        total_signers = constants.total_signers,
        chunk = constants.base_blocks_chunk,
        "constants updated"
    );
    state.constants = constants;
    Ok(())
}

/// Applies a peer's proposed batch: every referenced deposit moves from
/// unsettled to unconfirmed-settled, or nothing moves at all.
fn proposed_base_call(
    state: &mut BridgeState,
    requests: &[SignatureRequest],
) -> Result<(), KernelError> {
    for request in requests {
        if request.nonce >= state.next_nonce {
            return Err(KernelError::ProposalNonceTooHigh);
        }
        if state
            .hash_state
            .unconfirmed_settled_deposits
            .has(&request.as_of, &request.name)
        {
            return Err(KernelError::DoubleProposal);
        }
        let Some(deposit) = state
            .hash_state
            .unsettled_deposits
            .del(&request.as_of, &request.name)
        else {
            return Err(KernelError::ProposalUnknownDeposit);
        };
        state
            .hash_state
            .unconfirmed_settled_deposits
            .put(request.as_of, request.name, deposit);
        debug!(as_of = %request.as_of, nonce = request.nonce, "accepted peer proposal");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use nockbridge_core::RawNockTx;
    use nockbridge_types::{Digest, NockVersion, RawNockPage};
    use std::collections::BTreeMap;

    fn constants() -> BridgeConstants {
        BridgeConstants {
            nockchain_start_height: 7,
            base_start_height: 100,
            base_blocks_chunk: 3,
            ..Default::default()
        }
    }

    fn kernel() -> BridgeKernel {
        BridgeKernel::new(constants(), NockHash(Digest([0xbb; 32])))
    }

    fn page(height: u64, seed: u8, parent: NockHash) -> RawNockPage {
        RawNockPage {
            version: NockVersion::V1,
            height,
            digest: NockHash(Digest([seed; 32])),
            parent,
            tx_ids: Vec::new(),
        }
    }

    #[test]
    fn operator_stop_and_start() {
        let mut kernel = kernel();
        let checkpoint = kernel.state().checkpoint();
        assert!(kernel.handle(Cause::Stop(checkpoint)).is_empty());
        assert_eq!(kernel.state().stop, Some(checkpoint));

        // Everything but Start is ignored while stopped.
        let ignored = kernel.handle(Cause::NockchainBlock {
            page: page(7, 0x70, NockHash(Digest([0x6f; 32]))),
            txs: BTreeMap::new(),
        });
        assert!(ignored.is_empty());
        assert_eq!(kernel.state().hash_state.nock_next_height, 7);

        assert!(kernel.handle(Cause::Start).is_empty());
        assert_eq!(kernel.state().stop, None);

        // After start, causes advance again.
        kernel.handle(Cause::NockchainBlock {
            page: page(7, 0x70, NockHash(Digest([0x6f; 32]))),
            txs: BTreeMap::new(),
        });
        assert_eq!(kernel.state().hash_state.nock_next_height, 8);
    }

    #[test]
    fn handler_stop_latches_and_rolls_back() {
        let mut kernel = kernel();
        let before = kernel.state().hash_state.clone();
        let effects = kernel.handle(Cause::NockchainBlock {
            page: page(9, 0x90, NockHash(Digest([0x8f; 32]))),
            txs: BTreeMap::new(),
        });

        assert_eq!(effects.len(), 1);
        let Effect::Stop { reason, last } = &effects[0] else {
            panic!("expected stop, got {:?}", effects[0]);
        };
        assert_eq!(reason, "received block with height not equal to next height");
        assert_eq!(*last, kernel.state().checkpoint());
        assert_eq!(kernel.state().hash_state, before);
        assert!(kernel.state().stop.is_some());
    }

    #[test]
    fn proposed_nock_tx_always_stops() {
        let mut kernel = kernel();
        let effects = kernel.handle(Cause::ProposedNockTx(RawNockTx(vec![1, 2, 3])));
        assert_eq!(effects.len(), 1);
        assert!(effects[0].is_stop());
        assert!(kernel.state().stop.is_some());
    }

    #[test]
    fn cfg_load_none_is_a_no_op() {
        let mut kernel = kernel();
        assert!(kernel.handle(Cause::CfgLoad(None)).is_empty());
        assert_eq!(kernel.state().config, None);
    }

    #[test]
    fn set_constants_rebases_untouched_heights() {
        let mut kernel = kernel();
        let update = BridgeConstants {
            nockchain_start_height: 40,
            base_start_height: 400,
            base_blocks_chunk: 5,
            ..Default::default()
        };
        assert!(kernel.handle(Cause::SetConstants(update.clone())).is_empty());
        assert_eq!(kernel.state().hash_state.nock_next_height, 40);
        assert_eq!(kernel.state().hash_state.base_next_height, 400);
        assert_eq!(kernel.state().constants, update);
    }

    #[test]
    fn set_constants_keeps_heights_once_processing_began() {
        let mut kernel = kernel();
        kernel.handle(Cause::NockchainBlock {
            page: page(7, 0x70, NockHash(Digest([0x6f; 32]))),
            txs: BTreeMap::new(),
        });
        assert_eq!(kernel.state().hash_state.nock_next_height, 8);

        let update = BridgeConstants {
            nockchain_start_height: 40,
            base_start_height: 400,
            ..Default::default()
        };
        kernel.handle(Cause::SetConstants(update));
        assert_eq!(
            kernel.state().hash_state.nock_next_height,
            8,
            "nock height is not rebased after the first block"
        );
        assert_eq!(
            kernel.state().hash_state.base_next_height,
            400,
            "base height is still rebased while untouched"
        );
    }

    #[test]
    #[tracing_test::traced_test]
    fn stops_are_logged() {
        let mut kernel = kernel();
        kernel.handle(Cause::NockchainBlock {
            page: page(9, 0x90, NockHash(Digest([0x8f; 32]))),
            txs: BTreeMap::new(),
        });
        assert!(logs_contain("stopping"));

        kernel.handle(Cause::NockchainBlock {
            page: page(7, 0x70, NockHash(Digest([0x6f; 32]))),
            txs: BTreeMap::new(),
        });
        assert!(logs_contain("kernel is stopped; ignoring cause"));
    }

    #[test]
    fn invalid_constants_stop() {
        let mut kernel = kernel();
        let update = BridgeConstants {
            min_signers: 0,
            ..Default::default()
        };
        let effects = kernel.handle(Cause::SetConstants(update));
        assert_eq!(effects.len(), 1);
        assert!(effects[0].is_stop());
        assert_eq!(kernel.state().constants, constants());
    }
}
