//! Base chain advancer of the nockbridge coordination kernel.
//!
//! Consumes fixed-size chunks of Base blocks, matches deposit-settlement
//! events against the Nock-side ledger, and polices the nonce ordering
//! that binds each settlement to a signature request this bridge already
//! accounted for. A settlement referencing a Nock block the kernel has
//! not seen yet is not an error: it parks the Base chain behind a hold
//! until the missing block arrives.

mod advance;

use nockbridge_ledger::BaseHold;
use nockbridge_core::Effect;
use thiserror::Error;

pub use advance::advance;

/// Result of advancing the Base chain by one chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BaseOutcome {
    /// The chunk was appended (or ignored below the start height).
    Advanced(Vec<Effect>),
    /// A settlement referenced an unseen Nock block; the caller must
    /// discard the attempted append and park this hold instead.
    Held(BaseHold),
}

/// Fatal conditions while advancing the Base chain. Each becomes the
/// reason string of the stop effect the kernel emits.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BaseAdvanceError {
    /// The delivered chunk is empty, the wrong length, or has height gaps.
    #[error("base blocks chunk has wrong size")]
    WrongChunkSize,

    /// The driver skipped or replayed a chunk.
    #[error("received base blocks with first height not equal to next height")]
    HeightNotNext,

    /// A parent pointer mismatch inside the chunk or against the prior
    /// batch.
    #[error("base hashchain reorg")]
    Reorg,

    /// Signer-set rotation on the contract is not implemented.
    #[error("bridge node update event is not supported")]
    NodeUpdateUnsupported,

    /// A settlement carries a nonce the bridge never assigned.
    #[error("nonce in deposit settlement is not less than next nonce")]
    SettlementNonceTooHigh,

    /// A settlement references a deposit the ledger does not know.
    #[error("deposit referenced by settlement not found")]
    MissingDeposit,

    /// A settlement disagrees with the recorded deposit.
    #[error("deposit settlement does not match recorded deposit")]
    SettlementMismatch,
}
