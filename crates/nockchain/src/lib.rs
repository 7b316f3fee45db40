//! Nock chain advancer of the nockbridge coordination kernel.
//!
//! Consumes one validated Nock block at a time and keeps the Nock side of
//! the ledger moving: deposits enter the unsettled quadrant as their
//! block is appended, and the proposer for the height moves them onward
//! by emitting signature requests with freshly assigned nonces.

mod advance;

use thiserror::Error;

pub use advance::advance;

/// Fatal conditions while advancing the Nock chain. Each becomes the
/// reason string of the stop effect the kernel emits.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NockAdvanceError {
    /// The page's transaction id list and the delivered transaction map
    /// disagree.
    #[error("tx-ids mismatch")]
    TxIdsMismatch,

    /// The driver skipped or replayed a height.
    #[error("received block with height not equal to next height")]
    HeightNotNext,

    /// The page's parent digest does not match the last accepted block.
    #[error("hashchain reorg")]
    Reorg,

    /// A transaction spends from the bridge lock root with Base
    /// back-references.
    #[error("fatal: withdrawal tx detected but withdrawals are not permitted")]
    WithdrawalDetected,

    /// A block carried a withdrawal settlement.
    #[error("withdrawal settlement detected but withdrawals are not permitted")]
    WithdrawalSettlement,
}
