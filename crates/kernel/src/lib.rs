//! Dispatcher and read surface of the nockbridge coordination kernel.
//!
//! The kernel is a deterministic state machine: the driver feeds it one
//! cause at a time, it mutates its owned [`BridgeState`] and returns the
//! effects the driver must execute. Any invariant violation becomes a
//! single terminal stop effect carrying the last-known-good checkpoint of
//! both chains; after that, only an operator start moves anything again.
//!
//! ```text
//! Causes → BridgeKernel::handle() → Effects
//!            BridgeKernel::peek()  → read-only answers
//! ```

mod kernel;
mod peek;

use nockbridge_types::ConstantsError;
use thiserror::Error;

pub use kernel::BridgeKernel;
pub use nockbridge_ledger::BridgeState;
pub use peek::{Peek, PeekResponse, Vet};

/// Fatal conditions raised by the dispatcher's own handlers. Each becomes
/// the reason string of the stop effect the kernel emits.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KernelError {
    /// A peer proposed a nonce the bridge has not assigned yet.
    #[error("nonce in proposed base call is greater than or equal to next-nonce")]
    ProposalNonceTooHigh,

    /// A peer proposed a deposit that was already proposed.
    #[error("encountered double proposal for deposit")]
    DoubleProposal,

    /// A peer proposed a deposit this node has never recorded.
    #[error("proposed deposit not in unsettled-deposits")]
    ProposalUnknownDeposit,

    /// An admin constants update failed validation.
    #[error("invalid constants update: {0}")]
    InvalidConstants(#[from] ConstantsError),

    /// Nock transactions cannot be proposed while withdrawals are
    /// disabled.
    #[error("proposed nockchain tx is not supported; withdrawals are disabled")]
    NockTxUnsupported,
}
