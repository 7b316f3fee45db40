//! Causes and effects of the nockbridge coordination kernel.
//!
//! The kernel is built on a simple event-driven model:
//!
//! ```text
//! Causes → kernel handle() → Effects
//! ```
//!
//! The kernel is:
//! - **Synchronous**: no async, no suspension points
//! - **Deterministic**: same state + cause = same effects
//! - **Pure-ish**: owns its state, performs no I/O
//!
//! All I/O is handled by the host driver, which:
//! 1. Serializes causes and delivers them one at a time
//! 2. Executes the returned effects
//! 3. Feeds chain observations back in as new causes

mod cause;
mod effect;
mod signature_request;

pub use cause::{BaseEvent, Cause, RawBaseBlock, RawDepositSettlement, RawNockTx, RawWithdrawal};
pub use effect::Effect;
pub use signature_request::{SignatureRequest, PREIMAGE_LEN};
