//! Ledger state of the nockbridge coordination kernel.
//!
//! Holds the compound-key store, the per-chain hashchains with their hold
//! slots and movement quadrants, and the full [`BridgeState`] record the
//! dispatcher owns between causes. Pure data: every mutation happens
//! inside an advancer or the dispatcher, never here.

mod bridge_state;
mod hash_state;
mod pair_map;

pub use bridge_state::BridgeState;
pub use hash_state::{BaseHold, HashState, NockHold};
pub use pair_map::PairMap;
