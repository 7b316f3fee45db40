//! Core types for the nockbridge coordination kernel.
//!
//! This crate provides the foundational types used throughout the bridge:
//!
//! - **Hashing**: the bridge field, the TIP5 sponge, and the canonical
//!   hash-tree encoder that gives every record a structural identity
//! - **Codecs**: the based-list radix-`p` split and the EVM address codec
//! - **Chain records**: Nock blocks, Base block batches, deposits,
//!   withdrawals, and settlements
//! - **Configuration**: bridge constants and the signer federation
//! - **Rotation**: deterministic proposer/verifier selection
//!
//! # Design Philosophy
//!
//! This crate is self-contained and performs no I/O. Everything here is
//! plain data with deterministic encodings; all maps that feed the hasher
//! or drive emission order are `BTreeMap`, so iteration order is the
//! documented key-ascending tap order.

mod based;
mod block;
mod config;
mod eth;
mod felt;
mod hash;
mod hashtree;
mod note;
mod roster;
mod stop;
mod tip5;

pub use based::{based_to_evm, evm_to_based, BasedError, BasedList, EVM_ADDRESS_CHUNKS};
pub use block::{
    BaseBlockBatch, BaseBlockId, BaseBlockRef, BaseEventId, BaseTxId, Deposit, DepositSettlement,
    NockBlock, RawNockPage, Withdrawal, WithdrawalSettlement,
};
pub use config::{
    calculate_fee, BridgeConstants, ConstantsError, NockPublicKey, NodeConfig, SecretKeyBytes,
    SignerPeer, NICKS_PER_NOCK,
};
pub use eth::{EvmAddress, EvmAddressParseError};
pub use felt::{Felt, P};
pub use hash::{BaseHash, Digest, NockHash};
pub use hashtree::{tree_hash, AsHashTree, HashTree};
pub use note::{
    decode_bridge_recipient, encode_bridge_recipient, Name, NockTx, NockTxId, NockVersion,
    NoteData, OutputNote, SpentNote, BA_BLK_TAG, BA_EID_TAG, BRIDGE_TAG,
};
pub use roster::{active_proposer, active_verifiers, is_local_proposer, key_hash, sorted_signers};
pub use stop::StopInfo;
pub use tip5::{hash_varlen, permute, DIGEST_WIDTH, RATE, STATE_WIDTH};
