//! The terminal checkpoint.

use crate::hash::{BaseHash, NockHash};
use serde::{Deserialize, Serialize};

/// Last-known-good position of both chains, captured when the kernel
/// stops. Embedded in every stop effect so an operator can inspect and
/// recover from a defined point.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StopInfo {
    pub base_hash: BaseHash,
    pub base_height: u64,
    pub nock_hash: NockHash,
    pub nock_height: u64,
}
