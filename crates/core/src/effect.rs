//! Effect types for the deterministic kernel.
//!
//! Effects are **commands**: the driver executes them and may feed the
//! results back as causes. Effects produced by one cause are emitted
//! atomically with the state transition that produced them; a rolled-back
//! transition emits nothing but its stop.

use crate::cause::RawNockTx;
use crate::SignatureRequest;
use nockbridge_types::StopInfo;
use serde::{Deserialize, Serialize};

/// All possible outputs of the kernel.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Effect {
    /// Terminal: an invariant was violated. The kernel will not advance
    /// again until an operator intervenes.
    Stop { reason: String, last: StopInfo },

    /// Broadcast a batch of signature requests to the federation.
    ProposeBaseCall(Vec<SignatureRequest>),

    /// A fully signed Base call, ready for submission.
    BaseCall { sigs: Vec<Vec<u8>>, data: Vec<u8> },

    /// A Nock transaction ready for submission.
    NockchainTx { tx: RawNockTx },

    /// Ask the host to perform a gRPC peek on our behalf.
    GrpcPeek {
        pid: u64,
        kind: String,
        path: Vec<String>,
    },

    /// Ask the host to perform a gRPC call on our behalf.
    GrpcCall {
        ip: String,
        method: String,
        data: Vec<u8>,
    },
}

impl Effect {
    /// The effect name, for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Effect::Stop { .. } => "stop",
            Effect::ProposeBaseCall(_) => "propose-base-call",
            Effect::BaseCall { .. } => "base-call",
            Effect::NockchainTx { .. } => "nockchain-tx",
            Effect::GrpcPeek { .. } => "grpc-peek",
            Effect::GrpcCall { .. } => "grpc-call",
        }
    }

    /// Whether this effect is the terminal stop.
    pub fn is_stop(&self) -> bool {
        matches!(self, Effect::Stop { .. })
    }
}
