use std::fmt::{self, Display, Formatter};

use alloy_primitives::B256;
use serde::{Deserialize, Serialize};

/// Pending transfer returned by a wallet provider once it accepted a
/// submission. Wraps the transaction hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransferHandle(pub B256);

impl TransferHandle {
    pub fn tx_hash(&self) -> B256 {
        self.0
    }
}

impl Display for TransferHandle {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<B256> for TransferHandle {
    fn from(hash: B256) -> Self {
        Self(hash)
    }
}

/// Final word from the chain on a submitted transfer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum TransferOutcome {
    Settled,
    Failed { reason: String },
}

impl TransferOutcome {
    pub fn is_settled(&self) -> bool {
        matches!(self, TransferOutcome::Settled)
    }
}
