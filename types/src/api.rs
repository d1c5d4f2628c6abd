//! Requests and responses exchanged with the consensus engine.
//!
//! Codes are carried as `u32` on the wire side so responses can be forwarded
//! without translation.

use crate::execution::{Code, GAS_WANTED};

/// Code returned by `Query` when the key is present.
pub const QUERY_FOUND: u32 = 0;

/// Code returned by `Query` when the key is absent.
pub const QUERY_NOT_FOUND: u32 = 3;

/// Block header as delivered by the consensus engine.
///
/// The contents do not influence validation or application.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Header {
    pub chain_id: String,
    pub height: u64,
    pub time_ms: u64,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RequestCheckTx {
    pub tx: Vec<u8>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResponseCheckTx {
    pub code: u32,
    pub gas_wanted: i64,
}

impl From<Code> for ResponseCheckTx {
    fn from(code: Code) -> Self {
        Self {
            code: code.into(),
            gas_wanted: GAS_WANTED,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RequestBeginBlock {
    pub header: Header,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResponseBeginBlock {}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RequestDeliverTx {
    pub tx: Vec<u8>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResponseDeliverTx {
    pub code: u32,
}

impl From<Code> for ResponseDeliverTx {
    fn from(code: Code) -> Self {
        Self { code: code.into() }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RequestEndBlock {
    pub height: u64,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResponseEndBlock {}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResponseCommit {
    /// Application state digest. Always empty.
    pub data: Vec<u8>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResponseInfo {
    pub last_block_height: u64,
    pub last_block_app_hash: Vec<u8>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RequestQuery {
    /// Key to look up.
    pub data: Vec<u8>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResponseQuery {
    pub code: u32,
    pub key: Vec<u8>,
    pub value: Vec<u8>,
    pub height: u64,
}
