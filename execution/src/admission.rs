//! Admission predicate shared by gossip-time checks and block delivery.

use crate::{Fatal, ReadView};
use anyhow::Context as _;
use kvchain_types::{Code, Transaction};
use tracing::debug;

/// Result of running the predicate on raw transaction bytes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Admission {
    Accepted(Transaction),
    Rejected(Code),
}

impl Admission {
    pub fn code(&self) -> Code {
        match self {
            Admission::Accepted(_) => Code::Valid,
            Admission::Rejected(code) => *code,
        }
    }
}

/// Decide whether `raw` would be accepted if applied next on top of `view`.
pub async fn admit<V: ReadView>(view: &V, raw: &[u8]) -> Result<Admission, Fatal> {
    let tx = match Transaction::parse(raw) {
        Ok(tx) => tx,
        Err(err) => {
            debug!(%err, len = raw.len(), "rejecting malformed transaction");
            return Ok(Admission::Rejected(err.into()));
        }
    };

    let existing = view
        .get(&tx.key)
        .await
        .with_context(|| format!("read {:?} during admission", tx.key))?;
    match existing {
        Some(value) if value == tx.value => {
            debug!(key = ?tx.key, "rejecting duplicate assignment");
            Ok(Admission::Rejected(Code::Duplicate))
        }
        _ => Ok(Admission::Accepted(tx)),
    }
}

/// Validation code for `raw` against `view`.
pub async fn validate<V: ReadView>(view: &V, raw: &[u8]) -> Result<Code, Fatal> {
    Ok(admit(view, raw).await?.code())
}
