use crate::block::Phase;
use thiserror::Error;

/// A condition the state machine cannot recover from.
///
/// Rejected transactions are never reported through this type. Callers must stop
/// serving requests once a `Fatal` is returned: continuing risks this replica
/// diverging from the ones that did not hit the fault.
#[derive(Debug, Error)]
pub enum Fatal {
    #[error("storage fault: {0:#}")]
    Storage(anyhow::Error),
    #[error("{operation} received while {phase}")]
    Protocol {
        operation: &'static str,
        phase: Phase,
    },
}

impl From<anyhow::Error> for Fatal {
    fn from(err: anyhow::Error) -> Self {
        Self::Storage(err)
    }
}
