//! Per-block application context.
//!
//! A [Block] is created when the consensus engine begins a block and consumed when
//! it commits. Accepted transactions are staged in the block and only reach the
//! durable [State] through [Block::commit], so gossip-time checks against the
//! state never observe a block that has not been committed.

use crate::admission::{admit, Admission};
use crate::{Fatal, ReadView, State};
use anyhow::{Context as _, Result};
use kvchain_types::{Code, Key};
use std::{collections::BTreeMap, fmt};
use tracing::{debug, info};

/// Position of the application in the begin/deliver/end/commit cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// No block is open.
    Idle,
    /// Between begin and end; transactions may be delivered.
    InBlock,
    /// Between end and commit.
    Ended,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Idle => write!(f, "idle"),
            Phase::InBlock => write!(f, "in block"),
            Phase::Ended => write!(f, "ended"),
        }
    }
}

/// Staged writes layered over a read view.
///
/// Reads of keys staged in the block see the staged value; all other reads fall
/// through to the underlying view.
pub struct Overlay<'a, S: ReadView> {
    state: &'a S,
    pending: &'a BTreeMap<Key, Vec<u8>>,
}

impl<S: ReadView> ReadView for Overlay<'_, S> {
    async fn get(&self, key: &Key) -> Result<Option<Vec<u8>>> {
        match self.pending.get(key) {
            Some(value) => Ok(Some(value.clone())),
            None => self.state.get(key).await,
        }
    }
}

pub struct Block {
    height: u64,
    phase: Phase,
    pending: BTreeMap<Key, Vec<u8>>,
    delivered: usize,
}

impl Block {
    pub fn begin(height: u64) -> Self {
        debug!(height, "beginning block");
        Self {
            height,
            phase: Phase::InBlock,
            pending: BTreeMap::new(),
            delivered: 0,
        }
    }

    pub fn height(&self) -> u64 {
        self.height
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Number of distinct keys staged so far.
    pub fn staged(&self) -> usize {
        self.pending.len()
    }

    pub fn overlay<'a, S: ReadView>(&'a self, state: &'a S) -> Overlay<'a, S> {
        Overlay {
            state,
            pending: &self.pending,
        }
    }

    fn require_phase(&self, phase: Phase, operation: &'static str) -> Result<(), Fatal> {
        if self.phase != phase {
            return Err(Fatal::Protocol {
                operation,
                phase: self.phase,
            });
        }
        Ok(())
    }

    /// Validate `raw` against `state` overlaid with this block's staged writes and
    /// stage it if accepted.
    pub async fn deliver<S: ReadView>(&mut self, state: &S, raw: &[u8]) -> Result<Code, Fatal> {
        self.require_phase(Phase::InBlock, "deliver")?;
        self.delivered += 1;

        let admission = admit(&self.overlay(state), raw).await?;
        match admission {
            Admission::Accepted(tx) => {
                self.pending.insert(tx.key, tx.value);
                Ok(Code::Valid)
            }
            Admission::Rejected(code) => {
                debug!(height = self.height, %code, "transaction not applied");
                Ok(code)
            }
        }
    }

    pub fn end(&mut self) -> Result<(), Fatal> {
        self.require_phase(Phase::InBlock, "end")?;
        self.phase = Phase::Ended;
        Ok(())
    }

    /// Publish every staged write to `state` in one step.
    ///
    /// Returns the committed height.
    pub async fn commit<S: State>(self, state: &mut S) -> Result<u64, Fatal> {
        self.require_phase(Phase::Ended, "commit")?;
        let height = self.height;
        let staged = self.pending.len();
        state
            .publish(height, self.pending.into_iter().collect())
            .await
            .with_context(|| format!("publish block (height={height})"))?;
        info!(
            height,
            delivered = self.delivered,
            staged,
            "committed block"
        );
        Ok(height)
    }
}

/// Apply an ordered block of raw transactions on top of `state`.
///
/// The block is executed at the height following the last committed one. Returns
/// that height and the code of every transaction, in order.
pub async fn execute_block<S: State>(
    state: &mut S,
    transactions: &[Vec<u8>],
) -> Result<(u64, Vec<Code>), Fatal> {
    let committed = state
        .committed_height()
        .await
        .context("read committed height")?;
    let mut block = Block::begin(committed + 1);
    let mut codes = Vec::with_capacity(transactions.len());
    for tx in transactions {
        codes.push(block.deliver(&*state, tx).await?);
    }
    block.end()?;
    let height = block.commit(state).await?;
    Ok((height, codes))
}
