//! kvchain execution layer.
//!
//! This crate decides which transactions are admissible and applies admitted
//! transactions to durable state, one consensus-ordered block at a time.
//!
//! ## Determinism requirements
//! - Every replica that applies the same ordered blocks must end in the same state.
//! - Do not read wall-clock time or randomness while validating or applying.
//! - Staged writes are kept in ordered collections so publish order is fixed.
//!
//! ## Read views
//! Admission only ever reads through [ReadView]. Gossip-time checks use the durable
//! [State] directly and therefore only observe committed blocks. Delivery inside a
//! block uses the block's [Overlay], so a transaction duplicating an earlier write
//! of the same block is rejected before either is committed.
//!
//! ## Minimal block (example)
//! ```rust,ignore
//! use kvchain_execution::{Block, Memory};
//!
//! # async fn example() -> Result<(), kvchain_execution::Fatal> {
//! let mut state = Memory::default();
//! let mut block = Block::begin(1);
//! block.deliver(&state, b"x=1").await?;
//! block.end()?;
//! block.commit(&mut state).await?;
//! # Ok(())
//! # }
//! ```

pub mod admission;
pub mod block;

#[cfg(any(test, feature = "mocks"))]
pub mod mocks;

#[cfg(test)]
mod adb_tests;

mod error;
mod state;

pub use admission::{admit, validate, Admission};
pub use block::{execute_block, Block, Overlay, Phase};
pub use error::Fatal;
pub use state::{Adb, ReadView, State};

#[cfg(any(test, feature = "mocks"))]
pub use state::Memory;
