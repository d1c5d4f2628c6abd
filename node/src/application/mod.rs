use commonware_runtime::buffer::PoolRef;
use std::num::NonZero;

mod handler;
pub use handler::Application;

/// Storage configuration for the application.
pub struct Config {
    /// The prefix for the partition.
    pub partition_prefix: String,

    /// The number of items per blob for the MMR.
    pub mmr_items_per_blob: NonZero<u64>,

    /// The number of items per write for the MMR.
    pub mmr_write_buffer: NonZero<usize>,

    /// The number of items per section for the log.
    pub log_items_per_section: NonZero<u64>,

    /// The number of items per write for the log.
    pub log_write_buffer: NonZero<usize>,

    /// The number of items per blob for the locations.
    pub locations_items_per_blob: NonZero<u64>,

    /// The buffer pool to use.
    pub buffer_pool: PoolRef,
}
