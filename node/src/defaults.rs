//! Defaults for optional configuration fields.

pub const DEFAULT_PARTITION_PREFIX: &str = "kvchain";
pub const DEFAULT_MMR_ITEMS_PER_BLOB: u64 = 128_000;
pub const DEFAULT_MMR_WRITE_BUFFER: usize = 1024 * 1024;
pub const DEFAULT_LOG_ITEMS_PER_SECTION: u64 = 64_000;
pub const DEFAULT_LOG_WRITE_BUFFER: usize = 1024 * 1024;
pub const DEFAULT_LOCATIONS_ITEMS_PER_BLOB: u64 = 128_000;
pub const DEFAULT_BUFFER_POOL_PAGE_SIZE: usize = 4_096;
pub const DEFAULT_BUFFER_POOL_CAPACITY: usize = 32_768;
