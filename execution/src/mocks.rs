use crate::{Adb, ReadView, State};
use anyhow::{anyhow, Result};
use commonware_runtime::{buffer::PoolRef, Clock, Metrics, Spawner, Storage};
use commonware_storage::{qmdb, translator::EightCap};
use commonware_utils::{NZUsize, NZU64};
use kvchain_types::Key;

/// Creates a state database for testing
pub async fn create_adb<E: Spawner + Metrics + Storage + Clock>(context: &E) -> Adb<E, EightCap> {
    let buffer_pool = PoolRef::new(NZUsize!(1024), NZUsize!(1024));

    Adb::init(
        context.with_label("state"),
        qmdb::any::VariableConfig {
            mmr_journal_partition: String::from("state-mmr-journal"),
            mmr_metadata_partition: String::from("state-mmr-metadata"),
            mmr_items_per_blob: NZU64!(1024),
            mmr_write_buffer: NZUsize!(1024),
            log_partition: String::from("state-log-journal"),
            log_items_per_blob: NZU64!(1024),
            log_write_buffer: NZUsize!(1024),
            log_compression: None,
            log_codec_config: (),
            translator: EightCap,
            thread_pool: None,
            buffer_pool,
        },
    )
    .await
    .expect("Failed to initialize state ADB")
}

/// State wrapper that injects storage faults on demand.
pub struct Faulty<S: State> {
    inner: S,
    fail_reads: bool,
    fail_publish: bool,
}

impl<S: State> Faulty<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            fail_reads: false,
            fail_publish: false,
        }
    }

    pub fn fail_reads(&mut self, fail: bool) {
        self.fail_reads = fail;
    }

    pub fn fail_publish(&mut self, fail: bool) {
        self.fail_publish = fail;
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

impl<S: State> ReadView for Faulty<S> {
    async fn get(&self, key: &Key) -> Result<Option<Vec<u8>>> {
        if self.fail_reads {
            return Err(anyhow!("injected read fault"));
        }
        self.inner.get(key).await
    }
}

impl<S: State> State for Faulty<S> {
    async fn insert(&mut self, key: Key, value: Vec<u8>) -> Result<()> {
        self.inner.insert(key, value).await
    }

    async fn committed_height(&self) -> Result<u64> {
        if self.fail_reads {
            return Err(anyhow!("injected read fault"));
        }
        self.inner.committed_height().await
    }

    async fn publish(&mut self, height: u64, changes: Vec<(Key, Vec<u8>)>) -> Result<()> {
        if self.fail_publish {
            return Err(anyhow!("injected publish fault (height={height})"));
        }
        self.inner.publish(height, changes).await
    }
}
