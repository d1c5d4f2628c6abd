use anyhow::{anyhow, Context as _, Result};
use commonware_codec::Encode;
use commonware_cryptography::{
    sha256::{Digest, Sha256},
    Hasher,
};
use commonware_runtime::{Clock, Metrics, Spawner, Storage};
use commonware_storage::qmdb::any::unordered::variable::Db as AnyAdb;
use commonware_storage::translator::Translator;
use kvchain_types::{Key, Value};
use std::future::Future;

#[cfg(any(test, feature = "mocks"))]
use std::collections::BTreeMap;

pub type Adb<E, T> = AnyAdb<E, Digest, Value, Sha256, T>;

/// Read access to key-value state.
///
/// An absent key is `Ok(None)`. Any `Err` is a storage fault.
pub trait ReadView {
    fn get(&self, key: &Key) -> impl Future<Output = Result<Option<Vec<u8>>>>;
}

/// Durable key-value state.
pub trait State: ReadView {
    fn insert(&mut self, key: Key, value: Vec<u8>) -> impl Future<Output = Result<()>>;

    /// Height of the last published block, `0` if none.
    fn committed_height(&self) -> impl Future<Output = Result<u64>>;

    /// Make `changes` durable as the writes of block `height`.
    ///
    /// Readers observe either all of `changes` or none of them once the state is
    /// reopened.
    fn publish(
        &mut self,
        height: u64,
        changes: Vec<(Key, Vec<u8>)>,
    ) -> impl Future<Output = Result<()>>;

    fn apply(&mut self, changes: Vec<(Key, Vec<u8>)>) -> impl Future<Output = Result<()>> {
        async move {
            for (key, value) in changes {
                self.insert(key, value).await?;
            }
            Ok(())
        }
    }
}

impl<E: Spawner + Metrics + Clock + Storage, T: Translator> ReadView for Adb<E, T> {
    async fn get(&self, key: &Key) -> Result<Option<Vec<u8>>> {
        let key_hash = Sha256::hash(&key.encode());
        match AnyAdb::get(self, &key_hash).await.context("adb get")? {
            None => Ok(None),
            Some(Value::Entry(bytes)) => Ok(Some(bytes)),
            Some(Value::Commit { height }) => Err(anyhow!(
                "commit marker (height={height}) stored under {key:?}"
            )),
        }
    }
}

impl<E: Spawner + Metrics + Clock + Storage, T: Translator> State for Adb<E, T> {
    async fn insert(&mut self, key: Key, value: Vec<u8>) -> Result<()> {
        let key_hash = Sha256::hash(&key.encode());
        self.update(key_hash, Value::Entry(value))
            .await
            .context("adb update")?;
        Ok(())
    }

    async fn committed_height(&self) -> Result<u64> {
        Ok(self
            .get_metadata()
            .await
            .context("read state metadata")?
            .and_then(|v| match v {
                Value::Commit { height } => Some(height),
                _ => None,
            })
            .unwrap_or(0))
    }

    // Updates applied after the last commit are discarded when the database is
    // reopened, so a fault between `apply` and `commit` leaves the previous block
    // as the durable state.
    async fn publish(&mut self, height: u64, changes: Vec<(Key, Vec<u8>)>) -> Result<()> {
        State::apply(self, changes)
            .await
            .with_context(|| format!("apply state changes (height={height})"))?;
        AnyAdb::commit(self, Some(Value::Commit { height }))
            .await
            .with_context(|| format!("commit state (height={height})"))?;
        Ok(())
    }
}

#[cfg(any(test, feature = "mocks"))]
#[derive(Default)]
pub struct Memory {
    state: BTreeMap<Key, Vec<u8>>,
    height: u64,
}

#[cfg(any(test, feature = "mocks"))]
impl Memory {
    pub fn len(&self) -> usize {
        self.state.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = (&Key, &Vec<u8>)> {
        self.state.iter()
    }
}

#[cfg(any(test, feature = "mocks"))]
impl ReadView for Memory {
    async fn get(&self, key: &Key) -> Result<Option<Vec<u8>>> {
        Ok(self.state.get(key).cloned())
    }
}

#[cfg(any(test, feature = "mocks"))]
impl State for Memory {
    async fn insert(&mut self, key: Key, value: Vec<u8>) -> Result<()> {
        self.state.insert(key, value);
        Ok(())
    }

    async fn committed_height(&self) -> Result<u64> {
        Ok(self.height)
    }

    async fn publish(&mut self, height: u64, changes: Vec<(Key, Vec<u8>)>) -> Result<()> {
        self.apply(changes).await?;
        self.height = height;
        Ok(())
    }
}
