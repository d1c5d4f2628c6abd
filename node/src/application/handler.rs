use super::Config;
use anyhow::Context as _;
use commonware_runtime::{Clock, Metrics, Spawner, Storage};
use commonware_storage::{qmdb, translator::EightCap};
use kvchain_execution::{validate, Adb, Block, Fatal, Phase, ReadView, State};
use kvchain_types::{
    api::{
        RequestBeginBlock, RequestCheckTx, RequestDeliverTx, RequestEndBlock, RequestQuery,
        ResponseBeginBlock, ResponseCheckTx, ResponseCommit, ResponseDeliverTx,
        ResponseEndBlock, ResponseInfo, ResponseQuery, QUERY_FOUND, QUERY_NOT_FOUND,
    },
    Key,
};
use tracing::{debug, error, info, warn};

fn report(operation: &'static str, err: &Fatal) {
    error!(operation, %err, "unrecoverable fault; the process must stop");
}

/// Callback surface driven by the consensus engine.
///
/// The engine calls `begin_block`, `deliver_tx` (once per ordered transaction),
/// `end_block` and `commit` strictly in sequence for each block. `check_tx`,
/// `info` and `query` only read committed state and may be called at any point.
///
/// Every callback returns [Fatal] on storage faults and callback order
/// violations. The host must stop serving requests once one is returned.
pub struct Application<S: State> {
    state: S,
    block: Option<Block>,
}

impl<E: Spawner + Metrics + Clock + Storage> Application<Adb<E, EightCap>> {
    /// Open (or create) the durable state and wrap it.
    pub async fn init(context: E, config: Config) -> Result<Self, Fatal> {
        let state = Adb::init(
            context.with_label("state"),
            qmdb::any::VariableConfig {
                mmr_journal_partition: format!("{}-state-mmr-journal", config.partition_prefix),
                mmr_metadata_partition: format!("{}-state-mmr-metadata", config.partition_prefix),
                mmr_items_per_blob: config.mmr_items_per_blob,
                mmr_write_buffer: config.mmr_write_buffer,
                log_partition: format!("{}-state-log-journal", config.partition_prefix),
                log_items_per_blob: config.log_items_per_section,
                log_write_buffer: config.log_write_buffer,
                log_compression: None,
                log_codec_config: (),
                translator: EightCap,
                thread_pool: None,
                buffer_pool: config.buffer_pool,
            },
        )
        .await
        .context("initialize state adb")
        .map_err(Fatal::from)
        .inspect_err(|err| report("init", err))?;

        let application = Self::new(state);
        let height = application
            .state
            .committed_height()
            .await
            .context("read committed height")
            .map_err(Fatal::from)
            .inspect_err(|err| report("init", err))?;
        info!(height, "opened state");
        Ok(application)
    }
}

impl<S: State> Application<S> {
    pub fn new(state: S) -> Self {
        Self { state, block: None }
    }

    pub fn state(&self) -> &S {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.block
            .as_ref()
            .map(|block| block.phase())
            .unwrap_or(Phase::Idle)
    }

    pub async fn info(&self) -> Result<ResponseInfo, Fatal> {
        let last_block_height = self
            .state
            .committed_height()
            .await
            .context("read committed height")
            .map_err(Fatal::from)
            .inspect_err(|err| report("info", err))?;
        Ok(ResponseInfo {
            last_block_height,
            last_block_app_hash: Vec::new(),
        })
    }

    /// Look up a key in committed state.
    pub async fn query(&self, request: RequestQuery) -> Result<ResponseQuery, Fatal> {
        let run = async {
            let key = Key::new(request.data);
            let value = self.state.get(&key).await.context("query state")?;
            let height = self
                .state
                .committed_height()
                .await
                .context("read committed height")?;
            Ok::<_, anyhow::Error>(match value {
                Some(value) => ResponseQuery {
                    code: QUERY_FOUND,
                    key: key.into_bytes(),
                    value,
                    height,
                },
                None => ResponseQuery {
                    code: QUERY_NOT_FOUND,
                    key: key.into_bytes(),
                    value: Vec::new(),
                    height,
                },
            })
        };
        run.await
            .map_err(Fatal::from)
            .inspect_err(|err| report("query", err))
    }

    /// Gossip-time admission against committed state.
    pub async fn check_tx(&self, request: RequestCheckTx) -> Result<ResponseCheckTx, Fatal> {
        let code = validate(&self.state, &request.tx)
            .await
            .inspect_err(|err| report("check_tx", err))?;
        Ok(code.into())
    }

    pub async fn begin_block(
        &mut self,
        request: RequestBeginBlock,
    ) -> Result<ResponseBeginBlock, Fatal> {
        if let Some(block) = &self.block {
            let err = Fatal::Protocol {
                operation: "begin",
                phase: block.phase(),
            };
            report("begin_block", &err);
            return Err(err);
        }

        let committed = self
            .state
            .committed_height()
            .await
            .context("read committed height")
            .map_err(Fatal::from)
            .inspect_err(|err| report("begin_block", err))?;
        let height = committed + 1;
        if request.header.height != height {
            warn!(
                header = request.header.height,
                expected = height,
                "header height differs from local height"
            );
        }
        self.block = Some(Block::begin(height));
        Ok(ResponseBeginBlock {})
    }

    pub async fn deliver_tx(
        &mut self,
        request: RequestDeliverTx,
    ) -> Result<ResponseDeliverTx, Fatal> {
        let block = self
            .block
            .as_mut()
            .ok_or(Fatal::Protocol {
                operation: "deliver",
                phase: Phase::Idle,
            })
            .inspect_err(|err| report("deliver_tx", err))?;
        let code = block
            .deliver(&self.state, &request.tx)
            .await
            .inspect_err(|err| report("deliver_tx", err))?;
        Ok(code.into())
    }

    pub fn end_block(&mut self, request: RequestEndBlock) -> Result<ResponseEndBlock, Fatal> {
        let block = self
            .block
            .as_mut()
            .ok_or(Fatal::Protocol {
                operation: "end",
                phase: Phase::Idle,
            })
            .inspect_err(|err| report("end_block", err))?;
        debug!(
            height = block.height(),
            requested = request.height,
            staged = block.staged(),
            "ending block"
        );
        block.end().inspect_err(|err| report("end_block", err))?;
        Ok(ResponseEndBlock {})
    }

    /// Publish the current block. The returned digest is always empty.
    ///
    /// A commit received before `end_block` leaves the open block in place.
    pub async fn commit(&mut self) -> Result<ResponseCommit, Fatal> {
        let phase = self.phase();
        if phase != Phase::Ended {
            let err = Fatal::Protocol {
                operation: "commit",
                phase,
            };
            report("commit", &err);
            return Err(err);
        }
        let Some(block) = self.block.take() else {
            return Err(Fatal::Protocol {
                operation: "commit",
                phase: Phase::Idle,
            });
        };
        block
            .commit(&mut self.state)
            .await
            .inspect_err(|err| report("commit", err))?;
        Ok(ResponseCommit { data: Vec::new() })
    }
}
