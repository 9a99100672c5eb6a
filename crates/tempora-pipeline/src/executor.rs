//! The query entry point.

use std::sync::Arc;

use tracing::{debug, warn};

use tempora_core::config::TemporaConfig;
use tempora_core::errors::QueryError;
use tempora_core::traits::{
    AlgorithmSource, Cancellable, CancellationToken, DataSource, KnowledgeSource,
    QueryResultsHandler,
};
use tempora_engine::{
    AbstractionCompiler, CompiledRuleSet, ExecutionStrategy, StatefulExecution, StatefulStores,
    StatelessExecution,
};
use tempora_storage::StoreBundle;

use crate::delivery::{run_pipeline, PipelineContext};
use crate::query::{ExecutionMode, Query};
use crate::streaming::StreamingMerge;
use crate::tracing_setup::events;

/// Store names used in stateful mode.
pub const PROPOSITION_STORE: &str = "propositions";
pub const SESSION_STORE: &str = "sessions";
pub const DERIVATION_STORE: &str = "derivations";

/// What a successful query did. `errors` holds the per-key failures that were skipped.
#[derive(Debug, Default)]
pub struct ExecutionSummary {
    pub query_id: String,
    pub keys_processed: usize,
    pub keys_delivered: usize,
    pub errors: Vec<QueryError>,
}

impl ExecutionSummary {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Compiles queries against one knowledge base and runs them over the configured sources.
pub struct QueryExecutor {
    knowledge: Arc<dyn KnowledgeSource>,
    algorithms: Arc<dyn AlgorithmSource>,
    data_sources: Vec<Arc<dyn DataSource>>,
    config: TemporaConfig,
    cancel: CancellationToken,
}

impl QueryExecutor {
    pub fn new(
        knowledge: Arc<dyn KnowledgeSource>,
        algorithms: Arc<dyn AlgorithmSource>,
        data_sources: Vec<Arc<dyn DataSource>>,
        config: TemporaConfig,
    ) -> Self {
        Self {
            knowledge,
            algorithms,
            data_sources,
            config,
            cancel: CancellationToken::new(),
        }
    }

    /// Use `token` instead of a private one, so a caller can cancel running queries.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn config(&self) -> &TemporaConfig {
        &self.config
    }

    /// Compile `query` without running it.
    pub fn compile(&self, query: &Query) -> Result<CompiledRuleSet, QueryError> {
        let compiler = AbstractionCompiler::new(self.knowledge.as_ref(), self.algorithms.as_ref());
        Ok(compiler.compile(&query.proposition_ids)?)
    }

    /// Run `query` to completion, delivering each key's results to `handler`.
    ///
    /// Compilation, store and stream-opening failures are returned directly and the
    /// handler is never started. Once the pipeline runs, every fatal failure (data read,
    /// handler, thread, close) is collected into one [`QueryError::Finder`] and `finish`
    /// is not called. Per-key execution failures only skip the key and are reported in
    /// the summary. A cancelled query returns [`QueryError::Cancelled`].
    pub fn execute(
        &self,
        query: &Query,
        handler: &mut dyn QueryResultsHandler,
    ) -> Result<ExecutionSummary, QueryError> {
        events::query_started(&query.id, query.mode, self.data_sources.len());
        let rules = Arc::new(self.compile(query)?);
        debug!(
            query_id = %query.id,
            rules = rules.rules().len(),
            raw = rules.raw_proposition_ids().len(),
            "query compiled"
        );

        let mut bundle = match query.mode {
            ExecutionMode::Stateless => None,
            ExecutionMode::Stateful => {
                let bundle = StoreBundle::open(&self.config.storage)?;
                events::stores_opened(&query.id, self.config.storage.in_memory);
                if self.config.storage.in_memory {
                    warn!(
                        query_id = %query.id,
                        "stateful query on in-memory stores; state is dropped when the query ends"
                    );
                }
                Some(bundle)
            }
        };
        let mut strategy: Box<dyn ExecutionStrategy> = match bundle.as_mut() {
            None => Box::new(StatelessExecution::new(
                Arc::clone(&rules),
                self.config.engine.clone(),
            )),
            Some(bundle) => {
                let stores = StatefulStores {
                    propositions: bundle.store(PROPOSITION_STORE)?,
                    sessions: bundle.store(SESSION_STORE)?,
                    derivations: bundle.store(DERIVATION_STORE)?,
                };
                Box::new(StatefulExecution::new(
                    Arc::clone(&rules),
                    self.config.engine.clone(),
                    stores,
                ))
            }
        };

        let mut merge = self.open_streams(query, &rules)?;
        if let Err(e) = handler.start() {
            if let Err(close) = merge.close_all() {
                warn!(query_id = %query.id, error = %close, "closing streams failed");
            }
            return Err(e.into());
        }

        let mut ctx = PipelineContext::new(&query.id, &self.cancel, &self.config.pipeline);
        if query.reprocess {
            match query.mode {
                ExecutionMode::Stateful => ctx = ctx.with_reprocess(query.keys.clone()),
                ExecutionMode::Stateless => {
                    warn!(query_id = %query.id, "reprocess ignored in stateless mode");
                }
            }
        }
        let outcome = run_pipeline(&ctx, &mut merge, strategy.as_mut(), handler);
        drop(strategy);

        let mut fatal = outcome.fatal;
        if let Err(e) = merge.close_all() {
            fatal.push(e.into());
        }
        if let Some(mut bundle) = bundle {
            let stores = bundle.len();
            match bundle.close() {
                Ok(()) => events::stores_closed(&query.id, stores),
                Err(e) => fatal.push(e.into()),
            }
        }

        events::query_finished(
            &query.id,
            outcome.keys_processed,
            outcome.keys_delivered,
            outcome.non_fatal.len() + fatal.len(),
        );
        if !fatal.is_empty() {
            return Err(QueryError::Finder {
                query_id: query.id.clone(),
                errors: fatal,
            });
        }
        if self.cancel.is_cancelled() {
            return Err(QueryError::Cancelled);
        }
        handler.finish()?;
        Ok(ExecutionSummary {
            query_id: query.id.clone(),
            keys_processed: outcome.keys_processed,
            keys_delivered: outcome.keys_delivered,
            errors: outcome.non_fatal,
        })
    }

    /// One stream per data source. Streams already opened are closed if a later one fails.
    fn open_streams(
        &self,
        query: &Query,
        rules: &CompiledRuleSet,
    ) -> Result<StreamingMerge, QueryError> {
        let request = query.data_request(rules.raw_proposition_ids());
        let mut iterators = Vec::with_capacity(self.data_sources.len());
        for source in &self.data_sources {
            match source.stream(&request) {
                Ok(iterator) => iterators.push(iterator),
                Err(e) => {
                    if let Err(close) = StreamingMerge::new(iterators).close_all() {
                        warn!(source = source.id(), error = %close, "closing opened streams failed");
                    }
                    return Err(e.into());
                }
            }
        }
        Ok(StreamingMerge::new(iterators))
    }
}

impl std::fmt::Debug for QueryExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryExecutor")
            .field("data_sources", &self.data_sources.len())
            .field("config", &self.config)
            .finish()
    }
}
