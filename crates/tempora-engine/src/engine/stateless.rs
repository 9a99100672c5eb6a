use std::sync::Arc;

use tracing::debug;

use tempora_core::config::EngineConfig;
use tempora_core::errors::ExecutionError;
use tempora_core::proposition::Proposition;

use super::result::KeyResult;
use super::session::ExecutionSession;
use super::ExecutionStrategy;
use crate::compiler::CompiledRuleSet;

/// Fresh working memory for every key; nothing survives the key.
#[derive(Debug, Clone)]
pub struct StatelessExecution {
    rules: Arc<CompiledRuleSet>,
    config: EngineConfig,
}

impl StatelessExecution {
    pub fn new(rules: Arc<CompiledRuleSet>, config: EngineConfig) -> Self {
        Self { rules, config }
    }
}

impl ExecutionStrategy for StatelessExecution {
    fn execute(
        &mut self,
        key_id: &str,
        propositions: Vec<Proposition>,
    ) -> Result<KeyResult, ExecutionError> {
        let mut session = ExecutionSession::new(key_id, &self.rules, &self.config);
        session.assert_all(propositions);
        session.run()?;
        let result = session.result();
        debug!(key_id, firings = session.firings(), "stateless key executed");
        session.reset();
        Ok(result)
    }
}
