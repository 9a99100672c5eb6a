use std::sync::Arc;

use tracing::{debug, info};

use tempora_core::config::EngineConfig;
use tempora_core::errors::ExecutionError;
use tempora_core::proposition::Proposition;
use tempora_core::traits::KeyValueStore;

use super::result::KeyResult;
use super::session::{ExecutionSession, SessionSnapshot};
use super::ExecutionStrategy;
use crate::compiler::CompiledRuleSet;
use crate::derivation::DerivationSnapshot;

/// The three per-key stores stateful execution reads and writes.
#[derive(Clone)]
pub struct StatefulStores {
    /// Accumulated raw facts.
    pub propositions: Arc<dyn KeyValueStore<Vec<Proposition>>>,
    pub sessions: Arc<dyn KeyValueStore<SessionSnapshot>>,
    pub derivations: Arc<dyn KeyValueStore<DerivationSnapshot>>,
}

impl std::fmt::Debug for StatefulStores {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatefulStores")
            .field("propositions", &self.propositions.name())
            .field("sessions", &self.sessions.name())
            .field("derivations", &self.derivations.name())
            .finish()
    }
}

/// Working state persists across executions, so new facts extend earlier results.
#[derive(Debug)]
pub struct StatefulExecution {
    rules: Arc<CompiledRuleSet>,
    config: EngineConfig,
    stores: StatefulStores,
}

impl StatefulExecution {
    pub fn new(rules: Arc<CompiledRuleSet>, config: EngineConfig, stores: StatefulStores) -> Self {
        Self {
            rules,
            config,
            stores,
        }
    }

    fn load_session(&self, key_id: &str) -> Result<ExecutionSession<'_>, ExecutionError> {
        let Some(snapshot) = self.stores.sessions.get(key_id)? else {
            return Ok(ExecutionSession::new(key_id, &self.rules, &self.config));
        };
        let derivations = self.stores.derivations.get(key_id)?.ok_or_else(|| {
            ExecutionError::CorruptState {
                key_id: key_id.to_string(),
                details: "session present without its derivation graph".to_string(),
            }
        })?;
        Ok(ExecutionSession::restore(
            key_id,
            &self.rules,
            &self.config,
            snapshot,
            &derivations,
        ))
    }

    fn persist(
        &self,
        session: &ExecutionSession<'_>,
        raw: &Vec<Proposition>,
    ) -> Result<(), ExecutionError> {
        let key_id = session.key_id();
        let (snapshot, derivations) = session.snapshot();
        self.stores.propositions.put(key_id, raw)?;
        self.stores.sessions.put(key_id, &snapshot)?;
        self.stores.derivations.put(key_id, &derivations)?;
        Ok(())
    }

    /// Rerun every persisted key from its accumulated raw facts.
    pub fn reprocess_all(&mut self) -> Result<Vec<KeyResult>, ExecutionError> {
        let keys = self.persisted_keys()?;
        info!(keys = keys.len(), "reprocessing persisted keys");
        let mut results = Vec::with_capacity(keys.len());
        for key_id in keys {
            if let Some(result) = self.reprocess(&key_id)? {
                results.push(result);
            }
        }
        Ok(results)
    }
}

/// Fold `incoming` into the accumulated raw facts: deletions drop, updates replace.
fn merge_raw(raw: &mut Vec<Proposition>, incoming: &[Proposition]) {
    for proposition in incoming {
        if proposition.is_deleted() {
            raw.retain(|p| p.unique_id != proposition.unique_id);
            continue;
        }
        match raw
            .iter_mut()
            .find(|p| p.unique_id == proposition.unique_id)
        {
            Some(existing) => *existing = proposition.clone(),
            None => raw.push(proposition.clone()),
        }
    }
}

impl ExecutionStrategy for StatefulExecution {
    fn execute(
        &mut self,
        key_id: &str,
        propositions: Vec<Proposition>,
    ) -> Result<KeyResult, ExecutionError> {
        let mut raw = self.stores.propositions.get(key_id)?.unwrap_or_default();
        merge_raw(&mut raw, &propositions);

        let mut session = self.load_session(key_id)?;
        session.assert_all(propositions);
        session.run()?;
        self.persist(&session, &raw)?;
        debug!(key_id, firings = session.firings(), raw = raw.len(), "stateful key executed");
        Ok(session.result())
    }

    fn persisted_keys(&self) -> Result<Vec<String>, ExecutionError> {
        Ok(self.stores.propositions.key_set()?)
    }

    fn reprocess(&mut self, key_id: &str) -> Result<Option<KeyResult>, ExecutionError> {
        let Some(raw) = self.stores.propositions.get(key_id)? else {
            return Ok(None);
        };
        let mut session = ExecutionSession::new(key_id, &self.rules, &self.config);
        session.assert_all(raw.iter().cloned());
        session.run()?;
        self.persist(&session, &raw)?;
        debug!(key_id, firings = session.firings(), "key reprocessed");
        Ok(Some(session.result()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tempora_core::proposition::{UniqueId, Value};

    fn hr(local: &str, at: i64, value: f64) -> Proposition {
        Proposition::primitive("hr", UniqueId::new("ehr", local), at, value)
    }

    #[test]
    fn merge_raw_replaces_and_drops() {
        let mut raw = vec![hr("1", 0, 60.0), hr("2", 10, 70.0)];
        merge_raw(
            &mut raw,
            &[
                hr("1", 0, 65.0),
                hr("2", 10, 70.0).delete_stamped(Utc::now()),
                hr("3", 20, 80.0),
            ],
        );
        assert_eq!(raw.len(), 2);
        assert_eq!(raw[0].value(), Some(&Value::Number(65.0)));
        assert_eq!(raw[1].unique_id.local_id, "3");
    }
}
