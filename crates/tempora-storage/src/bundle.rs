//! Opens the stores a query needs and closes all of them together.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, warn};

use tempora_core::config::StorageConfig;
use tempora_core::errors::{CloseError, StoreError};
use tempora_core::traits::KeyValueStore;

use crate::connection::Database;
use crate::memory_store::InMemoryStore;
use crate::sqlite_store::SqliteStore;
use crate::DATABASE_FILE;

type Shutdown = Box<dyn Fn() -> Result<(), StoreError> + Send + Sync>;

/// Every store opened through the bundle is shut down by [`StoreBundle::close`], or on
/// drop if `close` was never called.
pub struct StoreBundle {
    database: Option<Arc<Database>>,
    shutdowns: Vec<(String, Shutdown)>,
    closed: bool,
}

impl StoreBundle {
    pub fn open(config: &StorageConfig) -> Result<Self, StoreError> {
        let database = if config.in_memory {
            None
        } else {
            let directory = config.directory.as_ref().ok_or_else(|| StoreError::Open {
                path: String::new(),
                message: "storage.directory is not set".to_string(),
            })?;
            std::fs::create_dir_all(directory).map_err(|e| StoreError::Open {
                path: directory.display().to_string(),
                message: e.to_string(),
            })?;
            Some(Arc::new(Database::open(&directory.join(DATABASE_FILE))?))
        };
        info!(in_memory = config.in_memory, "store bundle opened");
        Ok(Self {
            database,
            shutdowns: Vec::new(),
            closed: false,
        })
    }

    /// Open (or create) the store `name`.
    pub fn store<V>(&mut self, name: &str) -> Result<Arc<dyn KeyValueStore<V>>, StoreError>
    where
        V: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
    {
        if self.closed {
            return Err(StoreError::Closed {
                store: name.to_string(),
            });
        }
        let store: Arc<dyn KeyValueStore<V>> = match &self.database {
            Some(db) => Arc::new(SqliteStore::<V>::open(Arc::clone(db), name)?),
            None => Arc::new(InMemoryStore::<V>::new(name)),
        };
        let handle = Arc::clone(&store);
        self.shutdowns
            .push((name.to_string(), Box::new(move || handle.shutdown())));
        debug!(store = name, "store registered");
        Ok(store)
    }

    pub fn len(&self) -> usize {
        self.shutdowns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shutdowns.is_empty()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Shut down every store, even after a failure. The first failure is reported along
    /// with how many stores failed.
    pub fn close(&mut self) -> Result<(), CloseError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        let total = self.shutdowns.len();
        let mut first: Option<(String, String)> = None;
        let mut failed = 0;
        for (name, shutdown) in self.shutdowns.drain(..) {
            if let Err(e) = shutdown() {
                warn!(store = %name, error = %e, "store shutdown failed");
                failed += 1;
                first.get_or_insert((name, e.to_string()));
            }
        }
        self.database = None;
        match first {
            None => {
                info!(stores = total, "store bundle closed");
                Ok(())
            }
            Some((resource, message)) => Err(CloseError::Failed {
                resource,
                message,
                failed,
                total,
            }),
        }
    }
}

impl Drop for StoreBundle {
    fn drop(&mut self) {
        if !self.closed {
            if let Err(e) = self.close() {
                warn!(error = %e, "store bundle close on drop failed");
            }
        }
    }
}

impl std::fmt::Debug for StoreBundle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.shutdowns.iter().map(|(n, _)| n.as_str()).collect();
        f.debug_struct("StoreBundle")
            .field("database", &self.database)
            .field("stores", &names)
            .field("closed", &self.closed)
            .finish()
    }
}
