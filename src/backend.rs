//! Table configuration backend
//!
//! Exposes the cluster's table metadata as rows of documents. Reads format
//! live records; writes run the mutation protocol against a fresh snapshot
//! and join the local change back into the metadata store only once every
//! check has passed.
//!
//! The implementation is split into focused parts that share this module's
//! private scope:
//!
//! - `backend/read_and_format.rs` - `format_row`, `read_row`, `read_all_rows`, `primary_keys`
//! - `backend/write_row.rs` - create / update / delete protocol
//! - `backend/reconfigure.rs` - regenerate a live table's replica placement

use crate::config::{DecodedTableConfig, TableConfigDecoder, table_config_to_document};
use crate::core::{ConfigError, NameString, Result, TableId};
use crate::document::{Document, name_to_document, uuid_from_document, uuid_to_document};
use crate::identifier::{
    DatabaseDirectory, ServerDirectory, database_id_from_document, database_id_to_document,
    display_reference,
};
use crate::interrupt::{Interruptor, check_interrupted, interruptible};
use crate::metadata::{Deletable, MetadataStore, ReplicationInfo, TableRecord, TablesSnapshot};
use crate::planner::{
    ConfigGenerator, GenerateConfigParams, LoadBalancedConfigGenerator, SplitPointCalculator,
    SplitPointPlanner, UniformSplitPointCalculator,
};
use crate::settings::BackendSettings;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use tokio::runtime::Handle;
use tracing::{Instrument, Level, event, info_span, warn};

include!("backend/read_and_format.rs");
include!("backend/write_row.rs");
include!("backend/reconfigure.rs");

/// Row-level access to table configurations.
///
/// Cheap to clone; clones share the same collaborators and home runtime.
#[derive(Clone)]
pub struct TableConfigBackend {
    inner: Arc<BackendInner>,
}

struct BackendInner {
    store: Arc<dyn MetadataStore>,
    servers: Arc<dyn ServerDirectory>,
    databases: Arc<dyn DatabaseDirectory>,
    generator: Arc<dyn ConfigGenerator>,
    planner: SplitPointPlanner,
    settings: BackendSettings,
    home: Handle,
}

/// Builder for [`TableConfigBackend`].
///
/// Only the store and the two directories are required. The generator
/// defaults to [`LoadBalancedConfigGenerator`] over the server directory,
/// split points to [`UniformSplitPointCalculator`], and the home runtime to
/// the one `build` is called from.
pub struct TableConfigBackendBuilder {
    store: Arc<dyn MetadataStore>,
    servers: Arc<dyn ServerDirectory>,
    databases: Arc<dyn DatabaseDirectory>,
    generator: Option<Arc<dyn ConfigGenerator>>,
    calculator: Option<Arc<dyn SplitPointCalculator>>,
    settings: BackendSettings,
    home: Option<Handle>,
}

impl TableConfigBackendBuilder {
    pub fn generator(mut self, generator: Arc<dyn ConfigGenerator>) -> Self {
        self.generator = Some(generator);
        self
    }

    pub fn split_point_calculator(mut self, calculator: Arc<dyn SplitPointCalculator>) -> Self {
        self.calculator = Some(calculator);
        self
    }

    pub fn settings(mut self, settings: BackendSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Runtime every operation is marshaled onto.
    pub fn home(mut self, home: Handle) -> Self {
        self.home = Some(home);
        self
    }

    pub fn build(self) -> Result<TableConfigBackend> {
        let home = match self.home {
            Some(home) => home,
            None => Handle::try_current().map_err(|err| {
                ConfigError::InvalidValue(format!(
                    "A table config backend needs a home runtime: {}",
                    err
                ))
            })?,
        };
        let generator = self
            .generator
            .unwrap_or_else(|| Arc::new(LoadBalancedConfigGenerator::new(self.servers.clone())));
        let calculator = self
            .calculator
            .unwrap_or_else(|| Arc::new(UniformSplitPointCalculator));
        let planner = SplitPointPlanner::new(calculator, self.settings.max_shards);

        Ok(TableConfigBackend {
            inner: Arc::new(BackendInner {
                store: self.store,
                servers: self.servers,
                databases: self.databases,
                generator,
                planner,
                settings: self.settings,
                home,
            }),
        })
    }
}

impl TableConfigBackend {
    pub fn builder(
        store: Arc<dyn MetadataStore>,
        servers: Arc<dyn ServerDirectory>,
        databases: Arc<dyn DatabaseDirectory>,
    ) -> TableConfigBackendBuilder {
        TableConfigBackendBuilder {
            store,
            servers,
            databases,
            generator: None,
            calculator: None,
            settings: BackendSettings::default(),
            home: None,
        }
    }

    pub fn settings(&self) -> &BackendSettings {
        &self.inner.settings
    }

    /// Runs `operation` on the home runtime and hands its result back.
    ///
    /// A panic on the home task is re-raised in the caller. A task that
    /// never finished because the home runtime shut down counts as an
    /// interruption.
    async fn on_home<F, Fut, T>(&self, operation: F) -> Result<T>
    where
        F: FnOnce(Arc<BackendInner>) -> Fut,
        Fut: Future<Output = Result<T>> + Send + 'static,
        T: Send + 'static,
    {
        let task = self.inner.home.spawn(operation(self.inner.clone()));
        match task.await {
            Ok(result) => result,
            Err(err) if err.is_panic() => std::panic::resume_unwind(err.into_panic()),
            Err(_) => Err(ConfigError::Interrupted),
        }
    }
}

/// Logs a broken internal invariant and aborts the operation.
///
/// These indicate a defect in the caller (id generation, row lookup), never
/// bad input, so they are not reported through `ConfigError`.
#[track_caller]
fn guarantee(condition: bool, message: &str) {
    if !condition {
        event!(Level::ERROR, invariant = message, "table config invariant violated");
        panic!("{}", message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identifier::{InMemoryDatabaseDirectory, InMemoryServerDirectory};
    use crate::metadata::InMemoryMetadataStore;

    fn builder() -> TableConfigBackendBuilder {
        TableConfigBackend::builder(
            Arc::new(InMemoryMetadataStore::new()),
            Arc::new(InMemoryServerDirectory::new()),
            Arc::new(InMemoryDatabaseDirectory::new()),
        )
    }

    #[test]
    fn test_build_requires_runtime() {
        assert!(builder().build().is_err());
    }

    #[test]
    fn test_operations_run_on_explicit_home() {
        let home = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .enable_all()
            .build()
            .unwrap();
        let backend = builder()
            .home(home.handle().clone())
            .settings(BackendSettings::new().max_shards(4))
            .build()
            .unwrap();
        assert_eq!(backend.settings().max_shards, 4);

        let caller = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        let keys = caller
            .block_on(backend.primary_keys(&Interruptor::new()))
            .unwrap();
        assert!(keys.is_empty());
    }

    #[tokio::test]
    #[should_panic(expected = "boom")]
    async fn test_home_panics_are_reraised() {
        let backend = builder().build().unwrap();
        let _: Result<()> = backend
            .on_home(|_inner| async move {
                let fail = true;
                if fail {
                    panic!("boom");
                }
                Ok::<(), ConfigError>(())
            })
            .await;
    }

    #[test]
    #[should_panic(expected = "UUID collision happened")]
    fn test_guarantee_panics() {
        guarantee(false, "UUID collision happened");
    }
}
