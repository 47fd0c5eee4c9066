//! In-memory ORM engine
//!
//! Resolves every model to its connection and adapter, the way a real
//! engine would before opening connections, and hands out lightweight
//! collection handles. Failures can be injected to exercise startup and
//! shutdown error paths.

use async_trait::async_trait;
use indexmap::IndexMap;
use ormhub_core::ModelDefinition;
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::engine::{EngineError, EngineResult, OrmConfig, OrmEngine};

/// Default key naming the connection for models without one
pub const DEFAULT_CONNECTION_KEY: &str = "connection";

/// Collection handle produced by [`MemoryEngine`]
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryCollection {
    identity: String,
    connection: String,
    adapter: String,
    definition: Arc<ModelDefinition>,
}

impl MemoryCollection {
    pub fn identity(&self) -> &str {
        &self.identity
    }

    pub fn connection(&self) -> &str {
        &self.connection
    }

    pub fn adapter(&self) -> &str {
        &self.adapter
    }

    pub fn definition(&self) -> &ModelDefinition {
        &self.definition
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    config: Option<OrmConfig>,
    teardowns: usize,
}

/// Engine keeping everything in process memory.
///
/// Clones share state, so a test can keep a handle after moving the engine
/// into a hub.
#[derive(Debug, Clone, Default)]
pub struct MemoryEngine {
    state: Arc<tokio::sync::RwLock<MemoryState>>,
    fail_initialize: Option<EngineError>,
    fail_teardown: Option<EngineError>,
}

impl MemoryEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make [`OrmEngine::initialize`] fail with `error`
    pub fn with_initialize_failure(mut self, error: EngineError) -> Self {
        self.fail_initialize = Some(error);
        self
    }

    /// Make [`OrmEngine::teardown`] fail with `error`
    pub fn with_teardown_failure(mut self, error: EngineError) -> Self {
        self.fail_teardown = Some(error);
        self
    }

    pub async fn is_initialized(&self) -> bool {
        self.state.read().await.config.is_some()
    }

    /// Number of completed teardowns
    pub async fn teardown_count(&self) -> usize {
        self.state.read().await.teardowns
    }

    /// Configuration the engine was initialized with
    pub async fn config(&self) -> Option<OrmConfig> {
        self.state.read().await.config.clone()
    }

    fn build_collection(config: &OrmConfig, model: ModelDefinition) -> EngineResult<MemoryCollection> {
        let connection = match &model.connection {
            Some(connection) => connection.clone(),
            None => config
                .defaults
                .get(DEFAULT_CONNECTION_KEY)
                .and_then(|value| value.as_str())
                .map(str::to_string)
                .ok_or_else(|| {
                    EngineError::InvalidConfig(format!(
                        "model `{}` has no connection and no default connection is set",
                        model.identity
                    ))
                })?,
        };

        let adapter = config
            .connections
            .get(&connection)
            .map(|c| c.adapter.clone())
            .ok_or_else(|| {
                EngineError::InvalidConfig(format!(
                    "model `{}` uses unknown connection `{}`",
                    model.identity, connection
                ))
            })?;

        if !config.adapters.contains_key(&adapter) {
            return Err(EngineError::Adapter(format!(
                "connection `{}` uses unknown adapter `{}`",
                connection, adapter
            )));
        }

        Ok(MemoryCollection {
            identity: model.identity.clone(),
            connection,
            adapter,
            definition: Arc::new(model),
        })
    }
}

#[async_trait]
impl OrmEngine for MemoryEngine {
    type Collection = MemoryCollection;

    #[instrument(skip(self, config, models))]
    async fn initialize(
        &self,
        config: OrmConfig,
        models: Vec<ModelDefinition>,
    ) -> EngineResult<IndexMap<String, MemoryCollection>> {
        if let Some(error) = &self.fail_initialize {
            return Err(error.clone());
        }

        let mut state = self.state.write().await;
        if state.config.is_some() {
            return Err(EngineError::Unavailable("engine already initialized".to_string()));
        }

        let mut collections = IndexMap::with_capacity(models.len());
        for model in models {
            let collection = Self::build_collection(&config, model)?;
            collections.insert(collection.identity.clone(), collection);
        }

        debug!(collections = collections.len(), "Memory engine initialized");
        state.config = Some(config);
        Ok(collections)
    }

    #[instrument(skip(self))]
    async fn teardown(&self) -> EngineResult<()> {
        if let Some(error) = &self.fail_teardown {
            return Err(error.clone());
        }

        let mut state = self.state.write().await;
        if state.config.take().is_none() {
            return Err(EngineError::Unavailable("engine not initialized".to_string()));
        }
        state.teardowns += 1;
        debug!(teardowns = state.teardowns, "Memory engine torn down");
        Ok(())
    }
}
