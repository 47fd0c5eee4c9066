//! ORM engine seam
//!
//! The hub never talks to a data store itself. It hands the merged
//! configuration to an [`OrmEngine`] at startup and asks it to tear down at
//! shutdown; everything in between belongs to the engine.

use async_trait::async_trait;
use indexmap::IndexMap;
use ormhub_core::{AdapterDefinition, ConnectionDefinition, GlobalCollector, ModelDefinition};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Errors reported by ORM engines
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("Invalid ORM configuration: {0}")]
    InvalidConfig(String),
    #[error("Adapter failure: {0}")]
    Adapter(String),
    #[error("ORM engine unavailable: {0}")]
    Unavailable(String),
}

/// Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;

/// Global engine configuration: everything except the models themselves
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrmConfig {
    pub adapters: IndexMap<String, AdapterDefinition>,
    pub connections: IndexMap<String, ConnectionDefinition>,
    pub defaults: IndexMap<String, Value>,
}

impl OrmConfig {
    pub fn from_collector(collector: &GlobalCollector) -> Self {
        Self {
            adapters: collector.adapters().clone(),
            connections: collector.connections().clone(),
            defaults: collector.defaults().clone(),
        }
    }
}

/// An ORM engine able to turn model definitions into collections
#[cfg_attr(test, mockall::automock(type Collection = String;))]
#[async_trait]
pub trait OrmEngine: Send + Sync {
    /// Initialized, queryable handle for one model
    type Collection: Clone + Send + Sync + 'static;

    /// Initialize the engine; one collection definition per model.
    ///
    /// Returns the initialized collections keyed by model identity.
    async fn initialize(
        &self,
        config: OrmConfig,
        models: Vec<ModelDefinition>,
    ) -> EngineResult<IndexMap<String, Self::Collection>>;

    /// Release every connection held by the engine
    async fn teardown(&self) -> EngineResult<()>;
}
