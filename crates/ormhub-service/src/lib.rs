//! Registration hub and ORM lifecycle for ormhub
//!
//! This crate wires the core merge-and-scope protocol to an ORM engine:
//! - [`OrmHub`]: the per-host aggregation context plugins register against
//! - [`LifecycleController`]: one initialization at pre-start, one teardown at post-stop
//! - [`OrmEngine`]: the seam an ORM implementation plugs into
//! - Adapters: ready-made engines (see [`adapters`])
//!
//! ```
//! use ormhub_service::{
//!     AdapterDefinition, CollectionScope, ConnectionDefinition, MemoryEngine, ModelDefinition,
//!     OrmHub, RegistrationOptions,
//! };
//!
//! # tokio_test::block_on(async {
//! let mut hub = OrmHub::new(MemoryEngine::new());
//! let accounts = hub.create_scope(hub.root(), "accounts").unwrap();
//!
//! hub.register(
//!     accounts,
//!     RegistrationOptions::new()
//!         .with_adapter("memory", AdapterDefinition::new("sails-memory"))
//!         .with_connection("primary", ConnectionDefinition::new("memory"))
//!         .with_model(ModelDefinition::new("user").with_connection("primary")),
//! )
//! .unwrap();
//!
//! hub.pre_start().await.unwrap();
//! assert!(hub.collections(accounts, CollectionScope::Scoped).contains_key("user"));
//! hub.post_stop().await.unwrap();
//! # });
//! ```

pub mod adapters;
pub mod config;
pub mod engine;
pub mod error;
pub mod hub;
pub mod lifecycle;
pub mod telemetry;

pub use ormhub_core::{
    AdapterDefinition, CollectorError, ConnectionDefinition, EntryKind, ModelDefinition,
    ModuleResolver, RegistrationInput, RegistrationOptions, ScopeId, StaticResolver,
};

pub use adapters::{MemoryCollection, MemoryEngine};
pub use config::{load_options_from_path, options_from_json_str, options_from_toml_str};
pub use engine::{EngineError, EngineResult, OrmConfig, OrmEngine};
pub use error::{HubError, HubResult};
pub use hub::{CollectionScope, OrmHub, OrmHubBuilder, Realm};
pub use lifecycle::{LifecycleController, LifecycleState};
pub use telemetry::{init_tracing, LogFormat, TelemetryError, TelemetryResult};
