//! ORM lifecycle controller
//!
//! Drives the engine through exactly one initialization and at most one
//! teardown:
//!
//! ```text
//! Uninitialized ─► Initializing ─► Ready ─► TearingDown ─► Stopped
//!                       │            └──────(teardown skipped)──┘
//!                       └─► Failed
//! ```

use indexmap::IndexMap;
use ormhub_core::GlobalCollector;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, error, info, instrument, warn};

use crate::engine::{OrmConfig, OrmEngine};
use crate::error::{HubError, HubResult};

/// Lifecycle state of the ORM behind a hub
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    #[default]
    Uninitialized,
    Initializing,
    Ready,
    TearingDown,
    Stopped,
    /// Initialization failed; terminal
    Failed,
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LifecycleState::Uninitialized => "uninitialized",
            LifecycleState::Initializing => "initializing",
            LifecycleState::Ready => "ready",
            LifecycleState::TearingDown => "tearing down",
            LifecycleState::Stopped => "stopped",
            LifecycleState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Owns the engine and the collections it produced
pub struct LifecycleController<E: OrmEngine> {
    engine: E,
    state: LifecycleState,
    collections: Option<IndexMap<String, E::Collection>>,
}

impl<E: OrmEngine> LifecycleController<E> {
    pub fn new(engine: E) -> Self {
        Self {
            engine,
            state: LifecycleState::Uninitialized,
            collections: None,
        }
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Collections produced by the engine, once it is ready
    pub fn collections(&self) -> Option<&IndexMap<String, E::Collection>> {
        self.collections.as_ref()
    }

    /// Hand the merged configuration to the engine.
    #[instrument(skip(self, collector))]
    pub async fn initialize(&mut self, collector: &GlobalCollector) -> HubResult<()> {
        self.expect_state(LifecycleState::Uninitialized, "initialize")?;
        self.state = LifecycleState::Initializing;

        let config = OrmConfig::from_collector(collector);
        let models: Vec<_> = collector.models().values().cloned().collect();
        debug!(
            adapters = config.adapters.len(),
            connections = config.connections.len(),
            models = models.len(),
            "Initializing ORM engine"
        );

        match self.engine.initialize(config, models).await {
            Ok(collections) => {
                info!(collections = collections.len(), "ORM engine ready");
                self.collections = Some(collections);
                self.state = LifecycleState::Ready;
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "ORM engine failed to initialize");
                self.state = LifecycleState::Failed;
                Err(HubError::Initialization(e))
            }
        }
    }

    /// Stop the engine, tearing it down only when `teardown` is set.
    ///
    /// The controller ends up `Stopped` even when teardown fails.
    #[instrument(skip(self))]
    pub async fn stop(&mut self, teardown: bool) -> HubResult<()> {
        self.expect_state(LifecycleState::Ready, "stop")?;

        if !teardown {
            info!("Teardown disabled - leaving ORM connections open");
            self.state = LifecycleState::Stopped;
            return Ok(());
        }

        self.state = LifecycleState::TearingDown;
        let result = self.engine.teardown().await;
        self.state = LifecycleState::Stopped;
        self.collections = None;

        match result {
            Ok(()) => {
                info!("ORM engine torn down");
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "ORM engine teardown failed");
                Err(HubError::Teardown(e))
            }
        }
    }

    fn expect_state(&self, expected: LifecycleState, operation: &'static str) -> HubResult<()> {
        if self.state == expected {
            Ok(())
        } else {
            Err(HubError::InvalidState {
                operation,
                state: self.state,
            })
        }
    }
}
