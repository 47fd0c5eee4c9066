//! Error types for the registration hub

use ormhub_core::CollectorError;
use thiserror::Error;

use crate::engine::EngineError;
use crate::lifecycle::LifecycleState;

/// Errors raised by the hub
#[derive(Error, Debug)]
pub enum HubError {
    #[error(transparent)]
    Collector(#[from] CollectorError),
    #[error("ORM initialization failed: {0}")]
    Initialization(#[source] EngineError),
    #[error("ORM teardown failed: {0}")]
    Teardown(#[source] EngineError),
    #[error("Cannot {operation} while the ORM is {state}")]
    InvalidState {
        operation: &'static str,
        state: LifecycleState,
    },
    #[error("Registration is closed once startup has begun")]
    RegistrationClosed,
    #[error("Failed to load registration options from {source_name}: {message}")]
    Config {
        source_name: String,
        message: String,
    },
}

/// Result type for hub operations
pub type HubResult<T> = Result<T, HubError>;

impl HubError {
    pub(crate) fn config(source_name: impl Into<String>, message: impl ToString) -> Self {
        Self::Config {
            source_name: source_name.into(),
            message: message.to_string(),
        }
    }
}
