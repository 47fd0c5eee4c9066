//! Adapter, connection and model definitions
//!
//! These are the values contributed by scopes and handed, unchanged, to the
//! ORM engine. Anything beyond the few fields the hub itself inspects is
//! kept as free-form JSON so engines can read their own options.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Driver-like definition telling the ORM engine how to reach a kind of store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdapterDefinition {
    /// Adapter identity as reported by the driver
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity: Option<String>,
    /// Driver-specific settings
    #[serde(flatten)]
    pub settings: Map<String, Value>,
}

impl AdapterDefinition {
    pub fn new(identity: impl Into<String>) -> Self {
        Self {
            identity: Some(identity.into()),
            settings: Map::new(),
        }
    }

    pub fn with_setting(mut self, key: impl Into<String>, value: Value) -> Self {
        self.settings.insert(key.into(), value);
        self
    }
}

/// Named configuration for one data store reachable through an adapter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionDefinition {
    /// Name of the adapter serving this connection
    pub adapter: String,
    /// Store-specific settings (host, database, credentials, ...)
    #[serde(flatten)]
    pub settings: Map<String, Value>,
}

impl ConnectionDefinition {
    pub fn new(adapter: impl Into<String>) -> Self {
        Self {
            adapter: adapter.into(),
            settings: Map::new(),
        }
    }

    pub fn with_setting(mut self, key: impl Into<String>, value: Value) -> Self {
        self.settings.insert(key.into(), value);
        self
    }
}

/// One model, initialized by the engine into one collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelDefinition {
    /// Globally unique model identity
    pub identity: String,
    /// Connection the model lives on; engines fall back to defaults when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection: Option<String>,
    /// Attribute schema
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub attributes: Map<String, Value>,
    /// Any further model options
    #[serde(flatten)]
    pub options: Map<String, Value>,
}

impl ModelDefinition {
    pub fn new(identity: impl Into<String>) -> Self {
        Self {
            identity: identity.into(),
            connection: None,
            attributes: Map::new(),
            options: Map::new(),
        }
    }

    pub fn with_connection(mut self, connection: impl Into<String>) -> Self {
        self.connection = Some(connection.into());
        self
    }

    pub fn with_attribute(mut self, name: impl Into<String>, schema: Value) -> Self {
        self.attributes.insert(name.into(), schema);
        self
    }
}
