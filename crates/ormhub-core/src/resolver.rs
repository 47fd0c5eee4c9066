//! Resolution of adapter and model references
//!
//! Registrations may name an adapter or a model source instead of spelling
//! out the definition. The application supplies the named definitions up
//! front through a [`ModuleResolver`].

use std::collections::HashMap;

use crate::definition::{AdapterDefinition, ModelDefinition};

/// Looks up definitions referenced by name in registration options
pub trait ModuleResolver: Send + Sync {
    /// Resolve an adapter reference to its definition
    fn resolve_adapter(&self, reference: &str) -> Option<AdapterDefinition>;

    /// Resolve a model source reference to the models it provides
    fn resolve_models(&self, reference: &str) -> Option<Vec<ModelDefinition>>;
}

/// Resolver backed by definitions registered ahead of time.
#[derive(Debug, Clone, Default)]
pub struct StaticResolver {
    adapters: HashMap<String, AdapterDefinition>,
    models: HashMap<String, Vec<ModelDefinition>>,
}

impl StaticResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `definition` available under `reference`
    pub fn with_adapter(mut self, reference: impl Into<String>, definition: AdapterDefinition) -> Self {
        self.adapters.insert(reference.into(), definition);
        self
    }

    /// Make a list of models available under `reference`
    pub fn with_models(mut self, reference: impl Into<String>, models: Vec<ModelDefinition>) -> Self {
        self.models.insert(reference.into(), models);
        self
    }
}

impl ModuleResolver for StaticResolver {
    fn resolve_adapter(&self, reference: &str) -> Option<AdapterDefinition> {
        self.adapters.get(reference).cloned()
    }

    fn resolve_models(&self, reference: &str) -> Option<Vec<ModelDefinition>> {
        self.models.get(reference).cloned()
    }
}
