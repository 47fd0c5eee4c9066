//! Scope records
//!
//! Every contributing registration context (the host itself, a plugin, a
//! plugin's sub-registration) is a scope. Scopes form a tree rooted at the
//! hub's root scope. Each scope keeps the ordered identities of the models
//! registered through it or through any of its descendants.

use std::collections::HashMap;
use ulid::Ulid;

use crate::error::{CollectorError, CollectorResult};

/// Unique identifier for a registration scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeId(Ulid);

impl ScopeId {
    /// Generate a new unique ScopeId.
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for ScopeId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ScopeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Per-scope state: its place in the tree and the models it owns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeRecord {
    name: String,
    parent: Option<ScopeId>,
    models: Vec<String>,
}

impl ScopeRecord {
    fn new(name: String, parent: Option<ScopeId>) -> Self {
        Self {
            name,
            parent,
            models: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> Option<ScopeId> {
        self.parent
    }

    /// Model identities owned by this scope, in registration order.
    pub fn models(&self) -> &[String] {
        &self.models
    }
}

/// Keyed-by-scope storage for [`ScopeRecord`]s.
#[derive(Debug, Clone)]
pub struct ScopeStore {
    root: ScopeId,
    records: HashMap<ScopeId, ScopeRecord>,
}

impl ScopeStore {
    /// Create a store holding only the root scope.
    pub fn new(root_name: impl Into<String>) -> Self {
        let root = ScopeId::new();
        let mut records = HashMap::new();
        records.insert(root, ScopeRecord::new(root_name.into(), None));
        Self { root, records }
    }

    /// The root scope (the host itself).
    pub fn root(&self) -> ScopeId {
        self.root
    }

    /// Register a child scope under `parent`.
    pub fn create_scope(
        &mut self,
        parent: ScopeId,
        name: impl Into<String>,
    ) -> CollectorResult<ScopeId> {
        self.ensure_known(parent)?;
        let id = ScopeId::new();
        self.records
            .insert(id, ScopeRecord::new(name.into(), Some(parent)));
        Ok(id)
    }

    pub fn contains(&self, scope: ScopeId) -> bool {
        self.records.contains_key(&scope)
    }

    pub fn get(&self, scope: ScopeId) -> Option<&ScopeRecord> {
        self.records.get(&scope)
    }

    /// Fails with [`CollectorError::UnknownScope`] if `scope` was never created.
    pub fn ensure_known(&self, scope: ScopeId) -> CollectorResult<()> {
        if self.contains(scope) {
            Ok(())
        } else {
            Err(CollectorError::UnknownScope(scope.to_string()))
        }
    }

    /// Model identities owned by `scope`.
    pub fn models(&self, scope: ScopeId) -> CollectorResult<&[String]> {
        self.records
            .get(&scope)
            .map(ScopeRecord::models)
            .ok_or_else(|| CollectorError::UnknownScope(scope.to_string()))
    }

    /// Append identities to `scope` and every ancestor up to the root.
    pub fn record_models(&mut self, scope: ScopeId, identities: &[String]) -> CollectorResult<()> {
        self.ensure_known(scope)?;

        let mut current = Some(scope);
        while let Some(id) = current {
            let record = self
                .records
                .get_mut(&id)
                .ok_or_else(|| CollectorError::UnknownScope(id.to_string()))?;
            record.models.extend(identities.iter().cloned());
            current = record.parent;
        }
        Ok(())
    }
}
