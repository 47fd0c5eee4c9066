//! Global collector and merge engine
//!
//! The collector holds the union of every fragment registered with a hub.
//! Keys are unique across all merges; the first registration of a key wins
//! and any later attempt is a fatal configuration error.

use indexmap::map::Entry;
use indexmap::IndexMap;
use serde_json::Value;
use tracing::{debug, instrument};

use crate::definition::{AdapterDefinition, ConnectionDefinition, ModelDefinition};
use crate::error::{CollectorError, CollectorResult, EntryKind};
use crate::fragment::ConfigFragment;
use crate::scope::{ScopeId, ScopeStore};

/// Merged configuration of every registered scope
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GlobalCollector {
    adapters: IndexMap<String, AdapterDefinition>,
    connections: IndexMap<String, ConnectionDefinition>,
    models: IndexMap<String, ModelDefinition>,
    defaults: IndexMap<String, Value>,
    teardown_on_stop: Option<bool>,
}

impl GlobalCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn adapters(&self) -> &IndexMap<String, AdapterDefinition> {
        &self.adapters
    }

    pub fn connections(&self) -> &IndexMap<String, ConnectionDefinition> {
        &self.connections
    }

    pub fn models(&self) -> &IndexMap<String, ModelDefinition> {
        &self.models
    }

    pub fn defaults(&self) -> &IndexMap<String, Value> {
        &self.defaults
    }

    /// The teardown flag: `None` while no scope has set it.
    pub fn teardown_on_stop(&self) -> Option<bool> {
        self.teardown_on_stop
    }

    /// Whether stopping the host should tear the ORM down. Unset means yes.
    pub fn should_teardown(&self) -> bool {
        self.teardown_on_stop.unwrap_or(true)
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
            && self.connections.is_empty()
            && self.models.is_empty()
            && self.defaults.is_empty()
            && self.teardown_on_stop.is_none()
    }

    /// Fold `fragment` into the collector.
    ///
    /// Entries are inserted one at a time; on the first duplicate the merge
    /// stops and entries already inserted stay in place. Returns the
    /// identities of the models that were added.
    #[instrument(skip(self, fragment))]
    pub fn merge(&mut self, fragment: ConfigFragment) -> CollectorResult<Vec<String>> {
        let ConfigFragment {
            adapters,
            connections,
            models,
            defaults,
            teardown_on_stop,
        } = fragment;

        for (name, adapter) in adapters {
            insert_unique(&mut self.adapters, EntryKind::Adapter, name, adapter)?;
        }
        for (name, connection) in connections {
            insert_unique(&mut self.connections, EntryKind::Connection, name, connection)?;
        }

        let mut identities = Vec::with_capacity(models.len());
        for model in models {
            let identity = model.identity.clone();
            insert_unique(&mut self.models, EntryKind::Model, identity.clone(), model)?;
            identities.push(identity);
        }

        for (key, value) in defaults {
            insert_unique(&mut self.defaults, EntryKind::Default, key, value)?;
        }

        if let Some(teardown) = teardown_on_stop {
            if self.teardown_on_stop.is_some() {
                return Err(CollectorError::AlreadySet);
            }
            self.teardown_on_stop = Some(teardown);
        }

        debug!(
            adapters = self.adapters.len(),
            connections = self.connections.len(),
            models = self.models.len(),
            defaults = self.defaults.len(),
            "Merged configuration fragment"
        );

        Ok(identities)
    }
}

fn insert_unique<T>(
    map: &mut IndexMap<String, T>,
    kind: EntryKind,
    key: String,
    value: T,
) -> CollectorResult<()> {
    match map.entry(key) {
        Entry::Occupied(entry) => Err(CollectorError::duplicate(kind, entry.key().as_str())),
        Entry::Vacant(entry) => {
            entry.insert(value);
            Ok(())
        }
    }
}

/// Merge `fragment` into `collector` on behalf of `scope`.
///
/// The merged model identities are recorded under `scope` and its
/// ancestors. Fails before touching the collector if `scope` is unknown.
/// When the merge fails partway, entries already inserted stay in the
/// collector but none of the fragment's models are recorded on any scope.
pub fn merge_fragment(
    collector: &mut GlobalCollector,
    scopes: &mut ScopeStore,
    scope: ScopeId,
    fragment: ConfigFragment,
) -> CollectorResult<()> {
    scopes.ensure_known(scope)?;
    let identities = collector.merge(fragment)?;
    scopes.record_models(scope, &identities)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fragment::{normalize, RegistrationInput, RegistrationOptions};
    use crate::resolver::StaticResolver;
    use serde_json::json;

    fn fragment(options: RegistrationOptions) -> ConfigFragment {
        normalize(options.into(), &StaticResolver::new()).unwrap()
    }

    fn keys<T>(map: &IndexMap<String, T>) -> Vec<&str> {
        map.keys().map(String::as_str).collect()
    }

    fn models(identities: &[&str]) -> ConfigFragment {
        let input = RegistrationInput::Models(
            identities.iter().map(|id| ModelDefinition::new(*id)).collect(),
        );
        normalize(input, &StaticResolver::new()).unwrap()
    }

    #[test]
    fn test_disjoint_merges_form_ordered_union() {
        let mut collector = GlobalCollector::new();

        collector
            .merge(fragment(
                RegistrationOptions::new()
                    .with_adapter("memory", AdapterDefinition::new("sails-memory"))
                    .with_connection("primary", ConnectionDefinition::new("memory"))
                    .with_model(ModelDefinition::new("user"))
                    .with_model(ModelDefinition::new("session"))
                    .with_default("migrate", json!("safe")),
            ))
            .unwrap();
        collector
            .merge(fragment(
                RegistrationOptions::new()
                    .with_adapter("disk", AdapterDefinition::new("sails-disk"))
                    .with_connection("archive", ConnectionDefinition::new("disk"))
                    .with_model(ModelDefinition::new("product"))
                    .with_default("schema", json!(true)),
            ))
            .unwrap();

        assert_eq!(keys(collector.adapters()), ["memory", "disk"]);
        assert_eq!(keys(collector.connections()), ["primary", "archive"]);
        assert_eq!(keys(collector.models()), ["user", "session", "product"]);
        assert_eq!(keys(collector.defaults()), ["migrate", "schema"]);
    }

    #[test]
    fn test_loosely_typed_merges_keep_key_order() {
        let mut collector = GlobalCollector::new();
        for value in [
            json!({
                "adapters": { "zeta": {}, "alpha": {} },
                "connections": { "zz": { "adapter": "zeta" }, "aa": { "adapter": "alpha" } },
                "defaults": { "z": 1, "a": 2 }
            }),
            json!({
                "adapters": { "mid": {} },
                "connections": { "mm": { "adapter": "mid" } },
                "defaults": { "m": 3 }
            }),
        ] {
            let input = RegistrationInput::from_value(value).unwrap();
            collector
                .merge(normalize(input, &StaticResolver::new()).unwrap())
                .unwrap();
        }

        assert_eq!(keys(collector.adapters()), ["zeta", "alpha", "mid"]);
        assert_eq!(keys(collector.connections()), ["zz", "aa", "mm"]);
        assert_eq!(keys(collector.defaults()), ["z", "a", "m"]);
    }

    #[test]
    fn test_duplicate_keys_rejected_and_first_kept() {
        let first = RegistrationOptions::new()
            .with_adapter("memory", AdapterDefinition::new("sails-memory"))
            .with_connection("primary", ConnectionDefinition::new("memory"))
            .with_model(ModelDefinition::new("user").with_connection("primary"));

        let cases = [
            (
                RegistrationOptions::new().with_adapter("memory", AdapterDefinition::new("other")),
                EntryKind::Adapter,
                "memory",
            ),
            (
                RegistrationOptions::new()
                    .with_connection("primary", ConnectionDefinition::new("disk")),
                EntryKind::Connection,
                "primary",
            ),
            (
                RegistrationOptions::new().with_model(ModelDefinition::new("user")),
                EntryKind::Model,
                "user",
            ),
        ];

        for (second, kind, key) in cases {
            let mut collector = GlobalCollector::new();
            collector.merge(fragment(first.clone())).unwrap();
            let before = collector.clone();

            let err = collector.merge(fragment(second)).unwrap_err();
            assert_eq!(err, CollectorError::duplicate(kind, key));
            assert_eq!(collector, before);
        }
    }

    #[test]
    fn test_duplicate_default_key() {
        let mut collector = GlobalCollector::new();
        collector
            .merge(fragment(RegistrationOptions::new().with_default("migrate", json!("safe"))))
            .unwrap();
        let err = collector
            .merge(fragment(RegistrationOptions::new().with_default("migrate", json!("alter"))))
            .unwrap_err();
        assert_eq!(err, CollectorError::duplicate(EntryKind::Default, "migrate"));
        assert_eq!(collector.defaults()["migrate"], json!("safe"));
    }

    #[test]
    fn test_duplicate_within_one_fragment() {
        let mut collector = GlobalCollector::new();
        let err = collector.merge(models(&["user", "user"])).unwrap_err();
        assert_eq!(err, CollectorError::duplicate(EntryKind::Model, "user"));
        // no rollback: the first copy stays
        assert!(collector.models().contains_key("user"));
    }

    #[test]
    fn test_teardown_flag_set_once() {
        let mut collector = GlobalCollector::new();
        assert!(collector.should_teardown());

        collector
            .merge(fragment(RegistrationOptions::new().with_teardown_on_stop(false)))
            .unwrap();
        assert_eq!(collector.teardown_on_stop(), Some(false));
        assert!(!collector.should_teardown());

        let err = collector
            .merge(fragment(RegistrationOptions::new().with_teardown_on_stop(false)))
            .unwrap_err();
        assert_eq!(err, CollectorError::AlreadySet);
        assert_eq!(collector.teardown_on_stop(), Some(false));
    }

    #[test]
    fn test_fragment_without_flag_leaves_it_unset() {
        let mut collector = GlobalCollector::new();
        collector.merge(models(&["user"])).unwrap();
        assert_eq!(collector.teardown_on_stop(), None);
    }

    #[test]
    fn test_merge_fragment_records_scope() {
        let mut collector = GlobalCollector::new();
        let mut scopes = ScopeStore::new("server");
        let accounts = scopes.create_scope(scopes.root(), "accounts").unwrap();
        let catalog = scopes.create_scope(scopes.root(), "catalog").unwrap();

        merge_fragment(&mut collector, &mut scopes, accounts, models(&["user", "session"])).unwrap();
        merge_fragment(&mut collector, &mut scopes, catalog, models(&["product"])).unwrap();

        assert_eq!(scopes.models(accounts).unwrap(), ["user", "session"]);
        assert_eq!(scopes.models(catalog).unwrap(), ["product"]);
    }

    #[test]
    fn test_merge_fragment_unknown_scope_leaves_collector_untouched() {
        let mut collector = GlobalCollector::new();
        let mut scopes = ScopeStore::new("server");

        let err = merge_fragment(&mut collector, &mut scopes, ScopeId::new(), models(&["user"]))
            .unwrap_err();
        assert!(matches!(err, CollectorError::UnknownScope(_)));
        assert!(collector.is_empty());
    }

    #[test]
    fn test_failed_merge_does_not_record_scope() {
        let mut collector = GlobalCollector::new();
        let mut scopes = ScopeStore::new("server");
        let root = scopes.root();

        merge_fragment(&mut collector, &mut scopes, root, models(&["user"])).unwrap();
        assert!(merge_fragment(&mut collector, &mut scopes, root, models(&["user"])).is_err());
        assert_eq!(scopes.models(root).unwrap(), ["user"]);
    }
}
