//! Registration hub
//!
//! The [`OrmHub`] is the configuration-aggregation context owned by the
//! application. Plugins register their fragments against a scope while the
//! host is being assembled; the host then calls [`OrmHub::pre_start`] and
//! [`OrmHub::post_stop`] around its own lifetime.

use indexmap::IndexMap;
use ormhub_core::{
    merge_fragment, normalize, GlobalCollector, ModuleResolver, RegistrationInput, ScopeId,
    ScopeStore, StaticResolver,
};
use tracing::{debug, info, instrument, warn};

use crate::engine::OrmEngine;
use crate::error::{HubError, HubResult};
use crate::lifecycle::{LifecycleController, LifecycleState};

const DEFAULT_ROOT_NAME: &str = "root";

/// Which collections an accessor returns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CollectionScope {
    /// Every collection known to the engine
    All,
    /// Only the collections owned by the calling scope
    #[default]
    Scoped,
}

/// Builder for [`OrmHub`]
pub struct OrmHubBuilder<E: OrmEngine> {
    engine: E,
    root_name: String,
    resolver: Box<dyn ModuleResolver>,
}

impl<E: OrmEngine> OrmHubBuilder<E> {
    pub fn new(engine: E) -> Self {
        Self {
            engine,
            root_name: DEFAULT_ROOT_NAME.to_string(),
            resolver: Box::new(StaticResolver::new()),
        }
    }

    /// Name of the root scope, used in logs
    pub fn with_root_name(mut self, name: impl Into<String>) -> Self {
        self.root_name = name.into();
        self
    }

    /// Resolver for adapter and model references
    pub fn with_resolver(mut self, resolver: impl ModuleResolver + 'static) -> Self {
        self.resolver = Box::new(resolver);
        self
    }

    pub fn build(self) -> OrmHub<E> {
        OrmHub {
            collector: GlobalCollector::new(),
            scopes: ScopeStore::new(self.root_name),
            resolver: self.resolver,
            lifecycle: LifecycleController::new(self.engine),
        }
    }
}

/// Shared ORM configuration collector and lifecycle owner for one host
pub struct OrmHub<E: OrmEngine> {
    collector: GlobalCollector,
    scopes: ScopeStore,
    resolver: Box<dyn ModuleResolver>,
    lifecycle: LifecycleController<E>,
}

impl<E: OrmEngine> OrmHub<E> {
    pub fn new(engine: E) -> Self {
        OrmHubBuilder::new(engine).build()
    }

    pub fn builder(engine: E) -> OrmHubBuilder<E> {
        OrmHubBuilder::new(engine)
    }

    /// The host's own scope
    pub fn root(&self) -> ScopeId {
        self.scopes.root()
    }

    /// Create a registration scope (a plugin, or a plugin's sub-registration)
    pub fn create_scope(&mut self, parent: ScopeId, name: impl Into<String>) -> HubResult<ScopeId> {
        self.ensure_open()?;
        let name = name.into();
        let scope = self.scopes.create_scope(parent, name.clone())?;
        debug!(scope = %scope, parent = %parent, name = %name, "Created registration scope");
        Ok(scope)
    }

    /// Register a configuration fragment on behalf of `scope`.
    ///
    /// Only allowed before [`OrmHub::pre_start`]. Any error is a fatal
    /// misconfiguration; a failed merge is not rolled back.
    #[instrument(skip(self, input))]
    pub fn register(&mut self, scope: ScopeId, input: impl Into<RegistrationInput>) -> HubResult<()> {
        self.ensure_open()?;
        self.scopes.ensure_known(scope)?;

        let fragment = normalize(input.into(), self.resolver.as_ref())?;
        let models = fragment.models.len();
        merge_fragment(&mut self.collector, &mut self.scopes, scope, fragment)?;

        info!(scope = %scope, models, "Registered ORM configuration");
        Ok(())
    }

    /// Register loosely typed options (`null`, a model list or an options object)
    pub fn register_value(&mut self, scope: ScopeId, options: serde_json::Value) -> HubResult<()> {
        let input = RegistrationInput::from_value(options)?;
        self.register(scope, input)
    }

    pub fn collector(&self) -> &GlobalCollector {
        &self.collector
    }

    /// Model identities owned by `scope`
    pub fn scope_models(&self, scope: ScopeId) -> HubResult<&[String]> {
        Ok(self.scopes.models(scope)?)
    }

    pub fn state(&self) -> LifecycleState {
        self.lifecycle.state()
    }

    pub fn is_ready(&self) -> bool {
        self.lifecycle.state() == LifecycleState::Ready
    }

    /// The ORM engine handed the merged configuration
    pub fn engine(&self) -> &E {
        self.lifecycle.engine()
    }

    /// Host "before start" hook: initialize the ORM with everything registered.
    pub async fn pre_start(&mut self) -> HubResult<()> {
        self.lifecycle.initialize(&self.collector).await
    }

    /// Host "after stop" hook: tear the ORM down unless disabled.
    pub async fn post_stop(&mut self) -> HubResult<()> {
        let teardown = self.collector.should_teardown();
        self.lifecycle.stop(teardown).await
    }

    /// Initialized collections visible from `scope`, keyed by identity.
    ///
    /// Empty until the engine has produced collections.
    pub fn collections(&self, scope: ScopeId, which: CollectionScope) -> IndexMap<String, E::Collection> {
        let Some(collections) = self.lifecycle.collections() else {
            return IndexMap::new();
        };

        match which {
            CollectionScope::All => collections.clone(),
            CollectionScope::Scoped => {
                let Some(record) = self.scopes.get(scope) else {
                    warn!(scope = %scope, "Collections requested for unknown scope");
                    return IndexMap::new();
                };
                record
                    .models()
                    .iter()
                    .filter_map(|identity| {
                        collections
                            .get(identity)
                            .map(|collection| (identity.clone(), collection.clone()))
                    })
                    .collect()
            }
        }
    }

    /// Accessor bound to one scope, handed to request handlers
    pub fn realm(&self, scope: ScopeId) -> HubResult<Realm<'_, E>> {
        self.scopes.ensure_known(scope)?;
        Ok(Realm { hub: self, scope })
    }

    fn ensure_open(&self) -> HubResult<()> {
        if self.lifecycle.state() == LifecycleState::Uninitialized {
            Ok(())
        } else {
            Err(HubError::RegistrationClosed)
        }
    }
}

/// Collections accessor scoped to the realm of a request
pub struct Realm<'a, E: OrmEngine> {
    hub: &'a OrmHub<E>,
    scope: ScopeId,
}

impl<'a, E: OrmEngine> Realm<'a, E> {
    pub fn scope(&self) -> ScopeId {
        self.scope
    }

    pub fn collections(&self, which: CollectionScope) -> IndexMap<String, E::Collection> {
        self.hub.collections(self.scope, which)
    }
}

impl<'a, E: OrmEngine> Clone for Realm<'a, E> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<'a, E: OrmEngine> Copy for Realm<'a, E> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::MockOrmEngine;
    use ormhub_core::{CollectorError, ModelDefinition, RegistrationOptions};
    use serde_json::json;

    fn engine() -> MockOrmEngine {
        let mut engine = MockOrmEngine::new();
        engine.expect_initialize().returning(|_, models| {
            Ok(models
                .into_iter()
                .map(|m| (m.identity.clone(), m.identity))
                .collect())
        });
        engine.expect_teardown().returning(|| Ok(()));
        engine
    }

    fn keys(map: &IndexMap<String, String>) -> Vec<&str> {
        map.keys().map(String::as_str).collect()
    }

    #[tokio::test]
    async fn test_scoped_collections() {
        let mut hub = OrmHub::new(engine());
        let a = hub.create_scope(hub.root(), "accounts").unwrap();
        let b = hub.create_scope(hub.root(), "catalog").unwrap();

        hub.register(a, vec![ModelDefinition::new("user"), ModelDefinition::new("session")])
            .unwrap();
        hub.register(b, vec![ModelDefinition::new("product")]).unwrap();
        hub.pre_start().await.unwrap();

        assert_eq!(keys(&hub.collections(a, CollectionScope::Scoped)), ["user", "session"]);
        assert_eq!(keys(&hub.collections(b, CollectionScope::Scoped)), ["product"]);
        assert_eq!(
            keys(&hub.collections(b, CollectionScope::All)),
            ["user", "session", "product"]
        );
    }

    #[tokio::test]
    async fn test_collections_empty_before_start() {
        let mut hub = OrmHub::new(engine());
        let root = hub.root();
        hub.register(root, vec![ModelDefinition::new("user")]).unwrap();

        assert!(hub.collections(root, CollectionScope::All).is_empty());
        assert!(hub.collections(root, CollectionScope::Scoped).is_empty());
        assert!(!hub.is_ready());
    }

    #[tokio::test]
    async fn test_unknown_scope_gets_nothing() {
        let mut hub = OrmHub::new(engine());
        let root = hub.root();
        hub.register(root, vec![ModelDefinition::new("user")]).unwrap();
        hub.pre_start().await.unwrap();

        let stranger = ScopeId::new();
        assert!(hub.collections(stranger, CollectionScope::Scoped).is_empty());
        assert!(hub.realm(stranger).is_err());
    }

    #[tokio::test]
    async fn test_registration_closed_after_start() {
        let mut hub = OrmHub::new(engine());
        hub.pre_start().await.unwrap();

        let root = hub.root();
        let err = hub.register(root, vec![ModelDefinition::new("late")]).unwrap_err();
        assert!(matches!(err, HubError::RegistrationClosed));
        assert!(matches!(
            hub.create_scope(root, "late"),
            Err(HubError::RegistrationClosed)
        ));
    }

    #[test]
    fn test_register_unknown_scope() {
        let mut hub = OrmHub::new(MockOrmEngine::new());
        let err = hub
            .register(ScopeId::new(), vec![ModelDefinition::new("user")])
            .unwrap_err();
        assert!(matches!(err, HubError::Collector(CollectorError::UnknownScope(_))));
        assert!(hub.collector().is_empty());
    }

    #[test]
    fn test_register_value_shapes() {
        let mut hub = OrmHub::new(MockOrmEngine::new());
        let root = hub.root();

        hub.register_value(root, json!(null)).unwrap();
        hub.register_value(root, json!([{ "identity": "user" }])).unwrap();
        hub.register_value(root, json!({ "models": [{ "identity": "session" }] }))
            .unwrap();

        assert_eq!(hub.scope_models(root).unwrap(), ["user", "session"]);
        assert!(matches!(
            hub.register_value(root, json!(42)),
            Err(HubError::Collector(CollectorError::Validation(_)))
        ));
    }

    #[tokio::test]
    async fn test_post_stop_honours_flag() {
        let mut engine = MockOrmEngine::new();
        engine
            .expect_initialize()
            .returning(|_, _| Ok(IndexMap::new()));
        engine.expect_teardown().times(0);

        let mut hub = OrmHub::new(engine);
        let root = hub.root();
        hub.register(root, RegistrationOptions::new().with_teardown_on_stop(false))
            .unwrap();
        hub.pre_start().await.unwrap();
        hub.post_stop().await.unwrap();
        assert_eq!(hub.state(), LifecycleState::Stopped);
    }
}
