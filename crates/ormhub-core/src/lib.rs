//! Core types for ormhub
//!
//! Scopes contribute partial ORM configuration (adapters, connections,
//! models, defaults). This crate turns each contribution into a canonical
//! [`ConfigFragment`], merges it into the [`GlobalCollector`] and remembers
//! which scope owns which models.
//!
//! ```
//! use ormhub_core::{
//!     merge_fragment, normalize, GlobalCollector, ModelDefinition, RegistrationInput,
//!     ScopeStore, StaticResolver,
//! };
//!
//! let mut collector = GlobalCollector::new();
//! let mut scopes = ScopeStore::new("server");
//! let accounts = scopes.create_scope(scopes.root(), "accounts").unwrap();
//!
//! let input = RegistrationInput::Models(vec![ModelDefinition::new("user")]);
//! let fragment = normalize(input, &StaticResolver::new()).unwrap();
//! merge_fragment(&mut collector, &mut scopes, accounts, fragment).unwrap();
//!
//! assert!(collector.models().contains_key("user"));
//! assert_eq!(scopes.models(accounts).unwrap(), ["user"]);
//! ```

pub mod collector;
pub mod definition;
pub mod error;
pub mod fragment;
pub mod resolver;
pub mod scope;

pub use collector::{merge_fragment, GlobalCollector};
pub use definition::{AdapterDefinition, ConnectionDefinition, ModelDefinition};
pub use error::{CollectorError, CollectorResult, EntryKind};
pub use fragment::{
    normalize, AdapterSource, ConfigFragment, ModelsSource, RegistrationInput, RegistrationOptions,
};
pub use resolver::{ModuleResolver, StaticResolver};
pub use scope::{ScopeId, ScopeRecord, ScopeStore};
