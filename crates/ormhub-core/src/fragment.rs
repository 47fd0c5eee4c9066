//! Registration input and its canonical form
//!
//! A scope registers either a bare list of models or a full options object.
//! The shape is decided once, at the boundary, by [`RegistrationInput`]; the
//! normalizer then turns either shape into a [`ConfigFragment`] with every
//! reference resolved.

use indexmap::IndexMap;
use serde_json::{Map, Value};
use tracing::{debug, instrument};

use crate::definition::{AdapterDefinition, ConnectionDefinition, ModelDefinition};
use crate::error::{CollectorError, CollectorResult, EntryKind};
use crate::resolver::ModuleResolver;

/// An adapter given inline or by reference
#[derive(Debug, Clone, PartialEq)]
pub enum AdapterSource {
    Definition(AdapterDefinition),
    Reference(String),
}

/// Models given inline or by reference to a model source
#[derive(Debug, Clone, PartialEq)]
pub enum ModelsSource {
    Inline(Vec<ModelDefinition>),
    Reference(String),
}

impl Default for ModelsSource {
    fn default() -> Self {
        ModelsSource::Inline(Vec::new())
    }
}

/// Structured registration options
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegistrationOptions {
    pub adapters: IndexMap<String, AdapterSource>,
    pub connections: IndexMap<String, ConnectionDefinition>,
    pub models: ModelsSource,
    pub defaults: IndexMap<String, Value>,
    pub teardown_on_stop: Option<bool>,
}

impl RegistrationOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_adapter(mut self, name: impl Into<String>, definition: AdapterDefinition) -> Self {
        self.adapters
            .insert(name.into(), AdapterSource::Definition(definition));
        self
    }

    pub fn with_adapter_reference(
        mut self,
        name: impl Into<String>,
        reference: impl Into<String>,
    ) -> Self {
        self.adapters
            .insert(name.into(), AdapterSource::Reference(reference.into()));
        self
    }

    pub fn with_connection(mut self, name: impl Into<String>, connection: ConnectionDefinition) -> Self {
        self.connections.insert(name.into(), connection);
        self
    }

    /// Append an inline model. Replaces a models reference if one was set.
    pub fn with_model(mut self, model: ModelDefinition) -> Self {
        match &mut self.models {
            ModelsSource::Inline(models) => models.push(model),
            ModelsSource::Reference(_) => self.models = ModelsSource::Inline(vec![model]),
        }
        self
    }

    pub fn with_models_reference(mut self, reference: impl Into<String>) -> Self {
        self.models = ModelsSource::Reference(reference.into());
        self
    }

    pub fn with_default(mut self, key: impl Into<String>, value: Value) -> Self {
        self.defaults.insert(key.into(), value);
        self
    }

    pub fn with_teardown_on_stop(mut self, teardown: bool) -> Self {
        self.teardown_on_stop = Some(teardown);
        self
    }
}

/// The two accepted registration shapes
#[derive(Debug, Clone, PartialEq)]
pub enum RegistrationInput {
    Models(Vec<ModelDefinition>),
    Options(RegistrationOptions),
}

impl Default for RegistrationInput {
    fn default() -> Self {
        RegistrationInput::Options(RegistrationOptions::default())
    }
}

impl From<Vec<ModelDefinition>> for RegistrationInput {
    fn from(models: Vec<ModelDefinition>) -> Self {
        RegistrationInput::Models(models)
    }
}

impl From<RegistrationOptions> for RegistrationInput {
    fn from(options: RegistrationOptions) -> Self {
        RegistrationInput::Options(options)
    }
}

impl TryFrom<Value> for RegistrationInput {
    type Error = CollectorError;

    fn try_from(value: Value) -> CollectorResult<Self> {
        Self::from_value(value)
    }
}

impl RegistrationInput {
    /// Decide the input shape of loosely typed options.
    ///
    /// `null` is an empty registration, an array is a bare model list and an
    /// object is a full options object.
    pub fn from_value(value: Value) -> CollectorResult<Self> {
        match value {
            Value::Null => Ok(Self::default()),
            Value::Array(items) => parse_model_list(items).map(RegistrationInput::Models),
            Value::Object(map) => parse_options(map).map(RegistrationInput::Options),
            other => Err(CollectorError::validation(format!(
                "expected a list of models or an options object, got {}",
                value_kind(&other)
            ))),
        }
    }
}

/// Canonical, fully resolved registration
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigFragment {
    pub adapters: IndexMap<String, AdapterDefinition>,
    pub connections: IndexMap<String, ConnectionDefinition>,
    pub models: Vec<ModelDefinition>,
    pub defaults: IndexMap<String, Value>,
    pub teardown_on_stop: Option<bool>,
}

impl ConfigFragment {
    /// Identities of the fragment's models, in order
    pub fn model_identities(&self) -> Vec<String> {
        self.models.iter().map(|m| m.identity.clone()).collect()
    }
}

/// Turn either registration shape into a [`ConfigFragment`].
#[instrument(skip(input, resolver))]
pub fn normalize(
    input: RegistrationInput,
    resolver: &dyn ModuleResolver,
) -> CollectorResult<ConfigFragment> {
    let options = match input {
        RegistrationInput::Models(models) => RegistrationOptions {
            models: ModelsSource::Inline(models),
            ..Default::default()
        },
        RegistrationInput::Options(options) => options,
    };

    let mut adapters = IndexMap::with_capacity(options.adapters.len());
    for (name, source) in options.adapters {
        require_name(EntryKind::Adapter, &name)?;
        let definition = match source {
            AdapterSource::Definition(definition) => definition,
            AdapterSource::Reference(reference) => {
                debug!(adapter = %name, reference = %reference, "Resolving adapter reference");
                resolver
                    .resolve_adapter(&reference)
                    .ok_or(CollectorError::Resolution {
                        kind: EntryKind::Adapter,
                        reference,
                    })?
            }
        };
        adapters.insert(name, definition);
    }

    for (name, connection) in &options.connections {
        require_name(EntryKind::Connection, name)?;
        if connection.adapter.trim().is_empty() {
            return Err(CollectorError::validation(format!(
                "connection `{name}` must name an adapter"
            )));
        }
    }

    let models = match options.models {
        ModelsSource::Inline(models) => models,
        ModelsSource::Reference(reference) => {
            debug!(reference = %reference, "Resolving models reference");
            resolver
                .resolve_models(&reference)
                .ok_or(CollectorError::Resolution {
                    kind: EntryKind::Model,
                    reference,
                })?
        }
    };
    for model in &models {
        require_name(EntryKind::Model, &model.identity)?;
    }

    for key in options.defaults.keys() {
        require_name(EntryKind::Default, key)?;
    }

    Ok(ConfigFragment {
        adapters,
        connections: options.connections,
        models,
        defaults: options.defaults,
        teardown_on_stop: options.teardown_on_stop,
    })
}

fn require_name(kind: EntryKind, name: &str) -> CollectorResult<()> {
    if name.trim().is_empty() {
        let what = match kind {
            EntryKind::Model => "model identities",
            EntryKind::Adapter => "adapter names",
            EntryKind::Connection => "connection names",
            EntryKind::Default => "default keys",
        };
        return Err(CollectorError::validation(format!("{what} must not be empty")));
    }
    Ok(())
}

fn parse_options(map: Map<String, Value>) -> CollectorResult<RegistrationOptions> {
    let mut options = RegistrationOptions::default();

    for (key, value) in map {
        match key.as_str() {
            "adapters" => options.adapters = parse_adapters(value)?,
            "connections" => options.connections = parse_connections(value)?,
            "models" => options.models = parse_models(value)?,
            "defaults" => options.defaults = parse_defaults(value)?,
            "teardownOnStop" | "teardown_on_stop" => {
                let flag = match value {
                    Value::Null => None,
                    Value::Bool(flag) => Some(flag),
                    other => {
                        return Err(CollectorError::validation(format!(
                            "`teardownOnStop` must be a boolean, got {}",
                            value_kind(&other)
                        )))
                    }
                };
                if flag.is_some() && options.teardown_on_stop.is_some() {
                    return Err(CollectorError::validation(
                        "`teardownOnStop` given more than once",
                    ));
                }
                options.teardown_on_stop = options.teardown_on_stop.or(flag);
            }
            other => {
                return Err(CollectorError::validation(format!(
                    "unknown option `{other}`"
                )))
            }
        }
    }

    Ok(options)
}

fn parse_adapters(value: Value) -> CollectorResult<IndexMap<String, AdapterSource>> {
    let mut adapters = IndexMap::new();
    for (name, value) in expect_object("adapters", value)? {
        let source = match value {
            Value::String(reference) => AdapterSource::Reference(reference),
            Value::Object(_) => AdapterSource::Definition(
                serde_json::from_value(value)
                    .map_err(|e| CollectorError::validation(format!("adapter `{name}`: {e}")))?,
            ),
            other => {
                return Err(CollectorError::validation(format!(
                    "adapter `{name}` must be a definition or a reference, got {}",
                    value_kind(&other)
                )))
            }
        };
        adapters.insert(name, source);
    }
    Ok(adapters)
}

fn parse_connections(value: Value) -> CollectorResult<IndexMap<String, ConnectionDefinition>> {
    let mut connections = IndexMap::new();
    for (name, value) in expect_object("connections", value)? {
        if !value.is_object() {
            return Err(CollectorError::validation(format!(
                "connection `{name}` must be an object, got {}",
                value_kind(&value)
            )));
        }
        let connection = serde_json::from_value(value)
            .map_err(|e| CollectorError::validation(format!("connection `{name}`: {e}")))?;
        connections.insert(name, connection);
    }
    Ok(connections)
}

fn parse_models(value: Value) -> CollectorResult<ModelsSource> {
    match value {
        Value::Null => Ok(ModelsSource::default()),
        Value::String(reference) => Ok(ModelsSource::Reference(reference)),
        Value::Array(items) => parse_model_list(items).map(ModelsSource::Inline),
        other => Err(CollectorError::validation(format!(
            "`models` must be a list or a reference, got {}",
            value_kind(&other)
        ))),
    }
}

fn parse_model_list(items: Vec<Value>) -> CollectorResult<Vec<ModelDefinition>> {
    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            if !item.is_object() {
                return Err(CollectorError::validation(format!(
                    "models[{index}] must be an object, got {}",
                    value_kind(&item)
                )));
            }
            serde_json::from_value(item)
                .map_err(|e| CollectorError::validation(format!("models[{index}]: {e}")))
        })
        .collect()
}

fn parse_defaults(value: Value) -> CollectorResult<IndexMap<String, Value>> {
    Ok(expect_object("defaults", value)?.into_iter().collect())
}

fn expect_object(option: &str, value: Value) -> CollectorResult<Map<String, Value>> {
    match value {
        Value::Null => Ok(Map::new()),
        Value::Object(map) => Ok(map),
        other => Err(CollectorError::validation(format!(
            "`{option}` must be an object, got {}",
            value_kind(&other)
        ))),
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}
