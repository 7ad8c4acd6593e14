use crate::error::ConfigurationError;
use crate::options::TransformOptions;
use crate::transformer::{Transformer, TransformerFactory, TransformerIdentity};
use camino::Utf8Path;
use covgen_types::transform::{TransformedSource, TransformerConfig};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};
use tracing::debug;

/// Name of the transformer that is always registered.
pub const IDENTITY: &str = "identity";

type Built = HashMap<(String, TransformerConfig), Arc<dyn Transformer>>;

/// How a registered name produces a transformer.
#[derive(Clone)]
pub enum TransformerSource {
    /// A ready instance; the transformer config is ignored.
    Instance(Arc<dyn Transformer>),
    /// Built on demand, once per distinct transformer config.
    Factory(Arc<dyn TransformerFactory>),
}

impl std::fmt::Debug for TransformerSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransformerSource::Instance(t) => {
                f.debug_tuple("Instance").field(&t.identity()).finish()
            }
            TransformerSource::Factory(_) => f.write_str("Factory(..)"),
        }
    }
}

/// Transformers by name, as referenced from `ProjectConfig.transform`.
///
/// Factory output is memoized per `(name, config bytes)`, so a factory runs once per distinct
/// configuration for the lifetime of the registry.
pub struct TransformerRegistry {
    sources: BTreeMap<String, TransformerSource>,
    built: Mutex<Built>,
}

impl Default for TransformerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TransformerRegistry {
    pub fn new() -> Self {
        let mut sources = BTreeMap::new();
        sources.insert(
            IDENTITY.to_string(),
            TransformerSource::Instance(Arc::new(IdentityTransformer)),
        );
        Self {
            sources,
            built: Mutex::new(HashMap::new()),
        }
    }

    /// Register `source` under `name`, replacing any previous registration.
    pub fn register(&mut self, name: impl Into<String>, source: TransformerSource) -> &mut Self {
        let name = name.into();
        self.lock().retain(|(n, _), _| *n != name);
        self.sources.insert(name, source);
        self
    }

    pub fn with_instance(mut self, name: impl Into<String>, t: Arc<dyn Transformer>) -> Self {
        self.register(name, TransformerSource::Instance(t));
        self
    }

    pub fn with_factory(mut self, name: impl Into<String>, f: Arc<dyn TransformerFactory>) -> Self {
        self.register(name, TransformerSource::Factory(f));
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.sources.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.sources.keys().map(String::as_str)
    }

    pub fn resolve(
        &self,
        name: &str,
        config: &TransformerConfig,
    ) -> Result<Arc<dyn Transformer>, ConfigurationError> {
        let source = self
            .sources
            .get(name)
            .ok_or_else(|| ConfigurationError::UnknownTransformer {
                name: name.to_string(),
            })?;
        let factory = match source {
            TransformerSource::Instance(t) => return Ok(t.clone()),
            TransformerSource::Factory(f) => f,
        };

        let key = (name.to_string(), config.clone());
        if let Some(hit) = self.lock().get(&key) {
            return Ok(hit.clone());
        }

        // Built outside the lock; a racing build of the same key keeps the first result.
        let built = factory
            .create_transformer(config)
            .map_err(|e| ConfigurationError::Factory {
                name: name.to_string(),
                message: format!("{e:#}"),
            })?;
        debug!(transformer = name, config_bytes = config.as_bytes().len(), "built transformer");
        Ok(self.lock().entry(key).or_insert(built).clone())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Built> {
        self.built.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl std::fmt::Debug for TransformerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransformerRegistry")
            .field("sources", &self.sources)
            .finish_non_exhaustive()
    }
}

/// Returns its input unchanged. Used for files no `transform` entry matches.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityTransformer;

impl Transformer for IdentityTransformer {
    fn identity(&self) -> TransformerIdentity {
        TransformerIdentity::new(IDENTITY, env!("CARGO_PKG_VERSION"))
    }

    fn process(
        &self,
        source: &str,
        _path: &Utf8Path,
        _options: &TransformOptions,
    ) -> anyhow::Result<TransformedSource> {
        Ok(TransformedSource::code_only(source))
    }
}
