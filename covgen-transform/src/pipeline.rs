use crate::cache_key::get_cache_key_async;
use crate::error::{ConfigurationError, TransformError};
use crate::instrument::Instrumenter;
use crate::options::{FileContentCache, TransformOptions, Usage, config_string};
use crate::registry::{IDENTITY, TransformerRegistry};
use crate::store::TransformCache;
use crate::transformer::{LoadedTransformer, TransformerIdentity};
use camino::Utf8Path;
use covgen_types::config::ProjectConfig;
use covgen_types::transform::{CallerTransformOptions, TransformedSource, TransformerConfig};
use regex::Regex;
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Debug)]
struct Rule {
    pattern: Regex,
    loaded: LoadedTransformer,
    transformer_config: TransformerConfig,
}

/// Transformers for one project config, loaded and checked up front.
///
/// Loading resolves every `transform` entry and its usage plan, so configuration errors surface
/// before the first file. A pipeline is immutable afterwards and may serve any number of files.
pub struct TransformPipeline {
    config: Arc<ProjectConfig>,
    config_string: Arc<str>,
    rules: Vec<Rule>,
    fallback: LoadedTransformer,
    instrumenter: Arc<dyn Instrumenter>,
    instrumenter_identity: TransformerIdentity,
    cache: Arc<dyn TransformCache>,
}

impl TransformPipeline {
    pub fn load(
        config: Arc<ProjectConfig>,
        registry: &TransformerRegistry,
        usage: Usage,
        instrumenter: Arc<dyn Instrumenter>,
        cache: Arc<dyn TransformCache>,
    ) -> Result<Self, ConfigurationError> {
        let config_string: Arc<str> = config_string(&config)
            .map_err(|e| ConfigurationError::Fingerprint {
                message: e.to_string(),
            })?
            .into();

        let mut rules = Vec::with_capacity(config.transform.len());
        for entry in &config.transform {
            let pattern =
                Regex::new(&entry.pattern).map_err(|e| ConfigurationError::InvalidPattern {
                    pattern: entry.pattern.clone(),
                    message: e.to_string(),
                })?;
            let transformer_config = TransformerConfig::from_json(&entry.config);
            let transformer = registry.resolve(&entry.transformer, &transformer_config)?;
            let loaded = LoadedTransformer::load(transformer, usage)?;
            debug!(
                pattern = %entry.pattern,
                transformer = %loaded.identity().name,
                plan = ?loaded.plan(),
                "loaded transform rule"
            );
            rules.push(Rule {
                pattern,
                loaded,
                transformer_config,
            });
        }

        let fallback =
            LoadedTransformer::load(registry.resolve(IDENTITY, &TransformerConfig::default())?, usage)?;

        Ok(Self {
            instrumenter_identity: instrumenter.identity(),
            config,
            config_string,
            rules,
            fallback,
            instrumenter,
            cache,
        })
    }

    pub fn config(&self) -> &ProjectConfig {
        &self.config
    }

    pub fn config_string(&self) -> &str {
        &self.config_string
    }

    /// The transformer the first matching `transform` entry selects, or the identity fallback.
    pub fn transformer_for(&self, path: &Utf8Path) -> &LoadedTransformer {
        self.rule_for(path)
            .map(|r| &r.loaded)
            .unwrap_or(&self.fallback)
    }

    fn rule_for(&self, path: &Utf8Path) -> Option<&Rule> {
        self.rules.iter().find(|r| r.pattern.is_match(path.as_str()))
    }

    /// Transform one file.
    ///
    /// `instrument` is fixed for the whole call. Cache read and write failures are logged and
    /// otherwise ignored; transformer and instrumenter failures are returned.
    pub async fn transform(
        &self,
        path: &Utf8Path,
        source: &str,
        instrument: bool,
        caller: CallerTransformOptions,
        cache_fs: &FileContentCache,
    ) -> Result<TransformedSource, TransformError> {
        let (loaded, transformer_config) = match self.rule_for(path) {
            Some(rule) => (&rule.loaded, rule.transformer_config.clone()),
            None => (&self.fallback, TransformerConfig::default()),
        };
        let options = TransformOptions::new(
            self.config.clone(),
            self.config_string.clone(),
            instrument,
            caller,
            transformer_config,
            cache_fs.clone(),
        );
        let secondary = instrument && !loaded.can_instrument();
        let instrumenter = secondary.then_some(&self.instrumenter_identity);

        let key = get_cache_key_async(loaded, source, path, &options, instrumenter).await?;

        match self.cache.get(&key) {
            Ok(Some(hit)) => {
                debug!(path = %path, key = %key, "transform cache hit");
                return Ok(hit);
            }
            Ok(None) => {}
            Err(e) => warn!(path = %path, key = %key, error = %format!("{e:#}"), "transform cache read failed"),
        }

        let mut out = loaded
            .process(source, path, &options)
            .await
            .map_err(|source| TransformError::Process {
                transformer: loaded.identity().name.clone(),
                path: path.to_path_buf(),
                source,
            })?;

        if secondary {
            out = self
                .instrumenter
                .instrument(&out, path)
                .map_err(|source| TransformError::Instrument {
                    path: path.to_path_buf(),
                    source,
                })?;
        }

        if let Err(e) = self.cache.put(&key, &out) {
            warn!(path = %path, key = %key, error = %format!("{e:#}"), "transform cache write failed");
        }
        debug!(
            path = %path,
            transformer = %loaded.identity().name,
            instrumented = instrument,
            secondary,
            "transformed"
        );
        Ok(out)
    }
}

impl std::fmt::Debug for TransformPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransformPipeline")
            .field("rules", &self.rules)
            .field("fallback", &self.fallback)
            .field("instrumenter", &self.instrumenter_identity)
            .finish_non_exhaustive()
    }
}
