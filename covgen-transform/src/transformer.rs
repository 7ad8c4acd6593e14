use crate::error::ConfigurationError;
use crate::options::{TransformOptions, Usage};
use async_trait::async_trait;
use camino::Utf8Path;
use covgen_types::transform::{TransformedSource, TransformerConfig};
use std::sync::Arc;

/// Name and version of a transformer. Both feed every cache key the transformer produces.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TransformerIdentity {
    pub name: String,
    pub version: String,
}

impl TransformerIdentity {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }
}

/// The optional operations a transformer implements.
///
/// Calling an operation that is not declared here is a bug in the host, not in the transformer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Operations {
    pub process: bool,
    pub process_async: bool,
    pub cache_key: bool,
    pub cache_key_async: bool,
}

impl Operations {
    /// `process` only.
    pub const SYNC: Self = Self {
        process: true,
        process_async: false,
        cache_key: false,
        cache_key_async: false,
    };

    /// `processAsync` only.
    pub const ASYNC: Self = Self {
        process: false,
        process_async: true,
        cache_key: false,
        cache_key_async: false,
    };

    pub fn with_cache_key(mut self) -> Self {
        self.cache_key = true;
        self
    }

    pub fn with_cache_key_async(mut self) -> Self {
        self.cache_key_async = true;
        self
    }
}

/// A source transformer plugged into the pipeline.
///
/// Implementors declare their operations in [`Transformer::operations`] and override the matching
/// methods. Output must be deterministic for fixed `(source, path, options)`; a transformer that
/// embeds anything else (timestamps, randomness) must also provide a cache key that accounts for it.
#[async_trait]
pub trait Transformer: Send + Sync {
    fn identity(&self) -> TransformerIdentity;

    fn operations(&self) -> Operations {
        Operations::SYNC
    }

    /// When true, instrumented output is trusted and no secondary pass runs.
    fn can_instrument(&self) -> bool {
        false
    }

    fn process(
        &self,
        _source: &str,
        _path: &Utf8Path,
        _options: &TransformOptions,
    ) -> anyhow::Result<TransformedSource> {
        Err(undeclared(&self.identity(), "process"))
    }

    async fn process_async(
        &self,
        _source: &str,
        _path: &Utf8Path,
        _options: &TransformOptions,
    ) -> anyhow::Result<TransformedSource> {
        Err(undeclared(&self.identity(), "processAsync"))
    }

    fn cache_key(
        &self,
        _source: &str,
        _path: &Utf8Path,
        _options: &TransformOptions,
    ) -> anyhow::Result<String> {
        Err(undeclared(&self.identity(), "getCacheKey"))
    }

    async fn cache_key_async(
        &self,
        _source: &str,
        _path: &Utf8Path,
        _options: &TransformOptions,
    ) -> anyhow::Result<String> {
        Err(undeclared(&self.identity(), "getCacheKeyAsync"))
    }
}

fn undeclared(identity: &TransformerIdentity, op: &str) -> anyhow::Error {
    anyhow::anyhow!("transformer `{}` does not implement {}", identity.name, op)
}

/// Builds a transformer from its configuration payload.
///
/// The registry calls this once per distinct payload and reuses the result.
pub trait TransformerFactory: Send + Sync {
    fn create_transformer(&self, config: &TransformerConfig)
    -> anyhow::Result<Arc<dyn Transformer>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessOp {
    Sync,
    Async,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheKeyOp {
    Sync,
    Async,
    Default,
}

/// Which operation serves a usage, fixed when the transformer is loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsagePlan {
    pub usage: Usage,
    pub process: ProcessOp,
    pub cache_key: CacheKeyOp,
}

impl UsagePlan {
    pub fn resolve(ops: Operations, usage: Usage, name: &str) -> Result<Self, ConfigurationError> {
        let missing = |required| ConfigurationError::MissingOperation {
            name: name.to_string(),
            usage,
            required,
        };
        match usage {
            Usage::Require => {
                if !ops.process {
                    return Err(missing("`process`"));
                }
                Ok(Self {
                    usage,
                    process: ProcessOp::Sync,
                    cache_key: if ops.cache_key {
                        CacheKeyOp::Sync
                    } else {
                        CacheKeyOp::Default
                    },
                })
            }
            Usage::Import => {
                let process = if ops.process_async {
                    ProcessOp::Async
                } else if ops.process {
                    ProcessOp::Sync
                } else {
                    return Err(missing("`processAsync` or `process`"));
                };
                let cache_key = if ops.cache_key_async {
                    CacheKeyOp::Async
                } else if ops.cache_key {
                    CacheKeyOp::Sync
                } else {
                    CacheKeyOp::Default
                };
                Ok(Self {
                    usage,
                    process,
                    cache_key,
                })
            }
        }
    }
}

/// A transformer with its usage plan resolved.
#[derive(Clone)]
pub struct LoadedTransformer {
    transformer: Arc<dyn Transformer>,
    identity: TransformerIdentity,
    can_instrument: bool,
    plan: UsagePlan,
}

impl LoadedTransformer {
    pub fn load(transformer: Arc<dyn Transformer>, usage: Usage) -> Result<Self, ConfigurationError> {
        let identity = transformer.identity();
        let plan = UsagePlan::resolve(transformer.operations(), usage, &identity.name)?;
        Ok(Self {
            can_instrument: transformer.can_instrument(),
            transformer,
            identity,
            plan,
        })
    }

    pub fn identity(&self) -> &TransformerIdentity {
        &self.identity
    }

    pub fn can_instrument(&self) -> bool {
        self.can_instrument
    }

    pub fn plan(&self) -> UsagePlan {
        self.plan
    }

    pub fn transformer(&self) -> &Arc<dyn Transformer> {
        &self.transformer
    }

    /// Run whichever process operation the plan selected.
    pub async fn process(
        &self,
        source: &str,
        path: &Utf8Path,
        options: &TransformOptions,
    ) -> anyhow::Result<TransformedSource> {
        match self.plan.process {
            ProcessOp::Sync => self.transformer.process(source, path, options),
            ProcessOp::Async => self.transformer.process_async(source, path, options).await,
        }
    }
}

impl std::fmt::Debug for LoadedTransformer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedTransformer")
            .field("identity", &self.identity)
            .field("can_instrument", &self.can_instrument)
            .field("plan", &self.plan)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn require_uses_only_process() {
        let ops = Operations {
            process: true,
            process_async: true,
            cache_key: false,
            cache_key_async: true,
        };
        let plan = UsagePlan::resolve(ops, Usage::Require, "t").unwrap();
        assert_eq!(plan.process, ProcessOp::Sync);
        assert_eq!(plan.cache_key, CacheKeyOp::Default);
    }

    #[test]
    fn require_without_process_is_a_configuration_error() {
        let err = UsagePlan::resolve(Operations::ASYNC, Usage::Require, "esm-only").unwrap_err();
        assert!(matches!(
            err,
            ConfigurationError::MissingOperation {
                usage: Usage::Require,
                ..
            }
        ));
    }

    #[test]
    fn import_prefers_async_and_falls_back() {
        let both = Operations {
            process: true,
            process_async: true,
            cache_key: true,
            cache_key_async: true,
        };
        let plan = UsagePlan::resolve(both, Usage::Import, "t").unwrap();
        assert_eq!(plan.process, ProcessOp::Async);
        assert_eq!(plan.cache_key, CacheKeyOp::Async);

        let sync_only = Operations::SYNC.with_cache_key();
        let plan = UsagePlan::resolve(sync_only, Usage::Import, "t").unwrap();
        assert_eq!(plan.process, ProcessOp::Sync);
        assert_eq!(plan.cache_key, CacheKeyOp::Sync);
    }

    #[test]
    fn import_without_any_process_is_a_configuration_error() {
        let ops = Operations::default().with_cache_key();
        assert!(UsagePlan::resolve(ops, Usage::Import, "t").is_err());
    }
}
