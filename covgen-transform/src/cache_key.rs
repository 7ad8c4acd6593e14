//! Deterministic cache keys for transform results.
//!
//! A key is the SHA-256 of the transformer's own key (or the default key) mixed with every input
//! that can change emitted code: source text and path, config string, the instrument flag, the caller
//! capability flags, the transformer identity, and the secondary instrumenter when one will run.
//! Errors from a transformer's key operation propagate; there is no fallback key.

use crate::error::TransformError;
use crate::options::TransformOptions;
use crate::transformer::{CacheKeyOp, LoadedTransformer, TransformerIdentity};
use camino::Utf8Path;
use covgen_hash::Fingerprint;

/// Bump when the layout of cached entries or of the key itself changes.
pub const CACHE_VERSION: &str = "1";

/// The key used for transformers that do not provide one.
pub fn default_cache_key(source: &str, path: &Utf8Path, options: &TransformOptions) -> String {
    Fingerprint::new("covgen.default-key")
        .str(source)
        .str(path.as_str())
        .str(options.config_string())
        .flag(options.instrument())
        .byte(options.caller().bits())
        .bytes(options.transformer_config().as_bytes())
        .finish()
}

/// Synchronous key: `getCacheKey` when declared, otherwise the default key.
pub fn get_cache_key(
    loaded: &LoadedTransformer,
    source: &str,
    path: &Utf8Path,
    options: &TransformOptions,
    instrumenter: Option<&TransformerIdentity>,
) -> Result<String, TransformError> {
    let inner = match loaded.plan().cache_key {
        CacheKeyOp::Sync => loaded
            .transformer()
            .cache_key(source, path, options)
            .map_err(|source| TransformError::CacheKey {
                path: path.to_path_buf(),
                source,
            })?,
        CacheKeyOp::Async | CacheKeyOp::Default => default_cache_key(source, path, options),
    };
    Ok(finalize(loaded.identity(), &inner, source, path, options, instrumenter))
}

/// Asynchronous key, following the loaded plan: `getCacheKeyAsync`, then `getCacheKey`, then the
/// default key.
pub async fn get_cache_key_async(
    loaded: &LoadedTransformer,
    source: &str,
    path: &Utf8Path,
    options: &TransformOptions,
    instrumenter: Option<&TransformerIdentity>,
) -> Result<String, TransformError> {
    let inner = match loaded.plan().cache_key {
        CacheKeyOp::Async => loaded
            .transformer()
            .cache_key_async(source, path, options)
            .await
            .map_err(|source| TransformError::CacheKey {
                path: path.to_path_buf(),
                source,
            })?,
        CacheKeyOp::Sync => {
            return get_cache_key(loaded, source, path, options, instrumenter);
        }
        CacheKeyOp::Default => default_cache_key(source, path, options),
    };
    Ok(finalize(loaded.identity(), &inner, source, path, options, instrumenter))
}

fn finalize(
    identity: &TransformerIdentity,
    transformer_key: &str,
    source: &str,
    path: &Utf8Path,
    options: &TransformOptions,
    instrumenter: Option<&TransformerIdentity>,
) -> String {
    let mut fp = Fingerprint::new("covgen.cache-key")
        .str(CACHE_VERSION)
        .str(&identity.name)
        .str(&identity.version)
        .str(transformer_key)
        .str(source)
        .str(path.as_str())
        .str(options.config_string())
        .flag(options.instrument())
        .byte(options.caller().bits());
    if let Some(inst) = instrumenter {
        fp = fp.str(&inst.name).str(&inst.version);
    }
    fp.finish()
}
