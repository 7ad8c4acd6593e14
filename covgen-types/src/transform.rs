use serde::{Deserialize, Serialize};

/// Target-runtime features the caller supports. Names follow Babel's `caller` options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallerTransformOptions {
    pub supports_dynamic_import: bool,
    pub supports_export_namespace_from: bool,
    #[serde(rename = "supportsStaticESM")]
    pub supports_static_esm: bool,
    pub supports_top_level_await: bool,
}

impl CallerTransformOptions {
    /// Every feature supported.
    pub fn all() -> Self {
        Self {
            supports_dynamic_import: true,
            supports_export_namespace_from: true,
            supports_static_esm: true,
            supports_top_level_await: true,
        }
    }

    /// Stable single-byte encoding used when fingerprinting.
    pub fn bits(&self) -> u8 {
        (self.supports_dynamic_import as u8)
            | (self.supports_export_namespace_from as u8) << 1
            | (self.supports_static_esm as u8) << 2
            | (self.supports_top_level_await as u8) << 3
    }
}

/// Output of a transformer, and of the whole transform pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransformedSource {
    pub code: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub map: Option<SourceMap>,
}

impl TransformedSource {
    pub fn code_only(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            map: None,
        }
    }
}

/// A source map either as structured JSON or as an already-encoded string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SourceMap {
    Raw(RawSourceMap),
    Encoded(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSourceMap {
    pub version: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_root: Option<String>,

    #[serde(default)]
    pub sources: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sources_content: Option<Vec<Option<String>>>,

    #[serde(default)]
    pub names: Vec<String>,

    pub mappings: String,
}

/// Opaque transformer-specific options.
///
/// The core only forwards and hashes these bytes. Equality is byte equality.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TransformerConfig(Vec<u8>);

impl TransformerConfig {
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// Encode a JSON value with sorted object keys, so equal values give equal bytes.
    pub fn from_json(value: &serde_json::Value) -> Self {
        if value.is_null() {
            return Self::default();
        }
        let canonical = canonicalize_json(value);
        Self(serde_json::to_vec(&canonical).unwrap_or_default())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Decode the payload as JSON, for transformers that were configured with it.
    pub fn to_json(&self) -> serde_json::Result<serde_json::Value> {
        if self.0.is_empty() {
            return Ok(serde_json::Value::Null);
        }
        serde_json::from_slice(&self.0)
    }
}

fn canonicalize_json(value: &serde_json::Value) -> serde_json::Value {
    match value {
        serde_json::Value::Object(map) => {
            let mut keys: Vec<_> = map.keys().cloned().collect();
            keys.sort();
            let mut out = serde_json::Map::new();
            for k in keys {
                if let Some(v) = map.get(&k) {
                    out.insert(k, canonicalize_json(v));
                }
            }
            serde_json::Value::Object(out)
        }
        serde_json::Value::Array(items) => {
            serde_json::Value::Array(items.iter().map(canonicalize_json).collect())
        }
        other => other.clone(),
    }
}
