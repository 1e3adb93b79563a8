//! Container-engine credential store document model.
//!
//! The stores are shared, multi-tenant JSON files: the container engine and
//! the user both write to them. Everything this module does not own —
//! unrelated host entries, extra per-entry fields, unrelated top-level
//! sections — must survive a decode/encode round trip untouched.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// One registry-host entry: the base64 `login:password` token plus whatever
/// other fields the engine or the user stored alongside it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthEntry {
    pub auth: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AuthEntry {
    pub fn new(auth: impl Into<String>) -> Self {
        Self {
            auth: auth.into(),
            extra: Map::new(),
        }
    }
}

/// A decoded credential store: registry host → entry, plus any top-level
/// keys other tools keep in the same document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuthFile {
    #[serde(default)]
    pub auths: BTreeMap<String, AuthEntry>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Decode raw store content. Blank input is an empty store, never an error.
pub fn decode(raw: &[u8]) -> Result<AuthFile> {
    if raw.iter().all(|b| b.is_ascii_whitespace()) {
        return Ok(AuthFile::default());
    }
    serde_json::from_slice(raw).context("parse registry auth file")
}

/// Encode a store document back to its on-disk representation.
pub fn encode(file: &AuthFile) -> Result<Vec<u8>> {
    let mut out = serde_json::to_vec_pretty(file).context("serialize registry auth file")?;
    out.push(b'\n');
    Ok(out)
}

/// Insert or overwrite the entry for `registry`. All other entries pass
/// through unchanged.
pub fn upsert(file: &mut AuthFile, registry: &str, entry: AuthEntry) {
    file.auths.insert(registry.to_string(), entry);
}

/// Delete the entry for `registry` only when its stored secret material
/// equals `entry`'s. A differing value means someone else owns the key now;
/// it is left untouched. Returns whether the document changed.
pub fn remove_matching(file: &mut AuthFile, registry: &str, entry: &AuthEntry) -> bool {
    match file.auths.get(registry) {
        Some(stored) if stored.auth == entry.auth => {
            file.auths.remove(registry);
            true
        }
        _ => false,
    }
}
