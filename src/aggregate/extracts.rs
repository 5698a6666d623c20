//! Item source attribution, loaded once from a versioned snapshot file.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use std::time::Instant;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::task::JoinHandle;
use tracing::{info, warn};

#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("failed to read extracts {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid extracts JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Where an item can be obtained. `type` is kept as the snapshot encodes it
/// (string or numeric tag); the rest of the descriptor is passed through.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceDescriptor {
    #[serde(rename = "type")]
    pub kind: Value,
    #[serde(flatten)]
    pub details: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct ExtractRow {
    #[serde(default, deserialize_with = "super::refs::null_as_default")]
    sources: Vec<SourceDescriptor>,
}

/// Read-only item id -> sources mapping.
#[derive(Debug, Default)]
pub struct ExtractedSourceMap {
    rows: HashMap<u32, Vec<SourceDescriptor>>,
}

impl ExtractedSourceMap {
    pub fn from_json(text: &str) -> Result<Self, ExtractError> {
        let raw: HashMap<u32, ExtractRow> = serde_json::from_str(text)?;
        Ok(Self {
            rows: raw.into_iter().map(|(id, row)| (id, row.sources)).collect(),
        })
    }

    pub fn sources_for(&self, item_id: u32) -> &[SourceDescriptor] {
        self.rows.get(&item_id).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl FromIterator<(u32, Vec<SourceDescriptor>)> for ExtractedSourceMap {
    fn from_iter<I: IntoIterator<Item = (u32, Vec<SourceDescriptor>)>>(iter: I) -> Self {
        Self {
            rows: iter.into_iter().collect(),
        }
    }
}

/// Dev builds read the unversioned snapshot; releases pin a content hash.
pub fn snapshot_file_name(version: Option<&str>) -> String {
    match version.map(str::trim).filter(|v| !v.is_empty()) {
        Some(v) => format!("extracts.{v}.json"),
        None => "extracts.json".to_string(),
    }
}

pub async fn load(path: &Path) -> Result<ExtractedSourceMap, ExtractError> {
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| ExtractError::Read {
            path: path.to_path_buf(),
            source,
        })?;
    ExtractedSourceMap::from_json(&text)
}

/// Slot for the source map. Empty until the startup load completes; readers
/// never wait for it.
#[derive(Debug, Clone, Default)]
pub struct ExtractStore(Arc<OnceLock<ExtractedSourceMap>>);

impl ExtractStore {
    #[cfg(test)]
    pub fn loaded(map: ExtractedSourceMap) -> Self {
        let store = Self::default();
        store.set(map);
        store
    }

    pub fn get(&self) -> Option<&ExtractedSourceMap> {
        self.0.get()
    }

    pub fn set(&self, map: ExtractedSourceMap) {
        if self.0.set(map).is_err() {
            warn!("extracts already loaded, ignoring second snapshot");
        }
    }

    pub fn spawn_load(&self, path: PathBuf) -> JoinHandle<()> {
        let store = self.clone();
        tokio::spawn(async move {
            let started = Instant::now();
            match load(&path).await {
                Ok(map) => {
                    if map.is_empty() {
                        warn!(path = %path.display(), "extracts snapshot has no entries");
                    }
                    info!(
                        entries = map.len(),
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        "extracts loaded"
                    );
                    store.set(map);
                }
                Err(e) => warn!(error = %e, "extracts unavailable, item sources will be empty"),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_snapshot_and_defaults_missing_entries() {
        let map = ExtractedSourceMap::from_json(
            r#"{"1001": {"id": 1001, "sources": [{"type": "Recipe", "id": 55}]}, "1003": {"id": 1003}}"#,
        )
        .unwrap();
        assert_eq!(map.len(), 2);
        let sources = map.sources_for(1001);
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].kind, json!("Recipe"));
        assert_eq!(sources[0].details.get("id"), Some(&json!(55)));
        assert!(map.sources_for(1002).is_empty());
        assert!(map.sources_for(1003).is_empty());
    }

    #[test]
    fn snapshot_name_uses_version_when_present() {
        assert_eq!(snapshot_file_name(None), "extracts.json");
        assert_eq!(snapshot_file_name(Some(" ")), "extracts.json");
        assert_eq!(snapshot_file_name(Some("ab12cd")), "extracts.ab12cd.json");
    }

    #[test]
    fn null_sources_do_not_drop_other_items() {
        let map = ExtractedSourceMap::from_json(
            r#"{"1001": {"sources": [{"type": "Recipe", "id": 55}]}, "1002": {"sources": null}}"#,
        )
        .unwrap();
        assert_eq!(map.sources_for(1001).len(), 1);
        assert!(map.sources_for(1002).is_empty());
    }

    #[tokio::test]
    async fn background_load_fills_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("extracts.json");
        std::fs::write(&path, r#"{"5": {"sources": [{"type": 2, "data": [1]}]}}"#).unwrap();

        let store = ExtractStore::default();
        assert!(store.get().is_none());
        store.spawn_load(path).await.unwrap();
        assert_eq!(store.get().unwrap().sources_for(5).len(), 1);
    }

    #[tokio::test]
    async fn missing_snapshot_leaves_store_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = ExtractStore::default();
        store.spawn_load(dir.path().join("nope.json")).await.unwrap();
        assert!(store.get().is_none());
    }
}
