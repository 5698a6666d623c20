//! Full-text lore search. Hits point at other game entities, often
//! indirectly through dialogue, so each result set is rewritten to the
//! entity a user can actually open.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use super::refs::ReferenceTables;
use crate::search::Region;

const XIVAPI_BASE: &str = "https://xivapi.com";
const CAFEMAKER_BASE: &str = "https://cafemaker.wakingsands.com";
const LORE_COLUMNS: &str = "Icon,Name_*,Banner";
const NPC_ICON: &str = "/c/ENpcResident.png";

#[derive(Debug, thiserror::Error)]
pub enum LoreError {
    #[error("lore service error: status {0}")]
    Status(u16),

    #[error("lore service unreachable: {0}")]
    Network(#[from] reqwest::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LoreHit {
    pub source: String,
    #[serde(rename = "SourceID")]
    pub source_id: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default)]
    pub data: LoreData,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoreData {
    #[serde(rename = "Icon", default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    /// Whether the UI should offer a link to the entity's detail page.
    #[serde(rename = "showButton", default)]
    pub show_button: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct LoreResponse {
    #[serde(rename = "Results", default)]
    results: Vec<LoreHit>,
}

/// Abstraction over the lore full-text service.
/// Implemented by `XivapiLoreClient`; mock implementations used in tests.
pub trait LoreClient {
    async fn search_lore(&self, query: &str, language: &str) -> Result<Vec<LoreHit>, LoreError>;
}

#[derive(Clone)]
pub struct XivapiLoreClient {
    http: Client,
    base_url: String,
}

impl XivapiLoreClient {
    pub fn for_region(http: Client, region: Region) -> Self {
        let base_url = match region {
            Region::China => CAFEMAKER_BASE,
            Region::Global | Region::Korea => XIVAPI_BASE,
        };
        Self::with_base_url(http, base_url)
    }

    pub fn with_base_url(http: Client, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

impl LoreClient for XivapiLoreClient {
    async fn search_lore(&self, query: &str, language: &str) -> Result<Vec<LoreHit>, LoreError> {
        let url = format!("{}/lore", self.base_url);
        let response = self
            .http
            .get(&url)
            .header("User-Agent", crate::USER_AGENT)
            .query(&[
                ("string", query),
                ("language", language),
                ("columns", LORE_COLUMNS),
                ("page", "1"),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(LoreError::Status(status.as_u16()));
        }
        let body: LoreResponse = response.json().await?;
        debug!(hits = body.results.len(), "lore search complete");
        Ok(body.results)
    }
}

/// Points each hit at the entity that owns it. Hits whose owner cannot be
/// found are returned untouched.
pub fn resolve_hits(hits: Vec<LoreHit>, tables: &ReferenceTables) -> Vec<LoreHit> {
    hits.into_iter().map(|hit| resolve_hit(hit, tables)).collect()
}

fn resolve_hit(mut hit: LoreHit, tables: &ReferenceTables) -> LoreHit {
    match hit.source.to_ascii_lowercase().as_str() {
        "item" | "leve" | "quest" => hit.data.show_button = true,
        "defaulttalk" => {
            if let Some(npc) = tables.npc_with_default_talk(hit.source_id) {
                point_at_npc(&mut hit, npc);
            }
        }
        "balloon" => {
            if let Some(npc) = tables.npc_with_balloon(hit.source_id) {
                point_at_npc(&mut hit, npc);
            }
        }
        "instancecontenttextdata" => {
            if let Some(instance) = tables.instance_with_content_text(hit.source_id) {
                hit.source = "instance".to_string();
                hit.source_id = instance;
                hit.data.show_button = true;
            }
        }
        _ => {}
    }
    hit
}

fn point_at_npc(hit: &mut LoreHit, npc: u32) {
    hit.source = "npc".to_string();
    hit.source_id = npc;
    hit.data.icon = Some(NPC_ICON.to_string());
    hit.data.show_button = true;
}
