use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::request::ContentType;
use crate::aggregate::extracts::{ExtractedSourceMap, SourceDescriptor};
use crate::aggregate::lore::LoreHit;

/// A row as stored in a content-type index. Everything beyond the common
/// identity fields is type-specific and kept as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexRow {
    pub id: u32,
    #[serde(rename = "itemId", default, skip_serializing_if = "Option::is_none")]
    pub item_id: Option<u32>,
    #[serde(default)]
    pub name: String,
    #[serde(flatten)]
    pub data: Map<String, Value>,
}

impl IndexRow {
    /// Key into the extracted source map.
    pub fn item_key(&self) -> u32 {
        self.item_id.unwrap_or(self.id)
    }

    /// Field lookup covering both identity fields and the payload.
    pub fn field(&self, name: &str) -> Option<Value> {
        match name {
            "id" => Some(Value::from(self.id)),
            "itemId" => self.item_id.map(Value::from),
            "name" => Some(Value::from(self.name.clone())),
            _ => self.data.get(name).filter(|v| !v.is_null()).cloned(),
        }
    }
}

/// One search hit, tagged with the content type it belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SearchResultRow {
    Item {
        #[serde(flatten)]
        row: IndexRow,
        #[serde(default)]
        sources: Vec<SourceDescriptor>,
    },
    Recipe {
        #[serde(flatten)]
        row: IndexRow,
        #[serde(default)]
        sources: Vec<SourceDescriptor>,
    },
    Action(IndexRow),
    Monster(IndexRow),
    Leve(IndexRow),
    Instance(IndexRow),
    Map(IndexRow),
    Quest(IndexRow),
    Achievement(IndexRow),
    Fate(IndexRow),
    FishingSpot(IndexRow),
    GatheringNode(IndexRow),
    Npc(IndexRow),
    Status(IndexRow),
    Trait(IndexRow),
    Lore(LoreHit),
}

impl SearchResultRow {
    /// Wraps an index row under `content_type`. `Any` and `Lore` never come
    /// out of an index, so they yield `None`.
    pub fn from_index(content_type: ContentType, row: IndexRow) -> Option<Self> {
        let tagged = match content_type {
            ContentType::Item => SearchResultRow::Item {
                row,
                sources: vec![],
            },
            ContentType::Recipe => SearchResultRow::Recipe {
                row,
                sources: vec![],
            },
            ContentType::Action => SearchResultRow::Action(row),
            ContentType::Monster => SearchResultRow::Monster(row),
            ContentType::Leve => SearchResultRow::Leve(row),
            ContentType::Instance => SearchResultRow::Instance(row),
            ContentType::Map => SearchResultRow::Map(row),
            ContentType::Quest => SearchResultRow::Quest(row),
            ContentType::Achievement => SearchResultRow::Achievement(row),
            ContentType::Fate => SearchResultRow::Fate(row),
            ContentType::FishingSpot => SearchResultRow::FishingSpot(row),
            ContentType::GatheringNode => SearchResultRow::GatheringNode(row),
            ContentType::Npc => SearchResultRow::Npc(row),
            ContentType::Status => SearchResultRow::Status(row),
            ContentType::Trait => SearchResultRow::Trait(row),
            ContentType::Any | ContentType::Lore => return None,
        };
        Some(tagged)
    }

    pub fn content_type(&self) -> ContentType {
        match self {
            SearchResultRow::Item { .. } => ContentType::Item,
            SearchResultRow::Recipe { .. } => ContentType::Recipe,
            SearchResultRow::Action(_) => ContentType::Action,
            SearchResultRow::Monster(_) => ContentType::Monster,
            SearchResultRow::Leve(_) => ContentType::Leve,
            SearchResultRow::Instance(_) => ContentType::Instance,
            SearchResultRow::Map(_) => ContentType::Map,
            SearchResultRow::Quest(_) => ContentType::Quest,
            SearchResultRow::Achievement(_) => ContentType::Achievement,
            SearchResultRow::Fate(_) => ContentType::Fate,
            SearchResultRow::FishingSpot(_) => ContentType::FishingSpot,
            SearchResultRow::GatheringNode(_) => ContentType::GatheringNode,
            SearchResultRow::Npc(_) => ContentType::Npc,
            SearchResultRow::Status(_) => ContentType::Status,
            SearchResultRow::Trait(_) => ContentType::Trait,
            SearchResultRow::Lore(_) => ContentType::Lore,
        }
    }

    pub fn index_row(&self) -> Option<&IndexRow> {
        match self {
            SearchResultRow::Item { row, .. } | SearchResultRow::Recipe { row, .. } => Some(row),
            SearchResultRow::Action(row)
            | SearchResultRow::Monster(row)
            | SearchResultRow::Leve(row)
            | SearchResultRow::Instance(row)
            | SearchResultRow::Map(row)
            | SearchResultRow::Quest(row)
            | SearchResultRow::Achievement(row)
            | SearchResultRow::Fate(row)
            | SearchResultRow::FishingSpot(row)
            | SearchResultRow::GatheringNode(row)
            | SearchResultRow::Npc(row)
            | SearchResultRow::Status(row)
            | SearchResultRow::Trait(row) => Some(row),
            SearchResultRow::Lore(_) => None,
        }
    }

    /// Only item-like rows carry sources.
    pub fn sources(&self) -> Option<&[SourceDescriptor]> {
        match self {
            SearchResultRow::Item { sources, .. } | SearchResultRow::Recipe { sources, .. } => {
                Some(sources)
            }
            _ => None,
        }
    }

    /// Fills `sources` for item-like rows. A missing map or entry leaves an
    /// empty list.
    pub fn attach_sources(&mut self, extracts: Option<&ExtractedSourceMap>) {
        match self {
            SearchResultRow::Item { row, sources } | SearchResultRow::Recipe { row, sources } => {
                *sources = extracts
                    .map(|map| map.sources_for(row.item_key()).to_vec())
                    .unwrap_or_default();
            }
            _ => {}
        }
    }

    pub fn display_name(&self) -> &str {
        match self {
            SearchResultRow::Lore(hit) => hit.text.as_deref().unwrap_or_default(),
            other => other.index_row().map(|r| r.name.as_str()).unwrap_or_default(),
        }
    }
}
