use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::lang::Language;
use crate::filter::Filter;

/// Searchable entity category, plus the `Any` aggregate and the `Lore`
/// full-text pseudo-type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ContentType {
    Item,
    Recipe,
    Action,
    Monster,
    Leve,
    Instance,
    Map,
    Quest,
    Achievement,
    Fate,
    FishingSpot,
    GatheringNode,
    Npc,
    Status,
    Trait,
    Any,
    Lore,
}

impl ContentType {
    /// Content types that own an index. `Recipe` is served by the item index,
    /// `Any` fans out over these, `Lore` goes to the lore service.
    pub const SEARCHABLE: [ContentType; 14] = [
        ContentType::Item,
        ContentType::Action,
        ContentType::Monster,
        ContentType::Leve,
        ContentType::Instance,
        ContentType::Map,
        ContentType::Quest,
        ContentType::Achievement,
        ContentType::Fate,
        ContentType::FishingSpot,
        ContentType::GatheringNode,
        ContentType::Npc,
        ContentType::Status,
        ContentType::Trait,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ContentType::Item => "Item",
            ContentType::Recipe => "Recipe",
            ContentType::Action => "Action",
            ContentType::Monster => "Monster",
            ContentType::Leve => "Leve",
            ContentType::Instance => "Instance",
            ContentType::Map => "Map",
            ContentType::Quest => "Quest",
            ContentType::Achievement => "Achievement",
            ContentType::Fate => "Fate",
            ContentType::FishingSpot => "FishingSpot",
            ContentType::GatheringNode => "GatheringNode",
            ContentType::Npc => "Npc",
            ContentType::Status => "Status",
            ContentType::Trait => "Trait",
            ContentType::Any => "Any",
            ContentType::Lore => "Lore",
        }
    }

    pub fn is_searchable(self) -> bool {
        Self::SEARCHABLE.contains(&self)
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown content type: {0}")]
pub struct UnknownContentType(String);

impl FromStr for ContentType {
    type Err = UnknownContentType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        const ALL: [ContentType; 17] = [
            ContentType::Item,
            ContentType::Recipe,
            ContentType::Action,
            ContentType::Monster,
            ContentType::Leve,
            ContentType::Instance,
            ContentType::Map,
            ContentType::Quest,
            ContentType::Achievement,
            ContentType::Fate,
            ContentType::FishingSpot,
            ContentType::GatheringNode,
            ContentType::Npc,
            ContentType::Status,
            ContentType::Trait,
            ContentType::Any,
            ContentType::Lore,
        ];
        let wanted = s.trim().replace(['-', '_'], "");
        ALL.into_iter()
            .find(|t| t.name().eq_ignore_ascii_case(&wanted))
            .ok_or_else(|| UnknownContentType(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn as_str(self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

/// Sort instruction. Without a field the index engine (or remote server)
/// applies its own default ordering.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Sort {
    pub field: Option<String>,
    pub order: SortOrder,
}

#[cfg(test)]
impl Sort {
    pub fn by(field: impl Into<String>, order: SortOrder) -> Self {
        Self {
            field: Some(field.into()),
            order,
        }
    }
}

/// A single search query. Built once, then only read.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    query: String,
    content_type: ContentType,
    filters: Vec<Filter>,
    sort: Sort,
    language: Language,
}

impl SearchRequest {
    pub fn new(query: impl Into<String>, content_type: ContentType, language: Language) -> Self {
        Self {
            query: query.into(),
            content_type,
            filters: Vec::new(),
            sort: Sort::default(),
            language,
        }
    }

    pub fn with_filters(mut self, filters: Vec<Filter>) -> Self {
        self.filters = filters;
        self
    }

    pub fn with_sort(mut self, sort: Sort) -> Self {
        self.sort = sort;
        self
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn content_type(&self) -> ContentType {
        self.content_type
    }

    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    pub fn sort(&self) -> &Sort {
        &self.sort
    }

    pub fn language(&self) -> Language {
        self.language
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn searchable_excludes_pseudo_types() {
        assert_eq!(ContentType::SEARCHABLE.len(), 14);
        assert!(!ContentType::Recipe.is_searchable());
        assert!(!ContentType::Any.is_searchable());
        assert!(!ContentType::Lore.is_searchable());
        assert!(ContentType::GatheringNode.is_searchable());
    }

    #[test]
    fn content_type_parses_loosely() {
        assert_eq!("item".parse::<ContentType>().unwrap(), ContentType::Item);
        assert_eq!(
            "fishing-spot".parse::<ContentType>().unwrap(),
            ContentType::FishingSpot
        );
        assert_eq!(
            "gathering_node".parse::<ContentType>().unwrap(),
            ContentType::GatheringNode
        );
        assert!("weapon".parse::<ContentType>().is_err());
    }

    #[test]
    fn content_type_serializes_as_pascal_case() {
        let json = serde_json::to_string(&ContentType::FishingSpot).unwrap();
        assert_eq!(json, r#""FishingSpot""#);
    }

    #[test]
    fn default_sort_has_no_field_and_descends() {
        let sort = Sort::default();
        assert!(sort.field.is_none());
        assert_eq!(sort.order, SortOrder::Desc);
    }
}
