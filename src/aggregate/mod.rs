//! Query execution against one or many content-type indexes, plus row
//! normalization and enrichment.

pub mod extracts;
pub mod lore;
pub mod refs;

use std::path::PathBuf;

use tokio::sync::OnceCell;
use tracing::debug;

use crate::filter::{Operator, Predicate, translate};
use crate::index::{IndexEngine, IndexError};
use crate::search::{ContentType, Language, Region, SearchRequest, SearchResultRow};
use extracts::ExtractStore;
use lore::{LoreClient, LoreError, resolve_hits};
use refs::ReferenceTables;

/// One index lookup issued for a request.
#[derive(Debug, Clone, PartialEq)]
pub struct SubQuery {
    /// Index the lookup runs against.
    pub index: ContentType,
    /// Type reported on the resulting rows.
    pub tag: ContentType,
    pub predicates: Vec<Predicate>,
}

/// Expands a request into the index lookups that answer it, in issue order.
///
/// `Recipe` runs against the item index restricted to craftable entries;
/// `Any` fans out over every searchable type. `Lore` has no index lookups.
pub fn plan(request: &SearchRequest) -> Vec<SubQuery> {
    let predicates = translate(request.filters());
    match request.content_type() {
        ContentType::Lore => vec![],
        ContentType::Any => ContentType::SEARCHABLE
            .into_iter()
            .map(|ct| SubQuery {
                index: ct,
                tag: ct,
                predicates: predicates.clone(),
            })
            .collect(),
        ContentType::Recipe => {
            let mut predicates = predicates;
            predicates.push(Predicate::new("craftable", Operator::Eq, true));
            vec![SubQuery {
                index: ContentType::Item,
                tag: ContentType::Recipe,
                predicates,
            }]
        }
        ct => vec![SubQuery {
            index: ct,
            tag: ct,
            predicates,
        }],
    }
}

pub struct ResultAggregator<L> {
    lore: L,
    region: Region,
    extracts: ExtractStore,
    reference_paths: Option<(PathBuf, PathBuf)>,
    tables: OnceCell<ReferenceTables>,
}

impl<L: LoreClient> ResultAggregator<L> {
    pub fn new(lore: L, region: Region, extracts: ExtractStore) -> Self {
        Self {
            lore,
            region,
            extracts,
            reference_paths: None,
            tables: OnceCell::new(),
        }
    }

    /// NPC and instance tables, read on the first lore search.
    pub fn with_reference_paths(mut self, npcs: PathBuf, instances: PathBuf) -> Self {
        self.reference_paths = Some((npcs, instances));
        self
    }

    #[cfg(test)]
    pub fn with_reference_tables(mut self, tables: ReferenceTables) -> Self {
        self.tables = OnceCell::new_with(Some(tables));
        self
    }

    /// Runs `request` against an index engine. Rows come back in sub-query
    /// issue order, each tagged with its reporting type; item-like rows are
    /// enriched with sources when the extracts are loaded.
    pub fn execute<E: IndexEngine>(
        &self,
        engine: &E,
        request: &SearchRequest,
    ) -> Result<Vec<SearchResultRow>, IndexError> {
        let sub_queries = plan(request);
        if sub_queries.is_empty() {
            return Err(IndexError::Unsupported(request.content_type()));
        }

        let extracts = self.extracts.get();
        if extracts.is_none() {
            debug!("extracts not loaded yet, item sources will be empty");
        }

        let mut rows = Vec::new();
        for sub in &sub_queries {
            let hits = engine.search(sub.index, request.query(), &sub.predicates, request.sort())?;
            debug!(index = %sub.index, hits = hits.len(), "sub-query complete");
            rows.extend(hits.into_iter().filter_map(|hit| {
                let mut row = SearchResultRow::from_index(sub.tag, hit)?;
                row.attach_sources(extracts);
                Some(row)
            }));
        }
        Ok(rows)
    }

    pub async fn search_lore(
        &self,
        query: &str,
        language: Language,
    ) -> Result<Vec<SearchResultRow>, LoreError> {
        let hits = self
            .lore
            .search_lore(query, language.lore_code(self.region))
            .await?;
        let tables = self.reference_tables().await;
        Ok(resolve_hits(hits, tables)
            .into_iter()
            .map(SearchResultRow::Lore)
            .collect())
    }

    async fn reference_tables(&self) -> &ReferenceTables {
        self.tables
            .get_or_init(|| async {
                match &self.reference_paths {
                    Some((npcs, instances)) => ReferenceTables::load(npcs, instances).await,
                    None => ReferenceTables::default(),
                }
            })
            .await
    }
}
