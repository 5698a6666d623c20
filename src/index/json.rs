//! File-backed index engine. Each content type is a JSON array of rows at
//! `<data_dir>/<lang>/<contenttype>.json`, loaded into memory on build.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use serde_json::Value;
use tracing::debug;

use super::{IndexEngine, IndexError};
use crate::filter::{Operator, Predicate};
use crate::search::{ContentType, IndexRow, Sort, SortOrder};

const DEFAULT_MAX_RESULTS: usize = 100;

pub struct JsonIndexEngine {
    dir: PathBuf,
    max_results: usize,
    indexes: RwLock<HashMap<ContentType, Arc<Vec<IndexRow>>>>,
}

impl JsonIndexEngine {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            max_results: DEFAULT_MAX_RESULTS,
            indexes: RwLock::new(HashMap::new()),
        }
    }

    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results.max(1);
        self
    }

    pub fn source_path(&self, content_type: ContentType) -> PathBuf {
        self.dir
            .join(format!("{}.json", content_type.name().to_ascii_lowercase()))
    }

    fn index(&self, content_type: ContentType) -> Option<Arc<Vec<IndexRow>>> {
        self.indexes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&content_type)
            .cloned()
    }
}

async fn read_rows(path: &Path) -> Result<Vec<IndexRow>, IndexError> {
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| IndexError::Read {
            path: path.to_path_buf(),
            source,
        })?;
    serde_json::from_str(&text).map_err(|source| IndexError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

impl IndexEngine for JsonIndexEngine {
    fn has_index(&self, content_type: ContentType) -> bool {
        self.index(content_type).is_some()
    }

    async fn build_index(&self, content_type: ContentType) -> Result<(), IndexError> {
        if !content_type.is_searchable() {
            return Err(IndexError::Unsupported(content_type));
        }
        let path = self.source_path(content_type);
        let rows = read_rows(&path).await?;
        debug!(content_type = %content_type, rows = rows.len(), path = %path.display(), "index built");
        self.indexes
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(content_type, Arc::new(rows));
        Ok(())
    }

    fn search(
        &self,
        content_type: ContentType,
        query: &str,
        predicates: &[Predicate],
        sort: &Sort,
    ) -> Result<Vec<IndexRow>, IndexError> {
        let rows = self
            .index(content_type)
            .ok_or(IndexError::NotBuilt(content_type))?;
        let needle = query.trim().to_lowercase();

        let mut hits: Vec<IndexRow> = rows
            .iter()
            .filter(|row| needle.is_empty() || row.name.to_lowercase().contains(&needle))
            .filter(|row| predicates.iter().all(|p| matches(row, p)))
            .cloned()
            .collect();

        if let Some(field) = &sort.field {
            hits.sort_by(|a, b| {
                let ord = match (a.field(field), b.field(field)) {
                    (Some(x), Some(y)) => compare(&x, &y).unwrap_or(Ordering::Equal),
                    (Some(_), None) => return Ordering::Less,
                    (None, Some(_)) => return Ordering::Greater,
                    (None, None) => Ordering::Equal,
                };
                match sort.order {
                    SortOrder::Asc => ord,
                    SortOrder::Desc => ord.reverse(),
                }
            });
        }
        hits.truncate(self.max_results);
        Ok(hits)
    }
}

fn matches(row: &IndexRow, predicate: &Predicate) -> bool {
    let value = row.field(&predicate.field);
    match predicate.operator {
        Operator::NotExists => value.is_none(),
        Operator::Eq => value.is_some_and(|v| loose_eq(&v, &predicate.value)),
        Operator::AnyOf => value.is_some_and(|v| match &predicate.value {
            Value::Array(options) => options.iter().any(|o| loose_eq(&v, o)),
            single => loose_eq(&v, single),
        }),
        Operator::Gte => value.is_some_and(|v| {
            compare(&v, &predicate.value).is_some_and(|o| o != Ordering::Less)
        }),
        Operator::Lte => value.is_some_and(|v| {
            compare(&v, &predicate.value).is_some_and(|o| o != Ordering::Greater)
        }),
    }
}

/// Equality that tolerates numbers encoded as strings. An array field
/// matches when any element does.
fn loose_eq(field: &Value, wanted: &Value) -> bool {
    if let Value::Array(items) = field {
        return items.iter().any(|item| loose_eq(item, wanted));
    }
    match (as_number(field), as_number(wanted)) {
        (Some(a), Some(b)) => a == b,
        _ => field == wanted,
    }
}

fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    match (as_number(a), as_number(b)) {
        (Some(x), Some(y)) => x.partial_cmp(&y),
        _ => match (a, b) {
            (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
            _ => None,
        },
    }
}

fn as_number(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
