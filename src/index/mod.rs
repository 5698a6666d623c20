//! Per-language content indexes: the engine seam and the registry that
//! builds them lazily.

pub mod json;
pub mod registry;

pub use json::JsonIndexEngine;
pub use registry::{LanguageIndexRegistry, Readiness};

use std::path::PathBuf;

use crate::filter::Predicate;
use crate::search::{ContentType, IndexRow, Language, Sort};

#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    #[error("{0} has no index of its own")]
    Unsupported(ContentType),

    #[error("{0} index has not been built")]
    NotBuilt(ContentType),

    #[error("building the {language} {content_type} index failed: {reason}")]
    BuildFailed {
        language: Language,
        content_type: ContentType,
        reason: String,
    },

    #[error("failed to read index source {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid index source {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// The full-text/attribute engine behind one language.
/// Implemented by `JsonIndexEngine`; test doubles live in `testing`.
pub trait IndexEngine {
    fn has_index(&self, content_type: ContentType) -> bool;

    async fn build_index(&self, content_type: ContentType) -> Result<(), IndexError>;

    fn search(
        &self,
        content_type: ContentType,
        query: &str,
        predicates: &[Predicate],
        sort: &Sort,
    ) -> Result<Vec<IndexRow>, IndexError>;
}
