use crate::search::{Language, SearchResultRow};

/// One line per row: `Type  id  name`, with a source count for item-like
/// rows and the origin for lore hits.
pub(crate) fn format_rows(rows: &[SearchResultRow]) -> String {
    if rows.is_empty() {
        return "(no results)\n".to_string();
    }
    let mut out = String::new();
    for row in rows {
        let line = match row {
            SearchResultRow::Lore(hit) => format!(
                "{:<14}{:<8}{} [{}]",
                row.content_type().name(),
                hit.source_id,
                sanitize(row.display_name()),
                hit.source
            ),
            _ => {
                let id = row.index_row().map(|r| r.id).unwrap_or_default();
                let mut line = format!(
                    "{:<14}{:<8}{}",
                    row.content_type().name(),
                    id,
                    sanitize(row.display_name())
                );
                if let Some(sources) = row.sources() {
                    line.push_str(&format!(" ({} sources)", sources.len()));
                }
                line
            }
        };
        out.push_str(&line);
        out.push('\n');
    }
    out
}

pub(crate) struct LanguageStatus {
    pub language: Language,
    pub ready: bool,
    pub ingesting: bool,
}

/// One line per language; `*` marks the current search language.
pub(crate) fn format_status(statuses: &[LanguageStatus], current: Language) -> String {
    let mut out = String::new();
    for s in statuses {
        let marker = if s.language == current { '*' } else { ' ' };
        let state = if s.ready {
            "ready"
        } else if s.ingesting {
            "ingesting"
        } else {
            "not built"
        };
        out.push_str(&format!("{marker} {:<4}{state}\n", s.language.code()));
    }
    out
}

/// Keeps one row per line.
fn sanitize(s: &str) -> String {
    s.chars()
        .map(|c| if c == '\n' || c == '\r' { ' ' } else { c })
        .collect()
}
