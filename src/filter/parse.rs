use std::str::FromStr;

use serde_json::Value;

use super::{Filter, FilterValue};

#[derive(Debug, thiserror::Error)]
pub enum FilterParseError {
    #[error("Invalid filter '{0}'. Use 'name=value', 'name|=a;b', 'name=min..max', or 'name!!'.")]
    Syntax(String),

    #[error("Filter '{0}' has an empty field name")]
    EmptyName(String),
}

enum Rhs<'a> {
    Unset,
    AnyOf(&'a str),
    Value(&'a str),
}

/// Command-line filter syntax:
/// - `level=50` equals
/// - `job|=8;9` any of
/// - `itemLevel=10..20` bounded range
/// - `patch!!` field must be unset
/// - `job=null` no constraint
impl FromStr for Filter {
    type Err = FilterParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (name, rhs) = if let Some(name) = s.strip_suffix("!!") {
            (name, Rhs::Unset)
        } else if let Some((name, rhs)) = s.split_once("|=") {
            (name, Rhs::AnyOf(rhs))
        } else if let Some((name, rhs)) = s.split_once('=') {
            (name, Rhs::Value(rhs))
        } else {
            return Err(FilterParseError::Syntax(s.to_string()));
        };

        let name = name.trim();
        if name.is_empty() {
            return Err(FilterParseError::EmptyName(s.to_string()));
        }
        // Comparison operators are not part of the syntax; `level>=5` would
        // otherwise become an equality on `level>`.
        if name.contains(['<', '>', '|', '!', '=']) {
            return Err(FilterParseError::Syntax(s.to_string()));
        }

        let filter = match rhs {
            Rhs::Unset => Filter::excluded(name),
            Rhs::AnyOf(rhs) => Filter::one_of(
                name,
                rhs.split(';')
                    .filter(|v| !v.is_empty())
                    .map(parse_scalar)
                    .collect(),
            ),
            Rhs::Value("null") => Filter {
                name: name.to_string(),
                value: FilterValue::Null,
            },
            Rhs::Value(rhs) => match rhs.split_once("..") {
                Some((min, max)) => Filter::between(name, parse_scalar(min), parse_scalar(max)),
                None => Filter::equals(name, parse_scalar(rhs)),
            },
        };
        Ok(filter)
    }
}

fn parse_scalar(raw: &str) -> Value {
    match serde_json::from_str::<Value>(raw.trim()) {
        Ok(v @ (Value::Number(_) | Value::Bool(_))) => v,
        _ => Value::String(raw.trim().to_string()),
    }
}
