//! UI-facing filters and their translation into index-engine predicates.

mod parse;
pub mod wire;

pub use parse::FilterParseError;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A declarative constraint as the UI describes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    pub name: String,
    pub value: FilterValue,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum FilterValue {
    /// No value selected. Means "no constraint", never "must be null".
    Null,
    Equals(Value),
    Membership(Vec<Value>),
    Range(RangeValue),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RangeValue {
    #[serde(default)]
    pub min: Value,
    #[serde(default)]
    pub max: Value,
    /// When set, the field must be absent and `min`/`max` are ignored.
    #[serde(default)]
    pub exclude: bool,
}

impl Filter {
    pub fn equals(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            value: FilterValue::Equals(value.into()),
        }
    }

    pub fn one_of(name: impl Into<String>, values: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            value: FilterValue::Membership(values),
        }
    }

    pub fn between(name: impl Into<String>, min: impl Into<Value>, max: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            value: FilterValue::Range(RangeValue {
                min: min.into(),
                max: max.into(),
                exclude: false,
            }),
        }
    }

    pub fn excluded(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: FilterValue::Range(RangeValue {
                min: Value::Null,
                max: Value::Null,
                exclude: true,
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operator {
    #[serde(rename = "=")]
    Eq,
    #[serde(rename = "|=")]
    AnyOf,
    #[serde(rename = ">=")]
    Gte,
    #[serde(rename = "<=")]
    Lte,
    /// Field must not be set.
    #[serde(rename = "!!")]
    NotExists,
}

impl Operator {
    pub fn symbol(self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::AnyOf => "|=",
            Operator::Gte => ">=",
            Operator::Lte => "<=",
            Operator::NotExists => "!!",
        }
    }
}

/// A normalized predicate understood by the index engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Predicate {
    pub field: String,
    pub operator: Operator,
    pub value: Value,
}

impl Predicate {
    pub fn new(field: impl Into<String>, operator: Operator, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            operator,
            value: value.into(),
        }
    }
}

/// Compiles UI filters into predicates. Total and side-effect free.
pub fn translate(filters: &[Filter]) -> Vec<Predicate> {
    filters.iter().flat_map(translate_one).collect()
}

fn translate_one(filter: &Filter) -> Vec<Predicate> {
    let field = filter.name.as_str();
    match &filter.value {
        FilterValue::Null => vec![],
        FilterValue::Range(range) if range.exclude => {
            vec![Predicate::new(field, Operator::NotExists, "")]
        }
        FilterValue::Range(range) => vec![
            Predicate::new(field, Operator::Gte, range.min.clone()),
            Predicate::new(field, Operator::Lte, range.max.clone()),
        ],
        FilterValue::Membership(values) => {
            let kept: Vec<Value> = values.iter().filter(|v| is_truthy(v)).cloned().collect();
            if kept.is_empty() {
                vec![]
            } else {
                vec![Predicate::new(field, Operator::AnyOf, Value::Array(kept))]
            }
        }
        FilterValue::Equals(value) => vec![Predicate::new(field, Operator::Eq, value.clone())],
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn equals_yields_single_predicate() {
        let preds = translate(&[Filter::equals("level", 50)]);
        assert_eq!(preds, vec![Predicate::new("level", Operator::Eq, 50)]);
    }

    #[test]
    fn null_filters_are_dropped() {
        let filters = vec![
            Filter {
                name: "job".into(),
                value: FilterValue::Null,
            },
            Filter::equals("rarity", 1),
        ];
        let preds = translate(&filters);
        assert_eq!(preds.len(), 1);
        assert_eq!(preds[0].field, "rarity");
    }

    #[test]
    fn bounded_range_yields_two_predicates() {
        let preds = translate(&[Filter::between("itemLevel", 10, 20)]);
        assert_eq!(
            preds,
            vec![
                Predicate::new("itemLevel", Operator::Gte, 10),
                Predicate::new("itemLevel", Operator::Lte, 20),
            ]
        );
    }

    #[test]
    fn excluded_range_ignores_bounds() {
        let filter = Filter {
            name: "patch".into(),
            value: FilterValue::Range(RangeValue {
                min: json!(1),
                max: json!(99),
                exclude: true,
            }),
        };
        let preds = translate(&[filter]);
        assert_eq!(preds, vec![Predicate::new("patch", Operator::NotExists, "")]);
    }

    #[test]
    fn membership_drops_falsy_entries() {
        let filter = Filter::one_of("job", vec![json!(8), json!(0), json!(null), json!(""), json!(9)]);
        let preds = translate(&[filter]);
        assert_eq!(
            preds,
            vec![Predicate::new("job", Operator::AnyOf, json!([8, 9]))]
        );
    }

    #[test]
    fn empty_membership_is_unconstrained() {
        let filters = vec![
            Filter::one_of("job", vec![]),
            Filter::one_of("slot", vec![json!(false), json!(0)]),
        ];
        assert!(translate(&filters).is_empty());
    }

    #[test]
    fn filter_deserializes_from_tagged_json() {
        let filter: Filter = serde_json::from_value(json!({
            "name": "ilvl",
            "value": {"kind": "range", "value": {"min": 1, "max": 5}}
        }))
        .unwrap();
        assert_eq!(filter, Filter::between("ilvl", 1, 5));

        let null: Filter =
            serde_json::from_value(json!({"name": "ilvl", "value": {"kind": "null"}})).unwrap();
        assert_eq!(null.value, FilterValue::Null);
    }

    #[test]
    fn predicate_serializes_operator_symbol() {
        let json = serde_json::to_value(Predicate::new("craftable", Operator::Eq, true)).unwrap();
        assert_eq!(
            json,
            json!({"field": "craftable", "operator": "=", "value": true})
        );
    }
}
