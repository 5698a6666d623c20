//! Compact string grammar used on the remote search API:
//! `field<op><value>[;value...][,field<op><value>...]`.

use serde_json::Value;

use super::Predicate;

pub fn to_wire(predicates: &[Predicate]) -> String {
    predicates
        .iter()
        .map(|p| format!("{}{}{}", p.field, p.operator.symbol(), render_value(&p.value)))
        .collect::<Vec<_>>()
        .join(",")
}

fn render_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Array(items) => items.iter().map(render_value).collect::<Vec<_>>().join(";"),
        other => other.to_string(),
    }
}
