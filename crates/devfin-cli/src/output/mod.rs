pub mod csv_out;
pub mod minimal;
pub mod table;

use crate::OutputFormat;
use serde_json::{Map, Value};

/// Dispatch output to the appropriate formatter.
pub fn format_output(format: &OutputFormat, value: &Value) {
    match format {
        OutputFormat::Json => match serde_json::to_string_pretty(value) {
            Ok(s) => println!("{s}"),
            Err(e) => eprintln!("JSON serialization error: {e}"),
        },
        OutputFormat::Table => table::print_table(&flatten_for_display(value)),
        OutputFormat::Csv => csv_out::print_csv(&flatten_for_display(value)),
        OutputFormat::Minimal => minimal::print_minimal(value),
    }
}

/// Collapse nested objects (per-class amounts) into dotted keys so each
/// ends up in its own column. Arrays are kept, their objects flattened.
fn flatten_for_display(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut out = Map::new();
            for (key, val) in map {
                match val {
                    Value::Object(inner) if key == "result" => {
                        out.insert(
                            key.clone(),
                            flatten_for_display(&Value::Object(inner.clone())),
                        );
                    }
                    Value::Object(inner) if key != "assumptions" && key != "metadata" => {
                        flatten_into(key, inner, &mut out);
                    }
                    Value::Array(items) => {
                        out.insert(
                            key.clone(),
                            Value::Array(items.iter().map(flatten_for_display).collect()),
                        );
                    }
                    other => {
                        out.insert(key.clone(), other.clone());
                    }
                }
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(items.iter().map(flatten_for_display).collect()),
        other => other.clone(),
    }
}

fn flatten_into(prefix: &str, map: &Map<String, Value>, out: &mut Map<String, Value>) {
    for (key, val) in map {
        let name = format!("{prefix}.{key}");
        match val {
            Value::Object(inner) => flatten_into(&name, inner, out),
            other => {
                out.insert(name, other.clone());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_nested_amounts_become_columns() {
        let value = json!({
            "result": [{"month": 1, "debt": {"bank": "10", "investor": "2"}}],
            "warnings": []
        });
        let flat = flatten_for_display(&value);
        assert_eq!(
            flat["result"][0],
            json!({"month": 1, "debt.bank": "10", "debt.investor": "2"})
        );
    }

    #[test]
    fn test_envelope_objects_kept() {
        let value = json!({
            "result": {"profit": "5", "financing_breakdown": {"bank": "1"}},
            "metadata": {"version": "0.1.0"}
        });
        let flat = flatten_for_display(&value);
        assert_eq!(flat["result"]["financing_breakdown.bank"], json!("1"));
        assert_eq!(flat["metadata"]["version"], json!("0.1.0"));
    }
}
