use serde_json::Value;

/// Fields worth printing on their own, most important first.
const PRIORITY_KEYS: [&str; 6] = [
    "profit",
    "roi",
    "financing_cost",
    "total_accrued",
    "cumulative_cash_flow",
    "total_debt",
];

/// Print just the key figure of the output.
///
/// Lists of rows print one labelled line per row (scenario name, milestone,
/// or month).
pub fn print_minimal(value: &Value) {
    let result = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    match result {
        Value::Array(rows) => print_labelled(rows),
        Value::Object(map) => {
            if let Some(val) = first_priority(result) {
                println!("{}", format_minimal(val));
                return;
            }
            if let Some(Value::Array(rows)) = map.get("rows") {
                print_labelled(rows);
                return;
            }
            if let Some((key, val)) = map.iter().next() {
                println!("{key}: {}", format_minimal(val));
            }
        }
        other => println!("{}", format_minimal(other)),
    }
}

fn print_labelled(rows: &[Value]) {
    for row in rows {
        let label = ["scenario", "milestone", "month"]
            .iter()
            .find_map(|k| row.get(*k))
            .map(format_minimal)
            .unwrap_or_default();
        let figure = first_priority(row).map(format_minimal).unwrap_or_default();
        println!("{label}: {figure}");
    }
}

fn first_priority(value: &Value) -> Option<&Value> {
    PRIORITY_KEYS
        .iter()
        .filter_map(|k| value.get(*k))
        .find(|v| !v.is_null())
}

fn format_minimal(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
