use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

/// Format output as tables: headline fields first, then one table per list
/// of records (years, rows, projects, findings) and the sensitivity matrix.
pub fn print_table(value: &Value) {
    match value {
        Value::Object(map) => {
            if let Some(result) = map.get("result") {
                print_result_table(result, map);
            } else {
                print_flat_object(map);
            }
        }
        Value::Array(arr) => print_array_table(arr),
        _ => println!("{}", value),
    }
}

fn print_result_table(result: &Value, envelope: &Map<String, Value>) {
    let Value::Object(res_map) = result else {
        print_flat_object(envelope);
        return;
    };

    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    let mut sections: Vec<(&str, &[Value])> = Vec::new();
    for (key, val) in res_map {
        match val {
            Value::Array(items) if items.first().is_some_and(Value::is_object) => {
                sections.push((key.as_str(), items.as_slice()));
            }
            Value::Array(_) if is_grid_field(key) => {}
            _ => builder.push_record([key.as_str(), &format_value(val)]),
        }
    }
    println!("{}", Table::from(builder));

    for (name, items) in sections {
        println!("\n{}:", name);
        print_array_table(items);
    }
    if res_map.contains_key("matrix") {
        println!();
        print_matrix(res_map);
    }

    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
            for w in warnings {
                if let Value::String(s) = w {
                    println!("  - {}", s);
                }
            }
        }
    }

    if let Some(Value::String(meth)) = envelope.get("methodology") {
        println!("\nMethodology: {}", meth);
    }
}

fn is_grid_field(key: &str) -> bool {
    matches!(key, "matrix" | "variable_1_values" | "variable_2_values")
}

/// Row header = variable 1 value, column header = variable 2 value.
fn print_matrix(grid: &Map<String, Value>) {
    let empty = Vec::new();
    let rows = grid.get("variable_1_values").and_then(Value::as_array).unwrap_or(&empty);
    let cols = grid.get("variable_2_values").and_then(Value::as_array).unwrap_or(&empty);
    let matrix = grid.get("matrix").and_then(Value::as_array).unwrap_or(&empty);
    let corner = format!(
        "{} \\ {}",
        grid.get("variable_1_name").map(format_value).unwrap_or_default(),
        grid.get("variable_2_name").map(format_value).unwrap_or_default()
    );

    let mut builder = Builder::default();
    let mut header = vec![corner];
    header.extend(cols.iter().map(format_value));
    builder.push_record(header);

    for (label, row) in rows.iter().zip(matrix) {
        let mut record = vec![format_value(label)];
        if let Value::Array(cells) = row {
            record.extend(cells.iter().map(format_value));
        }
        builder.push_record(record);
    }
    println!("{}", Table::from(builder));
}

fn print_flat_object(map: &Map<String, Value>) {
    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    for (key, val) in map {
        builder.push_record([key.as_str(), &format_value(val)]);
    }
    println!("{}", Table::from(builder));
}

fn print_array_table(arr: &[Value]) {
    if arr.is_empty() {
        println!("(empty)");
        return;
    }

    if let Some(Value::Object(first)) = arr.first() {
        let headers: Vec<String> = first.keys().cloned().collect();
        let mut builder = Builder::default();
        builder.push_record(&headers);

        for item in arr {
            if let Value::Object(map) = item {
                let row: Vec<String> = headers
                    .iter()
                    .map(|h| map.get(h.as_str()).map(format_value).unwrap_or_default())
                    .collect();
                builder.push_record(row);
            }
        }

        println!("{}", Table::from(builder));
    } else {
        for item in arr {
            println!("{}", format_value(item));
        }
    }
}

fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "-".to_string(),
        Value::Array(arr) => {
            let items: Vec<String> = arr.iter().map(format_value).collect();
            if arr.iter().any(Value::is_object) {
                items.join("; ")
            } else {
                items.join(", ")
            }
        }
        Value::Object(map) => map
            .iter()
            .map(|(k, v)| format!("{}={}", k, format_value(v)))
            .collect::<Vec<_>>()
            .join(" "),
    }
}
