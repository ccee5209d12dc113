use serde_json::{Map, Value};
use std::io;

/// Record lists written as CSV in preference to the headline fields.
const RECORD_KEYS: [&str; 4] = ["years", "projects", "rows", "findings"];

/// Write output as CSV to stdout.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    match value {
        Value::Object(map) => match map.get("result") {
            Some(Value::Object(result)) => write_result_csv(&mut wtr, result),
            _ => write_field_value(&mut wtr, map),
        },
        Value::Array(arr) => write_array_csv(&mut wtr, arr),
        _ => {
            let _ = wtr.write_record([&format_csv_value(value)]);
        }
    }

    let _ = wtr.flush();
}

fn write_result_csv(wtr: &mut csv::Writer<io::StdoutLock<'_>>, result: &Map<String, Value>) {
    if let Some(Value::Array(matrix)) = result.get("matrix") {
        write_matrix_csv(wtr, result, matrix);
        return;
    }
    for key in RECORD_KEYS {
        if let Some(Value::Array(records)) = result.get(key) {
            write_array_csv(wtr, records);
            return;
        }
    }
    write_field_value(wtr, result);
}

fn write_field_value(wtr: &mut csv::Writer<io::StdoutLock<'_>>, map: &Map<String, Value>) {
    let _ = wtr.write_record(["field", "value"]);
    for (key, val) in map {
        let _ = wtr.write_record([key.as_str(), &format_csv_value(val)]);
    }
}

fn write_matrix_csv(wtr: &mut csv::Writer<io::StdoutLock<'_>>, grid: &Map<String, Value>, matrix: &[Value]) {
    let empty = Vec::new();
    let rows = grid.get("variable_1_values").and_then(Value::as_array).unwrap_or(&empty);
    let cols = grid.get("variable_2_values").and_then(Value::as_array).unwrap_or(&empty);

    let mut header = vec![grid.get("variable_1_name").map(format_csv_value).unwrap_or_default()];
    header.extend(cols.iter().map(format_csv_value));
    let _ = wtr.write_record(&header);

    for (label, row) in rows.iter().zip(matrix) {
        let mut record = vec![format_csv_value(label)];
        if let Value::Array(cells) = row {
            record.extend(cells.iter().map(format_csv_value));
        }
        let _ = wtr.write_record(&record);
    }
}

fn write_array_csv(wtr: &mut csv::Writer<io::StdoutLock<'_>>, arr: &[Value]) {
    if arr.is_empty() {
        return;
    }

    if let Some(Value::Object(first)) = arr.first() {
        let headers: Vec<&str> = first.keys().map(|k| k.as_str()).collect();
        let _ = wtr.write_record(&headers);

        for item in arr {
            if let Value::Object(map) = item {
                let row: Vec<String> = headers
                    .iter()
                    .map(|h| map.get(*h).map(format_csv_value).unwrap_or_default())
                    .collect();
                let _ = wtr.write_record(&row);
            }
        }
    } else {
        for item in arr {
            let _ = wtr.write_record([&format_csv_value(item)]);
        }
    }
}

fn format_csv_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
