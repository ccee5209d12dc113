pub mod csv_out;
pub mod json;
pub mod minimal;
pub mod table;

use crate::OutputFormat;
use serde_json::Value;

/// Dispatch output to the appropriate formatter.
///
/// CSV and minimal output carry no room for the envelope's warnings, so
/// those go to stderr through the log instead.
pub fn format_output(format: &OutputFormat, value: &Value) {
    match format {
        OutputFormat::Json => json::print_json(value),
        OutputFormat::Table => table::print_table(value),
        OutputFormat::Csv => {
            log_warnings(value);
            csv_out::print_csv(value)
        }
        OutputFormat::Minimal => {
            log_warnings(value);
            minimal::print_minimal(value)
        }
    }
}

fn log_warnings(value: &Value) {
    let Some(Value::Array(warnings)) = value.get("warnings") else {
        return;
    };
    for w in warnings.iter().filter_map(Value::as_str) {
        tracing::warn!("{}", w);
    }
}
