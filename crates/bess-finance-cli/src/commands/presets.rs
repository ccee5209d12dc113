use serde_json::Value;

use bess_finance_core::scenarios::ScenarioPreset;

/// One row per preset with the values it writes over an assumption set.
pub fn run_presets() -> Result<Value, Box<dyn std::error::Error>> {
    let mut rows = Vec::with_capacity(ScenarioPreset::ALL.len());
    for preset in ScenarioPreset::ALL {
        let mut row = serde_json::Map::new();
        row.insert("preset".into(), Value::String(preset.name().to_string()));
        if let Value::Object(values) = serde_json::to_value(preset.values())? {
            row.extend(values);
        }
        rows.push(Value::Object(row));
    }
    Ok(Value::Array(rows))
}
