pub mod csv_out;
pub mod json;
pub mod minimal;
pub mod table;

use serde_json::{Map, Value};
use std::io::{self, Write};

use crate::OutputFormat;

/// Columns of a per-year scenario summary, in print order.
pub const YEAR_COLUMNS: [&str; 6] = [
    "year",
    "policy_year",
    "regime",
    "matrices",
    "negative_cost_of_capital",
    "files",
];

/// Shape of a command's output, as the text formatters see it.
#[derive(Debug, PartialEq)]
pub enum Report<'a> {
    /// A computation envelope: result fields, warnings and methodology
    Envelope {
        fields: Vec<(String, String)>,
        warnings: Vec<&'a str>,
        methodology: Option<&'a str>,
    },
    /// One summary row per evaluated scenario year
    Years {
        key: Option<&'a str>,
        rows: Vec<Vec<String>>,
        warnings: Vec<&'a str>,
    },
    /// Any other object, listed field by field
    Fields(Vec<(String, String)>),
}

impl<'a> Report<'a> {
    pub fn from_value(value: &'a Value) -> Self {
        let Value::Object(map) = value else {
            return Report::Fields(vec![(String::new(), format_value(value))]);
        };
        let warnings = warnings(map);
        if let Some(Value::Object(result)) = map.get("result") {
            return Report::Envelope {
                fields: flatten(result),
                warnings,
                methodology: map.get("methodology").and_then(Value::as_str),
            };
        }
        if let Some(Value::Array(years)) = map.get("results") {
            let rows = years
                .iter()
                .filter_map(Value::as_object)
                .map(|year| {
                    YEAR_COLUMNS
                        .iter()
                        .map(|c| year.get(*c).map(format_value).unwrap_or_default())
                        .collect()
                })
                .collect();
            return Report::Years {
                key: map.get("key").and_then(Value::as_str),
                rows,
                warnings,
            };
        }
        Report::Fields(flatten(map))
    }
}

/// Write a command's output to stdout in the requested format.
pub fn format_output(
    format: &OutputFormat,
    value: &Value,
) -> Result<(), Box<dyn std::error::Error>> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    match format {
        OutputFormat::Json => json::write_json(&mut out, value)?,
        OutputFormat::Table => table::write_table(&mut out, &Report::from_value(value))?,
        OutputFormat::Csv => csv_out::write_csv(&mut out, &Report::from_value(value))?,
        OutputFormat::Minimal => {
            minimal::write_minimal(&mut out, &Report::from_value(value))?
        }
    }
    out.flush()?;
    Ok(())
}

/// Nested objects become dotted keys, e.g. `breakdown.cost_of_capital`.
pub fn flatten(map: &Map<String, Value>) -> Vec<(String, String)> {
    let mut fields = Vec::with_capacity(map.len());
    flatten_into(&mut fields, "", map);
    fields
}

fn flatten_into(fields: &mut Vec<(String, String)>, prefix: &str, map: &Map<String, Value>) {
    for (key, value) in map {
        let name = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        match value {
            Value::Object(inner) => flatten_into(fields, &name, inner),
            _ => fields.push((name, format_value(value))),
        }
    }
}

fn warnings(map: &Map<String, Value>) -> Vec<&str> {
    map.get("warnings")
        .and_then(Value::as_array)
        .map(|w| w.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default()
}

/// Decimals arrive as strings; absent optional measures as null.
pub fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        Value::Array(items) => items.iter().map(format_value).collect::<Vec<_>>().join(";"),
        Value::Object(_) => value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_envelope_flattens_nested_breakdown() {
        let value = json!({
            "result": {
                "breakdown": {"cost_of_capital": "0.051", "regime": "static"},
                "metr": "0.22",
                "eatr_domestic": null
            },
            "methodology": "METR",
            "warnings": ["Negative METR"]
        });
        match Report::from_value(&value) {
            Report::Envelope {
                fields,
                warnings,
                methodology,
            } => {
                assert_eq!(fields[0], ("breakdown.cost_of_capital".into(), "0.051".into()));
                assert!(fields.contains(&("eatr_domestic".into(), String::new())));
                assert_eq!(warnings, vec!["Negative METR"]);
                assert_eq!(methodology, Some("METR"));
            }
            other => panic!("Expected Envelope, got {other:?}"),
        }
    }

    #[test]
    fn test_scenario_years_follow_fixed_columns() {
        let value = json!({
            "key": "baseline",
            "results": [{
                "files": 18, "year": 2026, "regime": "forward_looking",
                "policy_year": 2026, "matrices": 18, "negative_cost_of_capital": 0
            }],
            "warnings": []
        });
        let Report::Years { key, rows, warnings } = Report::from_value(&value) else {
            panic!("Expected Years");
        };
        assert_eq!(key, Some("baseline"));
        assert_eq!(rows, vec![vec!["2026", "2026", "forward_looking", "18", "0", "18"]]);
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_code_lists_join_with_semicolons() {
        let value = json!({"asset_codes": ["EP1A", "SB31"], "assets": 92});
        assert_eq!(
            Report::from_value(&value),
            Report::Fields(vec![
                ("asset_codes".into(), "EP1A;SB31".into()),
                ("assets".into(), "92".into()),
            ])
        );
    }
}
