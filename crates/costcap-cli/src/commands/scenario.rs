use clap::Args;
use rust_decimal::Decimal;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use costcap_core::config::ModelConfig;
use costcap_core::params::economic::EconomicParameters;
use costcap_core::scenario::calculator::{ScenarioCalculator, ScenarioInputs};
use costcap_core::scenario::results::{ResultMatrix, YearResults};

use crate::input;

/// Arguments for a full scenario evaluation
#[derive(Args)]
pub struct EvaluateArgs {
    /// Path to JSON scenario file (economic parameters, policy table,
    /// recovery rules, assets, industries)
    #[arg(long)]
    pub input: Option<String>,

    /// Evaluation year; repeat for several years
    #[arg(long = "year", required = true)]
    pub years: Vec<i32>,

    /// Use the forward-looking tax path instead of static parameters
    #[arg(long)]
    pub forward: bool,

    /// Override an economic parameter, e.g. --set rf=0.03
    #[arg(long = "set", value_parser = parse_override)]
    pub overrides: Vec<(String, Decimal)>,

    /// Directory to write one CSV grid per measure, legal form and year
    #[arg(long)]
    pub out_dir: Option<String>,

    /// Scenario key used in output file names
    #[arg(long, default_value = "baseline")]
    pub key: String,
}

/// Arguments for printing defaults
#[derive(Args)]
pub struct DefaultsArgs {
    /// Include the full asset and industry code lists
    #[arg(long)]
    pub codes: bool,
}

fn parse_override(s: &str) -> Result<(String, Decimal), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{s}'"))?;
    let value: Decimal = value
        .trim()
        .parse()
        .map_err(|e| format!("invalid value for '{}': {e}", key.trim()))?;
    Ok((key.trim().to_string(), value))
}

pub fn run_evaluate(args: EvaluateArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut inputs = input::load::<ScenarioInputs>(args.input.as_deref())?
        .ok_or("--input file (or piped JSON) is required for scenario evaluation")?;

    if !args.overrides.is_empty() {
        let overrides: BTreeMap<String, Decimal> = args.overrides.into_iter().collect();
        inputs.economic.apply_overrides(&overrides)?;
    }
    if args.forward {
        inputs.economic.forward_looking = true;
    }

    let out_dir = match args.out_dir {
        Some(ref dir) => {
            fs::create_dir_all(dir)
                .map_err(|e| format!("Failed to create '{dir}': {e}"))?;
            Some(PathBuf::from(dir))
        }
        None => None,
    };

    let mut calculator = ScenarioCalculator::new(inputs)?;
    let mut results: Vec<Value> = Vec::with_capacity(args.years.len());
    let mut warnings: Vec<String> = Vec::new();

    for year in args.years {
        let output = calculator.evaluate(year)?;
        warnings.extend(output.warnings.iter().map(|w| format!("{year}: {w}")));

        let files = match out_dir {
            Some(ref dir) => write_year(dir, &args.key, calculator.results(year)?)?,
            None => Vec::new(),
        };

        let summary = output.result;
        results.push(json!({
            "year": summary.year,
            "policy_year": summary.policy_year,
            "regime": summary.regime,
            "matrices": summary.matrices,
            "negative_cost_of_capital": summary.negative_cost_of_capital,
            "files": files.len(),
        }));
        log::info!("{}: {} grid(s) written", year, files.len());
    }

    Ok(json!({
        "key": args.key,
        "assumptions": calculator.inputs().economic,
        "results": results,
        "warnings": warnings,
    }))
}

/// Writes every grid of one year as `<measure>_<form>_<key>_<year>.csv`.
fn write_year(
    dir: &Path,
    key: &str,
    year: &YearResults,
) -> Result<Vec<PathBuf>, Box<dyn std::error::Error>> {
    let mut written = Vec::with_capacity(year.matrix_count());
    for (form, measure, matrix) in year.iter() {
        let path = dir.join(format!(
            "{}_{}_{}_{}.csv",
            measure.label(),
            form.label(),
            key,
            year.year
        ));
        write_matrix(&path, matrix)?;
        written.push(path);
    }
    Ok(written)
}

fn write_matrix(path: &Path, matrix: &ResultMatrix) -> Result<(), Box<dyn std::error::Error>> {
    let mut wtr = csv::Writer::from_path(path)
        .map_err(|e| format!("Failed to write '{}': {}", path.display(), e))?;

    let mut header: Vec<&str> = Vec::with_capacity(matrix.columns.len() + 1);
    header.push("asset");
    header.extend(matrix.columns.iter().map(String::as_str));
    wtr.write_record(&header)?;

    for (asset, values) in matrix.iter_rows() {
        let mut record: Vec<String> = Vec::with_capacity(values.len() + 1);
        record.push(asset.to_string());
        record.extend(values.iter().map(|v| v.to_string()));
        wtr.write_record(&record)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn run_defaults(args: DefaultsArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let config = ModelConfig::default();
    let (assets, industries) = config.shape();

    let mut value = json!({
        "economic": EconomicParameters::default(),
        "assets": assets,
        "industries": industries,
    });
    if args.codes {
        value["asset_codes"] = json!(config.asset_codes);
        value["industry_codes"] = json!(config.industry_codes);
    }
    Ok(value)
}
