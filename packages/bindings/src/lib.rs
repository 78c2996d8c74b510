use napi::Result as NapiResult;
use napi_derive::napi;

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

// ---------------------------------------------------------------------------
// Single investment
// ---------------------------------------------------------------------------

#[napi]
pub fn cost_of_capital(input_json: String) -> NapiResult<String> {
    let input: costcap_core::coc::CocInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = costcap_core::coc::calculate_cost_of_capital(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn effective_tax_rates(input_json: String) -> NapiResult<String> {
    let input: costcap_core::etr::rates::EffectiveRatesInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output =
        costcap_core::etr::rates::calculate_effective_tax_rates(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Scenario grid
// ---------------------------------------------------------------------------

/// Evaluates one year of a scenario and returns the summary envelope
/// together with every asset-by-industry matrix.
#[napi]
pub fn evaluate_scenario(input_json: String, year: i32) -> NapiResult<String> {
    let input: costcap_core::scenario::calculator::ScenarioInputs =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let mut calculator =
        costcap_core::scenario::calculator::ScenarioCalculator::new(input).map_err(to_napi_error)?;
    let summary = calculator.evaluate(year).map_err(to_napi_error)?;
    let matrices = calculator.results(year).map_err(to_napi_error)?;
    let output = serde_json::json!({
        "summary": summary,
        "results": matrices,
    });
    serde_json::to_string(&output).map_err(to_napi_error)
}
