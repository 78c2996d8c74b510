//! Scenario calculator: owns a snapshot of all inputs and evaluates the
//! (asset x industry) grid for each legal form, one year at a time.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Instant;

use crate::coc::{cost_of_capital_with_schedule, deduction_schedule, CocInput, TaxSchedule};
use crate::config::ModelConfig;
use crate::error::CostCapError;
use crate::etr::average::{eatr_domestic, eatr_foreign, foreign_cost_of_capital};
use crate::etr::marginal::{metr, mettr};
use crate::etr::saver::{saver_return_corporate, saver_return_noncorporate};
use crate::params::assets::{property_tax_addon, AssetType};
use crate::params::economic::EconomicParameters;
use crate::params::industries::Industry;
use crate::params::policy::{PolicyField, PolicyTable, PolicyYear};
use crate::params::recovery_rules::{RecoveryRules, RuleSet};
use crate::scenario::results::{Measure, ResultMatrix, YearResults};
use crate::types::{
    with_metadata, ComputationOutput, LegalForm, Rate, Regime, FORWARD_PERIODS,
};
use crate::CostCapResult;

// ---------------------------------------------------------------------------
// Inputs / outputs
// ---------------------------------------------------------------------------

/// Everything a scenario needs; the calculator keeps its own copy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioInputs {
    #[serde(default)]
    pub economic: EconomicParameters,
    pub policy: PolicyTable,
    pub recovery_rules: RecoveryRules,
    pub assets: Vec<AssetType>,
    pub industries: Vec<Industry>,
    #[serde(default)]
    pub config: ModelConfig,
}

/// What one call to [`ScenarioCalculator::evaluate`] produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationSummary {
    pub year: i32,
    /// Policy year whose parameters were used (clamped to the table horizon)
    pub policy_year: i32,
    pub regime: Regime,
    pub assets: usize,
    pub industries: usize,
    pub matrices: usize,
    /// Cells (any form) where the cost of capital is negative
    pub negative_cost_of_capital: usize,
}

/// Lifecycle: starts unevaluated; after the first successful evaluation it
/// holds a year-keyed map of results that only grows or has years replaced.
#[derive(Debug, Clone)]
pub struct ScenarioCalculator {
    inputs: ScenarioInputs,
    /// Assets and industries in configured grid order
    assets: Vec<AssetType>,
    industries: Vec<Industry>,
    results: BTreeMap<i32, YearResults>,
    evaluated: bool,
}

/// Statutory parameters of the year being evaluated, in the shape the regime
/// needs: the policy row held constant, or forward paths for every form.
enum YearTaxes<'a> {
    Static {
        row: &'a PolicyYear,
    },
    ForwardLooking {
        /// Tax-rate and interest-deductibility paths by legal form
        paths: BTreeMap<LegalForm, (Vec<Rate>, Vec<Rate>)>,
        subsidy: Vec<Rate>,
    },
}

impl YearTaxes<'_> {
    fn regime(&self) -> Regime {
        match self {
            YearTaxes::Static { .. } => Regime::Static,
            YearTaxes::ForwardLooking { .. } => Regime::ForwardLooking,
        }
    }

    /// Tax schedule of one legal form, with the asset's property tax add-on
    /// given as a function of the state/local subsidy.
    fn schedule(
        &self,
        form: LegalForm,
        addon: impl Fn(Rate) -> Rate,
    ) -> CostCapResult<TaxSchedule> {
        match self {
            YearTaxes::Static { row } => Ok(TaxSchedule::Constant {
                tax_rate: row.tax_rate(form),
                interest_deductible: row.interest_deductible(form),
                property_tax: addon(row.state_local_subsidy),
            }),
            YearTaxes::ForwardLooking { paths, subsidy } => {
                let (tax_rates, interest_deductible) = paths.get(&form).ok_or_else(|| {
                    CostCapError::InsufficientData(format!("no tax path for {form}"))
                })?;
                let property_tax: Vec<Rate> = subsidy.iter().map(|s| addon(*s)).collect();
                Ok(TaxSchedule::Path {
                    tax_rates: tax_rates.clone(),
                    interest_deductible: interest_deductible.clone(),
                    property_tax: if property_tax.iter().all(Decimal::is_zero) {
                        Vec::new()
                    } else {
                        property_tax
                    },
                })
            }
        }
    }
}

/// Matrices under construction for one legal form.
struct FormGrid {
    form: LegalForm,
    matrices: BTreeMap<Measure, ResultMatrix>,
}

impl ScenarioCalculator {
    /// Validate and take ownership of the scenario inputs.
    pub fn new(inputs: ScenarioInputs) -> CostCapResult<Self> {
        inputs.economic.validate()?;
        inputs.config.validate()?;
        inputs.recovery_rules.validate_against(&inputs.policy)?;

        let asset_index: BTreeMap<&str, &AssetType> =
            inputs.assets.iter().map(|a| (a.code.as_str(), a)).collect();
        let industry_index: BTreeMap<&str, &Industry> =
            inputs.industries.iter().map(|i| (i.code.as_str(), i)).collect();

        let assets = inputs
            .config
            .asset_codes
            .iter()
            .map(|code| -> CostCapResult<AssetType> {
                let asset = asset_index.get(code.as_str()).ok_or_else(|| {
                    CostCapError::InsufficientData(format!("no asset parameters for {code}"))
                })?;
                asset.validate()?;
                Ok((*asset).clone())
            })
            .collect::<CostCapResult<Vec<_>>>()?;
        let industries = inputs
            .config
            .industry_codes
            .iter()
            .map(|code| -> CostCapResult<Industry> {
                let industry = industry_index.get(code.as_str()).ok_or_else(|| {
                    CostCapError::InsufficientData(format!("no industry parameters for {code}"))
                })?;
                industry.validate()?;
                Ok((*industry).clone())
            })
            .collect::<CostCapResult<Vec<_>>>()?;

        for sheet in inputs.recovery_rules.sheets.values() {
            sheet.covers(&inputs.config.asset_codes)?;
        }

        Ok(Self {
            inputs,
            assets,
            industries,
            results: BTreeMap::new(),
            evaluated: false,
        })
    }

    pub fn inputs(&self) -> &ScenarioInputs {
        &self.inputs
    }

    /// True once any year has been evaluated successfully.
    pub fn is_evaluated(&self) -> bool {
        self.evaluated
    }

    pub fn evaluated_years(&self) -> impl Iterator<Item = i32> + '_ {
        self.results.keys().copied()
    }

    pub fn results(&self, year: i32) -> CostCapResult<&YearResults> {
        if !self.evaluated {
            return Err(CostCapError::NotEvaluated(
                "no year has been evaluated for this scenario".into(),
            ));
        }
        self.results
            .get(&year)
            .ok_or_else(|| {
                CostCapError::NotEvaluated(format!("year {year} has not been evaluated"))
            })
    }

    pub fn matrix(
        &self,
        year: i32,
        form: LegalForm,
        measure: Measure,
    ) -> CostCapResult<&ResultMatrix> {
        self.results(year)?.get(form, measure)
    }

    /// Evaluate every cell for `year` and store the results. On failure the
    /// stored results are left as they were.
    pub fn evaluate(&mut self, year: i32) -> CostCapResult<ComputationOutput<EvaluationSummary>> {
        let start = Instant::now();
        let mut warnings: Vec<String> = Vec::new();

        let policy = &self.inputs.policy;
        let row = policy.row(year)?;
        let policy_year = year.min(policy.horizon());
        if policy_year != year {
            log::debug!("year {year} is past the policy horizon; using {policy_year} parameters");
            warnings.push(format!(
                "Year {year} is past the policy horizon; \
                 {policy_year} parameters and rules are used"
            ));
        }
        let rules = self.inputs.recovery_rules.for_year(policy, year)?;
        let foreign_rules = self.inputs.recovery_rules.foreign()?;
        let regime = self.inputs.economic.regime();

        log::info!(
            "evaluating {year} ({regime:?}, {} assets x {} industries, rules '{}')",
            self.assets.len(),
            self.industries.len(),
            row.recovery_sheet
        );

        let taxes = self.year_taxes(row, year, regime)?;

        let rows = &self.inputs.config.asset_codes;
        let columns = &self.inputs.config.industry_codes;
        let mut grids: Vec<FormGrid> = LegalForm::ALL
            .iter()
            .map(|&form| FormGrid {
                form,
                matrices: Measure::ALL
                    .iter()
                    .filter(|m| m.applies_to(form))
                    .map(|&m| (m, ResultMatrix::zeros(rows, columns)))
                    .collect(),
            })
            .collect();

        let mut negative = 0usize;
        for (i, asset) in self.assets.iter().enumerate() {
            for (j, industry) in self.industries.iter().enumerate() {
                let cell = CellContext {
                    economic: &self.inputs.economic,
                    row,
                    taxes: &taxes,
                    rules,
                    foreign_rules,
                    asset,
                    industry,
                };
                negative += cell.evaluate(&mut grids, i, j).map_err(|e| {
                    log::warn!("{year}: cell {}/{} failed: {e}", asset.code, industry.code);
                    e
                })?;
            }
        }

        if negative > 0 {
            warnings.push(format!("{negative} cells have a negative cost of capital"));
        }

        let mut bundle = YearResults::new(year, regime);
        for grid in grids {
            for (measure, matrix) in grid.matrices {
                bundle.insert(grid.form, measure, matrix);
            }
        }
        let summary = EvaluationSummary {
            year,
            policy_year,
            regime,
            assets: self.assets.len(),
            industries: self.industries.len(),
            matrices: bundle.matrix_count(),
            negative_cost_of_capital: negative,
        };

        if self.results.insert(year, bundle).is_some() {
            log::info!("replaced previously stored results for {year}");
        }
        self.evaluated = true;

        let elapsed = start.elapsed().as_micros() as u64;
        log::info!("evaluated {year} in {elapsed} us");

        let methodology = match regime {
            Regime::Static => {
                "Cost of capital and effective tax rates by asset, industry and legal form; \
                 current-year parameters held constant"
            }
            Regime::ForwardLooking => {
                "Cost of capital and effective tax rates by asset, industry and legal form; \
                 50-period forward-looking tax paths"
            }
        };
        Ok(with_metadata(
            methodology,
            &self.inputs.economic,
            warnings,
            elapsed,
            summary,
        ))
    }

    fn year_taxes<'a>(
        &self,
        row: &'a PolicyYear,
        year: i32,
        regime: Regime,
    ) -> CostCapResult<YearTaxes<'a>> {
        match regime {
            Regime::Static => Ok(YearTaxes::Static { row }),
            Regime::ForwardLooking => {
                let policy = &self.inputs.policy;
                let mut paths = BTreeMap::new();
                for form in LegalForm::ALL {
                    let tax_rates = policy.path(PolicyField::TaxRate(form), year, FORWARD_PERIODS)?;
                    let interest =
                        policy.path(PolicyField::InterestDeductible(form), year, FORWARD_PERIODS)?;
                    paths.insert(form, (tax_rates, interest));
                }
                let subsidy = policy.path(PolicyField::StateLocalSubsidy, year, FORWARD_PERIODS)?;
                Ok(YearTaxes::ForwardLooking { paths, subsidy })
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Per-cell evaluation
// ---------------------------------------------------------------------------

struct CellContext<'a> {
    economic: &'a EconomicParameters,
    row: &'a PolicyYear,
    taxes: &'a YearTaxes<'a>,
    rules: &'a RuleSet,
    foreign_rules: &'a RuleSet,
    asset: &'a AssetType,
    industry: &'a Industry,
}

impl CellContext<'_> {
    /// Fill cell (i, j) of every form's matrices. Returns how many forms have
    /// a negative cost of capital.
    fn evaluate(&self, grids: &mut [FormGrid], i: usize, j: usize) -> CostCapResult<usize> {
        let econ = self.economic;
        let rd = econ.cost_of_debt();
        let re = econ.cost_of_equity();
        let pi = econ.inflation;
        let rule = self.rules.get(&self.asset.code)?;
        let tangible = self.asset.is_tangible();
        let addon = |subsidy: Rate| {
            property_tax_addon(
                &self.asset.code,
                econ.property_tax_rate,
                subsidy,
                econ.include_state_local,
            )
        };

        // Schedules and saver returns depend only on corporate vs pass-through.
        let mut schedules: BTreeMap<bool, Vec<Decimal>> = BTreeMap::new();
        let mut saver: BTreeMap<bool, Rate> = BTreeMap::new();
        let mut negative = 0;

        for grid in grids.iter_mut() {
            let form = grid.form;
            let corporate = form.is_corporate();
            let debt_share = self.industry.debt_share(form);
            let input = CocInput {
                discount_rate: CocInput::blended_rate(rd, re, debt_share),
                inflation: pi,
                cost_of_debt: rd,
                depreciation_rate: self.asset.economic_depreciation,
                debt_share,
                recovery: rule.terms(self.asset.section_179(form)),
                taxes: self.taxes.schedule(form, &addon)?,
            };

            let schedule = match self.taxes.regime() {
                Regime::ForwardLooking => {
                    if !schedules.contains_key(&corporate) {
                        schedules.insert(corporate, deduction_schedule(&input, FORWARD_PERIODS)?);
                    }
                    schedules.get(&corporate).map(Vec::as_slice)
                }
                Regime::Static => None,
            };
            let breakdown = cost_of_capital_with_schedule(&input, schedule)?;
            let rho = breakdown.cost_of_capital;
            if rho < Decimal::ZERO {
                negative += 1;
            }

            let s = match saver.get(&corporate) {
                Some(s) => *s,
                None => {
                    let shares = &econ.investor_shares;
                    let s = if corporate {
                        let rates = self.row.investor_rates();
                        saver_return_corporate(rd, re, pi, debt_share, shares, &rates)?
                    } else {
                        let interest_tax = self.row.tax_rate_interest;
                        saver_return_noncorporate(rd, re, pi, debt_share, shares, interest_tax)?
                    };
                    saver.insert(corporate, s);
                    s
                }
            };

            let mut put = |measure: Measure, value: Rate| {
                if let Some(m) = grid.matrices.get_mut(&measure) {
                    m.set(i, j, value);
                }
            };
            put(Measure::CostOfCapital, rho);
            put(Measure::UserCostOfCapital, breakdown.user_cost_of_capital);
            put(Measure::Metr, metr(rho, input.discount_rate, pi)?);
            put(Measure::Mettr, mettr(rho, s)?);

            if corporate {
                let r = input.discount_rate;
                let tau = breakdown.effective_tax_rate;
                let intl = self.row.international(self.industry.foreign_tax_rate);
                let p = econ.profitability;
                let domestic = eatr_domestic(rho, r, pi, p, tau, intl.fdii_exclusion, tangible)?;

                let foreign_terms = self.foreign_rules.get(&self.asset.code)?.terms(Decimal::ZERO);
                let rho_f = foreign_cost_of_capital(&input, &foreign_terms, intl.foreign_tax_rate)?;
                let foreign = eatr_foreign(
                    rho_f,
                    r,
                    pi,
                    p,
                    intl.foreign_tax_rate,
                    tau,
                    intl.gilti_exclusion,
                    tangible,
                )?;
                put(Measure::EatrDomestic, domestic);
                put(Measure::EatrForeign, foreign);
            }
        }
        Ok(negative)
    }
}
