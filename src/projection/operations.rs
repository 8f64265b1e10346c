//! Annual operating cash-flow engine
//!
//! Every function is a pure mapping of (year, parameters); no function looks at
//! another year's result. Years are 1-based. Money is USD millions.

use crate::parameters::{ProjectParameters, HOURS_PER_YEAR, KWH_PER_MWH, UNITS_PER_MILLION};

/// Compounding exponent for a 1-based year
fn periods(year: u32) -> i32 {
    year.saturating_sub(1) as i32
}

/// Net generation in MWh
pub fn generation(year: u32, params: &ProjectParameters) -> f64 {
    params.nameplate_mw
        * HOURS_PER_YEAR
        * params.capacity_factor
        * (1.0 - params.degradation).powi(periods(year))
}

/// FX rate in LKR per USD
pub fn fx_rate(year: u32, params: &ProjectParameters) -> f64 {
    params.fx_initial * (1.0 + params.fx_depreciation).powi(periods(year))
}

/// Tariff converted to USD/MWh
pub fn tariff_usd_per_mwh(year: u32, params: &ProjectParameters) -> f64 {
    params.tariff_lkr_per_kwh / fx_rate(year, params) * KWH_PER_MWH
}

/// Revenue in USD millions
pub fn revenue(year: u32, params: &ProjectParameters) -> f64 {
    generation(year, params) * tariff_usd_per_mwh(year, params) / UNITS_PER_MILLION
}

/// Social Service Contribution Levy, a flat share of turnover
pub fn levy(year: u32, params: &ProjectParameters) -> f64 {
    revenue(year, params) * params.levy_rate
}

/// USD leg of opex per MWh, escalated at USD inflation
pub fn opex_usd_leg_per_mwh(year: u32, params: &ProjectParameters) -> f64 {
    params.opex_usd_per_mwh
        * params.opex_split_usd
        * (1.0 + params.opex_escalation_usd).powi(periods(year))
}

/// LKR leg of opex per MWh, escalated at LKR inflation and expressed in USD.
///
/// The base rate is quoted in year-1 USD, so the escalated LKR amount is
/// brought back through FX(y)/FX(1).
pub fn opex_lkr_leg_per_mwh(year: u32, params: &ProjectParameters) -> f64 {
    let escalated = params.opex_usd_per_mwh
        * params.opex_split_lkr
        * (1.0 + params.opex_escalation_lkr).powi(periods(year));
    escalated / (fx_rate(year, params) / params.fx_initial)
}

/// Total opex in USD millions
pub fn opex(year: u32, params: &ProjectParameters) -> f64 {
    let per_mwh = opex_usd_leg_per_mwh(year, params) + opex_lkr_leg_per_mwh(year, params);
    generation(year, params) * per_mwh / UNITS_PER_MILLION
}

/// Straight-line depreciation; zero past the economic life
pub fn depreciation(year: u32, params: &ProjectParameters) -> f64 {
    if params.economic_life == 0 || year > params.economic_life {
        0.0
    } else {
        params.total_capex / params.economic_life as f64
    }
}

/// One year's operating results, from revenue down to operating cash flow
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OperatingYear {
    pub year: u32,
    pub generation_mwh: f64,
    pub fx: f64,
    pub tariff_usd_mwh: f64,
    pub revenue: f64,
    pub levy: f64,
    pub opex: f64,
    pub ebitda: f64,
    pub depreciation: f64,
    pub ebit: f64,
    pub tax: f64,
    pub operating_cf: f64,
}

/// EBITDA through operating cash flow for one year.
///
/// Both the debt scheduler and the ledger assembler go through this function.
pub fn operating_cash_flow(year: u32, params: &ProjectParameters) -> OperatingYear {
    let revenue = revenue(year, params);
    let levy = revenue * params.levy_rate;
    let opex = opex(year, params);
    let ebitda = revenue - levy - opex;
    let depreciation = depreciation(year, params);
    let ebit = ebitda - depreciation;
    let tax = (ebit * params.tax_rate).max(0.0);
    let operating_cf = ebit - tax + depreciation;

    OperatingYear {
        year,
        generation_mwh: generation(year, params),
        fx: fx_rate(year, params),
        tariff_usd_mwh: tariff_usd_per_mwh(year, params),
        revenue,
        levy,
        opex,
        ebitda,
        depreciation,
        ebit,
        tax,
        operating_cf,
    }
}
