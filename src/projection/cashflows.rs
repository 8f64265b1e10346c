//! Ledger output structures for the annual model

use serde::{Deserialize, Serialize};

use super::debt::ScheduleSummary;
use super::irr::IrrResult;

/// Export column names, in order
pub const LEDGER_COLUMNS: [&str; 19] = [
    "Year",
    "Generation_MWh",
    "FX",
    "Tariff_USD_MWh",
    "Revenue_USD_M",
    "SSCL_USD_M",
    "OPEX_USD_M",
    "EBITDA",
    "DA",
    "EBIT",
    "Tax",
    "Op_CF",
    "USD_Int",
    "USD_Prin",
    "LKR_Int",
    "LKR_Prin",
    "Total_DS",
    "DSCR",
    "Eq_CF",
];

/// A single year of the project ledger.
///
/// Money is USD millions; LKR debt service is converted at the year's FX
/// rate. Field order and serde names are the export contract.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LedgerRow {
    #[serde(rename = "Year")]
    pub year: u32,
    #[serde(rename = "Generation_MWh")]
    pub generation_mwh: f64,
    #[serde(rename = "FX")]
    pub fx: f64,
    #[serde(rename = "Tariff_USD_MWh")]
    pub tariff_usd_mwh: f64,
    #[serde(rename = "Revenue_USD_M")]
    pub revenue: f64,
    #[serde(rename = "SSCL_USD_M")]
    pub levy: f64,
    #[serde(rename = "OPEX_USD_M")]
    pub opex: f64,
    #[serde(rename = "EBITDA")]
    pub ebitda: f64,
    #[serde(rename = "DA")]
    pub depreciation: f64,
    #[serde(rename = "EBIT")]
    pub ebit: f64,
    #[serde(rename = "Tax")]
    pub tax: f64,
    #[serde(rename = "Op_CF")]
    pub operating_cf: f64,
    #[serde(rename = "USD_Int")]
    pub usd_interest: f64,
    #[serde(rename = "USD_Prin")]
    pub usd_principal: f64,
    #[serde(rename = "LKR_Int")]
    pub lkr_interest: f64,
    #[serde(rename = "LKR_Prin")]
    pub lkr_principal: f64,
    #[serde(rename = "Total_DS")]
    pub total_debt_service: f64,
    /// NaN when there is no debt service
    #[serde(rename = "DSCR")]
    pub dscr: f64,
    #[serde(rename = "Eq_CF")]
    pub equity_cf: f64,

    /// Native tariff (LKR/kWh); not part of the export
    #[serde(skip)]
    pub tariff_lkr_kwh: f64,
}

/// Equity investment at t=0 followed by annual equity cash flow
pub fn equity_cashflows(equity_investment: f64, rows: &[LedgerRow]) -> Vec<f64> {
    std::iter::once(-equity_investment)
        .chain(rows.iter().map(|r| r.equity_cf))
        .collect()
}

/// Capex at t=0 followed by annual operating cash flow
pub fn project_cashflows(total_capex: f64, rows: &[LedgerRow]) -> Vec<f64> {
    std::iter::once(-total_capex)
        .chain(rows.iter().map(|r| r.operating_cf))
        .collect()
}

/// Complete model run: ledger plus headline metrics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelResult {
    pub rows: Vec<LedgerRow>,

    /// Equity invested at financial close (capex less debt, USD M)
    pub equity_investment: f64,

    pub equity_irr: IrrResult,
    pub project_irr: IrrResult,

    /// Rate used for [`ModelResult::npv`]
    pub discount_rate: f64,

    /// NPV of the equity cash flows at `discount_rate`
    pub npv: f64,

    pub debt: ScheduleSummary,
}

impl ModelResult {
    pub fn row(&self, year: u32) -> Option<&LedgerRow> {
        self.rows.get((year as usize).checked_sub(1)?)
    }

    /// Equity flows: investment at t=0, then annual equity cash flow
    pub fn equity_cashflows(&self) -> Vec<f64> {
        equity_cashflows(self.equity_investment, &self.rows)
    }

    /// Unlevered flows: capex at t=0, then annual operating cash flow
    pub fn project_cashflows(&self, total_capex: f64) -> Vec<f64> {
        project_cashflows(total_capex, &self.rows)
    }

    /// Lowest DSCR over years with debt service; NaN if there are none
    pub fn min_dscr(&self) -> f64 {
        self.rows
            .iter()
            .map(|r| r.dscr)
            .filter(|d| d.is_finite())
            .fold(f64::NAN, f64::min)
    }

    /// Headline metrics
    pub fn summary(&self) -> ModelSummary {
        ModelSummary {
            years: self.rows.len() as u32,
            equity_irr: self.equity_irr.value(),
            project_irr: self.project_irr.value(),
            npv: self.npv,
            min_dscr: self.min_dscr(),
            total_revenue: self.rows.iter().map(|r| r.revenue).sum(),
            total_debt_service: self.rows.iter().map(|r| r.total_debt_service).sum(),
            total_equity_cf: self.rows.iter().map(|r| r.equity_cf).sum(),
            unpaid_debt_flag: self.debt.is_anomalous(),
        }
    }
}

/// Summary statistics for a model run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSummary {
    pub years: u32,
    pub equity_irr: Option<f64>,
    pub project_irr: Option<f64>,
    pub npv: f64,
    pub min_dscr: f64,
    pub total_revenue: f64,
    pub total_debt_service: f64,
    pub total_equity_cf: f64,
    pub unpaid_debt_flag: bool,
}
