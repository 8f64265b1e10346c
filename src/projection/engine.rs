//! Model assembler: joins operating results with the debt schedule

use crate::parameters::{DebtStructure, ProjectParameters};
use super::cashflows::{equity_cashflows, project_cashflows, LedgerRow, ModelResult};
use super::debt::{DebtSchedule, DebtScheduler};
use super::irr::{compute_irr, npv, IrrOptions};
use super::operations::operating_cash_flow;

/// Debt service at or below this is treated as no debt service
pub const DSCR_EPSILON: f64 = 1e-6;

/// Default equity discount rate for NPV
pub const DEFAULT_DISCOUNT_RATE: f64 = 0.12;

/// Configuration for a model run
#[derive(Debug, Clone)]
pub struct ModelConfig {
    /// Fixed rate for the equity NPV
    pub discount_rate: f64,

    /// Solver settings for equity and project IRR
    pub irr: IrrOptions,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            discount_rate: DEFAULT_DISCOUNT_RATE,
            irr: IrrOptions::default(),
        }
    }
}

/// Debt service coverage; NaN when there is no debt service
pub fn dscr(operating_cf: f64, total_debt_service: f64) -> f64 {
    if total_debt_service > DSCR_EPSILON {
        operating_cf / total_debt_service
    } else {
        f64::NAN
    }
}

/// Full annual project-finance model
pub struct FinancialModel {
    params: ProjectParameters,
    debt: DebtStructure,
    config: ModelConfig,
}

impl FinancialModel {
    pub fn new(params: ProjectParameters, debt: DebtStructure) -> Self {
        Self::with_config(params, debt, ModelConfig::default())
    }

    pub fn with_config(params: ProjectParameters, debt: DebtStructure, config: ModelConfig) -> Self {
        Self { params, debt, config }
    }

    pub fn params(&self) -> &ProjectParameters {
        &self.params
    }

    pub fn debt(&self) -> &DebtStructure {
        &self.debt
    }

    pub fn schedule(&self) -> DebtSchedule {
        DebtScheduler::new(&self.params, &self.debt).schedule()
    }

    /// Build the ledger for every year of the horizon
    pub fn ledger(&self, schedule: &DebtSchedule) -> Vec<LedgerRow> {
        schedule
            .years
            .iter()
            .map(|service| {
                let ops = operating_cash_flow(service.year, &self.params);
                let total_debt_service = service.total_debt_service();

                LedgerRow {
                    year: service.year,
                    generation_mwh: ops.generation_mwh,
                    fx: ops.fx,
                    tariff_usd_mwh: ops.tariff_usd_mwh,
                    revenue: ops.revenue,
                    levy: ops.levy,
                    opex: ops.opex,
                    ebitda: ops.ebitda,
                    depreciation: ops.depreciation,
                    ebit: ops.ebit,
                    tax: ops.tax,
                    operating_cf: ops.operating_cf,
                    usd_interest: service.usd.interest_usd,
                    usd_principal: service.usd.principal_usd,
                    lkr_interest: service.lkr.interest_usd,
                    lkr_principal: service.lkr.principal_usd,
                    total_debt_service,
                    dscr: dscr(ops.operating_cf, total_debt_service),
                    equity_cf: ops.operating_cf - total_debt_service,
                    tariff_lkr_kwh: self.params.tariff_lkr_per_kwh,
                }
            })
            .collect()
    }

    /// Run the model and solve the return metrics
    pub fn run(&self) -> ModelResult {
        let schedule = self.schedule();
        let rows = self.ledger(&schedule);
        let equity_investment =
            self.params.total_capex - self.debt.total_debt_usd(self.params.fx_initial);

        let equity_flows = equity_cashflows(equity_investment, &rows);
        let project_flows = project_cashflows(self.params.total_capex, &rows);

        ModelResult {
            equity_irr: compute_irr(&equity_flows, &self.config.irr),
            project_irr: compute_irr(&project_flows, &self.config.irr),
            npv: npv(self.config.discount_rate, &equity_flows),
            discount_rate: self.config.discount_rate,
            rows,
            equity_investment,
            debt: schedule.summary,
        }
    }
}
