//! Annual projection: operations, debt scheduling, ledger assembly and returns

mod state;
mod operations;
mod debt;
mod engine;
mod cashflows;
pub mod irr;

pub use state::FacilityState;
pub use operations::{
    depreciation, fx_rate, generation, levy, operating_cash_flow, opex, opex_lkr_leg_per_mwh,
    opex_usd_leg_per_mwh, revenue, tariff_usd_per_mwh, OperatingYear,
};
pub use debt::{
    principal_due, DebtSchedule, DebtScheduler, DebtServiceYear, FacilityYear, ScheduleSummary,
    UNPAID_PRINCIPAL_THRESHOLD,
};
pub use engine::{dscr, FinancialModel, ModelConfig, DEFAULT_DISCOUNT_RATE, DSCR_EPSILON};
pub use cashflows::{equity_cashflows, project_cashflows, LedgerRow, ModelResult, ModelSummary, LEDGER_COLUMNS};
pub use irr::{compute_irr, compute_xirr, npv, xnpv, IrrOptions, IrrResult, IrrStatus, SolverMethod};
