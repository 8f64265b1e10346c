//! Sequential debt amortization scheduling
//!
//! Each year: interest on the opening balance of every facility, then cash
//! available after all interest, then principal per facility policy, then the
//! balance roll-forward. Principal in year y depends on the balance left by
//! year y-1, so years are processed strictly in order.

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::parameters::{AmortizationPolicy, Currency, DebtFacility, DebtStructure, ProjectParameters};
use super::operations::operating_cash_flow;
use super::state::FacilityState;

/// Unpaid share of original principal at horizon end that is flagged
pub const UNPAID_PRINCIPAL_THRESHOLD: f64 = 0.10;

/// One facility's debt service for one year
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FacilityYear {
    /// Interest, facility currency (millions)
    pub interest: f64,
    /// Principal, facility currency (millions)
    pub principal: f64,
    /// Interest converted to USD millions
    pub interest_usd: f64,
    /// Principal converted to USD millions
    pub principal_usd: f64,
    /// Balance after this year's repayment, facility currency
    pub closing_balance: f64,
}

impl FacilityYear {
    pub fn debt_service_usd(&self) -> f64 {
        self.interest_usd + self.principal_usd
    }

    pub fn debt_service(&self) -> f64 {
        self.interest + self.principal
    }
}

/// Debt service across both facilities for one year
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DebtServiceYear {
    pub year: u32,
    pub fx: f64,
    /// Operating cash flow less interest on all facilities (USD M)
    pub available_cf: f64,
    pub usd: FacilityYear,
    pub lkr: FacilityYear,
}

impl DebtServiceYear {
    /// Total debt service in USD millions
    pub fn total_debt_service(&self) -> f64 {
        self.usd.debt_service_usd() + self.lkr.debt_service_usd()
    }
}

/// Repayment status at the end of the horizon
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleSummary {
    pub usd_closing_balance: f64,
    pub lkr_closing_balance: f64,
    pub usd_unpaid_share: f64,
    pub lkr_unpaid_share: f64,
    /// Principal repaid over the horizon, native currency
    pub usd_repaid: f64,
    pub lkr_repaid: f64,
    /// Years where cash after interest was negative
    pub distress_years: Vec<u32>,
}

impl ScheduleSummary {
    /// More than 10% of either facility's original principal left unpaid
    pub fn is_anomalous(&self) -> bool {
        self.usd_unpaid_share > UNPAID_PRINCIPAL_THRESHOLD
            || self.lkr_unpaid_share > UNPAID_PRINCIPAL_THRESHOLD
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebtSchedule {
    pub years: Vec<DebtServiceYear>,
    pub summary: ScheduleSummary,
}

impl DebtSchedule {
    pub fn year(&self, year: u32) -> Option<&DebtServiceYear> {
        self.years.get((year as usize).checked_sub(1)?)
    }
}

/// Convert a facility amount into USD millions
fn to_usd(currency: Currency, amount: f64, fx: f64) -> f64 {
    match currency {
        Currency::Usd => amount,
        Currency::Lkr => amount / fx,
    }
}

/// Convert a USD amount into the facility currency
fn from_usd(currency: Currency, amount: f64, fx: f64) -> f64 {
    match currency {
        Currency::Usd => amount,
        Currency::Lkr => amount * fx,
    }
}

/// Principal falling due on a facility in `year`, floored at zero.
///
/// `available` is in the facility's own currency.
pub fn principal_due(facility: &DebtFacility, state: &FacilityState, year: u32, available: f64) -> f64 {
    if year <= facility.grace_years {
        return 0.0;
    }

    let due = match &facility.policy {
        AmortizationPolicy::CashSweep { balloon_at_tenor, .. }
            if *balloon_at_tenor && year >= facility.tenor_years =>
        {
            state.balance
        }
        AmortizationPolicy::CashSweep { .. } => match facility.policy.sweep_share(year) {
            Some(share) => state.balance.min(share * available),
            None => 0.0,
        },
        AmortizationPolicy::StraightLine => {
            if year <= facility.tenor_years {
                state.balance / (facility.tenor_years - year + 1) as f64
            } else {
                0.0
            }
        }
    };

    due.max(0.0)
}

/// Builds the debt schedule for one parameter set and debt structure
pub struct DebtScheduler<'a> {
    params: &'a ProjectParameters,
    debt: &'a DebtStructure,
}

impl<'a> DebtScheduler<'a> {
    pub fn new(params: &'a ProjectParameters, debt: &'a DebtStructure) -> Self {
        Self { params, debt }
    }

    /// Run the schedule over the full project horizon
    pub fn schedule(&self) -> DebtSchedule {
        let mut usd_state = FacilityState::from_facility(&self.debt.usd);
        let mut lkr_state = FacilityState::from_facility(&self.debt.lkr);
        let mut years = Vec::with_capacity(self.params.project_years as usize);
        let mut distress_years = Vec::new();

        for year in 1..=self.params.project_years {
            let ops = operating_cash_flow(year, self.params);
            let fx = ops.fx;

            let usd_interest = usd_state.interest(self.debt.usd.interest_rate);
            let lkr_interest = lkr_state.interest(self.debt.lkr.interest_rate);

            let available_cf = ops.operating_cf
                - to_usd(self.debt.usd.currency, usd_interest, fx)
                - to_usd(self.debt.lkr.currency, lkr_interest, fx);
            if available_cf < 0.0 {
                debug!("year {year}: cash after interest is negative ({available_cf:.4})");
                distress_years.push(year);
            }

            let usd = self.advance(&self.debt.usd, &mut usd_state, year, usd_interest, available_cf, fx);
            let lkr = self.advance(&self.debt.lkr, &mut lkr_state, year, lkr_interest, available_cf, fx);

            years.push(DebtServiceYear { year, fx, available_cf, usd, lkr });
        }

        let summary = ScheduleSummary {
            usd_closing_balance: usd_state.balance,
            lkr_closing_balance: lkr_state.balance,
            usd_unpaid_share: usd_state.unpaid_share(),
            lkr_unpaid_share: lkr_state.unpaid_share(),
            usd_repaid: usd_state.cumulative_principal,
            lkr_repaid: lkr_state.cumulative_principal,
            distress_years,
        };
        if summary.is_anomalous() {
            warn!(
                "debt not repaid by year {}: USD {:.1}% and LKR {:.1}% of principal outstanding",
                self.params.project_years,
                summary.usd_unpaid_share * 100.0,
                summary.lkr_unpaid_share * 100.0
            );
        }

        DebtSchedule { years, summary }
    }

    fn advance(
        &self,
        facility: &DebtFacility,
        state: &mut FacilityState,
        year: u32,
        interest: f64,
        available_usd: f64,
        fx: f64,
    ) -> FacilityYear {
        let available = from_usd(facility.currency, available_usd, fx);
        let due = principal_due(facility, state, year, available);
        let principal = state.repay(due);

        FacilityYear {
            interest,
            principal,
            interest_usd: to_usd(facility.currency, interest, fx),
            principal_usd: to_usd(facility.currency, principal, fx),
            closing_balance: state.balance,
        }
    }
}
