//! Debt facilities and the capital structure they are derived from

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::project::ProjectParameters;

/// Currency a facility is drawn and serviced in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Currency {
    /// Hard currency, also the reporting currency
    Usd,
    /// Local currency, converted at the year's FX rate
    Lkr,
}

impl Currency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Currency::Usd => "USD",
            Currency::Lkr => "LKR",
        }
    }
}

/// A band of years sharing one cash-sweep percentage
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SweepBand {
    /// First year of the band (inclusive)
    pub first_year: u32,
    /// Last year of the band (inclusive); `None` runs to the horizon
    pub last_year: Option<u32>,
    /// Share of cash available for debt service swept into principal
    pub share: f64,
}

impl SweepBand {
    pub fn contains(&self, year: u32) -> bool {
        year >= self.first_year && self.last_year.map_or(true, |last| year <= last)
    }
}

/// How principal falls due on a facility
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AmortizationPolicy {
    /// Principal is a year-banded share of the cash left after all interest.
    /// Years outside every band repay nothing.
    CashSweep {
        bands: Vec<SweepBand>,
        /// Force the remaining balance due in the tenor year
        balloon_at_tenor: bool,
    },
    /// Remaining balance divided by remaining tenor years, recomputed each year
    StraightLine,
}

impl AmortizationPolicy {
    /// 80% sweep in years 2-4, 20% from year 5
    pub fn default_sweep() -> Self {
        AmortizationPolicy::CashSweep {
            bands: vec![
                SweepBand { first_year: 2, last_year: Some(4), share: 0.80 },
                SweepBand { first_year: 5, last_year: None, share: 0.20 },
            ],
            balloon_at_tenor: false,
        }
    }

    /// Sweep share applying in `year`, if any band covers it
    pub fn sweep_share(&self, year: u32) -> Option<f64> {
        match self {
            AmortizationPolicy::CashSweep { bands, .. } => {
                bands.iter().find(|band| band.contains(year)).map(|band| band.share)
            }
            AmortizationPolicy::StraightLine => None,
        }
    }
}

/// One debt facility. Amounts are millions of the facility currency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebtFacility {
    pub currency: Currency,
    pub principal: f64,
    pub interest_rate: f64,
    pub tenor_years: u32,
    /// Interest-only years at the start of the schedule
    pub grace_years: u32,
    pub policy: AmortizationPolicy,
}

impl DebtFacility {
    pub fn with_principal(mut self, principal: f64) -> Self {
        self.principal = principal;
        self
    }

    pub fn with_interest_rate(mut self, interest_rate: f64) -> Self {
        self.interest_rate = interest_rate;
        self
    }

    pub fn with_grace_years(mut self, grace_years: u32) -> Self {
        self.grace_years = grace_years;
        self
    }

    pub fn with_tenor(mut self, tenor_years: u32) -> Self {
        self.tenor_years = tenor_years;
        self
    }

    pub fn with_policy(mut self, policy: AmortizationPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Principal expressed in USD millions at the given FX rate
    pub fn principal_usd(&self, fx: f64) -> f64 {
        match self.currency {
            Currency::Usd => self.principal,
            Currency::Lkr => self.principal / fx,
        }
    }
}

/// The project's two senior facilities
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebtStructure {
    /// USD tranche (blended market and concessional funding)
    pub usd: DebtFacility,
    /// LKR tranche
    pub lkr: DebtFacility,
}

impl Default for DebtStructure {
    /// Reference financing: USD 56.36M cash sweep, LKR 13,833M straight-line
    fn default() -> Self {
        Self {
            usd: DebtFacility {
                currency: Currency::Usd,
                principal: 56.36,
                interest_rate: 0.07,
                tenor_years: 15,
                grace_years: 1,
                policy: AmortizationPolicy::default_sweep(),
            },
            lkr: DebtFacility {
                currency: Currency::Lkr,
                principal: 13_833.0,
                interest_rate: 0.07,
                tenor_years: 15,
                grace_years: 0,
                policy: AmortizationPolicy::StraightLine,
            },
        }
    }
}

impl DebtStructure {
    pub fn facilities(&self) -> [&DebtFacility; 2] {
        [&self.usd, &self.lkr]
    }

    /// Total drawn debt in USD millions, converted at the initial FX rate
    pub fn total_debt_usd(&self, fx_initial: f64) -> f64 {
        self.facilities().iter().map(|f| f.principal_usd(fx_initial)).sum()
    }

    pub fn with_usd(mut self, usd: DebtFacility) -> Self {
        self.usd = usd;
        self
    }

    pub fn with_lkr(mut self, lkr: DebtFacility) -> Self {
        self.lkr = lkr;
        self
    }

    /// Field map consumed by the debt validation collaborator (USD millions)
    pub fn to_field_map(&self, fx_initial: f64) -> BTreeMap<String, f64> {
        let usd = self.usd.principal_usd(fx_initial);
        let lkr = self.lkr.principal_usd(fx_initial);
        BTreeMap::from([
            ("total_debt".to_string(), usd + lkr),
            ("usd_debt".to_string(), usd),
            ("lkr_debt".to_string(), lkr),
            ("usd_rate".to_string(), self.usd.interest_rate),
            ("lkr_rate".to_string(), self.lkr.interest_rate),
        ])
    }
}

/// Capital structure decision variables
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CapitalStructure {
    /// Total debt as a share of capex
    pub debt_ratio: f64,
    /// USD share of total debt
    pub usd_share: f64,
    /// Concessional (DFI) share of the USD tranche
    pub concessional_share: f64,
}

impl Default for CapitalStructure {
    fn default() -> Self {
        Self {
            debt_ratio: 0.80,
            usd_share: 0.45,
            concessional_share: 0.10,
        }
    }
}

impl CapitalStructure {
    /// Decision vector `[debt_ratio, usd_share, concessional_share]`
    pub fn to_array(&self) -> [f64; 3] {
        [self.debt_ratio, self.usd_share, self.concessional_share]
    }

    pub fn from_array([debt_ratio, usd_share, concessional_share]: [f64; 3]) -> Self {
        Self { debt_ratio, usd_share, concessional_share }
    }
}

/// Lender terms used to turn a [`CapitalStructure`] into facilities
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancingTerms {
    /// Commercial USD rate
    pub usd_market_rate: f64,
    /// Concessional (DFI) USD rate
    pub usd_concessional_rate: f64,
    pub lkr_rate: f64,
    pub tenor_years: u32,
    pub usd_grace_years: u32,
    pub lkr_grace_years: u32,
    pub usd_policy: AmortizationPolicy,
}

impl Default for FinancingTerms {
    fn default() -> Self {
        Self {
            usd_market_rate: 0.07,
            usd_concessional_rate: 0.065,
            lkr_rate: 0.075,
            tenor_years: 15,
            usd_grace_years: 1,
            lkr_grace_years: 0,
            usd_policy: AmortizationPolicy::default_sweep(),
        }
    }
}

impl FinancingTerms {
    pub fn with_usd_market_rate(mut self, rate: f64) -> Self {
        self.usd_market_rate = rate;
        self
    }

    pub fn with_lkr_rate(mut self, rate: f64) -> Self {
        self.lkr_rate = rate;
        self
    }

    /// Blended USD rate for a given concessional share
    pub fn blended_usd_rate(&self, concessional_share: f64) -> f64 {
        concessional_share * self.usd_concessional_rate
            + (1.0 - concessional_share) * self.usd_market_rate
    }

    /// Size both facilities from capex and the capital structure.
    ///
    /// The LKR tranche is drawn at the initial FX rate.
    pub fn debt_structure(&self, params: &ProjectParameters, capital: &CapitalStructure) -> DebtStructure {
        let total_debt = params.total_capex * capital.debt_ratio;
        let usd_debt = total_debt * capital.usd_share;
        let lkr_debt_usd = total_debt - usd_debt;

        DebtStructure {
            usd: DebtFacility {
                currency: Currency::Usd,
                principal: usd_debt,
                interest_rate: self.blended_usd_rate(capital.concessional_share),
                tenor_years: self.tenor_years,
                grace_years: self.usd_grace_years,
                policy: self.usd_policy.clone(),
            },
            lkr: DebtFacility {
                currency: Currency::Lkr,
                principal: lkr_debt_usd * params.fx_initial,
                interest_rate: self.lkr_rate,
                tenor_years: self.tenor_years,
                grace_years: self.lkr_grace_years,
                policy: AmortizationPolicy::StraightLine,
            },
        }
    }
}
