//! Project and market assumptions for the wind asset

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ValidationError, WindfinResult};
use super::validation;

/// Hours in a (non-leap) operating year
pub const HOURS_PER_YEAR: f64 = 8760.0;

/// kWh per MWh, used to lift the native kWh tariff to MWh
pub const KWH_PER_MWH: f64 = 1000.0;

/// Currency units per reporting million
pub const UNITS_PER_MILLION: f64 = 1_000_000.0;

/// Immutable project assumptions.
///
/// Monetary amounts are in USD millions unless noted; the tariff is quoted in
/// LKR/kWh and converted through the year's FX rate (LKR per USD). Scenario
/// variants are built with the `with_*` setters or [`ParameterOverrides`],
/// which return a new value and never touch the original.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProjectParameters {
    /// Projection horizon in years
    pub project_years: u32,

    /// Nameplate capacity (MW)
    pub nameplate_mw: f64,

    /// Base (P50) net capacity factor
    pub capacity_factor: f64,

    /// Annual output degradation
    pub degradation: f64,

    /// Offtake tariff (LKR/kWh)
    pub tariff_lkr_per_kwh: f64,

    /// FX rate in year 1 (LKR per USD)
    pub fx_initial: f64,

    /// Annual LKR depreciation against USD
    pub fx_depreciation: f64,

    /// Base operating cost (USD/MWh, year-1 terms)
    pub opex_usd_per_mwh: f64,

    /// Share of opex incurred in USD
    pub opex_split_usd: f64,

    /// Share of opex incurred in LKR
    pub opex_split_lkr: f64,

    /// Annual escalation of the USD opex leg
    pub opex_escalation_usd: f64,

    /// Annual escalation of the LKR opex leg
    pub opex_escalation_lkr: f64,

    /// Total capital expenditure (USD M)
    pub total_capex: f64,

    /// Straight-line depreciation life (years)
    pub economic_life: u32,

    /// Corporate income tax rate
    pub tax_rate: f64,

    /// Social Service Contribution Levy on turnover
    pub levy_rate: f64,
}

impl Default for ProjectParameters {
    /// 150 MW reference case
    fn default() -> Self {
        Self {
            project_years: 20,
            nameplate_mw: 150.0,
            capacity_factor: 0.40,
            degradation: 0.006,
            tariff_lkr_per_kwh: 20.36,
            fx_initial: 300.0,
            fx_depreciation: 0.03,
            opex_usd_per_mwh: 6.83,
            opex_split_usd: 0.3,
            opex_split_lkr: 0.7,
            opex_escalation_usd: 0.02,
            opex_escalation_lkr: 0.05,
            total_capex: 146.38,
            economic_life: 20,
            tax_rate: 0.30,
            levy_rate: 0.025,
        }
    }
}

impl ProjectParameters {
    /// Run the validation collaborator over these parameters.
    ///
    /// Returns the parameters unchanged when nothing catastrophic was found;
    /// softer findings are logged.
    pub fn validated(self) -> Result<Self, ValidationError> {
        validation::validate_and_warn(&self.to_field_map())?;
        Ok(self)
    }

    /// Field-name to value mapping consumed by the validation collaborator
    pub fn to_field_map(&self) -> BTreeMap<String, f64> {
        let fields: [(&str, f64); 16] = [
            ("project_years", self.project_years as f64),
            ("nameplate_mw", self.nameplate_mw),
            ("capacity_factor", self.capacity_factor),
            ("degradation", self.degradation),
            ("tariff_lkr_per_kwh", self.tariff_lkr_per_kwh),
            ("fx_initial", self.fx_initial),
            ("fx_depreciation", self.fx_depreciation),
            ("opex_usd_per_mwh", self.opex_usd_per_mwh),
            ("opex_split_usd", self.opex_split_usd),
            ("opex_split_lkr", self.opex_split_lkr),
            ("opex_escalation_usd", self.opex_escalation_usd),
            ("opex_escalation_lkr", self.opex_escalation_lkr),
            ("total_capex", self.total_capex),
            ("economic_life", self.economic_life as f64),
            ("tax_rate", self.tax_rate),
            ("levy_rate", self.levy_rate),
        ];
        fields.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    /// Net capacity factor as a fraction of nameplate hours
    pub fn with_capacity_factor(mut self, capacity_factor: f64) -> Self {
        self.capacity_factor = capacity_factor;
        self
    }

    /// Annual LKR depreciation against the USD
    pub fn with_fx_depreciation(mut self, fx_depreciation: f64) -> Self {
        self.fx_depreciation = fx_depreciation;
        self
    }

    /// Total capital cost in USD millions
    pub fn with_total_capex(mut self, total_capex: f64) -> Self {
        self.total_capex = total_capex;
        self
    }

    /// Length of the modelled horizon in years
    pub fn with_project_years(mut self, project_years: u32) -> Self {
        self.project_years = project_years;
        self
    }

    /// Straight-line depreciation life in years
    pub fn with_economic_life(mut self, economic_life: u32) -> Self {
        self.economic_life = economic_life;
        self
    }

    /// Annual loss of generation
    pub fn with_degradation(mut self, degradation: f64) -> Self {
        self.degradation = degradation;
        self
    }

    /// Corporate tax rate on positive EBIT
    pub fn with_tax_rate(mut self, tax_rate: f64) -> Self {
        self.tax_rate = tax_rate;
        self
    }

    /// Levy charged on gross revenue
    pub fn with_levy_rate(mut self, levy_rate: f64) -> Self {
        self.levy_rate = levy_rate;
        self
    }

    /// Flat tariff in LKR per kWh
    pub fn with_tariff(mut self, tariff_lkr_per_kwh: f64) -> Self {
        self.tariff_lkr_per_kwh = tariff_lkr_per_kwh;
        self
    }

    /// Derive a new parameter set with the given overrides applied
    pub fn with_overrides(self, overrides: &ParameterOverrides) -> Self {
        overrides.apply(self)
    }
}

/// Sparse set of field overrides, e.g. loaded from a CSV file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParameterOverrides {
    pub project_years: Option<u32>,
    pub nameplate_mw: Option<f64>,
    pub capacity_factor: Option<f64>,
    pub degradation: Option<f64>,
    pub tariff_lkr_per_kwh: Option<f64>,
    pub fx_initial: Option<f64>,
    pub fx_depreciation: Option<f64>,
    pub opex_usd_per_mwh: Option<f64>,
    pub opex_split_usd: Option<f64>,
    pub opex_split_lkr: Option<f64>,
    pub opex_escalation_usd: Option<f64>,
    pub opex_escalation_lkr: Option<f64>,
    pub total_capex: Option<f64>,
    pub economic_life: Option<u32>,
    pub tax_rate: Option<f64>,
    pub levy_rate: Option<f64>,
}

impl ParameterOverrides {
    /// Set a field by its name.
    ///
    /// Year counts must be whole, positive numbers.
    pub fn set(&mut self, name: &str, value: f64) -> WindfinResult<()> {
        match name {
            "project_years" => self.project_years = Some(whole_years(name, value)?),
            "economic_life" => self.economic_life = Some(whole_years(name, value)?),
            "nameplate_mw" => self.nameplate_mw = Some(value),
            "capacity_factor" => self.capacity_factor = Some(value),
            "degradation" => self.degradation = Some(value),
            "tariff_lkr_per_kwh" => self.tariff_lkr_per_kwh = Some(value),
            "fx_initial" => self.fx_initial = Some(value),
            "fx_depreciation" => self.fx_depreciation = Some(value),
            "opex_usd_per_mwh" => self.opex_usd_per_mwh = Some(value),
            "opex_split_usd" => self.opex_split_usd = Some(value),
            "opex_split_lkr" => self.opex_split_lkr = Some(value),
            "opex_escalation_usd" => self.opex_escalation_usd = Some(value),
            "opex_escalation_lkr" => self.opex_escalation_lkr = Some(value),
            "total_capex" => self.total_capex = Some(value),
            "tax_rate" => self.tax_rate = Some(value),
            "levy_rate" => self.levy_rate = Some(value),
            other => return Err(ModelError::UnknownParameter(other.to_string())),
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Apply to a base parameter set, returning the derived set
    pub fn apply(&self, base: ProjectParameters) -> ProjectParameters {
        ProjectParameters {
            project_years: self.project_years.unwrap_or(base.project_years),
            nameplate_mw: self.nameplate_mw.unwrap_or(base.nameplate_mw),
            capacity_factor: self.capacity_factor.unwrap_or(base.capacity_factor),
            degradation: self.degradation.unwrap_or(base.degradation),
            tariff_lkr_per_kwh: self.tariff_lkr_per_kwh.unwrap_or(base.tariff_lkr_per_kwh),
            fx_initial: self.fx_initial.unwrap_or(base.fx_initial),
            fx_depreciation: self.fx_depreciation.unwrap_or(base.fx_depreciation),
            opex_usd_per_mwh: self.opex_usd_per_mwh.unwrap_or(base.opex_usd_per_mwh),
            opex_split_usd: self.opex_split_usd.unwrap_or(base.opex_split_usd),
            opex_split_lkr: self.opex_split_lkr.unwrap_or(base.opex_split_lkr),
            opex_escalation_usd: self.opex_escalation_usd.unwrap_or(base.opex_escalation_usd),
            opex_escalation_lkr: self.opex_escalation_lkr.unwrap_or(base.opex_escalation_lkr),
            total_capex: self.total_capex.unwrap_or(base.total_capex),
            economic_life: self.economic_life.unwrap_or(base.economic_life),
            tax_rate: self.tax_rate.unwrap_or(base.tax_rate),
            levy_rate: self.levy_rate.unwrap_or(base.levy_rate),
        }
    }
}

fn whole_years(field: &str, value: f64) -> WindfinResult<u32> {
    if value.fract() != 0.0 || value < 1.0 || value > u32::MAX as f64 {
        return Err(ModelError::InvalidParameter {
            field: field.to_string(),
            reason: format!("expected a positive whole number of years, got {value}"),
        });
    }
    Ok(value as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides_leave_base_untouched() {
        let base = ProjectParameters::default();
        let mut overrides = ParameterOverrides::default();
        overrides.set("capacity_factor", 0.38).unwrap();
        overrides.set("project_years", 25.0).unwrap();

        let derived = base.with_overrides(&overrides);

        assert_eq!(derived.capacity_factor, 0.38);
        assert_eq!(derived.project_years, 25);
        assert_eq!(base.capacity_factor, 0.40);
        assert_eq!(derived.tax_rate, base.tax_rate);
    }

    #[test]
    fn test_unknown_override_rejected() {
        let mut overrides = ParameterOverrides::default();
        let err = overrides.set("cf_p90", 0.3).unwrap_err();
        assert!(matches!(err, ModelError::UnknownParameter(_)));
    }

    #[test]
    fn test_fractional_years_rejected() {
        let mut overrides = ParameterOverrides::default();
        assert!(overrides.set("economic_life", 19.5).is_err());
        assert!(overrides.is_empty());
    }

    #[test]
    fn test_default_passes_validation() {
        assert!(ProjectParameters::default().validated().is_ok());
    }
}
