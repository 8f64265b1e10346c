//! Bounds checking for parameter and debt-structure inputs
//!
//! Callers pass a field-name to value mapping; fields that are absent are not
//! checked. Findings come back as human-readable messages in a stable order.

use std::collections::BTreeMap;

use log::warn;

use crate::error::ValidationError;

/// Plausible range for a single field
struct Bound {
    field: &'static str,
    label: &'static str,
    min: f64,
    max: f64,
}

const PROJECT_BOUNDS: &[Bound] = &[
    Bound { field: "total_capex", label: "CAPEX (USD M)", min: 50.0, max: 500.0 },
    Bound { field: "capacity_factor", label: "Capacity factor", min: 0.15, max: 0.60 },
    Bound { field: "nameplate_mw", label: "Nameplate capacity (MW)", min: 10.0, max: 1000.0 },
    Bound { field: "tax_rate", label: "Tax rate", min: 0.0, max: 0.50 },
    Bound { field: "fx_depreciation", label: "FX depreciation", min: 0.0, max: 0.15 },
    Bound { field: "degradation", label: "Degradation rate", min: 0.0, max: 0.02 },
    Bound { field: "levy_rate", label: "SSCL levy rate", min: 0.0, max: 0.10 },
    Bound { field: "fx_initial", label: "Initial FX rate", min: 1.0, max: 10_000.0 },
    Bound { field: "project_years", label: "Project horizon (years)", min: 1.0, max: 50.0 },
    Bound { field: "economic_life", label: "Economic life (years)", min: 1.0, max: 50.0 },
];

/// Values beyond these limits make the model meaningless
const CRITICAL_CAPEX_MAX: f64 = 600.0;
const CRITICAL_RATE_MAX: f64 = 1.0;
const CRITICAL_FX_DEPRECIATION_MAX: f64 = 0.25;

const DEBT_SUM_TOLERANCE: f64 = 0.01;

/// Check project parameters against their plausible ranges.
///
/// Returns `(is_valid, errors)`.
pub fn validate_project_parameters(params: &BTreeMap<String, f64>) -> (bool, Vec<String>) {
    let mut errors = Vec::new();

    for bound in PROJECT_BOUNDS {
        if let Some(&value) = params.get(bound.field) {
            if !value.is_finite() || value < bound.min || value > bound.max {
                errors.push(format!(
                    "{} {} outside bounds [{}, {}]",
                    bound.label, value, bound.min, bound.max
                ));
            }
        }
    }

    if let (Some(usd), Some(lkr)) = (params.get("opex_split_usd"), params.get("opex_split_lkr")) {
        if ((usd + lkr) - 1.0).abs() > 1e-6 {
            errors.push(format!("Opex currency split {usd} + {lkr} does not sum to 1"));
        }
    }

    (errors.is_empty(), errors)
}

/// Check a debt structure expressed in USD millions.
///
/// The USD and LKR tranches must add up to the total.
pub fn validate_debt_structure(debt: &BTreeMap<String, f64>) -> (bool, Vec<String>) {
    let mut errors = Vec::new();

    for field in ["total_debt", "usd_debt", "lkr_debt"] {
        if let Some(&value) = debt.get(field) {
            if !value.is_finite() || value < 0.0 {
                errors.push(format!("{field} must be non-negative, got {value}"));
            }
        }
    }

    if let (Some(total), Some(usd), Some(lkr)) =
        (debt.get("total_debt"), debt.get("usd_debt"), debt.get("lkr_debt"))
    {
        if (usd + lkr - total).abs() > DEBT_SUM_TOLERANCE {
            errors.push(format!("USD debt {usd} + LKR debt {lkr} != total debt {total}"));
        }
    }

    if let Some(&share) = debt.get("dfi_pct_of_usd") {
        if !(0.0..=1.0).contains(&share) {
            errors.push(format!("DFI share of USD debt {share} outside bounds [0, 1]"));
        }
    }

    for field in ["usd_rate", "lkr_rate"] {
        if let Some(&rate) = debt.get(field) {
            if !(0.0..=0.30).contains(&rate) {
                errors.push(format!("{field} {rate} outside bounds [0, 0.3]"));
            }
        }
    }

    (errors.is_empty(), errors)
}

/// Validate and escalate.
///
/// Catastrophic combinations raise a [`ValidationError`]; everything else is
/// logged and returned as warnings.
pub fn validate_and_warn(params: &BTreeMap<String, f64>) -> Result<Vec<String>, ValidationError> {
    let mut critical = Vec::new();

    if let Some(&capex) = params.get("total_capex") {
        if capex <= 0.0 || capex > CRITICAL_CAPEX_MAX {
            critical.push(format!("CAPEX {capex} is implausible"));
        }
    }
    if let Some(&cf) = params.get("capacity_factor") {
        if cf <= 0.0 || cf > CRITICAL_RATE_MAX {
            critical.push(format!("Capacity factor {cf} is physically impossible"));
        }
    }
    if let Some(&tax) = params.get("tax_rate") {
        if !(0.0..=CRITICAL_RATE_MAX).contains(&tax) {
            critical.push(format!("Tax rate {tax} exceeds 100%"));
        }
    }
    if let Some(&depr) = params.get("fx_depreciation") {
        if depr > CRITICAL_FX_DEPRECIATION_MAX {
            critical.push(format!("FX depreciation {depr} per year is implausibly high"));
        }
    }

    if !critical.is_empty() {
        return Err(ValidationError::new(critical));
    }

    let (_, warnings) = validate_project_parameters(params);
    for message in &warnings {
        warn!("{message}");
    }
    Ok(warnings)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(entries: &[(&str, f64)]) -> BTreeMap<String, f64> {
        entries.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn test_valid_parameters_pass() {
        let params = map(&[
            ("total_capex", 155.0),
            ("capacity_factor", 0.40),
            ("nameplate_mw", 150.0),
            ("tax_rate", 0.30),
            ("fx_depreciation", 0.03),
        ]);
        let (is_valid, errors) = validate_project_parameters(&params);
        assert!(is_valid, "unexpected errors: {errors:?}");
        assert!(errors.is_empty());
    }

    #[test]
    fn test_capex_out_of_bounds() {
        let (is_valid, errors) = validate_project_parameters(&map(&[("total_capex", 600.0)]));
        assert!(!is_valid);
        assert!(errors[0].contains("CAPEX"));
    }

    #[test]
    fn test_capacity_factor_out_of_bounds() {
        let (is_valid, errors) = validate_project_parameters(&map(&[("capacity_factor", 1.5)]));
        assert!(!is_valid);
        assert!(errors.iter().any(|e| e.to_lowercase().contains("capacity factor")));
    }

    #[test]
    fn test_tax_rate_out_of_bounds() {
        let (is_valid, _) = validate_project_parameters(&map(&[("tax_rate", 0.80)]));
        assert!(!is_valid);
    }

    #[test]
    fn test_critical_combination_raises() {
        let params = map(&[
            ("total_capex", 700.0),
            ("capacity_factor", 2.0),
            ("tax_rate", 1.5),
            ("fx_depreciation", 0.50),
        ]);
        let err = validate_and_warn(&params).unwrap_err();
        assert_eq!(err.errors.len(), 4);
    }

    #[test]
    fn test_soft_findings_are_warnings() {
        let warnings = validate_and_warn(&map(&[("total_capex", 550.0)])).unwrap();
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn test_debt_structure_valid() {
        let debt = map(&[
            ("total_debt", 124.0),
            ("usd_debt", 55.8),
            ("lkr_debt", 68.2),
            ("dfi_pct_of_usd", 0.10),
        ]);
        let (is_valid, errors) = validate_debt_structure(&debt);
        assert!(is_valid, "unexpected errors: {errors:?}");
    }

    #[test]
    fn test_debt_split_mismatch() {
        let debt = map(&[("total_debt", 100.0), ("usd_debt", 50.0), ("lkr_debt", 60.0)]);
        let (is_valid, errors) = validate_debt_structure(&debt);
        assert!(!is_valid);
        assert!(errors.iter().any(|e| e.contains("!=")));
    }
}
