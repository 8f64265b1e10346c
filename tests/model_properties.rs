//! End-to-end properties of the reference wind project model

use approx::assert_relative_eq;
use chrono::NaiveDate;

use windfin::optimization::{optimize_capital_structure, Objective, OptimizationConstraints};
use windfin::parameters::{DebtStructure, ProjectParameters};
use windfin::projection::{
    compute_irr, compute_xirr, depreciation, fx_rate, generation, npv, FinancialModel, IrrOptions,
    IrrStatus, ModelResult,
};
use windfin::scenario::{MonteCarloConfig, ScenarioRunner};

fn reference() -> ModelResult {
    FinancialModel::new(ProjectParameters::default(), DebtStructure::default()).run()
}

#[test]
fn generation_falls_and_fx_rises_every_year() {
    let params = ProjectParameters::default();
    for y in 1..params.project_years {
        assert!(generation(y + 1, &params) < generation(y, &params));
        assert!(fx_rate(y + 1, &params) > fx_rate(y, &params));
    }
}

#[test]
fn ledger_identities_hold_every_year() {
    let params = ProjectParameters::default();
    let result = reference();

    for row in &result.rows {
        assert_relative_eq!(row.levy, row.revenue * params.levy_rate, max_relative = 1e-10);
        assert!(row.tax >= 0.0);
        assert_eq!(row.equity_cf, row.operating_cf - row.total_debt_service);
        assert!(!row.dscr.is_infinite());
        assert!(row.dscr > 0.0 || row.dscr.is_nan());
    }

    let total_depreciation: f64 = (1..=params.project_years).map(|y| depreciation(y, &params)).sum();
    assert_relative_eq!(total_depreciation, params.total_capex, max_relative = 1e-6);
}

#[test]
fn usd_facility_grace_then_repayment() {
    let result = reference();
    assert_eq!(result.rows[0].usd_principal, 0.0);
    assert!(result.rows[1].usd_principal > 0.0);
}

#[test]
fn year_one_matches_hand_calculation() {
    let params = ProjectParameters::default();
    let result = reference();
    let row = result.row(1).unwrap();

    assert_eq!(row.generation_mwh, 150.0 * 8760.0 * 0.40);

    // Recompute year 1 from the ledger formulas
    let revenue = row.generation_mwh * (20.36 / 300.0 * 1000.0) / 1e6;
    let levy = revenue * 0.025;
    let opex = row.generation_mwh * 6.83 / 1e6;
    let ebitda = revenue - levy - opex;
    let ebit = ebitda - 146.38 / 20.0;
    let tax = (ebit * 0.30).max(0.0);
    let operating_cf = ebit - tax + 146.38 / 20.0;

    let usd_interest = 56.36 * 0.07;
    let lkr_interest = 13_833.0 * 0.07 / 300.0;
    let lkr_principal = 13_833.0 / 15.0 / 300.0;
    let debt_service = usd_interest + lkr_interest + lkr_principal;

    assert_relative_eq!(row.revenue, revenue, max_relative = 1e-6);
    assert_relative_eq!(row.opex, opex, max_relative = 1e-6);
    assert_relative_eq!(row.operating_cf, operating_cf, max_relative = 1e-6);
    assert_relative_eq!(row.total_debt_service, debt_service, max_relative = 1e-6);
    assert_relative_eq!(row.equity_cf, operating_cf - debt_service, max_relative = 1e-6);
    assert_relative_eq!(row.dscr, operating_cf / debt_service, max_relative = 1e-6);
    assert_eq!(row.fx, params.fx_initial);
}

#[test]
fn reference_case_headline_metrics() {
    let result = reference();
    let summary = result.summary();

    let equity_irr = summary.equity_irr.unwrap();
    let project_irr = summary.project_irr.unwrap();
    assert!(equity_irr > project_irr);
    assert!(project_irr > 0.0);
    assert!(summary.min_dscr > 1.0);
    assert!(!summary.unpaid_debt_flag);
    assert_relative_eq!(npv(equity_irr, &result.equity_cashflows()), 0.0, epsilon = 1e-6);
}

#[test]
fn root_finder_contract() {
    let options = IrrOptions::default();

    let solved = compute_irr(&[-100.0, 30.0, 30.0, 30.0, 30.0, 30.0], &options);
    assert_eq!(solved.status, IrrStatus::Converged);
    assert!(npv(solved.rate.unwrap(), &[-100.0, 30.0, 30.0, 30.0, 30.0, 30.0]).abs() < 1e-6);

    let positive = compute_irr(&[10.0, 10.0, 10.0], &options);
    assert_eq!(positive.status, IrrStatus::Error);
    assert!(positive.message.unwrap().contains("IRR undefined"));

    assert_eq!(compute_irr(&[-100.0], &options).status, IrrStatus::Error);
    assert_eq!(compute_irr(&[], &options).status, IrrStatus::Error);
}

#[test]
fn xirr_on_annual_dates_is_close_to_irr() {
    let flows = [-100.0, 30.0, 30.0, 30.0, 30.0, 30.0];
    let dated: Vec<(NaiveDate, f64)> = flows
        .iter()
        .enumerate()
        .map(|(i, cf)| (NaiveDate::from_ymd_opt(2025 + i as i32, 1, 1).unwrap(), *cf))
        .collect();

    let xirr = compute_xirr(&dated, &IrrOptions::default());
    let irr = compute_irr(&flows, &IrrOptions::default());
    assert!(xirr.is_converged());
    assert!((xirr.rate.unwrap() - irr.rate.unwrap()).abs() < 1e-3);
}

#[test]
fn monte_carlo_is_reproducible_for_a_seed() {
    let config = MonteCarloConfig::default().with_seed(2024).with_iterations(30);
    let runner = ScenarioRunner::new();
    let first = runner.run(&config).unwrap();
    let second = runner.run(&config).unwrap();

    assert_eq!(first.rows.len(), 30);
    for (a, b) in first.rows.iter().zip(&second.rows) {
        assert_eq!(a.usd_rate.to_bits(), b.usd_rate.to_bits());
        assert_eq!(a.lkr_rate.to_bits(), b.lkr_rate.to_bits());
        assert_eq!(a.debt_ratio.to_bits(), b.debt_ratio.to_bits());
        assert_eq!(a.fx_depreciation.to_bits(), b.fx_depreciation.to_bits());
        assert_eq!(a.capacity_factor.to_bits(), b.capacity_factor.to_bits());
    }
}

#[test]
fn unreachable_constraints_are_reported_not_raised() {
    let constraints = OptimizationConstraints { min_irr: 0.50, min_dscr: 3.0 };
    let result = optimize_capital_structure(Objective::EquityIrr, constraints).unwrap();

    assert!(!result.convergence);
    assert!(result.violations.irr_violation > 0.0 || result.violations.dscr_violation > 0.0);
}

#[test]
fn reference_optimization_meets_both_constraints() {
    let result = optimize_capital_structure(Objective::EquityIrr, OptimizationConstraints::default()).unwrap();

    assert!(result.convergence, "{}", result.message);
    assert!(result.violations.is_satisfied());
    assert!(result.metrics.equity_irr.unwrap() >= 0.15);
    assert!(result.metrics.min_dscr >= 1.3);
}
