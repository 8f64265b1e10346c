//! Internal Rate of Return (IRR/XIRR) and NPV
//!
//! The solvers never panic or return `Err`: every outcome, including bad
//! input, is an [`IrrResult`] whose status the caller checks before reading
//! the rate.

use chrono::NaiveDate;
use log::warn;
use serde::{Deserialize, Serialize};

/// Lowest rate searched (-99%)
pub const MIN_RATE: f64 = -0.99;

/// Highest rate searched (+500%)
pub const MAX_RATE: f64 = 5.00;

/// Day-count basis for irregular periods
pub const DAYS_PER_YEAR: f64 = 365.25;

/// Which solvers to try
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SolverMethod {
    /// Brent's method over [`MIN_RATE`, `MAX_RATE`]
    Bracketing,
    /// Newton-Raphson with the analytic NPV derivative
    Newton,
    /// Bracketing first, Newton if it fails
    Both,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IrrStatus {
    Converged,
    /// A solver ran but did not produce an acceptable root
    Failed,
    /// The input or bracket made solving impossible
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IrrOptions {
    pub method: SolverMethod,
    /// Starting point for Newton
    pub initial_guess: f64,
    pub tolerance: f64,
    pub max_iterations: u32,
}

impl Default for IrrOptions {
    fn default() -> Self {
        Self {
            method: SolverMethod::Both,
            initial_guess: 0.10,
            tolerance: 1e-8,
            max_iterations: 1000,
        }
    }
}

/// Outcome of an IRR or XIRR solve
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IrrResult {
    pub rate: Option<f64>,
    pub status: IrrStatus,
    /// Solver that produced the rate
    pub method: Option<String>,
    /// NPV re-evaluated at the returned rate
    pub npv_check: Option<f64>,
    pub iterations: u32,
    pub message: Option<String>,
    /// Multiple sign changes: more than one root may exist
    pub warning: Option<String>,
}

impl IrrResult {
    fn converged(rate: f64, method: &str, npv_check: f64, iterations: u32, warning: Option<String>) -> Self {
        Self {
            rate: Some(rate),
            status: IrrStatus::Converged,
            method: Some(method.to_string()),
            npv_check: Some(npv_check),
            iterations,
            message: None,
            warning,
        }
    }

    fn failure(status: IrrStatus, method: Option<&str>, message: impl Into<String>, warning: Option<String>) -> Self {
        Self {
            rate: None,
            status,
            method: method.map(str::to_string),
            npv_check: None,
            iterations: 0,
            message: Some(message.into()),
            warning,
        }
    }

    pub fn is_converged(&self) -> bool {
        self.status == IrrStatus::Converged
    }

    /// The rate, only when the solve converged
    pub fn value(&self) -> Option<f64> {
        if self.is_converged() {
            self.rate
        } else {
            None
        }
    }
}

/// NPV of periodic cash flows; the first flow is undiscounted
pub fn npv(rate: f64, cashflows: &[f64]) -> f64 {
    cashflows
        .iter()
        .enumerate()
        .map(|(t, &cf)| cf / (1.0 + rate).powi(t as i32))
        .sum()
}

/// d(NPV)/d(rate) for periodic cash flows
pub fn npv_derivative(rate: f64, cashflows: &[f64]) -> f64 {
    cashflows
        .iter()
        .enumerate()
        .skip(1)
        .map(|(t, &cf)| -(t as f64) * cf / (1.0 + rate).powi(t as i32 + 1))
        .sum()
}

/// Year fractions from the first date, on an actual/365.25 basis
pub fn year_fractions(dated: &[(NaiveDate, f64)]) -> Vec<f64> {
    let Some(&(first, _)) = dated.first() else {
        return Vec::new();
    };
    dated
        .iter()
        .map(|(date, _)| (*date - first).num_days() as f64 / DAYS_PER_YEAR)
        .collect()
}

/// NPV of dated cash flows, discounted to the first date
pub fn xnpv(rate: f64, dated: &[(NaiveDate, f64)]) -> f64 {
    let years = year_fractions(dated);
    discount_fractional(rate, dated, &years)
}

fn discount_fractional(rate: f64, dated: &[(NaiveDate, f64)], years: &[f64]) -> f64 {
    dated
        .iter()
        .zip(years)
        .map(|((_, cf), &y)| cf / (1.0 + rate).powf(y))
        .sum()
}

/// Reject sequences with no root before any solver runs.
///
/// Returns the multiple-root warning, if any.
fn precheck<'a, I>(amounts: I, count: usize) -> Result<Option<String>, IrrResult>
where
    I: Iterator<Item = &'a f64> + Clone,
{
    if count < 2 {
        return Err(IrrResult::failure(
            IrrStatus::Error,
            None,
            "Insufficient data: need at least 2 cash flows",
            None,
        ));
    }
    if amounts.clone().all(|&cf| cf >= 0.0) {
        return Err(IrrResult::failure(
            IrrStatus::Error,
            None,
            "No negative cash flows - IRR undefined",
            None,
        ));
    }
    if amounts.clone().all(|&cf| cf <= 0.0) {
        return Err(IrrResult::failure(
            IrrStatus::Error,
            None,
            "No positive cash flows - IRR undefined",
            None,
        ));
    }

    let values: Vec<f64> = amounts.copied().collect();
    let sign_changes = values.windows(2).filter(|w| w[0] * w[1] < 0.0).count();
    if sign_changes > 1 {
        let message = format!("{sign_changes} sign changes detected - multiple IRRs may exist");
        warn!("{message}");
        Ok(Some(message))
    } else {
        Ok(None)
    }
}

/// Brent root outcome
enum Bracket {
    Root { rate: f64, iterations: u32 },
    NoSignChange { f_low: f64, f_high: f64 },
    IterationLimit { rate: f64 },
}

/// Brent's method on [low, high].
///
/// Stops once |f| is within tolerance or the bracket has collapsed to
/// machine precision.
fn brent<F>(f: F, low: f64, high: f64, tolerance: f64, max_iterations: u32) -> Bracket
where
    F: Fn(f64) -> f64,
{
    let (mut a, mut b) = (low, high);
    let (mut fa, mut fb) = (f(a), f(b));

    if !fa.is_finite() || !fb.is_finite() || fa * fb > 0.0 {
        return Bracket::NoSignChange { f_low: fa, f_high: fb };
    }
    if fa == 0.0 {
        return Bracket::Root { rate: a, iterations: 0 };
    }
    if fb == 0.0 {
        return Bracket::Root { rate: b, iterations: 0 };
    }

    let (mut c, mut fc) = (a, fa);
    let mut d = b - a;
    let mut e = d;

    for iteration in 1..=max_iterations {
        if fb * fc > 0.0 {
            c = a;
            fc = fa;
            d = b - a;
            e = d;
        }
        if fc.abs() < fb.abs() {
            a = b;
            b = c;
            c = a;
            fa = fb;
            fb = fc;
            fc = fa;
        }

        let tol = 2.0 * f64::EPSILON * b.abs().max(1.0);
        let m = 0.5 * (c - b);

        if fb.abs() <= tolerance || fb == 0.0 || m.abs() <= tol {
            return Bracket::Root { rate: b, iterations: iteration };
        }

        if e.abs() >= tol && fa.abs() > fb.abs() {
            // Inverse quadratic interpolation, or secant when a == c
            let s = fb / fa;
            let (mut p, mut q) = if a == c {
                (2.0 * m * s, 1.0 - s)
            } else {
                let q = fa / fc;
                let r = fb / fc;
                (
                    s * (2.0 * m * q * (q - r) - (b - a) * (r - 1.0)),
                    (q - 1.0) * (r - 1.0) * (s - 1.0),
                )
            };
            if p > 0.0 {
                q = -q;
            } else {
                p = -p;
            }
            if 2.0 * p < (3.0 * m * q - (tol * q).abs()).min((e * q).abs()) {
                e = d;
                d = p / q;
            } else {
                d = m;
                e = m;
            }
        } else {
            d = m;
            e = m;
        }

        a = b;
        fa = fb;
        b += if d.abs() > tol { d } else { tol.copysign(m) };
        fb = f(b);
    }

    Bracket::IterationLimit { rate: b }
}

/// Newton-Raphson; `None` when the iteration breaks down or hits the cap
fn newton<F, D>(f: F, df: D, guess: f64, tolerance: f64, max_iterations: u32) -> Option<(f64, u32)>
where
    F: Fn(f64) -> f64,
    D: Fn(f64) -> f64,
{
    let mut rate = guess;
    for iteration in 1..=max_iterations {
        if 1.0 + rate <= 0.0 {
            return None;
        }
        let value = f(rate);
        let slope = df(rate);
        if !value.is_finite() || !slope.is_finite() || slope == 0.0 {
            return None;
        }
        let step = value / slope;
        rate -= step;
        if step.abs() < tolerance {
            return Some((rate, iteration));
        }
    }
    None
}

const BRACKETING_LABEL: &str = "Brent (bracketing)";
const NEWTON_LABEL: &str = "Newton-Raphson (analytic derivative)";
const XIRR_LABEL: &str = "Brent (bracketing, irregular periods)";

/// Solve for the IRR of periodic cash flows.
///
/// The bracketed root is verified by re-evaluating NPV; a residual above
/// 10x tolerance falls through to Newton when [`SolverMethod::Both`] is
/// selected. Newton results must also lie strictly inside the search domain.
pub fn compute_irr(cashflows: &[f64], options: &IrrOptions) -> IrrResult {
    let warning = match precheck(cashflows.iter(), cashflows.len()) {
        Ok(warning) => warning,
        Err(result) => return result,
    };
    let objective = |r: f64| npv(r, cashflows);
    let residual_limit = options.tolerance * 10.0;

    if matches!(options.method, SolverMethod::Bracketing | SolverMethod::Both) {
        match brent(objective, MIN_RATE, MAX_RATE, options.tolerance, options.max_iterations) {
            Bracket::Root { rate, iterations } => {
                let check = npv(rate, cashflows);
                if check.abs() < residual_limit {
                    return IrrResult::converged(rate, BRACKETING_LABEL, check, iterations, warning);
                }
            }
            Bracket::NoSignChange { f_low, f_high } => {
                if options.method == SolverMethod::Bracketing {
                    return IrrResult::failure(
                        IrrStatus::Error,
                        Some(BRACKETING_LABEL),
                        format!(
                            "Bracketing failed: NPV has the same sign at {MIN_RATE} ({f_low:.6e}) and {MAX_RATE} ({f_high:.6e})"
                        ),
                        warning,
                    );
                }
            }
            Bracket::IterationLimit { .. } => {}
        }
    }

    if matches!(options.method, SolverMethod::Newton | SolverMethod::Both) {
        let derivative = |r: f64| npv_derivative(r, cashflows);
        if let Some((rate, iterations)) =
            newton(objective, derivative, options.initial_guess, options.tolerance, options.max_iterations)
        {
            let check = npv(rate, cashflows);
            if check.abs() < residual_limit && rate > MIN_RATE && rate < MAX_RATE {
                return IrrResult::converged(rate, NEWTON_LABEL, check, iterations, warning);
            }
        }
    }

    IrrResult::failure(IrrStatus::Failed, None, "All solver methods failed to converge", warning)
}

/// Solve for the IRR of dated cash flows (bracketing only).
///
/// Exponents are days since the first flow divided by 365.25.
pub fn compute_xirr(dated: &[(NaiveDate, f64)], options: &IrrOptions) -> IrrResult {
    let warning = match precheck(dated.iter().map(|(_, cf)| cf), dated.len()) {
        Ok(warning) => warning,
        Err(result) => return result,
    };
    let years = year_fractions(dated);
    let objective = |r: f64| discount_fractional(r, dated, &years);

    match brent(objective, MIN_RATE, MAX_RATE, options.tolerance, options.max_iterations) {
        Bracket::Root { rate, iterations } => {
            let check = discount_fractional(rate, dated, &years);
            if check.abs() < options.tolerance * 10.0 {
                IrrResult::converged(rate, XIRR_LABEL, check, iterations, warning)
            } else {
                IrrResult::failure(
                    IrrStatus::Failed,
                    Some(XIRR_LABEL),
                    format!("XIRR residual {check:.3e} exceeds tolerance"),
                    warning,
                )
            }
        }
        Bracket::NoSignChange { .. } | Bracket::IterationLimit { .. } => IrrResult::failure(
            IrrStatus::Failed,
            Some(XIRR_LABEL),
            "XIRR calculation failed to converge",
            warning,
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_simple_irr() {
        let flows = [-100.0, 30.0, 30.0, 30.0, 30.0, 30.0];
        let result = compute_irr(&flows, &IrrOptions::default());

        assert_eq!(result.status, IrrStatus::Converged);
        let rate = result.rate.unwrap();
        assert!(npv(rate, &flows).abs() < 1e-6);
        assert_relative_eq!(rate, 0.152382, epsilon = 1e-5);
        assert!(result.warning.is_none());
    }

    #[test]
    fn test_one_period_irr() {
        let result = compute_irr(&[-1000.0, 1100.0], &IrrOptions::default());
        assert_relative_eq!(result.value().unwrap(), 0.10, epsilon = 1e-9);
    }

    #[test]
    fn test_all_positive_is_error() {
        let result = compute_irr(&[10.0, 10.0, 10.0], &IrrOptions::default());
        assert_eq!(result.status, IrrStatus::Error);
        assert!(result.message.unwrap().contains("IRR undefined"));
        assert!(result.rate.is_none());
    }

    #[test]
    fn test_all_negative_is_error() {
        let result = compute_irr(&[-10.0, -10.0], &IrrOptions::default());
        assert_eq!(result.status, IrrStatus::Error);
        assert!(result.message.unwrap().contains("No positive cash flows"));
    }

    #[test]
    fn test_too_few_flows_is_error() {
        for flows in [&[][..], &[-5.0][..]] {
            let result = compute_irr(flows, &IrrOptions::default());
            assert_eq!(result.status, IrrStatus::Error);
            assert!(result.message.unwrap().contains("Insufficient data"));
        }
    }

    #[test]
    fn test_multiple_sign_changes_warn_but_solve() {
        // Roots at 10% and 20%
        let flows = [-100.0, 230.0, -132.0];
        let result = compute_irr(&flows, &IrrOptions::default());
        assert!(result.warning.as_deref().unwrap().contains("2 sign changes"));
        assert_eq!(result.status, IrrStatus::Converged);
        assert!(npv(result.rate.unwrap(), &flows).abs() < 1e-7);
    }

    #[test]
    fn test_newton_only() {
        let options = IrrOptions { method: SolverMethod::Newton, ..Default::default() };
        let flows = [-100.0, 30.0, 30.0, 30.0, 30.0, 30.0];
        let result = compute_irr(&flows, &options);
        assert_eq!(result.method.as_deref(), Some(NEWTON_LABEL));
        assert_relative_eq!(result.rate.unwrap(), 0.152382, epsilon = 1e-5);
    }

    #[test]
    fn test_large_flows_fall_back_to_newton() {
        // Bracketed root residual scales with the flows and misses the check
        let flows: Vec<f64> = [-100.0, 30.0, 30.0, 30.0, 30.0, 30.0].iter().map(|cf| cf * 1e7).collect();
        let result = compute_irr(&flows, &IrrOptions::default());

        assert_eq!(result.status, IrrStatus::Converged);
        assert_eq!(result.method.as_deref(), Some(NEWTON_LABEL));
        assert!(result.npv_check.unwrap().abs() < 1e-7);
        assert_relative_eq!(result.rate.unwrap(), 0.152382, epsilon = 1e-5);
    }

    #[test]
    fn test_bracketing_only_reports_missing_bracket() {
        // Root at ~900%, outside the domain
        let options = IrrOptions { method: SolverMethod::Bracketing, ..Default::default() };
        let result = compute_irr(&[-1.0, 10.0], &options);
        assert_eq!(result.status, IrrStatus::Error);
        assert!(result.message.unwrap().starts_with("Bracketing failed"));
    }

    #[test]
    fn test_out_of_domain_root_fails_both() {
        let result = compute_irr(&[-1.0, 10.0], &IrrOptions::default());
        assert_eq!(result.status, IrrStatus::Failed);
        assert!(result.value().is_none());
    }

    #[test]
    fn test_npv_derivative_matches_finite_difference() {
        let flows = [-100.0, 20.0, 40.0, 60.0];
        let h = 1e-6;
        let numeric = (npv(0.08 + h, &flows) - npv(0.08 - h, &flows)) / (2.0 * h);
        assert_relative_eq!(npv_derivative(0.08, &flows), numeric, max_relative = 1e-6);
    }

    #[test]
    fn test_npv_zero_rate_is_sum() {
        assert_eq!(npv(0.0, &[-100.0, 50.0, 60.0]), 10.0);
    }

    #[test]
    fn test_xirr_annual_dates() {
        let d = |y, m, day| NaiveDate::from_ymd_opt(y, m, day).unwrap();
        let dated = [(d(2020, 1, 1), -1000.0), (d(2021, 1, 1), 1100.0)];
        let result = compute_xirr(&dated, &IrrOptions::default());
        assert_eq!(result.status, IrrStatus::Converged);
        // 366 days / 365.25 is slightly more than one year
        let years = 366.0 / 365.25;
        assert_relative_eq!(result.rate.unwrap(), 1.1_f64.powf(1.0 / years) - 1.0, epsilon = 1e-9);
        assert!(xnpv(result.rate.unwrap(), &dated).abs() < 1e-6);
    }

    #[test]
    fn test_xirr_irregular_dates() {
        let d = |y, m, day| NaiveDate::from_ymd_opt(y, m, day).unwrap();
        let dated = [(d(2020, 1, 1), -1000.0), (d(2020, 7, 15), 300.0), (d(2021, 3, 2), 800.0)];

        assert_eq!(year_fractions(&dated), vec![0.0, 196.0 / 365.25, 426.0 / 365.25]);

        let result = compute_xirr(&dated, &IrrOptions::default());
        assert_eq!(result.status, IrrStatus::Converged);
        assert_eq!(result.method.as_deref(), Some(XIRR_LABEL));
        let rate = result.rate.unwrap();
        assert_relative_eq!(rate, 0.1009772, epsilon = 1e-6);
        assert!(xnpv(rate, &dated).abs() < 1e-6);
    }

    #[test]
    fn test_xirr_input_errors() {
        let d = NaiveDate::from_ymd_opt(2024, 6, 30).unwrap();
        let single = compute_xirr(&[(d, -10.0)], &IrrOptions::default());
        assert_eq!(single.status, IrrStatus::Error);

        let positive = compute_xirr(&[(d, 10.0), (d, 5.0)], &IrrOptions::default());
        assert_eq!(positive.status, IrrStatus::Error);
    }
}
