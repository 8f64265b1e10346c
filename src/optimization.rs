//! Capital-structure optimizer
//!
//! Searches debt ratio, USD share of debt and concessional share of the USD
//! tranche for the best return metric subject to minimum equity IRR and
//! minimum DSCR. Every trial re-runs the full model.
//!
//! Trials are ranked feasibility first. Infeasible trials are ordered by
//! total constraint shortfall and feasible ones by the objective. The feasible set is
//! a thin, non-convex slice of the box, so the search is seeded from the best
//! points of a coarse lattice and a box-bounded Nelder-Mead simplex is run
//! from each.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::error::{ModelError, WindfinResult};
use crate::parameters::{CapitalStructure, FinancingTerms, ProjectParameters};
use crate::projection::{FinancialModel, ModelConfig};

/// Objective value assigned to a trial whose model run failed
pub const FAILED_OBJECTIVE: f64 = 1e10;

/// Constraint slack assigned to a trial whose model run failed
pub const FAILED_CONSTRAINT: f64 = -1e10;

/// Violations at or below this are treated as satisfied
pub const VIOLATION_TOLERANCE: f64 = 1e-4;

/// Metric to maximize
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Objective {
    EquityIrr,
    ProjectIrr,
    Npv,
}

impl Objective {
    pub fn as_str(&self) -> &'static str {
        match self {
            Objective::EquityIrr => "equity_irr",
            Objective::ProjectIrr => "project_irr",
            Objective::Npv => "npv",
        }
    }
}

impl fmt::Display for Objective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Objective {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "equity_irr" => Ok(Objective::EquityIrr),
            "project_irr" => Ok(Objective::ProjectIrr),
            "npv" => Ok(Objective::Npv),
            _ => Err(ModelError::Parse {
                field: "objective".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OptimizationConstraints {
    /// Minimum equity IRR
    pub min_irr: f64,
    /// Minimum DSCR over the horizon
    pub min_dscr: f64,
}

impl Default for OptimizationConstraints {
    fn default() -> Self {
        Self { min_irr: 0.15, min_dscr: 1.3 }
    }
}

/// Point in decision space: `[debt_ratio, usd_share, concessional_share]`
type Point = [f64; 3];

/// Box bounds on the decision variables
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VariableBounds {
    pub lower: CapitalStructure,
    pub upper: CapitalStructure,
}

impl Default for VariableBounds {
    fn default() -> Self {
        Self {
            lower: CapitalStructure { debt_ratio: 0.50, usd_share: 0.0, concessional_share: 0.0 },
            upper: CapitalStructure { debt_ratio: 0.80, usd_share: 1.0, concessional_share: 0.20 },
        }
    }
}

impl VariableBounds {
    fn clamp(&self, x: Point) -> Point {
        let (lower, upper) = (self.lower.to_array(), self.upper.to_array());
        std::array::from_fn(|d| x[d].clamp(lower[d], upper[d]))
    }

    /// Evenly spaced grid with `points` values per variable, bounds included
    pub fn lattice(&self, points: usize) -> Vec<CapitalStructure> {
        let (lower, upper) = (self.lower.to_array(), self.upper.to_array());
        let points = points.max(2);
        let axis = |d: usize| -> Vec<f64> {
            (0..points)
                .map(|k| lower[d] + (upper[d] - lower[d]) * k as f64 / (points - 1) as f64)
                .collect()
        };
        let (ratios, usd_shares, concessional_shares) = (axis(0), axis(1), axis(2));

        let mut grid = Vec::with_capacity(points.pow(3));
        for &debt_ratio in &ratios {
            for &usd_share in &usd_shares {
                for &concessional_share in &concessional_shares {
                    grid.push(CapitalStructure { debt_ratio, usd_share, concessional_share });
                }
            }
        }
        grid
    }

    fn check(&self) -> WindfinResult<()> {
        for (lo, hi) in self.lower.to_array().into_iter().zip(self.upper.to_array()) {
            if !lo.is_finite() || !hi.is_finite() || lo > hi {
                return Err(ModelError::InvalidParameter {
                    field: "bounds".to_string(),
                    reason: format!("lower bound {lo} exceeds upper bound {hi}"),
                });
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OptimizerOptions {
    pub bounds: VariableBounds,
    pub initial: CapitalStructure,
    /// Iteration cap for each simplex run
    pub max_iterations: usize,
    /// Simplex spread and size tolerance
    pub tolerance: f64,
    /// Initial simplex step as a fraction of each bound width
    pub initial_step: f64,
    /// Lattice values per variable used to seed the search
    pub lattice_points: usize,
    /// Number of best-ranked seeds a simplex is started from
    pub starts: usize,
}

impl Default for OptimizerOptions {
    fn default() -> Self {
        Self {
            bounds: VariableBounds::default(),
            initial: CapitalStructure::default(),
            max_iterations: 150,
            tolerance: 1e-4,
            initial_step: 0.10,
            lattice_points: 5,
            starts: 3,
        }
    }
}

/// Metrics from one full model run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OptimizedMetrics {
    pub equity_irr: Option<f64>,
    pub project_irr: Option<f64>,
    pub npv: f64,
    pub min_dscr: f64,
}

/// Post-hoc shortfalls at the reported point, zero when satisfied
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConstraintViolations {
    pub irr_violation: f64,
    pub dscr_violation: f64,
}

impl ConstraintViolations {
    pub fn is_satisfied(&self) -> bool {
        self.irr_violation <= VIOLATION_TOLERANCE && self.dscr_violation <= VIOLATION_TOLERANCE
    }
}

/// Objective and constraint slacks at a trial point.
///
/// Slack is metric minus threshold; negative means infeasible.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrialEvaluation {
    /// Negated target metric (minimized)
    pub objective: f64,
    pub irr_slack: f64,
    pub dscr_slack: f64,
    pub metrics: OptimizedMetrics,
}

impl TrialEvaluation {
    pub fn score(&self) -> TrialScore {
        TrialScore {
            violation: (-self.irr_slack).max(0.0) + (-self.dscr_slack).max(0.0),
            objective: self.objective,
        }
    }
}

/// Search ranking of a trial
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrialScore {
    /// Total constraint shortfall, zero when feasible
    pub violation: f64,
    /// Negated target metric
    pub objective: f64,
}

impl TrialScore {
    pub fn is_feasible(&self) -> bool {
        self.violation <= 0.0
    }

    /// `Less` ranks first. Shortfall decides unless both trials are feasible.
    pub fn rank(&self, other: &Self) -> Ordering {
        if !self.is_feasible() || !other.is_feasible() {
            match self.violation.total_cmp(&other.violation) {
                Ordering::Equal => {}
                ord => return ord,
            }
        }
        self.objective.total_cmp(&other.objective)
    }

    fn beats(&self, other: &Self) -> bool {
        self.rank(other) == Ordering::Less
    }

    /// Distance between two scores on the measure that ranks them
    fn spread(&self, other: &Self) -> f64 {
        match (self.is_feasible(), other.is_feasible()) {
            (true, true) => (self.objective - other.objective).abs(),
            (false, false) => (self.violation - other.violation).abs(),
            _ => f64::INFINITY,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizationResult {
    pub objective: Objective,
    pub capital: CapitalStructure,
    pub metrics: OptimizedMetrics,
    /// Simplex converged and both constraints hold
    pub convergence: bool,
    pub message: String,
    pub violations: ConstraintViolations,
    /// Simplex iterations summed over all starts
    pub iterations: usize,
    /// Full model runs, including seeding and the final re-evaluation
    pub evaluations: usize,
}

/// Why the simplex search stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Termination {
    Converged,
    MaxIterations,
}

struct SimplexOutcome {
    x: Point,
    score: TrialScore,
    iterations: usize,
    evaluations: usize,
    termination: Termination,
}

const REFLECTION: f64 = 1.0;
const EXPANSION: f64 = 2.0;
const CONTRACTION: f64 = 0.5;
const SHRINK: f64 = 0.5;

/// Box-bounded Nelder-Mead on ranked scores; every trial point is clamped
fn nelder_mead<F>(initial: Point, bounds: &VariableBounds, options: &OptimizerOptions, mut f: F) -> SimplexOutcome
where
    F: FnMut(&Point) -> TrialScore,
{
    const DIM: usize = 3;
    let lower = bounds.lower.to_array();
    let upper = bounds.upper.to_array();
    let mut evaluations = 0usize;
    let mut eval = |x: &Point| {
        evaluations += 1;
        f(x)
    };

    let x0 = bounds.clamp(initial);
    let mut simplex = vec![x0];
    let mut scores = vec![eval(&x0)];

    for d in 0..DIM {
        let mut x = x0;
        let step = (upper[d] - lower[d]).abs() * options.initial_step.max(1e-4);
        x[d] = (x[d] + step).min(upper[d]);
        if (x[d] - x0[d]).abs() < 1e-14 {
            x[d] = (x[d] - step).max(lower[d]);
        }
        scores.push(eval(&x));
        simplex.push(x);
    }

    let mut iterations = 0;
    let mut termination = Termination::MaxIterations;

    while iterations < options.max_iterations {
        iterations += 1;

        let mut order: Vec<usize> = (0..=DIM).collect();
        order.sort_by(|&i, &j| scores[i].rank(&scores[j]));
        simplex = order.iter().map(|&i| simplex[i]).collect();
        scores = order.iter().map(|&i| scores[i]).collect();

        let centroid: Point =
            std::array::from_fn(|d| simplex[..DIM].iter().map(|x| x[d]).sum::<f64>() / DIM as f64);

        let spread = scores[0].spread(&scores[DIM]);
        let size = simplex
            .iter()
            .map(|x| x.iter().zip(&centroid).map(|(a, c)| (a - c).powi(2)).sum::<f64>().sqrt())
            .fold(0.0_f64, f64::max);
        if spread <= options.tolerance && size <= options.tolerance {
            termination = Termination::Converged;
            break;
        }

        let toward = |coef: f64, from: &Point| -> Point {
            bounds.clamp(std::array::from_fn(|d| centroid[d] + coef * (from[d] - centroid[d])))
        };

        let xr = toward(-REFLECTION, &simplex[DIM]);
        let fr = eval(&xr);

        if fr.beats(&scores[0]) {
            let xe = toward(EXPANSION, &xr);
            let fe = eval(&xe);
            if fe.beats(&fr) {
                simplex[DIM] = xe;
                scores[DIM] = fe;
            } else {
                simplex[DIM] = xr;
                scores[DIM] = fr;
            }
            continue;
        }

        if fr.beats(&scores[DIM - 1]) {
            simplex[DIM] = xr;
            scores[DIM] = fr;
            continue;
        }

        let xc = toward(CONTRACTION, &simplex[DIM]);
        let fc = eval(&xc);
        if fc.beats(&scores[DIM]) {
            simplex[DIM] = xc;
            scores[DIM] = fc;
            continue;
        }

        let best = simplex[0];
        for i in 1..=DIM {
            let shrunk: Point = std::array::from_fn(|d| best[d] + SHRINK * (simplex[i][d] - best[d]));
            scores[i] = eval(&shrunk);
            simplex[i] = shrunk;
        }
    }

    let best = (0..=DIM)
        .min_by(|&i, &j| scores[i].rank(&scores[j]))
        .unwrap_or(0);

    SimplexOutcome {
        x: simplex[best],
        score: scores[best],
        iterations,
        evaluations,
        termination,
    }
}

/// Optimizer over one base case and set of lender terms
#[derive(Debug, Clone)]
pub struct CapitalStructureOptimizer {
    params: ProjectParameters,
    terms: FinancingTerms,
    model_config: ModelConfig,
    objective: Objective,
    constraints: OptimizationConstraints,
    options: OptimizerOptions,
}

impl CapitalStructureOptimizer {
    pub fn new(objective: Objective, constraints: OptimizationConstraints) -> Self {
        Self {
            params: ProjectParameters::default(),
            terms: FinancingTerms::default(),
            model_config: ModelConfig::default(),
            objective,
            constraints,
            options: OptimizerOptions::default(),
        }
    }

    pub fn with_base(mut self, params: ProjectParameters, terms: FinancingTerms) -> Self {
        self.params = params;
        self.terms = terms;
        self
    }

    pub fn with_options(mut self, options: OptimizerOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_model_config(mut self, model_config: ModelConfig) -> Self {
        self.model_config = model_config;
        self
    }

    /// Run the full model at a capital structure
    pub fn metrics(&self, capital: &CapitalStructure) -> OptimizedMetrics {
        let debt = self.terms.debt_structure(&self.params, capital);
        let result = FinancialModel::with_config(self.params, debt, self.model_config.clone()).run();
        OptimizedMetrics {
            equity_irr: result.equity_irr.value(),
            project_irr: result.project_irr.value(),
            npv: result.npv,
            min_dscr: result.min_dscr(),
        }
    }

    /// Objective and constraint slacks; failed metrics map to the sentinels
    pub fn evaluate(&self, capital: &CapitalStructure) -> TrialEvaluation {
        let metrics = self.metrics(capital);

        let target = match self.objective {
            Objective::EquityIrr => metrics.equity_irr,
            Objective::ProjectIrr => metrics.project_irr,
            Objective::Npv => Some(metrics.npv),
        };
        let objective = match target {
            Some(value) if value.is_finite() => -value,
            _ => FAILED_OBJECTIVE,
        };
        let irr_slack = match metrics.equity_irr {
            Some(irr) if irr.is_finite() => irr - self.constraints.min_irr,
            _ => FAILED_CONSTRAINT,
        };
        let dscr_slack = if metrics.min_dscr.is_finite() {
            metrics.min_dscr - self.constraints.min_dscr
        } else {
            FAILED_CONSTRAINT
        };

        TrialEvaluation { objective, irr_slack, dscr_slack, metrics }
    }

    pub fn score(&self, capital: &CapitalStructure) -> TrialScore {
        self.evaluate(capital).score()
    }

    /// Best-ranked seeds: the initial point and the lattice, ranked together
    fn seeds(&self) -> (Vec<Point>, usize) {
        let mut candidates = vec![self.options.bounds.clamp(self.options.initial.to_array())];
        candidates.extend(
            self.options
                .bounds
                .lattice(self.options.lattice_points)
                .iter()
                .map(CapitalStructure::to_array),
        );
        let scores: Vec<TrialScore> = candidates
            .iter()
            .map(|x| self.score(&CapitalStructure::from_array(*x)))
            .collect();

        let mut order: Vec<usize> = (0..candidates.len()).collect();
        order.sort_by(|&i, &j| scores[i].rank(&scores[j]));
        let seeds = order
            .into_iter()
            .take(self.options.starts.max(1))
            .map(|i| candidates[i])
            .collect();
        (seeds, candidates.len())
    }

    pub fn optimize(&self) -> WindfinResult<OptimizationResult> {
        self.options.bounds.check()?;
        info!(
            "optimizing {} subject to equity IRR >= {} and min DSCR >= {}",
            self.objective, self.constraints.min_irr, self.constraints.min_dscr
        );

        let (seeds, mut evaluations) = self.seeds();
        let mut iterations = 0;
        let mut best: Option<SimplexOutcome> = None;

        for seed in seeds {
            let outcome = nelder_mead(seed, &self.options.bounds, &self.options, |x| {
                self.score(&CapitalStructure::from_array(*x))
            });
            debug!(
                "simplex from {seed:?} stopped at {:?} after {} iterations ({:?})",
                outcome.x, outcome.iterations, outcome.termination
            );
            iterations += outcome.iterations;
            evaluations += outcome.evaluations;
            if best.as_ref().map_or(true, |b| outcome.score.beats(&b.score)) {
                best = Some(outcome);
            }
        }

        let (x, termination) = match best {
            Some(outcome) => (outcome.x, outcome.termination),
            None => (self.options.bounds.clamp(self.options.initial.to_array()), Termination::MaxIterations),
        };

        let capital = CapitalStructure::from_array(x);
        let metrics = self.metrics(&capital);
        evaluations += 1;
        let violations = ConstraintViolations {
            irr_violation: match metrics.equity_irr {
                Some(irr) => (self.constraints.min_irr - irr).max(0.0),
                None => -FAILED_CONSTRAINT,
            },
            dscr_violation: if metrics.min_dscr.is_finite() {
                (self.constraints.min_dscr - metrics.min_dscr).max(0.0)
            } else {
                -FAILED_CONSTRAINT
            },
        };

        let simplex_converged = termination == Termination::Converged;
        let convergence = simplex_converged && violations.is_satisfied();
        let message = match (simplex_converged, violations.is_satisfied()) {
            (true, true) => "Optimization terminated successfully".to_string(),
            (true, false) => "Converged to a point that violates the constraints".to_string(),
            (false, _) => format!("Iteration limit reached after {iterations} iterations"),
        };

        if !convergence {
            warn!("optimization did not converge: {message}");
        }
        if violations.irr_violation > VIOLATION_TOLERANCE {
            warn!("solution violates IRR constraint by {:.4}", violations.irr_violation);
        }
        if violations.dscr_violation > VIOLATION_TOLERANCE {
            warn!("solution violates DSCR constraint by {:.4}", violations.dscr_violation);
        }
        info!(
            "optimizer finished after {} iterations and {} model runs: debt ratio {:.4}, USD share {:.4}, concessional share {:.4}",
            iterations, evaluations, capital.debt_ratio, capital.usd_share, capital.concessional_share
        );

        Ok(OptimizationResult {
            objective: self.objective,
            capital,
            metrics,
            convergence,
            message,
            violations,
            iterations,
            evaluations,
        })
    }
}

/// Optimize the reference case
pub fn optimize_capital_structure(
    objective: Objective,
    constraints: OptimizationConstraints,
) -> WindfinResult<OptimizationResult> {
    CapitalStructureOptimizer::new(objective, constraints).optimize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn within_bounds(capital: &CapitalStructure, bounds: &VariableBounds) -> bool {
        let (lower, upper) = (bounds.lower.to_array(), bounds.upper.to_array());
        capital
            .to_array()
            .iter()
            .enumerate()
            .all(|(d, v)| *v >= lower[d] && *v <= upper[d])
    }

    fn feasible(objective: f64) -> TrialScore {
        TrialScore { violation: 0.0, objective }
    }

    /// All-LKR debt at the maximum ratio; meets the default constraints
    fn all_lkr_structure() -> CapitalStructure {
        CapitalStructure::from_array([0.8, 0.0, 0.0])
    }

    #[test]
    fn test_objective_parse() {
        assert_eq!("equity_irr".parse::<Objective>().unwrap(), Objective::EquityIrr);
        assert_eq!("project-irr".parse::<Objective>().unwrap(), Objective::ProjectIrr);
        assert_eq!("NPV".parse::<Objective>().unwrap(), Objective::Npv);
        assert!("irr".parse::<Objective>().is_err());
    }

    #[test]
    fn test_feasible_always_ranks_first() {
        let good_but_infeasible = TrialScore { violation: 1e-3, objective: -100.0 };
        let poor_but_feasible = feasible(5.0);
        assert!(poor_but_feasible.beats(&good_but_infeasible));

        let closer = TrialScore { violation: 0.01, objective: 3.0 };
        let further = TrialScore { violation: 0.20, objective: -3.0 };
        assert!(closer.beats(&further));

        assert!(feasible(-2.0).beats(&feasible(-1.0)));
        assert_eq!(feasible(1.0).rank(&feasible(1.0)), Ordering::Equal);
    }

    #[test]
    fn test_failed_trial_is_heavily_infeasible() {
        let trial = TrialEvaluation {
            objective: FAILED_OBJECTIVE,
            irr_slack: FAILED_CONSTRAINT,
            dscr_slack: 0.2,
            metrics: OptimizedMetrics { equity_irr: None, project_irr: None, npv: 0.0, min_dscr: 1.5 },
        };
        let score = trial.score();
        assert_eq!(score.violation, 1e10);
        assert!(TrialScore { violation: 5.0, objective: 0.0 }.beats(&score));
    }

    #[test]
    fn test_lattice_spans_bounds() {
        let bounds = VariableBounds::default();
        let grid = bounds.lattice(5);
        assert_eq!(grid.len(), 125);
        assert_eq!(grid[0], bounds.lower);
        assert_eq!(grid[124], bounds.upper);
        assert!(grid.iter().all(|c| within_bounds(c, &bounds)));
    }

    #[test]
    fn test_nelder_mead_bounded_quadratic() {
        let bounds = VariableBounds::default();
        let options = OptimizerOptions { max_iterations: 2000, tolerance: 1e-6, ..Default::default() };
        let outcome = nelder_mead([0.8, 0.45, 0.10], &bounds, &options, |x| {
            feasible((x[0] - 0.6).powi(2) + (x[1] - 0.3).powi(2) + (x[2] - 0.5).powi(2))
        });
        assert_eq!(outcome.termination, Termination::Converged);
        assert!((outcome.x[0] - 0.6).abs() < 1e-3);
        assert!((outcome.x[1] - 0.3).abs() < 1e-3);
        // Unconstrained optimum lies outside the box
        assert!((outcome.x[2] - 0.20).abs() < 1e-3);
    }

    #[test]
    fn test_evaluate_reports_slacks() {
        let optimizer = CapitalStructureOptimizer::new(Objective::EquityIrr, OptimizationConstraints::default());
        let trial = optimizer.evaluate(&CapitalStructure::default());
        let irr = trial.metrics.equity_irr.unwrap();
        assert_eq!(trial.objective, -irr);
        assert!((trial.irr_slack - (irr - 0.15)).abs() < 1e-12);
        assert!((trial.dscr_slack - (trial.metrics.min_dscr - 1.3)).abs() < 1e-12);
        // Reference structure misses the DSCR floor
        assert!(!trial.score().is_feasible());
    }

    #[test]
    fn test_npv_objective() {
        let optimizer = CapitalStructureOptimizer::new(Objective::Npv, OptimizationConstraints::default());
        let trial = optimizer.evaluate(&CapitalStructure::default());
        assert_eq!(trial.objective, -trial.metrics.npv);
    }

    #[test]
    fn test_default_optimization_is_feasible_and_converged() {
        let optimizer = CapitalStructureOptimizer::new(Objective::EquityIrr, OptimizationConstraints::default());
        assert!(optimizer.score(&all_lkr_structure()).is_feasible());
        let known = optimizer.metrics(&all_lkr_structure()).equity_irr.unwrap();

        let result = optimizer.optimize().unwrap();

        assert!(result.convergence, "{}", result.message);
        assert!(result.violations.is_satisfied());
        assert_eq!(result.violations.irr_violation, 0.0);
        assert_eq!(result.violations.dscr_violation, 0.0);
        assert!(within_bounds(&result.capital, &VariableBounds::default()));
        assert!(result.metrics.equity_irr.unwrap() >= known - 1e-6);
        assert!(result.metrics.min_dscr >= 1.3);
    }

    #[test]
    fn test_npv_optimization_respects_dscr_floor() {
        let optimizer = CapitalStructureOptimizer::new(Objective::Npv, OptimizationConstraints::default());
        let known = optimizer.metrics(&all_lkr_structure()).npv;

        let result = optimizer.optimize().unwrap();

        assert!(result.convergence, "{}", result.message);
        assert_eq!(result.violations.dscr_violation, 0.0);
        assert!(result.metrics.npv >= known - 1e-6);
        assert_relative_eq!(result.capital.debt_ratio, 0.8, epsilon = 1e-3);
    }

    #[test]
    fn test_unreachable_constraints_surface_violations() {
        let constraints = OptimizationConstraints { min_irr: 0.50, min_dscr: 3.0 };
        let result = optimize_capital_structure(Objective::EquityIrr, constraints).unwrap();

        assert!(!result.convergence);
        assert!(result.violations.dscr_violation > 0.0);
        assert!(!result.message.is_empty());
    }

    #[test]
    fn test_invalid_bounds_rejected() {
        let mut options = OptimizerOptions::default();
        options.bounds.lower.debt_ratio = 0.9;
        let optimizer = CapitalStructureOptimizer::new(Objective::EquityIrr, OptimizationConstraints::default())
            .with_options(options);
        assert!(optimizer.optimize().is_err());
    }
}
