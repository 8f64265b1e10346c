//! Monte Carlo scenario runner
//!
//! Draws are sampled up front from one seeded generator, so a given seed
//! always yields the same scenario set, then evaluated in parallel. Each draw
//! builds its own parameters and debt structure; nothing is shared mutably.

use log::info;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{ModelError, WindfinResult};
use crate::parameters::{CapitalStructure, FinancingTerms, ProjectParameters};
use crate::projection::{FinancialModel, ModelConfig};

/// Closed range a field is sampled from uniformly
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UniformRange {
    pub low: f64,
    pub high: f64,
}

impl UniformRange {
    pub const fn new(low: f64, high: f64) -> Self {
        Self { low, high }
    }

    fn sample(&self, rng: &mut StdRng) -> f64 {
        if self.low == self.high {
            self.low
        } else {
            rng.gen_range(self.low..self.high)
        }
    }

    fn check(&self, field: &str) -> WindfinResult<()> {
        if !self.low.is_finite() || !self.high.is_finite() || self.low > self.high {
            return Err(ModelError::InvalidParameter {
                field: field.to_string(),
                reason: format!("invalid sampling range [{}, {}]", self.low, self.high),
            });
        }
        Ok(())
    }
}

/// Sampling configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonteCarloConfig {
    pub iterations: usize,
    /// `None` seeds from entropy
    pub seed: Option<u64>,
    pub usd_rate: UniformRange,
    pub lkr_rate: UniformRange,
    pub debt_ratio: UniformRange,
    pub fx_depreciation: UniformRange,
    pub capacity_factor: UniformRange,
    /// Fixed USD share of total debt
    pub usd_share: f64,
    /// Fixed concessional share of the USD tranche
    pub concessional_share: f64,
}

impl Default for MonteCarloConfig {
    fn default() -> Self {
        Self {
            iterations: 1000,
            seed: None,
            usd_rate: UniformRange::new(0.065, 0.09),
            lkr_rate: UniformRange::new(0.075, 0.09),
            debt_ratio: UniformRange::new(0.5, 0.8),
            fx_depreciation: UniformRange::new(0.03, 0.05),
            capacity_factor: UniformRange::new(0.38, 0.42),
            usd_share: 0.45,
            concessional_share: 0.10,
        }
    }
}

impl MonteCarloConfig {
    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    fn check(&self) -> WindfinResult<()> {
        self.usd_rate.check("usd_rate")?;
        self.lkr_rate.check("lkr_rate")?;
        self.debt_ratio.check("debt_ratio")?;
        self.fx_depreciation.check("fx_depreciation")?;
        self.capacity_factor.check("capacity_factor")?;
        for (field, share) in [("usd_share", self.usd_share), ("concessional_share", self.concessional_share)] {
            if !(0.0..=1.0).contains(&share) {
                return Err(ModelError::InvalidParameter {
                    field: field.to_string(),
                    reason: format!("{share} outside [0, 1]"),
                });
            }
        }
        Ok(())
    }
}

/// Sampled inputs for one draw
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScenarioDraw {
    pub iteration: usize,
    pub usd_rate: f64,
    pub lkr_rate: f64,
    pub debt_ratio: f64,
    pub fx_depreciation: f64,
    pub capacity_factor: f64,
}

/// One output row: sampled inputs and resulting metrics.
///
/// IRRs are empty when the solver did not converge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub iteration: usize,
    pub usd_rate: f64,
    pub lkr_rate: f64,
    pub debt_ratio: f64,
    pub fx_depreciation: f64,
    pub capacity_factor: f64,
    pub equity_irr: Option<f64>,
    pub project_irr: Option<f64>,
    pub npv: f64,
    pub min_dscr: f64,
}

/// Distribution of one output metric over valid draws
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricStatistics {
    pub valid: usize,
    pub mean: f64,
    pub p10: f64,
    pub p50: f64,
    pub p90: f64,
}

impl MetricStatistics {
    /// Non-finite values are excluded; all-NaN when nothing is left
    pub fn from_values<I: IntoIterator<Item = f64>>(values: I) -> Self {
        let mut sorted: Vec<f64> = values.into_iter().filter(|v| v.is_finite()).collect();
        sorted.sort_by(|a, b| a.total_cmp(b));
        let valid = sorted.len();
        let mean = if valid == 0 { f64::NAN } else { sorted.iter().sum::<f64>() / valid as f64 };
        Self {
            valid,
            mean,
            p10: percentile(&sorted, 0.10),
            p50: percentile(&sorted, 0.50),
            p90: percentile(&sorted, 0.90),
        }
    }
}

/// Linear-interpolated percentile of sorted data
fn percentile(sorted: &[f64], q: f64) -> f64 {
    match sorted.len() {
        0 => f64::NAN,
        1 => sorted[0],
        n => {
            let pos = q * (n - 1) as f64;
            let lower = pos.floor() as usize;
            let upper = pos.ceil() as usize;
            sorted[lower] + (sorted[upper] - sorted[lower]) * (pos - lower as f64)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioStatistics {
    pub equity_irr: MetricStatistics,
    pub project_irr: MetricStatistics,
    pub npv: MetricStatistics,
    pub min_dscr: MetricStatistics,
    /// Draws whose equity IRR did not converge
    pub failed_equity_irr: usize,
}

impl ScenarioStatistics {
    pub fn from_results(rows: &[ScenarioResult]) -> Self {
        Self {
            equity_irr: MetricStatistics::from_values(rows.iter().filter_map(|r| r.equity_irr)),
            project_irr: MetricStatistics::from_values(rows.iter().filter_map(|r| r.project_irr)),
            npv: MetricStatistics::from_values(rows.iter().map(|r| r.npv)),
            min_dscr: MetricStatistics::from_values(rows.iter().map(|r| r.min_dscr)),
            failed_equity_irr: rows.iter().filter(|r| r.equity_irr.is_none()).count(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonteCarloResult {
    /// One row per draw, in draw order
    pub rows: Vec<ScenarioResult>,
    pub statistics: ScenarioStatistics,
}

/// Scenario runner holding the base case every draw perturbs
#[derive(Debug, Clone)]
pub struct ScenarioRunner {
    base_params: ProjectParameters,
    terms: FinancingTerms,
    model_config: ModelConfig,
}

impl ScenarioRunner {
    /// Runner around the reference case
    pub fn new() -> Self {
        Self::with_base(ProjectParameters::default(), FinancingTerms::default())
    }

    pub fn with_base(base_params: ProjectParameters, terms: FinancingTerms) -> Self {
        Self {
            base_params,
            terms,
            model_config: ModelConfig::default(),
        }
    }

    pub fn with_model_config(mut self, model_config: ModelConfig) -> Self {
        self.model_config = model_config;
        self
    }

    pub fn base_params(&self) -> &ProjectParameters {
        &self.base_params
    }

    /// Sample every draw sequentially from one generator
    pub fn sample(&self, config: &MonteCarloConfig) -> WindfinResult<Vec<ScenarioDraw>> {
        config.check()?;
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Ok((0..config.iterations)
            .map(|i| ScenarioDraw {
                iteration: i + 1,
                usd_rate: config.usd_rate.sample(&mut rng),
                lkr_rate: config.lkr_rate.sample(&mut rng),
                debt_ratio: config.debt_ratio.sample(&mut rng),
                fx_depreciation: config.fx_depreciation.sample(&mut rng),
                capacity_factor: config.capacity_factor.sample(&mut rng),
            })
            .collect())
    }

    /// Run the full model for one draw
    pub fn evaluate(&self, draw: &ScenarioDraw, config: &MonteCarloConfig) -> ScenarioResult {
        let params = self
            .base_params
            .with_capacity_factor(draw.capacity_factor)
            .with_fx_depreciation(draw.fx_depreciation);
        let terms = self
            .terms
            .clone()
            .with_usd_market_rate(draw.usd_rate)
            .with_lkr_rate(draw.lkr_rate);
        let capital = CapitalStructure {
            debt_ratio: draw.debt_ratio,
            usd_share: config.usd_share,
            concessional_share: config.concessional_share,
        };
        let debt = terms.debt_structure(&params, &capital);

        let result = FinancialModel::with_config(params, debt, self.model_config.clone()).run();

        ScenarioResult {
            iteration: draw.iteration,
            usd_rate: draw.usd_rate,
            lkr_rate: draw.lkr_rate,
            debt_ratio: draw.debt_ratio,
            fx_depreciation: draw.fx_depreciation,
            capacity_factor: draw.capacity_factor,
            equity_irr: result.equity_irr.value(),
            project_irr: result.project_irr.value(),
            npv: result.npv,
            min_dscr: result.min_dscr(),
        }
    }

    /// Sample and evaluate every draw; rows come back in draw order
    pub fn run(&self, config: &MonteCarloConfig) -> WindfinResult<MonteCarloResult> {
        let draws = self.sample(config)?;
        info!("running {} Monte Carlo draws (seed {:?})", config.iterations, config.seed);

        let rows: Vec<ScenarioResult> = draws.par_iter().map(|draw| self.evaluate(draw, config)).collect();
        let statistics = ScenarioStatistics::from_results(&rows);

        info!(
            "Monte Carlo complete: median equity IRR {:.4}, {} draws without equity IRR",
            statistics.equity_irr.p50, statistics.failed_equity_irr
        );
        Ok(MonteCarloResult { rows, statistics })
    }
}

impl Default for ScenarioRunner {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(seed: u64, iterations: usize) -> MonteCarloConfig {
        MonteCarloConfig::default().with_seed(seed).with_iterations(iterations)
    }

    #[test]
    fn test_same_seed_same_draws() {
        let runner = ScenarioRunner::new();
        let a = runner.sample(&config(42, 50)).unwrap();
        let b = runner.sample(&config(42, 50)).unwrap();
        assert_eq!(a, b);

        let c = runner.sample(&config(43, 50)).unwrap();
        assert_ne!(a, c);
    }

    #[test]
    fn test_draws_within_ranges() {
        let cfg = config(7, 200);
        for draw in ScenarioRunner::new().sample(&cfg).unwrap() {
            assert!(draw.usd_rate >= 0.065 && draw.usd_rate < 0.09);
            assert!(draw.lkr_rate >= 0.075 && draw.lkr_rate < 0.09);
            assert!(draw.debt_ratio >= 0.5 && draw.debt_ratio < 0.8);
            assert!(draw.fx_depreciation >= 0.03 && draw.fx_depreciation < 0.05);
            assert!(draw.capacity_factor >= 0.38 && draw.capacity_factor < 0.42);
        }
    }

    #[test]
    fn test_run_preserves_draw_order_and_is_reproducible() {
        let runner = ScenarioRunner::new();
        let first = runner.run(&config(11, 40)).unwrap();
        let second = runner.run(&config(11, 40)).unwrap();

        assert_eq!(first.rows.len(), 40);
        for (i, row) in first.rows.iter().enumerate() {
            assert_eq!(row.iteration, i + 1);
        }
        assert_eq!(first.rows, second.rows);
    }

    #[test]
    fn test_scenarios_produce_metrics() {
        let result = ScenarioRunner::new().run(&config(3, 25)).unwrap();
        assert_eq!(result.statistics.failed_equity_irr, 0);
        assert_eq!(result.statistics.equity_irr.valid, 25);
        assert!(result.statistics.equity_irr.p10 <= result.statistics.equity_irr.p90);
        assert!(result.rows.iter().all(|r| r.min_dscr > 0.0));
    }

    #[test]
    fn test_degenerate_range_is_fixed_value() {
        let mut cfg = config(1, 5);
        cfg.capacity_factor = UniformRange::new(0.40, 0.40);
        assert!(ScenarioRunner::new().sample(&cfg).unwrap().iter().all(|d| d.capacity_factor == 0.40));
    }

    #[test]
    fn test_invalid_range_rejected() {
        let mut cfg = config(1, 5);
        cfg.debt_ratio = UniformRange::new(0.9, 0.5);
        assert!(ScenarioRunner::new().run(&cfg).is_err());
        assert!(ScenarioRunner::new().sample(&cfg).is_err());
    }

    #[test]
    fn test_percentile_interpolates() {
        let stats = MetricStatistics::from_values([1.0, 2.0, 3.0, 4.0, 5.0, f64::NAN]);
        assert_eq!(stats.valid, 5);
        assert_eq!(stats.mean, 3.0);
        assert_eq!(stats.p50, 3.0);
        assert!((stats.p10 - 1.4).abs() < 1e-12);
        assert!((stats.p90 - 4.6).abs() < 1e-12);
    }
}
