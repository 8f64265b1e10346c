//! Windfin CLI
//!
//! Runs the wind project-finance model, standalone IRR solves, Monte Carlo
//! scenarios and the capital-structure optimizer.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use log::warn;

use windfin::export::{to_json, write_ledger_csv, write_scenarios_csv};
use windfin::parameters::{load_parameters, validate_debt_structure};
use windfin::projection::{compute_irr, compute_xirr, IrrOptions, SolverMethod};
use windfin::{
    CapitalStructure, CapitalStructureOptimizer, DebtStructure, FinancialModel, FinancingTerms,
    MonteCarloConfig, Objective, OptimizationConstraints, ProjectParameters, ScenarioRunner,
};

/// Project-finance model for utility-scale wind assets
#[derive(Parser)]
#[command(name = "windfin", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Parameter overrides (`parameter,value` CSV)
    #[arg(long, global = true)]
    params: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the annual model and report headline metrics
    Model {
        /// Total debt as a share of capex (derives the debt from financing terms)
        #[arg(long)]
        debt_ratio: Option<f64>,
        /// USD share of total debt
        #[arg(long, default_value_t = 0.45)]
        usd_share: f64,
        /// Concessional share of the USD tranche
        #[arg(long, default_value_t = 0.10)]
        concessional_share: f64,
        /// Write the annual ledger to this CSV file
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Solve the IRR of a cash flow series
    Irr {
        /// Cash flows, first at t=0
        #[arg(required = true, allow_hyphen_values = true, num_args = 1..)]
        flows: Vec<f64>,
        /// One YYYY-MM-DD date per flow (switches to XIRR)
        #[arg(long, value_delimiter = ',')]
        dates: Vec<String>,
        #[arg(long, value_enum, default_value_t = Method::Both)]
        method: Method,
    },
    /// Run seeded Monte Carlo scenarios
    MonteCarlo {
        #[arg(long, default_value_t = 1000)]
        iterations: usize,
        #[arg(long)]
        seed: Option<u64>,
        /// Write one row per draw to this CSV file
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Optimize the capital structure
    Optimize {
        #[arg(long, value_enum, default_value_t = ObjectiveArg::EquityIrr)]
        objective: ObjectiveArg,
        #[arg(long, default_value_t = 0.15)]
        min_irr: f64,
        #[arg(long, default_value_t = 1.3)]
        min_dscr: f64,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Method {
    Bracketing,
    Newton,
    Both,
}

impl From<Method> for SolverMethod {
    fn from(method: Method) -> Self {
        match method {
            Method::Bracketing => SolverMethod::Bracketing,
            Method::Newton => SolverMethod::Newton,
            Method::Both => SolverMethod::Both,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ObjectiveArg {
    EquityIrr,
    ProjectIrr,
    Npv,
}

impl From<ObjectiveArg> for Objective {
    fn from(arg: ObjectiveArg) -> Self {
        match arg {
            ObjectiveArg::EquityIrr => Objective::EquityIrr,
            ObjectiveArg::ProjectIrr => Objective::ProjectIrr,
            ObjectiveArg::Npv => Objective::Npv,
        }
    }
}

fn load_params(path: Option<&PathBuf>) -> Result<ProjectParameters> {
    match path {
        Some(path) => load_parameters(path)
            .with_context(|| format!("loading parameters from {}", path.display())),
        None => Ok(ProjectParameters::default().validated()?),
    }
}

fn pct(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{:.2}%", v * 100.0))
}

fn run_model(
    params: ProjectParameters,
    capital: Option<CapitalStructure>,
    output: Option<PathBuf>,
    json: bool,
) -> Result<()> {
    let debt = match capital {
        Some(capital) => FinancingTerms::default().debt_structure(&params, &capital),
        None => DebtStructure::default(),
    };
    let (valid, findings) = validate_debt_structure(&debt.to_field_map(params.fx_initial));
    if !valid {
        for finding in &findings {
            warn!("{finding}");
        }
    }

    let result = FinancialModel::new(params, debt).run();
    if let Some(path) = output {
        write_ledger_csv(&path, &result.rows)
            .with_context(|| format!("writing ledger to {}", path.display()))?;
    }

    let summary = result.summary();
    if json {
        println!("{}", to_json(&summary)?);
        return Ok(());
    }

    println!("Wind project-finance model ({} years)", summary.years);
    println!("{}", "-".repeat(48));
    println!("{:<28} {:>18.2}", "Equity investment (USD M)", result.equity_investment);
    println!("{:<28} {:>18}", "Equity IRR", pct(summary.equity_irr));
    println!("{:<28} {:>18}", "Project IRR", pct(summary.project_irr));
    println!("{:<28} {:>18.2}", format!("NPV @ {:.0}% (USD M)", result.discount_rate * 100.0), summary.npv);
    println!("{:<28} {:>18.3}", "Minimum DSCR", summary.min_dscr);
    println!("{:<28} {:>18.2}", "Total revenue (USD M)", summary.total_revenue);
    println!("{:<28} {:>18.2}", "Total debt service (USD M)", summary.total_debt_service);
    if summary.unpaid_debt_flag {
        println!("WARNING: more than 10% of a facility remains unpaid at horizon end");
    }
    if let Some(message) = result.equity_irr.warning.as_deref() {
        println!("Note: {message}");
    }
    Ok(())
}

fn run_irr(flows: Vec<f64>, dates: Vec<String>, method: Method, json: bool) -> Result<()> {
    let options = IrrOptions { method: method.into(), ..Default::default() };

    let result = if dates.is_empty() {
        compute_irr(&flows, &options)
    } else {
        if dates.len() != flows.len() {
            bail!("{} dates given for {} cash flows", dates.len(), flows.len());
        }
        let dated = dates
            .iter()
            .zip(&flows)
            .map(|(d, cf)| {
                NaiveDate::parse_from_str(d, "%Y-%m-%d")
                    .map(|date| (date, *cf))
                    .with_context(|| format!("invalid date {d}"))
            })
            .collect::<Result<Vec<_>>>()?;
        compute_xirr(&dated, &options)
    };

    if json {
        println!("{}", to_json(&result)?);
    } else {
        match result.rate {
            Some(rate) if result.is_converged() => println!(
                "IRR: {:.6}% ({}, {} iterations, NPV check {:.2e})",
                rate * 100.0,
                result.method.as_deref().unwrap_or("-"),
                result.iterations,
                result.npv_check.unwrap_or(f64::NAN)
            ),
            _ => println!("IRR not computed: {}", result.message.as_deref().unwrap_or("unknown failure")),
        }
        if let Some(warning) = &result.warning {
            println!("Warning: {warning}");
        }
    }
    Ok(())
}

fn run_monte_carlo(
    params: ProjectParameters,
    iterations: usize,
    seed: Option<u64>,
    output: Option<PathBuf>,
    json: bool,
) -> Result<()> {
    let config = MonteCarloConfig { iterations, seed, ..Default::default() };
    let result = ScenarioRunner::with_base(params, FinancingTerms::default()).run(&config)?;

    if let Some(path) = output {
        write_scenarios_csv(&path, &result.rows)
            .with_context(|| format!("writing scenarios to {}", path.display()))?;
    }

    let stats = &result.statistics;
    if json {
        println!("{}", to_json(stats)?);
        return Ok(());
    }

    println!("Monte Carlo: {} draws", result.rows.len());
    println!("{:<14} {:>10} {:>10} {:>10} {:>10}", "Metric", "Mean", "P10", "P50", "P90");
    for (name, m) in [
        ("Equity IRR", &stats.equity_irr),
        ("Project IRR", &stats.project_irr),
        ("NPV (USD M)", &stats.npv),
        ("Min DSCR", &stats.min_dscr),
    ] {
        println!("{:<14} {:>10.4} {:>10.4} {:>10.4} {:>10.4}", name, m.mean, m.p10, m.p50, m.p90);
    }
    if stats.failed_equity_irr > 0 {
        println!("{} draws without an equity IRR", stats.failed_equity_irr);
    }
    Ok(())
}

fn run_optimize(params: ProjectParameters, objective: ObjectiveArg, min_irr: f64, min_dscr: f64, json: bool) -> Result<()> {
    let constraints = OptimizationConstraints { min_irr, min_dscr };
    let result = CapitalStructureOptimizer::new(objective.into(), constraints)
        .with_base(params, FinancingTerms::default())
        .optimize()?;

    if json {
        println!("{}", to_json(&result)?);
        return Ok(());
    }

    println!("Capital structure optimization ({})", result.objective);
    println!("{}", "-".repeat(48));
    println!("{:<28} {:>18.4}", "Debt ratio", result.capital.debt_ratio);
    println!("{:<28} {:>18.4}", "USD share of debt", result.capital.usd_share);
    println!("{:<28} {:>18.4}", "Concessional share of USD", result.capital.concessional_share);
    println!("{:<28} {:>18}", "Equity IRR", pct(result.metrics.equity_irr));
    println!("{:<28} {:>18}", "Project IRR", pct(result.metrics.project_irr));
    println!("{:<28} {:>18.2}", "NPV (USD M)", result.metrics.npv);
    println!("{:<28} {:>18.3}", "Minimum DSCR", result.metrics.min_dscr);
    println!("{:<28} {:>18}", "Converged", result.convergence);
    println!("{:<28} {:>18.4}", "IRR violation", result.violations.irr_violation);
    println!("{:<28} {:>18.4}", "DSCR violation", result.violations.dscr_violation);
    println!("{}", result.message);
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Model { debt_ratio, usd_share, concessional_share, output } => {
            let params = load_params(cli.params.as_ref())?;
            let capital = debt_ratio.map(|debt_ratio| CapitalStructure { debt_ratio, usd_share, concessional_share });
            run_model(params, capital, output, cli.json)
        }
        Commands::Irr { flows, dates, method } => run_irr(flows, dates, method, cli.json),
        Commands::MonteCarlo { iterations, seed, output } => {
            let params = load_params(cli.params.as_ref())?;
            run_monte_carlo(params, iterations, seed, output, cli.json)
        }
        Commands::Optimize { objective, min_irr, min_dscr } => {
            let params = load_params(cli.params.as_ref())?;
            run_optimize(params, objective, min_irr, min_dscr, cli.json)
        }
    }
}
