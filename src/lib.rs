//! Windfin - project-finance model for utility-scale wind assets
//!
//! This library provides:
//! - Annual generation, revenue, opex and tax projection
//! - Dual-currency debt scheduling (cash sweep and straight-line)
//! - Equity and project IRR, XIRR, NPV and DSCR metrics
//! - Seeded Monte Carlo scenarios evaluated in parallel
//! - Constrained capital-structure optimization

pub mod error;
pub mod parameters;
pub mod projection;
pub mod scenario;
pub mod optimization;
pub mod export;

// Re-export commonly used types
pub use error::{ModelError, ValidationError, WindfinResult};
pub use parameters::{CapitalStructure, DebtFacility, DebtStructure, FinancingTerms, ProjectParameters};
pub use projection::{FinancialModel, IrrResult, LedgerRow, ModelResult, ModelSummary};
pub use scenario::{MonteCarloConfig, ScenarioRunner};
pub use optimization::{CapitalStructureOptimizer, Objective, OptimizationConstraints, OptimizationResult};
