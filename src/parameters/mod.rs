//! Project assumptions, debt facilities and their validation

mod project;
mod financing;
pub mod loader;
pub mod validation;

pub use project::{
    ParameterOverrides, ProjectParameters, HOURS_PER_YEAR, KWH_PER_MWH, UNITS_PER_MILLION,
};
pub use financing::{
    AmortizationPolicy, CapitalStructure, Currency, DebtFacility, DebtStructure, FinancingTerms,
    SweepBand,
};
pub use loader::{load_overrides, load_parameters};
pub use validation::{validate_and_warn, validate_debt_structure, validate_project_parameters};
