//! CSV-based parameter override loader
//!
//! Reads `parameter,value` rows; every name must be a known field.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::{ModelError, WindfinResult};
use super::project::{ParameterOverrides, ProjectParameters};

/// Load overrides from a CSV file with a `parameter,value` header
pub fn load_overrides<P: AsRef<Path>>(path: P) -> WindfinResult<ParameterOverrides> {
    let file = File::open(path)?;
    load_overrides_from_reader(file)
}

/// Load overrides from any reader with a `parameter,value` header
pub fn load_overrides_from_reader<R: Read>(reader: R) -> WindfinResult<ParameterOverrides> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut overrides = ParameterOverrides::default();

    for result in reader.records() {
        let record = result?;
        let name = record.get(0).unwrap_or_default();
        let raw = record.get(1).unwrap_or_default();
        if name.is_empty() || name.starts_with('#') {
            continue;
        }
        let value: f64 = raw.parse().map_err(|_| ModelError::Parse {
            field: name.to_string(),
            value: raw.to_string(),
        })?;
        overrides.set(name, value)?;
    }

    Ok(overrides)
}

/// Default parameters with the file's overrides applied and validated
pub fn load_parameters<P: AsRef<Path>>(path: P) -> WindfinResult<ProjectParameters> {
    let overrides = load_overrides(path)?;
    let params = ProjectParameters::default().with_overrides(&overrides).validated()?;
    Ok(params)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_from_reader() {
        let data = "parameter,value\ncapacity_factor, 0.38\n# comment,0\nproject_years,25\n";
        let overrides = load_overrides_from_reader(data.as_bytes()).unwrap();
        assert_eq!(overrides.capacity_factor, Some(0.38));
        assert_eq!(overrides.project_years, Some(25));
        assert_eq!(overrides.tax_rate, None);
    }

    #[test]
    fn test_bad_value_is_parse_error() {
        let data = "parameter,value\ntax_rate,thirty\n";
        let err = load_overrides_from_reader(data.as_bytes()).unwrap_err();
        assert!(matches!(err, ModelError::Parse { .. }));
    }

    #[test]
    fn test_unknown_name_is_error() {
        let data = "parameter,value\nbess_mw,50\n";
        assert!(load_overrides_from_reader(data.as_bytes()).is_err());
    }
}
