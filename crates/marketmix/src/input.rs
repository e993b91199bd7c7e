//! YAML inputs of a generation run

use std::fs;
use std::path::Path;

use color_eyre::eyre::{Result, WrapErr, eyre};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use marketmix_core::model::{Index, SampleMatrix};
use marketmix_core::{Database, GeneratorConfig, TimeSeries};

fn read_yaml<T: DeserializeOwned>(path: &Path, what: &str) -> Result<T> {
    let content = fs::read_to_string(path)
        .wrap_err_with(|| format!("failed to read {what} from {}", path.display()))?;
    serde_saphyr::from_str(&content)
        .wrap_err_with(|| format!("failed to parse {what} in {}", path.display()))
}

pub fn load_config(path: &Path) -> Result<GeneratorConfig> {
    read_yaml(path, "run configuration")
}

pub fn load_database(path: &Path) -> Result<Database> {
    let database: Database = read_yaml(path, "exchange database")?;
    tracing::info!(activities = database.len(), path = %path.display(), "loaded database");
    Ok(database)
}

/// Time series file: `indices` as `{row, col}` pairs and one row of
/// observations per index.
#[derive(Deserialize)]
struct SeriesFile {
    indices: Vec<Index>,
    values: Vec<Vec<f64>>,
}

pub fn load_timeseries(path: &Path) -> Result<TimeSeries> {
    let file: SeriesFile = read_yaml(path, "time series")?;
    let values = SampleMatrix::from_rows(&file.values)
        .ok_or_else(|| eyre!("time series rows in {} differ in length", path.display()))?;
    Ok(TimeSeries::new(file.indices, values)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use marketmix_core::model::{ActivityId, Uncertainty};
    use marketmix_core::{DegenerateScalePolicy, ExchangeSource};
    use tempfile::tempdir;

    #[test]
    fn test_load_config_with_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("run.yaml");
        fs::write(&path, "name: grid\nseed: 7\ndegenerate_scale: reject\n").unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.name, "grid");
        assert_eq!(config.seed, 7);
        assert_eq!(config.num_samples, 2000);
        assert_eq!(config.degenerate_scale, DegenerateScalePolicy::Reject);
    }

    #[test]
    fn test_load_database() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("db.yaml");
        let yaml = r#"
- id: 1
  name: hydro
  reference_product: electricity
  exchanges: []
- id: 10
  name: market for electricity
  reference_product: electricity
  exchanges:
    - input: 1
      output: 10
      amount: 1.0
      uncertainty:
        type: lognormal
        loc: 0.0
        scale: 0.1
"#;
        fs::write(&path, yaml).unwrap();

        let db = load_database(&path).unwrap();
        assert_eq!(db.len(), 2);
        let inputs = db.technosphere(ActivityId(10));
        assert_eq!(inputs.len(), 1);
        assert_eq!(
            inputs[0].uncertainty,
            Uncertainty::Lognormal {
                loc: 0.0,
                scale: 0.1
            }
        );
    }

    #[test]
    fn test_ragged_timeseries_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("series.yaml");
        let yaml = "indices:\n  - {row: 1, col: 10}\n  - {row: 2, col: 10}\nvalues:\n  - [0.5, 0.6]\n  - [0.5]\n";
        fs::write(&path, yaml).unwrap();

        assert!(load_timeseries(&path).is_err());
    }

    #[test]
    fn test_missing_file_names_the_input() {
        let err = load_config(Path::new("/nonexistent/run.yaml")).unwrap_err();
        assert!(format!("{err}").contains("run configuration"));
    }
}
