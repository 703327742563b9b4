use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info, warn};

use super::model::{Dataset, Level};

/// Failure to produce a usable dataset. Fatal for the session.
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("failed to read dataset {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse dataset {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: simd_json::Error,
    },
    #[error("dataset {path} contains no countries")]
    Empty { path: PathBuf },
}

/// Read and parse the dataset in one shot
pub fn load_dataset(path: &Path) -> Result<Dataset, DatasetError> {
    let mut bytes = fs::read(path).map_err(|source| DatasetError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let dataset = parse_dataset(&mut bytes).map_err(|source| DatasetError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    if dataset.is_empty() {
        return Err(DatasetError::Empty {
            path: path.to_path_buf(),
        });
    }

    check_invariants(&dataset);
    info!(
        path = %path.display(),
        countries = dataset.len(),
        units = dataset.unit_count(),
        "dataset loaded"
    );
    Ok(dataset)
}

/// Parse a dataset from a mutable JSON buffer (simd-json parses in place)
pub fn parse_dataset(bytes: &mut [u8]) -> Result<Dataset, simd_json::Error> {
    simd_json::serde::from_slice(bytes)
}

/// Report duplicate keys and out-of-range percentages. Both are data
/// problems, not load failures.
pub fn check_invariants(dataset: &Dataset) -> usize {
    let mut problems = 0;

    for (country, record) in dataset.countries() {
        for level in Level::ALL {
            let mut seen = HashSet::new();
            for unit in record.units(level) {
                if !seen.insert(unit.key()) {
                    warn!(country, level = %level, key = unit.key(), "duplicate unit key");
                    problems += 1;
                }

                for category in &unit.categories {
                    for var in category.percentage_variables() {
                        if let Some(v) = category.get(var) {
                            if !(0.0..=1.0).contains(&v) {
                                warn!(
                                    country,
                                    key = unit.key(),
                                    category = %category.key,
                                    var,
                                    value = v,
                                    "percentage outside [0, 1]"
                                );
                                problems += 1;
                            }
                        }
                    }
                }
            }
        }
    }

    debug!(problems, "dataset invariants checked");
    problems
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testdata::SAMPLE_JSON;
    use std::io::Write;

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE_JSON.as_bytes()).unwrap();

        let ds = load_dataset(file.path()).unwrap();
        assert_eq!(ds.country_keys().collect::<Vec<_>>(), vec!["argentina", "mexico"]);
        assert_eq!(ds.unit_count(), 11);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = load_dataset(Path::new("/nonexistent/data.json")).unwrap_err();
        assert!(matches!(err, DatasetError::Io { .. }));
    }

    #[test]
    fn test_malformed_json_is_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"{\"argentina\": [").unwrap();

        let err = load_dataset(file.path()).unwrap_err();
        assert!(matches!(err, DatasetError::Parse { .. }));
    }

    #[test]
    fn test_empty_object_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"{}").unwrap();

        let err = load_dataset(file.path()).unwrap_err();
        assert!(matches!(err, DatasetError::Empty { .. }));
    }

    #[test]
    fn test_invariant_problems_are_counted() {
        let mut bytes = br#"{"x": {"large_units": [
            {"BASIC_INFO": {"KEY": "A", "NAME": "a"}, "C": {"V_PCT": 1.5}},
            {"BASIC_INFO": {"KEY": "A", "NAME": "b"}}
        ]}}"#
            .to_vec();
        let ds = parse_dataset(&mut bytes).unwrap();
        assert_eq!(check_invariants(&ds), 2);
    }
}
