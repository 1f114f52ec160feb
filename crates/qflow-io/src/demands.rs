//! Demand list import/export.
//!
//! JSON files hold an array whose entries are either objects
//! (`{"source": 0, "destination": 1, "quantity": 4, "threshold": 3}`) or
//! bare 4-tuples (`[0, 1, 4, 3]`). CSV files use the header
//! `source,destination,quantity,threshold`. Order is preserved in both.

use qflow_core::{ClientId, Demand};
use serde::Deserialize;
use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DemandFileError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid demand JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid demand CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("cannot tell demand format of {0}; use a .json or .csv extension")]
    UnknownFormat(PathBuf),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DemandFormat {
    Json,
    Csv,
}

impl DemandFormat {
    pub fn from_path(path: &Path) -> Result<Self, DemandFileError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        match ext.as_deref() {
            Some("json") => Ok(DemandFormat::Json),
            Some("csv") => Ok(DemandFormat::Csv),
            _ => Err(DemandFileError::UnknownFormat(path.to_path_buf())),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum DemandRecord {
    Object(Demand),
    Tuple(usize, usize, u64, f64),
}

impl From<DemandRecord> for Demand {
    fn from(record: DemandRecord) -> Self {
        match record {
            DemandRecord::Object(d) => d,
            DemandRecord::Tuple(src, dst, quantity, threshold) => {
                Demand::new(ClientId::new(src), ClientId::new(dst), quantity, threshold)
            }
        }
    }
}

pub fn parse_demands_json(reader: impl Read) -> Result<Vec<Demand>, DemandFileError> {
    let records: Vec<DemandRecord> = serde_json::from_reader(reader)?;
    Ok(records.into_iter().map(Demand::from).collect())
}

pub fn parse_demands_csv(reader: impl Read) -> Result<Vec<Demand>, DemandFileError> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut demands = Vec::new();
    for record in rdr.deserialize() {
        demands.push(record?);
    }
    Ok(demands)
}

/// Read demands, choosing the parser from the file extension.
pub fn read_demands(path: impl AsRef<Path>) -> Result<Vec<Demand>, DemandFileError> {
    let path = path.as_ref();
    let format = DemandFormat::from_path(path)?;
    let file = File::open(path).map_err(|source| DemandFileError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let reader = BufReader::new(file);
    match format {
        DemandFormat::Json => parse_demands_json(reader),
        DemandFormat::Csv => parse_demands_csv(reader),
    }
}

/// Write demands in the format implied by the extension.
pub fn write_demands(demands: &[Demand], path: impl AsRef<Path>) -> Result<(), DemandFileError> {
    let path = path.as_ref();
    let format = DemandFormat::from_path(path)?;
    let io_err = |source| DemandFileError::Io {
        path: path.to_path_buf(),
        source,
    };
    let file = File::create(path).map_err(io_err)?;
    match format {
        DemandFormat::Json => {
            let mut writer = std::io::BufWriter::new(file);
            serde_json::to_writer_pretty(&mut writer, demands)?;
            writer.write_all(b"\n").map_err(io_err)?;
            writer.flush().map_err(io_err)?;
        }
        DemandFormat::Csv => {
            let mut writer = csv::Writer::from_writer(file);
            for demand in demands {
                writer.serialize(demand)?;
            }
            writer.flush().map_err(io_err)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_objects_and_tuples_mix() {
        let text = r#"[
            {"source": 0, "destination": 1, "quantity": 4, "threshold": 3.0},
            [1, 2, 6, 5]
        ]"#;
        let demands = parse_demands_json(text.as_bytes()).unwrap();
        assert_eq!(demands.len(), 2);
        assert_eq!(demands[0].source, ClientId::new(0));
        assert_eq!(demands[1], Demand::new(ClientId::new(1), ClientId::new(2), 6, 5.0));
    }

    #[test]
    fn test_csv_with_whitespace() {
        let text = "source, destination, quantity, threshold\n0, 1, 4, 3\n2, 0, 1, 2.5\n";
        let demands = parse_demands_csv(text.as_bytes()).unwrap();
        assert_eq!(demands.len(), 2);
        assert_eq!(demands[1].threshold, 2.5);
        assert_eq!(demands[1].destination, ClientId::new(0));
    }

    #[test]
    fn test_negative_quantity_rejected() {
        let text = "[[0, 1, -4, 3]]";
        assert!(parse_demands_json(text.as_bytes()).is_err());
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(
            DemandFormat::from_path(Path::new("d.JSON")).unwrap(),
            DemandFormat::Json
        );
        assert!(matches!(
            DemandFormat::from_path(Path::new("demands.txt")),
            Err(DemandFileError::UnknownFormat(_))
        ));
    }
}
