//! EDF catalog and biomarker survey sheets.

use std::path::Path;

use chrono::NaiveDateTime;
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::error::{NkError, Result};
use crate::reader::EdfReader;
use crate::recording::{hdf5_file_names, list_edf_files, EdfSummary};

/// Column holding the survey timestamps in `BiomarkerSurveys.csv`
pub const SURVEY_START_COLUMN: &str = "SurveyStart";

/// One row of `<patient>_edf_catalog.csv`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdfCatalogEntry {
    pub edf_name: String,
    pub h5_name: String,
    #[serde(with = "timestamp_cell")]
    pub edf_start: NaiveDateTime,
    #[serde(with = "timestamp_cell")]
    pub edf_end: NaiveDateTime,
    #[serde(default)]
    pub duration_seconds: f64,
}

impl EdfCatalogEntry {
    pub fn from_summary(edf_name: &str, h5_name: String, summary: &EdfSummary) -> Self {
        EdfCatalogEntry {
            edf_name: edf_name.to_string(),
            h5_name,
            edf_start: summary.start,
            edf_end: summary.end,
            duration_seconds: summary.duration.num_milliseconds() as f64 / 1000.0,
        }
    }
}

mod timestamp_cell {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    use crate::utils::{format_timestamp, parse_timestamp};

    pub fn serialize<S: Serializer>(t: &NaiveDateTime, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&format_timestamp(t))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(d)?;
        parse_timestamp(&raw).map_err(serde::de::Error::custom)
    }
}

/// Scans the headers of every EDF file in `edf_dir`. Files that cannot be
/// read are logged and left out.
pub fn build_catalog<P: AsRef<Path>>(edf_dir: P, patient_id: &str) -> Result<Vec<EdfCatalogEntry>> {
    let edf_dir = edf_dir.as_ref();
    let mut scanned = Vec::new();
    for name in list_edf_files(edf_dir)? {
        let summary = EdfReader::open(edf_dir.join(&name))
            .and_then(|reader| EdfSummary::from_header(reader.header()));
        match summary {
            Ok(summary) => scanned.push((name, summary)),
            Err(e) => warn!("{}: skipped from catalog: {}", name, e),
        }
    }

    let starts: Vec<NaiveDateTime> = scanned.iter().map(|(_, summary)| summary.start).collect();
    let h5_names = hdf5_file_names(patient_id, &starts)?;
    let entries: Vec<EdfCatalogEntry> = scanned
        .iter()
        .zip(h5_names)
        .map(|((name, summary), h5_name)| EdfCatalogEntry::from_summary(name, h5_name, summary))
        .collect();

    info!("cataloged {} EDF file(s) in {}", entries.len(), edf_dir.display());
    Ok(entries)
}

pub fn read_catalog<P: AsRef<Path>>(path: P) -> Result<Vec<EdfCatalogEntry>> {
    let path = path.as_ref();
    let mut reader = csv::Reader::from_path(path)
        .map_err(|e| NkError::FileNotFound(format!("{}: {}", path.display(), e)))?;
    let entries = reader.deserialize().collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(entries)
}

pub fn write_catalog<P: AsRef<Path>>(path: P, entries: &[EdfCatalogEntry]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for entry in entries {
        writer.serialize(entry)?;
    }
    writer.flush()?;
    Ok(())
}

/// Survey start times, in file order. Blank cells are ignored.
/// Reads the `SurveyStart` column, one entry per row. Rows with a blank cell
/// are `None` so that later surveys keep their row number.
pub fn read_survey_times<P: AsRef<Path>>(path: P) -> Result<Vec<Option<NaiveDateTime>>> {
    let path = path.as_ref();
    let mut reader = csv::Reader::from_path(path)
        .map_err(|e| NkError::FileNotFound(format!("{}: {}", path.display(), e)))?;

    let column = reader
        .headers()?
        .iter()
        .position(|h| h.trim() == SURVEY_START_COLUMN)
        .ok_or_else(|| NkError::missing("column", SURVEY_START_COLUMN))?;

    let mut times = Vec::new();
    for record in reader.records() {
        let record = record?;
        let time = match record.get(column).map(str::trim) {
            Some(cell) if !cell.is_empty() => Some(crate::utils::parse_timestamp(cell)?),
            _ => None,
        };
        times.push(time);
    }
    Ok(times)
}
