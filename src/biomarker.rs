//! Selection and concatenation of the recordings around biomarker surveys.

use std::path::Path;

use chrono::{Duration, NaiveDateTime};
use log::debug;

use crate::catalog::EdfCatalogEntry;
use crate::error::{NkError, Result};
use crate::series::{ElectricalSeries, FileAttributes, SeriesKind};
use crate::store::RecordingStore;
use crate::utils::naive_to_ns;

/// Which catalog column names the selected files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Edf,
    Hdf5,
}

impl FileFormat {
    fn name_of<'a>(&self, entry: &'a EdfCatalogEntry) -> &'a str {
        match self {
            FileFormat::Edf => &entry.edf_name,
            FileFormat::Hdf5 => &entry.h5_name,
        }
    }
}

/// For every survey, the sorted unique names of the catalog files whose
/// recording overlaps `[survey - lookup, survey]`.
///
/// A file is selected when its start or end falls inside the window, and
/// also when it spans the whole window.
pub fn files_for_biomarker(
    lookup: Duration,
    format: FileFormat,
    surveys: &[NaiveDateTime],
    catalog: &[EdfCatalogEntry],
) -> Vec<Vec<String>> {
    surveys
        .iter()
        .map(|&survey| {
            let from = survey - lookup;
            let mut names: Vec<String> = catalog
                .iter()
                .filter(|e| e.edf_start <= survey && e.edf_end >= from)
                .map(|e| format.name_of(e).to_string())
                .collect();
            names.sort();
            names.dedup();
            names
        })
        .collect()
}

/// Inclusive time window ending at a survey.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurveyWindow {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl SurveyWindow {
    pub fn start_ns(&self) -> Result<u64> {
        naive_to_ns(self.start)
    }

    pub fn end_ns(&self) -> Result<u64> {
        naive_to_ns(self.end)
    }
}

pub fn survey_windows(surveys: &[NaiveDateTime], window: Duration) -> Vec<SurveyWindow> {
    surveys
        .iter()
        .map(|&end| SurveyWindow { start: end - window, end })
        .collect()
}

/// Appends one series from each named file, in order.
///
/// Labels, coordinates and attributes of the result, and the returned file
/// attributes, are those of the last file.
pub fn concat_series<S: RecordingStore + ?Sized>(
    store: &S,
    dir: &Path,
    names: &[String],
    kind: SeriesKind,
) -> Result<(FileAttributes, ElectricalSeries)> {
    let count = names.len();
    let mut names = names.iter();
    let first = names
        .next()
        .ok_or_else(|| NkError::missing("source file for", kind.dataset_name()))?;
    let (file, mut combined) = store.open_series(&dir.join(first), kind)?;
    let mut attributes = file.attributes;

    for name in names {
        let (file, series) = store.open_series(&dir.join(name), kind)?;
        if series.channel_count() != combined.channel_count() {
            return Err(NkError::ChannelMismatch {
                expected: combined.channel_count(),
                found: series.channel_count(),
            });
        }
        combined.append(&series)?;
        combined.channel_labels = series.channel_labels;
        combined.channel_coords = series.channel_coords;
        combined.attributes = series.attributes;
        attributes = file.attributes;
    }

    debug!(
        "concatenated {} samples of {} from {} file(s)",
        combined.len(),
        kind.dataset_name(),
        count
    );
    Ok((attributes, combined))
}

/// Rows whose time stamp lies in `[start_ns, end_ns]`.
pub fn filter_window(series: &ElectricalSeries, start_ns: u64, end_ns: u64) -> ElectricalSeries {
    let keep: Vec<usize> = series
        .time_axis
        .iter()
        .enumerate()
        .filter(|(_, &t)| t >= start_ns && t <= end_ns)
        .map(|(i, _)| i)
        .collect();
    series.select_rows(&keep)
}

/// `sub-<patient>_task-biomarker_<NNNN>_ieeg.h5`, numbered from 1.
pub fn biomarker_file_name(patient_id: &str, number: usize) -> String {
    format!("sub-{}_task-biomarker_{:04}_ieeg.h5", patient_id, number)
}
