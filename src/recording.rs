//! Whole-file EDF extraction: metadata, channel typing and the per-type
//! electrical series written to HDF5.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{Duration, NaiveDateTime};
use log::{debug, warn};
use ndarray::Array2;

use crate::channels::{channel_label_parts, classify_channels, clean_channel_name, ChannelType};
use crate::error::{NkError, Result};
use crate::reader::EdfReader;
use crate::series::{
    ChannelLabel, ElectricalSeries, FileAttributes, NkFile, SeriesAttributes, SeriesKind,
    COORD_DIMS, DEFAULT_TIME_ZONE,
};
use crate::utils::{naive_to_ns, parse_prefilter};
use crate::EdfHeader;

/// Sorted names of the entries in `dir` whose name contains `edf`.
pub fn list_edf_files<P: AsRef<Path>>(dir: P) -> Result<Vec<String>> {
    list_files_containing(dir, "edf")
}

/// Sorted names of the entries in `dir` whose name contains `pattern`.
pub fn list_files_containing<P: AsRef<Path>>(dir: P, pattern: &str) -> Result<Vec<String>> {
    let dir = dir.as_ref();
    let entries = fs::read_dir(dir)
        .map_err(|e| NkError::FileNotFound(format!("{}: {}", dir.display(), e)))?;

    let mut names = Vec::new();
    for entry in entries {
        let name = entry?.file_name().to_string_lossy().into_owned();
        if name.contains(pattern) {
            names.push(name);
        }
    }
    names.sort();
    Ok(names)
}

/// Output name for a converted EDF file, e.g.
/// `sub-PR05_ses-stage1_task-continuous_acq-20230614_run-1021_ieeg.h5`.
pub fn hdf5_file_name(patient_id: &str, start: &NaiveDateTime) -> String {
    run_file_name(patient_id, start, "%H%M")
}

fn run_file_name(patient_id: &str, start: &NaiveDateTime, run: &str) -> String {
    format!(
        "sub-{}_ses-stage1_task-continuous_acq-{}_run-{}_ieeg.h5",
        patient_id,
        start.format("%Y%m%d"),
        start.format(run),
    )
}

/// Output names for recordings converted side by side, one per start time.
///
/// Recordings that would share a `run-HHMM` name get `run-HHMMSS` instead.
/// Two recordings starting in the same second cannot be told apart and are
/// an error.
pub fn hdf5_file_names(patient_id: &str, starts: &[NaiveDateTime]) -> Result<Vec<String>> {
    let minute_names: Vec<String> = starts.iter().map(|t| hdf5_file_name(patient_id, t)).collect();
    let mut used = HashMap::new();
    for name in &minute_names {
        *used.entry(name.as_str()).or_insert(0usize) += 1;
    }

    let names: Vec<String> = starts
        .iter()
        .zip(&minute_names)
        .map(|(start, name)| {
            if used.get(name.as_str()) == Some(&1) {
                name.clone()
            } else {
                run_file_name(patient_id, start, "%H%M%S")
            }
        })
        .collect();

    let mut seen = HashSet::new();
    for (name, start) in names.iter().zip(starts) {
        if !seen.insert(name) {
            return Err(NkError::InvalidFormat(format!(
                "more than one recording starts at {}; output name {} is ambiguous",
                start, name
            )));
        }
    }
    Ok(names)
}

/// Header-level summary of an EDF file, cheap enough for catalog scans.
#[derive(Debug, Clone, PartialEq)]
pub struct EdfSummary {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub duration: Duration,
    pub sample_rate: f64,
    pub n_samples: usize,
}

impl EdfSummary {
    pub fn from_header(header: &EdfHeader) -> Result<Self> {
        let sample_rate = common_sample_rate(header)?;
        let n_samples = header
            .signals
            .first()
            .map_or(0, |s| s.samples_in_file.max(0) as usize);
        let duration = duration_from_seconds(n_samples as f64 / sample_rate);
        let start = header.start_datetime();
        Ok(EdfSummary {
            start,
            end: start + duration,
            duration,
            sample_rate,
            n_samples,
        })
    }
}

/// All ordinary signals must share a rate; mixed-rate files are not
/// resampled.
fn common_sample_rate(header: &EdfHeader) -> Result<f64> {
    let mut rates: Vec<f64> = (0..header.signals.len())
        .filter_map(|i| header.sample_rate(i))
        .collect();
    rates.dedup_by(|a, b| (*a - *b).abs() < f64::EPSILON);

    match rates.as_slice() {
        [] => Err(NkError::InvalidFormat("EDF file has no ordinary signals".to_string())),
        [rate] => Ok(*rate),
        _ => Err(NkError::MixedSampleRates(rates)),
    }
}

fn duration_from_seconds(seconds: f64) -> Duration {
    Duration::nanoseconds((seconds * 1e9).round() as i64)
}

/// Everything extracted from one EDF file.
#[derive(Debug, Clone)]
pub struct EdfRecording {
    pub file_name: String,
    pub path: PathBuf,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub time_zone: String,
    pub duration: Duration,
    pub n_samples: usize,
    pub sample_rate: f64,
    pub lowpass: f64,
    pub highpass: f64,
    pub raw_labels: Vec<String>,
    pub channel_names: Vec<String>,
    pub channel_types: Vec<ChannelType>,
    /// Channels x samples, physical units
    pub data: Array2<f64>,
    pub channel_labels: Vec<ChannelLabel>,
}

impl EdfRecording {
    pub fn load<P: AsRef<Path>>(dir: P, file_name: &str) -> Result<Self> {
        let path = dir.as_ref().join(file_name);
        let mut reader = EdfReader::open(&path)?;
        let header = reader.header().clone();
        let summary = EdfSummary::from_header(&header)?;

        let raw_labels: Vec<String> = header.signals.iter().map(|s| s.label.clone()).collect();
        let channel_names: Vec<String> = raw_labels.iter().map(|l| clean_channel_name(l)).collect();
        let channel_types = classify_channels(&channel_names);
        let channel_labels = channel_names
            .iter()
            .map(|n| ChannelLabel(channel_label_parts(n)))
            .collect();

        let (highpass, lowpass) = filter_band(&header, summary.sample_rate);

        let mut data = Array2::<f64>::zeros((header.signals.len(), summary.n_samples));
        for (i, mut row) in data.rows_mut().into_iter().enumerate() {
            let samples = reader.read_all_physical(i)?;
            if samples.len() != summary.n_samples {
                return Err(NkError::InvalidFormat(format!(
                    "{}: signal '{}' has {} samples, expected {}",
                    file_name, raw_labels[i], samples.len(), summary.n_samples
                )));
            }
            row.assign(&ndarray::ArrayView1::from(&samples[..]));
        }

        debug!(
            "{}: {} channels, {} samples at {} Hz",
            file_name,
            raw_labels.len(),
            summary.n_samples,
            summary.sample_rate
        );

        Ok(EdfRecording {
            file_name: file_name.to_string(),
            path,
            start: summary.start,
            end: summary.end,
            time_zone: DEFAULT_TIME_ZONE.to_string(),
            duration: summary.duration,
            n_samples: summary.n_samples,
            sample_rate: summary.sample_rate,
            lowpass,
            highpass,
            raw_labels,
            channel_names,
            channel_types,
            data,
            channel_labels,
        })
    }

    pub fn channel_count(&self) -> usize {
        self.raw_labels.len()
    }

    /// Absolute time of every sample, ns since the Unix epoch.
    pub fn time_axis_ns(&self) -> Result<Vec<u64>> {
        let start = naive_to_ns(self.start)?;
        let step = 1e9 / self.sample_rate;
        Ok((0..self.n_samples)
            .map(|i| start + (i as f64 * step).round() as u64)
            .collect())
    }

    pub fn start_ns(&self) -> Result<u64> {
        naive_to_ns(self.start)
    }

    pub fn end_ns(&self) -> Result<u64> {
        naive_to_ns(self.end)
    }

    /// Series holding the channels of one type, samples x channels.
    pub fn series(&self, kind: SeriesKind) -> Result<ElectricalSeries> {
        self.series_with_axis(kind, self.time_axis_ns()?)
    }

    fn series_with_axis(&self, kind: SeriesKind, time_axis: Vec<u64>) -> Result<ElectricalSeries> {
        let wanted = kind.channel_type();
        let picked: Vec<usize> = self
            .channel_types
            .iter()
            .enumerate()
            .filter(|(_, t)| **t == wanted)
            .map(|(i, _)| i)
            .collect();

        let mut data = Array2::<f32>::zeros((self.n_samples, picked.len()));
        for (col, &ch) in picked.iter().enumerate() {
            let source = self.data.row(ch);
            data.column_mut(col).assign(&source.mapv(|v| v as f32));
        }

        let attributes = SeriesAttributes {
            sample_rate: self.sample_rate,
            time_zone: self.time_zone.clone(),
            filter_lowpass: self.lowpass,
            filter_highpass: self.highpass,
            channel_count: picked.len(),
            ..Default::default()
        };

        ElectricalSeries::new(
            data,
            time_axis,
            picked.iter().map(|&i| self.channel_labels[i].clone()).collect(),
            Array2::zeros((0, COORD_DIMS)),
            attributes,
        )
    }

    /// File model with one series per channel type. EMG channels are
    /// dropped since the layout has no place for them.
    pub fn to_nk_file(&self, subject_id: &str) -> Result<NkFile> {
        let mut file = NkFile::new(FileAttributes::new(
            subject_id,
            self.start_ns()?,
            self.end_ns()?,
        ));

        let emg = self
            .channel_types
            .iter()
            .filter(|t| **t == ChannelType::Emg)
            .count();
        if emg > 0 {
            warn!("{}: dropping {} EMG channel(s)", self.file_name, emg);
        }

        let time_axis = self.time_axis_ns()?;
        for kind in SeriesKind::ALL {
            file.insert(kind, self.series_with_axis(kind, time_axis.clone())?);
        }
        Ok(file)
    }
}

/// (highpass, lowpass) for the whole file: the highest high-pass and the
/// lowest low-pass across channels. Missing values fall back to 0 Hz and
/// Nyquist.
fn filter_band(header: &EdfHeader, sample_rate: f64) -> (f64, f64) {
    let mut highpass: Option<f64> = None;
    let mut lowpass: Option<f64> = None;

    for signal in &header.signals {
        let (hp, lp) = parse_prefilter(&signal.prefilter);
        if let Some(hp) = hp {
            highpass = Some(highpass.map_or(hp, |cur| cur.max(hp)));
        }
        if let Some(lp) = lp {
            lowpass = Some(lowpass.map_or(lp, |cur| cur.min(lp)));
        }
    }

    (highpass.unwrap_or(0.0), lowpass.unwrap_or(sample_rate / 2.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_hdf5_file_name() {
        let start = NaiveDate::from_ymd_opt(2023, 6, 14)
            .unwrap()
            .and_hms_opt(10, 21, 33)
            .unwrap();
        assert_eq!(
            hdf5_file_name("PR05", &start),
            "sub-PR05_ses-stage1_task-continuous_acq-20230614_run-1021_ieeg.h5"
        );
    }

    #[test]
    fn test_hdf5_file_names_disambiguate_same_minute() {
        let day = NaiveDate::from_ymd_opt(2023, 6, 14).unwrap();
        let starts = [
            day.and_hms_opt(10, 0, 0).unwrap(),
            day.and_hms_opt(10, 0, 30).unwrap(),
            day.and_hms_opt(11, 5, 0).unwrap(),
        ];
        assert_eq!(
            hdf5_file_names("PR05", &starts).unwrap(),
            vec![
                "sub-PR05_ses-stage1_task-continuous_acq-20230614_run-100000_ieeg.h5",
                "sub-PR05_ses-stage1_task-continuous_acq-20230614_run-100030_ieeg.h5",
                "sub-PR05_ses-stage1_task-continuous_acq-20230614_run-1105_ieeg.h5",
            ]
        );

        let same_second = [starts[0], starts[0]];
        assert!(matches!(
            hdf5_file_names("PR05", &same_second),
            Err(NkError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_list_edf_files_sorted_and_filtered() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.edf", "a.edf", "notes.txt", "c_edf_backup"] {
            fs::write(dir.path().join(name), b"").unwrap();
        }
        let names = list_edf_files(dir.path()).unwrap();
        assert_eq!(names, vec!["a.edf", "b.edf", "c_edf_backup"]);
    }

    #[test]
    fn test_list_edf_files_missing_dir() {
        let err = list_edf_files("/definitely/not/here").unwrap_err();
        assert!(matches!(err, NkError::FileNotFound(_)));
    }
}
