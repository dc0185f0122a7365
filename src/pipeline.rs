//! End-to-end steps: EDF conversion, cataloging, biomarker concatenation
//! and clean-up.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use log::{debug, info, warn};

use crate::biomarker::{
    biomarker_file_name, concat_series, files_for_biomarker, filter_window, survey_windows,
    FileFormat,
};
use crate::catalog::{self, read_catalog, read_survey_times, EdfCatalogEntry};
use crate::config::PipelineConfig;
use crate::dedup::{clean_file_name, drop_duplicated_timestamps};
use crate::error::{NkError, Result};
use crate::reader::EdfReader;
use crate::recording::{
    hdf5_file_name, hdf5_file_names, list_edf_files, list_files_containing, EdfRecording,
    EdfSummary,
};
use crate::series::{FileAttributes, NkFile, SeriesAttributes, SeriesKind};
use crate::store::RecordingStore;

/// Series carried into the biomarker files
pub const BIOMARKER_SERIES: SeriesKind = SeriesKind::Ieeg;

/// Converts `edf_dir/name` into `out_dir` and returns the created path.
pub fn convert_edf_file<S: RecordingStore + ?Sized>(
    config: &PipelineConfig,
    store: &S,
    edf_dir: &Path,
    name: &str,
    out_dir: &Path,
) -> Result<PathBuf> {
    let recording = load_recording(config, edf_dir, name)?;
    let out = out_dir.join(hdf5_file_name(&config.patient_id, &recording.start));
    write_recording(config, store, &recording, &out)?;
    Ok(out)
}

/// Converts every EDF file of the patient into the HDF5 directory.
pub fn convert_edf_dir<S: RecordingStore + ?Sized>(
    config: &PipelineConfig,
    store: &S,
) -> Result<Vec<PathBuf>> {
    convert_edf_dir_to(config, store, &config.edf_dir(), &config.hdf5_dir())
}

/// Converts every EDF file in `edf_dir` into `out_dir`. Stops at the first
/// file that fails. Output names follow [`hdf5_file_names`], so recordings
/// starting in the same minute do not overwrite each other.
pub fn convert_edf_dir_to<S: RecordingStore + ?Sized>(
    config: &PipelineConfig,
    store: &S,
    edf_dir: &Path,
    out_dir: &Path,
) -> Result<Vec<PathBuf>> {
    config.validate()?;
    let names = list_edf_files(edf_dir)?;
    fs::create_dir_all(out_dir)?;
    info!("converting {} EDF file(s) from {}", names.len(), edf_dir.display());

    let starts = names
        .iter()
        .map(|name| -> Result<NaiveDateTime> {
            let reader = EdfReader::open(edf_dir.join(name))?;
            Ok(EdfSummary::from_header(reader.header())?.start)
        })
        .collect::<Result<Vec<_>>>()?;
    let h5_names = hdf5_file_names(&config.patient_id, &starts)?;

    names
        .iter()
        .zip(h5_names)
        .map(|(name, h5_name)| -> Result<PathBuf> {
            let recording = load_recording(config, edf_dir, name)?;
            let out = out_dir.join(h5_name);
            write_recording(config, store, &recording, &out)?;
            Ok(out)
        })
        .collect()
}

fn load_recording(config: &PipelineConfig, edf_dir: &Path, name: &str) -> Result<EdfRecording> {
    let mut recording = EdfRecording::load(edf_dir, name)?;
    recording.time_zone = config.time_zone.clone();
    Ok(recording)
}

fn write_recording<S: RecordingStore + ?Sized>(
    config: &PipelineConfig,
    store: &S,
    recording: &EdfRecording,
    out: &Path,
) -> Result<()> {
    let file = recording.to_nk_file(&config.patient_id)?;
    store.create(out, &file)?;

    info!("{} -> {}", recording.file_name, out.display());
    if !store.is_openable(out) {
        warn!("{} was written but cannot be reopened", out.display());
    }
    Ok(())
}

/// Builds the EDF catalog of the patient and writes it next to the EDF
/// directory.
pub fn write_catalog(config: &PipelineConfig) -> Result<Vec<EdfCatalogEntry>> {
    config.validate()?;
    let entries = catalog::build_catalog(config.edf_dir(), &config.patient_id)?;
    let path = config.catalog_path();
    catalog::write_catalog(&path, &entries)?;
    info!("wrote {} ({} entries)", path.display(), entries.len());
    Ok(entries)
}

/// Writes one biomarker file per survey that has recordings in its lookup
/// window. Files are numbered by the survey's row in the sheet, so blank
/// rows and skipped surveys leave gaps in the numbering.
///
/// A survey whose source files disagree on the channel count is skipped with
/// a warning; the remaining surveys are still written.
pub fn concat_biomarkers<S: RecordingStore + ?Sized>(
    config: &PipelineConfig,
    store: &S,
) -> Result<Vec<PathBuf>> {
    config.validate()?;
    let catalog = read_catalog(config.catalog_path())?;

    let mut rows = Vec::new();
    for (row, time) in read_survey_times(config.survey_path())?.into_iter().enumerate() {
        match time {
            Some(time) => rows.push((row + 1, time)),
            None => warn!("survey {}: no start time, skipped", row + 1),
        }
    }
    let surveys: Vec<NaiveDateTime> = rows.iter().map(|&(_, time)| time).collect();
    let selections = files_for_biomarker(config.lookup(), FileFormat::Hdf5, &surveys, &catalog);
    let windows = survey_windows(&surveys, config.window());

    let in_dir = config.hdf5_dir();
    let out_dir = config.biomarker_dir();
    fs::create_dir_all(&out_dir)?;

    let mut created = Vec::new();
    for ((&(number, _), names), window) in rows.iter().zip(&selections).zip(&windows) {
        if names.is_empty() {
            warn!(
                "survey {} at {}: no recordings in the {} minutes before it, skipped",
                number,
                window.end,
                config.lookup_minutes
            );
            continue;
        }

        let (source, combined) = match concat_series(store, &in_dir, names, BIOMARKER_SERIES) {
            Ok(concatenated) => concatenated,
            Err(e @ NkError::ChannelMismatch { .. }) => {
                warn!("survey {} at {}: {}, skipped", number, window.end, e);
                continue;
            }
            Err(e) => return Err(e),
        };
        let (start, end) = (window.start_ns()?, window.end_ns()?);
        let series = filter_window(&combined, start, end);
        if series.is_empty() {
            warn!("survey {} at {}: no samples inside the window", number, window.end);
        }
        debug!(
            "survey {}: kept {} of {} samples",
            number,
            series.len(),
            combined.len()
        );

        let mut file = NkFile::new(FileAttributes {
            subject_id: config.patient_id.clone(),
            start,
            end,
            ..source
        });
        file.insert(BIOMARKER_SERIES, series);
        file.fill_empty_series(&empty_attributes(config));

        let out = out_dir.join(biomarker_file_name(&config.patient_id, number));
        store.create(&out, &file)?;
        info!("created {} from {} file(s)", out.display(), names.len());
        created.push(out);
    }
    Ok(created)
}

/// Drops duplicated time stamps from every biomarker file not listed in
/// `exclude` and writes the result to the clean directory.
pub fn clean_biomarkers<S: RecordingStore + ?Sized>(
    config: &PipelineConfig,
    store: &S,
) -> Result<Vec<PathBuf>> {
    config.validate()?;
    let in_dir = config.biomarker_dir();
    let out_dir = config.biomarker_clean_dir();
    fs::create_dir_all(&out_dir)?;

    let mut created = Vec::new();
    for name in list_files_containing(&in_dir, "ieeg.h5")? {
        if config.is_excluded(&name) {
            info!("{}: excluded", name);
            continue;
        }

        let (source, series) = store.open_series(&in_dir.join(&name), BIOMARKER_SERIES)?;
        let clean = drop_duplicated_timestamps(&series);
        if clean.len() < series.len() {
            debug!("{}: dropped {} duplicated sample(s)", name, series.len() - clean.len());
        }

        let mut file = NkFile::new(FileAttributes {
            subject_id: config.patient_id.clone(),
            ..source.attributes
        });
        file.insert(BIOMARKER_SERIES, clean);
        file.fill_empty_series(&empty_attributes(config));

        let out = out_dir.join(clean_file_name(&name));
        store.create(&out, &file)?;
        info!("created {}", out.display());
        created.push(out);
    }
    Ok(created)
}

fn empty_attributes(config: &PipelineConfig) -> SeriesAttributes {
    SeriesAttributes {
        time_zone: config.time_zone.clone(),
        ..Default::default()
    }
}
