use std::path::Path;

use serde::Serialize;

use crate::cli::{missing_file, InspectArgs};
use crate::exit_codes;
use crate::output;
use nkhdf5::channels::{classify_channels, clean_channel_name};
use nkhdf5::utils::{format_timestamp, ns_to_naive};
use nkhdf5::{EdfReader, EdfSummary, Hdf5Store, NkFile, RecordingStore, Result, SeriesKind};

#[derive(Serialize)]
struct SeriesSummary {
    name: &'static str,
    dataset: &'static str,
    samples: usize,
    channels: usize,
    sample_rate: f64,
    units: Option<String>,
    time_zone: Option<String>,
    filter_lowpass: Option<f64>,
    filter_highpass: Option<f64>,
    first_time: Option<String>,
    last_time: Option<String>,
    channel_names: Vec<String>,
}

#[derive(Serialize)]
struct FileSummary {
    file: String,
    format: &'static str,
    subject_id: Option<String>,
    start: Option<String>,
    end: Option<String>,
    series: Vec<SeriesSummary>,
}

pub fn execute(args: InspectArgs) -> i32 {
    if !args.file.is_file() {
        return exit_codes::report(&missing_file(&args.file));
    }

    let summary = if is_edf(&args.file) {
        summarize_edf(&args.file)
    } else {
        Hdf5Store::new()
            .open(&args.file)
            .map(|file| summarize_nk(&args.file, &file))
    };
    let summary = match summary {
        Ok(summary) => summary,
        Err(e) => return exit_codes::report(&e),
    };

    if args.json {
        return output::print_json(&summary, args.compact);
    }

    println!("{} ({})", summary.file, summary.format);
    if let Some(subject) = &summary.subject_id {
        println!("Subject: {}", subject);
    }
    if let (Some(start), Some(end)) = (&summary.start, &summary.end) {
        println!("Span: {} to {}", start, end);
    }
    for s in &summary.series {
        println!(
            "  {:<16} {:>10} samples x {:>3} channels @ {} Hz",
            s.dataset, s.samples, s.channels, s.sample_rate
        );
    }
    exit_codes::SUCCESS
}

fn is_edf(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map_or(false, |e| e.eq_ignore_ascii_case("edf"))
}

fn timestamp(ns: u64) -> Option<String> {
    ns_to_naive(ns).map(|t| format_timestamp(&t))
}

fn summarize_nk(path: &Path, file: &NkFile) -> FileSummary {
    let series = file
        .series
        .iter()
        .map(|(kind, s)| SeriesSummary {
            name: kind.map_name(),
            dataset: kind.dataset_name(),
            samples: s.len(),
            channels: s.channel_count(),
            sample_rate: s.attributes.sample_rate,
            units: Some(s.attributes.units.clone()),
            time_zone: Some(s.attributes.time_zone.clone()),
            filter_lowpass: Some(s.attributes.filter_lowpass),
            filter_highpass: Some(s.attributes.filter_highpass),
            first_time: s.time_axis.first().and_then(|&t| timestamp(t)),
            last_time: s.time_axis.last().and_then(|&t| timestamp(t)),
            channel_names: s.channel_labels.iter().map(|l| l.name()).collect(),
        })
        .collect();

    FileSummary {
        file: path.display().to_string(),
        format: "HDF5",
        subject_id: Some(file.attributes.subject_id.clone()),
        start: timestamp(file.attributes.start),
        end: timestamp(file.attributes.end),
        series,
    }
}

/// Header-only view of an EDF file, grouped the way conversion would
/// split it.
fn summarize_edf(path: &Path) -> Result<FileSummary> {
    let reader = EdfReader::open(path)?;
    let header = reader.header();
    let summary = EdfSummary::from_header(header)?;

    let names: Vec<String> = header
        .signals
        .iter()
        .map(|s| clean_channel_name(&s.label))
        .collect();
    let types = classify_channels(&names);

    let series = SeriesKind::ALL
        .into_iter()
        .map(|kind| {
            let channel_names: Vec<String> = names
                .iter()
                .zip(&types)
                .filter(|(_, t)| **t == kind.channel_type())
                .map(|(n, _)| n.clone())
                .collect();
            SeriesSummary {
                name: kind.map_name(),
                dataset: kind.dataset_name(),
                samples: summary.n_samples,
                channels: channel_names.len(),
                sample_rate: summary.sample_rate,
                units: None,
                time_zone: None,
                filter_lowpass: None,
                filter_highpass: None,
                first_time: Some(format_timestamp(&summary.start)),
                last_time: Some(format_timestamp(&summary.end)),
                channel_names,
            }
        })
        .collect();

    Ok(FileSummary {
        file: path.display().to_string(),
        format: "EDF",
        subject_id: None,
        start: Some(format_timestamp(&summary.start)),
        end: Some(format_timestamp(&summary.end)),
        series,
    })
}
