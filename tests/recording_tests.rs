mod common;

use std::fs;

use common::{at, EdfFixture, FixtureSignal, MemoryStore};
use nkhdf5::catalog::read_catalog;
use nkhdf5::utils::naive_to_ns;
use nkhdf5::{
    pipeline, ChannelLabel, ChannelType, EdfRecording, NkError, PipelineConfig, SeriesKind,
};

const LABELS: &[&str] = &[
    "POL LA1-Ref",
    "POL LA2-Ref",
    "POL Fp1-Ref",
    "POL EKG-Ref",
    "POL DC01-Ref",
    "POL EMG1-Ref",
];

fn fixture() -> EdfFixture {
    let mut fixture = EdfFixture::new(at(10, 21, 33), LABELS, 10, 3);
    fixture.signals[0] = FixtureSignal::new(LABELS[0], 10).prefilter("HP:0.1Hz LP:300Hz");
    fixture.signals[1] = FixtureSignal::new(LABELS[1], 10).prefilter("HP:0.5Hz LP:100Hz");
    fixture
}

#[test]
fn test_load_recording() {
    let dir = tempfile::tempdir().unwrap();
    fixture().write(&dir.path().join("PR05_0001.edf"));

    let recording = EdfRecording::load(dir.path(), "PR05_0001.edf").unwrap();
    assert_eq!(recording.file_name, "PR05_0001.edf");
    assert_eq!(recording.channel_count(), 6);
    assert_eq!(recording.sample_rate, 10.0);
    assert_eq!(recording.n_samples, 30);
    assert_eq!(recording.start, at(10, 21, 33));
    assert_eq!(recording.end, at(10, 21, 36));
    assert_eq!(recording.duration.num_seconds(), 3);
    assert_eq!(recording.time_zone, "US/Pacific");

    assert_eq!(recording.channel_names, vec!["LA1", "LA2", "Fp1", "EKG", "DC01", "EMG1"]);
    assert_eq!(
        recording.channel_types,
        vec![
            ChannelType::IntracranialEeg,
            ChannelType::IntracranialEeg,
            ChannelType::ScalpEeg,
            ChannelType::Ekg,
            ChannelType::Ttl,
            ChannelType::Emg,
        ]
    );

    assert_eq!(recording.data.dim(), (6, 30));
    assert_eq!(recording.data[[0, 5]], 5.0);
    assert_eq!(recording.data[[3, 29]], 3029.0);

    // strongest filtering across channels wins
    assert_eq!(recording.highpass, 0.5);
    assert_eq!(recording.lowpass, 100.0);
}

#[test]
fn test_missing_prefilter_falls_back_to_nyquist() {
    let dir = tempfile::tempdir().unwrap();
    EdfFixture::new(at(10, 0, 0), &["POL Fp1-Ref"], 256, 1).write(&dir.path().join("a.edf"));

    let recording = EdfRecording::load(dir.path(), "a.edf").unwrap();
    assert_eq!(recording.highpass, 0.0);
    assert_eq!(recording.lowpass, 128.0);
}

#[test]
fn test_time_axis() {
    let dir = tempfile::tempdir().unwrap();
    fixture().write(&dir.path().join("a.edf"));

    let recording = EdfRecording::load(dir.path(), "a.edf").unwrap();
    let axis = recording.time_axis_ns().unwrap();
    let start = naive_to_ns(at(10, 21, 33)).unwrap();

    assert_eq!(axis.len(), 30);
    assert_eq!(axis[0], start);
    assert_eq!(axis[1], start + 100_000_000);
    assert_eq!(axis[29], start + 2_900_000_000);
    assert_eq!(recording.end_ns().unwrap(), start + 3_000_000_000);
}

#[test]
fn test_series_partition() {
    let dir = tempfile::tempdir().unwrap();
    fixture().write(&dir.path().join("a.edf"));
    let recording = EdfRecording::load(dir.path(), "a.edf").unwrap();

    let ieeg = recording.series(SeriesKind::Ieeg).unwrap();
    assert_eq!(ieeg.data.dim(), (30, 2));
    assert_eq!(ieeg.data[[7, 1]], 1007.0);
    assert_eq!(
        ieeg.channel_labels,
        vec![
            ChannelLabel(vec!["LA".into(), "1".into()]),
            ChannelLabel(vec!["LA".into(), "2".into()]),
        ]
    );
    assert_eq!(ieeg.attributes.channel_count, 2);
    assert_eq!(ieeg.attributes.sample_rate, 10.0);
    assert_eq!(ieeg.attributes.units, "microvolts");
    assert_eq!(ieeg.channel_coords.dim(), (0, 3));

    let ekg = recording.series(SeriesKind::Ekg).unwrap();
    assert_eq!(ekg.channel_labels, vec![ChannelLabel(vec!["EKG".into(), "".into()])]);
    assert_eq!(ekg.data[[0, 0]], 3000.0);
}

#[test]
fn test_to_nk_file_drops_emg() {
    let dir = tempfile::tempdir().unwrap();
    fixture().write(&dir.path().join("a.edf"));
    let recording = EdfRecording::load(dir.path(), "a.edf").unwrap();

    let file = recording.to_nk_file("PR05").unwrap();
    assert_eq!(file.attributes.subject_id, "PR05");
    assert_eq!(file.attributes.start, recording.start_ns().unwrap());
    assert_eq!(file.attributes.end, recording.end_ns().unwrap());
    assert_eq!(file.series.len(), 4);

    let total: usize = file.series.values().map(|s| s.channel_count()).sum();
    assert_eq!(total, 5);
    for series in file.series.values() {
        assert_eq!(series.len(), 30);
    }
}

#[test]
fn test_mixed_sample_rates_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let mut fixture = EdfFixture::new(at(10, 0, 0), &["LA1", "Fp1"], 10, 2);
    fixture.signals[1] = FixtureSignal::new("Fp1", 20);
    fixture.write(&dir.path().join("mixed.edf"));

    assert!(matches!(
        EdfRecording::load(dir.path(), "mixed.edf"),
        Err(NkError::MixedSampleRates(_))
    ));
}

fn patient_layout() -> (tempfile::TempDir, PipelineConfig) {
    let root = tempfile::tempdir().unwrap();
    let config = PipelineConfig::new("PR05", root.path());
    fs::create_dir_all(config.edf_dir()).unwrap();
    (root, config)
}

#[test]
fn test_convert_edf_dir() {
    let (_root, config) = patient_layout();
    fixture().write(&config.edf_dir().join("PR05_0001.edf"));
    EdfFixture::new(at(11, 5, 0), LABELS, 10, 2).write(&config.edf_dir().join("PR05_0002.edf"));
    fs::write(config.edf_dir().join("notes.txt"), "ignored").unwrap();

    let store = MemoryStore::new();
    let created = pipeline::convert_edf_dir(&config, &store).unwrap();

    assert_eq!(
        created,
        vec![
            config
                .hdf5_dir()
                .join("sub-PR05_ses-stage1_task-continuous_acq-20230614_run-1021_ieeg.h5"),
            config
                .hdf5_dir()
                .join("sub-PR05_ses-stage1_task-continuous_acq-20230614_run-1105_ieeg.h5"),
        ]
    );
    assert!(created[0].exists());

    let second = store.get(&created[1]);
    assert_eq!(second.series(SeriesKind::Ieeg).unwrap().len(), 20);
    assert_eq!(second.series(SeriesKind::Ieeg).unwrap().attributes.time_zone, "US/Pacific");
}

#[test]
fn test_convert_uses_configured_time_zone() {
    let (_root, mut config) = patient_layout();
    config.time_zone = "UTC".to_string();
    fixture().write(&config.edf_dir().join("PR05_0001.edf"));

    let store = MemoryStore::new();
    let created = pipeline::convert_edf_dir(&config, &store).unwrap();
    let file = store.get(&created[0]);
    for series in file.series.values() {
        assert_eq!(series.attributes.time_zone, "UTC");
    }
}

#[test]
fn test_convert_stops_on_bad_file() {
    let (_root, config) = patient_layout();
    fs::write(config.edf_dir().join("broken.edf"), b"0       nope").unwrap();

    let store = MemoryStore::new();
    assert!(pipeline::convert_edf_dir(&config, &store).is_err());
    assert_eq!(store.len(), 0);
}

#[test]
fn test_write_catalog() {
    let (_root, config) = patient_layout();
    fixture().write(&config.edf_dir().join("PR05_0001.edf"));
    EdfFixture::new(at(11, 5, 0), LABELS, 10, 60).write(&config.edf_dir().join("PR05_0002.edf"));
    fs::write(config.edf_dir().join("PR05_0003.edf"), b"not an edf").unwrap();

    let entries = pipeline::write_catalog(&config).unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[1].edf_name, "PR05_0002.edf");
    assert_eq!(
        entries[1].h5_name,
        "sub-PR05_ses-stage1_task-continuous_acq-20230614_run-1105_ieeg.h5"
    );
    assert_eq!(entries[1].edf_start, at(11, 5, 0));
    assert_eq!(entries[1].edf_end, at(11, 6, 0));
    assert_eq!(entries[1].duration_seconds, 60.0);

    assert_eq!(read_catalog(config.catalog_path()).unwrap(), entries);
}

#[test]
fn test_same_minute_recordings_do_not_collide() {
    let (_root, config) = patient_layout();
    EdfFixture::new(at(10, 0, 0), LABELS, 10, 2).write(&config.edf_dir().join("PR05_0001.edf"));
    EdfFixture::new(at(10, 0, 30), LABELS, 10, 3).write(&config.edf_dir().join("PR05_0002.edf"));
    EdfFixture::new(at(11, 5, 0), LABELS, 10, 2).write(&config.edf_dir().join("PR05_0003.edf"));

    let store = MemoryStore::new();
    let created = pipeline::convert_edf_dir(&config, &store).unwrap();
    let names: Vec<String> = created
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(
        names,
        vec![
            "sub-PR05_ses-stage1_task-continuous_acq-20230614_run-100000_ieeg.h5",
            "sub-PR05_ses-stage1_task-continuous_acq-20230614_run-100030_ieeg.h5",
            "sub-PR05_ses-stage1_task-continuous_acq-20230614_run-1105_ieeg.h5",
        ]
    );
    assert_eq!(store.len(), 3);
    assert_eq!(store.get(&created[1]).series(SeriesKind::Ieeg).unwrap().len(), 30);

    // the catalog points at the same files
    let entries = pipeline::write_catalog(&config).unwrap();
    let h5_names: Vec<String> = entries.iter().map(|e| e.h5_name.clone()).collect();
    assert_eq!(h5_names, names);
}

#[test]
fn test_same_second_recordings_rejected() {
    let (_root, config) = patient_layout();
    EdfFixture::new(at(10, 0, 0), LABELS, 10, 2).write(&config.edf_dir().join("PR05_0001.edf"));
    EdfFixture::new(at(10, 0, 0), LABELS, 10, 3).write(&config.edf_dir().join("PR05_0002.edf"));

    let store = MemoryStore::new();
    assert!(matches!(
        pipeline::convert_edf_dir(&config, &store),
        Err(NkError::InvalidFormat(_))
    ));
    assert_eq!(store.len(), 0);
}
