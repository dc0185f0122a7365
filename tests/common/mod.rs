#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{NaiveDate, NaiveDateTime, Timelike, Datelike};

use nkhdf5::{NkError, NkFile, RecordingStore, Result};

pub fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2023, 6, 14)
        .unwrap()
        .and_hms_opt(h, m, s)
        .unwrap()
}

/// One signal of a fixture file. The default physical range equals the
/// digital range, so physical values read back equal the digital ones.
#[derive(Debug, Clone)]
pub struct FixtureSignal {
    pub label: String,
    pub prefilter: String,
    pub samples_per_record: usize,
    pub physical_min: f64,
    pub physical_max: f64,
    pub digital_min: i32,
    pub digital_max: i32,
}

impl FixtureSignal {
    pub fn new(label: &str, samples_per_record: usize) -> Self {
        FixtureSignal {
            label: label.to_string(),
            prefilter: String::new(),
            samples_per_record,
            physical_min: -32768.0,
            physical_max: 32767.0,
            digital_min: -32768,
            digital_max: 32767,
        }
    }

    pub fn prefilter(mut self, prefilter: &str) -> Self {
        self.prefilter = prefilter.to_string();
        self
    }

    pub fn range(mut self, physical: (f64, f64), digital: (i32, i32)) -> Self {
        self.physical_min = physical.0;
        self.physical_max = physical.1;
        self.digital_min = digital.0;
        self.digital_max = digital.1;
        self
    }
}

/// Builds raw EDF bytes. Sample `n` of signal `s` has the digital value
/// `value(s, n)`.
pub struct EdfFixture {
    pub start: NaiveDateTime,
    pub signals: Vec<FixtureSignal>,
    pub records: usize,
    pub record_seconds: f64,
    /// "", "EDF+C" or "EDF+D"
    pub reserved: String,
    /// Written in place of the record count when set
    pub records_field: Option<i64>,
    /// Adds an "EDF Annotations" signal of this many samples per record
    pub annotation_samples: Option<usize>,
    pub value: fn(usize, usize) -> i16,
}

fn default_value(signal: usize, n: usize) -> i16 {
    (signal as i16) * 1000 + (n % 1000) as i16
}

impl EdfFixture {
    pub fn new(start: NaiveDateTime, labels: &[&str], samples_per_record: usize, records: usize) -> Self {
        EdfFixture {
            start,
            signals: labels
                .iter()
                .map(|l| FixtureSignal::new(l, samples_per_record))
                .collect(),
            records,
            record_seconds: 1.0,
            reserved: String::new(),
            records_field: None,
            annotation_samples: None,
            value: default_value,
        }
    }

    pub fn edf_plus(mut self) -> Self {
        self.reserved = "EDF+C".to_string();
        self
    }

    pub fn bytes(&self) -> Vec<u8> {
        let mut all: Vec<FixtureSignal> = self.signals.clone();
        if let Some(n) = self.annotation_samples {
            all.push(FixtureSignal::new("EDF Annotations", n));
        }
        let n = all.len();

        let mut out = Vec::new();
        put(&mut out, "0", 8);
        put(&mut out, "PR05 U X X", 80);
        put(&mut out, "Startdate 14-JUN-2023 X X X", 80);
        put(
            &mut out,
            &format!(
                "{:02}.{:02}.{:02}",
                self.start.day(),
                self.start.month(),
                self.start.year() % 100
            ),
            8,
        );
        put(
            &mut out,
            &format!(
                "{:02}.{:02}.{:02}",
                self.start.hour(),
                self.start.minute(),
                self.start.second()
            ),
            8,
        );
        put(&mut out, &((n + 1) * 256).to_string(), 8);
        put(&mut out, &self.reserved, 44);
        let records_field = self.records_field.unwrap_or(self.records as i64);
        put(&mut out, &records_field.to_string(), 8);
        put(&mut out, &format!("{}", self.record_seconds), 8);
        put(&mut out, &n.to_string(), 4);

        for s in &all {
            put(&mut out, &s.label, 16);
        }
        for _ in &all {
            put(&mut out, "", 80);
        }
        for s in &all {
            put(&mut out, if s.label == "EDF Annotations" { "" } else { "uV" }, 8);
        }
        for s in &all {
            put(&mut out, &format!("{}", s.physical_min), 8);
        }
        for s in &all {
            put(&mut out, &format!("{}", s.physical_max), 8);
        }
        for s in &all {
            put(&mut out, &s.digital_min.to_string(), 8);
        }
        for s in &all {
            put(&mut out, &s.digital_max.to_string(), 8);
        }
        for s in &all {
            put(&mut out, &s.prefilter, 80);
        }
        for s in &all {
            put(&mut out, &s.samples_per_record.to_string(), 8);
        }
        for _ in &all {
            put(&mut out, "", 32);
        }
        assert_eq!(out.len(), (n + 1) * 256);

        for record in 0..self.records {
            for (i, s) in all.iter().enumerate() {
                for k in 0..s.samples_per_record {
                    let value = if i < self.signals.len() {
                        (self.value)(i, record * s.samples_per_record + k)
                    } else {
                        0
                    };
                    out.extend_from_slice(&value.to_le_bytes());
                }
            }
        }
        out
    }

    pub fn write(&self, path: &Path) -> PathBuf {
        fs::write(path, self.bytes()).unwrap();
        path.to_path_buf()
    }
}

fn put(out: &mut Vec<u8>, value: &str, width: usize) {
    let bytes = value.as_bytes();
    assert!(bytes.len() <= width, "'{}' does not fit in {} bytes", value, width);
    out.extend_from_slice(bytes);
    out.extend(std::iter::repeat(b' ').take(width - bytes.len()));
}

/// Keeps files in memory and leaves an empty marker on disk, so directory
/// listings see what was written.
#[derive(Default)]
pub struct MemoryStore {
    pub files: RefCell<BTreeMap<PathBuf, NkFile>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, path: &Path) -> NkFile {
        self.files.borrow().get(path).cloned().unwrap()
    }

    pub fn len(&self) -> usize {
        self.files.borrow().len()
    }
}

impl RecordingStore for MemoryStore {
    fn create(&self, path: &Path, file: &NkFile) -> Result<()> {
        fs::write(path, b"")?;
        self.files
            .borrow_mut()
            .insert(path.to_path_buf(), file.clone());
        Ok(())
    }

    fn open(&self, path: &Path) -> Result<NkFile> {
        self.files
            .borrow()
            .get(path)
            .cloned()
            .ok_or_else(|| NkError::FileNotFound(path.display().to_string()))
    }

    fn format_name(&self) -> &str {
        "memory"
    }
}
