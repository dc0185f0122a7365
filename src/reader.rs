use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;
use chrono::{NaiveDate, NaiveTime};

use crate::types::{EdfHeader, FileType, SignalParam};
use crate::error::{NkError, Result};
use crate::utils::{atoi_nonlocalized, atof_nonlocalized, parse_edf_time};

/// Label reserved by EDF+ for the annotation channel
const ANNOTATION_LABEL: &str = "EDF Annotations";

/// Reader for EDF and continuous EDF+ recordings.
///
/// Annotation channels are hidden: `header().signals` only lists ordinary
/// signals and every signal index used by the read methods refers to that
/// list.
///
/// # Examples
///
/// ```no_run
/// use nkhdf5::EdfReader;
///
/// let mut reader = EdfReader::open("PR05_0010.edf")?;
/// let header = reader.header();
/// println!("{} signals, {:.1} s", header.signals.len(), header.duration_seconds());
///
/// let first_second = reader.read_physical_samples(0, 1000)?;
/// println!("read {} samples", first_second.len());
/// # Ok::<(), nkhdf5::NkError>(())
/// ```
pub struct EdfReader {
    file: BufReader<File>,
    header: EdfHeader,
    /// Layout of each ordinary signal inside a data record
    signal_info: Vec<SignalInfo>,
    /// Next sample to read, per ordinary signal
    sample_positions: Vec<i64>,
    header_size: usize,
    /// Bytes per data record, annotation channels included
    record_size: usize,
}

#[derive(Debug, Clone)]
struct SignalInfo {
    /// Byte offset of the signal inside a data record
    buffer_offset: usize,
    samples_per_record: i32,
}

impl EdfReader {
    /// Opens an EDF or EDF+C file and parses its header.
    ///
    /// # Errors
    ///
    /// * `NkError::FileNotFound` - the path cannot be opened
    /// * `NkError::DiscontinuousFile` - the file is EDF+D
    /// * `NkError::InvalidHeader` / `NkError::InvalidSignalCount` - malformed header
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(&path)
            .map_err(|e| NkError::FileNotFound(format!("{}: {}", path.as_ref().display(), e)))?;
        let file_len = file.metadata()?.len();

        let mut reader = BufReader::new(file);
        let (mut header, signal_info, header_size, record_size) = Self::parse_header(&mut reader)?;

        // A writer that crashed leaves -1 in the record count
        if header.datarecords_in_file < 0 && record_size > 0 {
            let payload = file_len.saturating_sub(header_size as u64);
            header.datarecords_in_file = (payload / record_size as u64) as i64;
            header.file_duration = header.datarecord_duration * header.datarecords_in_file;
            for signal in &mut header.signals {
                signal.samples_in_file = signal.samples_per_record as i64 * header.datarecords_in_file;
            }
        }

        let sample_positions = vec![0i64; header.signals.len()];

        Ok(EdfReader {
            file: reader,
            header,
            signal_info,
            sample_positions,
            header_size,
            record_size,
        })
    }

    pub fn header(&self) -> &EdfHeader {
        &self.header
    }

    /// Reads up to `count` samples of `signal` converted to physical units.
    pub fn read_physical_samples(&mut self, signal: usize, count: usize) -> Result<Vec<f64>> {
        let digital_samples = self.read_digital_samples(signal, count)?;

        let signal_param = &self.header.signals[signal];
        let physical_samples = digital_samples
            .into_iter()
            .map(|d| signal_param.to_physical(d))
            .collect();

        Ok(physical_samples)
    }

    /// Reads every sample of `signal` from the start of the file.
    pub fn read_all_physical(&mut self, signal: usize) -> Result<Vec<f64>> {
        self.rewind(signal)?;
        let total = self.header.signals[signal].samples_in_file.max(0) as usize;
        self.read_physical_samples(signal, total)
    }

    /// Reads up to `count` raw samples of `signal`, clamped to the digital
    /// range. Reading stops early at the end of the file.
    pub fn read_digital_samples(&mut self, signal: usize, count: usize) -> Result<Vec<i32>> {
        if signal >= self.header.signals.len() {
            return Err(NkError::InvalidSignalIndex(signal));
        }

        if count == 0 {
            return Ok(Vec::new());
        }

        let signal_info = self.signal_info[signal].clone();
        let (digital_min, digital_max) = {
            let p = &self.header.signals[signal];
            (p.digital_min, p.digital_max)
        };
        let per_record = signal_info.samples_per_record as i64;
        if per_record <= 0 {
            return Ok(Vec::new());
        }

        let samples_in_file = per_record * self.header.datarecords_in_file;
        let available_samples = (samples_in_file - self.sample_positions[signal]).max(0) as usize;
        let actual_count = count.min(available_samples);

        let mut samples = Vec::with_capacity(actual_count);
        let mut buf = Vec::new();

        while samples.len() < actual_count {
            let current_pos = self.sample_positions[signal];
            let record_index = current_pos / per_record;
            let sample_in_record = current_pos % per_record;

            let file_offset = self.header_size as u64
                + record_index as u64 * self.record_size as u64
                + signal_info.buffer_offset as u64
                + sample_in_record as u64 * 2;
            self.file.seek(SeekFrom::Start(file_offset))?;

            let left_in_record = (per_record - sample_in_record) as usize;
            let to_read = (actual_count - samples.len()).min(left_in_record);

            buf.resize(to_read * 2, 0);
            self.file.read_exact(&mut buf)?;

            samples.extend(buf.chunks_exact(2).map(|b| {
                (i16::from_le_bytes([b[0], b[1]]) as i32).clamp(digital_min, digital_max)
            }));

            self.sample_positions[signal] = current_pos + to_read as i64;
        }

        Ok(samples)
    }

    /// Moves the read position of `signal`, clamped to the file bounds.
    pub fn seek(&mut self, signal: usize, position: i64) -> Result<i64> {
        if signal >= self.header.signals.len() {
            return Err(NkError::InvalidSignalIndex(signal));
        }

        let signal_param = &self.header.signals[signal];
        let max_position = signal_param.samples_per_record as i64 * self.header.datarecords_in_file;

        let new_position = position.clamp(0, max_position.max(0));
        self.sample_positions[signal] = new_position;

        Ok(new_position)
    }

    pub fn tell(&self, signal: usize) -> Result<i64> {
        if signal >= self.header.signals.len() {
            return Err(NkError::InvalidSignalIndex(signal));
        }

        Ok(self.sample_positions[signal])
    }

    pub fn rewind(&mut self, signal: usize) -> Result<()> {
        self.seek(signal, 0)?;
        Ok(())
    }

    fn parse_header(reader: &mut BufReader<File>) -> Result<(EdfHeader, Vec<SignalInfo>, usize, usize)> {
        reader.seek(SeekFrom::Start(0))?;
        let mut fixed = [0u8; 256];
        reader.read_exact(&mut fixed)
            .map_err(|_| NkError::InvalidFormat("File shorter than an EDF header".to_string()))?;
        let text = |range: std::ops::Range<usize>| String::from_utf8_lossy(&fixed[range]).trim().to_string();

        let version = text(0..8);
        if version != "0" {
            return Err(NkError::UnsupportedFileType(format!("Not an EDF file: '{}'", version)));
        }

        let ns = atoi_nonlocalized(&text(252..256));
        if !(1..=crate::EDFLIB_MAXSIGNALS as i32).contains(&ns) {
            return Err(NkError::InvalidSignalCount(ns));
        }
        let header_size = (ns as usize + 1) * 256;
        if atoi_nonlocalized(&text(184..192)) != header_size as i32 {
            return Err(NkError::InvalidHeader);
        }

        let file_type = match text(192..236) {
            r if r.starts_with("EDF+D") => return Err(NkError::DiscontinuousFile),
            r if r.starts_with("EDF+C") => FileType::EdfPlusContinuous,
            _ => FileType::Edf,
        };

        let (start_date, start_time) = Self::parse_datetime(&text(168..176), &text(176..184))?;
        let records = atoi_nonlocalized(&text(236..244)) as i64;

        let record_duration_text = text(244..252);
        let datarecord_duration = parse_edf_time(&record_duration_text)?;
        if datarecord_duration <= 0 {
            return Err(NkError::InvalidFormat(format!(
                "Data record duration must be positive, got '{}'", record_duration_text
            )));
        }

        let mut per_signal = vec![0u8; ns as usize * 256];
        reader.read_exact(&mut per_signal)
            .map_err(|_| NkError::InvalidFormat("Truncated signal header".to_string()))?;
        let (signals, signal_info, record_size) = Self::parse_signals(&per_signal, ns as usize, records)?;

        let mut header = EdfHeader {
            file_type,
            signals,
            file_duration: datarecord_duration * records.max(0),
            start_date,
            start_time,
            datarecords_in_file: records,
            datarecord_duration,
            ..Default::default()
        };

        let patient = text(8..88);
        let recording = text(88..168);
        if file_type == FileType::Edf {
            header.patient_name = patient;
            header.recording_additional = recording;
        } else {
            Self::fill_edfplus_patient(&mut header, &patient);
            Self::fill_edfplus_recording(&mut header, &recording);
        }

        Ok((header, signal_info, header_size, record_size))
    }

    /// "dd.mm.yy" and "hh.mm.ss"; years above 84 are 19xx.
    fn parse_datetime(date: &str, time: &str) -> Result<(NaiveDate, NaiveTime)> {
        fn triple(s: &str) -> Option<(u32, u32, u32)> {
            let mut it = s.split('.').map(|p| atoi_nonlocalized(p).max(0) as u32);
            let parsed = (it.next()?, it.next()?, it.next()?);
            it.next().is_none().then_some(parsed)
        }

        let start_date = triple(date)
            .and_then(|(d, m, yy)| {
                let year = if yy > 84 { 1900 + yy } else { 2000 + yy };
                NaiveDate::from_ymd_opt(year as i32, m, d)
            })
            .ok_or_else(|| NkError::InvalidFormat(format!("Invalid start date '{}'", date)))?;
        let start_time = triple(time)
            .and_then(|(h, m, s)| NaiveTime::from_hms_opt(h, m, s))
            .ok_or_else(|| NkError::InvalidFormat(format!("Invalid start time '{}'", time)))?;

        Ok((start_date, start_time))
    }

    /// Signal headers are stored field-major: all labels, then all
    /// transducers, and so on.
    fn parse_signals(
        signal_header: &[u8],
        total_signal_count: usize,
        datarecords: i64
    ) -> Result<(Vec<SignalParam>, Vec<SignalInfo>, usize)> {
        let n = total_signal_count;
        let field = |base: usize, width: usize, i: usize| -> String {
            let start = base * n + i * width;
            String::from_utf8_lossy(&signal_header[start..start + width]).trim().to_string()
        };

        let mut signals = Vec::new();
        let mut signal_info = Vec::new();
        let mut buffer_offset = 0;

        for i in 0..n {
            let label = field(0, 16, i);
            let transducer = field(16, 80, i);
            let physical_dimension = field(96, 8, i);
            let physical_min = atof_nonlocalized(&field(104, 8, i));
            let physical_max = atof_nonlocalized(&field(112, 8, i));
            let digital_min = atoi_nonlocalized(&field(120, 8, i));
            let digital_max = atoi_nonlocalized(&field(128, 8, i));
            let prefilter = field(136, 80, i);
            let samples_per_record = atoi_nonlocalized(&field(216, 8, i));

            if samples_per_record < 1 {
                return Err(NkError::InvalidFormat(format!(
                    "Signal '{}' has {} samples per record", label, samples_per_record
                )));
            }

            if label != ANNOTATION_LABEL {
                if physical_min == physical_max {
                    return Err(NkError::PhysicalMinEqualsMax);
                }
                if digital_min == digital_max {
                    return Err(NkError::DigitalMinEqualsMax);
                }

                signal_info.push(SignalInfo {
                    buffer_offset,
                    samples_per_record,
                });

                signals.push(SignalParam {
                    label,
                    samples_in_file: samples_per_record as i64 * datarecords.max(0),
                    physical_max,
                    physical_min,
                    digital_max,
                    digital_min,
                    samples_per_record,
                    physical_dimension,
                    prefilter,
                    transducer,
                });
            }

            // 2 bytes per sample
            buffer_offset += samples_per_record as usize * 2;
        }

        Ok((signals, signal_info, buffer_offset))
    }

    /// "code sex birthdate name additional..."
    fn fill_edfplus_patient(header: &mut EdfHeader, field: &str) {
        let mut words = field.split_whitespace();
        let mut next = || words.next().unwrap_or_default().to_string();
        header.patient_code = next();
        header.sex = next();
        header.birthdate = next();
        header.patient_name = next();
        header.patient_additional = words.collect::<Vec<_>>().join(" ");
    }

    /// "Startdate dd-MMM-yyyy admincode technician equipment additional..."
    fn fill_edfplus_recording(header: &mut EdfHeader, field: &str) {
        let mut words = field.split_whitespace().skip(2);
        let mut next = || words.next().unwrap_or_default().to_string();
        header.admin_code = next();
        header.technician = next();
        header.equipment = next();
        header.recording_additional = words.collect::<Vec<_>>().join(" ");
    }
}
