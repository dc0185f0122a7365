use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use crate::EDFLIB_TIME_DIMENSION;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FileType {
    /// Plain EDF, no reserved-field marker
    #[default]
    Edf,
    /// EDF+C; EDF+D files are rejected when opened
    EdfPlusContinuous,
}

#[derive(Debug, Clone)]
pub struct SignalParam {
    pub label: String,
    pub samples_in_file: i64,
    pub physical_max: f64,
    pub physical_min: f64,
    pub digital_max: i32,
    pub digital_min: i32,
    pub samples_per_record: i32,
    pub physical_dimension: String,
    pub prefilter: String,
    pub transducer: String,
}

impl SignalParam {
    /// Physical units per digital step
    pub fn bit_value(&self) -> f64 {
        (self.physical_max - self.physical_min) /
        (self.digital_max - self.digital_min) as f64
    }

    pub fn offset(&self) -> f64 {
        self.physical_max / self.bit_value() - self.digital_max as f64
    }

    pub fn to_physical(&self, digital_value: i32) -> f64 {
        self.bit_value() * (self.offset() + digital_value as f64)
    }
}

#[derive(Debug, Clone, Default)]
pub struct EdfHeader {
    pub file_type: FileType,
    pub signals: Vec<SignalParam>,
    pub file_duration: i64,           // 100 ns units
    pub start_date: NaiveDate,
    pub start_time: NaiveTime,
    pub datarecords_in_file: i64,
    pub datarecord_duration: i64,     // 100 ns units

    // Only meaningful for EDF+; plain EDF keeps the raw fields in
    // `patient_name` and `recording_additional`.
    pub patient_code: String,
    pub sex: String,
    pub birthdate: String,
    pub patient_name: String,
    pub patient_additional: String,
    pub admin_code: String,
    pub technician: String,
    pub equipment: String,
    pub recording_additional: String,
}

impl EdfHeader {
    /// Wall-clock start of the recording as written in the header.
    pub fn start_datetime(&self) -> NaiveDateTime {
        self.start_date.and_time(self.start_time)
    }

    /// Sampling frequency of a signal in Hz.
    ///
    /// Returns `None` for an out-of-range index or a zero record duration.
    pub fn sample_rate(&self, signal: usize) -> Option<f64> {
        let param = self.signals.get(signal)?;
        if self.datarecord_duration <= 0 {
            return None;
        }
        let record_seconds = self.datarecord_duration as f64 / EDFLIB_TIME_DIMENSION as f64;
        Some(param.samples_per_record as f64 / record_seconds)
    }

    pub fn duration_seconds(&self) -> f64 {
        self.file_duration as f64 / EDFLIB_TIME_DIMENSION as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signal(samples_per_record: i32) -> SignalParam {
        SignalParam {
            label: "POL LA1-Ref".to_string(),
            samples_in_file: 0,
            physical_max: 100.0,
            physical_min: -100.0,
            digital_max: 32767,
            digital_min: -32768,
            samples_per_record,
            physical_dimension: "uV".to_string(),
            prefilter: String::new(),
            transducer: String::new(),
        }
    }

    #[test]
    fn test_physical_conversion() {
        let s = signal(256);
        assert!((s.to_physical(16384) - 50.0).abs() < 0.1);
        assert!((s.to_physical(-32768) + 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_sample_rate_uses_record_duration() {
        let header = EdfHeader {
            file_type: FileType::Edf,
            signals: vec![signal(1000)],
            file_duration: 4 * EDFLIB_TIME_DIMENSION,
            start_date: NaiveDate::from_ymd_opt(2023, 6, 14).unwrap(),
            start_time: NaiveTime::from_hms_opt(10, 21, 0).unwrap(),
            datarecords_in_file: 2,
            datarecord_duration: 2 * EDFLIB_TIME_DIMENSION,
            ..Default::default()
        };
        assert_eq!(header.sample_rate(0), Some(500.0));
        assert_eq!(header.sample_rate(1), None);
        assert_eq!(header.duration_seconds(), 4.0);
    }
}
