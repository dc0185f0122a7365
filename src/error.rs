use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NkError {
    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid file format: {0}")]
    InvalidFormat(String),

    #[error("Signal index {0} out of range")]
    InvalidSignalIndex(usize),

    #[error("Unsupported file type: {0}")]
    UnsupportedFileType(String),

    #[error("File is discontinuous (EDF+D)")]
    DiscontinuousFile,

    #[error("Invalid header size")]
    InvalidHeader,

    #[error("Invalid number of signals: {0}")]
    InvalidSignalCount(i32),

    #[error("Physical min equals physical max")]
    PhysicalMinEqualsMax,

    #[error("Digital min equals digital max")]
    DigitalMinEqualsMax,

    #[error("Signals use different sample rates: {0:?}")]
    MixedSampleRates(Vec<f64>),

    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("Channel count mismatch: expected {expected}, found {found}")]
    ChannelMismatch { expected: usize, found: usize },

    #[error("Missing {kind} '{name}'")]
    Missing { kind: &'static str, name: String },

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Array shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),

    #[cfg(feature = "hdf5-support")]
    #[error("HDF5 error: {0}")]
    Hdf5(#[from] hdf5::Error),
}

impl NkError {
    pub(crate) fn missing(kind: &'static str, name: impl Into<String>) -> Self {
        NkError::Missing { kind, name: name.into() }
    }
}

pub type Result<T> = std::result::Result<T, NkError>;
