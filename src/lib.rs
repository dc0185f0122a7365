//! # nkhdf5
//!
//! Converts Nihon Kohden EDF recordings into a fixed HDF5 layout and
//! assembles the short recordings that precede clinical biomarker surveys.
//!
//! The pipeline has four steps, each available as a function in
//! [`pipeline`] and as a subcommand of the `nkhdf5` binary:
//!
//! 1. [`pipeline::write_catalog`] scans EDF headers into a CSV catalog.
//! 2. [`pipeline::convert_edf_dir`] writes one HDF5 file per EDF file, with
//!    channels split into intracranial EEG, scalp EEG, EKG and DC series.
//! 3. [`pipeline::concat_biomarkers`] joins the converted files around each
//!    survey and cuts the window that ends at the survey.
//! 4. [`pipeline::clean_biomarkers`] drops duplicated time stamps.
//!
//! ## Reading an EDF file
//!
//! ```rust,no_run
//! use nkhdf5::{EdfRecording, SeriesKind, Result};
//!
//! fn main() -> Result<()> {
//!     let recording = EdfRecording::load("/data/PR05/PR05", "PR05_0001.edf")?;
//!     println!("{} channels at {} Hz", recording.channel_count(), recording.sample_rate);
//!
//!     let ieeg = recording.series(SeriesKind::Ieeg)?;
//!     println!("{} intracranial samples", ieeg.len());
//!     Ok(())
//! }
//! ```
//!
//! ## Storage
//!
//! Pipelines write through the [`RecordingStore`] trait. [`Hdf5Store`] is the
//! real implementation and needs the `hdf5-support` feature; without it
//! every call returns [`NkError::UnsupportedFormat`].

pub mod biomarker;
pub mod catalog;
pub mod channels;
pub mod config;
pub mod dedup;
pub mod error;
pub mod hdf5nk;
pub mod pipeline;
pub mod reader;
pub mod recording;
pub mod series;
pub mod store;
pub mod types;
pub mod utils;

pub use biomarker::FileFormat;
pub use catalog::EdfCatalogEntry;
pub use channels::ChannelType;
pub use config::PipelineConfig;
pub use error::{NkError, Result};
pub use hdf5nk::Hdf5Store;
pub use reader::EdfReader;
pub use recording::{EdfRecording, EdfSummary};
pub use series::{ChannelLabel, ElectricalSeries, FileAttributes, NkFile, SeriesAttributes, SeriesKind};
pub use store::RecordingStore;
pub use types::{EdfHeader, FileType, SignalParam};

// EDF time values are kept in 100 ns units
pub const EDFLIB_TIME_DIMENSION: i64 = 10_000_000;
pub const EDFLIB_MAXSIGNALS: usize = 4096;

/// Library version
///
/// ```rust
/// assert!(nkhdf5::version().contains('.'));
/// ```
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// Whether this build can read and write HDF5 files.
pub fn hdf5_enabled() -> bool {
    cfg!(feature = "hdf5-support")
}
