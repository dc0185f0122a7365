use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use nkhdf5::{NkError, PipelineConfig, Result};

#[derive(Parser)]
#[command(
    name = "nkhdf5",
    version,
    about = "Nihon Kohden EDF to HDF5 conversion and biomarker assembly",
    long_about = "Convert Nihon Kohden EDF recordings to HDF5, catalog them, and build the\n\
                  recordings preceding biomarker surveys. HDF5 output needs a build with\n\
                  --features hdf5-support."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Command {
    /// Scan EDF headers and write the patient's EDF catalog
    Catalog(CatalogArgs),
    /// Convert EDF files to HDF5
    Convert(ConvertArgs),
    /// Build one biomarker recording per survey
    Concat(ConcatArgs),
    /// Drop duplicated time stamps from biomarker recordings
    Dedup(DedupArgs),
    /// Summarise an HDF5 or EDF file
    Inspect(InspectArgs),
}

/// Settings shared by the pipeline subcommands. Flags override the JSON
/// file given with --config.
#[derive(Args, Debug, Clone, Default)]
pub struct ConfigArgs {
    /// JSON pipeline configuration
    #[arg(long, env = "NKHDF5_CONFIG")]
    pub config: Option<PathBuf>,

    /// Patient identifier, e.g. PR05
    #[arg(short, long, env = "NKHDF5_PATIENT_ID")]
    pub patient: Option<String>,

    /// Root of the per-patient data directories
    #[arg(long, env = "NKHDF5_STAGE1_PATH")]
    pub stage1: Option<PathBuf>,

    /// Minutes before a survey to search for recordings
    #[arg(long, env = "NKHDF5_LOOKUP_MINUTES")]
    pub lookup_minutes: Option<i64>,

    /// Length of each biomarker recording in minutes
    #[arg(long, env = "NKHDF5_WINDOW_MINUTES")]
    pub window_minutes: Option<i64>,

    /// Time zone recorded in the time axis attributes
    #[arg(long, env = "NKHDF5_TIME_ZONE")]
    pub time_zone: Option<String>,

    /// Biomarker file names to leave out of dedup (repeatable or comma separated)
    #[arg(long, env = "NKHDF5_EXCLUDE", value_delimiter = ',')]
    pub exclude: Vec<String>,
}

impl ConfigArgs {
    pub fn resolve(&self) -> Result<PipelineConfig> {
        let mut config = match &self.config {
            Some(path) => PipelineConfig::from_json_file(path)?,
            None => PipelineConfig::default(),
        };
        if let Some(patient) = &self.patient {
            config.patient_id = patient.clone();
        }
        if let Some(stage1) = &self.stage1 {
            config.stage1_path = stage1.clone();
        }
        if let Some(minutes) = self.lookup_minutes {
            config.lookup_minutes = minutes;
        }
        if let Some(minutes) = self.window_minutes {
            config.window_minutes = minutes;
        }
        if let Some(tz) = &self.time_zone {
            config.time_zone = tz.clone();
        }
        config.exclude.extend(self.exclude.iter().cloned());
        config.validate()?;
        Ok(config)
    }
}

#[derive(Args, Debug, Clone, Default)]
pub struct StoreArgs {
    /// Deflate level for HDF5 datasets
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=9))]
    pub compression: Option<u8>,
}

impl StoreArgs {
    pub fn store(&self) -> nkhdf5::Hdf5Store {
        nkhdf5::Hdf5Store::new().with_compression(self.compression)
    }
}

#[derive(Args)]
pub struct CatalogArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Print the catalog as JSON
    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Args)]
pub struct ConvertArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    #[command(flatten)]
    pub store: StoreArgs,

    /// Convert a single EDF file instead of the patient's EDF directory
    #[arg(long)]
    pub file: Option<PathBuf>,

    /// Output directory (default: <stage1>/<patient>/nkhdf5/edf_to_hdf5)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Args)]
pub struct ConcatArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    #[command(flatten)]
    pub store: StoreArgs,
}

#[derive(Args)]
pub struct DedupArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    #[command(flatten)]
    pub store: StoreArgs,
}

#[derive(Args)]
pub struct InspectArgs {
    /// HDF5 file written by nkhdf5, or an EDF file
    pub file: PathBuf,

    /// Output as JSON
    #[arg(long, default_value_t = false)]
    pub json: bool,

    /// Compact JSON output (no indentation)
    #[arg(long, default_value_t = false)]
    pub compact: bool,
}

pub fn missing_file(path: &std::path::Path) -> NkError {
    NkError::FileNotFound(path.display().to_string())
}
