//! Pipeline configuration and the on-disk layout of a patient's data.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::error::{NkError, Result};
use crate::series::DEFAULT_TIME_ZONE;

pub const DEFAULT_STAGE1_PATH: &str = "/data_store0/presidio/nihon_kohden";
pub const DEFAULT_LOOKUP_MINUTES: i64 = 10;
pub const DEFAULT_WINDOW_MINUTES: i64 = 6;

/// Settings shared by every pipeline step. Missing JSON fields take their
/// defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub patient_id: String,
    pub stage1_path: PathBuf,
    /// How far before a survey to look for source files
    pub lookup_minutes: i64,
    /// Length of each biomarker recording, ending at the survey
    pub window_minutes: i64,
    pub time_zone: String,
    /// Biomarker files left out of the clean-up pass
    pub exclude: Vec<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            patient_id: String::new(),
            stage1_path: PathBuf::from(DEFAULT_STAGE1_PATH),
            lookup_minutes: DEFAULT_LOOKUP_MINUTES,
            window_minutes: DEFAULT_WINDOW_MINUTES,
            time_zone: DEFAULT_TIME_ZONE.to_string(),
            exclude: Vec::new(),
        }
    }
}

impl PipelineConfig {
    pub fn new(patient_id: impl Into<String>, stage1_path: impl Into<PathBuf>) -> Self {
        PipelineConfig {
            patient_id: patient_id.into(),
            stage1_path: stage1_path.into(),
            ..Default::default()
        }
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .map_err(|e| NkError::FileNotFound(format!("{}: {}", path.display(), e)))?;
        Ok(serde_json::from_str(&text)?)
    }

    pub fn validate(&self) -> Result<()> {
        if self.patient_id.trim().is_empty() {
            return Err(NkError::Config("patient_id is required".to_string()));
        }
        if self.lookup_minutes <= 0 {
            return Err(NkError::Config(format!(
                "lookup_minutes must be positive, got {}", self.lookup_minutes
            )));
        }
        if self.window_minutes <= 0 {
            return Err(NkError::Config(format!(
                "window_minutes must be positive, got {}", self.window_minutes
            )));
        }
        Ok(())
    }

    pub fn lookup(&self) -> Duration {
        Duration::minutes(self.lookup_minutes)
    }

    pub fn window(&self) -> Duration {
        Duration::minutes(self.window_minutes)
    }

    pub fn patient_dir(&self) -> PathBuf {
        self.stage1_path.join(&self.patient_id)
    }

    pub fn edf_dir(&self) -> PathBuf {
        self.patient_dir().join(&self.patient_id)
    }

    pub fn hdf5_dir(&self) -> PathBuf {
        self.patient_dir().join("nkhdf5").join("edf_to_hdf5")
    }

    pub fn biomarker_dir(&self) -> PathBuf {
        self.patient_dir().join("nkhdf5").join("biomarker")
    }

    pub fn biomarker_clean_dir(&self) -> PathBuf {
        self.patient_dir().join("nkhdf5").join("biomarker_clean")
    }

    pub fn catalog_path(&self) -> PathBuf {
        self.patient_dir()
            .join(format!("{}_edf_catalog.csv", self.patient_id))
    }

    pub fn survey_path(&self) -> PathBuf {
        self.patient_dir()
            .join("clinical_scores")
            .join("BiomarkerSurveys.csv")
    }

    pub fn is_excluded(&self, file_name: &str) -> bool {
        self.exclude.iter().any(|e| e == file_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.lookup(), Duration::minutes(10));
        assert_eq!(config.window(), Duration::minutes(6));
        assert_eq!(config.time_zone, "US/Pacific");
        assert!(config.exclude.is_empty());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_layout() {
        let config = PipelineConfig::new("PR05", "/data");
        assert_eq!(config.edf_dir(), PathBuf::from("/data/PR05/PR05"));
        assert_eq!(config.hdf5_dir(), PathBuf::from("/data/PR05/nkhdf5/edf_to_hdf5"));
        assert_eq!(config.biomarker_dir(), PathBuf::from("/data/PR05/nkhdf5/biomarker"));
        assert_eq!(
            config.biomarker_clean_dir(),
            PathBuf::from("/data/PR05/nkhdf5/biomarker_clean")
        );
        assert_eq!(config.catalog_path(), PathBuf::from("/data/PR05/PR05_edf_catalog.csv"));
        assert_eq!(
            config.survey_path(),
            PathBuf::from("/data/PR05/clinical_scores/BiomarkerSurveys.csv")
        );
    }

    #[test]
    fn test_partial_json_takes_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pr06.json");
        fs::write(
            &path,
            r#"{"patient_id": "PR06", "exclude": ["sub-PR06_task-biomarker_0025_ieeg.h5"]}"#,
        )
        .unwrap();

        let config = PipelineConfig::from_json_file(&path).unwrap();
        assert_eq!(config.patient_id, "PR06");
        assert_eq!(config.stage1_path, PathBuf::from(DEFAULT_STAGE1_PATH));
        assert_eq!(config.window_minutes, 6);
        assert!(config.is_excluded("sub-PR06_task-biomarker_0025_ieeg.h5"));
        assert!(!config.is_excluded("sub-PR06_task-biomarker_0026_ieeg.h5"));
        config.validate().unwrap();
    }

    #[test]
    fn test_invalid_json_and_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(PipelineConfig::from_json_file(&path), Err(NkError::Json(_))));

        let mut config = PipelineConfig::new("PR05", "/data");
        config.window_minutes = 0;
        assert!(matches!(config.validate(), Err(NkError::Config(_))));
    }
}
