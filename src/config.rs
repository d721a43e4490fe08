//! Run configuration.

use std::fs::File;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Dataset splits to process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSplit {
    Train,
    Test,
    #[default]
    All,
}

impl DataSplit {
    /// Whether the training split is processed.
    pub fn includes_train(self) -> bool {
        matches!(self, DataSplit::Train | DataSplit::All)
    }

    /// Whether the test split is processed.
    pub fn includes_test(self) -> bool {
        matches!(self, DataSplit::Test | DataSplit::All)
    }
}

impl FromStr for DataSplit {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "train" => Ok(DataSplit::Train),
            "test" => Ok(DataSplit::Test),
            "all" => Ok(DataSplit::All),
            other => Err(Error::InvalidConfig(format!(
                "unknown split '{}', expected train, test or all",
                other
            ))),
        }
    }
}

/// Configuration for a relabelling run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OracleConfig {
    /// Ground-truth directory name inside each sequence directory.
    pub groundtruth_dir_name: String,

    /// Extension of the per-frame detection files.
    pub detection_extension: String,

    /// Colors accepted for the background region (white for PPM, black for PGM).
    pub background_colors: Vec<u32>,

    /// Training split directory name, under both the FBMS and detection roots.
    pub training_set_dir: String,

    /// Test split directory name, under both the FBMS and detection roots.
    pub test_set_dir: String,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            groundtruth_dir_name: "GroundTruth".to_string(),
            detection_extension: "json".to_string(),
            background_colors: vec![0, 16777215],
            training_set_dir: "TrainingSet".to_string(),
            test_set_dir: "TestSet".to_string(),
        }
    }
}

impl OracleConfig {
    /// Load a configuration from YAML; missing keys keep their defaults.
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            Error::IoError(std::io::Error::new(
                e.kind(),
                format!("failed to open config '{}': {}", path.display(), e),
            ))
        })?;
        let config: Self = serde_yaml::from_reader(file)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that the configuration is usable.
    pub fn validate(&self) -> Result<()> {
        if self.detection_extension.is_empty() {
            return Err(Error::InvalidConfig(
                "detection_extension must not be empty".to_string(),
            ));
        }
        if self.background_colors.is_empty() {
            return Err(Error::InvalidConfig(
                "background_colors must list at least one color".to_string(),
            ));
        }
        if self.groundtruth_dir_name.is_empty()
            || self.training_set_dir.is_empty()
            || self.test_set_dir.is_empty()
        {
            return Err(Error::InvalidConfig(
                "directory names must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Split directory names selected by `split`, in processing order.
    pub fn split_dirs(&self, split: DataSplit) -> Vec<&str> {
        let mut dirs = Vec::new();
        if split.includes_train() {
            dirs.push(self.training_set_dir.as_str());
        }
        if split.includes_test() {
            dirs.push(self.test_set_dir.as_str());
        }
        dirs
    }
}
