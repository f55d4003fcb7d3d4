use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::error::PipelineError;

/// Cuisines classified when no explicit list is given. The position of a
/// name in this list is the integer label of its images.
pub const DEFAULT_CUISINES: &[&str] = &[
    "chinese",
    "indian",
    "japanese",
    "korean",
    "russian",
    "thai",
];

/// Fraction of the labelled images held out for testing.
pub const DEFAULT_TEST_FRACTION: f64 = 0.1;

/// Suffix appended to a class name to form its image directory.
pub const CLASS_DIR_SUFFIX: &str = "_meals";

/// The four meals classified after training and shown in the sample grid.
pub fn default_sample_meals() -> Vec<PathBuf> {
    vec![
        PathBuf::from("russian_meals/russian0020.jpeg"),
        PathBuf::from("indian_meals/indian0013.jpeg"),
        PathBuf::from("japanese_meals/japanese0026.jpeg"),
        PathBuf::from("thai_meals/thai0160.jpeg"),
    ]
}

/// Everything a run needs to know, passed explicitly to each stage.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Ordered class names; index == label.
    pub classes: Vec<String>,
    /// Directory holding the `<class>_meals` folders.
    pub data_root: PathBuf,
    pub test_fraction: f64,
    /// Shuffle seed for the train/test split. `None` draws a fresh split every run.
    pub seed: Option<u64>,
    /// Sample images, relative to `data_root` unless absolute.
    pub sample_meals: Vec<PathBuf>,
    pub report_dir: PathBuf,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            classes: DEFAULT_CUISINES.iter().map(|c| c.to_string()).collect(),
            data_root: PathBuf::from("."),
            test_fraction: DEFAULT_TEST_FRACTION,
            seed: None,
            sample_meals: default_sample_meals(),
            report_dir: PathBuf::from("reports"),
        }
    }
}

impl PipelineConfig {
    /// Creates a configuration over the given classes with all other values defaulted
    pub fn with_classes(classes: Vec<impl Into<String>>) -> Self {
        Self {
            classes: classes.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn num_classes(&self) -> usize {
        self.classes.len()
    }

    /// Directory expected to hold the images of `class`
    pub fn class_dir(&self, class: &str) -> PathBuf {
        self.data_root.join(format!("{}{}", class, CLASS_DIR_SUFFIX))
    }

    /// Returns the class name encoded by `label`, if it is in range
    pub fn class_name(&self, label: usize) -> Option<&str> {
        self.classes.get(label).map(String::as_str)
    }

    /// Resolves a sample path against the data root
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.data_root.join(path)
        }
    }

    /// Class whose image directory holds `sample`, if that is a configured class
    pub fn sample_class(&self, sample: &Path) -> Option<&str> {
        let dir = sample.parent()?.file_name()?.to_str()?;
        let class = dir.strip_suffix(CLASS_DIR_SUFFIX)?;
        self.classes.iter().map(String::as_str).find(|c| *c == class)
    }

    /// Checks the rules every stage relies on:
    /// - at least one class, no empty or duplicate names
    /// - test fraction strictly between 0 and 1
    /// - every sample meal lives in the directory of a configured class
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.classes.is_empty() {
            return Err(PipelineError::InvalidConfig("At least one class is required".into()));
        }
        if let Some(pos) = self.classes.iter().position(|c| c.is_empty()) {
            return Err(PipelineError::InvalidConfig(
                format!("Class name {} cannot be empty", pos + 1)
            ));
        }
        let mut seen = HashSet::new();
        for class in &self.classes {
            if !seen.insert(class.as_str()) {
                return Err(PipelineError::InvalidConfig(
                    format!("Duplicate class name '{}'", class)
                ));
            }
        }
        if !(self.test_fraction > 0.0 && self.test_fraction < 1.0) {
            return Err(PipelineError::InvalidConfig(
                format!("Test fraction must be between 0 and 1, got {}", self.test_fraction)
            ));
        }
        if let Some(stray) = self.sample_meals.iter().find(|s| self.sample_class(s).is_none()) {
            return Err(PipelineError::InvalidConfig(format!(
                "Sample meal {:?} is not inside a configured class directory", stray
            )));
        }
        Ok(())
    }
}
