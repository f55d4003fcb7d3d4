use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::config::PipelineConfig;
use crate::error::PipelineError;

/// Extensions accepted as images. Matching is exact and case-sensitive.
pub const IMAGE_EXTENSIONS: &[&str] = &["jpeg", "jpg"];

/// One labelled image: an absolute path and the index of its class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRecord {
    pub path: PathBuf,
    pub label: usize,
}

/// Returns true when the path carries one of [`IMAGE_EXTENSIONS`]
pub fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext))
        .unwrap_or(false)
}

/// Builds the labelled image list for every configured class.
///
/// Records are grouped by class in configuration order; within a class they
/// follow the directory listing order of the filesystem, which is stable for
/// an unchanged directory but not sorted. Subdirectories and files with other
/// extensions are skipped without notice.
///
/// # Errors
/// - `MissingDatasetDirectory` if any class directory does not exist
/// - `Io` if a directory cannot be listed or a path cannot be made absolute
pub fn assign_labels(config: &PipelineConfig) -> Result<Vec<ImageRecord>, PipelineError> {
    let mut records = Vec::new();

    for (label, class) in config.classes.iter().enumerate() {
        let dir = config.class_dir(class);
        if !dir.is_dir() {
            return Err(PipelineError::MissingDatasetDirectory {
                class: class.clone(),
                path: dir,
            });
        }

        let before = records.len();
        for entry in fs::read_dir(&dir)? {
            let path = entry?.path();
            if !path.is_file() {
                debug!("Skipping non-file entry {:?}", path);
                continue;
            }
            if !is_supported_image(&path) {
                continue;
            }
            records.push(ImageRecord {
                path: std::path::absolute(&path)?,
                label,
            });
        }
        info!("Class '{}' (label {}): {} images", class, label, records.len() - before);
    }

    Ok(records)
}
