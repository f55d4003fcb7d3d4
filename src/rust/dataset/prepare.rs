use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::config::PipelineConfig;
use crate::error::PipelineError;

/// Image URLs to fetch for each class.
///
/// ```json
/// { "images": { "thai": ["https://example.com/pad-thai.jpg"] } }
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatasetManifest {
    pub images: BTreeMap<String, Vec<String>>,
}

impl DatasetManifest {
    pub fn from_json(json: &str) -> Result<Self, PipelineError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: &Path) -> Result<Self, PipelineError> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }
}

/// What a preparation pass did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreparationSummary {
    pub downloaded: usize,
    pub already_present: usize,
    /// Classes that still have no directory after the pass
    pub missing_classes: Vec<String>,
}

/// File name of the `index`-th image of `class`, e.g. `thai0160.jpeg`
pub fn image_file_name(class: &str, index: usize) -> String {
    format!("{}{:04}.jpeg", class, index)
}

/// Makes sure every class directory exists and holds the images listed for
/// it in the manifest.
///
/// Files that are already on disk are left untouched, so running this twice
/// gives the same directory contents as running it once. Without a manifest
/// nothing is fetched and the missing directories are only reported.
///
/// # Errors
/// - `DownloadFailure` if any image cannot be fetched; no retry is attempted
/// - `Io` if a directory or file cannot be written
pub async fn prepare_data_set(
    config: &PipelineConfig,
    manifest: Option<&DatasetManifest>,
) -> Result<PreparationSummary, PipelineError> {
    let mut summary = PreparationSummary::default();

    let Some(manifest) = manifest else {
        summary.missing_classes = missing_classes(config);
        for class in &summary.missing_classes {
            warn!("No images for class '{}' and no manifest to fetch them from", class);
        }
        return Ok(summary);
    };

    for unknown in manifest.images.keys().filter(|k| !config.classes.contains(*k)) {
        warn!("Manifest lists unknown class '{}', ignoring it", unknown);
    }

    let client = reqwest::Client::new();
    for class in &config.classes {
        let Some(urls) = manifest.images.get(class) else {
            continue;
        };
        let dir = config.class_dir(class);
        fs::create_dir_all(&dir)?;

        for (index, url) in urls.iter().enumerate() {
            let target = dir.join(image_file_name(class, index));
            if target.exists() {
                summary.already_present += 1;
                continue;
            }
            download_image(&client, url, &target).await?;
            summary.downloaded += 1;
        }
        info!("Class '{}' ready in {:?}", class, dir);
    }

    summary.missing_classes = missing_classes(config);
    info!(
        "Dataset prepared: {} downloaded, {} already present",
        summary.downloaded, summary.already_present
    );
    Ok(summary)
}

fn missing_classes(config: &PipelineConfig) -> Vec<String> {
    config.classes.iter()
        .filter(|class| !config.class_dir(class).is_dir())
        .cloned()
        .collect()
}

async fn download_image(client: &reqwest::Client, url: &str, target: &Path) -> Result<(), PipelineError> {
    info!("Downloading {} to {:?}", url, target);
    let response = client.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(PipelineError::DownloadFailure(format!("{} returned {}", url, status)));
    }
    let bytes = response.bytes().await?;

    // `.part` files are never picked up as images
    let partial = target.with_extension("part");
    fs::write(&partial, &bytes)?;
    fs::rename(&partial, target)?;
    Ok(())
}
