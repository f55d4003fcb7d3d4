use std::path::{Path, PathBuf};
use std::fs;
use std::io;
use std::sync::Arc;
use std::env;
use tokio::sync::Mutex;
use sha2::{Sha256, Digest};

use crate::models::ModelInfo;

/// Environment variable overriding the cache root
pub const CACHE_ENV_VAR: &str = "CUISINE_CACHE";

const MODEL_FILE_NAME: &str = "model.onnx";

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("Model not downloaded: {0}")]
    NotDownloaded(String),
    #[error("Download error: {0}")]
    DownloadError(#[from] reqwest::Error),
    #[error("Server returned {status} for {url}")]
    HttpStatus {
        url: String,
        status: reqwest::StatusCode,
    },
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
    #[error("Model verification failed")]
    VerificationFailed,
    #[error("Hash mismatch: expected {expected}, got {actual} for {name}")]
    HashMismatch {
        name: String,
        expected: String,
        actual: String,
    },
}

/// Downloads and caches pretrained networks on disk, one directory per model.
#[derive(Clone)]
pub struct ModelManager {
    models_dir: PathBuf,
    download_lock: Arc<Mutex<()>>,
}

impl ModelManager {
    /// Creates a new ModelManager with the default models directory
    pub fn new_default() -> io::Result<Self> {
        Self::new(Self::get_default_models_dir())
    }

    /// Returns the default models directory path
    pub fn get_default_models_dir() -> PathBuf {
        // 1. Check environment variable
        if let Ok(path) = env::var(CACHE_ENV_VAR) {
            return PathBuf::from(path).join("models");
        }

        // 2. Use platform-specific cache directory
        if let Some(cache_dir) = dirs::cache_dir() {
            return cache_dir.join("cuisine-classifier").join("models");
        }

        // 3. Fallback to user's home directory
        if let Some(home_dir) = dirs::home_dir() {
            return home_dir.join(".cache").join("cuisine-classifier").join("models");
        }

        // 4. If all else fails, use system temp directory
        env::temp_dir().join("cuisine-classifier").join("models")
    }

    pub fn new<P: AsRef<Path>>(models_dir: P) -> io::Result<Self> {
        let models_dir = models_dir.as_ref().to_path_buf();
        fs::create_dir_all(&models_dir)?;
        Ok(Self {
            models_dir,
            download_lock: Arc::new(Mutex::new(())),
        })
    }

    pub fn models_dir(&self) -> &Path {
        &self.models_dir
    }

    pub fn get_model_path(&self, name: &str) -> PathBuf {
        self.models_dir.join(name).join(MODEL_FILE_NAME)
    }

    pub fn is_model_downloaded(&self, name: &str) -> bool {
        let model_path = self.get_model_path(name);
        log::debug!("Model path: {:?} (exists: {})", model_path, model_path.exists());
        model_path.exists()
    }

    /// Returns the cached model path, failing if it has not been downloaded
    pub fn require_model(&self, name: &str) -> Result<PathBuf, ModelError> {
        let path = self.get_model_path(name);
        if path.exists() {
            Ok(path)
        } else {
            Err(ModelError::NotDownloaded(name.to_string()))
        }
    }

    pub async fn download_model(&self, info: &ModelInfo) -> Result<(), ModelError> {
        let _lock = self.download_lock.lock().await;

        let model_dir = self.models_dir.join(&info.name);
        log::info!("Creating model directory at {:?}", model_dir);
        fs::create_dir_all(&model_dir)?;

        let model_path = self.get_model_path(&info.name);
        let result = match (&info.model_hash, model_path.exists()) {
            (Some(hash), true) => {
                log::info!("Model file exists at {:?}, verifying...", model_path);
                if self.verify_file(&model_path, hash)? {
                    log::info!("Existing model file verified successfully");
                    Ok(())
                } else {
                    log::warn!("Model file verification failed, redownloading");
                    self.download_and_verify_file(info, &model_path).await
                }
            }
            (None, true) => {
                log::warn!("No checksum pinned for '{}', reusing cached file unverified", info.name);
                Ok(())
            }
            (_, false) => {
                log::info!("Model file does not exist, downloading...");
                self.download_and_verify_file(info, &model_path).await
            }
        };

        if let Err(e) = &result {
            log::error!("Failed to set up model '{}': {}", info.name, e);
            // Cleanup on failure
            let _ = self.remove_download(&info.name);
        }
        result
    }

    fn hash_bytes(bytes: &[u8]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(bytes);
        format!("{:x}", hasher.finalize())
    }

    fn verify_file(&self, path: &Path, expected_hash: &str) -> Result<bool, ModelError> {
        let bytes = fs::read(path)?;
        let hash = Self::hash_bytes(&bytes);
        log::debug!("Calculated hash: {}", hash);
        log::debug!("Expected hash:   {}", expected_hash);
        Ok(hash.eq_ignore_ascii_case(expected_hash))
    }

    /// Checks the cached file against the pinned hash. A model without a pinned
    /// hash verifies as soon as it exists.
    pub fn verify_model(&self, info: &ModelInfo) -> Result<bool, ModelError> {
        let model_path = self.get_model_path(&info.name);
        if !model_path.exists() {
            log::info!("Model file {:?} does not exist", model_path);
            return Ok(false);
        }
        match &info.model_hash {
            Some(hash) => self.verify_file(&model_path, hash),
            None => Ok(true),
        }
    }

    async fn download_and_verify_file(&self, info: &ModelInfo, path: &Path) -> Result<(), ModelError> {
        log::info!("Downloading {} from {} to {:?}", info.name, info.model_url, path);
        let response = reqwest::get(&info.model_url).await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ModelError::HttpStatus {
                url: info.model_url.clone(),
                status,
            });
        }
        let bytes = response.bytes().await?;
        log::info!("Downloaded {} bytes", bytes.len());

        if let Some(expected) = &info.model_hash {
            let hash = Self::hash_bytes(&bytes);
            if !hash.eq_ignore_ascii_case(expected) {
                log::error!("{} hash mismatch: expected {}, got {}", info.name, expected, hash);
                return Err(ModelError::HashMismatch {
                    name: info.name.clone(),
                    expected: expected.clone(),
                    actual: hash,
                });
            }
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, &bytes)?;

        // Verify after writing
        if let Some(expected) = &info.model_hash {
            if !self.verify_file(path, expected)? {
                return Err(ModelError::VerificationFailed);
            }
        }

        log::info!("{} downloaded successfully", info.name);
        Ok(())
    }

    pub fn remove_download(&self, name: &str) -> Result<(), ModelError> {
        let model_path = self.get_model_path(name);
        if model_path.exists() {
            fs::remove_file(&model_path)?;
        }
        Ok(())
    }

    /// Ensures that a model is downloaded and verified.
    /// If the model doesn't exist, it will be downloaded.
    /// If verification fails, it will be re-downloaded.
    pub async fn ensure_model_downloaded(&self, info: &ModelInfo) -> Result<PathBuf, ModelError> {
        if !self.is_model_downloaded(&info.name) {
            log::info!("Model {} not found, downloading...", info.name);
            self.download_model(info).await?;
        } else if !self.verify_model(info)? {
            log::info!("Model verification failed, re-downloading...");
            self.remove_download(&info.name)?;
            self.download_model(info).await?;
        } else {
            log::info!("Model {} ready", info.name);
        }
        self.require_model(&info.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pinned_info(contents: &[u8]) -> ModelInfo {
        ModelInfo {
            name: "pinned".to_string(),
            model_url: "http://127.0.0.1:9/unreachable.onnx".to_string(),
            model_hash: Some(ModelManager::hash_bytes(contents)),
        }
    }

    #[test]
    fn test_model_paths() {
        let dir = tempfile::tempdir().unwrap();
        let manager = ModelManager::new(dir.path()).unwrap();
        let path = manager.get_model_path("resnet50-onnx");
        assert!(path.ends_with("resnet50-onnx/model.onnx"));
        assert!(!manager.is_model_downloaded("resnet50-onnx"));
        assert!(matches!(manager.require_model("resnet50-onnx"), Err(ModelError::NotDownloaded(_))));
    }

    #[test]
    fn test_verify_model() -> Result<(), ModelError> {
        let dir = tempfile::tempdir()?;
        let manager = ModelManager::new(dir.path())?;
        let info = pinned_info(b"weights");

        // Test verification of non-existent model
        assert!(!manager.verify_model(&info)?);

        let path = manager.get_model_path(&info.name);
        fs::create_dir_all(path.parent().unwrap())?;
        fs::write(&path, b"weights")?;
        assert!(manager.verify_model(&info)?);

        // Corrupt file and verify
        fs::write(&path, b"corrupted data")?;
        assert!(!manager.verify_model(&info)?);

        manager.remove_download(&info.name)?;
        assert!(!manager.is_model_downloaded(&info.name));
        Ok(())
    }

    #[tokio::test]
    async fn test_cached_model_is_not_redownloaded() -> Result<(), ModelError> {
        let dir = tempfile::tempdir()?;
        let manager = ModelManager::new(dir.path())?;
        let info = pinned_info(b"weights");

        let path = manager.get_model_path(&info.name);
        fs::create_dir_all(path.parent().unwrap())?;
        fs::write(&path, b"weights")?;

        // The URL is unreachable, so success proves no download was attempted
        let resolved = manager.ensure_model_downloaded(&info).await?;
        assert_eq!(resolved, path);
        Ok(())
    }

    #[tokio::test]
    async fn test_failed_download_cleans_up() {
        let dir = tempfile::tempdir().unwrap();
        let manager = ModelManager::new(dir.path()).unwrap();
        let info = pinned_info(b"weights");

        let result = manager.download_model(&info).await;
        assert!(result.is_err());
        assert!(!manager.is_model_downloaded(&info.name));
    }

    #[test]
    fn test_default_models_dir() {
        env::set_var(CACHE_ENV_VAR, "/tmp/test-cuisine-cache");
        let path = ModelManager::get_default_models_dir();
        assert!(path.ends_with("test-cuisine-cache/models"));
        env::remove_var(CACHE_ENV_VAR);

        let path = ModelManager::get_default_models_dir();
        assert!(path.to_string_lossy().contains("cuisine-classifier"));
    }
}
