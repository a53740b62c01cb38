use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Component, Path, PathBuf};
use tracing::{info, warn};
use walkdir::WalkDir;

use super::thumbnail::{generate_thumbnail, Thumbnail};
use crate::error::AssetError;

/// Longest extension accepted for an uploaded image
const MAX_EXTENSION_LEN: usize = 8;

/// Name of an asset file, relative to the store's content directory
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetPath(String);

impl AssetPath {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for AssetPath {
    fn from(value: String) -> Self {
        AssetPath(value)
    }
}

impl From<&str> for AssetPath {
    fn from(value: &str) -> Self {
        AssetPath(value.to_string())
    }
}

impl std::fmt::Display for AssetPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Anything that can turn an asset reference into an inline thumbnail
pub trait ThumbnailSource {
    fn thumbnail(&self, path: &AssetPath, max_dim: u32) -> Thumbnail;
}

/// Owns the directory of uploaded customer photos.
///
/// Assets are write-once: nothing here mutates or deletes a file after
/// it has been stored.
#[derive(Debug, Clone)]
pub struct ImageAssetStore {
    dir: PathBuf,
}

impl ImageAssetStore {
    /// Use `dir` as the content directory, creating it if needed
    pub fn open(dir: &Path) -> Result<Self, AssetError> {
        fs::create_dir_all(dir).map_err(|source| AssetError::Write {
            path: dir.to_path_buf(),
            source,
        })?;
        Ok(Self { dir: dir.to_path_buf() })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Store an upload under a name derived from the current local time.
    pub fn store(&self, bytes: &[u8], extension: &str) -> Result<AssetPath, AssetError> {
        self.store_at(bytes, extension, Local::now().naive_local())
    }

    /// Store an upload under a name derived from `captured_at`, with second
    /// resolution: `YYYYMMDD_HHMMSS.<ext>`.
    ///
    /// Two uploads with the same second and extension map to the same file
    /// and the later one replaces the earlier one.
    pub fn store_at(
        &self,
        bytes: &[u8],
        extension: &str,
        captured_at: NaiveDateTime,
    ) -> Result<AssetPath, AssetError> {
        let extension = normalize_extension(extension)?;
        image::guess_format(bytes).map_err(AssetError::UnrecognisedImage)?;

        let name = format!("{}.{}", captured_at.format("%Y%m%d_%H%M%S"), extension);
        let path = self.dir.join(&name);

        if path.exists() {
            warn!("Asset {} already exists and will be overwritten", name);
        }

        fs::write(&path, bytes).map_err(|source| AssetError::Write {
            path: path.clone(),
            source,
        })?;

        info!("Stored image asset {} ({} bytes)", name, bytes.len());
        Ok(AssetPath(name))
    }

    /// Map an asset reference to a file inside the content directory.
    /// Anything that could escape the directory resolves to `None`.
    pub fn resolve(&self, asset: &AssetPath) -> Option<PathBuf> {
        let relative = Path::new(asset.as_str());
        let mut components = relative.components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(_)), None) => Some(self.dir.join(relative)),
            _ => None,
        }
    }

    /// All files currently in the content directory, sorted by name
    pub fn list_assets(&self) -> Result<Vec<AssetPath>, AssetError> {
        let mut assets = Vec::new();
        for entry in WalkDir::new(&self.dir).min_depth(1).max_depth(1) {
            let entry = entry.map_err(|source| AssetError::ReadDir {
                path: self.dir.clone(),
                source,
            })?;
            if entry.file_type().is_file() {
                assets.push(AssetPath(entry.file_name().to_string_lossy().to_string()));
            }
        }
        assets.sort();
        Ok(assets)
    }

    /// Assets no record points at, e.g. left behind when an insert failed
    /// after its photo was written. Reported only, never removed.
    pub fn orphans(&self, referenced: &HashSet<AssetPath>) -> Result<Vec<AssetPath>, AssetError> {
        Ok(self
            .list_assets()?
            .into_iter()
            .filter(|asset| !referenced.contains(asset))
            .collect())
    }
}

impl ThumbnailSource for ImageAssetStore {
    fn thumbnail(&self, path: &AssetPath, max_dim: u32) -> Thumbnail {
        match self.resolve(path) {
            Some(file) => generate_thumbnail(&file, max_dim),
            None => {
                warn!("Refusing to read asset outside the content directory: {}", path);
                Thumbnail::Placeholder
            }
        }
    }
}

fn normalize_extension(extension: &str) -> Result<String, AssetError> {
    let normalized = extension.trim().trim_start_matches('.').to_ascii_lowercase();
    let valid = !normalized.is_empty()
        && normalized.len() <= MAX_EXTENSION_LEN
        && normalized.chars().all(|c| c.is_ascii_alphanumeric());
    if valid {
        Ok(normalized)
    } else {
        Err(AssetError::InvalidExtension(extension.to_string()))
    }
}
