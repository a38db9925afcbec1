use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

/// Upload cap for a single team image.
pub const MAX_IMAGE_BYTES: usize = 16 * 1024 * 1024;

pub const ALLOWED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif"];

#[derive(Debug, Error)]
pub enum ImageStorageError {
    #[error("only image files are allowed (jpg, jpeg, png, gif)")]
    InvalidExtension,
    #[error("image is {size} bytes, larger than the {max} byte limit")]
    TooLarge { size: usize, max: usize },
    #[error("invalid image filename")]
    InvalidFilename,
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Team images on local disk, one flat directory.
pub struct ImageStorage {
    base_path: PathBuf,
}

impl ImageStorage {
    pub fn new(uploads_dir: &Path) -> Self {
        Self {
            base_path: uploads_dir.to_path_buf(),
        }
    }

    #[must_use]
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn image_path(&self, filename: &str) -> Result<PathBuf, ImageStorageError> {
        validate_stored_name(filename)?;
        Ok(self.base_path.join(filename))
    }

    fn temp_path(&self) -> PathBuf {
        self.base_path
            .join(".tmp")
            .join(Uuid::new_v4().to_string())
    }

    pub async fn exists(&self, filename: &str) -> Result<bool, ImageStorageError> {
        let path = self.image_path(filename)?;
        Ok(fs::try_exists(&path).await?)
    }

    /// Writes an uploaded image and returns the stored filename:
    /// `<sanitized stem>_<YYYYmmdd_HHMMSS>.<ext>`, with a `_<n>` suffix when
    /// that name is already taken.
    pub async fn save(
        &self,
        original_name: &str,
        data: &[u8],
    ) -> Result<String, ImageStorageError> {
        check_image(original_name, data.len())?;

        let (stem, ext) = split_sanitized(original_name)?;
        let base = timestamped_stem(&stem, Utc::now());

        fs::create_dir_all(&self.base_path).await?;

        let mut filename = format!("{base}.{ext}");
        let mut attempt = 1;
        while fs::try_exists(self.base_path.join(&filename)).await? {
            filename = format!("{base}_{attempt}.{ext}");
            attempt += 1;
        }

        let temp_path = self.temp_path();
        if let Some(parent) = temp_path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let mut temp_file = File::create(&temp_path).await?;
        temp_file.write_all(data).await?;
        temp_file.sync_all().await?;

        fs::rename(&temp_path, self.base_path.join(&filename)).await?;

        Ok(filename)
    }

    /// Deletes a stored image. A missing file is not an error.
    pub async fn delete(&self, filename: &str) -> Result<bool, ImageStorageError> {
        let path = self.image_path(filename)?;

        match fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(ImageStorageError::Io(e)),
        }
    }

    /// Best-effort delete used for cleanup after the database has moved on.
    /// Failures are logged, never returned.
    pub async fn discard(&self, filename: &str) {
        match self.delete(filename).await {
            Ok(true) => tracing::debug!("Removed image {filename}"),
            Ok(false) => tracing::debug!("Image {filename} already gone"),
            Err(e) => tracing::warn!("Failed to remove image {filename}: {e}"),
        }
    }
}

/// Validates an upload before anything is written.
pub fn check_image(original_name: &str, size: usize) -> Result<(), ImageStorageError> {
    if size > MAX_IMAGE_BYTES {
        return Err(ImageStorageError::TooLarge {
            size,
            max: MAX_IMAGE_BYTES,
        });
    }
    split_sanitized(original_name).map(|_| ())
}

/// Reduces an uploaded filename to a safe ASCII stem plus a lowercase,
/// allow-listed extension.
fn split_sanitized(original_name: &str) -> Result<(String, String), ImageStorageError> {
    let name = secure_filename(original_name);
    let (stem, ext) = name
        .rsplit_once('.')
        .ok_or(ImageStorageError::InvalidExtension)?;

    let ext = ext.to_ascii_lowercase();
    if !ALLOWED_EXTENSIONS.contains(&ext.as_str()) {
        return Err(ImageStorageError::InvalidExtension);
    }

    let stem = stem.trim_matches(|c| c == '.' || c == '_');
    let stem = if stem.is_empty() { "image" } else { stem };

    Ok((stem.to_string(), ext))
}

#[must_use]
pub fn secure_filename(original_name: &str) -> String {
    // Browsers on Windows may send the full client-side path.
    let base = original_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(original_name);

    let cleaned: String = base
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        .collect();

    cleaned.trim_matches(|c| c == '.' || c == '_').to_string()
}

fn timestamped_stem(stem: &str, now: DateTime<Utc>) -> String {
    format!("{stem}_{}", now.format("%Y%m%d_%H%M%S"))
}

fn validate_stored_name(filename: &str) -> Result<(), ImageStorageError> {
    if filename.is_empty()
        || filename.starts_with('.')
        || filename.contains(['/', '\\', '\0'])
    {
        return Err(ImageStorageError::InvalidFilename);
    }
    Ok(())
}
