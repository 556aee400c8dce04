use std::fs;
use std::path::{Path, PathBuf};

use log::info;

use super::data_url::ImageDataUrl;
use super::error::ExportError;
use super::filename::sanitize_filename;

/// Final step of an export: hand the encoded image to the user.
pub trait DownloadSink {
    /// Returns where the image ended up.
    fn deliver(&mut self, filename: &str, href: &ImageDataUrl) -> Result<PathBuf, ExportError>;
}

/// Writes exports into a directory, overwriting any previous export with the
/// same name.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    directory: PathBuf,
}

impl DirectorySink {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    /// The configured directory, else the user's download directory, else
    /// the working directory.
    pub fn resolve(configured: Option<&Path>) -> Self {
        let directory = configured
            .map(Path::to_path_buf)
            .or_else(dirs::download_dir)
            .unwrap_or_else(|| PathBuf::from("."));
        Self::new(directory)
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }
}

impl DownloadSink for DirectorySink {
    fn deliver(&mut self, filename: &str, href: &ImageDataUrl) -> Result<PathBuf, ExportError> {
        if !self.directory.is_dir() {
            return Err(ExportError::ExportDirNotFound(self.directory.clone()));
        }
        let bytes = href.decode()?;
        let path = self.directory.join(sanitize_filename(filename));
        fs::write(&path, &bytes).map_err(|source| ExportError::Write {
            path: path.clone(),
            source,
        })?;
        info!("Saved snippet image to {}", path.display());
        Ok(path)
    }
}
