//! Per-run screenshot and suggestion archive.
//!
//! Layout: `<base>/<yyyyMMdd>/Session_<HHmmss>/` keyed by the run's start
//! time, with `screenshot_<stamp>.png` and `suggestion_<stamp>.txt` per
//! successful analysis.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use image::RgbaImage;

use crate::error::{Error, Result};

/// Paths written for one analysis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedCapture {
    pub image_path: PathBuf,
    pub text_path: PathBuf,
}

/// Writes analysis results under a base directory.
#[derive(Debug, Clone)]
pub struct SessionStore {
    base_dir: PathBuf,
    started_at: Option<DateTime<Local>>,
}

impl SessionStore {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            started_at: None,
        }
    }

    /// `Documents/Dota2Assistant/Sessions`, or the home directory if there is
    /// no documents folder.
    pub fn default_base_dir() -> PathBuf {
        dirs::document_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."))
            .join("Dota2Assistant")
            .join("Sessions")
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Key subsequent saves to a run that started at `started_at`.
    pub fn begin_session(&mut self, started_at: DateTime<Local>) {
        self.started_at = Some(started_at);
    }

    /// Folder for the current run. Without a run, `now` is used.
    pub fn session_dir(&self, now: DateTime<Local>) -> PathBuf {
        let started = self.started_at.unwrap_or(now);
        self.base_dir
            .join(started.format("%Y%m%d").to_string())
            .join(format!("Session_{}", started.format("%H%M%S")))
    }

    /// Write the screenshot and suggestion text for one analysis.
    pub fn save(
        &self,
        image: &RgbaImage,
        suggestion: &str,
        at: DateTime<Local>,
    ) -> Result<SavedCapture> {
        let dir = self.session_dir(at);
        std::fs::create_dir_all(&dir).map_err(|e| Error::Persistence {
            path: dir.clone(),
            message: e.to_string(),
        })?;

        let stamp = at.format("%Y%m%d%H%M%S%3f").to_string();
        let image_path = dir.join(format!("screenshot_{}.png", stamp));
        let text_path = dir.join(format!("suggestion_{}.txt", stamp));

        image
            .save_with_format(&image_path, image::ImageFormat::Png)
            .map_err(|e| Error::Persistence {
                path: image_path.clone(),
                message: e.to_string(),
            })?;
        std::fs::write(&text_path, suggestion).map_err(|e| Error::Persistence {
            path: text_path.clone(),
            message: e.to_string(),
        })?;

        tracing::debug!("Saved session files to {}", dir.display());

        Ok(SavedCapture {
            image_path,
            text_path,
        })
    }
}
