use crate::error::{DashboardError, Result};
use csv::WriterBuilder;
use serde::{Deserialize, Serialize};
use std::fs::{OpenOptions, create_dir_all};
use std::path::{Path, PathBuf};

pub const MIN_RATING: u8 = 1;
pub const MAX_RATING: u8 = 5;
pub const DEFAULT_RATING: u8 = 3;

/// One submission of the feedback form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackEntry {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub email: String,

    #[serde(default = "default_rating")]
    pub rating: u8,

    #[serde(default)]
    pub comments: String,
}

fn default_rating() -> u8 {
    DEFAULT_RATING
}

impl FeedbackEntry {
    /// Check required fields and pull the rating into range
    ///
    /// # Errors
    /// * Returns `DashboardError::Validation` if name or email is blank
    pub fn validated(self) -> Result<Self> {
        let name = self.name.trim().to_string();
        let email = self.email.trim().to_string();
        if name.is_empty() || email.is_empty() {
            return Err(DashboardError::Validation("Please fill name & email".to_string()));
        }

        Ok(FeedbackEntry {
            name,
            email,
            rating: self.rating.clamp(MIN_RATING, MAX_RATING),
            comments: self.comments,
        })
    }
}

/// Feedback form fields exactly as the browser sent them
///
/// Every field is text so that a malformed rating still reaches validation
/// and comes back as an in-page notice.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeedbackSubmission {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub email: String,

    #[serde(default)]
    pub rating: String,

    #[serde(default)]
    pub comments: String,
}

impl FeedbackSubmission {
    /// Read the rating and build an entry
    ///
    /// A blank rating means the default; any number is pulled into range.
    ///
    /// # Errors
    /// * `DashboardError::Validation` if the rating is not a number
    pub fn parse(self) -> Result<FeedbackEntry> {
        let rating = parse_rating(&self.rating)?;
        Ok(FeedbackEntry {
            name: self.name,
            email: self.email,
            rating,
            comments: self.comments,
        })
    }
}

impl From<FeedbackEntry> for FeedbackSubmission {
    fn from(entry: FeedbackEntry) -> Self {
        FeedbackSubmission {
            name: entry.name,
            email: entry.email,
            rating: entry.rating.to_string(),
            comments: entry.comments,
        }
    }
}

fn parse_rating(raw: &str) -> Result<u8> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(DEFAULT_RATING);
    }

    let value = raw
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| {
            DashboardError::Validation(format!(
                "Rating must be a number from {} to {}",
                MIN_RATING, MAX_RATING
            ))
        })?;

    Ok(value.round().clamp(MIN_RATING as f64, MAX_RATING as f64) as u8)
}

/// Append-only flat-file store for feedback
///
/// Rows are `name,email,rating,comments` with no header. The file is never
/// read back by the dashboard.
#[derive(Debug, Clone)]
pub struct FeedbackRecorder {
    path: PathBuf,
}

impl FeedbackRecorder {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Validate a submission and append it
    ///
    /// Nothing is written when validation fails.
    ///
    /// # Errors
    /// * `DashboardError::Validation` for a blank name or email
    /// * `DashboardError::Write` if the file cannot be opened or written
    pub fn record(&self, entry: FeedbackEntry) -> Result<FeedbackEntry> {
        let entry = entry.validated()?;
        self.append(&entry)?;
        log::info!("Recorded feedback from {} (rating {})", entry.email, entry.rating);
        Ok(entry)
    }

    fn append(&self, entry: &FeedbackEntry) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                create_dir_all(parent).map_err(|e| DashboardError::Write(e.to_string()))?;
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| DashboardError::Write(e.to_string()))?;

        let mut writer = WriterBuilder::new().has_headers(false).from_writer(file);
        writer
            .serialize(entry)
            .map_err(|e| DashboardError::Write(e.to_string()))?;
        writer.flush().map_err(|e| DashboardError::Write(e.to_string()))?;

        Ok(())
    }
}
