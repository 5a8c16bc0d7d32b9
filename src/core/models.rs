use crate::core::types::{Filter, Magic, Target};
use crate::errors::QueueError;
use serde::{Deserialize, Serialize};
use std::fmt;

fn default_exposure_count() -> u32 {
    1
}

fn default_filters() -> Vec<String> {
    vec!["clear".to_string()]
}

fn default_binning() -> u32 {
    2
}

/// One admitted imaging request, as it travels on the wire and sits in a
/// queue file (one JSON object per line).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueEntry {
    pub magic: Magic,
    #[serde(default)]
    pub user: String,
    pub targets: Vec<String>,
    pub exposure_time: f64,
    #[serde(default = "default_exposure_count")]
    pub exposure_count: u32,
    #[serde(default = "default_filters")]
    pub filters: Vec<String>,
    #[serde(default = "default_binning")]
    pub binning: u32,
}

impl QueueEntry {
    pub fn new(magic: Magic, user: impl Into<String>, targets: Vec<String>, exposure_time: f64) -> Self {
        Self {
            magic,
            user: user.into(),
            targets,
            exposure_time,
            exposure_count: default_exposure_count(),
            filters: default_filters(),
            binning: default_binning(),
        }
    }

    pub fn with_count(mut self, count: u32) -> Self {
        self.exposure_count = count;
        self
    }

    pub fn with_filters<I, S>(mut self, filters: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.filters = filters.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_binning(mut self, binning: u32) -> Self {
        self.binning = binning;
        self
    }

    /// Parsed targets, in submission order.
    pub fn parsed_targets(&self) -> Result<Vec<Target>, QueueError> {
        self.targets
            .iter()
            .map(|t| Target::try_from_str(t).map_err(|e| QueueError::InvalidEntry(e.to_string())))
            .collect()
    }

    /// Parsed filters. An empty list falls back to `clear`.
    pub fn parsed_filters(&self) -> Result<Vec<Filter>, QueueError> {
        if self.filters.is_empty() {
            return Ok(vec![Filter::Clear]);
        }
        self.filters
            .iter()
            .map(|f| Filter::try_from_str(f).map_err(|e| QueueError::InvalidEntry(e.to_string())))
            .collect()
    }

    pub fn validate(&self) -> Result<(), QueueError> {
        if self.targets.is_empty() {
            return Err(QueueError::InvalidEntry("at least one target is required.".into()));
        }
        if !(self.exposure_time.is_finite() && self.exposure_time > 0.0) {
            return Err(QueueError::InvalidEntry(format!(
                "exposure_time must be positive, got {}.",
                self.exposure_time
            )));
        }
        if self.exposure_count == 0 {
            return Err(QueueError::InvalidEntry("exposure_count must be at least 1.".into()));
        }
        if self.binning == 0 {
            return Err(QueueError::InvalidEntry("binning must be at least 1.".into()));
        }
        self.parsed_targets()?;
        self.parsed_filters()?;
        Ok(())
    }
}

impl fmt::Display for QueueEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} x{} {}s [{}] bin{} for {}",
            self.targets.join(" "),
            self.exposure_count,
            self.exposure_time,
            self.filters.join(","),
            self.binning,
            if self.user.is_empty() { "-" } else { &self.user }
        )
    }
}

/// Operator message addressed with the admin magic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdminMessage {
    pub magic: Magic,
    #[serde(default)]
    pub user: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub action: Option<String>,
}
