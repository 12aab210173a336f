//! Settings validation
//!
//! Misconfiguration is reported as a list of [`ValidationFailure`]s instead of
//! an error so hosts can show every problem at once next to the offending field.

use crate::config::FeedClientConfig;
use serde::{Deserialize, Serialize};
use std::path::MAIN_SEPARATOR;

/// One problem with the client settings
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationFailure {
    /// Settings field the problem relates to
    pub property: String,
    /// Short message
    pub message: String,
    /// Remediation hint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detailed_description: Option<String>,
}

impl ValidationFailure {
    /// Failure without a remediation hint
    pub fn new(property: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            message: message.into(),
            detailed_description: None,
        }
    }

    /// Attach a remediation hint
    #[must_use]
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detailed_description = Some(detail.into());
        self
    }
}

/// Check settings that can be judged without touching the filesystem
pub fn validate(config: &FeedClientConfig) -> Vec<ValidationFailure> {
    let mut failures = Vec::new();

    if config.feed_dir.as_os_str().is_empty() {
        failures.push(ValidationFailure::new(
            "feed_dir",
            "Feed output directory is required",
        ));
    } else if !config.feed_dir.is_absolute() {
        failures.push(
            ValidationFailure::new("feed_dir", "Feed output directory must be an absolute path")
                .with_detail(format!("{} is relative", config.feed_dir.display())),
        );
    }

    let name = config.feed_file_name.as_str();
    if name.is_empty() || name == "." || name == ".." || name.contains(['/', MAIN_SEPARATOR]) {
        failures.push(ValidationFailure::new(
            "feed_file_name",
            "Feed file name must be a plain file name",
        ));
    }

    if config.max_items == 0 {
        failures.push(ValidationFailure::new(
            "max_items",
            "Maximum number of feed items must be greater than zero",
        ));
    }

    if let Some(watch_folder) = &config.watch_folder
        && !watch_folder.is_absolute()
    {
        failures.push(
            ValidationFailure::new("watch_folder", "Watch folder must be an absolute path")
                .with_detail(format!("{} is relative", watch_folder.display())),
        );
    }

    failures
}
