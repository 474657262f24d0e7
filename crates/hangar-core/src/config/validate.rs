//! Configuration validation with range checks.

use std::collections::HashSet;

use crate::error::ConfigError;

use super::Config;

impl Config {
    /// Validate configuration values are within acceptable ranges.
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.limits.max_upload_bytes == 0 {
            return Err(ConfigError::ValidationError(
                "limits.max_upload_bytes must be > 0".into(),
            ));
        }
        if self.limits.max_raw_upload_bytes == 0 {
            return Err(ConfigError::ValidationError(
                "limits.max_raw_upload_bytes must be > 0".into(),
            ));
        }
        if self.limits.max_title_len == 0 {
            return Err(ConfigError::ValidationError(
                "limits.max_title_len must be > 0".into(),
            ));
        }
        if self.formats.image_extensions.is_empty() {
            return Err(ConfigError::ValidationError(
                "formats.image_extensions must not be empty".into(),
            ));
        }
        if self.formats.raw_extensions.is_empty() {
            return Err(ConfigError::ValidationError(
                "formats.raw_extensions must not be empty".into(),
            ));
        }
        if self.database.max_connections == 0 {
            return Err(ConfigError::ValidationError(
                "database.max_connections must be > 0".into(),
            ));
        }
        if self.processing.max_dimension == 0 {
            return Err(ConfigError::ValidationError(
                "processing.max_dimension must be > 0".into(),
            ));
        }
        if !(1..=100).contains(&self.processing.quality) {
            return Err(ConfigError::ValidationError(
                "processing.quality must be between 1 and 100".into(),
            ));
        }
        if self.processing.thumbnails.is_empty() {
            return Err(ConfigError::ValidationError(
                "processing.thumbnails must list at least one size".into(),
            ));
        }

        let mut seen = HashSet::new();
        for spec in &self.processing.thumbnails {
            let valid_name = !spec.name.is_empty()
                && spec
                    .name
                    .chars()
                    .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-');
            if !valid_name {
                return Err(ConfigError::ValidationError(format!(
                    "processing.thumbnails name {:?} must match [a-z0-9_-]+",
                    spec.name
                )));
            }
            if !seen.insert(spec.name.as_str()) {
                return Err(ConfigError::ValidationError(format!(
                    "processing.thumbnails name {:?} is duplicated",
                    spec.name
                )));
            }
            if spec.width == 0 || spec.height == 0 {
                return Err(ConfigError::ValidationError(format!(
                    "processing.thumbnails {} must have non-zero dimensions",
                    spec.name
                )));
            }
            if !(1..=100).contains(&spec.quality) {
                return Err(ConfigError::ValidationError(format!(
                    "processing.thumbnails {} quality must be between 1 and 100",
                    spec.name
                )));
            }
        }
        Ok(())
    }
}
