//! Upload validation before anything is written.

use std::path::Path;

use crate::config::{FormatsConfig, LimitsConfig};
use crate::error::ValidationError;
use crate::types::FileClass;

use super::signature::{self, HEADER_LEN};

/// Validates uploaded files by name, declared size and header bytes.
#[derive(Debug, Clone)]
pub struct Validator {
    limits: LimitsConfig,
    formats: FormatsConfig,
}

impl Validator {
    /// Create a new validator with the given limits and allow-lists.
    pub fn new(limits: LimitsConfig, formats: FormatsConfig) -> Self {
        Self { limits, formats }
    }

    /// Validate one file of the given class.
    ///
    /// Checks, in order:
    /// - Declared size is within the class limit
    /// - Lower-cased extension is in the class allow-list
    /// - File name cannot escape its directory
    /// - Header matches the extension's signature, when the table has one
    ///
    /// Only the first [`HEADER_LEN`] bytes of `content` are inspected.
    pub fn validate(
        &self,
        class: FileClass,
        file_name: &str,
        size: u64,
        content: &[u8],
    ) -> Result<(), ValidationError> {
        let max = self.max_size(class);
        if size > max {
            return Err(ValidationError::FileTooLarge {
                file_name: file_name.to_string(),
                size,
                max,
            });
        }

        let extension = Self::extension(file_name).ok_or_else(|| {
            ValidationError::InvalidFileType {
                file_name: file_name.to_string(),
                extension: String::new(),
            }
        })?;
        if !self.allowed_extensions(class).contains(&extension) {
            return Err(ValidationError::InvalidFileType {
                file_name: file_name.to_string(),
                extension,
            });
        }

        Self::check_file_name(file_name)?;

        if self.formats.verify_signatures {
            let header = &content[..content.len().min(HEADER_LEN)];
            if signature::matches(&extension, header) == Some(false) {
                return Err(ValidationError::MagicNumberMismatch {
                    file_name: file_name.to_string(),
                    extension,
                });
            }
        }

        Ok(())
    }

    /// Validate the free-text request fields.
    pub fn validate_title(&self, title: &str) -> Result<(), ValidationError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(ValidationError::MissingField("title"));
        }
        if title.chars().count() > self.limits.max_title_len {
            return Err(ValidationError::FieldTooLong {
                field: "title",
                max: self.limits.max_title_len,
            });
        }
        Ok(())
    }

    /// Allow-list for a class.
    pub fn allowed_extensions(&self, class: FileClass) -> &[String] {
        match class {
            FileClass::Image => &self.formats.image_extensions,
            FileClass::Raw => &self.formats.raw_extensions,
        }
    }

    /// Lower-cased extension of `file_name`, without the dot.
    pub fn extension(file_name: &str) -> Option<String> {
        Path::new(file_name.trim())
            .extension()
            .and_then(|e| e.to_str())
            .filter(|e| !e.is_empty())
            .map(|e| e.to_lowercase())
    }

    fn max_size(&self, class: FileClass) -> u64 {
        match class {
            FileClass::Image => self.limits.max_upload_bytes,
            FileClass::Raw => self.limits.max_raw_upload_bytes,
        }
    }

    /// Reject names that carry directory components or hide as dotfiles.
    fn check_file_name(file_name: &str) -> Result<(), ValidationError> {
        let cleaned = file_name.trim();
        let hostile = cleaned.contains('/')
            || cleaned.contains('\\')
            || cleaned.contains("..")
            || cleaned.starts_with('.');
        if hostile {
            return Err(ValidationError::PathTraversal(file_name.to_string()));
        }
        Ok(())
    }
}
