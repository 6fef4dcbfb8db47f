//! File admission rules

use super::types::format_size;
use crate::config::UploadsConfig;
use crate::error::RagdeskError;
use std::path::Path;
use thiserror::Error;

/// Default size ceiling, 50 MiB
pub const DEFAULT_MAX_FILE_SIZE_BYTES: u64 = 50 * 1024 * 1024;

/// Why a file was refused at enqueue time
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdmissionError {
    #[error("{name}: only {expected} files are allowed")]
    UnsupportedType { name: String, expected: String },

    #[error("{name}: file is too large ({}, limit {})", format_size(*size), format_size(*limit))]
    TooLarge { name: String, size: u64, limit: u64 },
}

impl From<AdmissionError> for RagdeskError {
    fn from(err: AdmissionError) -> Self {
        RagdeskError::Validation(err.to_string())
    }
}

/// Accepted extensions and size ceiling
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdmissionRules {
    accepted_extensions: Vec<String>,
    max_file_size_bytes: u64,
}

impl Default for AdmissionRules {
    fn default() -> Self {
        Self::new(vec!["pdf".to_string()], DEFAULT_MAX_FILE_SIZE_BYTES)
    }
}

impl AdmissionRules {
    /// Create rules; extensions are given without the leading dot
    pub fn new(accepted_extensions: Vec<String>, max_file_size_bytes: u64) -> Self {
        let accepted_extensions = accepted_extensions
            .into_iter()
            .map(|ext| ext.trim_start_matches('.').to_ascii_lowercase())
            .collect();
        Self {
            accepted_extensions,
            max_file_size_bytes,
        }
    }

    pub fn from_config(config: &UploadsConfig) -> Self {
        Self::new(
            config.accepted_extensions.clone(),
            config.max_file_size_bytes,
        )
    }

    /// Check a file by name and size
    ///
    /// The extension is compared case-insensitively. A file exactly at the
    /// size ceiling is admitted.
    pub fn check(&self, name: &str, size: u64) -> Result<(), AdmissionError> {
        let extension = Path::new(name)
            .extension()
            .map(|ext| ext.to_string_lossy().to_ascii_lowercase());

        let accepted = extension
            .as_deref()
            .map(|ext| self.accepted_extensions.iter().any(|a| a == ext))
            .unwrap_or(false);
        if !accepted {
            return Err(AdmissionError::UnsupportedType {
                name: name.to_string(),
                expected: self.expected_label(),
            });
        }

        if size > self.max_file_size_bytes {
            return Err(AdmissionError::TooLarge {
                name: name.to_string(),
                size,
                limit: self.max_file_size_bytes,
            });
        }

        Ok(())
    }

    fn expected_label(&self) -> String {
        self.accepted_extensions
            .iter()
            .map(|ext| ext.to_ascii_uppercase())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_pdf_within_limit() {
        let rules = AdmissionRules::default();
        assert!(rules.check("report.pdf", 10 * 1024 * 1024).is_ok());
        assert!(rules.check("Report.PDF", 1).is_ok());
    }

    #[test]
    fn test_rejects_other_extensions() {
        let rules = AdmissionRules::default();
        let err = rules.check("report.docx", 10).unwrap_err();
        assert!(matches!(err, AdmissionError::UnsupportedType { .. }));
        assert_eq!(err.to_string(), "report.docx: only PDF files are allowed");

        assert!(rules.check("pdf", 10).is_err());
        assert!(rules.check("archive.pdf.zip", 10).is_err());
    }

    #[test]
    fn test_rejects_oversized_file() {
        let rules = AdmissionRules::default();
        let err = rules.check("big.pdf", 51 * 1024 * 1024).unwrap_err();
        assert_eq!(
            err,
            AdmissionError::TooLarge {
                name: "big.pdf".to_string(),
                size: 51 * 1024 * 1024,
                limit: DEFAULT_MAX_FILE_SIZE_BYTES,
            }
        );
        assert!(err.to_string().contains("51 MB"));
    }

    #[test]
    fn test_size_at_limit_is_admitted() {
        let rules = AdmissionRules::default();
        assert!(rules.check("edge.pdf", DEFAULT_MAX_FILE_SIZE_BYTES).is_ok());
    }

    #[test]
    fn test_from_config_normalizes_extensions() {
        let config = UploadsConfig {
            accepted_extensions: vec![".PDF".to_string(), "txt".to_string()],
            max_file_size_bytes: 100,
            ..UploadsConfig::default()
        };
        let rules = AdmissionRules::from_config(&config);
        assert!(rules.check("notes.TXT", 100).is_ok());
        assert!(rules.check("notes.txt", 101).is_err());
    }

    #[test]
    fn test_converts_into_validation_error() {
        let err: RagdeskError = AdmissionRules::default()
            .check("a.exe", 1)
            .unwrap_err()
            .into();
        assert!(matches!(err, RagdeskError::Validation(_)));
    }
}
