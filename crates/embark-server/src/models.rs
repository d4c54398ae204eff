//! Database models for the firmware analysis tracker.

pub mod analysis_result;
pub mod device;
pub mod firmware_analysis;
pub mod firmware_file;
pub mod label;
pub mod log_zip_file;
pub mod resource_timestamp;
pub mod vendor;

pub use analysis_result::{AnalysisResult, NewAnalysisResult};
pub use device::{Device, DeviceWithVendor, NewDevice};
pub use firmware_analysis::{Completion, FirmwareAnalysis, NewFirmwareAnalysis};
pub use firmware_file::{FirmwareFile, NewFirmwareFile};
pub use label::{Label, NewLabel};
pub use log_zip_file::LogZipFile;
pub use resource_timestamp::{NewResourceTimestamp, ResourceTimestamp};
pub use vendor::{NewVendor, Vendor};

/// Maximum length of names, versions and notes.
pub const MAX_NAME_LENGTH: usize = 127;

/// Checks that a required name is non-empty and within [`MAX_NAME_LENGTH`].
pub fn validate_name(field: &str, value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("{} must not be empty", field));
    }
    validate_length(field, value)
}

/// Checks that an optional text field stays within [`MAX_NAME_LENGTH`].
pub fn validate_length(field: &str, value: &str) -> Result<(), String> {
    let len = value.chars().count();
    if len > MAX_NAME_LENGTH {
        return Err(format!(
            "{} exceeds maximum length: {} characters (max: {})",
            field, len, MAX_NAME_LENGTH
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_name() {
        assert!(validate_name("vendor_name", "AVM").is_ok());
        assert!(validate_name("vendor_name", "").is_err());
        assert!(validate_name("vendor_name", "   ").is_err());
        assert!(validate_name("vendor_name", &"a".repeat(127)).is_ok());
        assert!(validate_name("vendor_name", &"a".repeat(128)).is_err());
    }

    #[test]
    fn test_validate_length_counts_characters() {
        assert!(validate_length("notes", &"ü".repeat(127)).is_ok());
        assert!(validate_length("notes", "").is_ok());
    }
}
