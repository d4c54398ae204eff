//! Vendor model for device manufacturers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::validate_name;

/// A hardware/firmware vendor (1 vendor -> n devices).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Vendor {
    pub id: Uuid,
    /// Unique, non-empty vendor name.
    pub vendor_name: String,
    pub created_at: DateTime<Utc>,
}

/// Data required to create a new vendor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewVendor {
    pub vendor_name: String,
}

impl NewVendor {
    pub fn validate(&self) -> Result<(), String> {
        validate_name("vendor_name", &self.vendor_name)
    }
}

impl std::fmt::Display for Vendor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.vendor_name)
    }
}
