//! Device model for tracked hardware.

use chrono::{DateTime, Utc};
use embark_core::DeviceTag;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::validate_name;

/// A physical device under test.
///
/// Revisions of a device are tracked as separate devices. The pair
/// `(device_name, device_vendor_id)` is unique.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Device {
    pub id: Uuid,
    pub device_name: String,
    pub device_vendor_id: Option<Uuid>,
    pub device_label_id: Option<Uuid>,
    /// Owner; only the owner may change visibility.
    pub device_user_id: Option<Uuid>,
    pub device_date: DateTime<Utc>,
    pub visible: bool,
}

/// Data required to create a new device.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewDevice {
    pub device_name: String,
    #[serde(default)]
    pub device_vendor_id: Option<Uuid>,
    #[serde(default)]
    pub device_label_id: Option<Uuid>,
    #[serde(default)]
    pub device_user_id: Option<Uuid>,
}

/// A device joined with its vendor name.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DeviceWithVendor {
    pub id: Uuid,
    pub device_name: String,
    pub vendor_name: Option<String>,
    pub device_date: DateTime<Utc>,
    pub visible: bool,
}

impl NewDevice {
    pub fn validate(&self) -> Result<(), String> {
        validate_name("device_name", &self.device_name)
    }
}

impl Device {
    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.device_user_id == Some(user_id)
    }

    /// Returns the visibility after a toggle requested by `user_id`,
    /// or `None` if the user does not own the device.
    pub fn toggled_visibility(&self, user_id: Uuid) -> Option<bool> {
        self.is_owned_by(user_id).then_some(!self.visible)
    }
}

impl DeviceWithVendor {
    /// `name(vendor)`, or just the name for devices without a vendor.
    pub fn display_name(&self) -> String {
        match &self.vendor_name {
            Some(vendor) => format!("{}({})", self.device_name, vendor),
            None => self.device_name.clone(),
        }
    }

    pub fn tag(&self) -> DeviceTag {
        DeviceTag::new(self.device_name.clone(), self.vendor_name.clone())
    }
}
