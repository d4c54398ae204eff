//! Label model for user-defined tags.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::validate_name;

/// A tag attached to devices and analyses.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Label {
    pub id: Uuid,
    /// Unique label name.
    pub label_name: String,
    pub label_date: DateTime<Utc>,
}

/// Data required to create a new label.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewLabel {
    pub label_name: String,
}

impl NewLabel {
    pub fn validate(&self) -> Result<(), String> {
        validate_name("label_name", &self.label_name)
    }
}
