//! Sampled host resource usage.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ResourceTimestamp {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub cpu_percentage: f64,
    pub memory_percentage: f64,
}

/// A usage sample to record; `timestamp` defaults to now.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewResourceTimestamp {
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    pub cpu_percentage: f64,
    pub memory_percentage: f64,
}

impl NewResourceTimestamp {
    pub fn validate(&self) -> Result<(), String> {
        for (field, value) in [
            ("cpu_percentage", self.cpu_percentage),
            ("memory_percentage", self.memory_percentage),
        ] {
            if !(0.0..=100.0).contains(&value) {
                return Err(format!("{} out of range: {} (expected 0-100)", field, value));
            }
        }
        Ok(())
    }
}
