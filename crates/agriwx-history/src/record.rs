use agriwx_weather::CurrentConditions;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A lookup about to be stored
#[derive(Debug, Clone, PartialEq)]
pub struct NewLookupRecord {
    pub location_label: String,
    pub current: CurrentConditions,
    pub advisories: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl NewLookupRecord {
    /// Stamp a lookup with the current time
    pub fn now(
        location_label: impl Into<String>,
        current: CurrentConditions,
        advisories: Vec<String>,
    ) -> Self {
        Self {
            location_label: location_label.into(),
            current,
            advisories,
            created_at: Utc::now(),
        }
    }
}

/// A retained lookup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LookupRecord {
    pub id: i64,
    #[serde(rename = "location")]
    pub location_label: String,
    pub current: CurrentConditions,
    pub advisories: Vec<String>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}
