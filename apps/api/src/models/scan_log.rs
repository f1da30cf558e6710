use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// One analytics row per completed scan. Carries no resume content.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ScanLogRow {
    pub id: Uuid,
    pub status: String,
    pub ats_score: Option<i32>,
    pub error_code: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl ScanLogRow {
    pub fn success(ats_score: u8) -> Self {
        Self {
            id: Uuid::new_v4(),
            status: "success".to_string(),
            ats_score: Some(i32::from(ats_score)),
            error_code: None,
            created_at: Utc::now(),
        }
    }

    pub fn failure(error_code: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            status: "failure".to_string(),
            ats_score: None,
            error_code: Some(error_code.to_string()),
            created_at: Utc::now(),
        }
    }
}
