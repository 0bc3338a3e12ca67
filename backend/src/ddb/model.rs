use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use shared::{PredictionData, PredictionResult};
use uuid::Uuid;

/// Random UUID v4 in its hyphenated lowercase form.
pub fn generate_prediction_id() -> String {
    Uuid::new_v4().to_string()
}

/// ISO-8601 UTC timestamp with millisecond precision, e.g. `2024-05-01T10:00:00.123Z`.
pub fn timestamp_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PredictionRecord {
    pub id: String,
    pub result: PredictionResult,
    pub suggestion: String,
    #[serde(rename = "createdAt")]
    pub created_at: String,
}

impl PredictionRecord {
    pub fn new(result: PredictionResult) -> Self {
        Self {
            id: generate_prediction_id(),
            result,
            suggestion: result.suggestion().to_string(),
            created_at: timestamp_now(),
        }
    }
}

impl From<PredictionRecord> for PredictionData {
    fn from(record: PredictionRecord) -> Self {
        PredictionData {
            id: record.id,
            result: record.result,
            suggestion: record.suggestion,
            created_at: record.created_at,
        }
    }
}
