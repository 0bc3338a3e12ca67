use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

pub const SUCCESS_MESSAGE: &str = "Model is predicted successfully";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
pub enum PredictionResult {
    #[serde(rename = "Cancer")]
    #[strum(serialize = "Cancer")]
    Cancer,
    #[serde(rename = "Non-cancer")]
    #[strum(serialize = "Non-cancer")]
    NonCancer,
}

impl PredictionResult {
    pub fn suggestion(&self) -> &'static str {
        match self {
            PredictionResult::Cancer => "Segera periksa ke dokter!",
            PredictionResult::NonCancer => "Penyakit kanker tidak terdeteksi.",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    Success,
    Fail,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PredictionData {
    pub id: String,
    pub result: PredictionResult,
    pub suggestion: String,
    #[serde(rename = "createdAt")]
    pub created_at: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PredictResponse {
    pub status: ResponseStatus,
    pub message: String,
    pub data: PredictionData,
}

impl PredictResponse {
    pub fn success(data: PredictionData) -> Self {
        Self {
            status: ResponseStatus::Success,
            message: SUCCESS_MESSAGE.to_string(),
            data,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct FailResponse {
    pub status: ResponseStatus,
    pub message: String,
}

impl FailResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            status: ResponseStatus::Fail,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn labels_use_wire_names() {
        assert_eq!(PredictionResult::NonCancer.to_string(), "Non-cancer");
        assert_eq!(
            serde_json::to_value(PredictionResult::Cancer).unwrap(),
            serde_json::json!("Cancer")
        );
        assert_eq!(
            PredictionResult::from_str("Non-cancer").unwrap(),
            PredictionResult::NonCancer
        );
    }

    #[test]
    fn success_envelope_shape() {
        let response = PredictResponse::success(PredictionData {
            id: "abc".into(),
            result: PredictionResult::Cancer,
            suggestion: PredictionResult::Cancer.suggestion().into(),
            created_at: "2024-01-01T00:00:00.000Z".into(),
        });
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["status"], "success");
        assert_eq!(value["message"], SUCCESS_MESSAGE);
        assert_eq!(value["data"]["createdAt"], "2024-01-01T00:00:00.000Z");
        assert_eq!(value["data"]["suggestion"], "Segera periksa ke dokter!");
    }

    #[test]
    fn fail_envelope_shape() {
        let value = serde_json::to_value(FailResponse::new("oops")).unwrap();
        assert_eq!(value, serde_json::json!({"status": "fail", "message": "oops"}));
    }
}
