use serde::{Deserialize, Serialize};

use crate::decision::Decision;
use crate::scoring::ClassificationResult;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Error,
}

/// Scores behind a decision, as returned in the `data` field.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PredictionData {
    pub class_names: Vec<String>,
    pub scores: Vec<f32>,
    pub margin: f32,
    pub confidence: f32,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum ResponseData {
    Prediction(PredictionData),
    Text(String),
}

/// JSON envelope shared by every response of the endpoint.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ApiResponse {
    pub message: String,
    pub data: ResponseData,
    pub status: Status,
}

#[derive(Debug, Clone)]
pub struct Prediction {
    pub result: ClassificationResult,
    pub decision: Decision,
}

impl ApiResponse {
    pub fn success(prediction: &Prediction) -> Self {
        let result = &prediction.result;
        Self {
            message: prediction.decision.message().to_string(),
            data: ResponseData::Prediction(PredictionData {
                class_names: result.labels().map(str::to_string).collect(),
                scores: result.scores().collect(),
                margin: result.margin(),
                confidence: result.confidence(),
            }),
            status: Status::Success,
        }
    }

    pub fn error(message: &str) -> Self {
        Self {
            message: message.to_string(),
            data: ResponseData::Text("none".to_string()),
            status: Status::Error,
        }
    }
}
