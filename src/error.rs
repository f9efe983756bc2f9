use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use thiserror::Error;

use crate::models::ApiResponse;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("request carried no image data")]
    NoInputData,

    #[error("request payload exceeds {limit} bytes")]
    PayloadTooLarge { limit: usize },

    #[error("image is {width}x{height}, expected {expected}x{expected}")]
    InvalidDimensions {
        width: u32,
        height: u32,
        expected: u32,
    },

    #[error("image decode error: {0}")]
    Decode(#[from] image::ImageError),

    #[error("model load error: {0}")]
    ModelLoad(String),

    #[error("inference error: {0}")]
    Inference(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn model_load(msg: impl Into<String>) -> Self {
        Self::ModelLoad(msg.into())
    }

    pub fn inference(msg: impl Into<String>) -> Self {
        Self::Inference(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Message placed in the `message` field of the error envelope.
    ///
    /// Server-side failures share one opaque message; their details only go
    /// to the log.
    pub fn public_message(&self) -> &'static str {
        match self {
            Self::NoInputData => "improper or no input data",
            Self::PayloadTooLarge { .. } => "input payload exceeds size limit",
            Self::InvalidDimensions { .. } => "input image has incorrect dimensions",
            Self::Decode(_) => "input image could not be decoded",
            Self::ModelLoad(_) | Self::Inference(_) | Self::Config(_) | Self::Io(_) => {
                "internal inference error"
            }
        }
    }
}

impl ResponseError for Error {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::NoInputData | Self::InvalidDimensions { .. } | Self::Decode(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Self::ModelLoad(_) | Self::Inference(_) | Self::Config(_) | Self::Io(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ApiResponse::error(self.public_message()))
    }
}
