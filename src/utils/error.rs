use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClassifyError {
    #[error("Model unavailable: {0}")]
    ModelUnavailable(String),

    #[error("Image decode failed: {0}")]
    DecodeFailure(String),

    #[error("Input shape mismatch: model expects {expected}, got {actual}")]
    ShapeMismatch { expected: String, actual: String },

    #[error("Inference failed: {message}")]
    Inference {
        message: String,
        /// 模型声明的输入形状，用于诊断提示
        input_shape: Option<String>,
    },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("File too large: {0}")]
    FileTooLarge(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Base64 decode error: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl From<image::ImageError> for ClassifyError {
    fn from(err: image::ImageError) -> Self {
        ClassifyError::DecodeFailure(err.to_string())
    }
}

impl ClassifyError {
    pub fn inference(message: impl Into<String>) -> Self {
        ClassifyError::Inference {
            message: message.into(),
            input_shape: None,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ClassifyError::ModelUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ClassifyError::DecodeFailure(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ClassifyError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ClassifyError::FileTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ClassifyError::UnsupportedFormat(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ClassifyError::Validation(_) => StatusCode::BAD_REQUEST,
            ClassifyError::Base64(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            ClassifyError::ModelUnavailable(_) => "MODEL_UNAVAILABLE",
            ClassifyError::DecodeFailure(_) => "IMAGE_DECODE_ERROR",
            ClassifyError::ShapeMismatch { .. } => "SHAPE_MISMATCH",
            ClassifyError::Inference { .. } => "INFERENCE_ERROR",
            ClassifyError::InvalidInput(_) => "INVALID_INPUT",
            ClassifyError::FileTooLarge(_) => "FILE_TOO_LARGE",
            ClassifyError::UnsupportedFormat(_) => "UNSUPPORTED_FORMAT",
            ClassifyError::Validation(_) => "VALIDATION_ERROR",
            ClassifyError::Config(_) => "CONFIG_ERROR",
            ClassifyError::Base64(_) => "BASE64_DECODE_ERROR",
            ClassifyError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// 面向用户的排查提示
    pub fn hint(&self) -> Option<String> {
        match self {
            ClassifyError::ShapeMismatch { expected, .. } => Some(format!(
                "Tip: Check if the model input shape matches {}.",
                expected
            )),
            ClassifyError::Inference {
                input_shape: Some(shape),
                ..
            } => Some(format!("Tip: Check if the model input shape matches {}.", shape)),
            ClassifyError::DecodeFailure(_) | ClassifyError::UnsupportedFormat(_) => {
                Some("Please upload a JPEG or PNG image.".to_string())
            }
            _ => None,
        }
    }
}

/// 带请求ID的错误响应，请求ID与成功响应保持一致
#[derive(Debug)]
pub struct ApiError {
    pub request_id: String,
    pub error: ClassifyError,
}

impl ApiError {
    pub fn new(request_id: impl Into<String>, error: ClassifyError) -> Self {
        Self {
            request_id: request_id.into(),
            error,
        }
    }
}

/// 为处理器中的 `Result` 附加请求ID
pub trait WithRequestId<T> {
    fn with_request_id(self, request_id: &str) -> std::result::Result<T, ApiError>;
}

impl<T> WithRequestId<T> for std::result::Result<T, ClassifyError> {
    fn with_request_id(self, request_id: &str) -> std::result::Result<T, ApiError> {
        self.map_err(|error| ApiError::new(request_id, error))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let ApiError { request_id, error } = self;
        let status = error.status_code();
        let error_response = serde_json::json!({
            "success": false,
            "error": {
                "code": error.error_code(),
                "message": error.to_string(),
                "hint": error.hint(),
            },
            "timestamp": chrono::Utc::now().to_rfc3339(),
            "request_id": &request_id,
        });

        if status.is_server_error() {
            tracing::error!("Request failed: request_id={}, {} ({})", request_id, error, status);
        } else {
            tracing::warn!("Request rejected: request_id={}, {} ({})", request_id, error, status);
        }

        (status, axum::Json(error_response)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Result;

    #[test]
    fn taxonomy_maps_to_distinct_statuses() {
        assert_eq!(
            ClassifyError::ModelUnavailable("gone".into()).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            ClassifyError::DecodeFailure("bad".into()).status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            ClassifyError::inference("boom").status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ClassifyError::FileTooLarge("10 bytes".into()).status_code(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
    }

    #[test]
    fn shape_mismatch_echoes_expected_shape() {
        let err = ClassifyError::ShapeMismatch {
            expected: "(None, 128, 128, 3)".to_string(),
            actual: "(1, 64, 64, 3)".to_string(),
        };

        assert_eq!(err.error_code(), "SHAPE_MISMATCH");
        assert!(err.to_string().contains("(None, 128, 128, 3)"));
        assert_eq!(
            err.hint().as_deref(),
            Some("Tip: Check if the model input shape matches (None, 128, 128, 3).")
        );
    }

    #[test]
    fn inference_hint_only_with_known_shape() {
        assert!(ClassifyError::inference("boom").hint().is_none());

        let err = ClassifyError::Inference {
            message: "boom".into(),
            input_shape: Some("(1, 128, 128, 3)".into()),
        };
        assert!(err.hint().unwrap().contains("(1, 128, 128, 3)"));
    }

    #[tokio::test]
    async fn error_body_carries_request_id() {
        use http_body_util::BodyExt;

        let result: Result<()> = Err(ClassifyError::Validation("Image data cannot be empty".into()));
        let response = result.with_request_id("req-7").unwrap_err().into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["request_id"], "req-7");
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        assert_eq!(body["success"], false);
    }

    #[test]
    fn image_errors_become_decode_failures() {
        let err: ClassifyError = image::load_from_memory(b"not an image").unwrap_err().into();
        assert!(matches!(err, ClassifyError::DecodeFailure(_)));
    }
}
