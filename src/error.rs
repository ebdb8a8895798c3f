//! 统一错误处理
//!
//! 提供 `ApiError` 枚举实现 `IntoResponse`，流水线错误附带外部工具的 stdout/stderr

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::domain::ValidationError;
use crate::services::PipelineError;

/// API 错误响应结构
#[derive(Debug, Default, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stdout: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stderr: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            ..Self::default()
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// 统一 API 错误类型
#[derive(Debug)]
pub enum ApiError {
    /// 400 - 请求无效
    BadRequest(ValidationError),
    /// 400/500 - 流水线错误，状态码由错误类型决定
    Pipeline(PipelineError),
    /// 500 - 内部错误
    Internal(String),
}

impl ApiError {
    /// 创建内部错误
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Pipeline(e) if e.is_client_error() => StatusCode::BAD_REQUEST,
            ApiError::Pipeline(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::BadRequest(err)
    }
}

impl From<PipelineError> for ApiError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::Validation(e) => ApiError::BadRequest(e),
            other => ApiError::Pipeline(other),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            ApiError::BadRequest(e) => ErrorResponse {
                field: e.field,
                ..ErrorResponse::new(e.message)
            },
            ApiError::Pipeline(e) => {
                let output = e.output();
                ErrorResponse {
                    error: e.to_string(),
                    message: e.detail(),
                    field: None,
                    stdout: output.map(|o| o.stdout.clone()),
                    stderr: output.map(|o| o.stderr.clone()),
                }
            }
            ApiError::Internal(msg) => ErrorResponse::new("internal error").with_message(msg),
        };

        (status, Json(body)).into_response()
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::BadRequest(e) => write!(f, "Bad request: {}", e),
            ApiError::Pipeline(e) => write!(f, "Pipeline error: {}", e),
            ApiError::Internal(m) => write!(f, "Internal error: {}", m),
        }
    }
}

impl std::error::Error for ApiError {}

/// 便捷类型别名
pub type ApiResult<T> = Result<T, ApiError>;
