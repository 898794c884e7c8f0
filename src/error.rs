use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

/// 应用统一错误类型
#[derive(Error, Debug, utoipa::ToSchema)]
pub enum AppError {
    /// 参数校验错误（缺少图片数据、base64/PNG 无效、文件名非法）
    #[error("参数校验错误: {0}")]
    Validation(String),

    /// 文件不存在
    #[error("文件不存在: {0}")]
    NotFound(String),

    /// 存储目录读写失败
    #[error("存储错误: {0}")]
    Storage(String),

    /// 页面模板渲染失败
    #[error("页面渲染错误: {0}")]
    Template(String),
}

/// 错误响应体。
///
/// 与拍摄页面脚本约定：失败时 `success=false`，`error` 为可直接展示的提示。
#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    /// 固定为 false
    #[schema(example = false)]
    pub success: bool,
    /// 人类可读的错误信息
    #[schema(example = "文件不存在: photo_20240101_120000.png")]
    pub error: String,
    /// 稳定的错误码，用于程序化处理
    #[schema(example = "NOT_FOUND")]
    pub code: String,
    /// 请求追踪 ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Storage(_) | AppError::Template(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn stable_code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "VALIDATION_FAILED",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Storage(_) => "STORAGE_ERROR",
            AppError::Template(_) => "TEMPLATE_ERROR",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let request_id = crate::request_id::current_request_id();

        if status.is_server_error() {
            tracing::error!(request_id = ?request_id, "请求处理失败: {}", self);
        } else {
            tracing::warn!(request_id = ?request_id, "请求被拒绝: {}", self);
        }

        let body = ErrorBody {
            success: false,
            error: self.to_string(),
            code: self.stable_code().to_string(),
            request_id,
        };

        (status, Json(body)).into_response()
    }
}

// =============== Error conversions for common external errors ===============

impl From<base64::DecodeError> for AppError {
    fn from(err: base64::DecodeError) -> Self {
        AppError::Validation(format!("图片数据不是有效的 base64: {err}"))
    }
}

impl From<minijinja::Error> for AppError {
    fn from(err: minijinja::Error) -> Self {
        AppError::Template(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::AppError;
    use axum::{body::to_bytes, http::StatusCode, response::IntoResponse};

    #[test]
    fn status_codes_follow_error_kind() {
        assert_eq!(
            AppError::Validation(String::new()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::NotFound(String::new()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::Storage(String::new()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn base64_errors_are_validation_failures() {
        let err: AppError = base64::DecodeError::InvalidLength(3).into();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn error_body_carries_success_false_and_code() {
        let resp = AppError::Validation("缺少图片数据".into()).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body = to_bytes(resp.into_body(), usize::MAX)
            .await
            .expect("read body");
        let json: serde_json::Value = serde_json::from_slice(&body).expect("parse json");
        assert_eq!(json["success"], false);
        assert_eq!(json["code"], "VALIDATION_FAILED");
        assert!(json["error"].as_str().unwrap_or("").contains("缺少图片数据"));
        assert!(json.get("requestId").is_none());
    }
}
