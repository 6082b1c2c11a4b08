use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// =========================================================
// 错误分类枚举
// =========================================================

/// 错误分类，包含对应的语义（状态码）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    /// 5xx: 传输失败、服务端错误或响应解析失败
    Backend,
    /// 404: 记录不存在
    NotFound,
    /// 400: 字段值不合法（前端解析或后端校验）
    Validation,
    /// 401: 登录凭据不匹配
    InvalidCredentials,
}

impl ErrorKind {
    pub fn status_code(&self) -> u16 {
        match self {
            ErrorKind::Validation => 400,
            ErrorKind::InvalidCredentials => 401,
            ErrorKind::NotFound => 404,
            ErrorKind::Backend => 500,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            ErrorKind::Backend => "BACKEND_ERROR",
            ErrorKind::NotFound => "RESOURCE_NOT_FOUND",
            ErrorKind::Validation => "VALIDATION_ERROR",
            ErrorKind::InvalidCredentials => "INVALID_CREDENTIALS",
        }
    }
}

// =========================================================
// 字段校验错误
// =========================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// 一次提交中收集到的全部字段错误
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.push(field, message);
        errors
    }

    pub fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.push(FieldError {
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.0.iter()
    }

    /// 指定字段的第一条错误
    pub fn for_field(&self, field: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.message.as_str())
    }

    /// 没有错误时返回 `value`，否则返回全部错误
    pub fn into_result<T>(self, value: T) -> Result<T, Self> {
        if self.is_empty() { Ok(value) } else { Err(self) }
    }

    /// 解析后端的校验响应体
    ///
    /// 支持 `{"field": ["msg", ...]}`、`{"field": "msg"}` 以及
    /// `{"message": "..."}` 三种形状；无法识别时整体作为一条非字段错误。
    pub fn from_backend_body(body: &str) -> Self {
        let mut errors = Self::new();
        match serde_json::from_str::<serde_json::Value>(body) {
            Ok(serde_json::Value::Object(map)) => {
                for (field, value) in map {
                    match value {
                        serde_json::Value::Array(items) => {
                            for item in items {
                                errors.push(field.clone(), json_text(&item));
                            }
                        }
                        other => errors.push(field, json_text(&other)),
                    }
                }
            }
            _ => {
                let text = body.trim();
                if !text.is_empty() {
                    errors.push("non_field_errors", text);
                }
            }
        }
        errors
    }
}

fn json_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, e) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{}: {}", e.field, e.message)?;
        }
        Ok(())
    }
}

// =========================================================
// 核心错误类型
// =========================================================

/// 应用错误
///
/// 所有失败都只作用于触发它的那一次操作，不会终止进程。
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AppError {
    #[error("backend error: {0}")]
    Backend(String),
    #[error("{0}")]
    NotFound(String),
    #[error("validation failed: {0}")]
    Validation(ValidationErrors),
    #[error("invalid username or password")]
    InvalidCredentials,
}

impl AppError {
    pub fn backend(message: impl Into<String>) -> Self {
        AppError::Backend(message.into())
    }

    /// 如 `Bike 42 not found`
    pub fn not_found(label: &str, id: impl fmt::Display) -> Self {
        AppError::NotFound(format!("{} {} not found", label, id))
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        AppError::Validation(ValidationErrors::single(field, message))
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::Backend(_) => ErrorKind::Backend,
            AppError::NotFound(_) => ErrorKind::NotFound,
            AppError::Validation(_) => ErrorKind::Validation,
            AppError::InvalidCredentials => ErrorKind::InvalidCredentials,
        }
    }

    pub fn status_code(&self) -> u16 {
        self.kind().status_code()
    }

    pub fn error_code(&self) -> &'static str {
        self.kind().error_code()
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, AppError::NotFound(_))
    }

    /// 将非 2xx 的 HTTP 响应映射为错误
    pub fn from_status(status: u16, body: &str, context: &str) -> Self {
        match status {
            404 => AppError::NotFound(format!("{}: not found", context)),
            400 | 422 => AppError::Validation(ValidationErrors::from_backend_body(body)),
            _ => AppError::Backend(format!("{}: HTTP {}", context, status)),
        }
    }
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        AppError::Validation(errors)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(e: serde_json::Error) -> Self {
        AppError::Backend(format!("malformed payload: {}", e))
    }
}

pub type AppResult<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping_follows_taxonomy() {
        assert!(AppError::from_status(404, "", "GET /api/bikes/1/").is_not_found());
        assert_eq!(
            AppError::from_status(503, "", "GET /api/bikes/").kind(),
            ErrorKind::Backend
        );
        assert_eq!(AppError::InvalidCredentials.status_code(), 401);
        assert_eq!(
            AppError::validation("price", "must be a number").error_code(),
            "VALIDATION_ERROR"
        );
    }

    #[test]
    fn backend_field_errors_are_flattened() {
        let body = r#"{"email": ["customer with this email already exists."], "phone": "required"}"#;
        let errors = ValidationErrors::from_backend_body(body);
        assert_eq!(errors.len(), 2);
        assert_eq!(
            errors.for_field("email"),
            Some("customer with this email already exists.")
        );
        assert_eq!(errors.for_field("phone"), Some("required"));
    }

    #[test]
    fn unstructured_validation_body_becomes_non_field_error() {
        let errors = ValidationErrors::from_backend_body("Bad Request");
        assert_eq!(errors.for_field("non_field_errors"), Some("Bad Request"));
        assert!(ValidationErrors::from_backend_body("  ").is_empty());
    }

    #[test]
    fn display_joins_field_messages() {
        let mut errors = ValidationErrors::new();
        errors.push("price", "must be a number");
        errors.push("quantity", "must be greater than zero");
        let err = AppError::from(errors);
        assert_eq!(
            err.to_string(),
            "validation failed: price: must be a number; quantity: must be greater than zero"
        );
    }
}
