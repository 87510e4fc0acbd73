use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, thiserror::Error)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("{0}")]
    NotFound(String),

    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    #[error("Unsupported media type: {0}")]
    UnsupportedMediaType(String),

    #[error("OpenRouter request failed: {0}")]
    OpenRouterError(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Message shown to API clients in the `error` field.
    pub fn user_message(&self) -> &str {
        match self {
            Self::BadRequest(msg) => msg,
            Self::Unauthorized => "Unauthorized",
            Self::NotFound(msg) => msg,
            Self::PayloadTooLarge(msg) => msg,
            Self::UnsupportedMediaType(msg) => msg,
            Self::OpenRouterError(_) => "Failed to generate AI response",
            Self::ServiceUnavailable(msg) => msg,
            Self::Storage(_) | Self::Internal(_) => "Internal server error",
        }
    }

    /// Extra detail returned alongside `error`, only where it is safe to expose.
    pub fn detail(&self) -> Option<&str> {
        match self {
            Self::OpenRouterError(msg) => Some(msg),
            _ => None,
        }
    }

    pub fn status_code(&self) -> u16 {
        match self {
            Self::BadRequest(_) => 400,
            Self::Unauthorized => 401,
            Self::NotFound(_) => 404,
            Self::PayloadTooLarge(_) => 413,
            Self::UnsupportedMediaType(_) => 415,
            Self::OpenRouterError(_) => 502,
            Self::ServiceUnavailable(_) => 503,
            Self::Storage(_) | Self::Internal(_) => 500,
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Storage(err.to_string())
    }
}

#[cfg(feature = "http")]
mod http_impl {
    use super::AppError;
    use axum::extract::rejection::JsonRejection;
    use axum::http::StatusCode;
    use axum::response::{IntoResponse, Response};
    use axum::Json;

    #[derive(serde::Serialize)]
    struct ErrorResponse<'a> {
        error: &'a str,
        #[serde(skip_serializing_if = "Option::is_none")]
        message: Option<&'a str>,
    }

    impl From<JsonRejection> for AppError {
        fn from(rejection: JsonRejection) -> Self {
            AppError::BadRequest(rejection.body_text())
        }
    }

    impl IntoResponse for AppError {
        fn into_response(self) -> Response {
            let status =
                StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            let body = ErrorResponse {
                error: self.user_message(),
                message: self.detail(),
            };
            (status, Json(body)).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(AppError::BadRequest("x".into()).status_code(), 400);
        assert_eq!(AppError::Unauthorized.status_code(), 401);
        assert_eq!(AppError::NotFound("Chat not found".into()).status_code(), 404);
        assert_eq!(AppError::UnsupportedMediaType("x".into()).status_code(), 415);
        assert_eq!(AppError::OpenRouterError("boom".into()).status_code(), 502);
        assert_eq!(AppError::Storage("disk".into()).status_code(), 500);
    }

    #[test]
    fn test_internal_details_are_hidden() {
        let err = AppError::Storage("/var/data/chats.json: permission denied".into());
        assert_eq!(err.user_message(), "Internal server error");
        assert!(err.detail().is_none());

        let err = AppError::OpenRouterError("API error: 429".into());
        assert_eq!(err.user_message(), "Failed to generate AI response");
        assert_eq!(err.detail(), Some("API error: 429"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: AppError = io_err.into();
        assert!(matches!(err, AppError::Storage(_)));
    }
}
