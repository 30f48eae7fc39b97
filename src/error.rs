use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::account::auth::HashError;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    #[error("User already exists")]
    DuplicateIdentity,
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Invalid or expired OTP")]
    InvalidOtp,
    #[error("Invalid token")]
    InvalidToken,
    #[error("Access token required")]
    Unauthenticated,
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("{0}")]
    Validation(String),
    #[error("Please verify your email first. We've sent a verification code to your email.")]
    VerificationRequired { otp: Option<u32> },
    #[error("internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::DuplicateIdentity
            | Self::InvalidCredentials
            | Self::InvalidOtp
            | Self::Validation(_)
            | Self::VerificationRequired { .. } => StatusCode::BAD_REQUEST,
            Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::InvalidToken => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<HashError> for ServiceError {
    fn from(err: HashError) -> Self {
        ServiceError::Internal(err.to_string())
    }
}

impl From<JsonRejection> for ServiceError {
    fn from(rejection: JsonRejection) -> Self {
        ServiceError::Validation(rejection.body_text())
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            Self::Internal(detail) => {
                tracing::error!("Request failed: {}", detail);
                json!({ "success": false, "message": "Server error" })
            }
            Self::VerificationRequired { otp: Some(otp) } => json!({
                "success": false,
                "message": self.to_string(),
                "data": { "otp": otp },
            }),
            _ => json!({ "success": false, "message": self.to_string() }),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ServiceError::DuplicateIdentity.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ServiceError::Unauthenticated.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ServiceError::InvalidToken.status(), StatusCode::FORBIDDEN);
        assert_eq!(ServiceError::NotFound("Resume").status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ServiceError::Internal("boom".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_messages_are_generic() {
        assert_eq!(ServiceError::NotFound("Resume").to_string(), "Resume not found");
        assert_eq!(ServiceError::InvalidCredentials.to_string(), "Invalid credentials");
    }
}
