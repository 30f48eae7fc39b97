// Request and response bodies for the HTTP API
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::account::{AccountId, PublicAccount};
use crate::error::ServiceError;

#[derive(Deserialize, Debug)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub phone: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Body shared by verify-otp and send-otp. `email` wins over `phone`,
/// which wins over `identifier`.
#[derive(Deserialize, Debug, Default)]
pub struct IdentifierRequest {
    #[serde(default)]
    pub identifier: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    /// Number or numeric string
    #[serde(default)]
    pub otp: Option<Value>,
}

impl IdentifierRequest {
    pub fn resolve_identifier(&self) -> Result<&str, ServiceError> {
        [&self.email, &self.phone, &self.identifier]
            .into_iter()
            .filter_map(|field| field.as_deref())
            .find(|value| !value.is_empty())
            .ok_or_else(|| {
                ServiceError::Validation("Identifier (email or phone) is required".to_string())
            })
    }

    /// The supplied code, if it looks like one
    pub fn otp_code(&self) -> Option<u32> {
        match self.otp.as_ref()? {
            Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

#[derive(Serialize, Debug)]
pub struct MessageResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T: Serialize> MessageResponse<T> {
    pub fn ok(message: &str, data: Option<T>) -> Self {
        Self {
            success: true,
            message: Some(message.to_string()),
            data,
        }
    }

    pub fn data(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data: Some(data),
        }
    }
}

/// Returned on successful login or OTP verification
#[derive(Serialize, Debug)]
pub struct AuthResponse {
    pub success: bool,
    pub message: String,
    pub token: String,
    pub user: PublicAccount,
}

#[derive(Serialize, Debug)]
pub struct RegisterData {
    #[serde(rename = "userId")]
    pub user_id: AccountId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub otp: Option<u32>,
}

#[derive(Serialize, Debug)]
pub struct OtpData {
    pub otp: u32,
}

#[derive(Serialize, Debug)]
pub struct TokenData {
    #[serde(rename = "userId")]
    pub user_id: AccountId,
}

#[derive(Serialize, Debug)]
pub struct HealthResponse {
    pub success: bool,
    pub message: String,
    pub timestamp: String,
    pub endpoints: Vec<&'static str>,
}
