use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    Extension, Json,
};
use chrono::Utc;
use serde_json::Value;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info, warn};

use super::middleware::AuthUser;
use super::types::*;
use super::ApiState;
use crate::account::store::check_password;
use crate::account::{Account, AccountId, CredentialHasher, IdentifierKind, NewAccount};
use crate::error::ServiceError;
use crate::notify::{self, ConsoleNotifier, Notification};
use crate::resume::{payload_from_value, Resume, ResumeId};

pub const ENDPOINTS: [&str; 9] = [
    "POST /api/register - User registration",
    "POST /api/login - User login",
    "POST /api/verify-otp - OTP verification",
    "POST /api/auth/send-otp - Send OTP to existing user",
    "GET /api/auth/verify-token - Verify access token",
    "GET /api/resumes - Get user resumes",
    "POST /api/resumes - Create resume",
    "PUT /api/resumes/:id - Update resume",
    "DELETE /api/resumes/:id - Delete resume",
];

//
// === Helper Functions for Safe Operations ===
//
/// Acquire a store lock without panicking on poison
fn safe_lock<T>(mutex: &Arc<Mutex<T>>) -> Result<MutexGuard<'_, T>, ServiceError> {
    mutex.lock().map_err(|e| {
        tracing::error!("Mutex poisoned: {}", e);
        ServiceError::Internal("mutex poisoned".to_string())
    })
}

/// Run a hashing job off the async workers
async fn blocking_hash<T, F>(hasher: Arc<dyn CredentialHasher>, job: F) -> Result<T, ServiceError>
where
    F: FnOnce(&dyn CredentialHasher) -> Result<T, ServiceError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(move || job(hasher.as_ref()))
        .await
        .map_err(|e| ServiceError::Internal(format!("hashing task failed: {}", e)))?
}

fn require_field(value: &str, field: &str) -> Result<(), ServiceError> {
    if value.trim().is_empty() {
        return Err(ServiceError::Validation(format!("{} is required", field)));
    }
    Ok(())
}

fn issue_otp(state: &ApiState, account_id: AccountId) -> Result<u32, ServiceError> {
    let mut accounts = safe_lock(&state.accounts)?;
    let account = accounts
        .get_mut(account_id)
        .ok_or_else(|| ServiceError::Internal(format!("account {} vanished", account_id)))?;
    state.otp.issue(account)
}

fn auth_response(state: &ApiState, account: &Account, message: &str) -> Result<Json<AuthResponse>, ServiceError> {
    let token = state.sessions.mint(account.id)?;
    Ok(Json(AuthResponse {
        success: true,
        message: message.to_string(),
        token,
        user: account.public(),
    }))
}

//
// === Individual Handlers ===
//

/// GET /
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        success: true,
        message: "Resume Builder API is running!".to_string(),
        timestamp: Utc::now().to_rfc3339(),
        endpoints: ENDPOINTS.to_vec(),
    })
}

/// POST /api/register
pub async fn register(
    State(state): State<ApiState>,
    body: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<MessageResponse<RegisterData>>), ServiceError> {
    let Json(req) = body?;
    require_field(&req.name, "name")?;
    require_field(&req.email, "email")?;
    require_field(&req.password, "password")?;

    // Cheap rejection before hashing; the insert re-checks under the lock
    let taken = safe_lock(&state.accounts)?.get_by_email(&req.email).is_some();
    if taken {
        return Err(ServiceError::DuplicateIdentity);
    }

    let password = req.password.clone();
    let password_hash =
        blocking_hash(state.hasher.clone(), move |h| Ok(h.hash(&password)?)).await?;

    let (account, code) = {
        let mut accounts = safe_lock(&state.accounts)?;
        let id = accounts
            .insert(
                NewAccount {
                    name: req.name,
                    email: req.email,
                    phone: req.phone,
                    password_hash,
                },
                Utc::now(),
            )?
            .id;
        let stored = accounts
            .get_mut(id)
            .ok_or_else(|| ServiceError::Internal("account missing after insert".to_string()))?;
        let code = state.otp.issue(stored)?;
        (stored.clone(), code)
    };
    info!("Registered account {}", account.id);

    notify::dispatch(state.notifier.as_ref(), &account.email, &Notification::Otp { code }).await;

    let data = RegisterData {
        user_id: account.id,
        otp: state.expose_otp.then_some(code),
    };
    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::ok(
            "User registered successfully. OTP sent to email.",
            Some(data),
        )),
    ))
}

/// POST /api/login
pub async fn login(
    State(state): State<ApiState>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<AuthResponse>, ServiceError> {
    let Json(req) = body?;

    let account = safe_lock(&state.accounts)?
        .get_by_email(&req.email)
        .cloned()
        .ok_or(ServiceError::InvalidCredentials)?;

    let candidate = account.clone();
    let password = req.password;
    blocking_hash(state.hasher.clone(), move |h| check_password(h, &candidate, &password)).await?;

    if !account.verified {
        let code = issue_otp(&state, account.id)?;
        debug!("Login for unverified account {}, reissued OTP", account.id);
        notify::dispatch(state.notifier.as_ref(), &account.email, &Notification::Otp { code }).await;
        return Err(ServiceError::VerificationRequired {
            otp: state.expose_otp.then_some(code),
        });
    }

    info!("Account {} logged in", account.id);
    auth_response(&state, &account, "Login successful")
}

/// POST /api/verify-otp
pub async fn verify_otp(
    State(state): State<ApiState>,
    body: Result<Json<IdentifierRequest>, JsonRejection>,
) -> Result<Json<AuthResponse>, ServiceError> {
    let Json(req) = body?;
    let identifier = req.resolve_identifier()?;
    let supplied = req.otp_code().ok_or(ServiceError::InvalidOtp)?;

    let account = {
        let mut accounts = safe_lock(&state.accounts)?;
        // Unknown identifier looks the same as a wrong code
        let account = accounts
            .resolve_identifier_mut(identifier)
            .ok_or(ServiceError::InvalidOtp)?;
        state.otp.validate(account, supplied)?;
        account.clone()
    };

    info!("Account {} verified", account.id);
    auth_response(&state, &account, "Verification successful")
}

/// POST /api/auth/send-otp
pub async fn send_otp(
    State(state): State<ApiState>,
    body: Result<Json<IdentifierRequest>, JsonRejection>,
) -> Result<Json<MessageResponse<OtpData>>, ServiceError> {
    let Json(req) = body?;
    let identifier = req.resolve_identifier()?;
    let kind = IdentifierKind::classify(identifier);

    let (recipient, code) = {
        let mut accounts = safe_lock(&state.accounts)?;
        let account = accounts
            .resolve_identifier_mut(identifier)
            .ok_or(ServiceError::NotFound("User"))?;
        let code = state.otp.issue(account)?;
        let recipient = match kind {
            IdentifierKind::Email => account.email.clone(),
            IdentifierKind::Phone => identifier.to_string(),
        };
        (recipient, code)
    };
    debug!("OTP for {}: {}", identifier, code);

    let message = Notification::Otp { code };
    match kind {
        IdentifierKind::Email => {
            notify::dispatch_detached(state.notifier.clone(), recipient, message)
        }
        // No SMS channel; phone codes only reach the log
        IdentifierKind::Phone => notify::dispatch(&ConsoleNotifier, &recipient, &message).await,
    }

    let data = state.expose_otp.then_some(OtpData { otp: code });
    Ok(Json(MessageResponse::ok("OTP sent successfully", data)))
}

/// GET /api/auth/verify-token
pub async fn verify_token(
    Extension(AuthUser(account_id)): Extension<AuthUser>,
) -> Json<MessageResponse<TokenData>> {
    Json(MessageResponse::ok(
        "Token is valid",
        Some(TokenData { user_id: account_id }),
    ))
}

/// GET /api/resumes
pub async fn list_resumes(
    State(state): State<ApiState>,
    Extension(AuthUser(owner)): Extension<AuthUser>,
) -> Result<Json<MessageResponse<Vec<Resume>>>, ServiceError> {
    let resumes = safe_lock(&state.resumes)?.list_for(owner);
    Ok(Json(MessageResponse::data(resumes)))
}

/// POST /api/resumes
pub async fn create_resume(
    State(state): State<ApiState>,
    Extension(AuthUser(owner)): Extension<AuthUser>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<MessageResponse<Resume>>), ServiceError> {
    let Json(value) = body?;
    let payload = payload_from_value(value)?;

    let resume = safe_lock(&state.resumes)?.create(owner, payload);
    debug!("Account {} created resume {}", owner, resume.id);

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::ok("Resume created successfully", Some(resume))),
    ))
}

/// A path id that is not a number cannot name any resume
fn resume_id(path: Result<Path<ResumeId>, PathRejection>) -> Result<ResumeId, ServiceError> {
    path.map(|Path(id)| id).map_err(|_| ServiceError::NotFound("Resume"))
}

/// PUT /api/resumes/:id
pub async fn update_resume(
    State(state): State<ApiState>,
    Extension(AuthUser(owner)): Extension<AuthUser>,
    path: Result<Path<ResumeId>, PathRejection>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<MessageResponse<Resume>>, ServiceError> {
    let id = resume_id(path)?;
    let Json(value) = body?;
    let patch = payload_from_value(value)?;

    let resume = safe_lock(&state.resumes)?.update(owner, id, patch)?;
    Ok(Json(MessageResponse::ok("Resume updated successfully", Some(resume))))
}

/// DELETE /api/resumes/:id
pub async fn delete_resume(
    State(state): State<ApiState>,
    Extension(AuthUser(owner)): Extension<AuthUser>,
    path: Result<Path<ResumeId>, PathRejection>,
) -> Result<Json<MessageResponse<()>>, ServiceError> {
    let id = resume_id(path)?;
    safe_lock(&state.resumes)?.remove(owner, id).map_err(|e| {
        warn!("Account {} failed to delete resume {}", owner, id);
        e
    })?;
    Ok(Json(MessageResponse::ok("Resume deleted successfully", None)))
}
