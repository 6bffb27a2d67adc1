//! API Routes
//!
//! HTTP endpoint definitions.

use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    middleware,
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{AccountView, NewTransaction, ProfileUpdate, Transaction, TransactionKind};
use crate::error::AppError;

use super::middleware::{session_middleware, CurrentAccount};
use super::AppState;

// =========================================================================
// Request/Response types
// =========================================================================

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct GoogleAuthRequest {
    pub token: String,
}

#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub token: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Deserialize)]
pub struct DeleteAccountRequest {
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub message: String,
    pub token: String,
    pub user: AccountView,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub user: AccountView,
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub message: String,
    pub user: AccountView,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

// =========================================================================
// API Router
// =========================================================================

/// Build the `/api/v1` router with the session middleware applied to the
/// protected routes.
pub fn create_router(state: AppState) -> Router {
    let public = Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/google-auth", post(google_auth))
        .route("/auth/logout", post(logout))
        .route("/auth/forgot-password", post(forgot_password))
        .route("/auth/reset-password", post(reset_password));

    let protected = Router::new()
        .route("/auth/me", get(me))
        .route("/auth/profile", put(update_profile))
        .route("/auth/change-password", put(change_password))
        .route("/auth/delete-account", delete(delete_account))
        // Income routes
        .route("/add-income", post(add_income))
        .route("/get-incomes", get(get_incomes))
        .route("/delete-income/:id", delete(delete_income))
        // Expense routes
        .route("/add-expense", post(add_expense))
        .route("/get-expenses", get(get_expenses))
        .route("/delete-expense/:id", delete(delete_expense))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            session_middleware,
        ));

    public.merge(protected).with_state(state)
}

// =========================================================================
// Auth endpoints
// =========================================================================

/// Create a password account and sign it in
async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    let auth = state.auth_service();
    let success = auth
        .register(&request.name, &request.email, &request.password)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            message: "User registered successfully!".to_string(),
            token: success.token,
            user: success.account,
        }),
    ))
}

/// Password login
async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let auth = state.auth_service();
    let success = auth.login(&request.email, &request.password).await?;

    Ok(Json(AuthResponse {
        message: "Login successful!".to_string(),
        token: success.token,
        user: success.account,
    }))
}

/// Google sign-in or account link
async fn google_auth(
    State(state): State<AppState>,
    Json(request): Json<GoogleAuthRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let auth = state.auth_service();
    let success = auth.google_auth(&request.token).await?;

    Ok(Json(AuthResponse {
        message: "Login successful!".to_string(),
        token: success.token,
        user: success.account,
    }))
}

/// Session tokens are stateless; logout is client-side token discard
async fn logout() -> Json<MessageResponse> {
    Json(MessageResponse::new("Logged out successfully!"))
}

/// Start a password reset
async fn forgot_password(
    State(state): State<AppState>,
    Json(request): Json<ForgotPasswordRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    let auth = state.auth_service();
    let ack = auth.forgot_password(&request.email).await?;
    Ok(Json(MessageResponse::new(ack)))
}

/// Complete a password reset with the emailed secret
async fn reset_password(
    State(state): State<AppState>,
    Json(request): Json<ResetPasswordRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let auth = state.auth_service();
    let success = auth
        .reset_password(&request.token, &request.password)
        .await?;

    Ok(Json(AuthResponse {
        message: "Password reset successful!".to_string(),
        token: success.token,
        user: success.account,
    }))
}

/// Current account view
async fn me(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentAccount>,
) -> Result<Json<UserResponse>, AppError> {
    let auth = state.auth_service();
    let user = auth.me(current.account_id).await?;
    Ok(Json(UserResponse { user }))
}

/// Update name/email/picture
async fn update_profile(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentAccount>,
    Json(request): Json<ProfileUpdate>,
) -> Result<Json<ProfileResponse>, AppError> {
    let auth = state.auth_service();
    let user = auth.update_profile(current.account_id, request).await?;

    Ok(Json(ProfileResponse {
        message: "Profile updated successfully!".to_string(),
        user,
    }))
}

/// Change the password after confirming the current one
async fn change_password(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentAccount>,
    Json(request): Json<ChangePasswordRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    let auth = state.auth_service();
    auth.change_password(
        current.account_id,
        &request.current_password,
        &request.new_password,
    )
    .await?;

    Ok(Json(MessageResponse::new("Password changed successfully!")))
}

/// Delete the account and everything it owns
async fn delete_account(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentAccount>,
    Json(request): Json<DeleteAccountRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    let auth = state.auth_service();
    auth.delete_account(current.account_id, request.password.as_deref())
        .await?;

    Ok(Json(MessageResponse::new("Account deleted successfully!")))
}

// =========================================================================
// Transaction endpoints
// =========================================================================

async fn add_transaction(
    state: AppState,
    owner_id: Uuid,
    kind: TransactionKind,
    new: NewTransaction,
) -> Result<Json<MessageResponse>, AppError> {
    new.validate()?;
    state.transactions().insert(owner_id, kind, &new).await?;
    Ok(Json(MessageResponse::new(format!("{} Added", kind.label()))))
}

async fn list_transactions(
    state: AppState,
    owner_id: Uuid,
    kind: TransactionKind,
) -> Result<Json<Vec<Transaction>>, AppError> {
    let records = state.transactions().list_for_owner(owner_id, kind).await?;
    Ok(Json(records))
}

async fn delete_transaction(
    state: AppState,
    owner_id: Uuid,
    kind: TransactionKind,
    id: Uuid,
) -> Result<Json<MessageResponse>, AppError> {
    state.transactions().delete(owner_id, kind, id).await?;
    Ok(Json(MessageResponse::new(format!(
        "{} Deleted",
        kind.label()
    ))))
}

async fn add_income(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentAccount>,
    Json(request): Json<NewTransaction>,
) -> Result<Json<MessageResponse>, AppError> {
    add_transaction(state, current.account_id, TransactionKind::Income, request).await
}

async fn get_incomes(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentAccount>,
) -> Result<Json<Vec<Transaction>>, AppError> {
    list_transactions(state, current.account_id, TransactionKind::Income).await
}

async fn delete_income(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentAccount>,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, AppError> {
    delete_transaction(state, current.account_id, TransactionKind::Income, id).await
}

async fn add_expense(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentAccount>,
    Json(request): Json<NewTransaction>,
) -> Result<Json<MessageResponse>, AppError> {
    add_transaction(state, current.account_id, TransactionKind::Expense, request).await
}

async fn get_expenses(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentAccount>,
) -> Result<Json<Vec<Transaction>>, AppError> {
    list_transactions(state, current.account_id, TransactionKind::Expense).await
}

async fn delete_expense(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentAccount>,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, AppError> {
    delete_transaction(state, current.account_id, TransactionKind::Expense, id).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_request_deserialize() {
        let json = r#"{
            "name": "Alice",
            "email": "alice@x.com",
            "password": "secret1"
        }"#;

        let request: RegisterRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.name, "Alice");
        assert_eq!(request.email, "alice@x.com");
    }

    #[test]
    fn test_change_password_request_uses_camel_case() {
        let json = r#"{
            "currentPassword": "secret1",
            "newPassword": "secret2"
        }"#;

        let request: ChangePasswordRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.current_password, "secret1");
        assert_eq!(request.new_password, "secret2");
    }

    #[test]
    fn test_delete_account_request_password_optional() {
        let request: DeleteAccountRequest = serde_json::from_str("{}").unwrap();
        assert!(request.password.is_none());

        let request: DeleteAccountRequest =
            serde_json::from_str(r#"{"password": "secret1"}"#).unwrap();
        assert_eq!(request.password.as_deref(), Some("secret1"));
    }

    #[test]
    fn test_google_auth_request_deserialize() {
        let request: GoogleAuthRequest =
            serde_json::from_str(r#"{"token": "eyJhbGciOi..."}"#).unwrap();
        assert_eq!(request.token, "eyJhbGciOi...");
    }
}
