/// User endpoints: signup, login, sessions, profile, avatar
///
/// # Endpoints
///
/// - `POST /users` — signup, returns the profile plus a first session token
/// - `POST /users/login` — login, returns the profile plus a fresh token
/// - `POST /users/logout` — revokes exactly the presenting session
/// - `POST /users/logoutAll` — revokes every session for the caller
/// - `GET /users/me` — the caller's profile
/// - `PATCH /users/me` — partial profile update (whitelisted fields only)
/// - `DELETE /users/me` — account deletion, cascades to the caller's tasks
/// - `POST /users/me/avatar` / `DELETE /users/me/avatar`
/// - `GET /users/:id/avatar` — public, raw PNG bytes

use axum::{
    extract::{Multipart, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;
use validator::Validate;

use taskdeck_shared::auth::{password, sessions};
use taskdeck_shared::models::user::{CreateUser, UpdateUser, User};

use crate::{
    app::{AppState, AuthSession},
    avatar,
    error::{ApiError, ApiResult},
    routes::parse_body,
};

/// Fields a client may send on signup
const SIGNUP_FIELDS: &[&str] = &["name", "email", "password", "age"];

/// Fields a client may PATCH on the profile
const UPDATE_FIELDS: &[&str] = &["name", "email", "password", "age"];

/// The one message every failed login gets, valid or unknown email alike
const LOGIN_FAILED: &str = "Unable to login";

/// Signup request
#[derive(Debug, Deserialize, Validate)]
pub struct SignupRequest {
    /// Display name
    #[validate(length(min = 1, message = "Name must not be empty"))]
    pub name: String,

    /// Email address
    #[validate(email(message = "Email is not valid"))]
    pub email: String,

    /// Plaintext password; content rules checked separately
    pub password: String,

    /// Age in years
    #[validate(range(min = 0, message = "Age must be a non-negative number"))]
    pub age: Option<i32>,
}

impl SignupRequest {
    /// Trims the name, trims and lowercases the email
    fn normalize(mut self) -> Self {
        self.name = self.name.trim().to_string();
        self.email = self.email.trim().to_lowercase();
        self
    }
}

/// Login request
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// Email address
    pub email: String,

    /// Plaintext password
    pub password: String,
}

/// Profile update request; only whitelisted fields, all optional
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, message = "Name must not be empty"))]
    pub name: Option<String>,

    #[validate(email(message = "Email is not valid"))]
    pub email: Option<String>,

    pub password: Option<String>,

    #[validate(range(min = 0, message = "Age must be a non-negative number"))]
    pub age: Option<i32>,
}

impl UpdateProfileRequest {
    fn normalize(mut self) -> Self {
        self.name = self.name.map(|n| n.trim().to_string());
        self.email = self.email.map(|e| e.trim().to_lowercase());
        self
    }
}

/// Profile plus session token, returned by signup and login
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    /// Public profile (password hash, token set, and avatar omitted)
    pub user: User,

    /// The session token just issued
    pub token: String,
}

/// Small acknowledgment body
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// `POST /users` — create an account
///
/// Issues the first session token as part of signup; the token returned is
/// already a member of the stored live-token set. Responds 201 with
/// `{user, token}`; validation failures and duplicate emails are 400.
pub async fn signup(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> ApiResult<(StatusCode, Json<AuthResponse>)> {
    let req: SignupRequest = parse_body(body, SIGNUP_FIELDS)?;
    let req = req.normalize();

    req.validate().map_err(ApiError::from_validation)?;
    password::validate_password(&req.password)
        .map_err(|msg| ApiError::invalid_field("password", msg))?;

    let user = User::create(
        &state.db,
        CreateUser {
            name: req.name,
            email: req.email,
            password: req.password,
            age: req.age,
        },
    )
    .await?;

    state.mailer.send_welcome(&user.email, &user.name);

    let token = sessions::issue(&state.db, state.jwt_secret(), user.id).await?;

    tracing::info!(user_id = %user.id, "User signed up");
    Ok((StatusCode::CREATED, Json(AuthResponse { user, token })))
}

/// `POST /users/login` — authenticate with email + password
///
/// Unknown email and wrong password produce the same 400; the response
/// never says which half was wrong.
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    let email = req.email.trim().to_lowercase();

    let user = User::find_by_email(&state.db, &email)
        .await?
        .ok_or_else(|| ApiError::BadRequest(LOGIN_FAILED.to_string()))?;

    let valid = password::verify_password(&req.password, &user.password_hash)?;
    if !valid {
        return Err(ApiError::BadRequest(LOGIN_FAILED.to_string()));
    }

    let token = sessions::issue(&state.db, state.jwt_secret(), user.id).await?;

    tracing::info!(user_id = %user.id, "User logged in");
    Ok(Json(AuthResponse { user, token }))
}

/// `POST /users/logout` — revoke the presenting session only
///
/// Uses the exact raw token the auth gate captured, so other sessions for
/// the same user stay live.
pub async fn logout(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
) -> ApiResult<Json<MessageResponse>> {
    sessions::revoke(&state.db, session.user.id, &session.token).await?;

    Ok(Json(MessageResponse {
        message: "Logged out successfully.".to_string(),
    }))
}

/// `POST /users/logoutAll` — revoke every session for the caller
pub async fn logout_all(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
) -> ApiResult<Json<MessageResponse>> {
    sessions::revoke_all(&state.db, session.user.id).await?;

    Ok(Json(MessageResponse {
        message: "Logged out of all sessions.".to_string(),
    }))
}

/// `GET /users/me` — the caller's public profile
pub async fn me(Extension(session): Extension<AuthSession>) -> Json<User> {
    Json(session.user)
}

/// `PATCH /users/me` — partial profile update
///
/// Any field outside {name, email, password, age} rejects the request with
/// 400 and nothing is applied. A supplied password is re-validated and
/// hashed inside the store's update.
pub async fn update_me(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
    Json(body): Json<Value>,
) -> ApiResult<Json<User>> {
    let req: UpdateProfileRequest = parse_body(body, UPDATE_FIELDS)?;
    let req = req.normalize();

    req.validate().map_err(ApiError::from_validation)?;
    if let Some(ref plaintext) = req.password {
        password::validate_password(plaintext)
            .map_err(|msg| ApiError::invalid_field("password", msg))?;
    }

    let user = User::update(
        &state.db,
        session.user.id,
        UpdateUser {
            name: req.name,
            email: req.email,
            password: req.password,
            age: req.age,
        },
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(user))
}

/// `DELETE /users/me` — delete the account and everything it owns
///
/// The task cascade and the user removal commit together; the cancellation
/// email goes out only after the commit. Responds with the removed profile.
pub async fn delete_me(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
) -> ApiResult<Json<User>> {
    let user = User::delete(&state.db, session.user.id)
        .await?
        .ok_or_else(|| ApiError::Internal("Authenticated user row missing".to_string()))?;

    state.mailer.send_cancellation(&user.email, &user.name);

    Ok(Json(user))
}

/// `POST /users/me/avatar` — multipart upload, field name "avatar"
///
/// The upload is validated and re-encoded to 250x250 PNG before any write;
/// oversized or non-image payloads never reach the store.
pub async fn upload_avatar(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
    mut multipart: Multipart,
) -> ApiResult<StatusCode> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Invalid multipart body: {}", e)))?
    {
        if field.name() != Some("avatar") {
            continue;
        }

        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(format!("Unreadable avatar upload: {}", e)))?;

        let png = avatar::process_upload(&data).map_err(|e| ApiError::BadRequest(e.to_string()))?;

        User::set_avatar(&state.db, session.user.id, &png).await?;
        return Ok(StatusCode::OK);
    }

    Err(ApiError::BadRequest(
        "Missing \"avatar\" upload field".to_string(),
    ))
}

/// `DELETE /users/me/avatar` — clear the stored avatar
pub async fn delete_avatar(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
) -> ApiResult<StatusCode> {
    User::clear_avatar(&state.db, session.user.id).await?;
    Ok(StatusCode::OK)
}

/// `GET /users/:id/avatar` — public avatar fetch, raw PNG bytes
///
/// A malformed id, an unknown user, and a user without an avatar all
/// answer 404.
pub async fn get_avatar(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    let not_found = || ApiError::NotFound("Avatar not found".to_string());

    let id = Uuid::parse_str(&id).map_err(|_| not_found())?;

    let avatar = User::find_avatar(&state.db, id)
        .await
        .map_err(|_| not_found())?
        .ok_or_else(not_found)?;

    Ok(([(header::CONTENT_TYPE, "image/png")], avatar).into_response())
}
