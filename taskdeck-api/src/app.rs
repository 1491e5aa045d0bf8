/// Application state, router, and the auth gate
///
/// # Router layout
///
/// ```text
/// /
/// ├── GET  /health                 # liveness + db probe (public)
/// ├── POST /users                  # signup (public)
/// ├── POST /users/login            # login (public)
/// ├── GET  /users/:id/avatar       # avatar bytes (public)
/// └── (bearer-token gated)
///     ├── POST   /users/logout
///     ├── POST   /users/logoutAll
///     ├── GET    /users/me
///     ├── PATCH  /users/me
///     ├── DELETE /users/me
///     ├── POST   /users/me/avatar
///     ├── DELETE /users/me/avatar
///     ├── POST   /tasks      GET /tasks
///     └── GET/PATCH/DELETE   /tasks/:id
/// ```
///
/// The auth gate is a middleware layer on the protected sub-router: it
/// extracts the bearer token, resolves the session, and stashes the acting
/// user *plus the exact raw token string* in request extensions — logout
/// needs the precise string to revoke that one session and no other.

use axum::{
    extract::{DefaultBodyLimit, Request, State},
    http::header,
    middleware::Next,
    response::Response,
    routing::{get, post},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use taskdeck_shared::auth::sessions;
use taskdeck_shared::models::user::User;

use crate::{config::Config, email::Mailer, error::ApiError};

/// Request body ceiling; leaves room for multipart framing around a 1 MB
/// avatar upload.
const BODY_LIMIT_BYTES: usize = 2 * 1024 * 1024;

/// Shared application state, cloned per request via the `State` extractor
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Immutable application configuration
    pub config: Arc<Config>,

    /// Outbound notification mailer
    pub mailer: Mailer,
}

impl AppState {
    /// Creates new application state
    pub fn new(db: PgPool, config: Config, mailer: Mailer) -> Self {
        Self {
            db,
            config: Arc::new(config),
            mailer,
        }
    }

    /// Token-signing secret
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }
}

/// The authenticated caller, attached to request extensions by the auth gate
#[derive(Clone)]
pub struct AuthSession {
    /// The resolved user record
    pub user: User,

    /// The exact bearer token string this request authenticated with
    pub token: String,
}

/// Builds the complete router with all routes and middleware
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    let public = Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/users", post(routes::users::signup))
        .route("/users/login", post(routes::users::login))
        .route("/users/:id/avatar", get(routes::users::get_avatar));

    let protected = Router::new()
        .route("/users/logout", post(routes::users::logout))
        .route("/users/logoutAll", post(routes::users::logout_all))
        .route(
            "/users/me",
            get(routes::users::me)
                .patch(routes::users::update_me)
                .delete(routes::users::delete_me),
        )
        .route(
            "/users/me/avatar",
            post(routes::users::upload_avatar).delete(routes::users::delete_avatar),
        )
        .route(
            "/tasks",
            post(routes::tasks::create_task).get(routes::tasks::list_tasks),
        )
        .route(
            "/tasks/:id",
            get(routes::tasks::get_task)
                .patch(routes::tasks::update_task)
                .delete(routes::tasks::delete_task),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            auth_gate,
        ));

    Router::new()
        .merge(public)
        .merge(protected)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(CorsLayer::permissive())
        .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES))
        .with_state(state)
}

/// Bearer-token auth gate
///
/// Every failure — absent header, malformed header, bad signature, expired
/// token, revoked token, deleted user, store error — produces the same 401.
/// The gate never tells the caller which case occurred.
async fn auth_gate(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(ApiError::authentication)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(ApiError::authentication)?
        .to_string();

    let user = sessions::authenticate(&state.db, state.jwt_secret(), &token)
        .await
        .map_err(|_| ApiError::authentication())?;

    req.extensions_mut().insert(AuthSession { user, token });

    Ok(next.run(req).await)
}
