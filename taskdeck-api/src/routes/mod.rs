/// API route handlers
///
/// - `health`: liveness probe
/// - `users`: signup, login, session management, profile, avatar
/// - `tasks`: per-user task CRUD with filtering and pagination

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::ApiError;

pub mod health;
pub mod tasks;
pub mod users;

/// Deserializes a PATCH/POST body against an explicit field whitelist
///
/// Any field outside `allowed` rejects the whole request with 400 before a
/// single field is applied — updates are all-or-nothing. Malformed bodies
/// (wrong types, missing required fields, not an object) are 400 as well.
pub(crate) fn parse_body<T: DeserializeOwned>(body: Value, allowed: &[&str]) -> Result<T, ApiError> {
    let Value::Object(ref fields) = body else {
        return Err(ApiError::BadRequest("Expected a JSON object".to_string()));
    };

    if let Some(unknown) = fields.keys().find(|k| !allowed.contains(&k.as_str())) {
        return Err(ApiError::BadRequest(format!("Invalid update: {}", unknown)));
    }

    serde_json::from_value(body)
        .map_err(|e| ApiError::BadRequest(format!("Invalid request body: {}", e)))
}
