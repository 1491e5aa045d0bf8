/// Authentication primitives for Taskdeck
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and the password content rules
/// - [`token`]: signed session-token creation and signature validation
/// - [`sessions`]: the session lifecycle — issuance, verification against the
///   live-token set, and single/multi-session revocation
///
/// A session token is only a credential while it is a member of its user's
/// live-token set; [`token`] handles the stateless signature half and
/// [`sessions`] the stateful half.

pub mod password;
pub mod sessions;
pub mod token;
