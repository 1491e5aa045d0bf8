/// Password hashing using Argon2id
///
/// Passwords are stored only as salted Argon2id hashes in PHC string format.
/// Hashing happens exactly once, at the point where a plaintext password
/// enters a persistence operation; a stored hash is never re-hashed.
///
/// # Example
///
/// ```
/// use taskdeck_shared::auth::password::{hash_password, verify_password};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("Yehuda12")?;
/// assert!(verify_password("Yehuda12", &hash)?);
/// assert!(!verify_password("wrong", &hash)?);
/// # Ok(())
/// # }
/// ```

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

/// Minimum plaintext password length
pub const MIN_PASSWORD_LEN: usize = 7;

/// Error type for password hashing operations
#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    /// Failed to hash a password
    #[error("Failed to hash password: {0}")]
    HashError(String),

    /// Failed to verify a password
    #[error("Failed to verify password: {0}")]
    VerifyError(String),

    /// Stored hash is not a valid PHC string
    #[error("Invalid password hash format: {0}")]
    InvalidHash(String),
}

/// Hashes a plaintext password with Argon2id and a fresh random salt
///
/// Uses the argon2 crate's default parameters (Argon2id v19). The salt is
/// generated from the OS RNG, so hashing the same password twice yields
/// different strings.
///
/// # Errors
///
/// Returns `PasswordError::HashError` if hashing fails
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);

    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| PasswordError::HashError(format!("Hash generation failed: {}", e)))?;

    Ok(hash.to_string())
}

/// Verifies a plaintext password against a stored hash
///
/// Comparison is constant-time. Returns `Ok(false)` for a wrong password and
/// an error only when the stored hash itself is unusable.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, PasswordError> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| PasswordError::InvalidHash(format!("Failed to parse hash: {}", e)))?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
        Ok(_) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(PasswordError::VerifyError(format!(
            "Verification failed: {}",
            e
        ))),
    }
}

/// Validates the password content rules
///
/// A password must be at least [`MIN_PASSWORD_LEN`] characters and must not
/// contain the word "password" in any casing.
///
/// # Example
///
/// ```
/// use taskdeck_shared::auth::password::validate_password;
///
/// assert!(validate_password("Yehuda12").is_ok());
/// assert!(validate_password("short").is_err());
/// assert!(validate_password("myPassword1").is_err());
/// ```
pub fn validate_password(password: &str) -> Result<(), String> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(format!(
            "Password must be at least {} characters long",
            MIN_PASSWORD_LEN
        ));
    }

    if password.to_lowercase().contains("password") {
        return Err("Password must not contain the word \"password\"".to_string());
    }

    Ok(())
}
