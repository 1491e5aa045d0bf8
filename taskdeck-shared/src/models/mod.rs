/// Database models for Taskdeck
///
/// # Models
///
/// - `user`: accounts, credential material, the live session-token set, and
///   the avatar blob
/// - `task`: to-do items owned by exactly one user

pub mod task;
pub mod user;
