//! Basic type definitions for the chat client
//!
//! Provides newtype wrappers for type safety:
//! - `Username`: validated display name (non-empty, at most 20 characters)
//! - `RoomName`: validated room name (non-empty, at most 30 characters)

use crate::error::AppError;

/// Maximum username length accepted at join time.
pub const MAX_USERNAME_LEN: usize = 20;

/// Maximum room name length accepted at join or switch time.
pub const MAX_ROOM_NAME_LEN: usize = 30;

/// Validated display name (newtype pattern)
///
/// Construction enforces the join-time rules; once built, the name is
/// always usable on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Username(String);

impl Username {
    /// Validate and wrap a raw username
    ///
    /// The input is trimmed first. Fails with `InvalidInput` when empty or
    /// longer than [`MAX_USERNAME_LEN`] characters.
    pub fn new(raw: &str) -> Result<Self, AppError> {
        let name = raw.trim();
        if name.is_empty() {
            return Err(AppError::InvalidInput("username must not be empty".into()));
        }
        if name.chars().count() > MAX_USERNAME_LEN {
            return Err(AppError::InvalidInput(format!(
                "username must be at most {} characters",
                MAX_USERNAME_LEN
            )));
        }
        Ok(Self(name.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Username {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Validated room name (newtype pattern)
///
/// Room names are free-form user input; switching rooms always goes through
/// this validation, same as the initial join.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RoomName(String);

impl RoomName {
    /// Validate and wrap a raw room name
    ///
    /// The input is trimmed first. Fails with `InvalidInput` when empty or
    /// longer than [`MAX_ROOM_NAME_LEN`] characters.
    pub fn new(raw: &str) -> Result<Self, AppError> {
        let name = raw.trim();
        if name.is_empty() {
            return Err(AppError::InvalidInput("room name must not be empty".into()));
        }
        if name.chars().count() > MAX_ROOM_NAME_LEN {
            return Err(AppError::InvalidInput(format!(
                "room name must be at most {} characters",
                MAX_ROOM_NAME_LEN
            )));
        }
        Ok(Self(name.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RoomName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
