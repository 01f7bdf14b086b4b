//! Player-name validation rules.
//!
//! Names double as persistence keys, so the charset is kept tight, and the
//! guest prefix is reserved for auto-assigned anonymous identities.

/// Prefix carried by every auto-assigned anonymous session identity.
pub const GUEST_PREFIX: &str = "Guest_";

const MIN_NAME_LEN: usize = 2;
const MAX_NAME_LEN: usize = 24;

/// Name validation errors with player-visible messages.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum NameError {
    #[error("Name is too short (minimum {MIN_NAME_LEN} characters)")]
    TooShort,

    #[error("Name is too long (maximum {MAX_NAME_LEN} characters)")]
    TooLong,

    #[error("Name may only contain letters, digits, '_' and '-'")]
    InvalidCharacters,

    #[error("'{GUEST_PREFIX}' is reserved for anonymous visitors")]
    ReservedGuestPrefix,
}

/// Returns true if the name carries the reserved guest prefix anywhere in it.
pub fn is_guest_name(name: &str) -> bool {
    name.to_ascii_lowercase()
        .contains(&GUEST_PREFIX.to_ascii_lowercase())
}

/// Validate a registration name. Returns the name unchanged on success so
/// callers can chain it into record creation.
pub fn validate_player_name(name: &str) -> Result<&str, NameError> {
    if name.chars().count() < MIN_NAME_LEN {
        return Err(NameError::TooShort);
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(NameError::TooLong);
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(NameError::InvalidCharacters);
    }
    if is_guest_name(name) {
        return Err(NameError::ReservedGuestPrefix);
    }
    Ok(name)
}
