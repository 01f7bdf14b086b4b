use thiserror::Error;

/// Errors that can arise inside the game engine and its persistence layer.
#[derive(Debug, Error)]
pub enum GameError {
    /// Wrapper around sled's error type.
    #[error("sled error: {0}")]
    Sled(#[from] sled::Error),

    /// Wrapper around bincode serialization and deserialization errors.
    #[error("serialization error: {0}")]
    Bincode(#[from] bincode::Error),

    /// Wrapper around IO errors (data directory creation, etc.).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Returned when fetching a record that is not present.
    #[error("record not found: {0}")]
    NotFound(String),

    /// Returned when deserializing a record with an unexpected schema version.
    #[error("schema mismatch for {entity}: expected {expected}, got {found}")]
    SchemaMismatch {
        entity: &'static str,
        expected: u8,
        found: u8,
    },

    /// Referenced room id does not exist in the world graph.
    #[error("unknown room: {0}")]
    UnknownRoom(String),

    /// Referenced session id is not registered.
    #[error("unknown session: {0}")]
    UnknownSession(String),

    /// Password hashing or verification failure.
    #[error("password hash error: {0}")]
    PasswordHash(String),

    /// Internal error (invariant breakage, join failures).
    #[error("internal error: {0}")]
    Internal(String),
}
