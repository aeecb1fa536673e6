use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PassrotError {
    #[error("Catalog not initialized. Run `passrot init` first.")]
    NotInitialized,

    #[error("Catalog already initialized at {0}")]
    AlreadyInitialized(String),

    #[error("Item not found: {0}")]
    ItemNotFound(u64),

    #[error("Authentication failed: {0}")]
    AuthFailed(String),

    #[error("Encryption error: {0}")]
    Encryption(String),

    #[error("Decryption error: {0}")]
    Decryption(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Audit chain integrity violation at entry {0}")]
    AuditChainBroken(usize),

    #[error("Invalid keyfile: {0}")]
    InvalidKeyfile(String),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Item query failed: {0}")]
    Query(String),

    #[error("Failed to persist item {id}: {reason}")]
    Persistence { id: u64, reason: String },

    #[error("Notification failed: {0}")]
    Notify(String),

    #[error("Schedule error: {0}")]
    Schedule(String),

    #[error("Could not acquire rotation lock: {0}")]
    Lock(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl PassrotError {
    /// Return a typed exit code for this error category.
    pub fn exit_code(&self) -> i32 {
        match self {
            PassrotError::NotInitialized => 7,
            PassrotError::AlreadyInitialized(_) => 5,
            PassrotError::ItemNotFound(_) => 3,
            PassrotError::AuthFailed(_) => 2,
            PassrotError::Encryption(_) => 1,
            PassrotError::Decryption(_) => 2,
            PassrotError::Serialization(_) => 1,
            PassrotError::AuditChainBroken(_) => 1,
            PassrotError::InvalidKeyfile(_) => 2,
            PassrotError::InvalidConfig(_) => 8,
            PassrotError::Query(_) => 1,
            PassrotError::Persistence { .. } => 1,
            PassrotError::Notify(_) => 1,
            PassrotError::Schedule(_) => 1,
            PassrotError::Lock(_) => 9,
            PassrotError::Io(_) => 1,
            PassrotError::Other(_) => 1,
        }
    }

    /// Return a string error code identifier.
    pub fn error_code(&self) -> &'static str {
        match self {
            PassrotError::NotInitialized => "not_initialized",
            PassrotError::AlreadyInitialized(_) => "already_exists",
            PassrotError::ItemNotFound(_) => "not_found",
            PassrotError::AuthFailed(_) => "auth_failed",
            PassrotError::Encryption(_) => "encryption_error",
            PassrotError::Decryption(_) => "decryption_error",
            PassrotError::Serialization(_) => "serialization_error",
            PassrotError::AuditChainBroken(_) => "audit_chain_broken",
            PassrotError::InvalidKeyfile(_) => "invalid_keyfile",
            PassrotError::InvalidConfig(_) => "invalid_config",
            PassrotError::Query(_) => "query_error",
            PassrotError::Persistence { .. } => "persistence_error",
            PassrotError::Notify(_) => "notify_error",
            PassrotError::Schedule(_) => "schedule_error",
            PassrotError::Lock(_) => "lock_error",
            PassrotError::Io(_) => "io_error",
            PassrotError::Other(_) => "error",
        }
    }
}

/// JSON error response for --json mode.
#[derive(Serialize)]
pub struct JsonError {
    pub error: JsonErrorDetail,
}

#[derive(Serialize)]
pub struct JsonErrorDetail {
    pub code: String,
    pub message: String,
    pub exit_code: i32,
}

impl JsonError {
    pub fn from_error(e: &PassrotError) -> Self {
        Self {
            error: JsonErrorDetail {
                code: e.error_code().to_string(),
                message: e.to_string(),
                exit_code: e.exit_code(),
            },
        }
    }
}

pub type Result<T> = std::result::Result<T, PassrotError>;
