use thiserror::Error;

/// Why a warden-dns configuration could not be used.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot read warden-dns config '{path}': {reason}")]
    FileRead { path: String, reason: String },

    #[error("Malformed warden-dns config: {0}")]
    Parse(String),

    #[error("Invalid warden-dns config: {0}")]
    Validation(String),
}
