use thiserror::Error;

/// Failures raised by a `KeyStore` backend.
///
/// `NotFound` and `AlreadyExists` are part of the normal store contract and are
/// translated by the generator. Everything else is an internal fault.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("key does not exist")]
    NotFound,

    #[error("key already exists")]
    AlreadyExists,

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("store lock poisoned")]
    Poisoned,

    #[error("corrupt key record: {0}")]
    Corrupt(String),
}

#[derive(Error, Debug)]
pub enum KeyGenError {
    #[error("key must be 4 symbols")]
    InvalidKeyLength,

    #[error("key has not been issued")]
    NotIssued,

    #[error("key already submitted")]
    AlreadySubmitted,

    #[error("all combinations of keys were issued")]
    CapacityExhausted,

    #[error("Internal server error")]
    Internal(#[from] StoreError),
}

impl KeyGenError {
    /// True for errors caused by the caller's input rather than the service.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            KeyGenError::InvalidKeyLength | KeyGenError::NotIssued | KeyGenError::AlreadySubmitted
        )
    }
}
