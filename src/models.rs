use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};

use crate::errors::KeyGenError;

/// Symbols a key is built from: 26 lowercase, 26 uppercase and 10 digits.
pub const ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ1234567890";

pub const KEY_LEN: usize = 4;

/// Number of distinct keys, (26+26+10)^4.
pub const COMBINATION_SPACE: u64 = 14_776_336;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyStatus {
    NotIssued,
    Issued,
    Submitted,
}

impl KeyStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            KeyStatus::NotIssued => "not issued",
            KeyStatus::Issued => "issued",
            KeyStatus::Submitted => "submitted",
        }
    }
}

impl fmt::Display for KeyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for KeyStatus {
    type Err = String;

    // Only the states a stored record can be in.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "issued" => Ok(KeyStatus::Issued),
            "submitted" => Ok(KeyStatus::Submitted),
            other => Err(format!("unknown key status {:?}", other)),
        }
    }
}

/// One allocated key and where it is in its lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Key {
    value: String,
    status: KeyStatus,
    issued_at: DateTime<Utc>,
    submitted_at: Option<DateTime<Utc>>,
}

impl Key {
    /// Creates a freshly issued key.
    pub fn new(value: impl Into<String>) -> Result<Self, KeyGenError> {
        let value = value.into();
        if value.len() != KEY_LEN {
            return Err(KeyGenError::InvalidKeyLength);
        }

        Ok(Self {
            value,
            status: KeyStatus::Issued,
            issued_at: Utc::now(),
            submitted_at: None,
        })
    }

    /// Rebuilds a record read back from a backend.
    pub(crate) fn restore(
        value: String,
        status: KeyStatus,
        issued_at: DateTime<Utc>,
        submitted_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            value,
            status,
            issued_at,
            submitted_at,
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn status(&self) -> KeyStatus {
        self.status
    }

    pub fn issued_at(&self) -> DateTime<Utc> {
        self.issued_at
    }

    pub fn submitted_at(&self) -> Option<DateTime<Utc>> {
        self.submitted_at
    }

    /// Moves an issued key to `Submitted`. Only the generator drives this.
    pub(crate) fn submit(&mut self) -> Result<(), KeyGenError> {
        match self.status {
            KeyStatus::Issued => {
                self.status = KeyStatus::Submitted;
                self.submitted_at = Some(Utc::now());
                Ok(())
            }
            KeyStatus::Submitted => Err(KeyGenError::AlreadySubmitted),
            KeyStatus::NotIssued => Err(KeyGenError::NotIssued),
        }
    }
}

/// Maps an index in `0..COMBINATION_SPACE` to its key, most significant digit first.
pub(crate) fn key_at_index(index: u64) -> String {
    let base = ALPHABET.len() as u64;
    let mut digits = [0u8; KEY_LEN];
    let mut rest = index % COMBINATION_SPACE;
    for slot in digits.iter_mut().rev() {
        *slot = ALPHABET[(rest % base) as usize];
        rest /= base;
    }
    digits.iter().map(|&b| b as char).collect()
}
