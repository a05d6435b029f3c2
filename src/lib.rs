// Short Key Issuing Service
// Main library module

pub mod api;
pub mod config;
pub mod database;
pub mod errors;
pub mod generator;
pub mod models;
pub mod store;

// Re-export commonly used items
pub use config::{Config, StoreKind};
pub use database::SqliteKeyStore;
pub use errors::{KeyGenError, StoreError};
pub use generator::KeyGenerator;
pub use models::{Key, KeyStatus, ALPHABET, COMBINATION_SPACE, KEY_LEN};
pub use store::{KeyStore, MemoryKeyStore};
