//! # intentmap-store
//!
//! Durable per-origin session storage.
//!
//! The durable contract is deliberately small: one key per origin, holding
//! `{"id": string, "lastActivity": number}` as JSON text. [`SessionStorage`]
//! abstracts the key-value layer; [`SqliteStorage`] persists it to disk and
//! [`MemoryStorage`] backs tests and filesystem-less hosts. [`SessionStore`]
//! owns the session lifecycle on top: lazy minting, 30-minute inactivity
//! expiry, and touch-on-activity.

#![deny(unsafe_code)]

pub mod error;
pub mod memory;
pub mod session;
pub mod sqlite;
pub mod storage;

pub use error::StorageError;
pub use memory::MemoryStorage;
pub use session::{SessionStore, SESSION_TTL};
pub use sqlite::{Database, SqliteStorage};
pub use storage::SessionStorage;
