//! `dlo-memories` — persistence for scheduled memories and plain messages.
//!
//! # Memory lifecycle
//!
//! | From        | To       | Written by                        |
//! |-------------|----------|-----------------------------------|
//! | —           | scheduled| [`MemoryStore::create`]           |
//! | scheduled   | sent     | delivery cycle or manual send     |
//! | scheduled   | failed   | delivery cycle or manual send     |
//! | sent/failed | sent/failed | manual send only               |
//!
//! Every transition goes through [`MemoryStore::record_outcome`], a
//! compare-and-set on the status the caller last observed.
//!
//! Messages are a separate, manually managed entity with no delivery path.

pub mod db;
pub mod error;
pub mod memory;
pub mod message;
pub mod types;

pub use db::{lock, share, SharedConnection};
pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use message::MessageStore;
pub use types::{DeliveryOutcome, Memory, MemoryStatus, Message, MessageDraft, NewMemory};
