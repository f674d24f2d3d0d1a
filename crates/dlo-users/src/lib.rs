//! `dlo-users` — account storage for the people who schedule memories.
//!
//! Owns the `users` table and the connection-opening convention every
//! other store relies on (WAL journal, foreign keys enforced so that
//! deleting a user cascades to everything it owns).

pub mod account;
pub mod db;
pub mod error;
pub mod password;
pub mod types;

pub use error::{Result, UserError};
pub use types::User;
