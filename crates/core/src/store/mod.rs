//! SQLite storage handle.
//!
//! A single connection configured for read-heavy concurrent access, with
//! versioned schema migrations applied on open.

pub mod connection;
pub mod migrations;
pub mod row;

pub use connection::Store;
pub use row::Row;
