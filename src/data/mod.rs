//! Data persistence layer for Packline
//!
//! This module provides the SQLite-backed key-value store every other
//! component persists through.

mod database;
mod kv;
mod migrations;

pub use database::{Database, DatabaseError};
pub use kv::{KvStore, StoreError};
