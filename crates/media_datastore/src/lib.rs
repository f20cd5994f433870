//! # DataStore Module
//!
//! This module provides functionality for interacting with a SQLite database
//! to keep a ledger of videos that have already been archived.
//!
//! The module uses sqlx for database operations and provides an abstraction
//! layer so the download pipeline stays independent of the storage backend.

mod datastore;
mod domain;

pub use datastore::sqlite::SqliteDataStore;
pub use datastore::{BulkInsertResult, DataStore, FailedInsert, InsertFailReason};
pub use domain::Video;
