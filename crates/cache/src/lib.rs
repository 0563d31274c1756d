//! SQLite catalog of ingested photos.
//!
//! Unlike a cache, the catalog *is* the record of what was ingested: it maps
//! every original path to the archive copy made from it, the metadata block
//! that dated it and the hash of the copied bytes.
//!
//! # Architecture
//! A single `photos` table keyed by `original_path`, with a `UNIQUE` index on
//! `final_path` so that two originals can never claim the same archive copy.
//! The schema lives in embedded migrations that run on every connect.

mod db;
pub mod error;
mod models;
mod repo;

pub use crate::db::Database;
pub use crate::models::PhotoRecord;
pub use crate::repo::Repository;
