//! Filesystem layer for the shoebox archive.
//!
//! - [`hash`]: the content hasher, fused with the copy into the archive.
//! - [`fs`]: classified directory listings, moves, deletes and list exports.
//! - [`strip_components`]: where a moved original lands under its new
//!   directory.

pub mod error;
pub mod fs;
pub mod hash;
mod path;

pub use crate::hash::{ContentHash, Copied, HASH_LENGTH, copy_hashed};
pub use crate::path::strip_components;
