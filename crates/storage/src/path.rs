//! Component stripping for files moved out of their original source tree.

use std::path::{Component, Path, PathBuf};

use crate::error::{ErrorKind, Result};

/// Drops the first `count` named components of `path`, returning the
/// remainder as a relative path.
///
/// Root and prefix components don't count as names, so for
/// `/mnt/card/DCIM/IMG_0001.jpg` stripping two components leaves
/// `DCIM/IMG_0001.jpg`. Fails with [`ErrorKind::InvalidPath`] when nothing
/// would be left, or when a `..` in the remainder climbs out of it.
pub fn strip_components(path: impl AsRef<Path>, count: usize) -> Result<PathBuf> {
    let path = path.as_ref();
    let invalid = || ErrorKind::InvalidPath(path.to_path_buf());
    let mut remainder = Vec::new();
    let named = path.components().filter(|c| matches!(c, Component::Normal(_) | Component::ParentDir));
    for component in named.skip(count) {
        match component {
            Component::ParentDir if remainder.pop().is_none() => exn::bail!(invalid()),
            Component::ParentDir => {},
            other => remainder.push(other),
        }
    }
    if remainder.is_empty() {
        exn::bail!(invalid());
    }
    Ok(remainder.into_iter().collect())
}
