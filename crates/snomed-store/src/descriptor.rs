//! The store's on-disk descriptor file.
//!
//! A fresh store directory is created with `0771` permissions and stamped
//! with a `descriptor.json` recording the store format version. Opening an
//! existing directory checks that version against this build's, so a binary
//! built against an incompatible on-disk layout fails fast instead of
//! silently misreading column families.

use crate::error::{StoreError, StoreResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// The store format version written by this build.
pub const STORE_VERSION: &str = "0.1";

const DESCRIPTOR_FILE: &str = "descriptor.json";

#[derive(Debug, Serialize, Deserialize)]
struct Descriptor {
    version: String,
}

/// Ensures `path` exists as a directory with restrictive permissions, and
/// either writes a fresh descriptor or validates the existing one.
pub fn ensure_descriptor(path: &Path) -> StoreResult<()> {
    if !path.exists() {
        fs::create_dir_all(path)?;
        set_restrictive_permissions(path)?;
    }

    let descriptor_path = path.join(DESCRIPTOR_FILE);
    if descriptor_path.exists() {
        let raw = fs::read_to_string(&descriptor_path)?;
        let descriptor: Descriptor = serde_json::from_str(&raw)?;
        if descriptor.version != STORE_VERSION {
            return Err(StoreError::VersionMismatch {
                found: descriptor.version,
                expected: STORE_VERSION.to_string(),
            });
        }
    } else {
        let descriptor = Descriptor {
            version: STORE_VERSION.to_string(),
        };
        fs::write(&descriptor_path, serde_json::to_string_pretty(&descriptor)?)?;
    }

    Ok(())
}

#[cfg(unix)]
fn set_restrictive_permissions(path: &Path) -> StoreResult<()> {
    use std::os::unix::fs::PermissionsExt;
    let mut perms = fs::metadata(path)?.permissions();
    perms.set_mode(0o771);
    fs::set_permissions(path, perms)?;
    Ok(())
}

#[cfg(not(unix))]
fn set_restrictive_permissions(_path: &Path) -> StoreResult<()> {
    Ok(())
}
