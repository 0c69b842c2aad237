//! Self-healing JSON file store.
//!
//! Two small documents live here: the last-notified video id and the
//! unsubscribed-user list. Reads recover from a missing or corrupt file
//! by writing the fallback back to disk, so the file always exists after
//! first access. Single process, single writer; no atomicity guarantee.

use std::{fs, path::Path};

use serde::{de::DeserializeOwned, Serialize};

use crate::Result;

/// Read and parse `path`; on a missing or unparsable file, persist
/// `fallback` to `path` and return it.
pub fn read_json<T>(path: &Path, fallback: T) -> Result<T>
where
    T: Serialize + DeserializeOwned,
{
    let Ok(raw) = fs::read_to_string(path) else {
        write_json(path, &fallback)?;
        return Ok(fallback);
    };

    match serde_json::from_str(&raw) {
        Ok(value) => Ok(value),
        Err(_) => {
            write_json(path, &fallback)?;
            Ok(fallback)
        }
    }
}

/// Serialize `value` as pretty JSON, fully replacing prior contents.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let raw = serde_json::to_string_pretty(value)?;
    fs::write(path, raw)?;
    Ok(())
}
