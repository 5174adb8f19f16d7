//! The on-disk state document.
//!
//! Loading is forgiving about shape and strict about syntax: a missing
//! file, a non-object top level or a missing `identities` map all read as
//! empty, but bytes that are not JSON at all are a storage error. Records
//! are repaired per identity on access, see [`StateDocument::records`].

use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::Path;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::Result;

use super::ids::IdGenerator;
use super::record::{truthy, Record};

/// Format version written to every document.
pub const DOCUMENT_VERSION: u32 = 1;

/// Shape written to disk.
#[derive(Serialize)]
struct DocumentFile<'a> {
    version: u32,
    identities: &'a Map<String, Value>,
}

/// An in-memory copy of the state document, valid for one operation.
#[derive(Debug, Default)]
pub struct StateDocument {
    identities: Map<String, Value>,
}

impl StateDocument {
    /// Load the document at `path`.
    ///
    /// # Errors
    ///
    /// Returns `TodoError::Storage` if the file exists but cannot be read or
    /// is not valid JSON.
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                log::debug!("no state document at {}, starting empty", path.display());
                return Ok(Self::default());
            }
            Err(e) => return Err(e.into()),
        };

        let identities = match serde_json::from_slice::<Value>(&bytes)? {
            Value::Object(mut top) => match top.remove("identities") {
                Some(Value::Object(identities)) => identities,
                _ => Map::new(),
            },
            _ => Map::new(),
        };
        Ok(Self { identities })
    }

    /// The repaired record list for `identity` and whether repair changed
    /// anything.
    ///
    /// Entries without a non-blank string title are dropped. Titles are
    /// trimmed, `completed` is coerced to a boolean and any missing, empty
    /// or duplicate id is replaced with a fresh one. Unknown keys are
    /// discarded.
    pub fn records(&self, identity: &str, ids: &dyn IdGenerator) -> (Vec<Record>, bool) {
        let Some(entry) = self.identities.get(identity) else {
            return (Vec::new(), false);
        };
        let Some(raw) = entry.get("records").and_then(Value::as_array) else {
            return (Vec::new(), true);
        };

        let mut seen = HashSet::with_capacity(raw.len());
        let mut records = Vec::with_capacity(raw.len());
        let mut changed = false;

        for stored in raw {
            let title = stored
                .get("title")
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|t| !t.is_empty());
            let Some(title) = title else {
                changed = true;
                continue;
            };

            let id = match stored.get("id").and_then(Value::as_str) {
                Some(id) if !id.is_empty() && !seen.contains(id) => id.to_string(),
                _ => fresh_id(ids, &seen, raw),
            };
            seen.insert(id.clone());

            let record = Record {
                id,
                title: title.to_string(),
                completed: stored.get("completed").is_some_and(truthy),
            };
            if !changed && serde_json::to_value(&record).ok().as_ref() != Some(stored) {
                changed = true;
            }
            records.push(record);
        }

        if changed {
            log::warn!(
                "repaired stored records for identity {identity}: kept {} of {}",
                records.len(),
                raw.len()
            );
        }
        (records, changed)
    }

    /// Replace the record list for `identity`.
    pub fn set_records(&mut self, identity: &str, records: &[Record]) -> Result<()> {
        let mut entry = Map::new();
        entry.insert("records".to_string(), serde_json::to_value(records)?);
        self.identities
            .insert(identity.to_string(), Value::Object(entry));
        Ok(())
    }

    /// Serialize the whole document and atomically replace `path` with it.
    ///
    /// # Errors
    ///
    /// Returns `TodoError::Storage` on any serialization or filesystem
    /// failure. The previous document is left intact in that case.
    pub fn persist(&self, path: &Path) -> Result<()> {
        let file = DocumentFile {
            version: DOCUMENT_VERSION,
            identities: &self.identities,
        };
        let json = serde_json::to_vec_pretty(&file)?;
        write_atomic(path, &json)?;
        log::debug!("persisted state document {} ({} bytes)", path.display(), json.len());
        Ok(())
    }
}

/// A generated id not used by any record seen so far nor stored in `raw`.
fn fresh_id(ids: &dyn IdGenerator, seen: &HashSet<String>, raw: &[Value]) -> String {
    loop {
        let candidate = ids.next_id();
        let stored = raw
            .iter()
            .any(|r| r.get("id").and_then(Value::as_str) == Some(candidate.as_str()));
        if !seen.contains(&candidate) && !stored {
            return candidate;
        }
    }
}

/// Write `data` to `path` atomically using a uniquely named sibling file.
///
/// Creates the parent directory if it does not exist. The data is flushed
/// to disk before `std::fs::rename` swaps it into place, so a crash at any
/// point leaves either the old or the new document, never a mix.
pub fn write_atomic(path: &Path, data: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "state".to_string());
    let tmp_path = dir.join(format!(".tmp-{file_name}-{}", uuid::Uuid::new_v4()));

    let written = File::create(&tmp_path).and_then(|mut file| {
        file.write_all(data)?;
        file.sync_all()
    });
    let renamed = written.and_then(|()| fs::rename(&tmp_path, path));

    if let Err(e) = renamed {
        let _ = fs::remove_file(&tmp_path);
        return Err(e.into());
    }
    Ok(())
}
