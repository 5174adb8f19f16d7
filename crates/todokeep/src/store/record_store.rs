//! The record store: per-identity list, add, update and delete.
//!
//! Each operation runs one load → compute → persist cycle against the
//! state document. Mutating cycles hold the document's [`WriteGate`] from
//! load to persist, so concurrent writers never lose each other's updates.
//! Reads take no lock; atomic rename guarantees they see either the old or
//! the new document.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::{Result, TodoError, ValidationError};

use super::document::StateDocument;
use super::gate::{gate_for, WriteGate};
use super::ids::{IdGenerator, UuidGenerator};
use super::record::{Record, RecordPatch};

/// Filesystem-backed store for per-identity todo lists.
///
/// `RecordStore` is `Send + Sync`; share one across threads with `Arc`.
/// Stores opened on the same path in one process share a write gate.
pub struct RecordStore {
    path: PathBuf,
    gate: Arc<WriteGate>,
    ids: Box<dyn IdGenerator>,
}

impl std::fmt::Debug for RecordStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordStore")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl RecordStore {
    /// Open the store backed by `path`, generating random UUID record ids.
    ///
    /// Creates the parent directory if it does not already exist. The
    /// document itself is created on the first write.
    ///
    /// # Errors
    ///
    /// Returns `TodoError::Storage` if the directory cannot be created or
    /// the current directory cannot be resolved for a relative path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::with_id_generator(path, UuidGenerator)
    }

    /// Open the store with a custom record id generator.
    pub fn with_id_generator(
        path: impl AsRef<Path>,
        ids: impl IdGenerator + 'static,
    ) -> Result<Self> {
        let path = resolve(path.as_ref())?;
        let gate = gate_for(&path);
        log::debug!("opened record store at {}", path.display());
        Ok(Self {
            path,
            gate,
            ids: Box::new(ids),
        })
    }

    /// Absolute path of the backing document.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All records for `identity`, most recent first.
    ///
    /// Malformed stored entries are repaired or dropped, and the repaired
    /// list is written back before returning. An unknown identity has an
    /// empty list.
    ///
    /// # Errors
    ///
    /// Returns `TodoError::Storage` only if the document cannot be read,
    /// parsed or rewritten.
    pub fn list(&self, identity: &str) -> Result<Vec<Record>> {
        let document = StateDocument::load(&self.path)?;
        let (records, repaired) = document.records(identity, self.ids.as_ref());
        if !repaired {
            return Ok(records);
        }

        // Repair is a write; redo it under the gate against a fresh load.
        self.transact(identity, |records| Ok((records.clone(), false)))
    }

    /// Create a record titled `title` at the head of `identity`'s list.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::TitleRequired` if `title` is blank, or
    /// `TodoError::Storage` on I/O failure.
    pub fn add(&self, identity: &str, title: &str) -> Result<Record> {
        let title = required_title(title)?;
        self.transact(identity, |records| {
            let record = Record {
                id: self.unused_id(records),
                title,
                completed: false,
            };
            records.insert(0, record.clone());
            Ok((record, true))
        })
    }

    /// Apply `patch` to the record `id`, keeping its position.
    ///
    /// Only the fields present in the patch change.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::IdRequired` for an empty id,
    /// `TodoError::NotFound` if the identity has no such record,
    /// `ValidationError::TitleRequired` if the patch title is blank, or
    /// `TodoError::Storage` on I/O failure.
    pub fn update(&self, identity: &str, id: &str, patch: &RecordPatch) -> Result<Record> {
        if id.is_empty() {
            return Err(ValidationError::IdRequired.into());
        }
        self.transact(identity, |records| {
            let record = records
                .iter_mut()
                .find(|r| r.id == id)
                .ok_or_else(|| TodoError::NotFound(id.to_string()))?;

            let title = patch.title.as_deref().map(required_title).transpose()?;
            if let Some(title) = title {
                record.title = title;
            }
            if let Some(completed) = patch.completed {
                record.completed = completed;
            }
            Ok((record.clone(), true))
        })
    }

    /// Remove the record `id` and return it.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::IdRequired` for an empty id,
    /// `TodoError::NotFound` if the identity has no such record, or
    /// `TodoError::Storage` on I/O failure.
    pub fn delete(&self, identity: &str, id: &str) -> Result<Record> {
        if id.is_empty() {
            return Err(ValidationError::IdRequired.into());
        }
        self.transact(identity, |records| {
            let index = records
                .iter()
                .position(|r| r.id == id)
                .ok_or_else(|| TodoError::NotFound(id.to_string()))?;
            Ok((records.remove(index), true))
        })
    }

    // ── Internal helpers ──────────────────────────────────────────────────────

    /// Run one exclusive load → apply → persist cycle.
    ///
    /// `apply` returns its result and whether it changed the list. The
    /// document is written if the list changed or load-time repair did.
    /// Nothing is written if `apply` fails.
    fn transact<T>(
        &self,
        identity: &str,
        apply: impl FnOnce(&mut Vec<Record>) -> Result<(T, bool)>,
    ) -> Result<T> {
        let _turn = self.gate.enter();

        let mut document = StateDocument::load(&self.path)?;
        let (mut records, repaired) = document.records(identity, self.ids.as_ref());
        let (result, changed) = apply(&mut records)?;

        if changed || repaired {
            document.set_records(identity, &records)?;
            document.persist(&self.path)?;
            log::debug!(
                "stored {} records for identity {identity}",
                records.len()
            );
        }
        Ok(result)
    }

    fn unused_id(&self, records: &[Record]) -> String {
        loop {
            let id = self.ids.next_id();
            if !id.is_empty() && records.iter().all(|r| r.id != id) {
                return id;
            }
        }
    }
}

fn required_title(title: &str) -> Result<String> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::TitleRequired.into());
    }
    Ok(trimmed.to_string())
}

/// Absolute form of `path`, with its parent directory created and resolved
/// through symlinks so that aliases of one file share a gate.
fn resolve(path: &Path) -> Result<PathBuf> {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };
    let Some(file_name) = absolute.file_name() else {
        return Err(TodoError::Storage(format!(
            "state document path has no file name: {}",
            path.display()
        )));
    };
    let parent = absolute.parent().unwrap_or_else(|| Path::new("/"));
    std::fs::create_dir_all(parent)?;
    Ok(parent.canonicalize()?.join(file_name))
}
