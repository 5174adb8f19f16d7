//! Persistent per-identity todo lists.
//!
//! Every identity's records live in a single JSON document owned by one
//! [`RecordStore`]:
//!
//! ```json
//! {
//!   "version": 1,
//!   "identities": {
//!     "alice": { "records": [ { "id": "…", "title": "…", "completed": false } ] }
//!   }
//! }
//! ```
//!
//! The document is reloaded at the start of every operation and rewritten
//! in full, via temp-file-then-rename, at the end of every mutating one.
//!
//! # Modules
//!
//! - [`record`]: `Record` and `RecordPatch`.
//! - [`ids`]: pluggable record id generation.
//! - [`document`]: load, repair and atomic write of the state file.
//! - [`gate`]: FIFO single-writer gate shared per document path.
//! - [`record_store`]: the list/add/update/delete operations.

pub mod document;
pub mod gate;
pub mod ids;
pub mod record;
pub mod record_store;

pub use ids::{IdGenerator, SequentialIdGenerator, UuidGenerator};
pub use record::{Record, RecordPatch};
pub use record_store::RecordStore;
