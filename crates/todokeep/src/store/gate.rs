//! Single-writer gate for a state document.
//!
//! A ticket lock: callers take a ticket on entry and are admitted strictly
//! in ticket order, so concurrent writers complete in arrival order. One
//! gate exists per document path per process; every `RecordStore` opened
//! on the same path shares it.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, OnceLock, PoisonError, Weak};

#[derive(Debug, Default)]
struct Tickets {
    next: u64,
    serving: u64,
}

/// FIFO mutual exclusion for one document's load-mutate-persist cycles.
#[derive(Debug, Default)]
pub struct WriteGate {
    tickets: Mutex<Tickets>,
    turn: Condvar,
}

/// Held while a write cycle runs. Dropping it admits the next ticket.
#[must_use = "the gate is released as soon as the turn is dropped"]
pub struct Turn<'a> {
    gate: &'a WriteGate,
}

impl WriteGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Block until every earlier caller has released the gate.
    pub fn enter(&self) -> Turn<'_> {
        let mut tickets = self.lock();
        let ticket = tickets.next;
        tickets.next += 1;
        if tickets.serving != ticket {
            log::trace!("write gate: waiting with ticket {ticket}");
        }
        while tickets.serving != ticket {
            tickets = self
                .turn
                .wait(tickets)
                .unwrap_or_else(PoisonError::into_inner);
        }
        Turn { gate: self }
    }

    // Counters stay consistent even if a holder panicked, so poisoning is
    // ignored.
    fn lock(&self) -> MutexGuard<'_, Tickets> {
        self.tickets.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for Turn<'_> {
    fn drop(&mut self) {
        let mut tickets = self.gate.lock();
        tickets.serving += 1;
        drop(tickets);
        self.gate.turn.notify_all();
    }
}

/// The process-wide gate for `path`.
///
/// `path` should already be absolute; see [`RecordStore::open`]. The
/// registry holds gates weakly, so a gate lives only as long as some store
/// on its path.
///
/// [`RecordStore::open`]: super::RecordStore::open
pub fn gate_for(path: &Path) -> Arc<WriteGate> {
    let mut gates = registry().lock().unwrap_or_else(PoisonError::into_inner);
    gates.retain(|_, gate| gate.strong_count() > 0);
    if let Some(gate) = gates.get(path).and_then(Weak::upgrade) {
        return gate;
    }
    let gate = Arc::new(WriteGate::new());
    gates.insert(path.to_path_buf(), Arc::downgrade(&gate));
    gate
}

fn registry() -> &'static Mutex<HashMap<PathBuf, Weak<WriteGate>>> {
    static GATES: OnceLock<Mutex<HashMap<PathBuf, Weak<WriteGate>>>> = OnceLock::new();
    GATES.get_or_init(Default::default)
}
