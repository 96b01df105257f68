//! Flow Table / FT: the owning store of flow entries.

use std::collections::HashMap;

use tracing::error;

use crate::error::{OfsmError, Result};
use crate::flow_entry::FlowEntry;
use crate::ids::{FlowId, FlowIdAllocator};
use crate::match_query::{MatchMode, MatchQuery};

/// Status counters the table reports to stats and diagnostics.
#[derive(Debug, Default, Clone, Copy)]
pub struct FlowTableCounters {
    pub current_count: u64,
    pub adds: u64,
    pub deletes: u64,
    pub forwarding_add_errors: u64,
}

/// The flow table. Exclusively owns its entries: an entry's lifetime ends only through
/// `FlowTable::delete`.
#[derive(Debug, Default)]
pub struct FlowTable {
    entries: HashMap<FlowId, FlowEntry>,
    counters: FlowTableCounters,
    /// `None` means unbounded (no resource cap modeled). Set via `with_capacity` to exercise the
    /// `RESOURCE` rejection path on insert.
    capacity: Option<usize>,
}

fn entry_matches(entry: &FlowEntry, query: &MatchQuery) -> bool {
    if !query.table_matches(entry.table_id) {
        return false;
    }
    let out_port_ok = query.out_port_matches(false, |port| entry.effects.outputs_to(port));
    if !out_port_ok {
        return false;
    }
    let cookie_ok = query.cookie_matches(entry.cookie, entry.effects.version().supports_cookie_mask());
    if !cookie_ok {
        return false;
    }
    match query.mode {
        MatchMode::Strict => query.priority == entry.priority && query.m.equals(&entry.m),
        MatchMode::NonStrict => query.m.is_subset_of(&entry.m),
        MatchMode::Overlap => query.priority == entry.priority && query.m.overlaps(&entry.m),
    }
}

impl FlowTable {
    pub fn new() -> Self {
        FlowTable::default()
    }

    pub fn with_capacity_limit(capacity: usize) -> Self {
        FlowTable {
            capacity: Some(capacity),
            ..FlowTable::default()
        }
    }

    pub fn counters(&self) -> FlowTableCounters {
        self.counters
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: FlowId) -> Option<&FlowEntry> {
        self.entries.get(&id)
    }

    /// Allocate an id and link `entry` into the table.
    pub fn add(&mut self, allocator: &FlowIdAllocator, mut entry: FlowEntry) -> Result<FlowId> {
        if let Some(capacity) = self.capacity {
            if self.entries.len() >= capacity {
                error!(capacity, "flow table at capacity, rejecting insert");
                return Err(OfsmError::Resource);
            }
        }
        let id = allocator.alloc();
        entry.id = id;
        self.entries.insert(id, entry);
        self.counters.current_count = self.entries.len() as u64;
        self.counters.adds += 1;
        Ok(id)
    }

    /// First strict match.
    pub fn strict_match(&self, query: &MatchQuery) -> Option<&FlowEntry> {
        debug_assert!(matches!(query.mode, MatchMode::Strict));
        self.entries.values().find(|entry| entry_matches(entry, query))
    }

    /// Remove and return the entry with `id`. Fails with `NotFound` if not linked.
    pub fn delete(&mut self, id: FlowId) -> Result<FlowEntry> {
        let entry = self.entries.remove(&id).ok_or(OfsmError::NotFound)?;
        self.counters.current_count = self.entries.len() as u64;
        self.counters.deletes += 1;
        Ok(entry)
    }

    /// Replace an entry's effects in place without touching identity, timers, or counters.
    /// Single-threaded cooperative scheduling makes the assignment itself atomic with respect to
    /// any interleaved iteration task.
    pub fn entry_modify_effects(&mut self, id: FlowId, effects: crate::effects::Effects) -> Result<()> {
        let entry = self.entries.get_mut(&id).ok_or(OfsmError::NotFound)?;
        entry.effects = effects;
        Ok(())
    }

    /// Record FWD's authoritative `table_id` and the creation timestamp once `FWD.flow_create`
    /// succeeds. Until this call, a freshly-added entry carries the
    /// message's requested `table_id` and `insert_time_ms = 0`.
    pub fn finalize_insert(&mut self, id: FlowId, table_id: u8, insert_time_ms: u64) -> Result<()> {
        let entry = self.entries.get_mut(&id).ok_or(OfsmError::NotFound)?;
        entry.table_id = table_id;
        entry.insert_time_ms = insert_time_ms;
        Ok(())
    }

    /// Synchronous, non-yielding scan over all entries matching `query`,
    /// used by overlap detection which must complete within a single slice.
    pub fn iter_matching<'a>(&'a self, query: &'a MatchQuery) -> impl Iterator<Item = &'a FlowEntry> + 'a {
        self.entries.values().filter(move |entry| entry_matches(entry, query))
    }

    /// A snapshot of the ids currently matching `query`, used to seed a cooperative
    /// `IterationTask`: the task iterates this fixed list, re-checking FT on each
    /// step so a concurrently-deleted entry is simply skipped rather than delivered stale.
    pub fn snapshot_matching(&self, query: &MatchQuery) -> Vec<FlowId> {
        self.iter_matching(query).map(|entry| entry.id).collect()
    }

    pub fn forwarding_add_error(&mut self) {
        self.counters.forwarding_add_errors += 1;
    }

    /// A `Debug`-friendly view of every live entry, for the demo binary and tests that want to
    /// assert on table contents without reaching into private fields.
    pub fn snapshot(&self) -> Vec<FlowEntrySummary> {
        self.entries
            .values()
            .map(|entry| FlowEntrySummary {
                id: entry.id,
                table_id: entry.table_id,
                priority: entry.priority,
                cookie: entry.cookie,
                version: entry.effects.version(),
            })
            .collect()
    }
}

/// A read-only summary of one live `FlowEntry`, cheap to hand out to tests and diagnostics
/// without exposing the full entry's internals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlowEntrySummary {
    pub id: FlowId,
    pub table_id: u8,
    pub priority: u16,
    pub cookie: u64,
    pub version: crate::version::Ver,
}
