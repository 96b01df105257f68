//! Iteration Task: a cooperatively-yielding scan over the flow table.
//!
//! Models the original callback-with-a-nullable-entry shape as an enum with a `Done` variant
//! rather than `Option<&FlowEntry>` — `Step` below is that enum.
//! The task itself holds a fixed snapshot of `FlowId`s taken at spawn time and re-resolves each
//! id against the live table on every step, so a concurrent delete is silently skipped rather
//! than delivered stale.
//!
//! `Step::Matched` carries an owned `FlowEntry` rather than a borrow of the table: a callback
//! (MODIFY's effects replacement, DELETE's unlinking, MODIFY's treat-as-add fallback on `Done`)
//! is handed the live table mutably alongside the step, so it can call `FlowTable` methods
//! directly instead of staging a mutation for someone else to apply later.

use crate::flow_entry::FlowEntry;
use crate::flow_table::FlowTable;
use crate::ids::FlowId;

/// One step of an iteration task's callback protocol.
pub enum Step {
    /// A live entry matching the task's original query, snapshotted at the moment it was
    /// re-checked against the table.
    Matched(FlowEntry),
    /// The terminal sentinel. Delivered exactly once, after which the task is finished. This is
    /// the only place it is safe to release the originating request and free the task's state.
    Done,
}

/// Receives the steps of one iteration task, with mutable access to the table so it can act on
/// what it observes (replace effects, unlink, or — on `Done` with zero matches — insert a new
/// entry for MODIFY's treat-as-add fallback).
pub trait IterationCallback {
    fn on_step(&mut self, step: Step, ft: &mut FlowTable);
}

/// Type-erased handle a `Scheduler` implementation can hold in its run queue and drive one slice
/// at a time, without knowing the concrete callback type.
pub trait CooperativeTask {
    /// Process entries until `should_yield` returns `true` or the task reaches its terminal
    /// step. Returns `true` once the terminal step has been delivered (the task is finished and
    /// may be dropped).
    fn run_slice(&mut self, ft: &mut FlowTable, should_yield: &mut dyn FnMut() -> bool) -> bool;

    /// Deliver the terminal step immediately with an empty remainder, used when the scheduler
    /// tears down before the task finishes naturally.
    fn cancel(&mut self, ft: &mut FlowTable);
}

/// A cooperatively-yielding scan over a fixed snapshot of `FlowId`s.
pub struct IterationTask<CB> {
    ids: Vec<FlowId>,
    cursor: usize,
    callback: Option<CB>,
}

impl<CB: IterationCallback> IterationTask<CB> {
    pub fn new(ids: Vec<FlowId>, callback: CB) -> Self {
        IterationTask {
            ids,
            cursor: 0,
            callback: Some(callback),
        }
    }

    pub fn is_done(&self) -> bool {
        self.callback.is_none()
    }
}

impl<CB: IterationCallback> CooperativeTask for IterationTask<CB> {
    fn run_slice(&mut self, ft: &mut FlowTable, should_yield: &mut dyn FnMut() -> bool) -> bool {
        if self.callback.is_none() {
            return true;
        }
        loop {
            if self.cursor >= self.ids.len() {
                if let Some(cb) = self.callback.as_mut() {
                    cb.on_step(Step::Done, ft);
                }
                self.callback = None;
                return true;
            }
            let id = self.ids[self.cursor];
            self.cursor += 1;
            if let Some(entry) = ft.get(id).cloned() {
                if let Some(cb) = self.callback.as_mut() {
                    cb.on_step(Step::Matched(entry), ft);
                }
            }
            if self.cursor >= self.ids.len() {
                if let Some(cb) = self.callback.as_mut() {
                    cb.on_step(Step::Done, ft);
                }
                self.callback = None;
                return true;
            }
            if should_yield() {
                return false;
            }
        }
    }

    fn cancel(&mut self, ft: &mut FlowTable) {
        if let Some(mut callback) = self.callback.take() {
            callback.on_step(Step::Done, ft);
        }
        self.cursor = self.ids.len();
    }
}
