//! Flow-Mod Engine: add/modify/delete semantics.
//!
//! The synchronous variants (ADD, MODIFY-STRICT, DELETE-STRICT) run to completion on the caller's
//! stack and borrow their collaborators for the duration of the call. The non-strict variants
//! spawn a cooperative `IterationTask` that may resume across several scheduler slices, so their
//! callbacks hold `Rc<RefCell<_>>` handles to FWD and the controller connection rather than
//! borrowed references — the same single-threaded cooperative model the id allocators already
//! lean on makes shared ownership sufficient, no locking required.

use std::cell::RefCell;
use std::rc::Rc;

use tracing::warn;

use crate::collab::{Connection, FlowRemovedReason, Forwarding, Reply};
use crate::error::{OfsmError, Result};
use crate::error_encoder;
use crate::flow_entry::FlowEntry;
use crate::flow_table::FlowTable;
use crate::ids::{FlowId, FlowIdAllocator, XidAllocator};
use crate::iteration::{IterationCallback, IterationTask, Step};
use crate::match_query::{MatchMode, MatchQuery};
use crate::messages::{FlowModCommand, FlowModMsg, Header};

/// Why an entry is being torn down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteCause {
    IdleTimeout,
    HardTimeout,
    Delete,
    Overwrite,
}

/// Common query construction shared by every flow-mod variant.
pub fn build_query(header: &Header, msg: &FlowModMsg, mode: MatchMode, force_wild_outport: bool) -> MatchQuery {
    let mut q = MatchQuery::new(mode);
    q.table_id = if header.version.is_post_1_0() {
        msg.table_id
    } else {
        crate::match_query::TABLE_ANY
    };
    q.m = msg.m.clone();
    if matches!(mode, MatchMode::Strict | MatchMode::Overlap) {
        q.priority = msg.priority;
    }
    q.out_port = if force_wild_outport { None } else { msg.out_port };
    if !matches!(mode, MatchMode::Overlap) && header.version.is_post_1_0() {
        q.cookie = msg.cookie;
        q.cookie_mask = msg.cookie_mask;
    }
    q
}

fn new_entry_from_msg(msg: &FlowModMsg) -> FlowEntry {
    FlowEntry {
        id: FlowId::INVALID,
        table_id: msg.table_id,
        priority: msg.priority,
        m: msg.m.clone(),
        cookie: msg.cookie,
        idle_timeout: msg.idle_timeout,
        hard_timeout: msg.hard_timeout,
        flags: msg.flags,
        effects: msg.effects.clone(),
        insert_time_ms: 0,
    }
}

/// Entry deletion routine: notify FWD, optionally notify the controller, unlink.
pub fn delete_entry<F: Forwarding, C: Connection>(
    ft: &mut FlowTable,
    fwd: &mut F,
    cxn: &mut C,
    xid_alloc: &XidAllocator,
    now_ms: u64,
    cxn_id: u32,
    entry: &FlowEntry,
    cause: DeleteCause,
) -> Result<()> {
    let final_stats = fwd.flow_delete(entry.id).unwrap_or_default();
    if entry.flags.send_flow_removed && cause != DeleteCause::Overwrite {
        let (duration_sec, duration_nsec) = entry.duration_since(now_ms);
        let reason = match cause {
            DeleteCause::IdleTimeout => FlowRemovedReason::IdleTimeout,
            DeleteCause::HardTimeout => FlowRemovedReason::HardTimeout,
            DeleteCause::Delete | DeleteCause::Overwrite => FlowRemovedReason::Delete,
        };
        let _ = cxn.send(
            cxn_id,
            Reply::FlowRemoved {
                xid: xid_alloc.alloc(),
                flow_id: entry.id,
                cookie: entry.cookie,
                priority: entry.priority,
                reason,
                duration_sec,
                duration_nsec,
                idle_timeout: entry.idle_timeout,
                packet_count: final_stats.packet_count,
                byte_count: final_stats.byte_count,
            },
        );
    }
    ft.delete(entry.id)?;
    Ok(())
}

/// ADD.
pub fn handle_add<F: Forwarding, C: Connection>(
    ft: &mut FlowTable,
    fwd: &mut F,
    cxn: &mut C,
    flow_alloc: &FlowIdAllocator,
    xid_alloc: &XidAllocator,
    header: Header,
    msg: FlowModMsg,
    cxn_id: u32,
    now_ms: u64,
) -> Result<()> {
    if msg.flags.check_overlap {
        let overlap_query = build_query(&header, &msg, MatchMode::Overlap, true);
        if ft.iter_matching(&overlap_query).next().is_some() {
            warn!(xid = header.xid.get(), "flow-mod rejected: overlapping entry with CHECK_OVERLAP set");
            cxn.send_error(cxn_id, error_encoder::encode_overlap(header.version, header.xid));
            return Ok(());
        }
    }
    if msg.flags.emerg && (msg.idle_timeout != 0 || msg.hard_timeout != 0) {
        cxn.send_error(cxn_id, error_encoder::encode_bad_emerg_timeout(header.xid));
        return Err(OfsmError::Param);
    }
    let strict_query = build_query(&header, &msg, MatchMode::Strict, true);
    if let Some(existing) = ft.strict_match(&strict_query).cloned() {
        delete_entry(ft, fwd, cxn, xid_alloc, now_ms, cxn_id, &existing, DeleteCause::Overwrite)?;
    }

    let entry = new_entry_from_msg(&msg);
    let flow_id = ft.add(flow_alloc, entry)?;
    match fwd.flow_create(flow_id, &msg) {
        Ok(table_id) => {
            ft.finalize_insert(flow_id, table_id, now_ms)?;
        }
        Err(err) => {
            ft.forwarding_add_error();
            let _ = ft.delete(flow_id);
            warn!(xid = header.xid.get(), error = ?err, "forwarding layer rejected flow_create");
            cxn.send_error(cxn_id, error_encoder::encode_flow_mod_error(err, header.version, header.xid));
        }
    }
    Ok(())
}

/// MODIFY-STRICT. Synchronous; falls back to ADD when no entry matches.
pub fn handle_modify_strict<F: Forwarding, C: Connection>(
    ft: &mut FlowTable,
    fwd: &mut F,
    cxn: &mut C,
    flow_alloc: &FlowIdAllocator,
    xid_alloc: &XidAllocator,
    header: Header,
    msg: FlowModMsg,
    cxn_id: u32,
    now_ms: u64,
) -> Result<()> {
    let query = build_query(&header, &msg, MatchMode::Strict, true);
    let matched_id = ft.strict_match(&query).map(|e| e.id);
    match matched_id {
        None => handle_add(ft, fwd, cxn, flow_alloc, xid_alloc, header, msg, cxn_id, now_ms),
        Some(id) => {
            match fwd.flow_modify(id, &msg) {
                Ok(()) => ft.entry_modify_effects(id, msg.effects.clone())?,
                Err(err) => {
                    warn!(xid = header.xid.get(), error = ?err, "forwarding layer rejected flow_modify");
                    cxn.send_error(cxn_id, error_encoder::encode_flow_mod_error(err, header.version, header.xid));
                }
            }
            Ok(())
        }
    }
}

/// DELETE-STRICT.
pub fn handle_delete_strict<F: Forwarding, C: Connection>(
    ft: &mut FlowTable,
    fwd: &mut F,
    cxn: &mut C,
    xid_alloc: &XidAllocator,
    header: Header,
    msg: FlowModMsg,
    cxn_id: u32,
    now_ms: u64,
) -> Result<()> {
    let query = build_query(&header, &msg, MatchMode::Strict, false);
    if let Some(entry) = ft.strict_match(&query).cloned() {
        delete_entry(ft, fwd, cxn, xid_alloc, now_ms, cxn_id, &entry, DeleteCause::Delete)?;
    }
    Ok(())
}

/// The cooperative callback driving non-strict MODIFY.
pub(crate) struct ModifyCallback<F, C> {
    fwd: Rc<RefCell<F>>,
    cxn: Rc<RefCell<C>>,
    flow_alloc: Rc<FlowIdAllocator>,
    xid_alloc: Rc<XidAllocator>,
    header: Header,
    msg: FlowModMsg,
    cxn_id: u32,
    now_ms: u64,
    num_matched: usize,
}

impl<F: Forwarding, C: Connection> IterationCallback for ModifyCallback<F, C> {
    fn on_step(&mut self, step: Step, ft: &mut FlowTable) {
        match step {
            Step::Matched(entry) => {
                self.num_matched += 1;
                let mut fwd = self.fwd.borrow_mut();
                match fwd.flow_modify(entry.id, &self.msg) {
                    Ok(()) => {
                        let _ = ft.entry_modify_effects(entry.id, self.msg.effects.clone());
                    }
                    Err(err) => {
                        warn!(xid = self.header.xid.get(), error = ?err, "forwarding layer rejected flow_modify");
                        self.cxn.borrow_mut().send_error(
                            self.cxn_id,
                            error_encoder::encode_flow_mod_error(err, self.header.version, self.header.xid),
                        );
                    }
                }
            }
            Step::Done => {
                if self.num_matched == 0 {
                    let _ = handle_add(
                        ft,
                        &mut *self.fwd.borrow_mut(),
                        &mut *self.cxn.borrow_mut(),
                        &self.flow_alloc,
                        &self.xid_alloc,
                        self.header,
                        self.msg.clone(),
                        self.cxn_id,
                        self.now_ms,
                    );
                }
            }
        }
    }
}

/// The cooperative callback driving non-strict DELETE.
pub(crate) struct DeleteCallback<F, C> {
    fwd: Rc<RefCell<F>>,
    cxn: Rc<RefCell<C>>,
    xid_alloc: Rc<XidAllocator>,
    cxn_id: u32,
    now_ms: u64,
}

impl<F: Forwarding, C: Connection> IterationCallback for DeleteCallback<F, C> {
    fn on_step(&mut self, step: Step, ft: &mut FlowTable) {
        if let Step::Matched(entry) = step {
            let _ = delete_entry(
                ft,
                &mut *self.fwd.borrow_mut(),
                &mut *self.cxn.borrow_mut(),
                &self.xid_alloc,
                self.now_ms,
                self.cxn_id,
                &entry,
                DeleteCause::Delete,
            );
        }
    }
}

/// Spawn a non-strict MODIFY iteration task. `snapshot` is the ids
/// `FlowTable::snapshot_matching` collected against the NON_STRICT query built with a forced
/// wildcard out-port.
pub fn spawn_modify<F, C>(
    snapshot: Vec<FlowId>,
    fwd: Rc<RefCell<F>>,
    cxn: Rc<RefCell<C>>,
    flow_alloc: Rc<FlowIdAllocator>,
    xid_alloc: Rc<XidAllocator>,
    header: Header,
    msg: FlowModMsg,
    cxn_id: u32,
    now_ms: u64,
) -> IterationTask<ModifyCallback<F, C>>
where
    F: Forwarding + 'static,
    C: Connection + 'static,
{
    let callback = ModifyCallback {
        fwd,
        cxn,
        flow_alloc,
        xid_alloc,
        header,
        msg,
        cxn_id,
        now_ms,
        num_matched: 0,
    };
    IterationTask::new(snapshot, callback)
}

/// Spawn a non-strict DELETE iteration task. `snapshot` honors the message's
/// out-port filter (not force-wildcarded, unlike MODIFY's).
pub fn spawn_delete<F, C>(
    snapshot: Vec<FlowId>,
    fwd: Rc<RefCell<F>>,
    cxn: Rc<RefCell<C>>,
    xid_alloc: Rc<XidAllocator>,
    cxn_id: u32,
    now_ms: u64,
) -> IterationTask<DeleteCallback<F, C>>
where
    F: Forwarding + 'static,
    C: Connection + 'static,
{
    let callback = DeleteCallback {
        fwd,
        cxn,
        xid_alloc,
        cxn_id,
        now_ms,
    };
    IterationTask::new(snapshot, callback)
}

/// `msg.command` dispatch entry point used by `dispatch.rs`.
pub fn dispatch_flow_mod<F, C>(
    ft: &mut FlowTable,
    fwd: Rc<RefCell<F>>,
    cxn: Rc<RefCell<C>>,
    flow_alloc: Rc<FlowIdAllocator>,
    xid_alloc: Rc<XidAllocator>,
    header: Header,
    msg: FlowModMsg,
    cxn_id: u32,
    now_ms: u64,
) -> Result<Option<IterationTask<ModifyCallback<F, C>>>>
where
    F: Forwarding + 'static,
    C: Connection + 'static,
{
    match msg.command {
        FlowModCommand::Add => {
            handle_add(
                ft,
                &mut *fwd.borrow_mut(),
                &mut *cxn.borrow_mut(),
                &flow_alloc,
                &xid_alloc,
                header,
                msg,
                cxn_id,
                now_ms,
            )?;
            Ok(None)
        }
        FlowModCommand::ModifyStrict => {
            handle_modify_strict(
                ft,
                &mut *fwd.borrow_mut(),
                &mut *cxn.borrow_mut(),
                &flow_alloc,
                &xid_alloc,
                header,
                msg,
                cxn_id,
                now_ms,
            )?;
            Ok(None)
        }
        FlowModCommand::DeleteStrict => {
            handle_delete_strict(ft, &mut *fwd.borrow_mut(), &mut *cxn.borrow_mut(), &xid_alloc, header, msg, cxn_id, now_ms)?;
            Ok(None)
        }
        FlowModCommand::Modify => {
            let query = build_query(&header, &msg, MatchMode::NonStrict, true);
            let snapshot = ft.snapshot_matching(&query);
            Ok(Some(spawn_modify(
                snapshot, fwd, cxn, flow_alloc, xid_alloc, header, msg, cxn_id, now_ms,
            )))
        }
        FlowModCommand::Delete => {
            let query = build_query(&header, &msg, MatchMode::NonStrict, false);
            let snapshot = ft.snapshot_matching(&query);
            let task = spawn_delete(snapshot, fwd, cxn, xid_alloc, cxn_id, now_ms);
            // Shares the `Modify` task's declared return type: the caller only needs to know
            // whether a task was spawned, not distinguish its kind, so DELETE is driven to
            // completion here rather than surfaced through the Option.
            drive_to_completion(task, ft);
            Ok(None)
        }
    }
}

fn drive_to_completion<CB: IterationCallback>(mut task: IterationTask<CB>, ft: &mut FlowTable) {
    loop {
        if task.run_slice_pub(ft) {
            break;
        }
    }
}

impl<CB: IterationCallback> IterationTask<CB> {
    fn run_slice_pub(&mut self, ft: &mut FlowTable) -> bool {
        use crate::iteration::CooperativeTask;
        self.run_slice(ft, &mut || false)
    }
}
