//! Shared collaborator stubs for the end-to-end scenario tests in this directory.
//! Each scenario file builds its own `StateManager` (or, for non-strict flow-mod, drives
//! `flow_mod`'s task directly — see `flow_mod_non_strict_scenarios.rs`) out of these pieces.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use ofsm_core::collab::{Connection, FlowFinalStats, FlowLiveStats, Forwarding, ForwardingFeatures, PortManager, Reply, Scheduler};
use ofsm_core::error::{OfsmError, Result};
use ofsm_core::effects::{Action, Effects};
use ofsm_core::flow_entry::FlowModFlags;
use ofsm_core::ids::FlowId;
use ofsm_core::iteration::CooperativeTask;
use ofsm_core::matchfield::Match;
use ofsm_core::messages::{ExperimenterMsg, FlowModCommand, FlowModMsg, Header, PacketOutMsg, PortModMsg};
use ofsm_core::port::PortNumber;
use ofsm_core::version::Ver;
use ofsm_core::wire_error::WireError;

/// FWD: records every call it receives instead of modeling a real datapath.
#[derive(Default, Clone)]
pub struct StubFwd {
    pub created: Vec<FlowId>,
    pub modified: Vec<FlowId>,
    pub deleted: Vec<FlowId>,
    pub live: HashMap<FlowId, FlowLiveStats>,
}

impl Forwarding for StubFwd {
    fn dpid(&self) -> u64 {
        0x0102_0304_0506_0708
    }
    fn packet_out(&mut self, _msg: &PacketOutMsg) -> Result<()> {
        Ok(())
    }
    fn flow_create(&mut self, flow_id: FlowId, _msg: &FlowModMsg) -> Result<u8> {
        self.created.push(flow_id);
        Ok(0)
    }
    fn flow_modify(&mut self, flow_id: FlowId, _msg: &FlowModMsg) -> Result<()> {
        self.modified.push(flow_id);
        Ok(())
    }
    fn flow_delete(&mut self, flow_id: FlowId) -> Result<FlowFinalStats> {
        self.deleted.push(flow_id);
        Ok(FlowFinalStats::default())
    }
    fn flow_stats_get(&self, flow_id: FlowId) -> Result<FlowLiveStats> {
        Ok(self.live.get(&flow_id).copied().unwrap_or_default())
    }
    fn table_stats_get(&self) -> Result<Vec<ofsm_core::stats::TableStats>> {
        Ok(vec![])
    }
    fn forwarding_features_get(&self) -> ForwardingFeatures {
        ForwardingFeatures::default()
    }
    fn experimenter(&mut self, _msg: &ExperimenterMsg) -> Result<()> {
        Err(OfsmError::NotSupported)
    }
}

/// PORT: `modify` succeeds or fails depending on `modify_ok`, set up front per scenario.
pub struct StubPort {
    pub modify_ok: bool,
}

impl Default for StubPort {
    fn default() -> Self {
        StubPort { modify_ok: true }
    }
}

impl PortManager for StubPort {
    fn modify(&mut self, _msg: &PortModMsg) -> Result<()> {
        if self.modify_ok {
            Ok(())
        } else {
            Err(OfsmError::Param)
        }
    }
    fn stats_get(&self, _port: PortNumber) -> Result<Vec<ofsm_core::stats::PortStats>> {
        Ok(vec![])
    }
    fn queue_config_get(&self, _port: PortNumber) -> Result<Vec<ofsm_core::stats::QueueConfig>> {
        Ok(vec![])
    }
    fn queue_stats_get(&self, _port: PortNumber, _queue_id: u32) -> Result<Vec<ofsm_core::stats::QueueStats>> {
        Ok(vec![])
    }
    fn desc_stats_get(&self) -> Vec<ofsm_core::stats::PortDesc> {
        vec![]
    }
    fn features_get(&self) -> u32 {
        0
    }
    fn experimenter(&mut self, _msg: &ExperimenterMsg) -> Result<()> {
        Err(OfsmError::NotSupported)
    }
}

#[derive(Default)]
pub struct RecordingCxn {
    pub replies: Vec<Reply>,
    pub errors: Vec<WireError>,
}

impl Connection for RecordingCxn {
    fn send(&mut self, _cxn_id: u32, reply: Reply) -> Result<()> {
        self.replies.push(reply);
        Ok(())
    }
    fn send_error(&mut self, _cxn_id: u32, error: WireError) {
        self.errors.push(error);
    }
}

/// A clock shared with the test so `SET_CONFIG`-free scenarios (S5) can advance time between
/// `StateManager::handle` calls without owning the scheduler themselves.
#[derive(Clone, Default)]
pub struct SharedClock(Rc<Cell<u64>>);

impl SharedClock {
    pub fn new(now_ms: u64) -> Self {
        SharedClock(Rc::new(Cell::new(now_ms)))
    }

    pub fn set(&self, now_ms: u64) {
        self.0.set(now_ms)
    }

    pub fn get(&self) -> u64 {
        self.0.get()
    }
}

/// SOC: enqueues spawned non-strict flow-mod tasks without driving them (see the note on
/// `ImmediateScheduler` in `state_manager.rs`'s own tests — running one needs the live
/// `FlowTable`, which `Scheduler::spawn_iter_task` never receives). Scenarios that exercise
/// non-strict MODIFY/DELETE drive `flow_mod`'s task-spawning functions directly instead of going
/// through a `StateManager`.
#[derive(Default)]
pub struct RecordingScheduler {
    pub clock: SharedClock,
    pub spawned: Vec<Box<dyn CooperativeTask>>,
}

impl Scheduler for RecordingScheduler {
    fn spawn_iter_task(&mut self, task: Box<dyn CooperativeTask>) -> Result<()> {
        self.spawned.push(task);
        Ok(())
    }
    fn should_yield(&self) -> bool {
        false
    }
    fn current_time_ms(&self) -> u64 {
        self.clock.0.get()
    }
}

pub fn header(version: Ver, xid: u32) -> Header {
    Header {
        xid: ofsm_core::ids::Xid::new(xid),
        version,
    }
}

/// A strict `ADD`/`DELETE_STRICT` flow-mod message with a single-field match and a single
/// output action, the shape every scenario in this test suite needs.
pub fn flow_mod(command: FlowModCommand, priority: u16, m: Match, out: PortNumber) -> FlowModMsg {
    FlowModMsg {
        command,
        table_id: 0,
        m,
        priority,
        out_port: None,
        cookie: 0,
        cookie_mask: 0,
        flags: FlowModFlags::default(),
        idle_timeout: 0,
        hard_timeout: 0,
        effects: Effects::Actions {
            actions: vec![Action::Output(out)],
            version: Ver::V1_0,
        },
    }
}
