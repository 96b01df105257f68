//! Collaborator contracts: traits the state manager is driven by and drives.
//!
//! The controller connection, the wire codec, FWD, PORT, and the cooperative
//! scheduler's timer wheel are all treated as external collaborators whose *internals* are out
//! of scope for this core. This module gives those contracts a concrete Rust shape:
//! `StateManager` (in `state_manager.rs`) is generic over them, so a host process supplies real
//! implementations and `tests/support/` supplies stubs, with no dynamic dispatch on the hot
//! path.

use crate::effects::Effects;
use crate::error::Result;
use crate::ids::FlowId;
use crate::iteration::CooperativeTask;
use crate::match_query::MatchQuery;
use crate::messages::{ExperimenterMsg, FlowModMsg, PacketOutMsg, PortModMsg};
use crate::wire_error::WireError;

/// Final counters reported when a flow is torn down.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlowFinalStats {
    pub packet_count: u64,
    pub byte_count: u64,
}

/// Live counters reported by a flow-stats or aggregate-stats request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlowLiveStats {
    pub packet_count: u64,
    pub byte_count: u64,
}

/// Capability/feature bits contributed by FWD to a `FEATURES_REPLY`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ForwardingFeatures {
    pub capabilities: u32,
}

/// FWD: the forwarding abstraction.
pub trait Forwarding {
    fn dpid(&self) -> u64;
    fn packet_out(&mut self, msg: &PacketOutMsg) -> Result<()>;
    /// Returns the table id the entry landed in.
    fn flow_create(&mut self, flow_id: FlowId, msg: &FlowModMsg) -> Result<u8>;
    fn flow_modify(&mut self, flow_id: FlowId, msg: &FlowModMsg) -> Result<()>;
    fn flow_delete(&mut self, flow_id: FlowId) -> Result<FlowFinalStats>;
    fn flow_stats_get(&self, flow_id: FlowId) -> Result<FlowLiveStats>;
    fn table_stats_get(&self) -> Result<Vec<crate::stats::TableStats>>;
    fn forwarding_features_get(&self) -> ForwardingFeatures;
    fn experimenter(&mut self, msg: &ExperimenterMsg) -> Result<()>;
}

/// PORT: the port manager abstraction.
pub trait PortManager {
    fn modify(&mut self, msg: &PortModMsg) -> Result<()>;
    fn stats_get(&self, port: crate::port::PortNumber) -> Result<Vec<crate::stats::PortStats>>;
    fn queue_config_get(&self, port: crate::port::PortNumber) -> Result<Vec<crate::stats::QueueConfig>>;
    fn queue_stats_get(&self, port: crate::port::PortNumber, queue_id: u32) -> Result<Vec<crate::stats::QueueStats>>;
    fn desc_stats_get(&self) -> Vec<crate::stats::PortDesc>;
    fn features_get(&self) -> u32;
    fn experimenter(&mut self, msg: &ExperimenterMsg) -> Result<()>;
}

/// Effects ready to send on an established controller connection.
#[derive(Debug, Clone)]
pub enum Reply {
    GetConfig {
        xid: crate::ids::Xid,
        flags: u16,
        miss_send_len: u16,
    },
    FeaturesReply {
        xid: crate::ids::Xid,
        dpid: u64,
        capabilities: u32,
        port_features: u32,
    },
    FlowRemoved {
        xid: crate::ids::Xid,
        flow_id: FlowId,
        cookie: u64,
        priority: u16,
        reason: FlowRemovedReason,
        duration_sec: u32,
        duration_nsec: u32,
        idle_timeout: u16,
        packet_count: u64,
        byte_count: u64,
    },
    FlowStats {
        xid: crate::ids::Xid,
        more: bool,
        entries: Vec<crate::stats::FlowStatsEntry>,
    },
    AggregateStats {
        xid: crate::ids::Xid,
        packet_count: u64,
        byte_count: u64,
        flow_count: u32,
    },
    TableStats {
        xid: crate::ids::Xid,
        tables: Vec<crate::stats::TableStats>,
    },
    PortStats {
        xid: crate::ids::Xid,
        ports: Vec<crate::stats::PortStats>,
    },
    QueueStats {
        xid: crate::ids::Xid,
        queues: Vec<crate::stats::QueueStats>,
    },
    QueueConfig {
        xid: crate::ids::Xid,
        queues: Vec<crate::stats::QueueConfig>,
    },
    DescStats {
        xid: crate::ids::Xid,
        desc: crate::config::DescStats,
    },
    PortDescStats {
        xid: crate::ids::Xid,
        ports: Vec<crate::stats::PortDesc>,
    },
    BsnIpMask {
        xid: crate::ids::Xid,
        index: u8,
        mask: u32,
    },
    BsnHybridGet {
        xid: crate::ids::Xid,
        hybrid_enable: u32,
        hybrid_version: u32,
    },
}

/// Why a `flow_removed` was sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowRemovedReason {
    IdleTimeout,
    HardTimeout,
    Delete,
}

/// CXN: the controller connection layer.
pub trait Connection {
    /// Takes ownership of `reply` on success.
    fn send(&mut self, cxn_id: u32, reply: Reply) -> Result<()>;
    fn send_error(&mut self, cxn_id: u32, error: WireError);
}

/// SOC: the cooperative scheduler.
pub trait Scheduler {
    fn spawn_iter_task(&mut self, task: Box<dyn CooperativeTask>) -> Result<()>;
    fn should_yield(&self) -> bool;
    fn current_time_ms(&self) -> u64;
}
