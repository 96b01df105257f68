//! Stats Engine: flow-stats streaming, aggregate-stats, and the synchronous
//! table/port/queue/desc stats handlers.
//!
//! Flow stats is the one handler in this core that must paginate: a reply accumulates matched
//! entries until appending the next one would push it past a 32 KiB wire budget, at which point
//! it is flushed with `more=1` and a fresh reply is started. That
//! shape maps directly onto `iteration::IterationCallback`: the callback owns the in-progress
//! reply and flushes it through `Connection::send` as `Step::Matched` steps arrive, and finalizes
//! on `Step::Done`.

use crate::collab::{Connection, FlowLiveStats, Forwarding, Reply};
use crate::effects::Effects;
use crate::flow_entry::FlowEntry;
use crate::flow_table::FlowTable;
use crate::ids::Xid;
use crate::iteration::{IterationCallback, Step};
use crate::match_query::MatchQuery;
use crate::port::PortNumber;
use crate::version::Ver;

/// Per-table counters reported by `TABLE_STATS_REQUEST`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TableStats {
    pub table_id: u8,
    pub active_count: u32,
    pub lookup_count: u64,
    pub matched_count: u64,
}

/// Per-port counters reported by `PORT_STATS_REQUEST`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PortStats {
    pub port: u32,
    pub rx_packets: u64,
    pub tx_packets: u64,
    pub rx_bytes: u64,
    pub tx_bytes: u64,
    pub rx_dropped: u64,
    pub tx_dropped: u64,
    pub rx_errors: u64,
    pub tx_errors: u64,
}

/// One port's static description, reported by `PORT_DESC_STATS_REQUEST`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PortDesc {
    pub port: u32,
    pub name: String,
    pub hw_addr: [u8; 6],
    pub curr_features: u32,
}

/// One configured queue, reported by `QUEUE_GET_CONFIG_REQUEST`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueConfig {
    pub port: u32,
    pub queue_id: u32,
    pub min_rate: u16,
    pub max_rate: u16,
}

/// Per-queue counters reported by `QUEUE_STATS_REQUEST`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueStats {
    pub port: u32,
    pub queue_id: u32,
    pub tx_bytes: u64,
    pub tx_packets: u64,
    pub tx_errors: u64,
}

/// One entry in a `FLOW_STATS_REPLY`, assembled from a `FlowEntry` plus its live counters.
#[derive(Debug, Clone)]
pub struct FlowStatsEntry {
    pub table_id: u8,
    pub priority: u16,
    pub cookie: u64,
    pub idle_timeout: u16,
    pub hard_timeout: u16,
    pub duration_sec: u32,
    pub duration_nsec: u32,
    pub packet_count: u64,
    pub byte_count: u64,
    pub effects: Effects,
}

/// Wire-budget cap on a single `FLOW_STATS_REPLY` body.
pub const MAX_STATS_REPLY_BYTES: usize = 32 * 1024;

/// Estimated wire footprint of one flow-stats entry: the fixed `ofp_flow_stats` header plus a
/// conservative per-match-field and per-effect-item allowance. The wire codec computes the exact
/// figure when it serializes; this estimate only needs to be a safe upper bound so the core never
/// overshoots the cap before handing off to the codec.
fn estimate_entry_bytes(entry: &FlowStatsEntry, match_field_count: usize) -> usize {
    const FIXED_HEADER: usize = 56;
    const PER_MATCH_FIELD: usize = 16;
    const PER_EFFECT_ITEM: usize = 16;
    let effect_items = match &entry.effects {
        Effects::Actions { actions, .. } => actions.len(),
        Effects::Instructions { instructions, .. } => instructions.len(),
    };
    FIXED_HEADER + match_field_count * PER_MATCH_FIELD + effect_items * PER_EFFECT_ITEM
}

fn build_flow_stats_entry(entry: &FlowEntry, live: FlowLiveStats, now_ms: u64) -> FlowStatsEntry {
    let (duration_sec, duration_nsec) = entry.duration_since(now_ms);
    FlowStatsEntry {
        table_id: entry.table_id,
        priority: entry.priority,
        cookie: entry.cookie,
        idle_timeout: entry.idle_timeout,
        hard_timeout: entry.hard_timeout,
        duration_sec,
        duration_nsec,
        packet_count: live.packet_count,
        byte_count: live.byte_count,
        effects: entry.effects.clone(),
    }
}

/// The `IterationCallback` driving a streaming `FLOW_STATS_REQUEST`.
pub struct FlowStatsCallback<'a, F, C> {
    fwd: &'a F,
    cxn: &'a mut C,
    cxn_id: u32,
    xid: Xid,
    request_version: Ver,
    now_ms: u64,
    pending: Vec<FlowStatsEntry>,
    pending_bytes: usize,
}

impl<'a, F: Forwarding, C: Connection> FlowStatsCallback<'a, F, C> {
    pub fn new(fwd: &'a F, cxn: &'a mut C, cxn_id: u32, xid: Xid, request_version: Ver, now_ms: u64) -> Self {
        FlowStatsCallback {
            fwd,
            cxn,
            cxn_id,
            xid,
            request_version,
            now_ms,
            pending: Vec::new(),
            pending_bytes: 0,
        }
    }

    /// Send the accumulated segment. The terminal call (`more = false`) always sends, even with
    /// an empty `pending` list, so a request matching nothing still clears the `more` flag on a
    /// reply the controller can pair with its xid.
    fn flush(&mut self, more: bool) {
        let entries = std::mem::take(&mut self.pending);
        self.pending_bytes = 0;
        let _ = self.cxn.send(
            self.cxn_id,
            Reply::FlowStats {
                xid: self.xid,
                more,
                entries,
            },
        );
    }
}

impl<'a, F: Forwarding, C: Connection> IterationCallback for FlowStatsCallback<'a, F, C> {
    fn on_step(&mut self, step: Step, _ft: &mut FlowTable) {
        match step {
            Step::Matched(entry) => {
                // skip entries installed under a different wire version.
                if entry.effects.version() != self.request_version {
                    return;
                }
                let live = self.fwd.flow_stats_get(entry.id).unwrap_or_default();
                let field_count = entry.m.fields().len();
                let stats_entry = build_flow_stats_entry(&entry, live, self.now_ms);
                let entry_bytes = estimate_entry_bytes(&stats_entry, field_count);
                if self.pending_bytes + entry_bytes > MAX_STATS_REPLY_BYTES && !self.pending.is_empty() {
                    self.flush(true);
                }
                self.pending_bytes += entry_bytes;
                self.pending.push(stats_entry);
            }
            Step::Done => self.flush(false),
        }
    }
}

/// The `IterationCallback` driving an `AGGREGATE_STATS_REQUEST`.
pub struct AggregateStatsCallback<'a, F, C> {
    fwd: &'a F,
    cxn: &'a mut C,
    cxn_id: u32,
    xid: Xid,
    packet_count: u64,
    byte_count: u64,
    flow_count: u32,
}

impl<'a, F: Forwarding, C: Connection> AggregateStatsCallback<'a, F, C> {
    pub fn new(fwd: &'a F, cxn: &'a mut C, cxn_id: u32, xid: Xid) -> Self {
        AggregateStatsCallback {
            fwd,
            cxn,
            cxn_id,
            xid,
            packet_count: 0,
            byte_count: 0,
            flow_count: 0,
        }
    }
}

impl<'a, F: Forwarding, C: Connection> IterationCallback for AggregateStatsCallback<'a, F, C> {
    fn on_step(&mut self, step: Step, _ft: &mut FlowTable) {
        match step {
            Step::Matched(entry) => {
                let live = self.fwd.flow_stats_get(entry.id).unwrap_or_default();
                self.packet_count += live.packet_count;
                self.byte_count += live.byte_count;
                self.flow_count += 1;
            }
            Step::Done => {
                let _ = self.cxn.send(
                    self.cxn_id,
                    Reply::AggregateStats {
                        xid: self.xid,
                        packet_count: self.packet_count,
                        byte_count: self.byte_count,
                        flow_count: self.flow_count,
                    },
                );
            }
        }
    }
}

/// `TABLE_STATS_REQUEST`: synchronous, delegates to FWD.
pub fn table_stats_request<F: Forwarding, C: Connection>(
    fwd: &F,
    cxn: &mut C,
    cxn_id: u32,
    xid: Xid,
) -> crate::error::Result<()> {
    let tables = fwd.table_stats_get()?;
    cxn.send(cxn_id, Reply::TableStats { xid, tables })
}

/// `PORT_STATS_REQUEST`: synchronous, delegates to PORT.
pub fn port_stats_request<P: crate::collab::PortManager, C: Connection>(
    port_mgr: &P,
    cxn: &mut C,
    cxn_id: u32,
    xid: Xid,
    port: PortNumber,
) -> crate::error::Result<()> {
    let ports = port_mgr.stats_get(port)?;
    cxn.send(cxn_id, Reply::PortStats { xid, ports })
}

/// `QUEUE_GET_CONFIG_REQUEST` — this path reads the
/// queue-config request's own port field, never a sibling queue-stats request's `queue_id`.
pub fn queue_config_request<P: crate::collab::PortManager, C: Connection>(
    port_mgr: &P,
    cxn: &mut C,
    cxn_id: u32,
    xid: Xid,
    port: PortNumber,
) -> crate::error::Result<()> {
    let queues = port_mgr.queue_config_get(port)?;
    cxn.send(cxn_id, Reply::QueueConfig { xid, queues })
}

/// `QUEUE_STATS_REQUEST`.
pub fn queue_stats_request<P: crate::collab::PortManager, C: Connection>(
    port_mgr: &P,
    cxn: &mut C,
    cxn_id: u32,
    xid: Xid,
    port: PortNumber,
    queue_id: u32,
) -> crate::error::Result<()> {
    let queues = port_mgr.queue_stats_get(port, queue_id)?;
    cxn.send(cxn_id, Reply::QueueStats { xid, queues })
}

/// `DESC_STATS_REQUEST`: reads the static config, no collaborator call.
pub fn desc_stats_request<C: Connection>(
    desc: crate::config::DescStats,
    cxn: &mut C,
    cxn_id: u32,
    xid: Xid,
) -> crate::error::Result<()> {
    cxn.send(cxn_id, Reply::DescStats { xid, desc })
}

/// `PORT_DESC_STATS_REQUEST` (OpenFlow 1.3's multipart variant of `FEATURES_REPLY`'s port list).
pub fn port_desc_stats_request<P: crate::collab::PortManager, C: Connection>(
    port_mgr: &P,
    cxn: &mut C,
    cxn_id: u32,
    xid: Xid,
) -> crate::error::Result<()> {
    let ports = port_mgr.desc_stats_get();
    cxn.send(cxn_id, Reply::PortDescStats { xid, ports })
}

/// Builds the `NON_STRICT` query a `FLOW_STATS_REQUEST`/`AGGREGATE_STATS_REQUEST` scans with,
/// honoring the message's table/match/out-port/cookie filters the same way a flow-mod's query
/// does.
pub fn build_stats_query(req: &crate::messages::FlowStatsRequestMsg) -> MatchQuery {
    let mut q = MatchQuery::new(crate::match_query::MatchMode::NonStrict);
    q.table_id = req.table_id;
    q.m = req.m.clone();
    q.out_port = req.out_port;
    q.cookie = req.cookie;
    q.cookie_mask = req.cookie_mask;
    q
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::effects::Effects;
    use crate::flow_entry::FlowModFlags;
    use crate::ids::FlowId;
    use crate::matchfield::Match;

    fn entry(version: Ver, insert_time_ms: u64) -> FlowEntry {
        FlowEntry {
            id: FlowId::INVALID,
            table_id: 0,
            priority: 0,
            m: Match::new(),
            cookie: 0,
            idle_timeout: 0,
            hard_timeout: 0,
            flags: FlowModFlags::default(),
            effects: Effects::Actions {
                actions: vec![],
                version,
            },
            insert_time_ms,
        }
    }

    struct StubFwd;
    impl Forwarding for StubFwd {
        fn dpid(&self) -> u64 {
            1
        }
        fn packet_out(&mut self, _msg: &crate::messages::PacketOutMsg) -> crate::error::Result<()> {
            Ok(())
        }
        fn flow_create(&mut self, _flow_id: FlowId, _msg: &crate::messages::FlowModMsg) -> crate::error::Result<u8> {
            Ok(0)
        }
        fn flow_modify(&mut self, _flow_id: FlowId, _msg: &crate::messages::FlowModMsg) -> crate::error::Result<()> {
            Ok(())
        }
        fn flow_delete(&mut self, _flow_id: FlowId) -> crate::error::Result<crate::collab::FlowFinalStats> {
            Ok(crate::collab::FlowFinalStats::default())
        }
        fn flow_stats_get(&self, _flow_id: FlowId) -> crate::error::Result<FlowLiveStats> {
            Ok(FlowLiveStats {
                packet_count: 10,
                byte_count: 1000,
            })
        }
        fn table_stats_get(&self) -> crate::error::Result<Vec<TableStats>> {
            Ok(vec![])
        }
        fn forwarding_features_get(&self) -> crate::collab::ForwardingFeatures {
            crate::collab::ForwardingFeatures::default()
        }
        fn experimenter(&mut self, _msg: &crate::messages::ExperimenterMsg) -> crate::error::Result<()> {
            Ok(())
        }
    }

    struct RecordingCxn {
        replies: Vec<Reply>,
    }
    impl Connection for RecordingCxn {
        fn send(&mut self, _cxn_id: u32, reply: Reply) -> crate::error::Result<()> {
            self.replies.push(reply);
            Ok(())
        }
        fn send_error(&mut self, _cxn_id: u32, _error: crate::wire_error::WireError) {}
    }

    #[test]
    fn version_mismatch_is_skipped_not_delivered() {
        let fwd = StubFwd;
        let mut ft = FlowTable::new();
        let mut cxn = RecordingCxn { replies: vec![] };
        let mut cb = FlowStatsCallback::new(&fwd, &mut cxn, 1, Xid::new(7), Ver::V1_3, 5000);
        let e10 = entry(Ver::V1_0, 0);
        let e13 = entry(Ver::V1_3, 0);
        cb.on_step(Step::Matched(e10), &mut ft);
        cb.on_step(Step::Matched(e13), &mut ft);
        cb.on_step(Step::Done, &mut ft);
        drop(cb);
        assert_eq!(cxn.replies.len(), 1);
        match &cxn.replies[0] {
            Reply::FlowStats { entries, more, xid } => {
                assert_eq!(entries.len(), 1);
                assert!(!more);
                assert_eq!(*xid, Xid::new(7));
            }
            _ => panic!("expected FlowStats reply"),
        }
    }

    #[test]
    fn terminal_step_clears_more_flag() {
        let fwd = StubFwd;
        let mut ft = FlowTable::new();
        let mut cxn = RecordingCxn { replies: vec![] };
        let mut cb = FlowStatsCallback::new(&fwd, &mut cxn, 1, Xid::new(1), Ver::V1_0, 0);
        let e = entry(Ver::V1_0, 0);
        cb.on_step(Step::Matched(e), &mut ft);
        cb.on_step(Step::Done, &mut ft);
        drop(cb);
        match &cxn.replies.last().unwrap() {
            Reply::FlowStats { more, .. } => assert!(!more),
            _ => panic!("expected FlowStats reply"),
        }
    }

    #[test]
    fn aggregate_sums_matched_entries() {
        let fwd = StubFwd;
        let mut ft = FlowTable::new();
        let mut cxn = RecordingCxn { replies: vec![] };
        let mut cb = AggregateStatsCallback::new(&fwd, &mut cxn, 1, Xid::new(3));
        let e = entry(Ver::V1_0, 0);
        cb.on_step(Step::Matched(e.clone()), &mut ft);
        cb.on_step(Step::Matched(e), &mut ft);
        cb.on_step(Step::Done, &mut ft);
        drop(cb);
        match &cxn.replies[0] {
            Reply::AggregateStats {
                packet_count,
                byte_count,
                flow_count,
                ..
            } => {
                assert_eq!(*packet_count, 20);
                assert_eq!(*byte_count, 2000);
                assert_eq!(*flow_count, 2);
            }
            _ => panic!("expected AggregateStats reply"),
        }
    }

    #[test]
    fn empty_match_produces_single_empty_reply() {
        let fwd = StubFwd;
        let mut ft = FlowTable::new();
        let mut cxn = RecordingCxn { replies: vec![] };
        let mut cb = FlowStatsCallback::new(&fwd, &mut cxn, 1, Xid::new(9), Ver::V1_0, 0);
        cb.on_step(Step::Done, &mut ft);
        drop(cb);
        assert_eq!(cxn.replies.len(), 1);
        match &cxn.replies[0] {
            Reply::FlowStats { entries, more, .. } => {
                assert!(entries.is_empty());
                assert!(!more);
            }
            _ => panic!("expected FlowStats reply"),
        }
    }
}
