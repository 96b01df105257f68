//! Message dispatcher: routes a decoded `InboundMessage` to its handler, or to the
//! unhandled-message path for anything this core does not implement.
//!
//! `fwd` and `cxn` are `Rc<RefCell<_>>` here rather than plain `&mut` references because a
//! non-strict flow-mod (`flow_mod::dispatch_flow_mod`) may hand one off to a spawned
//! `IterationTask` that outlives this call. `port` never crosses that
//! boundary, so it stays a plain `&mut P`.

use std::cell::RefCell;
use std::rc::Rc;

use tracing::debug;

use crate::collab::{Connection, Forwarding, PortManager, Scheduler};
use crate::config::SwitchConfig;
use crate::error::Result;
use crate::error_encoder;
use crate::flow_table::FlowTable;
use crate::ids::{FlowIdAllocator, Xid, XidAllocator};
use crate::ip_mask_table::IpMaskTable;
use crate::iteration::{CooperativeTask, IterationTask};
use crate::messages::{InboundMessage, MessagePayload};
use crate::{bsn, config_handlers, flow_mod, stats};

/// Every message type this core does not implement a handler for: reply with
/// `BAD_REQUEST/BAD_TYPE` and otherwise change nothing.
pub fn unhandled<C: Connection>(cxn: &mut C, cxn_id: u32, xid: Xid) {
    cxn.send_error(cxn_id, error_encoder::encode_bad_type(xid));
}

/// Drives an `IterationTask` built from a borrowed callback to completion within this call.
/// `FlowStatsCallback`/`AggregateStatsCallback` borrow FWD and CXN for their whole lifetime, so
/// (unlike flow-mod's non-strict paths, which persist across scheduler slices via `Rc<RefCell<_>>`
/// and so register with `Scheduler::spawn_iter_task`) they cannot be boxed as `'static` — a stats
/// reply completes in a single dispatch call instead of yielding mid-scan.
fn run_to_completion<CB: crate::iteration::IterationCallback>(mut task: IterationTask<CB>, ft: &mut FlowTable) {
    loop {
        if task.run_slice(ft, &mut || false) {
            return;
        }
    }
}

/// Top-level dispatch entry point. Consumes `msg`; its `Drop` impl is the single release point
/// regardless of which arm runs.
#[allow(clippy::too_many_arguments)]
pub fn dispatch<F, P, C, S>(
    mut msg: InboundMessage,
    ft: &mut FlowTable,
    cfg: &mut SwitchConfig,
    ip_masks: &mut IpMaskTable,
    fwd: Rc<RefCell<F>>,
    port: &mut P,
    cxn: Rc<RefCell<C>>,
    scheduler: &mut S,
    flow_alloc: Rc<FlowIdAllocator>,
    xid_alloc: Rc<XidAllocator>,
    cxn_id: u32,
    now_ms: u64,
) -> Result<()>
where
    F: Forwarding + 'static,
    P: PortManager,
    C: Connection + 'static,
    S: Scheduler,
{
    let header = msg.header;
    let xid = header.xid;
    let span = tracing::info_span!("dispatch", cxn_id, xid = xid.get(), version = ?header.version);
    let _enter = span.enter();
    debug!(payload = msg.payload.kind_name(), "dispatching message");
    let payload = std::mem::replace(&mut msg.payload, MessagePayload::Hello);
    match payload {
        MessagePayload::Hello => config_handlers::hello(&header),
        MessagePayload::EchoReply => config_handlers::echo_reply(&header),
        MessagePayload::SetConfig(set_config) => config_handlers::set_config(cfg, set_config),
        MessagePayload::GetConfigRequest => config_handlers::get_config(cfg, &mut *cxn.borrow_mut(), cxn_id, xid)?,
        MessagePayload::FeaturesRequest => {
            config_handlers::features_request(&*fwd.borrow(), port, &mut *cxn.borrow_mut(), cxn_id, xid)?
        }
        MessagePayload::TableMod(table_mod) => config_handlers::table_mod(&mut *fwd.borrow_mut(), table_mod)?,
        MessagePayload::PacketOut(packet_out) => config_handlers::packet_out(&mut *fwd.borrow_mut(), &packet_out)?,
        MessagePayload::PortMod(port_mod) => {
            config_handlers::port_mod(port, &mut *cxn.borrow_mut(), cxn_id, &header, port_mod)?
        }
        MessagePayload::Experimenter(experimenter) => config_handlers::experimenter(
            &mut *fwd.borrow_mut(),
            port,
            &mut *cxn.borrow_mut(),
            cxn_id,
            &header,
            &experimenter,
        ),
        MessagePayload::ExperimenterStatsRequest => {
            // This core never decodes the experimenter payload for the stats-request variant, so
            // it is always reported unsupported the same way a plain EXPERIMENTER is.
            let empty = crate::messages::ExperimenterMsg {
                experimenter_id: 0,
                exp_type: 0,
                data: vec![],
            };
            config_handlers::experimenter_stats_request(
                &mut *fwd.borrow_mut(),
                port,
                &mut *cxn.borrow_mut(),
                cxn_id,
                &header,
                &empty,
            )
        }
        MessagePayload::FlowMod(flow_mod_msg) => {
            if let Some(task) =
                flow_mod::dispatch_flow_mod(ft, fwd, cxn, flow_alloc, xid_alloc, header, flow_mod_msg, cxn_id, now_ms)?
            {
                let _ = scheduler.spawn_iter_task(Box::new(task));
            }
        }
        MessagePayload::FlowStatsRequest(req) => {
            let query = stats::build_stats_query(&req);
            let snapshot = ft.snapshot_matching(&query);
            let fwd_ref = fwd.borrow();
            let mut cxn_ref = cxn.borrow_mut();
            let callback = stats::FlowStatsCallback::new(&*fwd_ref, &mut *cxn_ref, cxn_id, xid, header.version, now_ms);
            run_to_completion(IterationTask::new(snapshot, callback), ft);
        }
        MessagePayload::AggregateStatsRequest(req) => {
            let query = stats::build_stats_query(&req);
            let snapshot = ft.snapshot_matching(&query);
            let fwd_ref = fwd.borrow();
            let mut cxn_ref = cxn.borrow_mut();
            let callback = stats::AggregateStatsCallback::new(&*fwd_ref, &mut *cxn_ref, cxn_id, xid);
            run_to_completion(IterationTask::new(snapshot, callback), ft);
        }
        MessagePayload::TableStatsRequest => stats::table_stats_request(&*fwd.borrow(), &mut *cxn.borrow_mut(), cxn_id, xid)?,
        MessagePayload::PortStatsRequest { port: p } => {
            stats::port_stats_request(port, &mut *cxn.borrow_mut(), cxn_id, xid, p)?
        }
        MessagePayload::QueueStatsRequest { port: p, queue_id } => {
            stats::queue_stats_request(port, &mut *cxn.borrow_mut(), cxn_id, xid, p, queue_id)?
        }
        MessagePayload::QueueConfigRequest { port: p } => {
            stats::queue_config_request(port, &mut *cxn.borrow_mut(), cxn_id, xid, p)?
        }
        MessagePayload::DescStatsRequest => stats::desc_stats_request(cfg.desc.clone(), &mut *cxn.borrow_mut(), cxn_id, xid)?,
        MessagePayload::PortDescStatsRequest => stats::port_desc_stats_request(port, &mut *cxn.borrow_mut(), cxn_id, xid)?,
        MessagePayload::BsnSetIpMask { index, mask } => bsn::bsn_set_ip_mask(ip_masks, index, mask),
        MessagePayload::BsnGetIpMaskRequest { index } => {
            bsn::bsn_get_ip_mask_request(ip_masks, &mut *cxn.borrow_mut(), cxn_id, xid, index)?
        }
        MessagePayload::BsnHybridGetRequest => bsn::bsn_hybrid_get_request(&mut *cxn.borrow_mut(), cxn_id, xid)?,
        MessagePayload::Unhandled => unhandled(&mut *cxn.borrow_mut(), cxn_id, xid),
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::collab::{FlowFinalStats, FlowLiveStats, ForwardingFeatures, Reply};
    use crate::effects::{Action, Effects};
    use crate::error::OfsmError;
    use crate::flow_entry::FlowModFlags;
    use crate::ids::FlowId;
    use crate::matchfield::{FlowMatchField, Masked, Match};
    use crate::messages::{FlowModCommand, FlowModMsg, Header, PacketOutMsg, PortModMsg};
    use crate::port::PortNumber;
    use crate::version::Ver;
    use crate::wire_error::{Kind, WireError};

    #[derive(Default)]
    struct StubFwd;
    impl Forwarding for StubFwd {
        fn dpid(&self) -> u64 {
            7
        }
        fn packet_out(&mut self, _msg: &PacketOutMsg) -> Result<()> {
            Ok(())
        }
        fn flow_create(&mut self, _flow_id: FlowId, _msg: &FlowModMsg) -> Result<u8> {
            Ok(0)
        }
        fn flow_modify(&mut self, _flow_id: FlowId, _msg: &FlowModMsg) -> Result<()> {
            Ok(())
        }
        fn flow_delete(&mut self, _flow_id: FlowId) -> Result<FlowFinalStats> {
            Ok(FlowFinalStats::default())
        }
        fn flow_stats_get(&self, _flow_id: FlowId) -> Result<FlowLiveStats> {
            Ok(FlowLiveStats::default())
        }
        fn table_stats_get(&self) -> Result<Vec<crate::stats::TableStats>> {
            Ok(vec![])
        }
        fn forwarding_features_get(&self) -> ForwardingFeatures {
            ForwardingFeatures { capabilities: 0xaa }
        }
        fn experimenter(&mut self, _msg: &crate::messages::ExperimenterMsg) -> Result<()> {
            Err(OfsmError::NotSupported)
        }
    }

    #[derive(Default)]
    struct StubPort;
    impl PortManager for StubPort {
        fn modify(&mut self, _msg: &PortModMsg) -> Result<()> {
            Ok(())
        }
        fn stats_get(&self, _port: PortNumber) -> Result<Vec<crate::stats::PortStats>> {
            Ok(vec![])
        }
        fn queue_config_get(&self, _port: PortNumber) -> Result<Vec<crate::stats::QueueConfig>> {
            Ok(vec![])
        }
        fn queue_stats_get(&self, _port: PortNumber, _queue_id: u32) -> Result<Vec<crate::stats::QueueStats>> {
            Ok(vec![])
        }
        fn desc_stats_get(&self) -> Vec<crate::stats::PortDesc> {
            vec![]
        }
        fn features_get(&self) -> u32 {
            0x55
        }
        fn experimenter(&mut self, _msg: &crate::messages::ExperimenterMsg) -> Result<()> {
            Err(OfsmError::NotSupported)
        }
    }

    #[derive(Default)]
    struct RecordingCxn {
        replies: Vec<Reply>,
        errors: Vec<WireError>,
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

    #[derive(Default)]
    struct NoopScheduler;
    impl Scheduler for NoopScheduler {
        fn spawn_iter_task(&mut self, _task: Box<dyn CooperativeTask>) -> Result<()> {
            Ok(())
        }
        fn should_yield(&self) -> bool {
            false
        }
        fn current_time_ms(&self) -> u64 {
            42
        }
    }

    fn header(ver: Ver, xid: u32) -> Header {
        Header { xid: Xid::new(xid), version: ver }
    }

    #[allow(clippy::too_many_arguments)]
    fn run(
        msg: InboundMessage,
        ft: &mut FlowTable,
        cfg: &mut SwitchConfig,
        ip_masks: &mut IpMaskTable,
        fwd: Rc<RefCell<StubFwd>>,
        port: &mut StubPort,
        cxn: Rc<RefCell<RecordingCxn>>,
        scheduler: &mut NoopScheduler,
    ) {
        dispatch(
            msg,
            ft,
            cfg,
            ip_masks,
            fwd,
            port,
            cxn,
            scheduler,
            Rc::new(FlowIdAllocator::new()),
            Rc::new(XidAllocator::new()),
            1,
            0,
        )
        .unwrap();
    }

    fn add_msg() -> FlowModMsg {
        FlowModMsg {
            command: FlowModCommand::Add,
            table_id: 0,
            m: Match::new().with_field(FlowMatchField::InPort(Masked::exact(1))),
            priority: 10,
            out_port: None,
            cookie: 0,
            cookie_mask: 0,
            flags: FlowModFlags::default(),
            idle_timeout: 0,
            hard_timeout: 0,
            effects: Effects::Actions {
                actions: vec![Action::Output(PortNumber::Regular(2))],
                version: Ver::V1_0,
            },
        }
    }

    #[test]
    fn flow_mod_add_inserts_entry_synchronously() {
        let mut ft = FlowTable::new();
        let mut cfg = SwitchConfig::default();
        let mut ip_masks = IpMaskTable::new();
        let mut port = StubPort;
        let fwd = Rc::new(RefCell::new(StubFwd));
        let cxn = Rc::new(RefCell::new(RecordingCxn::default()));
        let mut scheduler = NoopScheduler;

        let msg = InboundMessage::new(header(Ver::V1_0, 1), MessagePayload::FlowMod(add_msg()));
        run(msg, &mut ft, &mut cfg, &mut ip_masks, fwd, &mut port, cxn, &mut scheduler);
        assert_eq!(ft.len(), 1);
    }

    #[test]
    fn hello_and_echo_reply_are_no_ops() {
        let mut ft = FlowTable::new();
        let mut cfg = SwitchConfig::default();
        let mut ip_masks = IpMaskTable::new();
        let mut port = StubPort;
        let fwd = Rc::new(RefCell::new(StubFwd));
        let cxn = Rc::new(RefCell::new(RecordingCxn::default()));
        let mut scheduler = NoopScheduler;

        let hello = InboundMessage::new(header(Ver::V1_3, 1), MessagePayload::Hello);
        run(
            hello,
            &mut ft,
            &mut cfg,
            &mut ip_masks,
            fwd.clone(),
            &mut port,
            cxn.clone(),
            &mut scheduler,
        );
        let echo = InboundMessage::new(header(Ver::V1_3, 2), MessagePayload::EchoReply);
        run(echo, &mut ft, &mut cfg, &mut ip_masks, fwd, &mut port, cxn.clone(), &mut scheduler);
        assert!(cxn.borrow().replies.is_empty());
        assert!(cxn.borrow().errors.is_empty());
    }

    #[test]
    fn unhandled_message_reports_bad_type() {
        let mut ft = FlowTable::new();
        let mut cfg = SwitchConfig::default();
        let mut ip_masks = IpMaskTable::new();
        let mut port = StubPort;
        let fwd = Rc::new(RefCell::new(StubFwd));
        let cxn = Rc::new(RefCell::new(RecordingCxn::default()));
        let mut scheduler = NoopScheduler;

        let msg = InboundMessage::new(header(Ver::V1_3, 9), MessagePayload::Unhandled);
        run(msg, &mut ft, &mut cfg, &mut ip_masks, fwd, &mut port, cxn.clone(), &mut scheduler);
        assert_eq!(cxn.borrow().errors.len(), 1);
        assert_eq!(cxn.borrow().errors[0].kind, Kind::BadRequest);
    }

    #[test]
    fn flow_stats_request_runs_to_completion_within_dispatch() {
        let mut ft = FlowTable::new();
        let mut cfg = SwitchConfig::default();
        let mut ip_masks = IpMaskTable::new();
        let mut port = StubPort;
        let fwd = Rc::new(RefCell::new(StubFwd));
        let cxn = Rc::new(RefCell::new(RecordingCxn::default()));
        let mut scheduler = NoopScheduler;

        let add = InboundMessage::new(header(Ver::V1_0, 1), MessagePayload::FlowMod(add_msg()));
        run(
            add,
            &mut ft,
            &mut cfg,
            &mut ip_masks,
            fwd.clone(),
            &mut port,
            cxn.clone(),
            &mut scheduler,
        );

        let req = crate::messages::FlowStatsRequestMsg {
            table_id: crate::match_query::TABLE_ANY,
            m: Match::new(),
            out_port: None,
            cookie: 0,
            cookie_mask: 0,
        };
        let stats_req = InboundMessage::new(header(Ver::V1_0, 2), MessagePayload::FlowStatsRequest(req));
        run(stats_req, &mut ft, &mut cfg, &mut ip_masks, fwd, &mut port, cxn.clone(), &mut scheduler);

        assert_eq!(cxn.borrow().replies.len(), 1);
        let cxn_ref = cxn.borrow();
        match &cxn_ref.replies[0] {
            Reply::FlowStats { entries, more, .. } => {
                assert_eq!(entries.len(), 1);
                assert!(!more);
            }
            other => panic!("unexpected reply: {other:?}"),
        }
    }
}
