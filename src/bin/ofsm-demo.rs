//! A small host process wiring `StateManager` to in-memory stub collaborators and replaying a
//! scripted sequence of messages through the dispatcher, logging every reply and wire error it
//! produces. This is the demo binary, not a production switch agent: FWD/PORT/CXN are printf
//! stand-ins for the real forwarding plane, port manager, and controller socket.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use clap::Parser;
use tracing::info;

use ofsm_core::collab::{Connection, FlowFinalStats, FlowLiveStats, Forwarding, ForwardingFeatures, PortManager, Reply};
use ofsm_core::config::SwitchConfig;
use ofsm_core::effects::{Action, Effects};
use ofsm_core::error::Result;
use ofsm_core::flow_entry::FlowModFlags;
use ofsm_core::ids::FlowId;
use ofsm_core::iteration::CooperativeTask;
use ofsm_core::match_query::TABLE_ANY;
use ofsm_core::matchfield::{FlowMatchField, Masked, Match};
use ofsm_core::messages::{
    ExperimenterMsg, FlowModCommand, FlowModMsg, FlowStatsRequestMsg, Header, InboundMessage, MessagePayload, PacketOutMsg,
    PortModMsg,
};
use ofsm_core::port::PortNumber;
use ofsm_core::stats::{PortDesc, PortStats, QueueConfig, QueueStats, TableStats};
use ofsm_core::version::Ver;
use ofsm_core::wire_error::WireError;
use ofsm_core::StateManager;

#[derive(Parser, Debug)]
#[clap(version, about = "Replays a scripted controller session against the OFSM core")]
struct Args {
    /// JSON file populating `SwitchConfig::desc` (mfr_desc, hw_desc, ...). Defaults to built-in
    /// placeholders when omitted.
    #[clap(long)]
    config: Option<PathBuf>,
}

/// FWD stand-in: accepts every flow-mod, keeps no real datapath state beyond remembering which
/// ids exist so `flow_delete` can hand back zeroed final stats.
#[derive(Default)]
struct DemoFwd {
    live: HashMap<FlowId, ()>,
}

impl Forwarding for DemoFwd {
    fn dpid(&self) -> u64 {
        0x00_00_de_ad_be_ef_00_01
    }

    fn packet_out(&mut self, msg: &PacketOutMsg) -> Result<()> {
        info!(in_port = ?msg.in_port, actions = msg.actions.len(), "packet_out");
        Ok(())
    }

    fn flow_create(&mut self, flow_id: FlowId, _msg: &FlowModMsg) -> Result<u8> {
        self.live.insert(flow_id, ());
        Ok(0)
    }

    fn flow_modify(&mut self, flow_id: FlowId, _msg: &FlowModMsg) -> Result<()> {
        self.live.insert(flow_id, ());
        Ok(())
    }

    fn flow_delete(&mut self, flow_id: FlowId) -> Result<FlowFinalStats> {
        self.live.remove(&flow_id);
        Ok(FlowFinalStats::default())
    }

    fn flow_stats_get(&self, _flow_id: FlowId) -> Result<FlowLiveStats> {
        Ok(FlowLiveStats::default())
    }

    fn table_stats_get(&self) -> Result<Vec<TableStats>> {
        Ok(vec![])
    }

    fn forwarding_features_get(&self) -> ForwardingFeatures {
        ForwardingFeatures { capabilities: 0 }
    }

    fn experimenter(&mut self, _msg: &ExperimenterMsg) -> Result<()> {
        Err(ofsm_core::OfsmError::NotSupported)
    }
}

/// PORT stand-in: a single fixed port, always willing to apply `PORT_MOD`.
#[derive(Default)]
struct DemoPort;

impl PortManager for DemoPort {
    fn modify(&mut self, msg: &PortModMsg) -> Result<()> {
        info!(port = ?msg.port, "port_mod applied");
        Ok(())
    }

    fn stats_get(&self, _port: PortNumber) -> Result<Vec<PortStats>> {
        Ok(vec![])
    }

    fn queue_config_get(&self, _port: PortNumber) -> Result<Vec<QueueConfig>> {
        Ok(vec![])
    }

    fn queue_stats_get(&self, _port: PortNumber, _queue_id: u32) -> Result<Vec<QueueStats>> {
        Ok(vec![])
    }

    fn desc_stats_get(&self) -> Vec<PortDesc> {
        vec![]
    }

    fn features_get(&self) -> u32 {
        0
    }

    fn experimenter(&mut self, _msg: &ExperimenterMsg) -> Result<()> {
        Err(ofsm_core::OfsmError::NotSupported)
    }
}

/// CXN stand-in: logs every reply and wire error instead of serializing them onto a socket.
#[derive(Default)]
struct DemoConnection;

impl Connection for DemoConnection {
    fn send(&mut self, cxn_id: u32, reply: Reply) -> Result<()> {
        info!(cxn_id, ?reply, "-> reply");
        Ok(())
    }

    fn send_error(&mut self, cxn_id: u32, error: WireError) {
        info!(cxn_id, ?error, "-> error");
    }
}

/// SOC stand-in: non-strict MODIFY/DELETE tasks are driven into a queue rather than resumed
/// across slices — actually running a spawned task against the live table is an external
/// scheduler concern this core never performs itself (see `collab::Scheduler`), so the demo only
/// reports how many tasks are outstanding.
#[derive(Default)]
struct DemoScheduler {
    spawned: usize,
    now_ms: u64,
}

impl ofsm_core::collab::Scheduler for DemoScheduler {
    fn spawn_iter_task(&mut self, _task: Box<dyn CooperativeTask>) -> Result<()> {
        self.spawned += 1;
        info!(outstanding = self.spawned, "spawned a non-strict iteration task");
        Ok(())
    }

    fn should_yield(&self) -> bool {
        false
    }

    fn current_time_ms(&self) -> u64 {
        self.now_ms
    }
}

fn header(version: Ver, xid: u32) -> Header {
    Header {
        xid: ofsm_core::ids::Xid::new(xid),
        version,
    }
}

fn add_tcp_flow(in_port: u32, priority: u16, out: PortNumber) -> FlowModMsg {
    FlowModMsg {
        command: FlowModCommand::Add,
        table_id: 0,
        m: Match::new()
            .with_field(FlowMatchField::InPort(Masked::exact(in_port)))
            .with_field(FlowMatchField::IpProtocol(Masked::exact(6))),
        priority,
        out_port: None,
        cookie: 0,
        cookie_mask: 0,
        flags: FlowModFlags::default(),
        idle_timeout: 0,
        hard_timeout: 0,
        effects: Effects::Actions {
            actions: vec![Action::Output(out)],
            version: Ver::V1_3,
        },
    }
}

fn main() {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let cfg = match args.config {
        Some(path) => {
            let contents = fs::read_to_string(&path).unwrap_or_else(|err| panic!("{}: {err}", path.display()));
            SwitchConfig::load_from_json(&contents).unwrap_or_else(|err| panic!("{}: {err}", path.display()))
        }
        None => SwitchConfig::default(),
    };

    let mut mgr = StateManager::with_config(DemoFwd::default(), DemoPort, DemoConnection, DemoScheduler::default(), cfg);
    let cxn_id = 1;

    info!("-- HELLO --");
    mgr.handle(InboundMessage::new(header(Ver::V1_3, 1), MessagePayload::Hello), cxn_id)
        .unwrap();

    info!("-- FEATURES_REQUEST --");
    mgr.handle(InboundMessage::new(header(Ver::V1_3, 2), MessagePayload::FeaturesRequest), cxn_id)
        .unwrap();

    info!("-- ADD two flows --");
    mgr.handle(
        InboundMessage::new(header(Ver::V1_3, 3), MessagePayload::FlowMod(add_tcp_flow(1, 100, PortNumber::Regular(2)))),
        cxn_id,
    )
    .unwrap();
    mgr.handle(
        InboundMessage::new(header(Ver::V1_3, 4), MessagePayload::FlowMod(add_tcp_flow(2, 100, PortNumber::Regular(3)))),
        cxn_id,
    )
    .unwrap();

    info!("-- FLOW_STATS_REQUEST --");
    mgr.handle(
        InboundMessage::new(
            header(Ver::V1_3, 5),
            MessagePayload::FlowStatsRequest(FlowStatsRequestMsg {
                table_id: TABLE_ANY,
                m: Match::new(),
                out_port: None,
                cookie: 0,
                cookie_mask: 0,
            }),
        ),
        cxn_id,
    )
    .unwrap();

    info!("-- non-strict DELETE matching every TCP flow regardless of in_port --");
    mgr.handle(
        InboundMessage::new(
            header(Ver::V1_3, 6),
            MessagePayload::FlowMod(FlowModMsg {
                command: FlowModCommand::Delete,
                table_id: 0,
                m: Match::new().with_field(FlowMatchField::IpProtocol(Masked::exact(6))),
                priority: 0,
                out_port: None,
                cookie: 0,
                cookie_mask: 0,
                flags: FlowModFlags::default(),
                idle_timeout: 0,
                hard_timeout: 0,
                effects: Effects::Actions {
                    actions: vec![],
                    version: Ver::V1_3,
                },
            }),
        ),
        cxn_id,
    )
    .unwrap();
    info!(remaining = mgr.flow_table().len(), "flow table after delete");

    info!("-- bad PORT_MOD-like experimenter (both collaborators decline) --");
    mgr.handle(
        InboundMessage::new(
            header(Ver::V1_3, 7),
            MessagePayload::Experimenter(ExperimenterMsg {
                experimenter_id: 0x1234_5678,
                exp_type: 0,
                data: vec![],
            }),
        ),
        cxn_id,
    )
    .unwrap();

    info!("-- unhandled message type --");
    mgr.handle(InboundMessage::new(header(Ver::V1_3, 8), MessagePayload::Unhandled), cxn_id)
        .unwrap();
}
