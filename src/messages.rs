//! Decoded inbound controller messages.
//!
//! `little-dude-ofpkt`'s `packets::openflow::Packet` models a message as a byte buffer wrapper
//! with field accessors backed by the wire codec. Wire decode/encode is an explicit external
//! collaborator for this core, so `InboundMessage` instead models an
//! *already-decoded* message: a `Header` plus a `MessagePayload` the dispatcher switches on.
//!
//! `InboundMessage` carries its single-ownership discipline structurally: it is a plain owned
//! value moved into whichever handler processes it, and `Drop` is the one release point. There
//! is no separate "free" call to forget or double-call — the borrow checker rules out aliasing
//! the message across the synchronous and spawned-task paths. Tests that want to *observe* the
//! release can attach a counter via `InboundMessage::with_release_probe`.

use crate::effects::{Action, Effects};
use crate::flow_entry::FlowModFlags;
use crate::ids::Xid;
use crate::matchfield::Match;
use crate::port::PortNumber;
use crate::version::Ver;

#[derive(Debug, Clone, Copy)]
pub struct Header {
    pub xid: Xid,
    pub version: Ver,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowModCommand {
    Add,
    Modify,
    ModifyStrict,
    Delete,
    DeleteStrict,
}

#[derive(Debug, Clone)]
pub struct FlowModMsg {
    pub command: FlowModCommand,
    pub table_id: u8,
    pub m: Match,
    pub priority: u16,
    pub out_port: Option<PortNumber>,
    pub cookie: u64,
    pub cookie_mask: u64,
    pub flags: FlowModFlags,
    pub idle_timeout: u16,
    pub hard_timeout: u16,
    pub effects: Effects,
}

#[derive(Debug, Clone)]
pub struct PacketOutMsg {
    pub buffer_id: Option<u32>,
    pub in_port: PortNumber,
    pub actions: Vec<Action>,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct PortModMsg {
    pub port: PortNumber,
    pub hw_addr: [u8; 6],
    pub config: u32,
    pub mask: u32,
    pub advertise: u32,
}

#[derive(Debug, Clone)]
pub struct ExperimenterMsg {
    pub experimenter_id: u32,
    pub exp_type: u32,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, Copy)]
pub struct SetConfigMsg {
    pub flags: u16,
    pub miss_send_len: u16,
}

#[derive(Debug, Clone, Copy)]
pub struct TableModMsg {
    pub table_id: u8,
    pub config: u32,
}

/// Shared shape of `FLOW_STATS_REQUEST` and `AGGREGATE_STATS_REQUEST`: both
/// carry a match query over the flow table.
#[derive(Debug, Clone)]
pub struct FlowStatsRequestMsg {
    pub table_id: u8,
    pub m: Match,
    pub out_port: Option<PortNumber>,
    pub cookie: u64,
    pub cookie_mask: u64,
}

#[derive(Debug, Clone)]
pub enum MessagePayload {
    Hello,
    EchoReply,
    SetConfig(SetConfigMsg),
    GetConfigRequest,
    FeaturesRequest,
    TableMod(TableModMsg),
    PacketOut(PacketOutMsg),
    PortMod(PortModMsg),
    Experimenter(ExperimenterMsg),
    ExperimenterStatsRequest,
    FlowMod(FlowModMsg),
    FlowStatsRequest(FlowStatsRequestMsg),
    AggregateStatsRequest(FlowStatsRequestMsg),
    TableStatsRequest,
    PortStatsRequest { port: PortNumber },
    QueueStatsRequest { port: PortNumber, queue_id: u32 },
    QueueConfigRequest { port: PortNumber },
    DescStatsRequest,
    PortDescStatsRequest,
    BsnSetIpMask { index: u8, mask: u32 },
    BsnGetIpMaskRequest { index: u8 },
    BsnHybridGetRequest,
    /// Any message type this core does not implement a handler for.
    Unhandled,
}

impl MessagePayload {
    /// A stable name for structured logging, independent of `Debug`'s field dump.
    pub fn kind_name(&self) -> &'static str {
        match self {
            MessagePayload::Hello => "hello",
            MessagePayload::EchoReply => "echo_reply",
            MessagePayload::SetConfig(_) => "set_config",
            MessagePayload::GetConfigRequest => "get_config_request",
            MessagePayload::FeaturesRequest => "features_request",
            MessagePayload::TableMod(_) => "table_mod",
            MessagePayload::PacketOut(_) => "packet_out",
            MessagePayload::PortMod(_) => "port_mod",
            MessagePayload::Experimenter(_) => "experimenter",
            MessagePayload::ExperimenterStatsRequest => "experimenter_stats_request",
            MessagePayload::FlowMod(_) => "flow_mod",
            MessagePayload::FlowStatsRequest(_) => "flow_stats_request",
            MessagePayload::AggregateStatsRequest(_) => "aggregate_stats_request",
            MessagePayload::TableStatsRequest => "table_stats_request",
            MessagePayload::PortStatsRequest { .. } => "port_stats_request",
            MessagePayload::QueueStatsRequest { .. } => "queue_stats_request",
            MessagePayload::QueueConfigRequest { .. } => "queue_config_request",
            MessagePayload::DescStatsRequest => "desc_stats_request",
            MessagePayload::PortDescStatsRequest => "port_desc_stats_request",
            MessagePayload::BsnSetIpMask { .. } => "bsn_set_ip_mask",
            MessagePayload::BsnGetIpMaskRequest { .. } => "bsn_get_ip_mask_request",
            MessagePayload::BsnHybridGetRequest => "bsn_hybrid_get_request",
            MessagePayload::Unhandled => "unhandled",
        }
    }
}

/// An inbound, already-decoded controller message, owned exclusively by whoever holds it.
pub struct InboundMessage {
    pub header: Header,
    pub payload: MessagePayload,
    release_probe: Option<std::rc::Rc<std::cell::Cell<u32>>>,
}

impl InboundMessage {
    pub fn new(header: Header, payload: MessagePayload) -> Self {
        InboundMessage {
            header,
            payload,
            release_probe: None,
        }
    }

    /// Attach a counter incremented exactly once, on `Drop`. Test-only: production handlers rely
    /// on ordinary ownership, never on counting releases.
    pub fn with_release_probe(header: Header, payload: MessagePayload, probe: std::rc::Rc<std::cell::Cell<u32>>) -> Self {
        InboundMessage {
            header,
            payload,
            release_probe: Some(probe),
        }
    }
}

impl Drop for InboundMessage {
    fn drop(&mut self) {
        if let Some(probe) = &self.release_probe {
            probe.set(probe.get() + 1);
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn dropping_an_inbound_message_releases_it_exactly_once() {
        let probe = Rc::new(Cell::new(0));
        {
            let _msg = InboundMessage::with_release_probe(
                Header {
                    xid: Xid::new(1),
                    version: Ver::V1_0,
                },
                MessagePayload::Hello,
                probe.clone(),
            );
        }
        assert_eq!(probe.get(), 1);
    }

    #[test]
    fn moving_ownership_into_a_task_does_not_double_release() {
        let probe = Rc::new(Cell::new(0));
        let msg = InboundMessage::with_release_probe(
            Header {
                xid: Xid::new(1),
                version: Ver::V1_0,
            },
            MessagePayload::Hello,
            probe.clone(),
        );
        // simulate transferring ownership into a spawned task's state struct
        let boxed: Box<InboundMessage> = Box::new(msg);
        drop(boxed);
        assert_eq!(probe.get(), 1);
    }
}
