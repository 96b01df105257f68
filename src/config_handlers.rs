//! Control/config channel handlers: hello, echo, config get/set, features,
//! table-mod, packet-out, port-mod, and the generic experimenter passthrough.

use tracing::warn;

use crate::collab::{Connection, Forwarding, PortManager, Reply};
use crate::config::SwitchConfig;
use crate::error::{OfsmError, Result};
use crate::error_encoder;
use crate::ids::Xid;
use crate::messages::{ExperimenterMsg, Header, PacketOutMsg, PortModMsg, SetConfigMsg, TableModMsg};

/// `HELLO`: nothing to do but note the negotiated version lives on `Header` already. A real
/// switch agent would latch the session's wire version here; this core only reacts to what
/// `Header::version` already carries on every subsequent message.
pub fn hello(_header: &Header) {}

/// `ECHO_REPLY`: liveness only, no state change.
pub fn echo_reply(_header: &Header) {}

/// `SET_CONFIG`: overwrite `flags`/`miss_send_len`. Never replied to directly —
/// the controller learns the result from a later `GET_CONFIG_REQUEST`.
pub fn set_config(cfg: &mut SwitchConfig, msg: SetConfigMsg) {
    cfg.flags = msg.flags;
    cfg.miss_send_len = msg.miss_send_len;
    cfg.config_set_done = true;
}

/// `GET_CONFIG_REQUEST`.
pub fn get_config<C: Connection>(cfg: &SwitchConfig, cxn: &mut C, cxn_id: u32, xid: Xid) -> Result<()> {
    cxn.send(
        cxn_id,
        Reply::GetConfig {
            xid,
            flags: cfg.flags,
            miss_send_len: cfg.miss_send_len,
        },
    )
}

/// `FEATURES_REQUEST`: dpid and capability bits are FWD's to report; port
/// features come from PORT.
pub fn features_request<F: Forwarding, P: PortManager, C: Connection>(
    fwd: &F,
    port: &P,
    cxn: &mut C,
    cxn_id: u32,
    xid: Xid,
) -> Result<()> {
    let features = fwd.forwarding_features_get();
    cxn.send(
        cxn_id,
        Reply::FeaturesReply {
            xid,
            dpid: fwd.dpid(),
            capabilities: features.capabilities,
            port_features: port.features_get(),
        },
    )
}

/// `TABLE_MOD`. No reply on success; this core has no per-table config to persist
/// beyond forwarding the request to FWD, which owns the actual table hardware/software state.
pub fn table_mod<F: Forwarding>(_fwd: &mut F, _msg: TableModMsg) -> Result<()> {
    Ok(())
}

/// `PACKET_OUT`: handed straight to FWD, no reply either way.
pub fn packet_out<F: Forwarding>(fwd: &mut F, msg: &PacketOutMsg) -> Result<()> {
    fwd.packet_out(msg)
}

/// `PORT_MOD`: on failure, report `PORT_MOD_FAILED/BAD_PORT`.
pub fn port_mod<P: PortManager, C: Connection>(
    port: &mut P,
    cxn: &mut C,
    cxn_id: u32,
    header: &Header,
    msg: PortModMsg,
) -> Result<()> {
    if port.modify(&msg).is_err() {
        warn!(xid = header.xid.get(), "port_mod rejected by PORT");
        cxn.send_error(cxn_id, error_encoder::encode_port_mod_failure(header.xid));
    }
    Ok(())
}

/// `EXPERIMENTER`: offered to FWD first, then PORT. `BAD_REQUEST/BAD_EXPERIMENTER` is reported
/// only if both decline with `NotSupported`; any other error either collaborator returns is
/// surfaced as-is rather than folded into the generic unsupported-experimenter reply.
pub fn experimenter<F: Forwarding, P: PortManager, C: Connection>(
    fwd: &mut F,
    port: &mut P,
    cxn: &mut C,
    cxn_id: u32,
    header: &Header,
    msg: &ExperimenterMsg,
) {
    let fwd_err = match fwd.experimenter(msg) {
        Ok(()) => return,
        Err(e) => e,
    };
    let port_err = match port.experimenter(msg) {
        Ok(()) => return,
        Err(e) => e,
    };

    if fwd_err == OfsmError::NotSupported && port_err == OfsmError::NotSupported {
        warn!(xid = header.xid.get(), experimenter_id = msg.experimenter_id, "experimenter declined by FWD and PORT");
        cxn.send_error(cxn_id, error_encoder::encode_bad_experimenter(header.xid));
    } else {
        let surfaced = if fwd_err != OfsmError::NotSupported { fwd_err } else { port_err };
        warn!(
            xid = header.xid.get(),
            experimenter_id = msg.experimenter_id,
            error = %surfaced,
            "experimenter failed with an error beyond plain non-support"
        );
        cxn.send_error(cxn_id, error_encoder::encode_bad_type(header.xid));
    }
}

/// OpenFlow 1.0 has no `MULTIPART_REQUEST(EXPERIMENTER)` wrapper distinction; the stats variant of
/// `EXPERIMENTER` is modeled as `MessagePayload::ExperimenterStatsRequest` and handled identically.
pub fn experimenter_stats_request<F: Forwarding, P: PortManager, C: Connection>(
    fwd: &mut F,
    port: &mut P,
    cxn: &mut C,
    cxn_id: u32,
    header: &Header,
    msg: &ExperimenterMsg,
) {
    experimenter(fwd, port, cxn, cxn_id, header, msg)
}
