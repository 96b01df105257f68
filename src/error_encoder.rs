//! Error Encoder: maps an internal error plus context to the versioned
//! `(type, code)` pair a controller actually receives.
//!
//! Replaces the original's per-version macros with a small table indexed by `(ErrorKind,
//! Version)` — `encode_flow_mod_error` below is that table, expressed as a match rather than a
//! literal array since the 1.0/`>=1.1` split is binary.

use crate::error::OfsmError;
use crate::ids::Xid;
use crate::version::Ver;
use crate::wire_error::{BadRequestCode, FlowModFailedCode, FlowModFailedCode10, Kind, PortModFailedCode, QueueOpFailedCode, WireError};

/// `RESOURCE`/`NOT_SUPPORTED`/other internal errors surfaced while processing a flow-mod.
pub fn encode_flow_mod_error(err: OfsmError, ver: Ver, xid: Xid) -> WireError {
    let code: u16 = if ver == Ver::V1_0 {
        match err {
            OfsmError::Resource => FlowModFailedCode10::AllTablesFull.into(),
            OfsmError::NotSupported => FlowModFailedCode10::Unsupported.into(),
            _ => FlowModFailedCode10::Eperm.into(),
        }
    } else {
        match err {
            OfsmError::Resource => FlowModFailedCode::TableFull.into(),
            OfsmError::NotSupported => FlowModFailedCode::BadCommand.into(),
            _ => FlowModFailedCode::Unspecified.into(),
        }
    };
    WireError {
        xid,
        kind: Kind::FlowModFailed,
        code,
    }
}

/// `CHECK_OVERLAP` rejection. Same code on every version.
pub fn encode_overlap(ver: Ver, xid: Xid) -> WireError {
    let code: u16 = if ver == Ver::V1_0 {
        FlowModFailedCode10::Overlap.into()
    } else {
        FlowModFailedCode::Overlap.into()
    };
    WireError {
        xid,
        kind: Kind::FlowModFailed,
        code,
    }
}

/// `EMERG` flag with a nonzero timeout. 1.0-only: OpenFlow
/// 1.1 dropped the emergency-flow concept, so this is never called for `ver.is_post_1_0()`.
pub fn encode_bad_emerg_timeout(xid: Xid) -> WireError {
    WireError {
        xid,
        kind: Kind::FlowModFailed,
        code: FlowModFailedCode10::BadEmergTimeout.into(),
    }
}

/// `PORT.modify` failure.
pub fn encode_port_mod_failure(xid: Xid) -> WireError {
    WireError {
        xid,
        kind: Kind::PortModFailed,
        code: PortModFailedCode::BadPort.into(),
    }
}

/// Queue lookup against a nonexistent port.
pub fn encode_queue_bad_port(xid: Xid) -> WireError {
    WireError {
        xid,
        kind: Kind::QueueOpFailed,
        code: QueueOpFailedCode::BadPort.into(),
    }
}

/// Queue lookup against a nonexistent queue.
pub fn encode_queue_bad_queue(xid: Xid) -> WireError {
    WireError {
        xid,
        kind: Kind::QueueOpFailed,
        code: QueueOpFailedCode::BadQueue.into(),
    }
}

/// Unhandled message type.
pub fn encode_bad_type(xid: Xid) -> WireError {
    WireError {
        xid,
        kind: Kind::BadRequest,
        code: BadRequestCode::BadType.into(),
    }
}

/// `EXPERIMENTER` rejected by both FWD and PORT.
pub fn encode_bad_experimenter(xid: Xid) -> WireError {
    WireError {
        xid,
        kind: Kind::BadRequest,
        code: BadRequestCode::BadExperimenter.into(),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn resource_maps_to_version_specific_code() {
        let e10 = encode_flow_mod_error(OfsmError::Resource, Ver::V1_0, Xid::new(1));
        assert_eq!(e10.code, u16::from(FlowModFailedCode10::AllTablesFull));
        let e13 = encode_flow_mod_error(OfsmError::Resource, Ver::V1_3, Xid::new(1));
        assert_eq!(e13.code, u16::from(FlowModFailedCode::TableFull));
    }

    #[test]
    fn not_supported_maps_to_version_specific_code() {
        let e10 = encode_flow_mod_error(OfsmError::NotSupported, Ver::V1_0, Xid::new(2));
        assert_eq!(e10.code, u16::from(FlowModFailedCode10::Unsupported));
        let e11 = encode_flow_mod_error(OfsmError::NotSupported, Ver::V1_1, Xid::new(2));
        assert_eq!(e11.code, u16::from(FlowModFailedCode::BadCommand));
    }

    #[test]
    fn overlap_code_differs_by_version_family() {
        let e10 = encode_overlap(Ver::V1_0, Xid::new(3));
        assert_eq!(e10.code, u16::from(FlowModFailedCode10::Overlap));
        let e12 = encode_overlap(Ver::V1_2, Xid::new(3));
        assert_eq!(e12.code, u16::from(FlowModFailedCode::Overlap));
    }

    #[test]
    fn xid_is_preserved() {
        let e = encode_bad_type(Xid::new(42));
        assert_eq!(e.xid, Xid::new(42));
        assert_eq!(e.kind, Kind::BadRequest);
    }
}
