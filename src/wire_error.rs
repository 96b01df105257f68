//! Wire-level error vocabulary: the `(Kind, Code)` pairs a controller actually receives.
//!
//! Adapted from `little-dude-ofpkt`'s `packets::error` module (itself modeling the OpenFlow
//! `ofp_error_msg` type/code fields) down to the handful of error families the state-manager
//! core actually emits: `FLOW_MOD_FAILED`, `PORT_MOD_FAILED`, `QUEUE_OP_FAILED`,
//! `BAD_REQUEST`. The `Code` value is version-dependent for `FLOW_MOD_FAILED`: OpenFlow 1.0 and
//! 1.1+ assign different numbers to the same named code, which is why `FlowModFailedCode10` is
//! kept distinct from `FlowModFailedCode` rather than folded into one enum.

enum_with_unknown! {
    /// The `type` field of an `ofp_error_msg`, restricted to the families this core emits.
    pub doc enum Kind(u16) {
        /// Request was not understood.
        BadRequest = 1,
        /// Problem modifying flow entry.
        FlowModFailed = 5,
        /// Port mod request failed.
        PortModFailed = 7,
        /// Queue operation failed.
        QueueOpFailed = 9,
    }
}

enum_with_unknown! {
    /// `BAD_REQUEST` codes this core can emit.
    pub doc enum BadRequestCode(u16) {
        /// ofp_header.type not supported.
        BadType = 1,
        /// Experimenter id not supported.
        BadExperimenter = 3,
    }
}

enum_with_unknown! {
    /// `FLOW_MOD_FAILED` codes as numbered from OpenFlow 1.1 onward.
    pub doc enum FlowModFailedCode(u16) {
        /// Unspecified error.
        Unspecified = 0,
        /// Flow not added because table was full.
        TableFull = 1,
        /// Attempted to add overlapping flow with CHECK_OVERLAP flag set.
        Overlap = 3,
        /// Permissions error.
        Permissions = 4,
        /// Unsupported or unknown command.
        BadCommand = 6,
    }
}

enum_with_unknown! {
    /// `FLOW_MOD_FAILED` codes as numbered in OpenFlow 1.0 — distinct numbering from
    /// `FlowModFailedCode`, preserved here rather than unified, including the divergent
    /// `ALL_TABLES_FULL`/`UNSUPPORTED` naming between the two versions.
    pub doc enum FlowModFailedCode10(u16) {
        /// All tables full.
        AllTablesFull = 0,
        /// Attempted to add overlapping flow with CHECK_OVERLAP flag set.
        Overlap = 1,
        /// Permissions error.
        Eperm = 2,
        /// Flow not added because of unsupported emergency-flow idle/hard timeout.
        BadEmergTimeout = 3,
        /// Unsupported or unknown command.
        BadCommand = 4,
        /// Unsupported or unknown command (1.0 alias used by some implementations).
        Unsupported = 5,
    }
}

enum_with_unknown! {
    /// `PORT_MOD_FAILED` codes.
    pub doc enum PortModFailedCode(u16) {
        /// Specified port number does not exist.
        BadPort = 0,
        /// Specified hardware address does not match the port number.
        BadHardwareAddress = 1,
    }
}

enum_with_unknown! {
    /// `QUEUE_OP_FAILED` codes.
    pub doc enum QueueOpFailedCode(u16) {
        /// Invalid port (or port does not exist).
        BadPort = 0,
        /// Queue does not exist.
        BadQueue = 1,
    }
}

/// A fully-resolved wire error: the `(type, code)` pair plus the xid of the offending request,
/// ready to be handed to `Connection::send_error`.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct WireError {
    pub xid: crate::ids::Xid,
    pub kind: Kind,
    pub code: u16,
}

impl core::fmt::Display for Kind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Kind::BadRequest => write!(f, "bad request"),
            Kind::FlowModFailed => write!(f, "flow mod failed"),
            Kind::PortModFailed => write!(f, "port mod failed"),
            Kind::QueueOpFailed => write!(f, "queue op failed"),
            Kind::Unknown(v) => write!(f, "unknown error kind ({v})"),
        }
    }
}
impl std::error::Error for Kind {}

impl core::fmt::Display for BadRequestCode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            BadRequestCode::BadType => write!(f, "message type not supported"),
            BadRequestCode::BadExperimenter => write!(f, "experimenter id not supported"),
            BadRequestCode::Unknown(v) => write!(f, "unknown bad-request code ({v})"),
        }
    }
}
impl std::error::Error for BadRequestCode {}

impl core::fmt::Display for FlowModFailedCode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            FlowModFailedCode::Unspecified => write!(f, "unspecified error"),
            FlowModFailedCode::TableFull => write!(f, "table full"),
            FlowModFailedCode::Overlap => write!(f, "overlapping flow with check-overlap set"),
            FlowModFailedCode::Permissions => write!(f, "permissions error"),
            FlowModFailedCode::BadCommand => write!(f, "unsupported or unknown command"),
            FlowModFailedCode::Unknown(v) => write!(f, "unknown flow-mod-failed code ({v})"),
        }
    }
}
impl std::error::Error for FlowModFailedCode {}

impl core::fmt::Display for FlowModFailedCode10 {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            FlowModFailedCode10::AllTablesFull => write!(f, "all tables full"),
            FlowModFailedCode10::Overlap => write!(f, "overlapping flow with check-overlap set"),
            FlowModFailedCode10::Eperm => write!(f, "permissions error"),
            FlowModFailedCode10::BadEmergTimeout => write!(f, "unsupported emergency-flow timeout"),
            FlowModFailedCode10::BadCommand => write!(f, "unsupported or unknown command"),
            FlowModFailedCode10::Unsupported => write!(f, "unsupported or unknown command"),
            FlowModFailedCode10::Unknown(v) => write!(f, "unknown flow-mod-failed (1.0) code ({v})"),
        }
    }
}
impl std::error::Error for FlowModFailedCode10 {}

impl core::fmt::Display for PortModFailedCode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            PortModFailedCode::BadPort => write!(f, "specified port does not exist"),
            PortModFailedCode::BadHardwareAddress => write!(f, "hardware address mismatch"),
            PortModFailedCode::Unknown(v) => write!(f, "unknown port-mod-failed code ({v})"),
        }
    }
}
impl std::error::Error for PortModFailedCode {}

impl core::fmt::Display for QueueOpFailedCode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            QueueOpFailedCode::BadPort => write!(f, "invalid port"),
            QueueOpFailedCode::BadQueue => write!(f, "queue does not exist"),
            QueueOpFailedCode::Unknown(v) => write!(f, "unknown queue-op-failed code ({v})"),
        }
    }
}
impl std::error::Error for QueueOpFailedCode {}

impl core::fmt::Display for WireError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{} (code {}) for xid {}", self.kind, self.code, self.xid.get())
    }
}
impl std::error::Error for WireError {}
