//! OpenFlow port numbers, adapted from `little-dude-ofpkt`'s `port` module.

/// OpenFlow port numbers.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum PortNumber {
    /// Maximum number of physical and logical switch ports.
    Max,
    /// Output port not set in action-set.
    Unset,
    /// Send the packet out the input port.
    InPort,
    /// Submit the packet to the first flow table. Only valid in packet-out messages.
    Table,
    /// Forward using non-OpenFlow pipeline.
    Normal,
    /// Flood using non-OpenFlow pipeline.
    Flood,
    /// Flood through all standard ports except the input port.
    All,
    /// Send to controller.
    Controller,
    /// Local OpenFlow "port".
    Local,
    /// Wildcard: no specific port, i.e. "any port". This is the match query's `DEST_WILDCARD`
    /// sentinel.
    Any,
    /// A regular port number.
    Regular(u32),
}

impl PortNumber {
    /// `true` for the match-query "any port" sentinel (`out_port == DEST_WILDCARD`).
    pub fn is_wildcard(self) -> bool {
        matches!(self, PortNumber::Any)
    }
}

impl From<u32> for PortNumber {
    fn from(value: u32) -> Self {
        match value {
            0xffff_ff00 => PortNumber::Max,
            0xffff_fff7 => PortNumber::Unset,
            0xffff_fff8 => PortNumber::InPort,
            0xffff_fff9 => PortNumber::Table,
            0xffff_fffa => PortNumber::Normal,
            0xffff_fffb => PortNumber::Flood,
            0xffff_fffc => PortNumber::All,
            0xffff_fffd => PortNumber::Controller,
            0xffff_fffe => PortNumber::Local,
            0xffff_ffff => PortNumber::Any,
            other => PortNumber::Regular(other),
        }
    }
}

impl From<PortNumber> for u32 {
    fn from(value: PortNumber) -> Self {
        match value {
            PortNumber::Max => 0xffff_ff00,
            PortNumber::Unset => 0xffff_fff7,
            PortNumber::InPort => 0xffff_fff8,
            PortNumber::Table => 0xffff_fff9,
            PortNumber::Normal => 0xffff_fffa,
            PortNumber::Flood => 0xffff_fffb,
            PortNumber::All => 0xffff_fffc,
            PortNumber::Controller => 0xffff_fffd,
            PortNumber::Local => 0xffff_fffe,
            PortNumber::Any => 0xffff_ffff,
            PortNumber::Regular(other) => other,
        }
    }
}
