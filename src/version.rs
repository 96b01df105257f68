//! Wire version: an attribute of every message object and every flow entry.

enum_with_unknown! {
    /// OpenFlow wire version. Adapted from `little-dude-ofpkt`'s `packets::openflow::Version`,
    /// restricted to the versions this core speaks (1.0-1.3); 1.4+ is an explicit Non-goal.
    pub doc enum Ver(u8) {
        /// OpenFlow 1.0
        V1_0 = 1,
        /// OpenFlow 1.1
        V1_1 = 2,
        /// OpenFlow 1.2
        V1_2 = 3,
        /// OpenFlow 1.3
        V1_3 = 4
    }
}

impl Ver {
    /// `true` for any version strictly newer than 1.0. Several flow-mod fields (`table_id`,
    /// cookie masking) only exist from 1.1 onward.
    pub fn is_post_1_0(self) -> bool {
        !matches!(self, Ver::V1_0)
    }

    /// `true` for 1.1 and above, the threshold at which cookie masking was introduced.
    pub fn supports_cookie_mask(self) -> bool {
        matches!(self, Ver::V1_1 | Ver::V1_2 | Ver::V1_3 | Ver::Unknown(_)) && self != Ver::V1_0
    }
}

impl core::fmt::Display for Ver {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Ver::V1_0 => write!(f, "1.0"),
            Ver::V1_1 => write!(f, "1.1"),
            Ver::V1_2 => write!(f, "1.2"),
            Ver::V1_3 => write!(f, "1.3"),
            Ver::Unknown(v) => write!(f, "unknown({})", v),
        }
    }
}
