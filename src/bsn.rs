//! Big Switch Networks vendor extensions: a minimal `EXPERIMENTER` sub-dialect for
//! installing per-prefix IP masks and reporting hybrid-mode status, backed by `IpMaskTable`.

use crate::collab::{Connection, Reply};
use crate::error::Result;
use crate::ids::Xid;
use crate::ip_mask_table::IpMaskTable;

/// `BSN_SET_IP_MASK`: no reply, mirroring `SET_CONFIG`'s fire-and-forget shape.
pub fn bsn_set_ip_mask(table: &mut IpMaskTable, index: u8, mask: u32) {
    table.set(index, mask);
}

/// `BSN_GET_IP_MASK_REQUEST`.
pub fn bsn_get_ip_mask_request<C: Connection>(table: &IpMaskTable, cxn: &mut C, cxn_id: u32, xid: Xid, index: u8) -> Result<()> {
    cxn.send(
        cxn_id,
        Reply::BsnIpMask {
            xid,
            index,
            mask: table.get(index),
        },
    )
}

/// `BSN_HYBRID_GET_REQUEST`: hybrid mode is always reported enabled, at hybrid-protocol
/// version 0 (a hybrid forwarding pipeline of its own is out of scope).
pub fn bsn_hybrid_get_request<C: Connection>(cxn: &mut C, cxn_id: u32, xid: Xid) -> Result<()> {
    cxn.send(
        cxn_id,
        Reply::BsnHybridGet {
            xid,
            hybrid_enable: 1,
            hybrid_version: 0,
        },
    )
}

#[cfg(test)]
mod test {
    use super::*;

    #[derive(Default)]
    struct RecordingCxn {
        replies: Vec<Reply>,
    }
    impl Connection for RecordingCxn {
        fn send(&mut self, _cxn_id: u32, reply: Reply) -> Result<()> {
            self.replies.push(reply);
            Ok(())
        }
        fn send_error(&mut self, _cxn_id: u32, _error: crate::wire_error::WireError) {}
    }

    #[test]
    fn set_then_get_ip_mask_round_trips() {
        let mut table = IpMaskTable::new();
        let mut cxn = RecordingCxn::default();

        bsn_set_ip_mask(&mut table, 12, 0xffff_0000);
        bsn_get_ip_mask_request(&table, &mut cxn, 1, Xid::new(5), 12).unwrap();

        match &cxn.replies[0] {
            Reply::BsnIpMask { xid, index, mask } => {
                assert_eq!(*xid, Xid::new(5));
                assert_eq!(*index, 12);
                assert_eq!(*mask, 0xffff_0000);
            }
            other => panic!("unexpected reply: {other:?}"),
        }
    }

    #[test]
    fn get_unset_index_reports_zero() {
        let table = IpMaskTable::new();
        let mut cxn = RecordingCxn::default();
        bsn_get_ip_mask_request(&table, &mut cxn, 1, Xid::new(6), 200).unwrap();
        match &cxn.replies[0] {
            Reply::BsnIpMask { mask, .. } => assert_eq!(*mask, 0),
            other => panic!("unexpected reply: {other:?}"),
        }
    }

    #[test]
    fn hybrid_get_reports_enabled_at_version_zero() {
        let mut cxn = RecordingCxn::default();
        bsn_hybrid_get_request(&mut cxn, 1, Xid::new(7)).unwrap();
        match &cxn.replies[0] {
            Reply::BsnHybridGet {
                hybrid_enable,
                hybrid_version,
                ..
            } => {
                assert_eq!(*hybrid_enable, 1);
                assert_eq!(*hybrid_version, 0);
            }
            other => panic!("unexpected reply: {other:?}"),
        }
    }
}
