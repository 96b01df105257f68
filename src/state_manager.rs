//! State Manager: the top-level struct owning the flow table, switch config, id
//! allocators, and the BSN ip-mask table, generic over its four collaborators.
//!
//! FWD and CXN are held as `Rc<RefCell<_>>` rather than plain fields: `dispatch::dispatch` clones
//! these handles into non-strict flow-mod iteration tasks that may outlive a single `handle`
//! call (single-threaded cooperative scheduling makes interior mutability trivial here). PORT
//! and SOC never cross that boundary and stay plain fields.

use std::cell::RefCell;
use std::rc::Rc;

use crate::collab::{Connection, Forwarding, PortManager, Scheduler};
use crate::config::SwitchConfig;
use crate::dispatch;
use crate::error::Result;
use crate::flow_table::FlowTable;
use crate::ids::{FlowIdAllocator, XidAllocator};
use crate::ip_mask_table::IpMaskTable;
use crate::messages::InboundMessage;

/// Owns every piece of process-wide state this core is responsible for, parameterized over the
/// four external collaborators.
pub struct StateManager<F, P, C, S> {
    ft: FlowTable,
    cfg: SwitchConfig,
    ip_masks: IpMaskTable,
    flow_alloc: Rc<FlowIdAllocator>,
    xid_alloc: Rc<XidAllocator>,
    fwd: Rc<RefCell<F>>,
    port: P,
    cxn: Rc<RefCell<C>>,
    scheduler: S,
}

impl<F, P, C, S> StateManager<F, P, C, S>
where
    F: Forwarding + 'static,
    P: PortManager,
    C: Connection + 'static,
    S: Scheduler,
{
    pub fn new(fwd: F, port: P, cxn: C, scheduler: S) -> Self {
        StateManager {
            ft: FlowTable::new(),
            cfg: SwitchConfig::default(),
            ip_masks: IpMaskTable::new(),
            flow_alloc: Rc::new(FlowIdAllocator::new()),
            xid_alloc: Rc::new(XidAllocator::new()),
            fwd: Rc::new(RefCell::new(fwd)),
            port,
            cxn: Rc::new(RefCell::new(cxn)),
            scheduler,
        }
    }

    pub fn with_config(fwd: F, port: P, cxn: C, scheduler: S, cfg: SwitchConfig) -> Self {
        StateManager {
            cfg,
            ..Self::new(fwd, port, cxn, scheduler)
        }
    }

    pub fn flow_table(&self) -> &FlowTable {
        &self.ft
    }

    pub fn config(&self) -> &SwitchConfig {
        &self.cfg
    }

    /// Process one already-decoded inbound message.
    pub fn handle(&mut self, msg: InboundMessage, cxn_id: u32) -> Result<()> {
        let now_ms = self.scheduler.current_time_ms();
        dispatch::dispatch(
            msg,
            &mut self.ft,
            &mut self.cfg,
            &mut self.ip_masks,
            self.fwd.clone(),
            &mut self.port,
            self.cxn.clone(),
            &mut self.scheduler,
            self.flow_alloc.clone(),
            self.xid_alloc.clone(),
            cxn_id,
            now_ms,
        )
    }
}
