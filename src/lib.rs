//! OpenFlow 1.0-1.3 switch-agent state manager core.
//!
//! This crate is the flow-mod/flow-table/stats half of a software OpenFlow switch agent: given an
//! already wire-decoded message and a set of collaborators (forwarding plane, port manager,
//! controller connection, cooperative scheduler), it maintains the flow table and produces the
//! replies and wire errors the OpenFlow protocol calls for. Wire encode/decode, the physical
//! datapath, and the scheduler's own timer wheel are external collaborators (see `collab`) this
//! crate is deliberately agnostic to.
//!
//! [`state_manager::StateManager`] is the entry point; [`dispatch::dispatch`] is what it calls
//! internally to route one decoded message to its handler.

#[macro_use]
mod macros;

pub mod bsn;
pub mod collab;
pub mod config;
pub mod config_handlers;
pub mod dispatch;
pub mod effects;
pub mod error;
pub mod error_encoder;
pub mod flow_entry;
pub mod flow_mod;
pub mod flow_table;
pub mod ids;
pub mod ip_mask_table;
pub mod iteration;
pub mod match_query;
pub mod matchfield;
pub mod messages;
pub mod port;
pub mod state_manager;
pub mod stats;
pub mod version;
pub mod wire_error;

pub use error::{OfsmError, Result};
pub use state_manager::StateManager;
