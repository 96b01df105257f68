//! Flow entry effects: actions (OpenFlow 1.0) or instructions (OpenFlow 1.1+).
//!
//! The wire-level action/instruction lists are FWD's concern (the forwarding abstraction is an
//! external collaborator) — this module only keeps the sliver the core itself must reason
//! about: whether some action in the effects list outputs to a given port, which
//! `build_query`/strict-match consult (out-port is either wildcard or equal to some action's
//! output).

use crate::port::PortNumber;
use crate::version::Ver;

/// A single forwarding action. `Output` is the only variant the core inspects; `Opaque` stands
/// in for every other OpenFlow action type (set-field, push-vlan, group, ...) FWD decodes and
/// executes but this core never looks inside.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Action {
    Output(PortNumber),
    Opaque(u16),
}

/// A single OpenFlow 1.1+ instruction. Only `ApplyActions`/`WriteActions` are modeled far enough
/// to expose their action lists; other instruction types (goto-table, meter, clear-actions) are
/// represented opaquely.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Instruction {
    ApplyActions(Vec<Action>),
    WriteActions(Vec<Action>),
    Opaque(u16),
}

/// A flow entry's effects: either an OpenFlow 1.0 action list or an OpenFlow 1.1+ instruction
/// list, tagged with the wire version it was built for. Exactly one of `actions`/`instructions`
/// is populated, determined by `effects.wire_version`.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Effects {
    Actions { actions: Vec<Action>, version: Ver },
    Instructions {
        instructions: Vec<Instruction>,
        version: Ver,
    },
}

impl Effects {
    pub fn version(&self) -> Ver {
        match self {
            Effects::Actions { version, .. } => *version,
            Effects::Instructions { version, .. } => *version,
        }
    }

    /// `true` if any action in these effects outputs to `port`, honoring both 1.0's flat action
    /// list and 1.1+'s apply/write-actions instructions.
    pub fn outputs_to(&self, port: PortNumber) -> bool {
        match self {
            Effects::Actions { actions, .. } => actions_output_to(actions, port),
            Effects::Instructions { instructions, .. } => instructions.iter().any(|instr| match instr {
                Instruction::ApplyActions(actions) | Instruction::WriteActions(actions) => {
                    actions_output_to(actions, port)
                }
                Instruction::Opaque(_) => false,
            }),
        }
    }
}

fn actions_output_to(actions: &[Action], port: PortNumber) -> bool {
    actions
        .iter()
        .any(|action| matches!(action, Action::Output(p) if *p == port))
}
