//! In-memory model graph for probabilistic risk analysis.
//!
//! A [`Model`] owns every analysis construct parsed out of the input files:
//! fault trees with their gates and events, event trees with their branches
//! and sequences, common-cause failure groups, parameters and the expressions
//! they are defined by. Constructs refer to one another through copyable
//! typed ids handed out at registration; the arenas behind those ids live for
//! as long as the model does, so back-references never dangle and reference
//! cycles (which are model bugs) stay representable until cycle detection
//! rejects them.

mod ccf;
mod cycle;
mod element;
mod event;
mod event_tree;
mod expression;
mod fault_tree;
mod model;
mod parameter;

pub use ccf::{CcfFactor, CcfGroup, CcfGroupId, CcfModel};
pub use cycle::{branch_cycle, gate_cycle, parameter_cycle};
pub use element::{Attribute, Meta, Role};
pub use event::{
    Arg, BasicEvent, BasicEventId, EventId, Formula, Gate, GateId, HouseEvent, HouseEventId,
    Operator,
};
pub use event_tree::{
    Branch, BranchId, EventTree, EventTreeId, Fork, ForkId, FunctionalEvent, Instruction,
    NamedBranch, Path, Sequence, SequenceId, Target,
};
pub use expression::{ExprId, Expression, Units};
pub use fault_tree::{Component, FaultTree, FaultTreeId};
pub use model::{Model, ModelError, Settings};
pub use parameter::{MissionTime, Parameter, ParameterId};
