//! Event trees: functional events, branches, forks and sequences.

use crate::element::Meta;
use crate::expression::ExprId;
use crate::model::ModelError;

/// An indexing object for event trees owned by a [`crate::Model`].
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub struct EventTreeId(pub(crate) usize);

impl From<EventTreeId> for usize {
    fn from(val: EventTreeId) -> Self {
        val.0
    }
}

/// An indexing object for sequences owned by a [`crate::Model`].
///
/// Sequences are global: event trees record membership but the model owns
/// the construct.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub struct SequenceId(pub(crate) usize);

impl From<SequenceId> for usize {
    fn from(val: SequenceId) -> Self {
        val.0
    }
}

/// An indexing object for named branches within their event tree.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub struct BranchId(pub(crate) usize);

impl From<BranchId> for usize {
    fn from(val: BranchId) -> Self {
        val.0
    }
}

/// An indexing object for forks within their event tree.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub struct ForkId(pub(crate) usize);

/// An analysis instruction attached to branches and sequences.
#[derive(Debug, Clone, PartialEq)]
pub enum Instruction {
    CollectExpression(ExprId),
}

/// Where a branch hands control over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Fork(ForkId),
    Branch(BranchId),
    Sequence(SequenceId),
}

/// A linear piece of an event tree: instructions followed by a target.
///
/// The target stays unset between shell registration and body definition.
#[derive(Debug, Clone, Default)]
pub struct Branch {
    instructions: Vec<Instruction>,
    target: Option<Target>,
}

impl Branch {
    pub fn new(instructions: Vec<Instruction>, target: Target) -> Self {
        Branch {
            instructions,
            target: Some(target),
        }
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    pub fn target(&self) -> Option<Target> {
        self.target
    }
}

/// One state-labelled alternative of a fork.
#[derive(Debug, Clone)]
pub struct Path {
    state: String,
    branch: Branch,
}

impl Path {
    pub fn new(state: impl Into<String>, branch: Branch) -> Self {
        Path {
            state: state.into(),
            branch,
        }
    }

    pub fn state(&self) -> &str {
        &self.state
    }

    pub fn branch(&self) -> &Branch {
        &self.branch
    }
}

/// A branching point over the states of one functional event.
#[derive(Debug, Clone)]
pub struct Fork {
    functional_event: usize,
    paths: Vec<Path>,
}

impl Fork {
    pub fn new(functional_event: usize, paths: Vec<Path>) -> Self {
        Fork {
            functional_event,
            paths,
        }
    }

    /// Index of the functional event within the owning tree.
    pub fn functional_event(&self) -> usize {
        self.functional_event
    }

    pub fn paths(&self) -> &[Path] {
        &self.paths
    }
}

/// A question asked along event tree branches.
#[derive(Debug, Clone)]
pub struct FunctionalEvent {
    meta: Meta,
}

impl FunctionalEvent {
    pub fn new(meta: Meta) -> Self {
        FunctionalEvent { meta }
    }

    pub fn name(&self) -> &str {
        self.meta.name()
    }

    pub fn meta(&self) -> &Meta {
        &self.meta
    }
}

/// A reusable, named branch of an event tree.
#[derive(Debug, Clone)]
pub struct NamedBranch {
    meta: Meta,
    branch: Branch,
}

impl NamedBranch {
    pub fn new(meta: Meta) -> Self {
        NamedBranch {
            meta,
            branch: Branch::default(),
        }
    }

    pub fn name(&self) -> &str {
        self.meta.name()
    }

    pub fn meta(&self) -> &Meta {
        &self.meta
    }

    pub fn branch(&self) -> &Branch {
        &self.branch
    }

    pub fn set_branch(&mut self, branch: Branch) {
        self.branch = branch;
    }
}

/// A terminal outcome of event tree walks.
#[derive(Debug, Clone)]
pub struct Sequence {
    meta: Meta,
    instructions: Vec<Instruction>,
}

impl Sequence {
    pub fn new(meta: Meta) -> Self {
        Sequence {
            meta,
            instructions: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        self.meta.name()
    }

    pub fn meta(&self) -> &Meta {
        &self.meta
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    pub fn set_instructions(&mut self, instructions: Vec<Instruction>) {
        self.instructions = instructions;
    }
}

/// An event tree with its functional events, named branches and forks.
#[derive(Debug, Clone)]
pub struct EventTree {
    meta: Meta,
    functional_events: Vec<FunctionalEvent>,
    branches: Vec<NamedBranch>,
    forks: Vec<Fork>,
    sequences: Vec<SequenceId>,
    initial_state: Branch,
}

impl EventTree {
    pub fn new(meta: Meta) -> Self {
        EventTree {
            meta,
            functional_events: Vec::new(),
            branches: Vec::new(),
            forks: Vec::new(),
            sequences: Vec::new(),
            initial_state: Branch::default(),
        }
    }

    pub fn name(&self) -> &str {
        self.meta.name()
    }

    pub fn meta(&self) -> &Meta {
        &self.meta
    }

    pub fn functional_events(&self) -> &[FunctionalEvent] {
        &self.functional_events
    }

    pub fn functional_event_index(&self, name: &str) -> Option<usize> {
        self.functional_events.iter().position(|f| f.name() == name)
    }

    pub fn add_functional_event(&mut self, event: FunctionalEvent) -> Result<(), ModelError> {
        if self.functional_event_index(event.name()).is_some() {
            return Err(ModelError::Redefinition {
                kind: "functional event",
                name: event.name().to_string(),
            });
        }
        self.functional_events.push(event);
        Ok(())
    }

    pub fn branches(&self) -> &[NamedBranch] {
        &self.branches
    }

    pub fn branch(&self, id: BranchId) -> &NamedBranch {
        &self.branches[id.0]
    }

    pub fn branch_mut(&mut self, id: BranchId) -> &mut NamedBranch {
        &mut self.branches[id.0]
    }

    pub fn branch_index(&self, name: &str) -> Option<BranchId> {
        self.branches
            .iter()
            .position(|b| b.name() == name)
            .map(BranchId)
    }

    pub fn add_branch(&mut self, branch: NamedBranch) -> Result<BranchId, ModelError> {
        if self.branch_index(branch.name()).is_some() {
            return Err(ModelError::Redefinition {
                kind: "branch",
                name: branch.name().to_string(),
            });
        }
        self.branches.push(branch);
        Ok(BranchId(self.branches.len() - 1))
    }

    pub fn forks(&self) -> &[Fork] {
        &self.forks
    }

    pub fn fork(&self, id: ForkId) -> &Fork {
        &self.forks[id.0]
    }

    pub fn add_fork(&mut self, fork: Fork) -> ForkId {
        self.forks.push(fork);
        ForkId(self.forks.len() - 1)
    }

    pub fn sequences(&self) -> &[SequenceId] {
        &self.sequences
    }

    pub fn add_sequence(&mut self, id: SequenceId) {
        self.sequences.push(id);
    }

    pub fn initial_state(&self) -> &Branch {
        &self.initial_state
    }

    pub fn set_initial_state(&mut self, branch: Branch) {
        self.initial_state = branch;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn functional_events_are_unique() {
        let mut tree = EventTree::new(Meta::new("et"));
        tree.add_functional_event(FunctionalEvent::new(Meta::new("F")))
            .unwrap();
        assert!(tree
            .add_functional_event(FunctionalEvent::new(Meta::new("F")))
            .is_err());
        assert_eq!(tree.functional_event_index("F"), Some(0));
    }

    #[test]
    fn branch_lookup_by_name() {
        let mut tree = EventTree::new(Meta::new("et"));
        let id = tree.add_branch(NamedBranch::new(Meta::new("B1"))).unwrap();
        assert_eq!(tree.branch_index("B1"), Some(id));
        assert!(tree.add_branch(NamedBranch::new(Meta::new("B1"))).is_err());
    }
}
