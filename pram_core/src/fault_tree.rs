//! Fault trees and their nested components.

use crate::ccf::CcfGroupId;
use crate::element::{Meta, Role};
use crate::event::{BasicEventId, GateId, HouseEventId};
use crate::model::ModelError;
use crate::parameter::ParameterId;

/// An indexing object for fault trees owned by a [`crate::Model`].
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub struct FaultTreeId(pub(crate) usize);

impl From<FaultTreeId> for usize {
    fn from(val: FaultTreeId) -> Self {
        val.0
    }
}

/// A container of fault tree constructs, nestable inside fault trees.
///
/// The container records which constructs were defined in it; the constructs
/// themselves live in the model arenas.
#[derive(Debug, Clone)]
pub struct Component {
    meta: Meta,
    base_path: String,
    role: Role,
    house_events: Vec<HouseEventId>,
    basic_events: Vec<BasicEventId>,
    parameters: Vec<ParameterId>,
    gates: Vec<GateId>,
    ccf_groups: Vec<CcfGroupId>,
    components: Vec<Component>,
}

impl Component {
    pub fn new(meta: Meta, base_path: impl Into<String>, role: Role) -> Self {
        Component {
            meta,
            base_path: base_path.into(),
            role,
            house_events: Vec::new(),
            basic_events: Vec::new(),
            parameters: Vec::new(),
            gates: Vec::new(),
            ccf_groups: Vec::new(),
            components: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        self.meta.name()
    }

    pub fn meta(&self) -> &Meta {
        &self.meta
    }

    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn house_events(&self) -> &[HouseEventId] {
        &self.house_events
    }

    pub fn add_house_event(&mut self, id: HouseEventId) {
        self.house_events.push(id);
    }

    pub fn basic_events(&self) -> &[BasicEventId] {
        &self.basic_events
    }

    pub fn add_basic_event(&mut self, id: BasicEventId) {
        self.basic_events.push(id);
    }

    pub fn parameters(&self) -> &[ParameterId] {
        &self.parameters
    }

    pub fn add_parameter(&mut self, id: ParameterId) {
        self.parameters.push(id);
    }

    pub fn gates(&self) -> &[GateId] {
        &self.gates
    }

    pub fn add_gate(&mut self, id: GateId) {
        self.gates.push(id);
    }

    pub fn ccf_groups(&self) -> &[CcfGroupId] {
        &self.ccf_groups
    }

    pub fn add_ccf_group(&mut self, id: CcfGroupId) {
        self.ccf_groups.push(id);
    }

    pub fn components(&self) -> &[Component] {
        &self.components
    }

    /// Adds a fully registered sub-component; sibling names must be unique.
    pub fn add_component(&mut self, component: Component) -> Result<(), ModelError> {
        if self.components.iter().any(|c| c.name() == component.name()) {
            return Err(ModelError::Redefinition {
                kind: "component",
                name: component.name().to_string(),
            });
        }
        self.components.push(component);
        Ok(())
    }

    /// Appends the gates of this container and all sub-components to `out`.
    pub(crate) fn collect_gates(&self, out: &mut Vec<GateId>) {
        out.extend_from_slice(&self.gates);
        for component in &self.components {
            component.collect_gates(out);
        }
    }
}

/// A top-level fault tree container.
#[derive(Debug, Clone)]
pub struct FaultTree {
    component: Component,
    top_events: Vec<GateId>,
}

impl FaultTree {
    pub fn new(meta: Meta) -> Self {
        FaultTree {
            component: Component::new(meta, "", Role::Public),
            top_events: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        self.component.name()
    }

    pub fn component(&self) -> &Component {
        &self.component
    }

    pub fn component_mut(&mut self) -> &mut Component {
        &mut self.component
    }

    /// Gates of this tree that no other gate of the tree references.
    ///
    /// Populated by [`crate::Model::setup_for_analysis`].
    pub fn top_events(&self) -> &[GateId] {
        &self.top_events
    }

    pub(crate) fn set_top_events(&mut self, top_events: Vec<GateId>) {
        self.top_events = top_events;
    }
}
