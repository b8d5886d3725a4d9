//! The model container and its scoped symbol resolution.

use std::collections::HashMap;

use thiserror::Error;

use crate::ccf::{CcfGroup, CcfGroupId};
use crate::element::{scope_key, Meta};
use crate::event::{BasicEvent, BasicEventId, EventId, Gate, GateId, HouseEvent, HouseEventId};
use crate::event_tree::{EventTree, EventTreeId, Sequence, SequenceId};
use crate::expression::{ExprId, Expression};
use crate::fault_tree::{FaultTree, FaultTreeId};
use crate::parameter::{MissionTime, Parameter, ParameterId};

/// The error type for model registration and lookup operations.
#[derive(Debug, Clone, Error)]
pub enum ModelError {
    /// A reference names an entity no registration produced.
    #[error("Undefined {kind} {name} with base path {base_path}")]
    Undefined {
        kind: &'static str,
        name: String,
        base_path: String,
    },
    /// A registration reuses a name already taken in the same scope.
    #[error("Redefinition of {kind} {name}")]
    Redefinition { kind: &'static str, name: String },
    /// A duplicate value where a unique set is required.
    #[error("{0}")]
    DuplicateArgument(String),
    /// A construct violates its argument contract.
    #[error("{0}")]
    InvalidArgument(String),
}

/// Caller-facing configuration of the load.
#[derive(Debug, Clone, Copy)]
pub struct Settings {
    mission_time: f64,
    probability_analysis: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            mission_time: 8760.0,
            probability_analysis: false,
        }
    }
}

impl Settings {
    /// Sets the mission time used to seed the model mission-time expression.
    pub fn mission_time(mut self, hours: f64) -> Self {
        self.mission_time = hours;
        self
    }

    /// Requires every basic event to carry a probability expression.
    pub fn probability_analysis(mut self, requested: bool) -> Self {
        self.probability_analysis = requested;
        self
    }

    pub fn mission_time_value(&self) -> f64 {
        self.mission_time
    }

    pub fn probability_analysis_requested(&self) -> bool {
        self.probability_analysis
    }
}

/// The root container owning every analysis construct and expression.
///
/// Entities are addressed by the typed ids their registration returned, or
/// resolved by name through the scoped getters: a private name is tried
/// against the lookup base path and each ancestor path in turn, then a
/// public match by bare name. Mutation is the loader's business; once
/// loading finishes consumers treat the model as read-only.
#[derive(Debug)]
pub struct Model {
    meta: Meta,
    settings: Settings,
    mission_time: MissionTime,
    expressions: Vec<Expression>,
    gates: Vec<Gate>,
    basic_events: Vec<BasicEvent>,
    house_events: Vec<HouseEvent>,
    parameters: Vec<Parameter>,
    sequences: Vec<Sequence>,
    ccf_groups: Vec<CcfGroup>,
    event_trees: Vec<EventTree>,
    fault_trees: Vec<FaultTree>,
    gate_table: HashMap<String, GateId>,
    basic_event_table: HashMap<String, BasicEventId>,
    house_event_table: HashMap<String, HouseEventId>,
    event_table: HashMap<String, EventId>,
    parameter_table: HashMap<String, ParameterId>,
    sequence_table: HashMap<String, SequenceId>,
    ccf_group_table: HashMap<String, CcfGroupId>,
    event_tree_table: HashMap<String, EventTreeId>,
    fault_tree_table: HashMap<String, FaultTreeId>,
}

impl Model {
    pub fn new(settings: Settings) -> Self {
        let mut model = Model {
            meta: Meta::default(),
            settings,
            mission_time: MissionTime::new(settings.mission_time),
            expressions: Vec::new(),
            gates: Vec::new(),
            basic_events: Vec::new(),
            house_events: Vec::new(),
            parameters: Vec::new(),
            sequences: Vec::new(),
            ccf_groups: Vec::new(),
            event_trees: Vec::new(),
            fault_trees: Vec::new(),
            gate_table: HashMap::new(),
            basic_event_table: HashMap::new(),
            house_event_table: HashMap::new(),
            event_table: HashMap::new(),
            parameter_table: HashMap::new(),
            sequence_table: HashMap::new(),
            ccf_group_table: HashMap::new(),
            event_tree_table: HashMap::new(),
            fault_tree_table: HashMap::new(),
        };
        // Pin the shared constants to their well-known slots.
        assert_eq!(model.add_expression(Expression::Constant(0.0)), Expression::ZERO);
        assert_eq!(model.add_expression(Expression::Constant(1.0)), Expression::ONE);
        assert_eq!(
            model.add_expression(Expression::Constant(std::f64::consts::PI)),
            Expression::PI
        );
        assert_eq!(
            model.add_expression(Expression::MissionTime),
            Expression::MISSION_TIME
        );
        // The shared boolean house events; addressable by id, never by name.
        let mut constant_true = HouseEvent::new(Meta::new("true"), "", crate::Role::Public);
        constant_true.set_state(true);
        model.house_events.push(constant_true);
        model
            .house_events
            .push(HouseEvent::new(Meta::new("false"), "", crate::Role::Public));
        assert_eq!(model.house_events.len() - 1, usize::from(HouseEvent::FALSE));
        model
    }

    pub fn meta(&self) -> &Meta {
        &self.meta
    }

    pub fn meta_mut(&mut self) -> &mut Meta {
        &mut self.meta
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn mission_time(&self) -> &MissionTime {
        &self.mission_time
    }

    pub fn mission_time_mut(&mut self) -> &mut MissionTime {
        &mut self.mission_time
    }

    // Expressions.

    pub fn add_expression(&mut self, expression: Expression) -> ExprId {
        self.expressions.push(expression);
        ExprId(self.expressions.len() - 1)
    }

    pub fn expression(&self, id: ExprId) -> &Expression {
        &self.expressions[id.0]
    }

    /// The value of a directly constant expression.
    pub fn constant_value(&self, id: ExprId) -> Option<f64> {
        match self.expression(id) {
            Expression::Constant(value) => Some(*value),
            _ => None,
        }
    }

    // Gates.

    pub fn add_gate(&mut self, gate: Gate) -> Result<GateId, ModelError> {
        let key = scope_key(gate.name(), gate.base_path(), gate.role());
        let id = GateId(self.gates.len());
        self.register_event(key.clone(), "gate", EventId::Gate(id))?;
        self.gate_table.insert(key, id);
        self.gates.push(gate);
        Ok(id)
    }

    pub fn gates(&self) -> &[Gate] {
        &self.gates
    }

    pub fn gate(&self, id: GateId) -> &Gate {
        &self.gates[id.0]
    }

    pub fn gate_mut(&mut self, id: GateId) -> &mut Gate {
        &mut self.gates[id.0]
    }

    pub fn get_gate(&self, name: &str, base_path: &str) -> Result<GateId, ModelError> {
        lookup(&self.gate_table, name, base_path).ok_or_else(|| ModelError::Undefined {
            kind: "gate",
            name: name.to_string(),
            base_path: base_path.to_string(),
        })
    }

    // Basic events.

    pub fn add_basic_event(&mut self, event: BasicEvent) -> Result<BasicEventId, ModelError> {
        let key = scope_key(event.name(), event.base_path(), event.role());
        let id = BasicEventId(self.basic_events.len());
        self.register_event(key.clone(), "basic event", EventId::Basic(id))?;
        self.basic_event_table.insert(key, id);
        self.basic_events.push(event);
        Ok(id)
    }

    pub fn basic_events(&self) -> &[BasicEvent] {
        &self.basic_events
    }

    pub fn basic_event(&self, id: BasicEventId) -> &BasicEvent {
        &self.basic_events[id.0]
    }

    pub fn basic_event_mut(&mut self, id: BasicEventId) -> &mut BasicEvent {
        &mut self.basic_events[id.0]
    }

    pub fn get_basic_event(&self, name: &str, base_path: &str) -> Result<BasicEventId, ModelError> {
        lookup(&self.basic_event_table, name, base_path).ok_or_else(|| ModelError::Undefined {
            kind: "basic event",
            name: name.to_string(),
            base_path: base_path.to_string(),
        })
    }

    // House events.

    pub fn add_house_event(&mut self, event: HouseEvent) -> Result<HouseEventId, ModelError> {
        let key = scope_key(event.name(), event.base_path(), event.role());
        let id = HouseEventId(self.house_events.len());
        self.register_event(key.clone(), "house event", EventId::House(id))?;
        self.house_event_table.insert(key, id);
        self.house_events.push(event);
        Ok(id)
    }

    pub fn house_events(&self) -> &[HouseEvent] {
        &self.house_events
    }

    pub fn house_event(&self, id: HouseEventId) -> &HouseEvent {
        &self.house_events[id.0]
    }

    pub fn house_event_mut(&mut self, id: HouseEventId) -> &mut HouseEvent {
        &mut self.house_events[id.0]
    }

    pub fn get_house_event(&self, name: &str, base_path: &str) -> Result<HouseEventId, ModelError> {
        lookup(&self.house_event_table, name, base_path).ok_or_else(|| ModelError::Undefined {
            kind: "house event",
            name: name.to_string(),
            base_path: base_path.to_string(),
        })
    }

    /// Resolves a reference that may name any event kind.
    pub fn get_event(&self, name: &str, base_path: &str) -> Result<EventId, ModelError> {
        lookup(&self.event_table, name, base_path).ok_or_else(|| ModelError::Undefined {
            kind: "event",
            name: name.to_string(),
            base_path: base_path.to_string(),
        })
    }

    // Parameters.

    pub fn add_parameter(&mut self, parameter: Parameter) -> Result<ParameterId, ModelError> {
        let key = scope_key(parameter.name(), parameter.base_path(), parameter.role());
        if self.parameter_table.contains_key(&key) {
            return Err(ModelError::Redefinition {
                kind: "parameter",
                name: key,
            });
        }
        let id = ParameterId(self.parameters.len());
        self.parameter_table.insert(key, id);
        self.parameters.push(parameter);
        Ok(id)
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    pub fn parameter(&self, id: ParameterId) -> &Parameter {
        &self.parameters[id.0]
    }

    pub fn parameter_mut(&mut self, id: ParameterId) -> &mut Parameter {
        &mut self.parameters[id.0]
    }

    pub fn get_parameter(&self, name: &str, base_path: &str) -> Result<ParameterId, ModelError> {
        lookup(&self.parameter_table, name, base_path).ok_or_else(|| ModelError::Undefined {
            kind: "parameter",
            name: name.to_string(),
            base_path: base_path.to_string(),
        })
    }

    /// Parameters never referenced by any loaded expression.
    pub fn unused_parameters(&self) -> impl Iterator<Item = &Parameter> {
        self.parameters.iter().filter(|p| p.unused())
    }

    // Sequences.

    pub fn add_sequence(&mut self, sequence: Sequence) -> Result<SequenceId, ModelError> {
        let key = sequence.name().to_string();
        if self.sequence_table.contains_key(&key) {
            return Err(ModelError::Redefinition {
                kind: "sequence",
                name: key,
            });
        }
        let id = SequenceId(self.sequences.len());
        self.sequence_table.insert(key, id);
        self.sequences.push(sequence);
        Ok(id)
    }

    pub fn sequences(&self) -> &[Sequence] {
        &self.sequences
    }

    pub fn sequence(&self, id: SequenceId) -> &Sequence {
        &self.sequences[id.0]
    }

    pub fn sequence_mut(&mut self, id: SequenceId) -> &mut Sequence {
        &mut self.sequences[id.0]
    }

    pub fn get_sequence(&self, name: &str) -> Result<SequenceId, ModelError> {
        self.sequence_table
            .get(name)
            .copied()
            .ok_or_else(|| ModelError::Undefined {
                kind: "sequence",
                name: name.to_string(),
                base_path: String::new(),
            })
    }

    // CCF groups.

    pub fn add_ccf_group(&mut self, group: CcfGroup) -> Result<CcfGroupId, ModelError> {
        let key = scope_key(group.name(), group.base_path(), group.role());
        if self.ccf_group_table.contains_key(&key) {
            return Err(ModelError::Redefinition {
                kind: "CCF group",
                name: key,
            });
        }
        let id = CcfGroupId(self.ccf_groups.len());
        self.ccf_group_table.insert(key, id);
        self.ccf_groups.push(group);
        Ok(id)
    }

    pub fn ccf_groups(&self) -> &[CcfGroup] {
        &self.ccf_groups
    }

    pub fn ccf_group(&self, id: CcfGroupId) -> &CcfGroup {
        &self.ccf_groups[id.0]
    }

    pub fn ccf_group_mut(&mut self, id: CcfGroupId) -> &mut CcfGroup {
        &mut self.ccf_groups[id.0]
    }

    // Event trees.

    pub fn add_event_tree(&mut self, tree: EventTree) -> Result<EventTreeId, ModelError> {
        let key = tree.name().to_string();
        if self.event_tree_table.contains_key(&key) {
            return Err(ModelError::Redefinition {
                kind: "event tree",
                name: key,
            });
        }
        let id = EventTreeId(self.event_trees.len());
        self.event_tree_table.insert(key, id);
        self.event_trees.push(tree);
        Ok(id)
    }

    pub fn event_trees(&self) -> &[EventTree] {
        &self.event_trees
    }

    pub fn event_tree(&self, id: EventTreeId) -> &EventTree {
        &self.event_trees[id.0]
    }

    pub fn event_tree_mut(&mut self, id: EventTreeId) -> &mut EventTree {
        &mut self.event_trees[id.0]
    }

    // Fault trees.

    pub fn add_fault_tree(&mut self, tree: FaultTree) -> Result<FaultTreeId, ModelError> {
        let key = tree.name().to_string();
        if self.fault_tree_table.contains_key(&key) {
            return Err(ModelError::Redefinition {
                kind: "fault tree",
                name: key,
            });
        }
        let id = FaultTreeId(self.fault_trees.len());
        self.fault_tree_table.insert(key, id);
        self.fault_trees.push(tree);
        Ok(id)
    }

    pub fn fault_trees(&self) -> &[FaultTree] {
        &self.fault_trees
    }

    pub fn fault_tree(&self, id: FaultTreeId) -> &FaultTree {
        &self.fault_trees[id.0]
    }

    pub fn fault_tree_mut(&mut self, id: FaultTreeId) -> &mut FaultTree {
        &mut self.fault_trees[id.0]
    }

    // Analysis preparation.

    /// Collects fault tree top events and applies every CCF model.
    ///
    /// Safe to call again: results are recomputed from scratch.
    pub fn setup_for_analysis(&mut self) {
        let top_events: Vec<Vec<GateId>> = self
            .fault_trees
            .iter()
            .map(|tree| self.collect_top_events(tree))
            .collect();
        for (tree, tops) in self.fault_trees.iter_mut().zip(top_events) {
            tree.set_top_events(tops);
        }
        for group in &mut self.ccf_groups {
            group.apply_model();
        }
    }

    fn collect_top_events(&self, tree: &FaultTree) -> Vec<GateId> {
        let mut tree_gates = Vec::new();
        tree.component().collect_gates(&mut tree_gates);
        let in_tree: std::collections::HashSet<GateId> = tree_gates.iter().copied().collect();
        let mut used = std::collections::HashSet::new();
        let mut args = Vec::new();
        for &gate in &tree_gates {
            if let Some(formula) = self.gate(gate).formula() {
                args.clear();
                formula.gate_args(&mut args);
                used.extend(args.iter().copied().filter(|arg| in_tree.contains(arg)));
            }
        }
        tree_gates.retain(|gate| !used.contains(gate));
        tree_gates
    }

    fn register_event(
        &mut self,
        key: String,
        kind: &'static str,
        id: EventId,
    ) -> Result<(), ModelError> {
        if self.event_table.contains_key(&key) {
            return Err(ModelError::Redefinition { kind, name: key });
        }
        self.event_table.insert(key, id);
        Ok(())
    }
}

/// Scoped name resolution: the private full path under the base path and
/// each ancestor path in turn, then the public bare name.
fn lookup<T: Copy>(table: &HashMap<String, T>, name: &str, base_path: &str) -> Option<T> {
    let mut path = base_path;
    while !path.is_empty() {
        if let Some(&id) = table.get(&format!("{path}.{name}")) {
            return Some(id);
        }
        path = match path.rfind('.') {
            Some(dot) => &path[..dot],
            None => "",
        };
    }
    table.get(name).copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::Role;

    fn gate(name: &str, base_path: &str, role: Role) -> Gate {
        Gate::new(Meta::new(name), base_path, role)
    }

    #[test]
    fn round_trip_resolution() {
        let mut model = Model::new(Settings::default());
        let public = model.add_gate(gate("top", "ft", Role::Public)).unwrap();
        let private = model.add_gate(gate("aux", "ft.sub", Role::Private)).unwrap();
        assert_eq!(model.get_gate("top", "").unwrap(), public);
        // Public names resolve from any descendant path.
        assert_eq!(model.get_gate("top", "ft.sub.deep").unwrap(), public);
        assert_eq!(model.get_gate("aux", "ft.sub").unwrap(), private);
        // Private names resolve from descendants of their base path.
        assert_eq!(model.get_gate("aux", "ft.sub.deep").unwrap(), private);
    }

    #[test]
    fn scope_isolation() {
        let mut model = Model::new(Settings::default());
        model.add_gate(gate("aux", "ft.p", Role::Private)).unwrap();
        let err = model.get_gate("aux", "ft.q").unwrap_err();
        assert!(matches!(err, ModelError::Undefined { .. }));
        assert!(model.get_gate("aux", "").is_err());
    }

    #[test]
    fn duplicate_in_same_scope() {
        let mut model = Model::new(Settings::default());
        model.add_gate(gate("g", "ft", Role::Private)).unwrap();
        assert!(model.add_gate(gate("g", "ft", Role::Private)).is_err());
        // The same name in a sibling scope stays legal.
        assert!(model.add_gate(gate("g", "ft2", Role::Private)).is_ok());
    }

    #[test]
    fn event_namespace_is_shared() {
        let mut model = Model::new(Settings::default());
        model
            .add_basic_event(BasicEvent::new(Meta::new("e"), "", Role::Public))
            .unwrap();
        let err = model
            .add_house_event(HouseEvent::new(Meta::new("e"), "", Role::Public))
            .unwrap_err();
        assert!(matches!(err, ModelError::Redefinition { .. }));
        assert!(matches!(
            model.get_event("e", "").unwrap(),
            EventId::Basic(_)
        ));
    }

    #[test]
    fn shared_constants_are_pinned() {
        let model = Model::new(Settings::default());
        assert_eq!(model.constant_value(Expression::ZERO), Some(0.0));
        assert_eq!(model.constant_value(Expression::ONE), Some(1.0));
        assert!(model.house_event(HouseEvent::TRUE).state());
        assert!(!model.house_event(HouseEvent::FALSE).state());
        // The shared events stay out of the symbol tables.
        assert!(model.get_house_event("true", "").is_err());
    }

    #[test]
    fn top_event_collection_is_idempotent() {
        let mut model = Model::new(Settings::default());
        let top = model.add_gate(gate("top", "ft", Role::Public)).unwrap();
        let child = model.add_gate(gate("child", "ft", Role::Public)).unwrap();
        let mut formula = crate::Formula::new(crate::Operator::Null);
        formula.add_argument(crate::Arg::Gate(child));
        model.gate_mut(top).set_formula(formula);
        let mut tree = FaultTree::new(Meta::new("ft"));
        tree.component_mut().add_gate(top);
        tree.component_mut().add_gate(child);
        let tree = model.add_fault_tree(tree).unwrap();
        model.setup_for_analysis();
        assert_eq!(model.fault_tree(tree).top_events(), &[top]);
        model.setup_for_analysis();
        assert_eq!(model.fault_tree(tree).top_events(), &[top]);
    }
}
