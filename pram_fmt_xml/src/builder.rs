//! Two-phase construction of the analysis model from MEF documents.
//!
//! The first pass registers every named construct and queues the bodies
//! that need forward-reference-capable resolution; the second pass defines
//! those bodies, then validation rejects cycles and contract violations
//! and the model is prepared for analysis.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use log::{debug, info, warn};

use pram_core::{
    branch_cycle, gate_cycle, parameter_cycle, Attribute, BasicEvent, BasicEventId, Branch,
    CcfGroup, CcfGroupId, CcfModel, Component, EventTree, EventTreeId, ExprId, FaultTree, Fork,
    FunctionalEvent, Gate, GateId, HouseEvent, HouseEventId, Instruction, Meta, Model,
    NamedBranch, Parameter, ParameterId, Path as ForkPath, Role, Sequence, SequenceId, Settings,
    Target, Units,
};

use crate::error::Error;
use crate::vocabulary::*;
use crate::xml::{self, Element};

/// A registered construct whose body still awaits definition.
#[derive(Debug, Clone, Copy)]
enum Tbd {
    Gate(GateId),
    BasicEvent(BasicEventId),
    Parameter(ParameterId),
    CcfGroup(CcfGroupId),
    Sequence(SequenceId),
    EventTree(EventTreeId),
}

#[derive(Debug)]
struct TbdItem {
    entity: Tbd,
    element: Element,
    file: usize,
}

/// An operator expression awaiting validation after cycle detection.
#[derive(Debug, Clone, Copy)]
pub(crate) struct DeferredExpression {
    pub(crate) id: ExprId,
    pub(crate) line: usize,
    pub(crate) file: usize,
}

/// Builds a [`Model`] out of MEF documents.
pub struct ModelBuilder {
    pub(crate) model: Model,
    settings: Settings,
    files: Vec<PathBuf>,
    tbd: Vec<TbdItem>,
    pub(crate) deferred: Vec<DeferredExpression>,
    pub(crate) current_file: usize,
}

impl ModelBuilder {
    /// Loads and validates a model from the given MEF documents.
    pub fn load<P: AsRef<Path>>(files: &[P], settings: Settings) -> anyhow::Result<Model> {
        let files: Vec<PathBuf> = files.iter().map(|p| p.as_ref().to_path_buf()).collect();
        check_existence(&files)?;
        check_duplicates(&files)?;
        let mut builder = ModelBuilder {
            model: Model::new(settings),
            settings,
            files,
            tbd: Vec::new(),
            deferred: Vec::new(),
            current_file: 0,
        };
        info!("processing input files");
        for index in 0..builder.files.len() {
            builder.current_file = index;
            let path = builder.files[index].clone();
            debug!("processing {}", path.display());
            builder
                .process_file(&path)
                .map_err(|err| err.in_file(&path))?;
        }
        debug!("defining registered constructs");
        builder.process_deferred()?;
        info!("validating the initialization");
        builder.validate()?;
        info!("setting up for analysis");
        builder.model.setup_for_analysis();
        Ok(builder.model)
    }

    // First pass: registration.

    fn process_file(&mut self, path: &Path) -> Result<(), Error> {
        let root = xml::parse_file(path)?;
        if root.name != TAG_OPSA_MEF {
            return Err(Error::validation_at(
                root.line,
                format!("Invalid root element {}; expected {TAG_OPSA_MEF}.", root.name),
            ));
        }
        // Only the first document may name and decorate the model itself.
        if self.current_file == 0 {
            if let Some(name) = root.attribute(ATTR_NAME) {
                *self.model.meta_mut() = Meta::new(name);
            }
            let mut meta = std::mem::take(self.model.meta_mut());
            self.decorate(&root, &mut meta)?;
            *self.model.meta_mut() = meta;
        }
        for child in &root.children {
            if !matches!(
                child.name.as_str(),
                TAG_LABEL
                    | TAG_ATTRIBUTES
                    | TAG_DEFINE_EVENT_TREE
                    | TAG_DEFINE_FAULT_TREE
                    | TAG_DEFINE_CCF_GROUP
                    | TAG_MODEL_DATA
            ) {
                return Err(Error::validation_at(
                    child.line,
                    format!("Invalid top-level construct {}.", child.name),
                ));
            }
        }
        for node in root.children_named(TAG_DEFINE_EVENT_TREE) {
            self.define_event_tree(node)?;
        }
        for node in root.children_named(TAG_DEFINE_FAULT_TREE) {
            self.define_fault_tree(node)?;
        }
        for node in root.children_named(TAG_DEFINE_CCF_GROUP) {
            self.register_ccf_group(node, "", Role::Public)?;
        }
        for node in root.children_named(TAG_MODEL_DATA) {
            self.process_model_data(node)?;
        }
        Ok(())
    }

    fn process_model_data(&mut self, element: &Element) -> Result<(), Error> {
        for child in &element.children {
            if !matches!(
                child.name.as_str(),
                TAG_DEFINE_HOUSE_EVENT | TAG_DEFINE_BASIC_EVENT | TAG_DEFINE_PARAMETER
            ) {
                return Err(Error::validation_at(
                    child.line,
                    format!("Invalid model-data construct {}.", child.name),
                ));
            }
        }
        for node in element.children_named(TAG_DEFINE_HOUSE_EVENT) {
            self.register_house_event(node, "", Role::Public)?;
        }
        for node in element.children_named(TAG_DEFINE_BASIC_EVENT) {
            self.register_basic_event(node, "", Role::Public)?;
        }
        for node in element.children_named(TAG_DEFINE_PARAMETER) {
            self.register_parameter(node, "", Role::Public)?;
        }
        Ok(())
    }

    fn define_fault_tree(&mut self, element: &Element) -> Result<(), Error> {
        let meta = self.construct_meta(element)?;
        let base_path = meta.name().to_string();
        let mut tree = FaultTree::new(meta);
        self.register_component_data(element, &base_path, tree.component_mut())?;
        self.model
            .add_fault_tree(tree)
            .map_err(|err| Error::validation_at(element.line, err.to_string()))?;
        Ok(())
    }

    fn define_component(
        &mut self,
        element: &Element,
        base_path: &str,
        parent_role: Role,
    ) -> Result<Component, Error> {
        let meta = self.construct_meta(element)?;
        let role = self.role_of(element, parent_role)?;
        let inner_path = format!("{base_path}.{}", meta.name());
        let mut component = Component::new(meta, base_path, role);
        self.register_component_data(element, &inner_path, &mut component)?;
        Ok(component)
    }

    /// Registers a container's contents in the fixed order: house events,
    /// basic events, parameters, gates, CCF groups, sub-components.
    fn register_component_data(
        &mut self,
        element: &Element,
        base_path: &str,
        component: &mut Component,
    ) -> Result<(), Error> {
        for child in &element.children {
            if !matches!(
                child.name.as_str(),
                TAG_LABEL
                    | TAG_ATTRIBUTES
                    | TAG_DEFINE_HOUSE_EVENT
                    | TAG_DEFINE_BASIC_EVENT
                    | TAG_DEFINE_PARAMETER
                    | TAG_DEFINE_GATE
                    | TAG_DEFINE_CCF_GROUP
                    | TAG_DEFINE_COMPONENT
            ) {
                return Err(Error::validation_at(
                    child.line,
                    format!("Invalid construct {} in a fault tree container.", child.name),
                ));
            }
        }
        for node in element.children_named(TAG_DEFINE_HOUSE_EVENT) {
            let id = self.register_house_event(node, base_path, component.role())?;
            component.add_house_event(id);
        }
        for node in element.children_named(TAG_DEFINE_BASIC_EVENT) {
            let id = self.register_basic_event(node, base_path, component.role())?;
            component.add_basic_event(id);
        }
        for node in element.children_named(TAG_DEFINE_PARAMETER) {
            let id = self.register_parameter(node, base_path, component.role())?;
            component.add_parameter(id);
        }
        for node in element.children_named(TAG_DEFINE_GATE) {
            let id = self.register_gate(node, base_path, component.role())?;
            component.add_gate(id);
        }
        for node in element.children_named(TAG_DEFINE_CCF_GROUP) {
            let id = self.register_ccf_group(node, base_path, component.role())?;
            component.add_ccf_group(id);
        }
        // Sub-components register their contents first, then join the
        // parent, so collisions surface in source order.
        for node in element.children_named(TAG_DEFINE_COMPONENT) {
            let sub = self.define_component(node, base_path, component.role())?;
            component
                .add_component(sub)
                .map_err(|err| Error::validation_at(node.line, err.to_string()))?;
        }
        Ok(())
    }

    fn register_gate(
        &mut self,
        element: &Element,
        base_path: &str,
        parent_role: Role,
    ) -> Result<GateId, Error> {
        let meta = self.construct_meta(element)?;
        let role = self.role_of(element, parent_role)?;
        let id = self
            .model
            .add_gate(Gate::new(meta, base_path, role))
            .map_err(|err| Error::validation_at(element.line, err.to_string()))?;
        self.defer(Tbd::Gate(id), element);
        Ok(id)
    }

    fn register_basic_event(
        &mut self,
        element: &Element,
        base_path: &str,
        parent_role: Role,
    ) -> Result<BasicEventId, Error> {
        let meta = self.construct_meta(element)?;
        let role = self.role_of(element, parent_role)?;
        let id = self
            .model
            .add_basic_event(BasicEvent::new(meta, base_path, role))
            .map_err(|err| Error::validation_at(element.line, err.to_string()))?;
        self.defer(Tbd::BasicEvent(id), element);
        Ok(id)
    }

    fn register_house_event(
        &mut self,
        element: &Element,
        base_path: &str,
        parent_role: Role,
    ) -> Result<HouseEventId, Error> {
        let meta = self.construct_meta(element)?;
        let role = self.role_of(element, parent_role)?;
        let id = self
            .model
            .add_house_event(HouseEvent::new(meta, base_path, role))
            .map_err(|err| Error::validation_at(element.line, err.to_string()))?;
        // The boolean state completes the definition right away.
        if let Some(constant) = element.children_named(TAG_CONSTANT).next() {
            let value = self.required_attribute(constant, ATTR_VALUE)?;
            self.model.house_event_mut(id).set_state(value == "true");
        }
        Ok(id)
    }

    fn register_parameter(
        &mut self,
        element: &Element,
        base_path: &str,
        parent_role: Role,
    ) -> Result<ParameterId, Error> {
        let meta = self.construct_meta(element)?;
        let role = self.role_of(element, parent_role)?;
        let id = self
            .model
            .add_parameter(Parameter::new(meta, base_path, role))
            .map_err(|err| Error::validation_at(element.line, err.to_string()))?;
        self.defer(Tbd::Parameter(id), element);
        if let Some(unit) = element.attribute(ATTR_UNIT) {
            let unit = Units::parse(unit).ok_or_else(|| {
                Error::validation_at(element.line, format!("Unknown unit {unit}."))
            })?;
            self.model.parameter_mut(id).set_unit(unit);
        }
        Ok(id)
    }

    fn register_ccf_group(
        &mut self,
        element: &Element,
        base_path: &str,
        parent_role: Role,
    ) -> Result<CcfGroupId, Error> {
        let model = self.required_attribute(element, ATTR_MODEL)?;
        let model = CcfModel::parse(model).ok_or_else(|| {
            Error::validation_at(element.line, format!("Unknown CCF model {model}."))
        })?;
        let meta = self.construct_meta(element)?;
        let role = self.role_of(element, parent_role)?;
        let id = self
            .model
            .add_ccf_group(CcfGroup::new(meta, base_path, role, model))
            .map_err(|err| Error::validation_at(element.line, err.to_string()))?;
        let members = element.children_named(TAG_MEMBERS).next().ok_or_else(|| {
            Error::validation_at(element.line, "A CCF group requires a members element.")
        })?;
        self.process_ccf_members(members, id)?;
        self.defer(Tbd::CcfGroup(id), element);
        Ok(id)
    }

    /// Members are fresh basic events under the group's path and role;
    /// they join the group and the model alike.
    fn process_ccf_members(&mut self, element: &Element, group: CcfGroupId) -> Result<(), Error> {
        let base_path = self.model.ccf_group(group).base_path().to_string();
        let role = self.model.ccf_group(group).role();
        for node in &element.children {
            if node.name != TAG_BASIC_EVENT {
                return Err(Error::validation_at(
                    node.line,
                    format!("Invalid CCF member element {}.", node.name),
                ));
            }
            let name = self.required_attribute(node, ATTR_NAME)?.to_string();
            if self.model.ccf_group(group).has_member(&name) {
                let group_name = self.model.ccf_group(group).name();
                return Err(Error::DuplicateArgument(format!(
                    "At line {}, Duplicate member {name} in CCF group {group_name}.",
                    node.line
                )));
            }
            let event = BasicEvent::new(Meta::new(&name), base_path.clone(), role);
            let id = self
                .model
                .add_basic_event(event)
                .map_err(|err| Error::validation_at(node.line, err.to_string()))?;
            self.model.basic_event_mut(id).set_ccf_group(group);
            self.model
                .ccf_group_mut(group)
                .add_member(id, &name)
                .map_err(|err| Error::validation_at(node.line, err.to_string()))?;
        }
        Ok(())
    }

    fn register_sequence(&mut self, element: &Element) -> Result<SequenceId, Error> {
        let meta = self.construct_meta(element)?;
        let id = self
            .model
            .add_sequence(Sequence::new(meta))
            .map_err(|err| Error::validation_at(element.line, err.to_string()))?;
        self.defer(Tbd::Sequence(id), element);
        Ok(id)
    }

    /// Registers the tree shell: functional events, sequences and named
    /// branches get their names now, branch bodies wait for the second pass.
    fn define_event_tree(&mut self, element: &Element) -> Result<(), Error> {
        let meta = self.construct_meta(element)?;
        let mut tree = EventTree::new(meta);
        for node in element.children_named(TAG_DEFINE_FUNCTIONAL_EVENT) {
            let meta = self.construct_meta(node)?;
            tree.add_functional_event(FunctionalEvent::new(meta))
                .map_err(|err| Error::validation_at(node.line, err.to_string()))?;
        }
        for node in element.children_named(TAG_DEFINE_SEQUENCE) {
            tree.add_sequence(self.register_sequence(node)?);
        }
        for node in element.children_named(TAG_DEFINE_BRANCH) {
            let meta = self.construct_meta(node)?;
            tree.add_branch(NamedBranch::new(meta))
                .map_err(|err| Error::validation_at(node.line, err.to_string()))?;
        }
        let id = self
            .model
            .add_event_tree(tree)
            .map_err(|err| Error::validation_at(element.line, err.to_string()))?;
        self.defer(Tbd::EventTree(id), element);
        Ok(())
    }

    fn defer(&mut self, entity: Tbd, element: &Element) {
        self.tbd.push(TbdItem {
            entity,
            element: element.clone(),
            file: self.current_file,
        });
    }

    // Second pass: deferred definition.

    fn process_deferred(&mut self) -> Result<(), Error> {
        let items = std::mem::take(&mut self.tbd);
        for item in &items {
            self.current_file = item.file;
            self.define_item(item)
                .map_err(|err| err.in_file(&self.files[item.file]))?;
        }
        Ok(())
    }

    fn define_item(&mut self, item: &TbdItem) -> Result<(), Error> {
        match item.entity {
            Tbd::Gate(id) => self.define_gate(&item.element, id),
            Tbd::BasicEvent(id) => self.define_basic_event(&item.element, id),
            Tbd::Parameter(id) => self.define_parameter(&item.element, id),
            Tbd::CcfGroup(id) => self.define_ccf_group(&item.element, id),
            Tbd::Sequence(id) => self.define_sequence(&item.element, id),
            Tbd::EventTree(id) => self.define_event_tree_body(&item.element, id),
        }
    }

    fn define_gate(&mut self, element: &Element, id: GateId) -> Result<(), Error> {
        let body = element.non_meta_children();
        if body.len() != 1 {
            return Err(Error::validation_at(
                element.line,
                format!(
                    "Gate {} must be defined by exactly one formula.",
                    self.model.gate(id).name()
                ),
            ));
        }
        let base_path = self.model.gate(id).base_path().to_string();
        let formula = self.formula(body[0], &base_path)?;
        self.model.gate_mut(id).set_formula(formula);
        self.model
            .gate(id)
            .validate()
            .map_err(|err| Error::validation_at(element.line, err.to_string()))
    }

    /// With several expression children the last one wins, matching the
    /// established behavior for basic event bodies.
    fn define_basic_event(&mut self, element: &Element, id: BasicEventId) -> Result<(), Error> {
        let body = element.non_meta_children();
        if let Some(node) = body.last() {
            let base_path = self.model.basic_event(id).base_path().to_string();
            let expression = self.expression(node, &base_path)?;
            self.model.basic_event_mut(id).set_expression(expression);
        }
        Ok(())
    }

    fn define_parameter(&mut self, element: &Element, id: ParameterId) -> Result<(), Error> {
        let body = element.non_meta_children();
        if body.len() != 1 {
            return Err(Error::validation_at(
                element.line,
                format!(
                    "Parameter {} must be defined by exactly one expression.",
                    self.model.parameter(id).name()
                ),
            ));
        }
        let base_path = self.model.parameter(id).base_path().to_string();
        let expression = self.expression(body[0], &base_path)?;
        self.model.parameter_mut(id).set_expression(expression);
        Ok(())
    }

    fn define_ccf_group(&mut self, element: &Element, id: CcfGroupId) -> Result<(), Error> {
        let base_path = self.model.ccf_group(id).base_path().to_string();
        for node in &element.children {
            match node.name.as_str() {
                TAG_DISTRIBUTION => {
                    if node.children.len() != 1 {
                        return Err(Error::validation_at(
                            node.line,
                            "A distribution holds exactly one expression.",
                        ));
                    }
                    let expression = self.expression(&node.children[0], &base_path)?;
                    self.model.ccf_group_mut(id).set_distribution(expression);
                }
                TAG_FACTOR => self.define_ccf_factor(node, id, &base_path)?,
                TAG_FACTORS => {
                    for factor in &node.children {
                        self.define_ccf_factor(factor, id, &base_path)?;
                    }
                }
                TAG_MEMBERS | TAG_LABEL | TAG_ATTRIBUTES => {}
                other => {
                    return Err(Error::validation_at(
                        node.line,
                        format!("Invalid construct {other} in a CCF group."),
                    ));
                }
            }
        }
        Ok(())
    }

    fn define_ccf_factor(
        &mut self,
        element: &Element,
        group: CcfGroupId,
        base_path: &str,
    ) -> Result<(), Error> {
        if element.name != TAG_FACTOR || element.children.len() != 1 {
            return Err(Error::validation_at(
                element.line,
                "A factor holds exactly one expression.",
            ));
        }
        let expression = self.expression(&element.children[0], base_path)?;
        let level = match element.attribute(ATTR_LEVEL) {
            Some(raw) => Some(raw.parse::<usize>().map_err(|_| {
                Error::validation_at(element.line, format!("Invalid factor level {raw}."))
            })?),
            None => None,
        };
        self.model
            .ccf_group_mut(group)
            .add_factor(expression, level)
            .map_err(|err| Error::validation_at(element.line, err.to_string()))
    }

    fn define_sequence(&mut self, element: &Element, id: SequenceId) -> Result<(), Error> {
        let mut instructions = Vec::new();
        for node in element.non_meta_children() {
            instructions.push(self.instruction(node)?);
        }
        self.model.sequence_mut(id).set_instructions(instructions);
        Ok(())
    }

    fn instruction(&mut self, element: &Element) -> Result<Instruction, Error> {
        if element.name != TAG_COLLECT_EXPRESSION || element.children.len() != 1 {
            return Err(Error::validation_at(
                element.line,
                format!("Unknown instruction {}.", element.name),
            ));
        }
        let expression = self.expression(&element.children[0], "")?;
        Ok(Instruction::CollectExpression(expression))
    }

    fn define_event_tree_body(&mut self, element: &Element, id: EventTreeId) -> Result<(), Error> {
        for node in element.children_named(TAG_DEFINE_BRANCH) {
            let name = self.required_attribute(node, ATTR_NAME)?;
            let branch = self
                .model
                .event_tree(id)
                .branch_index(name)
                .expect("named branches register in the first pass");
            let body = node.non_meta_children();
            let defined = self.define_branch(&body, node.line, id)?;
            self.model
                .event_tree_mut(id)
                .branch_mut(branch)
                .set_branch(defined);
        }
        let initial = element
            .children_named(TAG_INITIAL_STATE)
            .next()
            .ok_or_else(|| {
                Error::validation_at(
                    element.line,
                    format!(
                        "Event tree {} has no initial state.",
                        self.model.event_tree(id).name()
                    ),
                )
            })?;
        let body: Vec<&Element> = initial.children.iter().collect();
        let defined = self.define_branch(&body, initial.line, id)?;
        self.model.event_tree_mut(id).set_initial_state(defined);
        Ok(())
    }

    /// The trailing node is the branch target; everything before it is an
    /// instruction.
    fn define_branch(
        &mut self,
        nodes: &[&Element],
        line: usize,
        tree: EventTreeId,
    ) -> Result<Branch, Error> {
        let Some((&target_node, instruction_nodes)) = nodes.split_last() else {
            return Err(Error::validation_at(line, "A branch requires a target."));
        };
        let target = match target_node.name.as_str() {
            TAG_FORK => {
                let name = self
                    .required_attribute(target_node, ATTR_FUNCTIONAL_EVENT)?
                    .to_string();
                let tree_name = self.model.event_tree(tree).name().to_string();
                let functional = self
                    .model
                    .event_tree(tree)
                    .functional_event_index(&name)
                    .ok_or_else(|| {
                        Error::validation_at(
                            target_node.line,
                            format!("Functional event {name} is not defined in {tree_name}."),
                        )
                    })?;
                let mut paths = Vec::new();
                for path_node in &target_node.children {
                    if path_node.name != TAG_PATH {
                        return Err(Error::validation_at(
                            path_node.line,
                            format!("Invalid fork element {}.", path_node.name),
                        ));
                    }
                    let state = self.required_attribute(path_node, ATTR_STATE)?.to_string();
                    let body: Vec<&Element> = path_node.children.iter().collect();
                    let branch = self.define_branch(&body, path_node.line, tree)?;
                    paths.push(ForkPath::new(state, branch));
                }
                if paths.is_empty() {
                    return Err(Error::validation_at(
                        target_node.line,
                        "A fork requires at least one path.",
                    ));
                }
                let fork = Fork::new(functional, paths);
                Target::Fork(self.model.event_tree_mut(tree).add_fork(fork))
            }
            TAG_SEQUENCE => {
                let name = self.required_attribute(target_node, ATTR_NAME)?;
                let sequence = self.model.get_sequence(name).map_err(|_| {
                    Error::validation_at(
                        target_node.line,
                        format!("Sequence {name} is not defined in the model."),
                    )
                })?;
                Target::Sequence(sequence)
            }
            TAG_BRANCH => {
                let name = self.required_attribute(target_node, ATTR_NAME)?;
                let branch = self
                    .model
                    .event_tree(tree)
                    .branch_index(name)
                    .ok_or_else(|| {
                        let tree_name = self.model.event_tree(tree).name();
                        Error::validation_at(
                            target_node.line,
                            format!("Branch {name} is not defined in {tree_name}."),
                        )
                    })?;
                Target::Branch(branch)
            }
            other => {
                return Err(Error::validation_at(
                    target_node.line,
                    format!("Invalid branch target {other}."),
                ));
            }
        };
        let mut instructions = Vec::new();
        for node in instruction_nodes {
            instructions.push(self.instruction(node)?);
        }
        Ok(Branch::new(instructions, target))
    }

    // Validation.

    fn validate(&mut self) -> Result<(), Error> {
        if let Some(cycle) = gate_cycle(&self.model) {
            return Err(Error::Cycle(format!(
                "Detected a cycle in {} gate:\n{}",
                cycle[0],
                cycle.join("->")
            )));
        }
        for tree in self.model.event_trees() {
            if let Some(cycle) = branch_cycle(tree) {
                return Err(Error::Cycle(format!(
                    "Detected a cycle in {} branch:\n{}",
                    cycle[0],
                    cycle.join("->")
                )));
            }
        }
        if self.settings.probability_analysis_requested() {
            let mut missing = String::new();
            for event in self.model.basic_events() {
                if !event.has_expression() {
                    missing.push_str(event.name());
                    missing.push('\n');
                }
            }
            if !missing.is_empty() {
                return Err(Error::Validation(format!(
                    "These basic events do not have expressions:\n{missing}"
                )));
            }
        }
        // Parameter cycles must go before expression validation: validating
        // an expression over a cyclic parameter would not terminate.
        if let Some(cycle) = parameter_cycle(&self.model) {
            return Err(Error::Cycle(format!(
                "Detected a cycle in {} parameter:\n{}",
                cycle[0],
                cycle.join("->")
            )));
        }
        for deferred in &self.deferred {
            self.model
                .expression(deferred.id)
                .validate(&self.model)
                .map_err(|err| {
                    Error::validation_at(deferred.line, err.to_string())
                        .in_file(&self.files[deferred.file])
                })?;
        }
        let mut invalid = String::new();
        for group in self.model.ccf_groups() {
            if let Err(err) = group.validate() {
                invalid.push_str(&err.to_string());
                invalid.push('\n');
            }
        }
        if !invalid.is_empty() {
            return Err(Error::Validation(format!(
                "Invalid distributions for CCF groups detected:\n{invalid}"
            )));
        }
        let mut invalid = String::new();
        for event in self.model.basic_events() {
            if let Some(expression) = event.expression() {
                if let Some(value) = self.model.constant_value(expression) {
                    if !(0.0..=1.0).contains(&value) {
                        invalid.push_str(&format!(
                            "Invalid probability {value} for basic event {}.\n",
                            event.name()
                        ));
                    }
                }
            }
        }
        if !invalid.is_empty() {
            return Err(Error::Validation(format!(
                "Invalid basic event probabilities detected:\n{invalid}"
            )));
        }
        for parameter in self.model.unused_parameters() {
            warn!("Unused parameter {}", parameter.name());
        }
        Ok(())
    }

    // Shared element helpers.

    /// Reads the name and attaches the optional label and attribute list.
    fn construct_meta(&self, element: &Element) -> Result<Meta, Error> {
        let name = self.required_attribute(element, ATTR_NAME)?;
        let mut meta = Meta::new(name);
        self.decorate(element, &mut meta)?;
        Ok(meta)
    }

    fn decorate(&self, element: &Element, meta: &mut Meta) -> Result<(), Error> {
        if let Some(label) = element.children_named(TAG_LABEL).next() {
            if let Some(text) = &label.text {
                meta.set_label(text);
            }
        }
        if let Some(attributes) = element.children_named(TAG_ATTRIBUTES).next() {
            for node in attributes.children_named(TAG_ATTRIBUTE) {
                meta.add_attribute(Attribute {
                    name: self.required_attribute(node, ATTR_NAME)?.to_string(),
                    value: self.required_attribute(node, ATTR_VALUE)?.to_string(),
                    kind: node.attribute(ATTR_TYPE).map(str::to_string),
                });
            }
        }
        Ok(())
    }

    fn role_of(&self, element: &Element, parent_role: Role) -> Result<Role, Error> {
        let explicit = match element.attribute(ATTR_ROLE) {
            Some(raw) => Some(Role::parse(raw).ok_or_else(|| {
                Error::validation_at(element.line, format!("Invalid role specifier {raw}."))
            })?),
            None => None,
        };
        Ok(Role::resolve(explicit, parent_role))
    }

    pub(crate) fn required_attribute<'a>(
        &self,
        element: &'a Element,
        name: &str,
    ) -> Result<&'a str, Error> {
        element.attribute(name).ok_or_else(|| {
            Error::validation_at(
                element.line,
                format!("Missing attribute {name} in {}.", element.name),
            )
        })
    }

    pub(crate) fn parsed_attribute<T: FromStr>(
        &self,
        element: &Element,
        name: &str,
    ) -> Result<T, Error> {
        let raw = self.required_attribute(element, name)?;
        raw.parse().map_err(|_| {
            Error::validation_at(
                element.line,
                format!("Cannot interpret the {name} attribute value {raw}."),
            )
        })
    }
}

fn check_existence(files: &[PathBuf]) -> Result<(), Error> {
    for file in files {
        if !file.exists() {
            return Err(Error::Io(format!("File doesn't exist: {}", file.display())));
        }
    }
    Ok(())
}

/// Canonicalises the input paths and rejects duplicates, listing every
/// spelling of the first offending path.
fn check_duplicates(files: &[PathBuf]) -> Result<(), Error> {
    let mut resolved = Vec::with_capacity(files.len());
    for file in files {
        let canonical = file.canonicalize().map_err(|err| {
            Error::Io(format!("Cannot resolve path {}: {err}", file.display()))
        })?;
        resolved.push((canonical, file));
    }
    resolved.sort_by(|lhs, rhs| lhs.0.cmp(&rhs.0));
    for pair in resolved.windows(2) {
        if pair[0].0 != pair[1].0 {
            continue;
        }
        let mut msg = String::from("Duplicate input files:\n");
        for (_, original) in resolved.iter().filter(|(c, _)| *c == pair[0].0) {
            msg.push_str(&format!("    {}\n", original.display()));
        }
        msg.push_str(&format!("  POSIX Path: {}", pair[0].0.display()));
        return Err(Error::DuplicateArgument(msg));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pram_core::ModelError;

    #[test]
    fn missing_file_is_an_io_error() {
        let err = check_existence(&[PathBuf::from("./no/such/model.xml")]).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
        assert!(err.to_string().contains("File doesn't exist"));
    }

    #[test]
    fn model_error_kinds_map_to_loader_kinds() {
        let undefined = ModelError::Undefined {
            kind: "gate",
            name: "g".into(),
            base_path: "ft".into(),
        };
        assert!(matches!(Error::from(undefined), Error::Validation(_)));
        let duplicate = ModelError::DuplicateArgument("dup".into());
        assert!(matches!(Error::from(duplicate), Error::DuplicateArgument(_)));
    }
}
