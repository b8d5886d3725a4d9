//! Fault tree events and the boolean formulas connecting them.

use smallvec::SmallVec;

use crate::ccf::CcfGroupId;
use crate::element::{Meta, Role};
use crate::expression::ExprId;
use crate::model::ModelError;

/// An indexing object for gates owned by a [`crate::Model`].
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub struct GateId(pub(crate) usize);

impl From<GateId> for usize {
    fn from(val: GateId) -> Self {
        val.0
    }
}

/// An indexing object for basic events owned by a [`crate::Model`].
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub struct BasicEventId(pub(crate) usize);

impl From<BasicEventId> for usize {
    fn from(val: BasicEventId) -> Self {
        val.0
    }
}

/// An indexing object for house events owned by a [`crate::Model`].
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub struct HouseEventId(pub(crate) usize);

impl From<HouseEventId> for usize {
    fn from(val: HouseEventId) -> Self {
        val.0
    }
}

/// A reference to any event kind, for untyped `event` lookups.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub enum EventId {
    Gate(GateId),
    Basic(BasicEventId),
    House(HouseEventId),
}

/// Boolean connectives of formulas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    And,
    Or,
    /// At-least-k-out-of-n, with the threshold in the formula's vote number.
    Vote,
    Xor,
    Not,
    Nand,
    Nor,
    /// Single-argument pass-through.
    Null,
}

impl Operator {
    pub fn parse(s: &str) -> Option<Operator> {
        Some(match s {
            "and" => Operator::And,
            "or" => Operator::Or,
            "atleast" => Operator::Vote,
            "xor" => Operator::Xor,
            "not" => Operator::Not,
            "nand" => Operator::Nand,
            "nor" => Operator::Nor,
            "null" => Operator::Null,
            _ => return None,
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::And => "and",
            Operator::Or => "or",
            Operator::Vote => "atleast",
            Operator::Xor => "xor",
            Operator::Not => "not",
            Operator::Nand => "nand",
            Operator::Nor => "nor",
            Operator::Null => "null",
        }
    }
}

/// A formula argument: an event reference or a nested formula.
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    Gate(GateId),
    Basic(BasicEventId),
    House(HouseEventId),
    Formula(Box<Formula>),
}

impl From<EventId> for Arg {
    fn from(event: EventId) -> Self {
        match event {
            EventId::Gate(id) => Arg::Gate(id),
            EventId::Basic(id) => Arg::Basic(id),
            EventId::House(id) => Arg::House(id),
        }
    }
}

/// A boolean formula over events and nested formulas.
#[derive(Debug, Clone, PartialEq)]
pub struct Formula {
    operator: Operator,
    vote_number: Option<u32>,
    args: SmallVec<[Arg; 4]>,
}

impl Formula {
    pub fn new(operator: Operator) -> Self {
        Formula {
            operator,
            vote_number: None,
            args: SmallVec::new(),
        }
    }

    pub fn operator(&self) -> Operator {
        self.operator
    }

    pub fn vote_number(&self) -> Option<u32> {
        self.vote_number
    }

    pub fn set_vote_number(&mut self, number: u32) {
        self.vote_number = Some(number);
    }

    pub fn args(&self) -> &[Arg] {
        &self.args
    }

    pub fn add_argument(&mut self, arg: Arg) {
        self.args.push(arg);
    }

    /// Checks the operator's arity and the vote threshold bounds.
    pub fn validate(&self) -> Result<(), ModelError> {
        let count = self.args.len();
        if self.vote_number.is_some() && self.operator != Operator::Vote {
            return Err(ModelError::InvalidArgument(format!(
                "Vote number is not allowed for operator {}.",
                self.operator.as_str()
            )));
        }
        match self.operator {
            Operator::Null | Operator::Not => {
                if count != 1 {
                    return Err(ModelError::InvalidArgument(format!(
                        "Operator {} requires exactly one argument; got {count}.",
                        self.operator.as_str()
                    )));
                }
            }
            Operator::Xor => {
                if count != 2 {
                    return Err(ModelError::InvalidArgument(format!(
                        "Operator xor requires exactly two arguments; got {count}."
                    )));
                }
            }
            Operator::Vote => {
                let number = self.vote_number.ok_or_else(|| {
                    ModelError::InvalidArgument("Missing vote number for atleast operator.".into())
                })?;
                if count < 2 || number < 1 || number as usize >= count {
                    return Err(ModelError::InvalidArgument(format!(
                        "Invalid vote number {number} for a formula with {count} arguments."
                    )));
                }
            }
            Operator::And | Operator::Or | Operator::Nand | Operator::Nor => {
                if count < 2 {
                    return Err(ModelError::InvalidArgument(format!(
                        "Operator {} requires at least two arguments; got {count}.",
                        self.operator.as_str()
                    )));
                }
            }
        }
        Ok(())
    }

    /// Appends every gate referenced by this formula, nested formulas
    /// included, to `out`.
    pub(crate) fn gate_args(&self, out: &mut Vec<GateId>) {
        for arg in &self.args {
            match arg {
                Arg::Gate(id) => out.push(*id),
                Arg::Formula(nested) => nested.gate_args(out),
                Arg::Basic(_) | Arg::House(_) => {}
            }
        }
    }
}

/// An intermediate fault tree event defined by a formula.
#[derive(Debug, Clone)]
pub struct Gate {
    meta: Meta,
    base_path: String,
    role: Role,
    formula: Option<Formula>,
}

impl Gate {
    pub fn new(meta: Meta, base_path: impl Into<String>, role: Role) -> Self {
        Gate {
            meta,
            base_path: base_path.into(),
            role,
            formula: None,
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

    pub fn formula(&self) -> Option<&Formula> {
        self.formula.as_ref()
    }

    pub fn set_formula(&mut self, formula: Formula) {
        self.formula = Some(formula);
    }

    pub fn validate(&self) -> Result<(), ModelError> {
        match &self.formula {
            Some(formula) => formula.validate(),
            None => Err(ModelError::InvalidArgument(format!(
                "Gate {} has no formula.",
                self.name()
            ))),
        }
    }
}

/// A leaf event carrying an optional probability expression.
#[derive(Debug, Clone)]
pub struct BasicEvent {
    meta: Meta,
    base_path: String,
    role: Role,
    expression: Option<ExprId>,
    ccf_group: Option<CcfGroupId>,
}

impl BasicEvent {
    pub fn new(meta: Meta, base_path: impl Into<String>, role: Role) -> Self {
        BasicEvent {
            meta,
            base_path: base_path.into(),
            role,
            expression: None,
            ccf_group: None,
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

    pub fn expression(&self) -> Option<ExprId> {
        self.expression
    }

    pub fn set_expression(&mut self, expression: ExprId) {
        self.expression = Some(expression);
    }

    pub fn has_expression(&self) -> bool {
        self.expression.is_some()
    }

    /// The CCF group this event is a member of, if any.
    pub fn ccf_group(&self) -> Option<CcfGroupId> {
        self.ccf_group
    }

    pub fn set_ccf_group(&mut self, group: CcfGroupId) {
        self.ccf_group = Some(group);
    }
}

/// A leaf event with a fixed boolean state.
#[derive(Debug, Clone)]
pub struct HouseEvent {
    meta: Meta,
    base_path: String,
    role: Role,
    state: bool,
}

impl HouseEvent {
    /// The shared constant-true house event present in every model.
    pub const TRUE: HouseEventId = HouseEventId(0);
    /// The shared constant-false house event present in every model.
    pub const FALSE: HouseEventId = HouseEventId(1);

    pub fn new(meta: Meta, base_path: impl Into<String>, role: Role) -> Self {
        HouseEvent {
            meta,
            base_path: base_path.into(),
            role,
            state: false,
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

    pub fn state(&self) -> bool {
        self.state
    }

    pub fn set_state(&mut self, state: bool) {
        self.state = state;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event_args(n: usize) -> Vec<Arg> {
        (0..n).map(|i| Arg::Basic(BasicEventId(i))).collect()
    }

    #[test]
    fn operator_round_trip() {
        for s in ["and", "or", "atleast", "xor", "not", "nand", "nor", "null"] {
            assert_eq!(Operator::parse(s).expect(s).as_str(), s);
        }
        assert!(Operator::parse("imply").is_none());
    }

    #[test]
    fn vote_threshold_bounds() {
        let mut formula = Formula::new(Operator::Vote);
        for arg in event_args(3) {
            formula.add_argument(arg);
        }
        assert!(formula.validate().is_err()); // missing vote number
        formula.set_vote_number(2);
        assert!(formula.validate().is_ok());
        formula.set_vote_number(3);
        assert!(formula.validate().is_err()); // number must be below arg count
        formula.set_vote_number(0);
        assert!(formula.validate().is_err());
    }

    #[test]
    fn vote_number_only_for_vote() {
        let mut formula = Formula::new(Operator::And);
        for arg in event_args(2) {
            formula.add_argument(arg);
        }
        formula.set_vote_number(2);
        assert!(formula.validate().is_err());
    }

    #[test]
    fn operator_arities() {
        for (operator, good, bad) in [
            (Operator::Null, 1, 2),
            (Operator::Not, 1, 0),
            (Operator::Xor, 2, 3),
            (Operator::And, 2, 1),
            (Operator::Nor, 3, 1),
        ] {
            let mut formula = Formula::new(operator);
            for arg in event_args(good) {
                formula.add_argument(arg);
            }
            assert!(formula.validate().is_ok(), "{operator:?}");
            let mut formula = Formula::new(operator);
            for arg in event_args(bad) {
                formula.add_argument(arg);
            }
            assert!(formula.validate().is_err(), "{operator:?}");
        }
    }

    #[test]
    fn nested_gate_collection() {
        let mut inner = Formula::new(Operator::Or);
        inner.add_argument(Arg::Gate(GateId(7)));
        inner.add_argument(Arg::Basic(BasicEventId(0)));
        let mut outer = Formula::new(Operator::And);
        outer.add_argument(Arg::Gate(GateId(3)));
        outer.add_argument(Arg::Formula(Box::new(inner)));
        let mut gates = Vec::new();
        outer.gate_args(&mut gates);
        assert_eq!(gates, vec![GateId(3), GateId(7)]);
    }
}
