//! Named parameters and the model mission time.

use crate::element::{Meta, Role};
use crate::expression::{ExprId, Units};

/// An indexing object for parameters owned by a [`crate::Model`].
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub struct ParameterId(pub(crate) usize);

impl From<ParameterId> for usize {
    fn from(val: ParameterId) -> Self {
        val.0
    }
}

/// A named, reusable expression with a measurement unit.
#[derive(Debug, Clone)]
pub struct Parameter {
    meta: Meta,
    base_path: String,
    role: Role,
    unit: Units,
    expression: Option<ExprId>,
    unused: bool,
}

impl Parameter {
    pub fn new(meta: Meta, base_path: impl Into<String>, role: Role) -> Self {
        Parameter {
            meta,
            base_path: base_path.into(),
            role,
            unit: Units::Unitless,
            expression: None,
            unused: true,
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

    pub fn unit(&self) -> Units {
        self.unit
    }

    pub fn set_unit(&mut self, unit: Units) {
        self.unit = unit;
    }

    pub fn expression(&self) -> Option<ExprId> {
        self.expression
    }

    pub fn set_expression(&mut self, expression: ExprId) {
        self.expression = Some(expression);
    }

    /// Whether no expression has referenced this parameter yet.
    pub fn unused(&self) -> bool {
        self.unused
    }

    pub fn mark_used(&mut self) {
        self.unused = false;
    }
}

/// The model-wide mission time, addressable from expressions through
/// [`crate::Expression::MISSION_TIME`].
#[derive(Debug, Clone)]
pub struct MissionTime {
    value: f64,
    unit: Units,
}

impl MissionTime {
    pub fn new(value: f64) -> Self {
        MissionTime {
            value,
            unit: Units::Hours,
        }
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn set_value(&mut self, value: f64) {
        self.value = value;
    }

    pub fn unit(&self) -> Units {
        self.unit
    }
}
