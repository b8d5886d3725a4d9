//! The expression language of the analysis model.
//!
//! Expressions form a tree over the model-owned arena: every node stores the
//! [`ExprId`]s of its arguments, never the arguments themselves. The loader
//! builds nodes bottom-up, so the id graph is acyclic by construction; the
//! only indirection that can close a loop is a [`Expression::Parameter`]
//! reference, and those loops are caught by [`crate::parameter_cycle`].

use crate::model::{Model, ModelError};
use crate::parameter::ParameterId;

/// An indexing object for expressions owned by a [`Model`].
///
/// These cannot be directly created, but have to be handed out by
/// [`Model::add_expression`].
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub struct ExprId(pub(crate) usize);

impl From<ExprId> for usize {
    fn from(val: ExprId) -> Self {
        val.0
    }
}

/// Measurement units attached to parameters and parameter references.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Units {
    #[default]
    Unitless,
    Bool,
    Int,
    Float,
    Hours,
    InverseHours,
    Years,
    InverseYears,
    Fit,
    Demands,
}

impl Units {
    pub fn parse(s: &str) -> Option<Units> {
        Some(match s {
            "unitless" => Units::Unitless,
            "bool" => Units::Bool,
            "int" => Units::Int,
            "float" => Units::Float,
            "hours" => Units::Hours,
            "hours-1" => Units::InverseHours,
            "years" => Units::Years,
            "years-1" => Units::InverseYears,
            "fit" => Units::Fit,
            "demands" => Units::Demands,
            _ => return None,
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Units::Unitless => "unitless",
            Units::Bool => "bool",
            Units::Int => "int",
            Units::Float => "float",
            Units::Hours => "hours",
            Units::InverseHours => "hours-1",
            Units::Years => "years",
            Units::InverseYears => "years-1",
            Units::Fit => "fit",
            Units::Demands => "demands",
        }
    }
}

/// A node of the expression tree.
///
/// Arities follow the Open-PSA operator vocabulary: unary and binary
/// operators hold exactly their ids, n-ary operators hold a vector, and the
/// irregular shapes (histogram, switch, periodic test, lognormal deviate)
/// keep the layout their constructors received. [`Expression::validate`]
/// re-checks the argument contract of the irregular shapes.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// Constant numerical value; booleans are the shared one/zero constants.
    Constant(f64),
    /// Reference to a parameter definition.
    Parameter(ParameterId),
    /// Reference to the model mission time.
    MissionTime,
    // Arithmetic operators.
    Neg(ExprId),
    Add(Vec<ExprId>),
    Sub(Vec<ExprId>),
    Mul(Vec<ExprId>),
    Div(Vec<ExprId>),
    Abs(ExprId),
    Acos(ExprId),
    Asin(ExprId),
    Atan(ExprId),
    Cos(ExprId),
    Sin(ExprId),
    Tan(ExprId),
    Cosh(ExprId),
    Sinh(ExprId),
    Tanh(ExprId),
    Exp(ExprId),
    Log(ExprId),
    Log10(ExprId),
    Mod(ExprId, ExprId),
    Pow(ExprId, ExprId),
    Sqrt(ExprId),
    Ceil(ExprId),
    Floor(ExprId),
    Min(Vec<ExprId>),
    Max(Vec<ExprId>),
    Mean(Vec<ExprId>),
    // Boolean and comparison operators.
    Not(ExprId),
    And(Vec<ExprId>),
    Or(Vec<ExprId>),
    Eq(ExprId, ExprId),
    Df(ExprId, ExprId),
    Lt(ExprId, ExprId),
    Gt(ExprId, ExprId),
    Leq(ExprId, ExprId),
    Geq(ExprId, ExprId),
    // Conditional operators.
    Ite(ExprId, ExprId, ExprId),
    Switch {
        cases: Vec<(ExprId, ExprId)>,
        default: ExprId,
    },
    // Probability distributions.
    Exponential {
        lambda: ExprId,
        time: ExprId,
    },
    Glm {
        gamma: ExprId,
        lambda: ExprId,
        mu: ExprId,
        time: ExprId,
    },
    Weibull {
        alpha: ExprId,
        beta: ExprId,
        t0: ExprId,
        time: ExprId,
    },
    /// 4, 5 or 11 arguments depending on the test regime.
    PeriodicTest(Vec<ExprId>),
    UniformDeviate {
        min: ExprId,
        max: ExprId,
    },
    NormalDeviate {
        mean: ExprId,
        sigma: ExprId,
    },
    /// 2 arguments (mean, error factor) or 3 (mean, error factor, level).
    LognormalDeviate(Vec<ExprId>),
    GammaDeviate {
        k: ExprId,
        theta: ExprId,
    },
    BetaDeviate {
        alpha: ExprId,
        beta: ExprId,
    },
    /// `boundaries[0..n]` with `weights[0..n-1]` over the n bins.
    Histogram {
        boundaries: Vec<ExprId>,
        weights: Vec<ExprId>,
    },
}

impl Expression {
    /// The shared constant 0 in every model.
    pub const ZERO: ExprId = ExprId(0);
    /// The shared constant 1 in every model.
    pub const ONE: ExprId = ExprId(1);
    /// The shared constant pi in every model.
    pub const PI: ExprId = ExprId(2);
    /// The mission-time reference in every model.
    pub const MISSION_TIME: ExprId = ExprId(3);

    /// Checks the argument contract of this node.
    ///
    /// Numeric semantics of the distributions are the analysis runtime's
    /// business; here only shapes and constant-foldable sanity checks run.
    pub fn validate(&self, model: &Model) -> Result<(), ModelError> {
        match self {
            Expression::Add(args)
            | Expression::Sub(args)
            | Expression::Mul(args)
            | Expression::Div(args)
            | Expression::Min(args)
            | Expression::Max(args)
            | Expression::Mean(args)
            | Expression::And(args)
            | Expression::Or(args) => {
                if args.is_empty() {
                    return Err(ModelError::InvalidArgument(
                        "Variadic expression requires at least one argument.".into(),
                    ));
                }
            }
            Expression::PeriodicTest(args) => {
                if !matches!(args.len(), 4 | 5 | 11) {
                    return Err(ModelError::InvalidArgument(
                        "Invalid number of arguments for Periodic Test.".into(),
                    ));
                }
            }
            Expression::LognormalDeviate(args) => {
                if !matches!(args.len(), 2 | 3) {
                    return Err(ModelError::InvalidArgument(
                        "Invalid number of arguments for Lognormal deviate.".into(),
                    ));
                }
            }
            Expression::Histogram {
                boundaries,
                weights,
            } => {
                if weights.is_empty() || boundaries.len() != weights.len() + 1 {
                    return Err(ModelError::InvalidArgument(
                        "Histogram requires a lower boundary and at least one bin.".into(),
                    ));
                }
                let values: Vec<Option<f64>> = boundaries
                    .iter()
                    .map(|&id| model.constant_value(id))
                    .collect();
                for pair in values.windows(2) {
                    if let (Some(low), Some(high)) = (pair[0], pair[1]) {
                        if low >= high {
                            return Err(ModelError::InvalidArgument(
                                "Histogram boundaries must be strictly increasing.".into(),
                            ));
                        }
                    }
                }
                for &id in weights {
                    if let Some(w) = model.constant_value(id) {
                        if w < 0.0 {
                            return Err(ModelError::InvalidArgument(
                                "Histogram weights must be non-negative.".into(),
                            ));
                        }
                    }
                }
            }
            _ => {}
        }
        Ok(())
    }

    /// Appends the ids of direct argument expressions to `out`.
    pub(crate) fn children(&self, out: &mut Vec<ExprId>) {
        match self {
            Expression::Constant(_) | Expression::Parameter(_) | Expression::MissionTime => {}
            Expression::Neg(a)
            | Expression::Abs(a)
            | Expression::Acos(a)
            | Expression::Asin(a)
            | Expression::Atan(a)
            | Expression::Cos(a)
            | Expression::Sin(a)
            | Expression::Tan(a)
            | Expression::Cosh(a)
            | Expression::Sinh(a)
            | Expression::Tanh(a)
            | Expression::Exp(a)
            | Expression::Log(a)
            | Expression::Log10(a)
            | Expression::Sqrt(a)
            | Expression::Ceil(a)
            | Expression::Floor(a)
            | Expression::Not(a) => out.push(*a),
            Expression::Mod(a, b)
            | Expression::Pow(a, b)
            | Expression::Eq(a, b)
            | Expression::Df(a, b)
            | Expression::Lt(a, b)
            | Expression::Gt(a, b)
            | Expression::Leq(a, b)
            | Expression::Geq(a, b) => out.extend([*a, *b]),
            Expression::Ite(a, b, c) => out.extend([*a, *b, *c]),
            Expression::Add(args)
            | Expression::Sub(args)
            | Expression::Mul(args)
            | Expression::Div(args)
            | Expression::Min(args)
            | Expression::Max(args)
            | Expression::Mean(args)
            | Expression::And(args)
            | Expression::Or(args)
            | Expression::PeriodicTest(args)
            | Expression::LognormalDeviate(args) => out.extend_from_slice(args),
            Expression::Switch { cases, default } => {
                for (condition, value) in cases {
                    out.extend([*condition, *value]);
                }
                out.push(*default);
            }
            Expression::Exponential { lambda, time } => out.extend([*lambda, *time]),
            Expression::Glm {
                gamma,
                lambda,
                mu,
                time,
            } => out.extend([*gamma, *lambda, *mu, *time]),
            Expression::Weibull {
                alpha,
                beta,
                t0,
                time,
            } => out.extend([*alpha, *beta, *t0, *time]),
            Expression::UniformDeviate { min, max } => out.extend([*min, *max]),
            Expression::NormalDeviate { mean, sigma } => out.extend([*mean, *sigma]),
            Expression::GammaDeviate { k, theta } => out.extend([*k, *theta]),
            Expression::BetaDeviate { alpha, beta } => out.extend([*alpha, *beta]),
            Expression::Histogram {
                boundaries,
                weights,
            } => {
                out.extend_from_slice(boundaries);
                out.extend_from_slice(weights);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Settings;

    #[test]
    fn units_round_trip() {
        for s in [
            "unitless", "bool", "int", "float", "hours", "hours-1", "years", "years-1", "fit",
            "demands",
        ] {
            assert_eq!(Units::parse(s).expect(s).as_str(), s);
        }
        assert!(Units::parse("fortnights").is_none());
    }

    #[test]
    fn periodic_test_arity() {
        let model = Model::new(Settings::default());
        for n in [4, 5, 11] {
            let expr = Expression::PeriodicTest(vec![Expression::ONE; n]);
            assert!(expr.validate(&model).is_ok());
        }
        let expr = Expression::PeriodicTest(vec![Expression::ONE; 6]);
        assert!(expr.validate(&model).is_err());
    }

    #[test]
    fn histogram_contract() {
        let mut model = Model::new(Settings::default());
        let b0 = model.add_expression(Expression::Constant(0.0));
        let b1 = model.add_expression(Expression::Constant(1.0));
        let b2 = model.add_expression(Expression::Constant(2.0));
        let w = model.add_expression(Expression::Constant(0.5));
        let good = Expression::Histogram {
            boundaries: vec![b0, b1, b2],
            weights: vec![w, w],
        };
        assert!(good.validate(&model).is_ok());
        let unsorted = Expression::Histogram {
            boundaries: vec![b1, b0, b2],
            weights: vec![w, w],
        };
        assert!(unsorted.validate(&model).is_err());
        let mismatched = Expression::Histogram {
            boundaries: vec![b0, b1],
            weights: vec![w, w],
        };
        assert!(mismatched.validate(&model).is_err());
    }
}
