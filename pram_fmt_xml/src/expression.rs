//! Construction of typed expressions and boolean formulas from XML.
//!
//! The operator registry maps the open-ended XML tag vocabulary onto the
//! closed set of expression nodes. Regular operators declare a fixed or
//! variadic argument shape; the four irregular shapes (histogram, lognormal
//! deviate, periodic test, switch) have bespoke extractors.

use pram_core::{Arg, Expression, Formula, HouseEvent, Operator, Units};

use crate::builder::{DeferredExpression, ModelBuilder};
use crate::error::Error;
use crate::vocabulary::*;
use crate::xml::Element;

/// Argument shape of an expression operator.
#[derive(Debug, Clone, Copy)]
enum Arity {
    Fixed(usize),
    Variadic,
    Custom,
}

/// Operator tag registry; tags not listed here are not expressions.
const OPERATORS: &[(&str, Arity)] = &[
    ("exponential", Arity::Fixed(2)),
    ("GLM", Arity::Fixed(4)),
    ("Weibull", Arity::Fixed(4)),
    ("periodic-test", Arity::Custom),
    ("uniform-deviate", Arity::Fixed(2)),
    ("normal-deviate", Arity::Fixed(2)),
    ("lognormal-deviate", Arity::Custom),
    ("gamma-deviate", Arity::Fixed(2)),
    ("beta-deviate", Arity::Fixed(2)),
    ("histogram", Arity::Custom),
    ("neg", Arity::Fixed(1)),
    ("add", Arity::Variadic),
    ("sub", Arity::Variadic),
    ("mul", Arity::Variadic),
    ("div", Arity::Variadic),
    ("abs", Arity::Fixed(1)),
    ("acos", Arity::Fixed(1)),
    ("asin", Arity::Fixed(1)),
    ("atan", Arity::Fixed(1)),
    ("cos", Arity::Fixed(1)),
    ("sin", Arity::Fixed(1)),
    ("tan", Arity::Fixed(1)),
    ("cosh", Arity::Fixed(1)),
    ("sinh", Arity::Fixed(1)),
    ("tanh", Arity::Fixed(1)),
    ("exp", Arity::Fixed(1)),
    ("log", Arity::Fixed(1)),
    ("log10", Arity::Fixed(1)),
    ("mod", Arity::Fixed(2)),
    ("pow", Arity::Fixed(2)),
    ("sqrt", Arity::Fixed(1)),
    ("ceil", Arity::Fixed(1)),
    ("floor", Arity::Fixed(1)),
    ("min", Arity::Variadic),
    ("max", Arity::Variadic),
    ("mean", Arity::Variadic),
    ("not", Arity::Fixed(1)),
    ("and", Arity::Variadic),
    ("or", Arity::Variadic),
    ("eq", Arity::Fixed(2)),
    ("df", Arity::Fixed(2)),
    ("lt", Arity::Fixed(2)),
    ("gt", Arity::Fixed(2)),
    ("leq", Arity::Fixed(2)),
    ("geq", Arity::Fixed(2)),
    ("ite", Arity::Fixed(3)),
    ("switch", Arity::Custom),
];

fn operator_arity(tag: &str) -> Option<Arity> {
    OPERATORS
        .iter()
        .find(|(name, _)| *name == tag)
        .map(|(_, arity)| *arity)
}

/// Builds a regularly shaped operator from its argument ids.
fn construct(tag: &str, mut args: Vec<pram_core::ExprId>) -> Expression {
    match tag {
        "exponential" => Expression::Exponential {
            lambda: args[0],
            time: args[1],
        },
        "GLM" => Expression::Glm {
            gamma: args[0],
            lambda: args[1],
            mu: args[2],
            time: args[3],
        },
        "Weibull" => Expression::Weibull {
            alpha: args[0],
            beta: args[1],
            t0: args[2],
            time: args[3],
        },
        "uniform-deviate" => Expression::UniformDeviate {
            min: args[0],
            max: args[1],
        },
        "normal-deviate" => Expression::NormalDeviate {
            mean: args[0],
            sigma: args[1],
        },
        "gamma-deviate" => Expression::GammaDeviate {
            k: args[0],
            theta: args[1],
        },
        "beta-deviate" => Expression::BetaDeviate {
            alpha: args[0],
            beta: args[1],
        },
        "neg" => Expression::Neg(args[0]),
        "add" => Expression::Add(args),
        "sub" => Expression::Sub(args),
        "mul" => Expression::Mul(args),
        "div" => Expression::Div(args),
        "abs" => Expression::Abs(args[0]),
        "acos" => Expression::Acos(args[0]),
        "asin" => Expression::Asin(args[0]),
        "atan" => Expression::Atan(args[0]),
        "cos" => Expression::Cos(args[0]),
        "sin" => Expression::Sin(args[0]),
        "tan" => Expression::Tan(args[0]),
        "cosh" => Expression::Cosh(args[0]),
        "sinh" => Expression::Sinh(args[0]),
        "tanh" => Expression::Tanh(args[0]),
        "exp" => Expression::Exp(args[0]),
        "log" => Expression::Log(args[0]),
        "log10" => Expression::Log10(args[0]),
        "mod" => Expression::Mod(args[0], args[1]),
        "pow" => Expression::Pow(args[0], args[1]),
        "sqrt" => Expression::Sqrt(args[0]),
        "ceil" => Expression::Ceil(args[0]),
        "floor" => Expression::Floor(args[0]),
        "min" => Expression::Min(args),
        "max" => Expression::Max(args),
        "mean" => Expression::Mean(args),
        "not" => Expression::Not(args[0]),
        "and" => Expression::And(args),
        "or" => Expression::Or(args),
        "eq" => Expression::Eq(args[0], args[1]),
        "df" => Expression::Df(args[0], args[1]),
        "lt" => Expression::Lt(args[0], args[1]),
        "gt" => Expression::Gt(args[0], args[1]),
        "leq" => Expression::Leq(args[0], args[1]),
        "geq" => Expression::Geq(args[0], args[1]),
        "ite" => {
            let value = args.pop().expect("checked arity");
            Expression::Ite(args[0], args[1], value)
        }
        _ => unreachable!("tag comes from the operator registry"),
    }
}

impl ModelBuilder {
    /// Manufactures the expression for `element` and hands it to the model.
    ///
    /// Operator expressions are also recorded for deferred validation,
    /// which must wait until cycle detection has run.
    pub(crate) fn expression(
        &mut self,
        element: &Element,
        base_path: &str,
    ) -> Result<pram_core::ExprId, Error> {
        let line = element.line;
        match element.name.as_str() {
            TAG_INT => {
                let value: i64 = self.parsed_attribute(element, ATTR_VALUE)?;
                Ok(self.model.add_expression(Expression::Constant(value as f64)))
            }
            TAG_FLOAT => {
                let value: f64 = self.parsed_attribute(element, ATTR_VALUE)?;
                Ok(self.model.add_expression(Expression::Constant(value)))
            }
            TAG_BOOL => {
                let value = self.required_attribute(element, ATTR_VALUE)?;
                Ok(if value == "true" {
                    Expression::ONE
                } else {
                    Expression::ZERO
                })
            }
            TAG_PI => Ok(Expression::PI),
            TAG_PARAMETER => self.parameter_reference(element, base_path),
            TAG_SYSTEM_MISSION_TIME => {
                self.check_units(element, self.model.mission_time().unit())?;
                Ok(Expression::MISSION_TIME)
            }
            tag => {
                let arity = operator_arity(tag).ok_or_else(|| {
                    Error::validation_at(line, format!("Unknown expression type {tag}."))
                })?;
                let expression = match arity {
                    Arity::Fixed(count) => {
                        let args = self.child_expressions(element, base_path)?;
                        if args.len() != count {
                            return Err(Error::validation_at(
                                line,
                                format!(
                                    "The {tag} expression requires {count} arguments; got {}.",
                                    args.len()
                                ),
                            ));
                        }
                        construct(tag, args)
                    }
                    Arity::Variadic => construct(tag, self.child_expressions(element, base_path)?),
                    Arity::Custom => {
                        self.custom_expression(tag, element, base_path)
                            .map_err(|err| match err {
                                // Wrong constructor argument counts become
                                // validation errors with the source line.
                                Error::InvalidArgument(msg) => Error::validation_at(line, msg),
                                other => other,
                            })?
                    }
                };
                let id = self.model.add_expression(expression);
                self.deferred.push(DeferredExpression {
                    id,
                    line,
                    file: self.current_file,
                });
                Ok(id)
            }
        }
    }

    fn custom_expression(
        &mut self,
        tag: &str,
        element: &Element,
        base_path: &str,
    ) -> Result<Expression, Error> {
        match tag {
            "histogram" => self.histogram(element, base_path),
            "lognormal-deviate" => {
                let args = self.child_expressions(element, base_path)?;
                if !matches!(args.len(), 2 | 3) {
                    return Err(Error::InvalidArgument(
                        "Invalid number of arguments for Lognormal deviate.".to_string(),
                    ));
                }
                Ok(Expression::LognormalDeviate(args))
            }
            "periodic-test" => {
                let args = self.child_expressions(element, base_path)?;
                if !matches!(args.len(), 4 | 5 | 11) {
                    return Err(Error::InvalidArgument(
                        "Invalid number of arguments for Periodic Test.".to_string(),
                    ));
                }
                Ok(Expression::PeriodicTest(args))
            }
            "switch" => self.switch(element, base_path),
            _ => unreachable!("tag comes from the operator registry"),
        }
    }

    /// First child is the lower boundary; each further child is a `bin`
    /// holding an upper boundary and a weight.
    fn histogram(&mut self, element: &Element, base_path: &str) -> Result<Expression, Error> {
        let mut children = element.children.iter();
        let lower = children.next().ok_or_else(|| {
            Error::validation_at(element.line, "A histogram requires a lower boundary.")
        })?;
        let mut boundaries = vec![self.expression(lower, base_path)?];
        let mut weights = Vec::new();
        for bin in children {
            if bin.name != TAG_BIN || bin.children.len() != 2 {
                return Err(Error::validation_at(
                    bin.line,
                    "A histogram bin holds exactly one boundary and one weight.",
                ));
            }
            boundaries.push(self.expression(&bin.children[0], base_path)?);
            weights.push(self.expression(&bin.children[1], base_path)?);
        }
        if weights.is_empty() {
            return Err(Error::validation_at(
                element.line,
                "A histogram requires at least one bin.",
            ));
        }
        Ok(Expression::Histogram {
            boundaries,
            weights,
        })
    }

    /// Last child is the default; each preceding child is a `case` holding
    /// a condition and a value.
    fn switch(&mut self, element: &Element, base_path: &str) -> Result<Expression, Error> {
        let Some((default_node, case_nodes)) = element.children.split_last() else {
            return Err(Error::validation_at(
                element.line,
                "A switch requires a default expression.",
            ));
        };
        let mut cases = Vec::new();
        for case in case_nodes {
            if case.name != TAG_CASE || case.children.len() != 2 {
                return Err(Error::validation_at(
                    case.line,
                    "A switch case holds exactly one condition and one value.",
                ));
            }
            let condition = self.expression(&case.children[0], base_path)?;
            let value = self.expression(&case.children[1], base_path)?;
            cases.push((condition, value));
        }
        let default = self.expression(default_node, base_path)?;
        Ok(Expression::Switch { cases, default })
    }

    fn child_expressions(
        &mut self,
        element: &Element,
        base_path: &str,
    ) -> Result<Vec<pram_core::ExprId>, Error> {
        element
            .children
            .iter()
            .map(|child| self.expression(child, base_path))
            .collect()
    }

    fn parameter_reference(
        &mut self,
        element: &Element,
        base_path: &str,
    ) -> Result<pram_core::ExprId, Error> {
        let name = self.required_attribute(element, ATTR_NAME)?;
        let id = self.model.get_parameter(name, base_path).map_err(|_| {
            Error::validation_at(
                element.line,
                format!("Undefined parameter {name} with base path {base_path}"),
            )
        })?;
        self.model.parameter_mut(id).mark_used();
        self.check_units(element, self.model.parameter(id).unit())?;
        Ok(self.model.add_expression(Expression::Parameter(id)))
    }

    fn check_units(&self, element: &Element, expected: Units) -> Result<(), Error> {
        if let Some(unit) = element.attribute(ATTR_UNIT) {
            if unit != expected.as_str() {
                return Err(Error::validation_at(
                    element.line,
                    format!(
                        "Parameter unit mismatch.\nExpected: {}\nGiven: {unit}",
                        expected.as_str()
                    ),
                ));
            }
        }
        Ok(())
    }

    /// Builds the boolean formula rooted at `element`.
    pub(crate) fn formula(&mut self, element: &Element, base_path: &str) -> Result<Formula, Error> {
        // A name attribute or a constant leaf makes the node itself the
        // single pass-through argument.
        let pass_through =
            element.attribute(ATTR_NAME).is_some() || element.name == TAG_CONSTANT;
        let operator = if pass_through {
            Operator::Null
        } else {
            Operator::parse(&element.name).ok_or_else(|| {
                Error::validation_at(
                    element.line,
                    format!("Unknown formula operator {}.", element.name),
                )
            })?
        };
        let mut formula = Formula::new(operator);
        if operator == Operator::Vote {
            formula.set_vote_number(self.parsed_attribute(element, ATTR_MIN)?);
        }
        if pass_through {
            self.formula_argument(element, &mut formula, base_path)?;
        } else {
            for child in &element.children {
                self.formula_argument(child, &mut formula, base_path)?;
            }
        }
        formula
            .validate()
            .map_err(|err| Error::validation_at(element.line, err.to_string()))?;
        Ok(formula)
    }

    fn formula_argument(
        &mut self,
        element: &Element,
        formula: &mut Formula,
        base_path: &str,
    ) -> Result<(), Error> {
        if element.name == TAG_CONSTANT {
            let value = self.required_attribute(element, ATTR_VALUE)?;
            formula.add_argument(Arg::House(if value == "true" {
                HouseEvent::TRUE
            } else {
                HouseEvent::FALSE
            }));
            return Ok(());
        }
        let Some(name) = element.attribute(ATTR_NAME) else {
            // An inline sub-formula.
            let nested = self.formula(element, base_path)?;
            formula.add_argument(Arg::Formula(Box::new(nested)));
            return Ok(());
        };
        // The element's own tag supplies the type unless overridden,
        // as in `<event name="id" type="gate"/>`.
        let kind = element
            .attribute(ATTR_TYPE)
            .unwrap_or(element.name.as_str());
        let resolved = match kind {
            "event" => self.model.get_event(name, base_path).map(Arg::from),
            "gate" => self.model.get_gate(name, base_path).map(Arg::Gate),
            "basic-event" => self.model.get_basic_event(name, base_path).map(Arg::Basic),
            "house-event" => self.model.get_house_event(name, base_path).map(Arg::House),
            other => {
                return Err(Error::validation_at(
                    element.line,
                    format!("Invalid event reference type {other}."),
                ));
            }
        };
        let arg = resolved.map_err(|_| {
            Error::validation_at(
                element.line,
                format!("Undefined {kind} {name} with base path {base_path}"),
            )
        })?;
        formula.add_argument(arg);
        Ok(())
    }
}
