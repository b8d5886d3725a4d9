//! Common-cause failure groups.

use crate::element::{Meta, Role};
use crate::event::BasicEventId;
use crate::expression::ExprId;
use crate::model::ModelError;

/// An indexing object for CCF groups owned by a [`crate::Model`].
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub struct CcfGroupId(pub(crate) usize);

impl From<CcfGroupId> for usize {
    fn from(val: CcfGroupId) -> Self {
        val.0
    }
}

/// The common-cause model applied to a group's members.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CcfModel {
    BetaFactor,
    Mgl,
    AlphaFactor,
    PhiFactor,
}

impl CcfModel {
    pub fn parse(s: &str) -> Option<CcfModel> {
        Some(match s {
            "beta-factor" => CcfModel::BetaFactor,
            "MGL" => CcfModel::Mgl,
            "alpha-factor" => CcfModel::AlphaFactor,
            "phi-factor" => CcfModel::PhiFactor,
            _ => return None,
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CcfModel::BetaFactor => "beta-factor",
            CcfModel::Mgl => "MGL",
            CcfModel::AlphaFactor => "alpha-factor",
            CcfModel::PhiFactor => "phi-factor",
        }
    }

    /// The lowest factor level meaningful for this model.
    pub fn min_level(&self) -> usize {
        match self {
            CcfModel::BetaFactor | CcfModel::Mgl => 2,
            CcfModel::AlphaFactor | CcfModel::PhiFactor => 1,
        }
    }
}

/// A single CCF factor at its level.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CcfFactor {
    pub expression: ExprId,
    pub level: usize,
}

/// A group of basic events failing together under a common-cause model.
#[derive(Debug, Clone)]
pub struct CcfGroup {
    meta: Meta,
    base_path: String,
    role: Role,
    model: CcfModel,
    members: Vec<BasicEventId>,
    member_names: Vec<String>,
    distribution: Option<ExprId>,
    factors: Vec<CcfFactor>,
    member_factors: Vec<(BasicEventId, Vec<CcfFactor>)>,
}

impl CcfGroup {
    pub fn new(meta: Meta, base_path: impl Into<String>, role: Role, model: CcfModel) -> Self {
        CcfGroup {
            meta,
            base_path: base_path.into(),
            role,
            model,
            members: Vec::new(),
            member_names: Vec::new(),
            distribution: None,
            factors: Vec::new(),
            member_factors: Vec::new(),
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

    pub fn model(&self) -> CcfModel {
        self.model
    }

    pub fn members(&self) -> &[BasicEventId] {
        &self.members
    }

    pub fn has_member(&self, name: &str) -> bool {
        self.member_names.iter().any(|n| n == name)
    }

    /// Adds a member basic event; the member set must stay unique.
    pub fn add_member(&mut self, id: BasicEventId, name: &str) -> Result<(), ModelError> {
        if self.member_names.iter().any(|n| n == name) {
            return Err(ModelError::DuplicateArgument(format!(
                "Duplicate member {name} in CCF group {}.",
                self.name()
            )));
        }
        self.members.push(id);
        self.member_names.push(name.to_string());
        Ok(())
    }

    pub fn distribution(&self) -> Option<ExprId> {
        self.distribution
    }

    pub fn set_distribution(&mut self, expression: ExprId) {
        self.distribution = Some(expression);
    }

    pub fn factors(&self) -> &[CcfFactor] {
        &self.factors
    }

    /// Adds a factor; without an explicit level the next positional level is
    /// used, and explicit levels must follow the same contiguous order.
    pub fn add_factor(&mut self, expression: ExprId, level: Option<usize>) -> Result<(), ModelError> {
        let next = self.model.min_level() + self.factors.len();
        let level = level.unwrap_or(next);
        if level != next {
            return Err(ModelError::InvalidArgument(format!(
                "CCF group {} expects the factor for level {next}; got level {level}.",
                self.name()
            )));
        }
        self.factors.push(CcfFactor { expression, level });
        Ok(())
    }

    /// Checks the distribution and the factor count against the model.
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.distribution.is_none() {
            return Err(ModelError::InvalidArgument(format!(
                "CCF group {} has no distribution.",
                self.name()
            )));
        }
        if self.members.len() < 2 {
            return Err(ModelError::InvalidArgument(format!(
                "CCF group {} requires at least two members.",
                self.name()
            )));
        }
        let expected = match self.model {
            CcfModel::BetaFactor => 1,
            CcfModel::Mgl => self.members.len() - 1,
            CcfModel::AlphaFactor | CcfModel::PhiFactor => self.members.len(),
        };
        if self.factors.len() != expected {
            return Err(ModelError::InvalidArgument(format!(
                "CCF group {} with the {} model requires {expected} factors; got {}.",
                self.name(),
                self.model.as_str(),
                self.factors.len()
            )));
        }
        Ok(())
    }

    /// Applies the model: records the factor table each member failure
    /// contributes to. Recomputed from scratch, so repeated calls agree.
    pub fn apply_model(&mut self) {
        self.member_factors = self
            .members
            .iter()
            .map(|&member| (member, self.factors.clone()))
            .collect();
    }

    /// Per-member factor tables produced by [`CcfGroup::apply_model`].
    pub fn member_factors(&self) -> &[(BasicEventId, Vec<CcfFactor>)] {
        &self.member_factors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::Expression;

    fn group(model: CcfModel) -> CcfGroup {
        CcfGroup::new(Meta::new("pumps"), "", Role::Public, model)
    }

    #[test]
    fn duplicate_member_rejected() {
        let mut group = group(CcfModel::Mgl);
        group.add_member(BasicEventId(0), "p1").unwrap();
        let err = group.add_member(BasicEventId(1), "p1").unwrap_err();
        assert!(err.to_string().contains("p1"));
    }

    #[test]
    fn positional_and_leveled_factors() {
        let mut group = group(CcfModel::Mgl);
        group.add_factor(Expression::ONE, None).unwrap();
        assert_eq!(group.factors()[0].level, 2);
        group.add_factor(Expression::ONE, Some(3)).unwrap();
        assert!(group.add_factor(Expression::ONE, Some(7)).is_err());
    }

    #[test]
    fn factor_count_per_model() {
        let mut group = group(CcfModel::BetaFactor);
        group.add_member(BasicEventId(0), "p1").unwrap();
        group.add_member(BasicEventId(1), "p2").unwrap();
        group.set_distribution(Expression::ONE);
        assert!(group.validate().is_err()); // no factors yet
        group.add_factor(Expression::ONE, None).unwrap();
        assert!(group.validate().is_ok());
    }

    #[test]
    fn apply_model_is_idempotent() {
        let mut group = group(CcfModel::AlphaFactor);
        group.add_member(BasicEventId(0), "p1").unwrap();
        group.add_member(BasicEventId(1), "p2").unwrap();
        group.add_factor(Expression::ONE, None).unwrap();
        group.add_factor(Expression::ONE, None).unwrap();
        group.apply_model();
        let first = group.member_factors().to_vec();
        group.apply_model();
        assert_eq!(group.member_factors(), first.as_slice());
    }
}
