//! Cycle detection over the model's reference graphs.
//!
//! Gates, parameters and event tree branches may legally refer forward to
//! one another, so nothing prevents a loop until the whole input is read.
//! Detection is a white/grey/black depth-first search; the returned path
//! lists the names around the loop, first node repeated at the end.

use crate::event_tree::{Branch, EventTree, Target};
use crate::expression::{ExprId, Expression};
use crate::model::Model;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    White,
    Grey,
    Black,
}

fn find_cycle<F>(count: usize, successors: F) -> Option<Vec<usize>>
where
    F: Fn(usize) -> Vec<usize>,
{
    let mut marks = vec![Mark::White; count];
    let mut stack = Vec::new();
    let mut cycle = Vec::new();
    for start in 0..count {
        if marks[start] == Mark::White
            && visit(start, &successors, &mut marks, &mut stack, &mut cycle)
        {
            return Some(cycle);
        }
    }
    None
}

fn visit<F>(
    node: usize,
    successors: &F,
    marks: &mut [Mark],
    stack: &mut Vec<usize>,
    cycle: &mut Vec<usize>,
) -> bool
where
    F: Fn(usize) -> Vec<usize>,
{
    marks[node] = Mark::Grey;
    stack.push(node);
    for next in successors(node) {
        match marks[next] {
            Mark::Black => {}
            Mark::Grey => {
                let entry = stack.iter().position(|&n| n == next).expect("grey on stack");
                cycle.extend_from_slice(&stack[entry..]);
                cycle.push(next);
                return true;
            }
            Mark::White => {
                if visit(next, successors, marks, stack, cycle) {
                    return true;
                }
            }
        }
    }
    stack.pop();
    marks[node] = Mark::Black;
    false
}

/// Searches the gate graph induced by formula gate arguments.
pub fn gate_cycle(model: &Model) -> Option<Vec<String>> {
    let successors = |index: usize| {
        let mut gates = Vec::new();
        if let Some(formula) = model.gates()[index].formula() {
            formula.gate_args(&mut gates);
        }
        gates.into_iter().map(usize::from).collect()
    };
    find_cycle(model.gates().len(), successors)
        .map(|cycle| names(cycle, |i| model.gates()[i].name()))
}

/// Searches the parameter graph induced by parameter references in
/// definition expressions.
pub fn parameter_cycle(model: &Model) -> Option<Vec<String>> {
    let successors = |index: usize| {
        let mut parameters = Vec::new();
        if let Some(root) = model.parameters()[index].expression() {
            collect_parameters(model, root, &mut parameters);
        }
        parameters
    };
    find_cycle(model.parameters().len(), successors)
        .map(|cycle| names(cycle, |i| model.parameters()[i].name()))
}

/// Searches one event tree's named-branch graph induced by branch targets,
/// descending through forks.
pub fn branch_cycle(tree: &EventTree) -> Option<Vec<String>> {
    let successors = |index: usize| {
        let mut branches = Vec::new();
        collect_branches(tree, tree.branches()[index].branch(), &mut branches);
        branches
    };
    find_cycle(tree.branches().len(), successors)
        .map(|cycle| names(cycle, |i| tree.branches()[i].name()))
}

fn names<'a>(cycle: Vec<usize>, name: impl Fn(usize) -> &'a str) -> Vec<String> {
    cycle.into_iter().map(|i| name(i).to_string()).collect()
}

fn collect_parameters(model: &Model, root: ExprId, out: &mut Vec<usize>) {
    let mut pending = vec![root];
    while let Some(id) = pending.pop() {
        match model.expression(id) {
            Expression::Parameter(parameter) => out.push(usize::from(*parameter)),
            node => node.children(&mut pending),
        }
    }
}

fn collect_branches(tree: &EventTree, branch: &Branch, out: &mut Vec<usize>) {
    match branch.target() {
        Some(Target::Branch(id)) => out.push(usize::from(id)),
        Some(Target::Fork(fork)) => {
            for path in tree.fork(fork).paths() {
                collect_branches(tree, path.branch(), out);
            }
        }
        Some(Target::Sequence(_)) | None => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{Meta, Role};
    use crate::event::{Arg, Formula, Gate, Operator};
    use crate::event_tree::NamedBranch;
    use crate::model::Settings;
    use crate::parameter::Parameter;

    fn tie(model: &mut Model, gate: crate::GateId, to: crate::GateId) {
        let mut formula = Formula::new(Operator::Null);
        formula.add_argument(Arg::Gate(to));
        model.gate_mut(gate).set_formula(formula);
    }

    #[test]
    fn gate_loop_is_reported_with_both_names() {
        let mut model = Model::new(Settings::default());
        let g1 = model
            .add_gate(Gate::new(Meta::new("g1"), "", Role::Public))
            .unwrap();
        let g2 = model
            .add_gate(Gate::new(Meta::new("g2"), "", Role::Public))
            .unwrap();
        tie(&mut model, g1, g2);
        tie(&mut model, g2, g1);
        let cycle = gate_cycle(&model).expect("cycle");
        assert!(cycle.contains(&"g1".to_string()));
        assert!(cycle.contains(&"g2".to_string()));
        assert_eq!(cycle.first(), cycle.last());
    }

    #[test]
    fn gate_self_loop() {
        let mut model = Model::new(Settings::default());
        let g = model
            .add_gate(Gate::new(Meta::new("g"), "", Role::Public))
            .unwrap();
        tie(&mut model, g, g);
        assert_eq!(gate_cycle(&model).expect("cycle"), vec!["g", "g"]);
    }

    #[test]
    fn acyclic_gates_pass() {
        let mut model = Model::new(Settings::default());
        let g1 = model
            .add_gate(Gate::new(Meta::new("g1"), "", Role::Public))
            .unwrap();
        let g2 = model
            .add_gate(Gate::new(Meta::new("g2"), "", Role::Public))
            .unwrap();
        tie(&mut model, g1, g2);
        assert!(gate_cycle(&model).is_none());
    }

    #[test]
    fn parameter_loop_through_expressions() {
        let mut model = Model::new(Settings::default());
        let p1 = model
            .add_parameter(Parameter::new(Meta::new("p1"), "", Role::Public))
            .unwrap();
        let p2 = model
            .add_parameter(Parameter::new(Meta::new("p2"), "", Role::Public))
            .unwrap();
        let ref2 = model.add_expression(Expression::Parameter(p2));
        let double = model.add_expression(Expression::Mul(vec![Expression::ONE, ref2]));
        model.parameter_mut(p1).set_expression(double);
        let ref1 = model.add_expression(Expression::Parameter(p1));
        model.parameter_mut(p2).set_expression(ref1);
        let cycle = parameter_cycle(&model).expect("cycle");
        assert!(cycle.contains(&"p1".to_string()));
        assert!(cycle.contains(&"p2".to_string()));
    }

    #[test]
    fn branch_loop_through_targets() {
        let mut tree = EventTree::new(Meta::new("et"));
        let b1 = tree.add_branch(NamedBranch::new(Meta::new("b1"))).unwrap();
        let b2 = tree.add_branch(NamedBranch::new(Meta::new("b2"))).unwrap();
        tree.branch_mut(b1)
            .set_branch(Branch::new(Vec::new(), Target::Branch(b2)));
        tree.branch_mut(b2)
            .set_branch(Branch::new(Vec::new(), Target::Branch(b1)));
        let cycle = branch_cycle(&tree).expect("cycle");
        assert!(cycle.contains(&"b1".to_string()));
        assert!(cycle.contains(&"b2".to_string()));
    }
}
