use anyhow::Result;
use pram_fmt_xml::pram_core::{CcfModel, Expression, Operator, Target};
use pram_fmt_xml::Settings;

#[test]
fn fault_tree() -> Result<()> {
    let model = pram_fmt_xml::load(&["tests/models/fault_tree.xml"], Settings::default())?;
    assert_eq!(model.meta().name(), "plant");
    assert_eq!(model.meta().label(), Some("Demonstration plant model"));

    let tree = &model.fault_trees()[0];
    assert_eq!(tree.name(), "CoolingSystem");
    let top = model.get_gate("top", "")?;
    assert_eq!(tree.top_events(), &[top]);

    let formula = model.gate(top).formula().expect("defined gate");
    assert_eq!(formula.operator(), Operator::Or);
    assert_eq!(formula.args().len(), 3);

    let maintenance = model.get_house_event("maintenance", "")?;
    assert!(model.house_event(maintenance).state());

    let pump = model.get_basic_event("pump-failure", "")?;
    let pump = model.basic_event(pump);
    assert_eq!(pump.meta().attributes().len(), 1);
    assert_eq!(pump.meta().attributes()[0].name, "source");
    assert!(matches!(
        model.expression(pump.expression().expect("probability")),
        Expression::Exponential { .. }
    ));

    // The referenced parameter is no longer reported as unused.
    let lambda = model.get_parameter("lambda", "CoolingSystem")?;
    assert!(!model.parameter(lambda).unused());
    Ok(())
}

#[test]
fn private_names_resolve_under_their_path() -> Result<()> {
    let model = pram_fmt_xml::load(&["tests/models/fault_tree.xml"], Settings::default())?;
    let diesel = model.get_basic_event("diesel", "CoolingSystem.backup")?;
    assert_eq!(model.basic_event(diesel).name(), "diesel");
    // Resolvable from a descendant path, invisible globally.
    assert!(model
        .get_basic_event("diesel", "CoolingSystem.backup.deeper")
        .is_ok());
    assert!(model.get_basic_event("diesel", "").is_err());
    // The component gate opted into the public role.
    assert!(model.get_gate("backup-fails", "").is_ok());
    Ok(())
}

#[test]
fn event_tree() -> Result<()> {
    let model = pram_fmt_xml::load(&["tests/models/event_tree.xml"], Settings::default())?;
    let tree = &model.event_trees()[0];
    assert_eq!(tree.name(), "LOSP");
    assert_eq!(tree.functional_events().len(), 1);

    // Sequences land in the model and in the owning tree.
    let s1 = model.get_sequence("S1")?;
    assert_eq!(tree.sequences(), &[s1]);
    assert_eq!(model.sequence(s1).instructions().len(), 1);

    let b1 = tree.branch_index("B1").expect("registered branch");
    let named = tree.branch(b1).branch();
    assert_eq!(named.instructions().len(), 1);
    assert_eq!(named.target(), Some(Target::Sequence(s1)));

    let Some(Target::Fork(fork)) = tree.initial_state().target() else {
        panic!("initial state must fork");
    };
    let fork = tree.fork(fork);
    assert_eq!(fork.functional_event(), 0);
    assert_eq!(fork.paths().len(), 2);
    assert_eq!(fork.paths()[0].state(), "success");
    assert_eq!(fork.paths()[1].state(), "failure");
    // Both paths resolve to the same named branch.
    for path in fork.paths() {
        assert_eq!(path.branch().target(), Some(Target::Branch(b1)));
    }
    assert_eq!(fork.paths()[1].branch().instructions().len(), 1);
    Ok(())
}

#[test]
fn ccf_groups() -> Result<()> {
    let model = pram_fmt_xml::load(&["tests/models/ccf.xml"], Settings::default())?;
    assert_eq!(model.ccf_groups().len(), 2);

    let pumps = &model.ccf_groups()[0];
    assert_eq!(pumps.model(), CcfModel::Mgl);
    assert_eq!(pumps.members().len(), 3);
    let levels: Vec<usize> = pumps.factors().iter().map(|f| f.level).collect();
    assert_eq!(levels, vec![2, 3]);
    assert!(pumps.distribution().is_some());
    // Setup applied the model to the members.
    assert_eq!(pumps.member_factors().len(), 3);

    // Members are ordinary, globally registered basic events.
    let member = model.get_basic_event("pump-a", "")?;
    assert!(model.basic_event(member).ccf_group().is_some());

    // Positional factors start at the model's minimum level.
    let valves = &model.ccf_groups()[1];
    assert_eq!(valves.model(), CcfModel::BetaFactor);
    assert_eq!(valves.factors()[0].level, 2);
    Ok(())
}

#[test]
fn histogram_boundaries_and_weights() -> Result<()> {
    let model = pram_fmt_xml::load(&["tests/models/histogram.xml"], Settings::default())?;
    let event = model.get_basic_event("calibration", "")?;
    let expression = model.basic_event(event).expression().expect("histogram");
    let Expression::Histogram {
        boundaries,
        weights,
    } = model.expression(expression)
    else {
        panic!("histogram expected");
    };
    let boundaries: Vec<f64> = boundaries
        .iter()
        .map(|&id| model.constant_value(id).expect("constant boundary"))
        .collect();
    let weights: Vec<f64> = weights
        .iter()
        .map(|&id| model.constant_value(id).expect("constant weight"))
        .collect();
    assert_eq!(boundaries, vec![0.0, 1.0, 2.0]);
    assert_eq!(weights, vec![0.3, 0.7]);
    Ok(())
}

#[test]
fn references_resolve_across_files() -> Result<()> {
    // The first file references a parameter the second file defines.
    let model = pram_fmt_xml::load(
        &["tests/models/two_files_a.xml", "tests/models/two_files_b.xml"],
        Settings::default().probability_analysis(true),
    )?;
    let relay = model.get_basic_event("relay", "")?;
    assert!(model.basic_event(relay).has_expression());
    let rate = model.get_parameter("shared-rate", "")?;
    assert!(!model.parameter(rate).unused());
    Ok(())
}

#[test]
fn mission_time_comes_from_settings() -> Result<()> {
    let model = pram_fmt_xml::load(
        &["tests/models/fault_tree.xml"],
        Settings::default().mission_time(1000.0),
    )?;
    assert_eq!(model.mission_time().value(), 1000.0);
    Ok(())
}

#[test]
fn repeated_loads_agree() -> Result<()> {
    let files = ["tests/models/fault_tree.xml"];
    let first = pram_fmt_xml::load(&files, Settings::default())?;
    let second = pram_fmt_xml::load(&files, Settings::default())?;
    let names = |model: &pram_fmt_xml::Model| -> Vec<String> {
        model
            .gates()
            .iter()
            .map(|g| g.name().to_string())
            .chain(model.basic_events().iter().map(|e| e.name().to_string()))
            .chain(model.parameters().iter().map(|p| p.name().to_string()))
            .collect()
    };
    assert_eq!(names(&first), names(&second));
    assert_eq!(
        first.fault_trees()[0].top_events(),
        second.fault_trees()[0].top_events()
    );
    Ok(())
}
