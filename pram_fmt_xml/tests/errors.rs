use pram_fmt_xml::{Error, Settings};

fn load_err<P: AsRef<std::path::Path>>(files: &[P], settings: Settings) -> Error {
    pram_fmt_xml::load(files, settings)
        .err()
        .expect("loading must fail")
        .downcast::<Error>()
        .expect("loader error kind")
}

#[test]
fn missing_input_file() {
    let err = load_err(&["tests/models/no_such_model.xml"], Settings::default());
    assert!(matches!(err, Error::Io(_)));
    assert!(err.to_string().contains("File doesn't exist"));
}

#[test]
fn duplicate_canonical_input_paths() {
    let err = load_err(
        &["tests/models/fault_tree.xml", "./tests/models/fault_tree.xml"],
        Settings::default(),
    );
    assert!(matches!(err, Error::DuplicateArgument(_)));
    let msg = err.to_string();
    assert!(msg.contains("Duplicate input files"));
    assert!(msg.contains("tests/models/fault_tree.xml"));
    assert!(msg.contains("./tests/models/fault_tree.xml"));
}

#[test]
fn duplicate_public_parameter_across_files() {
    let err = load_err(
        &["tests/models/lambda_one.xml", "tests/models/lambda_two.xml"],
        Settings::default(),
    );
    assert!(matches!(err, Error::Validation(_)));
    let msg = err.to_string();
    assert!(msg.contains("lambda"));
    assert!(msg.contains("lambda_two.xml"));
    assert!(msg.contains("At line"));
}

#[test]
fn gate_cycle() {
    let err = load_err(&["tests/models/gate_cycle.xml"], Settings::default());
    assert!(matches!(err, Error::Cycle(_)));
    let msg = err.to_string();
    assert!(msg.contains("g1"));
    assert!(msg.contains("g2"));
}

#[test]
fn branch_cycle() {
    let err = load_err(&["tests/models/branch_cycle.xml"], Settings::default());
    assert!(matches!(err, Error::Cycle(_)));
    let msg = err.to_string();
    assert!(msg.contains("b1"));
    assert!(msg.contains("b2"));
}

#[test]
fn parameter_cycle() {
    let err = load_err(&["tests/models/parameter_cycle.xml"], Settings::default());
    assert!(matches!(err, Error::Cycle(_)));
    let msg = err.to_string();
    assert!(msg.contains("p1"));
    assert!(msg.contains("p2"));
}

#[test]
fn vote_threshold_out_of_bounds() {
    let err = load_err(&["tests/models/vote.xml"], Settings::default());
    assert!(matches!(err, Error::Validation(_)));
    let msg = err.to_string();
    assert!(msg.contains("At line"));
    assert!(msg.contains("vote number 3"));
}

#[test]
fn parameter_unit_mismatch() {
    let err = load_err(&["tests/models/unit_mismatch.xml"], Settings::default());
    assert!(matches!(err, Error::Validation(_)));
    let msg = err.to_string();
    assert!(msg.contains("hours"));
    assert!(msg.contains("years"));
}

#[test]
fn private_names_stay_invisible_to_siblings() {
    let err = load_err(&["tests/models/scope_isolation.xml"], Settings::default());
    assert!(matches!(err, Error::Validation(_)));
    let msg = err.to_string();
    assert!(msg.contains("hidden"));
    assert!(msg.contains("ft.b"));
}

#[test]
fn probability_analysis_requires_expressions() {
    // Without probability analysis the bare events are fine.
    pram_fmt_xml::load(&["tests/models/missing_expression.xml"], Settings::default())
        .expect("bare basic events load");
    let err = load_err(
        &["tests/models/missing_expression.xml"],
        Settings::default().probability_analysis(true),
    );
    assert!(matches!(err, Error::Validation(_)));
    let msg = err.to_string();
    // All offenders batch into one report.
    assert!(msg.contains("first-bare"));
    assert!(msg.contains("second-bare"));
}

#[test]
fn periodic_test_argument_count() {
    let err = load_err(&["tests/models/periodic_test.xml"], Settings::default());
    assert!(matches!(err, Error::Validation(_)));
    let msg = err.to_string();
    assert!(msg.contains("Periodic Test"));
    assert!(msg.contains("At line"));
}
