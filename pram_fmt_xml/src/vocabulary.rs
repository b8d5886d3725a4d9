//! Tag and attribute names of the Open-PSA MEF vocabulary.

pub(crate) const TAG_OPSA_MEF: &str = "opsa-mef";

pub(crate) const TAG_DEFINE_EVENT_TREE: &str = "define-event-tree";
pub(crate) const TAG_DEFINE_FAULT_TREE: &str = "define-fault-tree";
pub(crate) const TAG_DEFINE_CCF_GROUP: &str = "define-CCF-group";
pub(crate) const TAG_MODEL_DATA: &str = "model-data";

pub(crate) const TAG_DEFINE_GATE: &str = "define-gate";
pub(crate) const TAG_DEFINE_HOUSE_EVENT: &str = "define-house-event";
pub(crate) const TAG_DEFINE_BASIC_EVENT: &str = "define-basic-event";
pub(crate) const TAG_DEFINE_PARAMETER: &str = "define-parameter";
pub(crate) const TAG_DEFINE_COMPONENT: &str = "define-component";

pub(crate) const TAG_DEFINE_FUNCTIONAL_EVENT: &str = "define-functional-event";
pub(crate) const TAG_DEFINE_SEQUENCE: &str = "define-sequence";
pub(crate) const TAG_DEFINE_BRANCH: &str = "define-branch";
pub(crate) const TAG_INITIAL_STATE: &str = "initial-state";
pub(crate) const TAG_FORK: &str = "fork";
pub(crate) const TAG_PATH: &str = "path";
pub(crate) const TAG_SEQUENCE: &str = "sequence";
pub(crate) const TAG_BRANCH: &str = "branch";
pub(crate) const TAG_COLLECT_EXPRESSION: &str = "collect-expression";

pub(crate) const TAG_LABEL: &str = "label";
pub(crate) const TAG_ATTRIBUTES: &str = "attributes";
pub(crate) const TAG_ATTRIBUTE: &str = "attribute";
pub(crate) const TAG_CONSTANT: &str = "constant";

pub(crate) const TAG_MEMBERS: &str = "members";
pub(crate) const TAG_BASIC_EVENT: &str = "basic-event";
pub(crate) const TAG_DISTRIBUTION: &str = "distribution";
pub(crate) const TAG_FACTOR: &str = "factor";
pub(crate) const TAG_FACTORS: &str = "factors";

pub(crate) const TAG_INT: &str = "int";
pub(crate) const TAG_FLOAT: &str = "float";
pub(crate) const TAG_BOOL: &str = "bool";
pub(crate) const TAG_PI: &str = "pi";
pub(crate) const TAG_PARAMETER: &str = "parameter";
pub(crate) const TAG_SYSTEM_MISSION_TIME: &str = "system-mission-time";
pub(crate) const TAG_BIN: &str = "bin";
pub(crate) const TAG_CASE: &str = "case";

pub(crate) const ATTR_NAME: &str = "name";
pub(crate) const ATTR_ROLE: &str = "role";
pub(crate) const ATTR_VALUE: &str = "value";
pub(crate) const ATTR_TYPE: &str = "type";
pub(crate) const ATTR_MIN: &str = "min";
pub(crate) const ATTR_UNIT: &str = "unit";
pub(crate) const ATTR_LEVEL: &str = "level";
pub(crate) const ATTR_MODEL: &str = "model";
pub(crate) const ATTR_STATE: &str = "state";
pub(crate) const ATTR_FUNCTIONAL_EVENT: &str = "functional-event";
