//! Common data shared by all named analysis constructs.

/// An Open-PSA attribute attached to an element.
///
/// These are not XML attributes but the format's own arbitrary
/// name/value/type triples that may decorate most constructs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: String,
    pub kind: Option<String>,
}

/// Name, optional label and attribute list common to every construct.
#[derive(Debug, Clone, Default)]
pub struct Meta {
    name: String,
    label: Option<String>,
    attributes: Vec<Attribute>,
}

impl Meta {
    pub fn new(name: impl Into<String>) -> Self {
        Meta {
            name: name.into(),
            label: None,
            attributes: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn set_label(&mut self, label: impl Into<String>) {
        self.label = Some(label.into());
    }

    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    pub fn add_attribute(&mut self, attribute: Attribute) {
        self.attributes.push(attribute);
    }
}

/// Visibility of a named construct within its container path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Role {
    /// Globally addressable by bare name.
    #[default]
    Public,
    /// Addressable only under its base path.
    Private,
}

impl Role {
    /// Parses a role specifier string.
    pub fn parse(s: &str) -> Option<Role> {
        match s {
            "public" => Some(Role::Public),
            "private" => Some(Role::Private),
            _ => None,
        }
    }

    /// Resolves an optional explicit role against the inherited one.
    pub fn resolve(explicit: Option<Role>, parent: Role) -> Role {
        explicit.unwrap_or(parent)
    }
}

/// The registration key of a construct: the dotted full path for private
/// constructs, the bare name for public ones.
pub(crate) fn scope_key(name: &str, base_path: &str, role: Role) -> String {
    match role {
        Role::Private if !base_path.is_empty() => format!("{base_path}.{name}"),
        _ => name.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_inheritance() {
        assert_eq!(Role::resolve(None, Role::Private), Role::Private);
        assert_eq!(Role::resolve(Some(Role::Public), Role::Private), Role::Public);
        assert_eq!(Role::parse("private"), Some(Role::Private));
        assert_eq!(Role::parse("protected"), None);
    }

    #[test]
    fn scope_keys() {
        assert_eq!(scope_key("g", "ft.sub", Role::Private), "ft.sub.g");
        assert_eq!(scope_key("g", "ft.sub", Role::Public), "g");
        assert_eq!(scope_key("g", "", Role::Private), "g");
    }
}
