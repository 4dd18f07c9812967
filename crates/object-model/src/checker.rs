//! Name-based security checkers.
//!
//! A checker maps attribute names to the permission required to read or
//! write them. The special public marker means no permission is needed.

use std::collections::BTreeMap;

pub const PUBLIC_PERMISSION_ID: &str = "zope.Public";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Permission {
    /// The public marker.
    Public,
    Named(String),
}

impl Permission {
    pub fn parse(id: &str) -> Permission {
        if id == PUBLIC_PERMISSION_ID {
            Permission::Public
        } else {
            Permission::Named(id.to_string())
        }
    }

    pub fn id(&self) -> &str {
        match self {
            Permission::Public => PUBLIC_PERMISSION_ID,
            Permission::Named(id) => id,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Checker {
    get: BTreeMap<String, Permission>,
    set: BTreeMap<String, Permission>,
}

impl Checker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allow_read(mut self, name: impl Into<String>, permission: Permission) -> Self {
        self.get.insert(name.into(), permission);
        self
    }

    pub fn allow_write(mut self, name: impl Into<String>, permission: Permission) -> Self {
        self.set.insert(name.into(), permission);
        self
    }

    pub fn read_permission(&self, name: &str) -> Option<&Permission> {
        self.get.get(name)
    }

    pub fn write_permission(&self, name: &str) -> Option<&Permission> {
        self.set.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_public_marker() {
        assert_eq!(Permission::parse("zope.Public"), Permission::Public);
        assert_eq!(
            Permission::parse("zope.ManageContent"),
            Permission::Named("zope.ManageContent".into())
        );
        assert_eq!(Permission::Public.id(), "zope.Public");
    }

    #[test]
    fn test_checker_lookup() {
        let checker = Checker::new()
            .allow_read("title", Permission::Public)
            .allow_write("title", Permission::parse("zope.ManageContent"));

        assert_eq!(checker.read_permission("title"), Some(&Permission::Public));
        assert_eq!(
            checker.write_permission("title").map(Permission::id),
            Some("zope.ManageContent")
        );
        assert!(checker.read_permission("other").is_none());
    }
}
