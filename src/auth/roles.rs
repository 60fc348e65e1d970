//! Route role requirements.
//!
//! Every guarded route carries a [`RouteId`] made of its group (the router it
//! belongs to) and its handler name. A [`RoleTable`] maps groups and handlers
//! to the roles allowed through. A handler entry replaces the group entry
//! outright, so an empty handler entry makes one route of a protected group
//! public and a narrower entry tightens it. Roles are never merged across the
//! two levels.

use std::{collections::HashMap, fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// Closed set of user categories.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(type_name = "user_type", rename_all = "UPPERCASE")]
pub enum Role {
    #[default]
    #[serde(alias = "buyer")]
    Buyer,
    #[serde(alias = "realtor")]
    Realtor,
    #[serde(alias = "admin")]
    Admin,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Buyer, Role::Realtor, Role::Admin];

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Buyer => "BUYER",
            Role::Realtor => "REALTOR",
            Role::Admin => "ADMIN",
        }
    }

    /// Signing up with this role requires a product key.
    pub fn is_privileged(self) -> bool {
        self != Role::Buyer
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|r| r.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown role {s}"))
    }
}

/// Roles allowed through a route. Empty means public.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleSet(Vec<Role>);

impl RoleSet {
    pub const fn public() -> Self {
        Self(Vec::new())
    }

    pub fn of(roles: &[Role]) -> Self {
        roles.iter().copied().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, role: Role) -> bool {
        self.0.contains(&role)
    }
}

impl FromIterator<Role> for RoleSet {
    fn from_iter<I: IntoIterator<Item = Role>>(iter: I) -> Self {
        let mut roles = Vec::new();
        for role in iter {
            if !roles.contains(&role) {
                roles.push(role);
            }
        }
        Self(roles)
    }
}

/// Identifies one handler inside one route group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RouteId {
    pub group: &'static str,
    pub handler: &'static str,
}

impl RouteId {
    pub const fn new(group: &'static str, handler: &'static str) -> Self {
        Self { group, handler }
    }
}

impl fmt::Display for RouteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.group, self.handler)
    }
}

static PUBLIC: RoleSet = RoleSet::public();

#[derive(Debug, Clone, Default)]
pub struct RoleTable {
    groups: HashMap<&'static str, RoleSet>,
    handlers: HashMap<RouteId, RoleSet>,
}

impl RoleTable {
    pub fn builder() -> RoleTableBuilder {
        RoleTableBuilder::default()
    }

    /// Handler entry if declared, else group entry, else no restriction.
    pub fn resolve(&self, route: &RouteId) -> &RoleSet {
        self.handlers
            .get(route)
            .or_else(|| self.groups.get(route.group))
            .unwrap_or(&PUBLIC)
    }
}

#[derive(Debug, Default)]
pub struct RoleTableBuilder {
    table: RoleTable,
}

impl RoleTableBuilder {
    pub fn group(mut self, group: &'static str, roles: &[Role]) -> Self {
        self.table.groups.insert(group, RoleSet::of(roles));
        self
    }

    pub fn handler(mut self, route: RouteId, roles: &[Role]) -> Self {
        self.table.handlers.insert(route, RoleSet::of(roles));
        self
    }

    pub fn build(self) -> RoleTable {
        self.table
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIST: RouteId = RouteId::new("homes", "list");
    const CREATE: RouteId = RouteId::new("homes", "create");
    const INQUIRE: RouteId = RouteId::new("homes", "inquire");
    const HEALTH: RouteId = RouteId::new("ops", "health");

    fn table() -> RoleTable {
        RoleTable::builder()
            .group("homes", &[Role::Buyer])
            .handler(INQUIRE, &[Role::Realtor])
            .handler(LIST, &[])
            .build()
    }

    #[test]
    fn handler_entry_replaces_group_entry() {
        let roles = table().resolve(&INQUIRE).clone();
        assert!(roles.contains(Role::Realtor));
        assert!(!roles.contains(Role::Buyer));
    }

    #[test]
    fn empty_handler_entry_makes_route_public() {
        assert!(table().resolve(&LIST).is_empty());
    }

    #[test]
    fn group_entry_applies_without_handler_entry() {
        assert_eq!(table().resolve(&CREATE), &RoleSet::of(&[Role::Buyer]));
    }

    #[test]
    fn undeclared_route_is_unrestricted() {
        assert!(table().resolve(&HEALTH).is_empty());
    }

    #[test]
    fn role_set_deduplicates() {
        let set = RoleSet::of(&[Role::Admin, Role::Admin, Role::Buyer]);
        assert_eq!(set, RoleSet::of(&[Role::Admin, Role::Buyer]));
    }

    #[test]
    fn role_parses_and_serializes_uppercase() {
        assert_eq!("realtor".parse::<Role>().unwrap(), Role::Realtor);
        assert_eq!("ADMIN".parse::<Role>().unwrap(), Role::Admin);
        assert!("owner".parse::<Role>().is_err());
        assert_eq!(serde_json::to_string(&Role::Buyer).unwrap(), "\"BUYER\"");
        let parsed: Role = serde_json::from_str("\"realtor\"").unwrap();
        assert_eq!(parsed, Role::Realtor);
    }
}
