// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! # Permissions
//!
//! Permissions are opaque to the tree except for one operation: two
//! permissions can be combined into a disjunction ("pass if either
//! holds"), which is how aggregation up the ancestor chain (see
//! `insert::recompute_permissions`) is expressed.

use std::collections::HashSet;

/// A permission required to reach some node or execute some command.
///
/// `Permission::Named` is a leaf permission string, checked against a
/// [`PermissionAuthority`]. `Permission::AnyOf` is a disjunction built
/// up by permission aggregation (see §4.4 of the design): a sender
/// satisfies it if they satisfy any one of its members.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Permission {
    /// A single named permission, checked by the authority.
    Named(String),
    /// A disjunction of permissions: satisfied if any one is.
    AnyOf(Vec<Permission>),
}

impl Permission {
    /// Construct a leaf permission with the given name.
    pub fn named(name: impl Into<String>) -> Self {
        Permission::Named(name.into())
    }

    /// Combine two permissions into their disjunction, flattening and
    /// deduplicating any nested `AnyOf`s so repeated aggregation
    /// doesn't build up unbounded nesting.
    pub fn any_of(a: Permission, b: Permission) -> Permission {
        let mut members = Vec::new();
        let mut seen = HashSet::new();
        flatten_into(a, &mut members, &mut seen);
        flatten_into(b, &mut members, &mut seen);
        if members.len() == 1 {
            members.pop().unwrap()
        } else {
            Permission::AnyOf(members)
        }
    }

    /// Evaluate this permission against a sender using the given
    /// authority. `AnyOf` is satisfied as soon as one member is.
    pub fn is_granted<S>(&self, sender: &S, authority: &dyn PermissionAuthority<S>) -> bool {
        match self {
            Permission::Named(name) => authority.has(sender, name),
            Permission::AnyOf(members) => members.iter().any(|p| p.is_granted(sender, authority)),
        }
    }
}

fn flatten_into(p: Permission, out: &mut Vec<Permission>, seen: &mut HashSet<Permission>) {
    match p {
        Permission::AnyOf(members) => {
            for m in members {
                flatten_into(m, out, seen);
            }
        }
        leaf => {
            if seen.insert(leaf.clone()) {
                out.push(leaf);
            }
        }
    }
}

impl std::hash::Hash for Permission {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        match self {
            Permission::Named(n) => {
                0u8.hash(state);
                n.hash(state);
            }
            Permission::AnyOf(members) => {
                1u8.hash(state);
                members.hash(state);
            }
        }
    }
}

/// External collaborator answering "can `sender` use `permission`?".
///
/// This crate treats implementations as injected dependencies; the
/// dispatch tree never constructs one itself.
pub trait PermissionAuthority<S>: Send + Sync {
    /// Whether `sender` holds the named leaf permission.
    fn has(&self, sender: &S, permission: &str) -> bool;
}

/// A [`PermissionAuthority`] that grants every permission to every
/// sender. Useful for tests and for hosts with no permission model.
#[derive(Clone, Copy, Debug, Default)]
pub struct AllowAll;

impl<S> PermissionAuthority<S> for AllowAll {
    fn has(&self, _sender: &S, _permission: &str) -> bool {
        true
    }
}

/// A [`PermissionAuthority`] backed by a fixed set of granted
/// permission names, the same for every sender. Useful for tests that
/// need to distinguish permitted from denied senders by a predicate
/// instead, see [`PredicateAuthority`].
#[derive(Clone, Debug, Default)]
pub struct GrantedSet(pub HashSet<String>);

impl<S> PermissionAuthority<S> for GrantedSet {
    fn has(&self, _sender: &S, permission: &str) -> bool {
        self.0.contains(permission)
    }
}

type Predicate<S> = Box<dyn Fn(&S, &str) -> bool + Send + Sync>;

/// A [`PermissionAuthority`] backed by an arbitrary predicate over
/// `(sender, permission name)`.
pub struct PredicateAuthority<S> {
    predicate: Predicate<S>,
}

impl<S> PredicateAuthority<S> {
    /// Build an authority from a predicate closure.
    pub fn new(predicate: impl Fn(&S, &str) -> bool + Send + Sync + 'static) -> Self {
        PredicateAuthority {
            predicate: Box::new(predicate),
        }
    }
}

impl<S> PermissionAuthority<S> for PredicateAuthority<S> {
    fn has(&self, sender: &S, permission: &str) -> bool {
        (self.predicate)(sender, permission)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn any_of_flattens_and_dedupes() {
        let a = Permission::any_of(Permission::named("a"), Permission::named("b"));
        let b = Permission::any_of(a.clone(), Permission::named("a"));
        assert_eq!(
            b,
            Permission::AnyOf(vec![Permission::named("a"), Permission::named("b")])
        );
    }

    #[test]
    fn any_of_single_member_collapses() {
        let a = Permission::any_of(Permission::named("x"), Permission::named("x"));
        assert_eq!(a, Permission::named("x"));
    }

    #[test]
    fn is_granted_checks_any_member() {
        let perm = Permission::any_of(Permission::named("a"), Permission::named("b"));
        let authority = GrantedSet(["b".to_string()].into_iter().collect());
        assert!(perm.is_granted(&(), &authority));
        let none = GrantedSet::default();
        assert!(!perm.is_granted(&(), &none));
    }
}
