//! The filter algebra the store accepts.
//!
//! Deliberately small: one attribute, equality or "one of a set", plus an
//! `and` wrapper holding exactly one inner filter (the shape single-hop
//! relationship lookups arrive in). Anything richer is the upstream ORM's
//! responsibility.

use std::collections::BTreeMap;

use crate::codec::Value;

/// Constraint on a single attribute.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// Attribute equals the value.
    Eq(Value),
    /// Attribute equals one of the values.
    In(Vec<Value>),
}

/// A restricted filter expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Attribute-to-condition mapping. The translator only accepts exactly
    /// one entry; empty and multi-attribute maps are rejected with typed
    /// errors rather than here, so malformed ORM input surfaces loudly.
    Where(BTreeMap<String, Condition>),
    /// Conjunction wrapper; only the one-element form is resolvable.
    And(Vec<Filter>),
}

impl Filter {
    /// Equality filter on one attribute.
    pub fn eq(attr: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Where(BTreeMap::from([(attr.into(), Condition::Eq(value.into()))]))
    }

    /// Membership filter on one attribute.
    pub fn one_of(attr: impl Into<String>, values: impl IntoIterator<Item = Value>) -> Self {
        Filter::Where(BTreeMap::from([(
            attr.into(),
            Condition::In(values.into_iter().collect()),
        )]))
    }

    /// Wrap filters in a conjunction.
    pub fn and(filters: impl IntoIterator<Item = Filter>) -> Self {
        Filter::And(filters.into_iter().collect())
    }

    /// An empty filter (always rejected by the translator; exists so
    /// callers can represent "no constraint" input faithfully).
    pub fn empty() -> Self {
        Filter::Where(BTreeMap::new())
    }
}

/// A find request: a filter plus an optional attribute selection.
#[derive(Debug, Clone, PartialEq)]
pub struct Criteria {
    /// Which records to match.
    pub filter: Filter,
    /// Which attributes to fetch; `None` means all declared attributes.
    pub select: Option<Vec<String>>,
}

impl Criteria {
    pub fn new(filter: Filter) -> Self {
        Self { filter, select: None }
    }

    /// Restrict the fetched attributes.
    pub fn select(mut self, attrs: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.select = Some(attrs.into_iter().map(Into::into).collect());
        self
    }
}
