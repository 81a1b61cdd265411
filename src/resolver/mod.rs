//! Rename/move disambiguation.
//!
//! When a category has both created and deleted entities the differ cannot tell a rename from
//! an unrelated drop and create. It asks a [`Resolver`], then checks that the answer accounts
//! for every input exactly once. Whether a pairing is plausible is the resolver's business.

pub mod interactive;
pub mod programmatic;

use std::collections::BTreeMap;

pub use interactive::InteractiveResolver;
pub use programmatic::{Heuristic, HeuristicResolver, ScriptedResolver};

use crate::error::{BoxError, DiffError, Result};
use crate::snapshot::{
    Column, Enum, Index, Policy, Role, Sequence, Table, View,
    id::{Category, EntityId},
};

/// An entity offered to a resolver, with its fully qualified id.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate<T> {
    pub id: EntityId,
    pub entity: T,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Pairing<T> {
    pub from: Candidate<T>,
    pub to: Candidate<T>,
}

#[derive(Debug, Clone)]
pub struct ResolverInput<T> {
    pub category: Category,
    pub created: Vec<Candidate<T>>,
    pub deleted: Vec<Candidate<T>>,
}

/// A resolver's answer. `moved` pairs keep their name and change schema; `renamed` pairs may
/// change both.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution<T> {
    pub created: Vec<Candidate<T>>,
    pub deleted: Vec<Candidate<T>>,
    pub renamed: Vec<Pairing<T>>,
    pub moved: Vec<Pairing<T>>,
}

impl<T> Default for Resolution<T> {
    fn default() -> Self {
        Self {
            created: Vec::new(),
            deleted: Vec::new(),
            renamed: Vec::new(),
            moved: Vec::new(),
        }
    }
}

impl<T> Resolution<T> {
    /// Treat every created and deleted entity as unrelated.
    pub fn independent(input: ResolverInput<T>) -> Self {
        Self {
            created: input.created,
            deleted: input.deleted,
            ..Self::default()
        }
    }

    /// Record `from` → `to` as a move when only the schema differs, else as a rename.
    pub fn pair(&mut self, from: Candidate<T>, to: Candidate<T>) {
        if from.id.same_name_other_schema(&to.id) {
            self.moved.push(Pairing { from, to });
        } else {
            self.renamed.push(Pairing { from, to });
        }
    }
}

/// Entities a resolver can pair up.
pub trait Resolvable: Clone + PartialEq + std::fmt::Debug {
    /// Structurally identical apart from identity (name and schema).
    fn same_shape(&self, other: &Self) -> bool;
}

#[allow(async_fn_in_trait)]
pub trait Resolver {
    async fn resolve<T: Resolvable>(
        &mut self,
        input: ResolverInput<T>,
    ) -> std::result::Result<Resolution<T>, BoxError>;
}

impl<R: Resolver> Resolver for &mut R {
    async fn resolve<T: Resolvable>(
        &mut self,
        input: ResolverInput<T>,
    ) -> std::result::Result<Resolution<T>, BoxError> {
        (**self).resolve(input).await
    }
}

/// Check that a resolution is total and invents nothing.
pub fn validate_resolution<T>(
    category: Category,
    created: &[EntityId],
    deleted: &[EntityId],
    resolution: &Resolution<T>,
) -> Result<()> {
    let ambiguity = |detail: String| DiffError::UnresolvedAmbiguity { category, detail };

    for pairing in &resolution.moved {
        if !category.is_namespaced() {
            return Err(ambiguity(format!(
                "{} cannot be moved between schemas",
                pairing.from.id
            )));
        }
        if !pairing.from.id.same_name_other_schema(&pairing.to.id) {
            return Err(ambiguity(format!(
                "move from {} to {} must keep the name and change the schema",
                pairing.from.id, pairing.to.id
            )));
        }
    }

    let answered_created = resolution
        .created
        .iter()
        .map(|c| &c.id)
        .chain(resolution.renamed.iter().map(|p| &p.to.id))
        .chain(resolution.moved.iter().map(|p| &p.to.id));
    account_for(created, answered_created, "created").map_err(ambiguity)?;

    let answered_deleted = resolution
        .deleted
        .iter()
        .map(|c| &c.id)
        .chain(resolution.renamed.iter().map(|p| &p.from.id))
        .chain(resolution.moved.iter().map(|p| &p.from.id));
    account_for(deleted, answered_deleted, "deleted").map_err(ambiguity)?;

    Ok(())
}

fn account_for<'a>(
    expected: &[EntityId],
    answered: impl Iterator<Item = &'a EntityId>,
    side: &str,
) -> std::result::Result<(), String> {
    let mut remaining: BTreeMap<&EntityId, usize> = BTreeMap::new();
    for id in expected {
        *remaining.entry(id).or_default() += 1;
    }
    for id in answered {
        match remaining.get_mut(id) {
            Some(count) if *count > 0 => *count -= 1,
            Some(_) => return Err(format!("{id} was answered more than once")),
            None => return Err(format!("{id} is not one of the {side} entities")),
        }
    }
    match remaining.into_iter().find(|(_, count)| *count > 0) {
        Some((id, _)) => Err(format!("no decision for {side} {id}")),
        None => Ok(()),
    }
}

impl Resolvable for String {
    fn same_shape(&self, _other: &Self) -> bool {
        true
    }
}

impl Resolvable for Enum {
    fn same_shape(&self, other: &Self) -> bool {
        self.values == other.values
    }
}

impl Resolvable for Sequence {
    fn same_shape(&self, other: &Self) -> bool {
        self.increment == other.increment
            && self.min_value == other.min_value
            && self.max_value == other.max_value
            && self.start_with == other.start_with
            && self.cache == other.cache
            && self.cycle == other.cycle
    }
}

impl Resolvable for Role {
    fn same_shape(&self, other: &Self) -> bool {
        self.create_db == other.create_db
            && self.create_role == other.create_role
            && self.inherit == other.inherit
    }
}

impl Resolvable for Policy {
    fn same_shape(&self, other: &Self) -> bool {
        self.kind == other.kind
            && self.command == other.command
            && self.to == other.to
            && self.using == other.using
            && self.with_check == other.with_check
    }
}

impl Resolvable for Table {
    fn same_shape(&self, other: &Self) -> bool {
        self.columns == other.columns
    }
}

impl Resolvable for Column {
    fn same_shape(&self, other: &Self) -> bool {
        self.data_type == other.data_type
            && self.type_schema == other.type_schema
            && self.not_null == other.not_null
            && self.default == other.default
            && self.generated == other.generated
    }
}

impl Resolvable for Index {
    fn same_shape(&self, other: &Self) -> bool {
        self.columns == other.columns
            && self.is_unique == other.is_unique
            && self.where_clause == other.where_clause
    }
}

impl Resolvable for View {
    fn same_shape(&self, other: &Self) -> bool {
        self.definition == other.definition && self.materialized == other.materialized
    }
}
