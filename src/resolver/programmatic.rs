//! Non-interactive resolvers for CI, tests and library callers.
use std::collections::BTreeMap;
use std::fmt;

use tracing::debug;

use super::{Candidate, Resolution, Resolvable, Resolver, ResolverInput};
use crate::error::BoxError;
use crate::snapshot::id::{Category, EntityId};

type PairFn = Box<dyn Fn(&EntityId, &EntityId) -> bool + Send + Sync>;

/// How [`HeuristicResolver`] decides whether a deleted entity became a created one.
#[derive(Default)]
pub enum Heuristic {
    /// Every created/deleted entity is independent.
    #[default]
    Never,
    /// Pair entities that are structurally identical apart from their name.
    SameShape,
    /// Caller-supplied predicate over (deleted, created) ids.
    Custom(PairFn),
}

impl fmt::Debug for Heuristic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Heuristic::Never => f.write_str("Never"),
            Heuristic::SameShape => f.write_str("SameShape"),
            Heuristic::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

#[derive(Debug, Default)]
pub struct HeuristicResolver {
    heuristic: Heuristic,
}

impl HeuristicResolver {
    pub fn new(heuristic: Heuristic) -> Self {
        Self { heuristic }
    }

    pub fn custom(pair: impl Fn(&EntityId, &EntityId) -> bool + Send + Sync + 'static) -> Self {
        Self::new(Heuristic::Custom(Box::new(pair)))
    }

    fn matches<T: Resolvable>(&self, deleted: &Candidate<T>, created: &Candidate<T>) -> bool {
        match &self.heuristic {
            Heuristic::Never => false,
            Heuristic::SameShape => deleted.entity.same_shape(&created.entity),
            Heuristic::Custom(pair) => pair(&deleted.id, &created.id),
        }
    }
}

impl Resolver for HeuristicResolver {
    async fn resolve<T: Resolvable>(
        &mut self,
        input: ResolverInput<T>,
    ) -> Result<Resolution<T>, BoxError> {
        if matches!(self.heuristic, Heuristic::Never) {
            return Ok(Resolution::independent(input));
        }

        // greedy: each created entity takes the first unclaimed deleted match
        let mut remaining = input.deleted;
        let mut resolution = Resolution::default();
        for created in input.created {
            match remaining
                .iter()
                .position(|deleted| self.matches(deleted, &created))
            {
                Some(position) => {
                    let deleted = remaining.remove(position);
                    debug!("Pairing {} with {}", deleted.id, created.id);
                    resolution.pair(deleted, created);
                }
                None => resolution.created.push(created),
            }
        }
        resolution.deleted = remaining;
        Ok(resolution)
    }
}

/// Explicit rename map, keyed by category and the entity's dotted path.
#[derive(Debug, Clone, Default)]
pub struct ScriptedResolver {
    renames: BTreeMap<(Category, String), String>,
}

impl ScriptedResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rename(
        mut self,
        category: Category,
        from: impl Into<String>,
        to: impl Into<String>,
    ) -> Self {
        self.renames.insert((category, from.into()), to.into());
        self
    }

    /// Parse `category:from=to`, e.g. `column:public.users.name=public.users.full_name`.
    pub fn parse_rename(spec: &str) -> Result<(Category, String, String), String> {
        let (category, mapping) = spec
            .split_once(':')
            .ok_or_else(|| format!("expected category:from=to, got '{spec}'"))?;
        let category: Category = category.parse()?;
        let (from, to) = mapping
            .split_once('=')
            .ok_or_else(|| format!("expected from=to, got '{mapping}'"))?;
        if from.is_empty() || to.is_empty() {
            return Err(format!("empty rename in '{spec}'"));
        }
        Ok((category, from.to_string(), to.to_string()))
    }

    pub fn is_empty(&self) -> bool {
        self.renames.is_empty()
    }
}

impl Resolver for ScriptedResolver {
    async fn resolve<T: Resolvable>(
        &mut self,
        input: ResolverInput<T>,
    ) -> Result<Resolution<T>, BoxError> {
        let category = input.category;
        let mut created = input.created;
        let mut resolution = Resolution::default();

        for deleted in input.deleted {
            let target = self.renames.get(&(category, deleted.id.path()));
            let position =
                target.and_then(|to| created.iter().position(|c| &c.id.path() == to));
            match position {
                Some(position) => {
                    let to = created.remove(position);
                    resolution.pair(deleted, to);
                }
                None => resolution.deleted.push(deleted),
            }
        }
        resolution.created = created;
        Ok(resolution)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::validate_resolution;
    use crate::snapshot::Column;

    fn column(table: &str, name: &str, data_type: &str) -> Candidate<Column> {
        Candidate {
            id: EntityId::column("", table, name),
            entity: Column::new(name, data_type),
        }
    }

    fn input() -> ResolverInput<Column> {
        ResolverInput {
            category: Category::Columns,
            created: vec![column("users", "full_name", "text"), column("users", "age", "integer")],
            deleted: vec![column("users", "name", "text")],
        }
    }

    #[tokio::test]
    async fn test_never_is_independent() {
        let resolution = HeuristicResolver::default().resolve(input()).await.unwrap();
        assert_eq!(resolution.created.len(), 2);
        assert_eq!(resolution.deleted.len(), 1);
        assert!(resolution.renamed.is_empty());
    }

    #[tokio::test]
    async fn test_same_shape_pairs_matching_columns() {
        let mut resolver = HeuristicResolver::new(Heuristic::SameShape);
        let resolution = resolver.resolve(input()).await.unwrap();

        assert_eq!(resolution.renamed.len(), 1);
        assert_eq!(resolution.renamed[0].from.id.name(), "name");
        assert_eq!(resolution.renamed[0].to.id.name(), "full_name");
        assert_eq!(resolution.created.len(), 1);
        assert!(resolution.deleted.is_empty());
    }

    #[tokio::test]
    async fn test_custom_predicate() {
        let mut resolver = HeuristicResolver::custom(|from, to| from.name() == "name" && to.name() == "age");
        let resolution = resolver.resolve(input()).await.unwrap();
        assert_eq!(resolution.renamed[0].to.id.name(), "age");
    }

    #[tokio::test]
    async fn test_scripted_rename() {
        let mut resolver =
            ScriptedResolver::new().rename(Category::Columns, "users.name", "users.full_name");
        let resolution = resolver.resolve(input()).await.unwrap();

        let created: Vec<_> = input().created.iter().map(|c| c.id.clone()).collect();
        let deleted: Vec<_> = input().deleted.iter().map(|c| c.id.clone()).collect();
        validate_resolution(Category::Columns, &created, &deleted, &resolution).unwrap();
        assert_eq!(resolution.renamed.len(), 1);
        assert_eq!(resolution.created.len(), 1);
    }

    #[test]
    fn test_parse_rename() {
        assert_eq!(
            ScriptedResolver::parse_rename("table:public.users=public.accounts"),
            Ok((
                Category::Tables,
                "public.users".to_string(),
                "public.accounts".to_string()
            ))
        );
        assert!(ScriptedResolver::parse_rename("users=accounts").is_err());
        assert!(ScriptedResolver::parse_rename("gizmo:a=b").is_err());
    }
}
