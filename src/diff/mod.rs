pub mod columns;
pub mod constraints;
pub mod enums;
pub mod indexes;
pub mod operations;
pub mod order;
pub mod patch;
pub mod policies;
pub mod roles;
pub mod schemas;
pub mod sequences;
pub mod tables;
pub mod views;

use std::collections::BTreeMap;

use tracing::{debug, info};

use crate::diff::operations::MigrationStep;
use crate::error::{DiffError, Result};
use crate::resolver::{Candidate, Resolution, Resolvable, Resolver, ResolverInput, validate_resolution};
use crate::snapshot::id::{Category, EntityId};
use crate::snapshot::{
    CheckConstraint, Column, Enum, ForeignKey, Index, Policy, PrimaryKey, Role, Sequence,
    SnapshotMeta, Table, UniqueConstraint, View,
};
use crate::squash::SquashedSchema;

/// Set difference of one category between two states.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryDiff<T> {
    pub created: Vec<T>,
    pub deleted: Vec<T>,
    pub altered: Vec<Altered<T>>,
}

impl<T> Default for CategoryDiff<T> {
    fn default() -> Self {
        Self {
            created: Vec::new(),
            deleted: Vec::new(),
            altered: Vec::new(),
        }
    }
}

impl<T> CategoryDiff<T> {
    pub fn is_empty(&self) -> bool {
        self.created.is_empty() && self.deleted.is_empty() && self.altered.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Altered<T> {
    pub before: T,
    pub after: T,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Renamed<T> {
    pub from: T,
    pub to: T,
}

/// Key entities on both sides and split them into created, deleted and altered.
/// Created and altered follow `new`'s order, deleted follows `old`'s.
pub fn diff_list<'a, T, K>(
    old: impl IntoIterator<Item = &'a T>,
    new: impl IntoIterator<Item = &'a T>,
    key_of: impl Fn(&T) -> K,
) -> CategoryDiff<T>
where
    T: Clone + PartialEq + 'a,
    K: Ord,
{
    let old: Vec<&T> = old.into_iter().collect();
    let new: Vec<&T> = new.into_iter().collect();
    let old_map: BTreeMap<K, &T> = old.iter().map(|o| (key_of(o), *o)).collect();
    let new_map: BTreeMap<K, &T> = new.iter().map(|n| (key_of(n), *n)).collect();

    let mut diff = CategoryDiff::default();
    for n in &new {
        match old_map.get(&key_of(n)) {
            None => diff.created.push((*n).clone()),
            Some(o) if *o != *n => diff.altered.push(Altered {
                before: (*o).clone(),
                after: (*n).clone(),
            }),
            Some(_) => {}
        }
    }
    for o in &old {
        if !new_map.contains_key(&key_of(o)) {
            diff.deleted.push((*o).clone());
        }
    }
    diff
}

/// A category after rename resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedCategory<T> {
    pub created: Vec<T>,
    pub deleted: Vec<T>,
    pub renamed: Vec<Renamed<T>>,
    pub moved: Vec<Renamed<T>>,
    pub altered: Vec<Altered<T>>,
}

impl<T> Default for ResolvedCategory<T> {
    fn default() -> Self {
        Self {
            created: Vec::new(),
            deleted: Vec::new(),
            renamed: Vec::new(),
            moved: Vec::new(),
            altered: Vec::new(),
        }
    }
}

impl<T> ResolvedCategory<T> {
    fn from_resolution(resolution: Resolution<T>, altered: Vec<Altered<T>>) -> Self {
        let pairs = |pairs: Vec<crate::resolver::Pairing<T>>| {
            pairs
                .into_iter()
                .map(|p| Renamed {
                    from: p.from.entity,
                    to: p.to.entity,
                })
                .collect()
        };
        Self {
            created: resolution.created.into_iter().map(|c| c.entity).collect(),
            deleted: resolution.deleted.into_iter().map(|c| c.entity).collect(),
            renamed: pairs(resolution.renamed),
            moved: pairs(resolution.moved),
            altered,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.created.is_empty()
            && self.deleted.is_empty()
            && self.renamed.is_empty()
            && self.moved.is_empty()
            && self.altered.is_empty()
    }

    /// Map each decision to steps: `diff` handles create/drop/alter like a keyed differ,
    /// `relocate` handles renames and moves.
    pub fn steps(
        &self,
        diff: impl Fn(Option<&T>, Option<&T>) -> Vec<MigrationStep>,
        relocate: impl Fn(&T, &T) -> Vec<MigrationStep>,
    ) -> Vec<MigrationStep> {
        let mut steps = Vec::new();
        for pair in self.moved.iter().chain(&self.renamed) {
            steps.extend(relocate(&pair.from, &pair.to));
        }
        for deleted in &self.deleted {
            steps.extend(diff(Some(deleted), None));
        }
        for created in &self.created {
            steps.extend(diff(None, Some(created)));
        }
        for altered in &self.altered {
            steps.extend(diff(Some(&altered.before), Some(&altered.after)));
        }
        steps
    }

    fn entries(&self, id_of: impl Fn(&T) -> EntityId) -> Vec<DiffEntry> {
        let mut entries = Vec::new();
        entries.extend(self.created.iter().map(|c| DiffEntry::created(id_of(c))));
        entries.extend(self.deleted.iter().map(|d| DiffEntry::deleted(id_of(d))));
        entries.extend(
            self.renamed
                .iter()
                .map(|p| DiffEntry::paired(EntryKind::Renamed, id_of(&p.from), id_of(&p.to))),
        );
        entries.extend(
            self.moved
                .iter()
                .map(|p| DiffEntry::paired(EntryKind::Moved, id_of(&p.from), id_of(&p.to))),
        );
        entries.extend(self.altered.iter().map(|a| {
            DiffEntry::paired(EntryKind::Altered, id_of(&a.before), id_of(&a.after))
        }));
        entries
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    Created,
    Deleted,
    Renamed,
    Moved,
    Altered,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffEntry {
    pub category: Category,
    pub kind: EntryKind,
    pub before: Option<EntityId>,
    pub after: Option<EntityId>,
}

impl DiffEntry {
    fn created(id: EntityId) -> Self {
        Self {
            category: id.category(),
            kind: EntryKind::Created,
            before: None,
            after: Some(id),
        }
    }

    fn deleted(id: EntityId) -> Self {
        Self {
            category: id.category(),
            kind: EntryKind::Deleted,
            before: Some(id),
            after: None,
        }
    }

    fn paired(kind: EntryKind, before: EntityId, after: EntityId) -> Self {
        Self {
            category: after.category(),
            kind,
            before: Some(before),
            after: Some(after),
        }
    }
}

/// Changes inside a table that exists on both sides.
#[derive(Debug, Clone, PartialEq)]
pub struct TableDiff {
    /// Previous state with renames applied.
    pub before: Table,
    pub after: Table,
    pub columns: ResolvedCategory<Column>,
    pub indexes: ResolvedCategory<Index>,
    pub foreign_keys: CategoryDiff<ForeignKey>,
    pub primary_keys: CategoryDiff<PrimaryKey>,
    pub unique_constraints: CategoryDiff<UniqueConstraint>,
    pub check_constraints: CategoryDiff<CheckConstraint>,
    pub policies: ResolvedCategory<Policy>,
}

impl TableDiff {
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
            && self.indexes.is_empty()
            && self.foreign_keys.is_empty()
            && self.primary_keys.is_empty()
            && self.unique_constraints.is_empty()
            && self.check_constraints.is_empty()
            && self.policies.is_empty()
            && self.before.rls_enabled == self.after.rls_enabled
    }
}

/// Output of the differ: every category resolved, plus the patched previous state the
/// compiler needs for table recreation.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedDiff {
    pub prev: SquashedSchema,
    pub cur: SquashedSchema,
    pub schemas: ResolvedCategory<String>,
    pub enums: ResolvedCategory<Enum>,
    pub sequences: ResolvedCategory<Sequence>,
    pub roles: ResolvedCategory<Role>,
    pub policies: ResolvedCategory<Policy>,
    pub tables: ResolvedCategory<Table>,
    pub table_diffs: Vec<TableDiff>,
    pub views: ResolvedCategory<View>,
    pub entries: Vec<DiffEntry>,
    pub renames: SnapshotMeta,
}

impl ResolvedDiff {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Diff two squashed states, asking `resolver` whenever a category has both created and
/// deleted entities.
pub async fn diff_snapshots<R: Resolver>(
    prev: &SquashedSchema,
    cur: &SquashedSchema,
    resolver: &mut R,
) -> Result<ResolvedDiff> {
    if prev.dialect != cur.dialect {
        return Err(DiffError::DialectMismatch {
            prev: prev.dialect,
            cur: cur.dialect,
        });
    }
    info!("Diffing snapshots...");

    let mut differ = Differ {
        resolver,
        prev: prev.clone(),
        cur,
        entries: Vec::new(),
        renames: SnapshotMeta::default(),
    };

    let schemas = differ.schemas().await?;
    let enums = differ.enums().await?;
    let sequences = differ.sequences().await?;
    let roles = differ.roles().await?;
    let policies = differ.standalone_policies().await?;
    let tables = differ.tables().await?;
    let table_diffs = differ.table_diffs().await?;
    let views = differ.views().await?;

    info!("Diff complete: {} changes", differ.entries.len());
    Ok(ResolvedDiff {
        prev: differ.prev,
        cur: cur.clone(),
        schemas,
        enums,
        sequences,
        roles,
        policies,
        tables,
        table_diffs,
        views,
        entries: differ.entries,
        renames: differ.renames,
    })
}

/// Wrap both sides as candidates and, when both are non-empty, let the resolver decide.
async fn resolve_category<R: Resolver, T: Resolvable>(
    resolver: &mut R,
    category: Category,
    created: Vec<T>,
    deleted: Vec<T>,
    id_of: &impl Fn(&T) -> EntityId,
) -> Result<Resolution<T>> {
    let wrap = |items: Vec<T>| -> Vec<Candidate<T>> {
        items
            .into_iter()
            .map(|entity| Candidate {
                id: id_of(&entity),
                entity,
            })
            .collect()
    };
    let created = wrap(created);
    let deleted = wrap(deleted);
    if created.is_empty() || deleted.is_empty() {
        return Ok(Resolution {
            created,
            deleted,
            ..Resolution::default()
        });
    }

    debug!(
        "Resolving {} created and {} deleted {}",
        created.len(),
        deleted.len(),
        category
    );
    let created_ids: Vec<EntityId> = created.iter().map(|c| c.id.clone()).collect();
    let deleted_ids: Vec<EntityId> = deleted.iter().map(|c| c.id.clone()).collect();
    let resolution = resolver
        .resolve(ResolverInput {
            category,
            created,
            deleted,
        })
        .await
        .map_err(|source| DiffError::Resolver { category, source })?;
    validate_resolution(category, &created_ids, &deleted_ids, &resolution)?;
    Ok(resolution)
}

struct Differ<'a, R> {
    resolver: &'a mut R,
    /// Previous state, patched with every rename resolved so far.
    prev: SquashedSchema,
    cur: &'a SquashedSchema,
    entries: Vec<DiffEntry>,
    renames: SnapshotMeta,
}

impl<R: Resolver> Differ<'_, R> {
    fn record<T>(
        &mut self,
        resolved: ResolvedCategory<T>,
        id_of: impl Fn(&T) -> EntityId,
    ) -> ResolvedCategory<T> {
        self.entries.extend(resolved.entries(id_of));
        resolved
    }

    async fn schemas(&mut self) -> Result<ResolvedCategory<String>> {
        let id_of = |name: &String| EntityId::Schema { name: name.clone() };
        let key_of = |name: &String| name.clone();
        let initial = diff_list(self.prev.schemas.values(), self.cur.schemas.values(), key_of);
        let resolution = resolve_category(
            &mut *self.resolver,
            Category::Schemas,
            initial.created,
            initial.deleted,
            &id_of,
        )
        .await?;

        for pair in &resolution.renamed {
            patch::rename_schema(&mut self.prev, &pair.from.entity, &pair.to.entity);
            self.renames
                .schemas
                .insert(pair.from.entity.clone(), pair.to.entity.clone());
        }

        let altered =
            diff_list(self.prev.schemas.values(), self.cur.schemas.values(), key_of).altered;
        Ok(self.record(ResolvedCategory::from_resolution(resolution, altered), id_of))
    }

    async fn enums(&mut self) -> Result<ResolvedCategory<Enum>> {
        let initial = diff_list(self.prev.enums.values(), self.cur.enums.values(), Enum::key);
        let resolution = resolve_category(
            &mut *self.resolver,
            Category::Enums,
            initial.created,
            initial.deleted,
            &Enum::id,
        )
        .await?;

        for pair in resolution.moved.iter().chain(&resolution.renamed) {
            patch::relocate_enum(&mut self.prev, &pair.from.entity, &pair.to.entity);
        }

        let altered = diff_list(self.prev.enums.values(), self.cur.enums.values(), Enum::key).altered;
        Ok(self.record(ResolvedCategory::from_resolution(resolution, altered), Enum::id))
    }

    async fn sequences(&mut self) -> Result<ResolvedCategory<Sequence>> {
        let initial = diff_list(
            self.prev.sequences.values(),
            self.cur.sequences.values(),
            Sequence::key,
        );
        let resolution = resolve_category(
            &mut *self.resolver,
            Category::Sequences,
            initial.created,
            initial.deleted,
            &Sequence::id,
        )
        .await?;

        for pair in resolution.moved.iter().chain(&resolution.renamed) {
            patch::relocate_sequence(&mut self.prev, &pair.from.entity, &pair.to.entity);
        }

        let altered = diff_list(
            self.prev.sequences.values(),
            self.cur.sequences.values(),
            Sequence::key,
        )
        .altered;
        Ok(self.record(ResolvedCategory::from_resolution(resolution, altered), Sequence::id))
    }

    async fn roles(&mut self) -> Result<ResolvedCategory<Role>> {
        let key_of = |role: &Role| role.name.clone();
        let initial = diff_list(self.prev.roles.values(), self.cur.roles.values(), key_of);
        let resolution = resolve_category(
            &mut *self.resolver,
            Category::Roles,
            initial.created,
            initial.deleted,
            &Role::id,
        )
        .await?;

        for pair in &resolution.renamed {
            patch::rename_role(&mut self.prev, &pair.from.entity.name, &pair.to.entity.name);
        }

        let altered = diff_list(self.prev.roles.values(), self.cur.roles.values(), key_of).altered;
        Ok(self.record(ResolvedCategory::from_resolution(resolution, altered), Role::id))
    }

    async fn standalone_policies(&mut self) -> Result<ResolvedCategory<Policy>> {
        let id_of = standalone_policy_id;
        let key_of = |policy: &Policy| (policy.on.clone(), policy.name.clone());
        let initial = diff_list(self.prev.policies.values(), self.cur.policies.values(), key_of);
        let resolution = resolve_category(
            &mut *self.resolver,
            Category::Policies,
            initial.created,
            initial.deleted,
            &id_of,
        )
        .await?;

        for pair in &resolution.renamed {
            patch::rename_standalone_policy(&mut self.prev, &pair.from.entity, &pair.to.entity);
        }

        let altered =
            diff_list(self.prev.policies.values(), self.cur.policies.values(), key_of).altered;
        Ok(self.record(ResolvedCategory::from_resolution(resolution, altered), id_of))
    }

    async fn tables(&mut self) -> Result<ResolvedCategory<Table>> {
        let initial = diff_list(self.prev.tables.values(), self.cur.tables.values(), Table::key);
        let resolution = resolve_category(
            &mut *self.resolver,
            Category::Tables,
            initial.created,
            initial.deleted,
            &Table::id,
        )
        .await?;

        for pair in resolution.moved.iter().chain(&resolution.renamed) {
            patch::relocate_table(&mut self.prev, &pair.from.entity, &pair.to.entity);
            self.renames
                .tables
                .insert(pair.from.id.path(), pair.to.id.path());
        }

        // surviving tables are reported through their table diffs, never as altered here
        let resolved = ResolvedCategory::from_resolution(resolution, Vec::new());
        Ok(self.record(resolved, Table::id))
    }

    /// Nested changes for tables present on both sides. Column renames are resolved for every
    /// table first so foreign keys pointing at renamed columns compare equal afterwards.
    async fn table_diffs(&mut self) -> Result<Vec<TableDiff>> {
        let cur = self.cur;
        let surviving: Vec<&Table> = cur
            .tables
            .values()
            .filter(|table| self.prev.tables.contains_key(&table.key()))
            .collect();

        let mut column_resolutions = Vec::with_capacity(surviving.len());
        for after in &surviving {
            let Some(before) = self.prev.tables.get(&after.key()) else {
                continue;
            };
            let initial = diff_list(before.columns.values(), after.columns.values(), column_key);
            let id_of = |column: &Column| after.column_id(&column.name);
            let resolution = resolve_category(
                &mut *self.resolver,
                Category::Columns,
                initial.created,
                initial.deleted,
                &id_of,
            )
            .await?;

            for pair in &resolution.renamed {
                patch::rename_column(
                    &mut self.prev,
                    &after.key(),
                    &pair.from.entity.name,
                    &pair.to.entity.name,
                );
                self.renames
                    .columns
                    .insert(pair.from.id.path(), pair.to.id.path());
            }
            column_resolutions.push((*after, resolution));
        }

        let mut diffs = Vec::new();
        for (after, column_resolution) in column_resolutions {
            if let Some(diff) = self.table_diff(after, column_resolution).await? {
                diffs.push(diff);
            }
        }
        Ok(diffs)
    }

    async fn table_diff(
        &mut self,
        after: &Table,
        column_resolution: Resolution<Column>,
    ) -> Result<Option<TableDiff>> {
        let key = after.key();
        let Some(mut before) = self.prev.tables.get(&key).cloned() else {
            return Ok(None);
        };

        let column_altered =
            diff_list(before.columns.values(), after.columns.values(), column_key).altered;
        let columns = ResolvedCategory::from_resolution(column_resolution, column_altered);

        let index_id = |index: &Index| EntityId::Index {
            schema: after.schema.clone(),
            table: after.name.clone(),
            name: index.name.clone(),
        };
        let index_key = |index: &Index| index.name.clone();
        let initial = diff_list(before.indexes.values(), after.indexes.values(), index_key);
        let resolution = resolve_category(
            &mut *self.resolver,
            Category::Indexes,
            initial.created,
            initial.deleted,
            &index_id,
        )
        .await?;
        for pair in &resolution.renamed {
            patch::rename_index(&mut before, &pair.from.entity.name, &pair.to.entity.name);
        }
        let altered = diff_list(before.indexes.values(), after.indexes.values(), index_key).altered;
        let indexes = ResolvedCategory::from_resolution(resolution, altered);

        let policy_id = |policy: &Policy| EntityId::Policy {
            schema: after.schema.clone(),
            table: after.name.clone(),
            name: policy.name.clone(),
        };
        let policy_key = |policy: &Policy| policy.name.clone();
        let initial = diff_list(before.policies.values(), after.policies.values(), policy_key);
        let resolution = resolve_category(
            &mut *self.resolver,
            Category::Policies,
            initial.created,
            initial.deleted,
            &policy_id,
        )
        .await?;
        for pair in &resolution.renamed {
            patch::rename_table_policy(&mut before, &pair.from.entity.name, &pair.to.entity.name);
        }
        let altered =
            diff_list(before.policies.values(), after.policies.values(), policy_key).altered;
        let policies = ResolvedCategory::from_resolution(resolution, altered);

        let diff = TableDiff {
            foreign_keys: diff_list(
                before.foreign_keys.values(),
                after.foreign_keys.values(),
                |fk: &ForeignKey| fk.name.clone(),
            ),
            primary_keys: diff_list(
                before.composite_primary_keys.values(),
                after.composite_primary_keys.values(),
                |pk: &PrimaryKey| pk.name.clone(),
            ),
            unique_constraints: diff_list(
                before.unique_constraints.values(),
                after.unique_constraints.values(),
                |unique: &UniqueConstraint| unique.name.clone(),
            ),
            check_constraints: diff_list(
                before.check_constraints.values(),
                after.check_constraints.values(),
                |check: &CheckConstraint| check.name.clone(),
            ),
            before: before.clone(),
            after: after.clone(),
            columns,
            indexes,
            policies,
        };
        self.prev.tables.insert(key, before);

        if diff.is_empty() {
            return Ok(None);
        }

        debug!("Table {} changed", after.id());
        self.entries.push(DiffEntry::paired(
            EntryKind::Altered,
            after.id(),
            after.id(),
        ));
        self.entries
            .extend(diff.columns.entries(|column| after.column_id(&column.name)));
        self.entries.extend(diff.indexes.entries(index_id));
        self.entries.extend(diff.policies.entries(policy_id));
        let constraint_id = |name: &str| EntityId::Constraint {
            schema: after.schema.clone(),
            table: after.name.clone(),
            name: name.to_string(),
        };
        self.entries.extend(constraint_entries(&diff.foreign_keys, |fk| constraint_id(&fk.name)));
        self.entries.extend(constraint_entries(&diff.primary_keys, |pk| constraint_id(&pk.name)));
        self.entries.extend(constraint_entries(&diff.unique_constraints, |u| {
            constraint_id(&u.name)
        }));
        self.entries.extend(constraint_entries(&diff.check_constraints, |c| {
            constraint_id(&c.name)
        }));

        Ok(Some(diff))
    }

    async fn views(&mut self) -> Result<ResolvedCategory<View>> {
        let owned = |view: &&View| !view.is_existing;
        let initial = diff_list(
            self.prev.views.values().filter(owned),
            self.cur.views.values().filter(owned),
            View::key,
        );
        let resolution = resolve_category(
            &mut *self.resolver,
            Category::Views,
            initial.created,
            initial.deleted,
            &View::id,
        )
        .await?;

        for pair in resolution.moved.iter().chain(&resolution.renamed) {
            patch::relocate_view(&mut self.prev, &pair.from.entity, &pair.to.entity);
        }

        let altered = diff_list(
            self.prev.views.values().filter(owned),
            self.cur.views.values().filter(owned),
            View::key,
        )
        .altered;
        Ok(self.record(ResolvedCategory::from_resolution(resolution, altered), View::id))
    }
}

fn column_key(column: &Column) -> String {
    column.name.clone()
}

fn standalone_policy_id(policy: &Policy) -> EntityId {
    let (schema, table) = policy.target().unwrap_or_default();
    EntityId::Policy {
        schema,
        table,
        name: policy.name.clone(),
    }
}

fn constraint_entries<T>(diff: &CategoryDiff<T>, id_of: impl Fn(&T) -> EntityId) -> Vec<DiffEntry> {
    let mut entries = Vec::new();
    entries.extend(diff.created.iter().map(|c| DiffEntry::created(id_of(c))));
    entries.extend(diff.deleted.iter().map(|d| DiffEntry::deleted(id_of(d))));
    entries.extend(diff.altered.iter().map(|a| {
        DiffEntry::paired(EntryKind::Altered, id_of(&a.before), id_of(&a.after))
    }));
    entries
}

/// Turn a resolved diff into unordered, dialect-neutral steps.
pub fn build_steps(diff: &ResolvedDiff) -> Vec<MigrationStep> {
    let mut steps = Vec::new();
    steps.extend(schemas::steps(&diff.schemas));
    steps.extend(enums::steps(&diff.enums, &diff.cur));
    steps.extend(sequences::steps(&diff.sequences));
    steps.extend(roles::steps(&diff.roles));
    steps.extend(policies::standalone_steps(&diff.policies));
    steps.extend(tables::steps(&diff.tables, &diff.table_diffs));
    steps.extend(views::steps(&diff.views));
    steps
}
