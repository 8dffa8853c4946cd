//! Generic versioned repository.
//!
//! Every mutation follows the same path:
//!
//! ```text
//! Received -> Prepared -> Diffed (updates) -> Persisted -> RelationshipsWritten
//!          -> (commit) -> HookDispatched -> Done
//! ```
//!
//! Everything up to and including the relationship writes runs inside one
//! storage transaction; an error at any point rolls the whole mutation back.
//! The post-mutation hook runs only after commit, outside the connection
//! lock, and its failure is reported rather than propagated.

use crate::config::RepositoryConfig;
use crate::error::{RepoError, RepoResult};
use crate::ledger::ChangeRecorder;
use crate::resolver::ReferenceResolver;
use crate::updater::EntityUpdater;
use catalog_hooks::{DeployRequest, HookAction, HookDispatchError, HookDispatcher, HookReport};
use catalog_model::{
    fqn, Containment, Entity, EntityReference, Include, KindSpec, Relationship, UndeployOn, OWNER_TYPES,
};
use catalog_storage::{CatalogDb, EntityRow, ListQuery, StoreTx};
use catalog_types::{EntityId, EntityVersion, Operation, VersionStep};
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info};

/// What a mutation did to the stored entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationStatus {
    Created,
    Updated,
    /// The candidate matched the stored entity; nothing was written.
    Unchanged,
    SoftDeleted,
    HardDeleted,
    Restored,
}

/// Result of a successful mutation.
#[derive(Debug)]
pub struct Mutation<E> {
    /// The entity as committed, references included. For a hard delete,
    /// the last state before removal.
    pub entity: E,
    pub status: MutationStatus,
    /// Outcome of the post-mutation side effect.
    pub hook: HookReport,
    /// Undeploy outcomes for contained entities removed by a recursive
    /// delete, in the order they were removed.
    pub cascaded: Vec<HookReport>,
}

/// How [`EntityRepository::delete`] removes an entity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeleteMode {
    /// Remove rows, edges, tags and history instead of flagging as deleted.
    pub hard: bool,
    /// Also delete contained entities. Required when children exist.
    pub recursive: bool,
}

impl DeleteMode {
    pub fn soft() -> Self {
        Self::default()
    }

    pub fn hard() -> Self {
        Self {
            hard: true,
            recursive: false,
        }
    }

    pub fn recursive(mut self) -> Self {
        self.recursive = true;
        self
    }
}

/// Filter and paging for [`EntityRepository::list`].
#[derive(Debug, Clone, Default)]
pub struct ListParams {
    /// Page size; the configured default when `None`.
    pub limit: Option<usize>,
    /// Cursor: only entities whose FQN sorts after this one.
    pub after: Option<String>,
    pub include: Include,
    /// Only entities contained by this entity.
    pub container: Option<EntityId>,
}

/// One page of a listing.
#[derive(Debug, Clone)]
pub struct EntityPage<E> {
    pub data: Vec<E>,
    /// Cursor for the next page, `None` on the last page.
    pub after: Option<String>,
}

/// Repository for one record kind.
pub struct EntityRepository<E: Entity> {
    db: CatalogDb,
    spec: KindSpec<E>,
    resolver: Arc<dyn ReferenceResolver>,
    hooks: HookDispatcher,
    config: RepositoryConfig,
    /// Undeploy policy for contained kinds, keyed by entity type.
    child_undeploy: HashMap<&'static str, UndeployOn>,
}

impl<E: Entity> EntityRepository<E> {
    pub fn new(
        db: CatalogDb,
        spec: KindSpec<E>,
        resolver: Arc<dyn ReferenceResolver>,
        hooks: HookDispatcher,
        config: RepositoryConfig,
    ) -> Self {
        Self {
            db,
            spec,
            resolver,
            hooks,
            config,
            child_undeploy: HashMap::new(),
        }
    }

    /// Undeploys contained entities of `entity_type` that a recursive
    /// delete removes, when `policy` applies to the delete mode.
    pub fn with_child_undeploy(mut self, entity_type: &'static str, policy: UndeployOn) -> Self {
        self.child_undeploy.insert(entity_type, policy);
        self
    }

    pub fn spec(&self) -> &KindSpec<E> {
        &self.spec
    }

    pub fn config(&self) -> &RepositoryConfig {
        &self.config
    }

    // ── Mutations ────────────────────────────────────────────────

    /// Stores a new entity at the initial version.
    pub async fn create(&self, entity: E, updated_by: &str) -> RepoResult<Mutation<E>> {
        debug!(kind = E::ENTITY_TYPE, name = entity.name(), "received create");
        let created = self
            .db
            .transaction(|tx| self.create_in_tx(tx, entity, updated_by))?;
        info!(kind = E::ENTITY_TYPE, id = %created.id(), version = %created.version(), "created");
        let hook = self.after_create(&created).await;
        Ok(Mutation {
            entity: created,
            status: MutationStatus::Created,
            hook,
            cascaded: Vec::new(),
        })
    }

    /// Replaces the entity with `id` by `entity`.
    ///
    /// With `expected_version` set, the update fails with
    /// [`RepoError::Conflict`] unless the stored version still matches.
    pub async fn update(
        &self,
        id: EntityId,
        entity: E,
        updated_by: &str,
        expected_version: Option<EntityVersion>,
    ) -> RepoResult<Mutation<E>> {
        debug!(kind = E::ENTITY_TYPE, %id, "received update");
        let (updated, changed) = self.db.transaction(|tx| -> RepoResult<_> {
            let original = self.load_live(tx, id)?;
            check_expected(&original, expected_version)?;
            self.update_in_tx(tx, original, entity, updated_by, Operation::Put)
        })?;
        self.finish_update(updated, changed).await
    }

    /// Creates the entity, or updates the one with the same fully qualified
    /// name. A soft-deleted match is brought back as part of the update.
    pub async fn create_or_update(&self, entity: E, updated_by: &str) -> RepoResult<Mutation<E>> {
        debug!(kind = E::ENTITY_TYPE, name = entity.name(), "received create-or-update");
        let outcome = self.db.transaction(|tx| -> RepoResult<_> {
            let fqn = self.candidate_fqn(tx, &entity)?;
            match tx.get_entity_by_fqn(E::ENTITY_TYPE, &fqn)? {
                None => self.create_in_tx(tx, entity, updated_by).map(|e| (e, None)),
                Some(row) => {
                    let original = self.load(tx, &row)?;
                    self.update_in_tx(tx, original, entity, updated_by, Operation::Put)
                        .map(|(e, changed)| (e, Some(changed)))
                }
            }
        })?;
        match outcome {
            (created, None) => {
                info!(kind = E::ENTITY_TYPE, id = %created.id(), "created");
                let hook = self.after_create(&created).await;
                Ok(Mutation {
                    entity: created,
                    status: MutationStatus::Created,
                    hook,
                    cascaded: Vec::new(),
                })
            }
            (updated, Some(changed)) => self.finish_update(updated, changed).await,
        }
    }

    /// Applies `edit` to the stored entity and records the differences.
    ///
    /// Unlike [`EntityRepository::update`], a field the edit clears is
    /// recorded as removed even when the field keeps its value on PUT.
    pub async fn patch(
        &self,
        id: EntityId,
        updated_by: &str,
        expected_version: Option<EntityVersion>,
        edit: impl FnOnce(&mut E),
    ) -> RepoResult<Mutation<E>> {
        debug!(kind = E::ENTITY_TYPE, %id, "received patch");
        let (updated, changed) = self.db.transaction(|tx| -> RepoResult<_> {
            let original = self.load_live(tx, id)?;
            check_expected(&original, expected_version)?;
            let mut candidate = original.clone();
            edit(&mut candidate);
            self.update_in_tx(tx, original, candidate, updated_by, Operation::Patch)
        })?;
        self.finish_update(updated, changed).await
    }

    /// Deletes an entity.
    ///
    /// A soft delete flags the entity, bumps its version and keeps its
    /// edges. A hard delete removes the row, its edges, tags and history.
    /// Contained entities go with it only when `mode.recursive` is set.
    /// Children whose kind is registered with
    /// [`EntityRepository::with_child_undeploy`] are undeployed after commit.
    pub async fn delete(&self, id: EntityId, updated_by: &str, mode: DeleteMode) -> RepoResult<Mutation<E>> {
        debug!(kind = E::ENTITY_TYPE, %id, hard = mode.hard, recursive = mode.recursive, "received delete");
        let (deleted, removed) = self.db.transaction(|tx| -> RepoResult<_> {
            let row = self
                .find_row(tx, id)?
                .ok_or_else(|| RepoError::NotFound(format!("{} {id}", E::ENTITY_TYPE)))?;
            if row.deleted && !mode.hard {
                return Err(RepoError::NotFound(format!("{} {id}", E::ENTITY_TYPE)));
            }
            let entity = self.load(tx, &row)?;

            let children = tx.find_children(id, Relationship::Contains)?;
            if !children.is_empty() && !mode.recursive {
                return Err(RepoError::Validation(format!(
                    "{} {} contains {} entities; delete recursively",
                    E::ENTITY_TYPE,
                    entity.name(),
                    children.len()
                )));
            }
            let now = now_millis();
            let cascade = Cascade {
                updated_by,
                now,
                hard: mode.hard,
                deleted: true,
                step: self.config.version_step,
            };
            let mut removed = Vec::new();
            for child in &children {
                cascade.apply(tx, child.to_id, &mut removed)?;
            }

            if mode.hard {
                remove_entity(tx, id)?;
                Ok((entity, removed))
            } else {
                Ok((self.set_deleted(tx, entity, true, updated_by, now)?, removed))
            }
        })?;

        let status = if mode.hard {
            MutationStatus::HardDeleted
        } else {
            MutationStatus::SoftDeleted
        };
        info!(kind = E::ENTITY_TYPE, %id, ?status, "deleted");

        let hook = if self.spec.hooks.should_undeploy(mode.hard) {
            self.hooks
                .dispatch(HookAction::Undeploy {
                    name: deleted.name().to_string(),
                })
                .await
        } else {
            HookReport::NotTriggered
        };
        let cascaded = self.undeploy_children(removed, mode.hard).await;
        Ok(Mutation {
            entity: deleted,
            status,
            hook,
            cascaded,
        })
    }

    /// Brings a soft-deleted entity, and its soft-deleted children, back.
    pub async fn restore(&self, id: EntityId, updated_by: &str) -> RepoResult<Mutation<E>> {
        debug!(kind = E::ENTITY_TYPE, %id, "received restore");
        let restored = self.db.transaction(|tx| -> RepoResult<E> {
            let row = self
                .find_row(tx, id)?
                .filter(|row| row.deleted)
                .ok_or_else(|| RepoError::NotFound(format!("deleted {} {id}", E::ENTITY_TYPE)))?;
            let entity = self.load(tx, &row)?;
            let now = now_millis();
            let cascade = Cascade {
                updated_by,
                now,
                hard: false,
                deleted: false,
                step: self.config.version_step,
            };
            let mut touched = Vec::new();
            for child in tx.find_children(id, Relationship::Contains)? {
                cascade.apply(tx, child.to_id, &mut touched)?;
            }
            self.set_deleted(tx, entity, false, updated_by, now)
        })?;
        info!(kind = E::ENTITY_TYPE, %id, version = %restored.version(), "restored");
        Ok(Mutation {
            entity: restored,
            status: MutationStatus::Restored,
            hook: HookReport::NotTriggered,
            cascaded: Vec::new(),
        })
    }

    // ── Reads ────────────────────────────────────────────────────

    /// Loads an entity by id.
    pub fn get(&self, id: EntityId, include: Include) -> RepoResult<E> {
        self.db.read(|tx| {
            let row = self
                .find_row(tx, id)?
                .filter(|row| include.admits(row.deleted))
                .ok_or_else(|| RepoError::NotFound(format!("{} {id}", E::ENTITY_TYPE)))?;
            self.load(tx, &row)
        })
    }

    /// Loads an entity by fully qualified name.
    pub fn get_by_name(&self, fqn: &str, include: Include) -> RepoResult<E> {
        self.db.read(|tx| {
            let row = tx
                .get_entity_by_fqn(E::ENTITY_TYPE, fqn)?
                .filter(|row| include.admits(row.deleted))
                .ok_or_else(|| RepoError::NotFound(format!("{} {fqn}", E::ENTITY_TYPE)))?;
            self.load(tx, &row)
        })
    }

    /// Lists entities ordered by fully qualified name.
    pub fn list(&self, params: &ListParams) -> RepoResult<EntityPage<E>> {
        let limit = params.limit.unwrap_or(self.config.default_page_size);
        self.db.read(|tx| {
            let rows = tx.list_entities(&ListQuery {
                entity_type: E::ENTITY_TYPE,
                after: params.after.as_deref(),
                limit,
                include: params.include,
                container: params.container,
            })?;
            let after = if limit > 0 && rows.len() == limit {
                rows.last().map(|row| row.fqn.clone())
            } else {
                None
            };
            let data = rows
                .iter()
                .map(|row| self.load(tx, row))
                .collect::<RepoResult<Vec<_>>>()?;
            Ok(EntityPage { data, after })
        })
    }

    /// Every stored version of an entity, newest first.
    ///
    /// Historic versions are returned as stored: owner, container and tags
    /// are not part of them.
    pub fn list_versions(&self, id: EntityId) -> RepoResult<Vec<E>> {
        self.db.read(|tx| {
            let versions = tx.list_versions(id, E::ENTITY_TYPE)?;
            if versions.is_empty() {
                return Err(RepoError::NotFound(format!("{} {id}", E::ENTITY_TYPE)));
            }
            versions
                .iter()
                .map(|v| serde_json::from_slice::<E>(&v.body).map_err(RepoError::from))
                .collect()
        })
    }

    /// One historic version of an entity.
    pub fn get_version(&self, id: EntityId, version: EntityVersion) -> RepoResult<E> {
        self.db.read(|tx| {
            let body = tx.get_version(id, E::ENTITY_TYPE, version)?.ok_or_else(|| {
                RepoError::NotFound(format!("{} {id} version {version}", E::ENTITY_TYPE))
            })?;
            Ok(serde_json::from_slice::<E>(&body)?)
        })
    }

    // ── Mutation steps ───────────────────────────────────────────

    fn create_in_tx(&self, tx: &StoreTx<'_>, mut entity: E, updated_by: &str) -> RepoResult<E> {
        self.prepare(tx, &mut entity)?;
        let header = entity.header_mut();
        header.version = self.config.initial_version;
        header.change_description = None;
        header.deleted = false;
        header.updated_by = updated_by.to_string();
        header.updated_at = now_millis();

        self.store(tx, &mut entity, None)?;
        self.store_relationships(tx, &entity, false)?;
        Ok(self.decorate(entity))
    }

    /// Diffs `candidate` against `original` and writes it when anything
    /// changed. Returns the entity to hand back and whether it changed.
    fn update_in_tx(
        &self,
        tx: &StoreTx<'_>,
        original: E,
        mut candidate: E,
        updated_by: &str,
        operation: Operation,
    ) -> RepoResult<(E, bool)> {
        candidate.header_mut().id = original.id();
        if candidate.name() != original.name() {
            return Err(RepoError::Validation(format!(
                "name of {} {} cannot be changed",
                E::ENTITY_TYPE,
                original.name()
            )));
        }
        match (original.container(), candidate.container()) {
            (Some(current), None) => candidate.set_container(Some(current.clone())),
            (Some(current), Some(requested)) if current.id != requested.id => {
                return Err(RepoError::Validation(format!(
                    "container of {} {} cannot be changed",
                    E::ENTITY_TYPE,
                    original.name()
                )));
            }
            _ => {}
        }
        self.prepare(tx, &mut candidate)?;

        let mut recorder =
            EntityUpdater::new(&original, &mut candidate, operation).compare(&self.spec.fields)?;
        if original.header().deleted {
            recorder.record_change("deleted", Some(json!(true)), Some(json!(false)));
        }
        debug!(kind = E::ENTITY_TYPE, id = %original.id(), fields = ?recorder.field_names(), "diffed");

        let transition = recorder.finalize(original.version(), self.config.version_step);
        if !transition.is_changed() {
            return Ok((original, false));
        }

        let header = candidate.header_mut();
        header.version = transition.version;
        header.change_description = transition.change_description;
        header.deleted = false;
        header.updated_by = updated_by.to_string();
        header.updated_at = now_millis();

        self.store(tx, &mut candidate, Some(original.version()))?;
        self.store_relationships(tx, &candidate, true)?;
        Ok((self.decorate(candidate), true))
    }

    fn set_deleted(&self, tx: &StoreTx<'_>, mut entity: E, deleted: bool, updated_by: &str, now: i64) -> RepoResult<E> {
        let previous = entity.version();
        let mut recorder = ChangeRecorder::new();
        recorder.record_change("deleted", Some(json!(!deleted)), Some(json!(deleted)));
        let transition = recorder.finalize(previous, self.config.version_step);

        let header = entity.header_mut();
        header.deleted = deleted;
        header.version = transition.version;
        header.change_description = transition.change_description;
        header.updated_by = updated_by.to_string();
        header.updated_at = now;
        self.store(tx, &mut entity, Some(previous))?;
        Ok(self.decorate(entity))
    }

    /// Resolves references, enforces the containment rule, computes the
    /// fully qualified name and runs the kind's own preparation.
    fn prepare(&self, tx: &StoreTx<'_>, entity: &mut E) -> RepoResult<()> {
        if entity.name().trim().is_empty() {
            return Err(RepoError::Validation(format!("{} name must not be empty", E::ENTITY_TYPE)));
        }

        let container = self.resolve_container(tx, entity)?;
        let parent_fqn = container.as_ref().and_then(|c| c.fully_qualified_name.clone());
        entity.set_container(container);

        if let Some(owner) = entity.owner().cloned() {
            let resolved = self.resolver.resolve(tx, &owner)?;
            if !OWNER_TYPES.contains(&resolved.entity_type.as_str()) {
                return Err(RepoError::Validation(format!(
                    "owner must be one of {OWNER_TYPES:?}, got {}",
                    resolved.entity_type
                )));
            }
            entity.header_mut().owner = Some(resolved);
        }

        let name = entity.name().to_string();
        let header = entity.header_mut();
        header.fully_qualified_name = Some(fqn::build(parent_fqn.as_deref(), &name));
        header.tags.sort_by(|a, b| a.tag_fqn.cmp(&b.tag_fqn));
        header.tags.dedup_by(|a, b| a.tag_fqn == b.tag_fqn);

        self.spec.handler.prepare(entity).map_err(RepoError::Validation)?;
        self.spec.handler.validate(entity).map_err(RepoError::Validation)?;
        debug!(kind = E::ENTITY_TYPE, fqn = ?entity.fully_qualified_name(), "prepared");
        Ok(())
    }

    fn resolve_container(
        &self,
        tx: &StoreTx<'_>,
        entity: &E,
    ) -> RepoResult<Option<EntityReference>> {
        match (self.spec.containment, entity.container()) {
            (Containment::None, Some(_)) => Err(RepoError::Validation(format!(
                "{} does not have a container",
                E::ENTITY_TYPE
            ))),
            (Containment::Required(_), None) => Err(RepoError::Validation(format!(
                "{} requires a container",
                E::ENTITY_TYPE
            ))),
            (_, None) => Ok(None),
            (containment, Some(reference)) => {
                let resolved = self.resolver.resolve(tx, reference)?;
                if !containment.allows(&resolved.entity_type) {
                    return Err(RepoError::Validation(format!(
                        "{} cannot contain {}",
                        resolved.entity_type,
                        E::ENTITY_TYPE
                    )));
                }
                Ok(Some(resolved))
            }
        }
    }

    /// Fully qualified name the candidate would get, without mutating it.
    fn candidate_fqn(&self, tx: &StoreTx<'_>, entity: &E) -> RepoResult<String> {
        let container = self.resolve_container(tx, entity)?;
        let parent = container.as_ref().and_then(|c| c.fully_qualified_name.as_deref());
        Ok(fqn::build(parent, entity.name()))
    }

    /// Writes the body with relationship-derived fields stripped and
    /// appends it to the history. `previous` is the version the write is
    /// based on; `None` inserts a new row.
    fn store(&self, tx: &StoreTx<'_>, entity: &mut E, previous: Option<EntityVersion>) -> RepoResult<()> {
        let relations = entity.detach_relations();
        let body = serde_json::to_vec(&*entity);
        entity.reattach_relations(relations);
        let body = body?;

        let header = entity.header();
        let row = EntityRow {
            id: header.id,
            entity_type: E::ENTITY_TYPE.to_string(),
            fqn: header.fully_qualified_name.clone().unwrap_or_else(|| header.name.clone()),
            name: header.name.clone(),
            version: header.version,
            deleted: header.deleted,
            updated_at: header.updated_at,
            body,
        };
        match previous {
            None => tx.insert_entity(&row)?,
            Some(expected) => tx.update_entity(&row, expected)?,
        }
        tx.put_version(row.id, E::ENTITY_TYPE, row.version, &row.body)?;
        debug!(kind = E::ENTITY_TYPE, id = %row.id, version = %row.version, "persisted");
        Ok(())
    }

    /// Writes container, owner, tag and kind-declared edges.
    fn store_relationships(&self, tx: &StoreTx<'_>, entity: &E, is_update: bool) -> RepoResult<()> {
        let id = entity.id();
        let extra = self.spec.handler.relationships(entity);
        if is_update {
            tx.delete_edges_to(id, Relationship::Contains)?;
            tx.delete_edges_to(id, Relationship::Owns)?;
            tx.delete_tags(id)?;
            let relations: HashSet<Relationship> = extra.iter().map(|r| r.relation).collect();
            for relation in relations {
                tx.delete_edges_from(id, relation)?;
            }
        }

        if let Some(container) = entity.container() {
            tx.add_edge(container.id, &container.entity_type, id, E::ENTITY_TYPE, Relationship::Contains)?;
        }
        if let Some(owner) = entity.owner() {
            tx.add_edge(owner.id, &owner.entity_type, id, E::ENTITY_TYPE, Relationship::Owns)?;
        }
        for tag in &entity.header().tags {
            tx.apply_tag(id, tag)?;
        }
        for related in &extra {
            let target = self.resolver.resolve(tx, &related.target)?;
            tx.add_edge(id, E::ENTITY_TYPE, target.id, &target.entity_type, related.relation)?;
        }
        debug!(kind = E::ENTITY_TYPE, %id, extra = extra.len(), "relationships written");
        Ok(())
    }

    // ── Loading ──────────────────────────────────────────────────

    fn load(&self, tx: &StoreTx<'_>, row: &EntityRow) -> RepoResult<E> {
        let mut entity: E = serde_json::from_slice(&row.body)?;
        entity.set_container(tx.find_container(row.id)?);
        let header = entity.header_mut();
        header.owner = tx.find_owner(row.id)?;
        header.tags = tx.tags_of(row.id)?;
        let mut entity = self.decorate(entity);
        self.spec.handler.on_after_load(&mut entity);
        Ok(entity)
    }

    /// The stored row for `id`, if it holds an entity of this kind.
    fn find_row(&self, tx: &StoreTx<'_>, id: EntityId) -> RepoResult<Option<EntityRow>> {
        Ok(tx.get_entity(id)?.filter(|row| row.entity_type == E::ENTITY_TYPE))
    }

    fn load_live(&self, tx: &StoreTx<'_>, id: EntityId) -> RepoResult<E> {
        let row = self
            .find_row(tx, id)?
            .filter(|row| !row.deleted)
            .ok_or_else(|| RepoError::NotFound(format!("{} {id}", E::ENTITY_TYPE)))?;
        self.load(tx, &row)
    }

    /// Sets derived presentation fields.
    fn decorate(&self, mut entity: E) -> E {
        if let Some(base) = &self.config.href_base {
            let id = entity.id();
            entity.header_mut().href =
                Some(format!("{}/{}/{id}", base.trim_end_matches('/'), E::ENTITY_TYPE));
        }
        entity
    }

    // ── Hooks ────────────────────────────────────────────────────

    async fn finish_update(&self, entity: E, changed: bool) -> RepoResult<Mutation<E>> {
        let status = if changed {
            info!(kind = E::ENTITY_TYPE, id = %entity.id(), version = %entity.version(), "updated");
            MutationStatus::Updated
        } else {
            debug!(kind = E::ENTITY_TYPE, id = %entity.id(), "unchanged");
            MutationStatus::Unchanged
        };
        let hook = if !changed && self.config.skip_unchanged_update_hooks {
            HookReport::NotTriggered
        } else if self.spec.hooks.should_deploy_on_update(&entity) {
            self.deploy(&entity).await
        } else {
            HookReport::NotTriggered
        };
        Ok(Mutation {
            entity,
            status,
            hook,
            cascaded: Vec::new(),
        })
    }

    async fn after_create(&self, entity: &E) -> HookReport {
        if self.spec.hooks.should_deploy_on_create(entity) {
            self.deploy(entity).await
        } else {
            HookReport::NotTriggered
        }
    }

    async fn undeploy_children(&self, removed: Vec<CascadedEntity>, hard: bool) -> Vec<HookReport> {
        let mut reports = Vec::new();
        for child in removed {
            let applies = self
                .child_undeploy
                .get(child.entity_type.as_str())
                .is_some_and(|policy| policy.applies(hard));
            if applies {
                debug!(kind = %child.entity_type, name = %child.name, "undeploying contained entity");
                reports.push(self.hooks.dispatch(HookAction::Undeploy { name: child.name }).await);
            }
        }
        reports
    }

    async fn deploy(&self, entity: &E) -> HookReport {
        let body = match serde_json::to_value(entity) {
            Ok(body) => body,
            Err(e) => {
                return HookReport::Failed {
                    error: HookDispatchError::Serialization(e),
                    attempts: 0,
                };
            }
        };
        let request = DeployRequest {
            entity_type: E::ENTITY_TYPE.to_string(),
            id: entity.id(),
            name: entity.name().to_string(),
            fully_qualified_name: entity.fully_qualified_name().unwrap_or_default().to_string(),
            entity: body,
        };
        self.hooks.dispatch(HookAction::Deploy(request)).await
    }
}

fn check_expected<E: Entity>(original: &E, expected: Option<EntityVersion>) -> RepoResult<()> {
    match expected {
        Some(expected) if expected != original.version() => Err(RepoError::Conflict(format!(
            "{} {} is at version {}, expected {expected}",
            E::ENTITY_TYPE,
            original.id(),
            original.version()
        ))),
        _ => Ok(()),
    }
}

/// A contained entity a cascade removed or flagged.
struct CascadedEntity {
    entity_type: String,
    name: String,
}

/// Deletes or restores contained entities of any kind.
///
/// Works on the stored JSON so that containers can cascade into kinds the
/// calling repository is not typed for.
struct Cascade<'a> {
    updated_by: &'a str,
    now: i64,
    hard: bool,
    /// Target value of the deleted flag for soft cascades.
    deleted: bool,
    step: VersionStep,
}

impl Cascade<'_> {
    /// Applies the cascade to `id`, children first, and appends every
    /// entity it changed to `touched`.
    fn apply(&self, tx: &StoreTx<'_>, id: EntityId, touched: &mut Vec<CascadedEntity>) -> RepoResult<()> {
        for child in tx.find_children(id, Relationship::Contains)? {
            self.apply(tx, child.to_id, touched)?;
        }
        let Some(row) = tx.get_entity(id)? else {
            return Ok(());
        };
        if self.hard {
            remove_entity(tx, id)?;
            touched.push(CascadedEntity {
                entity_type: row.entity_type,
                name: row.name,
            });
            return Ok(());
        }
        if row.deleted == self.deleted {
            return Ok(());
        }

        let mut recorder = ChangeRecorder::new();
        recorder.record_change("deleted", Some(json!(!self.deleted)), Some(json!(self.deleted)));
        let transition = recorder.finalize(row.version, self.step);

        let mut body: Value = serde_json::from_slice(&row.body)?;
        if let Some(fields) = body.as_object_mut() {
            fields.insert("deleted".into(), json!(self.deleted));
            fields.insert("version".into(), json!(transition.version.value()));
            fields.insert(
                "changeDescription".into(),
                serde_json::to_value(&transition.change_description)?,
            );
            fields.insert("updatedBy".into(), json!(self.updated_by));
            fields.insert("updatedAt".into(), json!(self.now));
        }
        let updated = EntityRow {
            version: transition.version,
            deleted: self.deleted,
            updated_at: self.now,
            body: serde_json::to_vec(&body)?,
            ..row.clone()
        };
        tx.update_entity(&updated, row.version)?;
        tx.put_version(updated.id, &updated.entity_type, updated.version, &updated.body)?;
        debug!(%id, deleted = self.deleted, "cascaded");
        touched.push(CascadedEntity {
            entity_type: updated.entity_type,
            name: updated.name,
        });
        Ok(())
    }
}

fn remove_entity(tx: &StoreTx<'_>, id: EntityId) -> RepoResult<()> {
    tx.delete_edges_for(id)?;
    tx.delete_tags(id)?;
    tx.delete_versions(id)?;
    tx.delete_entity(id)?;
    Ok(())
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
