//! Transport contract: what an HTTP adapter calls for each verb.
//!
//! Every operation returns the payload or a typed [`ResourceError`]; mapping
//! those to status codes is the adapter's job.

use gtd_core::{Entity, NodeId};
use gtd_graph::{check_shared_edits, node_ids, Page, PageRequest, Repository};
use serde_json::Value;

use crate::error::{ResourceError, Result};
use crate::patch::PatchEngine;
use crate::service::{ResourceService, UpsertOutcome};
use crate::validation::{CountryDirectory, Validate, ValidationGate};

/// Relationship hops fetched before a patch is applied.
pub const DEFAULT_PATCH_DEPTH: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Options,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
            Method::Options => "OPTIONS",
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resource endpoints for one entity type.
pub struct ResourceHandler<T, R, C> {
    service: ResourceService<T, R>,
    gate: ValidationGate<C>,
    patch_depth: usize,
}

impl<T, R, C> ResourceHandler<T, R, C>
where
    T: Entity,
    T::Dto: Validate,
    R: Repository<T>,
    C: CountryDirectory,
{
    pub fn new(service: ResourceService<T, R>, gate: ValidationGate<C>) -> Self {
        Self {
            service,
            gate,
            patch_depth: DEFAULT_PATCH_DEPTH,
        }
    }

    pub fn with_patch_depth(mut self, depth: usize) -> Self {
        self.patch_depth = depth;
        self
    }

    pub fn service(&self) -> &ResourceService<T, R> {
        &self.service
    }

    /// Methods allowed on the collection URI.
    pub fn collection_methods() -> &'static [Method] {
        &[Method::Get, Method::Post, Method::Options]
    }

    /// Methods allowed on an item URI.
    pub fn item_methods() -> &'static [Method] {
        &[
            Method::Get,
            Method::Put,
            Method::Patch,
            Method::Delete,
            Method::Options,
        ]
    }

    pub async fn find(&self, page: PageRequest) -> Result<Page<T>> {
        self.service.find_all(page).await
    }

    pub async fn find_one(&self, id: NodeId) -> Result<T> {
        self.service
            .find_by_id(Some(id))
            .await?
            .ok_or_else(|| not_found::<T>(id))
    }

    pub async fn create(&self, dto: T::Dto) -> Result<T> {
        self.gate.check(&dto).await?;
        self.service.save_new(dto).await
    }

    /// PUT: replace the entity at `id`, or create one when nothing is there.
    pub async fn replace(&self, id: NodeId, dto: T::Dto) -> Result<(T, UpsertOutcome)> {
        self.gate.check(&dto).await?;
        self.service.upsert(Some(id), dto).await
    }

    pub async fn apply_sequence_patch(&self, id: NodeId, patch: &Value) -> Result<T> {
        let current = self.fetch_for_patch(id).await?;
        let patched = PatchEngine::apply_sequence_patch(patch, &current)?;
        self.validate_and_save(id, &current, patched).await
    }

    pub async fn apply_merge_patch(&self, id: NodeId, patch: &Value) -> Result<T> {
        let current = self.fetch_for_patch(id).await?;
        let patched = PatchEngine::apply_merge_patch(patch, &current)?;
        self.validate_and_save(id, &current, patched).await
    }

    /// Delete the entity at `id`, returning what was removed.
    pub async fn delete(&self, id: NodeId) -> Result<T> {
        self.service
            .delete(Some(id))
            .await?
            .ok_or_else(|| not_found::<T>(id))
    }

    async fn fetch_for_patch(&self, id: NodeId) -> Result<T> {
        self.service
            .find_by_id_with_depth(Some(id), self.patch_depth)
            .await?
            .ok_or_else(|| not_found::<T>(id))
    }

    /// Nothing is written unless the whole patched entity is valid.
    async fn validate_and_save(&self, id: NodeId, current: &T, patched: T) -> Result<T> {
        check_ids(id, current, &patched)?;
        self.gate.validate(&patched).await?;
        check_shared_edits(current, &patched)
            .map_err(|e| ResourceError::PatchMalformed(e.to_string()))?;
        let linked = self.service.repository().link_references(patched).await?;
        self.service.save(linked).await
    }
}

/// A patch may edit the nodes it was given and add new ones, but it cannot
/// re-point the root or any nested node at another stored id.
fn check_ids<T: Entity>(id: NodeId, current: &T, patched: &T) -> Result<()> {
    if patched.id() != Some(id) {
        return Err(ResourceError::PatchMalformed(format!(
            "Patch cannot change the id of {} {id}.",
            T::NAME
        )));
    }

    let known = node_ids(current)?;
    if let Some(foreign) = node_ids(patched)?.difference(&known).next() {
        return Err(ResourceError::PatchMalformed(format!(
            "Patch refers to node {foreign}, which is not part of {} {id}.",
            T::NAME
        )));
    }
    Ok(())
}

fn not_found<T: Entity>(id: NodeId) -> ResourceError {
    ResourceError::NotFound {
        entity: T::NAME,
        id: id.0,
    }
}
