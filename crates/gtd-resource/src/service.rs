//! Generic CRUD orchestration over a persistence port.

use std::marker::PhantomData;

use gtd_core::{Entity, NodeId};
use gtd_graph::{Page, PageRequest, Repository};

use crate::error::Result;

/// Which path an upsert took.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Created,
    Replaced,
}

/// CRUD for one entity type. Holds no state besides the repository, so one
/// instance serves concurrent requests.
pub struct ResourceService<T, R> {
    repository: R,
    _entity: PhantomData<fn() -> T>,
}

impl<T: Entity, R: Repository<T>> ResourceService<T, R> {
    pub fn new(repository: R) -> Self {
        Self {
            repository,
            _entity: PhantomData,
        }
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    pub async fn find_all(&self, page: PageRequest) -> Result<Page<T>> {
        Ok(self.repository.find_all(page).await?)
    }

    /// A missing id never reaches the store.
    pub async fn find_by_id(&self, id: Option<NodeId>) -> Result<Option<T>> {
        match id {
            Some(id) => Ok(self.repository.find_by_id(id).await?),
            None => Ok(None),
        }
    }

    pub async fn find_by_id_with_depth(
        &self,
        id: Option<NodeId>,
        depth: usize,
    ) -> Result<Option<T>> {
        match id {
            Some(id) => Ok(self.repository.find_by_id_with_depth(id, depth).await?),
            None => Ok(None),
        }
    }

    /// Always creates a new root node.
    pub async fn save_new(&self, dto: T::Dto) -> Result<T> {
        let entity: T = dto.into();
        let entity = self.repository.link_references(entity).await?;
        let saved = self.repository.save(entity).await?;
        tracing::info!(entity = T::NAME, id = ?saved.id(), "Resource created");
        Ok(saved)
    }

    /// Full replace: `existing` contributes only its id.
    pub async fn update(&self, existing: &T, dto: T::Dto) -> Result<T> {
        let mut entity: T = dto.into();
        entity.set_id(existing.id());
        let entity = self.repository.link_references(entity).await?;
        let saved = self.repository.save(entity).await?;
        tracing::info!(entity = T::NAME, id = ?saved.id(), "Resource replaced");
        Ok(saved)
    }

    pub async fn save(&self, entity: T) -> Result<T> {
        Ok(self.repository.save(entity).await?)
    }

    /// Delete by id, returning the pre-delete snapshot.
    pub async fn delete(&self, id: Option<NodeId>) -> Result<Option<T>> {
        let existing = self.find_by_id(id).await?;
        if let Some(entity) = &existing {
            self.repository.delete(entity).await?;
        }
        Ok(existing)
    }

    /// Replace the entity at `id` if it exists, otherwise create a new one.
    pub async fn upsert(&self, id: Option<NodeId>, dto: T::Dto) -> Result<(T, UpsertOutcome)> {
        match self.find_by_id(id).await? {
            Some(existing) => Ok((self.update(&existing, dto).await?, UpsertOutcome::Replaced)),
            None => Ok((self.save_new(dto).await?, UpsertOutcome::Created)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gtd_core::dto::{CountryDto, RegionDto};
    use gtd_core::{Country, Region};
    use gtd_graph::{GraphRepository, MemoryStore};

    fn regions() -> ResourceService<Region, GraphRepository<Region, MemoryStore>> {
        ResourceService::new(GraphRepository::new(MemoryStore::new()))
    }

    fn region(name: &str) -> RegionDto {
        RegionDto {
            name: Some(name.to_string()),
        }
    }

    #[tokio::test]
    async fn missing_id_yields_empty() {
        let service = regions();
        assert!(service.find_by_id(None).await.unwrap().is_none());
        assert!(service.find_by_id_with_depth(None, 5).await.unwrap().is_none());
        assert!(service.delete(None).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn save_new_always_creates() {
        let service = regions();
        let a = service.save_new(region("Europe")).await.unwrap();
        let b = service.save_new(region("Europe")).await.unwrap();
        assert_ne!(a.id, b.id);
        assert_eq!(service.repository().count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn update_reuses_id_and_replaces_fields() {
        let store = MemoryStore::new();
        let service: ResourceService<Country, _> =
            ResourceService::new(GraphRepository::new(store));
        let existing = service
            .save_new(CountryDto {
                name: Some("Poland".to_string()),
                region: Some(region("Europe")),
            })
            .await
            .unwrap();

        let updated = service
            .update(
                &existing,
                CountryDto {
                    name: Some("Polska".to_string()),
                    region: None,
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.id, existing.id);
        let found = service.find_by_id(existing.id).await.unwrap().unwrap();
        assert_eq!(found.name.as_deref(), Some("Polska"));
        assert!(found.region.is_none());
    }

    #[tokio::test]
    async fn delete_returns_snapshot() {
        let service = regions();
        let saved = service.save_new(region("Asia")).await.unwrap();

        let deleted = service.delete(saved.id).await.unwrap().unwrap();
        assert_eq!(deleted, saved);
        assert!(service.find_by_id(saved.id).await.unwrap().is_none());
        assert!(service.delete(saved.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn upsert_reports_path_taken() {
        let service = regions();
        let (created, outcome) = service.upsert(Some(NodeId(99)), region("Africa")).await.unwrap();
        assert_eq!(outcome, UpsertOutcome::Created);

        let (replaced, outcome) = service.upsert(created.id, region("Oceania")).await.unwrap();
        assert_eq!(outcome, UpsertOutcome::Replaced);
        assert_eq!(replaced.id, created.id);
        assert_eq!(replaced.name.as_deref(), Some("Oceania"));
    }
}
