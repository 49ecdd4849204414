//! Registry of every resource over one shared store.

use gtd_core::config::{AppConfig, ResourceSettings};
use gtd_core::{City, Country, Entity, Event, Group, Province, Region, Role, Target, User};
use gtd_graph::{GraphClient, GraphError, GraphRepository, MemoryStore, NodeStore, PageRequest};

use crate::handler::ResourceHandler;
use crate::service::ResourceService;
use crate::user::UserService;
use crate::validation::{Validate, ValidationGate};

/// Handler of one entity type over store `S`.
pub type Handler<T, S> = ResourceHandler<T, GraphRepository<T, S>, GraphRepository<Country, S>>;

pub type Users<S> = UserService<GraphRepository<User, S>, GraphRepository<Role, S>>;

pub struct Catalog<S> {
    pub regions: Handler<Region, S>,
    pub countries: Handler<Country, S>,
    pub provinces: Handler<Province, S>,
    pub cities: Handler<City, S>,
    pub targets: Handler<Target, S>,
    pub events: Handler<Event, S>,
    pub groups: Handler<Group, S>,
    pub users: Users<S>,
    default_page_size: u64,
    store: S,
}

impl<S: NodeStore + Clone> Catalog<S> {
    pub fn new(store: S, settings: &ResourceSettings) -> Self {
        let depth = settings.patch_fetch_depth;
        Self {
            regions: handler(&store, depth),
            countries: handler(&store, depth),
            provinces: handler(&store, depth),
            cities: handler(&store, depth),
            targets: handler(&store, depth),
            events: handler(&store, depth),
            groups: handler(&store, depth),
            users: UserService::new(
                GraphRepository::new(store.clone()),
                GraphRepository::new(store.clone()),
            ),
            default_page_size: settings.default_page_size,
            store,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Page request with the configured size when the caller gives none.
    pub fn page(&self, page: Option<u64>, size: Option<u64>) -> PageRequest {
        PageRequest::new(page.unwrap_or(0), size.unwrap_or(self.default_page_size))
    }
}

impl Catalog<MemoryStore> {
    pub fn in_memory(settings: &ResourceSettings) -> Self {
        Self::new(MemoryStore::new(), settings)
    }
}

impl Catalog<GraphClient> {
    /// Connect to Neo4j and make sure the id indexes exist.
    pub async fn connect(config: &AppConfig) -> Result<Self, GraphError> {
        let client = GraphClient::open(&config.neo4j).await?;
        Ok(Self::new(client, &config.resource))
    }
}

fn handler<T, S>(store: &S, depth: usize) -> Handler<T, S>
where
    T: Entity,
    T::Dto: Validate,
    S: NodeStore + Clone,
{
    ResourceHandler::new(
        ResourceService::new(GraphRepository::new(store.clone())),
        ValidationGate::new(GraphRepository::new(store.clone())),
    )
    .with_patch_depth(depth)
}

#[cfg(test)]
mod tests {
    use super::*;
    use gtd_core::dto::RegionDto;
    use gtd_graph::Repository;

    #[tokio::test]
    async fn handlers_share_one_store() {
        let catalog = Catalog::in_memory(&ResourceSettings::default());
        catalog
            .regions
            .create(RegionDto {
                name: Some("Europe".to_string()),
            })
            .await
            .unwrap();

        let regions: GraphRepository<Region, _> = GraphRepository::new(catalog.store().clone());
        assert_eq!(regions.count().await.unwrap(), 1);
    }

    #[test]
    fn page_falls_back_to_configured_size() {
        let settings = ResourceSettings {
            patch_fetch_depth: 5,
            default_page_size: 50,
        };
        let catalog = Catalog::in_memory(&settings);
        assert_eq!(catalog.page(None, None), PageRequest::new(0, 50));
        assert_eq!(catalog.page(Some(2), Some(10)), PageRequest::new(2, 10));
    }
}
