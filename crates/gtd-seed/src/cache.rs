//! Hierarchical dedup for the reference entities of a bulk load.
//!
//! Every row names its Region, Country, Province and City. The cache
//! persists the first occurrence of each and hands back that saved instance
//! for every later row with the same name and parent chain, so one seed run
//! writes each place once. The cache lives for a single run.

use std::collections::HashMap;

use gtd_core::{City, Country, Entity, Province, Region};
use gtd_graph::{GraphError, Repository};

/// A reference entity the cache can dedup.
pub trait CachedEntity: Entity {
    /// Natural key: name plus the keys of the parent chain.
    fn cache_key(&self) -> String;

    fn slot(cache: &mut UpsertCache) -> &mut HashMap<String, Self>;
}

#[derive(Debug, Default)]
pub struct UpsertCache {
    regions: HashMap<String, Region>,
    countries: HashMap<String, Country>,
    provinces: HashMap<String, Province>,
    cities: HashMap<String, City>,
}

impl UpsertCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The canonical saved instance equal to `candidate`, saving it first if
    /// nothing equal has been seen in this run.
    pub async fn resolve<T, R>(&mut self, repo: &R, candidate: T) -> Result<T, GraphError>
    where
        T: CachedEntity,
        R: Repository<T>,
    {
        let key = candidate.cache_key();
        if let Some(existing) = T::slot(self).get(&key) {
            return Ok(existing.clone());
        }

        let saved = repo.save(candidate).await?;
        tracing::debug!(entity = T::NAME, key = %key, id = ?saved.id(), "Cached new reference");
        T::slot(self).insert(key, saved.clone());
        Ok(saved)
    }

    pub fn regions(&self) -> usize {
        self.regions.len()
    }

    pub fn countries(&self) -> usize {
        self.countries.len()
    }

    pub fn provinces(&self) -> usize {
        self.provinces.len()
    }

    pub fn cities(&self) -> usize {
        self.cities.len()
    }
}

fn name(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or_default()
}

fn parent_key<T: CachedEntity>(parent: &Option<T>) -> String {
    parent.as_ref().map(T::cache_key).unwrap_or_default()
}

impl CachedEntity for Region {
    fn cache_key(&self) -> String {
        name(&self.name).to_lowercase()
    }

    fn slot(cache: &mut UpsertCache) -> &mut HashMap<String, Self> {
        &mut cache.regions
    }
}

impl CachedEntity for Country {
    fn cache_key(&self) -> String {
        format!("{}\u{1f}{}", name(&self.name), parent_key(&self.region))
    }

    fn slot(cache: &mut UpsertCache) -> &mut HashMap<String, Self> {
        &mut cache.countries
    }
}

impl CachedEntity for Province {
    fn cache_key(&self) -> String {
        format!("{}\u{1f}{}", name(&self.name), parent_key(&self.country))
    }

    fn slot(cache: &mut UpsertCache) -> &mut HashMap<String, Self> {
        &mut cache.provinces
    }
}

/// Cities are keyed by name and province only; coordinates of the first
/// occurrence win.
impl CachedEntity for City {
    fn cache_key(&self) -> String {
        format!("{}\u{1f}{}", name(&self.name), parent_key(&self.province))
    }

    fn slot(cache: &mut UpsertCache) -> &mut HashMap<String, Self> {
        &mut cache.cities
    }
}
