//! First-boot seeding run.
//!
//! Registers the configured account, then walks the rows in order: places go
//! through the [`UpsertCache`], each row's Target and Event are saved as they
//! come, and Events are attributed to their Group. Named groups collect their
//! Events in memory and are written once at the end; the "unknown" group is
//! written per row as its own Group.

use std::collections::HashMap;

use gtd_core::{City, Country, Event, Group, Province, Region, Target, User};
use gtd_graph::{GraphRepository, NodeStore, Repository};
use gtd_resource::catalog::Users;
use gtd_resource::{ResourceError, UserService};
use serde::Serialize;

use crate::cache::UpsertCache;
use crate::config::SeedOptions;
use crate::error::Result;
use crate::rows::{parse_rows, SeedRow};

/// Group name that marks an unattributed incident.
pub const UNKNOWN_GROUP: &str = "unknown";

const PROGRESS_EVERY: usize = 1000;

/// Summary of one seeding run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SeedReport {
    /// Why nothing was loaded, when nothing was.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skipped: Option<String>,
    pub user_registered: bool,
    pub rows: usize,
    pub regions: usize,
    pub countries: usize,
    pub provinces: usize,
    pub cities: usize,
    pub targets: usize,
    pub events: usize,
    pub groups: usize,
}

impl SeedReport {
    fn skipped(reason: impl Into<String>) -> Self {
        Self {
            skipped: Some(reason.into()),
            ..Self::default()
        }
    }

    pub fn is_skipped(&self) -> bool {
        self.skipped.is_some()
    }
}

/// Bulk loader over one store.
pub struct Seeder<S> {
    regions: GraphRepository<Region, S>,
    countries: GraphRepository<Country, S>,
    provinces: GraphRepository<Province, S>,
    cities: GraphRepository<City, S>,
    targets: GraphRepository<Target, S>,
    events: GraphRepository<Event, S>,
    groups: GraphRepository<Group, S>,
    users: Users<S>,
}

impl<S: NodeStore + Clone> Seeder<S> {
    pub fn new(store: S) -> Self {
        Self {
            regions: GraphRepository::new(store.clone()),
            countries: GraphRepository::new(store.clone()),
            provinces: GraphRepository::new(store.clone()),
            cities: GraphRepository::new(store.clone()),
            targets: GraphRepository::new(store.clone()),
            events: GraphRepository::new(store.clone()),
            groups: GraphRepository::new(store.clone()),
            users: UserService::new(
                GraphRepository::new(store.clone()),
                GraphRepository::new(store),
            ),
        }
    }

    /// Seed the store unless disabled or already populated.
    ///
    /// A missing or malformed seed file is logged and skipped; store
    /// failures abort the run.
    pub async fn run(&self, options: &SeedOptions) -> Result<SeedReport> {
        if !options.enabled {
            tracing::info!("Seeding disabled");
            return Ok(SeedReport::skipped("disabled"));
        }

        let existing = self.targets.count().await?;
        if existing > 0 && !options.force {
            tracing::info!(targets = existing, "Store already populated, skipping seed");
            return Ok(SeedReport::skipped("store already populated"));
        }

        let rows = match read_rows(options).await {
            Ok(rows) => rows,
            Err(e) => {
                tracing::warn!(
                    path = %options.data_file.display(),
                    error = %e,
                    "Seed file unavailable, skipping seed"
                );
                return Ok(SeedReport::skipped(format!("seed file unavailable: {e}")));
            }
        };

        let user_registered = self.register_account(options).await?.is_some();
        let report = self.load(&rows).await?;

        Ok(SeedReport {
            user_registered,
            ..report
        })
    }

    /// Process `rows` in order and persist the accumulated groups.
    pub async fn load(&self, rows: &[SeedRow]) -> Result<SeedReport> {
        tracing::info!(rows = rows.len(), "Seeding started");
        let mut run = SeedRun::default();

        for (i, row) in rows.iter().enumerate() {
            self.load_row(&mut run, row).await?;
            if (i + 1) % PROGRESS_EVERY == 0 {
                tracing::info!(processed = i + 1, total = rows.len(), "Seeding progress");
            }
        }

        for group in run.named_groups.drain(..) {
            self.groups.save(group).await?;
            run.groups += 1;
        }

        let report = SeedReport {
            skipped: None,
            user_registered: false,
            rows: rows.len(),
            regions: run.cache.regions(),
            countries: run.cache.countries(),
            provinces: run.cache.provinces(),
            cities: run.cache.cities(),
            targets: run.targets,
            events: run.events,
            groups: run.groups,
        };
        tracing::info!(
            rows = report.rows,
            events = report.events,
            groups = report.groups,
            "Seeding finished"
        );
        Ok(report)
    }

    async fn register_account(&self, options: &SeedOptions) -> Result<Option<User>> {
        match self.users.register(options.account()).await {
            Ok(user) => Ok(Some(user)),
            Err(ResourceError::ValidationFailed(violations)) => {
                let reasons: Vec<_> = violations.iter().map(|v| v.message.as_str()).collect();
                tracing::warn!(
                    user_name = %options.user_name,
                    reasons = ?reasons,
                    "Seed account not registered"
                );
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn load_row(&self, run: &mut SeedRun, row: &SeedRow) -> Result<()> {
        let region = run
            .cache
            .resolve(
                &self.regions,
                Region {
                    id: None,
                    name: Some(row.region_txt.text()),
                },
            )
            .await?;
        let country = run
            .cache
            .resolve(
                &self.countries,
                Country {
                    id: None,
                    name: Some(row.country_txt.text()),
                    region: Some(region),
                },
            )
            .await?;
        let province = run
            .cache
            .resolve(
                &self.provinces,
                Province {
                    id: None,
                    name: Some(row.provstate.text()),
                    country: Some(country.clone()),
                },
            )
            .await?;
        let city = run
            .cache
            .resolve(
                &self.cities,
                City {
                    id: None,
                    name: Some(row.city.text()),
                    latitude: Some(row.latitude()),
                    longitude: Some(row.longitude()),
                    province: Some(province),
                },
            )
            .await?;

        let target = self
            .targets
            .save(Target {
                id: None,
                name: Some(row.target1.text()),
                country_of_origin: Some(country),
            })
            .await?;
        run.targets += 1;

        let event = self
            .events
            .save(Event {
                id: None,
                summary: Some(row.summary.text()),
                motive: Some(row.motive.text()),
                date: Some(row.event_date()),
                is_part_of_multiple_incidents: Some(row.multiple.flag()),
                is_successful: Some(row.success.flag()),
                is_suicidal: Some(row.suicide.flag()),
                target: Some(target),
                city: Some(city),
            })
            .await?;
        run.events += 1;

        let group_name = row.gname.text();
        if group_name.eq_ignore_ascii_case(UNKNOWN_GROUP) {
            let mut group = Group::named(group_name);
            group.add_event(event);
            self.groups.save(group).await?;
            run.groups += 1;
        } else {
            run.attribute(group_name, event);
        }
        Ok(())
    }
}

/// Mutable state of one pass over the rows.
#[derive(Default)]
struct SeedRun {
    cache: UpsertCache,
    named_groups: Vec<Group>,
    group_index: HashMap<String, usize>,
    targets: usize,
    events: usize,
    groups: usize,
}

impl SeedRun {
    /// Attach `event` to the group called `name`, in first-seen order.
    fn attribute(&mut self, name: String, event: Event) {
        let index = match self.group_index.get(&name) {
            Some(&i) => i,
            None => {
                self.named_groups.push(Group::named(name.clone()));
                self.group_index.insert(name, self.named_groups.len() - 1);
                self.named_groups.len() - 1
            }
        };
        self.named_groups[index].add_event(event);
    }
}

async fn read_rows(options: &SeedOptions) -> Result<Vec<SeedRow>> {
    let json = tokio::fs::read_to_string(&options.data_file).await?;
    parse_rows(&json)
}
