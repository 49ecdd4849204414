//! Declarative field constraints and the validation gate.
//!
//! Each DTO lists its constraints as plain predicate/message pairs in a
//! [`Validate`] impl. Evaluation never stops at the first failure: every
//! violated constraint is collected, nested DTOs included, with a dotted path
//! naming the field. Country existence needs the store, so the collector only
//! records which country names were referenced and [`ValidationGate`] resolves
//! them afterwards.

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use gtd_core::dto::{
    CityDto, CountryDto, EventDto, GroupDto, ProvinceDto, RegionDto, RoleDto, TargetDto, UserDto,
};
use gtd_core::{Country, Entity};
use gtd_graph::{GraphError, GraphRepository, NodeStore, Repository};
use serde::Serialize;

use crate::error::{ResourceError, Result};

pub const COUNTRY_MISSING: &str = "A country with the provided name does not exist.";

/// One violated constraint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    /// Dotted path to the offending field, e.g. `eventsCaused[0].target.name`.
    pub field: String,
    pub message: String,
}

impl Violation {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

/// Collector passed through the constraint lists.
#[derive(Debug, Default)]
pub struct Violations {
    prefix: String,
    items: Vec<Violation>,
    countries: Vec<(String, String)>,
}

impl Violations {
    pub fn new() -> Self {
        Self::default()
    }

    fn path(&self, field: &str) -> String {
        if self.prefix.is_empty() {
            field.to_string()
        } else if field.is_empty() {
            self.prefix.clone()
        } else {
            format!("{}.{field}", self.prefix)
        }
    }

    pub fn push(&mut self, field: &str, message: &str) {
        let path = self.path(field);
        self.items.push(Violation::new(path, message));
    }

    pub fn check(&mut self, ok: bool, field: &str, message: &str) {
        if !ok {
            self.push(field, message);
        }
    }

    pub fn not_blank(&mut self, field: &str, value: &Option<String>, message: &str) {
        let ok = value.as_deref().is_some_and(|s| !s.trim().is_empty());
        self.check(ok, field, message);
    }

    pub fn not_null<V>(&mut self, field: &str, value: &Option<V>, message: &str) {
        self.check(value.is_some(), field, message);
    }

    /// Inclusive range check. A null value is left to `not_null`.
    pub fn in_range(
        &mut self,
        field: &str,
        value: Option<f64>,
        min: f64,
        max: f64,
        low: &str,
        high: &str,
    ) {
        if let Some(v) = value {
            self.check(v >= min, field, low);
            self.check(v <= max, field, high);
        }
    }

    /// Evaluate a nested DTO with its violations reported under `field`.
    pub fn nested<V: Validate + ?Sized>(&mut self, field: &str, value: &V) {
        let saved = std::mem::take(&mut self.prefix);
        self.prefix = if saved.is_empty() {
            field.to_string()
        } else {
            format!("{saved}.{field}")
        };
        value.constraints(self);
        self.prefix = saved;
    }

    /// Remember a country reference whose existence must be checked.
    pub fn country_reference(&mut self, field: &str, country: &CountryDto) {
        if let Some(name) = country.name.as_deref().filter(|n| !n.trim().is_empty()) {
            let path = self.path(field);
            self.countries.push((path, name.to_string()));
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn into_vec(self) -> Vec<Violation> {
        self.items
    }
}

/// Constraint list of one input shape.
pub trait Validate {
    fn constraints(&self, v: &mut Violations);

    /// Synchronous constraints only.
    fn violations(&self) -> Vec<Violation> {
        let mut v = Violations::new();
        self.constraints(&mut v);
        v.into_vec()
    }
}

// ── Constraint lists ─────────────────────────────────────────────

impl Validate for RegionDto {
    fn constraints(&self, v: &mut Violations) {
        v.not_blank("name", &self.name, "Region name cannot be empty.");
    }
}

impl Validate for CountryDto {
    fn constraints(&self, v: &mut Violations) {
        v.not_blank("name", &self.name, "Country name cannot be empty.");
        if let Some(region) = &self.region {
            v.nested("region", region);
        }
    }
}

/// A required country reference: missing counts as a blank name, present
/// ones are validated and checked for existence.
fn required_country(v: &mut Violations, field: &str, country: &Option<CountryDto>) {
    match country {
        Some(country) => {
            v.nested(field, country);
            v.country_reference(field, country);
        }
        None => v.push(field, "Country name cannot be empty."),
    }
}

impl Validate for ProvinceDto {
    fn constraints(&self, v: &mut Violations) {
        v.not_blank("name", &self.name, "Province name cannot be empty.");
        required_country(v, "country", &self.country);
    }
}

impl Validate for CityDto {
    fn constraints(&self, v: &mut Violations) {
        v.not_blank("name", &self.name, "City name cannot be empty.");
        v.not_null("latitude", &self.latitude, "City latitude cannot be null.");
        v.in_range(
            "latitude",
            self.latitude,
            -90.0,
            90.0,
            "City latitude must be greater or equal to -90.",
            "City latitude must be less or equal to 90.",
        );
        v.not_null("longitude", &self.longitude, "City longitude cannot be null.");
        v.in_range(
            "longitude",
            self.longitude,
            -180.0,
            180.0,
            "City longitude must be greater or equal to -180.",
            "City longitude must be less or equal to 180.",
        );
        if let Some(province) = &self.province {
            v.nested("province", province);
        }
    }
}

impl Validate for TargetDto {
    fn constraints(&self, v: &mut Violations) {
        v.not_blank("name", &self.name, "Target name cannot be empty.");
        required_country(v, "countryOfOrigin", &self.country_of_origin);
    }
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

impl Validate for EventDto {
    fn constraints(&self, v: &mut Violations) {
        v.not_blank("summary", &self.summary, "Event summary cannot be empty.");
        v.not_blank("motive", &self.motive, "Event motive cannot be empty.");
        v.not_null("date", &self.date, "Event date cannot be null.");
        if let Some(date) = self.date {
            v.check(date <= today(), "date", "Event date cannot be in the future.");
        }
        v.not_null(
            "isPartOfMultipleIncidents",
            &self.is_part_of_multiple_incidents,
            "Event must have information on whether it has been part of many incidents.",
        );
        v.not_null(
            "isSuccessful",
            &self.is_successful,
            "Event must have information about whether it was successful.",
        );
        v.not_null(
            "isSuicidal",
            &self.is_suicidal,
            "Event must have information about whether it was a suicidal attack.",
        );

        match &self.target {
            Some(target) => v.nested("target", target),
            None => v.push("target", "Target name cannot be empty."),
        }
        if let Some(city) = &self.city {
            v.nested("city", city);
        }

        let target_country = self
            .target
            .as_ref()
            .and_then(|t| t.country_of_origin.as_ref())
            .and_then(|c| c.name.as_deref());
        let city_country = self
            .city
            .as_ref()
            .and_then(|c| c.province.as_ref())
            .and_then(|p| p.country.as_ref())
            .and_then(|c| c.name.as_deref());
        if let (Some(a), Some(b)) = (target_country, city_country) {
            v.check(
                a == b,
                "target",
                "Province and target should be located in the same country.",
            );
        }
    }
}

impl Validate for GroupDto {
    fn constraints(&self, v: &mut Violations) {
        v.not_blank("name", &self.name, "Group name cannot be empty.");
        v.check(
            !self.events_caused.is_empty(),
            "eventsCaused",
            "List of Events caused by the Group cannot be empty.",
        );
        for (i, event) in self.events_caused.iter().enumerate() {
            v.nested(&format!("eventsCaused[{i}]"), event);
        }
    }
}

impl Validate for RoleDto {
    fn constraints(&self, v: &mut Violations) {
        v.not_blank("name", &self.name, "Role name cannot be empty.");
    }
}

impl Validate for UserDto {
    fn constraints(&self, v: &mut Violations) {
        v.not_blank("userName", &self.user_name, "User name cannot be empty.");
        v.not_blank("password", &self.password, "Password cannot be empty.");
        v.check(
            self.password == self.matching_password,
            "matchingPassword",
            "Passwords don't match.",
        );
        v.not_blank("email", &self.email, "Email cannot be empty.");
        if let Some(email) = self.email.as_deref().filter(|e| !e.trim().is_empty()) {
            v.check(is_email(email), "email", "Email must be a valid email address.");
        }
    }
}

/// `local@domain.tld` with no whitespace and exactly one `@`.
fn is_email(value: &str) -> bool {
    if value.chars().any(char::is_whitespace) {
        return false;
    }
    let mut parts = value.split('@');
    let (Some(local), Some(domain), None) = (parts.next(), parts.next(), parts.next()) else {
        return false;
    };
    !local.is_empty()
        && domain
            .split_once('.')
            .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty() && !tld.ends_with('.'))
}

// ── Gate ─────────────────────────────────────────────────────────

/// Lookup used by the country existence constraint.
#[async_trait]
pub trait CountryDirectory: Send + Sync {
    async fn country_exists(&self, name: &str) -> std::result::Result<bool, GraphError>;
}

#[async_trait]
impl<S: NodeStore> CountryDirectory for GraphRepository<Country, S> {
    async fn country_exists(&self, name: &str) -> std::result::Result<bool, GraphError> {
        Ok(self.find_by_property("name", name).await?.is_some())
    }
}

/// Runs the full constraint set, including store-backed ones, on an entity
/// or DTO. Nothing is written here.
pub struct ValidationGate<C> {
    countries: C,
}

impl<C: CountryDirectory> ValidationGate<C> {
    pub fn new(countries: C) -> Self {
        Self { countries }
    }

    /// Every violation of `dto`, synchronous constraints first.
    pub async fn violations<D: Validate + Sync>(&self, dto: &D) -> Result<Vec<Violation>> {
        let mut collector = Violations::new();
        dto.constraints(&mut collector);
        let Violations {
            mut items,
            countries,
            ..
        } = collector;

        for (field, name) in countries {
            if !self.countries.country_exists(&name).await? {
                items.push(Violation::new(field, COUNTRY_MISSING));
            }
        }
        Ok(items)
    }

    /// Reject `dto` with the complete violation list if any constraint fails.
    pub async fn check<D: Validate + Sync>(&self, dto: &D) -> Result<()> {
        let violations = self.violations(dto).await?;
        if violations.is_empty() {
            Ok(())
        } else {
            tracing::debug!(count = violations.len(), "Validation rejected input");
            Err(ResourceError::ValidationFailed(violations))
        }
    }

    /// Project a (patched) entity onto its DTO and check that.
    pub async fn validate<T>(&self, entity: &T) -> Result<()>
    where
        T: Entity,
        T::Dto: Validate,
    {
        let dto = T::Dto::from(entity);
        self.check(&dto).await
    }
}
