//! Core entity types for the catalog graph.
//!
//! Entities are plain owned trees: a parent holds its referenced children by
//! value, never the other way round, so the in-memory form is acyclic and
//! maps one-to-one onto JSON for patching. Every field is optional because a
//! patched entity may legitimately be missing data until the validation gate
//! has looked at it.

use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::dto::{
    CityDto, CountryDto, EventDto, GroupDto, ProvinceDto, RegionDto, RoleDto, TargetDto, UserDto,
};
use crate::schema::{self, EntitySchema};

// ── Identity ──────────────────────────────────────────────────────

/// Integer handle of a persisted node, assigned by the store on first save.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord,
)]
#[serde(transparent)]
pub struct NodeId(pub i64);

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A persisted entity type with its input representation bound at compile time.
pub trait Entity:
    Serialize + DeserializeOwned + Clone + std::fmt::Debug + Send + Sync + 'static
{
    /// Input/output representation used for creation and validation.
    type Dto: for<'a> From<&'a Self>
        + Into<Self>
        + Serialize
        + DeserializeOwned
        + Clone
        + std::fmt::Debug
        + Send
        + Sync;

    /// Name used in client-facing messages.
    const NAME: &'static str;

    fn schema() -> &'static EntitySchema;

    fn id(&self) -> Option<NodeId>;

    fn set_id(&mut self, id: Option<NodeId>);
}

// ── Geography ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct Region {
    pub id: Option<NodeId>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct Country {
    pub id: Option<NodeId>,
    pub name: Option<String>,
    pub region: Option<Region>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct Province {
    pub id: Option<NodeId>,
    pub name: Option<String>,
    pub country: Option<Country>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct City {
    pub id: Option<NodeId>,
    pub name: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub province: Option<Province>,
}

// ── Incidents ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct Target {
    pub id: Option<NodeId>,
    pub name: Option<String>,
    pub country_of_origin: Option<Country>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct Event {
    pub id: Option<NodeId>,
    pub summary: Option<String>,
    pub motive: Option<String>,
    pub date: Option<NaiveDate>,
    pub is_part_of_multiple_incidents: Option<bool>,
    pub is_successful: Option<bool>,
    pub is_suicidal: Option<bool>,
    pub target: Option<Target>,
    pub city: Option<City>,
}

/// A perpetrator group and the events attributed to it, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct Group {
    pub id: Option<NodeId>,
    pub name: Option<String>,
    pub events_caused: Vec<Event>,
}

impl Group {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: Some(name.into()),
            events_caused: Vec::new(),
        }
    }

    pub fn add_event(&mut self, event: Event) {
        self.events_caused.push(event);
    }
}

// ── Accounts ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct Role {
    pub id: Option<NodeId>,
    pub name: Option<String>,
}

impl Role {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: Some(name.into()),
        }
    }
}

/// An API account. `password` always holds the Argon2 PHC string, never plaintext.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct User {
    pub id: Option<NodeId>,
    pub user_name: Option<String>,
    pub password: Option<String>,
    pub email: Option<String>,
    pub roles: Vec<Role>,
}

// ── Entity bindings ───────────────────────────────────────────────

macro_rules! entity {
    ($ty:ty, $dto:ty, $name:literal, $schema:expr) => {
        impl Entity for $ty {
            type Dto = $dto;
            const NAME: &'static str = $name;

            fn schema() -> &'static EntitySchema {
                &$schema
            }

            fn id(&self) -> Option<NodeId> {
                self.id
            }

            fn set_id(&mut self, id: Option<NodeId>) {
                self.id = id;
            }
        }
    };
}

entity!(Region, RegionDto, "Region", schema::REGION);
entity!(Country, CountryDto, "Country", schema::COUNTRY);
entity!(Province, ProvinceDto, "Province", schema::PROVINCE);
entity!(City, CityDto, "City", schema::CITY);
entity!(Target, TargetDto, "Target", schema::TARGET);
entity!(Event, EventDto, "Event", schema::EVENT);
entity!(Group, GroupDto, "Group", schema::GROUP);
entity!(Role, RoleDto, "Role", schema::ROLE);
entity!(User, UserDto, "User", schema::USER);
