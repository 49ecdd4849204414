//! Input/output representations and the projection to and from entities.
//!
//! The projection is total and field-for-field: identifiers are dropped when
//! projecting an entity to its DTO and left unset when projecting a DTO to a
//! new entity. Declarative constraints live with the validation gate.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::types::{City, Country, Event, Group, Province, Region, Role, Target, User};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RegionDto {
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CountryDto {
    pub name: Option<String>,
    pub region: Option<RegionDto>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProvinceDto {
    pub name: Option<String>,
    pub country: Option<CountryDto>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CityDto {
    pub name: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub province: Option<ProvinceDto>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TargetDto {
    pub name: Option<String>,
    pub country_of_origin: Option<CountryDto>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EventDto {
    pub summary: Option<String>,
    pub motive: Option<String>,
    pub date: Option<NaiveDate>,
    pub is_part_of_multiple_incidents: Option<bool>,
    pub is_successful: Option<bool>,
    pub is_suicidal: Option<bool>,
    pub target: Option<TargetDto>,
    pub city: Option<CityDto>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GroupDto {
    pub name: Option<String>,
    pub events_caused: Vec<EventDto>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RoleDto {
    pub name: Option<String>,
}

/// Registration form. `matching_password` must repeat `password`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserDto {
    pub user_name: Option<String>,
    pub password: Option<String>,
    pub matching_password: Option<String>,
    pub email: Option<String>,
}

impl UserDto {
    pub fn new(user_name: &str, password: &str, matching_password: &str, email: &str) -> Self {
        Self {
            user_name: Some(user_name.to_string()),
            password: Some(password.to_string()),
            matching_password: Some(matching_password.to_string()),
            email: Some(email.to_string()),
        }
    }
}

// ── Entity -> DTO ─────────────────────────────────────────────────

impl From<&Region> for RegionDto {
    fn from(region: &Region) -> Self {
        Self {
            name: region.name.clone(),
        }
    }
}

impl From<&Country> for CountryDto {
    fn from(country: &Country) -> Self {
        Self {
            name: country.name.clone(),
            region: country.region.as_ref().map(RegionDto::from),
        }
    }
}

impl From<&Province> for ProvinceDto {
    fn from(province: &Province) -> Self {
        Self {
            name: province.name.clone(),
            country: province.country.as_ref().map(CountryDto::from),
        }
    }
}

impl From<&City> for CityDto {
    fn from(city: &City) -> Self {
        Self {
            name: city.name.clone(),
            latitude: city.latitude,
            longitude: city.longitude,
            province: city.province.as_ref().map(ProvinceDto::from),
        }
    }
}

impl From<&Target> for TargetDto {
    fn from(target: &Target) -> Self {
        Self {
            name: target.name.clone(),
            country_of_origin: target.country_of_origin.as_ref().map(CountryDto::from),
        }
    }
}

impl From<&Event> for EventDto {
    fn from(event: &Event) -> Self {
        Self {
            summary: event.summary.clone(),
            motive: event.motive.clone(),
            date: event.date,
            is_part_of_multiple_incidents: event.is_part_of_multiple_incidents,
            is_successful: event.is_successful,
            is_suicidal: event.is_suicidal,
            target: event.target.as_ref().map(TargetDto::from),
            city: event.city.as_ref().map(CityDto::from),
        }
    }
}

impl From<&Group> for GroupDto {
    fn from(group: &Group) -> Self {
        Self {
            name: group.name.clone(),
            events_caused: group.events_caused.iter().map(EventDto::from).collect(),
        }
    }
}

impl From<&Role> for RoleDto {
    fn from(role: &Role) -> Self {
        Self {
            name: role.name.clone(),
        }
    }
}

impl From<&User> for UserDto {
    fn from(user: &User) -> Self {
        Self {
            user_name: user.user_name.clone(),
            password: user.password.clone(),
            matching_password: user.password.clone(),
            email: user.email.clone(),
        }
    }
}

// ── DTO -> Entity ─────────────────────────────────────────────────

impl From<RegionDto> for Region {
    fn from(dto: RegionDto) -> Self {
        Self {
            id: None,
            name: dto.name,
        }
    }
}

impl From<CountryDto> for Country {
    fn from(dto: CountryDto) -> Self {
        Self {
            id: None,
            name: dto.name,
            region: dto.region.map(Region::from),
        }
    }
}

impl From<ProvinceDto> for Province {
    fn from(dto: ProvinceDto) -> Self {
        Self {
            id: None,
            name: dto.name,
            country: dto.country.map(Country::from),
        }
    }
}

impl From<CityDto> for City {
    fn from(dto: CityDto) -> Self {
        Self {
            id: None,
            name: dto.name,
            latitude: dto.latitude,
            longitude: dto.longitude,
            province: dto.province.map(Province::from),
        }
    }
}

impl From<TargetDto> for Target {
    fn from(dto: TargetDto) -> Self {
        Self {
            id: None,
            name: dto.name,
            country_of_origin: dto.country_of_origin.map(Country::from),
        }
    }
}

impl From<EventDto> for Event {
    fn from(dto: EventDto) -> Self {
        Self {
            id: None,
            summary: dto.summary,
            motive: dto.motive,
            date: dto.date,
            is_part_of_multiple_incidents: dto.is_part_of_multiple_incidents,
            is_successful: dto.is_successful,
            is_suicidal: dto.is_suicidal,
            target: dto.target.map(Target::from),
            city: dto.city.map(City::from),
        }
    }
}

impl From<GroupDto> for Group {
    fn from(dto: GroupDto) -> Self {
        Self {
            id: None,
            name: dto.name,
            events_caused: dto.events_caused.into_iter().map(Event::from).collect(),
        }
    }
}

impl From<RoleDto> for Role {
    fn from(dto: RoleDto) -> Self {
        Self {
            id: None,
            name: dto.name,
        }
    }
}

impl From<UserDto> for User {
    fn from(dto: UserDto) -> Self {
        Self {
            id: None,
            user_name: dto.user_name,
            password: dto.password,
            email: dto.email,
            roles: Vec::new(),
        }
    }
}
