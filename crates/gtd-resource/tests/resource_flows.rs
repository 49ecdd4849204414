//! End-to-end resource flows over the in-memory arena store.

use chrono::NaiveDate;
use gtd_core::config::ResourceSettings;
use gtd_core::dto::{CityDto, CountryDto, EventDto, GroupDto, RegionDto, TargetDto};
use gtd_core::{City, Country, Event, Group, NodeId, Province, Region, Target};
use gtd_graph::{GraphRepository, MemoryStore, Repository};
use gtd_resource::catalog::Handler;
use gtd_resource::validation::COUNTRY_MISSING;
use gtd_resource::{
    Catalog, ResourceError, ResourceHandler, ResourceService, UpsertOutcome, ValidationGate,
};
use serde_json::json;

const MISMATCH: &str = "Province and target should be located in the same country.";

fn catalog() -> Catalog<MemoryStore> {
    Catalog::in_memory(&ResourceSettings::default())
}

async fn save_country(catalog: &Catalog<MemoryStore>, name: &str) -> Country {
    let countries: GraphRepository<Country, _> = GraphRepository::new(catalog.store().clone());
    countries
        .save(Country {
            id: None,
            name: Some(name.to_string()),
            region: Some(Region {
                id: None,
                name: Some("Europe".to_string()),
            }),
        })
        .await
        .unwrap()
}

fn event(summary: &str, country: &Country) -> Event {
    Event {
        id: None,
        summary: Some(summary.to_string()),
        motive: Some("Political".to_string()),
        date: NaiveDate::from_ymd_opt(1995, 6, 12),
        is_part_of_multiple_incidents: Some(false),
        is_successful: Some(true),
        is_suicidal: Some(false),
        target: Some(Target {
            id: None,
            name: Some("Police station".to_string()),
            country_of_origin: Some(country.clone()),
        }),
        city: Some(City {
            id: None,
            name: Some("Warsaw".to_string()),
            latitude: Some(52.23),
            longitude: Some(21.01),
            province: Some(Province {
                id: None,
                name: Some("Masovia".to_string()),
                country: Some(country.clone()),
            }),
        }),
    }
}

async fn saved_event(catalog: &Catalog<MemoryStore>) -> Event {
    let poland = save_country(catalog, "Poland").await;
    let events: GraphRepository<Event, _> = GraphRepository::new(catalog.store().clone());
    events.save(event("Bombing", &poland)).await.unwrap()
}

async fn saved_group(catalog: &Catalog<MemoryStore>) -> Group {
    let poland = save_country(catalog, "Poland").await;
    let groups: GraphRepository<Group, _> = GraphRepository::new(catalog.store().clone());
    let mut group = Group::named("Red Army");
    group.add_event(event("first", &poland));
    group.add_event(event("second", &poland));
    groups.save(group).await.unwrap()
}

fn assert_messages(err: ResourceError, expected: &[&str]) {
    match &err {
        ResourceError::ValidationFailed(_) => {
            let messages = err.messages();
            for message in expected {
                assert!(messages.contains(message), "missing {message:?} in {messages:?}");
            }
        }
        other => panic!("expected validation failure, got {other:?}"),
    }
}

// ── Validation completeness ──────────────────────────────────────

#[tokio::test]
async fn cleared_event_reports_exactly_seven_violations() {
    let catalog = catalog();
    let event = saved_event(&catalog).await;
    let id = event.id.unwrap();

    let patch = json!({
        "summary": null, "motive": null, "date": null,
        "isPartOfMultipleIncidents": null, "isSuccessful": null, "isSuicidal": null,
        "target": null
    });
    let err = catalog.events.apply_merge_patch(id, &patch).await.unwrap_err();
    assert_eq!(err.messages().len(), 7);
    assert_messages(err, &["Event summary cannot be empty.", "Target name cannot be empty."]);

    let ops = json!([
        {"op": "replace", "path": "/summary", "value": null},
        {"op": "replace", "path": "/motive", "value": null},
        {"op": "replace", "path": "/date", "value": null},
        {"op": "replace", "path": "/isPartOfMultipleIncidents", "value": null},
        {"op": "replace", "path": "/isSuccessful", "value": null},
        {"op": "replace", "path": "/isSuicidal", "value": null},
        {"op": "replace", "path": "/target", "value": null}
    ]);
    let err = catalog.events.apply_sequence_patch(id, &ops).await.unwrap_err();
    assert_eq!(err.messages().len(), 7);
}

#[tokio::test]
async fn rejected_patch_leaves_store_untouched() {
    let catalog = catalog();
    let event = saved_event(&catalog).await;
    let id = event.id.unwrap();

    let patch = json!({"summary": "changed", "motive": null});
    assert!(catalog.events.apply_merge_patch(id, &patch).await.is_err());

    let stored = catalog.events.find_one(id).await.unwrap();
    assert_eq!(stored, event);
}

// ── Merge-patch null semantics ───────────────────────────────────

#[tokio::test]
async fn merge_null_name_is_reported() {
    let catalog = catalog();
    let group = saved_group(&catalog).await;

    let err = catalog
        .groups
        .apply_merge_patch(group.id.unwrap(), &json!({"name": null}))
        .await
        .unwrap_err();
    assert_eq!(err.messages(), vec!["Group name cannot be empty."]);
}

#[tokio::test]
async fn empty_merge_patch_is_a_no_op() {
    let catalog = catalog();
    let group = saved_group(&catalog).await;

    let patched = catalog
        .groups
        .apply_merge_patch(group.id.unwrap(), &json!({}))
        .await
        .unwrap();
    assert_eq!(patched, group);
    assert_eq!(catalog.groups.find_one(group.id.unwrap()).await.unwrap(), group);
}

#[tokio::test]
async fn sequence_patch_updates_nested_event() {
    let catalog = catalog();
    let group = saved_group(&catalog).await;
    let id = group.id.unwrap();

    let ops = json!([{"op": "replace", "path": "/eventsCaused/1/city/name", "value": "Krakow"}]);
    let patched = catalog.groups.apply_sequence_patch(id, &ops).await.unwrap();
    assert_eq!(
        patched.events_caused[1].city.as_ref().unwrap().name.as_deref(),
        Some("Krakow")
    );

    let stored = catalog.groups.find_one(id).await.unwrap();
    assert_eq!(stored, patched);
    assert_eq!(stored.events_caused[0].summary.as_deref(), Some("first"));
}

// ── Shared nodes ─────────────────────────────────────────────────

/// Group whose events share one stored City and one stored Country, linked
/// the way bulk seeding links them.
async fn group_in_one_city(catalog: &Catalog<MemoryStore>) -> Group {
    let poland = save_country(catalog, "Poland").await;
    let cities: GraphRepository<City, _> = GraphRepository::new(catalog.store().clone());
    let warsaw = cities
        .save(event("template", &poland).city.unwrap())
        .await
        .unwrap();

    let groups: GraphRepository<Group, _> = GraphRepository::new(catalog.store().clone());
    let mut group = Group::named("G");
    for summary in ["first", "second"] {
        let mut e = event(summary, &poland);
        e.city = Some(warsaw.clone());
        group.add_event(e);
    }
    groups.save(group).await.unwrap()
}

fn city_names(group: &Group) -> Vec<String> {
    group
        .events_caused
        .iter()
        .map(|e| e.city.as_ref().unwrap().name.clone().unwrap())
        .collect()
}

#[tokio::test]
async fn editing_one_copy_of_a_shared_city_is_malformed() {
    let catalog = catalog();
    let group = group_in_one_city(&catalog).await;
    let id = group.id.unwrap();

    let ops = json!([{"op": "replace", "path": "/eventsCaused/1/city/name", "value": "Krakow"}]);
    let err = catalog.groups.apply_sequence_patch(id, &ops).await.unwrap_err();
    assert!(matches!(err, ResourceError::PatchMalformed(_)));

    let stored = catalog.groups.find_one(id).await.unwrap();
    assert_eq!(city_names(&stored), vec!["Warsaw", "Warsaw"]);
}

#[tokio::test]
async fn editing_every_copy_of_a_shared_city_is_stored() {
    let catalog = catalog();
    let group = group_in_one_city(&catalog).await;
    let id = group.id.unwrap();

    let ops = json!([
        {"op": "replace", "path": "/eventsCaused/0/city/name", "value": "Krakow"},
        {"op": "replace", "path": "/eventsCaused/1/city/name", "value": "Krakow"}
    ]);
    let patched = catalog.groups.apply_sequence_patch(id, &ops).await.unwrap();
    assert_eq!(city_names(&patched), vec!["Krakow", "Krakow"]);

    let stored = catalog.groups.find_one(id).await.unwrap();
    assert_eq!(stored, patched);
    let cities: GraphRepository<City, _> = GraphRepository::new(catalog.store().clone());
    assert_eq!(cities.count().await.unwrap(), 1);
}

#[tokio::test]
async fn clearing_a_shared_country_on_one_copy_is_malformed() {
    let catalog = catalog();
    let group = group_in_one_city(&catalog).await;
    let id = group.id.unwrap();

    // the same Country is reached through both Targets and the City's Province
    let ops = json!([
        {"op": "remove", "path": "/eventsCaused/0/target/countryOfOrigin/region"}
    ]);
    let err = catalog.groups.apply_sequence_patch(id, &ops).await.unwrap_err();
    assert!(matches!(err, ResourceError::PatchMalformed(_)));
    assert_eq!(catalog.groups.find_one(id).await.unwrap(), group);
}

// ── Id rewrites ──────────────────────────────────────────────────

#[tokio::test]
async fn patch_cannot_move_root_onto_another_node() {
    let catalog = catalog();
    let group = group_in_one_city(&catalog).await;
    let id = group.id.unwrap();
    let asia = catalog
        .regions
        .create(RegionDto {
            name: Some("Asia".to_string()),
        })
        .await
        .unwrap();

    let patch = json!({"id": asia.id.unwrap().0});
    let err = catalog.groups.apply_merge_patch(id, &patch).await.unwrap_err();
    assert!(matches!(err, ResourceError::PatchMalformed(_)));

    assert_eq!(catalog.regions.find_one(asia.id.unwrap()).await.unwrap(), asia);
    assert_eq!(catalog.groups.find(Default::default()).await.unwrap().total_elements, 1);
}

#[tokio::test]
async fn patch_cannot_point_nested_node_at_foreign_id() {
    let catalog = catalog();
    let group = group_in_one_city(&catalog).await;
    let id = group.id.unwrap();
    let asia = catalog
        .regions
        .create(RegionDto {
            name: Some("Asia".to_string()),
        })
        .await
        .unwrap();

    let ops = json!([
        {"op": "replace", "path": "/eventsCaused/0/summary", "value": "moved"},
        {"op": "replace", "path": "/eventsCaused/0/id", "value": asia.id.unwrap().0}
    ]);
    let err = catalog.groups.apply_sequence_patch(id, &ops).await.unwrap_err();
    assert!(matches!(err, ResourceError::PatchMalformed(_)));

    assert_eq!(catalog.regions.find_one(asia.id.unwrap()).await.unwrap(), asia);
    assert_eq!(catalog.groups.find_one(id).await.unwrap(), group);
}

// ── Sequence-patch path failure ──────────────────────────────────

#[tokio::test]
async fn replace_on_missing_path_is_malformed() {
    let catalog = catalog();
    let group = saved_group(&catalog).await;
    let ops = json!([{"op": "replace", "path": "/nonexistent", "value": "x"}]);

    let err = catalog
        .groups
        .apply_sequence_patch(group.id.unwrap(), &ops)
        .await
        .unwrap_err();
    assert!(matches!(err, ResourceError::PatchMalformed(_)));
}

#[tokio::test]
async fn patch_deeper_than_fetch_is_malformed() {
    let catalog = catalog();
    let group = saved_group(&catalog).await;
    let store = catalog.store().clone();
    let shallow: Handler<Group, MemoryStore> = ResourceHandler::new(
        ResourceService::new(GraphRepository::new(store.clone())),
        ValidationGate::new(GraphRepository::new(store)),
    )
    .with_patch_depth(1);

    let ops = json!([{"op": "replace", "path": "/eventsCaused/0/city/name", "value": "Lodz"}]);
    let err = shallow
        .apply_sequence_patch(group.id.unwrap(), &ops)
        .await
        .unwrap_err();
    assert!(matches!(err, ResourceError::PatchMalformed(_)));
}

// ── Round-trip ───────────────────────────────────────────────────

#[tokio::test]
async fn save_new_then_find_returns_same_fields() {
    let catalog = catalog();
    let dto = GroupDto {
        name: Some("ETA".to_string()),
        events_caused: vec![EventDto::from(&event(
            "Car bomb",
            &Country {
                id: None,
                name: Some("Spain".to_string()),
                region: None,
            },
        ))],
    };

    let saved = catalog.groups.service().save_new(dto.clone()).await.unwrap();
    let found = catalog
        .groups
        .service()
        .find_by_id(saved.id)
        .await
        .unwrap()
        .unwrap();

    assert!(found.id.is_some());
    assert_eq!(GroupDto::from(&found), dto);
}

// ── Geographic consistency ───────────────────────────────────────

#[tokio::test]
async fn mismatched_countries_fail_for_both_protocols() {
    let catalog = catalog();
    save_country(&catalog, "Spain").await;
    let event = saved_event(&catalog).await;
    let id = event.id.unwrap();

    let merge = json!({"target": {"countryOfOrigin": {"name": "Spain"}}});
    let err = catalog.events.apply_merge_patch(id, &merge).await.unwrap_err();
    assert_eq!(err.messages(), vec![MISMATCH]);

    let ops = json!([
        {"op": "replace", "path": "/city/province/country/name", "value": "Spain"}
    ]);
    let err = catalog.events.apply_sequence_patch(id, &ops).await.unwrap_err();
    assert_eq!(err.messages(), vec![MISMATCH]);
}

// ── Boundary ─────────────────────────────────────────────────────

fn city(latitude: f64, longitude: f64) -> CityDto {
    CityDto {
        name: Some("Edge".to_string()),
        latitude: Some(latitude),
        longitude: Some(longitude),
        province: None,
    }
}

#[tokio::test]
async fn coordinate_boundaries() {
    let catalog = catalog();

    for (lat, lon) in [(90.0, 180.0), (-90.0, -180.0)] {
        assert!(catalog.cities.create(city(lat, lon)).await.is_ok());
    }
    for (lat, lon) in [(90.0001, 0.0), (-90.0001, 0.0), (0.0, 180.0001), (0.0, -180.0001)] {
        let err = catalog.cities.create(city(lat, lon)).await.unwrap_err();
        assert_eq!(err.messages().len(), 1);
    }

    let saved = catalog.cities.create(city(0.0, 0.0)).await.unwrap();
    let err = catalog
        .cities
        .apply_merge_patch(saved.id.unwrap(), &json!({"latitude": -90.0001}))
        .await
        .unwrap_err();
    assert_eq!(
        err.messages(),
        vec!["City latitude must be greater or equal to -90."]
    );
}

// ── Transport contract ───────────────────────────────────────────

#[tokio::test]
async fn missing_ids_are_not_found() {
    let catalog = catalog();
    let id = NodeId(404);

    let err = catalog.regions.find_one(id).await.unwrap_err();
    assert_eq!(err.to_string(), "Could not find Region with id: 404.");
    assert!(matches!(
        catalog.regions.apply_merge_patch(id, &json!({})).await,
        Err(ResourceError::NotFound { .. })
    ));
    assert!(matches!(
        catalog.regions.delete(id).await,
        Err(ResourceError::NotFound { .. })
    ));
}

#[tokio::test]
async fn put_creates_or_replaces() {
    let catalog = catalog();
    let dto = |name: &str| RegionDto {
        name: Some(name.to_string()),
    };

    let (created, outcome) = catalog.regions.replace(NodeId(77), dto("Asia")).await.unwrap();
    assert_eq!(outcome, UpsertOutcome::Created);

    let (replaced, outcome) = catalog
        .regions
        .replace(created.id.unwrap(), dto("Oceania"))
        .await
        .unwrap();
    assert_eq!(outcome, UpsertOutcome::Replaced);
    assert_eq!(replaced.id, created.id);

    let err = catalog
        .regions
        .replace(created.id.unwrap(), dto(""))
        .await
        .unwrap_err();
    assert_eq!(err.messages(), vec!["Region name cannot be empty."]);
}

#[tokio::test]
async fn delete_then_find_is_not_found() {
    let catalog = catalog();
    let group = saved_group(&catalog).await;
    let id = group.id.unwrap();

    let deleted = catalog.groups.delete(id).await.unwrap();
    assert_eq!(deleted, group);
    assert!(catalog.groups.find_one(id).await.is_err());
}

#[tokio::test]
async fn target_creation_requires_and_links_existing_country() {
    let catalog = catalog();
    let dto = |country: &str| TargetDto {
        name: Some("Embassy".to_string()),
        country_of_origin: Some(CountryDto {
            name: Some(country.to_string()),
            region: None,
        }),
    };

    let err = catalog.targets.create(dto("Atlantis")).await.unwrap_err();
    assert_eq!(err.messages(), vec![COUNTRY_MISSING]);

    let poland = save_country(&catalog, "Poland").await;
    let target = catalog.targets.create(dto("Poland")).await.unwrap();
    assert_eq!(target.country_of_origin.unwrap().id, poland.id);

    let countries: GraphRepository<Country, _> = GraphRepository::new(catalog.store().clone());
    assert_eq!(countries.count().await.unwrap(), 1);
}

#[tokio::test]
async fn find_pages_through_resources() {
    let catalog = catalog();
    for name in ["a", "b", "c"] {
        catalog
            .regions
            .create(RegionDto {
                name: Some(name.to_string()),
            })
            .await
            .unwrap();
    }

    let page = catalog.regions.find(catalog.page(Some(1), Some(2))).await.unwrap();
    assert_eq!(page.content.len(), 1);
    assert_eq!(page.total_elements, 3);
    assert_eq!(page.total_pages(), 2);
}
