//! Static graph schemas for every entity type.
//!
//! A schema names the node label, the JSON fields that hold relationships to
//! other nodes, and (for shared reference entities) the property that
//! identifies an existing node by value. The entity graph has no
//! back-references, so schemas form a DAG rooted at Group and User.

/// Shape of one node type in the graph.
#[derive(Debug)]
pub struct EntitySchema {
    /// Neo4j label and arena tag.
    pub label: &'static str,
    /// Outgoing relationships, keyed by the JSON field that holds them.
    pub relations: &'static [RelationSchema],
    /// Property that identifies an already-persisted node of this type.
    pub natural_key: Option<&'static str>,
}

/// An outgoing relationship from one entity to another.
#[derive(Debug)]
pub struct RelationSchema {
    /// camelCase field name in the entity's JSON form.
    pub field: &'static str,
    /// Relationship type stored in the graph.
    pub rel_type: &'static str,
    pub target: &'static EntitySchema,
    /// `true` for ordered lists (`eventsCaused`), `false` for single references.
    pub many: bool,
}

impl EntitySchema {
    pub fn relation(&self, field: &str) -> Option<&RelationSchema> {
        self.relations.iter().find(|r| r.field == field)
    }

    pub fn is_relation(&self, field: &str) -> bool {
        self.relation(field).is_some()
    }

    /// Number of relationship hops on the longest path below this schema.
    pub fn max_depth(&self) -> usize {
        self.relations
            .iter()
            .map(|r| 1 + r.target.max_depth())
            .max()
            .unwrap_or(0)
    }
}

pub static REGION: EntitySchema = EntitySchema {
    label: "Region",
    relations: &[],
    natural_key: None,
};

pub static COUNTRY: EntitySchema = EntitySchema {
    label: "Country",
    relations: &[RelationSchema {
        field: "region",
        rel_type: "PART_OF",
        target: &REGION,
        many: false,
    }],
    natural_key: Some("name"),
};

pub static PROVINCE: EntitySchema = EntitySchema {
    label: "Province",
    relations: &[RelationSchema {
        field: "country",
        rel_type: "PART_OF",
        target: &COUNTRY,
        many: false,
    }],
    natural_key: None,
};

pub static CITY: EntitySchema = EntitySchema {
    label: "City",
    relations: &[RelationSchema {
        field: "province",
        rel_type: "PART_OF",
        target: &PROVINCE,
        many: false,
    }],
    natural_key: None,
};

pub static TARGET: EntitySchema = EntitySchema {
    label: "Target",
    relations: &[RelationSchema {
        field: "countryOfOrigin",
        rel_type: "ORIGINATES_FROM",
        target: &COUNTRY,
        many: false,
    }],
    natural_key: None,
};

pub static EVENT: EntitySchema = EntitySchema {
    label: "Event",
    relations: &[
        RelationSchema {
            field: "target",
            rel_type: "TARGETS",
            target: &TARGET,
            many: false,
        },
        RelationSchema {
            field: "city",
            rel_type: "TAKES_PLACE_IN",
            target: &CITY,
            many: false,
        },
    ],
    natural_key: None,
};

pub static GROUP: EntitySchema = EntitySchema {
    label: "Group",
    relations: &[RelationSchema {
        field: "eventsCaused",
        rel_type: "CAUSED",
        target: &EVENT,
        many: true,
    }],
    natural_key: None,
};

pub static ROLE: EntitySchema = EntitySchema {
    label: "Role",
    relations: &[],
    natural_key: Some("name"),
};

pub static USER: EntitySchema = EntitySchema {
    label: "User",
    relations: &[RelationSchema {
        field: "roles",
        rel_type: "HAS_ROLE",
        target: &ROLE,
        many: true,
    }],
    natural_key: None,
};

/// Every schema, in dependency order (referenced types before referencing ones).
pub static ALL: [&EntitySchema; 9] = [
    &REGION, &COUNTRY, &PROVINCE, &CITY, &TARGET, &EVENT, &GROUP, &ROLE, &USER,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn group_graph_is_five_hops_deep() {
        // Group -> Event -> City -> Province -> Country -> Region
        assert_eq!(GROUP.max_depth(), 5);
        assert_eq!(REGION.max_depth(), 0);
        assert_eq!(TARGET.max_depth(), 2);
    }

    #[test]
    fn relation_lookup_by_field() {
        let rel = EVENT.relation("city").unwrap();
        assert_eq!(rel.rel_type, "TAKES_PLACE_IN");
        assert_eq!(rel.target.label, "City");
        assert!(!EVENT.is_relation("summary"));
        assert!(GROUP.relation("eventsCaused").unwrap().many);
    }
}
