//! Generic persistence port over a `NodeStore`.
//!
//! `GraphRepository<T, S>` maps a nested entity tree onto flat node records
//! and back. Saving walks the entity's JSON form against its static schema,
//! assigns ids to nodes that have none, and writes every node in the tree in
//! one atomic batch. Fetching reads breadth-first from the root up to the
//! requested number of relationship hops and reassembles the tree.

use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};
use std::marker::PhantomData;

use async_trait::async_trait;
use gtd_core::{Entity, EntitySchema, NodeId};
use serde_json::{Map, Value};

use crate::client::GraphError;
use crate::store::{NodeRecord, NodeStore, RelationRecord};

// ── Paging ───────────────────────────────────────────────────────

/// Zero-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u64,
    pub size: u64,
}

impl PageRequest {
    pub fn new(page: u64, size: u64) -> Self {
        Self { page, size }
    }

    pub fn skip(&self) -> u64 {
        self.page.saturating_mul(self.size)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self { page: 0, size: 20 }
    }
}

/// One page of results plus the total across all pages.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub content: Vec<T>,
    pub page: u64,
    pub size: u64,
    pub total_elements: u64,
}

impl<T> Page<T> {
    pub fn total_pages(&self) -> u64 {
        if self.size == 0 {
            0
        } else {
            self.total_elements.div_ceil(self.size)
        }
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}

// ── Port ─────────────────────────────────────────────────────────

/// Persistence capability for one entity type.
#[async_trait]
pub trait Repository<T: Entity>: Send + Sync {
    async fn find_all(&self, page: PageRequest) -> Result<Page<T>, GraphError>;

    /// Fetch with every relationship materialized.
    async fn find_by_id(&self, id: NodeId) -> Result<Option<T>, GraphError>;

    /// Fetch with relationships materialized up to `depth` hops.
    async fn find_by_id_with_depth(&self, id: NodeId, depth: usize)
        -> Result<Option<T>, GraphError>;

    /// Lowest-id entity whose string `property` equals `value`.
    async fn find_by_property(&self, property: &str, value: &str)
        -> Result<Option<T>, GraphError>;

    /// Persist the entity and every node reachable from it.
    async fn save(&self, entity: T) -> Result<T, GraphError>;

    async fn delete(&self, entity: &T) -> Result<(), GraphError>;

    async fn count(&self) -> Result<u64, GraphError>;

    /// Swap unsaved nested references for the persisted node sharing their
    /// natural key.
    async fn link_references(&self, entity: T) -> Result<T, GraphError> {
        Ok(entity)
    }
}

// ── Arena-backed implementation ──────────────────────────────────

/// `Repository` over any `NodeStore`. Clone is as cheap as the store's.
pub struct GraphRepository<T, S> {
    store: S,
    _entity: PhantomData<fn() -> T>,
}

impl<T, S: Clone> Clone for GraphRepository<T, S> {
    fn clone(&self) -> Self {
        Self::new(self.store.clone())
    }
}

impl<T, S> GraphRepository<T, S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            _entity: PhantomData,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

impl<T: Entity, S: NodeStore> GraphRepository<T, S> {
    /// Load every node reachable from `root` within `depth` hops and rebuild the tree.
    async fn materialize(&self, root: NodeRecord, depth: usize) -> Result<T, GraphError> {
        let root_id = root.id;
        let root_schema = T::schema();
        let loaded = load_subgraph(&self.store, root, root_schema, depth).await?;

        let value = assemble(root_id, root_schema, depth, &loaded).ok_or_else(|| {
            GraphError::NotFound {
                label: root_schema.label.to_string(),
                id: root_id.0,
            }
        })?;
        Ok(serde_json::from_value(value)?)
    }
}

#[async_trait]
impl<T: Entity, S: NodeStore> Repository<T> for GraphRepository<T, S> {
    async fn find_all(&self, page: PageRequest) -> Result<Page<T>, GraphError> {
        let schema = T::schema();
        let records = self
            .store
            .list(schema.label, page.skip(), page.size)
            .await?;
        let total_elements = self.store.count(schema.label).await?;

        let depth = schema.max_depth();
        let mut content = Vec::with_capacity(records.len());
        for record in records {
            content.push(self.materialize(record, depth).await?);
        }

        Ok(Page {
            content,
            page: page.page,
            size: page.size,
            total_elements,
        })
    }

    async fn find_by_id(&self, id: NodeId) -> Result<Option<T>, GraphError> {
        self.find_by_id_with_depth(id, T::schema().max_depth()).await
    }

    async fn find_by_id_with_depth(
        &self,
        id: NodeId,
        depth: usize,
    ) -> Result<Option<T>, GraphError> {
        match self.store.read(T::schema().label, id).await? {
            Some(record) => Ok(Some(self.materialize(record, depth).await?)),
            None => Ok(None),
        }
    }

    async fn find_by_property(
        &self,
        property: &str,
        value: &str,
    ) -> Result<Option<T>, GraphError> {
        let schema = T::schema();
        match self
            .store
            .find_by_property(schema.label, property, value)
            .await?
        {
            Some(record) => Ok(Some(self.materialize(record, schema.max_depth()).await?)),
            None => Ok(None),
        }
    }

    async fn save(&self, entity: T) -> Result<T, GraphError> {
        let schema = T::schema();
        let mut value = serde_json::to_value(&entity)?;

        let unsaved = count_unsaved(&value, schema);
        let mut ids = self.store.allocate_ids(unsaved).await?.into_iter();
        assign_ids(&mut value, schema, &mut ids);

        let mut records = BTreeMap::new();
        flatten(&value, schema, &mut records)?;
        let written = records.len();
        self.store.write(records.into_values().collect()).await?;

        tracing::debug!(label = schema.label, nodes = written, new = unsaved, "Entity saved");
        Ok(serde_json::from_value(value)?)
    }

    async fn delete(&self, entity: &T) -> Result<(), GraphError> {
        if let Some(id) = entity.id() {
            let label = T::schema().label;
            if self.store.remove(label, id).await? {
                tracing::info!(label, id = id.0, "Entity deleted");
            }
        }
        Ok(())
    }

    async fn count(&self) -> Result<u64, GraphError> {
        self.store.count(T::schema().label).await
    }

    async fn link_references(&self, entity: T) -> Result<T, GraphError> {
        let mut value = serde_json::to_value(&entity)?;

        let mut candidates = Vec::new();
        for rel in T::schema().relations {
            collect_link_candidates(&value, rel.field, rel.target, rel.many, "", &mut candidates);
        }
        if candidates.is_empty() {
            return Ok(entity);
        }

        for candidate in candidates {
            let found = self
                .store
                .find_by_property(candidate.schema.label, candidate.key, &candidate.value)
                .await?;
            let Some(record) = found else { continue };

            let existing_id = record.id;
            let depth = candidate.schema.max_depth();
            let loaded = load_subgraph(&self.store, record, candidate.schema, depth).await?;
            if let (Some(existing), Some(slot)) = (
                assemble(existing_id, candidate.schema, depth, &loaded),
                value.pointer_mut(&candidate.pointer),
            ) {
                *slot = existing;
            }
        }

        Ok(serde_json::from_value(value)?)
    }
}

// ── Tree walking ─────────────────────────────────────────────────

/// Child node values held under one relationship field, in position order.
fn children<'a>(object: &'a Map<String, Value>, field: &str, many: bool) -> Vec<&'a Value> {
    match object.get(field) {
        Some(Value::Array(items)) if many => items.iter().filter(|v| v.is_object()).collect(),
        Some(v) if !many && v.is_object() => vec![v],
        _ => Vec::new(),
    }
}

fn node_id(object: &Map<String, Value>) -> Option<NodeId> {
    object.get("id").and_then(Value::as_i64).map(NodeId)
}

fn count_unsaved(value: &Value, schema: &EntitySchema) -> usize {
    let Value::Object(object) = value else {
        return 0;
    };
    let own = usize::from(node_id(object).is_none());
    own + schema
        .relations
        .iter()
        .flat_map(|rel| {
            children(object, rel.field, rel.many)
                .into_iter()
                .map(move |child| count_unsaved(child, rel.target))
        })
        .sum::<usize>()
}

fn assign_ids(value: &mut Value, schema: &EntitySchema, ids: &mut impl Iterator<Item = NodeId>) {
    let Value::Object(object) = value else {
        return;
    };
    if node_id(object).is_none() {
        if let Some(id) = ids.next() {
            object.insert("id".to_string(), Value::from(id.0));
        }
    }

    for rel in schema.relations {
        match object.get_mut(rel.field) {
            Some(Value::Array(items)) if rel.many => {
                for item in items {
                    assign_ids(item, rel.target, ids);
                }
            }
            Some(child) if !rel.many => assign_ids(child, rel.target, ids),
            _ => {}
        }
    }
}

/// Split a tree into node records keyed by id, folding repeated copies of a
/// node together.
fn flatten(
    value: &Value,
    schema: &EntitySchema,
    out: &mut BTreeMap<NodeId, NodeRecord>,
) -> Result<NodeId, GraphError> {
    walk_records(value, schema, &mut |record| {
        match out.get_mut(&record.id) {
            Some(existing) => merge_copy(existing, record)?,
            None => {
                out.insert(record.id, record);
            }
        }
        Ok(())
    })
}

/// Every copy of every node in the tree, keyed by id. Unsaved nodes get
/// negative placeholder ids so they never collide.
fn node_copies(
    value: &Value,
    schema: &EntitySchema,
) -> Result<BTreeMap<NodeId, Vec<NodeRecord>>, GraphError> {
    let mut value = value.clone();
    let mut placeholders = (1..).map(|n: i64| NodeId(-n));
    assign_ids(&mut value, schema, &mut placeholders);

    let mut out: BTreeMap<NodeId, Vec<NodeRecord>> = BTreeMap::new();
    walk_records(&value, schema, &mut |record| {
        out.entry(record.id).or_default().push(record);
        Ok(())
    })?;
    Ok(out)
}

/// Depth-first walk handing each node's record to `visit`, children first.
fn walk_records(
    value: &Value,
    schema: &EntitySchema,
    visit: &mut dyn FnMut(NodeRecord) -> Result<(), GraphError>,
) -> Result<NodeId, GraphError> {
    let Value::Object(object) = value else {
        return Err(GraphError::Serialization(format!(
            "{} node is not an object",
            schema.label
        )));
    };
    let id = node_id(object).ok_or_else(|| {
        GraphError::Serialization(format!("{} node has no id after assignment", schema.label))
    })?;

    let properties: Map<String, Value> = object
        .iter()
        .filter(|(key, v)| key.as_str() != "id" && !schema.is_relation(key) && !v.is_null())
        .map(|(key, v)| (key.clone(), v.clone()))
        .collect();

    let mut relations = Vec::new();
    for rel in schema.relations {
        for (position, child) in children(object, rel.field, rel.many).into_iter().enumerate() {
            let target = walk_records(child, rel.target, visit)?;
            relations.push(RelationRecord {
                rel_type: rel.rel_type.to_string(),
                position: position as i64,
                target,
                target_label: rel.target.label.to_string(),
            });
        }
    }

    visit(NodeRecord {
        id,
        label: schema.label.to_string(),
        properties,
        relations,
    })?;
    Ok(id)
}

/// Fold another copy of the same node into `existing`.
///
/// Copies must agree on label, properties, and every relationship type both
/// of them carry. A type only one copy carries was cut off by the fetch depth
/// in the other.
fn merge_copy(existing: &mut NodeRecord, copy: NodeRecord) -> Result<(), GraphError> {
    let conflict = || GraphError::Conflict {
        label: copy.label.clone(),
        id: copy.id.0,
    };
    if existing.label != copy.label || existing.properties != copy.properties {
        return Err(conflict());
    }

    let rel_types: BTreeSet<&str> = copy.relations.iter().map(|r| r.rel_type.as_str()).collect();
    let mut missing = Vec::new();
    for rel_type in rel_types {
        let mine: Vec<_> = existing
            .relations
            .iter()
            .filter(|r| r.rel_type == rel_type)
            .collect();
        let theirs: Vec<_> = copy.relations.iter().filter(|r| r.rel_type == rel_type).collect();
        if mine.is_empty() {
            missing.extend(theirs.into_iter().cloned());
        } else if mine != theirs {
            return Err(conflict());
        }
    }
    existing.relations.extend(missing);
    Ok(())
}

/// Fail when an edit reached a shared node through only some of its copies.
///
/// `before` is the tree as fetched and `after` the same tree once edited.
/// Copies of a node that were identical in `before` must still be identical
/// in `after`. Copies that already differed (one of them cut off by the fetch
/// depth) must at least fold together without disagreeing.
pub fn check_shared_edits<T: Entity>(before: &T, after: &T) -> Result<(), GraphError> {
    let schema = T::schema();
    let before = node_copies(&serde_json::to_value(before)?, schema)?;
    let after = node_copies(&serde_json::to_value(after)?, schema)?;

    for (id, copies) in &after {
        let Some((first, rest)) = copies.split_first() else {
            continue;
        };
        if rest.iter().all(|copy| copy == first) {
            continue;
        }

        let was_uniform = before
            .get(id)
            .map_or(true, |old| old.iter().all(|copy| copy == &old[0]));
        if was_uniform {
            return Err(GraphError::Conflict {
                label: first.label.clone(),
                id: id.0,
            });
        }

        let mut folded = first.clone();
        for copy in rest {
            merge_copy(&mut folded, copy.clone())?;
        }
    }
    Ok(())
}

/// Ids of every stored node in the tree, root included.
pub fn node_ids<T: Entity>(entity: &T) -> Result<BTreeSet<NodeId>, GraphError> {
    let value = serde_json::to_value(entity)?;
    let mut ids = BTreeSet::new();
    collect_ids(&value, T::schema(), &mut ids);
    Ok(ids)
}

fn collect_ids(value: &Value, schema: &EntitySchema, out: &mut BTreeSet<NodeId>) {
    let Value::Object(object) = value else {
        return;
    };
    out.extend(node_id(object));
    for rel in schema.relations {
        for child in children(object, rel.field, rel.many) {
            collect_ids(child, rel.target, out);
        }
    }
}

/// Breadth-first read of everything within `depth` hops of `root`.
async fn load_subgraph<S: NodeStore + ?Sized>(
    store: &S,
    root: NodeRecord,
    root_schema: &'static EntitySchema,
    depth: usize,
) -> Result<HashMap<NodeId, NodeRecord>, GraphError> {
    let mut loaded = HashMap::new();
    let mut reached: HashMap<NodeId, usize> = HashMap::new();
    let mut queue = VecDeque::from([(root.id, root_schema, depth)]);
    loaded.insert(root.id, root);

    while let Some((id, schema, remaining)) = queue.pop_front() {
        // A node reached again with more hops left must be expanded again.
        if reached.get(&id).is_some_and(|&seen| seen >= remaining) {
            continue;
        }
        reached.insert(id, remaining);

        if !loaded.contains_key(&id) {
            match store.read(schema.label, id).await? {
                Some(record) => {
                    loaded.insert(id, record);
                }
                None => {
                    tracing::warn!(label = schema.label, id = id.0, "Dangling relationship");
                    continue;
                }
            }
        }
        if remaining == 0 {
            continue;
        }

        let record = &loaded[&id];
        for rel in schema.relations {
            for target in record.targets(rel.rel_type) {
                queue.push_back((target, rel.target, remaining - 1));
            }
        }
    }

    Ok(loaded)
}

/// Rebuild the JSON tree of one node. Relations past `remaining` hops are left out.
fn assemble(
    id: NodeId,
    schema: &EntitySchema,
    remaining: usize,
    loaded: &HashMap<NodeId, NodeRecord>,
) -> Option<Value> {
    let record = loaded.get(&id)?;
    let mut object = record.properties.clone();
    object.insert("id".to_string(), Value::from(id.0));

    if remaining > 0 {
        for rel in schema.relations {
            let targets = record.targets(rel.rel_type);
            let value = if rel.many {
                Value::Array(
                    targets
                        .into_iter()
                        .filter_map(|t| assemble(t, rel.target, remaining - 1, loaded))
                        .collect(),
                )
            } else {
                targets
                    .first()
                    .and_then(|t| assemble(*t, rel.target, remaining - 1, loaded))
                    .unwrap_or(Value::Null)
            };
            object.insert(rel.field.to_string(), value);
        }
    }

    Some(Value::Object(object))
}

struct LinkCandidate {
    pointer: String,
    schema: &'static EntitySchema,
    key: &'static str,
    value: String,
}

/// Find the outermost unsaved nested nodes whose schema declares a natural key.
fn collect_link_candidates(
    parent: &Value,
    field: &str,
    schema: &'static EntitySchema,
    many: bool,
    prefix: &str,
    out: &mut Vec<LinkCandidate>,
) {
    let Value::Object(object) = parent else {
        return;
    };
    let base = format!("{prefix}/{field}");
    let slots: Vec<(String, &Value)> = match object.get(field) {
        Some(Value::Array(items)) if many => items
            .iter()
            .enumerate()
            .map(|(i, v)| (format!("{base}/{i}"), v))
            .collect(),
        Some(v) if !many && v.is_object() => vec![(base, v)],
        _ => Vec::new(),
    };

    for (pointer, child) in slots {
        let Value::Object(child_object) = child else {
            continue;
        };
        if let Some(key) = schema.natural_key {
            let key_value = child_object.get(key).and_then(Value::as_str);
            if let (None, Some(key_value)) = (node_id(child_object), key_value) {
                out.push(LinkCandidate {
                    pointer,
                    schema,
                    key,
                    value: key_value.to_string(),
                });
                continue;
            }
        }
        for rel in schema.relations {
            collect_link_candidates(child, rel.field, rel.target, rel.many, &pointer, out);
        }
    }
}
