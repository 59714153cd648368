//! Process-local stores.
//!
//! Conditions are evaluated with `Condition::matches` against the same flat
//! records the Postgres stores persist, so both backends answer queries alike.
//! Primary use-case: integration tests and local runs without a database.

use async_trait::async_trait;
use chrono::Utc;
use cmdb_condition::Condition;
use serde_json::{Map, Value as JsonValue};
use std::{
    cmp::Ordering,
    collections::{BTreeMap, HashMap},
    sync::{
        atomic::{AtomicUsize, Ordering as AtomicOrdering},
        RwLock, RwLockReadGuard, RwLockWriteGuard,
    },
};

use crate::{
    db::traits::{AssociationStore, BusinessStore, SchemaResolver},
    models::{
        field, AssociationRef, Business, BusinessQuery, DataStatus, InternalModule,
        InternalModuleSet, NewBusiness, ObjectSchema, DEFAULT_APP_FLAG,
    },
    Error, Result,
};

#[derive(Default)]
struct MemoryState {
    businesses: BTreeMap<i64, Business>,
    internal_modules: HashMap<i64, InternalModuleSet>,
    associations: Vec<AssociationRef>,
    next_biz_id: i64,
    next_topo_id: i64,
}

impl MemoryState {
    fn next_biz_id(&mut self) -> i64 {
        self.next_biz_id += 1;
        self.next_biz_id
    }

    fn next_topo_id(&mut self) -> i64 {
        self.next_topo_id += 1;
        self.next_topo_id
    }
}

/// In-memory business and association store.
#[derive(Default)]
pub struct InMemoryTopoStore {
    state: RwLock<MemoryState>,
    business_calls: AtomicUsize,
}

impl InMemoryTopoStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `BusinessStore` calls served so far.
    pub fn business_calls(&self) -> usize {
        self.business_calls.load(AtomicOrdering::SeqCst)
    }

    /// Seed an association record.
    pub fn insert_association(&self, association: AssociationRef) -> Result<()> {
        self.write()?.associations.push(association);
        Ok(())
    }

    /// Direct lookup that bypasses owner scoping and call counting.
    pub fn get(&self, biz_id: i64) -> Result<Option<Business>> {
        Ok(self.read()?.businesses.get(&biz_id).cloned())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, MemoryState>> {
        self.state
            .read()
            .map_err(|_| Error::Internal("In-memory store lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, MemoryState>> {
        self.state
            .write()
            .map_err(|_| Error::Internal("In-memory store lock poisoned".to_string()))
    }

    fn count_call(&self) {
        self.business_calls.fetch_add(1, AtomicOrdering::SeqCst);
    }
}

#[async_trait]
impl BusinessStore for InMemoryTopoStore {
    async fn create(&self, new: NewBusiness) -> Result<Business> {
        self.count_call();
        let mut state = self.write()?;

        if new.default == DEFAULT_APP_FLAG
            && state
                .businesses
                .values()
                .any(|b| b.owner == new.owner && b.is_default())
        {
            return Err(Error::DefaultBusinessExists(new.owner));
        }

        let now = Utc::now();
        let biz_id = state.next_biz_id();
        let business = Business {
            biz_id,
            owner: new.owner,
            default: new.default,
            status: new.status,
            create_time: now,
            last_time: now,
            attributes: new.attributes,
        };

        let set_id = state.next_topo_id();
        let mut module = Vec::new();
        for (module_name, flag) in InternalModuleSet::builtin_modules() {
            module.push(InternalModule {
                module_id: state.next_topo_id(),
                module_name: module_name.to_string(),
                default: flag,
            });
        }
        state.internal_modules.insert(
            biz_id,
            InternalModuleSet {
                set_id,
                set_name: InternalModuleSet::SET_NAME.to_string(),
                module,
            },
        );
        state.businesses.insert(biz_id, business.clone());

        Ok(business)
    }

    async fn find(&self, query: &BusinessQuery) -> Result<(i64, Vec<Business>)> {
        self.count_call();
        let state = self.read()?;

        let mut matched: Vec<(Map<String, JsonValue>, &Business)> = state
            .businesses
            .values()
            .map(|b| (b.to_record(), b))
            .filter(|(record, _)| query.condition.matches(record))
            .collect();

        let sort_field = query.sort.field.as_str();
        matched.sort_by(|(a_rec, a), (b_rec, b)| {
            let ord = compare_optional(a_rec.get(sort_field), b_rec.get(sort_field))
                .then(a.biz_id.cmp(&b.biz_id));
            if query.sort.descending {
                ord.reverse()
            } else {
                ord
            }
        });

        let count = matched.len() as i64;
        let start = usize::try_from(query.start.max(0)).unwrap_or(usize::MAX);
        let limit = query
            .limit
            .map(|l| usize::try_from(l.max(0)).unwrap_or(usize::MAX))
            .unwrap_or(usize::MAX);

        let items = matched
            .into_iter()
            .skip(start)
            .take(limit)
            .map(|(_, b)| b.clone())
            .collect();

        Ok((count, items))
    }

    async fn update(
        &self,
        owner: &str,
        biz_id: i64,
        attributes: &Map<String, JsonValue>,
    ) -> Result<u64> {
        self.count_call();
        let mut state = self.write()?;

        let status = match attributes.get(field::DATA_STATUS) {
            Some(JsonValue::String(raw)) => Some(DataStatus::parse(raw)?),
            Some(other) => return Err(Error::InvalidStatusValue(other.to_string())),
            None => None,
        };

        let Some(business) = state
            .businesses
            .get_mut(&biz_id)
            .filter(|b| b.owner == owner)
        else {
            return Ok(0);
        };

        if let Some(status) = status {
            business.status = status;
        }
        for (key, value) in attributes {
            if key != field::DATA_STATUS {
                business.attributes.insert(key.clone(), value.clone());
            }
        }
        business.last_time = Utc::now();

        Ok(1)
    }

    async fn delete(&self, owner: &str, biz_id: i64) -> Result<u64> {
        self.count_call();
        let mut state = self.write()?;

        let owned = state
            .businesses
            .get(&biz_id)
            .is_some_and(|b| b.owner == owner);
        if !owned {
            return Ok(0);
        }

        state.businesses.remove(&biz_id);
        state.internal_modules.remove(&biz_id);
        Ok(1)
    }

    async fn internal_module(
        &self,
        owner: &str,
        biz_id: i64,
    ) -> Result<Option<InternalModuleSet>> {
        self.count_call();
        let state = self.read()?;

        let owned = state
            .businesses
            .get(&biz_id)
            .is_some_and(|b| b.owner == owner);
        if !owned {
            return Ok(None);
        }

        Ok(state.internal_modules.get(&biz_id).cloned())
    }
}

#[async_trait]
impl AssociationStore for InMemoryTopoStore {
    async fn count(&self, condition: &Condition) -> Result<i64> {
        let state = self.read()?;
        let count = state
            .associations
            .iter()
            .filter(|a| condition.matches(&a.to_record()))
            .count();
        Ok(count as i64)
    }
}

/// Schema resolver over a fixed set of schemas.
pub struct StaticSchemaResolver {
    schemas: HashMap<String, ObjectSchema>,
}

impl StaticSchemaResolver {
    pub fn new(schemas: impl IntoIterator<Item = ObjectSchema>) -> Self {
        Self {
            schemas: schemas
                .into_iter()
                .map(|s| (s.obj_id.clone(), s))
                .collect(),
        }
    }

    /// Resolver knowing only the built-in business schema.
    pub fn builtin() -> Self {
        Self::new([ObjectSchema::builtin_business()])
    }
}

#[async_trait]
impl SchemaResolver for StaticSchemaResolver {
    async fn find_object(&self, obj_id: &str) -> Result<ObjectSchema> {
        self.schemas
            .get(obj_id)
            .cloned()
            .ok_or_else(|| Error::SchemaNotFound(obj_id.to_string()))
    }
}

/// Missing values sort after present ones, mirroring `NULLS LAST`.
fn compare_optional(a: Option<&JsonValue>, b: Option<&JsonValue>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => compare_json(a, b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn compare_json(a: &JsonValue, b: &JsonValue) -> Ordering {
    match (a, b) {
        (JsonValue::Number(x), JsonValue::Number(y)) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (JsonValue::String(x), JsonValue::String(y)) => x.cmp(y),
        _ => a.to_string().cmp(&b.to_string()),
    }
}
