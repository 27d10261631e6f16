// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! An in-memory host: model metadata, callers, permissions and a record store, with a log of
//! every store call so tests can assert how the resolver talks to the backend.

pub mod fixtures;
mod filter;
mod store;

use std::{
    collections::{BTreeMap, HashMap, HashSet},
    sync::{
        Arc, Mutex, MutexGuard, PoisonError,
        atomic::{AtomicUsize, Ordering},
    },
};

use async_trait::async_trait;
use common::value::Val;
use indexmap::IndexMap;

use crate::{
    AccessMode, AllowedFields, Caller, CallerId, CallerRegistry, CallerScope, Domain,
    EntityRegistry, ModelDefinition, Record, RecordId, RecordStore, SearchOptions, StoreError,
    StoreProvider, TenantId, Values,
};

pub use store::MemoryStore;

/// A call made against a [`MemoryStore`].
#[derive(Debug, Clone, PartialEq)]
pub enum StoreCall {
    Search {
        collection: String,
        domain: Domain,
        options: SearchOptions,
    },
    Read {
        collection: String,
        ids: Vec<RecordId>,
        fields: Vec<String>,
    },
    Create {
        collection: String,
    },
    Write {
        collection: String,
        ids: Vec<RecordId>,
    },
    Rollback,
}

pub(crate) type Tables = HashMap<String, BTreeMap<RecordId, Record>>;

#[derive(Default)]
struct Config {
    database: String,
    models: IndexMap<String, ModelDefinition>,
    unregistered: HashSet<String>,
    revoked: HashSet<(CallerId, String, AccessMode)>,
    rules: HashSet<(String, AccessMode)>,
    hidden_rows: HashMap<String, HashSet<RecordId>>,
    allowed_fields: HashMap<CallerId, AllowedFields>,
    callers: HashMap<CallerId, (String, Caller)>,
    context: IndexMap<String, Val>,
}

#[derive(Default)]
pub(crate) struct Inner {
    config: Mutex<Config>,
    tables: Mutex<Tables>,
    calls: Mutex<Vec<StoreCall>>,
    opened: Mutex<Vec<CallerScope>>,
    model_reads: AtomicUsize,
}

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Build `Values` from attribute/value pairs.
pub fn values<const N: usize>(pairs: [(&str, Val); N]) -> Values {
    pairs
        .into_iter()
        .map(|(name, value)| (name.to_string(), value))
        .collect()
}

#[derive(Clone, Default)]
pub struct MemoryHost {
    inner: Arc<Inner>,
}

impl MemoryHost {
    pub fn new() -> Self {
        let host = Self::default();
        lock(&host.inner.config).database = common::env_const::DEFAULT_DATABASE.to_string();
        host
    }

    pub fn with_model(self, model: ModelDefinition) -> Self {
        lock(&self.inner.config)
            .models
            .insert(model.collection.clone(), model);
        self
    }

    /// Keep the model's metadata but make it unknown to the runtime type registry.
    pub fn with_unregistered(self, collection: &str) -> Self {
        lock(&self.inner.config)
            .unregistered
            .insert(collection.to_string());
        self
    }

    pub fn with_caller(self, caller: Caller, secret: &str) -> Self {
        lock(&self.inner.config)
            .callers
            .insert(caller.id, (secret.to_string(), caller));
        self
    }

    pub fn with_revoked(self, caller: CallerId, collection: &str, mode: AccessMode) -> Self {
        lock(&self.inner.config)
            .revoked
            .insert((caller, collection.to_string(), mode));
        self
    }

    pub fn with_rule(self, collection: &str, mode: AccessMode) -> Self {
        lock(&self.inner.config)
            .rules
            .insert((collection.to_string(), mode));
        self
    }

    /// Rows that row-level rules deny to unprivileged callers.
    pub fn with_hidden_rows(self, collection: &str, ids: &[RecordId]) -> Self {
        lock(&self.inner.config)
            .hidden_rows
            .entry(collection.to_string())
            .or_default()
            .extend(ids);
        self
    }

    pub fn with_allowed_fields(self, caller: CallerId, collection: &str, fields: &[&str]) -> Self {
        lock(&self.inner.config)
            .allowed_fields
            .entry(caller)
            .or_default()
            .insert(
                collection.to_string(),
                fields.iter().map(|f| f.to_string()).collect(),
            );
        self
    }

    pub fn with_context_variable(self, name: &str, value: Val) -> Self {
        lock(&self.inner.config)
            .context
            .insert(name.to_string(), value);
        self
    }

    /// Insert a record directly, bypassing constraints and the call log.
    pub fn insert(&self, collection: &str, values: Values) -> RecordId {
        let mut tables = lock(&self.inner.tables);
        let table = tables.entry(collection.to_string()).or_default();
        let id = table.keys().next_back().map(|id| id + 1).unwrap_or(1);

        let mut record = Record::new();
        record.insert("id".to_string(), Val::from(id));
        record.extend(values);
        table.insert(id, record);
        id
    }

    pub fn record(&self, collection: &str, id: RecordId) -> Option<Record> {
        lock(&self.inner.tables)
            .get(collection)
            .and_then(|table| table.get(&id))
            .cloned()
    }

    pub fn record_count(&self, collection: &str) -> usize {
        lock(&self.inner.tables)
            .get(collection)
            .map(|table| table.len())
            .unwrap_or(0)
    }

    pub fn calls(&self) -> Vec<StoreCall> {
        lock(&self.inner.calls).clone()
    }

    pub fn reads_of(&self, collection: &str) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, StoreCall::Read { collection: c, .. } if c == collection))
            .count()
    }

    pub fn searches_of(&self, collection: &str) -> Vec<(Domain, SearchOptions)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                StoreCall::Search {
                    collection: c,
                    domain,
                    options,
                } if c == collection => Some((domain, options)),
                _ => None,
            })
            .collect()
    }

    pub fn clear_calls(&self) {
        lock(&self.inner.calls).clear();
    }

    pub fn opened_scopes(&self) -> Vec<CallerScope> {
        lock(&self.inner.opened).clone()
    }

    /// How many times model metadata was enumerated.
    pub fn model_reads(&self) -> usize {
        self.inner.model_reads.load(Ordering::SeqCst)
    }

    pub fn stored_caller(&self, id: CallerId) -> Option<Caller> {
        lock(&self.inner.config)
            .callers
            .get(&id)
            .map(|(_, caller)| caller.clone())
    }

    fn model(&self, collection: &str) -> Option<ModelDefinition> {
        lock(&self.inner.config).models.get(collection).cloned()
    }

    fn is_revoked(&self, caller: CallerId, collection: &str, mode: AccessMode) -> bool {
        lock(&self.inner.config)
            .revoked
            .contains(&(caller, collection.to_string(), mode))
    }

    fn has_rule(&self, collection: &str, mode: AccessMode) -> bool {
        lock(&self.inner.config)
            .rules
            .contains(&(collection.to_string(), mode))
    }

    fn hidden_rows(&self, collection: &str) -> HashSet<RecordId> {
        lock(&self.inner.config)
            .hidden_rows
            .get(collection)
            .cloned()
            .unwrap_or_default()
    }

    fn log(&self, call: StoreCall) {
        lock(&self.inner.calls).push(call);
    }
}

#[async_trait]
impl EntityRegistry for MemoryHost {
    async fn models(&self) -> Result<Vec<ModelDefinition>, StoreError> {
        self.inner.model_reads.fetch_add(1, Ordering::SeqCst);
        Ok(lock(&self.inner.config).models.values().cloned().collect())
    }

    fn is_registered(&self, collection: &str) -> bool {
        let config = lock(&self.inner.config);
        config.models.contains_key(collection) && !config.unregistered.contains(collection)
    }

    async fn has_access(
        &self,
        caller: CallerId,
        collection: &str,
        mode: AccessMode,
    ) -> Result<bool, StoreError> {
        Ok(!self.is_revoked(caller, collection, mode))
    }

    async fn has_rules(
        &self,
        _caller: CallerId,
        collection: &str,
        mode: AccessMode,
    ) -> Result<bool, StoreError> {
        Ok(self.has_rule(collection, mode))
    }

    async fn allowed_fields(&self, caller: CallerId) -> Result<AllowedFields, StoreError> {
        Ok(lock(&self.inner.config)
            .allowed_fields
            .get(&caller)
            .cloned()
            .unwrap_or_default())
    }
}

#[async_trait]
impl CallerRegistry for MemoryHost {
    async fn authenticate(
        &self,
        database: &str,
        login: &str,
        secret: &str,
    ) -> Result<Option<CallerId>, StoreError> {
        let config = lock(&self.inner.config);
        if config.database != database {
            return Ok(None);
        }
        Ok(config
            .callers
            .values()
            .find(|(stored_secret, caller)| caller.login == login && stored_secret == secret)
            .map(|(_, caller)| caller.id))
    }

    async fn caller(&self, id: CallerId) -> Result<Caller, StoreError> {
        self.stored_caller(id).ok_or(StoreError::UnknownCaller(id))
    }

    async fn set_active_tenant(&self, id: CallerId, tenant: TenantId) -> Result<(), StoreError> {
        let mut config = lock(&self.inner.config);
        let (_, caller) = config
            .callers
            .get_mut(&id)
            .ok_or(StoreError::UnknownCaller(id))?;
        caller.default_tenant = Some(tenant);
        Ok(())
    }

    async fn context_variables(&self, _id: CallerId) -> Result<IndexMap<String, Val>, StoreError> {
        Ok(lock(&self.inner.config).context.clone())
    }
}

#[async_trait]
impl StoreProvider for MemoryHost {
    async fn open(&self, scope: &CallerScope) -> Result<Arc<dyn RecordStore>, StoreError> {
        lock(&self.inner.opened).push(*scope);
        Ok(Arc::new(MemoryStore::new(self.clone(), *scope)))
    }
}
