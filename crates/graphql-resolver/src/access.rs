// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Which entities a caller may see, and the tenant restriction applied to their records.

use std::{collections::HashMap, sync::Arc};

use indexmap::IndexMap;
use record_store::{
    AccessMode, CallerId, CallerScope, Domain, EntityDescriptor, EntityRegistry, ModelDefinition,
    Operator, StoreError, TenantId, entity_type_name,
};
use tokio::sync::RwLock;
use tracing::{debug, instrument};

/// Exposed entities, by their external type name.
#[derive(Debug, Default)]
pub struct EntityMapping {
    by_name: IndexMap<String, Arc<EntityDescriptor>>,
    name_by_collection: HashMap<String, String>,
}

impl EntityMapping {
    /// Collections whose type name is already taken by an earlier entity are left out.
    pub fn new(entities: impl IntoIterator<Item = EntityDescriptor>) -> Self {
        let mut mapping = Self::default();
        for entity in entities {
            if let Some(existing) = mapping.by_name.get(&entity.type_name) {
                debug!(
                    collection = %entity.collection,
                    type_name = %entity.type_name,
                    taken_by = %existing.collection,
                    "Skipping model with a duplicate type name"
                );
                continue;
            }
            mapping
                .name_by_collection
                .insert(entity.collection.clone(), entity.type_name.clone());
            mapping
                .by_name
                .insert(entity.type_name.clone(), Arc::new(entity));
        }
        mapping
    }

    pub fn get(&self, type_name: &str) -> Option<&Arc<EntityDescriptor>> {
        self.by_name.get(type_name)
    }

    pub fn by_collection(&self, collection: &str) -> Option<&Arc<EntityDescriptor>> {
        self.name_by_collection
            .get(collection)
            .and_then(|name| self.by_name.get(name))
    }

    pub fn type_name_of(&self, collection: &str) -> Option<&str> {
        self.name_by_collection.get(collection).map(String::as_str)
    }

    pub fn entities(&self) -> impl Iterator<Item = &EntityDescriptor> {
        self.by_name.values().map(|entity| entity.as_ref())
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

/// Compute the entities exposed to `caller` for `mode`.
///
/// An entity is exposed if it is not transient, is known to the running host, and either a
/// static permission grants `mode` or some row-level rule could grant it. Rows are filtered later,
/// through the search domain.
#[instrument(skip(registry, models))]
pub async fn allowed_entities(
    registry: &dyn EntityRegistry,
    models: &[ModelDefinition],
    caller: CallerId,
    mode: AccessMode,
) -> Result<EntityMapping, StoreError> {
    let mut entities = vec![];

    for model in models {
        if model.transient || !registry.is_registered(&model.collection) {
            continue;
        }

        let allowed = registry.has_access(caller, &model.collection, mode).await?
            || registry.has_rules(caller, &model.collection, mode).await?;
        if !allowed {
            continue;
        }

        match EntityDescriptor::from_model(model) {
            Some(entity) => entities.push(entity),
            None => {
                debug!(collection = %model.collection, "Skipping model without a valid type name")
            }
        }
    }

    Ok(EntityMapping::new(entities))
}

/// Process-wide cache of model metadata and of the entities allowed per caller and access mode.
///
/// Only metadata is cached, never record data. The host must call [`PermissionCache::invalidate`]
/// whenever models, access rights or rules change.
#[derive(Default)]
pub struct PermissionCache {
    models: RwLock<Option<Arc<Vec<ModelDefinition>>>>,
    allowed: RwLock<HashMap<(CallerId, AccessMode), Arc<EntityMapping>>>,
}

impl PermissionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn models(
        &self,
        registry: &dyn EntityRegistry,
    ) -> Result<Arc<Vec<ModelDefinition>>, StoreError> {
        if let Some(models) = self.models.read().await.as_ref() {
            return Ok(models.clone());
        }

        let mut cached = self.models.write().await;
        match cached.as_ref() {
            Some(models) => Ok(models.clone()),
            None => {
                let models = Arc::new(registry.models().await?);
                *cached = Some(models.clone());
                Ok(models)
            }
        }
    }

    pub async fn allowed_entities(
        &self,
        registry: &dyn EntityRegistry,
        caller: CallerId,
        mode: AccessMode,
    ) -> Result<Arc<EntityMapping>, StoreError> {
        if let Some(mapping) = self.allowed.read().await.get(&(caller, mode)) {
            return Ok(mapping.clone());
        }

        let models = self.models(registry).await?;
        let mapping = Arc::new(allowed_entities(registry, &models, caller, mode).await?);

        self.allowed
            .write()
            .await
            .insert((caller, mode), mapping.clone());
        Ok(mapping)
    }

    /// The collection behind `type_name`, whether or not any caller may access it.
    pub async fn collection_of(
        &self,
        registry: &dyn EntityRegistry,
        type_name: &str,
    ) -> Result<Option<String>, StoreError> {
        let models = self.models(registry).await?;
        Ok(models
            .iter()
            .find(|model| entity_type_name(&model.collection).as_deref() == Some(type_name))
            .map(|model| model.collection.clone()))
    }

    pub async fn invalidate(&self) {
        *self.models.write().await = None;
        self.allowed.write().await.clear();
        debug!("Permission cache invalidated");
    }
}

/// Restrict records of `entity` to the active tenant, or to records without a tenant.
///
/// Privileged callers and entities without the tenant attribute are not restricted. Without an
/// active tenant, only records without a tenant match.
pub fn tenant_domain(
    entity: &EntityDescriptor,
    tenant_field: &str,
    scope: &CallerScope,
) -> Domain {
    if scope.privileged || !entity.has_attribute(tenant_field) {
        return Domain::True;
    }

    let tenants: Vec<TenantId> = scope.tenant.into_iter().collect();
    Domain::or(
        Domain::leaf(tenant_field, Operator::In, tenants),
        Domain::leaf(tenant_field, Operator::Eq, false),
    )
}
