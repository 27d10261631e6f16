// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::sync::{Arc, Mutex, PoisonError};

use record_store::{
    AccessMode, AllowedFields, CallerScope, Domain, EntityDescriptor, Record, RecordId,
    RecordStore, SearchOptions, StoreError, Values,
};
use tracing::{debug, error, instrument, warn};

use common::value::Val;

use crate::{
    access::{EntityMapping, tenant_domain},
    coercion::Variables,
    resolution_error::ResolutionError,
};

/// State of one operation execution: who is calling, in which tenant, with which variables.
///
/// Every access to records goes through the context, which applies access checks and the tenant
/// restriction. Errors of nested fields are collected here so that sibling fields still resolve.
pub struct ResolutionContext {
    store: Arc<dyn RecordStore>,
    pub scope: CallerScope,
    pub entities: Arc<EntityMapping>,
    pub variables: Variables,
    pub allowed_fields: AllowedFields,
    pub tenant_field: String,
    field_errors: Mutex<Vec<ResolutionError>>,
}

impl ResolutionContext {
    pub fn new(
        store: Arc<dyn RecordStore>,
        scope: CallerScope,
        entities: Arc<EntityMapping>,
        tenant_field: &str,
    ) -> Self {
        Self {
            store,
            scope,
            entities,
            variables: Variables::new(),
            allowed_fields: AllowedFields::new(),
            tenant_field: tenant_field.to_string(),
            field_errors: Mutex::new(vec![]),
        }
    }

    pub fn with_variables(mut self, variables: Variables) -> Self {
        self.variables = variables;
        self
    }

    pub fn with_allowed_fields(mut self, allowed_fields: AllowedFields) -> Self {
        self.allowed_fields = allowed_fields;
        self
    }

    /// Record the failure of a nested field, whose value becomes `null`.
    pub(crate) fn field_error(&self, error: ResolutionError) {
        warn!(%error, "Field resolution failed");
        self.field_errors
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(error);
    }

    /// Drain the nested field errors recorded so far, in the order they occurred.
    pub fn take_field_errors(&self) -> Vec<ResolutionError> {
        std::mem::take(
            &mut *self
                .field_errors
                .lock()
                .unwrap_or_else(PoisonError::into_inner),
        )
    }

    /// Search `entity` restricted to the caller's tenant, then check row-level rules on the result.
    #[instrument(skip_all, fields(entity = %entity.collection, %mode))]
    pub(crate) async fn search(
        &self,
        entity: &EntityDescriptor,
        domain: Domain,
        options: &SearchOptions,
        mode: AccessMode,
    ) -> Result<Vec<RecordId>, ResolutionError> {
        self.ensure_access(entity, mode).await?;
        for condition in domain.conditions() {
            known_attribute(entity, &condition.attribute)?;
        }

        let domain = Domain::and(
            tenant_domain(entity, &self.tenant_field, &self.scope),
            domain,
        );
        debug!(%domain, ?options, "Searching");

        let ids = self
            .store
            .search(&entity.collection, &domain, options)
            .await
            .map_err(|e| store_failure(entity, e))?;
        if !ids.is_empty() {
            self.store
                .check_rule(&entity.collection, &ids, mode)
                .await?;
        }
        Ok(ids)
    }

    #[instrument(skip_all, fields(entity = %entity.collection, count = ids.len()))]
    pub(crate) async fn read(
        &self,
        entity: &EntityDescriptor,
        ids: &[RecordId],
        fields: &[String],
    ) -> Result<Vec<Record>, ResolutionError> {
        self.ensure_access(entity, AccessMode::Read).await?;
        self.store
            .read(&entity.collection, ids, fields)
            .await
            .map_err(|e| store_failure(entity, e))
    }

    #[instrument(skip_all, fields(entity = %entity.collection))]
    pub(crate) async fn create(
        &self,
        entity: &EntityDescriptor,
        values: Values,
    ) -> Result<RecordId, ResolutionError> {
        self.ensure_access(entity, AccessMode::Create).await?;
        for attribute in values.keys() {
            known_attribute(entity, attribute)?;
        }

        let values = self.scoped_values(entity, values, true);
        match self.store.create(&entity.collection, &values).await {
            Ok(id) => Ok(id),
            Err(e) => Err(self.failed_mutation(e).await),
        }
    }

    #[instrument(skip_all, fields(entity = %entity.collection, count = ids.len()))]
    pub(crate) async fn write(
        &self,
        entity: &EntityDescriptor,
        ids: &[RecordId],
        values: Values,
    ) -> Result<(), ResolutionError> {
        self.ensure_access(entity, AccessMode::Write).await?;
        for attribute in values.keys() {
            known_attribute(entity, attribute)?;
        }

        let values = self.scoped_values(entity, values, false);
        match self.store.write(&entity.collection, ids, &values).await {
            Ok(_) => Ok(()),
            Err(e) => Err(self.failed_mutation(e).await),
        }
    }

    async fn ensure_access(
        &self,
        entity: &EntityDescriptor,
        mode: AccessMode,
    ) -> Result<(), ResolutionError> {
        if self.store.check_access(&entity.collection, mode).await? {
            Ok(())
        } else {
            Err(ResolutionError::Authorization {
                entity: entity.collection.clone(),
                mode,
            })
        }
    }

    /// Constraint violations leave partial writes behind, so the store is rolled back.
    async fn failed_mutation(&self, error: StoreError) -> ResolutionError {
        if error.is_constraint_violation() {
            warn!(%error, "Constraint violation, rolling back");
            if let Err(rollback_error) = self.store.rollback().await {
                error!(%rollback_error, "Rollback failed");
            }
        }
        error.into()
    }

    /// Keep unprivileged callers within their tenant: a tenant value other than the active one
    /// is dropped, and new records default to the active tenant.
    fn scoped_values(
        &self,
        entity: &EntityDescriptor,
        mut values: Values,
        creating: bool,
    ) -> Values {
        let field = self.tenant_field.as_str();
        if !entity.has_attribute(field) {
            return values;
        }

        if !self.scope.privileged {
            let foreign = values
                .get(field)
                .is_some_and(|value| !value.is_unset() && value.as_i64() != self.scope.tenant);
            if foreign {
                warn!(entity = %entity.collection, "Ignoring tenant outside of the caller's scope");
                values.shift_remove(field);
            }
        }

        if creating && values.get(field).is_none_or(Val::is_unset) {
            if let Some(tenant) = self.scope.tenant {
                values.insert(field.to_string(), Val::from(tenant));
            }
        }

        values
    }
}

/// Report attributes the store does not know by the entity's type name.
fn store_failure(entity: &EntityDescriptor, error: StoreError) -> ResolutionError {
    match error {
        StoreError::UnknownAttribute { attribute, .. } => ResolutionError::UnknownField {
            entity: entity.type_name.clone(),
            field: attribute,
        },
        error => error.into(),
    }
}

fn known_attribute(entity: &EntityDescriptor, attribute: &str) -> Result<(), ResolutionError> {
    if entity.has_attribute(attribute) {
        Ok(())
    } else {
        Err(ResolutionError::UnknownField {
            entity: entity.type_name.clone(),
            field: attribute.to_string(),
        })
    }
}
