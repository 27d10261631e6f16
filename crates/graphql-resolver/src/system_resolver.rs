// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::sync::Arc;

use record_store::{AccessMode, CallerId, CallerScope, EntityRegistry, StoreProvider};
use serde_json::{Map, Value as JsonValue};
use tracing::{debug, instrument, warn};

use common::value::Val;

use crate::{
    access::PermissionCache,
    coercion::{Variables, variables_from_json},
    context::ResolutionContext,
    document::{OperationKind, SelectionNode, parse_operation, prune},
    engine::resolve_root_field,
    operation_payload::OperationsPayload,
    query_response::GraphQLResponse,
    resolution_error::ResolutionError,
    schema::derive_schema,
};

/// The top-level resolver.
///
/// Turns an operation payload into a response envelope for an already authenticated caller.
/// Failures of individual fields, at the root or nested, are reported next to the other fields'
/// data; failures of the operation as a whole (parsing, directives, metadata) produce a response without data.
pub struct GraphQLSystemResolver {
    registry: Arc<dyn EntityRegistry>,
    stores: Arc<dyn StoreProvider>,
    permissions: PermissionCache,
    tenant_field: String,
}

impl GraphQLSystemResolver {
    pub fn new(
        registry: Arc<dyn EntityRegistry>,
        stores: Arc<dyn StoreProvider>,
        tenant_field: &str,
    ) -> Self {
        Self {
            registry,
            stores,
            permissions: PermissionCache::new(),
            tenant_field: tenant_field.to_string(),
        }
    }

    /// Resolve the operation in `payload` on behalf of `scope`.
    ///
    /// `context_variables` are the caller's ambient variables; request variables take precedence
    /// over them, and they in turn take precedence over the operation's declared defaults.
    #[instrument(
        name = "SystemResolver::resolve_operations",
        skip_all,
        fields(caller = scope.caller, tenant = ?scope.tenant)
        )]
    pub async fn resolve_operations(
        &self,
        payload: OperationsPayload,
        scope: CallerScope,
        context_variables: Variables,
    ) -> GraphQLResponse {
        match self
            .resolve_fields(payload, scope, context_variables)
            .await
        {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "Operation failed");
                GraphQLResponse::failure(e.user_error_message())
            }
        }
    }

    /// The schema of the entities `caller` may read.
    pub async fn schema(&self, caller: CallerId) -> Result<String, ResolutionError> {
        let entities = self
            .permissions
            .allowed_entities(self.registry.as_ref(), caller, AccessMode::Read)
            .await?;
        let allowed_fields = self.registry.allowed_fields(caller).await?;

        Ok(derive_schema(&entities, &allowed_fields))
    }

    /// Forget cached model metadata and allowed entities.
    pub async fn invalidate(&self) {
        self.permissions.invalidate().await
    }

    async fn resolve_fields(
        &self,
        payload: OperationsPayload,
        scope: CallerScope,
        context_variables: Variables,
    ) -> Result<GraphQLResponse, ResolutionError> {
        let operation = parse_operation(&payload.query, payload.operation_name.as_deref())?;

        let mut variables = operation.variable_defaults;
        variables.extend(context_variables);
        variables.extend(variables_from_json(payload.variables));

        let selections = prune(operation.selections, &variables)?;

        let entities = self
            .permissions
            .allowed_entities(self.registry.as_ref(), scope.caller, AccessMode::Read)
            .await?;
        let allowed_fields = self.registry.allowed_fields(scope.caller).await?;
        let store = self.stores.open(&scope).await?;

        let ctx = ResolutionContext::new(store, scope, entities, &self.tenant_field)
            .with_variables(variables)
            .with_allowed_fields(allowed_fields);

        debug!(
            kind = ?operation.kind,
            name = ?operation.name,
            fields = selections.len(),
            "Resolving operation"
        );

        let mut data = Map::new();
        let mut errors = vec![];
        for selection in &selections {
            let output_name = selection.output_name().to_string();
            match self.resolve_root(&ctx, operation.kind, selection).await {
                Ok(value) => {
                    data.insert(output_name, value.into());
                }
                Err(e) => {
                    warn!(field = %output_name, error = %e, "Field resolution failed");
                    errors.push(e.user_error_message());
                    data.insert(output_name, JsonValue::Null);
                }
            }
            errors.extend(
                ctx.take_field_errors()
                    .iter()
                    .map(ResolutionError::user_error_message),
            );
        }

        Ok(GraphQLResponse::new(data, errors))
    }

    async fn resolve_root(
        &self,
        ctx: &ResolutionContext,
        kind: OperationKind,
        selection: &SelectionNode,
    ) -> Result<Val, ResolutionError> {
        if selection.is_typename() {
            return Ok(Val::from(match kind {
                OperationKind::Query => "Query",
                OperationKind::Mutation => "Mutation",
            }));
        }

        match ctx.entities.get(&selection.name).cloned() {
            Some(entity) => resolve_root_field(ctx, kind, &entity, selection).await,
            None => {
                // Known to the host but not exposed to this caller
                let collection = self
                    .permissions
                    .collection_of(self.registry.as_ref(), &selection.name)
                    .await?;
                Err(match collection {
                    Some(collection) => ResolutionError::Authorization {
                        entity: collection,
                        mode: AccessMode::Read,
                    },
                    None => ResolutionError::UnknownEntity(selection.name.clone()),
                })
            }
        }
    }
}
