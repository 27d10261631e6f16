// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::sync::Arc;

use graphql_resolver::{Credentials, GraphQLResponse, GraphQLSystemResolver, OperationsPayload};
use record_store::{
    CallerId, CallerRegistry, CallerScope, EntityRegistry, StoreProvider, TenantId,
};
use tracing::{debug, instrument, warn};

use crate::{GatewayConfig, GatewayError};

pub const GRAPHQL_CONTENT_TYPE: &str = "application/graphql";

pub struct Gateway {
    callers: Arc<dyn CallerRegistry>,
    resolver: GraphQLSystemResolver,
    config: GatewayConfig,
}

impl Gateway {
    pub fn new(
        callers: Arc<dyn CallerRegistry>,
        resolver: GraphQLSystemResolver,
        config: GatewayConfig,
    ) -> Self {
        Self {
            callers,
            resolver,
            config,
        }
    }

    /// Build a gateway over a host that provides metadata, callers and record stores.
    pub fn for_host<H>(host: Arc<H>, config: GatewayConfig) -> Self
    where
        H: EntityRegistry + CallerRegistry + StoreProvider + 'static,
    {
        let resolver =
            GraphQLSystemResolver::new(host.clone(), host.clone(), &config.tenant_field);
        Self::new(host, resolver, config)
    }

    /// Handle a raw request.
    ///
    /// Credentials in the body take precedence over `session_caller`, the caller already
    /// authenticated by the host's session (if any).
    #[instrument(
        name = "Gateway::handle_request",
        skip(self, body)
        )]
    pub async fn handle_request(
        &self,
        session_caller: Option<CallerId>,
        content_type: Option<&str>,
        body: &[u8],
    ) -> GraphQLResponse {
        let payload = match self.decode(content_type, body) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(error = %e, "Rejected request");
                return GraphQLResponse::failure(e.user_error_message());
            }
        };

        match (payload.auth.clone(), session_caller) {
            (Some(credentials), _) => {
                let tenant_selector = credentials.company_id;
                self.authenticate_and_run(&credentials, tenant_selector, payload)
                    .await
            }
            (None, Some(caller)) => self
                .run_as(caller, None, payload)
                .await
                .unwrap_or_else(failed),
            (None, None) => failed(GatewayError::AuthenticationFailed),
        }
    }

    /// Authenticate with `credentials` and run `payload` as that caller.
    ///
    /// A `tenant_selector` replaces the caller's default tenant for this call; it must be one of
    /// the caller's tenants.
    #[instrument(
        name = "Gateway::authenticate_and_run",
        skip_all,
        fields(login = %credentials.login, ?tenant_selector)
        )]
    pub async fn authenticate_and_run(
        &self,
        credentials: &Credentials,
        tenant_selector: Option<TenantId>,
        payload: OperationsPayload,
    ) -> GraphQLResponse {
        let result = match self.authenticate(credentials).await {
            Ok(caller) => self.run_as(caller, tenant_selector, payload).await,
            Err(e) => Err(e),
        };
        result.unwrap_or_else(failed)
    }

    /// The schema of the entities visible to the caller behind `credentials`.
    pub async fn schema(&self, credentials: &Credentials) -> Result<String, GatewayError> {
        let caller = self.authenticate(credentials).await?;
        Ok(self.resolver.schema(caller).await?)
    }

    /// To be called by the host whenever models, access rights or rules change.
    pub async fn invalidate_metadata(&self) {
        self.resolver.invalidate().await
    }

    fn decode(
        &self,
        content_type: Option<&str>,
        body: &[u8],
    ) -> Result<OperationsPayload, GatewayError> {
        if self.config.enforce_content_type {
            let content_type = content_type.unwrap_or_default();
            // Ignore parameters such as `; charset=utf-8`
            let media_type = content_type.split(';').next().unwrap_or_default().trim();
            if !media_type.eq_ignore_ascii_case(GRAPHQL_CONTENT_TYPE) {
                return Err(GatewayError::InvalidContentType(content_type.to_string()));
            }
        }

        let json = serde_json::from_slice(body)?;
        Ok(OperationsPayload::from_json(json)?)
    }

    async fn authenticate(&self, credentials: &Credentials) -> Result<CallerId, GatewayError> {
        self.callers
            .authenticate(
                &self.config.database,
                &credentials.login,
                &credentials.password,
            )
            .await?
            .ok_or(GatewayError::AuthenticationFailed)
    }

    async fn run_as(
        &self,
        caller: CallerId,
        tenant_selector: Option<TenantId>,
        payload: OperationsPayload,
    ) -> Result<GraphQLResponse, GatewayError> {
        let caller = self.callers.caller(caller).await?;

        let tenant = match tenant_selector {
            Some(tenant) => {
                if !caller.may_use_tenant(tenant) {
                    return Err(GatewayError::TenantNotAllowed(tenant));
                }
                if self.config.persist_tenant_selection && caller.default_tenant != Some(tenant) {
                    debug!(caller = caller.id, tenant, "Persisting tenant selection");
                    self.callers.set_active_tenant(caller.id, tenant).await?;
                }
                Some(tenant)
            }
            None => caller.default_tenant,
        };

        let scope = CallerScope {
            caller: caller.id,
            tenant,
            privileged: caller.superuser,
        };
        let context_variables = self.callers.context_variables(caller.id).await?;

        Ok(self
            .resolver
            .resolve_operations(payload, scope, context_variables)
            .await)
    }
}

fn failed(error: GatewayError) -> GraphQLResponse {
    warn!(error = %error, "Request failed");
    GraphQLResponse::failure(error.user_error_message())
}
