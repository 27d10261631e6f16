// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use graphql_resolver::ResolutionError;
use record_store::{StoreError, TenantId};
use thiserror::Error;
use tracing::error;

#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Access denied")]
    AuthenticationFailed,

    #[error("Tenant {0} is not available to the caller")]
    TenantNotAllowed(TenantId),

    #[error("Invalid Content-Type '{0}'. Use application/graphql.")]
    InvalidContentType(String),

    #[error("Invalid request body: {0}")]
    InvalidBodyJson(#[from] serde_json::Error),

    #[error("{0}")]
    Resolution(#[from] ResolutionError),

    #[error("{0}")]
    Store(#[from] StoreError),
}

impl GatewayError {
    /// Message that should be emitted when the error is returned to the user.
    pub fn user_error_message(&self) -> String {
        match self {
            // A tenant the caller may not use fails like bad credentials
            GatewayError::TenantNotAllowed(_) => GatewayError::AuthenticationFailed.to_string(),
            GatewayError::Resolution(e) => e.user_error_message(),
            GatewayError::Store(e) => {
                error!("Caller registry failed: {:?}", e);
                "Operation failed".to_string()
            }
            _ => self.to_string(),
        }
    }
}
