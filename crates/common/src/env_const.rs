// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use crate::env::{EnvError, Environment};

pub const RECORDQL_LOG: &str = "RECORDQL_LOG";

pub const RECORDQL_DATABASE: &str = "RECORDQL_DATABASE";
pub const RECORDQL_TENANT_FIELD: &str = "RECORDQL_TENANT_FIELD";
pub const RECORDQL_PERSIST_TENANT_SELECTION: &str = "RECORDQL_PERSIST_TENANT_SELECTION";
pub const RECORDQL_ENFORCE_CONTENT_TYPE: &str = "RECORDQL_ENFORCE_CONTENT_TYPE";

pub const DEFAULT_DATABASE: &str = "default";
pub const DEFAULT_TENANT_FIELD: &str = "company_id";

pub fn get_database(env: &dyn Environment) -> String {
    env.get_or(RECORDQL_DATABASE, DEFAULT_DATABASE)
}

pub fn get_tenant_field(env: &dyn Environment) -> Result<String, EnvError> {
    let field = env.get_or(RECORDQL_TENANT_FIELD, DEFAULT_TENANT_FIELD);

    if field.is_empty() || !field.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(EnvError::InvalidValue {
            key: RECORDQL_TENANT_FIELD,
            value: field,
            reason: "must be a non-empty attribute name",
        });
    }

    Ok(field)
}

/// Whether a tenant selector in the request also becomes the caller's stored default tenant.
pub fn persist_tenant_selection(env: &dyn Environment) -> Result<bool, EnvError> {
    env.flag(RECORDQL_PERSIST_TENANT_SELECTION, false)
}

pub fn enforce_content_type(env: &dyn Environment) -> Result<bool, EnvError> {
    env.flag(RECORDQL_ENFORCE_CONTENT_TYPE, true)
}
