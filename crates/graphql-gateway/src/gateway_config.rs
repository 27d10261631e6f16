// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use common::{
    env::{EnvError, Environment, ProcessEnvironment},
    env_const::{
        DEFAULT_DATABASE, DEFAULT_TENANT_FIELD, enforce_content_type, get_database,
        get_tenant_field, persist_tenant_selection,
    },
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayConfig {
    /// Database selector passed to the caller registry on authentication
    pub database: String,
    /// Attribute that ties a record to a tenant
    pub tenant_field: String,
    /// Whether a tenant selector in the request becomes the caller's default tenant
    pub persist_tenant_selection: bool,
    pub enforce_content_type: bool,
}

impl GatewayConfig {
    /// Read the configuration from the process environment.
    pub fn from_system_env() -> Result<Self, EnvError> {
        Self::from_env(&ProcessEnvironment)
    }

    pub fn from_env(env: &dyn Environment) -> Result<Self, EnvError> {
        Ok(Self {
            database: get_database(env),
            tenant_field: get_tenant_field(env)?,
            persist_tenant_selection: persist_tenant_selection(env)?,
            enforce_content_type: enforce_content_type(env)?,
        })
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            database: DEFAULT_DATABASE.to_string(),
            tenant_field: DEFAULT_TENANT_FIELD.to_string(),
            persist_tenant_selection: false,
            enforce_content_type: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use common::{
        env::MapEnvironment,
        env_const::{
            RECORDQL_DATABASE, RECORDQL_ENFORCE_CONTENT_TYPE, RECORDQL_PERSIST_TENANT_SELECTION,
        },
    };

    #[test]
    fn defaults_match_empty_environment() {
        let config = GatewayConfig::from_env(&MapEnvironment::new()).unwrap();
        assert_eq!(config, GatewayConfig::default());
    }

    #[test]
    fn overrides() {
        let env = MapEnvironment::from([
            (RECORDQL_DATABASE, "erp"),
            (RECORDQL_PERSIST_TENANT_SELECTION, "yes"),
            (RECORDQL_ENFORCE_CONTENT_TYPE, "off"),
        ]);
        let config = GatewayConfig::from_env(&env).unwrap();

        assert_eq!(config.database, "erp");
        assert_eq!(config.tenant_field, "company_id");
        assert!(config.persist_tenant_selection);
        assert!(!config.enforce_content_type);
    }

    #[test]
    fn system_environment() {
        let config = GatewayConfig::from_system_env().unwrap();

        let database =
            std::env::var(RECORDQL_DATABASE).unwrap_or_else(|_| DEFAULT_DATABASE.to_string());
        assert_eq!(config.database, database);
    }

    #[test]
    fn invalid_flag() {
        let env = MapEnvironment::from([(RECORDQL_PERSIST_TENANT_SELECTION, "sometimes")]);
        assert!(GatewayConfig::from_env(&env).is_err());
    }
}
