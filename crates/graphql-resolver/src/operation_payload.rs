// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use record_store::TenantId;
use serde::Deserialize;
use serde_json::{Map, Value};

/// Credentials carried in the request body, authenticating the request on its own.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Credentials {
    pub login: String,
    pub password: String,
    /// Tenant to act in for this request
    #[serde(default)]
    pub company_id: Option<TenantId>,
}

#[derive(Debug, Clone)]
pub struct OperationsPayload {
    pub operation_name: Option<String>,
    pub query: String,
    pub variables: Option<Map<String, Value>>,
    pub auth: Option<Credentials>,
}

impl OperationsPayload {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            operation_name: None,
            query: query.into(),
            variables: None,
            auth: None,
        }
    }

    pub fn with_variables(mut self, variables: Map<String, Value>) -> Self {
        self.variables = Some(variables);
        self
    }

    pub fn from_json(json: Value) -> Result<Self, serde_json::Error> {
        #[derive(Debug, Deserialize)]
        pub struct RawOperationsPayload {
            #[serde(rename = "operationName")]
            pub operation_name: Option<String>,
            pub query: String,
            pub variables: Option<Map<String, Value>>,
            pub auth: Option<Credentials>,
        }

        serde_json::from_value::<RawOperationsPayload>(json).map(|raw_payload| OperationsPayload {
            operation_name: raw_payload.operation_name,
            query: raw_payload.query,
            variables: raw_payload.variables,
            auth: raw_payload.auth,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_payload() {
        let payload = OperationsPayload::from_json(serde_json::json!({
            "query": "query Partners { ResPartner { id } }",
            "operationName": "Partners",
            "variables": {"limit": 5},
            "auth": {"login": "admin", "password": "admin", "company_id": 3}
        }))
        .unwrap();

        assert_eq!(payload.operation_name.as_deref(), Some("Partners"));
        assert_eq!(payload.variables.unwrap()["limit"], 5);
        assert_eq!(
            payload.auth,
            Some(Credentials {
                login: "admin".to_string(),
                password: "admin".to_string(),
                company_id: Some(3),
            })
        );
    }

    #[test]
    fn query_is_required() {
        assert!(OperationsPayload::from_json(serde_json::json!({"variables": {}})).is_err());

        let payload = OperationsPayload::from_json(serde_json::json!({"query": "{ ResPartner { id } }"}))
            .unwrap();
        assert!(payload.auth.is_none());
        assert!(payload.variables.is_none());
    }
}
