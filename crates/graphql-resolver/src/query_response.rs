// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use serde::Serialize;
use serde_json::{Map, Value as JsonValue};

/// The `{data, errors}` envelope returned for every request, including failed ones.
///
/// `errors` is always a list of messages. `data` is `null` when the operation could not run at
/// all; otherwise it holds every root field, with `null` for the fields that failed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphQLResponse {
    pub data: Option<Map<String, JsonValue>>,
    pub errors: Vec<String>,
}

impl GraphQLResponse {
    pub fn new(data: Map<String, JsonValue>, errors: Vec<String>) -> Self {
        Self {
            data: Some(data),
            errors,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            data: None,
            errors: vec![message.into()],
        }
    }

    pub fn is_success(&self) -> bool {
        self.data.is_some() && self.errors.is_empty()
    }

    pub fn to_json(&self) -> JsonValue {
        serde_json::json!({
            "data": self.data,
            "errors": self.errors,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_has_null_data() {
        let response = GraphQLResponse::failure("Access denied");
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            serde_json::json!({"data": null, "errors": ["Access denied"]})
        );
        assert_eq!(response.to_json(), serde_json::to_value(&response).unwrap());
    }

    #[test]
    fn partial_data_keeps_field_order() {
        let mut data = Map::new();
        data.insert("b".to_string(), JsonValue::Null);
        data.insert("a".to_string(), serde_json::json!([{"id": 1}]));

        let response = GraphQLResponse::new(data, vec!["Unknown entity 'Foo'".to_string()]);
        assert_eq!(
            serde_json::to_string(&response).unwrap(),
            r#"{"data":{"b":null,"a":[{"id":1}]},"errors":["Unknown entity 'Foo'"]}"#
        );
        assert!(!response.is_success());
    }
}
