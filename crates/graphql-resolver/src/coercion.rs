// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Conversion of GraphQL literal and variable nodes into [`Val`]s.

use async_graphql_value::Value;
use indexmap::IndexMap;
use thiserror::Error;

use common::value::{Val, ValNumber};

/// Variable bindings of one operation, by name (without the `$`).
pub type Variables = IndexMap<String, Val>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoercionError {
    #[error("Variable '{0}' not found")]
    UnboundVariable(String),

    #[error("Unsupported literal of kind '{0}'")]
    UnsupportedLiteral(&'static str),
}

/// Coerce an argument node. Variables resolve against `variables`; list and object literals
/// recurse; enum literals become their name as a string.
pub fn coerce(value: &Value, variables: &Variables) -> Result<Val, CoercionError> {
    match value {
        Value::Variable(name) => variables
            .get(name.as_str())
            .cloned()
            .ok_or_else(|| CoercionError::UnboundVariable(name.to_string())),
        Value::Null => Ok(Val::Null),
        Value::Number(number) => match number.as_i64() {
            Some(n) => Ok(Val::Number(ValNumber::I64(n))),
            None => number
                .as_f64()
                .map(|n| Val::Number(ValNumber::F64(n)))
                .ok_or(CoercionError::UnsupportedLiteral("Number")),
        },
        Value::String(s) => Ok(Val::String(s.clone())),
        Value::Boolean(b) => Ok(Val::Bool(*b)),
        Value::Enum(name) => Ok(Val::String(name.to_string())),
        Value::List(values) => values
            .iter()
            .map(|value| coerce(value, variables))
            .collect::<Result<Vec<_>, _>>()
            .map(Val::List),
        Value::Object(fields) => fields
            .iter()
            .map(|(name, value)| Ok((name.to_string(), coerce(value, variables)?)))
            .collect::<Result<IndexMap<_, _>, CoercionError>>()
            .map(Val::Object),
        Value::Binary(_) => Err(CoercionError::UnsupportedLiteral("Binary")),
    }
}

/// Bind request variables (as received in the JSON payload) to [`Val`]s.
pub fn variables_from_json(
    variables: Option<serde_json::Map<String, serde_json::Value>>,
) -> Variables {
    variables
        .unwrap_or_default()
        .into_iter()
        .map(|(name, value)| (name, Val::from(value)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    use async_graphql_value::{Name, Number};

    fn variables() -> Variables {
        IndexMap::from([("company".to_string(), Val::from(3i64))])
    }

    #[test]
    fn numbers_become_native() {
        let vars = variables();
        assert_eq!(
            coerce(&Value::Number(Number::from(42)), &vars),
            Ok(Val::from(42i64))
        );
        assert_eq!(
            coerce(&Value::Number(Number::from_f64(2.5).unwrap()), &vars),
            Ok(Val::from(2.5))
        );
    }

    #[test]
    fn variables_resolve() {
        let vars = variables();
        assert_eq!(
            coerce(&Value::Variable(Name::new("company")), &vars),
            Ok(Val::from(3i64))
        );
        assert_eq!(
            coerce(&Value::Variable(Name::new("missing")), &vars),
            Err(CoercionError::UnboundVariable("missing".to_string()))
        );
    }

    #[test]
    fn composite_literals_recurse() {
        let vars = variables();
        let list = Value::List(vec![
            Value::Variable(Name::new("company")),
            Value::Enum(Name::new("draft")),
            Value::Boolean(false),
        ]);
        assert_eq!(
            coerce(&list, &vars),
            Ok(Val::List(vec![
                Val::from(3i64),
                Val::from("draft"),
                Val::Bool(false)
            ]))
        );

        let object = Value::Object(IndexMap::from([(
            Name::new("lang"),
            Value::String("en_US".to_string()),
        )]));
        assert_eq!(
            coerce(&object, &vars),
            Ok(Val::Object(IndexMap::from([(
                "lang".to_string(),
                Val::from("en_US")
            )])))
        );
    }

    #[test]
    fn binary_is_unsupported() {
        assert_eq!(
            coerce(&Value::Binary(Default::default()), &variables()),
            Err(CoercionError::UnsupportedLiteral("Binary"))
        );
    }
}
