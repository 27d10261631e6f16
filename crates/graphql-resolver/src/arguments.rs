// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Translation of field arguments into a search domain, search options and a value map.
//!
//! The same argument list serves as filter for queries and as assignments for mutations:
//! - a list value filters with `in`
//! - an enum literal filters with `=`
//! - a scalar `id` filters with `=`
//! - `offset`, `limit` and `order` become search options
//! - anything else is a value to create or write

use async_graphql_value::Value;
use record_store::{Domain, Operator, SearchOptions, Values};
use tracing::trace;

use common::value::{Val, ValNumber};

use crate::{
    coercion::{Variables, coerce},
    resolution_error::ResolutionError,
};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TranslatedArguments {
    pub domain: Domain,
    pub options: SearchOptions,
    pub values: Values,
}

pub fn translate(
    arguments: &[(String, Value)],
    variables: &Variables,
) -> Result<TranslatedArguments, ResolutionError> {
    let mut conditions = vec![];
    let mut options = SearchOptions::default();
    let mut values = Values::new();

    for (name, node) in arguments {
        let value = coerce(node, variables)?;

        if value.is_list() {
            conditions.push(Domain::leaf(name, Operator::In, value));
        } else if matches!(node, Value::Enum(_)) || name == "id" {
            conditions.push(Domain::leaf(name, Operator::Eq, value));
        } else {
            match name.as_str() {
                "offset" => options.offset = count_option(name, value)?,
                "limit" => options.limit = count_option(name, value)?,
                "order" => options.order = text_option(name, value)?,
                _ => {
                    values.insert(name.clone(), value);
                }
            }
        }
    }

    let translated = TranslatedArguments {
        domain: Domain::all(conditions),
        options,
        values,
    };
    trace!(domain = %translated.domain, ?translated.options, "Translated arguments");

    Ok(translated)
}

fn count_option(name: &str, value: Val) -> Result<Option<usize>, ResolutionError> {
    let invalid = |actual: &'static str| ResolutionError::InvalidArgument {
        name: name.to_string(),
        expected: "Int",
        actual,
    };

    match value {
        Val::Null => Ok(None),
        Val::Number(ValNumber::I64(n)) => usize::try_from(n)
            .map(Some)
            .map_err(|_| invalid("negative Int")),
        // Some clients send numeric options as strings
        Val::String(s) => s.trim().parse().map(Some).map_err(|_| invalid("String")),
        other => Err(invalid(other.type_name())),
    }
}

fn text_option(name: &str, value: Val) -> Result<Option<String>, ResolutionError> {
    match value {
        Val::Null => Ok(None),
        Val::String(s) => Ok(Some(s)),
        other => Err(ResolutionError::InvalidArgument {
            name: name.to_string(),
            expected: "String",
            actual: other.type_name(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::document::parse_operation;

    fn translate_root(
        query: &str,
        variables: Variables,
    ) -> Result<TranslatedArguments, ResolutionError> {
        let operation = parse_operation(query, None)?;
        translate(&operation.selections[0].arguments, &variables)
    }

    #[test]
    fn lists_and_enums_filter() {
        let translated = translate_root(
            r#"{ SaleOrder(id: [1, 2], state: sale, partner_id: $partners) { id } }"#,
            Variables::from([("partners".to_string(), Val::from(vec![7i64]))]),
        )
        .unwrap();

        assert_eq!(
            translated.domain.to_string(),
            r#"['&', '&', ('id', 'in', [1, 2]), ('state', '=', "sale"), ('partner_id', 'in', [7])]"#
        );
        assert!(translated.values.is_empty());
    }

    #[test]
    fn reserved_options() {
        let translated = translate_root(
            r#"{ ResPartner(offset: 10, limit: "5", order: "name desc") { id } }"#,
            Variables::new(),
        )
        .unwrap();

        assert!(translated.domain.is_empty());
        assert_eq!(
            translated.options,
            SearchOptions {
                offset: Some(10),
                limit: Some(5),
                order: Some("name desc".to_string()),
            }
        );
        assert!(translated.values.is_empty());
    }

    #[test]
    fn invalid_option_type() {
        let result = translate_root(r#"{ ResPartner(limit: true) { id } }"#, Variables::new());
        assert!(matches!(
            result,
            Err(ResolutionError::InvalidArgument { expected: "Int", actual: "Boolean", .. })
        ));
    }

    #[test]
    fn scalars_become_values() {
        let translated = translate_root(
            r#"mutation { ResPartner(id: 5, name: "Acme2", active: true) { id } }"#,
            Variables::new(),
        )
        .unwrap();

        assert_eq!(translated.domain, Domain::leaf("id", Operator::Eq, 5i64));
        assert_eq!(
            translated.values.keys().collect::<Vec<_>>(),
            vec!["name", "active"]
        );
    }

    #[test]
    fn unbound_variable_fails() {
        let result = translate_root("{ ResPartner(name: $name) { id } }", Variables::new());
        assert!(matches!(result, Err(ResolutionError::Coercion(_))));
    }
}
