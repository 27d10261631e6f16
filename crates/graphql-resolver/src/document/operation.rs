// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::collections::HashMap;

use async_graphql_parser::{
    Pos, Positioned,
    types::{
        Directive, DocumentOperations, ExecutableDocument, FragmentDefinition,
        OperationDefinition, OperationType, Selection, SelectionSet,
    },
};
use async_graphql_value::Name;
use tracing::{error, instrument};

use crate::coercion::{Variables, coerce};

use super::{DirectiveNode, DocumentError, SelectionNode};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    Query,
    Mutation,
}

#[derive(Debug)]
pub struct Operation {
    pub name: Option<String>,
    pub kind: OperationKind,
    /// Root fields, before directive pruning
    pub selections: Vec<SelectionNode>,
    /// Default values declared for the operation's variables
    pub variable_defaults: Variables,
}

/// Parse `query` and select the operation to execute.
///
/// With a single operation, or no `operation_name`, the first operation of the document is
/// selected. A name that matches no operation also falls back to the first one.
#[instrument(skip(query))]
pub fn parse_operation(
    query: &str,
    operation_name: Option<&str>,
) -> Result<Operation, DocumentError> {
    let document = parse_query(query)?;

    let (name, operation) = match document.operations {
        DocumentOperations::Single(operation) => (None, operation),
        DocumentOperations::Multiple(mut operations) => {
            let requested = operation_name
                .and_then(|name| operations.remove_entry(&Name::new(name)))
                .map(|(name, operation)| (Some(name.to_string()), operation));

            match requested {
                Some(requested) => requested,
                None => operations
                    .into_iter()
                    .min_by_key(|(_, operation)| (operation.pos.line, operation.pos.column))
                    .map(|(name, operation)| (Some(name.to_string()), operation))
                    .ok_or(DocumentError::NoOperationFound)?,
            }
        }
    };

    build_operation(name, operation, &document.fragments)
}

fn build_operation(
    name: Option<String>,
    operation: Positioned<OperationDefinition>,
    fragments: &HashMap<Name, Positioned<FragmentDefinition>>,
) -> Result<Operation, DocumentError> {
    let kind = match operation.node.ty {
        OperationType::Query => OperationKind::Query,
        OperationType::Mutation => OperationKind::Mutation,
        OperationType::Subscription => {
            return Err(DocumentError::SubscriptionNotSupported(operation.pos));
        }
    };

    let no_variables = Variables::new();
    let variable_defaults = operation
        .node
        .variable_definitions
        .iter()
        .filter_map(|definition| {
            let default = definition.node.default_value.as_ref()?;
            Some(
                coerce(&default.node.clone().into_value(), &no_variables)
                    .map(|value| (definition.node.name.node.to_string(), value)),
            )
        })
        .collect::<Result<Variables, _>>()?;

    let selections = flatten(
        &operation.node.selection_set,
        fragments,
        &[],
        &mut Vec::new(),
    )?;

    Ok(Operation {
        name,
        kind,
        selections,
        variable_defaults,
    })
}

/// Flatten a selection set into fields, inlining fragment spreads and inline fragments.
/// Directives of a fragment are appended to each field it contributes.
fn flatten(
    selection_set: &Positioned<SelectionSet>,
    fragments: &HashMap<Name, Positioned<FragmentDefinition>>,
    inherited: &[DirectiveNode],
    visiting: &mut Vec<Name>,
) -> Result<Vec<SelectionNode>, DocumentError> {
    let mut nodes = vec![];

    for selection in &selection_set.node.items {
        match &selection.node {
            Selection::Field(field) => {
                let mut directives = directive_nodes(&field.node.directives);
                directives.extend(inherited.iter().cloned());

                nodes.push(SelectionNode {
                    alias: field.node.alias.as_ref().map(|alias| alias.node.to_string()),
                    name: field.node.name.node.to_string(),
                    arguments: field
                        .node
                        .arguments
                        .iter()
                        .map(|(name, value)| (name.node.to_string(), value.node.clone()))
                        .collect(),
                    directives,
                    selections: flatten(&field.node.selection_set, fragments, &[], visiting)?,
                    pos: field.pos,
                });
            }
            Selection::FragmentSpread(spread) => {
                let fragment_name = &spread.node.fragment_name.node;
                let fragment = fragments.get(fragment_name).ok_or_else(|| {
                    DocumentError::FragmentDefinitionNotFound(fragment_name.to_string(), spread.pos)
                })?;
                if visiting.contains(fragment_name) {
                    return Err(DocumentError::FragmentCycle(
                        fragment_name.to_string(),
                        spread.pos,
                    ));
                }

                let mut directives = directive_nodes(&spread.node.directives);
                directives.extend(inherited.iter().cloned());

                visiting.push(fragment_name.clone());
                nodes.extend(flatten(
                    &fragment.node.selection_set,
                    fragments,
                    &directives,
                    visiting,
                )?);
                visiting.pop();
            }
            Selection::InlineFragment(inline) => {
                let mut directives = directive_nodes(&inline.node.directives);
                directives.extend(inherited.iter().cloned());

                nodes.extend(flatten(
                    &inline.node.selection_set,
                    fragments,
                    &directives,
                    visiting,
                )?);
            }
        }
    }

    Ok(nodes)
}

fn directive_nodes(directives: &[Positioned<Directive>]) -> Vec<DirectiveNode> {
    directives
        .iter()
        .map(|directive| DirectiveNode {
            name: directive.node.name.node.to_string(),
            arguments: directive
                .node
                .arguments
                .iter()
                .map(|(name, value)| (name.node.to_string(), value.node.clone()))
                .collect(),
            pos: directive.pos,
        })
        .collect()
}

#[instrument(name = "document::parse_query", skip(query))]
fn parse_query(query: &str) -> Result<ExecutableDocument, DocumentError> {
    async_graphql_parser::parse_query(query).map_err(|error| {
        error!(%error, "Failed to parse query");
        let (message, pos1, pos2) = match error {
            async_graphql_parser::Error::Syntax {
                message,
                start,
                end,
            } => {
                // Error::Syntax's message is formatted with newlines, escape them properly
                let message = message.escape_debug();
                (format!("Syntax error:\\n{message}"), start, end)
            }
            async_graphql_parser::Error::MultipleOperations {
                anonymous,
                operation,
            } => (
                "Multiple operations".to_string(),
                anonymous,
                Some(operation),
            ),
            async_graphql_parser::Error::OperationDuplicated {
                operation,
                first,
                second,
            } => (
                format!("Operation {operation} duplicated"),
                first,
                Some(second),
            ),
            async_graphql_parser::Error::FragmentDuplicated {
                fragment,
                first,
                second,
            } => (
                format!("Fragment {fragment} duplicated"),
                first,
                Some(second),
            ),
            async_graphql_parser::Error::MissingOperation => {
                ("Missing operation".to_string(), Pos::default(), None)
            }
            _ => ("Unknown error".to_string(), Pos::default(), None),
        };

        DocumentError::QueryParsingFailed(message, pos1, pos2)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(nodes: &[SelectionNode]) -> Vec<&str> {
        nodes.iter().map(|node| node.output_name()).collect()
    }

    #[test]
    fn anonymous_query() {
        let operation = parse_operation(
            r#"
            {
                ResPartner(limit: 2) {
                    id
                    name
                    company: company_id { name }
                }
            }
        "#,
            None,
        )
        .unwrap();

        assert_eq!(operation.kind, OperationKind::Query);
        assert_eq!(operation.name, None);

        let partner = &operation.selections[0];
        assert_eq!(partner.name, "ResPartner");
        assert_eq!(partner.arguments[0].0, "limit");
        assert_eq!(names(&partner.selections), vec!["id", "name", "company"]);
        assert_eq!(partner.selections[2].name, "company_id");
    }

    #[test]
    fn operation_selection_falls_back_to_first() {
        let query = r#"
            query Partners { ResPartner { id } }
            mutation Rename { ResPartner(id: 1, name: "Acme") { id } }
        "#;

        let selected = parse_operation(query, Some("Rename")).unwrap();
        assert_eq!(selected.kind, OperationKind::Mutation);
        assert_eq!(selected.name.as_deref(), Some("Rename"));

        let fallback = parse_operation(query, Some("Unknown")).unwrap();
        assert_eq!(fallback.name.as_deref(), Some("Partners"));

        let unnamed = parse_operation(query, None).unwrap();
        assert_eq!(unnamed.kind, OperationKind::Query);
    }

    #[test]
    fn fragments_are_flattened() {
        let operation = parse_operation(
            r#"
            query {
                ResPartner {
                    id
                    ...partnerInfo @include(if: $detailed)
                    ... on ResPartner { email }
                }
            }

            fragment partnerInfo on ResPartner {
                name
                phone
            }
        "#,
            None,
        )
        .unwrap();

        let partner = &operation.selections[0];
        assert_eq!(names(&partner.selections), vec!["id", "name", "phone", "email"]);
        assert_eq!(partner.selections[1].directives[0].name, "include");
        assert!(partner.selections[3].directives.is_empty());
    }

    #[test]
    fn missing_fragment_fails() {
        let result = parse_operation("{ ResPartner { ...unknown } }", None);
        assert!(matches!(
            result,
            Err(DocumentError::FragmentDefinitionNotFound(name, _)) if name == "unknown"
        ));
    }

    #[test]
    fn subscriptions_are_rejected() {
        let result = parse_operation("subscription { ResPartner { id } }", None);
        assert!(matches!(
            result,
            Err(DocumentError::SubscriptionNotSupported(_))
        ));
    }

    #[test]
    fn variable_defaults_are_coerced() {
        let operation = parse_operation(
            "query($limit: Int = 5, $name: String) { ResPartner(limit: $limit) { id } }",
            None,
        )
        .unwrap();

        assert_eq!(
            operation.variable_defaults.get("limit"),
            Some(&common::value::Val::from(5i64))
        );
        assert!(!operation.variable_defaults.contains_key("name"));
    }

    #[test]
    fn syntax_error() {
        let result = parse_operation("{ ResPartner { id ", None);
        assert!(matches!(
            result,
            Err(DocumentError::QueryParsingFailed(message, _, _)) if message.starts_with("Syntax error")
        ));
    }
}
