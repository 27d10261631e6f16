// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use async_graphql_parser::Pos;
use thiserror::Error;

use crate::coercion::CoercionError;

/// Errors that fail the whole operation before any field is resolved.
#[derive(Error, Debug, Clone)]
pub enum DocumentError {
    #[error("{0}")]
    QueryParsingFailed(String, Pos, Option<Pos>),

    #[error("No operation found")]
    NoOperationFound,

    #[error("Subscriptions are not supported")]
    SubscriptionNotSupported(Pos),

    #[error("Fragment definition '{0}' not found")]
    FragmentDefinitionNotFound(String, Pos),

    #[error("Fragment '{0}' spreads itself")]
    FragmentCycle(String, Pos),

    #[error("Directive '@{0}' requires an 'if' argument")]
    MissingDirectiveCondition(String, Pos),

    #[error("Directive '@{directive}' expects a Boolean condition, got '{actual}'")]
    InvalidDirectiveCondition {
        directive: String,
        actual: &'static str,
        pos: Pos,
    },

    #[error("{0}")]
    Coercion(#[from] CoercionError),
}

impl DocumentError {
    pub fn position(&self) -> Option<Pos> {
        match self {
            DocumentError::QueryParsingFailed(_, pos, _)
            | DocumentError::SubscriptionNotSupported(pos)
            | DocumentError::FragmentDefinitionNotFound(_, pos)
            | DocumentError::FragmentCycle(_, pos)
            | DocumentError::MissingDirectiveCondition(_, pos)
            | DocumentError::InvalidDirectiveCondition { pos, .. } => Some(*pos),
            DocumentError::NoOperationFound | DocumentError::Coercion(_) => None,
        }
    }
}
