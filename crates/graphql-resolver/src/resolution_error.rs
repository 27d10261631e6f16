// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use record_store::{AccessMode, StoreError};
use thiserror::Error;
use tracing::error;

use crate::{coercion::CoercionError, document::DocumentError};

#[derive(Error, Debug, Clone)]
pub enum ResolutionError {
    #[error("{0}")]
    Document(#[from] DocumentError),

    #[error("{0}")]
    Coercion(#[from] CoercionError),

    #[error("Argument '{name}' is not of a valid type. Expected '{expected}', got '{actual}'")]
    InvalidArgument {
        name: String,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("Unknown entity '{0}'")]
    UnknownEntity(String),

    #[error("Field '{field}' is not valid for type '{entity}'")]
    UnknownField { entity: String, field: String },

    #[error("Not authorized to {mode} '{entity}'")]
    Authorization { entity: String, mode: AccessMode },

    /// A constraint violation, reduced to the first line of the backend's message.
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Store(StoreError),
}

impl ResolutionError {
    /// Message that should be emitted when the error is returned to the user.
    pub fn user_error_message(&self) -> String {
        match self {
            // Do not reveal the underlying store error as it may expose sensitive details
            ResolutionError::Store(e) => {
                error!("Store operation failed: {:?}", e);
                "Operation failed".to_string()
            }
            _ => self.to_string(),
        }
    }
}

impl From<StoreError> for ResolutionError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::UnknownCollection(collection) => ResolutionError::UnknownEntity(collection),
            StoreError::UnknownAttribute {
                collection,
                attribute,
            } => ResolutionError::UnknownField {
                entity: collection,
                field: attribute,
            },
            StoreError::AccessDenied { collection, mode } => ResolutionError::Authorization {
                entity: collection,
                mode,
            },
            StoreError::Constraint(message) => {
                ResolutionError::Validation(message.lines().next().unwrap_or_default().to_string())
            }
            _ => ResolutionError::Store(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constraint_keeps_first_line() {
        let error = ResolutionError::from(StoreError::Constraint(
            "null value in column \"name\" violates not-null constraint\nDETAIL:  Failing row contains (7, null)."
                .to_string(),
        ));
        assert_eq!(
            error.user_error_message(),
            "null value in column \"name\" violates not-null constraint"
        );
    }

    #[test]
    fn backend_errors_are_hidden() {
        let error = ResolutionError::from(StoreError::Backend(
            "connection to 10.0.0.3 refused".to_string(),
        ));
        assert_eq!(error.user_error_message(), "Operation failed");

        let error = ResolutionError::from(StoreError::AccessDenied {
            collection: "res.partner".to_string(),
            mode: AccessMode::Write,
        });
        assert_eq!(
            error.user_error_message(),
            "Not authorized to write 'res.partner'"
        );
    }
}
