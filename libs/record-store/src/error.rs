// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use thiserror::Error;

use crate::{AccessMode, CallerId};

#[derive(Error, Debug, Clone)]
pub enum StoreError {
    #[error("Unknown collection '{0}'")]
    UnknownCollection(String),

    #[error("Unknown attribute '{attribute}' on '{collection}'")]
    UnknownAttribute {
        collection: String,
        attribute: String,
    },

    #[error("Not authorized to {mode} '{collection}'")]
    AccessDenied {
        collection: String,
        mode: AccessMode,
    },

    /// A constraint violation reported by the backend; the message may span several lines.
    #[error("{0}")]
    Constraint(String),

    #[error("Unknown caller {0}")]
    UnknownCaller(CallerId),

    #[error("{0}")]
    Backend(String),
}

impl StoreError {
    pub fn is_constraint_violation(&self) -> bool {
        matches!(self, StoreError::Constraint(_))
    }
}
