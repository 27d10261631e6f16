// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;

use crate::{AccessMode, CallerId, ModelDefinition, StoreError};

/// Field allow-lists per collection. A missing collection is unrestricted; an empty set allows
/// no field besides `id`.
pub type AllowedFields = HashMap<String, HashSet<String>>;

/// The host's model metadata and permission tables.
///
/// Reads through this trait are privileged: they serve permission discovery only and never
/// return record data.
#[async_trait]
pub trait EntityRegistry: Send + Sync {
    async fn models(&self) -> Result<Vec<ModelDefinition>, StoreError>;

    /// Whether the collection exists in the running host's type registry.
    fn is_registered(&self, collection: &str) -> bool;

    /// Static (model-level) permission of the caller.
    async fn has_access(
        &self,
        caller: CallerId,
        collection: &str,
        mode: AccessMode,
    ) -> Result<bool, StoreError>;

    /// Whether any row-level rule applicable to the caller could grant `mode` on the collection.
    async fn has_rules(
        &self,
        caller: CallerId,
        collection: &str,
        mode: AccessMode,
    ) -> Result<bool, StoreError>;

    async fn allowed_fields(&self, _caller: CallerId) -> Result<AllowedFields, StoreError> {
        Ok(AllowedFields::new())
    }
}
