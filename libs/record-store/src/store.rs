// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::{fmt::Display, sync::Arc};

use async_trait::async_trait;
use common::value::Val;
use indexmap::IndexMap;

use crate::{CallerScope, Domain, StoreError};

pub type RecordId = i64;

/// Attribute values of one record, keyed by attribute name. Always includes `id` when read.
pub type Record = IndexMap<String, Val>;

/// Values to assign on create or write.
pub type Values = IndexMap<String, Val>;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchOptions {
    pub offset: Option<usize>,
    pub limit: Option<usize>,
    /// Host ordering clause, such as `"name desc, id"`
    pub order: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessMode {
    Read,
    Write,
    Create,
    Unlink,
}

impl Display for AccessMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mode = match self {
            AccessMode::Read => "read",
            AccessMode::Write => "write",
            AccessMode::Create => "create",
            AccessMode::Unlink => "unlink",
        };
        f.write_str(mode)
    }
}

/// A record store bound to one caller scope (caller, active tenant) for the duration of a request.
///
/// Implementations are not expected to be reentrant: the resolver issues calls one at a time.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Ids of the records matching `domain`, in the store's default (or requested) order.
    async fn search(
        &self,
        collection: &str,
        domain: &Domain,
        options: &SearchOptions,
    ) -> Result<Vec<RecordId>, StoreError>;

    /// Read `fields` (and `id`) of the given records. Ids that no longer exist are skipped.
    ///
    /// Relation values are returned unloaded: a to-one relation as the related id (or null/false),
    /// a to-many relation as the list of related ids.
    async fn read(
        &self,
        collection: &str,
        ids: &[RecordId],
        fields: &[String],
    ) -> Result<Vec<Record>, StoreError>;

    async fn create(&self, collection: &str, values: &Values) -> Result<RecordId, StoreError>;

    async fn write(
        &self,
        collection: &str,
        ids: &[RecordId],
        values: &Values,
    ) -> Result<bool, StoreError>;

    /// Whether the bound caller holds a static permission for `mode` on the collection.
    async fn check_access(&self, collection: &str, mode: AccessMode) -> Result<bool, StoreError>;

    /// Evaluate row-level rules against the given records, failing with
    /// [`StoreError::AccessDenied`] if any of them is not accessible.
    async fn check_rule(
        &self,
        collection: &str,
        ids: &[RecordId],
        mode: AccessMode,
    ) -> Result<(), StoreError>;

    /// Discard the partial writes of the ambient transaction.
    async fn rollback(&self) -> Result<(), StoreError>;
}

/// Hands out a store bound to a caller scope. Each request gets its own store (and transaction).
#[async_trait]
pub trait StoreProvider: Send + Sync {
    async fn open(&self, scope: &CallerScope) -> Result<Arc<dyn RecordStore>, StoreError>;
}
