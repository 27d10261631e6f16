// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use async_trait::async_trait;
use common::value::Val;
use indexmap::IndexMap;

use crate::StoreError;

pub type CallerId = i64;
pub type TenantId = i64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub id: CallerId,
    pub login: String,
    pub superuser: bool,
    /// Tenants the caller may act in
    pub tenants: Vec<TenantId>,
    pub default_tenant: Option<TenantId>,
}

impl Caller {
    pub fn may_use_tenant(&self, tenant: TenantId) -> bool {
        self.superuser || self.tenants.contains(&tenant)
    }
}

/// Who is executing a request, in which tenant, and whether record scoping applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallerScope {
    pub caller: CallerId,
    pub tenant: Option<TenantId>,
    pub privileged: bool,
}

#[async_trait]
pub trait CallerRegistry: Send + Sync {
    /// Returns `None` if the login or secret does not match.
    async fn authenticate(
        &self,
        database: &str,
        login: &str,
        secret: &str,
    ) -> Result<Option<CallerId>, StoreError>;

    async fn caller(&self, id: CallerId) -> Result<Caller, StoreError>;

    /// Persist `tenant` as the caller's default tenant.
    async fn set_active_tenant(&self, id: CallerId, tenant: TenantId) -> Result<(), StoreError>;

    /// Host context (language, timezone, ...) exposed to operations as variables.
    async fn context_variables(&self, _id: CallerId) -> Result<IndexMap<String, Val>, StoreError> {
        Ok(IndexMap::new())
    }
}
