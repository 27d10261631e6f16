// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Interfaces to the host platform that owns the records.
//!
//! The GraphQL layer never talks to storage directly. Everything it needs (model metadata,
//! permission discovery, caller authentication, and the scoped record store itself) is reached
//! through the traits in this crate, which the host implements.

mod caller;
mod domain;
mod entity;
mod error;
mod registry;
mod store;

#[cfg(any(test, feature = "test-support"))]
pub mod memory;

pub use caller::{Caller, CallerId, CallerRegistry, CallerScope, TenantId};
pub use domain::{Condition, Domain, Operator};
pub use entity::{
    AttributeDescriptor, AttributeKind, Cardinality, EntityDescriptor, ModelDefinition,
    entity_type_name,
};
pub use error::StoreError;
pub use registry::{AllowedFields, EntityRegistry};
pub use store::{AccessMode, Record, RecordId, RecordStore, SearchOptions, StoreProvider, Values};
