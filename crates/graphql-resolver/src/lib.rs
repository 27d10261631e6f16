// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! GraphQL query and mutation execution over a host record store.
//!
//! A request goes through the following steps:
//! - [`document`] parses the operation, flattens fragments and prunes `@skip`/`@include`
//! - [`access`] computes the entities the caller may see (cached in a [`access::PermissionCache`])
//! - [`arguments`] turns each field's arguments into a domain, search options and values
//! - the engine resolves every root field, fetching relational fields level by level in batches
//! - [`query_response`] carries the `{data, errors}` envelope back to the caller

pub mod access;
pub mod arguments;
pub mod coercion;
pub mod context;
pub mod document;
mod engine;
pub mod operation_payload;
pub mod query_response;
pub mod resolution_error;
pub mod schema;
pub mod system_resolver;

pub use coercion::Variables;
pub use operation_payload::{Credentials, OperationsPayload};
pub use query_response::GraphQLResponse;
pub use resolution_error::ResolutionError;
pub use system_resolver::GraphQLSystemResolver;
