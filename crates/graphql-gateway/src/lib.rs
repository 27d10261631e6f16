// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! The entry point for GraphQL requests: decodes the request, establishes who is calling and in
//! which tenant, and hands the operation to the resolver.
//!
//! Every failure, including an authentication failure, comes back as a `{data, errors}` envelope.

mod gateway;
mod gateway_config;
mod gateway_error;

pub use gateway::{GRAPHQL_CONTENT_TYPE, Gateway};
pub use gateway_config::GatewayConfig;
pub use gateway_error::GatewayError;
