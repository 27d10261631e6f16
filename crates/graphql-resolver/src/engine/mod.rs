// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

mod level;
mod redistribute;

use std::sync::Arc;

use record_store::{AccessMode, EntityDescriptor};
use tracing::{instrument, trace};

use common::value::Val;

use crate::{
    arguments::translate, context::ResolutionContext, document::OperationKind,
    document::SelectionNode, resolution_error::ResolutionError,
};

use level::{LevelRequest, resolve_level};

/// Resolve a root field into the list of its records.
///
/// In a mutation, a field without filter arguments creates a record from its other arguments;
/// with filters, it writes those arguments to every matching record. In a query, the field
/// searches with its filters and any other argument is ignored.
///
/// Failures of nested fields are recorded in `ctx` and leave the root field's records intact.
#[instrument(skip_all, fields(field = selection.output_name(), entity = %entity.collection))]
pub(crate) async fn resolve_root_field(
    ctx: &ResolutionContext,
    kind: OperationKind,
    entity: &Arc<EntityDescriptor>,
    selection: &SelectionNode,
) -> Result<Val, ResolutionError> {
    let arguments = translate(&selection.arguments, &ctx.variables)?;

    let ids = match kind {
        OperationKind::Mutation if arguments.domain.is_empty() => {
            vec![ctx.create(entity, arguments.values).await?]
        }
        OperationKind::Mutation => {
            let ids = ctx
                .search(entity, arguments.domain, &arguments.options, AccessMode::Write)
                .await?;
            if !ids.is_empty() && !arguments.values.is_empty() {
                ctx.write(entity, &ids, arguments.values).await?;
            }
            ids
        }
        OperationKind::Query => {
            if !arguments.values.is_empty() {
                trace!(
                    arguments = ?arguments.values.keys().collect::<Vec<_>>(),
                    "Ignoring value arguments of a query"
                );
            }
            ctx.search(entity, arguments.domain, &arguments.options, AccessMode::Read)
                .await?
        }
    };

    let records = resolve_level(
        ctx,
        vec![LevelRequest {
            entity: entity.clone(),
            ids,
            selections: &selection.selections,
        }],
    )
    .await
    .pop()
    .unwrap_or_else(|| Ok(vec![]))?;

    Ok(Val::List(records.into_iter().map(|(_, record)| record).collect()))
}
