// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Batched, breadth-first resolution of one nesting level.
//!
//! All records of an entity requested at a level are read with a single store call, whichever
//! parents they were reached from. Each relational selection then searches its related records
//! once for all parents, and the related records of every selection are resolved together at the
//! next level before being handed back to each parent.
//!
//! A field that cannot be resolved becomes `null` and its error is recorded in the context; the
//! other fields of the record still resolve.

use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use async_recursion::async_recursion;
use indexmap::{IndexMap, IndexSet};
use record_store::{AccessMode, Cardinality, Domain, EntityDescriptor, Operator, Record, RecordId};
use tracing::debug;

use common::value::Val;

use crate::{
    arguments::translate, context::ResolutionContext, document::SelectionNode,
    resolution_error::ResolutionError,
};

use super::redistribute::{ResolvedIndex, redistribute, related_ids, unresolved};

/// Records of an entity to resolve at a level, with the selections to resolve for them.
pub(crate) struct LevelRequest<'s> {
    pub entity: Arc<EntityDescriptor>,
    pub ids: Vec<RecordId>,
    pub selections: &'s [SelectionNode],
}

/// Resolved records of a request, in the order of the request's ids.
pub(crate) type ResolvedRecords = Vec<(RecordId, Val)>;

/// How a visible selection obtains its value.
enum FieldSource {
    Typename,
    Id,
    Stored,
    /// A relation without a sub-selection, returned as ids
    Unresolved(Cardinality),
    /// A relation with a sub-selection, not yet searched
    Nested {
        target: String,
        cardinality: Cardinality,
    },
    /// Index of the selection's resolver
    Related(usize),
    Failed,
}

struct Field<'s> {
    selection: &'s SelectionNode,
    source: FieldSource,
}

/// A relational selection of one request, resolved for all of the request's records at once.
struct RelationResolver<'s> {
    selection: &'s SelectionNode,
    cardinality: Cardinality,
    target: Arc<EntityDescriptor>,
    /// Related records that passed the selection's filter, in search order
    matched: Vec<RecordId>,
    by_rank: bool,
    index: ResolvedIndex,
    failed: bool,
}

/// Resolve `requests`, returning the records of each request in order.
///
/// A request fails as a whole only if reading its records fails. A request whose selections are
/// all hidden by the field allow-list (or that selects nothing) resolves to identifier-only
/// records.
#[async_recursion]
pub(crate) async fn resolve_level<'s>(
    ctx: &ResolutionContext,
    requests: Vec<LevelRequest<'s>>,
) -> Vec<Result<ResolvedRecords, ResolutionError>>
where
    's: 'async_recursion,
{
    let mut fields: Vec<Vec<Field<'s>>> = requests
        .iter()
        .map(|request| visible_fields(ctx, request))
        .collect();

    let mut by_entity: IndexMap<String, Vec<usize>> = IndexMap::new();
    for (request_index, request) in requests.iter().enumerate() {
        by_entity
            .entry(request.entity.collection.clone())
            .or_default()
            .push(request_index);
    }

    let mut reads: HashMap<String, Result<HashMap<RecordId, Record>, ResolutionError>> =
        HashMap::new();
    for (collection, members) in &by_entity {
        let entity = requests[members[0]].entity.clone();
        let members: Vec<(&LevelRequest, &[Field])> = members
            .iter()
            .map(|&request_index| (&requests[request_index], fields[request_index].as_slice()))
            .collect();
        reads.insert(collection.clone(), read_entity(ctx, &entity, &members).await);
    }

    let mut resolvers: Vec<RelationResolver<'s>> = vec![];
    for (request, fields) in requests.iter().zip(fields.iter_mut()) {
        let Some(Ok(records)) = reads.get(&request.entity.collection) else {
            continue;
        };

        for field in fields.iter_mut() {
            let (target, cardinality) = match &field.source {
                FieldSource::Nested {
                    target,
                    cardinality,
                } => (target.clone(), *cardinality),
                _ => continue,
            };

            field.source = match relation_resolver(
                ctx,
                request,
                records,
                field.selection,
                &target,
                cardinality,
            )
            .await
            {
                Ok(resolver) => {
                    resolvers.push(resolver);
                    FieldSource::Related(resolvers.len() - 1)
                }
                Err(e) => {
                    ctx.field_error(e);
                    FieldSource::Failed
                }
            };
        }
    }

    // Resolve the next level once, across all relational selections of every entity
    if !resolvers.is_empty() {
        let child_requests = resolvers
            .iter()
            .map(|resolver| {
                let selection: &'s SelectionNode = resolver.selection;
                LevelRequest {
                    entity: resolver.target.clone(),
                    ids: resolver.matched.clone(),
                    selections: &selection.selections,
                }
            })
            .collect();

        let resolved = resolve_level(ctx, child_requests).await;

        let mut reported = HashSet::new();
        for (resolver, records) in resolvers.iter_mut().zip(resolved) {
            match records {
                Ok(records) => {
                    resolver.index = records
                        .into_iter()
                        .enumerate()
                        .map(|(rank, (id, record))| (id, (rank, record)))
                        .collect();
                }
                Err(e) => {
                    // Requests of one target entity share a read; report its failure once
                    if reported.insert(resolver.target.collection.clone()) {
                        ctx.field_error(e);
                    }
                    resolver.failed = true;
                }
            }
        }
    }

    requests
        .iter()
        .zip(&fields)
        .map(|(request, fields)| -> Result<ResolvedRecords, ResolutionError> {
            if fields.is_empty() {
                return Ok(request
                    .ids
                    .iter()
                    .map(|id| (*id, identifier_only(*id)))
                    .collect());
            }

            let records = match reads.get(&request.entity.collection) {
                Some(Ok(records)) => records,
                Some(Err(e)) => return Err(e.clone()),
                None => return Ok(vec![]),
            };

            Ok(request
                .ids
                .iter()
                .filter_map(|id| {
                    let record = records.get(id)?;
                    Some((*id, build_object(&request.entity, *id, record, fields, &resolvers)))
                })
                .collect())
        })
        .collect()
}

/// The selections of `request` the caller may see, with the source of each value.
///
/// Selections naming no attribute of the entity are recorded as failed.
fn visible_fields<'s>(ctx: &ResolutionContext, request: &LevelRequest<'s>) -> Vec<Field<'s>> {
    let entity = &request.entity;
    let allowed = ctx.allowed_fields.get(&entity.collection);

    request
        .selections
        .iter()
        .filter(|selection| {
            selection.is_typename()
                || allowed.is_none_or(|allowed| allowed.contains(&selection.name))
        })
        .map(|selection| {
            let source = if selection.is_typename() {
                FieldSource::Typename
            } else if selection.name == "id" {
                FieldSource::Id
            } else {
                match entity.attribute(&selection.name) {
                    None => {
                        ctx.field_error(ResolutionError::UnknownField {
                            entity: entity.type_name.clone(),
                            field: selection.name.clone(),
                        });
                        FieldSource::Failed
                    }
                    Some(attribute) => match attribute.kind.relation() {
                        None => FieldSource::Stored,
                        Some((_, cardinality)) if selection.selections.is_empty() => {
                            FieldSource::Unresolved(cardinality)
                        }
                        Some((target, cardinality)) => FieldSource::Nested {
                            target: target.to_string(),
                            cardinality,
                        },
                    },
                }
            };
            Field { selection, source }
        })
        .collect()
}

/// Read the union of the requested attributes for the union of the requested records of one
/// entity.
async fn read_entity(
    ctx: &ResolutionContext,
    entity: &EntityDescriptor,
    members: &[(&LevelRequest<'_>, &[Field<'_>])],
) -> Result<HashMap<RecordId, Record>, ResolutionError> {
    let mut ids = IndexSet::new();
    let mut attributes = IndexSet::new();

    for (request, fields) in members {
        if fields.is_empty() {
            continue;
        }
        ids.extend(request.ids.iter().copied());
        attributes.extend(
            fields
                .iter()
                .filter(|field| {
                    matches!(
                        field.source,
                        FieldSource::Stored
                            | FieldSource::Unresolved(_)
                            | FieldSource::Nested { .. }
                    )
                })
                .map(|field| field.selection.name.clone()),
        );
    }

    if ids.is_empty() {
        return Ok(HashMap::new());
    }

    let ids: Vec<RecordId> = ids.into_iter().collect();
    let attributes: Vec<String> = attributes.into_iter().collect();
    debug!(entity = %entity.collection, records = ids.len(), fields = ?attributes, "Reading level");

    Ok(ctx
        .read(entity, &ids, &attributes)
        .await?
        .into_iter()
        .filter_map(|record| Some((record.get("id")?.as_i64()?, record)))
        .collect())
}

/// Search the related records of one relational selection for all records of `request`.
async fn relation_resolver<'s>(
    ctx: &ResolutionContext,
    request: &LevelRequest<'_>,
    records: &HashMap<RecordId, Record>,
    selection: &'s SelectionNode,
    target: &str,
    cardinality: Cardinality,
) -> Result<RelationResolver<'s>, ResolutionError> {
    let target = ctx.entities.by_collection(target).cloned().ok_or_else(|| {
        ResolutionError::Authorization {
            entity: target.to_string(),
            mode: AccessMode::Read,
        }
    })?;

    let child_ids: IndexSet<RecordId> = request
        .ids
        .iter()
        .filter_map(|id| records.get(id))
        .flat_map(|record| related_ids(record.get(&selection.name).unwrap_or(&Val::Null)))
        .collect();

    let arguments = translate(&selection.arguments, &ctx.variables)?;
    let by_rank = arguments.options.order.is_some();
    let matched = if child_ids.is_empty() {
        vec![]
    } else {
        let domain = Domain::and(
            arguments.domain,
            Domain::leaf("id", Operator::In, child_ids.into_iter().collect::<Vec<_>>()),
        );
        ctx.search(&target, domain, &arguments.options, AccessMode::Read)
            .await?
    };

    Ok(RelationResolver {
        selection,
        cardinality,
        target,
        matched,
        by_rank,
        index: ResolvedIndex::new(),
        failed: false,
    })
}

fn build_object(
    entity: &EntityDescriptor,
    id: RecordId,
    record: &Record,
    fields: &[Field],
    resolvers: &[RelationResolver],
) -> Val {
    let mut object = IndexMap::new();
    object.insert("id".to_string(), Val::from(id));

    for field in fields {
        let stored = || record.get(&field.selection.name).unwrap_or(&Val::Null);
        let value = match &field.source {
            FieldSource::Typename => Val::from(entity.type_name.as_str()),
            FieldSource::Id => Val::from(id),
            FieldSource::Stored => stored().clone(),
            FieldSource::Unresolved(cardinality) => unresolved(stored(), *cardinality),
            FieldSource::Related(resolver_index) => {
                let resolver = &resolvers[*resolver_index];
                if resolver.failed {
                    Val::Null
                } else {
                    redistribute(
                        &resolver.index,
                        stored(),
                        resolver.cardinality,
                        resolver.by_rank,
                    )
                }
            }
            FieldSource::Nested { .. } | FieldSource::Failed => Val::Null,
        };
        object.insert(field.selection.output_name().to_string(), value);
    }

    Val::Object(object)
}

fn identifier_only(id: RecordId) -> Val {
    Val::Object(IndexMap::from([("id".to_string(), Val::from(id))]))
}
