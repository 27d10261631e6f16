// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::collections::HashMap;

use record_store::{Cardinality, RecordId};

use common::value::Val;

/// Resolved records of one relational selection, by id, with their rank in the search result.
pub(crate) type ResolvedIndex = HashMap<RecordId, (usize, Val)>;

/// Build the value of a relational attribute for one parent from the records resolved for the
/// whole level.
///
/// `related` is the parent's unloaded relation value. A to-one relation yields the related
/// record, or null if unset or filtered out. A to-many relation yields the related records in the
/// parent's own id order, duplicates included, dropping filtered out ids; with `by_rank`, records
/// follow the order of the search instead.
pub(crate) fn redistribute(
    index: &ResolvedIndex,
    related: &Val,
    cardinality: Cardinality,
    by_rank: bool,
) -> Val {
    match cardinality {
        Cardinality::One => related_ids(related)
            .first()
            .and_then(|id| index.get(id))
            .map(|(_, record)| record.clone())
            .unwrap_or(Val::Null),
        Cardinality::Many => {
            let mut records: Vec<&(usize, Val)> = related_ids(related)
                .iter()
                .filter_map(|id| index.get(id))
                .collect();
            if by_rank {
                records.sort_by_key(|(rank, _)| *rank);
            }
            Val::List(records.into_iter().map(|(_, record)| record.clone()).collect())
        }
    }
}

/// The unloaded value of a relation when no sub-selection asks to resolve it.
pub(crate) fn unresolved(related: &Val, cardinality: Cardinality) -> Val {
    match cardinality {
        Cardinality::One => related_ids(related)
            .first()
            .map(|id| Val::from(*id))
            .unwrap_or(Val::Null),
        Cardinality::Many => Val::List(related_ids(related).into_iter().map(Val::from).collect()),
    }
}

/// Ids referenced by an unloaded relation value (an id, a list of ids, or null/false).
pub(crate) fn related_ids(related: &Val) -> Vec<RecordId> {
    match related {
        Val::List(values) => values.iter().filter_map(Val::as_i64).collect(),
        value => value.as_i64().into_iter().collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use indexmap::IndexMap;

    fn record(id: RecordId, name: &str) -> Val {
        Val::Object(IndexMap::from([
            ("id".to_string(), Val::from(id)),
            ("name".to_string(), Val::from(name)),
        ]))
    }

    fn index() -> ResolvedIndex {
        // Search returned 3 before 1, record 2 was filtered out
        HashMap::from([(3, (0, record(3, "c"))), (1, (1, record(1, "a")))])
    }

    #[test]
    fn to_many_keeps_parent_order_and_duplicates() {
        let related = Val::from(vec![1i64, 3, 2, 1]);
        assert_eq!(
            redistribute(&index(), &related, Cardinality::Many, false),
            Val::List(vec![record(1, "a"), record(3, "c"), record(1, "a")])
        );
    }

    #[test]
    fn to_many_by_rank() {
        let related = Val::from(vec![1i64, 3]);
        assert_eq!(
            redistribute(&index(), &related, Cardinality::Many, true),
            Val::List(vec![record(3, "c"), record(1, "a")])
        );
    }

    #[test]
    fn to_one() {
        let index = index();
        assert_eq!(
            redistribute(&index, &Val::from(3i64), Cardinality::One, false),
            record(3, "c")
        );
        assert_eq!(
            redistribute(&index, &Val::Bool(false), Cardinality::One, false),
            Val::Null
        );
        assert_eq!(
            redistribute(&index, &Val::from(2i64), Cardinality::One, false),
            Val::Null
        );
    }

    #[test]
    fn unresolved_values() {
        assert_eq!(unresolved(&Val::Bool(false), Cardinality::One), Val::Null);
        assert_eq!(unresolved(&Val::from(4i64), Cardinality::One), Val::from(4i64));
        assert_eq!(unresolved(&Val::Null, Cardinality::Many), Val::List(vec![]));
    }
}
