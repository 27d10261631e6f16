// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::cmp::Ordering;

use common::value::Val;

use crate::{Domain, Operator, Record, StoreError};

/// Evaluate `domain` against a stored record.
pub(super) fn matches(domain: &Domain, record: &Record) -> Result<bool, StoreError> {
    Ok(match domain {
        Domain::True => true,
        Domain::False => false,
        Domain::Leaf(condition) => {
            let value = record.get(&condition.attribute).unwrap_or(&Val::Null);
            let expected = &condition.value;

            match condition.operator {
                Operator::Eq => equals(value, expected),
                Operator::Neq => !equals(value, expected),
                Operator::In => one_of(value, expected),
                Operator::NotIn => !one_of(value, expected),
                Operator::Lt => value.partial_cmp(expected) == Some(Ordering::Less),
                Operator::Lte => matches!(
                    value.partial_cmp(expected),
                    Some(Ordering::Less | Ordering::Equal)
                ),
                Operator::Gt => value.partial_cmp(expected) == Some(Ordering::Greater),
                Operator::Gte => matches!(
                    value.partial_cmp(expected),
                    Some(Ordering::Greater | Ordering::Equal)
                ),
                Operator::Like => contains(value, expected, false),
                Operator::ILike => contains(value, expected, true),
            }
        }
        Domain::And(lhs, rhs) => matches(lhs, record)? && matches(rhs, record)?,
        Domain::Or(lhs, rhs) => matches(lhs, record)? || matches(rhs, record)?,
        Domain::Not(underlying) => !matches(underlying, record)?,
    })
}

fn equals(value: &Val, expected: &Val) -> bool {
    match value {
        _ if expected.is_unset() => {
            value.is_unset() || matches!(value, Val::List(items) if items.is_empty())
        }
        // A to-many relation matches when any related id does
        Val::List(items) => items.contains(expected),
        _ => value == expected,
    }
}

fn one_of(value: &Val, expected: &Val) -> bool {
    match expected {
        Val::List(candidates) => candidates
            .iter()
            .any(|candidate| equals(value, candidate)),
        _ => equals(value, expected),
    }
}

fn contains(value: &Val, pattern: &Val, case_insensitive: bool) -> bool {
    match (value, pattern) {
        (Val::String(value), Val::String(pattern)) => {
            let pattern = pattern.trim_matches('%');
            if case_insensitive {
                value.to_lowercase().contains(&pattern.to_lowercase())
            } else {
                value.contains(pattern)
            }
        }
        _ => false,
    }
}

/// Parse an ordering such as `"name desc, id"` into `(attribute, descending)` pairs.
pub(super) fn parse_order(order: &str) -> Vec<(String, bool)> {
    order
        .split(',')
        .filter_map(|term| {
            let mut parts = term.split_whitespace();
            let attribute = parts.next()?;
            let descending = parts
                .next()
                .is_some_and(|direction| direction.eq_ignore_ascii_case("desc"));
            Some((attribute.to_string(), descending))
        })
        .collect()
}

/// Compare two records by the ordering terms, with nulls first and `id` as the final tie breaker.
pub(super) fn compare(left: &Record, right: &Record, order: &[(String, bool)]) -> Ordering {
    let value = |record: &Record, attribute: &str| record.get(attribute).cloned().unwrap_or(Val::Null);

    order
        .iter()
        .chain(std::iter::once(&("id".to_string(), false)))
        .map(|(attribute, descending)| {
            let (l, r) = (value(left, attribute), value(right, attribute));
            let ordering = match (&l, &r) {
                (Val::Null, Val::Null) => Ordering::Equal,
                (Val::Null, _) => Ordering::Less,
                (_, Val::Null) => Ordering::Greater,
                _ => l.partial_cmp(&r).unwrap_or(Ordering::Equal),
            };
            if *descending {
                ordering.reverse()
            } else {
                ordering
            }
        })
        .find(|ordering| *ordering != Ordering::Equal)
        .unwrap_or(Ordering::Equal)
}
