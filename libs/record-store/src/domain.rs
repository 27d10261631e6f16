// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::fmt::Display;

use common::value::Val;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Eq,
    Neq,
    In,
    NotIn,
    Lt,
    Lte,
    Gt,
    Gte,
    Like,
    ILike,
}

impl Operator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::Neq => "!=",
            Operator::In => "in",
            Operator::NotIn => "not in",
            Operator::Lt => "<",
            Operator::Lte => "<=",
            Operator::Gt => ">",
            Operator::Gte => ">=",
            Operator::Like => "like",
            Operator::ILike => "ilike",
        }
    }
}

impl Display for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single `(attribute, operator, value)` triple.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub attribute: String,
    pub operator: Operator,
    pub value: Val,
}

/// A filter expression over an entity's attributes.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Domain {
    #[default]
    True,
    False,
    Leaf(Condition),
    // Prefer Domain::and(), which simplifies the expression
    And(Box<Domain>, Box<Domain>),
    // Prefer Domain::or(), which simplifies the expression
    Or(Box<Domain>, Box<Domain>),
    Not(Box<Domain>),
}

impl Domain {
    pub fn leaf(attribute: &str, operator: Operator, value: impl Into<Val>) -> Domain {
        Domain::Leaf(Condition {
            attribute: attribute.to_string(),
            operator,
            value: value.into(),
        })
    }

    /// Logical and of two domains, reducing to a simpler domain if possible.
    pub fn and(lhs: Domain, rhs: Domain) -> Domain {
        match (lhs, rhs) {
            (Domain::False, _) | (_, Domain::False) => Domain::False,
            (Domain::True, rhs) => rhs,
            (lhs, Domain::True) => lhs,
            (lhs, rhs) if lhs == rhs => lhs,
            (lhs, rhs) => Domain::And(Box::new(lhs), Box::new(rhs)),
        }
    }

    /// Logical or of two domains, reducing to a simpler domain if possible.
    pub fn or(lhs: Domain, rhs: Domain) -> Domain {
        match (lhs, rhs) {
            (Domain::True, _) | (_, Domain::True) => Domain::True,
            (Domain::False, rhs) => rhs,
            (lhs, Domain::False) => lhs,
            (lhs, rhs) if lhs == rhs => lhs,
            (lhs, rhs) => Domain::Or(Box::new(lhs), Box::new(rhs)),
        }
    }

    /// Implicit conjunction of a sequence of domains, in order.
    pub fn all(domains: impl IntoIterator<Item = Domain>) -> Domain {
        domains.into_iter().fold(Domain::True, Domain::and)
    }

    /// True when the domain imposes no restriction at all.
    pub fn is_empty(&self) -> bool {
        matches!(self, Domain::True)
    }

    /// All leaf conditions, left to right.
    pub fn conditions(&self) -> Vec<&Condition> {
        let mut conditions = vec![];
        self.collect_conditions(&mut conditions);
        conditions
    }

    fn collect_conditions<'a>(&'a self, conditions: &mut Vec<&'a Condition>) {
        match self {
            Domain::True | Domain::False => {}
            Domain::Leaf(condition) => conditions.push(condition),
            Domain::And(lhs, rhs) | Domain::Or(lhs, rhs) => {
                lhs.collect_conditions(conditions);
                rhs.collect_conditions(conditions);
            }
            Domain::Not(underlying) => underlying.collect_conditions(conditions),
        }
    }

    fn write_terms(&self, terms: &mut Vec<String>) {
        match self {
            Domain::True => terms.push("(1, '=', 1)".to_string()),
            Domain::False => terms.push("(0, '=', 1)".to_string()),
            Domain::Leaf(condition) => terms.push(format!(
                "('{}', '{}', {})",
                condition.attribute, condition.operator, condition.value
            )),
            Domain::And(lhs, rhs) => {
                terms.push("'&'".to_string());
                lhs.write_terms(terms);
                rhs.write_terms(terms);
            }
            Domain::Or(lhs, rhs) => {
                terms.push("'|'".to_string());
                lhs.write_terms(terms);
                rhs.write_terms(terms);
            }
            Domain::Not(underlying) => {
                terms.push("'!'".to_string());
                underlying.write_terms(terms);
            }
        }
    }
}

impl std::ops::Not for Domain {
    type Output = Domain;

    fn not(self) -> Self::Output {
        match self {
            Domain::True => Domain::False,
            Domain::False => Domain::True,
            Domain::Not(underlying) => *underlying,
            domain => Domain::Not(Box::new(domain)),
        }
    }
}

/// Renders in the host's prefix notation, e.g. `['&', ('id', 'in', [1, 2]), ('active', '=', true)]`.
impl Display for Domain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_empty() {
            return write!(f, "[]");
        }
        let mut terms = vec![];
        self.write_terms(&mut terms);
        write!(f, "[{}]", terms.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name_eq(name: &str) -> Domain {
        Domain::leaf("name", Operator::Eq, name)
    }

    #[test]
    fn and_simplifies() {
        assert_eq!(Domain::and(Domain::True, name_eq("a")), name_eq("a"));
        assert_eq!(Domain::and(name_eq("a"), Domain::False), Domain::False);
        assert_eq!(Domain::and(name_eq("a"), name_eq("a")), name_eq("a"));
        assert!(matches!(
            Domain::and(name_eq("a"), name_eq("b")),
            Domain::And(_, _)
        ));
    }

    #[test]
    fn or_simplifies() {
        assert_eq!(Domain::or(Domain::True, name_eq("a")), Domain::True);
        assert_eq!(Domain::or(Domain::False, name_eq("a")), name_eq("a"));
    }

    #[test]
    fn all_of_nothing_is_empty() {
        assert!(Domain::all(vec![]).is_empty());
        assert!(!Domain::all(vec![name_eq("a")]).is_empty());
    }

    #[test]
    fn renders_prefix_notation() {
        let domain = Domain::and(
            Domain::leaf("id", Operator::In, vec![1i64, 2]),
            Domain::or(
                Domain::leaf("company_id", Operator::In, vec![3i64]),
                Domain::leaf("company_id", Operator::Eq, false),
            ),
        );

        assert_eq!(
            domain.to_string(),
            "['&', ('id', 'in', [1, 2]), '|', ('company_id', 'in', [3]), ('company_id', '=', false)]"
        );
        assert_eq!(
            domain
                .conditions()
                .iter()
                .map(|c| c.attribute.as_str())
                .collect::<Vec<_>>(),
            vec!["id", "company_id", "company_id"]
        );
    }
}
