// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use heck::ToUpperCamelCase;
use indexmap::IndexMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    One,
    Many,
}

/// The storage kind of an attribute, as reported by the host's model metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeKind {
    Integer,
    Float,
    Monetary,
    Boolean,
    Char,
    Text,
    Html,
    Date,
    DateTime,
    Binary,
    Selection,
    Relation {
        /// Collection id of the related entity (`res.partner`)
        target: String,
        cardinality: Cardinality,
    },
}

impl AttributeKind {
    pub fn to_one(target: &str) -> Self {
        AttributeKind::Relation {
            target: target.to_string(),
            cardinality: Cardinality::One,
        }
    }

    pub fn to_many(target: &str) -> Self {
        AttributeKind::Relation {
            target: target.to_string(),
            cardinality: Cardinality::Many,
        }
    }

    pub fn relation(&self) -> Option<(&str, Cardinality)> {
        match self {
            AttributeKind::Relation {
                target,
                cardinality,
            } => Some((target, *cardinality)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeDescriptor {
    pub name: String,
    pub kind: AttributeKind,
    pub required: bool,
}

impl AttributeDescriptor {
    pub fn new(name: &str, kind: AttributeKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
            required: false,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn is_relation(&self) -> bool {
        self.kind.relation().is_some()
    }
}

/// A model as the host describes it. Transient models are never exposed.
#[derive(Debug, Clone)]
pub struct ModelDefinition {
    pub collection: String,
    pub transient: bool,
    pub attributes: Vec<AttributeDescriptor>,
}

impl ModelDefinition {
    pub fn new(collection: &str, attributes: Vec<AttributeDescriptor>) -> Self {
        Self {
            collection: collection.to_string(),
            transient: false,
            attributes,
        }
    }

    pub fn transient(mut self) -> Self {
        self.transient = true;
        self
    }
}

/// An exposed entity: the external GraphQL type name, the backing collection and its attributes.
///
/// Every descriptor carries an `id` attribute, even when the host metadata omits it.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityDescriptor {
    pub type_name: String,
    pub collection: String,
    attributes: IndexMap<String, AttributeDescriptor>,
}

impl EntityDescriptor {
    /// Returns `None` if no valid GraphQL type name can be derived from the collection id.
    pub fn from_model(model: &ModelDefinition) -> Option<Self> {
        let type_name = entity_type_name(&model.collection)?;

        let mut attributes = IndexMap::with_capacity(model.attributes.len() + 1);
        if !model.attributes.iter().any(|a| a.name == "id") {
            attributes.insert(
                "id".to_string(),
                AttributeDescriptor::new("id", AttributeKind::Integer),
            );
        }
        for attribute in &model.attributes {
            attributes.insert(attribute.name.clone(), attribute.clone());
        }

        Some(Self {
            type_name,
            collection: model.collection.clone(),
            attributes,
        })
    }

    pub fn attribute(&self, name: &str) -> Option<&AttributeDescriptor> {
        self.attributes.get(name)
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    pub fn attributes(&self) -> impl Iterator<Item = &AttributeDescriptor> {
        self.attributes.values()
    }
}

/// Convert a dotted collection id into a PascalCase type name (`sale.order.line` -> `SaleOrderLine`).
pub fn entity_type_name(collection: &str) -> Option<String> {
    let name: String = collection
        .split('.')
        .map(|part| part.to_upper_camel_case())
        .collect();

    let mut chars = name.chars();
    let valid_start = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');

    (valid_start && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')).then_some(name)
}
