// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Textual GraphQL schema of the entities exposed to a caller.

use record_store::{AllowedFields, AttributeDescriptor, AttributeKind, Cardinality};

use crate::access::EntityMapping;

/// Derive the schema text: one `type` block per exposed entity, one field line per attribute.
///
/// When an entity has a field allow-list, only the listed attributes are emitted.
pub fn derive_schema(entities: &EntityMapping, allowed_fields: &AllowedFields) -> String {
    entities
        .entities()
        .map(|entity| {
            let allowed = allowed_fields.get(&entity.collection);

            let fields: String = entity
                .attributes()
                .filter(|attribute| allowed.is_none_or(|allowed| allowed.contains(&attribute.name)))
                .map(|attribute| format!("    {}\n", field_definition(attribute, entities)))
                .collect();

            format!("type {} {{\n{fields}}}\n", entity.type_name)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn field_definition(attribute: &AttributeDescriptor, entities: &EntityMapping) -> String {
    let typ = if attribute.name == "id" {
        "ID".to_string()
    } else {
        match &attribute.kind {
            AttributeKind::Relation {
                target,
                cardinality,
            } => {
                // Relations to entities the caller cannot see are exposed as plain ids
                let target = entities.type_name_of(target).unwrap_or("Int");
                match cardinality {
                    Cardinality::One => target.to_string(),
                    Cardinality::Many => format!("[{target}]"),
                }
            }
            AttributeKind::Integer => "Int".to_string(),
            AttributeKind::Float | AttributeKind::Monetary => "Float".to_string(),
            AttributeKind::Boolean => "Boolean".to_string(),
            AttributeKind::Selection => "[String]".to_string(),
            _ => "String".to_string(),
        }
    };

    let required = if attribute.required { "!" } else { "" };
    format!("{}: {typ}{required}", attribute.name)
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::HashSet;

    use record_store::{EntityDescriptor, ModelDefinition};

    fn entities() -> EntityMapping {
        let models = [
            ModelDefinition::new(
                "res.partner",
                vec![
                    AttributeDescriptor::new("name", AttributeKind::Char).required(),
                    AttributeDescriptor::new("active", AttributeKind::Boolean),
                    AttributeDescriptor::new("credit_limit", AttributeKind::Monetary),
                    AttributeDescriptor::new("color", AttributeKind::Integer),
                    AttributeDescriptor::new("type", AttributeKind::Selection),
                    AttributeDescriptor::new("company_id", AttributeKind::to_one("res.company")),
                    AttributeDescriptor::new("child_ids", AttributeKind::to_many("res.partner")),
                    AttributeDescriptor::new("user_ids", AttributeKind::to_many("res.users")),
                ],
            ),
            ModelDefinition::new(
                "res.company",
                vec![AttributeDescriptor::new("name", AttributeKind::Char)],
            ),
        ];
        EntityMapping::new(models.iter().filter_map(EntityDescriptor::from_model))
    }

    #[test]
    fn type_blocks() {
        let schema = derive_schema(&entities(), &AllowedFields::new());

        assert_eq!(
            schema,
            "type ResPartner {
    id: ID
    name: String!
    active: Boolean
    credit_limit: Float
    color: Int
    type: [String]
    company_id: ResCompany
    child_ids: [ResPartner]
    user_ids: [Int]
}

type ResCompany {
    id: ID
    name: String
}
"
        );
    }

    #[test]
    fn allow_list_restricts_fields() {
        let allowed = AllowedFields::from([(
            "res.partner".to_string(),
            HashSet::from(["id".to_string(), "name".to_string()]),
        )]);

        let schema = derive_schema(&entities(), &allowed);
        assert!(schema.starts_with("type ResPartner {\n    id: ID\n    name: String!\n}\n"));
        assert!(schema.contains("type ResCompany {\n    id: ID\n    name: String\n}\n"));
    }
}
