// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! A small sales dataset: two companies, partner categories, partners and sale orders.
//!
//! | caller | login/secret | tenants | default |
//! |---|---|---|---|
//! | 2 | `admin` | 1, 2 (superuser) | 1 |
//! | 6 | `demo` | 1 | 1 |
//! | 7 | `portal` | none | none |

use common::value::Val;

use crate::{AttributeDescriptor, AttributeKind, Caller, ModelDefinition};

use super::{MemoryHost, values};

pub const ADMIN: i64 = 2;
pub const DEMO: i64 = 6;
pub const PORTAL: i64 = 7;

pub fn models() -> Vec<ModelDefinition> {
    vec![
        ModelDefinition::new(
            "res.company",
            vec![AttributeDescriptor::new("name", AttributeKind::Char).required()],
        ),
        ModelDefinition::new(
            "res.partner.category",
            vec![AttributeDescriptor::new("name", AttributeKind::Char).required()],
        ),
        ModelDefinition::new(
            "res.partner",
            vec![
                AttributeDescriptor::new("name", AttributeKind::Char).required(),
                AttributeDescriptor::new("email", AttributeKind::Char),
                AttributeDescriptor::new("active", AttributeKind::Boolean),
                AttributeDescriptor::new("company_id", AttributeKind::to_one("res.company")),
                AttributeDescriptor::new("parent_id", AttributeKind::to_one("res.partner")),
                AttributeDescriptor::new("child_ids", AttributeKind::to_many("res.partner")),
                AttributeDescriptor::new(
                    "category_id",
                    AttributeKind::to_many("res.partner.category"),
                ),
                AttributeDescriptor::new("image", AttributeKind::Binary),
            ],
        ),
        ModelDefinition::new(
            "sale.order",
            vec![
                AttributeDescriptor::new("name", AttributeKind::Char).required(),
                AttributeDescriptor::new("state", AttributeKind::Selection),
                AttributeDescriptor::new("amount_total", AttributeKind::Monetary),
                AttributeDescriptor::new("partner_id", AttributeKind::to_one("res.partner"))
                    .required(),
                AttributeDescriptor::new(
                    "partner_invoice_id",
                    AttributeKind::to_one("res.partner"),
                ),
                AttributeDescriptor::new("company_id", AttributeKind::to_one("res.company")),
                AttributeDescriptor::new("tag_ids", AttributeKind::to_many("res.partner.category")),
            ],
        ),
        ModelDefinition::new("sale.advance.payment.inv", vec![]).transient(),
    ]
}

fn caller(id: i64, login: &str, superuser: bool, tenants: Vec<i64>) -> Caller {
    Caller {
        id,
        login: login.to_string(),
        superuser,
        default_tenant: tenants.first().copied(),
        tenants,
    }
}

/// Build the host with its models, callers and records.
///
/// Record ids are assigned in insertion order per collection, starting at 1.
pub fn sales() -> MemoryHost {
    let host = models()
        .into_iter()
        .fold(MemoryHost::new(), |host, model| host.with_model(model))
        .with_caller(caller(ADMIN, "admin", true, vec![1, 2]), "admin")
        .with_caller(caller(DEMO, "demo", false, vec![1]), "demo")
        .with_caller(caller(PORTAL, "portal", false, vec![]), "portal");

    for name in ["YourCompany", "My Company (Chicago)"] {
        host.insert("res.company", values([("name", Val::from(name))]));
    }

    for name in ["Vendor", "Prospect", "Services"] {
        host.insert("res.partner.category", values([("name", Val::from(name))]));
    }

    let partners = [
        // 1
        values([
            ("name", Val::from("Azure Interior")),
            ("email", Val::from("azure.Interior24@example.com")),
            ("active", Val::Bool(true)),
            ("company_id", Val::from(1i64)),
            ("parent_id", Val::Bool(false)),
            ("child_ids", Val::from(vec![4i64, 5])),
            ("category_id", Val::from(vec![2i64, 1])),
        ]),
        // 2
        values([
            ("name", Val::from("Deco Addict")),
            ("email", Val::from("deco.addict82@example.com")),
            ("active", Val::Bool(true)),
            ("company_id", Val::from(1i64)),
            ("parent_id", Val::Bool(false)),
            ("child_ids", Val::from(Vec::<i64>::new())),
            ("category_id", Val::from(vec![1i64, 3, 1])),
        ]),
        // 3
        values([
            ("name", Val::from("Gemini Furniture")),
            ("email", Val::from("gemini.furniture39@example.com")),
            ("active", Val::Bool(true)),
            ("company_id", Val::from(2i64)),
            ("parent_id", Val::Bool(false)),
            ("child_ids", Val::from(Vec::<i64>::new())),
            ("category_id", Val::from(vec![3i64])),
        ]),
        // 4
        values([
            ("name", Val::from("Brandon Freeman")),
            ("email", Val::Bool(false)),
            ("active", Val::Bool(true)),
            ("company_id", Val::Bool(false)),
            ("parent_id", Val::from(1i64)),
            ("child_ids", Val::from(Vec::<i64>::new())),
            ("category_id", Val::from(Vec::<i64>::new())),
        ]),
        // 5
        values([
            ("name", Val::from("Colleen Diaz")),
            ("email", Val::from("colleen.diaz83@example.com")),
            ("active", Val::Bool(true)),
            ("company_id", Val::from(1i64)),
            ("parent_id", Val::from(1i64)),
            ("child_ids", Val::from(Vec::<i64>::new())),
            ("category_id", Val::from(vec![2i64])),
        ]),
    ];
    for partner in partners {
        host.insert("res.partner", partner);
    }

    let orders = [
        ("S00001", "sale", 1i64, 1i64, 1i64, 1799.0),
        ("S00002", "draft", 2, 2, 1, 2947.5),
        ("S00003", "sale", 1, 5, 1, 377.5),
        ("S00004", "sale", 3, 3, 2, 1020.0),
    ];
    for (name, state, partner, invoice_partner, company, amount) in orders {
        host.insert(
            "sale.order",
            values([
                ("name", Val::from(name)),
                ("state", Val::from(state)),
                ("amount_total", Val::from(amount)),
                ("partner_id", Val::from(partner)),
                ("partner_invoice_id", Val::from(invoice_partner)),
                ("company_id", Val::from(company)),
                ("tag_ids", Val::from(vec![3i64])),
            ]),
        );
    }

    host
}
