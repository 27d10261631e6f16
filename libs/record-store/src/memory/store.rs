// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::sync::Mutex;

use async_trait::async_trait;
use common::value::Val;

use super::{MemoryHost, StoreCall, Tables, filter, lock};
use crate::{
    AccessMode, AttributeKind, CallerScope, Cardinality, Domain, ModelDefinition, Record,
    RecordId, RecordStore, SearchOptions, StoreError, Values,
};

/// A store bound to one caller scope. Writes go straight to the host's tables; the tables as
/// they were when the store was opened are kept so [`RecordStore::rollback`] can restore them.
pub struct MemoryStore {
    host: MemoryHost,
    scope: CallerScope,
    snapshot: Mutex<Tables>,
}

impl MemoryStore {
    pub(super) fn new(host: MemoryHost, scope: CallerScope) -> Self {
        let snapshot = lock(&host.inner.tables).clone();
        Self {
            host,
            scope,
            snapshot: Mutex::new(snapshot),
        }
    }

    pub fn scope(&self) -> CallerScope {
        self.scope
    }

    fn model(&self, collection: &str) -> Result<ModelDefinition, StoreError> {
        self.host
            .model(collection)
            .ok_or_else(|| StoreError::UnknownCollection(collection.to_string()))
    }

    fn check_attributes<'a>(
        &self,
        model: &ModelDefinition,
        attributes: impl IntoIterator<Item = &'a str>,
    ) -> Result<(), StoreError> {
        for attribute in attributes {
            if attribute != "id" && !model.attributes.iter().any(|a| a.name == attribute) {
                return Err(StoreError::UnknownAttribute {
                    collection: model.collection.clone(),
                    attribute: attribute.to_string(),
                });
            }
        }
        Ok(())
    }

    fn default_value(model: &ModelDefinition, attribute: &str) -> Val {
        match model.attributes.iter().find(|a| a.name == attribute) {
            Some(descriptor) => match descriptor.kind {
                AttributeKind::Relation {
                    cardinality: Cardinality::Many,
                    ..
                } => Val::List(vec![]),
                _ => Val::Null,
            },
            None => Val::Null,
        }
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn search(
        &self,
        collection: &str,
        domain: &Domain,
        options: &SearchOptions,
    ) -> Result<Vec<RecordId>, StoreError> {
        self.host.log(StoreCall::Search {
            collection: collection.to_string(),
            domain: domain.clone(),
            options: options.clone(),
        });

        let model = self.model(collection)?;
        self.check_attributes(
            &model,
            domain.conditions().iter().map(|c| c.attribute.as_str()),
        )?;

        let tables = lock(&self.host.inner.tables);
        let mut found = match tables.get(collection) {
            Some(table) => table
                .values()
                .filter_map(|record| match filter::matches(domain, record) {
                    Ok(true) => Some(Ok(record)),
                    Ok(false) => None,
                    Err(e) => Some(Err(e)),
                })
                .collect::<Result<Vec<&Record>, _>>()?,
            None => vec![],
        };

        let order = options
            .order
            .as_deref()
            .map(filter::parse_order)
            .unwrap_or_default();
        found.sort_by(|left, right| filter::compare(left, right, &order));

        Ok(found
            .into_iter()
            .filter_map(|record| record.get("id").and_then(Val::as_i64))
            .skip(options.offset.unwrap_or(0))
            .take(options.limit.unwrap_or(usize::MAX))
            .collect())
    }

    async fn read(
        &self,
        collection: &str,
        ids: &[RecordId],
        fields: &[String],
    ) -> Result<Vec<Record>, StoreError> {
        self.host.log(StoreCall::Read {
            collection: collection.to_string(),
            ids: ids.to_vec(),
            fields: fields.to_vec(),
        });

        let model = self.model(collection)?;
        self.check_attributes(&model, fields.iter().map(String::as_str))?;

        let tables = lock(&self.host.inner.tables);
        let Some(table) = tables.get(collection) else {
            return Ok(vec![]);
        };

        Ok(ids
            .iter()
            .filter_map(|id| table.get(id))
            .map(|stored| {
                let mut record = Record::new();
                record.insert("id".to_string(), stored.get("id").cloned().unwrap_or(Val::Null));
                for field in fields.iter().filter(|field| *field != "id") {
                    let value = stored
                        .get(field)
                        .cloned()
                        .unwrap_or_else(|| Self::default_value(&model, field));
                    record.insert(field.clone(), value);
                }
                record
            })
            .collect())
    }

    async fn create(&self, collection: &str, values: &Values) -> Result<RecordId, StoreError> {
        self.host.log(StoreCall::Create {
            collection: collection.to_string(),
        });

        let model = self.model(collection)?;
        self.check_attributes(&model, values.keys().map(String::as_str))?;

        for required in model.attributes.iter().filter(|a| a.required) {
            let missing = match values.get(&required.name) {
                None | Some(Val::Null) => true,
                Some(Val::Bool(false)) => required.kind != AttributeKind::Boolean,
                Some(_) => false,
            };
            if missing {
                let table = collection.replace('.', "_");
                return Err(StoreError::Constraint(format!(
                    "null value in column \"{}\" of relation \"{table}\" violates not-null constraint\nDETAIL:  Failing row contains ({}).",
                    required.name,
                    values
                        .values()
                        .map(|v| v.to_string())
                        .collect::<Vec<_>>()
                        .join(", ")
                )));
            }
        }

        Ok(self.host.insert(collection, values.clone()))
    }

    async fn write(
        &self,
        collection: &str,
        ids: &[RecordId],
        values: &Values,
    ) -> Result<bool, StoreError> {
        self.host.log(StoreCall::Write {
            collection: collection.to_string(),
            ids: ids.to_vec(),
        });

        let model = self.model(collection)?;
        self.check_attributes(&model, values.keys().map(String::as_str))?;

        let mut tables = lock(&self.host.inner.tables);
        if let Some(table) = tables.get_mut(collection) {
            for id in ids {
                if let Some(record) = table.get_mut(id) {
                    record.extend(
                        values
                            .iter()
                            .filter(|(name, _)| *name != "id")
                            .map(|(name, value)| (name.clone(), value.clone())),
                    );
                }
            }
        }
        Ok(true)
    }

    async fn check_access(&self, collection: &str, mode: AccessMode) -> Result<bool, StoreError> {
        if self.scope.privileged {
            return Ok(true);
        }
        Ok(!self.host.is_revoked(self.scope.caller, collection, mode)
            || self.host.has_rule(collection, mode))
    }

    async fn check_rule(
        &self,
        collection: &str,
        ids: &[RecordId],
        mode: AccessMode,
    ) -> Result<(), StoreError> {
        if self.scope.privileged {
            return Ok(());
        }
        let hidden = self.host.hidden_rows(collection);
        if ids.iter().any(|id| hidden.contains(id)) {
            return Err(StoreError::AccessDenied {
                collection: collection.to_string(),
                mode,
            });
        }
        Ok(())
    }

    async fn rollback(&self) -> Result<(), StoreError> {
        self.host.log(StoreCall::Rollback);
        *lock(&self.host.inner.tables) = lock(&self.snapshot).clone();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::{
        AttributeDescriptor, Caller, Operator, StoreProvider,
        memory::{MemoryHost, values},
    };

    fn host() -> MemoryHost {
        MemoryHost::new()
            .with_model(ModelDefinition::new(
                "res.partner",
                vec![
                    AttributeDescriptor::new("name", AttributeKind::Char).required(),
                    AttributeDescriptor::new("category_ids", AttributeKind::to_many("res.category")),
                ],
            ))
            .with_caller(
                Caller {
                    id: 2,
                    login: "admin".to_string(),
                    superuser: false,
                    tenants: vec![1],
                    default_tenant: Some(1),
                },
                "admin",
            )
    }

    fn scope() -> CallerScope {
        CallerScope {
            caller: 2,
            tenant: Some(1),
            privileged: false,
        }
    }

    #[tokio::test]
    async fn search_orders_and_pages() {
        let host = host();
        for name in ["Deco Addict", "Azure Interior", "Gemini Furniture"] {
            host.insert("res.partner", values([("name", Val::from(name))]));
        }
        let store = host.open(&scope()).await.unwrap();

        let options = SearchOptions {
            offset: Some(1),
            limit: Some(1),
            order: Some("name".to_string()),
        };
        let ids = store
            .search("res.partner", &Domain::True, &options)
            .await
            .unwrap();
        assert_eq!(ids, vec![1]);

        let ids = store
            .search(
                "res.partner",
                &Domain::leaf("name", Operator::Like, "Interior"),
                &SearchOptions::default(),
            )
            .await
            .unwrap();
        assert_eq!(ids, vec![2]);
    }

    #[tokio::test]
    async fn read_skips_missing_and_fills_defaults() {
        let host = host();
        let id = host.insert("res.partner", values([("name", Val::from("Azure"))]));
        let store = host.open(&scope()).await.unwrap();

        let records = store
            .read(
                "res.partner",
                &[id, 99],
                &["name".to_string(), "category_ids".to_string()],
            )
            .await
            .unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].get("category_ids"), Some(&Val::List(vec![])));
        assert_eq!(host.reads_of("res.partner"), 1);
    }

    #[tokio::test]
    async fn unknown_attribute_is_rejected() {
        let host = host();
        let store = host.open(&scope()).await.unwrap();

        let result = store
            .read("res.partner", &[1], &["nickname".to_string()])
            .await;
        assert!(matches!(result, Err(StoreError::UnknownAttribute { .. })));
    }

    #[tokio::test]
    async fn missing_required_value_violates_constraint() {
        let host = host();
        let store = host.open(&scope()).await.unwrap();

        let error = store
            .create("res.partner", &Values::new())
            .await
            .unwrap_err();
        assert!(error.is_constraint_violation());
        assert!(error.to_string().starts_with("null value in column \"name\""));
    }

    #[tokio::test]
    async fn rollback_restores_opening_state() {
        let host = host();
        let store = host.open(&scope()).await.unwrap();

        store
            .create("res.partner", &values([("name", Val::from("Azure"))]))
            .await
            .unwrap();
        assert_eq!(host.record_count("res.partner"), 1);

        store.rollback().await.unwrap();
        assert_eq!(host.record_count("res.partner"), 0);
    }

    #[tokio::test]
    async fn hidden_rows_fail_rule_check() {
        let host = host().with_hidden_rows("res.partner", &[3]);
        let store = host.open(&scope()).await.unwrap();

        assert!(store.check_rule("res.partner", &[1, 2], AccessMode::Read).await.is_ok());
        assert!(matches!(
            store.check_rule("res.partner", &[2, 3], AccessMode::Read).await,
            Err(StoreError::AccessDenied { .. })
        ));
    }
}
