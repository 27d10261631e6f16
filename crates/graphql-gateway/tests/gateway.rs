// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::sync::Arc;

use common::value::Val;
use graphql_gateway::{Gateway, GatewayConfig, GatewayError};
use graphql_resolver::Credentials;
use record_store::{
    Caller, CallerScope,
    memory::{
        MemoryHost,
        fixtures::{self, ADMIN, DEMO},
    },
};
use serde_json::{Value, json};

const MULTI: i64 = 8;

fn host() -> MemoryHost {
    fixtures::sales().with_caller(
        Caller {
            id: MULTI,
            login: "multi".to_string(),
            superuser: false,
            tenants: vec![1, 2],
            default_tenant: Some(1),
        },
        "multi",
    )
}

fn gateway(host: &MemoryHost) -> Gateway {
    gateway_with(host, GatewayConfig::default())
}

fn gateway_with(host: &MemoryHost, config: GatewayConfig) -> Gateway {
    Gateway::for_host(Arc::new(host.clone()), config)
}

fn body(json: Value) -> Vec<u8> {
    serde_json::to_vec(&json).unwrap()
}

fn credentials(login: &str, password: &str, company_id: Option<i64>) -> Credentials {
    Credentials {
        login: login.to_string(),
        password: password.to_string(),
        company_id,
    }
}

async fn post(gateway: &Gateway, session_caller: Option<i64>, json: Value) -> Value {
    gateway
        .handle_request(session_caller, Some("application/graphql"), &body(json))
        .await
        .to_json()
}

fn partner_names(response: &Value) -> Vec<&str> {
    response["data"]["ResPartner"]
        .as_array()
        .unwrap()
        .iter()
        .map(|partner| partner["name"].as_str().unwrap())
        .collect()
}

#[test_log::test(tokio::test)]
async fn malformed_json() {
    let host = host();
    let gateway = gateway(&host);

    let response = gateway
        .handle_request(Some(DEMO), Some("application/graphql"), b"{\"query\": ")
        .await;

    assert_eq!(response.data, None);
    assert_eq!(response.errors.len(), 1);
    assert!(response.errors[0].starts_with("Invalid request body"));
    assert!(host.opened_scopes().is_empty());
}

#[tokio::test]
async fn body_without_query() {
    let host = host();
    let gateway = gateway(&host);

    let response = post(&gateway, Some(DEMO), json!({"variables": {}})).await;

    assert_eq!(response["data"], Value::Null);
    assert_eq!(response["errors"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn content_type() {
    let host = host();
    let gateway = gateway(&host);
    let request = body(json!({"query": "{ ResCompany(id: 1) { name } }"}));

    let response = gateway
        .handle_request(Some(DEMO), Some("application/json"), &request)
        .await;
    assert_eq!(
        response.to_json(),
        json!({
            "data": null,
            "errors": ["Invalid Content-Type 'application/json'. Use application/graphql."]
        })
    );

    let response = gateway.handle_request(Some(DEMO), None, &request).await;
    assert!(!response.is_success());

    let response = gateway
        .handle_request(Some(DEMO), Some("application/graphql; charset=utf-8"), &request)
        .await;
    assert!(response.is_success());

    let lenient = gateway_with(
        &host,
        GatewayConfig {
            enforce_content_type: false,
            ..GatewayConfig::default()
        },
    );
    let response = lenient.handle_request(Some(DEMO), None, &request).await;
    assert_eq!(
        response.to_json(),
        json!({"data": {"ResCompany": [{"id": 1, "name": "YourCompany"}]}, "errors": []})
    );
}

#[tokio::test]
async fn failed_authentication() {
    let host = host();
    let gateway = gateway(&host);

    let response = post(
        &gateway,
        Some(ADMIN),
        json!({
            "query": "{ ResPartner { name } }",
            "auth": {"login": "demo", "password": "wrong"}
        }),
    )
    .await;

    // Explicit credentials are not replaced by the session
    assert_eq!(response, json!({"data": null, "errors": ["Access denied"]}));
    assert!(host.opened_scopes().is_empty());
}

#[tokio::test]
async fn anonymous_request() {
    let host = host();
    let gateway = gateway(&host);

    let response = post(&gateway, None, json!({"query": "{ ResPartner { name } }"})).await;

    assert_eq!(response, json!({"data": null, "errors": ["Access denied"]}));
}

#[tokio::test]
async fn other_database() {
    let host = host();
    let gateway = gateway_with(
        &host,
        GatewayConfig {
            database: "staging".to_string(),
            ..GatewayConfig::default()
        },
    );

    let response = post(
        &gateway,
        None,
        json!({
            "query": "{ ResPartner { name } }",
            "auth": {"login": "demo", "password": "demo"}
        }),
    )
    .await;

    assert_eq!(response, json!({"data": null, "errors": ["Access denied"]}));
}

#[tokio::test]
async fn session_caller() {
    let host = host();
    let gateway = gateway(&host);

    let response = post(&gateway, Some(DEMO), json!({"query": "{ ResPartner { name } }"})).await;

    assert_eq!(
        partner_names(&response),
        vec!["Azure Interior", "Deco Addict", "Brandon Freeman", "Colleen Diaz"]
    );
    assert_eq!(
        host.opened_scopes(),
        vec![CallerScope {
            caller: DEMO,
            tenant: Some(1),
            privileged: false,
        }]
    );
}

#[tokio::test]
async fn superuser_is_not_scoped() {
    let host = host();
    let gateway = gateway(&host);

    let response = post(
        &gateway,
        None,
        json!({
            "query": "{ ResPartner { name } }",
            "auth": {"login": "admin", "password": "admin"}
        }),
    )
    .await;

    assert_eq!(partner_names(&response).len(), 5);
    assert!(host.opened_scopes()[0].privileged);
}

#[tokio::test]
async fn tenant_selection() {
    let host = host();
    let gateway = gateway(&host);

    let response = post(
        &gateway,
        None,
        json!({
            "query": "{ ResPartner { name } }",
            "auth": {"login": "multi", "password": "multi", "company_id": 2}
        }),
    )
    .await;

    assert_eq!(
        partner_names(&response),
        vec!["Gemini Furniture", "Brandon Freeman"]
    );
    assert_eq!(host.opened_scopes()[0].tenant, Some(2));
    // Not persisted by default
    assert_eq!(host.stored_caller(MULTI).unwrap().default_tenant, Some(1));
}

#[tokio::test]
async fn persisted_tenant_selection() {
    let host = host();
    let gateway = gateway_with(
        &host,
        GatewayConfig {
            persist_tenant_selection: true,
            ..GatewayConfig::default()
        },
    );

    post(
        &gateway,
        None,
        json!({
            "query": "{ ResPartner { name } }",
            "auth": {"login": "multi", "password": "multi", "company_id": 2}
        }),
    )
    .await;
    assert_eq!(host.stored_caller(MULTI).unwrap().default_tenant, Some(2));

    // Later requests without a selector use the new default
    let response = post(&gateway, Some(MULTI), json!({"query": "{ SaleOrder { name } }"})).await;
    assert_eq!(
        response["data"]["SaleOrder"],
        json!([{"id": 4, "name": "S00004"}])
    );
}

#[tokio::test]
async fn tenant_outside_of_caller() {
    let host = host();
    let gateway = gateway_with(
        &host,
        GatewayConfig {
            persist_tenant_selection: true,
            ..GatewayConfig::default()
        },
    );

    let response = gateway
        .authenticate_and_run(
            &credentials("demo", "demo", None),
            Some(2),
            graphql_resolver::OperationsPayload::new("{ ResPartner { name } }"),
        )
        .await;

    assert_eq!(
        response.to_json(),
        json!({"data": null, "errors": ["Access denied"]})
    );
    assert_eq!(host.stored_caller(DEMO).unwrap().default_tenant, Some(1));
    assert!(host.opened_scopes().is_empty());
}

#[tokio::test]
async fn query_with_variables_and_directives() {
    let host = host();
    let gateway = gateway(&host);

    let response = post(
        &gateway,
        Some(DEMO),
        json!({
            "query": r#"
                query Orders($state: String, $withPartner: Boolean!) {
                    SaleOrder(state: $state, order: "name desc") {
                        name
                        partner_id @include(if: $withPartner) { name }
                        ...lines
                    }
                }
                fragment lines on SaleOrder {
                    tag_ids @skip(if: $withPartner) { name }
                }
            "#,
            "operationName": "Orders",
            "variables": {"state": "sale", "withPartner": true}
        }),
    )
    .await;

    // `state` is a plain value argument, which a query ignores
    assert_eq!(
        response,
        json!({
            "data": {
                "SaleOrder": [
                    {"id": 3, "name": "S00003", "partner_id": {"id": 1, "name": "Azure Interior"}},
                    {"id": 2, "name": "S00002", "partner_id": {"id": 2, "name": "Deco Addict"}},
                    {"id": 1, "name": "S00001", "partner_id": {"id": 1, "name": "Azure Interior"}}
                ]
            },
            "errors": []
        })
    );
}

#[tokio::test]
async fn context_variables() {
    let host = host().with_context_variable("partner", Val::from(4i64));
    let gateway = gateway(&host);

    let response = post(
        &gateway,
        Some(DEMO),
        json!({"query": "query($partner: Int) { ResPartner(id: $partner) { name } }"}),
    )
    .await;

    assert_eq!(partner_names(&response), vec!["Brandon Freeman"]);
}

#[tokio::test]
async fn create_and_update() {
    let host = host();
    let gateway = gateway(&host);

    let response = post(
        &gateway,
        None,
        json!({
            "query": r#"mutation($partner: Int!) {
                SaleOrder(name: "S00005", partner_id: $partner) { name partner_id { name } company_id }
            }"#,
            "variables": {"partner": 2},
            "auth": {"login": "demo", "password": "demo"}
        }),
    )
    .await;
    assert_eq!(
        response,
        json!({
            "data": {
                "SaleOrder": [{
                    "id": 5,
                    "name": "S00005",
                    "partner_id": {"id": 2, "name": "Deco Addict"},
                    "company_id": 1
                }]
            },
            "errors": []
        })
    );
    assert_eq!(host.record_count("sale.order"), 5);

    let response = post(
        &gateway,
        Some(DEMO),
        json!({"query": r#"mutation { SaleOrder(id: 5, state: "sale") { state } }"#}),
    )
    .await;
    assert_eq!(
        response["data"],
        json!({"SaleOrder": [{"id": 5, "state": "sale"}]})
    );
    assert_eq!(host.record_count("sale.order"), 5);
}

#[tokio::test]
async fn constraint_violation() {
    let host = host();
    let gateway = gateway(&host);

    let response = post(
        &gateway,
        Some(DEMO),
        json!({"query": r#"mutation { SaleOrder(name: "S00005") { id } }"#}),
    )
    .await;

    assert_eq!(
        response,
        json!({
            "data": {"SaleOrder": null},
            "errors": [
                "null value in column \"partner_id\" of relation \"sale_order\" violates not-null constraint"
            ]
        })
    );
    assert_eq!(host.record_count("sale.order"), 4);
}

#[tokio::test]
async fn schema() {
    let host = host();
    let gateway = gateway(&host);

    let schema = gateway
        .schema(&credentials("portal", "portal", None))
        .await
        .unwrap();
    assert!(schema.contains("type SaleOrder {\n"));
    assert!(schema.contains("    partner_id: ResPartner!\n"));
    assert!(schema.contains("    category_id: [ResPartnerCategory]\n"));

    let result = gateway.schema(&credentials("portal", "admin", None)).await;
    assert!(matches!(result, Err(GatewayError::AuthenticationFailed)));
}

#[tokio::test]
async fn invalidated_metadata_is_reloaded() {
    let host = host();
    let gateway = gateway(&host);
    let request = json!({"query": "{ ResCompany { name } }"});

    post(&gateway, Some(DEMO), request.clone()).await;
    post(&gateway, Some(ADMIN), request.clone()).await;
    assert_eq!(host.model_reads(), 1);

    gateway.invalidate_metadata().await;
    post(&gateway, Some(DEMO), request).await;
    assert_eq!(host.model_reads(), 2);
}
