//! Data source lookups by name and optional filters

use mockito::{Matcher, Server};
use serde_json::json;
use tfplug::context::Context;
use tfplug::data_source::{DataSource, ReadDataSourceRequest};
use tfplug::types::{has_errors, AttributePath, Dynamic};
use vastdata::engine::VastDataSource;
use vastdata::resources::{snapshot, tenant};

use crate::common::{data_source, list_query, state, string};

fn read_request(type_name: &str, pairs: &[(&str, Dynamic)]) -> ReadDataSourceRequest {
    ReadDataSourceRequest {
        type_name: type_name.to_string(),
        config: state(pairs),
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn single_match_populates_every_attribute() {
    let mut server = Server::new_async().await;
    let (path, query) = list_query("tenants", &[("name", "tenant1")]);
    let list = server
        .mock("GET", path)
        .match_query(query)
        .with_body(
            json!([{
                "id": 7,
                "guid": "t-7",
                "name": "tenant1",
                "client_ip_ranges": [["10.0.0.1", "10.0.0.9"]]
            }])
            .to_string(),
        )
        .create_async()
        .await;

    let tenants = data_source(&server, tenant::descriptor()).await;
    let response = tenants
        .read(
            Context::new(),
            read_request(tenant::TYPE_NAME, &[("name", "tenant1".into())]),
        )
        .await;

    list.assert_async().await;
    assert!(response.diagnostics.is_empty(), "{:?}", response.diagnostics);
    assert_eq!(string(&response.state, "id"), "7");
    assert_eq!(string(&response.state, "guid"), "t-7");
    assert_eq!(
        response
            .state
            .get_string(&AttributePath::new("client_ip_ranges").index(0).attribute("start_ip"))
            .unwrap(),
        "10.0.0.1"
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn no_match_is_an_error() {
    let mut server = Server::new_async().await;
    let (path, query) = list_query("tenants", &[("name", "ghost")]);
    let _list = server
        .mock("GET", path)
        .match_query(query)
        .with_body("[]")
        .create_async()
        .await;

    let tenants = data_source(&server, tenant::descriptor()).await;
    let response = tenants
        .read(
            Context::new(),
            read_request(tenant::TYPE_NAME, &[("name", "ghost".into())]),
        )
        .await;

    assert!(has_errors(&response.diagnostics));
    assert_eq!(
        response.diagnostics[0].summary,
        "Could not find a resource that matches those attributes"
    );
    assert!(response.state.get(&AttributePath::new("id")).is_none());
}

#[tokio::test(flavor = "multi_thread")]
async fn several_matches_ask_for_more_attributes() {
    let mut server = Server::new_async().await;
    let (path, query) = list_query("snapshots", &[("name", "daily")]);
    let _list = server
        .mock("GET", path)
        .match_query(query)
        .with_body(
            json!([
                {"id": 1, "name": "daily", "path": "/a", "tenant_id": 1},
                {"id": 2, "name": "daily", "path": "/b", "tenant_id": 2}
            ])
            .to_string(),
        )
        .create_async()
        .await;

    let snapshots = data_source(&server, snapshot::descriptor()).await;
    let response = snapshots
        .read(
            Context::new(),
            read_request(snapshot::TYPE_NAME, &[("name", "daily".into())]),
        )
        .await;

    assert!(has_errors(&response.diagnostics));
    assert!(response.diagnostics[0]
        .summary
        .starts_with("Multiple results returned"));
}

#[tokio::test(flavor = "multi_thread")]
async fn snapshot_lookup_filters_by_tenant() {
    let mut server = Server::new_async().await;
    let list = server
        .mock("GET", "/api/snapshots/")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("name".to_string(), "daily".to_string()),
            Matcher::UrlEncoded("tenant_id".to_string(), "2".to_string()),
        ]))
        .with_body(json!([{"id": 2, "name": "daily", "path": "/b", "tenant_id": 2}]).to_string())
        .create_async()
        .await;

    let snapshots = data_source(&server, snapshot::descriptor()).await;
    let response = snapshots
        .read(
            Context::new(),
            read_request(
                snapshot::TYPE_NAME,
                &[("name", "daily".into()), ("tenant_id", Dynamic::Number(2.0))],
            ),
        )
        .await;

    list.assert_async().await;
    assert!(response.diagnostics.is_empty(), "{:?}", response.diagnostics);
    assert_eq!(string(&response.state, "id"), "2");
    assert_eq!(string(&response.state, "path"), "/b");
}

#[tokio::test(flavor = "multi_thread")]
async fn unset_optional_filter_is_not_sent() {
    let mut server = Server::new_async().await;
    let list = server
        .mock("GET", "/api/snapshots/")
        .match_query(Matcher::Exact("name=daily".to_string()))
        .with_body(json!([{"id": 1, "name": "daily", "path": "/a", "tenant_id": 1}]).to_string())
        .create_async()
        .await;

    let snapshots = data_source(&server, snapshot::descriptor()).await;
    let response = snapshots
        .read(
            Context::new(),
            read_request(snapshot::TYPE_NAME, &[("name", "daily".into())]),
        )
        .await;

    list.assert_async().await;
    assert!(response.diagnostics.is_empty(), "{:?}", response.diagnostics);
    assert_eq!(
        response
            .state
            .get_number(&AttributePath::new("tenant_id"))
            .unwrap(),
        1.0
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn missing_name_makes_no_call() {
    let mut server = Server::new_async().await;
    let list = server
        .mock("GET", Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let tenants = data_source(&server, tenant::descriptor()).await;
    let response = tenants
        .read(Context::new(), read_request(tenant::TYPE_NAME, &[]))
        .await;

    list.assert_async().await;
    assert!(has_errors(&response.diagnostics));
    assert_eq!(response.diagnostics[0].summary, "Missing lookup attribute");
    assert_eq!(
        response.diagnostics[0].attribute,
        Some(AttributePath::new("name"))
    );
}

#[tokio::test]
async fn unconfigured_data_source_reports_missing_provider_data() {
    let tenants = VastDataSource::new(tenant::descriptor());
    let response = tenants
        .read(
            Context::new(),
            read_request(tenant::TYPE_NAME, &[("name", "tenant1".into())]),
        )
        .await;

    assert!(has_errors(&response.diagnostics));
    assert_eq!(response.diagnostics[0].summary, "Provider not configured");
}
