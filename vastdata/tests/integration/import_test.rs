//! terraform import by GUID and by name fields

use mockito::Server;
use serde_json::json;
use tfplug::context::Context;
use tfplug::resource::{ImportResourceStateRequest, ResourceWithImportState};
use tfplug::types::{has_errors, AttributePath};
use vastdata::resources::{qos_policy, view_policy};

use crate::common::{list_query, resource, string};

fn import_request(type_name: &str, id: &str) -> ImportResourceStateRequest {
    ImportResourceStateRequest {
        type_name: type_name.to_string(),
        id: id.to_string(),
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn import_by_guid_takes_first_match() {
    let mut server = Server::new_async().await;
    let (path, query) = list_query("qospolicies", &[("guid", "g-1")]);
    let list = server
        .mock("GET", path)
        .match_query(query)
        .with_body(
            json!([
                {"id": 1, "guid": "g-1", "name": "first", "static_limits": {"max_writes_iops": 10}},
                {"id": 2, "guid": "g-1", "name": "second"}
            ])
            .to_string(),
        )
        .create_async()
        .await;

    let policy = resource(&server, qos_policy::descriptor()).await;
    let response = policy
        .import_state(Context::new(), import_request(qos_policy::TYPE_NAME, "g-1"))
        .await;

    list.assert_async().await;
    assert!(response.diagnostics.is_empty(), "{:?}", response.diagnostics);
    assert_eq!(response.imported_resources.len(), 1);

    let imported = &response.imported_resources[0];
    assert_eq!(imported.type_name, qos_policy::TYPE_NAME);
    assert_eq!(string(&imported.state, "id"), "1");
    assert_eq!(string(&imported.state, "name"), "first");
    assert_eq!(
        imported
            .state
            .get_number(&AttributePath::new("static_limits").attribute("max_writes_iops"))
            .unwrap(),
        10.0
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn import_with_no_match_fails_without_state() {
    let mut server = Server::new_async().await;
    let (path, query) = list_query("qospolicies", &[("guid", "nope")]);
    let _list = server
        .mock("GET", path)
        .match_query(query)
        .with_body("[]")
        .create_async()
        .await;

    let policy = resource(&server, qos_policy::descriptor()).await;
    let response = policy
        .import_state(Context::new(), import_request(qos_policy::TYPE_NAME, "nope"))
        .await;

    assert!(has_errors(&response.diagnostics));
    assert_eq!(
        response.diagnostics[0].detail,
        "cluster provided 0 elements matching this lookup"
    );
    assert!(response.imported_resources.is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn import_by_name_and_tenant() {
    let mut server = Server::new_async().await;
    let (path, query) = list_query(
        "viewpolicies",
        &[("name", "default"), ("tenant_name__icontains", "tenant1")],
    );
    let list = server
        .mock("GET", path)
        .match_query(query)
        .with_body(
            json!([{
                "id": 5,
                "guid": "vp-5",
                "name": "default",
                "flavor": "NFS",
                "nfs_read_write": ["*"],
                "tenant_id": 2,
                "tenant_name": "tenant1"
            }])
            .to_string(),
        )
        .create_async()
        .await;

    let policy = resource(&server, view_policy::descriptor()).await;
    let response = policy
        .import_state(
            Context::new(),
            import_request(view_policy::TYPE_NAME, "default|tenant1"),
        )
        .await;

    list.assert_async().await;
    assert!(response.diagnostics.is_empty(), "{:?}", response.diagnostics);
    let state = &response.imported_resources[0].state;
    assert_eq!(string(state, "id"), "5");
    assert_eq!(string(state, "tenant_name"), "tenant1");
    assert_eq!(
        state
            .get_string(&AttributePath::new("nfs_read_write").index(0))
            .unwrap(),
        "*"
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn malformed_import_id_makes_no_call() {
    let mut server = Server::new_async().await;
    let (path, _) = list_query("viewpolicies", &[]);
    let list = server.mock("GET", path).expect(0).create_async().await;

    let policy = resource(&server, view_policy::descriptor()).await;
    let response = policy
        .import_state(Context::new(), import_request(view_policy::TYPE_NAME, "default"))
        .await;

    list.assert_async().await;
    assert_eq!(response.diagnostics[0].summary, "Invalid import id");
    assert!(response.diagnostics[0].detail.contains("name|tenant_name"));
    assert!(response.imported_resources.is_empty());
}
