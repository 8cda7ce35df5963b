//! Create, read, update and delete through the generic resource

use futures::future::join_all;
use mockito::{Matcher, Server};
use serde_json::json;
use tfplug::context::Context;
use tfplug::resource::{
    CreateResourceRequest, DeleteResourceRequest, ReadResourceRequest, Resource,
    UpdateResourceRequest,
};
use tfplug::types::{has_errors, AttributePath, Dynamic};
use vastdata::engine::{object_of, VastResource};
use vastdata::resources::{qos_policy, snapshot};

use crate::common::{resource, state, string};

#[tokio::test(flavor = "multi_thread")]
async fn create_posts_payload_and_reads_back() {
    let mut server = Server::new_async().await;

    let post = server
        .mock("POST", "/api/qospolicies/")
        .match_header("authorization", "Api-Token secret")
        .match_body(Matcher::Json(json!({
            "name": "gold",
            "static_limits": {"max_reads_iops": 100}
        })))
        .with_status(201)
        .with_body(
            json!({
                "id": 7,
                "guid": "g-7",
                "name": "gold",
                "mode": "STATIC",
                "static_limits": {"max_reads_iops": 100}
            })
            .to_string(),
        )
        .create_async()
        .await;
    let get = server
        .mock("GET", "/api/qospolicies/7/")
        .with_body(
            json!({
                "id": 7,
                "guid": "g-7",
                "name": "gold",
                "mode": "STATIC",
                "io_size_bytes": 65536,
                "static_limits": {"max_reads_iops": 100}
            })
            .to_string(),
        )
        .create_async()
        .await;

    let policy = resource(&server, qos_policy::descriptor()).await;
    let config = state(&[
        ("name", "gold".into()),
        (
            "static_limits",
            object_of(vec![("max_reads_iops", Dynamic::Number(100.0))]),
        ),
    ]);

    let response = policy
        .create(
            Context::new(),
            CreateResourceRequest {
                type_name: qos_policy::TYPE_NAME.to_string(),
                planned_state: config.clone(),
                config,
            },
        )
        .await;

    post.assert_async().await;
    get.assert_async().await;
    assert!(response.diagnostics.is_empty(), "{:?}", response.diagnostics);

    let state = response.new_state;
    assert_eq!(string(&state, "id"), "7");
    assert_eq!(string(&state, "guid"), "g-7");
    assert_eq!(string(&state, "mode"), "STATIC");
    assert_eq!(
        state
            .get_number(&AttributePath::new("io_size_bytes"))
            .unwrap(),
        65536.0
    );
    assert_eq!(
        state
            .get_number(&AttributePath::new("static_limits").attribute("max_reads_iops"))
            .unwrap(),
        100.0
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn create_omits_computed_guid_but_projects_it() {
    let mut server = Server::new_async().await;

    let body = json!({"id": 11, "guid": "abc", "name": "test", "path": "/data"}).to_string();
    let post = server
        .mock("POST", "/api/snapshots/")
        .match_body(Matcher::Json(json!({"name": "test", "path": "/data"})))
        .with_status(201)
        .with_body(&body)
        .create_async()
        .await;
    let _get = server
        .mock("GET", "/api/snapshots/11/")
        .with_body(&body)
        .create_async()
        .await;

    let snap = resource(&server, snapshot::descriptor()).await;
    let config = state(&[("name", "test".into()), ("path", "/data".into())]);

    let response = snap
        .create(
            Context::new(),
            CreateResourceRequest {
                type_name: snapshot::TYPE_NAME.to_string(),
                planned_state: config.clone(),
                config,
            },
        )
        .await;

    post.assert_async().await;
    assert!(response.diagnostics.is_empty(), "{:?}", response.diagnostics);
    assert_eq!(string(&response.new_state, "guid"), "abc");
    assert_eq!(string(&response.new_state, "id"), "11");
}

#[tokio::test(flavor = "multi_thread")]
async fn create_reports_cluster_errors() {
    let mut server = Server::new_async().await;
    let _post = server
        .mock("POST", "/api/snapshots/")
        .with_status(400)
        .with_body(r#"{"detail": "path does not exist"}"#)
        .create_async()
        .await;

    let snap = resource(&server, snapshot::descriptor()).await;
    let config = state(&[("name", "test".into()), ("path", "/missing".into())]);

    let response = snap
        .create(
            Context::new(),
            CreateResourceRequest {
                type_name: snapshot::TYPE_NAME.to_string(),
                planned_state: config.clone(),
                config,
            },
        )
        .await;

    assert!(has_errors(&response.diagnostics));
    assert_eq!(
        response.diagnostics[0].summary,
        "Error occurred while creating a resource in the VAST Data cluster"
    );
    assert!(response.diagnostics[0].detail.contains("path does not exist"));
}

#[tokio::test(flavor = "multi_thread")]
async fn create_requires_required_attributes() {
    let mut server = Server::new_async().await;
    let post = server
        .mock("POST", "/api/snapshots/")
        .expect(0)
        .create_async()
        .await;

    let snap = resource(&server, snapshot::descriptor()).await;
    let config = state(&[("name", "test".into())]);

    let response = snap
        .create(
            Context::new(),
            CreateResourceRequest {
                type_name: snapshot::TYPE_NAME.to_string(),
                planned_state: config.clone(),
                config,
            },
        )
        .await;

    post.assert_async().await;
    assert_eq!(response.diagnostics.len(), 1);
    assert_eq!(response.diagnostics[0].summary, "Missing required argument");
    assert_eq!(
        response.diagnostics[0].attribute,
        Some(AttributePath::new("path"))
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn update_patches_only_changed_attributes() {
    let mut server = Server::new_async().await;

    let patch = server
        .mock("PATCH", "/api/qospolicies/7/")
        .match_body(Matcher::Json(json!({"name": "platinum"})))
        .with_body(r#"{"id": 7, "name": "platinum"}"#)
        .create_async()
        .await;
    let _get = server
        .mock("GET", "/api/qospolicies/7/")
        .with_body(r#"{"id": 7, "guid": "g-7", "name": "platinum", "mode": "STATIC"}"#)
        .create_async()
        .await;

    let policy = resource(&server, qos_policy::descriptor()).await;
    let prior = state(&[
        ("id", "7".into()),
        ("guid", "g-7".into()),
        ("name", "gold".into()),
        ("mode", "STATIC".into()),
    ]);
    let planned = state(&[
        ("id", "7".into()),
        ("name", "platinum".into()),
        ("mode", "STATIC".into()),
    ]);

    let response = policy
        .update(
            Context::new(),
            UpdateResourceRequest {
                type_name: qos_policy::TYPE_NAME.to_string(),
                prior_state: prior,
                planned_state: planned.clone(),
                config: planned,
            },
        )
        .await;

    patch.assert_async().await;
    assert!(response.diagnostics.is_empty(), "{:?}", response.diagnostics);
    assert_eq!(string(&response.new_state, "name"), "platinum");
    assert_eq!(string(&response.new_state, "id"), "7");
    assert_eq!(string(&response.new_state, "guid"), "g-7");
}

#[tokio::test(flavor = "multi_thread")]
async fn update_without_changes_skips_patch() {
    let mut server = Server::new_async().await;

    let patch = server
        .mock("PATCH", "/api/qospolicies/7/")
        .expect(0)
        .create_async()
        .await;
    let get = server
        .mock("GET", "/api/qospolicies/7/")
        .with_body(r#"{"id": 7, "name": "gold"}"#)
        .create_async()
        .await;

    let policy = resource(&server, qos_policy::descriptor()).await;
    let current = state(&[("id", "7".into()), ("name", "gold".into())]);

    let response = policy
        .update(
            Context::new(),
            UpdateResourceRequest {
                type_name: qos_policy::TYPE_NAME.to_string(),
                prior_state: current.clone(),
                planned_state: current.clone(),
                config: current,
            },
        )
        .await;

    patch.assert_async().await;
    get.assert_async().await;
    assert!(response.diagnostics.is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn delete_twice_is_not_an_error() {
    let mut server = Server::new_async().await;
    let current = state(&[("id", "7".into()), ("name", "gold".into())]);
    let policy = resource(&server, qos_policy::descriptor()).await;

    let first = server
        .mock("DELETE", "/api/qospolicies/7/")
        .with_status(204)
        .create_async()
        .await;
    let response = policy
        .delete(
            Context::new(),
            DeleteResourceRequest {
                type_name: qos_policy::TYPE_NAME.to_string(),
                prior_state: current.clone(),
            },
        )
        .await;
    first.assert_async().await;
    assert!(response.diagnostics.is_empty());
    first.remove_async().await;

    let second = server
        .mock("DELETE", "/api/qospolicies/7/")
        .with_status(404)
        .with_body(r#"{"detail": "Not found."}"#)
        .create_async()
        .await;
    let response = policy
        .delete(
            Context::new(),
            DeleteResourceRequest {
                type_name: qos_policy::TYPE_NAME.to_string(),
                prior_state: current,
            },
        )
        .await;
    second.assert_async().await;
    assert!(response.diagnostics.is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn delete_surfaces_other_failures() {
    let mut server = Server::new_async().await;
    let _delete = server
        .mock("DELETE", "/api/qospolicies/7/")
        .with_status(409)
        .with_body(r#"{"detail": "policy is attached to views"}"#)
        .create_async()
        .await;

    let policy = resource(&server, qos_policy::descriptor()).await;
    let response = policy
        .delete(
            Context::new(),
            DeleteResourceRequest {
                type_name: qos_policy::TYPE_NAME.to_string(),
                prior_state: state(&[("id", "7".into())]),
            },
        )
        .await;

    assert!(has_errors(&response.diagnostics));
    assert_eq!(
        response.diagnostics[0].summary,
        "Error occurred while deleting a resource from the VAST Data cluster"
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn read_keeps_state_on_server_error() {
    let mut server = Server::new_async().await;
    let _get = server
        .mock("GET", "/api/qospolicies/7/")
        .with_status(500)
        .with_body("internal error")
        .create_async()
        .await;

    let policy = resource(&server, qos_policy::descriptor()).await;
    let current = state(&[("id", "7".into()), ("name", "gold".into())]);
    let response = policy
        .read(
            Context::new(),
            ReadResourceRequest {
                type_name: qos_policy::TYPE_NAME.to_string(),
                current_state: current.clone(),
            },
        )
        .await;

    assert!(has_errors(&response.diagnostics));
    assert_eq!(response.new_state, Some(current));
}

#[tokio::test(flavor = "multi_thread")]
async fn cancelled_context_makes_no_call() {
    let mut server = Server::new_async().await;
    let post = server
        .mock("POST", "/api/snapshots/")
        .expect(0)
        .create_async()
        .await;

    let snap = resource(&server, snapshot::descriptor()).await;
    let config = state(&[("name", "test".into()), ("path", "/data".into())]);
    let ctx = Context::new();
    ctx.cancel();

    let response = snap
        .create(
            ctx,
            CreateResourceRequest {
                type_name: snapshot::TYPE_NAME.to_string(),
                planned_state: config.clone(),
                config,
            },
        )
        .await;

    post.assert_async().await;
    assert!(has_errors(&response.diagnostics));
    assert_eq!(response.diagnostics[0].summary, "Operation cancelled");
}

#[tokio::test]
async fn unconfigured_resource_reports_error() {
    let policy = VastResource::new(qos_policy::descriptor());
    let response = policy
        .read(
            Context::new(),
            ReadResourceRequest {
                type_name: qos_policy::TYPE_NAME.to_string(),
                current_state: state(&[("id", "7".into())]),
            },
        )
        .await;

    assert_eq!(response.diagnostics[0].summary, "Provider not configured");
    assert!(response.new_state.is_some());
}

#[tokio::test(flavor = "multi_thread")]
async fn concurrent_reads_share_one_provider() {
    let mut server = Server::new_async().await;
    let mut mocks = Vec::new();
    for id in 1..=4 {
        mocks.push(
            server
                .mock("GET", format!("/api/qospolicies/{}/", id).as_str())
                .with_body(json!({"id": id, "name": format!("policy-{}", id)}).to_string())
                .create_async()
                .await,
        );
    }

    let policy = resource(&server, qos_policy::descriptor()).await;
    let reads = (1..=4).map(|id| {
        policy.read(
            Context::new(),
            ReadResourceRequest {
                type_name: qos_policy::TYPE_NAME.to_string(),
                current_state: state(&[("id", id.to_string().into())]),
            },
        )
    });

    for (index, response) in join_all(reads).await.into_iter().enumerate() {
        assert!(response.diagnostics.is_empty());
        let state = response.new_state.unwrap();
        assert_eq!(string(&state, "name"), format!("policy-{}", index + 1));
    }
    for mock in mocks {
        mock.assert_async().await;
    }
}
