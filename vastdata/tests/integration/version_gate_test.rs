//! Version compatibility gate in front of create and update

use mockito::{Matcher, Server};
use serde_json::json;
use tfplug::context::Context;
use tfplug::resource::{CreateResourceRequest, Resource, UpdateResourceRequest};
use tfplug::types::{has_errors, AttributePath, DiagnosticSeverity, Dynamic};
use vastdata::engine::object_of;
use vastdata::resources::{qos_policy, s3_policy, snapshot, tenant, view_policy};
use vastdata::versions::gate::INCOMPATIBLE_SUMMARY;
use vastdata::versions::{ClusterVersion, ValidationMode};

use crate::common::{resource_on, state, string};

const OLDER: ClusterVersion = ClusterVersion::new(5, 1, 0);

fn bursting_policy() -> tfplug::types::DynamicValue {
    state(&[
        ("name", "burst".into()),
        (
            "static_limits",
            object_of(vec![
                ("max_reads_iops", Dynamic::Number(100.0)),
                ("burst_reads_iops", Dynamic::Number(200.0)),
            ]),
        ),
    ])
}

fn create_request(type_name: &str, config: tfplug::types::DynamicValue) -> CreateResourceRequest {
    CreateResourceRequest {
        type_name: type_name.to_string(),
        planned_state: config.clone(),
        config,
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn strict_mode_aborts_before_any_call() {
    let mut server = Server::new_async().await;
    let post = server
        .mock("POST", "/api/qospolicies/")
        .expect(0)
        .create_async()
        .await;

    let policy = resource_on(
        &server,
        qos_policy::descriptor(),
        OLDER,
        ValidationMode::Strict,
    )
    .await;
    let response = policy
        .create(
            Context::new(),
            create_request(qos_policy::TYPE_NAME, bursting_policy()),
        )
        .await;

    post.assert_async().await;
    assert!(has_errors(&response.diagnostics));
    assert_eq!(response.diagnostics[0].summary, INCOMPATIBLE_SUMMARY);
    assert!(response.diagnostics[0]
        .detail
        .contains(".static_limits.burst_reads_iops"));
}

#[tokio::test(flavor = "multi_thread")]
async fn warn_mode_proceeds_with_unknown_fields() {
    let mut server = Server::new_async().await;
    let body = json!({
        "id": 4,
        "guid": "g-4",
        "name": "burst",
        "static_limits": {"max_reads_iops": 100}
    })
    .to_string();
    let post = server
        .mock("POST", "/api/qospolicies/")
        .with_status(201)
        .with_body(&body)
        .create_async()
        .await;
    let _get = server
        .mock("GET", "/api/qospolicies/4/")
        .with_body(&body)
        .create_async()
        .await;

    let policy = resource_on(
        &server,
        qos_policy::descriptor(),
        OLDER,
        ValidationMode::Warn,
    )
    .await;
    let response = policy
        .create(
            Context::new(),
            create_request(qos_policy::TYPE_NAME, bursting_policy()),
        )
        .await;

    post.assert_async().await;
    assert!(!has_errors(&response.diagnostics));
    assert_eq!(string(&response.new_state, "id"), "4");
}

#[tokio::test(flavor = "multi_thread")]
async fn known_fields_pass_strict_mode() {
    let mut server = Server::new_async().await;
    let body = json!({"id": 4, "name": "plain"}).to_string();
    let post = server
        .mock("POST", "/api/qospolicies/")
        .with_status(201)
        .with_body(&body)
        .create_async()
        .await;
    let _get = server
        .mock("GET", "/api/qospolicies/4/")
        .with_body(&body)
        .create_async()
        .await;

    let policy = resource_on(
        &server,
        qos_policy::descriptor(),
        OLDER,
        ValidationMode::Strict,
    )
    .await;
    let config = state(&[
        ("name", "plain".into()),
        (
            "static_limits",
            object_of(vec![("max_reads_iops", Dynamic::Number(100.0))]),
        ),
    ]);
    let response = policy
        .create(Context::new(), create_request(qos_policy::TYPE_NAME, config))
        .await;

    post.assert_async().await;
    assert!(response.diagnostics.is_empty(), "{:?}", response.diagnostics);
}

#[tokio::test(flavor = "multi_thread")]
async fn resource_without_versioned_descriptor_never_fails() {
    let mut server = Server::new_async().await;
    let body = json!({"id": 8, "name": "nightly", "path": "/data"}).to_string();
    let post = server
        .mock("POST", "/api/snapshots/")
        .with_status(201)
        .with_body(&body)
        .create_async()
        .await;
    let _get = server
        .mock("GET", "/api/snapshots/8/")
        .with_body(&body)
        .create_async()
        .await;

    let snap = resource_on(
        &server,
        snapshot::descriptor(),
        OLDER,
        ValidationMode::Strict,
    )
    .await;
    let config = state(&[("name", "nightly".into()), ("path", "/data".into())]);
    let response = snap
        .create(Context::new(), create_request(snapshot::TYPE_NAME, config))
        .await;

    post.assert_async().await;
    assert!(response
        .diagnostics
        .iter()
        .all(|d| d.severity != DiagnosticSeverity::Error));
}

#[tokio::test(flavor = "multi_thread")]
async fn strict_mode_aborts_update_before_patch() {
    let mut server = Server::new_async().await;
    let patch = server
        .mock("PATCH", "/api/tenants/2/")
        .expect(0)
        .create_async()
        .await;

    let tenants = resource_on(&server, tenant::descriptor(), OLDER, ValidationMode::Strict).await;
    let prior = state(&[("id", "2".into()), ("name", "t1".into())]);
    let planned = state(&[
        ("id", "2".into()),
        ("name", "t1".into()),
        ("use_smb_native", true.into()),
    ]);

    let response = tenants
        .update(
            Context::new(),
            UpdateResourceRequest {
                type_name: tenant::TYPE_NAME.to_string(),
                prior_state: prior.clone(),
                planned_state: planned.clone(),
                config: planned,
            },
        )
        .await;

    patch.assert_async().await;
    assert_eq!(response.diagnostics[0].summary, INCOMPATIBLE_SUMMARY);
    assert!(response.diagnostics[0].detail.contains(".use_smb_native"));
    assert_eq!(response.new_state, prior);
}

#[tokio::test(flavor = "multi_thread")]
async fn fields_added_by_create_hook_are_not_gated() {
    let mut server = Server::new_async().await;
    let body = json!({"id": 5, "guid": "vp-5", "name": "s3", "flavor": "S3_NATIVE"}).to_string();
    let post = server
        .mock("POST", "/api/viewpolicies/")
        .match_body(Matcher::PartialJson(json!({
            "flavor": "S3_NATIVE",
            "s3_special_chars_support": false,
            "nfs_read_write": []
        })))
        .with_status(201)
        .with_body(&body)
        .create_async()
        .await;
    let _get = server
        .mock("GET", "/api/viewpolicies/5/")
        .with_body(&body)
        .create_async()
        .await;

    let policies = resource_on(
        &server,
        view_policy::descriptor(),
        OLDER,
        ValidationMode::Strict,
    )
    .await;
    let config = state(&[("name", "s3".into()), ("flavor", "S3_NATIVE".into())]);
    let response = policies
        .create(Context::new(), create_request(view_policy::TYPE_NAME, config))
        .await;

    post.assert_async().await;
    assert!(!has_errors(&response.diagnostics), "{:?}", response.diagnostics);
    assert_eq!(string(&response.new_state, "id"), "5");
}

#[tokio::test(flavor = "multi_thread")]
async fn configured_field_is_still_gated_alongside_hook() {
    let mut server = Server::new_async().await;
    let post = server
        .mock("POST", "/api/viewpolicies/")
        .expect(0)
        .create_async()
        .await;

    let policies = resource_on(
        &server,
        view_policy::descriptor(),
        OLDER,
        ValidationMode::Strict,
    )
    .await;
    let config = state(&[
        ("name", "s3".into()),
        ("flavor", "S3_NATIVE".into()),
        ("s3_special_chars_support", true.into()),
    ]);
    let response = policies
        .create(Context::new(), create_request(view_policy::TYPE_NAME, config))
        .await;

    post.assert_async().await;
    assert_eq!(response.diagnostics[0].summary, INCOMPATIBLE_SUMMARY);
    assert!(response.diagnostics[0]
        .detail
        .contains(".s3_special_chars_support"));
}

#[tokio::test(flavor = "multi_thread")]
async fn fields_added_by_patch_hook_are_not_gated() {
    let mut server = Server::new_async().await;
    let patch = server
        .mock("PATCH", "/api/viewpolicies/5/")
        .match_body(Matcher::PartialJson(json!({
            "flavor": "S3_NATIVE",
            "s3_special_chars_support": false
        })))
        .with_body("{}")
        .create_async()
        .await;
    let _get = server
        .mock("GET", "/api/viewpolicies/5/")
        .with_body(json!({"id": 5, "name": "s3", "flavor": "S3_NATIVE"}).to_string())
        .create_async()
        .await;

    let policies = resource_on(
        &server,
        view_policy::descriptor(),
        OLDER,
        ValidationMode::Strict,
    )
    .await;
    let prior = state(&[("id", "5".into()), ("name", "s3".into()), ("flavor", "NFS".into())]);
    let planned = state(&[
        ("id", "5".into()),
        ("name", "s3".into()),
        ("flavor", "S3_NATIVE".into()),
    ]);
    let response = policies
        .update(
            Context::new(),
            UpdateResourceRequest {
                type_name: view_policy::TYPE_NAME.to_string(),
                prior_state: prior,
                planned_state: planned.clone(),
                config: planned,
            },
        )
        .await;

    patch.assert_async().await;
    assert!(!has_errors(&response.diagnostics), "{:?}", response.diagnostics);
    assert_eq!(string(&response.new_state, "flavor"), "S3_NATIVE");
}

#[tokio::test(flavor = "multi_thread")]
async fn s3_policy_create_sends_hook_default_in_strict_mode() {
    let mut server = Server::new_async().await;
    let body = json!({"id": 3, "name": "ro", "policy": "{}"}).to_string();
    let post = server
        .mock("POST", "/api/s3userpolicies/")
        .match_body(Matcher::PartialJson(json!({"name": "ro", "enabled": false})))
        .with_status(201)
        .with_body(&body)
        .create_async()
        .await;
    let _get = server
        .mock("GET", "/api/s3userpolicies/3/")
        .with_body(&body)
        .create_async()
        .await;

    let policies = resource_on(&server, s3_policy::descriptor(), OLDER, ValidationMode::Strict).await;
    let config = state(&[("name", "ro".into()), ("policy", "{}".into())]);
    let response = policies
        .create(Context::new(), create_request(s3_policy::TYPE_NAME, config))
        .await;

    post.assert_async().await;
    assert!(!has_errors(&response.diagnostics), "{:?}", response.diagnostics);
    assert!(!response
        .new_state
        .get_bool(&AttributePath::new("enabled"))
        .unwrap());
}

#[tokio::test(flavor = "multi_thread")]
async fn s3_policy_update_in_strict_mode_patches_changes() {
    let mut server = Server::new_async().await;
    let patch = server
        .mock("PATCH", "/api/s3userpolicies/3/")
        .match_body(Matcher::Json(json!({"tenant_id": 2})))
        .with_body("{}")
        .create_async()
        .await;
    let _get = server
        .mock("GET", "/api/s3userpolicies/3/")
        .with_body(json!({"id": 3, "name": "ro", "policy": "{}", "tenant_id": 2}).to_string())
        .create_async()
        .await;

    let policies = resource_on(&server, s3_policy::descriptor(), OLDER, ValidationMode::Strict).await;
    let prior = state(&[
        ("id", "3".into()),
        ("name", "ro".into()),
        ("policy", "{}".into()),
        ("tenant_id", Dynamic::Number(1.0)),
    ]);
    let planned = state(&[
        ("id", "3".into()),
        ("name", "ro".into()),
        ("policy", "{}".into()),
        ("tenant_id", Dynamic::Number(2.0)),
    ]);
    let response = policies
        .update(
            Context::new(),
            UpdateResourceRequest {
                type_name: s3_policy::TYPE_NAME.to_string(),
                prior_state: prior,
                planned_state: planned.clone(),
                config: planned,
            },
        )
        .await;

    patch.assert_async().await;
    assert!(!has_errors(&response.diagnostics), "{:?}", response.diagnostics);
}
