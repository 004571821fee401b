//! Update sequencing against a recording service: call counts, ordering and
//! failure propagation.

mod common;

use std::path::Path;

use launchpad_core::{AppConfig, AppName, ResourceDescriptor};
use launchpad_sync::{
    bundle, AppUpdater, SyncError, TransportError, UpdateOptions, UpdateStage,
};
use tempfile::TempDir;

use common::{app_info, node_npm_bundle, Call, FakeService, Op};

fn foo_config(path: &Path) -> AppConfig {
    let mut cfg = AppConfig::from_yaml(
        "\
name: foo
uris: [foo.vcap.me]
instances: 1
staging:
  model: nodejs/1.0
resources:
  memory: 64
",
        Path::new("launchpad.yml"),
    )
    .expect("config");
    cfg.path = path.to_path_buf();
    cfg
}

fn foo() -> AppName {
    AppName::from("foo")
}

// ---------------------------------------------------------------------------
// 1. Contained bundles
// ---------------------------------------------------------------------------

#[test]
fn internal_links_upload_once_and_replace_once() {
    let dir = TempDir::new().expect("tempdir");
    node_npm_bundle(dir.path());
    let service = FakeService::new().with_app(app_info("foo"));
    let cfg = foo_config(dir.path());

    let report = AppUpdater::new(&service, &cfg)
        .update(&foo(), UpdateOptions::default())
        .expect("update");

    assert_eq!(service.uploads("foo"), 1);
    assert_eq!(service.replaces("foo"), 1);
    assert_eq!(service.queries(), 1);
    assert_eq!(
        service.calls(),
        vec![
            Call::Get("foo".into()),
            Call::Query(3),
            Call::Upload("foo".into()),
            Call::Replace("foo".into()),
        ]
    );
    assert_eq!(
        report.stages,
        vec![
            UpdateStage::Fetching,
            UpdateStage::Validating,
            UpdateStage::Diffing,
            UpdateStage::Uploading,
            UpdateStage::Finalizing,
            UpdateStage::Done,
        ]
    );
    assert_eq!(report.plan.uploads.len(), 3);
    assert!(report.package_bytes.is_some());
}

#[test]
fn replace_carries_configured_fields() {
    let dir = TempDir::new().expect("tempdir");
    node_npm_bundle(dir.path());
    let mut current = app_info("foo");
    current.instances = 4;
    current.resources.memory = 256;
    current.uris = vec!["old.vcap.me".into()];
    let service = FakeService::new().with_app(current);
    let cfg = foo_config(dir.path());

    AppUpdater::new(&service, &cfg)
        .update(&foo(), UpdateOptions::default())
        .expect("update");

    let stored = service.app("foo");
    assert_eq!(stored.instances, 1);
    assert_eq!(stored.resources.memory, 64);
    assert_eq!(stored.uris, vec!["foo.vcap.me".to_string()]);
    assert_eq!(stored.staging.model, "nodejs/1.0");
}

#[test]
fn stored_content_is_referenced_not_uploaded() {
    let dir = TempDir::new().expect("tempdir");
    node_npm_bundle(dir.path());
    let scanned = bundle::scan(dir.path()).expect("scan");
    let package_json = scanned
        .files()
        .find(|e| e.path.ends_with("package.json"))
        .expect("package.json")
        .descriptor();
    let service = FakeService::new()
        .with_app(app_info("foo"))
        .with_stored([package_json]);
    let cfg = foo_config(dir.path());

    let report = AppUpdater::new(&service, &cfg)
        .update(&foo(), UpdateOptions::default())
        .expect("update");

    assert_eq!(report.plan.uploads.len(), 2);
    assert_eq!(report.plan.reused.len(), 1);
    let upload = service.last_upload().expect("upload");
    assert_eq!(upload.files_included, 2);
    assert_eq!(upload.manifest.len(), 3);
}

#[test]
fn second_update_uploads_manifest_only() {
    let dir = TempDir::new().expect("tempdir");
    node_npm_bundle(dir.path());
    let service = FakeService::new().with_app(app_info("foo"));
    let cfg = foo_config(dir.path());
    let mut updater = AppUpdater::new(&service, &cfg);

    updater.update(&foo(), UpdateOptions::default()).expect("first");
    let report = updater.update(&foo(), UpdateOptions::default()).expect("second");

    assert!(report.plan.is_empty());
    assert_eq!(service.uploads("foo"), 2);
    let upload = service.last_upload().expect("upload");
    assert_eq!(upload.files_included, 0);
    assert_eq!(upload.manifest.len(), 3);
}

#[test]
fn dry_run_queries_but_never_mutates() {
    let dir = TempDir::new().expect("tempdir");
    node_npm_bundle(dir.path());
    let service = FakeService::new().with_app(app_info("foo"));
    let cfg = foo_config(dir.path());

    let report = AppUpdater::new(&service, &cfg)
        .update(&foo(), UpdateOptions { dry_run: true })
        .expect("dry run");

    assert!(report.dry_run);
    assert!(report.package_bytes.is_none());
    assert_eq!(service.queries(), 1);
    assert_eq!(service.uploads("foo"), 0);
    assert_eq!(service.replaces("foo"), 0);
    assert_eq!(report.stages.last(), Some(&UpdateStage::Done));
    assert!(!report.stages.contains(&UpdateStage::Uploading));
}

// ---------------------------------------------------------------------------
// 2. Escaping bundles
// ---------------------------------------------------------------------------

#[test]
#[cfg(unix)]
fn external_link_fails_before_any_mutation() {
    let dir = TempDir::new().expect("tempdir");
    let outside = TempDir::new().expect("outside");
    let root = dir.path().join("app_with_external_link");
    common::external_link_bundle(&root, outside.path());
    let service = FakeService::new().with_app(app_info("foo"));
    let cfg = foo_config(&root);
    let mut updater = AppUpdater::new(&service, &cfg);

    let err = updater
        .update(&foo(), UpdateOptions::default())
        .expect_err("must refuse");

    assert!(matches!(err, SyncError::ContainmentViolation { .. }), "got: {err}");
    assert!(err
        .to_string()
        .contains("Can't deploy application containing links"));
    assert_eq!(service.calls(), vec![Call::Get("foo".into())]);
    assert_eq!(
        updater.stages(),
        &[
            UpdateStage::Fetching,
            UpdateStage::Validating,
            UpdateStage::Failed
        ]
    );
}

#[test]
#[cfg(unix)]
fn link_cycle_fails_before_any_mutation() {
    let dir = TempDir::new().expect("tempdir");
    std::fs::write(dir.path().join("app.js"), "1").expect("write");
    std::os::unix::fs::symlink("loop_b", dir.path().join("loop_a")).expect("link");
    std::os::unix::fs::symlink("loop_a", dir.path().join("loop_b")).expect("link");
    let service = FakeService::new().with_app(app_info("foo"));
    let cfg = foo_config(dir.path());

    let err = AppUpdater::new(&service, &cfg)
        .update(&foo(), UpdateOptions::default())
        .expect_err("must refuse");

    assert!(matches!(err, SyncError::LinkCycleDetected { .. }), "got: {err}");
    assert_eq!(service.queries(), 0);
    assert_eq!(service.uploads("foo"), 0);
    assert_eq!(service.replaces("foo"), 0);
}

// ---------------------------------------------------------------------------
// 3. Transport failures
// ---------------------------------------------------------------------------

#[test]
fn missing_app_stops_at_fetch() {
    let dir = TempDir::new().expect("tempdir");
    node_npm_bundle(dir.path());
    let service = FakeService::new();
    let cfg = foo_config(dir.path());

    let err = AppUpdater::new(&service, &cfg)
        .update(&foo(), UpdateOptions::default())
        .expect_err("missing app");

    assert!(matches!(
        err,
        SyncError::Transport(TransportError::NotFound { .. })
    ));
    assert_eq!(service.calls().len(), 1);
}

#[test]
fn query_failure_prevents_upload() {
    let dir = TempDir::new().expect("tempdir");
    node_npm_bundle(dir.path());
    let service = FakeService::new().with_app(app_info("foo"));
    service.fail(Op::Query, TransportError::Network("connection reset".into()));
    let cfg = foo_config(dir.path());

    let err = AppUpdater::new(&service, &cfg)
        .update(&foo(), UpdateOptions::default())
        .expect_err("query fails");

    assert!(matches!(err, SyncError::Transport(TransportError::Network(_))));
    assert_eq!(service.uploads("foo"), 0);
    assert_eq!(service.replaces("foo"), 0);
}

#[test]
fn finalize_failure_is_returned_unmodified_without_retry() {
    let dir = TempDir::new().expect("tempdir");
    node_npm_bundle(dir.path());
    let service = FakeService::new().with_app(app_info("foo"));
    let failure = TransportError::Status {
        method: "PUT",
        url: "http://api.vcap.me/apps/foo".into(),
        status: 500,
        body: "boom".into(),
    };
    service.fail(Op::Replace, failure.clone());
    let cfg = foo_config(dir.path());
    let mut updater = AppUpdater::new(&service, &cfg);

    let err = updater
        .update(&foo(), UpdateOptions::default())
        .expect_err("replace fails");

    match err {
        SyncError::Transport(inner) => assert_eq!(inner, failure),
        other => panic!("expected transport error, got {other}"),
    }
    assert_eq!(service.uploads("foo"), 1);
    assert_eq!(service.replaces("foo"), 1);
    assert_eq!(
        updater.stages().last().copied(),
        Some(UpdateStage::Failed)
    );
    assert_eq!(
        updater.stages()[updater.stages().len() - 2],
        UpdateStage::Finalizing
    );
}

#[test]
fn query_payload_lists_each_distinct_descriptor_once() {
    let dir = TempDir::new().expect("tempdir");
    std::fs::write(dir.path().join("a.txt"), "same").expect("write");
    std::fs::write(dir.path().join("b.txt"), "same").expect("write");
    let service = FakeService::new().with_app(app_info("foo")).with_stored([
        ResourceDescriptor {
            fingerprint: bundle::fingerprint_bytes(b"same"),
            size: 4,
        },
    ]);
    let cfg = foo_config(dir.path());

    let report = AppUpdater::new(&service, &cfg)
        .update(&foo(), UpdateOptions::default())
        .expect("update");

    assert!(service.calls().contains(&Call::Query(1)));
    assert_eq!(report.plan.reused.len(), 2);
    assert!(report.plan.is_empty());
}
