use pngx::api::{ApiError, EntityId, EntityKind, MemoryApi};
use pngx::error::PngxError;
use pngx::upload::{UploadOutcome, Uploader};
use std::sync::Arc;

use super::common::{populated_api, request, scan_files, session, strings};

#[tokio::test]
async fn test_upload_attaches_resolved_metadata() {
    let api = populated_api();
    let session = session(&api, false);
    let (_dir, files) = scan_files(&["2024-03-05-power_bill.pdf"]);

    let mut req = request();
    req.tags = strings(&["bills", "inbox"]);
    req.correspondent = Some("Power Co".into());
    req.document_type = Some("Invoice".into());
    req.title_rules = strings(&["s/_/ /g"]);

    let report = Uploader::new(&session).upload(&files, &req).await.unwrap();

    assert_eq!(report.uploaded(), 1);
    assert_eq!(report.files[0].attempts, 1);
    assert!(report.files[0].outcome.task_id().is_some());

    let uploads = api.uploads();
    assert_eq!(uploads.len(), 1);
    let doc = &uploads[0];
    assert_eq!(doc.file_name, "2024-03-05-power_bill.pdf");
    assert_eq!(doc.title, "power bill");
    assert_eq!(doc.created.as_deref(), Some("2024-03-05"));
    assert_eq!(doc.tags, vec![EntityId(2), EntityId(1)]);
    assert_eq!(doc.correspondent, Some(EntityId(10)));
    assert_eq!(doc.document_type, Some(EntityId(20)));
    assert!(api.created().is_empty());
}

#[tokio::test]
async fn test_resolution_happens_once_per_batch() {
    let api = populated_api();
    let session = session(&api, false);
    let (_dir, files) = scan_files(&["a.pdf", "b.pdf", "c.pdf", "d.pdf"]);

    let mut req = request();
    req.tags = strings(&["inbox", "new-tag", "inbox"]);
    req.correspondent = Some("Power Co".into());

    let report = Uploader::new(&session).upload(&files, &req).await.unwrap();

    assert_eq!(report.uploaded(), 4);
    assert_eq!(api.list_calls(EntityKind::Tag), 1);
    assert_eq!(api.list_calls(EntityKind::Correspondent), 1);
    assert_eq!(api.created_names(EntityKind::Tag), vec!["new-tag"]);

    let new_id = api.uploads()[0].tags[1];
    for doc in api.uploads() {
        assert_eq!(doc.tags, vec![EntityId(1), new_id]);
    }
}

#[tokio::test]
async fn test_second_batch_reuses_session_cache() {
    let api = populated_api();
    let session = session(&api, false);
    let (_dir, files) = scan_files(&["a.pdf"]);

    let mut req = request();
    req.tags = strings(&["bills"]);

    let uploader = Uploader::new(&session);
    uploader.upload(&files, &req).await.unwrap();
    uploader.upload(&files, &req).await.unwrap();

    assert_eq!(api.list_calls(EntityKind::Tag), 1);
    assert_eq!(api.upload_attempts("a.pdf"), 2);
}

#[tokio::test]
async fn test_created_entities_get_owner_and_group_permissions() {
    let api = populated_api();
    let session = session(&api, false);
    let (_dir, files) = scan_files(&["a.pdf"]);

    let mut req = request();
    req.owner = Some("alice".into());
    req.groups = strings(&["family"]);
    req.tags = strings(&["fresh"]);
    req.correspondent = Some("New Corp".into());

    Uploader::new(&session).upload(&files, &req).await.unwrap();

    let created = api.created();
    assert_eq!(created.len(), 2);
    for (_, draft) in &created {
        assert_eq!(draft.owner, Some(EntityId(30)));
        let perms = draft.set_permissions.as_ref().unwrap();
        assert_eq!(perms.change.groups, vec![EntityId(40)]);
    }
    assert_eq!(created[1].0, EntityKind::Correspondent);
}

#[tokio::test]
async fn test_missing_group_aborts_batch() {
    let api = populated_api();
    let session = session(&api, false);
    let (_dir, files) = scan_files(&["a.pdf"]);

    let mut req = request();
    req.groups = strings(&["famly"]);

    let err = Uploader::new(&session).upload(&files, &req).await.unwrap_err();
    match err {
        PngxError::EntityNotFound {
            kind, suggestion, ..
        } => {
            assert_eq!(kind, EntityKind::Group);
            assert_eq!(suggestion.as_deref(), Some("family"));
        }
        other => panic!("Expected EntityNotFound, got {other:?}"),
    }
    assert_eq!(api.upload_attempts("a.pdf"), 0);
}

#[tokio::test]
async fn test_missing_owner_aborts_batch() {
    let api = populated_api();
    let session = session(&api, false);
    let (_dir, files) = scan_files(&["a.pdf"]);

    let mut req = request();
    req.owner = Some("mallory".into());

    let err = Uploader::new(&session).upload(&files, &req).await.unwrap_err();
    assert!(matches!(
        err,
        PngxError::EntityNotFound {
            kind: EntityKind::User,
            ..
        }
    ));
    assert!(api.uploads().is_empty());
}

#[tokio::test]
async fn test_required_correspondent_missing_fails_before_uploads() {
    let api = populated_api();
    let session = session(&api, false);
    let (_dir, files) = scan_files(&["a.pdf", "b.pdf"]);

    let mut req = request();
    req.correspondent = Some("Nobody".into());
    req.correspondent_must_exist = true;

    let err = Uploader::new(&session).upload(&files, &req).await.unwrap_err();

    assert!(matches!(
        err,
        PngxError::MustExist {
            kind: EntityKind::Correspondent,
            setting: "correspondent_must_exist",
            ..
        }
    ));
    assert_eq!(api.upload_attempts("a.pdf"), 0);
    assert_eq!(api.upload_attempts("b.pdf"), 0);
    assert!(api.created().is_empty());
}

#[tokio::test]
async fn test_required_tag_missing_names_the_tag() {
    let api = populated_api();
    let session = session(&api, false);
    let (_dir, files) = scan_files(&["a.pdf"]);

    let mut req = request();
    req.tags = strings(&["bils"]);
    req.tags_must_exist = true;

    let err = Uploader::new(&session).upload(&files, &req).await.unwrap_err();
    assert_eq!(
        err.to_string(),
        "Tag 'bils' does not exist (and upload.tags_must_exist is set) (did you mean 'bills'?)"
    );
}

#[tokio::test]
async fn test_empty_file_list_does_nothing() {
    let api = populated_api();
    let session = session(&api, false);

    let mut req = request();
    req.tags = strings(&["never-resolved"]);

    let report = Uploader::new(&session).upload(&[], &req).await.unwrap();
    assert!(report.files.is_empty());
    assert_eq!(api.list_calls(EntityKind::Tag), 0);
}

#[tokio::test]
async fn test_missing_file_fails_without_retry() {
    let api = populated_api();
    let session = session(&api, false);
    let (dir, mut files) = scan_files(&["present.pdf"]);
    files.push(dir.path().join("absent.pdf"));

    let report = Uploader::new(&session).upload(&files, &request()).await.unwrap();

    assert_eq!(report.uploaded(), 1);
    assert_eq!(report.failed(), 1);
    let absent = &report.files[1];
    assert!(matches!(absent.outcome, UploadOutcome::Failed(_)));
    assert_eq!(absent.attempts, 0);
    assert_eq!(api.upload_attempts("absent.pdf"), 0);
}

#[tokio::test]
async fn test_one_failing_file_does_not_stop_the_batch() {
    let api = populated_api();
    let session = session(&api, false);
    let (_dir, files) = scan_files(&["good.pdf", "bad.pdf"]);
    api.fail_uploads(
        "bad.pdf",
        vec![ApiError::Status {
            status: 400,
            message: "invalid document".into(),
        }],
    );

    let report = Uploader::new(&session).upload(&files, &request()).await.unwrap();

    assert_eq!(report.uploaded(), 1);
    assert!(matches!(report.files[1].outcome, UploadOutcome::Failed(_)));
    // Client errors are not retried.
    assert_eq!(api.upload_attempts("bad.pdf"), 1);
    assert!(report.denied.is_none());
}

#[tokio::test]
async fn test_denied_batch_is_reported_not_raised() {
    let api = populated_api();
    api.deny_uploads();
    let session = session(&api, false);
    let (_dir, files) = scan_files(&["a.pdf", "b.pdf"]);

    let report = Uploader::new(&session).upload(&files, &request()).await.unwrap();

    assert!(report.denied.is_some());
    assert_eq!(report.uploaded(), 0);
    assert!(report
        .files
        .iter()
        .all(|f| matches!(f.outcome, UploadOutcome::Denied(_))));
    assert_eq!(api.upload_attempts("a.pdf"), 1);
}

#[tokio::test]
async fn test_session_closes_backend() {
    let api = Arc::new(MemoryApi::new());
    let (_dir, files) = scan_files(&["a.pdf"]);

    let report = session(&api, false)
        .run(|s| async move {
            let report = Uploader::new(&s).upload(&files, &request()).await;
            report
        })
        .await
        .unwrap();

    assert_eq!(report.uploaded(), 1);
    assert!(api.is_closed());
}
