use pngx::api::{EntityId, EntityKind};
use pngx::dry_run::PlannedAction;
use pngx::error::PngxError;
use pngx::upload::{UploadOutcome, Uploader};

use super::common::{populated_api, request, scan_files, session, strings};

#[tokio::test]
async fn test_missing_tag_is_planned_once_and_not_created() {
    let api = populated_api();
    let session = session(&api, true);
    let (_dir, files) = scan_files(&["a.pdf", "b.pdf", "c.pdf"]);

    let mut req = request();
    req.tags = strings(&["inbox", "brand-new", "brand-new"]);

    let report = Uploader::new(&session).upload(&files, &req).await.unwrap();

    assert_eq!(report.planned(), 3);
    assert!(api.created().is_empty());
    assert!(api.uploads().is_empty());
    assert_eq!(api.upload_attempts("a.pdf"), 0);

    let entries = session.dry_run_log().unwrap().entries();
    let creations: Vec<_> = entries
        .iter()
        .filter(|e| matches!(e, PlannedAction::CreateEntity { .. }))
        .collect();
    assert_eq!(
        creations,
        vec![&PlannedAction::CreateEntity {
            kind: EntityKind::Tag,
            name: "brand-new".into()
        }]
    );
}

#[tokio::test]
async fn test_planned_upload_skips_missing_tag() {
    let api = populated_api();
    let session = session(&api, true);
    let (_dir, files) = scan_files(&["2023.12.24-gift_list.pdf"]);

    let mut req = request();
    req.tags = strings(&["inbox", "brand-new"]);
    req.correspondent = Some("Power Co".into());
    req.title_rules = strings(&["s/_/ /"]);

    Uploader::new(&session).upload(&files, &req).await.unwrap();

    let uploads: Vec<_> = session
        .dry_run_log()
        .unwrap()
        .entries()
        .into_iter()
        .filter_map(|e| match e {
            PlannedAction::Upload {
                title,
                created,
                tags,
                correspondent,
                ..
            } => Some((title, created, tags, correspondent)),
            PlannedAction::CreateEntity { .. } => None,
        })
        .collect();

    assert_eq!(
        uploads,
        vec![(
            "gift list".to_string(),
            Some("2023-12-24".to_string()),
            vec![EntityId(1)],
            Some(EntityId(10)),
        )]
    );
}

#[tokio::test]
async fn test_missing_correspondent_is_planned() {
    let api = populated_api();
    let session = session(&api, true);
    let (_dir, files) = scan_files(&["a.pdf"]);

    let mut req = request();
    req.correspondent = Some("Water Co".into());

    let report = Uploader::new(&session).upload(&files, &req).await.unwrap();

    assert_eq!(report.planned(), 1);
    assert!(api.created().is_empty());
    assert_eq!(
        session.dry_run_log().unwrap().entries()[0],
        PlannedAction::CreateEntity {
            kind: EntityKind::Correspondent,
            name: "Water Co".into()
        }
    );
}

#[tokio::test]
async fn test_required_tag_still_fails_in_dry_run() {
    let api = populated_api();
    let session = session(&api, true);
    let (_dir, files) = scan_files(&["a.pdf"]);

    let mut req = request();
    req.tags = strings(&["brand-new"]);
    req.tags_must_exist = true;

    let err = Uploader::new(&session).upload(&files, &req).await.unwrap_err();
    assert!(matches!(err, PngxError::MustExist { .. }));
    assert!(session.dry_run_log().unwrap().is_empty());
}

#[tokio::test]
async fn test_dry_run_plans_upload_without_touching_file() {
    let api = populated_api();
    let session = session(&api, true);
    let dir = tempfile::tempdir().unwrap();
    let ghost = dir.path().join("ghost.pdf");

    let report = Uploader::new(&session)
        .upload(&[ghost.clone()], &request())
        .await
        .unwrap();

    assert!(matches!(report.files[0].outcome, UploadOutcome::Planned));
    assert_eq!(report.files[0].attempts, 1);

    let entries = session.dry_run_log().unwrap().entries();
    assert_eq!(entries.len(), 1);
    assert!(matches!(&entries[0], PlannedAction::Upload { file, .. } if *file == ghost));
    assert_eq!(api.upload_attempts("ghost.pdf"), 0);
}
