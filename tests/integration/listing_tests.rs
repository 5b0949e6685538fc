use pngx::api::{EntityKind, MemoryApi};
use pngx::listing::{format_listing, ListFormat};
use pngx::resolver::Creation;
use pngx::session::Session;
use std::sync::Arc;

fn unsorted_api() -> Arc<MemoryApi> {
    Arc::new(
        MemoryApi::new()
            .with_entity(EntityKind::Tag, 5, "taxes")
            .with_entity(EntityKind::Tag, 2, "Bank")
            .with_entity(EntityKind::Tag, 9, "archive")
            .with_entity(EntityKind::Correspondent, 3, "Zeta Insurance")
            .with_entity(EntityKind::Correspondent, 1, "Acme"),
    )
}

#[tokio::test]
async fn test_tag_listing_is_sorted() {
    let session = Session::with_api(unsorted_api(), false);
    let tags = session.tags().await.unwrap();

    let out = format_listing(&tags, ListFormat::default());
    assert_eq!(out, "Bank\narchive\ntaxes");
}

#[tokio::test]
async fn test_listing_is_idempotent() {
    let api = unsorted_api();
    let session = Session::with_api(api.clone(), false);

    let format = ListFormat {
        zero: true,
        ids: true,
    };
    let first = format_listing(&session.tags().await.unwrap(), format);
    let second = format_listing(&session.tags().await.unwrap(), format);

    assert_eq!(first, second);
    assert_eq!(first, "Bank\t2\0archive\t9\0taxes\t5");
}

#[tokio::test]
async fn test_listing_sees_new_entities() {
    let api = unsorted_api();
    let session = Session::with_api(api.clone(), false);

    session.tags().await.unwrap();
    session
        .resolver(EntityKind::Tag)
        .resolve("mail", true, &Creation::default())
        .await
        .unwrap();

    let tags = session.tags().await.unwrap();
    assert!(tags.contains_key("mail"));
    assert_eq!(tags.len(), 4);
}

#[tokio::test]
async fn test_correspondent_listing() {
    let session = Session::with_api(unsorted_api(), false);
    let names = session.list(EntityKind::Correspondent).await.unwrap();
    assert_eq!(
        format_listing(&names, ListFormat::default()),
        "Acme\nZeta Insurance"
    );
}
