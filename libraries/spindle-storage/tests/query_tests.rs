use serde_json::json;
use spindle_core::query::{
    fields, Hydration, QueryParams, QueryPipeline, ALBUM_SCHEMA, BOOKMARK_SCHEMA, REVIEW_SCHEMA,
};
use spindle_core::{CreateBookmark, Role};
use spindle_storage::{bookmarks, query};

use test_helpers::*;

fn params(pairs: &[(&str, &str)]) -> QueryParams {
    QueryParams::from_pairs(pairs.iter().copied())
}

async fn seed_albums(db: &TestDb, count: usize) -> spindle_core::User {
    let owner = create_test_user(db.pool(), "owner", Role::User).await;
    for i in 0..count {
        create_test_album(db.pool(), &owner.id, &format!("Album {i:02}"), &[]).await;
    }
    owner
}

#[tokio::test]
async fn test_pages_partition_results() {
    let db = TestDb::new().await;
    seed_albums(&db, 13).await;

    let mut seen = Vec::new();
    for page in ["1", "2", "3"] {
        let descriptor = QueryPipeline::new(&ALBUM_SCHEMA).build(&params(&[
            ("sort", "title"),
            ("page", page),
            ("limit", "5"),
        ]));
        let result = query::find_page(db.pool(), &descriptor).await.unwrap();
        assert_eq!(result.total_count, 13);
        assert_eq!(result.total_pages, 3);
        assert!(result.items.len() <= 5);
        seen.extend(result.items.into_iter().map(|item| item["title"].clone()));
    }

    let expected: Vec<_> = (0..13).map(|i| json!(format!("Album {i:02}"))).collect();
    assert_eq!(seen, expected);
}

#[tokio::test]
async fn test_page_past_the_end_is_empty() {
    let db = TestDb::new().await;
    seed_albums(&db, 3).await;

    let descriptor = QueryPipeline::new(&ALBUM_SCHEMA).build(&params(&[("page", "9")]));
    let result = query::find_page(db.pool(), &descriptor).await.unwrap();
    assert!(result.items.is_empty());
    assert_eq!(result.total_count, 3);
}

#[tokio::test]
async fn test_numeric_filter_on_reviews() {
    let db = TestDb::new().await;
    let pool = db.pool();
    let owner = seed_albums(&db, 0).await;
    let album = create_test_album(pool, &owner.id, "Reviewed", &[]).await;
    for (i, rating) in [1u8, 3, 4, 5].into_iter().enumerate() {
        let user = create_test_user(pool, &format!("critic{i}"), Role::User).await;
        create_test_review(pool, &album.id, &user.id, rating).await;
    }

    let descriptor = QueryPipeline::new(&REVIEW_SCHEMA)
        .scope(fields::ALBUM, album.id.as_str())
        .build(&params(&[("rating[gte]", "4"), ("sort", "-rating")]));
    let result = query::find_page(pool, &descriptor).await.unwrap();

    let ratings: Vec<_> = result.items.iter().map(|r| r["rating"].clone()).collect();
    assert_eq!(ratings, vec![json!(5), json!(4)]);
    assert_eq!(result.total_count, 2);
}

#[tokio::test]
async fn test_injection_attempt_matches_nothing() {
    let db = TestDb::new().await;
    seed_albums(&db, 2).await;

    let descriptor = QueryPipeline::new(&ALBUM_SCHEMA).build(&params(&[
        ("title", "x' OR '1'='1"),
        ("title[ne]", "nothing"),
    ]));
    let result = query::find_page(db.pool(), &descriptor).await.unwrap();
    assert_eq!(result.total_count, 0);
}

#[tokio::test]
async fn test_tag_membership_and_projection() {
    let db = TestDb::new().await;
    let pool = db.pool();
    let owner = seed_albums(&db, 0).await;
    create_test_album(pool, &owner.id, "Loud", &["rock", "grunge"]).await;
    create_test_album(pool, &owner.id, "Quiet", &["folk"]).await;
    create_test_album(pool, &owner.id, "Both", &["folk", "rock"]).await;

    let descriptor = QueryPipeline::new(&ALBUM_SCHEMA)
        .build(&params(&[("tags", "rock"), ("fields", "title,tags"), ("sort", "title")]));
    let result = query::find_page(pool, &descriptor).await.unwrap();

    assert_eq!(result.total_count, 2);
    let first = &result.items[0];
    assert_eq!(first["title"], json!("Both"));
    assert_eq!(first["tags"], json!(["folk", "rock"]));
    assert!(first.contains_key("id"));
    assert!(!first.contains_key("artist"));
    assert!(!first.contains_key("_version"));
}

#[tokio::test]
async fn test_scope_wins_over_client_filter() {
    let db = TestDb::new().await;
    let pool = db.pool();
    let mine = create_test_user(pool, "me", Role::User).await;
    let theirs = create_test_user(pool, "them", Role::User).await;
    create_test_album(pool, &mine.id, "Mine", &[]).await;
    create_test_album(pool, &theirs.id, "Theirs", &[]).await;

    let descriptor = QueryPipeline::new(&ALBUM_SCHEMA)
        .scope(fields::USER, mine.id.as_str())
        .build(&params(&[("user", theirs.id.as_str())]));
    let result = query::find_page(pool, &descriptor).await.unwrap();

    assert_eq!(result.total_count, 1);
    assert_eq!(result.items[0]["title"], json!("Mine"));
}

#[tokio::test]
async fn test_hydration_replaces_references() {
    let db = TestDb::new().await;
    let pool = db.pool();
    let owner = create_test_user(pool, "owner", Role::User).await;
    let album = create_test_album(pool, &owner.id, "Hydrated", &[]).await;
    bookmarks::create(pool, &owner.id, CreateBookmark { album: album.id.clone() })
        .await
        .unwrap();

    let descriptor = QueryPipeline::new(&BOOKMARK_SCHEMA)
        .scope(fields::USER, owner.id.as_str())
        .build(&QueryParams::new());
    let page = query::find_hydrated(pool, &descriptor, &[Hydration::Album, Hydration::Owner])
        .await
        .unwrap();

    let item = &page.items[0];
    assert_eq!(item["album"]["title"], json!("Hydrated"));
    assert_eq!(item["album"]["slug"], json!("hydrated"));
    assert_eq!(item["user"]["username"], json!("owner"));
    assert!(item["user"].get("email").is_none());
}

#[tokio::test]
async fn test_malformed_parameters_fall_back_to_defaults() {
    let db = TestDb::new().await;
    seed_albums(&db, 8).await;

    let descriptor = QueryPipeline::new(&ALBUM_SCHEMA).build(&params(&[
        ("page", "-2"),
        ("limit", "lots"),
        ("sort", "nonsense"),
        ("tracks[gte]", "many"),
    ]));
    let result = query::find_page(db.pool(), &descriptor).await.unwrap();

    assert_eq!(result.page, 1);
    assert_eq!(result.page_size, 6);
    assert_eq!(result.items.len(), 6);
    assert_eq!(result.total_count, 8);
    assert_eq!(descriptor.rejections.len(), 1);
}
