use spindle_core::{Role, SpindleError, UpdateReview, DEFAULT_RATINGS_AVERAGE};
use spindle_storage::{albums, ratings, reviews};

use test_helpers::*;

#[tokio::test]
async fn test_new_album_has_neutral_summary() {
    let db = TestDb::new().await;
    let owner = create_test_user(db.pool(), "owner", Role::User).await;
    let album = create_test_album(db.pool(), &owner.id, "OK Computer", &[]).await;

    assert_eq!(album.ratings_quantity, 0);
    assert_eq!(album.ratings_average, DEFAULT_RATINGS_AVERAGE);
}

#[tokio::test]
async fn test_summary_follows_create_and_delete() {
    let db = TestDb::new().await;
    let pool = db.pool();
    let owner = create_test_user(pool, "owner", Role::User).await;
    let a = create_test_user(pool, "alice", Role::User).await;
    let b = create_test_user(pool, "bob", Role::User).await;
    let album = create_test_album(pool, &owner.id, "Kid A", &[]).await;

    let four = create_test_review(pool, &album.id, &a.id, 4).await;
    let five = create_test_review(pool, &album.id, &b.id, 5).await;
    assert_eq!(stored_summary(pool, &album.id).await, (2, 4.5));

    reviews::delete(pool, &four).await.unwrap();
    assert_eq!(stored_summary(pool, &album.id).await, (1, 5.0));

    reviews::delete(pool, &five).await.unwrap();
    assert_eq!(stored_summary(pool, &album.id).await, (0, DEFAULT_RATINGS_AVERAGE));
}

#[tokio::test]
async fn test_summary_follows_rating_edit() {
    let db = TestDb::new().await;
    let pool = db.pool();
    let owner = create_test_user(pool, "owner", Role::User).await;
    let a = create_test_user(pool, "alice", Role::User).await;
    let b = create_test_user(pool, "bob", Role::User).await;
    let c = create_test_user(pool, "carol", Role::User).await;
    let album = create_test_album(pool, &owner.id, "Amnesiac", &[]).await;

    let review = create_test_review(pool, &album.id, &a.id, 4).await;
    create_test_review(pool, &album.id, &b.id, 4).await;
    create_test_review(pool, &album.id, &c.id, 5).await;
    // 13 / 3
    assert_eq!(stored_summary(pool, &album.id).await, (3, 4.3));

    let updated = reviews::update(
        pool,
        &review,
        UpdateReview {
            review: None,
            rating: Some(1),
        },
    )
    .await
    .unwrap();
    assert_eq!(updated.rating, 1);
    // 10 / 3
    assert_eq!(stored_summary(pool, &album.id).await, (3, 3.3));
}

#[tokio::test]
async fn test_duplicate_review_conflicts_and_keeps_first() {
    let db = TestDb::new().await;
    let pool = db.pool();
    let owner = create_test_user(pool, "owner", Role::User).await;
    let a = create_test_user(pool, "alice", Role::User).await;
    let album = create_test_album(pool, &owner.id, "The Bends", &[]).await;

    let first = create_test_review(pool, &album.id, &a.id, 2).await;

    let err = reviews::create(
        pool,
        spindle_core::CreateReview {
            album: album.id.clone(),
            user: a.id.clone(),
            review: "Trying to sneak a second review onto the same album.".to_string(),
            rating: 5,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, SpindleError::Conflict(_)));

    let still = reviews::get_by_id(pool, &first.id).await.unwrap().unwrap();
    assert_eq!(still.rating, 2);
    assert_eq!(stored_summary(pool, &album.id).await, (1, 2.0));
}

#[tokio::test]
async fn test_invalid_review_is_rejected_before_write() {
    let db = TestDb::new().await;
    let pool = db.pool();
    let owner = create_test_user(pool, "owner", Role::User).await;
    let album = create_test_album(pool, &owner.id, "Pablo Honey", &[]).await;

    let err = reviews::create(
        pool,
        spindle_core::CreateReview {
            album: album.id.clone(),
            user: owner.id.clone(),
            review: "Too short".to_string(),
            rating: 3,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, SpindleError::InvalidInput(_)));
    assert_eq!(stored_summary(pool, &album.id).await, (0, DEFAULT_RATINGS_AVERAGE));
}

#[tokio::test]
async fn test_recompute_is_idempotent_and_repairs_drift() {
    let db = TestDb::new().await;
    let pool = db.pool();
    let owner = create_test_user(pool, "owner", Role::User).await;
    let a = create_test_user(pool, "alice", Role::User).await;
    let album = create_test_album(pool, &owner.id, "In Rainbows", &[]).await;
    create_test_review(pool, &album.id, &a.id, 3).await;

    let first = ratings::recompute(pool, &album.id).await.unwrap();
    let second = ratings::recompute(pool, &album.id).await.unwrap();
    assert_eq!(first, second);
    assert!(ratings::audit(pool, &album.id).await.unwrap().is_none());

    // Simulate drift left behind by a failed recompute
    sqlx::query("UPDATE albums SET ratings_quantity = 7, ratings_average = 1.2 WHERE id = ?")
        .bind(&album.id)
        .execute(pool)
        .await
        .unwrap();

    let drift = ratings::audit(pool, &album.id).await.unwrap().unwrap();
    assert_eq!(drift.stored.ratings_quantity, 7);
    assert_eq!(drift.expected.ratings_quantity, 1);
    assert_eq!(drift.expected.ratings_average, 3.0);

    let report = ratings::repair_all(pool).await.unwrap();
    assert_eq!(report.albums_checked, 1);
    assert_eq!(report.repaired.len(), 1);
    assert_eq!(stored_summary(pool, &album.id).await, (1, 3.0));

    let clean = ratings::repair_all(pool).await.unwrap();
    assert!(clean.repaired.is_empty());
}

#[tokio::test]
async fn test_recompute_unknown_album_is_not_found() {
    let db = TestDb::new().await;
    let err = ratings::recompute(db.pool(), &"missing".into()).await.unwrap_err();
    assert!(matches!(err, SpindleError::NotFound { .. }));
}

#[tokio::test]
async fn test_concurrent_reviews_settle_to_exact_summary() {
    let db = TestDb::new().await;
    let pool = db.pool().clone();
    let owner = create_test_user(&pool, "owner", Role::User).await;
    let album = create_test_album(&pool, &owner.id, "Hail to the Thief", &[]).await;

    let mut users = Vec::new();
    for i in 0..8 {
        users.push(create_test_user(&pool, &format!("fan{i}"), Role::User).await);
    }

    let mut handles = Vec::new();
    for (i, user) in users.iter().enumerate() {
        let pool = pool.clone();
        let album = album.id.clone();
        let user = user.id.clone();
        let rating = (i % 5) as u8 + 1;
        handles.push(tokio::spawn(async move {
            create_test_review(&pool, &album, &user, rating).await
        }));
    }
    let mut created = Vec::new();
    for handle in handles {
        created.push(handle.await.unwrap());
    }

    // Delete half of them concurrently as well
    let mut deletes = Vec::new();
    for review in created.iter().step_by(2).cloned() {
        let pool = pool.clone();
        deletes.push(tokio::spawn(async move { reviews::delete(&pool, &review).await }));
    }
    for handle in deletes {
        handle.await.unwrap().unwrap();
    }

    assert!(ratings::audit(&pool, &album.id).await.unwrap().is_none());
    let remaining = reviews::get_by_album(&pool, &album.id).await.unwrap();
    assert_eq!(stored_summary(&pool, &album.id).await.0, remaining.len() as i64);
}

#[tokio::test]
async fn test_deleting_album_removes_its_reviews() {
    let db = TestDb::new().await;
    let pool = db.pool();
    let owner = create_test_user(pool, "owner", Role::User).await;
    let a = create_test_user(pool, "alice", Role::User).await;
    let album = create_test_album(pool, &owner.id, "A Moon Shaped Pool", &[]).await;
    let review = create_test_review(pool, &album.id, &a.id, 5).await;

    assert!(albums::delete(pool, &album.id).await.unwrap());
    assert!(reviews::get_by_id(pool, &review.id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_failed_recompute_keeps_review_and_leaves_repairable_drift() {
    let db = TestDb::new().await;
    let pool = db.pool();
    let owner = create_test_user(pool, "owner", Role::User).await;
    let a = create_test_user(pool, "alice", Role::User).await;
    let album = create_test_album(pool, &owner.id, "Amnesiac", &[]).await;

    // Any write to the summary columns now aborts
    sqlx::query(
        "CREATE TRIGGER freeze_summary BEFORE UPDATE OF ratings_quantity ON albums
         BEGIN SELECT RAISE(ABORT, 'summary frozen'); END",
    )
    .execute(pool)
    .await
    .unwrap();

    let review = create_test_review(pool, &album.id, &a.id, 2).await;
    assert!(reviews::get_by_id(pool, &review.id).await.unwrap().is_some());
    assert_eq!(stored_summary(pool, &album.id).await, (0, DEFAULT_RATINGS_AVERAGE));

    assert!(ratings::recompute_after_write(pool, &album.id).await.is_none());
    assert!(ratings::recompute(pool, &album.id).await.is_err());

    let drift = ratings::audit(pool, &album.id).await.unwrap().unwrap();
    assert_eq!(drift.stored.ratings_quantity, 0);
    assert_eq!(drift.expected.ratings_quantity, 1);
    assert_eq!(drift.expected.ratings_average, 2.0);

    sqlx::query("DROP TRIGGER freeze_summary").execute(pool).await.unwrap();

    let report = ratings::repair_all(pool).await.unwrap();
    assert_eq!(report.repaired.len(), 1);
    assert_eq!(report.repaired[0].album, album.id);
    assert!(ratings::audit(pool, &album.id).await.unwrap().is_none());
    assert_eq!(stored_summary(pool, &album.id).await, (1, 2.0));
}
