use spindle_core::{
    CreateBookmark, CreateGenre, CreateReview, CreateUser, Role, SpindleError, UpdateAlbum,
    UpdateGenre, DEFAULT_RATINGS_AVERAGE,
};
use spindle_storage::{albums, bookmarks, genres, ratings, reviews, users};

use test_helpers::*;

#[tokio::test]
async fn test_album_slugs_are_disambiguated() {
    let db = TestDb::new().await;
    let pool = db.pool();
    let owner = create_test_user(pool, "owner", Role::User).await;

    let first = create_test_album(pool, &owner.id, "Blue Train", &[]).await;
    let second = create_test_album(pool, &owner.id, "Blue Train", &[]).await;
    let third = create_test_album(pool, &owner.id, "Blue  Train!", &[]).await;

    assert_eq!(first.slug, "blue-train");
    assert_eq!(second.slug, "blue-train-2");
    assert_eq!(third.slug, "blue-train-3");

    let found = albums::get_by_slug(pool, "blue-train-2").await.unwrap().unwrap();
    assert_eq!(found.id, second.id);
}

#[tokio::test]
async fn test_concurrent_creates_with_same_title_get_distinct_slugs() {
    let db = TestDb::new().await;
    let pool = db.pool().clone();
    let owner = create_test_user(&pool, "owner", Role::User).await;
    // Each loss means another racer won, so five racers fit in five attempts
    const SLUG_RACERS: usize = 5;

    let mut handles = Vec::new();
    for _ in 0..SLUG_RACERS {
        let pool = pool.clone();
        let owner = owner.id.clone();
        handles.push(tokio::spawn(async move {
            create_test_album(&pool, &owner, "Giant Steps", &[]).await
        }));
    }

    let mut slugs = Vec::new();
    for handle in handles {
        slugs.push(handle.await.unwrap().slug);
    }
    slugs.sort();
    slugs.dedup();
    assert_eq!(slugs.len(), SLUG_RACERS);
    assert!(slugs.iter().any(|slug| slug == "giant-steps"));
}

#[tokio::test]
async fn test_album_update_regenerates_slug_and_ignores_summary() {
    let db = TestDb::new().await;
    let pool = db.pool();
    let owner = create_test_user(pool, "owner", Role::User).await;
    let album = create_test_album(pool, &owner.id, "Working Title", &[]).await;

    let updated = albums::update(
        pool,
        &album.id,
        UpdateAlbum {
            title: Some("Final Title".to_string()),
            tracks: Some(9),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    assert_eq!(updated.slug, "final-title");
    assert_eq!(updated.tracks, 9);
    assert_eq!(updated.ratings_average, DEFAULT_RATINGS_AVERAGE);

    let err = albums::update(
        pool,
        &album.id,
        UpdateAlbum {
            tracks: Some(0),
            ..Default::default()
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, SpindleError::InvalidInput(_)));
}

#[tokio::test]
async fn test_like_toggles() {
    let db = TestDb::new().await;
    let pool = db.pool();
    let owner = create_test_user(pool, "owner", Role::User).await;
    let fan = create_test_user(pool, "fan", Role::User).await;
    let album = create_test_album(pool, &owner.id, "Liked", &[]).await;

    let liked = albums::toggle_like(pool, &album.id, &fan.id).await.unwrap();
    assert_eq!(liked.likes, vec![fan.id.clone()]);

    let both = albums::toggle_like(pool, &album.id, &owner.id).await.unwrap();
    assert_eq!(both.likes.len(), 2);

    let unliked = albums::toggle_like(pool, &album.id, &fan.id).await.unwrap();
    assert_eq!(unliked.likes, vec![owner.id.clone()]);
}

#[tokio::test]
async fn test_tags_top_and_search() {
    let db = TestDb::new().await;
    let pool = db.pool();
    let owner = create_test_user(pool, "owner", Role::User).await;
    let critic = create_test_user(pool, "critic", Role::User).await;

    let loveless = create_test_album(pool, &owner.id, "Loveless", &["shoegaze", "noise"]).await;
    create_test_album(pool, &owner.id, "Souvlaki", &["shoegaze"]).await;
    let nowhere = create_test_album(pool, &owner.id, "Nowhere", &["shoegaze", "dream"]).await;

    create_test_review(pool, &loveless.id, &critic.id, 5).await;
    create_test_review(pool, &nowhere.id, &critic.id, 2).await;

    let tags = albums::tag_counts(pool).await.unwrap();
    assert_eq!(tags[0].tag, "shoegaze");
    assert_eq!(tags[0].count, 3);
    assert_eq!(tags.len(), 3);

    let top = albums::top(pool).await.unwrap();
    assert_eq!(top[0].id, loveless.id);
    assert_eq!(top.last().unwrap().id, nowhere.id);

    let hits = albums::search(pool, "loveless").await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id, loveless.id);

    // Every album shares the artist, so all of them match
    assert_eq!(albums::search(pool, "test artist").await.unwrap().len(), 3);
    assert!(albums::search(pool, "   ").await.unwrap().is_empty());
    assert!(albums::search(pool, "100%_").await.unwrap().is_empty());

    let stats = albums::genre_stats(pool).await.unwrap();
    assert_eq!(stats.len(), 1);
    assert_eq!(stats[0].genre, "ROCK");
    assert_eq!(stats[0].num_albums, 3);
    assert_eq!(stats[0].num_ratings, 2);
    assert_eq!(stats[0].max_rating, 5.0);
}

#[tokio::test]
async fn test_duplicate_bookmark_conflicts() {
    let db = TestDb::new().await;
    let pool = db.pool();
    let owner = create_test_user(pool, "owner", Role::User).await;
    let album = create_test_album(pool, &owner.id, "Saved", &[]).await;

    bookmarks::create(pool, &owner.id, CreateBookmark { album: album.id.clone() })
        .await
        .unwrap();
    let err = bookmarks::create(pool, &owner.id, CreateBookmark { album: album.id.clone() })
        .await
        .unwrap_err();
    assert!(matches!(err, SpindleError::Conflict(_)));

    let missing = bookmarks::create(pool, &owner.id, CreateBookmark { album: "nope".into() })
        .await
        .unwrap_err();
    assert!(matches!(missing, SpindleError::NotFound { .. }));
}

#[tokio::test]
async fn test_genre_names_are_unique() {
    let db = TestDb::new().await;
    let pool = db.pool();
    let owner = create_test_user(pool, "owner", Role::User).await;

    let genre = genres::create(pool, &owner.id, CreateGenre { name: "Trip Hop".to_string() })
        .await
        .unwrap();
    assert_eq!(genre.slug, "trip-hop");

    let err = genres::create(pool, &owner.id, CreateGenre { name: "Trip Hop".to_string() })
        .await
        .unwrap_err();
    assert!(matches!(err, SpindleError::Conflict(_)));

    let renamed = genres::update(pool, &genre.id, UpdateGenre { name: Some("Downtempo".to_string()) })
        .await
        .unwrap();
    assert_eq!(renamed.slug, "downtempo");
    assert!(genres::get_by_slug(pool, "downtempo").await.unwrap().is_some());
}

#[tokio::test]
async fn test_duplicate_email_conflicts() {
    let db = TestDb::new().await;
    let pool = db.pool();
    create_test_user(pool, "taken", Role::User).await;

    let err = users::create(
        pool,
        CreateUser {
            name: "Other".to_string(),
            email: "TAKEN@example.com".to_string(),
            username: "other".to_string(),
            password_hash: "hash".to_string(),
            role: Role::User,
            location: None,
            fav_genres: Vec::new(),
            fav_artists: Vec::new(),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, SpindleError::Conflict(_)));
}

#[tokio::test]
async fn test_password_change_is_stamped() {
    let db = TestDb::new().await;
    let pool = db.pool();
    let user = create_test_user(pool, "rotating", Role::User).await;
    assert!(user.password_changed_at.is_none());

    let updated = users::set_password(pool, &user.id, "new-hash").await.unwrap();
    assert!(updated.password_changed_at.is_some());
    assert_eq!(
        users::get_password_hash(pool, &user.id).await.unwrap().as_deref(),
        Some("new-hash")
    );
}

#[tokio::test]
async fn test_deactivate_purges_owned_catalog() {
    let db = TestDb::new().await;
    let pool = db.pool();
    let leaving = create_test_user(pool, "leaving", Role::User).await;
    let album = create_test_album(pool, &leaving.id, "Gone Soon", &[]).await;
    genres::create(pool, &leaving.id, CreateGenre { name: "Ambient".to_string() })
        .await
        .unwrap();

    users::deactivate(pool, &leaving.id).await.unwrap();

    let user = users::get_by_id(pool, &leaving.id).await.unwrap().unwrap();
    assert!(!user.active);
    assert!(albums::get_by_id(pool, &album.id).await.unwrap().is_none());
    assert!(genres::get_by_slug(pool, "ambient").await.unwrap().is_none());
}

#[tokio::test]
async fn test_hard_delete_recomputes_reviewed_albums() {
    let db = TestDb::new().await;
    let pool = db.pool();
    let owner = create_test_user(pool, "owner", Role::User).await;
    let stays = create_test_user(pool, "stays", Role::User).await;
    let goes = create_test_user(pool, "goes", Role::User).await;
    let album = create_test_album(pool, &owner.id, "Survivor", &[]).await;

    create_test_review(pool, &album.id, &stays.id, 4).await;
    create_test_review(pool, &album.id, &goes.id, 1).await;
    assert_eq!(stored_summary(pool, &album.id).await, (2, 2.5));

    assert!(users::delete(pool, &goes.id).await.unwrap());
    assert_eq!(stored_summary(pool, &album.id).await, (1, 4.0));
    assert!(!users::delete(pool, &goes.id).await.unwrap());
}

#[tokio::test]
async fn test_hard_delete_racing_reviews_leaves_no_drift() {
    let db = TestDb::new().await;
    let pool = db.pool().clone();
    let owner = create_test_user(&pool, "owner", Role::User).await;
    let goes = create_test_user(&pool, "goes", Role::User).await;

    let mut albums = Vec::new();
    for i in 0..6 {
        albums.push(create_test_album(&pool, &owner.id, &format!("Side {i}"), &[]).await);
    }
    create_test_review(&pool, &albums[0].id, &goes.id, 5).await;

    // The user keeps reviewing while the account is being removed
    let mut writes = Vec::new();
    for album in albums.iter().skip(1) {
        let pool = pool.clone();
        let album = album.id.clone();
        let user = goes.id.clone();
        writes.push(tokio::spawn(async move {
            let _ = reviews::create(
                &pool,
                CreateReview {
                    album,
                    user,
                    review: "Heard it once and that was plenty for a lifetime.".to_string(),
                    rating: 1,
                },
            )
            .await;
        }));
    }
    let deleted = {
        let pool = pool.clone();
        let user = goes.id.clone();
        tokio::spawn(async move { users::delete(&pool, &user).await })
    };

    for handle in writes {
        handle.await.unwrap();
    }
    assert!(deleted.await.unwrap().unwrap());

    for album in &albums {
        assert!(ratings::audit(&pool, &album.id).await.unwrap().is_none());
        assert_eq!(stored_summary(&pool, &album.id).await, (0, DEFAULT_RATINGS_AVERAGE));
    }
}
