//! Album queries
//!
//! `ratings_quantity` / `ratings_average` are never written here; see
//! [`crate::ratings`].

use crate::query::push_id_list;
use crate::rows::{conflict_or, decode_list, encode_list, is_unique_violation, now};
use spindle_core::slug::{disambiguate, slugify};
use spindle_core::types::{AlbumSummary, AlbumWithReviews, GenreStats, TagCount};
use spindle_core::{Album, AlbumId, CreateAlbum, Result, SpindleError, UpdateAlbum, UserId};
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};

const COLUMNS: &str = "id, user_id, artist, title, genre, slug, info, year, label, tracks, \
                       tags, likes, ratings_average, ratings_quantity, created_at, updated_at";

/// Albums returned by [`top`]
pub const TOP_LIMIT: i64 = 5;
/// Albums returned by [`search`]
pub const SEARCH_LIMIT: i64 = 5;
/// Slug picks per create before a lost race is reported as a conflict
const SLUG_ATTEMPTS: usize = 5;

fn from_row(row: &SqliteRow) -> Result<Album> {
    Ok(Album {
        id: row.try_get("id")?,
        user: row.try_get("user_id")?,
        artist: row.try_get("artist")?,
        title: row.try_get("title")?,
        genre: row.try_get("genre")?,
        slug: row.try_get("slug")?,
        info: row.try_get("info")?,
        year: row.try_get("year")?,
        label: row.try_get("label")?,
        tracks: row.try_get("tracks")?,
        tags: decode_list(row.try_get("tags")?)?,
        likes: decode_list(row.try_get("likes")?)?,
        ratings_average: row.try_get("ratings_average")?,
        ratings_quantity: row.try_get("ratings_quantity")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

pub async fn get_by_id(pool: &SqlitePool, id: &AlbumId) -> Result<Option<Album>> {
    let row = sqlx::query(&format!("SELECT {COLUMNS} FROM albums WHERE id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(from_row).transpose()
}

pub async fn get_by_slug(pool: &SqlitePool, slug: &str) -> Result<Option<Album>> {
    let row = sqlx::query(&format!("SELECT {COLUMNS} FROM albums WHERE slug = ?"))
        .bind(slug)
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(from_row).transpose()
}

/// Album plus its reviews, newest first
pub async fn with_reviews(pool: &SqlitePool, album: Album) -> Result<AlbumWithReviews> {
    let reviews = crate::reviews::get_by_album(pool, &album.id).await?;
    Ok(AlbumWithReviews { album, reviews })
}

pub async fn exists(pool: &SqlitePool, id: &AlbumId) -> Result<bool> {
    let found = sqlx::query("SELECT 1 FROM albums WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(found.is_some())
}

/// Slugs in the `base(-N)?` family
async fn taken_slugs(pool: &SqlitePool, base: &str, exclude: Option<&AlbumId>) -> Result<Vec<String>> {
    let pattern = format!("{}-%", base.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_"));
    let rows = sqlx::query(
        "SELECT slug FROM albums
         WHERE (slug = ? OR slug LIKE ? ESCAPE '\\') AND id <> ?",
    )
    .bind(base)
    .bind(pattern)
    .bind(exclude.map(AlbumId::as_str).unwrap_or(""))
    .fetch_all(pool)
    .await?;

    rows.iter()
        .map(|row| row.try_get::<String, _>("slug").map_err(Into::into))
        .collect()
}

async fn unique_slug(pool: &SqlitePool, title: &str, exclude: Option<&AlbumId>) -> Result<String> {
    let base = slugify(title);
    let base = if base.is_empty() { "album".to_string() } else { base };
    let taken = taken_slugs(pool, &base, exclude).await?;
    Ok(disambiguate(&base, &taken))
}

/// Insert a new album under a free slug
///
/// Two inserts racing for the same title can both see a slug as free; the
/// loser picks again instead of reporting a conflict.
pub async fn create(pool: &SqlitePool, owner: &UserId, album: CreateAlbum) -> Result<Album> {
    album.validate()?;

    let id = AlbumId::generate();
    let tags = encode_list(&album.tags)?;
    let timestamp = now();

    let mut attempt = 1;
    let slug = loop {
        let slug = unique_slug(pool, &album.title, None).await?;
        match insert(pool, &id, owner, &album, &slug, &tags, &timestamp).await {
            Ok(()) => break slug,
            Err(e) if is_unique_violation(&e) && attempt < SLUG_ATTEMPTS => {
                tracing::debug!(%slug, attempt, "slug claimed by a concurrent insert, picking again");
                attempt += 1;
            }
            Err(e) => return Err(conflict_or(e, "An album with this slug already exists")),
        }
    };

    tracing::info!(album = %id, %slug, "album created");

    get_by_id(pool, &id)
        .await?
        .ok_or_else(|| SpindleError::storage("Failed to retrieve created album"))
}

async fn insert(
    pool: &SqlitePool,
    id: &AlbumId,
    owner: &UserId,
    album: &CreateAlbum,
    slug: &str,
    tags: &str,
    timestamp: &str,
) -> sqlx::Result<()> {
    sqlx::query(
        "INSERT INTO albums (id, user_id, artist, title, genre, slug, info, year, label, tracks,
                             tags, likes, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, '[]', ?, ?)",
    )
    .bind(id)
    .bind(owner)
    .bind(album.artist.trim())
    .bind(album.title.trim())
    .bind(album.genre.trim())
    .bind(slug)
    .bind(album.info.trim())
    .bind(album.year.trim())
    .bind(album.label.trim())
    .bind(album.tracks)
    .bind(tags)
    .bind(timestamp)
    .bind(timestamp)
    .execute(pool)
    .await?;
    Ok(())
}

/// Apply the provided fields. A new title regenerates the slug.
pub async fn update(pool: &SqlitePool, id: &AlbumId, changes: UpdateAlbum) -> Result<Album> {
    changes.validate()?;

    let slug = match &changes.title {
        Some(title) => Some(unique_slug(pool, title, Some(id)).await?),
        None => None,
    };
    let tags = changes.tags.as_deref().map(encode_list).transpose()?;

    let mut builder = QueryBuilder::<Sqlite>::new("UPDATE albums SET version = version + 1, updated_at = ");
    builder.push_bind(now());

    let text_fields = [
        ("artist", changes.artist),
        ("title", changes.title),
        ("genre", changes.genre),
        ("info", changes.info),
        ("year", changes.year),
        ("label", changes.label),
        ("slug", slug),
        ("tags", tags),
    ];
    for (column, value) in text_fields {
        if let Some(value) = value {
            builder.push(format!(", {column} = "));
            builder.push_bind(value.trim().to_string());
        }
    }
    if let Some(tracks) = changes.tracks {
        builder.push(", tracks = ").push_bind(tracks);
    }

    builder.push(" WHERE id = ").push_bind(id.as_str().to_string());

    let result = builder
        .build()
        .execute(pool)
        .await
        .map_err(|e| conflict_or(e, "An album with this slug already exists"))?;

    if result.rows_affected() == 0 {
        return Err(SpindleError::not_found("Album", id.as_str()));
    }

    get_by_id(pool, id)
        .await?
        .ok_or_else(|| SpindleError::not_found("Album", id.as_str()))
}

/// Add the user to `likes`, or remove them if already present
pub async fn toggle_like(pool: &SqlitePool, id: &AlbumId, user: &UserId) -> Result<Album> {
    let result = sqlx::query(
        "UPDATE albums
         SET likes = CASE
                 WHEN EXISTS (SELECT 1 FROM json_each(albums.likes) WHERE value = ?1)
                 THEN (SELECT json_group_array(value) FROM json_each(albums.likes) WHERE value <> ?1)
                 ELSE json_insert(likes, '$[#]', ?1)
             END,
             updated_at = ?2
         WHERE id = ?3",
    )
    .bind(user)
    .bind(now())
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(SpindleError::not_found("Album", id.as_str()));
    }

    get_by_id(pool, id)
        .await?
        .ok_or_else(|| SpindleError::not_found("Album", id.as_str()))
}

/// Deletes the album; its reviews, bookmarks and history go with it
pub async fn delete(pool: &SqlitePool, id: &AlbumId) -> Result<bool> {
    let result = sqlx::query("DELETE FROM albums WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Best rated first, ties broken by review count
pub async fn top(pool: &SqlitePool) -> Result<Vec<Album>> {
    let rows = sqlx::query(&format!(
        "SELECT {COLUMNS} FROM albums
         ORDER BY ratings_average DESC, ratings_quantity DESC, id
         LIMIT ?"
    ))
    .bind(TOP_LIMIT)
    .fetch_all(pool)
    .await?;

    rows.iter().map(from_row).collect()
}

/// Per-genre count and rating spread, case-insensitive on genre
pub async fn genre_stats(pool: &SqlitePool) -> Result<Vec<GenreStats>> {
    let rows = sqlx::query(
        "SELECT UPPER(genre) AS genre,
                COUNT(*) AS num_albums,
                SUM(ratings_quantity) AS num_ratings,
                ROUND(AVG(ratings_average), 2) AS avg_rating,
                MIN(ratings_average) AS min_rating,
                MAX(ratings_average) AS max_rating
         FROM albums
         GROUP BY UPPER(genre)
         ORDER BY avg_rating DESC, genre",
    )
    .fetch_all(pool)
    .await?;

    rows.iter()
        .map(|row| {
            Ok(GenreStats {
                genre: row.try_get("genre")?,
                num_albums: row.try_get("num_albums")?,
                num_ratings: row.try_get("num_ratings")?,
                avg_rating: row.try_get("avg_rating")?,
                min_rating: row.try_get("min_rating")?,
                max_rating: row.try_get("max_rating")?,
            })
        })
        .collect()
}

/// Every tag with the number of albums carrying it, most used first
pub async fn tag_counts(pool: &SqlitePool) -> Result<Vec<TagCount>> {
    let rows = sqlx::query(
        "SELECT tag.value AS tag, COUNT(*) AS count
         FROM albums, json_each(albums.tags) AS tag
         GROUP BY tag.value
         ORDER BY count DESC, tag",
    )
    .fetch_all(pool)
    .await?;

    rows.iter()
        .map(|row| {
            Ok(TagCount {
                tag: row.try_get("tag")?,
                count: row.try_get("count")?,
            })
        })
        .collect()
}

/// Best text matches on artist, title and genre
///
/// Each query word scores one point per column it appears in.
pub async fn search(pool: &SqlitePool, q: &str) -> Result<Vec<Album>> {
    let words: Vec<String> = q
        .split_whitespace()
        .map(|w| {
            format!(
                "%{}%",
                w.to_lowercase()
                    .replace('\\', "\\\\")
                    .replace('%', "\\%")
                    .replace('_', "\\_")
            )
        })
        .collect();
    if words.is_empty() {
        return Ok(Vec::new());
    }

    let mut builder = QueryBuilder::<Sqlite>::new(format!("SELECT {COLUMNS} FROM (SELECT *, ("));
    let mut first = true;
    for word in &words {
        for column in ["artist", "title", "genre"] {
            if !first {
                builder.push(" + ");
            }
            first = false;
            builder.push(format!("(LOWER({column}) LIKE "));
            builder.push_bind(word.clone());
            builder.push(" ESCAPE '\\')");
        }
    }
    builder.push(") AS score FROM albums) WHERE score > 0 ORDER BY score DESC, ratings_average DESC, id LIMIT ");
    builder.push_bind(SEARCH_LIMIT);

    let rows = builder.build().fetch_all(pool).await?;
    rows.iter().map(from_row).collect()
}

/// Summaries for hydration
pub async fn summaries(pool: &SqlitePool, ids: &[String]) -> Result<Vec<AlbumSummary>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let mut builder =
        QueryBuilder::<Sqlite>::new("SELECT id, artist, title, genre, info, year, label, slug FROM albums");
    push_id_list(&mut builder, ids);

    let rows = builder.build().fetch_all(pool).await?;
    rows.iter()
        .map(|row| {
            Ok(AlbumSummary {
                id: row.try_get("id")?,
                artist: row.try_get("artist")?,
                title: row.try_get("title")?,
                genre: row.try_get("genre")?,
                info: row.try_get("info")?,
                year: row.try_get("year")?,
                label: row.try_get("label")?,
                slug: row.try_get("slug")?,
            })
        })
        .collect()
}
