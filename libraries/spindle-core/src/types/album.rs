//! Album types

use super::{AlbumId, Review, UserId};
use crate::error::{Result, SpindleError};
use serde::{Deserialize, Serialize};

/// An album
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Album {
    pub id: AlbumId,
    /// Owner
    pub user: UserId,
    pub artist: String,
    pub title: String,
    pub genre: String,
    pub slug: String,
    pub info: String,
    pub year: String,
    pub label: String,
    pub tracks: i64,
    pub tags: Vec<String>,
    pub likes: Vec<UserId>,
    /// Denormalized from the album's reviews
    pub ratings_average: f64,
    /// Denormalized from the album's reviews
    pub ratings_quantity: i64,
    pub created_at: String,
    pub updated_at: String,
}

/// An album together with its reviews, for detail pages
#[derive(Debug, Clone, Serialize)]
pub struct AlbumWithReviews {
    #[serde(flatten)]
    pub album: Album,
    pub reviews: Vec<Review>,
}

/// Public projection of an album attached to hydrated bookmarks and history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlbumSummary {
    pub id: AlbumId,
    pub artist: String,
    pub title: String,
    pub genre: String,
    pub info: String,
    pub year: String,
    pub label: String,
    pub slug: String,
}

/// Data for creating a new album; the owner comes from the caller
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAlbum {
    pub artist: String,
    pub title: String,
    pub genre: String,
    pub info: String,
    pub year: String,
    pub label: String,
    pub tracks: i64,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl CreateAlbum {
    pub fn validate(&self) -> Result<()> {
        require(&self.artist, "Album must have an artist")?;
        require(&self.title, "Album must have a title")?;
        require(&self.genre, "Album must belong to a genre")?;
        require(&self.info, "Please provide the album info")?;
        require(&self.year, "Album must have a year of release")?;
        require(&self.label, "Please tell us your record label")?;
        validate_tracks(self.tracks)?;
        validate_tags(&self.tags)
    }
}

/// Album edit. Ownership and the rating summary are not editable.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateAlbum {
    pub artist: Option<String>,
    pub title: Option<String>,
    pub genre: Option<String>,
    pub info: Option<String>,
    pub year: Option<String>,
    pub label: Option<String>,
    pub tracks: Option<i64>,
    pub tags: Option<Vec<String>>,
}

impl UpdateAlbum {
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("artist", &self.artist),
            ("title", &self.title),
            ("genre", &self.genre),
            ("info", &self.info),
            ("year", &self.year),
            ("label", &self.label),
        ] {
            if let Some(value) = value {
                require(value, &format!("Album {field} cannot be empty"))?;
            }
        }
        if let Some(tracks) = self.tracks {
            validate_tracks(tracks)?;
        }
        if let Some(tags) = &self.tags {
            validate_tags(tags)?;
        }
        Ok(())
    }
}

/// Per-genre rating statistics for the admin dashboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenreStats {
    pub genre: String,
    pub num_albums: i64,
    pub num_ratings: i64,
    pub avg_rating: f64,
    pub min_rating: f64,
    pub max_rating: f64,
}

/// How many albums carry a tag
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagCount {
    pub tag: String,
    pub count: i64,
}

fn require(value: &str, message: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(SpindleError::invalid_input(message));
    }
    Ok(())
}

fn validate_tracks(tracks: i64) -> Result<()> {
    if tracks < 1 {
        return Err(SpindleError::invalid_input(
            "Please tell us your album number of tracks",
        ));
    }
    Ok(())
}

fn validate_tags(tags: &[String]) -> Result<()> {
    if tags.iter().all(|tag| tag.trim().is_empty()) {
        return Err(SpindleError::invalid_input(
            "Album should have at least one tag",
        ));
    }
    Ok(())
}
