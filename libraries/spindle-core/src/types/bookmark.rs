//! Bookmark and listening history types
//!
//! Both are thin (album, user) links; history allows repeats, bookmarks do not.

use super::{AlbumId, BookmarkId, HistoryId, UserId};
use serde::{Deserialize, Serialize};

/// A saved album. At most one per (album, user) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bookmark {
    pub id: BookmarkId,
    pub album: AlbumId,
    pub user: UserId,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateBookmark {
    pub album: AlbumId,
}

/// A listening history entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct History {
    pub id: HistoryId,
    pub album: AlbumId,
    pub user: UserId,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateHistory {
    pub album: AlbumId,
}
