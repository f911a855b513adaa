//! Genre types

use super::{GenreId, UserId};
use crate::error::{Result, SpindleError};
use serde::{Deserialize, Serialize};

/// A user-defined music genre
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Genre {
    pub id: GenreId,
    pub name: String,
    pub slug: String,
    pub user: UserId,
    pub created_at: String,
    pub updated_at: String,
}

/// Data for creating a new genre
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateGenre {
    pub name: String,
}

/// Genre rename
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateGenre {
    pub name: Option<String>,
}

pub fn validate_genre_name(name: &str) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(SpindleError::invalid_input("A genre must have a name"));
    }
    Ok(name.to_string())
}
