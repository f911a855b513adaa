//! Review types

use super::{AlbumId, ReviewId, UserId};
use crate::error::{Result, SpindleError};
use serde::{Deserialize, Serialize};

/// Lowest accepted rating
pub const MIN_RATING: u8 = 1;
/// Highest accepted rating
pub const MAX_RATING: u8 = 5;
/// Reviews shorter than this (after trimming) are rejected
pub const MIN_REVIEW_LEN: usize = 30;

/// A review of an album. At most one per (album, user) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: ReviewId,
    pub review: String,
    pub rating: u8,
    /// Parent album
    pub album: AlbumId,
    /// Author
    pub user: UserId,
    pub created_at: String,
    pub updated_at: String,
}

/// Data for creating a review; album and author are resolved by the caller
#[derive(Debug, Clone)]
pub struct CreateReview {
    pub album: AlbumId,
    pub user: UserId,
    pub review: String,
    pub rating: u8,
}

impl CreateReview {
    /// Trim the body and check the rating bounds
    pub fn normalized(mut self) -> Result<Self> {
        self.review = normalize_body(&self.review)?;
        validate_rating(self.rating)?;
        Ok(self)
    }
}

/// Review edit. The parent album and the author never change.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateReview {
    pub review: Option<String>,
    pub rating: Option<u8>,
}

impl UpdateReview {
    pub fn normalized(mut self) -> Result<Self> {
        if let Some(body) = self.review.as_deref() {
            self.review = Some(normalize_body(body)?);
        }
        if let Some(rating) = self.rating {
            validate_rating(rating)?;
        }
        Ok(self)
    }

    pub fn is_empty(&self) -> bool {
        self.review.is_none() && self.rating.is_none()
    }
}

pub fn validate_rating(rating: u8) -> Result<()> {
    if rating < MIN_RATING {
        return Err(SpindleError::invalid_input(format!(
            "Rating must not be below {MIN_RATING}.0"
        )));
    }
    if rating > MAX_RATING {
        return Err(SpindleError::invalid_input(format!(
            "Rating must not be above {MAX_RATING}.0"
        )));
    }
    Ok(())
}

fn normalize_body(body: &str) -> Result<String> {
    let body = body.trim();
    if body.is_empty() {
        return Err(SpindleError::invalid_input("A review cannot be empty"));
    }
    if body.chars().count() < MIN_REVIEW_LEN {
        return Err(SpindleError::invalid_input(format!(
            "A review must have more or equal than {MIN_REVIEW_LEN} characters"
        )));
    }
    Ok(body.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const BODY: &str = "An absolute landmark of the genre, start to finish.";

    fn create(review: &str, rating: u8) -> CreateReview {
        CreateReview {
            album: AlbumId::new("a1"),
            user: UserId::new("u1"),
            review: review.to_string(),
            rating,
        }
    }

    #[test]
    fn body_is_trimmed() {
        let review = create(&format!("  {BODY}  "), 4).normalized().unwrap();
        assert_eq!(review.review, BODY);
    }

    #[test]
    fn short_body_is_rejected() {
        let err = create("too short", 4).normalized().unwrap_err();
        assert!(matches!(err, SpindleError::InvalidInput(_)));
    }

    #[test]
    fn padding_does_not_count_towards_length() {
        let padded = format!("{:^40}", "short");
        assert!(create(&padded, 4).normalized().is_err());
    }

    #[test]
    fn rating_bounds_are_inclusive() {
        assert!(create(BODY, 1).normalized().is_ok());
        assert!(create(BODY, 5).normalized().is_ok());
        assert!(create(BODY, 0).normalized().is_err());
        assert!(create(BODY, 6).normalized().is_err());
    }

    #[test]
    fn partial_update_only_checks_present_fields() {
        let update = UpdateReview {
            review: None,
            rating: Some(3),
        };
        assert!(update.normalized().is_ok());
        assert!(UpdateReview::default().is_empty());
    }
}
