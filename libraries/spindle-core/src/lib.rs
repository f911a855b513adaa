//! Spindle Core
//!
//! Storage-agnostic domain types, query pipeline, access rules and error
//! handling for the Spindle catalog/review service.
//!
//! # Architecture
//!
//! The core crate defines:
//! - **Domain Types**: `Album`, `Review`, `Genre`, `Bookmark`, `History`, `User`
//! - **Query Pipeline**: untrusted list parameters compiled into a typed
//!   [`QueryDescriptor`] (filter, sort, projection, pagination)
//! - **Ownership Guard**: the single per-record visibility/mutability rule
//! - **Rating Summary**: the denormalized `(ratingsQuantity, ratingsAverage)` math
//! - **Error Handling**: Unified `SpindleError` and `Result` types
//!
//! # Example
//!
//! ```rust
//! use spindle_core::query::{QueryParams, QueryPipeline, ALBUM_SCHEMA};
//!
//! let params = QueryParams::from_pairs([
//!     ("rating[gte]", "4"),
//!     ("sort", "-ratingsAverage,title"),
//!     ("page", "2"),
//! ]);
//!
//! let descriptor = QueryPipeline::new(&ALBUM_SCHEMA).build(&params);
//! assert_eq!(descriptor.pagination.offset(), 6);
//! ```

#![forbid(unsafe_code)]

pub mod access;
pub mod error;
pub mod query;
pub mod ratings;
pub mod slug;
pub mod types;

// Re-export commonly used types
pub use access::{allows, authorize, Actor, Owned};
pub use error::{Result, SpindleError};
pub use query::{Page, QueryDescriptor, QueryParams, QueryPipeline};
pub use ratings::{RatingStats, RatingSummary, DEFAULT_RATINGS_AVERAGE};

pub use types::{
    Album, AlbumId, Bookmark, BookmarkId, CreateAlbum, CreateBookmark, CreateGenre,
    CreateHistory, CreateReview, CreateUser, Genre, GenreId, History, HistoryId, Review,
    ReviewId, Role, UpdateAlbum, UpdateGenre, UpdateReview, UpdateUser, User, UserId,
};
