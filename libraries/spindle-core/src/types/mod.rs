mod album;
mod bookmark;
mod genre;
mod ids;
mod review;
mod user;

pub use album::{
    Album, AlbumSummary, AlbumWithReviews, CreateAlbum, GenreStats, TagCount, UpdateAlbum,
};
pub use bookmark::{Bookmark, CreateBookmark, CreateHistory, History};
pub use genre::{validate_genre_name, CreateGenre, Genre, UpdateGenre};
pub use ids::{AlbumId, BookmarkId, GenreId, HistoryId, ReviewId, UserId};
pub use review::{
    validate_rating, CreateReview, Review, UpdateReview, MAX_RATING, MIN_RATING, MIN_REVIEW_LEN,
};
pub use user::{
    validate_new_password, CreateUser, Role, UpdateUser, User, UserSummary, MIN_PASSWORD_LEN,
};
