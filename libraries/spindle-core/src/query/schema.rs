//! Per-resource field allow-lists
//!
//! Client parameters can only ever name fields listed here. The column
//! attached to each field is the only identifier that reaches SQL text;
//! everything the client supplies as a value is bound as a parameter.

/// How a field's values are parsed, compared and decoded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Opaque identifier; equality only
    Id,
    Text,
    /// Parsed as `f64`
    Number,
    Bool,
    /// RFC 3339 text, compares lexically
    Timestamp,
    /// JSON array column; equality means membership
    List,
}

/// One queryable field of a resource
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    /// Name used by clients and in JSON output
    pub name: &'static str,
    /// `SQLite` column
    pub column: &'static str,
    pub kind: FieldKind,
    /// Internal fields are `_`-prefixed and only reachable from trusted code
    pub internal: bool,
}

impl FieldSpec {
    pub const fn new(name: &'static str, column: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            column,
            kind,
            internal: false,
        }
    }

    pub const fn internal(name: &'static str, column: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            column,
            kind,
            internal: true,
        }
    }
}

/// Fields shared by every resource table
pub mod fields {
    use super::{FieldKind, FieldSpec};

    pub const ID: FieldSpec = FieldSpec::new("id", "id", FieldKind::Id);
    /// Owner reference
    pub const USER: FieldSpec = FieldSpec::new("user", "user_id", FieldKind::Id);
    /// Parent album reference (reviews, bookmarks, history)
    pub const ALBUM: FieldSpec = FieldSpec::new("album", "album_id", FieldKind::Id);
    pub const TAGS: FieldSpec = FieldSpec::new("tags", "tags", FieldKind::List);
    pub const CREATED_AT: FieldSpec =
        FieldSpec::new("createdAt", "created_at", FieldKind::Timestamp);
    pub const UPDATED_AT: FieldSpec =
        FieldSpec::new("updatedAt", "updated_at", FieldKind::Timestamp);
    /// Bumped on every update
    pub const VERSION: FieldSpec = FieldSpec::internal("_version", "version", FieldKind::Number);
}

/// The allow-list and paging defaults of one resource
#[derive(Debug)]
pub struct ResourceSchema {
    /// Record kind, e.g. `"album"`
    pub resource: &'static str,
    pub table: &'static str,
    pub fields: &'static [FieldSpec],
    pub default_page_size: u32,
}

impl ResourceSchema {
    /// Any field, internal ones included
    pub fn field(&self, name: &str) -> Option<FieldSpec> {
        self.fields.iter().copied().find(|f| f.name == name)
    }

    /// A field a client may name
    pub fn public_field(&self, name: &str) -> Option<FieldSpec> {
        self.field(name).filter(|f| !f.internal)
    }

    pub fn public_fields(&self) -> impl Iterator<Item = FieldSpec> + '_ {
        self.fields.iter().copied().filter(|f| !f.internal)
    }
}

use fields::{ALBUM, CREATED_AT, ID, TAGS, UPDATED_AT, USER, VERSION};

pub static ALBUM_SCHEMA: ResourceSchema = ResourceSchema {
    resource: "album",
    table: "albums",
    fields: &[
        ID,
        USER,
        FieldSpec::new("artist", "artist", FieldKind::Text),
        FieldSpec::new("title", "title", FieldKind::Text),
        FieldSpec::new("genre", "genre", FieldKind::Text),
        FieldSpec::new("slug", "slug", FieldKind::Text),
        FieldSpec::new("info", "info", FieldKind::Text),
        FieldSpec::new("year", "year", FieldKind::Text),
        FieldSpec::new("label", "label", FieldKind::Text),
        FieldSpec::new("tracks", "tracks", FieldKind::Number),
        TAGS,
        FieldSpec::new("likes", "likes", FieldKind::List),
        FieldSpec::new("ratingsAverage", "ratings_average", FieldKind::Number),
        FieldSpec::new("ratingsQuantity", "ratings_quantity", FieldKind::Number),
        CREATED_AT,
        UPDATED_AT,
        VERSION,
    ],
    default_page_size: 6,
};

pub static REVIEW_SCHEMA: ResourceSchema = ResourceSchema {
    resource: "review",
    table: "reviews",
    fields: &[
        ID,
        FieldSpec::new("review", "body", FieldKind::Text),
        FieldSpec::new("rating", "rating", FieldKind::Number),
        ALBUM,
        USER,
        CREATED_AT,
        UPDATED_AT,
        VERSION,
    ],
    default_page_size: 10,
};

pub static GENRE_SCHEMA: ResourceSchema = ResourceSchema {
    resource: "genre",
    table: "genres",
    fields: &[
        ID,
        FieldSpec::new("name", "name", FieldKind::Text),
        FieldSpec::new("slug", "slug", FieldKind::Text),
        USER,
        CREATED_AT,
        UPDATED_AT,
        VERSION,
    ],
    default_page_size: 10,
};

pub static BOOKMARK_SCHEMA: ResourceSchema = ResourceSchema {
    resource: "bookmark",
    table: "bookmarks",
    fields: &[ID, ALBUM, USER, CREATED_AT, UPDATED_AT, VERSION],
    default_page_size: 10,
};

pub static HISTORY_SCHEMA: ResourceSchema = ResourceSchema {
    resource: "history",
    table: "history",
    fields: &[ID, ALBUM, USER, CREATED_AT, UPDATED_AT, VERSION],
    default_page_size: 10,
};

/// Credentials are deliberately absent: no parameter can select them
pub static USER_SCHEMA: ResourceSchema = ResourceSchema {
    resource: "user",
    table: "users",
    fields: &[
        ID,
        FieldSpec::new("name", "name", FieldKind::Text),
        FieldSpec::new("email", "email", FieldKind::Text),
        FieldSpec::new("username", "username", FieldKind::Text),
        FieldSpec::new("role", "role", FieldKind::Text),
        FieldSpec::new("active", "active", FieldKind::Bool),
        FieldSpec::new("location", "location", FieldKind::Text),
        FieldSpec::new("favGenres", "fav_genres", FieldKind::List),
        FieldSpec::new("favArtists", "fav_artists", FieldKind::List),
        FieldSpec::new("avatar", "avatar", FieldKind::Text),
        CREATED_AT,
        UPDATED_AT,
        VERSION,
    ],
    default_page_size: 10,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn internal_fields_are_hidden_from_clients() {
        assert!(ALBUM_SCHEMA.field("_version").is_some());
        assert!(ALBUM_SCHEMA.public_field("_version").is_none());
        assert!(ALBUM_SCHEMA.public_fields().all(|f| !f.name.starts_with('_')));
    }

    #[test]
    fn user_schema_has_no_credential_columns() {
        assert!(USER_SCHEMA
            .fields
            .iter()
            .all(|f| !f.column.contains("password")));
    }
}
