//! Generic list query: untrusted parameters in, typed descriptor out

pub mod filter;
mod params;
mod pipeline;
pub mod schema;

pub use filter::{
    Clause, CompiledFilter, Filter, FilterRejection, FilterValue, Operator,
};
pub use params::{QueryParams, RESERVED_KEYS};
pub use pipeline::{
    Direction, Hydration, Page, Pagination, Projection, QueryDescriptor, QueryPipeline, Sort,
    SortKey, MAX_PAGE_SIZE,
};
pub use schema::{
    fields, FieldKind, FieldSpec, ResourceSchema, ALBUM_SCHEMA, BOOKMARK_SCHEMA, GENRE_SCHEMA,
    HISTORY_SCHEMA, REVIEW_SCHEMA, USER_SCHEMA,
};
