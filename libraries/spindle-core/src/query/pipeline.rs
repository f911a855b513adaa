//! Query pipeline
//!
//! Four independent stages turn raw list parameters into a
//! [`QueryDescriptor`]: filter, sort, projection and pagination. Each stage
//! falls back to its own default when its input is missing or malformed, and
//! never fails the request.

use super::filter::{self, Clause, Filter, FilterRejection, FilterValue};
use super::params::QueryParams;
use super::schema::{fields, FieldSpec, ResourceSchema};
use serde::Serialize;

/// Upper bound on `limit`
pub const MAX_PAGE_SIZE: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

impl Direction {
    pub fn sql(self) -> &'static str {
        match self {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortKey {
    pub field: FieldSpec,
    pub direction: Direction,
}

/// Ordered sort keys, always ending in an `id` tiebreaker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sort {
    pub keys: Vec<SortKey>,
}

impl Sort {
    /// Newest first
    pub fn default_order() -> Self {
        Self::from_keys(vec![SortKey {
            field: fields::CREATED_AT,
            direction: Direction::Desc,
        }])
    }

    fn from_keys(mut keys: Vec<SortKey>) -> Self {
        if !keys.iter().any(|k| k.field.name == fields::ID.name) {
            keys.push(SortKey {
                field: fields::ID,
                direction: Direction::Asc,
            });
        }
        Self { keys }
    }

    /// Parse `-ratingsAverage,title`. Unknown and internal names are dropped;
    /// if nothing usable remains the default order applies.
    pub fn parse(schema: &ResourceSchema, tokens: &[&str]) -> Self {
        let mut keys: Vec<SortKey> = Vec::new();
        for &token in tokens {
            let (name, direction) = match token.strip_prefix('-') {
                Some(name) => (name, Direction::Desc),
                None => (token.strip_prefix('+').unwrap_or(token), Direction::Asc),
            };
            match schema.public_field(name) {
                Some(field) if !keys.iter().any(|k| k.field.name == field.name) => {
                    keys.push(SortKey { field, direction });
                }
                Some(_) => {}
                None => tracing::debug!(token, resource = schema.resource, "dropping sort key"),
            }
        }

        if keys.is_empty() {
            Self::default_order()
        } else {
            Self::from_keys(keys)
        }
    }
}

/// Which fields a response carries
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Projection {
    fields: Vec<FieldSpec>,
}

impl Projection {
    /// Every non-internal field
    pub fn all(schema: &ResourceSchema) -> Self {
        Self {
            fields: schema.public_fields().collect(),
        }
    }

    /// `title,artist` selects; `-info,-tags` excludes from the default.
    /// Mixed lists honour the inclusions. `id` is always kept.
    pub fn parse(schema: &ResourceSchema, tokens: &[&str]) -> Self {
        let (exclusions, inclusions): (Vec<&str>, Vec<&str>) =
            tokens.iter().copied().partition(|t| t.starts_with('-'));

        let mut projection = if inclusions.is_empty() {
            let excluded: Vec<&str> = exclusions
                .iter()
                .map(|t| t.trim_start_matches('-'))
                .collect();
            Self {
                fields: schema
                    .public_fields()
                    .filter(|f| f.name == fields::ID.name || !excluded.contains(&f.name))
                    .collect(),
            }
        } else {
            Self {
                fields: schema
                    .public_fields()
                    .filter(|f| inclusions.contains(&f.name))
                    .collect(),
            }
        };

        if projection.fields.is_empty() {
            tracing::debug!(resource = schema.resource, "no usable projection fields");
            return Self::all(schema);
        }
        if !projection.includes(fields::ID.name) {
            projection.fields.insert(0, fields::ID);
        }
        projection
    }

    /// Trusted callers only
    #[must_use]
    pub fn with_internal(mut self, field: FieldSpec) -> Self {
        if !self.includes(field.name) {
            self.fields.push(field);
        }
        self
    }

    pub fn includes(&self, name: &str) -> bool {
        self.fields.iter().any(|f| f.name == name)
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }
}

/// 1-based page and page size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u32,
    pub page_size: u32,
}

impl Pagination {
    pub fn new(page: u32, page_size: u32) -> Self {
        Self {
            page: page.max(1),
            page_size: page_size.clamp(1, MAX_PAGE_SIZE),
        }
    }

    /// Non-numeric or non-positive input falls back to the defaults
    pub fn parse(page: Option<&str>, limit: Option<&str>, default_page_size: u32) -> Self {
        let page = positive(page).unwrap_or(1);
        let page_size = positive(limit).unwrap_or(default_page_size);
        Self::new(page, page_size)
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.page_size)
    }

    pub fn limit(&self) -> u64 {
        u64::from(self.page_size)
    }
}

fn positive(raw: Option<&str>) -> Option<u32> {
    raw.and_then(|v| v.trim().parse::<i64>().ok())
        .filter(|&n| n > 0)
        .map(|n| u32::try_from(n).unwrap_or(u32::MAX))
}

/// One page of results plus what a client needs to render pagination
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total_count: u64,
    pub page: u32,
    pub page_size: u32,
    pub total_pages: u64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total_count: u64, pagination: Pagination) -> Self {
        Self {
            items,
            total_count,
            page: pagination.page,
            page_size: pagination.page_size,
            total_pages: total_count.div_ceil(u64::from(pagination.page_size)),
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total_count: self.total_count,
            page: self.page,
            page_size: self.page_size,
            total_pages: self.total_pages,
        }
    }
}

/// Reference expansion applied after a page is fetched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hydration {
    /// `user` id becomes a user summary
    Owner,
    /// `album` id becomes an album summary
    Album,
}

/// The compiled, request-scoped query
#[derive(Debug, Clone)]
pub struct QueryDescriptor {
    pub schema: &'static ResourceSchema,
    pub filter: Filter,
    pub sort: Sort,
    pub projection: Projection,
    pub pagination: Pagination,
    /// Filter parameters that were dropped as malformed
    pub rejections: Vec<FilterRejection>,
}

/// Builder for a [`QueryDescriptor`]
#[derive(Debug, Clone)]
pub struct QueryPipeline {
    schema: &'static ResourceSchema,
    base: Filter,
    page_size: Option<u32>,
}

impl QueryPipeline {
    pub fn new(schema: &'static ResourceSchema) -> Self {
        Self {
            schema,
            base: Filter::new(),
            page_size: None,
        }
    }

    /// Restrict results to `field = value` regardless of client input
    #[must_use]
    pub fn scope(mut self, field: FieldSpec, value: impl Into<FilterValue>) -> Self {
        self.base = self.base.and(Clause::eq(field, value));
        self
    }

    /// Restrict results to `field` matching any of `values`
    #[must_use]
    pub fn scope_any<V: Into<FilterValue>>(
        mut self,
        field: FieldSpec,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        self.base = self.base.and(Clause {
            field,
            op: filter::Operator::Eq,
            values: values.into_iter().map(Into::into).collect(),
        });
        self
    }

    /// Override the schema's default page size
    #[must_use]
    pub fn page_size(mut self, page_size: u32) -> Self {
        self.page_size = Some(page_size);
        self
    }

    pub fn build(&self, params: &QueryParams) -> QueryDescriptor {
        let schema = self.schema;

        let compiled = filter::compile(schema, params);
        for rejection in &compiled.rejections {
            tracing::debug!(resource = schema.resource, %rejection, "dropping filter parameter");
        }
        if !compiled.ignored.is_empty() {
            tracing::debug!(resource = schema.resource, ignored = ?compiled.ignored, "ignoring unknown filter fields");
        }
        let filter = compiled.filter.merged_under(&self.base);

        let sort_tokens = params.comma_list("sort");
        let sort = if sort_tokens.is_empty() {
            Sort::default_order()
        } else {
            Sort::parse(schema, &sort_tokens)
        };

        let field_tokens = params.comma_list("fields");
        let projection = if field_tokens.is_empty() {
            Projection::all(schema)
        } else {
            Projection::parse(schema, &field_tokens)
        };

        let pagination = Pagination::parse(
            params.last("page"),
            params.last("limit"),
            self.page_size.unwrap_or(schema.default_page_size),
        );

        QueryDescriptor {
            schema,
            filter,
            sort,
            projection,
            pagination,
            rejections: compiled.rejections,
        }
    }
}
