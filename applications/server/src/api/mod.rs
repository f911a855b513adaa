/// API route modules
pub mod albums;
pub mod auth;
pub mod bookmarks;
pub mod genres;
pub mod health;
pub mod history;
pub mod reviews;
pub mod users;

use crate::error::Result;
use axum::{extract::Query, Json};
use serde::Serialize;
use serde_json::{Map, Value};
use spindle_core::{Page, QueryParams};

/// Raw query string pairs; repeated keys are kept
pub type ListQuery = Query<Vec<(String, String)>>;

pub(crate) fn query_params(Query(pairs): ListQuery) -> QueryParams {
    QueryParams::from_pairs(pairs)
}

fn success() -> Map<String, Value> {
    let mut body = Map::new();
    body.insert("status".to_string(), Value::from("success"));
    body
}

/// `{status, <key>: value}`
pub(crate) fn one<T: Serialize>(key: &str, value: &T) -> Result<Json<Value>> {
    let mut body = success();
    body.insert(key.to_string(), serde_json::to_value(value)?);
    Ok(Json(Value::Object(body)))
}

/// `{status, results, <key>: items}` for unpaginated lists
pub(crate) fn many<T: Serialize>(key: &str, items: &[T]) -> Result<Json<Value>> {
    let mut body = success();
    body.insert("results".to_string(), Value::from(items.len()));
    body.insert(key.to_string(), serde_json::to_value(items)?);
    Ok(Json(Value::Object(body)))
}

/// `{status, results, <key>: items, totalCount, page, pageSize, totalPages}`
pub(crate) fn paged<T: Serialize>(key: &str, page: &Page<T>) -> Result<Json<Value>> {
    let mut body = success();
    body.insert("results".to_string(), Value::from(page.items.len()));
    body.insert(key.to_string(), serde_json::to_value(&page.items)?);
    body.insert("totalCount".to_string(), Value::from(page.total_count));
    body.insert("page".to_string(), Value::from(page.page));
    body.insert("pageSize".to_string(), Value::from(page.page_size));
    body.insert("totalPages".to_string(), Value::from(page.total_pages));
    Ok(Json(Value::Object(body)))
}
