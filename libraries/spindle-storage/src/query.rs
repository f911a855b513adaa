//! Generic list execution
//!
//! Executes a [`QueryDescriptor`] against its resource table. Identifiers in
//! the SQL text come only from the schema (table, columns, operator tokens);
//! every client-supplied value goes through `push_bind`.

use serde_json::{Map, Value};
use spindle_core::query::{
    Clause, FieldKind, FieldSpec, Filter, FilterValue, Hydration, Operator, Page,
    QueryDescriptor, ResourceSchema, Sort,
};
use spindle_core::Result;
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool, TypeInfo, ValueRef};
use std::collections::{HashMap, HashSet};

/// One projected row, keyed by client field name
pub type Record = Map<String, Value>;

/// `find` + `count` for one page
pub async fn find_page(pool: &SqlitePool, descriptor: &QueryDescriptor) -> Result<Page<Record>> {
    let schema = descriptor.schema;
    let total = count(pool, schema, &descriptor.filter).await?;

    let fields = descriptor.projection.fields();
    let mut builder = QueryBuilder::<Sqlite>::new("SELECT ");
    let mut columns = builder.separated(", ");
    for field in fields {
        columns.push(field.column);
    }
    builder.push(" FROM ").push(schema.table);
    push_where(&mut builder, &descriptor.filter);
    push_order(&mut builder, &descriptor.sort);
    builder
        .push(" LIMIT ")
        .push_bind(descriptor.pagination.limit() as i64)
        .push(" OFFSET ")
        .push_bind(descriptor.pagination.offset() as i64);

    let rows = builder.build().fetch_all(pool).await?;
    let items = rows
        .iter()
        .map(|row| decode_record(row, fields))
        .collect::<Result<Vec<_>>>()?;

    tracing::debug!(
        resource = schema.resource,
        total,
        returned = items.len(),
        page = descriptor.pagination.page,
        "list query"
    );

    Ok(Page::new(items, total, descriptor.pagination))
}

/// Number of rows matching `filter`
pub async fn count(pool: &SqlitePool, schema: &ResourceSchema, filter: &Filter) -> Result<u64> {
    let mut builder = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM ");
    builder.push(schema.table);
    push_where(&mut builder, filter);

    let total: i64 = builder.build().fetch_one(pool).await?.try_get(0)?;
    Ok(u64::try_from(total).unwrap_or(0))
}

pub(crate) fn push_where(builder: &mut QueryBuilder<'_, Sqlite>, filter: &Filter) {
    for (i, clause) in filter.clauses.iter().enumerate() {
        builder.push(if i == 0 { " WHERE " } else { " AND " });
        push_clause(builder, clause);
    }
}

fn push_clause(builder: &mut QueryBuilder<'_, Sqlite>, clause: &Clause) {
    let column = clause.field.column;

    match (clause.values.as_slice(), clause.field.kind, clause.op) {
        ([], _, _) => {
            builder.push("0");
        }
        // Membership in a JSON array column
        (values, FieldKind::List, _) => {
            builder
                .push("EXISTS (SELECT 1 FROM json_each(")
                .push(column)
                .push(") WHERE json_each.value IN (");
            push_values(builder, values);
            builder.push("))");
        }
        ([value], _, op) => {
            builder.push(column).push(" ").push(op.sql()).push(" ");
            push_value(builder, value);
        }
        (values, _, Operator::Eq) => {
            builder.push(column).push(" IN (");
            push_values(builder, values);
            builder.push(")");
        }
        // Comparisons are split one value per clause upstream; keep the
        // strictest reading if several arrive anyway
        (values, _, op) => {
            for (i, value) in values.iter().enumerate() {
                if i > 0 {
                    builder.push(" AND ");
                }
                builder.push(column).push(" ").push(op.sql()).push(" ");
                push_value(builder, value);
            }
        }
    }
}

fn push_values(builder: &mut QueryBuilder<'_, Sqlite>, values: &[FilterValue]) {
    for (i, value) in values.iter().enumerate() {
        if i > 0 {
            builder.push(", ");
        }
        push_value(builder, value);
    }
}

fn push_value(builder: &mut QueryBuilder<'_, Sqlite>, value: &FilterValue) {
    match value {
        FilterValue::Text(text) => builder.push_bind(text.clone()),
        FilterValue::Number(number) => builder.push_bind(*number),
        FilterValue::Bool(flag) => builder.push_bind(i64::from(*flag)),
    };
}

fn push_order(builder: &mut QueryBuilder<'_, Sqlite>, sort: &Sort) {
    builder.push(" ORDER BY ");
    let mut keys = builder.separated(", ");
    for key in &sort.keys {
        keys.push(format!("{} {}", key.field.column, key.direction.sql()));
    }
}

fn decode_record(row: &SqliteRow, fields: &[FieldSpec]) -> Result<Record> {
    let mut record = Map::with_capacity(fields.len());
    for field in fields {
        record.insert(field.name.to_string(), decode_field(row, field)?);
    }
    Ok(record)
}

fn decode_field(row: &SqliteRow, field: &FieldSpec) -> Result<Value> {
    let column = field.column;
    let value = match field.kind {
        FieldKind::Id | FieldKind::Text | FieldKind::Timestamp => row
            .try_get::<Option<String>, _>(column)?
            .map_or(Value::Null, Value::String),
        FieldKind::Number => {
            let raw = row.try_get_raw(column)?;
            if raw.is_null() {
                Value::Null
            } else if raw.type_info().name() == "REAL" {
                serde_json::Number::from_f64(row.try_get::<f64, _>(column)?)
                    .map_or(Value::Null, Value::Number)
            } else {
                Value::from(row.try_get::<i64, _>(column)?)
            }
        }
        FieldKind::Bool => row
            .try_get::<Option<i64>, _>(column)?
            .map_or(Value::Null, |n| Value::Bool(n != 0)),
        FieldKind::List => match row.try_get::<Option<String>, _>(column)? {
            Some(raw) if !raw.is_empty() => serde_json::from_str(&raw)?,
            _ => Value::Array(Vec::new()),
        },
    };
    Ok(value)
}

/// Replace reference ids with summaries, one batched lookup per page
pub async fn hydrate(pool: &SqlitePool, items: &mut [Record], hydration: Hydration) -> Result<()> {
    let key = match hydration {
        Hydration::Owner => "user",
        Hydration::Album => "album",
    };

    let ids: Vec<String> = items
        .iter()
        .filter_map(|item| item.get(key).and_then(Value::as_str))
        .map(str::to_string)
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();
    if ids.is_empty() {
        return Ok(());
    }

    let mut summaries: HashMap<String, Value> = HashMap::with_capacity(ids.len());
    match hydration {
        Hydration::Owner => {
            for summary in crate::users::summaries(pool, &ids).await? {
                summaries.insert(summary.id.to_string(), serde_json::to_value(&summary)?);
            }
        }
        Hydration::Album => {
            for summary in crate::albums::summaries(pool, &ids).await? {
                summaries.insert(summary.id.to_string(), serde_json::to_value(&summary)?);
            }
        }
    }

    for item in items.iter_mut() {
        let Some(id) = item.get(key).and_then(Value::as_str).map(str::to_string) else {
            continue;
        };
        match summaries.get(&id) {
            Some(summary) => {
                item.insert(key.to_string(), summary.clone());
            }
            None => tracing::warn!(key, %id, "dangling reference during hydration"),
        }
    }
    Ok(())
}

/// Page through, then hydrate in place
pub async fn find_hydrated(
    pool: &SqlitePool,
    descriptor: &QueryDescriptor,
    hydration: &[Hydration],
) -> Result<Page<Record>> {
    let mut page = find_page(pool, descriptor).await?;
    for &h in hydration {
        hydrate(pool, &mut page.items, h).await?;
    }
    Ok(page)
}

/// `id IN (?, ?, ...)` lookups used by hydration
pub(crate) fn push_id_list(builder: &mut QueryBuilder<'_, Sqlite>, ids: &[String]) {
    builder.push(" WHERE id IN (");
    let mut list = builder.separated(", ");
    for id in ids {
        list.push_bind(id.clone());
    }
    list.push_unseparated(")");
}
