//! Bind and decode helpers shared by every `SQLx` backend.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use futures::{Stream, TryStreamExt};
use rust_decimal::Decimal;
use sqlx::mysql::{MySql, MySqlRow};
use sqlx::postgres::{PgRow, Postgres};
use sqlx::query::Query;
use sqlx::types::{JsonValue, Uuid};
use sqlx::{Column, ColumnIndex, Database, Decode, Either, Encode, Row, Type, TypeInfo, ValueRef};

use super::RawOutcome;
use crate::value::Value;

/// Bind every value positionally.
pub(super) fn bind_values<'q, DB>(
    mut query: Query<'q, DB, <DB as Database>::Arguments<'q>>,
    binds: &[Value],
) -> Query<'q, DB, <DB as Database>::Arguments<'q>>
where
    DB: Database,
    bool: Encode<'q, DB> + Type<DB>,
    i64: Encode<'q, DB> + Type<DB>,
    f64: Encode<'q, DB> + Type<DB>,
    String: Encode<'q, DB> + Type<DB>,
    Vec<u8>: Encode<'q, DB> + Type<DB>,
    Option<String>: Encode<'q, DB> + Type<DB>,
{
    for value in binds {
        query = match value {
            Value::Null => query.bind(None::<String>),
            Value::Bool(v) => query.bind(*v),
            Value::Int(v) => query.bind(*v),
            Value::Float(v) => query.bind(*v),
            Value::Text(v) => query.bind(v.clone()),
            Value::Bytes(v) => query.bind(v.clone()),
        };
    }
    query
}

/// Drain a `fetch_many` stream into a [`RawOutcome`].
///
/// `on_done` sees every statement summary and returns its affected-row count.
/// `decode_extra` handles the dialect's cells that no primitive type accepts.
pub(super) async fn collect<DB, S, F, X>(
    mut stream: S,
    mut on_done: F,
    decode_extra: X,
) -> Result<RawOutcome, sqlx::Error>
where
    DB: Database,
    S: Stream<Item = Result<Either<DB::QueryResult, DB::Row>, sqlx::Error>> + Unpin,
    F: FnMut(&DB::QueryResult) -> u64,
    X: Fn(&DB::Row, usize) -> Option<Value>,
    usize: ColumnIndex<DB::Row>,
    for<'r> i64: Decode<'r, DB> + Type<DB>,
    for<'r> i32: Decode<'r, DB> + Type<DB>,
    for<'r> i16: Decode<'r, DB> + Type<DB>,
    for<'r> f64: Decode<'r, DB> + Type<DB>,
    for<'r> f32: Decode<'r, DB> + Type<DB>,
    for<'r> bool: Decode<'r, DB> + Type<DB>,
    for<'r> String: Decode<'r, DB> + Type<DB>,
    for<'r> Vec<u8>: Decode<'r, DB> + Type<DB>,
{
    let mut outcome = RawOutcome::default();
    while let Some(step) = stream.try_next().await? {
        match step {
            Either::Left(done) => {
                outcome.rows_affected += on_done(&done);
            }
            Either::Right(row) => {
                if outcome.columns.is_empty() {
                    outcome.columns = row
                        .columns()
                        .iter()
                        .map(|c| c.name().to_owned())
                        .collect();
                }
                let cells = (0..row.len())
                    .map(|i| {
                        decode_primitive::<DB>(&row, i)
                            .or_else(|| decode_extra(&row, i))
                            .unwrap_or_else(|| unsupported::<DB>(&row, i))
                    })
                    .collect();
                outcome.rows.push(cells);
            }
        }
    }
    Ok(outcome)
}

/// Decode one cell by trying the supported Rust types in order.
///
/// `try_get` checks the runtime type of the value first, so the first compatible
/// type wins. A NULL cell is accepted by the first attempt.
fn decode_primitive<DB>(row: &DB::Row, index: usize) -> Option<Value>
where
    DB: Database,
    usize: ColumnIndex<DB::Row>,
    for<'r> i64: Decode<'r, DB> + Type<DB>,
    for<'r> i32: Decode<'r, DB> + Type<DB>,
    for<'r> i16: Decode<'r, DB> + Type<DB>,
    for<'r> f64: Decode<'r, DB> + Type<DB>,
    for<'r> f32: Decode<'r, DB> + Type<DB>,
    for<'r> bool: Decode<'r, DB> + Type<DB>,
    for<'r> String: Decode<'r, DB> + Type<DB>,
    for<'r> Vec<u8>: Decode<'r, DB> + Type<DB>,
{
    if let Ok(v) = row.try_get::<Option<i64>, _>(index) {
        return Some(v.map_or(Value::Null, Value::Int));
    }
    if let Ok(v) = row.try_get::<Option<i32>, _>(index) {
        return Some(v.map_or(Value::Null, |v| Value::Int(i64::from(v))));
    }
    if let Ok(v) = row.try_get::<Option<i16>, _>(index) {
        return Some(v.map_or(Value::Null, |v| Value::Int(i64::from(v))));
    }
    if let Ok(v) = row.try_get::<Option<f64>, _>(index) {
        return Some(v.map_or(Value::Null, Value::Float));
    }
    if let Ok(v) = row.try_get::<Option<f32>, _>(index) {
        return Some(v.map_or(Value::Null, |v| Value::Float(f64::from(v))));
    }
    if let Ok(v) = row.try_get::<Option<bool>, _>(index) {
        return Some(v.map_or(Value::Null, Value::Bool));
    }
    if let Ok(v) = row.try_get::<Option<String>, _>(index) {
        return Some(v.map_or(Value::Null, Value::Text));
    }
    if let Ok(v) = row.try_get::<Option<Vec<u8>>, _>(index) {
        return Some(v.map_or(Value::Null, Value::Bytes));
    }
    None
}

/// Server-side types without a primitive mapping, rendered as text the way the
/// server prints them: `DECIMAL`/`NUMERIC` keep their scale, temporal values use
/// SQL literal format and JSON is re-serialised.
fn decode_as_text<DB>(row: &DB::Row, index: usize) -> Option<Value>
where
    DB: Database,
    usize: ColumnIndex<DB::Row>,
    for<'r> Decimal: Decode<'r, DB> + Type<DB>,
    for<'r> NaiveDateTime: Decode<'r, DB> + Type<DB>,
    for<'r> DateTime<Utc>: Decode<'r, DB> + Type<DB>,
    for<'r> NaiveDate: Decode<'r, DB> + Type<DB>,
    for<'r> NaiveTime: Decode<'r, DB> + Type<DB>,
    for<'r> JsonValue: Decode<'r, DB> + Type<DB>,
{
    if let Ok(v) = row.try_get::<Option<Decimal>, _>(index) {
        return Some(text(v));
    }
    if let Ok(v) = row.try_get::<Option<NaiveDateTime>, _>(index) {
        return Some(text(v));
    }
    if let Ok(v) = row.try_get::<Option<DateTime<Utc>>, _>(index) {
        return Some(v.map_or(Value::Null, timestamp_tz));
    }
    if let Ok(v) = row.try_get::<Option<NaiveDate>, _>(index) {
        return Some(text(v));
    }
    if let Ok(v) = row.try_get::<Option<NaiveTime>, _>(index) {
        return Some(text(v));
    }
    if let Ok(v) = row.try_get::<Option<JsonValue>, _>(index) {
        return Some(text(v));
    }
    None
}

/// `PostgreSQL` cells beyond the primitives, including `UUID`.
pub(super) fn decode_postgres(row: &PgRow, index: usize) -> Option<Value> {
    decode_as_text::<Postgres>(row, index)
        .or_else(|| row.try_get::<Option<Uuid>, _>(index).ok().map(text))
}

/// `MySQL` cells beyond the primitives, including `UNSIGNED` integers.
pub(super) fn decode_mysql(row: &MySqlRow, index: usize) -> Option<Value> {
    if let Ok(v) = row.try_get::<Option<u64>, _>(index) {
        return Some(v.map_or(Value::Null, unsigned));
    }
    decode_as_text::<MySql>(row, index)
}

fn text<T: ToString>(value: Option<T>) -> Value {
    value.map_or(Value::Null, |v| Value::Text(v.to_string()))
}

fn timestamp_tz(value: DateTime<Utc>) -> Value {
    Value::Text(value.format("%Y-%m-%d %H:%M:%S%.f%:z").to_string())
}

/// Values past `i64::MAX` keep their digits as text.
fn unsigned(value: u64) -> Value {
    i64::try_from(value).map_or_else(|_| Value::Text(value.to_string()), Value::Int)
}

fn unsupported<DB>(row: &DB::Row, index: usize) -> Value
where
    DB: Database,
    usize: ColumnIndex<DB::Row>,
{
    let type_name = row
        .try_get_raw(index)
        .map(|raw| raw.type_info().name().to_owned())
        .unwrap_or_default();
    tracing::debug!(column = index, type_name, "cell type not supported, decoded as NULL");
    Value::Null
}
