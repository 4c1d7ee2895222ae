//! Minimal dialect-aware query builder.
//!
//! Values always travel as positional binds. Columns that the carried
//! [`VulnSettings`] flag are attached to the params as `vuln_fields`, so the
//! connection evaluates blindness for the statement.

use crate::connection::Connection;
use crate::params::Params;
use crate::value::{ResultSet, Value};
use crate::vuln::VulnSettings;
use crate::{DbError, Dialect, Result};
use std::str::FromStr;

/// Statement kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryKind {
    Select,
    Insert,
    Update,
    Delete,
    Count,
}

impl QueryKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Select => "select",
            Self::Insert => "insert",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Count => "count",
        }
    }
}

impl std::fmt::Display for QueryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QueryKind {
    type Err = DbError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "select" => Ok(Self::Select),
            "insert" => Ok(Self::Insert),
            "update" => Ok(Self::Update),
            "delete" => Ok(Self::Delete),
            "count" => Ok(Self::Count),
            _ => Err(DbError::InvalidQuery(format!("unknown query type '{s}'"))),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Order {
    #[default]
    Asc,
    Desc,
}

impl Order {
    fn as_sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// Query under construction. Obtain one with [`Connection::query`].
#[derive(Debug, Clone)]
pub struct Query {
    kind: QueryKind,
    dialect: Dialect,
    table: Option<String>,
    fields: Vec<String>,
    conditions: Vec<(String, Value)>,
    assignments: Vec<(String, Value)>,
    order_by: Vec<(String, Order)>,
    limit: Option<u64>,
    offset: Option<u64>,
    settings: VulnSettings,
}

impl Query {
    #[must_use]
    pub fn new(kind: QueryKind, dialect: Dialect) -> Self {
        Self {
            kind,
            dialect,
            table: None,
            fields: Vec::new(),
            conditions: Vec::new(),
            assignments: Vec::new(),
            order_by: Vec::new(),
            limit: None,
            offset: None,
            settings: VulnSettings::default(),
        }
    }

    #[must_use]
    pub fn with_settings(mut self, settings: VulnSettings) -> Self {
        self.settings = settings;
        self
    }

    #[must_use]
    pub fn kind(&self) -> QueryKind {
        self.kind
    }

    #[must_use]
    pub fn settings(&self) -> &VulnSettings {
        &self.settings
    }

    #[must_use]
    pub fn table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    /// Columns to select. Empty means `*`.
    #[must_use]
    pub fn fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields.extend(fields.into_iter().map(Into::into));
        self
    }

    /// `column = value`, or `column IS NULL` for [`Value::Null`].
    #[must_use]
    pub fn where_eq(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions.push((column.into(), value.into()));
        self
    }

    /// Column assignment for `insert` and `update`. [`Value::Null`] is written
    /// as a literal `NULL`.
    #[must_use]
    pub fn set(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.assignments.push((column.into(), value.into()));
        self
    }

    #[must_use]
    pub fn order_by(mut self, column: impl Into<String>, order: Order) -> Self {
        self.order_by.push((column.into(), order));
        self
    }

    /// Only applies to `select`.
    #[must_use]
    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Only applies to `select`.
    #[must_use]
    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Render SQL and collect the bind values.
    ///
    /// # Errors
    /// Returns `DbError::InvalidQuery` if no table is set, or an `insert`/`update`
    /// has no assignments.
    pub fn build(&self) -> Result<(String, Params)> {
        let table = self
            .table
            .as_deref()
            .ok_or_else(|| DbError::InvalidQuery(format!("{} without a table", self.kind)))?;
        let table = self.dialect.quote_ident(table);

        let mut binds = Vec::new();
        let head = match self.kind {
            QueryKind::Select => {
                let fields = if self.fields.is_empty() {
                    "*".to_owned()
                } else {
                    self.quote_list(self.fields.iter())
                };
                format!("SELECT {fields} FROM {table}")
            }
            QueryKind::Count => format!("SELECT COUNT(*) AS count FROM {table}"),
            QueryKind::Delete => format!("DELETE FROM {table}"),
            QueryKind::Insert => {
                self.require_assignments()?;
                let columns = self.quote_list(self.assignments.iter().map(|(c, _)| c));
                let placeholders = self
                    .assignments
                    .iter()
                    .map(|(_, v)| self.assign_value(&mut binds, v))
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("INSERT INTO {table} ({columns}) VALUES ({placeholders})")
            }
            QueryKind::Update => {
                self.require_assignments()?;
                let sets = self
                    .assignments
                    .iter()
                    .map(|(c, v)| {
                        let value = self.assign_value(&mut binds, v);
                        format!("{} = {value}", self.dialect.quote_ident(c))
                    })
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("UPDATE {table} SET {sets}")
            }
        };

        let mut parts = vec![head];
        if self.kind != QueryKind::Insert && !self.conditions.is_empty() {
            let conditions = self
                .conditions
                .iter()
                .map(|(c, v)| {
                    let column = self.dialect.quote_ident(c);
                    if v.is_null() {
                        format!("{column} IS NULL")
                    } else {
                        format!("{column} = {}", self.push_bind(&mut binds, v))
                    }
                })
                .collect::<Vec<_>>()
                .join(" AND ");
            parts.push(format!("WHERE {conditions}"));
        }

        if self.kind == QueryKind::Select {
            self.push_tail(&mut parts);
        }
        let sql = parts.join(" ");

        let mut params = Params::from(binds);
        let fields = self.settings.fields_for(self.referenced_columns());
        if !fields.is_empty() {
            params = params.with_vuln_fields(fields);
        }
        Ok((sql, params))
    }

    /// Build and run on `conn`.
    ///
    /// # Errors
    /// Returns `DbError::InvalidQuery` for an incomplete query and `DbError::Sql`
    /// if the statement fails.
    pub async fn execute(self, conn: &mut Connection) -> Result<ResultSet> {
        let (sql, params) = self.build()?;
        Ok(conn.execute(&sql, params).await?)
    }

    fn require_assignments(&self) -> Result<()> {
        if self.assignments.is_empty() {
            return Err(DbError::InvalidQuery(format!(
                "{} without any column values",
                self.kind
            )));
        }
        Ok(())
    }

    fn quote_list<'a>(&self, columns: impl Iterator<Item = &'a String>) -> String {
        columns
            .map(|c| self.dialect.quote_ident(c))
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn push_bind(&self, binds: &mut Vec<Value>, value: &Value) -> String {
        binds.push(value.clone());
        self.dialect.placeholder(binds.len())
    }

    /// An untyped NULL bind is rejected by `PostgreSQL` for non-text columns.
    fn assign_value(&self, binds: &mut Vec<Value>, value: &Value) -> String {
        if value.is_null() {
            "NULL".to_owned()
        } else {
            self.push_bind(binds, value)
        }
    }

    fn push_tail(&self, parts: &mut Vec<String>) {
        if !self.order_by.is_empty() {
            let order = self
                .order_by
                .iter()
                .map(|(c, o)| format!("{} {}", self.dialect.quote_ident(c), o.as_sql()))
                .collect::<Vec<_>>()
                .join(", ");
            parts.push(format!("ORDER BY {order}"));
        }

        match (self.limit, self.offset) {
            (Some(limit), Some(offset)) => parts.push(format!("LIMIT {limit} OFFSET {offset}")),
            (Some(limit), None) => parts.push(format!("LIMIT {limit}")),
            // MySQL and SQLite cannot take OFFSET without LIMIT
            (None, Some(offset)) => parts.push(match self.dialect {
                Dialect::Postgres => format!("OFFSET {offset}"),
                Dialect::Sqlite => format!("LIMIT -1 OFFSET {offset}"),
                Dialect::MySql => format!("LIMIT {} OFFSET {offset}", u64::MAX),
            }),
            (None, None) => {}
        }
    }

    /// Unqualified names of the columns that carry values.
    fn referenced_columns(&self) -> impl Iterator<Item = &str> {
        self.conditions
            .iter()
            .chain(self.assignments.iter())
            .map(|(c, _)| c.rsplit('.').next().unwrap_or(c.as_str()))
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::vuln::{SQL, Vulnerability, VulnerableField};

    #[test]
    fn kind_parses_case_insensitively() {
        assert_eq!("SELECT".parse::<QueryKind>().unwrap(), QueryKind::Select);
        assert_eq!("count".parse::<QueryKind>().unwrap(), QueryKind::Count);
        assert!(matches!(
            "merge".parse::<QueryKind>(),
            Err(DbError::InvalidQuery(_))
        ));
    }

    #[test]
    fn select_renders_per_dialect() {
        let build = |dialect| {
            Query::new(QueryKind::Select, dialect)
                .table("tbl_products")
                .fields(["productID", "name"])
                .where_eq("categoryID", 3)
                .where_eq("deleted_at", Value::Null)
                .order_by("name", Order::Desc)
                .limit(10)
                .build()
                .unwrap()
        };

        let (sql, params) = build(Dialect::Postgres);
        assert_eq!(
            sql,
            "SELECT \"productID\", \"name\" FROM \"tbl_products\" WHERE \"categoryID\" = $1 \
             AND \"deleted_at\" IS NULL ORDER BY \"name\" DESC LIMIT 10"
        );
        assert_eq!(params.binds(), [Value::Int(3)]);

        let (sql, _) = build(Dialect::MySql);
        assert_eq!(
            sql,
            "SELECT `productID`, `name` FROM `tbl_products` WHERE `categoryID` = ? \
             AND `deleted_at` IS NULL ORDER BY `name` DESC LIMIT 10"
        );
    }

    #[test]
    fn values_are_bound_not_inlined() {
        let (sql, params) = Query::new(QueryKind::Update, Dialect::Sqlite)
            .table("tbl_products")
            .set("name", "x' OR '1'='1")
            .where_eq("productID", 5)
            .build()
            .unwrap();
        assert_eq!(
            sql,
            "UPDATE \"tbl_products\" SET \"name\" = ? WHERE \"productID\" = ?"
        );
        assert!(!sql.contains("OR"));
        assert_eq!(params.binds().len(), 2);
    }

    #[test]
    fn insert_numbers_postgres_placeholders() {
        let (sql, _) = Query::new(QueryKind::Insert, Dialect::Postgres)
            .table("t")
            .set("a", 1)
            .set("b", "two")
            .build()
            .unwrap();
        assert_eq!(sql, "INSERT INTO \"t\" (\"a\", \"b\") VALUES ($1, $2)");
    }

    #[test]
    fn null_assignments_are_literal() {
        let (sql, params) = Query::new(QueryKind::Insert, Dialect::Postgres)
            .table("t")
            .set("a", 1)
            .set("price", Value::Null)
            .set("b", "two")
            .build()
            .unwrap();
        assert_eq!(
            sql,
            "INSERT INTO \"t\" (\"a\", \"price\", \"b\") VALUES ($1, NULL, $2)"
        );
        assert_eq!(params.binds(), [Value::Int(1), Value::Text("two".to_owned())]);

        let (sql, params) = Query::new(QueryKind::Update, Dialect::Postgres)
            .table("t")
            .set("price", Value::Null)
            .where_eq("id", 4)
            .build()
            .unwrap();
        assert_eq!(sql, "UPDATE \"t\" SET \"price\" = NULL WHERE \"id\" = $1");
        assert_eq!(params.binds(), [Value::Int(4)]);
    }

    #[test]
    fn count_ignores_limit() {
        let (sql, _) = Query::new(QueryKind::Count, Dialect::Sqlite)
            .table("t")
            .limit(5)
            .build()
            .unwrap();
        assert_eq!(sql, "SELECT COUNT(*) AS count FROM \"t\"");
    }

    #[test]
    fn offset_without_limit_per_dialect() {
        let tail = |dialect| {
            let (sql, _) = Query::new(QueryKind::Select, dialect)
                .table("t")
                .offset(20)
                .build()
                .unwrap();
            sql
        };
        assert!(tail(Dialect::Postgres).ends_with(" OFFSET 20"));
        assert!(tail(Dialect::Sqlite).ends_with(" LIMIT -1 OFFSET 20"));
        assert!(tail(Dialect::MySql).ends_with(" LIMIT 18446744073709551615 OFFSET 20"));
    }

    #[test]
    fn incomplete_queries_are_rejected() {
        assert!(Query::new(QueryKind::Select, Dialect::Sqlite).build().is_err());
        assert!(
            Query::new(QueryKind::Insert, Dialect::Sqlite)
                .table("t")
                .build()
                .is_err()
        );
    }

    #[test]
    fn flagged_columns_become_vuln_fields() {
        let settings = VulnSettings::new()
            .with_field(VulnerableField::new("id").with(SQL, Vulnerability::blind()));

        let (_, params) = Query::new(QueryKind::Select, Dialect::MySql)
            .with_settings(settings.clone())
            .table("t")
            .where_eq("t.id", 1)
            .build()
            .unwrap();
        let fields = params.vuln_fields().unwrap();
        assert_eq!(fields.len(), 1);
        assert_eq!(fields.iter().next().unwrap().name(), "id");

        let (_, params) = Query::new(QueryKind::Select, Dialect::MySql)
            .with_settings(settings)
            .table("t")
            .where_eq("name", "a")
            .build()
            .unwrap();
        assert!(params.vuln_fields().is_none());
    }
}
