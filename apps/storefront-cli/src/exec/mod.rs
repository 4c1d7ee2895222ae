use clap::Args;
use std::process::ExitCode;
use storefront_db::{Params, Value, VulnFields, VulnerableField};

use crate::common::{CommonArgs, report_sql_error};

#[derive(Args)]
pub struct ExecArgs {
    /// SQL statement with positional placeholders
    sql: String,

    /// Positional bind value; integers, decimals and `null` are typed, anything else is text
    #[arg(short, long = "bind")]
    binds: Vec<String>,

    /// Request field feeding the statement, flagged per the `vulnerabilities` config
    #[arg(long = "vuln-field")]
    vuln_fields: Vec<String>,

    #[command(flatten)]
    common: CommonArgs,
}

impl ExecArgs {
    pub async fn run(&self) -> anyhow::Result<ExitCode> {
        let config = self.common.load_config()?;
        let mut conn = self.common.connect(&config).await?;

        let mut params: Params = self.binds.iter().map(String::as_str).map(parse_bind).collect();
        if !self.vuln_fields.is_empty() {
            let fields: VulnFields = self
                .vuln_fields
                .iter()
                .map(|name| {
                    config
                        .vulnerabilities
                        .field(name)
                        .unwrap_or_else(|| VulnerableField::new(name.as_str()))
                })
                .collect();
            params = params.with_vuln_fields(fields);
        }

        let code = match conn.execute(&self.sql, params).await {
            Ok(rs) => {
                for row in &rs {
                    println!("{}", serde_json::to_string(row)?);
                }
                tracing::info!(
                    rows = rs.len(),
                    rows_affected = rs.rows_affected(),
                    "statement executed"
                );
                if rs.is_empty() {
                    eprintln!("{} row(s) affected", rs.rows_affected());
                }
                ExitCode::SUCCESS
            }
            Err(err) => report_sql_error(&conn, &err),
        };

        conn.close().await?;
        Ok(code)
    }
}

/// Type a command-line bind value.
fn parse_bind(raw: &str) -> Value {
    if raw.eq_ignore_ascii_case("null") {
        return Value::Null;
    }
    if let Ok(v) = raw.parse::<i64>() {
        return Value::Int(v);
    }
    match raw.parse::<f64>() {
        Ok(v) if v.is_finite() => Value::Float(v),
        _ => Value::Text(raw.to_owned()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binds_are_typed() {
        assert_eq!(parse_bind("NULL"), Value::Null);
        assert_eq!(parse_bind("42"), Value::Int(42));
        assert_eq!(parse_bind("-1.5"), Value::Float(-1.5));
        assert_eq!(parse_bind("inf"), Value::Text("inf".to_owned()));
        assert_eq!(parse_bind("1 OR 1=1"), Value::Text("1 OR 1=1".to_owned()));
    }
}
