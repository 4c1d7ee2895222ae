use clap::Args;
use std::process::ExitCode;

use crate::common::{CommonArgs, report_sql_error};

#[derive(Args)]
pub struct ColumnsArgs {
    /// Table to describe
    table: String,

    #[command(flatten)]
    common: CommonArgs,
}

impl ColumnsArgs {
    pub async fn run(&self) -> anyhow::Result<ExitCode> {
        let config = self.common.load_config()?;
        let mut conn = self.common.connect(&config).await?;

        let code = match conn.list_columns(&self.table).await {
            Ok(columns) => {
                for column in columns {
                    println!("{column}");
                }
                ExitCode::SUCCESS
            }
            Err(err) => report_sql_error(&conn, &err),
        };

        conn.close().await?;
        Ok(code)
    }
}
