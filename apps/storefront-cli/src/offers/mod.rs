use clap::Args;
use std::process::ExitCode;
use storefront_catalog::{CatalogError, SpecialOffers};
use storefront_catalog::domain::DEFAULT_LIMIT;
use storefront_db::DbError;

use crate::common::{CommonArgs, report_sql_error};

#[derive(Args)]
pub struct OffersArgs {
    /// Maximum number of offers to show
    #[arg(short, long, default_value_t = DEFAULT_LIMIT)]
    limit: u64,

    #[command(flatten)]
    common: CommonArgs,
}

impl OffersArgs {
    pub async fn run(&self) -> anyhow::Result<ExitCode> {
        let config = self.common.load_config()?;
        let mut conn = self.common.connect(&config).await?;

        let code = match SpecialOffers::load(&mut conn, self.limit).await {
            Ok(offers) => {
                println!("{}", offers.render());
                ExitCode::SUCCESS
            }
            Err(CatalogError::Db(DbError::Sql(err))) => report_sql_error(&conn, &err),
            Err(err) => return Err(err.into()),
        };

        conn.close().await?;
        Ok(code)
    }
}
