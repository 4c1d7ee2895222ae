use clap::Args;
use std::path::PathBuf;
use std::process::ExitCode;
use storefront_db::{Connection, DebugDisplay, StorefrontConfig, redact_credentials_in_dsn};

#[derive(Args)]
pub struct CheckArgs {
    /// Path to configuration file (YAML)
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,
}

impl CheckArgs {
    pub async fn run(&self) -> anyhow::Result<ExitCode> {
        let config = StorefrontConfig::load(self.config.as_deref())?;
        println!("Configuration is valid");
        if config.db.is_empty() {
            println!("no connections configured");
            return Ok(ExitCode::SUCCESS);
        }

        let mut failed = 0_usize;
        for (name, cfg) in &config.db {
            let dsn = redact_credentials_in_dsn(cfg.dsn.as_deref());
            let debug = DebugDisplay::new(config.debug.display_errors);
            match Connection::connect(cfg, debug).await {
                Ok(conn) => {
                    println!("{name}: ok ({}) {dsn}", conn.dialect());
                    conn.close().await?;
                }
                Err(err) => {
                    failed += 1;
                    tracing::warn!(connection = %name, error = %err, "connection check failed");
                    println!("{name}: FAILED {dsn}: {err}");
                }
            }
        }

        Ok(if failed == 0 {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        })
    }
}
