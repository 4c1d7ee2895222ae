use anyhow::Context;
use clap::Args;
use std::path::PathBuf;
use std::process::ExitCode;
use storefront_db::{Connection, DEFAULT_CONNECTION, DebugDisplay, SqlError, StorefrontConfig};

#[derive(Args)]
pub struct CommonArgs {
    /// Path to configuration file (YAML)
    #[arg(short = 'c', long)]
    pub config: Option<PathBuf>,

    /// Name of the `db.<name>` connection to use
    #[arg(long, default_value = DEFAULT_CONNECTION)]
    pub connection: String,
}

impl CommonArgs {
    pub fn load_config(&self) -> anyhow::Result<StorefrontConfig> {
        StorefrontConfig::load(self.config.as_deref()).context("failed to load configuration")
    }

    /// Open the selected connection with a fresh request-scoped display setting.
    pub async fn connect(&self, config: &StorefrontConfig) -> anyhow::Result<Connection> {
        let cfg = config.connection(&self.connection)?;
        let debug = DebugDisplay::new(config.debug.display_errors);
        let mut conn = Connection::connect(cfg, debug)
            .await
            .with_context(|| format!("failed to connect '{}'", self.connection))?;
        conn.settings(Some(config.vulnerabilities.clone()));
        Ok(conn)
    }
}

/// Print a failed statement the way the request's display setting allows.
pub fn report_sql_error(conn: &Connection, err: &SqlError) -> ExitCode {
    eprintln!("{}", conn.debug().render_error(err));
    ExitCode::FAILURE
}
