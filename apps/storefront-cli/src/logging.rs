//! Logging initialization.
//!
//! Events go to stderr so stdout stays machine-readable. `RUST_LOG` takes
//! precedence over the `-v` count.

use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

fn default_filter(verbose: u8) -> &'static str {
    match verbose {
        0 => "error",
        1 => "storefront=info,storefront_db=info,storefront_catalog=info,warn",
        2 => "storefront=debug,storefront_db=debug,storefront_catalog=debug,warn",
        _ => "trace",
    }
}

pub fn init_logging(verbose: u8) {
    let fmt_layer = fmt::layer().with_target(false).with_writer(std::io::stderr);
    let filter_layer = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(verbose)));

    if let Err(e) = tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .try_init()
    {
        eprintln!("logging already initialized: {e}");
    }
}
