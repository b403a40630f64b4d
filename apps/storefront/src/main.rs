//! # Forma Storefront Entry Point
//!
//! Reads one JSON command per line from stdin and writes one JSON reply per
//! line to stdout:
//!
//! ```text
//! → {"command": "list_products", "args": {"limit": 5}}
//! ← {"ok": [...]}
//! → {"command": "add_to_configuration", "args": {...}}
//! ← {"error": "Incomplete", "detail": "Selection is incomplete, missing attributes: [3]"}
//! ```
//!
//! ## Startup Sequence
//! 1. Load configuration (`FORMA_*` environment variables)
//! 2. Initialize tracing (stderr)
//! 3. Connect to database & run migrations
//! 4. Serve commands until stdin closes

use forma_storefront::config::StorefrontConfig;
use forma_storefront::telemetry::init_tracing;
use forma_storefront::Storefront;
use tokio::io::{self, BufReader};
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = StorefrontConfig::load()?;
    init_tracing(&config.log_filter);

    let storefront = Storefront::start(&config).await?;
    info!("Ready for commands on stdin");

    let mut stdout = io::stdout();
    storefront
        .serve_lines(BufReader::new(io::stdin()), &mut stdout)
        .await?;

    storefront.shutdown().await;
    Ok(())
}
