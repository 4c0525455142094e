//! # ScanPOS Terminal Library
//!
//! Wires the scanner, the backend and the cart together behind the `scanpos`
//! command line.
//!
//! ## Module Organization
//! ```text
//! scanpos_terminal/
//! ├── lib.rs          ◄─── You are here (CLI definition & run)
//! ├── state/
//! │   ├── mod.rs      ◄─── State type exports
//! │   ├── cart.rs     ◄─── Cart state (TradeStore behind a Mutex)
//! │   └── config.rs   ◄─── Terminal configuration
//! ├── commands/
//! │   ├── product.rs  ◄─── scan / lookup / product search flow
//! │   ├── cart.rs     ◄─── cart edits
//! │   └── trade.rs    ◄─── purchase
//! └── error.rs        ◄─── ApiError for commands
//! ```

pub mod commands;
pub mod error;
pub mod state;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use scanpos_client::{HttpBackend, ProductCatalog, StaticCatalog, TradeGateway};
use scanpos_scanner::virtual_camera::{FrameFeed, VirtualCameraHost};
use scanpos_scanner::{DetectionMode, ScannerConfig, ScannerController};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::error::ApiError;
use crate::state::{CartState, TerminalConfig};

// =============================================================================
// Command Line
// =============================================================================

#[derive(Debug, Parser)]
#[command(name = "scanpos", version, about = "Barcode point-of-sale terminal")]
pub struct Cli {
    /// Offline product catalog (JSON) instead of the HTTP backend
    #[arg(long, global = true)]
    pub catalog: Option<PathBuf>,

    /// Directory holding terminal.toml and scanner.toml
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Scan barcodes from an image shown to a virtual camera
    Scan {
        #[arg(long)]
        image: PathBuf,

        /// Give up (single-shot) or stop collecting (continuous) after this long
        #[arg(long, default_value_t = 5)]
        timeout_secs: u64,

        /// Keep scanning and print every distinct code
        #[arg(long)]
        continuous: bool,
    },

    /// Validate and look up a product code
    Lookup { code: String },

    /// Scan each image, add the product to the cart, optionally purchase
    Sell {
        #[arg(long = "image", required = true)]
        images: Vec<PathBuf>,

        #[arg(long, default_value_t = 5)]
        timeout_secs: u64,

        /// Submit the trade after scanning
        #[arg(long)]
        submit: bool,
    },
}

// =============================================================================
// Run
// =============================================================================

/// Installs the tracing subscriber.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=scanpos_scanner=trace` - Per-frame decoder output
/// - Default: `info,scanpos=debug`
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,scanpos=debug"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Backend chosen by `--catalog`.
struct Backend {
    catalog: Arc<dyn ProductCatalog>,
    gateway: Arc<dyn TradeGateway>,
}

impl Backend {
    fn open(cli: &Cli, config: &TerminalConfig) -> Result<Self, ApiError> {
        if let Some(path) = &cli.catalog {
            let catalog = Arc::new(StaticCatalog::load(path)?);
            return Ok(Backend {
                catalog: catalog.clone(),
                gateway: catalog,
            });
        }

        let http = Arc::new(HttpBackend::new(&config.backend)?);
        info!(url = %http.base_url(), "Using HTTP backend");
        Ok(Backend {
            catalog: http.clone(),
            gateway: http,
        })
    }
}

fn scanner_config(cli: &Cli) -> Result<ScannerConfig, ApiError> {
    let config = match &cli.config {
        Some(dir) => ScannerConfig::load_from_dir(dir)?,
        None => ScannerConfig::load(None)?,
    };
    Ok(config)
}

/// Scanner looking at `feed` through a virtual rear camera.
fn virtual_scanner(config: ScannerConfig, feed: FrameFeed) -> ScannerController {
    let host = VirtualCameraHost::with_feed(feed);
    let scanner = ScannerController::new(config, Arc::new(host.clone()));
    scanner.attach_surface(host.create_surface());
    scanner
}

/// Executes one CLI invocation.
pub async fn run(cli: Cli) -> Result<(), ApiError> {
    let terminal = TerminalConfig::load(cli.config.as_deref())?;

    match &cli.command {
        Command::Scan {
            image,
            timeout_secs,
            continuous,
        } => {
            let mut config = scanner_config(&cli)?;
            if *continuous {
                config.detection_mode = DetectionMode::Continuous;
            }
            let scanner = virtual_scanner(config, FrameFeed::from_path(image)?);
            let window = Duration::from_secs(*timeout_secs);

            let codes = if *continuous {
                commands::product::scan_codes(&scanner, window).await?
            } else {
                vec![commands::product::scan_code(&scanner, window).await?]
            };
            for code in codes {
                println!("{code}");
            }
        }

        Command::Lookup { code } => {
            let backend = Backend::open(&cli, &terminal)?;
            let product = commands::product::lookup_product(backend.catalog.as_ref(), code).await?;
            println!(
                "{}",
                serde_json::to_string_pretty(&product).map_err(|e| ApiError::internal(e.to_string()))?
            );
        }

        Command::Sell {
            images,
            timeout_secs,
            submit,
        } => {
            let backend = Backend::open(&cli, &terminal)?;
            let mut config = scanner_config(&cli)?;
            config.detection_mode = DetectionMode::SingleShot;

            let feed = FrameFeed::new();
            let scanner = virtual_scanner(config, feed.clone());
            let cart = CartState::new();

            for image in images {
                feed.load(image)?;
                commands::product::scan_product(
                    &scanner,
                    backend.catalog.as_ref(),
                    &cart,
                    Duration::from_secs(*timeout_secs),
                )
                .await?;
                commands::cart::add_pending(&cart)?;
            }

            print!("{}", commands::cart::get_cart(&cart).render());

            if *submit {
                let trade =
                    commands::trade::submit_trade(&cart, backend.gateway.as_ref(), &terminal).await?;
                println!(
                    "trade {} registered: total {} (tax {}) at {}",
                    trade.trade_id,
                    scanpos_core::Money::from_yen(trade.total_amt),
                    scanpos_core::Money::from_yen(trade.tax_amt),
                    trade.created_at.to_rfc3339()
                );
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_sell() {
        let cli = Cli::try_parse_from([
            "scanpos",
            "--catalog",
            "products.json",
            "sell",
            "--image",
            "a.png",
            "--image",
            "b.png",
            "--submit",
        ])
        .unwrap();

        assert_eq!(cli.catalog, Some(PathBuf::from("products.json")));
        match cli.command {
            Command::Sell { images, submit, timeout_secs } => {
                assert_eq!(images.len(), 2);
                assert!(submit);
                assert_eq!(timeout_secs, 5);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_cli_requires_image_for_scan() {
        assert!(Cli::try_parse_from(["scanpos", "scan"]).is_err());
    }
}
