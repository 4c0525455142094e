//! # scanpos
//!
//! Command-line point-of-sale terminal.
//!
//! ```text
//! scanpos scan --image shelf.png              # print the first barcode
//! scanpos scan --image shelf.png --continuous # print every distinct barcode
//! scanpos lookup 4901234567894                # product JSON
//! scanpos --catalog products.json sell --image a.png --image b.png --submit
//! ```
//!
//! Failures are printed to stderr as `{"code": ..., "message": ...}` and the
//! process exits with status 1.

use clap::Parser;
use tracing::info;

use scanpos_terminal::{init_tracing, run, Cli};

#[tokio::main]
async fn main() {
    init_tracing();

    let cli = Cli::parse();
    info!(command = ?cli.command, "Starting scanpos");

    if let Err(err) = run(cli).await {
        eprintln!("{}", err.to_json());
        std::process::exit(1);
    }
}
