//! # State Module
//!
//! Separate state types, each command takes only what it needs.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  ┌──────────────┐  ┌──────────────────┐  ┌──────────────────────────┐  │
//! │  │  CartState   │  │  TerminalConfig  │  │  ScannerController       │  │
//! │  │  Arc<Mutex<  │  │  emp/store/pos   │  │  (scanpos-scanner)       │  │
//! │  │  TradeStore>>│  │  backend         │  │                          │  │
//! │  └──────────────┘  └──────────────────┘  └──────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod cart;
mod config;

pub use cart::{CartResponse, CartState};
pub use config::{TerminalConfig, TERMINAL_CONFIG_FILE};
