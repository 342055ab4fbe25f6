//! # CLI Module
//!
//! Command-line access to the demo application.
//!
//! ## Commands
//!
//! ### `routes`
//!
//! Print the compiled route table, one `pattern -> controller::method` per
//! line, followed by any routes that failed to compile:
//!
//! ```bash
//! minimvc routes
//! ```
//!
//! ### `dispatch`
//!
//! Run one GET request through the dispatcher and print status and body:
//!
//! ```bash
//! minimvc dispatch '/demo/query?username=zhangsan&name=lisi'
//! minimvc --config app.yaml dispatch /demo/validate -H 'x-request-id: 01J...'
//! ```
//!
//! ## Global Options
//!
//! - `--config <FILE>`: YAML configuration (also `MINIMVC_CONFIG`)
//! - `--scan-package <ROOT>`: scan root when no config file is given
//!   (also `MINIMVC_SCAN_PACKAGE`, default `app`)

mod commands;

#[cfg(test)]
mod tests;

pub use commands::{run_cli, Cli, Commands};
