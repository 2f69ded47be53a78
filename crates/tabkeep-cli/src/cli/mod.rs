//! # CLI Behavior
//!
//! This is **one possible client** for tabkeep, not the store itself. The CLI
//! is the only place that knows about terminal I/O, exit codes and output
//! formatting.
//!
//! ## Output
//!
//! Every command prints the API response envelope as pretty JSON on stdout:
//!
//! ```text
//! { "success": true, "data": { ... } }
//! ```
//!
//! A response with `"success": false` exits with status 1. Errors that happen
//! before the store is reached (unreadable import file, bad config) go to
//! stderr as `Error: ...` and also exit 1.
//!
//! ## Data Directory
//!
//! Resolved in order:
//!
//! 1. `--data-dir <DIR>`
//! 2. `TABKEEP_DATA_DIR`
//! 3. The platform data directory (e.g. `~/.local/share/tabkeep`)
//!
//! An optional `tabkeep.toml` in that directory configures the store; see
//! [`tabkeep::config::StoreConfig`].
//!
//! ## Logging
//!
//! Logs go to stderr so stdout stays machine-readable. `RUST_LOG` picks the
//! filter; `--verbose` forces `tabkeep=debug`.
//!
//! ## Module Structure
//!
//! - `setup`: Argument parsing (clap definitions)
//! - `commands`: Dispatch and output

mod commands;
pub mod setup;

pub use commands::run;
