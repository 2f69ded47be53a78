//! # tabkeep
//!
//! Command-line client for the tabkeep saved-page store.
//!
//! ```text
//! tabkeep save https://example.com "Example" -t rust
//! tabkeep query --tag rust --sort title --order asc --limit 10
//! tabkeep export backup.json
//! tabkeep recover
//! ```
//!
//! All the real work happens in the `tabkeep` library; see `cli` for how
//! commands map onto it.

mod cli;

#[tokio::main]
async fn main() {
    match cli::run().await {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    }
}
