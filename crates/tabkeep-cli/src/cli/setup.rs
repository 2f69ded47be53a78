use chrono::{DateTime, NaiveDate, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tabkeep::query::{SortField, SortOrder};

#[derive(Parser, Debug)]
#[command(name = "tabkeep", bin_name = "tabkeep", version, disable_help_subcommand = true)]
#[command(about = "Keep browser pages for later, safely", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Directory holding the store (defaults to the platform data directory)
    #[arg(long, global = true, env = "TABKEEP_DATA_DIR", help_heading = "Options")]
    pub data_dir: Option<PathBuf>,

    /// Log store activity to stderr
    #[arg(short, long, global = true, help_heading = "Options")]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Save a page (a page with the same url is replaced)
    #[command(display_order = 1)]
    Save {
        url: String,
        title: String,

        #[arg(long)]
        summary: Option<String>,

        /// Tag to attach (repeatable)
        #[arg(long = "tag", short = 't')]
        tags: Vec<String>,
    },

    /// List all pages, newest first
    #[command(alias = "ls", display_order = 2)]
    List,

    /// Show one page
    #[command(display_order = 3)]
    Show { id: String },

    /// Search title, summary, url and domain
    #[command(display_order = 4)]
    Search { query: String },

    /// Filter, sort and paginate pages
    #[command(display_order = 5)]
    Query {
        /// Text to search for
        #[arg(long, short = 'q')]
        text: Option<String>,

        /// Match pages carrying any of these tags (repeatable)
        #[arg(long = "tag", short = 't')]
        tags: Vec<String>,

        /// Match pages from any of these domains (repeatable)
        #[arg(long = "domain", short = 'd')]
        domains: Vec<String>,

        /// Earliest save time (RFC 3339 or YYYY-MM-DD)
        #[arg(long, value_parser = parse_date)]
        from: Option<DateTime<Utc>>,

        /// Latest save time (RFC 3339 or YYYY-MM-DD)
        #[arg(long, value_parser = parse_date)]
        to: Option<DateTime<Utc>>,

        /// Only archived pages
        #[arg(long, conflicts_with = "active")]
        archived: bool,

        /// Only pages that are not archived
        #[arg(long)]
        active: bool,

        #[arg(long, value_enum, default_value_t = SortArg::Timestamp)]
        sort: SortArg,

        #[arg(long, value_enum, default_value_t = OrderArg::Desc)]
        order: OrderArg,

        #[arg(long)]
        limit: Option<usize>,

        #[arg(long, default_value_t = 0)]
        offset: usize,
    },

    /// Delete a page
    #[command(alias = "rm", display_order = 6)]
    Delete { id: String },

    /// Change a page's title, summary, tags or archive flag
    #[command(display_order = 7)]
    Update {
        id: String,

        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        summary: Option<String>,

        /// Replace the page's tags (repeatable)
        #[arg(long = "tag", short = 't')]
        tags: Vec<String>,

        #[arg(long, conflicts_with = "unarchive")]
        archive: bool,

        #[arg(long)]
        unarchive: bool,
    },

    /// Add or remove a tag on several pages
    #[command(display_order = 8)]
    Tag {
        #[command(subcommand)]
        action: TagAction,
    },

    /// Delete several pages at once
    #[command(display_order = 9)]
    BatchDelete {
        #[arg(required = true, num_args = 1..)]
        ids: Vec<String>,
    },

    /// Export pages and settings as JSON (to stdout, or to FILE)
    #[command(display_order = 20)]
    Export { file: Option<PathBuf> },

    /// Import an export file
    #[command(display_order = 21)]
    Import { file: PathBuf },

    /// List backup snapshots
    #[command(display_order = 22)]
    Backups,

    /// Restore pages and settings from a snapshot (newest if no id is given)
    #[command(display_order = 23)]
    Recover { id: Option<String> },

    /// Show storage usage and metadata
    #[command(display_order = 30)]
    Info,

    /// Prune old snapshots and apply cleanup rules
    #[command(display_order = 31)]
    Maintain,

    /// Keep only the newest MAX pages
    #[command(display_order = 32)]
    Limit { max: usize },

    /// Remove every saved page
    #[command(display_order = 33)]
    Clear,

    /// Show or change settings
    #[command(display_order = 40)]
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum TagAction {
    Add {
        tag: String,
        #[arg(required = true, num_args = 1..)]
        ids: Vec<String>,
    },
    Remove {
        tag: String,
        #[arg(required = true, num_args = 1..)]
        ids: Vec<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum SettingsAction {
    Show,
    /// Merge a JSON object into the settings, e.g. '{"theme": "dark"}'
    Set { json: String },
    Reset,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum SortArg {
    Timestamp,
    Title,
    Url,
    Domain,
    Created,
    Updated,
}

impl From<SortArg> for SortField {
    fn from(arg: SortArg) -> Self {
        match arg {
            SortArg::Timestamp => SortField::Timestamp,
            SortArg::Title => SortField::Title,
            SortArg::Url => SortField::Url,
            SortArg::Domain => SortField::Domain,
            SortArg::Created => SortField::CreatedAt,
            SortArg::Updated => SortField::UpdatedAt,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum OrderArg {
    Asc,
    Desc,
}

impl From<OrderArg> for SortOrder {
    fn from(arg: OrderArg) -> Self {
        match arg {
            OrderArg::Asc => SortOrder::Asc,
            OrderArg::Desc => SortOrder::Desc,
        }
    }
}

/// Accepts RFC 3339 timestamps or plain dates (midnight UTC).
fn parse_date(value: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
        .ok_or_else(|| format!("'{}' is not a date (use YYYY-MM-DD or RFC 3339)", value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_save_with_tags() {
        let cli = Cli::try_parse_from([
            "tabkeep",
            "save",
            "https://example.com",
            "Example",
            "-t",
            "rust",
            "--tag",
            "async",
        ])
        .unwrap();
        match cli.command {
            Commands::Save { url, tags, .. } => {
                assert_eq!(url, "https://example.com");
                assert_eq!(tags, vec!["rust", "async"]);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_parse_query_dates() {
        let cli = Cli::try_parse_from([
            "tabkeep",
            "query",
            "--from",
            "2024-01-01",
            "--to",
            "2024-02-01T12:00:00Z",
            "--sort",
            "title",
            "--order",
            "asc",
        ])
        .unwrap();
        match cli.command {
            Commands::Query {
                from, to, sort, order, ..
            } => {
                assert_eq!(from.unwrap().to_rfc3339(), "2024-01-01T00:00:00+00:00");
                assert_eq!(to.unwrap().to_rfc3339(), "2024-02-01T12:00:00+00:00");
                assert_eq!(SortField::from(sort), SortField::Title);
                assert_eq!(SortOrder::from(order), SortOrder::Asc);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_bad_date_is_rejected() {
        assert!(Cli::try_parse_from(["tabkeep", "query", "--from", "yesterday"]).is_err());
    }

    #[test]
    fn test_archive_flags_conflict() {
        assert!(
            Cli::try_parse_from(["tabkeep", "update", "id", "--archive", "--unarchive"]).is_err()
        );
    }

    #[test]
    fn test_global_data_dir() {
        let cli = Cli::try_parse_from(["tabkeep", "list", "--data-dir", "/tmp/tk"]).unwrap();
        assert_eq!(cli.data_dir, Some(PathBuf::from("/tmp/tk")));
    }
}
