//! CLI commands and argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Command-line client for the DHIS2 Web API
#[derive(Parser, Debug)]
#[command(name = "dhis2")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Server, e.g. play.dhis2.org/demo (overrides the auth file)
    #[arg(short, long, global = true)]
    pub server: Option<String>,

    /// Username
    #[arg(short, long, global = true)]
    pub username: Option<String>,

    /// Password
    #[arg(short, long, global = true)]
    pub password: Option<String>,

    /// Auth file (JSON); searched in $DHIS_HOME and the home folder when omitted
    #[arg(short, long, global = true)]
    pub auth_file: Option<PathBuf>,

    /// API version to pin in URLs (25 or greater)
    #[arg(long, global = true)]
    pub api_version: Option<u32>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Also write logs to this file
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    /// Command to run
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show server info
    Info,

    /// GET an endpoint
    Get {
        /// Endpoint, e.g. dataElements
        endpoint: String,

        /// File type: json, csv, xml, pdf, xlsx
        #[arg(short = 't', long, default_value = "json")]
        file_type: String,

        /// Query parameter as key=value (repeatable)
        #[arg(short = 'P', long = "param", value_parser = parse_key_val)]
        params: Vec<(String, String)>,
    },

    /// GET a paged collection
    Paged {
        /// Endpoint, e.g. organisationUnits
        endpoint: String,

        /// Items per page
        #[arg(long, default_value = "50")]
        page_size: String,

        /// Merge all pages into one result
        #[arg(long)]
        merge: bool,

        /// Query parameter as key=value (repeatable)
        #[arg(short = 'P', long = "param", value_parser = parse_key_val)]
        params: Vec<(String, String)>,
    },

    /// Read the rows of a SQL view
    Sqlview {
        /// SQL view UID
        uid: String,

        /// Materialize the view before reading
        #[arg(long)]
        execute: bool,

        /// Query variable as key=value (QUERY views, repeatable)
        #[arg(long, value_parser = parse_key_val)]
        var: Vec<(String, String)>,

        /// Criteria as key=value (views, repeatable)
        #[arg(long, value_parser = parse_key_val)]
        criteria: Vec<(String, String)>,
    },

    /// POST a payload file in chunks
    PostPartitioned {
        /// Endpoint, e.g. metadata
        endpoint: String,

        /// JSON payload file with exactly one key, e.g. {"dataElements": [...]}
        file: PathBuf,

        /// Maximum items per chunk
        #[arg(long, default_value = "1000")]
        threshold: i64,

        /// Query parameter as key=value (repeatable)
        #[arg(short = 'P', long = "param", value_parser = parse_key_val)]
        params: Vec<(String, String)>,
    },
}

/// Parse a `key=value` argument
pub fn parse_key_val(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{s}'"))?;
    if key.is_empty() {
        return Err(format!("empty key in '{s}'"));
    }
    Ok((key.to_string(), value.to_string()))
}
