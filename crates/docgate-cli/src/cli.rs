//! Command-line argument definitions.

use clap::{Args, Parser, Subcommand};

/// Docgate - ACL provisioning and filtered search administration
#[derive(Parser, Debug)]
#[command(name = "docgate")]
#[command(version)]
#[command(about = "Provision ACL labels and run ACL-filtered searches", long_about = None)]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Top-level commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Assign fresh random ACL labels to every document (dry run by default)
    Provision(ProvisionArgs),

    /// Search-index administration
    Index {
        /// Index action to run
        #[command(subcommand)]
        action: IndexAction,
    },

    /// ACL-filtered search
    Search {
        /// Search action to run
        #[command(subcommand)]
        action: SearchAction,
    },

    /// Configuration management
    Config {
        /// Config action to run
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Arguments for `docgate provision`.
#[derive(Args, Debug)]
pub struct ProvisionArgs {
    /// Apply the plan (without this flag nothing is written)
    #[arg(long)]
    pub run: bool,

    /// Skip the confirmation prompt
    #[arg(long)]
    pub yes: bool,

    /// Smallest label value, overriding the configured range
    #[arg(long)]
    pub min: Option<i64>,

    /// Largest label value, overriding the configured range
    #[arg(long)]
    pub max: Option<i64>,

    /// Documents per bulk write
    #[arg(long)]
    pub batch_size: Option<usize>,

    /// Seed for reproducible label generation
    #[arg(long)]
    pub seed: Option<u64>,
}

/// Index subcommands.
#[derive(Subcommand, Debug)]
pub enum IndexAction {
    /// Create the full-text and vector search indexes
    Create {
        /// Block until both indexes are queryable
        #[arg(long)]
        wait: bool,

        /// Wait timeout in seconds
        #[arg(long, default_value_t = 600)]
        timeout: u64,
    },

    /// Show index build status
    Status,

    /// Wait for both indexes to become queryable
    Wait {
        /// Timeout in seconds
        #[arg(long, default_value_t = 600)]
        timeout: u64,

        /// Poll interval in seconds
        #[arg(long, default_value_t = 30)]
        interval: u64,
    },
}

/// Search subcommands.
#[derive(Subcommand, Debug)]
pub enum SearchAction {
    /// Full-text search with fuzzy matching
    Text(SearchArgs),

    /// Vector similarity search (the query text is embedded first)
    Vector(SearchArgs),

    /// Hybrid search fusing text and vector rankings
    Hybrid(SearchArgs),
}

/// Arguments shared by all search subcommands.
#[derive(Args, Debug)]
pub struct SearchArgs {
    /// Query text
    pub query: String,

    /// Required ACL label, e.g. `--acl ACL1=17` (repeatable)
    #[arg(long = "acl", value_parser = parse_acl_clause)]
    pub acl: Vec<(String, i64)>,

    /// Maximum number of results
    #[arg(long)]
    pub limit: Option<usize>,
}

/// Config subcommands.
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show the resolved config file path
    Path,

    /// Print the effective configuration as TOML
    Show,

    /// Write a default config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// Parse an ACL requirement of the form `FIELD=VALUE`.
pub fn parse_acl_clause(s: &str) -> Result<(String, i64), String> {
    let (field, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected FIELD=VALUE, got '{s}'"))?;
    if field.is_empty() {
        return Err(format!("empty field name in '{s}'"));
    }
    let value: i64 = value
        .parse()
        .map_err(|_| format!("label value '{value}' is not an integer"))?;
    Ok((field.to_string(), value))
}

// ============================================================================
// Tests
// ============================================================================
