//! Command-line interface definitions for pngx.
//!
//! This module defines all CLI arguments, subcommands, and options using the clap derive API.
//! Connection options (`--url`, `--token`, `--no-act`, `--config`) belong to the top-level
//! command; verbosity and colour options are global.
//!
//! # Example
//!
//! ```bash
//! # Upload two scans, tagging them and deriving titles from the file names
//! pngx upload -t inbox -t bills --namere 's/_/ /g' 2024-03-05-power_bill.pdf 2024-03-06-rent.pdf
//!
//! # Show what would happen without touching the server
//! pngx -n upload -c "Power Co" scan.pdf
//!
//! # List tag names, NUL-delimited for xargs -0
//! pngx tags list -0
//! ```

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// A command-line interface for Paperless-NGX.
#[derive(Debug, Parser)]
#[command(name = "pngx")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity level (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Output errors as JSON on stderr
    #[arg(long, global = true)]
    pub json_errors: bool,

    /// URL of the Paperless-NGX instance
    #[arg(short = 'U', long, value_name = "URL")]
    pub url: Option<String>,

    /// API token for the Paperless-NGX instance
    #[arg(short = 'T', long, value_name = "TOKEN")]
    pub token: Option<String>,

    /// Do not actually act, just show what would be done
    #[arg(short = 'n', long = "no-act", visible_alias = "dry-run")]
    pub dry_run: bool,

    /// Configuration file to use instead of the default one
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands for pngx.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Upload files to Paperless-NGX
    Upload(UploadArgs),
    /// Commands for tags
    #[command(subcommand)]
    Tags(ListCommand),
    /// Commands for correspondents
    #[command(subcommand)]
    Correspondents(ListCommand),
}

/// Subcommands of `tags` and `correspondents`.
#[derive(Debug, Subcommand)]
pub enum ListCommand {
    /// List the available entries by name
    List(ListArgs),
}

/// Arguments for the list subcommands.
#[derive(Debug, Args)]
pub struct ListArgs {
    /// Use NUL as delimiter instead of newlines
    #[arg(short = '0', long)]
    pub zero: bool,

    /// Print the numeric ID after each name, separated by a tab
    #[arg(long)]
    pub ids: bool,
}

/// Arguments for the upload subcommand.
#[derive(Debug, Args)]
pub struct UploadArgs {
    /// Files to upload
    #[arg(value_name = "FILE")]
    pub files: Vec<PathBuf>,

    /// Owner for uploaded documents and created entities
    #[arg(short, long, value_name = "USER")]
    pub owner: Option<String>,

    /// Groups granted change permission (can be specified multiple times)
    #[arg(short = 'g', long = "group", value_name = "GROUP")]
    pub groups: Vec<String>,

    /// Correspondent for uploaded documents
    #[arg(short, long, value_name = "NAME")]
    pub correspondent: Option<String>,

    /// Fail instead of creating a missing correspondent
    #[arg(long, overrides_with = "make_missing_correspondent")]
    pub correspondent_must_exist: bool,

    /// Create the correspondent if it does not exist
    #[arg(long, overrides_with = "correspondent_must_exist")]
    pub make_missing_correspondent: bool,

    /// Document type for uploaded documents
    #[arg(short, long, value_name = "NAME")]
    pub document_type: Option<String>,

    /// Fail instead of creating a missing document type
    #[arg(long, overrides_with = "make_missing_document_type")]
    pub document_type_must_exist: bool,

    /// Create the document type if it does not exist
    #[arg(long, overrides_with = "document_type_must_exist")]
    pub make_missing_document_type: bool,

    /// Tags to assign to the documents (can be specified multiple times)
    #[arg(short = 't', long = "tag", value_name = "TAG")]
    pub tags: Vec<String>,

    /// Fail instead of creating missing tags
    #[arg(long, overrides_with = "make_missing_tags")]
    pub tags_must_exist: bool,

    /// Create tags that do not exist
    #[arg(long, overrides_with = "tags_must_exist")]
    pub make_missing_tags: bool,

    /// Regular expression with `date` and `remainder` groups (can be specified multiple times)
    ///
    /// Tried before the configured rules; the first rule that finds a date wins.
    #[arg(long = "datere", value_name = "REGEX")]
    pub dateres: Vec<String>,

    /// sed-style substitution applied to the title, e.g. 's/_/ /g' (can be specified multiple times)
    #[arg(long = "namere", value_name = "RULE")]
    pub nameres: Vec<String>,

    /// Characters replaced by spaces in titles (can be specified multiple times)
    #[arg(long, value_name = "CHARS")]
    pub replace_with_spaces: Vec<String>,

    /// Attempts per file before giving up
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u32).range(1..))]
    pub tries: Option<u32>,
}

impl UploadArgs {
    /// `Some` only if one of the paired flags was given.
    #[must_use]
    pub fn tags_must_exist(&self) -> Option<bool> {
        paired_flag(self.tags_must_exist, self.make_missing_tags)
    }

    #[must_use]
    pub fn correspondent_must_exist(&self) -> Option<bool> {
        paired_flag(
            self.correspondent_must_exist,
            self.make_missing_correspondent,
        )
    }

    #[must_use]
    pub fn document_type_must_exist(&self) -> Option<bool> {
        paired_flag(
            self.document_type_must_exist,
            self.make_missing_document_type,
        )
    }
}

fn paired_flag(on: bool, off: bool) -> Option<bool> {
    match (on, off) {
        (true, _) => Some(true),
        (_, true) => Some(false),
        _ => None,
    }
}
