//! Layered application configuration.
//!
//! Values are merged in increasing priority:
//!
//! 1. Built-in defaults
//! 2. TOML configuration file (`config.toml` in the platform config dir, or `--config PATH`)
//! 3. `PNGX_*` environment variables (`__` separates nested keys, e.g. `PNGX_UPLOAD__TRIES=5`)
//! 4. Command-line flags
//!
//! # Example
//!
//! ```toml
//! url = "https://paperless.example.org"
//! token = "0123456789abcdef"
//!
//! [upload]
//! owner = "alice"
//! groups = ["family"]
//! tags = ["inbox"]
//! nameres = ["s/_/ /g"]
//! tries = 5
//! ```

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::cli::{Cli, UploadArgs};
use crate::error::{PngxError, Result};
use crate::session::ConnectionSettings;
use crate::upload::{UploadRequest, DEFAULT_DATE_RULE, DEFAULT_RETRY_DELAY, DEFAULT_TRIES};

/// Prefix of configuration environment variables.
pub const ENV_PREFIX: &str = "PNGX_";

/// Application configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the Paperless-NGX server.
    pub url: Option<String>,
    /// API token.
    pub token: Option<String>,
    /// Compute and log mutations without performing them.
    pub dry_run: bool,
    /// Defaults for `pngx upload`.
    pub upload: UploadConfig,
}

/// The `[upload]` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    pub owner: Option<String>,
    pub groups: Vec<String>,
    pub correspondent: Option<String>,
    pub correspondent_must_exist: bool,
    pub document_type: Option<String>,
    pub document_type_must_exist: bool,
    pub tags: Vec<String>,
    pub tags_must_exist: bool,
    /// Date extraction rules, tried in order.
    pub dateres: Vec<String>,
    /// sed-style title rules, applied in order.
    pub nameres: Vec<String>,
    pub replace_with_spaces: Vec<String>,
    /// Upload attempts per file.
    pub tries: u32,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            owner: None,
            groups: Vec::new(),
            correspondent: None,
            correspondent_must_exist: false,
            document_type: None,
            document_type_must_exist: false,
            tags: Vec::new(),
            tags_must_exist: false,
            dateres: vec![DEFAULT_DATE_RULE.to_string()],
            nameres: Vec::new(),
            replace_with_spaces: Vec::new(),
            tries: DEFAULT_TRIES,
        }
    }
}

impl Config {
    /// Load configuration from `path`, or from the default location.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from_path(path),
            None => match Self::default_path() {
                Some(path) => Self::load_from_path(path),
                None => Self::from_figment(Self::base_figment()),
            },
        }
    }

    /// Load configuration from a specific TOML file, then the environment.
    ///
    /// A missing file is not an error; a malformed one is.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        log::debug!("Loading configuration from {}", path.display());
        Self::from_figment(
            Figment::from(Serialized::defaults(Config::default()))
                .merge(Toml::file(path))
                .merge(Env::prefixed(ENV_PREFIX).split("__")),
        )
    }

    /// Platform-specific default configuration file.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("org", "pngx", "pngx").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    fn base_figment() -> Figment {
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    fn from_figment(figment: Figment) -> Result<Self> {
        let config: Config = figment
            .extract()
            .map_err(|e| PngxError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values no command could run with.
    pub fn validate(&self) -> Result<()> {
        if self.upload.tries == 0 {
            return Err(PngxError::Config(
                "upload.tries must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Apply global command-line flags.
    pub fn merge_cli(&mut self, cli: &Cli) {
        if let Some(url) = &cli.url {
            self.url = Some(url.clone());
        }
        if let Some(token) = &cli.token {
            self.token = Some(token.clone());
        }
        if cli.dry_run {
            self.dry_run = true;
        }
    }

    /// Apply `pngx upload` flags.
    ///
    /// Scalars replace configured values. Tags, groups and space characters
    /// extend the configured lists. Date rules from the command line are
    /// tried before configured ones; title rules run after configured ones.
    pub fn merge_upload_args(&mut self, args: &UploadArgs) {
        let upload = &mut self.upload;

        if let Some(owner) = &args.owner {
            upload.owner = Some(owner.clone());
        }
        if let Some(correspondent) = &args.correspondent {
            upload.correspondent = Some(correspondent.clone());
        }
        if let Some(document_type) = &args.document_type {
            upload.document_type = Some(document_type.clone());
        }
        if let Some(must_exist) = args.tags_must_exist() {
            upload.tags_must_exist = must_exist;
        }
        if let Some(must_exist) = args.correspondent_must_exist() {
            upload.correspondent_must_exist = must_exist;
        }
        if let Some(must_exist) = args.document_type_must_exist() {
            upload.document_type_must_exist = must_exist;
        }
        if let Some(tries) = args.tries {
            upload.tries = tries;
        }

        extend_unique(&mut upload.tags, &args.tags);
        extend_unique(&mut upload.groups, &args.groups);
        extend_unique(&mut upload.replace_with_spaces, &args.replace_with_spaces);
        upload.nameres.extend(args.nameres.iter().cloned());

        if !args.dateres.is_empty() {
            let configured = std::mem::take(&mut upload.dateres);
            upload.dateres = args.dateres.clone();
            upload.dateres.extend(configured);
        }
    }

    /// Connection settings for [`crate::session::Session::connect`].
    #[must_use]
    pub fn connection(&self) -> ConnectionSettings {
        ConnectionSettings {
            url: self.url.clone(),
            token: self.token.clone(),
            dry_run: self.dry_run,
        }
    }

    /// The upload request described by the `[upload]` table.
    #[must_use]
    pub fn upload_request(&self) -> UploadRequest {
        let upload = &self.upload;
        UploadRequest {
            owner: upload.owner.clone(),
            groups: upload.groups.clone(),
            correspondent: upload.correspondent.clone(),
            correspondent_must_exist: upload.correspondent_must_exist,
            document_type: upload.document_type.clone(),
            document_type_must_exist: upload.document_type_must_exist,
            tags: upload.tags.clone(),
            tags_must_exist: upload.tags_must_exist,
            date_rules: upload.dateres.clone(),
            title_rules: upload.nameres.clone(),
            replace_with_spaces: upload.replace_with_spaces.clone(),
            max_tries: upload.tries.max(1),
            retry_delay: DEFAULT_RETRY_DELAY,
        }
    }
}

fn extend_unique(target: &mut Vec<String>, extra: &[String]) {
    for item in extra {
        if !target.contains(item) {
            target.push(item.clone());
        }
    }
}
