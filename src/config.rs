//! Site configuration module.
//!
//! Configuration comes from three layers, later layers winning:
//!
//! 1. Stock defaults ([`SiteConfig::default`])
//! 2. An optional `rowpress.toml` in the site root (or `--config <file>`)
//! 3. Environment variables, which is how scheduled CI jobs provide the
//!    repository identity and the API key
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [site]
//! owner = ""                 # GitHub owner        (env: GITHUB_REPO_OWNER)
//! repo = ""                  # GitHub repository   (env: GITHUB_REPO_NAME)
//! base_url = ""              # Overrides https://{owner}.github.io/{repo}
//! author = "Codestrym Staff"
//! brand = "Codestrym"
//!
//! [paths]
//! input = "blog.csv"
//! ledger = "processed_posts.txt"
//! listing = "blog.html"
//! posts_dir = "posts"
//! images_dir = "images"
//!
//! [listing]
//! marker = "        </div>\n    </main>"
//! placement = "before"       # "before" or "after" the marker
//!
//! [generation]
//! api_base = "https://generativelanguage.googleapis.com/v1beta"
//! text_model = "gemini-2.0-flash"
//! image_model = "imagen-3.0-generate-002"
//! temperature = 0.7
//! top_p = 0.95
//! top_k = 40
//! max_output_tokens = 1500
//! timeout_secs = 120
//! ```
//!
//! The API key is never read from the file. It only comes from
//! `GOOGLE_API_KEY`, so the config file can be committed to the site
//! repository.
//!
//! Unknown keys are rejected to catch typos early.

use crate::splice::{Anchor, Placement};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default config file name, looked up in the site root.
pub const CONFIG_FILENAME: &str = "rowpress.toml";

pub const ENV_OWNER: &str = "GITHUB_REPO_OWNER";
pub const ENV_REPO: &str = "GITHUB_REPO_NAME";
pub const ENV_API_KEY: &str = "GOOGLE_API_KEY";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
    #[error("Missing environment variable {0}")]
    MissingEnv(&'static str),
}

/// Pipeline configuration loaded from `rowpress.toml` and the environment.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Repository identity and byline settings.
    pub site: SiteIdentity,
    /// Input, ledger, listing and artifact locations, relative to the site root.
    pub paths: PathsConfig,
    /// Where new cards go in the listing page.
    pub listing: ListingConfig,
    /// Generation service endpoints and sampling parameters.
    pub generation: GenerationConfig,
    /// API key for the generation services. Environment only.
    #[serde(skip)]
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteIdentity {
    pub owner: String,
    pub repo: String,
    /// When set, replaces the GitHub Pages URL derived from owner/repo.
    pub base_url: String,
    pub author: String,
    pub brand: String,
}

impl Default for SiteIdentity {
    fn default() -> Self {
        Self {
            owner: String::new(),
            repo: String::new(),
            base_url: String::new(),
            author: "Codestrym Staff".to_string(),
            brand: "Codestrym".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PathsConfig {
    pub input: PathBuf,
    pub ledger: PathBuf,
    pub listing: PathBuf,
    pub posts_dir: String,
    pub images_dir: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from("blog.csv"),
            ledger: PathBuf::from("processed_posts.txt"),
            listing: PathBuf::from("blog.html"),
            posts_dir: "posts".to_string(),
            images_dir: "images".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ListingConfig {
    /// Exact text that must occur once in the listing page.
    pub marker: String,
    pub placement: Placement,
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            marker: "        </div>\n    </main>".to_string(),
            placement: Placement::Before,
        }
    }
}

impl ListingConfig {
    pub fn anchor(&self) -> Anchor<'_> {
        Anchor {
            marker: &self.marker,
            placement: self.placement,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GenerationConfig {
    pub api_base: String,
    pub text_model: String,
    pub image_model: String,
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: u32,
    pub max_output_tokens: u32,
    /// Per-request HTTP timeout. A hung request blocks the whole run until this fires.
    pub timeout_secs: u64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            api_base: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            text_model: "gemini-2.0-flash".to_string(),
            image_model: "imagen-3.0-generate-002".to_string(),
            temperature: 0.7,
            top_p: 0.95,
            top_k: 40,
            max_output_tokens: 1500,
            timeout_secs: 120,
        }
    }
}

impl SiteConfig {
    /// Overlay environment values on top of file values.
    ///
    /// Takes a lookup function rather than reading `std::env` directly so tests
    /// don't have to mutate the process environment. Empty values count as unset.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        if let Some(owner) = get(ENV_OWNER) {
            self.site.owner = owner;
        }
        if let Some(repo) = get(ENV_REPO) {
            self.site.repo = repo;
        }
        if let Some(key) = get(ENV_API_KEY) {
            self.api_key = Some(key);
        }
    }

    /// Validate everything except the API key.
    ///
    /// This is the precondition for `check`, which never calls the
    /// generation services.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.site.base_url.trim().is_empty() {
            if self.site.owner.trim().is_empty() {
                return Err(ConfigError::MissingEnv(ENV_OWNER));
            }
            if self.site.repo.trim().is_empty() {
                return Err(ConfigError::MissingEnv(ENV_REPO));
            }
        } else if !self.site.base_url.starts_with("http://")
            && !self.site.base_url.starts_with("https://")
        {
            return Err(ConfigError::Validation(
                "site.base_url must be an absolute http(s) URL".into(),
            ));
        }
        if self.listing.marker.is_empty() {
            return Err(ConfigError::Validation(
                "listing.marker must not be empty".into(),
            ));
        }
        let listing = self.paths.listing.to_string_lossy();
        for (key, dir) in [
            ("paths.posts_dir", self.paths.posts_dir.as_str()),
            ("paths.images_dir", self.paths.images_dir.as_str()),
            ("paths.listing", listing.as_ref()),
        ] {
            if dir.trim().is_empty() || Path::new(dir).is_absolute() || dir.contains("..") {
                return Err(ConfigError::Validation(format!(
                    "{key} must be a relative path inside the site root"
                )));
            }
        }
        if !(0.0..=2.0).contains(&self.generation.temperature) {
            return Err(ConfigError::Validation(
                "generation.temperature must be between 0 and 2".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.generation.top_p) {
            return Err(ConfigError::Validation(
                "generation.top_p must be between 0 and 1".into(),
            ));
        }
        if self.generation.max_output_tokens == 0 {
            return Err(ConfigError::Validation(
                "generation.max_output_tokens must be non-zero".into(),
            ));
        }
        Ok(())
    }

    /// Full precondition for `run`: [`validate`](Self::validate) plus the API key.
    pub fn validate_for_run(&self) -> Result<&str, ConfigError> {
        self.validate()?;
        self.api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or(ConfigError::MissingEnv(ENV_API_KEY))
    }

    /// Absolute public URL of the site root, without a trailing slash.
    pub fn base_url(&self) -> String {
        let base_url = self.site.base_url.trim();
        if base_url.is_empty() {
            format!(
                "https://{}.github.io/{}",
                self.site.owner.trim(),
                self.site.repo.trim()
            )
        } else {
            base_url.trim_end_matches('/').to_string()
        }
    }

    /// Public URL for a path relative to the site root.
    pub fn public_url(&self, relative: &str) -> String {
        format!("{}/{}", self.base_url(), relative.trim_start_matches('/'))
    }
}

// =============================================================================
// Config loading and merging
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    toml::Value::try_from(SiteConfig::default())
        .map_err(|e| ConfigError::Validation(format!("default config must serialize: {e}")))
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file doesn't exist.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Load config from a file (optional) merged over stock defaults.
///
/// Environment values are not applied here; see [`SiteConfig::apply_env`].
pub fn load_config(path: &Path) -> Result<SiteConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let merged = match load_raw_config(path)? {
        Some(overlay) => merge_toml(base, overlay),
        None => base,
    };
    Ok(merged.try_into()?)
}

/// Returns a fully-commented stock `rowpress.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Rowpress Configuration
# ======================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys cause an error.
#
# Environment variables override this file:
#   GITHUB_REPO_OWNER -> site.owner
#   GITHUB_REPO_NAME  -> site.repo
#   GOOGLE_API_KEY    -> generation API key (never read from this file)

# ---------------------------------------------------------------------------
# Site identity
# ---------------------------------------------------------------------------
[site]
# Public URLs default to https://{owner}.github.io/{repo}.
owner = ""
repo = ""

# Set to publish under a custom domain instead, e.g. "https://blog.example.com".
base_url = ""

# Byline on every post and card, and the name in the page header/footer.
author = "Codestrym Staff"
brand = "Codestrym"

# ---------------------------------------------------------------------------
# Paths, relative to the site root
# ---------------------------------------------------------------------------
[paths]
input = "blog.csv"
ledger = "processed_posts.txt"
listing = "blog.html"
posts_dir = "posts"
images_dir = "images"

# ---------------------------------------------------------------------------
# Listing page
# ---------------------------------------------------------------------------
[listing]
# Exact text that must appear exactly once in the listing page.
marker = "        </div>\n    </main>"

# "before": new cards go just before the marker (oldest first).
# "after":  new cards go just after the marker (newest first).
placement = "before"

# ---------------------------------------------------------------------------
# Generation services
# ---------------------------------------------------------------------------
[generation]
api_base = "https://generativelanguage.googleapis.com/v1beta"
text_model = "gemini-2.0-flash"
image_model = "imagen-3.0-generate-002"
temperature = 0.7
top_p = 0.95
top_k = 40
max_output_tokens = 1500

# Per-request HTTP timeout in seconds.
timeout_secs = 120
"##
}
