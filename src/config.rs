//! Project settings.
//!
//! A project is described by a single TOML file (`sitemake.toml` by default)
//! living at the project root:
//!
//! ```toml
//! posts = ["first-post", "second-post"]   # slugs, oldest first
//! pages = ["about", "index"]
//! copy = ["static", "robots.txt"]         # files or whole directories
//! tags = ["rust", "linux"]
//!
//! [global]                                # handed to the renderer as KEY=VALUE
//! AUTHOR_NAME = "Jane Doe"
//! AUTHOR_EMAIL = "jane@example.org"
//! SITE_TITLE = "Notes"
//! SITE_TAGLINE = "Things I wrote down"
//! BASE_DOMAIN = "https://example.org"
//!
//! [settings]                              # only the keys you want to change
//! posts_per_page = "5"
//! html_ext = ".html"
//! ```
//!
//! Loading follows the same path as every other layered config: the stock
//! defaults are serialized to a TOML table, the user file is merged on top
//! with [`merge_toml`], the result is deserialized with unknown keys rejected,
//! and finally [`Settings::validate`] checks the values.
//!
//! All `[settings]` values are strings. Numeric ones are read with
//! [`parse_long`], which is deliberately lenient: `"10 posts"` is 10 and
//! `"many"` is 0.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default project file name, looked up in the current directory.
pub const DEFAULT_SETTINGS_FILE: &str = "sitemake.toml";

/// Stock `[settings]` values. Keys not listed here are rejected.
pub const DEFAULT_SETTINGS: &[(&str, &str)] = &[
    ("source_ext", ".txt"),
    ("content_dir", "content"),
    ("template_dir", "templates"),
    ("main_template", "main.tmpl"),
    ("atom_template", ""),
    ("output_dir", "_build"),
    ("date_format", "%b %d, %Y, %I:%M %p GMT"),
    ("posts_per_page", "10"),
    ("atom_posts_per_page", "10"),
    ("html_ext", "/index.html"),
    ("index_prefix", ""),
    ("post_prefix", "post"),
    ("pagination_prefix", "page"),
    ("tag_prefix", "tag"),
    ("atom_prefix", "atom"),
    ("atom_ext", ".xml"),
    ("html_order", "DESC"),
    ("atom_order", "DESC"),
    ("locale", ""),
];

/// `[global]` keys every project must define.
pub const REQUIRED_GLOBALS: &[&str] = &[
    "AUTHOR_NAME",
    "AUTHOR_EMAIL",
    "SITE_TITLE",
    "SITE_TAGLINE",
    "BASE_DOMAIN",
];

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("settings file not found: {0}")]
    Missing(PathBuf),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Parsed project file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Post slugs, in declaration order.
    pub posts: Vec<String>,
    /// Page slugs, in declaration order.
    pub pages: Vec<String>,
    /// Files or directories copied verbatim into the output directory.
    pub copy: Vec<String>,
    /// Tags that get their own listing page and feed.
    pub tags: Vec<String>,
    /// Renderer globals (`SITE_TITLE`, ...).
    pub global: BTreeMap<String, String>,
    /// Build settings, keyed by name.
    pub settings: BTreeMap<String, String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            posts: Vec::new(),
            pages: Vec::new(),
            copy: Vec::new(),
            tags: Vec::new(),
            global: BTreeMap::new(),
            settings: DEFAULT_SETTINGS
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }
}

impl Settings {
    /// Look up a build setting. Every known key has a stock value, so a miss
    /// can only mean an unknown key and yields the empty string.
    pub fn get(&self, key: &str) -> &str {
        self.settings.get(key).map(String::as_str).unwrap_or_default()
    }

    /// Look up a build setting and read it as an integer.
    pub fn get_long(&self, key: &str) -> i64 {
        parse_long(self.get(key))
    }

    /// Check keys and values. Run after every merge.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for key in self.global.keys() {
            if key.is_empty() || !key.chars().all(|c| c.is_ascii_uppercase() || c == '_') {
                return Err(ConfigError::Validation(format!(
                    "[global] key must be uppercase with '_': {key}"
                )));
            }
        }
        for key in REQUIRED_GLOBALS {
            if self.global.get(*key).is_none_or(|v| v.is_empty()) {
                return Err(ConfigError::Validation(format!(
                    "[global] key required but not found or empty: {key}"
                )));
            }
        }
        for key in self.settings.keys() {
            if !DEFAULT_SETTINGS.iter().any(|(k, _)| k == key) {
                return Err(ConfigError::Validation(format!(
                    "unknown key in [settings]: {key}"
                )));
            }
        }
        for (section, entries) in [
            ("posts", &self.posts),
            ("pages", &self.pages),
            ("copy", &self.copy),
            ("tags", &self.tags),
        ] {
            if entries.iter().any(|e| e.trim().is_empty()) {
                return Err(ConfigError::Validation(format!(
                    "{section} entries must not be empty"
                )));
            }
        }
        Ok(())
    }
}

/// Read the leading integer of `value` the way C's `strtol` does: skip
/// leading whitespace, accept one sign, take digits up to the first
/// non-digit. No digits at all yields 0; overflow saturates.
pub fn parse_long(value: &str) -> i64 {
    let s = value.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let mut n: i64 = 0;
    for b in digits.bytes().take_while(u8::is_ascii_digit) {
        let d = i64::from(b - b'0');
        n = n.saturating_mul(10);
        n = if negative {
            n.saturating_sub(d)
        } else {
            n.saturating_add(d)
        };
    }
    n
}

// =============================================================================
// Loading and merging
// =============================================================================

/// The stock defaults as a `toml::Value::Table`, used as the base layer
/// user files are merged onto.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(Settings::default()).expect("default settings must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// Tables merge key by key; any other overlay value replaces the base value,
/// so list sections are replaced wholesale.
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

/// Merge an overlay onto the stock defaults, deserialize and validate.
pub fn resolve_settings(overlay: toml::Value) -> Result<Settings, ConfigError> {
    let merged = merge_toml(stock_defaults_value(), overlay);
    let settings: Settings = merged.try_into()?;
    settings.validate()?;
    Ok(settings)
}

/// Load and validate a project file.
pub fn load_settings(path: &Path) -> Result<Settings, ConfigError> {
    if !path.is_file() {
        return Err(ConfigError::Missing(path.to_path_buf()));
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    resolve_settings(value)
}

/// A fully commented project file with every setting at its stock value.
///
/// Printed by `sitemake --gen-config`.
pub fn stock_settings_toml() -> &'static str {
    r##"# sitemake project file
# =====================
# Everything under [settings] is optional; the values below are the defaults.
# Unknown keys are rejected.

# Post slugs, oldest first. Each maps to <content_dir>/post/<slug><source_ext>.
posts = []

# Page slugs. Each maps to <content_dir>/<slug><source_ext>.
# A page named "index" becomes the site root when html_ext starts with "/".
pages = []

# Files or directories (expanded recursively) copied into the output directory.
copy = []

# Tags that get their own listing page and Atom feed.
tags = []

# ---------------------------------------------------------------------------
# Renderer globals. Keys are uppercase with '_'; all five below are required.
# ---------------------------------------------------------------------------
[global]
AUTHOR_NAME = "Your Name"
AUTHOR_EMAIL = "you@example.org"
SITE_TITLE = "My Blog"
SITE_TAGLINE = "Yet another blog"
BASE_DOMAIN = "https://example.org"

# ---------------------------------------------------------------------------
# Build settings. All values are strings.
# ---------------------------------------------------------------------------
[settings]
source_ext = ".txt"
content_dir = "content"
template_dir = "templates"
main_template = "main.tmpl"

# Empty means: use the built-in Atom template.
atom_template = ""

output_dir = "_build"
date_format = "%b %d, %Y, %I:%M %p GMT"

# 0 disables the index, tag listings and pagination pages.
posts_per_page = "10"

# 0 disables the Atom feeds.
atom_posts_per_page = "10"

html_ext = "/index.html"
index_prefix = ""
post_prefix = "post"
pagination_prefix = "page"
tag_prefix = "tag"
atom_prefix = "atom"
atom_ext = ".xml"

# "ASC" for oldest first; anything else lists newest first.
html_order = "DESC"
atom_order = "DESC"

# Exported as LC_ALL to the renderer when set.
locale = ""
"##
}
