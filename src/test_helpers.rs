//! Shared test utilities for the sitemake test suite.
//!
//! Provides a builder for throwaway projects on disk and a handle to the
//! written project for building contexts and aging files.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let project = Project::new()
//!     .posts(&["first", "second"])
//!     .pages(&["about"])
//!     .setting("posts_per_page", "1")
//!     .file("_build/index.html", "old")
//!     .write();
//! project.set_mtime("_build/index.html", 100);
//!
//! let ctx = project.context();
//! assert_eq!(ctx.posts.len(), 2);
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, UNIX_EPOCH};
use tempfile::TempDir;

use crate::config::DEFAULT_SETTINGS_FILE;
use crate::context::{BuildContext, ContextOptions};

/// Globals written into every test project.
pub const TEST_GLOBALS: &[(&str, &str)] = &[
    ("AUTHOR_EMAIL", "author@example.com"),
    ("AUTHOR_NAME", "Author"),
    ("BASE_DOMAIN", "https://example.com"),
    ("SITE_TAGLINE", "Testing"),
    ("SITE_TITLE", "Test Site"),
];

// =========================================================================
// Project builder
// =========================================================================

/// Describes a project to write into a temp directory.
///
/// Post and page sources, the main template and `sitemake.toml` are always
/// written (sources can be skipped); anything else goes through [`file`].
///
/// [`file`]: Project::file
#[derive(Debug, Clone)]
pub struct Project {
    posts: Vec<String>,
    pages: Vec<String>,
    copy: Vec<String>,
    tags: Vec<String>,
    settings: Vec<(String, String)>,
    files: Vec<(String, String)>,
    write_sources: bool,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn quote(s: &str) -> String {
    toml::Value::String(s.to_string()).to_string()
}

fn toml_list(items: &[String]) -> String {
    let quoted: Vec<String> = items.iter().map(|s| quote(s)).collect();
    format!("[{}]", quoted.join(", "))
}

impl Project {
    pub fn new() -> Self {
        Self {
            posts: Vec::new(),
            pages: Vec::new(),
            copy: Vec::new(),
            tags: Vec::new(),
            settings: Vec::new(),
            files: Vec::new(),
            write_sources: true,
        }
    }

    pub fn posts(mut self, slugs: &[&str]) -> Self {
        self.posts = strings(slugs);
        self
    }

    pub fn pages(mut self, slugs: &[&str]) -> Self {
        self.pages = strings(slugs);
        self
    }

    pub fn copy(mut self, entries: &[&str]) -> Self {
        self.copy = strings(entries);
        self
    }

    pub fn tags(mut self, tags: &[&str]) -> Self {
        self.tags = strings(tags);
        self
    }

    /// Set a `[settings]` key.
    pub fn setting(mut self, key: &str, value: &str) -> Self {
        self.settings.push((key.to_string(), value.to_string()));
        self
    }

    /// Write an extra file, relative to the project root.
    pub fn file(mut self, path: &str, content: &str) -> Self {
        self.files.push((path.to_string(), content.to_string()));
        self
    }

    /// Declare posts and pages without creating their source files.
    pub fn skip_sources(mut self) -> Self {
        self.write_sources = false;
        self
    }

    fn settings_toml(&self) -> String {
        let mut out = String::new();
        for (key, list) in [
            ("posts", &self.posts),
            ("pages", &self.pages),
            ("copy", &self.copy),
            ("tags", &self.tags),
        ] {
            out.push_str(&format!("{key} = {}\n", toml_list(list)));
        }
        out.push_str("\n[global]\n");
        for (key, value) in TEST_GLOBALS {
            out.push_str(&format!("{key} = {}\n", quote(value)));
        }
        out.push_str("\n[settings]\n");
        for (key, value) in &self.settings {
            out.push_str(&format!("{key} = {}\n", quote(value)));
        }
        out
    }

    /// Write everything into a fresh temp directory.
    pub fn write(self) -> ProjectDir {
        let dir = ProjectDir {
            tmp: TempDir::new().unwrap(),
        };

        if self.write_sources {
            let source = |slug: &str| format!("TITLE: {slug}\n----------\n{slug}\n");
            for slug in &self.posts {
                dir.write_file(&format!("content/post/{slug}.txt"), &source(slug));
            }
            for slug in &self.pages {
                dir.write_file(&format!("content/{slug}.txt"), &source(slug));
            }
        }
        dir.write_file("templates/main.tmpl", "{% block entry %}{{ CONTENT }}{% endblock %}\n");
        for (path, content) in &self.files {
            dir.write_file(path, content);
        }
        dir.write_file(DEFAULT_SETTINGS_FILE, &self.settings_toml());
        dir
    }
}

impl Default for Project {
    fn default() -> Self {
        Self::new()
    }
}

// =========================================================================
// Written project
// =========================================================================

/// A project written to disk. The directory is removed on drop.
pub struct ProjectDir {
    tmp: TempDir,
}

impl ProjectDir {
    pub fn root(&self) -> PathBuf {
        self.tmp.path().to_path_buf()
    }

    pub fn path(&self, rel: &str) -> PathBuf {
        self.tmp.path().join(rel)
    }

    fn write_file(&self, rel: &str, content: &str) {
        let path = self.path(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    pub fn options(&self) -> ContextOptions {
        ContextOptions::new(self.path(DEFAULT_SETTINGS_FILE))
    }

    /// Build a context, panicking on failure.
    pub fn context(&self) -> BuildContext {
        BuildContext::new(&self.options())
            .unwrap_or_else(|e| panic!("failed to build context: {e}"))
    }

    /// Replace `sitemake.toml` with the one `project` would write. Other
    /// files are left alone.
    pub fn rewrite(&self, project: Project) {
        self.write_file(DEFAULT_SETTINGS_FILE, &project.settings_toml());
    }

    /// Set a file's modification time to `secs` after the epoch.
    pub fn set_mtime(&self, rel: &str, secs: u64) {
        set_mtime(&self.path(rel), secs);
    }
}

/// Set a file's modification time to `secs` after the epoch.
pub fn set_mtime(path: &Path, secs: u64) {
    fs::File::options()
        .write(true)
        .open(path)
        .and_then(|f| f.set_modified(UNIX_EPOCH + Duration::from_secs(secs)))
        .unwrap_or_else(|e| panic!("cannot set mtime of {}: {e}", path.display()));
}
