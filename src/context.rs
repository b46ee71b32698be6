//! The build context: everything a rule needs to know about the project,
//! captured once per build pass.
//!
//! A [`BuildContext`] is created from the project file plus a scan of the
//! filesystem and is read-only afterwards. Sources, templates and the project
//! file itself are stat'd here and nowhere else; when a trigger loop wants
//! fresh timestamps it asks for a whole new context via
//! [`BuildContext::reload`].

use crate::config::{self, ConfigError, Settings};
use crate::file::FileHandle;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum ContextError {
    #[error("{0}")]
    Config(#[from] ConfigError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to expand copy directory: {0}")]
    Walk(#[from] walkdir::Error),
}

impl ContextError {
    /// Settings problems are usage errors; anything else leaves the engine
    /// without a context.
    pub fn exit_code(&self) -> i32 {
        match self {
            ContextError::Config(_) => 2,
            ContextError::Io(_) | ContextError::Walk(_) => 3,
        }
    }
}

/// How to build a context. Kept around so the context can rebuild itself.
#[derive(Debug, Clone)]
pub struct ContextOptions {
    /// Path to the project file.
    pub settings_file: PathBuf,
    /// Overrides `settings.output_dir` when set.
    pub output_dir: Option<String>,
    pub verbose: bool,
}

impl ContextOptions {
    pub fn new(settings_file: impl Into<PathBuf>) -> Self {
        Self {
            settings_file: settings_file.into(),
            output_dir: None,
            verbose: false,
        }
    }
}

#[derive(Debug)]
pub struct BuildContext {
    pub settings: Settings,
    /// Absolute directory holding the project file. Relative paths in the
    /// settings resolve against it.
    pub root_dir: PathBuf,
    pub settings_file: FileHandle,
    pub posts: Vec<FileHandle>,
    pub pages: Vec<FileHandle>,
    /// Copy sources with directories already expanded into their files.
    pub copy: Vec<FileHandle>,
    pub main_template: FileHandle,
    pub atom_template: FileHandle,
    /// Absolute output directory.
    pub output_dir: PathBuf,
    /// Output directory as configured; the prefix of every output path.
    pub short_output_dir: String,
    pub verbose: bool,
    options: ContextOptions,
    // Owns the deployed built-in atom template, if any.
    _atom_dir: Option<TempDir>,
}

impl BuildContext {
    /// Load the project file named in `options` and scan the project.
    pub fn new(options: &ContextOptions) -> Result<Self, ContextError> {
        let settings_path = std::path::absolute(&options.settings_file)?;
        let settings = config::load_settings(&settings_path)?;
        Self::from_settings(options, &settings_path, settings)
    }

    /// Build a context from settings that were already loaded.
    ///
    /// `settings_path` must be absolute; its parent is the project root.
    pub fn from_settings(
        options: &ContextOptions,
        settings_path: &Path,
        settings: Settings,
    ) -> Result<Self, ContextError> {
        let root_dir = settings_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("/"));
        let root = root_dir.as_path();

        let settings_file = FileHandle::stat(root, settings_path, None);

        let content_dir = settings.get("content_dir");
        let source_ext = settings.get("source_ext");
        let posts = settings
            .posts
            .iter()
            .map(|slug| {
                let path = Path::new(content_dir)
                    .join("post")
                    .join(format!("{slug}{source_ext}"));
                FileHandle::stat(root, path, Some(slug.clone()))
            })
            .collect();
        let pages = settings
            .pages
            .iter()
            .map(|slug| {
                let path = Path::new(content_dir).join(format!("{slug}{source_ext}"));
                FileHandle::stat(root, path, Some(slug.clone()))
            })
            .collect();
        let copy = expand_copy_list(root, &settings.copy)?;

        let template_dir = Path::new(settings.get("template_dir"));
        let main_template =
            FileHandle::stat(root, template_dir.join(settings.get("main_template")), None);

        let (atom_template, atom_dir) = match settings.get("atom_template") {
            "" => {
                let dir = TempDir::new()?;
                let path = dir.path().join("atom.tmpl");
                fs::write(&path, builtin_atom_template(&settings))?;
                (FileHandle::stat(root, &path, None), Some(dir))
            }
            name => (FileHandle::stat(root, template_dir.join(name), None), None),
        };

        let short_output_dir = options
            .output_dir
            .clone()
            .unwrap_or_else(|| settings.get("output_dir").to_string());
        let output_dir = root.join(&short_output_dir);

        Ok(Self {
            settings,
            root_dir,
            settings_file,
            posts,
            pages,
            copy,
            main_template,
            atom_template,
            output_dir,
            short_output_dir,
            verbose: options.verbose,
            options: options.clone(),
            _atom_dir: atom_dir,
        })
    }

    /// Re-read the project file and re-stat everything.
    pub fn reload(&self) -> Result<Self, ContextError> {
        Self::new(&self.options)
    }

    pub fn tags(&self) -> &[String] {
        &self.settings.tags
    }

    /// Stat an output path composed from `short_output_dir`.
    pub fn output_handle(&self, path: &str) -> FileHandle {
        FileHandle::stat(&self.root_dir, path, None)
    }

    /// Every file whose change should trigger a rebuild pass.
    pub fn watched_files(&self) -> Vec<&FileHandle> {
        let mut files = vec![&self.settings_file, &self.main_template];
        if self._atom_dir.is_none() {
            files.push(&self.atom_template);
        }
        files.extend(&self.posts);
        files.extend(&self.pages);
        files.extend(&self.copy);
        files
    }
}

/// Turn the configured copy entries into individual files. Directories are
/// walked recursively in file-name order; anything else, including entries
/// that do not exist, becomes a single handle.
fn expand_copy_list(root: &Path, entries: &[String]) -> Result<Vec<FileHandle>, ContextError> {
    let mut files = Vec::new();
    for entry in entries {
        let path = root.join(entry);
        if !path.is_dir() {
            files.push(FileHandle::stat(root, entry, None));
            continue;
        }
        for item in WalkDir::new(&path).sort_by_file_name() {
            let item = item?;
            if item.file_type().is_file() {
                files.push(FileHandle::stat(root, item.path(), None));
            }
        }
    }
    Ok(files)
}

const ATOM_TEMPLATE: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title type="text">{{ SITE_TITLE }}{% ifdef FILTER_TAG %} - {{ FILTER_TAG }}{% endif %}</title>
  <id>{{ BASE_URL }}@ATOM_PATH@</id>
  <updated>{{ DATE_FIRST_FORMATTED }}</updated>
  <link href="{{ BASE_DOMAIN }}{{ BASE_URL }}/" />
  <link href="{{ BASE_DOMAIN }}{{ BASE_URL }}@ATOM_PATH@" rel="self" />
  <author>
    <name>{{ AUTHOR_NAME }}</name>
    <email>{{ AUTHOR_EMAIL }}</email>
  </author>
  <subtitle type="text">{{ SITE_TAGLINE }}</subtitle>
  {% block listing %}
  <entry>
    <title type="text">{{ TITLE }}</title>
    <id>{{ BASE_URL }}@POST_PATH@</id>
    <updated>{{ DATE_FORMATTED }}</updated>
    <published>{{ DATE_FORMATTED }}</published>
    <link href="{{ BASE_DOMAIN }}{{ BASE_URL }}@POST_PATH@" />
    <author>
      <name>{{ AUTHOR_NAME }}</name>
      <email>{{ AUTHOR_EMAIL }}</email>
    </author>
    <content type="html"><![CDATA[{{ CONTENT }}]]></content>
  </entry>
  {% endblock %}
</feed>
"#;

/// The Atom template used when the project does not ship its own. Feed and
/// entry links follow the project's prefixes and extensions.
fn builtin_atom_template(settings: &Settings) -> String {
    let atom_path = match settings.get("atom_prefix") {
        "" => String::new(),
        prefix => format!("/{prefix}"),
    } + "{% ifdef FILTER_TAG %}/{{ FILTER_TAG }}{% endif %}"
        + settings.get("atom_ext");
    let post_path = match settings.get("post_prefix") {
        "" => format!("/{{{{ FILENAME }}}}{}", settings.get("html_ext")),
        prefix => format!("/{prefix}/{{{{ FILENAME }}}}{}", settings.get("html_ext")),
    };
    ATOM_TEMPLATE
        .replace("@ATOM_PATH@", &atom_path)
        .replace("@POST_PATH@", &post_path)
}
