//! Variables handed to the renderer.
//!
//! Two shapes exist. [`Variables`] is owned and rule-scoped: a rule fills it
//! once, then rewrites single keys (`FILTER_PAGE`, `FILTER_TAG`) as it loops
//! over its outputs. [`LocalVariables`] is per document and only borrows the
//! slug from the source [`FileHandle`].

use crate::config::Settings;
use crate::file::FileHandle;
use std::collections::BTreeMap;

/// Date format used by feeds regardless of `date_format`.
pub const ATOM_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// String-keyed renderer variables. Inserting an existing key replaces its
/// value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Variables {
    map: BTreeMap<String, String>,
}

impl Variables {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.map.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.map.get(key).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.map.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Tag the mapping with the rule that owns it and the kind of content it
    /// renders.
    pub fn for_rule(rule: &str, kind: &str) -> Self {
        let mut vars = Self::new();
        vars.insert("MAKE_RULE", rule);
        vars.insert("MAKE_TYPE", kind);
        vars
    }
}

/// Per-document variables. Holds nothing but a borrowed `MAKE_SLUG`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalVariables<'a> {
    slug: &'a str,
}

impl<'a> LocalVariables<'a> {
    pub fn for_document(source: &'a FileHandle) -> Self {
        Self {
            slug: source.slug(),
        }
    }

    pub fn slug(&self) -> &'a str {
        self.slug
    }

    pub fn iter(self) -> impl Iterator<Item = (&'static str, &'a str)> {
        std::iter::once(("MAKE_SLUG", self.slug))
    }
}

// =============================================================================
// Shared builders
// =============================================================================

/// Ask for newest-first listings unless the setting says `ASC`.
pub fn posts_ordering(settings: &Settings, vars: &mut Variables, key: &str) {
    match settings.get(key) {
        "ASC" | "asc" => {}
        _ => vars.insert("FILTER_REVERSE", "1"),
    }
}

/// Limit listings to the first page of `key` posts. Negative values leave
/// the listing unpaginated.
pub fn posts_pagination(settings: &Settings, vars: &mut Variables, key: &str) {
    if settings.get_long(key) >= 0 {
        vars.insert("FILTER_PAGE", "1");
        vars.insert("FILTER_PER_PAGE", settings.get(key));
    }
}

/// Whether a posts-per-page setting turns its listings on at all.
pub fn pagination_enabled(settings: &Settings, key: &str) -> bool {
    settings.get_long(key) != 0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings_with(key: &str, value: &str) -> Settings {
        let mut s = Settings::default();
        s.settings.insert(key.into(), value.into());
        s
    }

    #[test]
    fn insert_overwrites_existing_key() {
        let mut vars = Variables::new();
        vars.insert("FILTER_PAGE", "1");
        vars.insert("FILTER_PAGE", "2");
        assert_eq!(vars.get("FILTER_PAGE"), Some("2"));
        assert_eq!(vars.len(), 1);
    }

    #[test]
    fn for_rule_sets_identity_tags() {
        let vars = Variables::for_rule("index", "post");
        assert_eq!(vars.get("MAKE_RULE"), Some("index"));
        assert_eq!(vars.get("MAKE_TYPE"), Some("post"));
    }

    #[test]
    fn local_variables_borrow_slug() {
        let mut source = FileHandle::unreadable("/p/hello.txt");
        source.slug = Some("hello".into());
        let local = LocalVariables::for_document(&source);
        assert_eq!(local.iter().collect::<Vec<_>>(), vec![("MAKE_SLUG", "hello")]);
        assert!(std::ptr::eq(local.slug(), source.slug()));
    }

    #[test]
    fn ordering_desc_by_default() {
        let mut vars = Variables::new();
        posts_ordering(&Settings::default(), &mut vars, "html_order");
        assert_eq!(vars.get("FILTER_REVERSE"), Some("1"));
    }

    #[test]
    fn ordering_asc_in_either_case() {
        for value in ["ASC", "asc"] {
            let mut vars = Variables::new();
            posts_ordering(&settings_with("atom_order", value), &mut vars, "atom_order");
            assert_eq!(vars.get("FILTER_REVERSE"), None);
        }
        let mut vars = Variables::new();
        posts_ordering(&settings_with("atom_order", "Asc"), &mut vars, "atom_order");
        assert_eq!(vars.get("FILTER_REVERSE"), Some("1"));
    }

    #[test]
    fn pagination_copies_raw_setting() {
        let mut vars = Variables::new();
        posts_pagination(&settings_with("posts_per_page", "5"), &mut vars, "posts_per_page");
        assert_eq!(vars.get("FILTER_PAGE"), Some("1"));
        assert_eq!(vars.get("FILTER_PER_PAGE"), Some("5"));
    }

    #[test]
    fn pagination_skipped_for_negative_values() {
        let mut vars = Variables::new();
        posts_pagination(&settings_with("posts_per_page", "-1"), &mut vars, "posts_per_page");
        assert!(vars.is_empty());
    }

    #[test]
    fn pagination_enabled_for_any_nonzero_value() {
        assert!(pagination_enabled(&settings_with("posts_per_page", "3"), "posts_per_page"));
        assert!(pagination_enabled(&settings_with("posts_per_page", "-1"), "posts_per_page"));
        assert!(!pagination_enabled(&settings_with("posts_per_page", "0"), "posts_per_page"));
        assert!(!pagination_enabled(&settings_with("posts_per_page", ""), "posts_per_page"));
    }
}
