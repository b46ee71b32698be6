//! CLI output formatting.
//!
//! # Rule listing
//!
//! Appended to `--help`. Helper rules come first, build rules second, each
//! group in table order:
//!
//! ```text
//! helper rules:
//!     all           run all build rules
//!     clean         clean built files and empty directories in output directory
//!
//! build rules:
//!     index         build website index from posts
//! ```
//!
//! Each listing has a `format_*` function (returns `Vec<String>`) for
//! testability. Format functions are pure: no I/O, no side effects.

use crate::rules::{Rule, RuleTable};

fn rule_line(rule: &Rule) -> String {
    format!("    {:<12}  {}", rule.name, rule.help)
}

/// Rules split into helper rules and build rules, table order preserved.
pub fn partition_rules(table: &RuleTable) -> (Vec<&Rule>, Vec<&Rule>) {
    table.iter().partition(|r| !r.generates_files)
}

pub fn format_rule_help(table: &RuleTable) -> Vec<String> {
    let (helpers, builders) = partition_rules(table);
    let mut lines = vec!["helper rules:".to_string()];
    lines.extend(helpers.into_iter().map(rule_line));
    lines.push(String::new());
    lines.push("build rules:".to_string());
    lines.extend(builders.into_iter().map(rule_line));
    lines
}

/// The rule listing as one block of text.
pub fn rule_help(table: &RuleTable) -> String {
    format_rule_help(table).join("\n")
}
