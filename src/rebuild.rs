//! The rebuild decision.
//!
//! [`needs_rebuild`] is the only staleness check in the engine. It compares
//! an output's captured mtime against its dependencies and errs on the side
//! of rebuilding: a missing output, or any missing dependency, means the
//! renderer runs (and reports the real problem if there is one).

use crate::file::FileHandle;

/// Decide whether `output` must be regenerated.
///
/// The dependencies are `settings` and `template` when given, followed by
/// `sources`, or only the first source when `only_first_source` is set. The
/// output is stale when it is absent or unreadable, when any dependency is
/// unreadable, or when any dependency is strictly newer than it.
pub fn needs_rebuild(
    sources: &[FileHandle],
    settings: Option<&FileHandle>,
    template: Option<&FileHandle>,
    output: Option<&FileHandle>,
    only_first_source: bool,
) -> bool {
    let Some(output) = output.filter(|o| o.readable) else {
        return true;
    };

    let take = if only_first_source { 1 } else { sources.len() };
    settings
        .into_iter()
        .chain(template)
        .chain(sources.iter().take(take))
        .any(|dep| !dep.readable || dep.mtime > output.mtime)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file::Mtime;

    fn file(secs: i64, nanos: u32) -> FileHandle {
        FileHandle::with_mtime("/f", Mtime::new(secs, nanos))
    }

    fn missing() -> FileHandle {
        FileHandle::unreadable("/missing")
    }

    // =========================================================================
    // Output state
    // =========================================================================

    #[test]
    fn absent_output_always_rebuilds() {
        assert!(needs_rebuild(&[], None, None, None, false));
        assert!(needs_rebuild(&[file(0, 0)], None, None, None, false));
    }

    #[test]
    fn unreadable_output_rebuilds_even_with_old_sources() {
        let out = missing();
        assert!(needs_rebuild(&[file(0, 0)], None, None, Some(&out), false));
    }

    #[test]
    fn readable_output_without_dependencies_is_fresh() {
        let out = file(100, 0);
        assert!(!needs_rebuild(&[], None, None, Some(&out), false));
    }

    // =========================================================================
    // Timestamp comparison
    // =========================================================================

    #[test]
    fn same_second_later_nanos_rebuilds() {
        let out = file(100, 0);
        assert!(needs_rebuild(&[file(100, 500)], None, None, Some(&out), false));
    }

    #[test]
    fn same_second_earlier_nanos_is_fresh() {
        let out = file(100, 500);
        assert!(!needs_rebuild(&[file(100, 499)], None, None, Some(&out), false));
    }

    #[test]
    fn equal_mtime_is_fresh() {
        let out = file(100, 500);
        assert!(!needs_rebuild(&[file(100, 500)], None, None, Some(&out), false));
    }

    #[test]
    fn later_second_rebuilds_regardless_of_nanos() {
        let out = file(100, 999_999_999);
        assert!(needs_rebuild(&[file(101, 0)], None, None, Some(&out), false));
    }

    #[test]
    fn earlier_second_is_fresh_regardless_of_nanos() {
        let out = file(100, 0);
        assert!(!needs_rebuild(&[file(99, 999_999_999)], None, None, Some(&out), false));
    }

    // =========================================================================
    // Dependency set
    // =========================================================================

    #[test]
    fn newer_settings_rebuilds() {
        let out = file(100, 0);
        let settings = file(200, 0);
        assert!(needs_rebuild(&[file(1, 0)], Some(&settings), None, Some(&out), false));
    }

    #[test]
    fn newer_template_rebuilds() {
        let out = file(100, 0);
        let template = file(200, 0);
        assert!(needs_rebuild(&[], None, Some(&template), Some(&out), false));
    }

    #[test]
    fn unreadable_dependency_rebuilds() {
        let out = file(100, 0);
        let template = missing();
        assert!(needs_rebuild(&[file(1, 0)], None, Some(&template), Some(&out), false));
        assert!(needs_rebuild(&[missing()], None, None, Some(&out), false));
    }

    #[test]
    fn any_newer_source_rebuilds() {
        let out = file(100, 0);
        let sources = [file(1, 0), file(2, 0), file(150, 0)];
        assert!(needs_rebuild(&sources, None, None, Some(&out), false));
    }

    #[test]
    fn only_first_source_ignores_the_rest() {
        let out = file(100, 0);
        let sources = [file(1, 0), file(150, 0), missing()];
        assert!(!needs_rebuild(&sources, None, None, Some(&out), true));
        assert!(needs_rebuild(&sources[1..], None, None, Some(&out), true));
    }

    #[test]
    fn only_first_source_with_empty_list_checks_settings_only() {
        let out = file(100, 0);
        let settings = file(50, 0);
        assert!(!needs_rebuild(&[], Some(&settings), None, Some(&out), true));
    }
}
