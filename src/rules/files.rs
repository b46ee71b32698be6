//! Rules that move files rather than render them: `copy` and `clean`.

use super::{Engine, RuleArgs, RuleError};
use crate::context::BuildContext;
use crate::file::FileHandle;
use crate::rebuild::needs_rebuild;
use tracing::warn;

// =============================================================================
// copy
// =============================================================================

/// One output per expanded copy source, mirroring its project-relative path.
pub fn copy_outputs(ctx: &BuildContext) -> Vec<FileHandle> {
    ctx.copy
        .iter()
        .map(|source| ctx.output_handle(&format!("{}/{}", ctx.short_output_dir, source.short_path)))
        .collect()
}

pub fn copy_exec(
    engine: &Engine<'_>,
    ctx: &BuildContext,
    outputs: &[FileHandle],
    _args: &RuleArgs,
) -> Result<(), RuleError> {
    for (source, output) in ctx.copy.chunks(1).zip(outputs) {
        if needs_rebuild(source, Some(&ctx.settings_file), None, Some(output), true) {
            engine.executor.copy(&source[0], output)?;
        }
    }
    Ok(())
}

// =============================================================================
// clean
// =============================================================================

/// Remove every existing output of the engine's file-generating rules.
///
/// `clean` has no enumerator of its own: its outputs are whatever the table
/// it runs from would build.
pub fn clean_exec(
    engine: &Engine<'_>,
    ctx: &BuildContext,
    _outputs: &[FileHandle],
    _args: &RuleArgs,
) -> Result<(), RuleError> {
    for output in engine.table.built_files(ctx).iter().filter(|o| o.readable) {
        engine.executor.remove(&ctx.output_dir, output)?;
    }

    if !engine.executor.is_empty_dir(&ctx.output_dir) {
        warn!(
            dir = %ctx.short_output_dir,
            "output directory is not empty!"
        );
    }
    Ok(())
}
