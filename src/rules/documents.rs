//! Single-document rules: one output per post and one per page.
//!
//! Outputs line up positionally with their sources, and each output only
//! depends on its own source (plus the settings file and main template).

use super::{Engine, RuleArgs, RuleError, separator};
use crate::context::BuildContext;
use crate::exec::RenderJob;
use crate::file::FileHandle;
use crate::rebuild::needs_rebuild;
use crate::variables::{LocalVariables, Variables, posts_ordering};

/// Render each stale output from the source at the same position.
fn render_documents(
    engine: &Engine<'_>,
    ctx: &BuildContext,
    vars: &Variables,
    sources: &[FileHandle],
    outputs: &[FileHandle],
) -> Result<(), RuleError> {
    for (source, output) in sources.chunks(1).zip(outputs) {
        if !needs_rebuild(
            source,
            Some(&ctx.settings_file),
            Some(&ctx.main_template),
            Some(output),
            true,
        ) {
            continue;
        }
        engine.executor.render(
            ctx,
            &RenderJob {
                variables: vars,
                local: Some(LocalVariables::for_document(&source[0])),
                listing: false,
                template: &ctx.main_template,
                output,
                sources: source,
            },
        )?;
    }
    Ok(())
}

// =============================================================================
// posts
// =============================================================================

pub fn posts_outputs(ctx: &BuildContext) -> Vec<FileHandle> {
    let prefix = ctx.settings.get("post_prefix");
    let html_ext = ctx.settings.get("html_ext");
    ctx.posts
        .iter()
        .map(|post| {
            ctx.output_handle(&format!(
                "{}{}{prefix}/{}{html_ext}",
                ctx.short_output_dir,
                separator(prefix),
                post.slug()
            ))
        })
        .collect()
}

pub fn posts_exec(
    engine: &Engine<'_>,
    ctx: &BuildContext,
    outputs: &[FileHandle],
    _args: &RuleArgs,
) -> Result<(), RuleError> {
    if ctx.posts.is_empty() {
        return Ok(());
    }
    let mut vars = Variables::for_rule("posts", "post");
    vars.insert("IS_POST", "1");
    vars.insert("DATE_FORMAT", ctx.settings.get("date_format"));
    posts_ordering(&ctx.settings, &mut vars, "html_order");

    render_documents(engine, ctx, &vars, &ctx.posts, outputs)
}

// =============================================================================
// pages
// =============================================================================

pub fn pages_outputs(ctx: &BuildContext) -> Vec<FileHandle> {
    let html_ext = ctx.settings.get("html_ext");
    ctx.pages
        .iter()
        .map(|page| {
            // The `index` page becomes the output directory's own index.
            let path = if page.slug() == "index" && html_ext.starts_with('/') {
                format!("{}{html_ext}", ctx.short_output_dir)
            } else {
                format!("{}/{}{html_ext}", ctx.short_output_dir, page.slug())
            };
            ctx.output_handle(&path)
        })
        .collect()
}

pub fn pages_exec(
    engine: &Engine<'_>,
    ctx: &BuildContext,
    outputs: &[FileHandle],
    _args: &RuleArgs,
) -> Result<(), RuleError> {
    if ctx.pages.is_empty() {
        return Ok(());
    }
    let mut vars = Variables::for_rule("pages", "page");
    vars.insert("DATE_FORMAT", ctx.settings.get("date_format"));

    render_documents(engine, ctx, &vars, &ctx.pages, outputs)
}
