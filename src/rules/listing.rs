//! Rules rendering listings over the whole post collection: the index,
//! the main feed, per-tag feeds, pagination pages and per-tag listings.
//!
//! Every listing depends on all posts and on the settings file. HTML listings
//! also depend on the main template; feeds do not track their template.
//! Looping rules reuse one [`Variables`] mapping and overwrite their filter
//! key (`FILTER_PAGE` or `FILTER_TAG`) on each iteration.

use super::{Engine, RuleArgs, RuleError, separator};
use crate::context::BuildContext;
use crate::exec::RenderJob;
use crate::file::FileHandle;
use crate::rebuild::needs_rebuild;
use crate::variables::{
    ATOM_DATE_FORMAT, Variables, pagination_enabled, posts_ordering, posts_pagination,
};

/// Render `output` as a listing of every post when it is stale.
fn render_listing(
    engine: &Engine<'_>,
    ctx: &BuildContext,
    vars: &Variables,
    template: &FileHandle,
    track_template: bool,
    output: &FileHandle,
) -> Result<(), RuleError> {
    let dependency = track_template.then_some(template);
    if !needs_rebuild(&ctx.posts, Some(&ctx.settings_file), dependency, Some(output), false) {
        return Ok(());
    }
    engine.executor.render(
        ctx,
        &RenderJob {
            variables: vars,
            local: None,
            listing: true,
            template,
            output,
            sources: &ctx.posts,
        },
    )?;
    Ok(())
}

fn html_variables(ctx: &BuildContext, rule: &str) -> Variables {
    let mut vars = Variables::for_rule(rule, "post");
    posts_ordering(&ctx.settings, &mut vars, "html_order");
    vars.insert("DATE_FORMAT", ctx.settings.get("date_format"));
    vars
}

fn atom_variables(ctx: &BuildContext, rule: &str) -> Variables {
    let mut vars = Variables::for_rule(rule, "atom");
    posts_pagination(&ctx.settings, &mut vars, "atom_posts_per_page");
    posts_ordering(&ctx.settings, &mut vars, "atom_order");
    vars.insert("DATE_FORMAT", ATOM_DATE_FORMAT);
    vars
}

// =============================================================================
// index
// =============================================================================

pub fn index_outputs(ctx: &BuildContext) -> Vec<FileHandle> {
    if ctx.posts.is_empty() || !pagination_enabled(&ctx.settings, "posts_per_page") {
        return Vec::new();
    }
    let html_ext = ctx.settings.get("html_ext");
    let prefix = ctx.settings.get("index_prefix");
    // A root-relative extension on an empty prefix names the directory index.
    let slash = if prefix.is_empty() && html_ext.starts_with('/') {
        ""
    } else {
        "/"
    };
    vec![ctx.output_handle(&format!("{}{slash}{prefix}{html_ext}", ctx.short_output_dir))]
}

pub fn index_exec(
    engine: &Engine<'_>,
    ctx: &BuildContext,
    outputs: &[FileHandle],
    _args: &RuleArgs,
) -> Result<(), RuleError> {
    if ctx.posts.is_empty() {
        return Ok(());
    }
    let mut vars = html_variables(ctx, "index");
    posts_pagination(&ctx.settings, &mut vars, "posts_per_page");

    for output in outputs {
        render_listing(engine, ctx, &vars, &ctx.main_template, true, output)?;
    }
    Ok(())
}

// =============================================================================
// atom
// =============================================================================

pub fn atom_outputs(ctx: &BuildContext) -> Vec<FileHandle> {
    if ctx.posts.is_empty() || !pagination_enabled(&ctx.settings, "atom_posts_per_page") {
        return Vec::new();
    }
    let prefix = ctx.settings.get("atom_prefix");
    let ext = ctx.settings.get("atom_ext");
    vec![ctx.output_handle(&format!(
        "{}{}{prefix}{ext}",
        ctx.short_output_dir,
        separator(prefix)
    ))]
}

pub fn atom_exec(
    engine: &Engine<'_>,
    ctx: &BuildContext,
    outputs: &[FileHandle],
    _args: &RuleArgs,
) -> Result<(), RuleError> {
    if ctx.posts.is_empty() {
        return Ok(());
    }
    let vars = atom_variables(ctx, "atom");
    for output in outputs {
        render_listing(engine, ctx, &vars, &ctx.atom_template, false, output)?;
    }
    Ok(())
}

// =============================================================================
// atom_tags
// =============================================================================

pub fn atom_tags_outputs(ctx: &BuildContext) -> Vec<FileHandle> {
    if ctx.posts.is_empty()
        || ctx.tags().is_empty()
        || !pagination_enabled(&ctx.settings, "atom_posts_per_page")
    {
        return Vec::new();
    }
    let prefix = ctx.settings.get("atom_prefix");
    let ext = ctx.settings.get("atom_ext");
    ctx.tags()
        .iter()
        .map(|tag| {
            ctx.output_handle(&format!(
                "{}{}{prefix}/{tag}{ext}",
                ctx.short_output_dir,
                separator(prefix)
            ))
        })
        .collect()
}

pub fn atom_tags_exec(
    engine: &Engine<'_>,
    ctx: &BuildContext,
    outputs: &[FileHandle],
    _args: &RuleArgs,
) -> Result<(), RuleError> {
    if ctx.posts.is_empty() || ctx.tags().is_empty() {
        return Ok(());
    }
    let mut vars = atom_variables(ctx, "atom_tags");
    for (output, tag) in outputs.iter().zip(ctx.tags()) {
        vars.insert("FILTER_TAG", tag.as_str());
        render_listing(engine, ctx, &vars, &ctx.atom_template, false, output)?;
    }
    Ok(())
}

// =============================================================================
// pagination
// =============================================================================

pub fn pagination_outputs(ctx: &BuildContext) -> Vec<FileHandle> {
    let per_page = ctx.settings.get_long("posts_per_page");
    if ctx.posts.is_empty() || per_page <= 0 {
        return Vec::new();
    }
    let pages = ctx.posts.len().div_ceil(per_page as usize);
    let prefix = ctx.settings.get("pagination_prefix");
    let html_ext = ctx.settings.get("html_ext");
    (1..=pages)
        .map(|page| {
            ctx.output_handle(&format!(
                "{}{}{prefix}/{page}{html_ext}",
                ctx.short_output_dir,
                separator(prefix)
            ))
        })
        .collect()
}

pub fn pagination_exec(
    engine: &Engine<'_>,
    ctx: &BuildContext,
    outputs: &[FileHandle],
    _args: &RuleArgs,
) -> Result<(), RuleError> {
    if ctx.posts.is_empty() {
        return Ok(());
    }
    let mut vars = html_variables(ctx, "pagination");
    vars.insert("FILTER_PER_PAGE", ctx.settings.get("posts_per_page"));

    for (page, output) in (1..).zip(outputs) {
        vars.insert("FILTER_PAGE", page.to_string());
        render_listing(engine, ctx, &vars, &ctx.main_template, true, output)?;
    }
    Ok(())
}

// =============================================================================
// tags
// =============================================================================

pub fn tags_outputs(ctx: &BuildContext) -> Vec<FileHandle> {
    if ctx.posts.is_empty()
        || ctx.tags().is_empty()
        || !pagination_enabled(&ctx.settings, "posts_per_page")
    {
        return Vec::new();
    }
    let prefix = ctx.settings.get("tag_prefix");
    let html_ext = ctx.settings.get("html_ext");
    ctx.tags()
        .iter()
        .map(|tag| {
            ctx.output_handle(&format!(
                "{}{}{prefix}/{tag}{html_ext}",
                ctx.short_output_dir,
                separator(prefix)
            ))
        })
        .collect()
}

pub fn tags_exec(
    engine: &Engine<'_>,
    ctx: &BuildContext,
    outputs: &[FileHandle],
    _args: &RuleArgs,
) -> Result<(), RuleError> {
    if ctx.posts.is_empty() || ctx.tags().is_empty() {
        return Ok(());
    }
    let mut vars = html_variables(ctx, "tags");
    posts_pagination(&ctx.settings, &mut vars, "posts_per_page");

    for (output, tag) in outputs.iter().zip(ctx.tags()) {
        vars.insert("FILTER_TAG", tag.as_str());
        render_listing(engine, ctx, &vars, &ctx.main_template, true, output)?;
    }
    Ok(())
}
