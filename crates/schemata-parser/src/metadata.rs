//! Metadata written in block comments.
//!
//! A comment placed before the first declaration is the file header; its
//! `Format Name:` line names the format. A comment placed directly after a
//! declaration's `{` describes that structure through `Description:` and
//! `Example Value:` lines. Any other comment is ignored.

use log::trace;

use schemata_core::Metadata;

use crate::{parser_types::Declaration, span::Spanned};

/// Value of the first `key:` line in `comment`, trimmed.
///
/// Leading `*` decorations on a line are skipped, so boxed comments work.
fn field<'a>(comment: &'a str, key: &str) -> Option<&'a str> {
    comment.lines().find_map(|line| {
        let line = line.trim_start().trim_start_matches('*').trim_start();
        let value = line.strip_prefix(key)?.strip_prefix(':')?.trim();
        (!value.is_empty()).then_some(value)
    })
}

/// The `Format Name:` of the header comment, if the file starts with one.
pub(crate) fn format_name(
    comments: &[Spanned<&str>],
    declarations: &[Declaration<'_>],
) -> Option<String> {
    let header = comments.first()?;
    let before_declarations = declarations
        .first()
        .is_none_or(|first| header.span().end() <= first.span.start());
    if !before_declarations {
        return None;
    }

    let name = field(header.inner(), "Format Name")?;
    trace!(format_name = name; "Found format name");
    Some(name.to_string())
}

/// The metadata of `declaration`, taken from a comment right after its `{`.
pub(crate) fn structure(declaration: &Declaration<'_>, comments: &[Spanned<&str>]) -> Metadata {
    let body_start = declaration.open.end();
    let next_token = declaration
        .properties
        .first()
        .map_or(declaration.span.end(), |property| property.name.span().start());

    let Some(comment) = comments
        .iter()
        .find(|comment| comment.span().start() > body_start && comment.span().end() < next_token)
    else {
        return Metadata::default();
    };

    Metadata::new(
        field(comment.inner(), "Description").map(str::to_string),
        field(comment.inner(), "Example Value").map(str::to_string),
    )
}
