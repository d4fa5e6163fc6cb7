// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Renders a [`crate::validator::ValidationError`] into a boxed, coloured,
//! caret-underlined report (`spec.md` §4.9).
//!
//! Grounded on `original_source/src/parser/error.cc`'s `format_pretty_message`
//! for the box layout (alternating-background context lines, caret line,
//! message line, decorative tail), reworked here as a list of structured
//! [`Span`] fragments per `spec.md` §9's "render spans last" design note so
//! tests can assert on content independent of color mode.

use crate::parser::{GroupIdx, ParseTree};
use crate::text;
use crate::validator::ValidationError;

/// A single coloured run of text. Rendering (turning a `Vec<Span>` into an
/// ANSI-escaped string) is the last step, kept separate so structure can be
/// asserted on directly in tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub fg: Option<(u8, u8, u8)>,
    pub bg: Option<(u8, u8, u8)>,
    pub text: String,
}

impl Span {
    #[must_use]
    pub fn plain(text: impl Into<String>) -> Self { Self { fg: None, bg: None, text: text.into() } }

    #[must_use]
    pub fn styled(text: impl Into<String>, fg: (u8, u8, u8), bg: (u8, u8, u8)) -> Self {
        Self { fg: Some(fg), bg: Some(bg), text: text.into() }
    }
}

const CARET_FG: (u8, u8, u8) = (239, 83, 80);
const MESSAGE_FG: (u8, u8, u8) = (239, 83, 80);
const CONTEXT_BG_EVEN: (u8, u8, u8) = (30, 30, 40);
const CONTEXT_BG_ODD: (u8, u8, u8) = (24, 24, 32);

/// Walks the parent chain from `group`, resolved via the `SubContent` token
/// that references it in its parent, accumulating `local_index` into the
/// top-level byte offset. Each step is O(1): the enclosing token's `index`
/// already holds the absolute offset within its own group's `raw`, so no
/// rescanning of sibling tokens is needed (the arena redesign in `spec.md`
/// §9 pays for this directly).
///
/// # Panics
///
/// Panics if a non-root group isn't referenced by exactly one `SubContent`
/// token in its parent — a [`ParseTree`] invariant violation.
#[must_use]
pub fn compute_real_index(tree: &ParseTree, group: GroupIdx, local_index: usize) -> usize {
    let mut offset = local_index;
    let mut current = group;

    while let Some(parent) = tree.group(current).parent {
        let sub_token = tree
            .group(parent)
            .tokens
            .iter()
            .find(|t| matches!(t.kind, crate::parser::TokenKind::SubContent(c) if c == current))
            .expect("non-root group must be referenced by exactly one SubContent token");
        offset += sub_token.index;
        current = parent;
    }

    offset
}

/// Structured, fully-resolved context for a rendered diagnostic.
pub struct ErrorInfo<'a> {
    pub kind_message: String,
    pub context: Option<ErrorContext<'a>>,
}

pub struct ErrorContext<'a> {
    pub source_label: &'a str,
    pub raw_text: &'a str,
    pub byte_offset: usize,
    pub length: usize,
}

/// Resolves a [`ValidationError`] against `tree` into an [`ErrorInfo`],
/// ready to render. `source_label` and `root_raw` describe the top-level
/// input (root group's `source`/`raw`).
#[must_use]
pub fn resolve<'a>(tree: &ParseTree, error: &ValidationError, source_label: &'a str, root_raw: &'a str) -> ErrorInfo<'a> {
    let token = &tree.group(error.group).tokens[error.token_idx];
    let byte_offset = compute_real_index(tree, error.group, token.index);
    let length = tree.token_len(token).max(1);

    ErrorInfo {
        kind_message: error.kind.to_string(),
        context: Some(ErrorContext { source_label, raw_text: root_raw, byte_offset, length }),
    }
}

/// Renders an [`ErrorInfo`] into a `Vec<Span>`, following the box layout in
/// `spec.md` §4.9. Up to 3 lines of context precede the caret/message pair;
/// numbered lines alternate background shades.
#[must_use]
pub fn render(info: &ErrorInfo<'_>) -> Vec<Span> {
    let mut spans = vec![Span::plain(format!("error: {}\n\n", info.kind_message))];

    let Some(ctx) = &info.context else {
        spans.push(Span::plain("(no further context)\n"));
        return spans;
    };

    let (err_line, err_col) = text::index_to_line_column(ctx.raw_text, ctx.byte_offset);
    let lines = text::split_lines(ctx.raw_text);

    spans.push(Span::plain(format!("  ╭─[{}: {}:{}]\n", ctx.source_label, err_line + 1, err_col + 1)));
    spans.push(Span::plain("  │\n"));

    let first_line = err_line.saturating_sub(2);
    for (display_idx, line_no) in (first_line..=err_line).enumerate() {
        let Some(content) = lines.get(line_no) else { continue };
        let bg = if display_idx % 2 == 0 { CONTEXT_BG_EVEN } else { CONTEXT_BG_ODD };
        spans.push(Span::plain(format!("{:>4} │ ", line_no + 1)));
        spans.push(Span::styled(format!("{content}\n"), (220, 220, 230), bg));
    }

    let caret_count = ctx.length.max(1);
    let pad = " ".repeat(err_col);
    spans.push(Span::plain("  ·   "));
    spans.push(Span::plain(pad.clone()));
    spans.push(Span::styled("^".repeat(caret_count), CARET_FG, (0, 0, 0)));
    spans.push(Span::plain("\n"));

    spans.push(Span::plain("  ·   "));
    spans.push(Span::plain(pad));
    spans.push(Span::styled(info.kind_message.clone(), MESSAGE_FG, (0, 0, 0)));
    spans.push(Span::plain("\n"));

    let tail: String = (0..info.kind_message.len())
        .map(|i| if i % 2 == 0 { '─' } else { '·' })
        .collect();
    spans.push(Span::plain(format!("  ╰─ {tail}\n")));

    spans
}

/// Turns `spans` into an ANSI-escaped string. When `no_color` is set (the
/// `NO_COLOR` convention — `spec.md` §6), SGR escapes are omitted entirely.
#[must_use]
pub fn render_to_string(spans: &[Span], no_color: bool) -> String {
    let mut out = String::new();
    for span in spans {
        if no_color {
            out.push_str(&span.text);
            continue;
        }
        match (span.fg, span.bg) {
            (None, None) => out.push_str(&span.text),
            (fg, bg) => {
                if let Some((r, g, b)) = fg {
                    out.push_str(&crate::ansi::fg_rgb(r, g, b));
                }
                if let Some((r, g, b)) = bg {
                    out.push_str(&crate::ansi::bg_rgb(r, g, b));
                }
                out.push_str(&span.text);
                out.push_str(crate::ansi::sgr_reset());
            }
        }
    }
    out
}

/// Whether `NO_COLOR` (any non-empty value) is set in the environment.
#[must_use]
pub fn no_color_requested() -> bool {
    std::env::var_os("NO_COLOR").is_some_and(|v| !v.is_empty())
}
