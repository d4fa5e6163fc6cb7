// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Token and token-group types.
//!
//! Per `spec.md` §9 ("Design Notes"), the parse tree is an arena: every
//! [`TokenGroup`] lives once in [`super::tree::ParseTree::groups`] and is
//! addressed by a plain `usize` index (a [`GroupIdx`]). [`Token`] is a
//! tagged enum whose variants carry their own payload, so "a `SubContent`
//! token holds a string" is a compile error, not a runtime invariant to
//! remember — grounded on the general shape of `tui/src/core/graphemes/seg.rs`
//! (small, `Copy`-friendly index newtypes over an arena).

use serde::Serialize;

pub type GroupIdx = usize;

/// Refinement of a token when its [`TokenKind`] is [`TokenKind::Operator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OperatorType {
    Pipe,
    Comma,
    Wildcard,
    SubstituteRef,
    LogicalAnd,
    LogicalOr,
    LogicalNot,
    SequenceSeparator,
    MultiSeparator,
    None,
}

/// The tagged contents of a [`Token`]. The variant name doubles as the
/// `TokenType` tag from `spec.md` §3 (see [`TokenKind::type_name`]).
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Command(String),
    Argument(String),
    Flag(String),
    Parameter(String),
    Operator(OperatorType, String),
    Unknown(String),
    SubBracket(String),
    /// Only variant whose payload is a group reference rather than a string.
    SubContent(GroupIdx),
    StringQuote(String),
    StringContent(String),
}

impl TokenKind {
    /// The `spec.md` §3 `TokenType` tag, as a string, for JSON serialization
    /// and diagnostics.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Command(_) => "Command",
            Self::Argument(_) => "Argument",
            Self::Flag(_) => "Flag",
            Self::Parameter(_) => "Parameter",
            Self::Operator(..) => "Operator",
            Self::Unknown(_) => "Unknown",
            Self::SubBracket(_) => "SubBracket",
            Self::SubContent(_) => "SubContent",
            Self::StringQuote(_) => "StringQuote",
            Self::StringContent(_) => "StringContent",
        }
    }

    /// The token's own raw text, when it has one (every variant except
    /// [`TokenKind::SubContent`], whose text lives on the child group).
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Command(s)
            | Self::Argument(s)
            | Self::Flag(s)
            | Self::Parameter(s)
            | Self::Operator(_, s)
            | Self::Unknown(s)
            | Self::SubBracket(s)
            | Self::StringQuote(s)
            | Self::StringContent(s) => Some(s),
            Self::SubContent(_) => None,
        }
    }

    #[must_use]
    pub fn operator_type(&self) -> Option<OperatorType> {
        match self {
            Self::Operator(op, _) => Some(*op),
            _ => None,
        }
    }
}

/// A lexical unit produced by the parser. `index` is the byte offset, within
/// the *enclosing group's* `raw`, at which this token begins (`spec.md` §3).
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub index: usize,
}

impl Token {
    #[must_use]
    pub fn new(kind: TokenKind, index: usize) -> Self { Self { kind, index } }

    /// Length, in bytes, of this token's own text (0 for `SubContent`, whose
    /// length is its child group's `raw.len()` — see [`super::tree::ParseTree::token_len`]).
    #[must_use]
    pub fn own_len(&self) -> usize { self.kind.as_str().map_or(0, str::len) }
}

/// A node in the parse tree: the tokens parsed from a contiguous span of
/// text, plus that span itself.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenGroup {
    pub tokens: Vec<Token>,
    pub raw: String,
    /// Origin label (`"stdin"`, `"argv"`, or a file path). Only populated on
    /// the root group.
    pub source: Option<String>,
    /// `None` on the root; `Some(parent_idx)` on every nested group.
    pub parent: Option<GroupIdx>,
}

impl TokenGroup {
    #[must_use]
    pub fn new(raw: String, source: Option<String>, parent: Option<GroupIdx>) -> Self {
        Self { tokens: vec![], raw, source, parent }
    }
}
