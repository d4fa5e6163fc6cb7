// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! JSON serialization of a parsed tree (`spec.md` §4.11), used both for
//! normal `--command`/tty output and as the shape test fixtures assert
//! against.

use serde::{Serialize, Serializer};

use super::token::{Token, TokenGroup, TokenKind};
use super::tree::ParseTree;

/// A `(group, tree)` pair implements [`Serialize`] by walking the arena,
/// since [`TokenGroup`] alone can't resolve `SubContent` without the tree
/// it lives in.
struct GroupView<'a> {
    group: &'a TokenGroup,
    tree: &'a ParseTree,
}

struct TokenView<'a> {
    token: &'a Token,
    tree: &'a ParseTree,
}

impl Serialize for GroupView<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;
        let mut state = serializer.serialize_struct("TokenGroup", 2)?;
        state.serialize_field("raw", &self.group.raw)?;
        let tokens: Vec<TokenView<'_>> =
            self.group.tokens.iter().map(|t| TokenView { token: t, tree: self.tree }).collect();
        state.serialize_field("tokens", &tokens)?;
        state.end()
    }
}

impl Serialize for TokenView<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;
        let mut state = serializer.serialize_struct("Token", 3)?;
        state.serialize_field("type", self.token.kind.type_name())?;
        state.serialize_field("index", &self.token.index)?;
        match &self.token.kind {
            TokenKind::SubContent(child) => {
                let view = GroupView { group: self.tree.group(*child), tree: self.tree };
                state.serialize_field("data", &view)?;
            }
            _ => {
                state.serialize_field("data", &self.token.kind.as_str().unwrap_or(""))?;
            }
        }
        state.end()
    }
}

/// Serializes the tree's root group to the `{ "raw", "tokens" }` shape
/// described in `spec.md` §4.11.
///
/// # Errors
///
/// Returns a `serde_json::Error` if serialization fails (it cannot, in
/// practice, for this shape, but the signature matches `serde_json`'s
/// fallible API).
pub fn to_json(tree: &ParseTree) -> serde_json::Result<String> {
    let view = GroupView { group: tree.group(tree.root), tree };
    serde_json::to_string(&view)
}

/// Pretty-printed variant of [`to_json`], used for `--command` output.
///
/// # Errors
///
/// See [`to_json`].
pub fn to_json_pretty(tree: &ParseTree) -> serde_json::Result<String> {
    let view = GroupView { group: tree.group(tree.root), tree };
    serde_json::to_string_pretty(&view)
}
