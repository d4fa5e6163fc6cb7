// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! The recursive descent tokenizer and the arena it builds into.
//!
//! `parse()` is total: it never fails, producing a structurally valid tree
//! even for malformed input (`spec.md` §4.7). Validation is a separate pass
//! (see [`crate::validator`]).

use super::token::{GroupIdx, OperatorType, Token, TokenGroup, TokenKind};

/// Bytes that end a generic word/parameter/argument run even when not
/// whitespace. Mirrors `spec.md` §4.7 step 2's structural-byte list, plus
/// `}`, `*`, and `,` so [`OperatorType::Wildcard`]/[`OperatorType::Comma`]
/// and stray close-brackets tokenize on their own.
const STRUCTURAL: &str = "-{}\"!|&;:*,";

/// An arena of [`TokenGroup`]s. Every group is stored once and addressed by
/// index; `Token::SubContent` holds a [`GroupIdx`] rather than an owned
/// pointer, so walking parent links (see [`crate::diagnostics::compute_real_index`])
/// never aliases.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseTree {
    pub groups: Vec<TokenGroup>,
    pub root: GroupIdx,
}

impl ParseTree {
    #[must_use]
    pub fn group(&self, idx: GroupIdx) -> &TokenGroup { &self.groups[idx] }

    /// Length, in bytes, of the span `token` occupies in its enclosing
    /// group's `raw`: the token's own text, or its child group's `raw.len()`
    /// for `SubContent`.
    #[must_use]
    pub fn token_len(&self, token: &Token) -> usize {
        match &token.kind {
            TokenKind::SubContent(child) => self.groups[*child].raw.len(),
            _ => token.own_len(),
        }
    }
}

/// Parses `text` into a [`ParseTree`] rooted at a group with the given
/// `source` label. Never fails — malformed input simply produces tokens a
/// validator will later reject.
#[must_use]
pub fn parse(source: Option<String>, text: &str) -> ParseTree {
    let mut groups = Vec::new();
    let root = parse_group(&mut groups, None, text.to_string(), source);
    ParseTree { groups, root }
}

fn next_char(s: &str, i: usize) -> char { s[i..].chars().next().expect("i < s.len()") }

fn skip_ws(s: &str, mut i: usize) -> usize {
    while i < s.len() && next_char(s, i).is_whitespace() {
        i += next_char(s, i).len_utf8();
    }
    i
}

fn parse_group(
    groups: &mut Vec<TokenGroup>,
    parent: Option<GroupIdx>,
    raw: String,
    source: Option<String>,
) -> GroupIdx {
    let self_idx = groups.len();
    groups.push(TokenGroup::new(raw.clone(), source, parent));

    let tokens = tokenize(&raw, groups, self_idx);
    groups[self_idx].tokens = tokens;
    self_idx
}

fn tokenize(raw: &str, groups: &mut Vec<TokenGroup>, self_idx: GroupIdx) -> Vec<Token> {
    let len = raw.len();
    let mut tokens = Vec::new();
    let mut i = skip_ws(raw, 0);

    if i >= len {
        return tokens;
    }

    // Step 1: first whitespace-separated word is the Command, at index 0
    // within the group's own coordinate space. `index` is measured from the
    // start of the (post-whitespace-skip) raw the group actually parses, so
    // a Command token's index is the offset of its first byte.
    let cmd_start = i;
    while i < len && !next_char(raw, i).is_whitespace() {
        i += next_char(raw, i).len_utf8();
    }
    tokens.push(Token::new(TokenKind::Command(raw[cmd_start..i].to_string()), cmd_start));

    // Step 2: optional bare Argument immediately following the command, when
    // the next word doesn't begin a recognized token structure.
    i = skip_ws(raw, i);
    if i < len {
        let c = next_char(raw, i);
        if !STRUCTURAL.contains(c) {
            let start = i;
            while i < len {
                let c2 = next_char(raw, i);
                if c2.is_whitespace() || STRUCTURAL.contains(c2) {
                    break;
                }
                i += c2.len_utf8();
            }
            tokens.push(Token::new(TokenKind::Argument(raw[start..i].to_string()), start));
        }
    }

    // Step 3: main loop.
    while i < len {
        let c = next_char(raw, i);

        if c.is_whitespace() {
            i += c.len_utf8();
            continue;
        }

        match c {
            '"' => {
                let (consumed, new_tokens) = parse_string(raw, i);
                tokens.extend(new_tokens);
                i = consumed;
            }
            '{' => {
                let (consumed, new_tokens) = parse_substitution(raw, i, groups, self_idx);
                tokens.extend(new_tokens);
                i = consumed;
            }
            '}' => {
                tokens.push(Token::new(TokenKind::SubBracket("}".to_string()), i));
                i += 1;
            }
            '-' => {
                let (consumed, new_tokens) = parse_flags(raw, i);
                tokens.extend(new_tokens);
                i = consumed;
            }
            '!' => {
                tokens.push(Token::new(
                    TokenKind::Operator(OperatorType::LogicalNot, "!".to_string()),
                    i,
                ));
                i += 1;
            }
            '|' => {
                if raw[i..].starts_with("||") {
                    tokens.push(Token::new(
                        TokenKind::Operator(OperatorType::LogicalOr, "||".to_string()),
                        i,
                    ));
                    i += 2;
                } else {
                    tokens.push(Token::new(
                        TokenKind::Operator(OperatorType::Pipe, "|".to_string()),
                        i,
                    ));
                    i += 1;
                }
            }
            '&' => {
                if raw[i..].starts_with("&&") {
                    tokens.push(Token::new(
                        TokenKind::Operator(OperatorType::LogicalAnd, "&&".to_string()),
                        i,
                    ));
                    i += 2;
                } else {
                    tokens
                        .push(Token::new(TokenKind::Operator(OperatorType::None, "&".to_string()), i));
                    i += 1;
                }
            }
            ';' => {
                if raw[i..].starts_with(";;") {
                    tokens.push(Token::new(
                        TokenKind::Operator(OperatorType::MultiSeparator, ";;".to_string()),
                        i,
                    ));
                    i += 2;
                } else {
                    tokens.push(Token::new(
                        TokenKind::Operator(OperatorType::SequenceSeparator, ";".to_string()),
                        i,
                    ));
                    i += 1;
                }
            }
            ':' => {
                tokens.push(Token::new(
                    TokenKind::Operator(OperatorType::SubstituteRef, ":".to_string()),
                    i,
                ));
                i += 1;
            }
            '*' => {
                tokens.push(Token::new(
                    TokenKind::Operator(OperatorType::Wildcard, "*".to_string()),
                    i,
                ));
                i += 1;
            }
            ',' => {
                tokens.push(Token::new(
                    TokenKind::Operator(OperatorType::Comma, ",".to_string()),
                    i,
                ));
                i += 1;
            }
            _ => {
                let start = i;
                while i < len {
                    let c2 = next_char(raw, i);
                    if c2.is_whitespace() || STRUCTURAL.contains(c2) {
                        break;
                    }
                    i += c2.len_utf8();
                }
                if i == start {
                    // Defensive: never spin on an unrecognized structural byte.
                    tokens.push(Token::new(
                        TokenKind::Unknown(c.to_string()),
                        start,
                    ));
                    i += c.len_utf8();
                } else {
                    tokens.push(Token::new(TokenKind::Parameter(raw[start..i].to_string()), start));
                }
            }
        }
    }

    tokens
}

/// Parses a `"…"` string starting at `start` (the opening quote). Returns the
/// new cursor position and the tokens produced.
fn parse_string(raw: &str, start: usize) -> (usize, Vec<Token>) {
    let mut out = vec![Token::new(TokenKind::StringQuote("\"".to_string()), start)];
    let content_start = start + 1;

    if let Some(rel_close) = raw[content_start..].find('"') {
        let close = content_start + rel_close;
        out.push(Token::new(
            TokenKind::StringContent(raw[content_start..close].to_string()),
            content_start,
        ));
        out.push(Token::new(TokenKind::StringQuote("\"".to_string()), close));
        (close + 1, out)
    } else {
        out.push(Token::new(
            TokenKind::StringContent(raw[content_start..].to_string()),
            content_start,
        ));
        (raw.len(), out)
    }
}

/// Parses a `{ … }` substitution starting at `start` (the opening brace).
fn parse_substitution(
    raw: &str,
    start: usize,
    groups: &mut Vec<TokenGroup>,
    parent: GroupIdx,
) -> (usize, Vec<Token>) {
    let mut out = vec![Token::new(TokenKind::SubBracket("{".to_string()), start)];
    let content_start = start + 1;

    let mut depth = 1i32;
    let mut in_quotes = false;
    let mut j = content_start;
    let mut close_idx = None;

    while j < raw.len() {
        let c = next_char(raw, j);
        if c == '"' {
            in_quotes = !in_quotes;
        } else if !in_quotes {
            if c == '{' {
                depth += 1;
            } else if c == '}' {
                depth -= 1;
                if depth == 0 {
                    close_idx = Some(j);
                    break;
                }
            }
        }
        j += c.len_utf8();
    }

    match close_idx {
        Some(close) => {
            let raw_interior = &raw[content_start..close];
            let interior = raw_interior.trim().to_string();
            let leading_trimmed = raw_interior.len() - raw_interior.trim_start().len();
            let child = parse_group(groups, Some(parent), interior, None);
            out.push(Token::new(TokenKind::SubContent(child), content_start + leading_trimmed));
            out.push(Token::new(TokenKind::SubBracket("}".to_string()), close));
            (close + 1, out)
        }
        None => {
            let raw_interior = &raw[content_start..];
            let interior = raw_interior.trim().to_string();
            let leading_trimmed = raw_interior.len() - raw_interior.trim_start().len();
            let child = parse_group(groups, Some(parent), interior, None);
            out.push(Token::new(TokenKind::SubContent(child), content_start + leading_trimmed));
            (raw.len(), out)
        }
    }
}

/// Parses flags starting at `start` (a `-`): a long flag (`--name[=value]`)
/// or a short cluster (`-abc[=value]`).
fn parse_flags(raw: &str, start: usize) -> (usize, Vec<Token>) {
    let len = raw.len();
    let is_long = raw[start..].starts_with("--");
    let body_start = if is_long { start + 2 } else { start + 1 };

    let mut i = body_start;
    while i < len {
        let c = next_char(raw, i);
        if c.is_whitespace() || c == '=' || STRUCTURAL.contains(c) {
            break;
        }
        i += c.len_utf8();
    }
    let name_end = i;

    let mut out = Vec::new();

    if is_long {
        out.push(Token::new(TokenKind::Flag(format!("--{}", &raw[body_start..name_end])), start));
    } else {
        for ch in raw[body_start..name_end].chars() {
            out.push(Token::new(TokenKind::Flag(format!("-{ch}")), start));
        }
    }

    if i < len && next_char(raw, i) == '=' {
        let value_start = i + 1;
        let mut j = value_start;
        while j < len {
            let c2 = next_char(raw, j);
            if c2.is_whitespace() || STRUCTURAL.contains(c2) {
                break;
            }
            j += c2.len_utf8();
        }
        out.push(Token::new(TokenKind::Parameter(raw[value_start..j].to_string()), value_start));
        i = j;
    }

    (i, out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn root_tokens(tree: &ParseTree) -> &[Token] { &tree.group(tree.root).tokens }

    #[test]
    fn test_invariant_root_raw_equals_input() {
        let tree = parse(None, "echo hello");
        assert_eq!(tree.group(tree.root).raw, "echo hello");
    }

    #[test]
    fn test_invariant_token_span_matches_data() {
        let tree = parse(None, "echo hello");
        for token in root_tokens(&tree) {
            if let Some(text) = token.kind.as_str() {
                let span = &tree.group(tree.root).raw[token.index..token.index + text.len()];
                assert_eq!(span, text);
            }
        }
    }

    #[test]
    fn test_invariant_subcontent_parent_link() {
        let tree = parse(None, "echo {cat /etc/hostname}");
        for token in root_tokens(&tree) {
            if let TokenKind::SubContent(child) = token.kind {
                assert_eq!(tree.group(child).parent, Some(tree.root));
            }
        }
    }

    #[test]
    fn test_scenario_1_echo_hello() {
        let tree = parse(None, "echo hello");
        let tokens = root_tokens(&tree);
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].kind, TokenKind::Command("echo".to_string()));
        assert_eq!(tokens[0].index, 0);
        assert_eq!(tokens[1].kind, TokenKind::Argument("hello".to_string()));
        assert_eq!(tokens[1].index, 5);
    }

    #[test]
    fn test_scenario_2_flag_clustering() {
        let tree = parse(None, "ls --color=auto -la");
        let tokens = root_tokens(&tree);
        assert_eq!(tokens[0].kind, TokenKind::Command("ls".to_string()));
        assert_eq!(tokens[1].kind, TokenKind::Flag("--color".to_string()));
        assert_eq!(tokens[1].index, 3);
        assert_eq!(tokens[2].kind, TokenKind::Parameter("auto".to_string()));
        assert_eq!(tokens[2].index, 11);
        assert_eq!(tokens[3].kind, TokenKind::Flag("-l".to_string()));
        assert_eq!(tokens[3].index, 16);
        assert_eq!(tokens[4].kind, TokenKind::Flag("-a".to_string()));
        assert_eq!(tokens[4].index, 16);
    }

    #[test]
    fn test_scenario_3_substitution() {
        let tree = parse(None, "echo {cat /etc/hostname}");
        let tokens = root_tokens(&tree);
        assert_eq!(tokens[0].kind, TokenKind::Command("echo".to_string()));
        assert_eq!(tokens[1].kind, TokenKind::SubBracket("{".to_string()));
        assert_eq!(tokens[1].index, 5);
        let TokenKind::SubContent(child) = tokens[2].kind else { panic!("expected SubContent") };
        assert!(matches!(tokens[3].kind, TokenKind::SubBracket(ref s) if s == "}"));

        let inner = &tree.group(child).tokens;
        assert_eq!(inner[0].kind, TokenKind::Command("cat".to_string()));
        assert_eq!(inner[1].kind, TokenKind::Parameter("/etc/hostname".to_string()));
    }

    #[test]
    fn test_substitution_leading_whitespace_shifts_subcontent_index() {
        let tree = parse(None, "echo {   nonexistentcmd}");
        let tokens = root_tokens(&tree);
        let TokenKind::SubContent(child) = tokens[2].kind else { panic!("expected SubContent") };
        // content_start is 6 (just after '{'); 3 leading spaces are trimmed.
        assert_eq!(tokens[2].index, 9);

        let inner = &tree.group(child).tokens;
        assert_eq!(inner[0].kind, TokenKind::Command("nonexistentcmd".to_string()));
    }

    #[test]
    fn test_scenario_4_quoted_string() {
        let tree = parse(None, "echo \"hi there\"");
        let tokens = root_tokens(&tree);
        assert_eq!(tokens[0].kind, TokenKind::Command("echo".to_string()));
        assert_eq!(tokens[1].kind, TokenKind::StringQuote("\"".to_string()));
        assert_eq!(tokens[1].index, 5);
        assert_eq!(tokens[2].kind, TokenKind::StringContent("hi there".to_string()));
        assert_eq!(tokens[2].index, 6);
        assert_eq!(tokens[3].kind, TokenKind::StringQuote("\"".to_string()));
        assert_eq!(tokens[3].index, 14);
    }

    #[test]
    fn test_scenario_5_unmatched_open_bracket() {
        let tree = parse(None, "echo {oops");
        let tokens = root_tokens(&tree);
        assert_eq!(tokens[1].kind, TokenKind::SubBracket("{".to_string()));
        assert_eq!(tokens[1].index, 5);
        assert!(!tokens.iter().any(|t| t.kind == TokenKind::SubBracket("}".to_string())));
    }

    #[test]
    fn test_scenario_6_unterminated_quote_is_empty() {
        let tree = parse(None, "echo \"");
        let tokens = root_tokens(&tree);
        assert_eq!(tokens[1].kind, TokenKind::StringQuote("\"".to_string()));
        assert_eq!(tokens[1].index, 5);
        assert_eq!(tokens[2].kind, TokenKind::StringContent(String::new()));
        assert!(!tokens.iter().any(|t| matches!(&t.kind, TokenKind::StringQuote(_)) && t.index != 5));
    }

    #[test]
    fn test_operators_longest_match() {
        let tree = parse(None, "a && b || c");
        let tokens = root_tokens(&tree);
        let ops: Vec<_> = tokens
            .iter()
            .filter_map(|t| t.kind.operator_type())
            .collect();
        assert_eq!(ops, vec![OperatorType::LogicalAnd, OperatorType::LogicalOr]);
    }

    #[test]
    fn test_sequence_separators() {
        let tree = parse(None, "a ; b ;; c");
        let tokens = root_tokens(&tree);
        let ops: Vec<_> = tokens.iter().filter_map(|t| t.kind.operator_type()).collect();
        assert_eq!(ops, vec![OperatorType::SequenceSeparator, OperatorType::MultiSeparator]);
    }

    #[test]
    fn test_nested_substitution_with_quotes_ignores_inner_braces() {
        let tree = parse(None, r#"echo {echo "}"}"#);
        let tokens = root_tokens(&tree);
        let TokenKind::SubContent(child) = tokens[2].kind else { panic!("expected SubContent") };
        let inner = &tree.group(child).tokens;
        assert_eq!(inner[0].kind, TokenKind::Command("echo".to_string()));
        assert!(inner.iter().any(|t| matches!(&t.kind, TokenKind::StringContent(s) if s == "}")));
    }

    #[test]
    fn test_empty_input_produces_no_tokens() {
        let tree = parse(None, "");
        assert!(root_tokens(&tree).is_empty());
    }

    #[test]
    fn test_source_label_preserved_on_root_only() {
        let tree = parse(Some("stdin".to_string()), "echo {hi}");
        assert_eq!(tree.group(tree.root).source, Some("stdin".to_string()));
        let TokenKind::SubContent(child) = root_tokens(&tree)[2].kind else { panic!() };
        assert_eq!(tree.group(child).source, None);
    }
}
