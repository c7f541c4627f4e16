//! Classification of the bracketed list a comma separates.
//!
//! Bracket regions are matched once per token stream and stored as
//! `(open, close)` token indices. The only context that changes the comma
//! rules is an angle-bracket list holding nothing but commas, i.e. an open
//! generic type such as `Func<,>` or `Dictionary<,>`.

use crate::parse::token::{TokenKind, TokenStream};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListContext {
    #[default]
    Ordinary,
    /// `<,>`: type arguments omitted, commas only.
    OmittedTypeArgumentList,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BracketKind {
    Paren,
    Square,
    Curly,
    Angle,
}

/// A matched delimiter pair, addressed by token index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BracketRegion {
    pub open: usize,
    pub close: usize,
    pub kind: BracketKind,
}

/// Match every bracket pair in the stream. Returned regions are sorted by
/// opening index and properly nested.
///
/// Parentheses, square brackets and braces are matched with a stack; an
/// unbalanced closer is ignored. `<` only opens a region when it starts a
/// type argument list (see [`type_argument_list_end`]); otherwise it is a
/// comparison operator and opens nothing.
pub fn find_regions(stream: &TokenStream) -> Vec<BracketRegion> {
    let tokens = stream.tokens();
    let mut regions = Vec::new();
    let mut stack: Vec<(usize, BracketKind)> = Vec::new();

    for (i, token) in tokens.iter().enumerate() {
        let closing = match token.kind {
            TokenKind::OpenParen => {
                stack.push((i, BracketKind::Paren));
                continue;
            }
            TokenKind::OpenBracket => {
                stack.push((i, BracketKind::Square));
                continue;
            }
            TokenKind::OpenBrace => {
                stack.push((i, BracketKind::Curly));
                continue;
            }
            TokenKind::LessThan => {
                if let Some(close) = type_argument_list_end(stream, i) {
                    regions.push(BracketRegion {
                        open: i,
                        close,
                        kind: BracketKind::Angle,
                    });
                }
                continue;
            }
            TokenKind::CloseParen => BracketKind::Paren,
            TokenKind::CloseBracket => BracketKind::Square,
            TokenKind::CloseBrace => BracketKind::Curly,
            _ => continue,
        };
        if let Some(pos) = stack.iter().rposition(|&(_, kind)| kind == closing) {
            // Openers left above the match were never closed; drop them.
            let (open, kind) = stack[pos];
            stack.truncate(pos);
            regions.push(BracketRegion {
                open,
                close: i,
                kind,
            });
        }
    }

    regions.sort_by_key(|r| r.open);
    regions
}

/// If the `<` at `open` starts a type argument list, return the index of its
/// matching `>`.
///
/// The `<` must directly follow an identifier and everything up to the
/// matching `>` must be type-shaped: identifiers, `.`, `,`, `?`, `:` (for
/// `global::`), `*`, nested angle lists and balanced square brackets.
pub fn type_argument_list_end(stream: &TokenStream, open: usize) -> Option<usize> {
    let tokens = stream.tokens();
    if open == 0 || tokens[open - 1].kind != TokenKind::Identifier {
        return None;
    }

    let mut angle_depth = 1usize;
    let mut square_depth = 0usize;
    for (i, token) in tokens.iter().enumerate().skip(open + 1) {
        match token.kind {
            TokenKind::LessThan => angle_depth += 1,
            TokenKind::GreaterThan => {
                if square_depth != 0 {
                    return None;
                }
                angle_depth -= 1;
                if angle_depth == 0 {
                    return Some(i);
                }
            }
            TokenKind::OpenBracket => square_depth += 1,
            TokenKind::CloseBracket => square_depth = square_depth.checked_sub(1)?,
            TokenKind::Identifier
            | TokenKind::Dot
            | TokenKind::Comma
            | TokenKind::Question
            | TokenKind::Colon
            | TokenKind::Star => {}
            _ => return None,
        }
    }
    None
}

/// Classify one region. Only an angle region whose interior is all commas is
/// an omitted type argument list; every other shape, including mixed lists
/// like `<int,>`, is treated as ordinary so the stricter rules apply.
pub fn classify(stream: &TokenStream, region: &BracketRegion) -> ListContext {
    if region.kind != BracketKind::Angle {
        return ListContext::Ordinary;
    }
    let inner = &stream.tokens()[region.open + 1..region.close];
    if !inner.is_empty() && inner.iter().all(|t| t.kind == TokenKind::Comma) {
        ListContext::OmittedTypeArgumentList
    } else {
        ListContext::Ordinary
    }
}

/// Per-token list context, computed once ahead of the spacing checks.
#[derive(Debug, Clone)]
pub struct CommaContexts {
    contexts: Vec<ListContext>,
}

impl CommaContexts {
    /// Each token gets the context of its innermost enclosing region.
    pub fn compute(stream: &TokenStream) -> Self {
        let mut contexts = vec![ListContext::Ordinary; stream.len()];
        // Regions are nested and sorted by their opener, so a later region
        // covering the same token is always the more deeply nested one.
        for region in find_regions(stream) {
            let context = classify(stream, &region);
            for slot in &mut contexts[region.open + 1..region.close] {
                *slot = context;
            }
        }
        Self { contexts }
    }

    pub fn get(&self, index: usize) -> ListContext {
        self.contexts.get(index).copied().unwrap_or_default()
    }
}
