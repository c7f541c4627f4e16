//! Text-level fixes for comma spacing diagnostics.
//!
//! Fixes re-tokenize the source they are given, so a diagnostic can be fixed
//! against the text it was reported on without keeping the token stream
//! around.

use thiserror::Error;

use crate::cancel::{CancellationToken, Cancelled};
use crate::cop::spacing::comma_spacing::{
    CommaOffense, CommaViolation, edit_for, evaluate, missing_space_after, precedes_with_space,
};
use crate::cop::spacing::list_context::CommaContexts;
use crate::correction::{CorrectionSet, OverlappingCorrections};
use crate::diagnostic::{Diagnostic, Location};
use crate::parse::lexer::{LexError, tokenize};
use crate::parse::token::TokenKind;

#[derive(Debug, Error)]
pub enum FixError {
    #[error(transparent)]
    Lex(#[from] LexError),
    #[error("no comma at {line}:{column}")]
    NoCommaAt { line: usize, column: usize },
    #[error("not a comma spacing message: {0:?}")]
    UnknownMessage(String),
    #[error(transparent)]
    Overlap(#[from] OverlappingCorrections),
    #[error(transparent)]
    Cancelled(#[from] Cancelled),
}

/// Apply the fix for a single diagnostic and return the edited text.
///
/// Fixing a diagnostic whose offense is already gone leaves the text as it
/// is, so applying the same fix twice is harmless.
pub fn apply_fix(source: &str, diagnostic: &Diagnostic) -> Result<String, FixError> {
    let violation = CommaViolation::from_message(&diagnostic.message)
        .ok_or_else(|| FixError::UnknownMessage(diagnostic.message.clone()))?;
    let stream = tokenize(source)?;
    let Location { line, column } = diagnostic.location;
    let comma = stream
        .token_at(line, column)
        .filter(|&i| stream.tokens()[i].is(TokenKind::Comma))
        .ok_or(FixError::NoCommaAt { line, column })?;

    let context = CommaContexts::compute(&stream).get(comma);
    let still_applies = match violation {
        CommaViolation::PrecededBySpace => precedes_with_space(&stream, comma, context),
        CommaViolation::MissingSpaceAfter => missing_space_after(&stream, comma, context),
    };
    if !still_applies {
        return Ok(source.to_string());
    }

    let edit = edit_for(&stream, &CommaOffense { comma, violation });
    let set = CorrectionSet::from_vec(vec![edit])?;
    Ok(into_string(set.apply(source.as_bytes())))
}

/// Fix every comma spacing offense in one rewrite pass.
pub fn apply_all_fixes(source: &str, cancel: &CancellationToken) -> Result<String, FixError> {
    let stream = tokenize(source)?;
    let contexts = CommaContexts::compute(&stream);
    let edits = evaluate(&stream, &contexts, cancel)?
        .iter()
        .map(|offense| edit_for(&stream, offense))
        .collect();
    let set = CorrectionSet::from_vec(edits)?;
    Ok(into_string(set.apply(source.as_bytes())))
}

// Edits only remove or add ASCII spaces and tabs at token boundaries, so valid
// UTF-8 in means valid UTF-8 out.
fn into_string(bytes: Vec<u8>) -> String {
    String::from_utf8(bytes).unwrap_or_else(|e| String::from_utf8_lossy(e.as_bytes()).into_owned())
}
