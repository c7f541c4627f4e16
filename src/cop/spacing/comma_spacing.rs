//! Commas must be followed by a space and must not be preceded by one.
//!
//! Exceptions:
//! - a comma that starts its line may be indented, including when the
//!   previous line ends in a `//` comment;
//! - a comma that ends its line needs nothing after it;
//! - commas inside an omitted type argument list (`Func<,>`, `Func<,,>`)
//!   need no space after them. A space *before* them is still an offense;
//! - elsewhere, the space between two adjacent commas (`a, ,b`) is the first
//!   comma's following space and is not reported against the second.
//!
//! Block comments get no special treatment: a comma after `/* x */` is not
//! first on its line even when the comment is.

use crate::cancel::{CancellationToken, Cancelled};
use crate::cop::{Cop, CopConfig};
use crate::correction::Correction;
use crate::diagnostic::{Diagnostic, Severity};
use crate::parse::source::SourceFile;
use crate::parse::token::{TokenKind, TokenStream, Trivia};

use super::list_context::{CommaContexts, ListContext};

pub const COP_NAME: &str = "CommaSpacing";

const PRECEDED_BY_SPACE_MSG: &str = "Commas must not be preceded by a space.";
const MISSING_SPACE_AFTER_MSG: &str = "Commas must be followed by a space.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommaViolation {
    PrecededBySpace,
    MissingSpaceAfter,
}

impl CommaViolation {
    pub fn message(self) -> &'static str {
        match self {
            CommaViolation::PrecededBySpace => PRECEDED_BY_SPACE_MSG,
            CommaViolation::MissingSpaceAfter => MISSING_SPACE_AFTER_MSG,
        }
    }

    pub fn from_message(message: &str) -> Option<Self> {
        match message {
            PRECEDED_BY_SPACE_MSG => Some(CommaViolation::PrecededBySpace),
            MISSING_SPACE_AFTER_MSG => Some(CommaViolation::MissingSpaceAfter),
            _ => None,
        }
    }
}

/// One failed check on the comma at token index `comma`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommaOffense {
    pub comma: usize,
    pub violation: CommaViolation,
}

/// Only indentation precedes the token on its physical line. A block comment
/// between the line start and the token does not count as indentation.
fn is_first_on_line(stream: &TokenStream, index: usize) -> bool {
    let starts_line = index == 0 || stream.trivia_before(index).any(Trivia::is_end_of_line);
    starts_line
        && stream
            .trivia_before(index)
            .rev()
            .take_while(|t| !t.is_end_of_line())
            .all(Trivia::is_whitespace)
}

/// Nothing but trivia follows the token before its line ends.
fn is_last_on_line(stream: &TokenStream, index: usize) -> bool {
    stream
        .get(index + 1)
        .is_none_or(|next| next.kind == TokenKind::EndOfFile)
        || stream.trivia_after(index).any(Trivia::is_end_of_line)
}

/// Whitespace sits directly before a comma that does not start its line.
pub fn precedes_with_space(stream: &TokenStream, comma: usize, context: ListContext) -> bool {
    if is_first_on_line(stream, comma) {
        return false;
    }
    if context == ListContext::Ordinary && stream.tokens()[comma - 1].is(TokenKind::Comma) {
        return false;
    }
    stream
        .trivia_before(comma)
        .next_back()
        .is_some_and(Trivia::is_whitespace)
}

/// The next token shares the comma's line but is not separated from it by
/// whitespace. Never true inside an omitted type argument list.
pub fn missing_space_after(stream: &TokenStream, comma: usize, context: ListContext) -> bool {
    if context == ListContext::OmittedTypeArgumentList || is_last_on_line(stream, comma) {
        return false;
    }
    !stream
        .trivia_after(comma)
        .next()
        .is_some_and(Trivia::is_whitespace)
}

/// Run both checks on every comma in document order.
///
/// Checks `cancel` before each comma; a cancelled pass yields no offenses.
pub fn evaluate(
    stream: &TokenStream,
    contexts: &CommaContexts,
    cancel: &CancellationToken,
) -> Result<Vec<CommaOffense>, Cancelled> {
    let mut offenses = Vec::new();
    for comma in stream.comma_indices() {
        cancel.check()?;
        let context = contexts.get(comma);
        if precedes_with_space(stream, comma, context) {
            offenses.push(CommaOffense {
                comma,
                violation: CommaViolation::PrecededBySpace,
            });
        }
        if missing_space_after(stream, comma, context) {
            offenses.push(CommaOffense {
                comma,
                violation: CommaViolation::MissingSpaceAfter,
            });
        }
    }
    Ok(offenses)
}

/// The minimal edit resolving one offense.
///
/// A leading-space offense deletes the whitespace run directly before the
/// comma; comments and line breaks earlier on the line are kept. A
/// trailing-space offense inserts one space right after the comma.
pub fn edit_for(stream: &TokenStream, offense: &CommaOffense) -> Correction {
    let comma = &stream.tokens()[offense.comma];
    match offense.violation {
        CommaViolation::PrecededBySpace => {
            let start = stream
                .trivia_before(offense.comma)
                .rev()
                .take_while(|t| t.is_whitespace())
                .last()
                .map_or(comma.span.start, |t| t.span.start);
            Correction::delete(start, comma.span.start, COP_NAME)
        }
        CommaViolation::MissingSpaceAfter => Correction::insert(comma.span.end, " ", COP_NAME),
    }
}

pub struct CommaSpacing;

impl Cop for CommaSpacing {
    fn name(&self) -> &'static str {
        COP_NAME
    }

    fn default_severity(&self) -> Severity {
        Severity::Warning
    }

    fn supports_autocorrect(&self) -> bool {
        true
    }

    fn check_tokens(
        &self,
        source: &SourceFile,
        tokens: &TokenStream,
        _config: &CopConfig,
        diagnostics: &mut Vec<Diagnostic>,
        mut corrections: Option<&mut Vec<Correction>>,
        cancel: &CancellationToken,
    ) -> Result<(), Cancelled> {
        let contexts = CommaContexts::compute(tokens);
        let offenses = evaluate(tokens, &contexts, cancel)?;

        for offense in &offenses {
            let comma = &tokens.tokens()[offense.comma];
            let (line, column) = source.offset_to_line_col(comma.span.start);
            let mut diag =
                self.diagnostic(source, line, column, offense.violation.message().to_string());
            if let Some(ref mut corr) = corrections {
                corr.push(edit_for(tokens, offense));
                diag.corrected = true;
            }
            diagnostics.push(diag);
        }
        Ok(())
    }
}
