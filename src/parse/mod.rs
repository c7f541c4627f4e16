pub mod lexer;
pub mod source;
pub mod token;

use lexer::LexError;
use token::TokenStream;

/// Tokenize document text into the token stream the cops consume.
///
/// The stream is immutable and owned by the caller for the lifetime of one
/// analysis pass; re-tokenize after rewriting the text.
pub fn parse_source(source: &str) -> Result<TokenStream, LexError> {
    lexer::tokenize(source)
}
