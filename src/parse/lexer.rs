use thiserror::Error;

use super::token::{Span, Token, TokenKind, TokenStream, Trivia, TriviaKind};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LexError {
    #[error("unterminated string literal at {line}:{column}")]
    UnterminatedString { line: usize, column: usize },
    #[error("unterminated character literal at {line}:{column}")]
    UnterminatedCharacter { line: usize, column: usize },
    #[error("unterminated comment at {line}:{column}")]
    UnterminatedComment { line: usize, column: usize },
}

/// Tokenize C#-style source text into a token stream with attached trivia.
///
/// Trailing trivia of a token runs up to and including the first line break;
/// everything after that belongs to the next token's leading trivia.
///
/// Interpolated strings are split at their holes: the text around each hole
/// becomes a `StringLiteral` token and the hole's expression is lexed as
/// ordinary tokens. A format clause (`{x:#,##0}`) stays inside the string
/// text.
pub fn tokenize(source: &str) -> Result<TokenStream, LexError> {
    Lexer::new(source).run()
}

/// `\n`, `\r`, NEL, LINE SEPARATOR and PARAGRAPH SEPARATOR.
fn is_line_break(c: char) -> bool {
    matches!(c, '\n' | '\r' | '\u{85}' | '\u{2028}' | '\u{2029}')
}

fn is_horizontal_space(c: char) -> bool {
    !is_line_break(c) && c.is_whitespace()
}

fn is_identifier_start(c: char) -> bool {
    c == '_' || c.is_alphabetic()
}

fn is_identifier_part(c: char) -> bool {
    c == '_' || c.is_alphanumeric()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StringFlavor {
    /// `$"..."`: backslash escapes, single line.
    Regular,
    /// `$@"..."` or `@$"..."`: `""` escapes a quote, may span lines.
    Verbatim,
    /// `$"""..."""`: closed by a run of `quotes` double quotes.
    Raw { quotes: usize },
}

/// An interpolated string whose hole is being lexed as code.
#[derive(Debug, Clone, Copy)]
struct Interpolation {
    flavor: StringFlavor,
    /// Number of braces that open and close a hole (the `$` count for raw
    /// strings, otherwise 1).
    braces: usize,
    /// Bracket nesting inside the current hole.
    depth: usize,
    line: usize,
    column: usize,
}

impl Interpolation {
    fn unterminated(&self) -> LexError {
        LexError::UnterminatedString {
            line: self.line,
            column: self.column,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HoleEnd {
    Close,
    Format,
}

struct Lexer<'a> {
    src: &'a str,
    pos: usize,
    line: usize,
    column: usize,
    interpolations: Vec<Interpolation>,
}

impl<'a> Lexer<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            src,
            pos: 0,
            line: 1,
            column: 1,
            interpolations: Vec::new(),
        }
    }

    fn run(mut self) -> Result<TokenStream, LexError> {
        let mut tokens = Vec::new();
        loop {
            let leading = self.lex_trivia(false)?;
            let (line, column) = (self.line, self.column);
            let start = self.pos;
            let kind = match self.peek() {
                Some(c) => match self.hole_end(c) {
                    Some(end) => {
                        self.lex_hole_end(end)?;
                        TokenKind::StringLiteral
                    }
                    None => {
                        let kind = self.lex_token(c, line, column)?;
                        self.track_depth(kind);
                        kind
                    }
                },
                None => {
                    if let Some(open) = self.interpolations.last() {
                        return Err(open.unterminated());
                    }
                    TokenKind::EndOfFile
                }
            };
            let span = Span::new(start, self.pos);
            let trailing = if kind == TokenKind::EndOfFile {
                Vec::new()
            } else {
                self.lex_trivia(true)?
            };
            tokens.push(Token {
                kind,
                span,
                line,
                column,
                leading,
                trailing,
            });
            if kind == TokenKind::EndOfFile {
                break;
            }
        }
        Ok(TokenStream::new(tokens))
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn peek_nth(&self, n: usize) -> Option<char> {
        self.src[self.pos..].chars().nth(n)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        match c {
            // CRLF is counted when the LF is consumed.
            '\r' if self.peek() == Some('\n') => self.column += 1,
            c if is_line_break(c) => {
                self.line += 1;
                self.column = 1;
            }
            _ => self.column += 1,
        }
        Some(c)
    }

    fn eat_while(&mut self, pred: impl Fn(char) -> bool) {
        while self.peek().is_some_and(&pred) {
            self.bump();
        }
    }

    /// Consume a run of `c` and return its length.
    fn eat_run(&mut self, c: char) -> usize {
        let mut n = 0;
        while self.peek() == Some(c) {
            self.bump();
            n += 1;
        }
        n
    }

    fn count_run(&self, c: char) -> usize {
        self.src[self.pos..].chars().take_while(|&x| x == c).count()
    }

    /// Only horizontal whitespace precedes the current position on its line.
    fn at_line_start(&self) -> bool {
        self.src[..self.pos]
            .chars()
            .rev()
            .take_while(|&c| !is_line_break(c))
            .all(is_horizontal_space)
    }

    fn lex_trivia(&mut self, trailing: bool) -> Result<Vec<Trivia>, LexError> {
        let mut trivia = Vec::new();
        while let Some(c) = self.peek() {
            let start = self.pos;
            let kind = match c {
                c if is_line_break(c) => {
                    self.bump();
                    if c == '\r' && self.peek() == Some('\n') {
                        self.bump();
                    }
                    TriviaKind::EndOfLine
                }
                c if is_horizontal_space(c) => {
                    self.eat_while(is_horizontal_space);
                    TriviaKind::Whitespace
                }
                '/' if self.peek_nth(1) == Some('/') => {
                    self.eat_while(|c| !is_line_break(c));
                    TriviaKind::SingleLineComment
                }
                '/' if self.peek_nth(1) == Some('*') => {
                    self.lex_block_comment()?;
                    TriviaKind::MultiLineComment
                }
                '#' if self.interpolations.is_empty() && self.at_line_start() => {
                    self.eat_while(|c| !is_line_break(c));
                    TriviaKind::PreprocessorDirective
                }
                _ => break,
            };
            trivia.push(Trivia {
                kind,
                span: Span::new(start, self.pos),
            });
            if trailing && kind == TriviaKind::EndOfLine {
                break;
            }
        }
        Ok(trivia)
    }

    fn lex_block_comment(&mut self) -> Result<(), LexError> {
        let (line, column) = (self.line, self.column);
        self.bump();
        self.bump();
        loop {
            match self.bump() {
                None => return Err(LexError::UnterminatedComment { line, column }),
                Some('*') if self.peek() == Some('/') => {
                    self.bump();
                    return Ok(());
                }
                Some(_) => {}
            }
        }
    }

    fn lex_token(&mut self, c: char, line: usize, column: usize) -> Result<TokenKind, LexError> {
        let kind = match c {
            ',' => self.single(TokenKind::Comma),
            ';' => self.single(TokenKind::Semicolon),
            ':' => self.single(TokenKind::Colon),
            '?' => self.single(TokenKind::Question),
            '(' => self.single(TokenKind::OpenParen),
            ')' => self.single(TokenKind::CloseParen),
            '[' => self.single(TokenKind::OpenBracket),
            ']' => self.single(TokenKind::CloseBracket),
            '{' => self.single(TokenKind::OpenBrace),
            '}' => self.single(TokenKind::CloseBrace),
            '<' => self.single(TokenKind::LessThan),
            '>' => self.single(TokenKind::GreaterThan),
            '*' => self.single(TokenKind::Star),
            '.' if self.peek_nth(1).is_some_and(|n| n.is_ascii_digit()) => {
                self.bump();
                self.lex_number_tail();
                TokenKind::NumericLiteral
            }
            '.' => self.single(TokenKind::Dot),
            '"' => {
                let quotes = self.count_run('"');
                if quotes >= 3 {
                    self.lex_raw_string(line, column)?;
                } else {
                    self.lex_regular_string(line, column)?;
                }
                TokenKind::StringLiteral
            }
            '\'' => {
                self.lex_character(line, column)?;
                TokenKind::CharacterLiteral
            }
            '@' | '$' => self.lex_prefixed(c, line, column)?,
            c if c.is_ascii_digit() => {
                self.lex_number_tail();
                TokenKind::NumericLiteral
            }
            c if is_identifier_start(c) => {
                self.eat_while(is_identifier_part);
                TokenKind::Identifier
            }
            '+' | '-' | '/' | '%' | '&' | '|' | '^' | '!' | '~' | '=' | '#' => {
                self.single(TokenKind::Operator)
            }
            _ => self.single(TokenKind::Unknown),
        };
        Ok(kind)
    }

    fn single(&mut self, kind: TokenKind) -> TokenKind {
        self.bump();
        kind
    }

    fn lex_number_tail(&mut self) {
        self.eat_while(|c| c.is_ascii_alphanumeric() || c == '_');
        if self.peek() == Some('.') && self.peek_nth(1).is_some_and(|n| n.is_ascii_digit()) {
            self.bump();
            self.eat_while(|c| c.is_ascii_alphanumeric() || c == '_');
        }
    }

    /// `@ident`, `@"..."`, and interpolated strings: `$"..."`, `$@"..."`,
    /// `@$"..."`, `$"""..."""`, `$$"""..."""`.
    fn lex_prefixed(&mut self, c: char, line: usize, column: usize) -> Result<TokenKind, LexError> {
        let prefix = self.src[self.pos..]
            .chars()
            .take_while(|&p| p == '$' || p == '@')
            .count();
        let dollars = self.src[self.pos..]
            .chars()
            .take(prefix)
            .filter(|&p| p == '$')
            .count();
        let verbatim = prefix > dollars;

        if self.peek_nth(prefix) != Some('"') || prefix - dollars > 1 {
            return match (c, self.peek_nth(1)) {
                ('@', Some(n)) if is_identifier_start(n) => {
                    self.bump();
                    self.eat_while(is_identifier_part);
                    Ok(TokenKind::Identifier)
                }
                _ => Ok(self.single(TokenKind::Unknown)),
            };
        }

        if dollars == 0 {
            self.bump();
            self.lex_verbatim_string(line, column)?;
            return Ok(TokenKind::StringLiteral);
        }

        for _ in 0..prefix {
            self.bump();
        }
        let quotes = self.count_run('"');
        let (flavor, braces) = if verbatim {
            self.bump();
            (StringFlavor::Verbatim, 1)
        } else if quotes >= 3 {
            self.eat_run('"');
            (StringFlavor::Raw { quotes }, dollars)
        } else if quotes == 2 {
            // `$""`
            self.bump();
            self.bump();
            return Ok(TokenKind::StringLiteral);
        } else {
            self.bump();
            (StringFlavor::Regular, 1)
        };
        self.interpolations.push(Interpolation {
            flavor,
            braces,
            depth: 0,
            line,
            column,
        });
        self.lex_interpolated_text()?;
        Ok(TokenKind::StringLiteral)
    }

    /// Scan interpolated string text up to and including the next hole
    /// opener, or the closing quotes (which ends the interpolation).
    fn lex_interpolated_text(&mut self) -> Result<(), LexError> {
        let Some(interp) = self.interpolations.last().copied() else {
            return Ok(());
        };
        loop {
            match (interp.flavor, self.peek()) {
                (_, None) => return Err(interp.unterminated()),
                (StringFlavor::Regular, Some(c)) if is_line_break(c) => {
                    return Err(interp.unterminated());
                }
                (StringFlavor::Regular, Some('\\')) => {
                    self.bump();
                    if self.peek().is_none_or(is_line_break) {
                        return Err(interp.unterminated());
                    }
                    self.bump();
                }
                (StringFlavor::Verbatim, Some('"')) if self.peek_nth(1) == Some('"') => {
                    self.bump();
                    self.bump();
                }
                (StringFlavor::Regular | StringFlavor::Verbatim, Some('"')) => {
                    self.bump();
                    self.interpolations.pop();
                    return Ok(());
                }
                (StringFlavor::Raw { quotes }, Some('"')) => {
                    if self.eat_run('"') >= quotes {
                        self.interpolations.pop();
                        return Ok(());
                    }
                }
                (flavor, Some('{')) => {
                    let run = self.eat_run('{');
                    let opens = match flavor {
                        StringFlavor::Raw { .. } => run >= interp.braces,
                        // `{{` is an escaped brace.
                        _ => run % 2 == 1,
                    };
                    if opens {
                        return Ok(());
                    }
                }
                (_, Some(_)) => {
                    self.bump();
                }
            }
        }
    }

    /// Whether `c` ends the current hole, either by closing it or by starting
    /// its format clause.
    fn hole_end(&self, c: char) -> Option<HoleEnd> {
        let interp = self.interpolations.last()?;
        if interp.depth > 0 {
            return None;
        }
        match c {
            '}' => Some(HoleEnd::Close),
            // `::` is an alias qualifier, not a format clause.
            ':' if self.peek_nth(1) != Some(':') && !self.src[..self.pos].ends_with(':') => {
                Some(HoleEnd::Format)
            }
            _ => None,
        }
    }

    fn lex_hole_end(&mut self, end: HoleEnd) -> Result<(), LexError> {
        let Some(interp) = self.interpolations.last().copied() else {
            return Ok(());
        };
        if end == HoleEnd::Format {
            self.bump();
            loop {
                match self.peek() {
                    None => return Err(interp.unterminated()),
                    Some('}') => break,
                    Some(c)
                        if interp.flavor == StringFlavor::Regular
                            && (c == '"' || is_line_break(c)) =>
                    {
                        return Err(interp.unterminated());
                    }
                    Some(_) => {
                        self.bump();
                    }
                }
            }
        }
        let mut closed = 0;
        while closed < interp.braces && self.peek() == Some('}') {
            self.bump();
            closed += 1;
        }
        self.lex_interpolated_text()
    }

    fn track_depth(&mut self, kind: TokenKind) {
        let Some(interp) = self.interpolations.last_mut() else {
            return;
        };
        match kind {
            TokenKind::OpenParen | TokenKind::OpenBracket | TokenKind::OpenBrace => {
                interp.depth += 1;
            }
            TokenKind::CloseParen | TokenKind::CloseBracket | TokenKind::CloseBrace => {
                interp.depth = interp.depth.saturating_sub(1);
            }
            _ => {}
        }
    }

    fn lex_regular_string(&mut self, line: usize, column: usize) -> Result<(), LexError> {
        self.bump();
        loop {
            match self.peek() {
                None => return Err(LexError::UnterminatedString { line, column }),
                Some(c) if is_line_break(c) => {
                    return Err(LexError::UnterminatedString { line, column });
                }
                Some('\\') => {
                    self.bump();
                    if self.peek().is_none_or(is_line_break) {
                        return Err(LexError::UnterminatedString { line, column });
                    }
                    self.bump();
                }
                Some('"') => {
                    self.bump();
                    return Ok(());
                }
                Some(_) => {
                    self.bump();
                }
            }
        }
    }

    fn lex_verbatim_string(&mut self, line: usize, column: usize) -> Result<(), LexError> {
        self.bump();
        loop {
            match self.bump() {
                None => return Err(LexError::UnterminatedString { line, column }),
                Some('"') if self.peek() == Some('"') => {
                    self.bump();
                }
                Some('"') => return Ok(()),
                Some(_) => {}
            }
        }
    }

    /// `"""..."""`: closed by a run of at least as many quotes as opened it.
    fn lex_raw_string(&mut self, line: usize, column: usize) -> Result<(), LexError> {
        let quotes = self.eat_run('"');
        loop {
            match self.peek() {
                None => return Err(LexError::UnterminatedString { line, column }),
                Some('"') => {
                    if self.eat_run('"') >= quotes {
                        return Ok(());
                    }
                }
                Some(_) => {
                    self.bump();
                }
            }
        }
    }

    fn lex_character(&mut self, line: usize, column: usize) -> Result<(), LexError> {
        self.bump();
        loop {
            match self.peek() {
                None => return Err(LexError::UnterminatedCharacter { line, column }),
                Some(c) if is_line_break(c) => {
                    return Err(LexError::UnterminatedCharacter { line, column });
                }
                Some('\\') => {
                    self.bump();
                    if self.peek().is_none_or(is_line_break) {
                        return Err(LexError::UnterminatedCharacter { line, column });
                    }
                    self.bump();
                }
                Some('\'') => {
                    self.bump();
                    return Ok(());
                }
                Some(_) => {
                    self.bump();
                }
            }
        }
    }
}
