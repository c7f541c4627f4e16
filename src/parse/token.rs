/// Lexical token kinds. `<` and `>` are always single tokens; whether they
/// delimit a type argument list is decided later by the list classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Identifier,
    NumericLiteral,
    StringLiteral,
    CharacterLiteral,
    Comma,
    Dot,
    Semicolon,
    Colon,
    Question,
    OpenParen,
    CloseParen,
    OpenBracket,
    CloseBracket,
    OpenBrace,
    CloseBrace,
    LessThan,
    GreaterThan,
    /// `*`, kept apart from other operators for pointer type arguments.
    Star,
    Operator,
    Unknown,
    EndOfFile,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TriviaKind {
    /// Spaces and tabs.
    Whitespace,
    /// `\n`, `\r\n`, `\r`, U+0085, U+2028 or U+2029. Always terminates a
    /// physical line.
    EndOfLine,
    /// `// ...` up to, not including, the line break.
    SingleLineComment,
    /// `/* ... */`, possibly spanning lines.
    MultiLineComment,
    /// `#region`, `#pragma` and friends, up to the line break.
    PreprocessorDirective,
}

/// Half-open byte range `[start, end)` into the document text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        &source[self.start..self.end]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Trivia {
    pub kind: TriviaKind,
    pub span: Span,
}

impl Trivia {
    pub fn is_whitespace(&self) -> bool {
        self.kind == TriviaKind::Whitespace
    }

    pub fn is_end_of_line(&self) -> bool {
        self.kind == TriviaKind::EndOfLine
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
    /// 1-indexed line of the token's first character.
    pub line: usize,
    /// 1-indexed column (in characters) of the token's first character.
    pub column: usize,
    pub leading: Vec<Trivia>,
    /// Same-line trivia after the token, including the terminating line break.
    pub trailing: Vec<Trivia>,
}

impl Token {
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        self.span.text(source)
    }

    pub fn is(&self, kind: TokenKind) -> bool {
        self.kind == kind
    }
}

/// Immutable, index-addressed token list for one document.
///
/// The last token is always `EndOfFile`, which carries any trivia left at the
/// end of the text as leading trivia.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenStream {
    tokens: Vec<Token>,
}

impl TokenStream {
    pub fn new(tokens: Vec<Token>) -> Self {
        debug_assert!(
            tokens.last().is_some_and(|t| t.kind == TokenKind::EndOfFile),
            "token stream must end with EndOfFile"
        );
        Self { tokens }
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn get(&self, index: usize) -> Option<&Token> {
        self.tokens.get(index)
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Indices of every comma token, in document order.
    pub fn comma_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.tokens
            .iter()
            .enumerate()
            .filter(|(_, t)| t.kind == TokenKind::Comma)
            .map(|(i, _)| i)
    }

    /// All trivia between token `index - 1` and token `index`, in text order.
    /// For the first token this is just its leading trivia.
    pub fn trivia_before(&self, index: usize) -> impl DoubleEndedIterator<Item = &Trivia> + '_ {
        let previous = index
            .checked_sub(1)
            .and_then(|i| self.tokens.get(i))
            .map(|t| t.trailing.as_slice())
            .unwrap_or_default();
        let own = self
            .tokens
            .get(index)
            .map(|t| t.leading.as_slice())
            .unwrap_or_default();
        previous.iter().chain(own.iter())
    }

    /// All trivia between token `index` and token `index + 1`, in text order.
    pub fn trivia_after(&self, index: usize) -> impl DoubleEndedIterator<Item = &Trivia> + '_ {
        let own = self
            .tokens
            .get(index)
            .map(|t| t.trailing.as_slice())
            .unwrap_or_default();
        let next = self
            .tokens
            .get(index + 1)
            .map(|t| t.leading.as_slice())
            .unwrap_or_default();
        own.iter().chain(next.iter())
    }

    /// Find the token starting at the given 1-indexed line and column.
    pub fn token_at(&self, line: usize, column: usize) -> Option<usize> {
        // Tokens are in document order, so (line, column) is sorted too.
        self.tokens
            .binary_search_by(|t| (t.line, t.column).cmp(&(line, column)))
            .ok()
    }
}
