//! Main lexer implementation for Sprig.
//!
//! The [`Lexer`] converts source text into a flat vector of [`Token`]s,
//! dispatching on the first character of each lexeme. Lexemes are copied
//! into the arena so the source string can be freed after lexing.
//!
//! Errors are accumulated rather than aborting the scan: an unexpected
//! character is recorded and skipped, and lexing continues.

use bumpalo::Bump;

use sprig_core::{LexError, Span};

use super::token::{Token, TokenKind, lookup_keyword};

/// Lexer for Sprig source code.
///
/// The `'src` lifetime is the source string being lexed (temporary).
/// The `'ast` lifetime is the arena where token lexemes are allocated.
pub struct Lexer<'src, 'ast> {
    source: &'src str,
    arena: &'ast Bump,
    /// Byte offset where the current lexeme starts.
    start: usize,
    /// Byte offset of the next character to consume.
    current: usize,
    line: u32,
    col: u32,
    errors: Vec<LexError>,
}

impl<'src, 'ast> Lexer<'src, 'ast> {
    /// Create a new lexer for the given source text.
    pub fn new(source: &'src str, arena: &'ast Bump) -> Self {
        Self {
            source,
            arena,
            start: 0,
            current: 0,
            line: 1,
            col: 1,
            errors: Vec::new(),
        }
    }

    /// Scan the whole input, returning the tokens and any errors.
    ///
    /// The token stream always ends with an [`TokenKind::Eof`] token.
    pub fn scan_tokens(mut self) -> (Vec<Token<'ast>>, Vec<LexError>) {
        let mut tokens = Vec::new();
        while !self.is_at_end() {
            self.start = self.current;
            if let Some(token) = self.scan_token() {
                tokens.push(token);
            }
        }
        tokens.push(Token::new(
            TokenKind::Eof,
            "",
            Span::point(self.line, self.col),
        ));
        (tokens, self.errors)
    }

    fn scan_token(&mut self) -> Option<Token<'ast>> {
        let c = self.advance();
        match c {
            '(' => Some(self.make(TokenKind::LeftParen)),
            ')' => Some(self.make(TokenKind::RightParen)),
            '{' => Some(self.make(TokenKind::LeftBrace)),
            '}' => Some(self.make(TokenKind::RightBrace)),
            ',' => Some(self.make(TokenKind::Comma)),
            ';' => Some(self.make(TokenKind::Semicolon)),
            '+' => Some(self.make(TokenKind::Plus)),
            '-' => Some(self.make(TokenKind::Minus)),
            '*' => Some(self.make(TokenKind::Star)),
            '/' => {
                if self.matches('/') {
                    // Line comment: skip to end of line.
                    while !self.is_at_end() && self.peek() != '\n' {
                        self.advance();
                    }
                    None
                } else {
                    Some(self.make(TokenKind::Slash))
                }
            }
            '!' => {
                let kind = if self.matches('=') {
                    TokenKind::BangEqual
                } else {
                    TokenKind::Bang
                };
                Some(self.make(kind))
            }
            '=' => {
                let kind = if self.matches('=') {
                    TokenKind::EqualEqual
                } else {
                    TokenKind::Equal
                };
                Some(self.make(kind))
            }
            '<' => {
                let kind = if self.matches('=') {
                    TokenKind::LessEqual
                } else {
                    TokenKind::Less
                };
                Some(self.make(kind))
            }
            '>' => {
                let kind = if self.matches('=') {
                    TokenKind::GreaterEqual
                } else {
                    TokenKind::Greater
                };
                Some(self.make(kind))
            }
            '&' => {
                if self.matches('&') {
                    Some(self.make(TokenKind::AmpAmp))
                } else {
                    self.unexpected('&');
                    None
                }
            }
            '|' => {
                if self.matches('|') {
                    Some(self.make(TokenKind::PipePipe))
                } else {
                    self.unexpected('|');
                    None
                }
            }
            ' ' | '\r' | '\t' => None,
            '\n' => {
                self.line += 1;
                self.col = 1;
                None
            }
            _ => {
                if c.is_ascii_digit() {
                    Some(self.number())
                } else if is_ident_start(c) {
                    Some(self.identifier())
                } else {
                    self.unexpected(c);
                    None
                }
            }
        }
    }

    fn number(&mut self) -> Token<'ast> {
        while self.peek().is_ascii_digit() {
            self.advance();
        }
        self.make(TokenKind::Int)
    }

    fn identifier(&mut self) -> Token<'ast> {
        while is_ident_continue(self.peek()) {
            self.advance();
        }
        let text = &self.source[self.start..self.current];
        let kind = lookup_keyword(text).unwrap_or(TokenKind::Identifier);
        self.make(kind)
    }

    fn unexpected(&mut self, ch: char) {
        self.errors.push(LexError::UnexpectedChar {
            ch,
            span: Span::new(self.line, self.col_at_start(), 1),
        });
    }

    fn make(&self, kind: TokenKind) -> Token<'ast> {
        let text = &self.source[self.start..self.current];
        let lexeme = self.arena.alloc_str(text);
        let span = Span::new(self.line, self.col_at_start(), text.len() as u32);
        Token::new(kind, lexeme, span)
    }

    /// Column where the current lexeme started.
    fn col_at_start(&self) -> u32 {
        self.col - (self.current - self.start) as u32
    }

    fn is_at_end(&self) -> bool {
        self.current >= self.source.len()
    }

    fn advance(&mut self) -> char {
        let c = self.peek();
        self.current += c.len_utf8();
        self.col += 1;
        c
    }

    fn matches(&mut self, expected: char) -> bool {
        if self.is_at_end() || self.peek() != expected {
            return false;
        }
        self.current += expected.len_utf8();
        self.col += 1;
        true
    }

    fn peek(&self) -> char {
        self.source[self.current..].chars().next().unwrap_or('\0')
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_ident_continue(c: char) -> bool {
    is_ident_start(c) || c.is_ascii_digit()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan(source: &str, arena: &Bump) -> Vec<TokenKind> {
        let (tokens, errors) = Lexer::new(source, arena).scan_tokens();
        assert!(errors.is_empty(), "unexpected lex errors: {errors:?}");
        tokens.into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn scans_let_statement() {
        let arena = Bump::new();
        let kinds = scan("let x = 42;", &arena);
        assert_eq!(
            kinds,
            vec![
                TokenKind::Let,
                TokenKind::Identifier,
                TokenKind::Equal,
                TokenKind::Int,
                TokenKind::Semicolon,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn scans_two_char_operators() {
        let arena = Bump::new();
        let kinds = scan("== != <= >= && ||", &arena);
        assert_eq!(
            kinds,
            vec![
                TokenKind::EqualEqual,
                TokenKind::BangEqual,
                TokenKind::LessEqual,
                TokenKind::GreaterEqual,
                TokenKind::AmpAmp,
                TokenKind::PipePipe,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn line_comment_is_skipped() {
        let arena = Bump::new();
        let kinds = scan("// nothing here\nprint(1);", &arena);
        assert_eq!(
            kinds,
            vec![
                TokenKind::Print,
                TokenKind::LeftParen,
                TokenKind::Int,
                TokenKind::RightParen,
                TokenKind::Semicolon,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn tracks_line_and_column() {
        let arena = Bump::new();
        let (tokens, _) = Lexer::new("let x;\nlet y;", &arena).scan_tokens();
        let y = tokens
            .iter()
            .find(|t| t.lexeme == "y")
            .expect("token for y");
        assert_eq!(y.span.line, 2);
        assert_eq!(y.span.col, 5);
    }

    #[test]
    fn lone_ampersand_is_an_error() {
        let arena = Bump::new();
        let (tokens, errors) = Lexer::new("1 & 2", &arena).scan_tokens();
        assert_eq!(errors.len(), 1);
        assert!(matches!(
            errors[0],
            LexError::UnexpectedChar { ch: '&', .. }
        ));
        // The scan keeps going past the bad character.
        let kinds: Vec<_> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(kinds, vec![TokenKind::Int, TokenKind::Int, TokenKind::Eof]);
    }
}
