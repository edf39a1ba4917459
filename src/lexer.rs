//! Hand-written lexer (§4.1). Byte-indexed scanning over the source text;
//! never hands whitespace or comment text to the parser, and once it hits
//! the end of input it is happy to keep handing back `Eof` forever.

use crate::error::LexError;
use crate::intern::Interner;
use crate::rational::parse_real_literal;
use crate::token::{Span, Token, TokenKind};

pub struct Lexer<'a> {
    bytes: &'a [u8],
    pos: usize,
    line: usize,
    line_start: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Lexer { bytes: source.as_bytes(), pos: 0, line: 1, line_start: 0 }
    }

    /// Lexes the entire source into a token stream ending in exactly one
    /// `Eof` (the totality property tested in §8).
    pub fn tokenize(source: &'a str, interner: &mut Interner) -> Result<Vec<Token>, LexError> {
        let mut lexer = Lexer::new(source);
        let mut tokens = Vec::new();
        loop {
            let tok = lexer.next(interner)?;
            let is_eof = tok.kind == TokenKind::Eof;
            tokens.push(tok);
            if is_eof {
                return Ok(tokens);
            }
        }
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.bytes.get(self.pos + offset).copied()
    }

    fn col(&self) -> usize {
        self.pos - self.line_start
    }

    /// Column of the last character already consumed (inclusive), used as
    /// a token's `end_col` per §4.1's worked examples.
    fn last_col(&self) -> usize {
        self.pos.saturating_sub(1) - self.line_start
    }

    fn advance(&mut self) -> Option<u8> {
        let b = self.peek()?;
        self.pos += 1;
        if b == b'\n' {
            self.line += 1;
            self.line_start = self.pos;
        }
        Some(b)
    }

    fn skip_whitespace_and_comments(&mut self) -> Result<(), LexError> {
        loop {
            match self.peek() {
                Some(b' ') | Some(b'\t') | Some(b'\r') | Some(b'\n') => {
                    self.advance();
                }
                Some(b'/') if self.peek_at(1) == Some(b'/') => {
                    while self.peek().is_some() && self.peek() != Some(b'\n') {
                        self.advance();
                    }
                }
                Some(b'/') if self.peek_at(1) == Some(b'*') => {
                    let start_line = self.line;
                    let start_col = self.col();
                    self.advance();
                    self.advance();
                    loop {
                        match self.peek() {
                            None => {
                                return Err(LexError {
                                    span: Span::new(start_line, start_col, start_col + 2),
                                    message: "unterminated block comment".into(),
                                })
                            }
                            Some(b'*') if self.peek_at(1) == Some(b'/') => {
                                self.advance();
                                self.advance();
                                break;
                            }
                            _ => {
                                self.advance();
                            }
                        }
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    /// Produces the next token. Past the end of input this keeps returning
    /// zero-width `Eof` tokens rather than erroring.
    pub fn next(&mut self, interner: &mut Interner) -> Result<Token, LexError> {
        self.skip_whitespace_and_comments()?;

        let start_line = self.line;
        let start_col = self.col();

        let Some(c) = self.peek() else {
            return Ok(Token::new(TokenKind::Eof, Span::new(start_line, start_col, start_col)));
        };

        if c.is_ascii_digit() {
            return self.lex_number(start_line, start_col);
        }
        if c == b'.' && self.peek_at(1).map(|b| b.is_ascii_digit()).unwrap_or(false) {
            return self.lex_number(start_line, start_col);
        }
        if c.is_ascii_alphabetic() || c == b'_' {
            return self.lex_identifier(interner, start_line, start_col);
        }
        if c == b'"' {
            return self.lex_string(start_line, start_col);
        }

        self.lex_punctuation(start_line, start_col)
    }

    fn lex_number(&mut self, start_line: usize, start_col: usize) -> Result<Token, LexError> {
        let int_start = self.pos;
        while self.peek().map(|b| b.is_ascii_digit()).unwrap_or(false) {
            self.advance();
        }
        let int_digits = std::str::from_utf8(&self.bytes[int_start..self.pos]).unwrap();

        let is_real = self.peek() == Some(b'.') && self.peek_at(1).map(|b| b.is_ascii_digit()).unwrap_or(false);
        if !is_real {
            let value: i64 = int_digits.parse().map_err(|_| LexError {
                span: Span::new(start_line, start_col, self.last_col()),
                message: format!("integer literal '{int_digits}' out of range"),
            })?;
            return Ok(Token::new(TokenKind::Int(value), Span::new(start_line, start_col, self.last_col())));
        }

        self.advance(); // consume '.'
        let frac_start = self.pos;
        while self.peek().map(|b| b.is_ascii_digit()).unwrap_or(false) {
            self.advance();
        }
        let frac_digits = std::str::from_utf8(&self.bytes[frac_start..self.pos]).unwrap();
        let value = parse_real_literal(int_digits, frac_digits);
        Ok(Token::new(TokenKind::Real(value), Span::new(start_line, start_col, self.last_col())))
    }

    fn lex_identifier(&mut self, interner: &mut Interner, start_line: usize, start_col: usize) -> Result<Token, LexError> {
        let start = self.pos;
        while self
            .peek()
            .map(|b| b.is_ascii_alphanumeric() || b == b'_')
            .unwrap_or(false)
        {
            self.advance();
        }
        let word = std::str::from_utf8(&self.bytes[start..self.pos]).unwrap();
        let kind = TokenKind::keyword(word).unwrap_or_else(|| TokenKind::Id(interner.intern(word)));
        Ok(Token::new(kind, Span::new(start_line, start_col, self.last_col())))
    }

    fn lex_string(&mut self, start_line: usize, start_col: usize) -> Result<Token, LexError> {
        self.advance(); // opening quote
        let start = self.pos;
        loop {
            match self.peek() {
                None => {
                    return Err(LexError {
                        span: Span::new(start_line, start_col, self.col()),
                        message: "unterminated string literal".into(),
                    })
                }
                Some(b'"') => {
                    let text = std::str::from_utf8(&self.bytes[start..self.pos]).unwrap().to_string();
                    let end_col = self.col();
                    self.advance(); // closing quote
                    return Ok(Token::new(TokenKind::Str(text), Span::new(start_line, start_col, end_col)));
                }
                _ => {
                    self.advance();
                }
            }
        }
    }

    fn lex_punctuation(&mut self, start_line: usize, start_col: usize) -> Result<Token, LexError> {
        let c = self.advance().unwrap();
        let two_char = |this: &mut Self, next: u8, then: TokenKind, otherwise: TokenKind| {
            if this.peek() == Some(next) {
                this.advance();
                then
            } else {
                otherwise
            }
        };

        let kind = match c {
            b'.' => TokenKind::Dot,
            b',' => TokenKind::Comma,
            b':' => TokenKind::Colon,
            b';' => TokenKind::Semicolon,
            b'(' => TokenKind::LParen,
            b')' => TokenKind::RParen,
            b'[' => TokenKind::LBracket,
            b']' => TokenKind::RBracket,
            b'{' => TokenKind::LBrace,
            b'}' => TokenKind::RBrace,
            b'+' => TokenKind::Plus,
            b'*' => TokenKind::Star,
            b'/' => TokenKind::Slash,
            b'&' => TokenKind::Amp,
            b'|' => TokenKind::Bar,
            b'^' => TokenKind::Caret,
            b'-' => two_char(self, b'>', TokenKind::Arrow, TokenKind::Minus),
            b'=' => two_char(self, b'=', TokenKind::EqEq, TokenKind::Eq),
            b'<' => two_char(self, b'=', TokenKind::LtEq, TokenKind::Lt),
            b'>' => two_char(self, b'=', TokenKind::GtEq, TokenKind::Gt),
            b'!' => two_char(self, b'=', TokenKind::BangEq, TokenKind::Bang),
            other => {
                return Err(LexError {
                    span: Span::new(start_line, start_col, self.col()),
                    message: format!("unexpected character '{}'", other as char),
                })
            }
        };
        Ok(Token::new(kind, Span::new(start_line, start_col, self.last_col())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        let mut interner = Interner::new();
        Lexer::tokenize(src, &mut interner).unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn digits_scenario() {
        use num_rational::Ratio;
        let ks = kinds("5, .5, 2.5, 13.275");
        assert_eq!(
            ks,
            vec![
                TokenKind::Int(5),
                TokenKind::Comma,
                TokenKind::Real(Ratio::new(1, 2)),
                TokenKind::Comma,
                TokenKind::Real(Ratio::new(5, 2)),
                TokenKind::Comma,
                TokenKind::Real(Ratio::new(531, 40)),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn digits_scenario_spans() {
        let mut interner = Interner::new();
        let toks = Lexer::tokenize("5, .5, 2.5, 13.275", &mut interner).unwrap();
        let spans: Vec<(usize, usize)> = toks.iter().map(|t| (t.span.start_col, t.span.end_col)).collect();
        assert_eq!(
            spans,
            vec![(0, 0), (1, 1), (3, 4), (5, 5), (7, 9), (10, 10), (12, 17), (18, 18)]
        );
    }

    #[test]
    fn keywords_vs_identifiers() {
        let mut interner = Interner::new();
        let toks = Lexer::tokenize("bool b0; int factotum;", &mut interner).unwrap();
        let kinds: Vec<&TokenKind> = toks.iter().map(|t| &t.kind).collect();
        assert_eq!(kinds[0], &TokenKind::KwBool);
        assert!(matches!(kinds[1], TokenKind::Id(_)));
        assert_eq!(kinds[2], &TokenKind::Semicolon);
        assert_eq!(kinds[3], &TokenKind::KwInt);
        assert!(matches!(kinds[4], TokenKind::Id(_)));
        assert_eq!(kinds[5], &TokenKind::Semicolon);
        assert_eq!(kinds[6], &TokenKind::Eof);
    }

    #[test]
    fn factotum_is_identifier_not_fact_keyword() {
        let mut interner = Interner::new();
        let toks = Lexer::tokenize("fact factotum", &mut interner).unwrap();
        assert_eq!(toks[0].kind, TokenKind::KwFact);
        match &toks[1].kind {
            TokenKind::Id(sym) => assert_eq!(interner.resolve(*sym), "factotum"),
            other => panic!("expected identifier, got {other:?}"),
        }
    }

    #[test]
    fn eof_repeats_after_end() {
        let mut interner = Interner::new();
        let mut lexer = Lexer::new("");
        assert_eq!(lexer.next(&mut interner).unwrap().kind, TokenKind::Eof);
        assert_eq!(lexer.next(&mut interner).unwrap().kind, TokenKind::Eof);
        assert_eq!(lexer.next(&mut interner).unwrap().kind, TokenKind::Eof);
    }

    #[test]
    fn line_comment_is_skipped() {
        let ks = kinds("1; // comment\n2;");
        assert_eq!(ks, vec![TokenKind::Int(1), TokenKind::Semicolon, TokenKind::Int(2), TokenKind::Semicolon, TokenKind::Eof]);
    }

    #[test]
    fn block_comment_is_skipped() {
        let ks = kinds("1 /* multi\nline */ + 2;");
        assert_eq!(ks, vec![TokenKind::Int(1), TokenKind::Plus, TokenKind::Int(2), TokenKind::Semicolon, TokenKind::Eof]);
    }

    #[test]
    fn unterminated_block_comment_errors() {
        let mut interner = Interner::new();
        let err = Lexer::tokenize("1 /* oops", &mut interner).unwrap_err();
        assert!(err.message.contains("unterminated block comment"));
    }

    #[test]
    fn unterminated_string_errors() {
        let mut interner = Interner::new();
        let err = Lexer::tokenize("\"oops", &mut interner).unwrap_err();
        assert!(err.message.contains("unterminated string"));
    }

    #[test]
    fn string_literal_may_span_lines() {
        let mut interner = Interner::new();
        let toks = Lexer::tokenize("\"a\nb\";", &mut interner).unwrap();
        assert_eq!(toks[0].kind, TokenKind::Str("a\nb".into()));
        assert_eq!(toks[1].span.line, 2);
    }

    #[test]
    fn operators_lex_longest_match_first() {
        let ks = kinds("a <= b >= c == d != e -> f");
        assert!(ks.contains(&TokenKind::LtEq));
        assert!(ks.contains(&TokenKind::GtEq));
        assert!(ks.contains(&TokenKind::EqEq));
        assert!(ks.contains(&TokenKind::BangEq));
        assert!(ks.contains(&TokenKind::Arrow));
    }
}
