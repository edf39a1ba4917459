//! Recursive-descent parser (§4.2). Single token of lookahead plus a
//! handful of spots — cast vs. parenthesis, method decl vs. statement —
//! that need to look further ahead and backtrack.
//!
//! The token stream is fully materialized by the lexer first (rather than
//! pulled lazily), so backtracking is just resetting an index.

mod decl;
mod expr;
mod stmt;

use crate::ast::CompilationUnit;
use crate::error::{ParseError, RResult, RiddleError};
use crate::intern::{Interner, Symbol};
use crate::token::{Span, Token, TokenKind};

pub struct Parser<'a> {
    tokens: Vec<Token>,
    pos: usize,
    #[allow(dead_code)]
    interner: &'a Interner,
}

type PResult<T> = Result<T, ParseError>;

impl<'a> Parser<'a> {
    pub fn new(tokens: Vec<Token>, interner: &'a Interner) -> Self {
        Parser { tokens, pos: 0, interner }
    }

    /// Parses one source file into a [`CompilationUnit`] (§4.2 "Top level").
    pub fn parse_compilation_unit(tokens: Vec<Token>, interner: &'a Interner) -> RResult<CompilationUnit> {
        let mut parser = Parser::new(tokens, interner);
        let mut unit = CompilationUnit::default();
        while !parser.at_eof() {
            parser.parse_top_level_item(&mut unit).map_err(RiddleError::from)?;
        }
        Ok(unit)
    }

    fn parse_top_level_item(&mut self, unit: &mut CompilationUnit) -> PResult<()> {
        match &self.peek().kind {
            TokenKind::KwTypedef | TokenKind::KwEnum | TokenKind::KwClass => {
                unit.types.push(self.parse_type_decl()?);
            }
            TokenKind::KwPredicate => {
                unit.predicates.push(self.parse_predicate_decl()?);
            }
            TokenKind::KwVoid => {
                unit.methods.push(self.parse_method_decl()?);
            }
            TokenKind::Id(_) if self.probes_as_method_decl() => {
                unit.methods.push(self.parse_method_decl()?);
            }
            _ => {
                unit.body.push(self.parse_statement()?);
            }
        }
        Ok(())
    }

    // -- token stream primitives ------------------------------------------------

    fn peek(&self) -> &Token {
        &self.tokens[self.pos]
    }

    fn peek_kind_at(&self, offset: usize) -> &TokenKind {
        self.tokens
            .get(self.pos + offset)
            .map(|t| &t.kind)
            .unwrap_or(&TokenKind::Eof)
    }

    fn at_eof(&self) -> bool {
        matches!(self.peek().kind, TokenKind::Eof)
    }

    /// Advances unconditionally, returning the consumed token. Never moves
    /// past the trailing `Eof`.
    fn advance(&mut self) -> Token {
        let tok = self.tokens[self.pos].clone();
        if !matches!(tok.kind, TokenKind::Eof) {
            self.pos += 1;
        }
        tok
    }

    fn same_kind(a: &TokenKind, b: &TokenKind) -> bool {
        std::mem::discriminant(a) == std::mem::discriminant(b)
    }

    fn check(&self, kind: &TokenKind) -> bool {
        Self::same_kind(&self.peek().kind, kind)
    }

    fn expect(&mut self, kind: &TokenKind, expected: &str) -> PResult<Token> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(ParseError { span: self.peek().span, found: self.peek().kind.clone(), expected: expected.into() })
        }
    }

    fn expect_id(&mut self, expected: &str) -> PResult<(Symbol, Span)> {
        match self.peek().kind.clone() {
            TokenKind::Id(sym) => {
                let span = self.peek().span;
                self.advance();
                Ok((sym, span))
            }
            _ => Err(ParseError { span: self.peek().span, found: self.peek().kind.clone(), expected: expected.into() }),
        }
    }

    fn expect_semicolon(&mut self) -> PResult<Token> {
        self.expect(&TokenKind::Semicolon, "';'")
    }

    /// Saves the current position, runs `f`, and restores it if `f` fails
    /// or returns `None` — the "probe, else backtrack" idiom used for
    /// cast-vs-parenthesis and method-vs-field disambiguation (§4.2).
    fn try_parse<T>(&mut self, f: impl FnOnce(&mut Self) -> Option<T>) -> Option<T> {
        let checkpoint = self.pos;
        let result = f(self);
        if result.is_none() {
            self.pos = checkpoint;
        }
        result
    }

    /// Consumes a dotted identifier path (`id ('.' id)*`); used for both
    /// qualified type names and qualified value paths.
    fn parse_dotted_path(&mut self) -> PResult<(Vec<Symbol>, Span)> {
        let (first, mut span) = self.expect_id("identifier")?;
        let mut path = vec![first];
        while self.check(&TokenKind::Dot) {
            self.advance();
            let (next, next_span) = self.expect_id("identifier")?;
            path.push(next);
            span = span.to(next_span);
        }
        Ok((path, span))
    }

    /// Read-only lookahead for the "id {'.' id}* id '('" method-declaration
    /// probe (§4.2): a dotted return-type path followed by another
    /// identifier and `(`.
    fn probes_as_method_decl(&self) -> bool {
        let mut i = self.pos;
        if !matches!(self.tokens.get(i).map(|t| &t.kind), Some(TokenKind::Id(_))) {
            return false;
        }
        i += 1;
        while matches!(self.tokens.get(i).map(|t| &t.kind), Some(TokenKind::Dot)) {
            i += 1;
            if !matches!(self.tokens.get(i).map(|t| &t.kind), Some(TokenKind::Id(_))) {
                return false;
            }
            i += 1;
        }
        matches!(self.tokens.get(i).map(|t| &t.kind), Some(TokenKind::Id(_)))
            && matches!(self.tokens.get(i + 1).map(|t| &t.kind), Some(TokenKind::LParen))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;

    fn parse(src: &str) -> (CompilationUnit, Interner) {
        let mut interner = Interner::new();
        let tokens = Lexer::tokenize(src, &mut interner).unwrap();
        let unit = Parser::parse_compilation_unit(tokens, &interner).unwrap();
        (unit, interner)
    }

    #[test]
    fn probes_as_method_decl_distinguishes_field_from_method() {
        let mut interner = Interner::new();
        let tokens = Lexer::tokenize("Location loc(Location l) { }", &mut interner).unwrap();
        let parser = Parser::new(tokens, &interner);
        assert!(parser.probes_as_method_decl());

        let tokens2 = Lexer::tokenize("Location loc;", &mut interner).unwrap();
        let parser2 = Parser::new(tokens2, &interner);
        assert!(!parser2.probes_as_method_decl());
    }

    #[test]
    fn empty_source_parses_to_empty_unit() {
        let (unit, _) = parse("");
        assert!(unit.types.is_empty());
        assert!(unit.body.is_empty());
    }

    #[test]
    fn top_level_statement_is_a_local_field() {
        let (unit, _) = parse("int x = 5;");
        assert_eq!(unit.body.len(), 1);
    }
}
