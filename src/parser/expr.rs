//! Expression parsing: precedence climbing over the table in §4.2, plus
//! the cast-vs-parenthesis probe and postfix call/path parsing.

use super::{PResult, Parser};
use crate::ast::{CompareOp, Expr, NaryOp, PrimitiveKind, TypeRef, UnaryOp};
use crate::error::ParseError;
use crate::intern::Symbol;
use crate::token::TokenKind;

impl<'a> Parser<'a> {
    pub(super) fn parse_expr(&mut self) -> PResult<Expr> {
        self.parse_level0()
    }

    /// `== !=` — strictly binary, not accumulated (§4.2).
    fn parse_level0(&mut self) -> PResult<Expr> {
        let left = self.parse_level1()?;
        let op = match self.peek().kind {
            TokenKind::EqEq => CompareOp::Eq,
            TokenKind::BangEq => CompareOp::Neq,
            _ => return Ok(left),
        };
        self.advance();
        let right = self.parse_level1()?;
        let span = left.span().to(right.span());
        Ok(Expr::Compare { op, args: vec![left, right], span })
    }

    /// `< <= >= > -> | & ^` — relational and `->` are binary, `| & ^` are
    /// accumulated into flat n-ary nodes (§4.2).
    fn parse_level1(&mut self) -> PResult<Expr> {
        let mut left = self.parse_level2()?;
        loop {
            match self.peek().kind {
                TokenKind::Lt => left = self.binary_compare(left, CompareOp::Lt)?,
                TokenKind::LtEq => left = self.binary_compare(left, CompareOp::Leq)?,
                TokenKind::GtEq => left = self.binary_compare(left, CompareOp::Geq)?,
                TokenKind::Gt => left = self.binary_compare(left, CompareOp::Gt)?,
                TokenKind::Arrow => left = self.binary_implication(left)?,
                TokenKind::Bar => left = self.nary_accumulate(left, NaryOp::Disj, TokenKind::Bar)?,
                TokenKind::Amp => left = self.nary_accumulate(left, NaryOp::Conj, TokenKind::Amp)?,
                TokenKind::Caret => left = self.nary_accumulate(left, NaryOp::Xor, TokenKind::Caret)?,
                _ => break,
            }
        }
        Ok(left)
    }

    fn binary_compare(&mut self, left: Expr, op: CompareOp) -> PResult<Expr> {
        self.advance();
        let right = self.parse_level2()?;
        let span = left.span().to(right.span());
        Ok(Expr::Compare { op, args: vec![left, right], span })
    }

    fn binary_implication(&mut self, left: Expr) -> PResult<Expr> {
        self.advance();
        let right = self.parse_level2()?;
        let span = left.span().to(right.span());
        Ok(Expr::Implication { antecedent: Box::new(left), consequent: Box::new(right), span })
    }

    /// Consumes a run of the *same* operator into one flat `Nary` node.
    fn nary_accumulate(&mut self, left: Expr, op: NaryOp, tok: TokenKind) -> PResult<Expr> {
        self.advance();
        let mut args = vec![left, self.parse_level2()?];
        while self.check(&tok) {
            self.advance();
            args.push(self.parse_level2()?);
        }
        let span = args[0].span().to(args.last().unwrap().span());
        Ok(Expr::Nary { op, args, span })
    }

    /// `+ -` — accumulated n-ary.
    fn parse_level2(&mut self) -> PResult<Expr> {
        self.parse_additive_or_multiplicative(Self::parse_level3, &[(TokenKind::Plus, NaryOp::Add), (TokenKind::Minus, NaryOp::Sub)])
    }

    /// `* /` — accumulated n-ary.
    fn parse_level3(&mut self) -> PResult<Expr> {
        self.parse_additive_or_multiplicative(Self::parse_unary, &[(TokenKind::Star, NaryOp::Mul), (TokenKind::Slash, NaryOp::Div)])
    }

    fn parse_additive_or_multiplicative(
        &mut self,
        next: fn(&mut Self) -> PResult<Expr>,
        table: &[(TokenKind, NaryOp)],
    ) -> PResult<Expr> {
        let mut left = next(self)?;
        loop {
            let Some(op) = table.iter().find(|(tk, _)| self.check(tk)).map(|(_, op)| *op) else { break };
            let matched_tok = table.iter().find(|(_, o)| *o == op).unwrap().0.clone();
            self.advance();
            let mut args = vec![left, next(self)?];
            while self.check(&matched_tok) {
                self.advance();
                args.push(next(self)?);
            }
            let span = args[0].span().to(args.last().unwrap().span());
            left = Expr::Nary { op, args, span };
        }
        Ok(left)
    }

    /// Prefix `+ - !`.
    fn parse_unary(&mut self) -> PResult<Expr> {
        let (op, start) = match self.peek().kind {
            TokenKind::Plus => (UnaryOp::Plus, self.advance().span),
            TokenKind::Minus => (UnaryOp::Minus, self.advance().span),
            TokenKind::Bang => (UnaryOp::Not, self.advance().span),
            _ => return self.parse_postfix(),
        };
        let operand = self.parse_unary()?;
        let span = start.to(operand.span());
        Ok(Expr::Unary { op, operand: Box::new(operand), span })
    }

    /// Atoms, `new`, parenthesized/cast expressions, and qualified
    /// id/call paths.
    fn parse_postfix(&mut self) -> PResult<Expr> {
        match self.peek().kind.clone() {
            TokenKind::Bool(b) => {
                let span = self.advance().span;
                Ok(Expr::BoolLit(b, span))
            }
            TokenKind::Int(n) => {
                let span = self.advance().span;
                Ok(Expr::IntLit(n, span))
            }
            TokenKind::Real(r) => {
                let span = self.advance().span;
                Ok(Expr::RealLit(r, span))
            }
            TokenKind::Str(s) => {
                let span = self.advance().span;
                Ok(Expr::StrLit(s, span))
            }
            TokenKind::KwNew => self.parse_new(),
            TokenKind::LParen => self.parse_paren_or_cast(),
            TokenKind::Id(_) => self.parse_path_or_call(),
            TokenKind::KwThis => self.parse_this_path_or_call(),
            _ => Err(ParseError { span: self.peek().span, found: self.peek().kind.clone(), expected: "an expression".into() }),
        }
    }

    fn parse_new(&mut self) -> PResult<Expr> {
        let start = self.advance().span; // 'new'
        let (path, ty_span) = self.parse_dotted_path()?;
        let ty = TypeRef::Named(path, ty_span);
        self.expect(&TokenKind::LParen, "'('")?;
        let args = self.parse_arg_list()?;
        let end = self.expect(&TokenKind::RParen, "')'")?;
        Ok(Expr::New { ty, args, span: start.to(end.span) })
    }

    /// After `(`, probes for a type reference immediately followed by `)`
    /// (a cast); otherwise backtracks and parses a parenthesized
    /// expression (§4.2 "Cast vs. parenthesis").
    fn parse_paren_or_cast(&mut self) -> PResult<Expr> {
        let start = self.advance().span; // '('
        if let Some(ty) = self.try_parse(|p| p.try_parse_type_ref_then_rparen()) {
            let operand = self.parse_unary()?;
            let span = start.to(operand.span());
            return Ok(Expr::Cast { ty, operand: Box::new(operand), span });
        }
        let inner = self.parse_expr()?;
        self.expect(&TokenKind::RParen, "')'")?;
        Ok(inner)
    }

    fn try_parse_type_ref_then_rparen(&mut self) -> Option<TypeRef> {
        let ty = match self.peek().kind {
            TokenKind::KwBool => TypeRef::Primitive(PrimitiveKind::Bool, self.advance().span),
            TokenKind::KwInt => TypeRef::Primitive(PrimitiveKind::Int, self.advance().span),
            TokenKind::KwReal => TypeRef::Primitive(PrimitiveKind::Real, self.advance().span),
            TokenKind::KwTime => TypeRef::Primitive(PrimitiveKind::Time, self.advance().span),
            TokenKind::KwString => TypeRef::Primitive(PrimitiveKind::String, self.advance().span),
            TokenKind::Id(_) => {
                let (path, span) = self.parse_dotted_path().ok()?;
                TypeRef::Named(path, span)
            }
            _ => return None,
        };
        if self.check(&TokenKind::RParen) {
            self.advance();
            Some(ty)
        } else {
            None
        }
    }

    /// A qualified id, a free-function call, or a receiver-qualified
    /// method call — all share the same `id ('.' id)* ['(' args ')']`
    /// shape (§4.9 "Function call").
    fn parse_path_or_call(&mut self) -> PResult<Expr> {
        let (path, span) = self.parse_dotted_path()?;
        if self.check(&TokenKind::LParen) {
            self.advance();
            let args = self.parse_arg_list()?;
            let end = self.expect(&TokenKind::RParen, "')'")?;
            return Ok(Expr::Call { callee: path, args, span: span.to(end.span) });
        }
        Ok(Expr::Path(path, span))
    }

    /// `this` and `this.field` / `this.method(args)` (§4.3 "Synthetic
    /// `this`") — the synthetic receiver symbol is pre-seeded in the
    /// interner (`Symbol::THIS`) so the parser can name it without a
    /// mutable interner reference.
    fn parse_this_path_or_call(&mut self) -> PResult<Expr> {
        let mut span = self.advance().span; // 'this'
        let mut path = vec![Symbol::THIS];
        while self.check(&TokenKind::Dot) {
            self.advance();
            let (next, next_span) = self.expect_id("identifier")?;
            path.push(next);
            span = span.to(next_span);
        }
        if self.check(&TokenKind::LParen) {
            self.advance();
            let args = self.parse_arg_list()?;
            let end = self.expect(&TokenKind::RParen, "')'")?;
            return Ok(Expr::Call { callee: path, args, span: span.to(end.span) });
        }
        Ok(Expr::Path(path, span))
    }

    pub(super) fn parse_arg_list(&mut self) -> PResult<Vec<Expr>> {
        let mut args = Vec::new();
        if self.check(&TokenKind::RParen) {
            return Ok(args);
        }
        args.push(self.parse_expr()?);
        while self.check(&TokenKind::Comma) {
            self.advance();
            args.push(self.parse_expr()?);
        }
        Ok(args)
    }

    /// Parses a type reference that is either a primitive keyword or a
    /// dotted qualified name, used wherever the grammar calls for
    /// `QualifiedType` outside of a cast.
    pub(super) fn parse_type_ref(&mut self) -> PResult<TypeRef> {
        match self.peek().kind {
            TokenKind::KwBool => Ok(TypeRef::Primitive(PrimitiveKind::Bool, self.advance().span)),
            TokenKind::KwInt => Ok(TypeRef::Primitive(PrimitiveKind::Int, self.advance().span)),
            TokenKind::KwReal => Ok(TypeRef::Primitive(PrimitiveKind::Real, self.advance().span)),
            TokenKind::KwTime => Ok(TypeRef::Primitive(PrimitiveKind::Time, self.advance().span)),
            TokenKind::KwString => Ok(TypeRef::Primitive(PrimitiveKind::String, self.advance().span)),
            _ => {
                let (path, span) = self.parse_dotted_path()?;
                Ok(TypeRef::Named(path, span))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::{CompareOp, Expr, NaryOp};
    use crate::intern::Interner;
    use crate::lexer::Lexer;
    use crate::parser::Parser;

    fn parse_expr(src: &str) -> Expr {
        let mut interner = Interner::new();
        let full = format!("{src};");
        let tokens = Lexer::tokenize(&full, &mut interner).unwrap();
        let unit = Parser::parse_compilation_unit(tokens, &interner).unwrap();
        match unit.body.into_iter().next().unwrap() {
            crate::ast::Stmt::Expr(e) => e,
            other => panic!("expected an expression statement, got {other:?}"),
        }
    }

    #[test]
    fn same_operator_run_flattens_to_one_nary_node() {
        let expr = parse_expr("1 + 2 + 3");
        match expr {
            Expr::Nary { op: NaryOp::Add, args, .. } => assert_eq!(args.len(), 3),
            other => panic!("expected a flat Add node, got {other:?}"),
        }
    }

    #[test]
    fn mixed_additive_operators_nest() {
        let expr = parse_expr("1 + 2 - 3");
        match expr {
            Expr::Nary { op: NaryOp::Sub, args, .. } => {
                assert_eq!(args.len(), 2);
                assert!(matches!(args[0], Expr::Nary { op: NaryOp::Add, .. }));
            }
            other => panic!("expected Sub[Add[..], ..], got {other:?}"),
        }
    }

    #[test]
    fn multiplication_binds_tighter_than_addition() {
        let expr = parse_expr("1 + 2 * 3");
        match expr {
            Expr::Nary { op: NaryOp::Add, args, .. } => {
                assert_eq!(args.len(), 2);
                assert!(matches!(args[1], Expr::Nary { op: NaryOp::Mul, .. }));
            }
            other => panic!("expected Add[1, Mul[2,3]], got {other:?}"),
        }
    }

    #[test]
    fn comparison_is_strictly_binary() {
        let expr = parse_expr("a == b");
        match expr {
            Expr::Compare { op: CompareOp::Eq, args, .. } => assert_eq!(args.len(), 2),
            other => panic!("expected Eq[a,b], got {other:?}"),
        }
    }

    #[test]
    fn implication_wraps_antecedent_and_consequent() {
        let expr = parse_expr("a -> b");
        assert!(matches!(expr, Expr::Implication { .. }));
    }

    #[test]
    fn parenthesized_expression_is_not_a_cast() {
        let expr = parse_expr("(1 + 2) * 3");
        match expr {
            Expr::Nary { op: NaryOp::Mul, args, .. } => assert!(matches!(args[0], Expr::Nary { op: NaryOp::Add, .. })),
            other => panic!("expected Mul[Add[..],3], got {other:?}"),
        }
    }

    #[test]
    fn parenthesized_type_name_is_a_cast() {
        let expr = parse_expr("(int) x");
        assert!(matches!(expr, Expr::Cast { .. }));
    }

    #[test]
    fn method_call_parses_qualified_callee_and_args() {
        let expr = parse_expr("tau.move(origin, dest)");
        match expr {
            Expr::Call { callee, args, .. } => {
                assert_eq!(callee.len(), 2);
                assert_eq!(args.len(), 2);
            }
            other => panic!("expected a Call, got {other:?}"),
        }
    }

    #[test]
    fn this_field_access_parses_as_a_qualified_path() {
        let expr = parse_expr("this.duration");
        match expr {
            Expr::Path(path, _) => assert_eq!(path.len(), 2),
            other => panic!("expected a Path, got {other:?}"),
        }
    }
}
