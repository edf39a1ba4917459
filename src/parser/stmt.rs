//! Statement parsing (§4.2 "Statements").

use super::{PResult, Parser};
use crate::ast::{Binding, Branch, FormulaArg, Stmt, TypeRef};
use crate::intern::Symbol;
use crate::token::TokenKind;

impl<'a> Parser<'a> {
    pub(super) fn parse_statement(&mut self) -> PResult<Stmt> {
        match self.peek().kind.clone() {
            TokenKind::LBrace => self.parse_block_or_disjunction(),
            TokenKind::KwFor => self.parse_for_all(),
            TokenKind::KwReturn => self.parse_return(),
            TokenKind::KwFact | TokenKind::KwGoal => self.parse_formula(),
            TokenKind::KwBool | TokenKind::KwInt | TokenKind::KwReal | TokenKind::KwTime | TokenKind::KwString => {
                let ty = self.parse_type_ref()?;
                self.parse_local_field(ty)
            }
            TokenKind::Id(_) => self.parse_id_led_statement(),
            TokenKind::KwThis => self.parse_this_led_statement(),
            _ => {
                let expr = self.parse_expr()?;
                self.expect_semicolon()?;
                Ok(Stmt::Expr(expr))
            }
        }
    }

    /// An identifier-led statement is ambiguous between a local field
    /// (`Type name = ...`), an assignment (`a.b = ...`), and a bare
    /// expression statement (`a.foo();`) — parse the leading dotted path
    /// once and branch on what follows it (§4.2).
    fn parse_id_led_statement(&mut self) -> PResult<Stmt> {
        let checkpoint_pos = self.pos;
        let (path, path_span) = self.parse_dotted_path()?;

        if matches!(self.peek().kind, TokenKind::Id(_)) {
            let ty = TypeRef::Named(path, path_span);
            return self.parse_local_field(ty);
        }

        if self.check(&TokenKind::Eq) && path.len() >= 2 {
            self.advance();
            let value = self.parse_expr()?;
            let end = self.expect_semicolon()?;
            return Ok(Stmt::Assign { path, value, span: path_span.to(end.span) });
        }

        self.pos = checkpoint_pos;
        let expr = self.parse_expr()?;
        self.expect_semicolon()?;
        Ok(Stmt::Expr(expr))
    }

    /// `this.field = expr;` or a bare `this.method();` — `this` can never
    /// lead a local-field declaration, so the only ambiguity left is
    /// assignment vs. expression statement (§4.3 "Synthetic `this`").
    fn parse_this_led_statement(&mut self) -> PResult<Stmt> {
        let checkpoint_pos = self.pos;
        let mut span = self.advance().span; // 'this'
        let mut path = vec![Symbol::THIS];
        while self.check(&TokenKind::Dot) {
            self.advance();
            let (next, next_span) = self.expect_id("identifier")?;
            path.push(next);
            span = span.to(next_span);
        }

        if self.check(&TokenKind::Eq) && path.len() >= 2 {
            self.advance();
            let value = self.parse_expr()?;
            let end = self.expect_semicolon()?;
            return Ok(Stmt::Assign { path, value, span: span.to(end.span) });
        }

        self.pos = checkpoint_pos;
        let expr = self.parse_expr()?;
        self.expect_semicolon()?;
        Ok(Stmt::Expr(expr))
    }

    fn parse_local_field(&mut self, ty: TypeRef) -> PResult<Stmt> {
        let start_span = ty.span();
        let mut bindings = Vec::new();
        loop {
            let (name, _) = self.expect_id("a field name")?;
            let init = if self.check(&TokenKind::Eq) {
                self.advance();
                Some(self.parse_expr()?)
            } else {
                None
            };
            bindings.push(Binding { name, init });
            if self.check(&TokenKind::Comma) {
                self.advance();
                continue;
            }
            break;
        }
        let end = self.expect_semicolon()?;
        Ok(Stmt::LocalField { ty, bindings, span: start_span.to(end.span) })
    }

    fn parse_block_or_disjunction(&mut self) -> PResult<Stmt> {
        let start = self.advance().span; // '{'
        let body = self.parse_stmt_list_until_rbrace()?;
        let end = self.expect(&TokenKind::RBrace, "'}'")?;
        let mut span = start.to(end.span);

        let cost = if self.can_start_expr() { Some(self.parse_expr()?) } else { None };
        if let Some(c) = &cost {
            span = span.to(c.span());
        }
        if cost.is_none() && !self.check(&TokenKind::KwOr) {
            return Ok(Stmt::Block { body, span });
        }

        let mut branches = vec![Branch { body, cost }];
        while self.check(&TokenKind::KwOr) {
            self.advance();
            self.expect(&TokenKind::LBrace, "'{'")?;
            let branch_body = self.parse_stmt_list_until_rbrace()?;
            let branch_end = self.expect(&TokenKind::RBrace, "'}'")?;
            span = span.to(branch_end.span);
            let branch_cost = if self.can_start_expr() { Some(self.parse_expr()?) } else { None };
            if let Some(c) = &branch_cost {
                span = span.to(c.span());
            }
            branches.push(Branch { body: branch_body, cost: branch_cost });
        }
        Ok(Stmt::Disjunction { branches, span })
    }

    fn can_start_expr(&self) -> bool {
        matches!(
            self.peek().kind,
            TokenKind::Bool(_)
                | TokenKind::Int(_)
                | TokenKind::Real(_)
                | TokenKind::Str(_)
                | TokenKind::Id(_)
                | TokenKind::KwThis
                | TokenKind::LParen
                | TokenKind::KwNew
                | TokenKind::Minus
                | TokenKind::Plus
                | TokenKind::Bang
        )
    }

    fn parse_stmt_list_until_rbrace(&mut self) -> PResult<Vec<Stmt>> {
        let mut stmts = Vec::new();
        while !self.check(&TokenKind::RBrace) && !self.at_eof() {
            stmts.push(self.parse_statement()?);
        }
        Ok(stmts)
    }

    fn parse_for_all(&mut self) -> PResult<Stmt> {
        let start = self.advance().span; // 'for'
        self.expect(&TokenKind::LParen, "'('")?;
        let ty = self.parse_type_ref()?;
        let (var, _) = self.expect_id("a loop variable name")?;
        self.expect(&TokenKind::RParen, "')'")?;
        self.expect(&TokenKind::LBrace, "'{'")?;
        let body = self.parse_stmt_list_until_rbrace()?;
        let end = self.expect(&TokenKind::RBrace, "'}'")?;
        Ok(Stmt::ForAll { ty, var, body, span: start.to(end.span) })
    }

    fn parse_return(&mut self) -> PResult<Stmt> {
        let start = self.advance().span; // 'return'
        let expr = self.parse_expr()?;
        let end = self.expect_semicolon()?;
        Ok(Stmt::Return(expr, start.to(end.span)))
    }

    /// `fact|goal name = new scope.path.Predicate(arg: expr, ...);` (§4.2,
    /// §4.10). The dotted path after `new` is read in full, then the
    /// trailing segment is split off as the predicate name, leaving any
    /// remaining leading segments as the formula scope (mirrors
    /// `formula_scope.pop_back()` in the original parser).
    fn parse_formula(&mut self) -> PResult<Stmt> {
        let start_tok = self.advance(); // 'fact' | 'goal'
        let is_fact = matches!(start_tok.kind, TokenKind::KwFact);
        let (name, _) = self.expect_id("a formula name")?;
        self.expect(&TokenKind::Eq, "'='")?;
        self.expect(&TokenKind::KwNew, "'new'")?;
        let (mut path, path_span) = self.parse_dotted_path()?;
        let pred_name = path.pop().expect("parse_dotted_path always yields at least one segment");
        let scope = path;
        let predicate = TypeRef::Named(vec![pred_name], path_span);
        self.expect(&TokenKind::LParen, "'('")?;
        let args = self.parse_formula_args()?;
        self.expect(&TokenKind::RParen, "')'")?;
        let end = self.expect_semicolon()?;
        Ok(Stmt::Formula { is_fact, name, scope, predicate, args, span: start_tok.span.to(end.span) })
    }

    fn parse_formula_args(&mut self) -> PResult<Vec<FormulaArg>> {
        let mut args = Vec::new();
        if self.check(&TokenKind::RParen) {
            return Ok(args);
        }
        args.push(self.parse_formula_arg()?);
        while self.check(&TokenKind::Comma) {
            self.advance();
            args.push(self.parse_formula_arg()?);
        }
        Ok(args)
    }

    fn parse_formula_arg(&mut self) -> PResult<FormulaArg> {
        let (name, _) = self.expect_id("a predicate argument name")?;
        self.expect(&TokenKind::Colon, "':'")?;
        let value = self.parse_expr()?;
        Ok(FormulaArg { name, value })
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::Stmt;
    use crate::intern::Interner;
    use crate::lexer::Lexer;
    use crate::parser::Parser;

    fn parse_one(src: &str) -> Stmt {
        let mut interner = Interner::new();
        let tokens = Lexer::tokenize(src, &mut interner).unwrap();
        let unit = Parser::parse_compilation_unit(tokens, &interner).unwrap();
        unit.body.into_iter().next().unwrap()
    }

    #[test]
    fn local_field_with_primitive_type_and_initializer() {
        let stmt = parse_one("int duration = 5;");
        match stmt {
            Stmt::LocalField { bindings, .. } => {
                assert_eq!(bindings.len(), 1);
                assert!(bindings[0].init.is_some());
            }
            other => panic!("expected LocalField, got {other:?}"),
        }
    }

    #[test]
    fn local_field_with_named_type_and_no_initializer() {
        let stmt = parse_one("Location loc;");
        match stmt {
            Stmt::LocalField { ty, bindings, .. } => {
                assert!(matches!(ty, crate::ast::TypeRef::Named(_, _)));
                assert!(bindings[0].init.is_none());
            }
            other => panic!("expected LocalField, got {other:?}"),
        }
    }

    #[test]
    fn assignment_requires_qualified_path() {
        let stmt = parse_one("tau.duration = 5;");
        assert!(matches!(stmt, Stmt::Assign { .. }));
    }

    #[test]
    fn bare_expression_statement_is_a_call() {
        let stmt = parse_one("tau.move();");
        match stmt {
            Stmt::Expr(crate::ast::Expr::Call { .. }) => {}
            other => panic!("expected an Expr(Call), got {other:?}"),
        }
    }

    #[test]
    fn block_without_trailing_cost_is_a_plain_block() {
        let stmt = parse_one("{ int x = 1; }");
        assert!(matches!(stmt, Stmt::Block { .. }));
    }

    #[test]
    fn disjunction_with_or_branches_and_costs() {
        let stmt = parse_one("{ int x = 1; } 2 or { int y = 2; } 3");
        match stmt {
            Stmt::Disjunction { branches, .. } => {
                assert_eq!(branches.len(), 2);
                assert!(branches[0].cost.is_some());
                assert!(branches[1].cost.is_some());
            }
            other => panic!("expected Disjunction, got {other:?}"),
        }
    }

    #[test]
    fn for_all_parses_loop_type_and_variable() {
        let stmt = parse_one("for (Location l) { }");
        match stmt {
            Stmt::ForAll { var: _, body, .. } => assert!(body.is_empty()),
            other => panic!("expected ForAll, got {other:?}"),
        }
    }

    #[test]
    fn this_led_assignment_is_distinguished_from_a_bare_call() {
        let stmt = parse_one("this.duration = 5;");
        assert!(matches!(stmt, Stmt::Assign { .. }));
        let stmt = parse_one("this.advance();");
        match stmt {
            Stmt::Expr(crate::ast::Expr::Call { .. }) => {}
            other => panic!("expected an Expr(Call), got {other:?}"),
        }
    }

    #[test]
    fn formula_statement_parses_goal_and_args() {
        let stmt = parse_one("goal g0 = new At(l: origin, t: 5);");
        match stmt {
            Stmt::Formula { is_fact, args, .. } => {
                assert!(!is_fact);
                assert_eq!(args.len(), 2);
            }
            other => panic!("expected Formula, got {other:?}"),
        }
    }
}
