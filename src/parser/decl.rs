//! Declaration parsing: typedefs, enums, classes, predicates, fields,
//! constructors and methods (§4.2 "Declarations").

use super::{PResult, Parser};
use crate::ast::{ConstructorDecl, Field, InitElem, MethodDecl, Param, PredicateDecl, TypeDecl};
use crate::error::ParseError;
use crate::intern::Symbol;
use crate::token::{Span, TokenKind};
use std::rc::Rc;

impl<'a> Parser<'a> {
    pub(super) fn parse_type_decl(&mut self) -> PResult<TypeDecl> {
        match self.peek().kind {
            TokenKind::KwTypedef => self.parse_typedef(),
            TokenKind::KwEnum => self.parse_enum(),
            TokenKind::KwClass => self.parse_class(),
            _ => Err(ParseError { span: self.peek().span, found: self.peek().kind.clone(), expected: "a type declaration".into() }),
        }
    }

    /// `typedef BaseType name = expr ;` — the base type constrains what
    /// `expr` must evaluate to each time the typedef is referenced (§4.5
    /// "Typedef", never memoized).
    fn parse_typedef(&mut self) -> PResult<TypeDecl> {
        let start = self.advance().span; // 'typedef'
        let base = self.parse_type_ref()?;
        let (name, _) = self.expect_id("a typedef name")?;
        self.expect(&TokenKind::Eq, "'='")?;
        let expr = self.parse_expr()?;
        let end = self.expect_semicolon()?;
        Ok(TypeDecl::Typedef { name, base, expr, span: start.to(end.span) })
    }

    /// `enum name { "v1", "v2", ... } (or OtherEnum)* ;` — `union_refs`
    /// transitively pulls in another enum's values (§4.5 "Enum").
    fn parse_enum(&mut self) -> PResult<TypeDecl> {
        let start = self.advance().span; // 'enum'
        let (name, _) = self.expect_id("an enum name")?;
        self.expect(&TokenKind::LBrace, "'{'")?;
        let mut values = Vec::new();
        if !self.check(&TokenKind::RBrace) {
            values.push(self.expect_string_literal()?);
            while self.check(&TokenKind::Comma) {
                self.advance();
                values.push(self.expect_string_literal()?);
            }
        }
        self.expect(&TokenKind::RBrace, "'}'")?;
        let mut union_refs = Vec::new();
        while self.check(&TokenKind::KwOr) {
            self.advance();
            union_refs.push(self.parse_type_ref()?);
        }
        let end = self.expect_semicolon()?;
        Ok(TypeDecl::Enum { name, values, union_refs, span: start.to(end.span) })
    }

    /// `class name [: Parent, ...] { member* }`. Synthesizes a default
    /// (zero-arg, empty-body) constructor when the body declares none
    /// (§4.2, §4.8 "declare").
    fn parse_class(&mut self) -> PResult<TypeDecl> {
        let start = self.advance().span; // 'class'
        let (name, _) = self.expect_id("a class name")?;
        let parents = self.parse_optional_parent_list()?;

        self.expect(&TokenKind::LBrace, "'{'")?;
        let mut fields = Vec::new();
        let mut constructors = Vec::new();
        let mut methods = Vec::new();
        let mut predicates = Vec::new();
        let mut nested_types = Vec::new();
        while !self.check(&TokenKind::RBrace) && !self.at_eof() {
            self.parse_class_member(name, &mut fields, &mut constructors, &mut methods, &mut predicates, &mut nested_types)?;
        }
        let end = self.expect(&TokenKind::RBrace, "'}'")?;
        let span = start.to(end.span);

        if constructors.is_empty() {
            constructors.push(ConstructorDecl { params: Vec::new(), inits: Vec::new(), body: Rc::new(Vec::new()), span, synthesized: true });
        }

        Ok(TypeDecl::Class { name, parents, fields, constructors, methods, predicates, nested_types, span })
    }

    fn parse_optional_parent_list(&mut self) -> PResult<Vec<crate::ast::TypeRef>> {
        let mut parents = Vec::new();
        if self.check(&TokenKind::Colon) {
            self.advance();
            parents.push(self.parse_type_ref()?);
            while self.check(&TokenKind::Comma) {
                self.advance();
                parents.push(self.parse_type_ref()?);
            }
        }
        Ok(parents)
    }

    #[allow(clippy::too_many_arguments)]
    fn parse_class_member(
        &mut self,
        class_name: Symbol,
        fields: &mut Vec<Field>,
        constructors: &mut Vec<ConstructorDecl>,
        methods: &mut Vec<MethodDecl>,
        predicates: &mut Vec<PredicateDecl>,
        nested_types: &mut Vec<TypeDecl>,
    ) -> PResult<()> {
        match &self.peek().kind {
            TokenKind::KwTypedef | TokenKind::KwEnum | TokenKind::KwClass => {
                nested_types.push(self.parse_type_decl()?);
            }
            TokenKind::KwPredicate => predicates.push(self.parse_predicate_decl()?),
            TokenKind::KwVoid => methods.push(self.parse_method_decl()?),
            _ if self.peek_is_constructor_start(class_name) => constructors.push(self.parse_constructor()?),
            TokenKind::Id(_) if self.probes_as_method_decl() => methods.push(self.parse_method_decl()?),
            TokenKind::KwBool | TokenKind::KwInt | TokenKind::KwReal | TokenKind::KwTime | TokenKind::KwString | TokenKind::Id(_) => {
                fields.extend(self.parse_field_decl()?);
            }
            _ => {
                return Err(ParseError {
                    span: self.peek().span,
                    found: self.peek().kind.clone(),
                    expected: "a field, constructor, method, predicate or nested type".into(),
                })
            }
        }
        Ok(())
    }

    fn peek_is_constructor_start(&self, class_name: Symbol) -> bool {
        matches!(&self.peek().kind, TokenKind::Id(sym) if *sym == class_name) && matches!(self.peek_kind_at(1), TokenKind::LParen)
    }

    fn parse_constructor(&mut self) -> PResult<ConstructorDecl> {
        let start = self.advance().span; // the class name, as constructor head
        self.expect(&TokenKind::LParen, "'('")?;
        let params = self.parse_param_list()?;
        self.expect(&TokenKind::RParen, "')'")?;

        let mut inits = Vec::new();
        if self.check(&TokenKind::Colon) {
            self.advance();
            inits.push(self.parse_init_elem()?);
            while self.check(&TokenKind::Comma) {
                self.advance();
                inits.push(self.parse_init_elem()?);
            }
        }

        self.expect(&TokenKind::LBrace, "'{'")?;
        let body = self.parse_stmt_list_until_rbrace()?;
        let end = self.expect(&TokenKind::RBrace, "'}'")?;
        Ok(ConstructorDecl { params, inits, body: Rc::new(body), span: start.to(end.span), synthesized: false })
    }

    /// `name ( args )` in a constructor init-list. Whether `name` turns
    /// out to be a field or a parent class is resolved later, during
    /// elaboration, once field and parent names are both known.
    fn parse_init_elem(&mut self) -> PResult<InitElem> {
        let (name, name_span) = self.expect_id("a field or base class name")?;
        self.expect(&TokenKind::LParen, "'('")?;
        let args = self.parse_arg_list()?;
        let end = self.expect(&TokenKind::RParen, "')'")?;
        Ok(InitElem { name, args, span: name_span.to(end.span) })
    }

    pub(super) fn parse_method_decl(&mut self) -> PResult<MethodDecl> {
        let start = self.peek().span;
        let return_ty = if self.check(&TokenKind::KwVoid) {
            self.advance();
            None
        } else {
            Some(self.parse_type_ref()?)
        };
        let (name, _) = self.expect_id("a method name")?;
        self.expect(&TokenKind::LParen, "'('")?;
        let params = self.parse_param_list()?;
        self.expect(&TokenKind::RParen, "')'")?;
        self.expect(&TokenKind::LBrace, "'{'")?;
        let body = self.parse_stmt_list_until_rbrace()?;
        let end = self.expect(&TokenKind::RBrace, "'}'")?;
        Ok(MethodDecl { name, params, return_ty, body: Rc::new(body), span: start.to(end.span) })
    }

    pub(super) fn parse_predicate_decl(&mut self) -> PResult<PredicateDecl> {
        let start = self.advance().span; // 'predicate'
        let (name, _) = self.expect_id("a predicate name")?;
        self.expect(&TokenKind::LParen, "'('")?;
        let params = self.parse_param_list()?;
        self.expect(&TokenKind::RParen, "')'")?;
        let parents = self.parse_optional_parent_list()?;
        self.expect(&TokenKind::LBrace, "'{'")?;
        let body = self.parse_stmt_list_until_rbrace()?;
        let end = self.expect(&TokenKind::RBrace, "'}'")?;
        Ok(PredicateDecl { name, params, parents, body: Rc::new(body), span: start.to(end.span) })
    }

    fn parse_param_list(&mut self) -> PResult<Vec<Param>> {
        let mut params = Vec::new();
        if self.check(&TokenKind::RParen) {
            return Ok(params);
        }
        params.push(self.parse_param()?);
        while self.check(&TokenKind::Comma) {
            self.advance();
            params.push(self.parse_param()?);
        }
        Ok(params)
    }

    fn parse_param(&mut self) -> PResult<Param> {
        let ty = self.parse_type_ref()?;
        let (name, _) = self.expect_id("a parameter name")?;
        Ok(Param { name, ty })
    }

    fn parse_field_decl(&mut self) -> PResult<Vec<Field>> {
        let ty = self.parse_type_ref()?;
        let mut fields = Vec::new();
        loop {
            let (name, name_span) = self.expect_id("a field name")?;
            let init = if self.check(&TokenKind::Eq) {
                self.advance();
                Some(self.parse_expr()?)
            } else {
                None
            };
            let end_span = init.as_ref().map(|e| e.span()).unwrap_or(name_span);
            fields.push(Field { name, ty: ty.clone(), init, span: ty.span().to(end_span) });
            if self.check(&TokenKind::Comma) {
                self.advance();
                continue;
            }
            break;
        }
        self.expect_semicolon()?;
        Ok(fields)
    }

    fn expect_string_literal(&mut self) -> PResult<String> {
        match self.peek().kind.clone() {
            TokenKind::Str(s) => {
                self.advance();
                Ok(s)
            }
            _ => Err(ParseError { span: self.peek().span, found: self.peek().kind.clone(), expected: "a string literal".into() }),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::TypeDecl;
    use crate::intern::Interner;
    use crate::lexer::Lexer;
    use crate::parser::Parser;

    fn parse_first_type(src: &str) -> TypeDecl {
        let mut interner = Interner::new();
        let tokens = Lexer::tokenize(src, &mut interner).unwrap();
        let unit = Parser::parse_compilation_unit(tokens, &interner).unwrap();
        unit.types.into_iter().next().unwrap()
    }

    #[test]
    fn typedef_parses_base_type_and_expr() {
        let decl = parse_first_type("typedef int Duration = 1;");
        match decl {
            TypeDecl::Typedef { base, .. } => assert!(matches!(base, crate::ast::TypeRef::Primitive(crate::ast::PrimitiveKind::Int, _))),
            other => panic!("expected Typedef, got {other:?}"),
        }
    }

    #[test]
    fn enum_parses_values_and_union_refs() {
        let decl = parse_first_type(r#"enum Color { "red", "green" } or Season;"#);
        match decl {
            TypeDecl::Enum { values, union_refs, .. } => {
                assert_eq!(values, vec!["red".to_string(), "green".to_string()]);
                assert_eq!(union_refs.len(), 1);
            }
            other => panic!("expected Enum, got {other:?}"),
        }
    }

    #[test]
    fn class_without_constructor_gets_a_synthesized_one() {
        let decl = parse_first_type("class Location { string name; }");
        match decl {
            TypeDecl::Class { constructors, fields, .. } => {
                assert_eq!(fields.len(), 1);
                assert_eq!(constructors.len(), 1);
                assert!(constructors[0].synthesized);
            }
            other => panic!("expected Class, got {other:?}"),
        }
    }

    #[test]
    fn class_with_explicit_constructor_keeps_only_that_one() {
        let decl = parse_first_type("class Location { string name; Location(string n) : name(n) { } }");
        match decl {
            TypeDecl::Class { constructors, .. } => {
                assert_eq!(constructors.len(), 1);
                assert!(!constructors[0].synthesized);
                assert_eq!(constructors[0].inits.len(), 1);
            }
            other => panic!("expected Class, got {other:?}"),
        }
    }

    #[test]
    fn class_distinguishes_field_method_and_nested_predicate() {
        let decl = parse_first_type(
            "class Robot { \
               Location loc; \
               void move(Location dest) { } \
               predicate At(Location l) { } \
             }",
        );
        match decl {
            TypeDecl::Class { fields, methods, predicates, .. } => {
                assert_eq!(fields.len(), 1);
                assert_eq!(methods.len(), 1);
                assert_eq!(predicates.len(), 1);
            }
            other => panic!("expected Class, got {other:?}"),
        }
    }

    #[test]
    fn class_with_parent_list() {
        let decl = parse_first_type("class Cargo : Item, Trackable { }");
        match decl {
            TypeDecl::Class { parents, .. } => assert_eq!(parents.len(), 2),
            other => panic!("expected Class, got {other:?}"),
        }
    }
}
