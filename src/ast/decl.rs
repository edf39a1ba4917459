//! Declaration nodes: fields, constructors, methods, predicates, and the
//! three kinds of type declaration (§3 "AST").

use super::{Stmt, TypeRef};
use crate::intern::Symbol;
use crate::token::Span;
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: Symbol,
    pub ty: TypeRef,
    pub init: Option<super::Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: Symbol,
    pub ty: TypeRef,
}

/// One element of a constructor's init-list: `name(args)`. Syntactically a
/// field initializer and a base-constructor call look identical — the
/// elaborator's declare pass tells them apart by resolving `name` against
/// the class's fields and parent list (§4.8 "declare").
#[derive(Debug, Clone, PartialEq)]
pub struct InitElem {
    pub name: Symbol,
    pub args: Vec<super::Expr>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct ConstructorDecl {
    pub params: Vec<Param>,
    pub inits: Vec<InitElem>,
    /// Shared so the elaborated `Constructor` can keep invoking the same
    /// body for the life of the core without cloning the statement tree.
    pub body: Rc<Vec<Stmt>>,
    pub span: Span,
    /// True for the parser-synthesized default constructor (§4.2).
    pub synthesized: bool,
}

#[derive(Debug, Clone)]
pub struct MethodDecl {
    pub name: Symbol,
    pub params: Vec<Param>,
    pub return_ty: Option<TypeRef>,
    pub body: Rc<Vec<Stmt>>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct PredicateDecl {
    pub name: Symbol,
    pub params: Vec<Param>,
    pub parents: Vec<TypeRef>,
    pub body: Rc<Vec<Stmt>>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub enum TypeDecl {
    Typedef {
        name: Symbol,
        base: TypeRef,
        expr: super::Expr,
        span: Span,
    },
    Enum {
        name: Symbol,
        values: Vec<String>,
        union_refs: Vec<TypeRef>,
        span: Span,
    },
    Class {
        name: Symbol,
        parents: Vec<TypeRef>,
        fields: Vec<Field>,
        constructors: Vec<ConstructorDecl>,
        methods: Vec<MethodDecl>,
        predicates: Vec<PredicateDecl>,
        nested_types: Vec<TypeDecl>,
        span: Span,
    },
}

impl TypeDecl {
    pub fn name(&self) -> Symbol {
        match self {
            TypeDecl::Typedef { name, .. } => *name,
            TypeDecl::Enum { name, .. } => *name,
            TypeDecl::Class { name, .. } => *name,
        }
    }
}
