//! Statement nodes (§3, §4.2 "Statements").

use super::{Expr, TypeRef};
use crate::intern::Symbol;
use crate::token::Span;

#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    pub name: Symbol,
    pub init: Option<Expr>,
}

/// One disjunct of a disjunction statement: a block of statements plus an
/// optional lazily-evaluated cost expression (§4.10 "Conjunction value").
#[derive(Debug, Clone, PartialEq)]
pub struct Branch {
    pub body: Vec<Stmt>,
    pub cost: Option<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FormulaArg {
    pub name: Symbol,
    pub value: Expr,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// `Type id [= expr] {, id [= expr]}* ;`
    LocalField { ty: TypeRef, bindings: Vec<Binding>, span: Span },
    /// `a.b.c = expr ;` — `path` has length >= 2, last segment is the target field.
    Assign { path: Vec<Symbol>, value: Expr, span: Span },
    Expr(Expr),
    /// A `{ ... }` block, optionally costed when used as a disjunction branch.
    Block { body: Vec<Stmt>, span: Span },
    /// `{ ... } [cost]? or { ... } [cost]? ...`
    Disjunction { branches: Vec<Branch>, span: Span },
    /// `for (EnumOrComponentType id) { ... }`
    ForAll { ty: TypeRef, var: Symbol, body: Vec<Stmt>, span: Span },
    Return(Expr, Span),
    /// `fact|goal name = new scope.path.Predicate(arg: expr, ...);` — the
    /// dotted path before the predicate name is the *formula scope*: an
    /// object path walked at execution time to find the receiver whose
    /// `tau` the atom binds (§4.2 grammar, §4.10 "Formula" step 1). Empty
    /// when the formula is unscoped (`new Predicate(...)`).
    Formula {
        is_fact: bool,
        name: Symbol,
        scope: Vec<Symbol>,
        predicate: TypeRef,
        args: Vec<FormulaArg>,
        span: Span,
    },
}

impl Stmt {
    pub fn span(&self) -> Span {
        match self {
            Stmt::LocalField { span, .. }
            | Stmt::Assign { span, .. }
            | Stmt::Block { span, .. }
            | Stmt::Disjunction { span, .. }
            | Stmt::ForAll { span, .. }
            | Stmt::Return(_, span)
            | Stmt::Formula { span, .. } => *span,
            Stmt::Expr(e) => e.span(),
        }
    }
}
