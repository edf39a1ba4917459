//! Expression nodes (§3, §4.2 "Expression precedence").

use super::TypeRef;
use crate::intern::Symbol;
use crate::rational::Rational;
use crate::token::Span;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Plus,
    Minus,
    Not,
}

/// Binary and n-ary operators. The parser folds runs of the same
/// left-associative operator (`a | b | c`, `a + b + c`, …) into a single
/// flat `args` vector rather than a chain of binary nodes (§4.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NaryOp {
    Disj,
    Conj,
    Xor,
    Add,
    Sub,
    Mul,
    Div,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Neq,
    Lt,
    Leq,
    Geq,
    Gt,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    BoolLit(bool, Span),
    IntLit(i64, Span),
    RealLit(Rational, Span),
    StrLit(String, Span),
    /// A qualified identifier path: `tau.duration`, or a bare `x`.
    Path(Vec<Symbol>, Span),
    Unary { op: UnaryOp, operand: Box<Expr>, span: Span },
    Compare { op: CompareOp, args: Vec<Expr>, span: Span },
    Nary { op: NaryOp, args: Vec<Expr>, span: Span },
    /// `a -> b`, rewritten during evaluation to `disj(negate(a), b)` (§4.9, §9).
    Implication { antecedent: Box<Expr>, consequent: Box<Expr>, span: Span },
    /// `(T) expr` — a type-checked identity cast, never a numeric coercion (§9).
    Cast { ty: TypeRef, operand: Box<Expr>, span: Span },
    /// `obj.method(args)` or a free `f(args)`; `callee` is the qualified path.
    Call { callee: Vec<Symbol>, args: Vec<Expr>, span: Span },
    New { ty: TypeRef, args: Vec<Expr>, span: Span },
}

impl Expr {
    pub fn span(&self) -> Span {
        match self {
            Expr::BoolLit(_, s)
            | Expr::IntLit(_, s)
            | Expr::RealLit(_, s)
            | Expr::StrLit(_, s)
            | Expr::Path(_, s)
            | Expr::Unary { span: s, .. }
            | Expr::Compare { span: s, .. }
            | Expr::Nary { span: s, .. }
            | Expr::Implication { span: s, .. }
            | Expr::Cast { span: s, .. }
            | Expr::Call { span: s, .. }
            | Expr::New { span: s, .. } => *s,
        }
    }
}
