//! Expression evaluation (§4.9): every AST expression reduces to an
//! [`ItemKey`] against a live `(scope, env)` pair by calling out to `core`'s
//! factory methods. Never inspects the solver's own representation.

use crate::ast::{CompareOp, Expr, NaryOp, UnaryOp};
use crate::core::Core;
use crate::elaborate::refine::resolve_type_ref;
use crate::env::EnvKey;
use crate::error::{RResult, RiddleError};
use crate::eval::{self, resolve_constructor, resolve_core_method, resolve_method};
use crate::intern::Interner;
use crate::item::ItemKey;
use crate::scope::ScopeKey;

pub fn eval_expr(core: &mut Core, scope: ScopeKey, env: EnvKey, expr: &Expr, interner: &Interner) -> RResult<ItemKey> {
    match expr {
        Expr::BoolLit(b, _) => Ok(core.new_bool(Some(*b))),
        Expr::IntLit(i, _) => Ok(core.new_int(Some(*i))),
        Expr::RealLit(r, _) => Ok(core.new_real(Some(*r))),
        Expr::StrLit(s, _) => Ok(core.new_string(Some(s.clone()))),

        Expr::Path(path, span) => eval::eval_path(core, env, path, interner).map_err(|e| with_span(e, *span)),

        Expr::Unary { op, operand, span } => {
            let value = eval_expr(core, scope, env, operand, interner)?;
            match op {
                UnaryOp::Plus => Ok(value),
                UnaryOp::Minus => {
                    let ty = core.items.get(value).ty;
                    core.minus(ty, value).map_err(|e| with_span(e, *span))
                }
                UnaryOp::Not => Ok(core.negate(value)),
            }
        }

        Expr::Compare { op, args, span } => {
            let items = eval_args(core, scope, env, args, interner)?;
            match op {
                CompareOp::Eq => core.eq(&items),
                CompareOp::Neq => core.eq(&items).map(|eq| core.negate(eq)),
                CompareOp::Lt => core.lt(&items),
                CompareOp::Leq => core.leq(&items),
                CompareOp::Geq => core.geq(&items),
                CompareOp::Gt => core.gt(&items),
            }
            .map_err(|e| with_span(e, *span))
        }

        Expr::Nary { op, args, span } => {
            let items = eval_args(core, scope, env, args, interner)?;
            match op {
                NaryOp::Disj => Ok(core.disj(&items)),
                NaryOp::Conj => Ok(core.conj(&items)),
                NaryOp::Xor => Ok(core.exct_one(&items)),
                NaryOp::Add => {
                    let ty = core.items.get(items[0]).ty;
                    core.add(ty, &items)
                }
                NaryOp::Sub => {
                    let ty = core.items.get(items[0]).ty;
                    core.sub(ty, &items)
                }
                NaryOp::Mul => {
                    let ty = core.items.get(items[0]).ty;
                    core.mul(ty, &items)
                }
                NaryOp::Div => {
                    let ty = core.items.get(items[0]).ty;
                    core.div(ty, &items)
                }
            }
            .map_err(|e| with_span(e, *span))
        }

        // `a -> b` is rewritten as `disj(negate(a), b)` (§4.9, §9).
        Expr::Implication { antecedent, consequent, .. } => {
            let a = eval_expr(core, scope, env, antecedent, interner)?;
            let b = eval_expr(core, scope, env, consequent, interner)?;
            let not_a = core.negate(a);
            Ok(core.disj(&[not_a, b]))
        }

        Expr::Cast { ty, operand, span } => {
            let value = eval_expr(core, scope, env, operand, interner)?;
            let target = resolve_type_ref(core, scope, ty, interner)?;
            let source = core.items.get(value).ty;
            if core.types.is_assignable(target, source) || core.types.is_assignable(source, target) {
                Ok(value)
            } else {
                Err(RiddleError::TypeMismatch {
                    expected: interner.resolve(core.types.get(target).name).to_string(),
                    found: interner.resolve(core.types.get(source).name).to_string(),
                    span: Some(*span),
                })
            }
        }

        Expr::New { ty, args, span } => {
            let class_ty = resolve_type_ref(core, scope, ty, interner)?;
            let arg_items = eval_args(core, scope, env, args, interner)?;
            let arg_types: Vec<_> = arg_items.iter().map(|&a| core.items.get(a).ty).collect();
            let ctor = resolve_constructor(core, class_ty, &arg_types).ok_or_else(|| RiddleError::TypeMismatch {
                expected: format!("a constructor of {} matching the given arguments", interner.resolve(core.types.get(class_ty).name)),
                found: format!("{} argument(s)", arg_items.len()),
                span: Some(*span),
            })?;
            eval::invoke_constructor(core, class_ty, &ctor, &arg_items, interner)
        }

        Expr::Call { callee, args, span } => {
            let arg_items = eval_args(core, scope, env, args, interner)?;
            let arg_types: Vec<_> = arg_items.iter().map(|&a| core.items.get(a).ty).collect();
            let name = *callee.last().expect("callee path is non-empty");

            if callee.len() == 1 {
                let method = resolve_core_method(core, name, &arg_types).ok_or_else(|| RiddleError::UnresolvedName {
                    name: interner.resolve(name).to_string(),
                    span: Some(*span),
                    candidates: Vec::new(),
                })?;
                return eval::invoke_method(core, core.root_env, &method, &arg_items, interner);
            }

            let receiver = eval::eval_path(core, env, &callee[..callee.len() - 1], interner)?;
            let receiver_ty = core.items.get(receiver).ty;
            let receiver_env = match &core.items.get(receiver).data {
                crate::item::ItemData::Component { env } => *env,
                _ => {
                    return Err(RiddleError::TypeMismatch {
                        expected: "a component instance (to call a method on)".into(),
                        found: interner.resolve(core.types.get(receiver_ty).name).to_string(),
                        span: Some(*span),
                    })
                }
            };
            let method = resolve_method(core, receiver_ty, name, &arg_types).ok_or_else(|| RiddleError::UnresolvedName {
                name: interner.resolve(name).to_string(),
                span: Some(*span),
                candidates: Vec::new(),
            })?;
            eval::invoke_method(core, receiver_env, &method, &arg_items, interner)
        }
    }
}

pub fn eval_args(core: &mut Core, scope: ScopeKey, env: EnvKey, args: &[Expr], interner: &Interner) -> RResult<Vec<ItemKey>> {
    args.iter().map(|a| eval_expr(core, scope, env, a, interner)).collect()
}

fn with_span(err: RiddleError, span: crate::token::Span) -> RiddleError {
    match err {
        RiddleError::UnresolvedName { name, candidates, span: None } => RiddleError::UnresolvedName { name, candidates, span: Some(span) },
        RiddleError::TypeMismatch { expected, found, span: None } => RiddleError::TypeMismatch { expected, found, span: Some(span) },
        RiddleError::Inconsistency { field, span: None } => RiddleError::Inconsistency { field, span: Some(span) },
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{CompareOp, Expr};
    use crate::token::Span;

    #[test]
    fn arithmetic_folds_through_eval_expr() {
        let mut core = Core::with_reference_backend();
        let interner = Interner::new();
        let expr = Expr::Nary {
            op: NaryOp::Add,
            args: vec![Expr::IntLit(2, Span::default()), Expr::IntLit(3, Span::default())],
            span: Span::default(),
        };
        let item = eval_expr(&mut core, core.root_scope, core.root_env, &expr, &interner).unwrap();
        assert_eq!(core.items.arithmetic_value(item).unwrap().value, crate::rational::Rational::from_integer(5));
    }

    #[test]
    fn implication_rewrites_to_disjunction_of_negation() {
        let mut core = Core::with_reference_backend();
        let interner = Interner::new();
        let expr = Expr::Implication {
            antecedent: Box::new(Expr::BoolLit(true, Span::default())),
            consequent: Box::new(Expr::BoolLit(false, Span::default())),
            span: Span::default(),
        };
        let item = eval_expr(&mut core, core.root_scope, core.root_env, &expr, &interner).unwrap();
        assert_eq!(core.items.bool_value(item), Some(false));
    }

    #[test]
    fn compare_on_constants_folds() {
        let mut core = Core::with_reference_backend();
        let interner = Interner::new();
        let expr = Expr::Compare {
            op: CompareOp::Lt,
            args: vec![Expr::IntLit(1, Span::default()), Expr::IntLit(2, Span::default())],
            span: Span::default(),
        };
        let item = eval_expr(&mut core, core.root_scope, core.root_env, &expr, &interner).unwrap();
        assert_eq!(core.items.bool_value(item), Some(true));
    }
}
