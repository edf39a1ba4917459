//! Statement execution (§4.10): runs a statement body against a live
//! `(scope, env)` pair, mutating `env` as local fields are bound and
//! issuing `assert_fact`/`new_disjunction` calls to `core` as a side effect.

use crate::ast::{Branch, Stmt};
use crate::core::Core;
use crate::elaborate::refine::resolve_type_ref;
use crate::elaborate::refine_predicates::resolve_predicate_ref;
use crate::env::EnvKey;
use crate::error::{RResult, RiddleError};
use crate::eval::{self, expr::eval_expr};
use crate::intern::{Interner, Symbol};
use crate::scope::ScopeKey;
use crate::types::TypeData;

/// Whether a statement sequence ran to completion or hit a `return`
/// (§4.10 "Return" — binds under `Symbol::RETURN` and stops the body).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Returned,
}

pub fn exec_stmts(core: &mut Core, scope: ScopeKey, env: EnvKey, stmts: &[Stmt], interner: &Interner) -> RResult<Flow> {
    for stmt in stmts {
        if exec_stmt(core, scope, env, stmt, interner)? == Flow::Returned {
            return Ok(Flow::Returned);
        }
    }
    Ok(Flow::Continue)
}

pub fn exec_stmt(core: &mut Core, scope: ScopeKey, env: EnvKey, stmt: &Stmt, interner: &Interner) -> RResult<Flow> {
    match stmt {
        Stmt::LocalField { ty, bindings, span } => {
            let field_ty = resolve_type_ref(core, scope, ty, interner).map_err(|e| with_span(e, *span))?;
            for binding in bindings {
                let item = match &binding.init {
                    Some(init) => eval_expr(core, scope, env, init, interner)?,
                    None => eval::new_instance(core, field_ty, interner)?,
                };
                core.envs.bind(env, binding.name, item);
            }
            Ok(Flow::Continue)
        }

        Stmt::Assign { path, value, span } => {
            let target_env = eval::resolve_receiver_env(core, env, &path[..path.len() - 1], interner).map_err(|e| with_span(e, *span))?;
            let last = *path.last().expect("assignment path is non-empty");
            let new_value = eval_expr(core, scope, env, value, interner)?;
            if let Some(existing) = core.envs.get_here(target_env, last) {
                core.assign(existing, new_value).map_err(|e| with_span(e, *span))?;
            }
            core.envs.bind(target_env, last, new_value);
            Ok(Flow::Continue)
        }

        Stmt::Expr(e) => {
            let item = eval_expr(core, scope, env, e, interner)?;
            core.assert_fact(item);
            Ok(Flow::Continue)
        }

        Stmt::Block { body, .. } => exec_stmts(core, scope, env, body, interner),

        Stmt::Disjunction { branches, .. } => {
            let branch_items = branches.iter().map(|b| eval_branch(core, scope, env, b, interner)).collect::<RResult<Vec<_>>>()?;
            core.new_disjunction(&branch_items);
            Ok(Flow::Continue)
        }

        Stmt::ForAll { ty, var, body, span } => {
            let loop_ty = resolve_type_ref(core, scope, ty, interner).map_err(|e| with_span(e, *span))?;
            let instances = iteration_instances(core, loop_ty, interner)?;
            for instance in instances {
                let child_env = core.envs.create(Some(env));
                core.envs.bind(child_env, *var, instance);
                exec_stmts(core, scope, child_env, body, interner)?;
            }
            Ok(Flow::Continue)
        }

        Stmt::Return(e, _) => {
            let item = eval_expr(core, scope, env, e, interner)?;
            core.envs.bind(env, Symbol::RETURN, item);
            Ok(Flow::Returned)
        }

        Stmt::Formula { is_fact, name, scope: formula_scope, predicate, args, span } => {
            exec_formula(core, scope, env, *is_fact, *name, formula_scope, predicate, args, *span, interner)?;
            Ok(Flow::Continue)
        }
    }
}

fn eval_branch(core: &mut Core, scope: ScopeKey, env: EnvKey, branch: &Branch, interner: &Interner) -> RResult<crate::item::ItemKey> {
    let branch_env = core.envs.create(Some(env));
    let mut facts = Vec::new();
    for stmt in &branch.body {
        if let Stmt::Expr(e) = stmt {
            facts.push(eval_expr(core, scope, branch_env, e, interner)?);
        } else {
            exec_stmt(core, scope, branch_env, stmt, interner)?;
        }
    }
    // The branch's optional cost is evaluated lazily at solver time in a
    // real backend; the reference backend has no search to feed it to, so
    // it's evaluated here only to surface type errors early.
    if let Some(cost) = &branch.cost {
        eval_expr(core, scope, branch_env, cost, interner)?;
    }
    if facts.is_empty() {
        Ok(core.new_bool(Some(true)))
    } else {
        Ok(core.conj(&facts))
    }
}

fn iteration_instances(core: &mut Core, ty: crate::types::TypeKey, interner: &Interner) -> RResult<Vec<crate::item::ItemKey>> {
    match core.types.get(ty).data.clone() {
        TypeData::Enum { .. } => {
            let values: Vec<String> = core.types.enum_values(ty).into_iter().collect();
            Ok(values.iter().map(|v| core.new_enum(ty, vec![v.clone()])).collect())
        }
        TypeData::Component { instances, .. } => Ok(instances),
        _ => Err(RiddleError::TypeMismatch {
            expected: "an enum or component type (for a for-all loop)".into(),
            found: interner.resolve(core.types.get(ty).name).to_string(),
            span: None,
        }),
    }
}

/// Executes a formula statement (§4.10 "Formula", six steps): walks an
/// optional formula scope to a receiver env and binds `tau` from it (or
/// inherits `tau` from the enclosing env when the scope is empty), resolves
/// the predicate, binds each argument by assignability (or prunes an enum
/// argument's domain), materializes the atom, fills any inherited parameter
/// still missing, and binds the atom under `name`.
#[allow(clippy::too_many_arguments)]
fn exec_formula(
    core: &mut Core,
    scope: ScopeKey,
    env: EnvKey,
    is_fact: bool,
    name: Symbol,
    formula_scope: &[Symbol],
    predicate: &crate::ast::TypeRef,
    args: &[crate::ast::FormulaArg],
    span: crate::token::Span,
    interner: &Interner,
) -> RResult<()> {
    let tau = if formula_scope.is_empty() {
        core.envs.get(env, Symbol::TAU)
    } else {
        let receiver_env = eval::resolve_receiver_env(core, env, formula_scope, interner).map_err(|e| with_span(e, span))?;
        let receiver = core.envs.get_here(receiver_env, Symbol::THIS).ok_or_else(|| RiddleError::TypeMismatch {
            expected: "a component (to receive a formula)".into(),
            found: "a scope with no receiving instance".into(),
            span: Some(span),
        })?;
        Some(receiver)
    };

    let pred_scope = match tau {
        Some(receiver) if !formula_scope.is_empty() => match &core.types.get(core.items.get(receiver).ty).data {
            TypeData::Component { scope, .. } => *scope,
            _ => scope,
        },
        _ => scope,
    };
    let pred_ty = resolve_predicate_ref(core, pred_scope, predicate, interner).map_err(|e| with_span(e, span))?;
    let (params, parents) = match &core.types.get(pred_ty).data {
        TypeData::Predicate { params, parents, .. } => (params.clone(), parents.clone()),
        _ => unreachable!("resolve_predicate_ref always yields a Predicate"),
    };

    let atom_env = core.envs.create(Some(env));
    if let Some(receiver) = tau {
        core.envs.bind(atom_env, Symbol::TAU, receiver);
    }
    for arg in args {
        let (_, param_ty) = params
            .iter()
            .find(|(n, _)| *n == arg.name)
            .ok_or_else(|| RiddleError::UnresolvedName { name: interner.resolve(arg.name).to_string(), span: Some(span), candidates: Vec::new() })?;
        let value = eval_expr(core, scope, env, &arg.value, interner)?;
        let value_ty = core.items.get(value).ty;
        if core.types.is_assignable(*param_ty, value_ty) {
            core.envs.bind(atom_env, arg.name, value);
        } else if let Some(domain) = core.items.domain(value) {
            let allowed = core.types.enum_values(*param_ty);
            let to_forbid: Vec<String> = domain.iter().filter(|v| !allowed.contains(*v)).cloned().collect();
            for v in to_forbid {
                core.items.forbid(value, &v);
            }
            core.envs.bind(atom_env, arg.name, value);
        } else {
            return Err(RiddleError::TypeMismatch {
                expected: interner.resolve(core.types.get(*param_ty).name).to_string(),
                found: interner.resolve(core.types.get(value_ty).name).to_string(),
                span: Some(span),
            });
        }
    }

    let atom_args: Vec<_> = params.iter().map(|(n, _)| core.envs.get_here(atom_env, *n)).collect();
    let atom_args: Vec<_> = if atom_args.iter().all(Option::is_some) {
        atom_args.into_iter().map(Option::unwrap).collect()
    } else {
        Vec::new()
    };
    let atom = core.new_atom(pred_ty, pred_ty, is_fact, atom_args, atom_env);

    for (param_name, param_ty) in params.iter().chain(inherited_params(core, &parents).iter()) {
        if core.envs.get_here(atom_env, *param_name).is_none() {
            let value = eval::new_instance(core, *param_ty, interner)?;
            core.envs.bind(atom_env, *param_name, value);
        }
    }

    core.envs.bind(env, name, atom);
    Ok(())
}

fn inherited_params(core: &Core, parents: &[crate::types::TypeKey]) -> Vec<(Symbol, crate::types::TypeKey)> {
    let mut out = Vec::new();
    for &p in parents {
        if let TypeData::Predicate { params, parents: grandparents, .. } = &core.types.get(p).data {
            out.extend(params.iter().cloned());
            out.extend(inherited_params(core, grandparents));
        }
    }
    out
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
    use crate::ast::{Binding, Expr, PrimitiveKind, TypeRef};
    use crate::token::Span;

    #[test]
    fn local_field_with_initializer_binds_the_evaluated_value() {
        let mut core = Core::with_reference_backend();
        let interner = Interner::new();
        let x = Symbol::THIS; // any pre-existing symbol works as a binding name here
        let stmt = Stmt::LocalField {
            ty: TypeRef::Primitive(PrimitiveKind::Int, Span::default()),
            bindings: vec![Binding { name: x, init: Some(Expr::IntLit(7, Span::default())) }],
            span: Span::default(),
        };
        exec_stmt(&mut core, core.root_scope, core.root_env, &stmt, &interner).unwrap();
        let bound = core.envs.get_here(core.root_env, x).unwrap();
        assert_eq!(core.items.arithmetic_value(bound).unwrap().value, crate::rational::Rational::from_integer(7));
    }

    #[test]
    fn expression_statement_asserts_a_fact() {
        let mut core = Core::with_reference_backend();
        let interner = Interner::new();
        let stmt = Stmt::Expr(Expr::BoolLit(true, Span::default()));
        assert!(exec_stmt(&mut core, core.root_scope, core.root_env, &stmt, &interner).is_ok());
    }

    #[test]
    fn return_statement_binds_under_return_and_stops_the_body() {
        let mut core = Core::with_reference_backend();
        let interner = Interner::new();
        let stmts = vec![Stmt::Return(Expr::IntLit(1, Span::default()), Span::default()), Stmt::Return(Expr::IntLit(2, Span::default()), Span::default())];
        let flow = exec_stmts(&mut core, core.root_scope, core.root_env, &stmts, &interner).unwrap();
        assert_eq!(flow, Flow::Returned);
        let bound = core.envs.get_here(core.root_env, Symbol::RETURN).unwrap();
        assert_eq!(core.items.arithmetic_value(bound).unwrap().value, crate::rational::Rational::from_integer(1));
    }
}
