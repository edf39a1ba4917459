//! Expression evaluation (§4.9), statement execution (§4.10) and
//! constructor/method invocation (§4.6, §4.7) — the part of the frontend
//! that walks an elaborated AST against a live `(scope, env)` pair and
//! drives the solver backend through `core`.

pub mod expr;
pub mod stmt;

use crate::core::Core;
use crate::env::EnvKey;
use crate::error::{RResult, RiddleError};
use crate::intern::{Interner, Symbol};
use crate::item::{ItemData, ItemInfo, ItemKey};
use crate::scope::{Field, ScopeKey};
use crate::types::{ComponentConstructor, ComponentMethod, TypeData, TypeKey};

/// First constructor on `ty` whose arity and per-parameter assignability
/// match `arg_types` — ambiguity is not resolved, first match wins (§4.3
/// "get_method", reused for constructor overload selection per §4.6).
pub fn resolve_constructor(core: &Core, ty: TypeKey, arg_types: &[TypeKey]) -> Option<ComponentConstructor> {
    let TypeData::Component { constructors, .. } = &core.types.get(ty).data else {
        return None;
    };
    constructors
        .iter()
        .find(|c| c.params.len() == arg_types.len() && c.params.iter().zip(arg_types).all(|((_, p), a)| core.types.is_assignable(*p, *a)))
        .cloned()
}

/// Finds a method by name and assignable argument types on `ty`, then its
/// parents recursively (§4.5 "Component type" — local maps first, then
/// each parent).
pub fn resolve_method(core: &Core, ty: TypeKey, name: Symbol, arg_types: &[TypeKey]) -> Option<ComponentMethod> {
    let TypeData::Component { methods, parents, .. } = &core.types.get(ty).data else {
        return None;
    };
    if let Some(m) = methods
        .iter()
        .find(|m| m.decl.name == name && m.params.len() == arg_types.len() && m.params.iter().zip(arg_types).all(|((_, p), a)| core.types.is_assignable(*p, *a)))
    {
        return Some(m.clone());
    }
    for &parent in parents {
        if let Some(m) = resolve_method(core, parent, name, arg_types) {
            return Some(m);
        }
    }
    None
}

/// A free function: same lookup as `resolve_method` but over
/// `core.core_methods` rather than a receiver type's method list (§4.9
/// "Function call ... or on core for free functions").
pub fn resolve_core_method(core: &Core, name: Symbol, arg_types: &[TypeKey]) -> Option<ComponentMethod> {
    core.core_methods
        .iter()
        .find(|m| m.decl.name == name && m.params.len() == arg_types.len() && m.params.iter().zip(arg_types).all(|((_, p), a)| core.types.is_assignable(*p, *a)))
        .cloned()
}

/// The type's own `new_instance()` (§4.5): a fresh symbolic value for
/// primitives, a fresh literal-domain enum item, or — for a component type
/// — the most recent instance on file, per the local-field binding rule in
/// §4.10 (zero instances is `Inconsistency`, exactly one binds directly,
/// more than one binds a fresh enum over them is handled by the caller,
/// since only the caller knows whether it's in "no initializer" context).
pub fn new_instance(core: &mut Core, ty: TypeKey, interner: &Interner) -> RResult<ItemKey> {
    match core.types.get(ty).data.clone_shape() {
        TypeShape::Primitive(kind) => Ok(new_symbolic_primitive(core, ty, kind)),
        TypeShape::Typedef { base, expr } => {
            let fresh_env = core.envs.create(Some(core.root_env));
            crate::eval::expr::eval_expr(core, core.root_scope, fresh_env, &expr, interner).map(|item| retag(core, item, ty)).or_else(|_| Ok(new_instance(core, base, interner)?))
        }
        TypeShape::Enum => {
            let domain: Vec<String> = core.types.enum_values(ty).into_iter().collect();
            Ok(core.new_enum(ty, domain))
        }
        TypeShape::Component => instance_on_file(core, ty, interner),
        TypeShape::Predicate => Err(RiddleError::NotImplemented { what: "predicates do not have instances".into() }),
    }
}

fn new_symbolic_primitive(core: &mut Core, _ty: TypeKey, kind: crate::ast::PrimitiveKind) -> ItemKey {
    use crate::ast::PrimitiveKind::*;
    match kind {
        Bool => core.new_bool(None),
        Int => core.new_int(None),
        Real => core.new_real(None),
        Time => core.new_time(None),
        String => core.new_string(None),
    }
}

fn retag(core: &mut Core, item: ItemKey, ty: TypeKey) -> ItemKey {
    core.items.get_mut(item).ty = ty;
    item
}

fn instance_on_file(core: &mut Core, ty: TypeKey, interner: &Interner) -> RResult<ItemKey> {
    let TypeData::Component { instances, .. } = &core.types.get(ty).data else {
        unreachable!("instance_on_file called on a non-component type")
    };
    match instances.len() {
        0 => Err(RiddleError::Inconsistency { field: interner.resolve(core.types.get(ty).name).to_string(), span: None }),
        1 => Ok(instances[0]),
        _ => {
            let alternatives: Vec<ItemKey> = instances.clone();
            Ok(core.items.insert(ItemInfo { ty, data: ItemData::Enum { domain: alternatives.iter().map(|k| format!("#{:?}", k)).collect() } }))
        }
    }
}

/// A cheap, ownership-free view of a `TypeData`'s shape, used so
/// `new_instance` can match without holding a borrow of `core.types`
/// across the mutating calls it needs to make.
enum TypeShape {
    Primitive(crate::ast::PrimitiveKind),
    Typedef { base: TypeKey, expr: crate::ast::Expr },
    Enum,
    Component,
    Predicate,
}

trait ClonedShape {
    fn clone_shape(&self) -> TypeShape;
}

impl ClonedShape for TypeData {
    fn clone_shape(&self) -> TypeShape {
        match self {
            TypeData::Pending => unreachable!("Pending types never survive past refine"),
            TypeData::Primitive(k) => TypeShape::Primitive(*k),
            TypeData::Typedef { base, expr } => TypeShape::Typedef { base: *base, expr: expr.clone() },
            TypeData::Enum { .. } => TypeShape::Enum,
            TypeData::Component { .. } => TypeShape::Component,
            TypeData::Predicate { .. } => TypeShape::Predicate,
        }
    }
}

/// Walks a qualified env path (§4.9 "Qualified id"): every non-last
/// segment must resolve to a `Component` item (itself an env); the last
/// segment is looked up in that env.
pub fn eval_path(core: &Core, env: EnvKey, path: &[Symbol], interner: &Interner) -> RResult<ItemKey> {
    let mut current_env = env;
    for seg in &path[..path.len() - 1] {
        let item = core.envs.get(current_env, *seg).ok_or_else(|| RiddleError::UnresolvedName {
            name: interner.resolve(*seg).to_string(),
            span: None,
            candidates: Vec::new(),
        })?;
        match &core.items.get(item).data {
            ItemData::Component { env: next } => current_env = *next,
            _ => {
                return Err(RiddleError::TypeMismatch {
                    expected: "a component (so its fields can be reached)".into(),
                    found: interner.resolve(*seg).to_string(),
                    span: None,
                })
            }
        }
    }
    let last = *path.last().expect("path is non-empty");
    core.envs.get(current_env, last).ok_or_else(|| RiddleError::UnresolvedName { name: interner.resolve(last).to_string(), span: None, candidates: Vec::new() })
}

/// Like [`eval_path`] but returns the env the last segment lives in rather
/// than the item itself — used for assignment and method-call receivers.
pub fn resolve_receiver_env(core: &Core, env: EnvKey, path: &[Symbol], interner: &Interner) -> RResult<EnvKey> {
    let mut current_env = env;
    for seg in path {
        let item = core.envs.get(current_env, *seg).ok_or_else(|| RiddleError::UnresolvedName {
            name: interner.resolve(*seg).to_string(),
            span: None,
            candidates: Vec::new(),
        })?;
        match &core.items.get(item).data {
            ItemData::Component { env: next } => current_env = *next,
            _ => {
                return Err(RiddleError::TypeMismatch {
                    expected: "a component (so its fields can be reached)".into(),
                    found: interner.resolve(*seg).to_string(),
                    span: None,
                })
            }
        }
    }
    Ok(current_env)
}

/// Invokes `ctor` on a freshly allocated instance of `class_ty` (§4.6
/// "Constructor"): allocates the instance env, registers it in the type's
/// `instances`, then runs the shared init/field/body machinery.
pub fn invoke_constructor(core: &mut Core, class_ty: TypeKey, ctor: &ComponentConstructor, args: &[ItemKey], interner: &Interner) -> RResult<ItemKey> {
    let instance_env = core.envs.create(Some(core.root_env));
    let instance = core.items.insert(ItemInfo { ty: class_ty, data: ItemData::Component { env: instance_env } });
    core.envs.bind(instance_env, Symbol::THIS, instance);
    if let TypeData::Component { instances, .. } = &mut core.types.get_mut(class_ty).data {
        instances.push(instance);
    }
    invoke_constructor_into(core, class_ty, ctor, args, instance_env, interner)?;
    Ok(instance)
}

/// Runs `ctor`'s init list, field synthesis and body against an
/// already-allocated `instance_env` — used both for a direct `new T(...)`
/// call and for a base-constructor call from a derived class's init list,
/// where the base constructor must act on the same instance through shared
/// `this` rather than minting a second one (§4.6, step 4 "base-constructor
/// call").
fn invoke_constructor_into(
    core: &mut Core,
    class_ty: TypeKey,
    ctor: &ComponentConstructor,
    args: &[ItemKey],
    instance_env: EnvKey,
    interner: &Interner,
) -> RResult<()> {
    let class_scope = match &core.types.get(class_ty).data {
        TypeData::Component { scope, .. } => *scope,
        _ => unreachable!("invoke_constructor_into called on a non-component type"),
    };

    let call_env = core.envs.create(Some(instance_env));
    for (&(name, _), &arg) in ctor.params.iter().zip(args) {
        core.envs.bind(call_env, name, arg);
    }

    for elem in &ctor.decl.inits {
        apply_init_elem(core, class_ty, class_scope, instance_env, call_env, elem, interner)?;
    }

    let declared_fields: Vec<Field> = core.scopes.fields_here(class_scope).cloned().collect();
    for field in &declared_fields {
        if core.envs.get_here(instance_env, field.name).is_some() {
            continue;
        }
        let value = match &field.default {
            Some(init) => crate::eval::expr::eval_expr(core, class_scope, call_env, init, interner)?,
            None => new_instance(core, field.ty, interner)?,
        };
        core.envs.bind(instance_env, field.name, value);
    }

    crate::eval::stmt::exec_stmts(core, class_scope, call_env, &ctor.decl.body, interner)?;
    Ok(())
}

/// One init-list element (§4.6, step 4): a field initializer if `elem.name`
/// names a field of `class_ty`, otherwise a base-constructor call if it
/// names one of `class_ty`'s parents.
fn apply_init_elem(
    core: &mut Core,
    class_ty: TypeKey,
    class_scope: ScopeKey,
    instance_env: EnvKey,
    call_env: EnvKey,
    elem: &crate::ast::InitElem,
    interner: &Interner,
) -> RResult<()> {
    if let Some(field) = core.scopes.field_here(class_scope, elem.name).cloned() {
        let value = if core.types.resolve_primitive(field.ty).is_some() {
            let arg = elem.args.first().ok_or_else(|| RiddleError::TypeMismatch {
                expected: "one initializer argument".into(),
                found: "none".into(),
                span: Some(elem.span),
            })?;
            crate::eval::expr::eval_expr(core, class_scope, call_env, arg, interner)?
        } else {
            let arg_items = crate::eval::expr::eval_args(core, class_scope, call_env, &elem.args, interner)?;
            let arg_types: Vec<_> = arg_items.iter().map(|&a| core.items.get(a).ty).collect();
            let ctor = resolve_constructor(core, field.ty, &arg_types).ok_or_else(|| RiddleError::TypeMismatch {
                expected: format!("a constructor of {} matching the given arguments", interner.resolve(core.types.get(field.ty).name)),
                found: format!("{} argument(s)", arg_items.len()),
                span: Some(elem.span),
            })?;
            invoke_constructor(core, field.ty, &ctor, &arg_items, interner)?
        };
        core.envs.bind(instance_env, elem.name, value);
        return Ok(());
    }

    let parents = match &core.types.get(class_ty).data {
        TypeData::Component { parents, .. } => parents.clone(),
        _ => unreachable!(),
    };
    let parent_ty = parents
        .into_iter()
        .find(|&p| core.types.get(p).name == elem.name)
        .ok_or_else(|| RiddleError::UnresolvedName { name: interner.resolve(elem.name).to_string(), span: Some(elem.span), candidates: Vec::new() })?;

    let arg_items = crate::eval::expr::eval_args(core, class_scope, call_env, &elem.args, interner)?;
    let arg_types: Vec<_> = arg_items.iter().map(|&a| core.items.get(a).ty).collect();
    let ctor = resolve_constructor(core, parent_ty, &arg_types).ok_or_else(|| RiddleError::TypeMismatch {
        expected: format!("a constructor of {} matching the given arguments", interner.resolve(core.types.get(parent_ty).name)),
        found: format!("{} argument(s)", arg_items.len()),
        span: Some(elem.span),
    })?;
    invoke_constructor_into(core, parent_ty, &ctor, &arg_items, instance_env, interner)
}

/// Invokes `method` with `receiver_env` as the env whose child sees the
/// bound parameters (§4.7 "Method"): for a bound method this is the
/// instance env (so `this`-qualified field access resolves), for a free
/// function it's `core.root_env`.
pub fn invoke_method(core: &mut Core, receiver_env: EnvKey, method: &ComponentMethod, args: &[ItemKey], interner: &Interner) -> RResult<ItemKey> {
    let call_env = core.envs.create(Some(receiver_env));
    for (&(name, _), &arg) in method.params.iter().zip(args) {
        core.envs.bind(call_env, name, arg);
    }
    crate::eval::stmt::exec_stmts(core, method.scope, call_env, &method.decl.body, interner)?;
    match method.return_ty {
        Some(_) => core.envs.get_here(call_env, Symbol::RETURN).ok_or_else(|| RiddleError::Inconsistency {
            field: interner.resolve(method.decl.name).to_string(),
            span: Some(method.decl.span),
        }),
        None => Ok(core.new_bool(Some(true))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::PrimitiveKind;

    #[test]
    fn new_instance_of_a_primitive_is_symbolic() {
        let mut core = Core::with_reference_backend();
        let interner = Interner::new();
        let ty = core.types.primitive_key(PrimitiveKind::Int);
        let item = new_instance(&mut core, ty, &interner).unwrap();
        assert!(!core.items.is_constant(item));
    }
}
