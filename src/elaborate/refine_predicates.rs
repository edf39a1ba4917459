//! Pass 3 — refine_predicates (§4.8): resolves predicate parent lists and
//! parameter types. Runs after every unit has seen `refine`, since a
//! predicate's parents and parameter types may name classes declared in any
//! unit.

use crate::ast::{CompilationUnit, PredicateDecl, TypeDecl, TypeRef};
use crate::core::Core;
use crate::elaborate::refine::resolve_type_ref;
use crate::error::{RResult, RiddleError};
use crate::intern::Interner;
use crate::scope::{Field, ScopeKey};
use crate::types::{TypeData, TypeKey};

pub fn refine_predicates_unit(core: &mut Core, unit: &CompilationUnit, interner: &Interner) -> RResult<()> {
    for pred in &unit.predicates {
        refine_predicate_decl(core, core.root_scope, pred, interner)?;
    }
    refine_predicates_in_types(core, core.root_scope, &unit.types, interner)?;
    Ok(())
}

fn refine_predicates_in_types(core: &mut Core, scope: ScopeKey, types: &[TypeDecl], interner: &Interner) -> RResult<()> {
    for decl in types {
        if let TypeDecl::Class { name, predicates, nested_types, .. } = decl {
            let class_key = core.scopes.type_here(scope, *name).expect("refine pass already resolved this class");
            let class_scope = match &core.types.get(class_key).data {
                TypeData::Component { scope, .. } => *scope,
                _ => unreachable!(),
            };
            for pred in predicates {
                refine_predicate_decl(core, class_scope, pred, interner)?;
            }
            let pred_keys: Vec<TypeKey> = predicates
                .iter()
                .map(|p| core.scopes.predicate_here(class_scope, p.name).expect("just refined"))
                .collect();
            if let TypeData::Component { predicates, .. } = &mut core.types.get_mut(class_key).data {
                *predicates = pred_keys;
            }
            refine_predicates_in_types(core, class_scope, nested_types, interner)?;
        }
    }
    Ok(())
}

/// Resolves a predicate-name `TypeRef` (used for a predicate's `parents`
/// list): the first segment walks the predicate namespace, any further
/// segment walks nested types as ordinary type names, per
/// `resolve_type_ref`.
pub fn resolve_predicate_ref(core: &Core, scope: ScopeKey, ty: &TypeRef, interner: &Interner) -> RResult<TypeKey> {
    let TypeRef::Named(path, span) = ty else {
        return Err(RiddleError::TypeMismatch { expected: "a predicate name".into(), found: "a primitive type".into(), span: Some(ty.span()) });
    };
    if path.len() == 1 {
        return core.scopes.resolve_predicate(scope, path[0]).ok_or_else(|| RiddleError::UnresolvedName {
            name: interner.resolve(path[0]).to_string(),
            span: Some(*span),
            candidates: Vec::new(),
        });
    }
    let holder = crate::elaborate::refine::resolve_named_path(core, scope, &path[..path.len() - 1], interner)?;
    let holder_scope = match &core.types.get(holder).data {
        TypeData::Component { scope, .. } => *scope,
        _ => {
            return Err(RiddleError::TypeMismatch {
                expected: "a class holding a predicate".into(),
                found: interner.resolve(core.types.get(holder).name).to_string(),
                span: Some(*span),
            })
        }
    };
    let last = *path.last().unwrap();
    core.scopes.resolve_predicate(holder_scope, last).ok_or_else(|| RiddleError::UnresolvedName {
        name: interner.resolve(last).to_string(),
        span: Some(*span),
        candidates: Vec::new(),
    })
}

fn refine_predicate_decl(core: &mut Core, scope: ScopeKey, decl: &PredicateDecl, interner: &Interner) -> RResult<()> {
    let key = core.scopes.predicate_here(scope, decl.name).expect("declare pass populated every predicate shell");
    let pred_scope = match &core.types.get(key).data {
        TypeData::Predicate { scope, .. } => *scope,
        _ => unreachable!("declare pass always inserts predicates as Predicate shells"),
    };

    let mut parents = Vec::with_capacity(decl.parents.len());
    for p in &decl.parents {
        parents.push(resolve_predicate_ref(core, scope, p, interner)?);
    }

    let mut params = Vec::with_capacity(decl.params.len());
    for p in &decl.params {
        let ty = resolve_type_ref(core, scope, &p.ty, interner)?;
        core.scopes
            .declare(pred_scope, Field { name: p.name, ty, span: decl.span, default: None })
            .map_err(|n| RiddleError::DuplicateName { name: interner.resolve(n).to_string(), span: Some(decl.span) })?;
        params.push((p.name, ty));
    }

    core.types.get_mut(key).data = TypeData::Predicate { params, parents, scope: pred_scope, body: decl.body.clone() };
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{CompilationUnit as Unit, Param, PrimitiveKind};
    use crate::elaborate::declare::declare_unit;
    use crate::elaborate::refine::refine_unit;
    use crate::token::Span;

    #[test]
    fn predicate_parameter_type_resolves() {
        let mut interner = Interner::new();
        let mut core = Core::with_reference_backend();
        let name = interner.intern("At");
        let arg_name = interner.intern("loc");
        let unit = Unit {
            types: vec![],
            predicates: vec![PredicateDecl {
                name,
                params: vec![Param { name: arg_name, ty: TypeRef::Primitive(PrimitiveKind::Int, Span::default()) }],
                parents: vec![],
                body: std::rc::Rc::new(vec![]),
                span: Span::default(),
            }],
            methods: vec![],
            body: vec![],
        };
        declare_unit(&mut core, &unit, &interner).unwrap();
        refine_unit(&mut core, &unit, &interner).unwrap();
        refine_predicates_unit(&mut core, &unit, &interner).unwrap();

        let key = core.scopes.predicate_here(core.root_scope, name).unwrap();
        match &core.types.get(key).data {
            TypeData::Predicate { params, .. } => assert_eq!(params.len(), 1),
            _ => panic!("expected predicate"),
        }
    }

    #[test]
    fn unresolved_parent_predicate_is_an_error() {
        let mut interner = Interner::new();
        let mut core = Core::with_reference_backend();
        let name = interner.intern("At");
        let unit = Unit {
            types: vec![],
            predicates: vec![PredicateDecl {
                name,
                params: vec![],
                parents: vec![TypeRef::single(interner.intern("Nope"), Span::default())],
                body: std::rc::Rc::new(vec![]),
                span: Span::default(),
            }],
            methods: vec![],
            body: vec![],
        };
        declare_unit(&mut core, &unit, &interner).unwrap();
        refine_unit(&mut core, &unit, &interner).unwrap();
        assert!(refine_predicates_unit(&mut core, &unit, &interner).is_err());
    }
}
