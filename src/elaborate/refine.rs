//! Pass 2 — refine (§4.8): resolves parent lists, field/parameter/return
//! types, and builds constructor/method objects for every type declared in
//! the previous pass. Fails with `UnresolvedName` the moment a referenced
//! type cannot be found; nested types are refined in the same walk that
//! declared them.

use crate::ast::{CompilationUnit, ConstructorDecl, MethodDecl, TypeDecl};
use crate::core::Core;
use crate::error::{RResult, RiddleError};
use crate::intern::{Interner, Symbol};
use crate::scope::{Field, ScopeKey};
use crate::types::{ComponentConstructor, ComponentMethod, TypeData, TypeKey};
use crate::ast::TypeRef;

pub fn refine_unit(core: &mut Core, unit: &CompilationUnit, interner: &Interner) -> RResult<()> {
    for decl in &unit.types {
        refine_type_decl(core, core.root_scope, decl, interner)?;
    }
    for method in &unit.methods {
        let built = refine_method(core, core.root_scope, method, interner)?;
        core.core_methods.push(built);
    }
    Ok(())
}

/// Resolves a `TypeRef` from `scope`: the first path segment walks the
/// scope's local/inheritance/lexical-parent chain, and every further
/// segment is looked up as a nested type inside the component resolved so
/// far (§4.9 "Qualified id" uses the analogous walk over envs).
pub fn resolve_type_ref(core: &Core, scope: ScopeKey, ty: &TypeRef, interner: &Interner) -> RResult<TypeKey> {
    match ty {
        TypeRef::Primitive(kind, _) => Ok(core.types.primitive_key(*kind)),
        TypeRef::Named(path, span) => {
            let mut current = core.scopes.resolve_type(scope, path[0]).ok_or_else(|| RiddleError::UnresolvedName {
                name: interner.resolve(path[0]).to_string(),
                span: Some(*span),
                candidates: Vec::new(),
            })?;
            for seg in &path[1..] {
                let nested_scope = match &core.types.get(current).data {
                    TypeData::Component { scope, .. } => *scope,
                    _ => {
                        return Err(RiddleError::TypeMismatch {
                            expected: "a class type with nested members".into(),
                            found: interner.resolve(core.types.get(current).name).to_string(),
                            span: Some(*span),
                        })
                    }
                };
                current = core.scopes.resolve_type(nested_scope, *seg).ok_or_else(|| RiddleError::UnresolvedName {
                    name: interner.resolve(*seg).to_string(),
                    span: Some(*span),
                    candidates: Vec::new(),
                })?;
            }
            Ok(current)
        }
    }
}

fn refine_type_decl(core: &mut Core, scope: ScopeKey, decl: &TypeDecl, interner: &Interner) -> RResult<()> {
    let name = decl.name();
    let key = core.scopes.type_here(scope, name).expect("declare pass populated every type shell");

    match decl {
        TypeDecl::Typedef { base, expr, .. } => {
            let base_key = resolve_type_ref(core, scope, base, interner)?;
            core.types.get_mut(key).data = TypeData::Typedef { base: base_key, expr: expr.clone() };
        }
        TypeDecl::Enum { values, union_refs, .. } => {
            let mut refs = Vec::with_capacity(union_refs.len());
            for r in union_refs {
                refs.push(resolve_type_ref(core, scope, r, interner)?);
            }
            core.types.get_mut(key).data = TypeData::Enum { values: values.clone(), union_refs: refs };
        }
        TypeDecl::Class { parents, fields, constructors, methods, nested_types, .. } => {
            let class_scope = match &core.types.get(key).data {
                TypeData::Component { scope, .. } => *scope,
                _ => unreachable!("declare pass always inserts classes as Component shells"),
            };

            let mut parent_keys = Vec::with_capacity(parents.len());
            for parent_ref in parents {
                let parent_key = resolve_type_ref(core, scope, parent_ref, interner)?;
                let parent_scope = match &core.types.get(parent_key).data {
                    TypeData::Component { scope, .. } => *scope,
                    _ => {
                        return Err(RiddleError::TypeMismatch {
                            expected: "a class type".into(),
                            found: interner.resolve(core.types.get(parent_key).name).to_string(),
                            span: Some(parent_ref.span()),
                        })
                    }
                };
                core.scopes.add_inherit(class_scope, parent_scope);
                parent_keys.push(parent_key);
            }

            for field in fields {
                let field_ty = resolve_type_ref(core, class_scope, &field.ty, interner)?;
                core.scopes
                    .declare(class_scope, Field { name: field.name, ty: field_ty, span: field.span, default: field.init.clone() })
                    .map_err(|n| RiddleError::DuplicateName { name: interner.resolve(n).to_string(), span: Some(field.span) })?;
            }

            let mut built_ctors = Vec::with_capacity(constructors.len());
            for ctor in constructors {
                built_ctors.push(refine_constructor(core, class_scope, ctor, interner)?);
            }

            let mut built_methods = Vec::with_capacity(methods.len());
            for method in methods {
                built_methods.push(refine_method(core, class_scope, method, interner)?);
            }

            for nested in nested_types {
                refine_type_decl(core, class_scope, nested, interner)?;
            }

            if let TypeData::Component { parents, constructors, methods, nested_types: nested_keys, .. } = &mut core.types.get_mut(key).data {
                *parents = parent_keys;
                *constructors = built_ctors;
                *methods = built_methods;
                for nested in nested_types {
                    let nested_key = core.scopes.type_here(class_scope, nested.name()).expect("just refined");
                    nested_keys.push(nested_key);
                }
            }
        }
    }
    Ok(())
}

fn refine_constructor(core: &Core, class_scope: ScopeKey, decl: &ConstructorDecl, interner: &Interner) -> RResult<ComponentConstructor> {
    let mut params = Vec::with_capacity(decl.params.len());
    for p in &decl.params {
        params.push((p.name, resolve_type_ref(core, class_scope, &p.ty, interner)?));
    }
    Ok(ComponentConstructor { params, decl: std::rc::Rc::new(decl.clone()) })
}

fn refine_method(core: &Core, class_scope: ScopeKey, decl: &MethodDecl, interner: &Interner) -> RResult<ComponentMethod> {
    let mut params = Vec::with_capacity(decl.params.len());
    for p in &decl.params {
        params.push((p.name, resolve_type_ref(core, class_scope, &p.ty, interner)?));
    }
    let return_ty = match &decl.return_ty {
        Some(ty) => Some(resolve_type_ref(core, class_scope, ty, interner)?),
        None => None,
    };
    Ok(ComponentMethod { params, return_ty, scope: class_scope, decl: std::rc::Rc::new(decl.clone()) })
}

/// Resolves a dotted name already split by the parser, for call sites that
/// don't have a `TypeRef` handy (kept separate from `resolve_type_ref` so
/// the evaluator can reuse it without constructing one).
pub fn resolve_named_path(core: &Core, scope: ScopeKey, path: &[Symbol], interner: &Interner) -> RResult<TypeKey> {
    let span = None;
    let mut current = core.scopes.resolve_type(scope, path[0]).ok_or_else(|| RiddleError::UnresolvedName {
        name: interner.resolve(path[0]).to_string(),
        span,
        candidates: Vec::new(),
    })?;
    for seg in &path[1..] {
        let nested_scope = match &core.types.get(current).data {
            TypeData::Component { scope, .. } => *scope,
            _ => {
                return Err(RiddleError::TypeMismatch {
                    expected: "a class type with nested members".into(),
                    found: interner.resolve(core.types.get(current).name).to_string(),
                    span,
                })
            }
        };
        current = core.scopes.resolve_type(nested_scope, *seg).ok_or_else(|| RiddleError::UnresolvedName {
            name: interner.resolve(*seg).to_string(),
            span,
            candidates: Vec::new(),
        })?;
    }
    Ok(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Expr, Field as AstField, PrimitiveKind, TypeDecl, TypeRef};
    use crate::elaborate::declare::declare_unit;
    use crate::token::Span;

    #[test]
    fn typedef_refines_to_its_primitive_base() {
        let mut interner = Interner::new();
        let mut core = Core::with_reference_backend();
        let name = interner.intern("Duration");
        let unit = CompilationUnit {
            types: vec![TypeDecl::Typedef {
                name,
                base: TypeRef::Primitive(PrimitiveKind::Int, Span::default()),
                expr: Expr::IntLit(0, Span::default()),
                span: Span::default(),
            }],
            predicates: vec![],
            methods: vec![],
            body: vec![],
        };
        declare_unit(&mut core, &unit, &interner).unwrap();
        refine_unit(&mut core, &unit, &interner).unwrap();
        let key = core.scopes.type_here(core.root_scope, name).unwrap();
        assert_eq!(core.types.resolve_primitive(key), Some(PrimitiveKind::Int));
    }

    #[test]
    fn class_field_type_resolves_and_parent_is_inherited() {
        let mut interner = Interner::new();
        let mut core = Core::with_reference_backend();
        let base_name = interner.intern("Base");
        let derived_name = interner.intern("Derived");
        let field_name = interner.intern("x");
        let base = TypeDecl::Class {
            name: base_name,
            parents: vec![],
            fields: vec![AstField { name: field_name, ty: TypeRef::Primitive(PrimitiveKind::Int, Span::default()), init: None, span: Span::default() }],
            constructors: vec![],
            methods: vec![],
            predicates: vec![],
            nested_types: vec![],
            span: Span::default(),
        };
        let derived = TypeDecl::Class {
            name: derived_name,
            parents: vec![TypeRef::single(base_name, Span::default())],
            fields: vec![],
            constructors: vec![],
            methods: vec![],
            predicates: vec![],
            nested_types: vec![],
            span: Span::default(),
        };
        let unit = CompilationUnit { types: vec![base, derived], predicates: vec![], methods: vec![], body: vec![] };
        declare_unit(&mut core, &unit, &interner).unwrap();
        refine_unit(&mut core, &unit, &interner).unwrap();

        let derived_key = core.scopes.type_here(core.root_scope, derived_name).unwrap();
        let derived_scope = match &core.types.get(derived_key).data {
            TypeData::Component { scope, .. } => *scope,
            _ => panic!("expected component"),
        };
        assert!(core.scopes.resolve(derived_scope, field_name).is_some());
    }

    #[test]
    fn unresolved_base_type_fails_with_unresolved_name() {
        let mut interner = Interner::new();
        let mut core = Core::with_reference_backend();
        let name = interner.intern("Bogus");
        let unit = CompilationUnit {
            types: vec![TypeDecl::Typedef {
                name,
                base: TypeRef::single(interner.intern("DoesNotExist"), Span::default()),
                expr: Expr::IntLit(0, Span::default()),
                span: Span::default(),
            }],
            predicates: vec![],
            methods: vec![],
            body: vec![],
        };
        declare_unit(&mut core, &unit, &interner).unwrap();
        assert!(refine_unit(&mut core, &unit, &interner).is_err());
    }
}
