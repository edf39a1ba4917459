//! Pass 1 — declare (§4.8): inserts bare type shells for every typedef,
//! enum and class into their enclosing scope, recursing into nested types.
//! Predicate declarations at class scope get a shell too. Methods are not
//! declared here — they only exist once the refine pass has resolved their
//! parameter and return types.

use crate::ast::{CompilationUnit, TypeDecl};
use crate::core::Core;
use crate::error::RResult;
use crate::error::RiddleError;
use crate::intern::Interner;
use crate::scope::ScopeKey;
use crate::types::{TypeData, TypeInfo};

pub fn declare_unit(core: &mut Core, unit: &CompilationUnit, interner: &Interner) -> RResult<()> {
    for decl in &unit.types {
        declare_type_decl(core, core.root_scope, decl, interner)?;
    }
    for pred in &unit.predicates {
        declare_predicate_shell(core, core.root_scope, pred.name)?;
    }
    Ok(())
}

fn declare_type_decl(core: &mut Core, scope: ScopeKey, decl: &TypeDecl, interner: &Interner) -> RResult<()> {
    let name = decl.name();
    let span = match decl {
        TypeDecl::Typedef { span, .. } | TypeDecl::Enum { span, .. } | TypeDecl::Class { span, .. } => *span,
    };

    let key = match decl {
        TypeDecl::Typedef { .. } | TypeDecl::Enum { .. } => {
            core.types.insert(TypeInfo { name, span: Some(span), data: TypeData::Pending })
        }
        TypeDecl::Class { nested_types, .. } => {
            let class_scope = core.scopes.create(Some(scope));
            let key = core.types.insert(TypeInfo {
                name,
                span: Some(span),
                data: TypeData::Component {
                    parents: Vec::new(),
                    scope: class_scope,
                    constructors: Vec::new(),
                    methods: Vec::new(),
                    predicates: Vec::new(),
                    nested_types: Vec::new(),
                    instances: Vec::new(),
                },
            });
            for nested in nested_types {
                declare_type_decl(core, class_scope, nested, interner)?;
            }
            key
        }
    };

    core.scopes.declare_type(scope, name, key).map_err(|_| RiddleError::DuplicateName {
        name: interner.resolve(name).to_string(),
        span: Some(span),
    })?;

    if let TypeDecl::Class { predicates, .. } = decl {
        let class_scope = match &core.types.get(key).data {
            TypeData::Component { scope, .. } => *scope,
            _ => unreachable!("just inserted as Component"),
        };
        for pred in predicates {
            declare_predicate_shell(core, class_scope, pred.name)?;
        }
    }

    Ok(())
}

fn declare_predicate_shell(core: &mut Core, scope: ScopeKey, name: crate::intern::Symbol) -> RResult<()> {
    let pred_scope = core.scopes.create(Some(scope));
    let key = core.types.insert(TypeInfo {
        name,
        span: None,
        data: TypeData::Predicate { params: Vec::new(), parents: Vec::new(), scope: pred_scope, body: std::rc::Rc::new(Vec::new()) },
    });
    core.scopes.declare_predicate(scope, name, key).map_err(|n| RiddleError::DuplicateName { name: format!("{:?}", n), span: None })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::*;
    use crate::token::Span;

    #[test]
    fn declare_inserts_class_shell_with_fresh_scope() {
        let mut interner = Interner::new();
        let mut core = Core::with_reference_backend();
        let name = interner.intern("Location");
        let unit = CompilationUnit {
            types: vec![TypeDecl::Class {
                name,
                parents: vec![],
                fields: vec![],
                constructors: vec![],
                methods: vec![],
                predicates: vec![],
                nested_types: vec![],
                span: Span::default(),
            }],
            predicates: vec![],
            methods: vec![],
            body: vec![],
        };
        declare_unit(&mut core, &unit, &interner).unwrap();
        let found = core.scopes.resolve_type(core.root_scope, name);
        assert!(found.is_some());
    }

    #[test]
    fn redeclaring_the_same_type_name_is_an_error() {
        let mut interner = Interner::new();
        let mut core = Core::with_reference_backend();
        let name = interner.intern("Foo");
        let make_class = || TypeDecl::Class {
            name,
            parents: vec![],
            fields: vec![],
            constructors: vec![],
            methods: vec![],
            predicates: vec![],
            nested_types: vec![],
            span: Span::default(),
        };
        let unit = CompilationUnit { types: vec![make_class(), make_class()], predicates: vec![], methods: vec![], body: vec![] };
        assert!(declare_unit(&mut core, &unit, &interner).is_err());
    }
}
