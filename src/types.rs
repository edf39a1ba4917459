//! The type graph (§4.5): the five primitive types, plus typedef, enum and
//! class/component declarations, resolved by the elaborator's declare/refine
//! passes into a `slotmap` arena. Keying types by `TypeKey` rather than
//! `Rc`/`Weak` lets a class field reference its own enclosing class (and an
//! enum reference another enum via `union_refs`) without reference cycles
//! (§9 "Design notes").

use crate::ast::{self, ConstructorDecl, MethodDecl, PrimitiveKind};
use crate::intern::Symbol;
use crate::scope::ScopeKey;
use crate::token::Span;
use slotmap::{new_key_type, SlotMap};
use std::collections::HashSet;
use std::rc::Rc;

new_key_type! { pub struct TypeKey; }

#[derive(Debug, Clone)]
pub struct ComponentConstructor {
    pub params: Vec<(Symbol, TypeKey)>,
    pub decl: Rc<ConstructorDecl>,
}

#[derive(Debug, Clone)]
pub struct ComponentMethod {
    pub params: Vec<(Symbol, TypeKey)>,
    pub return_ty: Option<TypeKey>,
    /// The declaring class's scope, so the body can resolve sibling types
    /// and predicates declared in its own enclosing class rather than root.
    pub scope: ScopeKey,
    pub decl: Rc<MethodDecl>,
}

#[derive(Debug, Clone)]
pub enum TypeData {
    /// A bare shell inserted by the declare pass (§4.8): the name and kind
    /// are known, but parents/fields/methods are not resolved yet. Replaced
    /// in place by the refine pass; never seen past elaboration.
    Pending,
    Primitive(PrimitiveKind),
    /// `typedef BaseType name = expr;` — `expr` is re-evaluated, never
    /// memoized, each time the typedef is referenced (§4.5 "Typedef").
    Typedef { base: TypeKey, expr: ast::Expr },
    /// `enum name { "v", ... } or Other;` — `union_refs` transitively
    /// pulls in another enum's values (§4.5 "Enum").
    Enum { values: Vec<String>, union_refs: Vec<TypeKey> },
    Component {
        parents: Vec<TypeKey>,
        scope: ScopeKey,
        constructors: Vec<ComponentConstructor>,
        methods: Vec<ComponentMethod>,
        /// Nested predicate types declared directly inside this class.
        predicates: Vec<TypeKey>,
        nested_types: Vec<TypeKey>,
        /// Every instance ever allocated via `new_instance` (§4.5 "Component
        /// type"), in allocation order — a local field with no initializer
        /// binds to this list rather than minting a fresh instance.
        instances: Vec<crate::item::ItemKey>,
    },
    Predicate {
        params: Vec<(Symbol, TypeKey)>,
        parents: Vec<TypeKey>,
        scope: ScopeKey,
        body: Rc<Vec<ast::Stmt>>,
    },
}

#[derive(Debug, Clone)]
pub struct TypeInfo {
    pub name: Symbol,
    pub span: Option<Span>,
    pub data: TypeData,
}

pub struct TypeArena {
    types: SlotMap<TypeKey, TypeInfo>,
    pub bool_ty: TypeKey,
    pub int_ty: TypeKey,
    pub real_ty: TypeKey,
    pub time_ty: TypeKey,
    pub string_ty: TypeKey,
}

impl TypeArena {
    pub fn new() -> Self {
        let mut types = SlotMap::with_key();
        let mut prim = |kind: PrimitiveKind| {
            types.insert(TypeInfo { name: Symbol::EMPTY, span: None, data: TypeData::Primitive(kind) })
        };
        let bool_ty = prim(PrimitiveKind::Bool);
        let int_ty = prim(PrimitiveKind::Int);
        let real_ty = prim(PrimitiveKind::Real);
        let time_ty = prim(PrimitiveKind::Time);
        let string_ty = prim(PrimitiveKind::String);
        TypeArena { types, bool_ty, int_ty, real_ty, time_ty, string_ty }
    }

    pub fn primitive_key(&self, kind: PrimitiveKind) -> TypeKey {
        match kind {
            PrimitiveKind::Bool => self.bool_ty,
            PrimitiveKind::Int => self.int_ty,
            PrimitiveKind::Real => self.real_ty,
            PrimitiveKind::Time => self.time_ty,
            PrimitiveKind::String => self.string_ty,
        }
    }

    pub fn insert(&mut self, info: TypeInfo) -> TypeKey {
        self.types.insert(info)
    }

    pub fn get(&self, key: TypeKey) -> &TypeInfo {
        &self.types[key]
    }

    pub fn get_mut(&mut self, key: TypeKey) -> &mut TypeInfo {
        &mut self.types[key]
    }

    /// Follows a chain of `Typedef`s down to the primitive kind they
    /// ultimately constrain, if any.
    pub fn resolve_primitive(&self, key: TypeKey) -> Option<PrimitiveKind> {
        match &self.types[key].data {
            TypeData::Primitive(kind) => Some(*kind),
            TypeData::Typedef { base, .. } => self.resolve_primitive(*base),
            _ => None,
        }
    }

    /// The full, transitively unioned value set of an enum type (§4.5
    /// "Enum" — `union_refs` recursion).
    pub fn enum_values(&self, key: TypeKey) -> HashSet<String> {
        let mut seen = HashSet::new();
        self.collect_enum_values(key, &mut seen);
        seen
    }

    fn collect_enum_values(&self, key: TypeKey, out: &mut HashSet<String>) {
        if let TypeData::Enum { values, union_refs } = &self.types[key].data {
            out.extend(values.iter().cloned());
            for &r in union_refs {
                self.collect_enum_values(r, out);
            }
        }
    }

    /// Assignability (§4.5): identical types are always assignable; among
    /// primitives, `real` accepts `int`/`time` and `time` accepts
    /// `int`/`real`, asymmetrically (`int` accepts neither); among enums,
    /// the source's values must be a subset of the target's.
    pub fn is_assignable(&self, target: TypeKey, source: TypeKey) -> bool {
        if target == source {
            return true;
        }
        match (self.resolve_primitive(target), self.resolve_primitive(source)) {
            (Some(t), Some(s)) => is_primitive_assignable(t, s),
            _ => match (&self.types[target].data, &self.types[source].data) {
                (TypeData::Enum { .. }, TypeData::Enum { .. }) => {
                    self.enum_values(source).is_subset(&self.enum_values(target))
                }
                _ => false,
            },
        }
    }
}

impl Default for TypeArena {
    fn default() -> Self {
        Self::new()
    }
}

fn is_primitive_assignable(target: PrimitiveKind, source: PrimitiveKind) -> bool {
    use PrimitiveKind::*;
    if target == source {
        return true;
    }
    matches!((target, source), (Real, Int) | (Real, Time) | (Time, Int) | (Time, Real))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn real_accepts_int_and_time_but_int_accepts_neither() {
        let arena = TypeArena::new();
        assert!(arena.is_assignable(arena.real_ty, arena.int_ty));
        assert!(arena.is_assignable(arena.real_ty, arena.time_ty));
        assert!(arena.is_assignable(arena.time_ty, arena.int_ty));
        assert!(arena.is_assignable(arena.time_ty, arena.real_ty));
        assert!(!arena.is_assignable(arena.int_ty, arena.real_ty));
        assert!(!arena.is_assignable(arena.int_ty, arena.time_ty));
    }

    #[test]
    fn bool_and_string_are_only_assignable_from_themselves() {
        let arena = TypeArena::new();
        assert!(!arena.is_assignable(arena.bool_ty, arena.int_ty));
        assert!(!arena.is_assignable(arena.string_ty, arena.bool_ty));
        assert!(arena.is_assignable(arena.bool_ty, arena.bool_ty));
    }

    #[test]
    fn typedef_resolves_through_to_its_primitive_base() {
        let mut arena = TypeArena::new();
        let expr = ast::Expr::IntLit(0, Span::default());
        let duration = arena.insert(TypeInfo { name: Symbol::EMPTY, span: None, data: TypeData::Typedef { base: arena.int_ty, expr } });
        assert_eq!(arena.resolve_primitive(duration), Some(PrimitiveKind::Int));
        assert!(arena.is_assignable(arena.real_ty, duration));
    }

    #[test]
    fn enum_union_refs_are_transitively_collected() {
        let mut arena = TypeArena::new();
        let base = arena.insert(TypeInfo {
            name: Symbol::EMPTY,
            span: None,
            data: TypeData::Enum { values: vec!["spring".into()], union_refs: vec![] },
        });
        let extended = arena.insert(TypeInfo {
            name: Symbol::EMPTY,
            span: None,
            data: TypeData::Enum { values: vec!["winter".into()], union_refs: vec![base] },
        });
        let values = arena.enum_values(extended);
        assert!(values.contains("spring"));
        assert!(values.contains("winter"));
    }

    #[test]
    fn enum_assignable_only_when_source_values_are_a_subset() {
        let mut arena = TypeArena::new();
        let wide = arena.insert(TypeInfo {
            name: Symbol::EMPTY,
            span: None,
            data: TypeData::Enum { values: vec!["a".into(), "b".into()], union_refs: vec![] },
        });
        let narrow = arena.insert(TypeInfo {
            name: Symbol::EMPTY,
            span: None,
            data: TypeData::Enum { values: vec!["a".into()], union_refs: vec![] },
        });
        assert!(arena.is_assignable(wide, narrow));
        assert!(!arena.is_assignable(narrow, wide));
    }
}
