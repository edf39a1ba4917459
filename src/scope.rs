//! Lexical scope graph (§4.3). Each declaration context — a class body, a
//! predicate body, a method body — is a node holding a name → [`Field`]
//! map plus a lexical parent pointer. Component and predicate scopes also
//! carry an `inherits` list: other scopes searched, in declaration order,
//! before falling back to the lexical parent (§4.3 "inheritance-chain
//! fallback").
//!
//! Scopes are never freed while their owning `Core` is alive and are
//! cross-referenced from `types` and `item`, so they live in a `slotmap`
//! arena keyed by [`ScopeKey`] rather than behind `Rc`/`Weak` (§9).

use crate::ast::Expr;
use crate::intern::Symbol;
use crate::token::Span;
use crate::types::TypeKey;
use slotmap::{new_key_type, SlotMap};
use std::collections::HashMap;

new_key_type! { pub struct ScopeKey; }

#[derive(Debug, Clone)]
pub struct Field {
    pub name: Symbol,
    pub ty: TypeKey,
    pub span: Span,
    /// The field's declared initializer, if any — re-evaluated fresh by the
    /// constructor whenever no init-list element or argument bound it
    /// (§4.6 "Constructor", step 5).
    pub default: Option<Expr>,
}

#[derive(Debug, Default)]
pub struct ScopeNode {
    pub parent: Option<ScopeKey>,
    pub inherits: Vec<ScopeKey>,
    fields: HashMap<Symbol, Field>,
    /// Typedef/enum/class shells declared directly in this scope (§4.8 "declare").
    types: HashMap<Symbol, TypeKey>,
    /// Predicate shells declared directly in this scope.
    predicates: HashMap<Symbol, TypeKey>,
}

#[derive(Default)]
pub struct ScopeArena {
    nodes: SlotMap<ScopeKey, ScopeNode>,
}

impl ScopeArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&mut self, parent: Option<ScopeKey>) -> ScopeKey {
        self.nodes.insert(ScopeNode { parent, inherits: Vec::new(), fields: HashMap::new(), types: HashMap::new(), predicates: HashMap::new() })
    }

    pub fn add_inherit(&mut self, scope: ScopeKey, parent_scope: ScopeKey) {
        self.nodes[scope].inherits.push(parent_scope);
    }

    pub fn parent(&self, scope: ScopeKey) -> Option<ScopeKey> {
        self.nodes[scope].parent
    }

    /// Declares `field` directly in `scope`. Fails if the name is already
    /// declared in this exact scope (§4.8 "declare" — duplicate names are
    /// an error, shadowing an outer scope is not).
    pub fn declare(&mut self, scope: ScopeKey, field: Field) -> Result<(), Symbol> {
        let node = &mut self.nodes[scope];
        if node.fields.contains_key(&field.name) {
            return Err(field.name);
        }
        node.fields.insert(field.name, field);
        Ok(())
    }

    pub fn field_here(&self, scope: ScopeKey, name: Symbol) -> Option<&Field> {
        self.nodes[scope].fields.get(&name)
    }

    /// Every field declared directly in `scope`, in no particular order —
    /// used by constructor invocation to synthesize the fields an init-list
    /// didn't bind (§4.6 "Constructor", step 5).
    pub fn fields_here(&self, scope: ScopeKey) -> impl Iterator<Item = &Field> {
        self.nodes[scope].fields.values()
    }

    /// Declares a type shell directly in `scope`. Fails if the name is
    /// already declared as a type in this exact scope.
    pub fn declare_type(&mut self, scope: ScopeKey, name: Symbol, ty: TypeKey) -> Result<(), Symbol> {
        let node = &mut self.nodes[scope];
        if node.types.contains_key(&name) {
            return Err(name);
        }
        node.types.insert(name, ty);
        Ok(())
    }

    pub fn declare_predicate(&mut self, scope: ScopeKey, name: Symbol, ty: TypeKey) -> Result<(), Symbol> {
        let node = &mut self.nodes[scope];
        if node.predicates.contains_key(&name) {
            return Err(name);
        }
        node.predicates.insert(name, ty);
        Ok(())
    }

    pub fn type_here(&self, scope: ScopeKey, name: Symbol) -> Option<TypeKey> {
        self.nodes[scope].types.get(&name).copied()
    }

    pub fn predicate_here(&self, scope: ScopeKey, name: Symbol) -> Option<TypeKey> {
        self.nodes[scope].predicates.get(&name).copied()
    }

    /// Resolves a type name with the same local → inheritance → lexical
    /// parent walk as [`ScopeArena::resolve`] (§4.3 "get_type").
    pub fn resolve_type(&self, scope: ScopeKey, name: Symbol) -> Option<TypeKey> {
        let mut current = Some(scope);
        while let Some(key) = current {
            if let Some(ty) = self.resolve_type_with_inherits(key, name) {
                return Some(ty);
            }
            current = self.nodes[key].parent;
        }
        None
    }

    fn resolve_type_with_inherits(&self, scope: ScopeKey, name: Symbol) -> Option<TypeKey> {
        if let Some(ty) = self.nodes[scope].types.get(&name) {
            return Some(*ty);
        }
        for &parent_scope in &self.nodes[scope].inherits {
            if let Some(ty) = self.resolve_type_with_inherits(parent_scope, name) {
                return Some(ty);
            }
        }
        None
    }

    /// Resolves a predicate name with the same walk (§4.3 "get_predicate").
    pub fn resolve_predicate(&self, scope: ScopeKey, name: Symbol) -> Option<TypeKey> {
        let mut current = Some(scope);
        while let Some(key) = current {
            if let Some(ty) = self.resolve_predicate_with_inherits(key, name) {
                return Some(ty);
            }
            current = self.nodes[key].parent;
        }
        None
    }

    fn resolve_predicate_with_inherits(&self, scope: ScopeKey, name: Symbol) -> Option<TypeKey> {
        if let Some(ty) = self.nodes[scope].predicates.get(&name) {
            return Some(*ty);
        }
        for &parent_scope in &self.nodes[scope].inherits {
            if let Some(ty) = self.resolve_predicate_with_inherits(parent_scope, name) {
                return Some(ty);
            }
        }
        None
    }

    /// Resolves `name` starting at `scope`: at each node along the
    /// lexical-parent chain, first checks the node itself, then its
    /// inheritance chain (depth-first), before moving up to the lexical
    /// parent (§4.3).
    pub fn resolve(&self, scope: ScopeKey, name: Symbol) -> Option<&Field> {
        let mut current = Some(scope);
        while let Some(key) = current {
            if let Some(field) = self.resolve_with_inherits(key, name) {
                return Some(field);
            }
            current = self.nodes[key].parent;
        }
        None
    }

    fn resolve_with_inherits(&self, scope: ScopeKey, name: Symbol) -> Option<&Field> {
        if let Some(field) = self.nodes[scope].fields.get(&name) {
            return Some(field);
        }
        for &parent_scope in &self.nodes[scope].inherits {
            if let Some(field) = self.resolve_with_inherits(parent_scope, name) {
                return Some(field);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intern::Interner;

    fn dummy_field(interner: &mut Interner, name: &str) -> Field {
        Field { name: interner.intern(name), ty: TypeKey::default(), span: Span::default(), default: None }
    }

    #[test]
    fn resolves_through_lexical_parent() {
        let mut interner = Interner::new();
        let mut scopes = ScopeArena::new();
        let root = scopes.create(None);
        let child = scopes.create(Some(root));
        scopes.declare(root, dummy_field(&mut interner, "tau")).unwrap();
        assert!(scopes.resolve(child, interner.lookup("tau").unwrap()).is_some());
        assert!(scopes.field_here(child, interner.lookup("tau").unwrap()).is_none());
    }

    #[test]
    fn duplicate_declaration_in_same_scope_errors() {
        let mut interner = Interner::new();
        let mut scopes = ScopeArena::new();
        let root = scopes.create(None);
        scopes.declare(root, dummy_field(&mut interner, "x")).unwrap();
        let err = scopes.declare(root, dummy_field(&mut interner, "x"));
        assert!(err.is_err());
    }

    #[test]
    fn inheritance_chain_is_searched_before_lexical_parent_gives_up() {
        let mut interner = Interner::new();
        let mut scopes = ScopeArena::new();
        let unrelated_root = scopes.create(None);
        let parent_class_scope = scopes.create(Some(unrelated_root));
        scopes.declare(parent_class_scope, dummy_field(&mut interner, "inherited")).unwrap();

        let child_class_scope = scopes.create(Some(unrelated_root));
        scopes.add_inherit(child_class_scope, parent_class_scope);

        let name = interner.lookup("inherited").unwrap();
        assert!(scopes.resolve(child_class_scope, name).is_some());
    }

    #[test]
    fn unknown_name_resolves_to_none() {
        let mut interner = Interner::new();
        let mut scopes = ScopeArena::new();
        let root = scopes.create(None);
        assert!(scopes.resolve(root, interner.intern("nope")).is_none());
    }

    #[test]
    fn type_shells_resolve_through_lexical_parent_and_reject_duplicates() {
        let mut interner = Interner::new();
        let mut scopes = ScopeArena::new();
        let root = scopes.create(None);
        let child = scopes.create(Some(root));
        let name = interner.intern("Duration");
        scopes.declare_type(root, name, TypeKey::default()).unwrap();
        assert!(scopes.resolve_type(child, name).is_some());
        assert!(scopes.type_here(child, name).is_none());
        assert!(scopes.declare_type(root, name, TypeKey::default()).is_err());
    }
}
