//! Solver-level terms (§3 "Items"): what expressions evaluate to once
//! they leave the AST. Bool/Arith/String items are either constant
//! (folded by the reference backend in [`crate::core`]) or symbolic
//! (opaque handles meant for a real constraint solver); `Enum` items carry
//! a narrowing domain; `Component` and `Atom` items reference an
//! [`crate::env::EnvKey`] and so live in a slotmap arena alongside scopes
//! and envs rather than behind `Rc`/`Weak` (§9).

use crate::env::EnvKey;
use crate::rational::EpsRational;
use crate::types::TypeKey;
use slotmap::{new_key_type, SlotMap};

new_key_type! { pub struct ItemKey; }

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BoolValue {
    Const(bool),
    Symbolic,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ArithValue {
    Const(EpsRational),
    Symbolic,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StringValue {
    Const(String),
    Symbolic,
}

#[derive(Debug, Clone)]
pub enum ItemData {
    Bool(BoolValue),
    Arith(ArithValue),
    Str(StringValue),
    /// §6 "domain"/"forbid": `domain` narrows as alternatives are ruled out.
    Enum { domain: Vec<String> },
    Component { env: EnvKey },
    /// `sigma` is a fresh bool item controlling whether the atom is
    /// active — the σ literal of the GLOSSARY, materialized as an ordinary
    /// `ItemKey` rather than a bespoke field type.
    Atom { predicate: TypeKey, is_fact: bool, args: Vec<ItemKey>, sigma: ItemKey, env: EnvKey },
}

#[derive(Debug, Clone)]
pub struct ItemInfo {
    pub ty: TypeKey,
    pub data: ItemData,
}

#[derive(Default)]
pub struct ItemArena {
    items: SlotMap<ItemKey, ItemInfo>,
}

impl ItemArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, info: ItemInfo) -> ItemKey {
        self.items.insert(info)
    }

    pub fn get(&self, key: ItemKey) -> &ItemInfo {
        &self.items[key]
    }

    pub fn get_mut(&mut self, key: ItemKey) -> &mut ItemInfo {
        &mut self.items[key]
    }

    pub fn is_constant(&self, key: ItemKey) -> bool {
        matches!(
            self.items[key].data,
            ItemData::Bool(BoolValue::Const(_)) | ItemData::Arith(ArithValue::Const(_)) | ItemData::Str(StringValue::Const(_))
        )
    }

    pub fn is_enum(&self, key: ItemKey) -> bool {
        matches!(self.items[key].data, ItemData::Enum { .. })
    }

    pub fn bool_value(&self, key: ItemKey) -> Option<bool> {
        match &self.items[key].data {
            ItemData::Bool(BoolValue::Const(b)) => Some(*b),
            _ => None,
        }
    }

    pub fn arithmetic_value(&self, key: ItemKey) -> Option<EpsRational> {
        match &self.items[key].data {
            ItemData::Arith(ArithValue::Const(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn string_value(&self, key: ItemKey) -> Option<&str> {
        match &self.items[key].data {
            ItemData::Str(StringValue::Const(s)) => Some(s),
            _ => None,
        }
    }

    pub fn domain(&self, key: ItemKey) -> Option<&[String]> {
        match &self.items[key].data {
            ItemData::Enum { domain } => Some(domain),
            _ => None,
        }
    }

    /// Rules `value` out of an enum item's domain (§6 "forbid").
    pub fn forbid(&mut self, key: ItemKey, value: &str) {
        if let ItemData::Enum { domain } = &mut self.items[key].data {
            domain.retain(|v| v != value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rational::Rational;

    #[test]
    fn forbid_narrows_the_domain() {
        let mut items = ItemArena::new();
        let ty = TypeKey::default();
        let key = items.insert(ItemInfo { ty, data: ItemData::Enum { domain: vec!["a".into(), "b".into()] } });
        items.forbid(key, "a");
        assert_eq!(items.domain(key), Some(&["b".to_string()][..]));
    }

    #[test]
    fn constant_arith_item_reports_its_value() {
        let mut items = ItemArena::new();
        let ty = TypeKey::default();
        let v = EpsRational::exact(Rational::new(5, 1));
        let key = items.insert(ItemInfo { ty, data: ItemData::Arith(ArithValue::Const(v)) });
        assert!(items.is_constant(key));
        assert_eq!(items.arithmetic_value(key), Some(v));
    }

    #[test]
    fn symbolic_item_is_not_constant() {
        let mut items = ItemArena::new();
        let ty = TypeKey::default();
        let key = items.insert(ItemInfo { ty, data: ItemData::Bool(BoolValue::Symbolic) });
        assert!(!items.is_constant(key));
        assert_eq!(items.bool_value(key), None);
    }
}
