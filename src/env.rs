//! The environment graph (§4.4): name → [`Item`](crate::item) bindings,
//! looked up through a parent chain distinct from the scope graph's
//! lexical-parent-plus-inheritance walk. A `Core` is simultaneously the
//! root scope and the root env (§4.6 "Core").

use crate::intern::Symbol;
use crate::item::ItemKey;
use slotmap::{new_key_type, SlotMap};
use std::collections::HashMap;

new_key_type! { pub struct EnvKey; }

#[derive(Default)]
pub struct EnvNode {
    pub parent: Option<EnvKey>,
    bindings: HashMap<Symbol, ItemKey>,
}

#[derive(Default)]
pub struct EnvArena {
    nodes: SlotMap<EnvKey, EnvNode>,
}

impl EnvArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&mut self, parent: Option<EnvKey>) -> EnvKey {
        self.nodes.insert(EnvNode { parent, bindings: HashMap::new() })
    }

    pub fn bind(&mut self, env: EnvKey, name: Symbol, item: ItemKey) {
        self.nodes[env].bindings.insert(name, item);
    }

    pub fn get_here(&self, env: EnvKey, name: Symbol) -> Option<ItemKey> {
        self.nodes[env].bindings.get(&name).copied()
    }

    /// Walks the env's parent chain (distinct from a scope's lexical
    /// parent — an env's parent is the *calling* env, e.g. a method's
    /// receiver, not its textual enclosure).
    pub fn get(&self, env: EnvKey, name: Symbol) -> Option<ItemKey> {
        let mut current = Some(env);
        while let Some(key) = current {
            if let Some(item) = self.nodes[key].bindings.get(&name) {
                return Some(*item);
            }
            current = self.nodes[key].parent;
        }
        None
    }

    pub fn parent(&self, env: EnvKey) -> Option<EnvKey> {
        self.nodes[env].parent
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intern::Interner;
    use slotmap::KeyData;

    fn fake_item(n: u64) -> ItemKey {
        KeyData::from_ffi(n).into()
    }

    #[test]
    fn get_walks_parent_chain() {
        let mut interner = Interner::new();
        let mut envs = EnvArena::new();
        let root = envs.create(None);
        let child = envs.create(Some(root));
        let tau = interner.intern("tau");
        envs.bind(root, tau, fake_item(1));
        assert_eq!(envs.get(child, tau), Some(fake_item(1)));
        assert_eq!(envs.get_here(child, tau), None);
    }

    #[test]
    fn binding_in_child_shadows_parent() {
        let mut interner = Interner::new();
        let mut envs = EnvArena::new();
        let root = envs.create(None);
        let child = envs.create(Some(root));
        let x = interner.intern("x");
        envs.bind(root, x, fake_item(1));
        envs.bind(child, x, fake_item(2));
        assert_eq!(envs.get(child, x), Some(fake_item(2)));
        assert_eq!(envs.get(root, x), Some(fake_item(1)));
    }
}
