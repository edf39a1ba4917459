//! The `Core`: simultaneously the root [`scope`](crate::scope) and root
//! [`env`](crate::env) (§4.6), and the owner of the type/item arenas the
//! elaborator and evaluator populate. Constraint-level operations — the
//! actual arithmetic, logic and fact-posting — are not implemented here
//! directly; they go through the [`SolverBackend`] trait (§6 "Core factory
//! interface"), which a real constraint/planning solver would implement.
//! `ReferenceBackend` is a minimal in-memory implementation (constant
//! folding, no real search) sufficient to exercise the frontend end to end;
//! wiring an actual solver is explicitly out of scope (§1 "Non-goals").

use crate::env::{EnvArena, EnvKey};
use crate::error::{RResult, RiddleError};
use crate::item::{ArithValue, BoolValue, ItemArena, ItemData, ItemInfo, ItemKey, StringValue};
use crate::rational::{EpsRational, Rational};
use crate::scope::{ScopeArena, ScopeKey};
use crate::types::TypeKey;

/// The pluggable backend a `Core` dispatches constraint-building calls to
/// (§6). Every method is handed the shared `ItemArena` so it can allocate
/// new items without owning storage itself.
pub trait SolverBackend {
    fn new_bool(&mut self, items: &mut ItemArena, ty: TypeKey, value: Option<bool>) -> ItemKey;
    fn new_int(&mut self, items: &mut ItemArena, ty: TypeKey, value: Option<i64>) -> ItemKey;
    fn new_real(&mut self, items: &mut ItemArena, ty: TypeKey, value: Option<Rational>) -> ItemKey;
    fn new_time(&mut self, items: &mut ItemArena, ty: TypeKey, value: Option<Rational>) -> ItemKey;
    fn new_string(&mut self, items: &mut ItemArena, ty: TypeKey, value: Option<String>) -> ItemKey;
    fn new_enum(&mut self, items: &mut ItemArena, ty: TypeKey, domain: Vec<String>) -> ItemKey;

    fn add(&mut self, items: &mut ItemArena, ty: TypeKey, args: &[ItemKey]) -> RResult<ItemKey>;
    fn sub(&mut self, items: &mut ItemArena, ty: TypeKey, args: &[ItemKey]) -> RResult<ItemKey>;
    fn mul(&mut self, items: &mut ItemArena, ty: TypeKey, args: &[ItemKey]) -> RResult<ItemKey>;
    fn div(&mut self, items: &mut ItemArena, ty: TypeKey, args: &[ItemKey]) -> RResult<ItemKey>;
    fn minus(&mut self, items: &mut ItemArena, ty: TypeKey, arg: ItemKey) -> RResult<ItemKey>;

    fn lt(&mut self, items: &mut ItemArena, bool_ty: TypeKey, args: &[ItemKey]) -> RResult<ItemKey>;
    fn leq(&mut self, items: &mut ItemArena, bool_ty: TypeKey, args: &[ItemKey]) -> RResult<ItemKey>;
    fn geq(&mut self, items: &mut ItemArena, bool_ty: TypeKey, args: &[ItemKey]) -> RResult<ItemKey>;
    fn gt(&mut self, items: &mut ItemArena, bool_ty: TypeKey, args: &[ItemKey]) -> RResult<ItemKey>;
    fn eq(&mut self, items: &mut ItemArena, bool_ty: TypeKey, args: &[ItemKey]) -> RResult<ItemKey>;

    fn conj(&mut self, items: &mut ItemArena, bool_ty: TypeKey, args: &[ItemKey]) -> ItemKey;
    fn disj(&mut self, items: &mut ItemArena, bool_ty: TypeKey, args: &[ItemKey]) -> ItemKey;
    fn negate(&mut self, items: &mut ItemArena, bool_ty: TypeKey, arg: ItemKey) -> ItemKey;
    /// "Exactly one of `args` holds" — used when elaborating an enum
    /// variable's domain into a choice constraint (§6).
    fn exct_one(&mut self, items: &mut ItemArena, bool_ty: TypeKey, args: &[ItemKey]) -> ItemKey;

    fn assert_fact(&mut self, items: &ItemArena, atom: ItemKey);
    /// Builds a disjunction from conjunction-valued branches (§4.11
    /// "Conjunction value" — each branch's statements already AND their
    /// effects into one bool item).
    fn new_disjunction(&mut self, items: &mut ItemArena, bool_ty: TypeKey, branches: &[ItemKey]) -> ItemKey;
    fn new_atom(
        &mut self,
        items: &mut ItemArena,
        ty: TypeKey,
        predicate: TypeKey,
        is_fact: bool,
        args: Vec<ItemKey>,
        sigma: ItemKey,
        env: EnvKey,
    ) -> ItemKey;

    /// Posts `target == value` (§6 "assign") — for a symbolic target this
    /// is a constraint, not a destructive write; rebinding the name in the
    /// owning env is the caller's job (§4.10 "Statement executor").
    fn assign(&mut self, items: &mut ItemArena, target: ItemKey, value: ItemKey) -> RResult<()>;
}

pub struct Core {
    pub types: crate::types::TypeArena,
    pub scopes: ScopeArena,
    pub envs: EnvArena,
    pub items: ItemArena,
    pub root_scope: ScopeKey,
    pub root_env: EnvKey,
    /// Top-level methods declared directly in a compilation unit — "free
    /// functions" resolved against `core` rather than a receiver type
    /// (§4.9 "Function call").
    pub core_methods: Vec<crate::types::ComponentMethod>,
    backend: Box<dyn SolverBackend>,
}

impl Core {
    pub fn new(backend: Box<dyn SolverBackend>) -> Self {
        let mut scopes = ScopeArena::new();
        let mut envs = EnvArena::new();
        let root_scope = scopes.create(None);
        let root_env = envs.create(None);
        Core { types: crate::types::TypeArena::new(), scopes, envs, items: ItemArena::new(), root_scope, root_env, core_methods: Vec::new(), backend }
    }

    pub fn with_reference_backend() -> Self {
        Self::new(Box::new(ReferenceBackend))
    }

    pub fn new_bool(&mut self, value: Option<bool>) -> ItemKey {
        let ty = self.types.bool_ty;
        self.backend.new_bool(&mut self.items, ty, value)
    }

    pub fn new_int(&mut self, value: Option<i64>) -> ItemKey {
        let ty = self.types.int_ty;
        self.backend.new_int(&mut self.items, ty, value)
    }

    pub fn new_real(&mut self, value: Option<Rational>) -> ItemKey {
        let ty = self.types.real_ty;
        self.backend.new_real(&mut self.items, ty, value)
    }

    pub fn new_time(&mut self, value: Option<Rational>) -> ItemKey {
        let ty = self.types.time_ty;
        self.backend.new_time(&mut self.items, ty, value)
    }

    pub fn new_string(&mut self, value: Option<String>) -> ItemKey {
        let ty = self.types.string_ty;
        self.backend.new_string(&mut self.items, ty, value)
    }

    pub fn new_enum(&mut self, ty: TypeKey, domain: Vec<String>) -> ItemKey {
        self.backend.new_enum(&mut self.items, ty, domain)
    }

    pub fn add(&mut self, ty: TypeKey, args: &[ItemKey]) -> RResult<ItemKey> {
        self.backend.add(&mut self.items, ty, args)
    }

    pub fn sub(&mut self, ty: TypeKey, args: &[ItemKey]) -> RResult<ItemKey> {
        self.backend.sub(&mut self.items, ty, args)
    }

    pub fn mul(&mut self, ty: TypeKey, args: &[ItemKey]) -> RResult<ItemKey> {
        self.backend.mul(&mut self.items, ty, args)
    }

    pub fn div(&mut self, ty: TypeKey, args: &[ItemKey]) -> RResult<ItemKey> {
        self.backend.div(&mut self.items, ty, args)
    }

    pub fn minus(&mut self, ty: TypeKey, arg: ItemKey) -> RResult<ItemKey> {
        self.backend.minus(&mut self.items, ty, arg)
    }

    pub fn lt(&mut self, args: &[ItemKey]) -> RResult<ItemKey> {
        let ty = self.types.bool_ty;
        self.backend.lt(&mut self.items, ty, args)
    }

    pub fn leq(&mut self, args: &[ItemKey]) -> RResult<ItemKey> {
        let ty = self.types.bool_ty;
        self.backend.leq(&mut self.items, ty, args)
    }

    pub fn geq(&mut self, args: &[ItemKey]) -> RResult<ItemKey> {
        let ty = self.types.bool_ty;
        self.backend.geq(&mut self.items, ty, args)
    }

    pub fn gt(&mut self, args: &[ItemKey]) -> RResult<ItemKey> {
        let ty = self.types.bool_ty;
        self.backend.gt(&mut self.items, ty, args)
    }

    pub fn eq(&mut self, args: &[ItemKey]) -> RResult<ItemKey> {
        let ty = self.types.bool_ty;
        self.backend.eq(&mut self.items, ty, args)
    }

    pub fn conj(&mut self, args: &[ItemKey]) -> ItemKey {
        let ty = self.types.bool_ty;
        self.backend.conj(&mut self.items, ty, args)
    }

    pub fn disj(&mut self, args: &[ItemKey]) -> ItemKey {
        let ty = self.types.bool_ty;
        self.backend.disj(&mut self.items, ty, args)
    }

    pub fn negate(&mut self, arg: ItemKey) -> ItemKey {
        let ty = self.types.bool_ty;
        self.backend.negate(&mut self.items, ty, arg)
    }

    pub fn exct_one(&mut self, args: &[ItemKey]) -> ItemKey {
        let ty = self.types.bool_ty;
        self.backend.exct_one(&mut self.items, ty, args)
    }

    pub fn assert_fact(&mut self, atom: ItemKey) {
        self.backend.assert_fact(&self.items, atom);
    }

    pub fn new_disjunction(&mut self, branches: &[ItemKey]) -> ItemKey {
        let ty = self.types.bool_ty;
        self.backend.new_disjunction(&mut self.items, ty, branches)
    }

    pub fn new_atom(&mut self, ty: TypeKey, predicate: TypeKey, is_fact: bool, args: Vec<ItemKey>, env: EnvKey) -> ItemKey {
        let sigma = self.new_bool(Some(true));
        self.backend.new_atom(&mut self.items, ty, predicate, is_fact, args, sigma, env)
    }

    pub fn assign(&mut self, target: ItemKey, value: ItemKey) -> RResult<()> {
        self.backend.assign(&mut self.items, target, value)
    }
}

/// A minimal in-memory `SolverBackend`: folds arithmetic and logic over
/// constants, and otherwise produces symbolic placeholders. No search, no
/// real constraint propagation — good enough to drive the elaborator and
/// evaluator end to end without an external solver (§1 "Non-goals").
pub struct ReferenceBackend;

impl ReferenceBackend {
    fn fold_arith(items: &mut ItemArena, ty: TypeKey, args: &[ItemKey], f: impl Fn(EpsRational, EpsRational) -> EpsRational) -> ItemKey {
        let mut values = Vec::with_capacity(args.len());
        for &a in args {
            match items.arithmetic_value(a) {
                Some(v) => values.push(v),
                None => return items.insert(ItemInfo { ty, data: ItemData::Arith(ArithValue::Symbolic) }),
            }
        }
        let folded = values.into_iter().reduce(f).expect("fold_arith called with at least one argument");
        items.insert(ItemInfo { ty, data: ItemData::Arith(ArithValue::Const(folded)) })
    }

    fn fold_compare(items: &mut ItemArena, bool_ty: TypeKey, args: &[ItemKey], f: impl Fn(EpsRational, EpsRational) -> bool) -> RResult<ItemKey> {
        if args.len() != 2 {
            return Err(RiddleError::NotImplemented { what: "comparisons take exactly two arguments".into() });
        }
        let item = match (items.arithmetic_value(args[0]), items.arithmetic_value(args[1])) {
            (Some(a), Some(b)) => items.insert(ItemInfo { ty: bool_ty, data: ItemData::Bool(BoolValue::Const(f(a, b))) }),
            _ => items.insert(ItemInfo { ty: bool_ty, data: ItemData::Bool(BoolValue::Symbolic) }),
        };
        Ok(item)
    }
}

impl SolverBackend for ReferenceBackend {
    fn new_bool(&mut self, items: &mut ItemArena, ty: TypeKey, value: Option<bool>) -> ItemKey {
        let data = match value {
            Some(b) => BoolValue::Const(b),
            None => BoolValue::Symbolic,
        };
        items.insert(ItemInfo { ty, data: ItemData::Bool(data) })
    }

    fn new_int(&mut self, items: &mut ItemArena, ty: TypeKey, value: Option<i64>) -> ItemKey {
        self.new_real(items, ty, value.map(Rational::from_integer))
    }

    fn new_real(&mut self, items: &mut ItemArena, ty: TypeKey, value: Option<Rational>) -> ItemKey {
        let data = match value {
            Some(v) => ArithValue::Const(EpsRational::exact(v)),
            None => ArithValue::Symbolic,
        };
        items.insert(ItemInfo { ty, data: ItemData::Arith(data) })
    }

    fn new_time(&mut self, items: &mut ItemArena, ty: TypeKey, value: Option<Rational>) -> ItemKey {
        self.new_real(items, ty, value)
    }

    fn new_string(&mut self, items: &mut ItemArena, ty: TypeKey, value: Option<String>) -> ItemKey {
        let data = match value {
            Some(s) => StringValue::Const(s),
            None => StringValue::Symbolic,
        };
        items.insert(ItemInfo { ty, data: ItemData::Str(data) })
    }

    fn new_enum(&mut self, items: &mut ItemArena, ty: TypeKey, domain: Vec<String>) -> ItemKey {
        items.insert(ItemInfo { ty, data: ItemData::Enum { domain } })
    }

    fn add(&mut self, items: &mut ItemArena, ty: TypeKey, args: &[ItemKey]) -> RResult<ItemKey> {
        Ok(Self::fold_arith(items, ty, args, |a, b| EpsRational { value: a.value + b.value, eps: a.eps + b.eps }))
    }

    fn sub(&mut self, items: &mut ItemArena, ty: TypeKey, args: &[ItemKey]) -> RResult<ItemKey> {
        Ok(Self::fold_arith(items, ty, args, |a, b| EpsRational { value: a.value - b.value, eps: a.eps - b.eps }))
    }

    fn mul(&mut self, items: &mut ItemArena, ty: TypeKey, args: &[ItemKey]) -> RResult<ItemKey> {
        Ok(Self::fold_arith(items, ty, args, |a, b| EpsRational { value: a.value * b.value, eps: a.eps }))
    }

    fn div(&mut self, items: &mut ItemArena, ty: TypeKey, args: &[ItemKey]) -> RResult<ItemKey> {
        for &a in args.get(1..).unwrap_or(&[]) {
            if let Some(v) = items.arithmetic_value(a) {
                if v.value == num_rational::Ratio::from_integer(0) {
                    return Err(RiddleError::Inconsistency { field: "division by zero".into(), span: None });
                }
            }
        }
        Ok(Self::fold_arith(items, ty, args, |a, b| EpsRational { value: a.value / b.value, eps: a.eps }))
    }

    fn minus(&mut self, items: &mut ItemArena, ty: TypeKey, arg: ItemKey) -> RResult<ItemKey> {
        let item = match items.arithmetic_value(arg) {
            Some(v) => items.insert(ItemInfo { ty, data: ItemData::Arith(ArithValue::Const(EpsRational { value: -v.value, eps: -v.eps })) }),
            None => items.insert(ItemInfo { ty, data: ItemData::Arith(ArithValue::Symbolic) }),
        };
        Ok(item)
    }

    fn lt(&mut self, items: &mut ItemArena, bool_ty: TypeKey, args: &[ItemKey]) -> RResult<ItemKey> {
        Self::fold_compare(items, bool_ty, args, |a, b| a < b)
    }

    fn leq(&mut self, items: &mut ItemArena, bool_ty: TypeKey, args: &[ItemKey]) -> RResult<ItemKey> {
        Self::fold_compare(items, bool_ty, args, |a, b| a <= b)
    }

    fn geq(&mut self, items: &mut ItemArena, bool_ty: TypeKey, args: &[ItemKey]) -> RResult<ItemKey> {
        Self::fold_compare(items, bool_ty, args, |a, b| a >= b)
    }

    fn gt(&mut self, items: &mut ItemArena, bool_ty: TypeKey, args: &[ItemKey]) -> RResult<ItemKey> {
        Self::fold_compare(items, bool_ty, args, |a, b| a > b)
    }

    fn eq(&mut self, items: &mut ItemArena, bool_ty: TypeKey, args: &[ItemKey]) -> RResult<ItemKey> {
        if args.len() != 2 {
            return Err(RiddleError::NotImplemented { what: "equality takes exactly two arguments".into() });
        }
        let item = if let (Some(a), Some(b)) = (items.arithmetic_value(args[0]), items.arithmetic_value(args[1])) {
            items.insert(ItemInfo { ty: bool_ty, data: ItemData::Bool(BoolValue::Const(a == b)) })
        } else if let (Some(a), Some(b)) = (items.string_value(args[0]), items.string_value(args[1])) {
            let eq = a == b;
            items.insert(ItemInfo { ty: bool_ty, data: ItemData::Bool(BoolValue::Const(eq)) })
        } else if let (Some(a), Some(b)) = (items.bool_value(args[0]), items.bool_value(args[1])) {
            items.insert(ItemInfo { ty: bool_ty, data: ItemData::Bool(BoolValue::Const(a == b)) })
        } else {
            items.insert(ItemInfo { ty: bool_ty, data: ItemData::Bool(BoolValue::Symbolic) })
        };
        Ok(item)
    }

    fn conj(&mut self, items: &mut ItemArena, bool_ty: TypeKey, args: &[ItemKey]) -> ItemKey {
        let mut all_const = true;
        let mut result = true;
        for &a in args {
            match items.bool_value(a) {
                Some(b) => result &= b,
                None => all_const = false,
            }
        }
        if all_const {
            items.insert(ItemInfo { ty: bool_ty, data: ItemData::Bool(BoolValue::Const(result)) })
        } else {
            items.insert(ItemInfo { ty: bool_ty, data: ItemData::Bool(BoolValue::Symbolic) })
        }
    }

    fn disj(&mut self, items: &mut ItemArena, bool_ty: TypeKey, args: &[ItemKey]) -> ItemKey {
        let mut all_const = true;
        let mut result = false;
        for &a in args {
            match items.bool_value(a) {
                Some(b) => result |= b,
                None => all_const = false,
            }
        }
        if all_const {
            items.insert(ItemInfo { ty: bool_ty, data: ItemData::Bool(BoolValue::Const(result)) })
        } else {
            items.insert(ItemInfo { ty: bool_ty, data: ItemData::Bool(BoolValue::Symbolic) })
        }
    }

    fn negate(&mut self, items: &mut ItemArena, bool_ty: TypeKey, arg: ItemKey) -> ItemKey {
        match items.bool_value(arg) {
            Some(b) => items.insert(ItemInfo { ty: bool_ty, data: ItemData::Bool(BoolValue::Const(!b)) }),
            None => items.insert(ItemInfo { ty: bool_ty, data: ItemData::Bool(BoolValue::Symbolic) }),
        }
    }

    fn exct_one(&mut self, items: &mut ItemArena, bool_ty: TypeKey, args: &[ItemKey]) -> ItemKey {
        let values: Option<Vec<bool>> = args.iter().map(|&a| items.bool_value(a)).collect();
        match values {
            Some(values) => {
                let true_count = values.into_iter().filter(|b| *b).count();
                items.insert(ItemInfo { ty: bool_ty, data: ItemData::Bool(BoolValue::Const(true_count == 1)) })
            }
            None => items.insert(ItemInfo { ty: bool_ty, data: ItemData::Bool(BoolValue::Symbolic) }),
        }
    }

    fn assert_fact(&mut self, _items: &ItemArena, _atom: ItemKey) {
        // A real backend would hand the atom to the solver's fact base.
        // The reference backend has no search to feed, so this is a no-op.
    }

    fn new_disjunction(&mut self, items: &mut ItemArena, bool_ty: TypeKey, branches: &[ItemKey]) -> ItemKey {
        self.disj(items, bool_ty, branches)
    }

    fn new_atom(
        &mut self,
        items: &mut ItemArena,
        ty: TypeKey,
        predicate: TypeKey,
        is_fact: bool,
        args: Vec<ItemKey>,
        sigma: ItemKey,
        env: EnvKey,
    ) -> ItemKey {
        items.insert(ItemInfo { ty, data: ItemData::Atom { predicate, is_fact, args, sigma, env } })
    }

    fn assign(&mut self, items: &mut ItemArena, target: ItemKey, value: ItemKey) -> RResult<()> {
        match (items.arithmetic_value(target), items.arithmetic_value(value)) {
            (Some(t), Some(v)) if t != v => {
                return Err(RiddleError::Inconsistency { field: "assignment contradicts a constant value".into(), span: None })
            }
            _ => {}
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constant_addition_folds() {
        let mut core = Core::with_reference_backend();
        let a = core.new_int(Some(2));
        let b = core.new_int(Some(3));
        let ty = core.types.int_ty;
        let sum = core.add(ty, &[a, b]).unwrap();
        assert_eq!(core.items.arithmetic_value(sum).unwrap().value, Rational::from_integer(5));
    }

    #[test]
    fn division_by_constant_zero_is_an_error() {
        let mut core = Core::with_reference_backend();
        let a = core.new_int(Some(4));
        let zero = core.new_int(Some(0));
        let ty = core.types.int_ty;
        assert!(core.div(ty, &[a, zero]).is_err());
    }

    #[test]
    fn symbolic_operand_yields_symbolic_result() {
        let mut core = Core::with_reference_backend();
        let a = core.new_int(Some(2));
        let sym = core.new_int(None);
        let ty = core.types.int_ty;
        let sum = core.add(ty, &[a, sym]).unwrap();
        assert!(!core.items.is_constant(sum));
    }

    #[test]
    fn root_scope_and_env_are_distinct_roots() {
        let core = Core::with_reference_backend();
        assert!(core.scopes.resolve(core.root_scope, crate::intern::Symbol::EMPTY).is_none());
        assert_eq!(core.envs.parent(core.root_env), None);
    }

    #[test]
    fn negate_of_constant_bool_folds() {
        let mut core = Core::with_reference_backend();
        let t = core.new_bool(Some(true));
        let n = core.negate(t);
        assert_eq!(core.items.bool_value(n), Some(false));
    }
}
