//! Pass 4 — execute (§4.8, §4.10): runs each unit's top-level `body`
//! statements against the root scope and root env, in source order within
//! a unit and input order across units.

use crate::ast::CompilationUnit;
use crate::core::Core;
use crate::error::RResult;
use crate::eval::stmt::exec_stmts;
use crate::intern::Interner;

pub fn execute_unit(core: &mut Core, unit: &CompilationUnit, interner: &Interner) -> RResult<()> {
    exec_stmts(core, core.root_scope, core.root_env, &unit.body, interner)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Expr, Stmt};
    use crate::token::Span;

    #[test]
    fn top_level_expression_statement_asserts_a_fact() {
        let mut core = Core::with_reference_backend();
        let interner = Interner::new();
        let unit = CompilationUnit {
            types: vec![],
            predicates: vec![],
            methods: vec![],
            body: vec![Stmt::Expr(Expr::BoolLit(true, Span::default()))],
        };
        assert!(execute_unit(&mut core, &unit, &interner).is_ok());
    }
}
