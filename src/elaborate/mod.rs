//! The four-pass elaborator (§4.8): declare, refine, refine_predicates,
//! execute, run in that order across every compilation unit, each pass
//! completing across all units before the next begins. Ordering within a
//! unit is source order; across units, input order (§5 "Ordering").

pub mod declare;
pub mod execute;
pub mod refine;
pub mod refine_predicates;

use crate::ast::CompilationUnit;
use crate::core::Core;
use crate::error::RResult;
use crate::intern::Interner;

/// Runs all four passes across `units`, in input order within each pass.
pub fn elaborate(core: &mut Core, units: &[CompilationUnit], interner: &Interner) -> RResult<()> {
    for unit in units {
        declare::declare_unit(core, unit, interner)?;
    }
    for unit in units {
        refine::refine_unit(core, unit, interner)?;
    }
    for unit in units {
        refine_predicates::refine_predicates_unit(core, unit, interner)?;
    }
    for unit in units {
        execute::execute_unit(core, unit, interner)?;
    }
    Ok(())
}
