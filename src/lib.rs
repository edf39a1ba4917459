//! `riddle` — a frontend for the RiDDLe planning/scheduling DSL: lexer,
//! recursive-descent parser, AST, and a four-pass elaborator that builds a
//! scope/type/item graph and hands it to a pluggable solver backend
//! through the [`core`] factory interface.

pub mod ast;
pub mod cli;
pub mod core;
pub mod elaborate;
pub mod env;
pub mod error;
pub mod eval;
pub mod intern;
pub mod item;
pub mod lexer;
pub mod parser;
pub mod rational;
pub mod scope;
pub mod style;
pub mod suggest;
pub mod token;
pub mod types;

use crate::error::RResult;
use crate::intern::Interner;
use std::path::Path;

/// Lexes and parses a single source string into an AST, without running
/// the elaborator (§4.1, §4.2).
pub fn parse_source(source: &str, interner: &mut Interner) -> RResult<ast::CompilationUnit> {
    let tokens = lexer::Lexer::tokenize(source, interner)?;
    let unit = parser::Parser::parse_compilation_unit(tokens, interner)?;
    Ok(unit)
}

/// Reads, lexes and parses a file (§4 "Inputs").
pub fn parse_file(path: &Path, interner: &mut Interner) -> RResult<ast::CompilationUnit> {
    let source = std::fs::read_to_string(path).map_err(|e| error::RiddleError::Io { path: path.to_path_buf(), message: e.to_string() })?;
    parse_source(&source, interner)
}

/// Parses and elaborates a single compilation unit against `core` (§6
/// "read(source)").
pub fn read_source(core: &mut core::Core, source: &str, interner: &mut Interner) -> RResult<()> {
    let unit = parse_source(source, interner)?;
    elaborate::elaborate(core, std::slice::from_ref(&unit), interner)
}

/// Parses every path, then runs the four elaboration passes across the
/// resulting units as a single batch (§6 "read(paths)").
pub fn read_files(core: &mut core::Core, paths: &[std::path::PathBuf], interner: &mut Interner) -> RResult<()> {
    let mut units = Vec::with_capacity(paths.len());
    for path in paths {
        units.push(parse_file(path, interner)?);
    }
    elaborate::elaborate(core, &units, interner)
}
