//! Command-line driver: compiles, disassembles, and runs tiny-c programs.

pub mod disasm;

use std::fs;
use std::io;
use std::path::Path;

use tcc::symtab::SymbolKind;
use tcvm::Vm;

#[derive(Debug)]
pub enum Error {
    Compile(tcc::Error),
    Io(io::Error),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Error::Compile(e) => write!(f, "{}", e),
            Error::Io(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for Error {}

impl From<tcc::Error> for Error {
    fn from(e: tcc::Error) -> Error {
        Error::Compile(e)
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Error {
        Error::Io(e)
    }
}

/// Outcome of a full compile-disassemble-run cycle, carrying everything the
/// driver's standard-output report needs.
pub struct RunReport {
    pub node_count: usize,
    pub code_len: usize,
    pub symbol_dump: Vec<String>,
    pub stack_not_empty: bool,
}

/// Reads `path` if given, else standard input; compiles it; writes a
/// disassembly listing to `list.txt` in the current directory; runs the
/// resulting program; and reports what the command-line driver prints.
pub fn run(path: Option<&Path>) -> Result<RunReport, Error> {
    let source = match path {
        Some(path) => fs::read_to_string(path)?,
        None => {
            use io::Read;
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };

    let program = tcc::compile(&source)?;
    fs::write("list.txt", disasm::listing(&program.code, &program.symbols))?;

    // fn_targets is indexed by the same 1-based symbol index ICALL's operand
    // carries, so slot 0 is a dummy padding entry matching the symbol table's
    // own "index 0 means absent" convention.
    let mut fn_targets: Vec<usize> = vec![0];
    fn_targets.extend(program.symbols.iter().map(|(_, sym)| sym.value as usize));
    let mut vm = Vm::new(program.symbols.len() + 1, fn_targets);
    vm.run(&program.code);

    let symbol_dump = program
        .symbols
        .iter()
        .map(|(index, sym)| {
            let kind = match sym.kind {
                SymbolKind::Var => "var",
                SymbolKind::Func => "func",
            };
            let value = match sym.kind {
                SymbolKind::Var => vm.vars()[index],
                SymbolKind::Func => sym.value,
            };
            format!("{} {}: {}", kind, sym.name, value)
        })
        .collect();

    Ok(RunReport {
        node_count: program.ast.len(),
        code_len: program.code.len(),
        symbol_dump,
        stack_not_empty: !vm.operand_stack().is_empty(),
    })
}
