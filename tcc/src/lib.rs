//! Lexer, parser, symbol table and code generator for the tiny-c language.

pub mod ast;
pub mod codegen;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod symtab;

pub use ast::Ast;
pub use error::Error;
pub use symtab::SymbolTable;

/// A fully compiled program: its AST, its symbol table (with every `Func`
/// entry's `value` patched to its code offset), and the emitted byte code.
pub struct Program {
    pub ast: Ast,
    pub symbols: SymbolTable,
    pub code: Vec<u8>,
}

/// Parses and lowers `source` in one pass.
pub fn compile(source: &str) -> Result<Program, Error> {
    let mut unit = parser::parse(source)?;
    let code = codegen::generate(&unit.ast, unit.root, &mut unit.symbols)?;
    Ok(Program { ast: unit.ast, symbols: unit.symbols, code })
}

#[cfg(test)]
mod test {
    use super::*;
    use tcvm::Vm;

    fn run(source: &str) -> (Program, Vm) {
        let program = compile(source).unwrap();
        let mut fn_targets: Vec<usize> = vec![0];
        fn_targets.extend(program.symbols.iter().map(|(_, sym)| sym.value as usize));
        let mut vm = Vm::new(program.symbols.len() + 1, fn_targets);
        vm.run(&program.code);
        (program, vm)
    }

    fn var_value(vm: &Vm, program: &Program, name: &str) -> i32 {
        let index = program.symbols.find(name, symtab::SymbolKind::Var);
        vm.vars()[index]
    }

    #[test]
    fn s1_arithmetic_precedence_quirk() {
        let (program, vm) = run("void main() { a = 1 + 2 * 3; }");
        assert_eq!(var_value(&vm, &program, "a"), 9);
    }

    #[test]
    fn s2_while_loop() {
        let (program, vm) =
            run("void main() { i = 0; s = 0; while (i < 5) { s = s + i; i = i + 1; } }");
        assert_eq!(var_value(&vm, &program, "i"), 5);
        assert_eq!(var_value(&vm, &program, "s"), 10);
    }

    #[test]
    fn s3_do_while() {
        let (program, vm) = run("void main() { n = 0; do { n = n + 1; } while (n < 3); }");
        assert_eq!(var_value(&vm, &program, "n"), 3);
    }

    #[test]
    fn s4_if_else() {
        let (program, vm) = run("void main() { x = 7; if (x > 5) y = 1; else y = 2; }");
        assert_eq!(var_value(&vm, &program, "x"), 7);
        assert_eq!(var_value(&vm, &program, "y"), 1);
    }

    #[test]
    fn s5_function_call_and_return() {
        let (program, vm) =
            run("void inc() { c = c + 1; return; } void main() { c = 0; inc(); inc(); }");
        assert_eq!(var_value(&vm, &program, "c"), 2);
    }

    #[test]
    fn program_without_main_never_executes_anything() {
        let (program, vm) = run("a = 1;");
        assert_eq!(var_value(&vm, &program, "a"), 0);
    }

    #[test]
    fn operand_stack_is_empty_after_a_well_formed_run() {
        let (_, vm) = run("void main() { a = 1; b = a + 2; }");
        assert!(vm.operand_stack().is_empty());
    }

    #[test]
    fn resolve_fails_fast_on_a_lex_error() {
        assert!(matches!(compile("void main() { a = @; }"), Err(Error::Lex(_))));
    }
}
