//! Lowers an [`Ast`] to a flat byte buffer of tiny-c byte code.

use tcbuf::CodeBuffer;
use tcvm::Opcode;

use crate::ast::{Ast, Kind, NodeId};
use crate::error::{resource_error, ResourceError};
use crate::symtab::{SymbolKind, SymbolTable};

const LIT1_MAX: i32 = 127;
const LIT2_MAX: i32 = 32767;

/// Fixed upper bound on emitted code size; exhaustion is a [`ResourceError`],
/// the same as the AST pool and symbol table.
pub const CODE_CAPACITY: usize = 65536;

pub struct CodeGen<'a> {
    ast: &'a Ast,
    symbols: &'a mut SymbolTable,
    buf: CodeBuffer,
}

/// Lowers `root` (a `PROG` node) and returns the emitted code, patching the
/// program's `main`-dispatch prologue as the final step.
pub fn generate(ast: &Ast, root: NodeId, symbols: &mut SymbolTable) -> Result<Vec<u8>, ResourceError> {
    let mut gen = CodeGen { ast, symbols, buf: CodeBuffer::new(CODE_CAPACITY) };
    gen.emit_prog(root)?;
    Ok(gen.buf.into_bytes())
}

fn full() -> ResourceError {
    resource_error("code buffer is full")
}

impl<'a> CodeGen<'a> {
    fn op(&mut self, op: Opcode) -> Result<(), ResourceError> {
        self.buf.emit1(op as u8).map_err(|_| full())?;
        Ok(())
    }

    fn emit_prog(&mut self, root: NodeId) -> Result<(), ResourceError> {
        self.op(Opcode::JMP)?;
        let prologue_slot = self.buf.hole().map_err(|_| full())?;

        let prog = *self.ast.get(root);
        self.emit(prog.o1)?;
        self.op(Opcode::HALT)?;

        let main = self.symbols.find("main", SymbolKind::Func);
        if main != 0 {
            let target = self.symbols.get(main).value as usize;
            self.buf.patch(prologue_slot, target);
        } else {
            self.buf.set_byte(0, Opcode::HALT as u8);
        }
        Ok(())
    }

    fn emit(&mut self, id: NodeId) -> Result<(), ResourceError> {
        let node = *self.ast.get(id);
        match node.kind {
            Kind::Var => {
                self.op(Opcode::FETCH)?;
                self.buf.emit2(node.value as u16).map_err(|_| full())?;
            }
            Kind::Cst => self.emit_literal(node.value)?,
            Kind::Set => {
                self.emit(node.o1)?;
                self.op(Opcode::STORE)?;
                self.buf.emit2(node.value as u16).map_err(|_| full())?;
            }
            Kind::Add => self.emit_binary(node.o1, node.o2, Opcode::IADD)?,
            Kind::Sub => self.emit_binary(node.o1, node.o2, Opcode::ISUB)?,
            Kind::Mul => self.emit_binary(node.o1, node.o2, Opcode::IMUL)?,
            Kind::Div => self.emit_binary(node.o1, node.o2, Opcode::IDIV)?,
            Kind::Lt => self.emit_binary(node.o1, node.o2, Opcode::ILT)?,
            Kind::Gt => self.emit_binary(node.o1, node.o2, Opcode::IGT)?,
            Kind::If1 => {
                self.emit(node.o1)?;
                self.op(Opcode::JZ)?;
                let p1 = self.buf.hole().map_err(|_| full())?;
                self.emit(node.o2)?;
                let here = self.buf.len();
                self.buf.patch(p1, here);
            }
            Kind::If2 => {
                self.emit(node.o1)?;
                self.op(Opcode::JZ)?;
                let p1 = self.buf.hole().map_err(|_| full())?;
                self.emit(node.o2)?;
                self.op(Opcode::JMP)?;
                let p2 = self.buf.hole().map_err(|_| full())?;
                let here = self.buf.len();
                self.buf.patch(p1, here);
                self.emit(node.o3)?;
                let here = self.buf.len();
                self.buf.patch(p2, here);
            }
            Kind::While => {
                let p1 = self.buf.len();
                self.emit(node.o1)?;
                self.op(Opcode::JZ)?;
                let p2 = self.buf.hole().map_err(|_| full())?;
                self.emit(node.o2)?;
                self.op(Opcode::JMP)?;
                let p3 = self.buf.hole().map_err(|_| full())?;
                self.buf.patch(p3, p1);
                let here = self.buf.len();
                self.buf.patch(p2, here);
            }
            Kind::Do => {
                let p1 = self.buf.len();
                self.emit(node.o1)?;
                self.emit(node.o2)?;
                self.op(Opcode::JNZ)?;
                let p2 = self.buf.hole().map_err(|_| full())?;
                self.buf.patch(p2, p1);
            }
            Kind::Empty => {}
            Kind::Seq => {
                self.emit(node.o1)?;
                self.emit(node.o2)?;
            }
            Kind::Expr => {
                self.emit(node.o1)?;
                self.op(Opcode::IDROP)?;
            }
            Kind::Prog => unreachable!("PROG is only the root, handled by emit_prog"),
            Kind::FuncDef => {
                let here = self.buf.len() as i32;
                self.symbols.set_value(node.value as usize, here);
                self.emit(node.o1)?;
                self.op(Opcode::IRET)?;
            }
            Kind::FuncCall => {
                self.op(Opcode::ICALL)?;
                self.buf.emit2(node.value as u16).map_err(|_| full())?;
            }
            Kind::Ret => self.op(Opcode::IRET)?,
        }
        Ok(())
    }

    fn emit_binary(&mut self, o1: NodeId, o2: NodeId, op: Opcode) -> Result<(), ResourceError> {
        self.emit(o1)?;
        self.emit(o2)?;
        self.op(op)
    }

    fn emit_literal(&mut self, value: i32) -> Result<(), ResourceError> {
        if (0..=LIT1_MAX).contains(&value) {
            self.op(Opcode::LIT1)?;
            self.buf.emit1(value as u8).map_err(|_| full())?;
        } else if (LIT1_MAX + 1..=LIT2_MAX).contains(&value) {
            self.op(Opcode::LIT2)?;
            self.buf.emit2(value as u16).map_err(|_| full())?;
        } else {
            self.op(Opcode::LIT)?;
            self.buf.emit4(value).map_err(|_| full())?;
        }
        Ok(())
    }
}
