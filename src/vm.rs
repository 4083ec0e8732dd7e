//! The stack-based virtual machine that executes a compiled byte buffer.

use byteorder::{ByteOrder, LittleEndian};
use num_traits::FromPrimitive;

use crate::Opcode;

/// Computes a jump target from a byte slot holding a signed displacement.
///
/// The displacement is relative to the slot's own address, matching the
/// encoding the code generator produces: `patch` writes `target - slot`.
fn jump(slot: usize, displacement: u8) -> usize {
    (slot as isize + (displacement as i8) as isize) as usize
}

/// Operand stack, return stack, and variable slots for one compiled program.
///
/// Variable storage is a flat array addressed by the same symbol index the
/// compiler assigned each `Var` entry. Function call targets are a second,
/// read-only array addressed by the index of each `Func` entry; both arrays
/// share the symbol table's index space but are tracked separately here
/// rather than fused into the symbol table itself.
pub struct Vm {
    operand_stack: Vec<i32>,
    return_stack: Vec<usize>,
    vars: Vec<i32>,
    fn_targets: Vec<usize>,
}

impl Vm {
    /// Creates a VM with `slot_count` variable slots, all initialized to zero,
    /// and `fn_targets[i]` giving the code offset `ICALL i` jumps to.
    pub fn new(slot_count: usize, fn_targets: Vec<usize>) -> Vm {
        Vm {
            operand_stack: Vec::new(),
            return_stack: Vec::new(),
            vars: vec![0; slot_count],
            fn_targets,
        }
    }

    pub fn vars(&self) -> &[i32] {
        &self.vars
    }

    pub fn operand_stack(&self) -> &[i32] {
        &self.operand_stack
    }

    /// Runs `code` from offset 0 until `HALT` executes or `IRET` empties the
    /// return stack. Malformed input (division by zero, an out-of-range jump,
    /// stack underflow) is not a condition this function detects; the source
    /// that produced such a buffer is itself malformed and the behavior here
    /// is whatever the underlying arithmetic or indexing does.
    pub fn run(&mut self, code: &[u8]) {
        let mut pc = 0usize;

        loop {
            let opcode =
                Opcode::from_u8(code[pc]).unwrap_or_else(|| panic!("invalid opcode byte at {}", pc));
            pc += 1;

            match opcode {
                Opcode::HALT => return,

                Opcode::FETCH => {
                    let slot = LittleEndian::read_u16(&code[pc..]) as usize;
                    pc += 2;
                    self.operand_stack.push(self.vars[slot]);
                }
                Opcode::STORE => {
                    let slot = LittleEndian::read_u16(&code[pc..]) as usize;
                    pc += 2;
                    self.vars[slot] = *self.operand_stack.last().expect("STORE on empty stack");
                }

                Opcode::LIT1 => {
                    self.operand_stack.push(code[pc] as i8 as i32);
                    pc += 1;
                }
                Opcode::LIT2 => {
                    self.operand_stack.push(LittleEndian::read_i16(&code[pc..]) as i32);
                    pc += 2;
                }
                Opcode::LIT => {
                    self.operand_stack.push(LittleEndian::read_i32(&code[pc..]));
                    pc += 4;
                }

                Opcode::IDROP => {
                    self.operand_stack.pop();
                }

                Opcode::IADD => self.binary(|a, b| a + b),
                Opcode::ISUB => self.binary(|a, b| a - b),
                Opcode::IMUL => self.binary(|a, b| a * b),
                Opcode::IDIV => self.binary(|a, b| a / b),
                Opcode::ILT => self.binary(|a, b| (a < b) as i32),
                Opcode::IGT => self.binary(|a, b| (a > b) as i32),

                Opcode::JMP => {
                    pc = jump(pc, code[pc]);
                }
                Opcode::JZ => {
                    let slot = pc;
                    let cond = self.operand_stack.pop().expect("JZ on empty stack");
                    pc = if cond == 0 { jump(slot, code[slot]) } else { slot + 1 };
                }
                Opcode::JNZ => {
                    let slot = pc;
                    let cond = self.operand_stack.pop().expect("JNZ on empty stack");
                    pc = if cond != 0 { jump(slot, code[slot]) } else { slot + 1 };
                }

                Opcode::ICALL => {
                    let slot = pc;
                    let target = LittleEndian::read_u16(&code[slot..]) as usize;
                    pc = slot + 2;
                    self.return_stack.push(pc);
                    pc = self.fn_targets[target];
                }
                Opcode::IRET => match self.return_stack.pop() {
                    Some(ret) => pc = ret,
                    None => return,
                },
            }
        }
    }

    fn binary(&mut self, f: impl Fn(i32, i32) -> i32) {
        let rhs = self.operand_stack.pop().expect("binary op on empty stack");
        let lhs = self.operand_stack.pop().expect("binary op on empty stack");
        self.operand_stack.push(f(lhs, rhs));
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn run(code: &[u8], slot_count: usize, fn_targets: Vec<usize>) -> Vm {
        let mut vm = Vm::new(slot_count, fn_targets);
        vm.run(code);
        vm
    }

    #[test]
    fn halt_terminates_immediately() {
        let vm = run(&[Opcode::HALT as u8], 0, vec![]);
        assert!(vm.operand_stack().is_empty());
    }

    #[test]
    fn literals_push_in_the_expected_tier() {
        // LIT1 100; LIT2 1000 (LE); LIT 100000 (LE); HALT
        let mut code = vec![Opcode::LIT1 as u8, 100];
        code.push(Opcode::LIT2 as u8);
        code.extend_from_slice(&1000i16.to_le_bytes());
        code.push(Opcode::LIT as u8);
        code.extend_from_slice(&100_000i32.to_le_bytes());
        code.push(Opcode::HALT as u8);

        let vm = run(&code, 0, vec![]);
        assert_eq!(vm.operand_stack(), &[100, 1000, 100_000]);
    }

    #[test]
    fn fetch_store_round_trip_on_a_variable_slot() {
        // LIT1 9; STORE 0; IDROP; FETCH 0; HALT
        let mut code = vec![Opcode::LIT1 as u8, 9, Opcode::STORE as u8];
        code.extend_from_slice(&0u16.to_le_bytes());
        code.push(Opcode::IDROP as u8);
        code.push(Opcode::FETCH as u8);
        code.extend_from_slice(&0u16.to_le_bytes());
        code.push(Opcode::HALT as u8);

        let vm = run(&code, 1, vec![]);
        assert_eq!(vm.operand_stack(), &[9]);
        assert_eq!(vm.vars()[0], 9);
    }

    #[test]
    fn backward_jmp_forms_a_loop_via_a_counted_store() {
        // i = 0; while (i < 3) { i = i + 1 }
        // slot 0 = i
        let mut code = Vec::new();
        // LIT1 0; STORE 0; IDROP
        code.push(Opcode::LIT1 as u8);
        code.push(0);
        code.push(Opcode::STORE as u8);
        code.extend_from_slice(&0u16.to_le_bytes());
        code.push(Opcode::IDROP as u8);

        let loop_start = code.len();
        // FETCH 0; LIT1 3; ILT; JZ end
        code.push(Opcode::FETCH as u8);
        code.extend_from_slice(&0u16.to_le_bytes());
        code.push(Opcode::LIT1 as u8);
        code.push(3);
        code.push(Opcode::ILT as u8);
        code.push(Opcode::JZ as u8);
        let jz_slot = code.len();
        code.push(0); // patched below

        // FETCH 0; LIT1 1; IADD; STORE 0; IDROP
        code.push(Opcode::FETCH as u8);
        code.extend_from_slice(&0u16.to_le_bytes());
        code.push(Opcode::LIT1 as u8);
        code.push(1);
        code.push(Opcode::IADD as u8);
        code.push(Opcode::STORE as u8);
        code.extend_from_slice(&0u16.to_le_bytes());
        code.push(Opcode::IDROP as u8);

        // JMP loop_start
        code.push(Opcode::JMP as u8);
        let jmp_slot = code.len();
        code.push(0); // patched below

        let end = code.len();
        code.push(Opcode::HALT as u8);

        code[jz_slot] = (end as isize - jz_slot as isize) as u8;
        code[jmp_slot] = (loop_start as isize - jmp_slot as isize) as u8;

        let vm = run(&code, 1, vec![]);
        assert_eq!(vm.vars()[0], 3);
        assert!(vm.operand_stack().is_empty());
    }

    #[test]
    fn icall_pushes_the_return_address_after_its_operand() {
        // main: ICALL 0 (callee slot); HALT
        // callee at slot 1: LIT1 5; STORE 1; IDROP; IRET
        let mut code = Vec::new();
        code.push(Opcode::ICALL as u8);
        code.extend_from_slice(&0u16.to_le_bytes());
        code.push(Opcode::HALT as u8);

        let callee = code.len();
        code.push(Opcode::LIT1 as u8);
        code.push(5);
        code.push(Opcode::STORE as u8);
        code.extend_from_slice(&1u16.to_le_bytes());
        code.push(Opcode::IDROP as u8);
        code.push(Opcode::IRET as u8);

        let vm = run(&code, 2, vec![callee]);
        assert_eq!(vm.vars()[1], 5);
        assert!(vm.operand_stack().is_empty());
    }

    #[test]
    fn iret_with_empty_return_stack_halts_cleanly() {
        let vm = run(&[Opcode::IRET as u8], 0, vec![]);
        assert!(vm.operand_stack().is_empty());
    }
}
