//! Renders a compiled byte buffer as a human-readable instruction listing.

use byteorder::{ByteOrder, LittleEndian};
use num_traits::FromPrimitive;
use std::fmt::Write as _;

use tcc::symtab::{SymbolKind, SymbolTable};
use tcvm::Opcode;

/// Builds the full `list.txt` contents for `code`: a header line naming
/// `main`'s offset (or noting its absence), followed by one line per
/// instruction.
pub fn listing(code: &[u8], symbols: &SymbolTable) -> String {
    let mut out = String::new();

    let main = symbols.find("main", SymbolKind::Func);
    if main != 0 {
        writeln!(out, "; main() is at {}", symbols.get(main).value).unwrap();
    } else {
        writeln!(out, "; there is no main() function").unwrap();
    }

    let mut pc = 0usize;
    while pc < code.len() {
        let offset = pc;
        let opcode = Opcode::from_u8(code[pc]).expect("invalid opcode byte in a compiled buffer");
        pc += 1;

        let operand = match opcode {
            Opcode::FETCH | Opcode::STORE => {
                let slot = LittleEndian::read_u16(&code[pc..]) as usize;
                pc += 2;
                format!(" {} ({})", slot, symbol_name(symbols, slot))
            }
            Opcode::LIT1 => {
                let v = code[pc] as i8;
                pc += 1;
                format!(" {}", v)
            }
            Opcode::LIT2 => {
                let v = LittleEndian::read_i16(&code[pc..]);
                pc += 2;
                format!(" {}", v)
            }
            Opcode::LIT => {
                let v = LittleEndian::read_i32(&code[pc..]);
                pc += 4;
                format!(" {}", v)
            }
            Opcode::JZ | Opcode::JNZ | Opcode::JMP => {
                let displacement = code[pc] as i8;
                let target = (pc as isize + displacement as isize) as usize;
                pc += 1;
                format!(" {}", target)
            }
            Opcode::ICALL => {
                let slot = LittleEndian::read_u16(&code[pc..]) as usize;
                pc += 2;
                format!(" {} ({})", slot, symbol_name(symbols, slot))
            }
            _ => String::new(),
        };

        writeln!(out, "{:>5}: {:02x} {}{}", offset, code[offset], opcode.mnemonic(), operand)
            .unwrap();
    }

    out
}

fn symbol_name(symbols: &SymbolTable, index: usize) -> String {
    if index == 0 || index > symbols.len() {
        "?".to_string()
    } else {
        symbols.get(index).name.clone()
    }
}
