//! The tiny-c byte code instruction set.

use num_derive::{FromPrimitive, ToPrimitive};
use util::{EnumFromStr, InteropGetName};
use util_derive::{EnumFromStr, InteropGetName};

/// One instruction in the emitted byte stream.
///
/// Variant order fixes the numeric opcode: `HALT` is `0`, `IRET` is `17`. The
/// code generator and the disassembler both rely on this order matching the
/// one laid out in the byte-code format description; never reorder these
/// without also bumping every emitted buffer's expectations.
///
/// Operand widths are carried by the instruction, not the opcode:
///
/// Mnemonic | Operand                              | Width
/// ---------|---------------------------------------|------
/// `FETCH`  | symbol slot                            | `u16` LE
/// `STORE`  | symbol slot                             | `u16` LE
/// `LIT1`   | literal value                           | `i8`
/// `LIT2`   | literal value                           | `i16` LE
/// `LIT`    | literal value                           | `i32` LE
/// `JZ`     | displacement relative to the byte itself| `i8`
/// `JNZ`    | displacement relative to the byte itself| `i8`
/// `JMP`    | displacement relative to the byte itself| `i8`
/// `ICALL`  | symbol slot of the callee               | `u16` LE
#[derive(
    Clone, Copy, PartialEq, Eq, Debug, FromPrimitive, ToPrimitive, EnumFromStr, InteropGetName,
)]
pub enum Opcode {
    HALT,
    FETCH,
    STORE,
    LIT1,
    LIT2,
    LIT,
    IDROP,
    IADD,
    ISUB,
    IMUL,
    IDIV,
    ILT,
    IGT,
    JZ,
    JNZ,
    JMP,
    ICALL,
    IRET,
}

impl Opcode {
    /// Lowercase mnemonic used by the disassembly listing, e.g. `"fetch"`.
    pub fn mnemonic(self) -> String {
        let name = self.interop_name();
        // interop_name() is NUL-terminated for C interop; we only want the text.
        let text = &name[..name.len() - 1];
        String::from_utf8_lossy(text).to_ascii_lowercase()
    }
}
