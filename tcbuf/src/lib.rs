//! The growable byte buffer the code generator emits instructions into.
//!
//! A [`CodeBuffer`] only ever grows, up to a fixed capacity fixed at
//! construction: bytes already written are never removed, though
//! [`CodeBuffer::patch`] may overwrite the contents of a previously reserved
//! [`CodeBuffer::hole`].

use byteorder::{ByteOrder, LittleEndian};
use std::error::Error as StdError;
use std::fmt;

/// Raised when an `emit*`/`hole` call would grow the buffer past its
/// capacity. Carries no detail of its own; callers attach their own
/// diagnostic (the code generator turns this into a `ResourceError` naming
/// the buffer).
#[derive(Clone, Copy, Eq, PartialEq, Debug)]
pub struct CapacityError;

impl fmt::Display for CapacityError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "code buffer capacity exceeded")
    }
}

impl StdError for CapacityError {}

#[derive(Debug, PartialEq, Eq)]
pub struct CodeBuffer {
    bytes: Vec<u8>,
    capacity: usize,
}

impl CodeBuffer {
    pub fn new(capacity: usize) -> CodeBuffer {
        CodeBuffer { bytes: Vec::new(), capacity }
    }

    /// Current length in bytes; also the offset the next `emit*`/`hole` call
    /// will land at.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    fn reserve(&mut self, additional: usize) -> Result<usize, CapacityError> {
        let at = self.bytes.len();
        if at + additional > self.capacity {
            return Err(CapacityError);
        }
        Ok(at)
    }

    pub fn emit1(&mut self, byte: u8) -> Result<usize, CapacityError> {
        let at = self.reserve(1)?;
        self.bytes.push(byte);
        Ok(at)
    }

    pub fn emit2(&mut self, value: u16) -> Result<usize, CapacityError> {
        let at = self.reserve(2)?;
        let mut buf = [0u8; 2];
        LittleEndian::write_u16(&mut buf, value);
        self.bytes.extend_from_slice(&buf);
        Ok(at)
    }

    pub fn emit4(&mut self, value: i32) -> Result<usize, CapacityError> {
        let at = self.reserve(4)?;
        let mut buf = [0u8; 4];
        LittleEndian::write_i32(&mut buf, value);
        self.bytes.extend_from_slice(&buf);
        Ok(at)
    }

    /// Reserves one byte for a displacement to be filled in later by
    /// [`patch`](CodeBuffer::patch), returning its offset.
    pub fn hole(&mut self) -> Result<usize, CapacityError> {
        self.emit1(0)
    }

    /// Writes the signed displacement from `slot` to `target` into the byte
    /// at `slot`. `slot` must be an offset previously returned by
    /// [`hole`](CodeBuffer::hole).
    pub fn patch(&mut self, slot: usize, target: usize) {
        let displacement = target as isize - slot as isize;
        self.bytes[slot] = displacement as i8 as u8;
    }

    /// Overwrites the opcode byte at `at`, used only to rewrite the program
    /// prologue into a bare `HALT` when no `main` function was defined.
    pub fn set_byte(&mut self, at: usize, byte: u8) {
        self.bytes[at] = byte;
    }
}
