use crate::error::{Error, Result};
use crate::instruction::Instruction;
use crate::memory::{
    CMP, INP, MEMORY_SIZE, OP_A, OP_B, OP_C, OUT, PROGRAM_LEN, PROGRAM_START, TRN, parse_address,
};
use crate::program::PROGRAM_WORD_LIMIT;

/// Packed form of [`default_program`], written by a program reset.
pub const DEFAULT_PROGRAM: [i32; 5] = [1202, 1203, 608, 711, 0];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    Move(usize, usize),
    Halt,
}

/// Builds a program for the program region, one instruction per call.
///
/// ```
/// use movcpu::assembler::Assembler;
/// use movcpu::memory::{OP_A, TRN};
///
/// let words = Assembler::new().input(OP_A).output(TRN).halt().finish().unwrap();
/// assert_eq!(words, vec![1202, 711, 0]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Assembler {
    ops: Vec<Op>,
}

impl Assembler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mov(mut self, src: usize, dst: usize) -> Self {
        self.ops.push(Op::Move(src, dst));
        self
    }

    pub fn input(self, dst: usize) -> Self {
        self.mov(INP, dst)
    }

    pub fn output(self, src: usize) -> Self {
        self.mov(src, OUT)
    }

    pub fn set_a(self, src: usize) -> Self {
        self.mov(src, OP_A)
    }

    pub fn set_b(self, src: usize) -> Self {
        self.mov(src, OP_B)
    }

    pub fn set_c(self, src: usize) -> Self {
        self.mov(src, OP_C)
    }

    pub fn halt(mut self) -> Self {
        self.ops.push(Op::Halt);
        self
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Pack the instructions in call order.
    ///
    /// Every packed word must be storable in a program image, so
    /// `mov 99 -> 99` (9999) is rejected along with out-of-range addresses.
    pub fn finish(&self) -> Result<Vec<i32>> {
        if self.ops.len() > PROGRAM_LEN {
            return Err(Error::ProgramTooLong(self.ops.len()));
        }
        self.ops
            .iter()
            .enumerate()
            .map(|(i, &op)| match op {
                Op::Halt => Ok(0),
                Op::Move(src, _) if src >= MEMORY_SIZE => Err(Error::AddressOutOfRange(src)),
                Op::Move(_, dst) if dst >= MEMORY_SIZE => Err(Error::AddressOutOfRange(dst)),
                Op::Move(src, dst) => {
                    let word = Instruction::new(src, dst).encode();
                    if word >= i32::from(PROGRAM_WORD_LIMIT) {
                        return Err(Error::ValueOutOfRange {
                            address: PROGRAM_START + i,
                            value: word,
                        });
                    }
                    Ok(word)
                }
            })
            .collect()
    }
}

/// The demonstration program loaded by a program reset.
///
/// Reads A and B, copies CMP (A > B) into C so TRN selects the larger
/// operand, then outputs it.
pub fn default_program() -> Assembler {
    Assembler::new()
        .input(OP_A)
        .input(OP_B)
        .set_c(CMP)
        .output(TRN)
        .halt()
}

/// Assemble line-oriented source text.
///
/// One instruction per line:
/// - `mov SRC DST`
/// - `in DST`, `out SRC`
/// - `a SRC`, `b SRC`, `c SRC`
/// - `halt`
///
/// Operands are register names (`INP`, `A`, `TRN`, ...) or decimal
/// addresses. `;` starts a comment.
pub fn parse(source: &str) -> Result<Assembler> {
    let mut asm = Assembler::new();
    for (idx, raw) in source.lines().enumerate() {
        let line = idx + 1;
        let code = raw.split(';').next().unwrap_or("").trim();
        if code.is_empty() {
            continue;
        }

        let mut tokens = code.split_whitespace();
        let mnemonic = tokens.next().unwrap_or("").to_ascii_lowercase();
        let operands: Vec<usize> = tokens
            .map(|t| {
                parse_address(t).ok_or_else(|| Error::Parse {
                    line,
                    message: format!("invalid operand '{t}'"),
                })
            })
            .collect::<Result<_>>()?;

        let arity = match mnemonic.as_str() {
            "mov" => 2,
            "in" | "out" | "a" | "b" | "c" => 1,
            "halt" => 0,
            other => {
                return Err(Error::Parse {
                    line,
                    message: format!("unknown mnemonic '{other}'"),
                });
            }
        };
        if operands.len() != arity {
            return Err(Error::Parse {
                line,
                message: format!(
                    "'{mnemonic}' takes {arity} operand(s), got {}",
                    operands.len()
                ),
            });
        }

        asm = match mnemonic.as_str() {
            "mov" => asm.mov(operands[0], operands[1]),
            "in" => asm.input(operands[0]),
            "out" => asm.output(operands[0]),
            "a" => asm.set_a(operands[0]),
            "b" => asm.set_b(operands[0]),
            "c" => asm.set_c(operands[0]),
            _ => asm.halt(),
        };
    }
    Ok(asm)
}
