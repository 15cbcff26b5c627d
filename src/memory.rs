use std::sync::Arc;

/// Memory layout of the MOV-only machine.
///
/// The machine has 100 cells. Cells 0-49 hold registers, ports and scratch
/// data and are cleared by a memory reset. Cells 50-99 hold the program and
/// survive a memory reset.
///
/// Special cells:
/// - 0 (HALT): halt sentinel
/// - 1 (PC):   address of the next instruction
/// - 2, 3, 8 (A, B, C): operands
/// - 4-7 (SUM, SUB, CMP, TRN): derived from A, B, C after every mutation
/// - 9, 10 (TMP, TMP2): scratch
/// - 11 (OUT): writing here emits a value
/// - 12 (INP): seeded by the host before a step that reads it
pub const MEMORY_SIZE: usize = 100;
pub const PROGRAM_START: usize = 50;
pub const PROGRAM_LEN: usize = MEMORY_SIZE - PROGRAM_START;

/// Cells conceptually hold 4-digit words; derived arithmetic wraps here.
pub const WORD_LIMIT: i32 = 10000;

pub const HALT: usize = 0;
pub const PC: usize = 1;
pub const OP_A: usize = 2;
pub const OP_B: usize = 3;
pub const SUM: usize = 4;
pub const SUB: usize = 5;
pub const CMP: usize = 6;
pub const TRN: usize = 7;
pub const OP_C: usize = 8;
pub const TMP: usize = 9;
pub const TMP2: usize = 10;
pub const OUT: usize = 11;
pub const INP: usize = 12;

/// An immutable whole-memory snapshot. Mutations build a new array and
/// replace the `Arc`, so a held snapshot never changes underneath a reader.
pub type Memory = Arc<[i32; MEMORY_SIZE]>;

const NAMES: [(usize, &str); 13] = [
    (HALT, "HALT"),
    (PC, "PC"),
    (OP_A, "A"),
    (OP_B, "B"),
    (SUM, "SUM"),
    (SUB, "SUB"),
    (CMP, "CMP"),
    (TRN, "TRN"),
    (OP_C, "C"),
    (TMP, "TMP"),
    (TMP2, "TMP2"),
    (OUT, "OUT"),
    (INP, "INP"),
];

/// Fold a cell value into a valid address. All address arithmetic wraps
/// modulo the memory size.
pub fn address(value: i32) -> usize {
    value.rem_euclid(MEMORY_SIZE as i32) as usize
}

/// Symbolic name of a special cell, if it has one.
pub fn register_name(addr: usize) -> Option<&'static str> {
    NAMES.iter().find(|&&(a, _)| a == addr).map(|&(_, name)| name)
}

/// Parse a symbolic register name (case-insensitive) or a decimal address.
pub fn parse_address(token: &str) -> Option<usize> {
    if let Some(&(addr, _)) = NAMES.iter().find(|(_, name)| name.eq_ignore_ascii_case(token)) {
        return Some(addr);
    }
    match token.parse::<usize>() {
        Ok(addr) if addr < MEMORY_SIZE => Some(addr),
        _ => None,
    }
}

/// Human-readable name for an address: the register name or the number.
pub fn describe(addr: usize) -> String {
    register_name(addr).map_or_else(|| addr.to_string(), str::to_string)
}
