use std::fmt;

use crate::memory::{PROGRAM_START, WORD_LIMIT, address, describe};

/// The single instruction of the machine: copy `src` into `dst`.
///
/// A packed instruction `v` stores the source address in its high two
/// digits and the destination in its low two digits: `v = src * 100 + dst`.
/// The value 0 is the halt sentinel and never executes as a move, even
/// though it would decode as `mov HALT -> HALT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Instruction {
    pub src: usize,
    pub dst: usize,
}

/// Split a packed value into `(src, dst) = (v div 100, v mod 100)`.
pub fn decode(v: i32) -> (i32, i32) {
    (v.div_euclid(100), v.rem_euclid(100))
}

/// True for the halt sentinel. Only the literal value 0 halts.
pub fn is_halt(v: i32) -> bool {
    v == 0
}

impl Instruction {
    pub fn new(src: usize, dst: usize) -> Self {
        Self { src, dst }
    }

    /// Decode a cell value into the addresses it moves between. A source
    /// above 99 (only reachable through a hand-edited cell) wraps.
    pub fn decode(v: i32) -> Self {
        let (src, dst) = decode(v);
        Self {
            src: address(src),
            dst: address(dst),
        }
    }

    pub fn encode(self) -> i32 {
        (self.src * 100 + self.dst) as i32
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "mov {} -> {}", describe(self.src), describe(self.dst))
    }
}

/// Pretty-print the program region (cells starting at address 50).
pub fn disassemble(program: &[i32]) -> String {
    use std::fmt::Write;
    let mut out = String::new();
    for (i, &v) in program.iter().enumerate() {
        let addr = PROGRAM_START + i;
        let text = if is_halt(v) {
            "halt".to_string()
        } else if (0..WORD_LIMIT).contains(&v) {
            Instruction::decode(v).to_string()
        } else {
            "(data)".to_string()
        };
        let _ = writeln!(out, "{addr:02}: {v:04}  {text}");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{INP, OUT};

    #[test]
    fn test_decode_splits_digits() {
        assert_eq!(decode(1211), (12, 11));
        assert_eq!(decode(5), (0, 5));
        assert_eq!(decode(9999), (99, 99));
        assert_eq!(decode(0), (0, 0));
    }

    #[test]
    fn test_instruction_decode_encode() {
        let instr = Instruction::decode(1211);
        assert_eq!(instr, Instruction::new(INP, OUT));
        assert_eq!(instr.encode(), 1211);
    }

    #[test]
    fn test_instruction_decode_wraps_large_source() {
        // 12345 -> src 123 wraps to 23.
        let instr = Instruction::decode(12345);
        assert_eq!(instr, Instruction::new(23, 45));
    }

    #[test]
    fn test_only_zero_halts() {
        assert!(is_halt(0));
        // mov HALT -> PC decodes to a real move.
        assert!(!is_halt(1));
        assert!(!is_halt(100));
    }

    #[test]
    fn test_display() {
        assert_eq!(Instruction::decode(1211).to_string(), "mov INP -> OUT");
        assert_eq!(Instruction::decode(5760).to_string(), "mov 57 -> 60");
    }

    #[test]
    fn test_disassemble() {
        let text = disassemble(&[1202, 711, 0, 12000]);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "50: 1202  mov INP -> A");
        assert_eq!(lines[1], "51: 0711  mov TRN -> OUT");
        assert_eq!(lines[2], "52: 0000  halt");
        assert_eq!(lines[3], "53: 12000  (data)");
    }

    #[test]
    fn test_disassemble_empty() {
        assert_eq!(disassemble(&[]), "");
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn decode_is_inverse_of_packing(src in 0usize..100, dst in 0usize..100) {
            let instr = Instruction::new(src, dst);
            prop_assert_eq!(Instruction::decode(instr.encode()), instr);
        }

        #[test]
        fn decode_always_yields_valid_addresses(v in any::<i32>()) {
            let instr = Instruction::decode(v);
            prop_assert!(instr.src < 100);
            prop_assert!(instr.dst < 100);
        }
    }
}
