use crate::memory::{CMP, MEMORY_SIZE, OP_A, OP_B, OP_C, SUB, SUM, TRN, WORD_LIMIT};

/// Recompute the derived registers from the operand cells.
///
/// - SUM = (A + B) mod 10000
/// - SUB = (A - B) mod 10000, never negative
/// - CMP = 1 if A > B else 0
/// - TRN = A if C != 0 else B
///
/// A pure function of A, B and C, so calling it twice is harmless. It runs
/// after every mutation of memory.
pub fn recompute(memory: &mut [i32; MEMORY_SIZE]) {
    let a = memory[OP_A];
    let b = memory[OP_B];
    let c = memory[OP_C];

    memory[SUM] = a.wrapping_add(b).rem_euclid(WORD_LIMIT);
    memory[SUB] = a.wrapping_sub(b).rem_euclid(WORD_LIMIT);
    memory[CMP] = i32::from(a > b);
    memory[TRN] = if c != 0 { a } else { b };
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_operands(a: i32, b: i32, c: i32) -> [i32; MEMORY_SIZE] {
        let mut memory = [0; MEMORY_SIZE];
        memory[OP_A] = a;
        memory[OP_B] = b;
        memory[OP_C] = c;
        recompute(&mut memory);
        memory
    }

    #[test]
    fn test_a_greater_selects_b_when_c_clear() {
        let m = with_operands(5, 3, 0);
        assert_eq!(m[SUM], 8);
        assert_eq!(m[SUB], 2);
        assert_eq!(m[CMP], 1);
        assert_eq!(m[TRN], 3);
    }

    #[test]
    fn test_equal_operands_select_a_when_c_set() {
        let m = with_operands(3, 3, 1);
        assert_eq!(m[SUM], 6);
        assert_eq!(m[SUB], 0);
        assert_eq!(m[CMP], 0);
        assert_eq!(m[TRN], 3);
    }

    #[test]
    fn test_sub_wraps_non_negative() {
        let m = with_operands(3, 5, 0);
        assert_eq!(m[SUB], 9998);
        assert_eq!(m[CMP], 0);
    }

    #[test]
    fn test_sum_wraps() {
        let m = with_operands(9998, 7, 0);
        assert_eq!(m[SUM], 5);
    }

    #[test]
    fn test_only_derived_cells_change() {
        let mut memory = [7; MEMORY_SIZE];
        recompute(&mut memory);
        for (addr, &v) in memory.iter().enumerate() {
            if ![SUM, SUB, CMP, TRN].contains(&addr) {
                assert_eq!(v, 7, "cell {addr} changed");
            }
        }
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn derived_registers_match_formulas(a in 0i32..9999, b in 0i32..9999, c in 0i32..9999) {
            let mut memory = [0; MEMORY_SIZE];
            memory[OP_A] = a;
            memory[OP_B] = b;
            memory[OP_C] = c;
            recompute(&mut memory);
            prop_assert_eq!(memory[SUM], (a + b) % 10000);
            prop_assert_eq!(memory[SUB], (a - b + 10000) % 10000);
            prop_assert_eq!(memory[CMP], if a > b { 1 } else { 0 });
            prop_assert_eq!(memory[TRN], if c != 0 { a } else { b });
        }

        #[test]
        fn recompute_is_idempotent(cells in prop::array::uniform32(any::<i32>())) {
            let mut memory = [0; MEMORY_SIZE];
            memory[..32].copy_from_slice(&cells);
            recompute(&mut memory);
            let once = memory;
            recompute(&mut memory);
            prop_assert_eq!(once, memory);
        }
    }
}
